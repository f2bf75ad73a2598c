// MySQL用型マッパー

use super::common::{canonical_type, split_type, type_args};
use super::TypeMapper;
use crate::core::table::{ColumnDefinition, LogicalType};
use regex::Regex;
use std::sync::LazyLock;

static INTEGER_DISPLAY_WIDTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(TINYINT|SMALLINT|MEDIUMINT|INT|INTEGER|BIGINT)\(\d+\)").expect("valid regex")
});

/// MySQL用型マッパー
pub struct MySqlTypeMapper;

impl TypeMapper for MySqlTypeMapper {
    fn format_sql_type(&self, column: &ColumnDefinition) -> String {
        match column.logical_type {
            LogicalType::TinyInt => "TINYINT".to_string(),
            LogicalType::SmallInt => "SMALLINT".to_string(),
            LogicalType::Integer => "INT".to_string(),
            LogicalType::BigInt => "BIGINT".to_string(),
            LogicalType::Decimal => {
                let (precision, scale) = column.effective_precision();
                format!("DECIMAL({},{})", precision, scale)
            }
            LogicalType::Float => "FLOAT".to_string(),
            LogicalType::Double => "DOUBLE".to_string(),
            LogicalType::Boolean => "TINYINT(1)".to_string(),
            LogicalType::Char => format!("CHAR({})", column.effective_length().unwrap_or(1)),
            LogicalType::Varchar => {
                format!("VARCHAR({})", column.effective_length().unwrap_or(255))
            }
            LogicalType::Text => "TEXT".to_string(),
            LogicalType::Date => "DATE".to_string(),
            LogicalType::Time => "TIME".to_string(),
            LogicalType::Timestamp => "DATETIME".to_string(),
            LogicalType::Blob => "BLOB".to_string(),
            LogicalType::Json => "JSON".to_string(),
            LogicalType::Uuid => "CHAR(36)".to_string(),
        }
    }

    fn parse_sql_type(&self, sql_type: &str) -> Option<LogicalType> {
        let normalized = self.normalize_sql_type(sql_type);
        if normalized.starts_with("TINYINT(1)") {
            return Some(LogicalType::Boolean);
        }

        let (base, args) = split_type(&normalized);
        let base = base.split_whitespace().next().unwrap_or(base);
        match base {
            "TINYINT" => Some(LogicalType::TinyInt),
            "SMALLINT" => Some(LogicalType::SmallInt),
            "MEDIUMINT" | "INT" => Some(LogicalType::Integer),
            "BIGINT" => Some(LogicalType::BigInt),
            "DECIMAL" | "NUMERIC" => Some(LogicalType::Decimal),
            "FLOAT" => Some(LogicalType::Float),
            "DOUBLE" | "REAL" => Some(LogicalType::Double),
            "BIT" if type_args(args) == vec![1] => Some(LogicalType::Boolean),
            "CHAR" => Some(LogicalType::Char),
            "VARCHAR" => Some(LogicalType::Varchar),
            "TINYTEXT" | "TEXT" | "MEDIUMTEXT" | "LONGTEXT" => Some(LogicalType::Text),
            "DATE" => Some(LogicalType::Date),
            "TIME" => Some(LogicalType::Time),
            "DATETIME" | "TIMESTAMP" => Some(LogicalType::Timestamp),
            "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BINARY" | "VARBINARY" => {
                Some(LogicalType::Blob)
            }
            "JSON" => Some(LogicalType::Json),
            _ => None,
        }
    }

    /// `int(11)` → `INT`、`tinyint(1)` はBOOLEAN相当として保持
    fn normalize_sql_type(&self, sql_type: &str) -> String {
        let canonical = canonical_type(sql_type);
        if canonical.starts_with("TINYINT(1)") || canonical == "BOOLEAN" || canonical == "BOOL" {
            return "TINYINT(1)".to_string();
        }

        let stripped = INTEGER_DISPLAY_WIDTH.replace(&canonical, "$1").to_string();
        match stripped.strip_prefix("INTEGER") {
            Some(rest) => format!("INT{}", rest),
            None => stripped,
        }
    }
}

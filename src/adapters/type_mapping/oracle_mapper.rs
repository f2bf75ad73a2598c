// Oracle用型マッパー

use super::common::{canonical_type, split_type, type_args, with_length};
use super::{TypeMapper, TypeMetadata};
use crate::core::table::{ColumnDefinition, LogicalType};
use regex::Regex;
use std::sync::LazyLock;

static LENGTH_SEMANTICS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((\d+) (CHAR|BYTE)\)").expect("valid regex"));
static FRACTIONAL_SECONDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^TIMESTAMP\(\d\)").expect("valid regex"));

/// Oracle用型マッパー
pub struct OracleTypeMapper;

impl TypeMapper for OracleTypeMapper {
    fn format_sql_type(&self, column: &ColumnDefinition) -> String {
        match column.logical_type {
            LogicalType::TinyInt => "NUMBER(3)".to_string(),
            LogicalType::SmallInt => "NUMBER(5)".to_string(),
            LogicalType::Integer => "NUMBER(10)".to_string(),
            LogicalType::BigInt => "NUMBER(19)".to_string(),
            LogicalType::Decimal => {
                let (precision, scale) = column.effective_precision();
                format!("NUMBER({},{})", precision, scale)
            }
            LogicalType::Float => "BINARY_FLOAT".to_string(),
            LogicalType::Double => "BINARY_DOUBLE".to_string(),
            LogicalType::Boolean => "NUMBER(1)".to_string(),
            LogicalType::Char => format!("CHAR({})", column.effective_length().unwrap_or(1)),
            LogicalType::Varchar => {
                format!("VARCHAR2({})", column.effective_length().unwrap_or(255))
            }
            LogicalType::Text | LogicalType::Json => "CLOB".to_string(),
            LogicalType::Date => "DATE".to_string(),
            LogicalType::Time | LogicalType::Timestamp => "TIMESTAMP".to_string(),
            LogicalType::Blob => "BLOB".to_string(),
            LogicalType::Uuid => "VARCHAR2(36)".to_string(),
        }
    }

    fn parse_sql_type(&self, sql_type: &str) -> Option<LogicalType> {
        let normalized = self.normalize_sql_type(sql_type);
        let (base, args) = split_type(&normalized);
        match base {
            "NUMBER" => {
                let args = type_args(args);
                match args.as_slice() {
                    [1] => Some(LogicalType::Boolean),
                    [p] if *p <= 3 => Some(LogicalType::TinyInt),
                    [p] if *p <= 5 => Some(LogicalType::SmallInt),
                    [p] if *p <= 10 => Some(LogicalType::Integer),
                    [p] if *p <= 19 => Some(LogicalType::BigInt),
                    _ => Some(LogicalType::Decimal),
                }
            }
            "BINARY_FLOAT" => Some(LogicalType::Float),
            "BINARY_DOUBLE" | "FLOAT" => Some(LogicalType::Double),
            "CHAR" | "NCHAR" => Some(LogicalType::Char),
            "VARCHAR2" | "NVARCHAR2" | "VARCHAR" => Some(LogicalType::Varchar),
            "CLOB" | "NCLOB" | "LONG" => Some(LogicalType::Text),
            "DATE" => Some(LogicalType::Date),
            "TIMESTAMP" => Some(LogicalType::Timestamp),
            "BLOB" | "RAW" => Some(LogicalType::Blob),
            _ => None,
        }
    }

    /// `TIMESTAMP(6)` → `TIMESTAMP`、`VARCHAR2(50 CHAR)` → `VARCHAR2(50)`、`NUMBER(10,0)` → `NUMBER(10)`
    fn normalize_sql_type(&self, sql_type: &str) -> String {
        let canonical = canonical_type(sql_type);
        let canonical = LENGTH_SEMANTICS.replace(&canonical, "($1)").to_string();
        let canonical = FRACTIONAL_SECONDS.replace(&canonical, "TIMESTAMP").to_string();
        match canonical.strip_suffix(",0)") {
            Some(head) if canonical.starts_with("NUMBER(") => format!("{})", head),
            _ => canonical,
        }
    }

    fn physical_type(&self, data_type: &str, metadata: &TypeMetadata) -> String {
        let base = self.normalize_sql_type(data_type);
        match base.as_str() {
            "VARCHAR2" | "NVARCHAR2" | "CHAR" | "NCHAR" | "RAW" => {
                with_length(&base, metadata.char_max_length)
            }
            "NUMBER" => match (metadata.numeric_precision, metadata.numeric_scale) {
                (Some(p), Some(s)) if s > 0 => format!("NUMBER({},{})", p, s),
                (Some(p), _) => format!("NUMBER({})", p),
                _ => base,
            },
            _ => base,
        }
    }
}

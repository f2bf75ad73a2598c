// SQL Server用型マッパー

use super::common::{canonical_type, split_type, with_precision};
use super::{TypeMapper, TypeMetadata};
use crate::core::table::{ColumnDefinition, LogicalType};

/// NVARCHARで長さ指定できる上限
const MAX_NVARCHAR_LENGTH: u32 = 4000;

/// SQL Server用型マッパー
pub struct SqlServerTypeMapper;

impl TypeMapper for SqlServerTypeMapper {
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
            LogicalType::Float => "REAL".to_string(),
            LogicalType::Double => "FLOAT".to_string(),
            LogicalType::Boolean => "BIT".to_string(),
            LogicalType::Char => format!("NCHAR({})", column.effective_length().unwrap_or(1)),
            LogicalType::Varchar => match column.effective_length() {
                Some(len) if len <= MAX_NVARCHAR_LENGTH => format!("NVARCHAR({})", len),
                _ => "NVARCHAR(MAX)".to_string(),
            },
            LogicalType::Text | LogicalType::Json => "NVARCHAR(MAX)".to_string(),
            LogicalType::Date => "DATE".to_string(),
            LogicalType::Time => "TIME".to_string(),
            LogicalType::Timestamp => "DATETIME2".to_string(),
            LogicalType::Blob => "VARBINARY(MAX)".to_string(),
            LogicalType::Uuid => "UNIQUEIDENTIFIER".to_string(),
        }
    }

    fn parse_sql_type(&self, sql_type: &str) -> Option<LogicalType> {
        let normalized = self.normalize_sql_type(sql_type);
        let (base, args) = split_type(&normalized);
        match base {
            "TINYINT" => Some(LogicalType::TinyInt),
            "SMALLINT" => Some(LogicalType::SmallInt),
            "INT" => Some(LogicalType::Integer),
            "BIGINT" => Some(LogicalType::BigInt),
            "DECIMAL" | "MONEY" => Some(LogicalType::Decimal),
            "REAL" => Some(LogicalType::Float),
            "FLOAT" => Some(LogicalType::Double),
            "BIT" => Some(LogicalType::Boolean),
            "CHAR" | "NCHAR" => Some(LogicalType::Char),
            "VARCHAR" | "NVARCHAR" if args == Some("MAX") => Some(LogicalType::Text),
            "VARCHAR" | "NVARCHAR" => Some(LogicalType::Varchar),
            "TEXT" | "NTEXT" => Some(LogicalType::Text),
            "DATE" => Some(LogicalType::Date),
            "TIME" => Some(LogicalType::Time),
            "DATETIME" | "DATETIME2" | "SMALLDATETIME" | "DATETIMEOFFSET" => {
                Some(LogicalType::Timestamp)
            }
            "BINARY" | "VARBINARY" | "IMAGE" => Some(LogicalType::Blob),
            "UNIQUEIDENTIFIER" => Some(LogicalType::Uuid),
            _ => None,
        }
    }

    /// `numeric(19,2)` → `DECIMAL(19,2)`、既定精度の `datetime2(7)` → `DATETIME2`
    fn normalize_sql_type(&self, sql_type: &str) -> String {
        let canonical = canonical_type(sql_type);
        let (base, args) = split_type(&canonical);
        let base = if base == "NUMERIC" { "DECIMAL" } else { base };
        match (base, args) {
            ("DATETIME2", Some("7")) | ("TIME", Some("7")) | ("FLOAT", Some("53")) => {
                base.to_string()
            }
            ("FLOAT", Some("24")) => "REAL".to_string(),
            (base, Some(args)) => format!("{}({})", base, args),
            (base, None) => base.to_string(),
        }
    }

    /// sys.columns の max_length はバイト数（Unicode型は2倍、-1はMAX）
    fn physical_type(&self, data_type: &str, metadata: &TypeMetadata) -> String {
        let base = canonical_type(data_type);
        match base.as_str() {
            "NVARCHAR" | "NCHAR" | "VARCHAR" | "CHAR" | "VARBINARY" | "BINARY" => {
                let unicode = base.starts_with('N');
                match metadata.char_max_length {
                    Some(-1) => format!("{}(MAX)", base),
                    Some(bytes) if bytes > 0 => {
                        let length = if unicode { bytes / 2 } else { bytes };
                        format!("{}({})", base, length)
                    }
                    _ => base,
                }
            }
            "DECIMAL" | "NUMERIC" => with_precision(
                "DECIMAL",
                metadata.numeric_precision,
                metadata.numeric_scale,
            ),
            _ => self.normalize_sql_type(&base),
        }
    }
}

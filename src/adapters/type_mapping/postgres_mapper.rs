// PostgreSQL用型マッパー

use super::common::{canonical_type, split_type, with_length, with_precision};
use super::{TypeMapper, TypeMetadata};
use crate::core::table::{ColumnDefinition, LogicalType};

/// PostgreSQL用型マッパー
pub struct PostgresTypeMapper;

impl TypeMapper for PostgresTypeMapper {
    fn format_sql_type(&self, column: &ColumnDefinition) -> String {
        match column.logical_type {
            LogicalType::TinyInt | LogicalType::SmallInt => "SMALLINT".to_string(),
            LogicalType::Integer => "INTEGER".to_string(),
            LogicalType::BigInt => "BIGINT".to_string(),
            LogicalType::Decimal => {
                let (precision, scale) = column.effective_precision();
                format!("NUMERIC({},{})", precision, scale)
            }
            LogicalType::Float => "REAL".to_string(),
            LogicalType::Double => "DOUBLE PRECISION".to_string(),
            LogicalType::Boolean => "BOOLEAN".to_string(),
            LogicalType::Char => format!("CHAR({})", column.effective_length().unwrap_or(1)),
            LogicalType::Varchar => {
                format!("VARCHAR({})", column.effective_length().unwrap_or(255))
            }
            LogicalType::Text => "TEXT".to_string(),
            LogicalType::Date => "DATE".to_string(),
            LogicalType::Time => "TIME".to_string(),
            LogicalType::Timestamp => "TIMESTAMP".to_string(),
            LogicalType::Blob => "BYTEA".to_string(),
            LogicalType::Json => "JSONB".to_string(),
            LogicalType::Uuid => "UUID".to_string(),
        }
    }

    fn parse_sql_type(&self, sql_type: &str) -> Option<LogicalType> {
        let normalized = self.normalize_sql_type(sql_type);
        let (base, _) = split_type(&normalized);
        match base {
            "SMALLINT" => Some(LogicalType::SmallInt),
            "INTEGER" => Some(LogicalType::Integer),
            "BIGINT" => Some(LogicalType::BigInt),
            "NUMERIC" => Some(LogicalType::Decimal),
            "REAL" => Some(LogicalType::Float),
            "DOUBLE PRECISION" => Some(LogicalType::Double),
            "BOOLEAN" => Some(LogicalType::Boolean),
            "CHAR" => Some(LogicalType::Char),
            "VARCHAR" => Some(LogicalType::Varchar),
            "TEXT" => Some(LogicalType::Text),
            "DATE" => Some(LogicalType::Date),
            "TIME" | "TIMETZ" => Some(LogicalType::Time),
            "TIMESTAMP" | "TIMESTAMPTZ" => Some(LogicalType::Timestamp),
            "BYTEA" => Some(LogicalType::Blob),
            "JSON" | "JSONB" => Some(LogicalType::Json),
            "UUID" => Some(LogicalType::Uuid),
            _ => None,
        }
    }

    /// 型の別名を正準名に揃える（`int4` → `INTEGER`、`character varying(50)` → `VARCHAR(50)`）
    fn normalize_sql_type(&self, sql_type: &str) -> String {
        let canonical = canonical_type(sql_type);
        let (base, args) = split_type(&canonical);
        let base = match base {
            "INT" | "INT4" => "INTEGER",
            "INT2" => "SMALLINT",
            "INT8" => "BIGINT",
            "DECIMAL" => "NUMERIC",
            "FLOAT4" => "REAL",
            "FLOAT8" => "DOUBLE PRECISION",
            "BOOL" => "BOOLEAN",
            "CHARACTER VARYING" => "VARCHAR",
            "CHARACTER" | "BPCHAR" => "CHAR",
            "TIMESTAMP WITHOUT TIME ZONE" => "TIMESTAMP",
            "TIMESTAMP WITH TIME ZONE" => "TIMESTAMPTZ",
            "TIME WITHOUT TIME ZONE" => "TIME",
            "TIME WITH TIME ZONE" => "TIMETZ",
            other => other,
        };
        match args {
            Some(args) => format!("{}({})", base, args),
            None => base.to_string(),
        }
    }

    fn physical_type(&self, data_type: &str, metadata: &TypeMetadata) -> String {
        let normalized = self.normalize_sql_type(data_type);
        match normalized.as_str() {
            "VARCHAR" | "CHAR" => with_length(&normalized, metadata.char_max_length),
            "NUMERIC" => with_precision(
                &normalized,
                metadata.numeric_precision,
                metadata.numeric_scale,
            ),
            _ => normalized,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_physical_type_from_information_schema() {
        let mapper = PostgresTypeMapper;
        let varchar = TypeMetadata {
            char_max_length: Some(50),
            ..Default::default()
        };
        assert_eq!(mapper.physical_type("character varying", &varchar), "VARCHAR(50)");

        let numeric = TypeMetadata {
            numeric_precision: Some(19),
            numeric_scale: Some(2),
            ..Default::default()
        };
        assert_eq!(mapper.physical_type("numeric", &numeric), "NUMERIC(19,2)");
        assert_eq!(
            mapper.physical_type("timestamp without time zone", &TypeMetadata::default()),
            "TIMESTAMP"
        );
        assert_eq!(
            mapper.physical_type("integer", &TypeMetadata::default()),
            "INTEGER"
        );
    }

    #[test]
    fn test_rendered_and_catalog_types_compare_equal() {
        let mapper = PostgresTypeMapper;
        let column = ColumnDefinition::new("price", LogicalType::Decimal);
        let rendered = mapper.normalize_sql_type(&mapper.format_sql_type(&column));
        let catalog = mapper.physical_type(
            "numeric",
            &TypeMetadata {
                numeric_precision: Some(19),
                numeric_scale: Some(2),
                ..Default::default()
            },
        );
        assert_eq!(rendered, catalog);
    }

    #[test]
    fn test_parse_aliases() {
        let mapper = PostgresTypeMapper;
        assert_eq!(mapper.parse_sql_type("int8"), Some(LogicalType::BigInt));
        assert_eq!(mapper.parse_sql_type("jsonb"), Some(LogicalType::Json));
        assert_eq!(mapper.parse_sql_type("bytea"), Some(LogicalType::Blob));
        assert_eq!(mapper.parse_sql_type("tsvector"), None);
    }
}

// Oracle用イントロスペクター
//
// ALL_TABLES / ALL_TAB_COLUMNS / ALL_INDEXES / ALL_CONSTRAINTS などのディクショナリビューを参照します。

use super::{
    assemble_table, schema_filter, DatabaseIntrospector, RawColumnInfo, RawIndexInfo,
    RawTableInfo,
};
use crate::adapters::connection::SchemaConnection;
use crate::adapters::type_mapping::{OracleTypeMapper, TypeMetadata};
use crate::core::error::DatabaseError;
use crate::core::table::TableDefinition;
use async_trait::async_trait;

const DEFAULT_SCHEMA: &str = "SYS_CONTEXT('USERENV', 'CURRENT_SCHEMA')";

/// Oracle用イントロスペクター
#[derive(Debug, Clone, Default)]
pub struct OracleIntrospector {}

impl OracleIntrospector {
    pub fn new() -> Self {
        Self {}
    }

    fn table_sql(schema_condition: &str) -> String {
        format!(
            "SELECT cm.COMMENTS FROM ALL_TABLES t \
             LEFT JOIN ALL_TAB_COMMENTS cm ON cm.OWNER = t.OWNER AND cm.TABLE_NAME = t.TABLE_NAME \
             WHERE t.TABLE_NAME = :1 AND t.OWNER = {}",
            schema_condition
        )
    }

    fn columns_sql(schema_condition: &str) -> String {
        format!(
            "SELECT c.COLUMN_NAME, c.DATA_TYPE, TO_CHAR(c.CHAR_LENGTH), TO_CHAR(c.DATA_PRECISION), \
             TO_CHAR(c.DATA_SCALE), c.NULLABLE, c.DATA_DEFAULT, c.IDENTITY_COLUMN, cc.COMMENTS \
             FROM ALL_TAB_COLUMNS c \
             LEFT JOIN ALL_COL_COMMENTS cc ON cc.OWNER = c.OWNER AND cc.TABLE_NAME = c.TABLE_NAME AND cc.COLUMN_NAME = c.COLUMN_NAME \
             WHERE c.TABLE_NAME = :1 AND c.OWNER = {} \
             ORDER BY c.COLUMN_ID",
            schema_condition
        )
    }

    fn indexes_sql(schema_condition: &str) -> String {
        format!(
            "SELECT i.INDEX_NAME, ic.COLUMN_NAME, i.UNIQUENESS, \
             CASE WHEN con.CONSTRAINT_TYPE = 'P' THEN 'Y' ELSE 'N' END, i.INDEX_TYPE \
             FROM ALL_INDEXES i \
             JOIN ALL_IND_COLUMNS ic ON ic.INDEX_OWNER = i.OWNER AND ic.INDEX_NAME = i.INDEX_NAME \
             LEFT JOIN ALL_CONSTRAINTS con ON con.OWNER = i.TABLE_OWNER AND con.INDEX_NAME = i.INDEX_NAME AND con.CONSTRAINT_TYPE = 'P' \
             WHERE i.TABLE_NAME = :1 AND i.TABLE_OWNER = {} \
             ORDER BY i.INDEX_NAME, ic.COLUMN_POSITION",
            schema_condition
        )
    }
}

#[async_trait]
impl DatabaseIntrospector for OracleIntrospector {
    async fn introspect(
        &self,
        connection: &dyn SchemaConnection,
        schema: Option<&str>,
        table: &str,
    ) -> Result<Option<TableDefinition>, DatabaseError> {
        let (params, condition) = schema_filter(table, schema, ":2", DEFAULT_SCHEMA);

        let tables = connection
            .fetch_rows(&Self::table_sql(&condition), &params)
            .await?;
        let Some(row) = tables.first() else {
            return Ok(None);
        };
        let info = RawTableInfo {
            comment: row.non_empty(0),
            ..Default::default()
        };

        let columns: Vec<RawColumnInfo> = connection
            .fetch_rows(&Self::columns_sql(&condition), &params)
            .await?
            .iter()
            .map(|row| RawColumnInfo {
                name: row.string(0),
                data_type: row.string(1),
                metadata: TypeMetadata {
                    char_max_length: row.int(2),
                    numeric_precision: row.int(3),
                    numeric_scale: row.int(4),
                },
                nullable: row.flag(5),
                default_value: row.non_empty(6),
                auto_increment: row.flag(7),
                comment: row.non_empty(8),
            })
            .collect();

        let indexes: Vec<RawIndexInfo> = connection
            .fetch_rows(&Self::indexes_sql(&condition), &params)
            .await?
            .iter()
            .map(|row| RawIndexInfo {
                index_name: row.string(0),
                column_name: row.string(1),
                unique: row.string(2) == "UNIQUE",
                primary: row.flag(3),
                index_type: row.non_empty(4),
            })
            .collect();

        Ok(Some(assemble_table(
            table,
            schema,
            info,
            columns,
            indexes,
            &OracleTypeMapper,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::connection::CatalogRow;
    use crate::adapters::database_introspector::test_support::StubConnection;
    use crate::core::table::{IdStrategy, LogicalType};

    #[tokio::test]
    async fn test_introspect_number_columns() {
        let connection = StubConnection::new(
            "Oracle",
            vec![
                ("FROM ALL_TABLES t", vec![CatalogRow::from_values(&[None])]),
                (
                    "FROM ALL_TAB_COLUMNS c",
                    vec![
                        CatalogRow::from_values(&[
                            Some("ID"),
                            Some("NUMBER"),
                            Some("0"),
                            Some("19"),
                            Some("0"),
                            Some("N"),
                            None,
                            Some("NO"),
                            None,
                        ]),
                        CatalogRow::from_values(&[
                            Some("CREATED_AT"),
                            Some("TIMESTAMP(6)"),
                            Some("0"),
                            None,
                            Some("6"),
                            Some("Y"),
                            Some("SYSTIMESTAMP "),
                            Some("NO"),
                            None,
                        ]),
                    ],
                ),
                (
                    "FROM ALL_INDEXES i",
                    vec![CatalogRow::from_values(&[
                        Some("SYS_C0012345"),
                        Some("ID"),
                        Some("UNIQUE"),
                        Some("Y"),
                        Some("NORMAL"),
                    ])],
                ),
            ],
        );

        let table = OracleIntrospector::new()
            .introspect(&connection, Some("APP"), "ORDERS")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(table.columns[0].physical_type.as_deref(), Some("NUMBER(19)"));
        assert_eq!(table.columns[0].logical_type, LogicalType::BigInt);
        assert!(!table.columns[0].nullable);
        assert_eq!(table.columns[1].physical_type.as_deref(), Some("TIMESTAMP"));
        assert_eq!(table.columns[1].default_value.as_deref(), Some("SYSTIMESTAMP"));
        assert_eq!(table.id.as_ref().map(|id| id.strategy), Some(IdStrategy::Assigned));
        assert!(table.indexes.is_empty());
    }
}

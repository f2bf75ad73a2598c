// MySQL用イントロスペクター
//
// information_schema の TABLES / COLUMNS / STATISTICS を参照します。

use super::{
    assemble_table, schema_filter, DatabaseIntrospector, RawColumnInfo, RawIndexInfo,
    RawTableInfo,
};
use crate::adapters::connection::SchemaConnection;
use crate::adapters::type_mapping::{MySqlTypeMapper, TypeMetadata};
use crate::core::error::DatabaseError;
use crate::core::table::TableDefinition;
use async_trait::async_trait;

const DEFAULT_SCHEMA: &str = "DATABASE()";

/// MySQL用イントロスペクター
#[derive(Debug, Clone, Default)]
pub struct MySqlIntrospector {}

impl MySqlIntrospector {
    pub fn new() -> Self {
        Self {}
    }

    fn table_sql(schema_condition: &str) -> String {
        format!(
            "SELECT CAST(TABLE_COMMENT AS CHAR), CAST(ENGINE AS CHAR), CAST(TABLE_COLLATION AS CHAR) \
             FROM information_schema.TABLES \
             WHERE TABLE_NAME = ? AND TABLE_SCHEMA = {}",
            schema_condition
        )
    }

    fn columns_sql(schema_condition: &str) -> String {
        format!(
            "SELECT CAST(COLUMN_NAME AS CHAR), CAST(COLUMN_TYPE AS CHAR), \
             CAST(CHARACTER_MAXIMUM_LENGTH AS CHAR), CAST(NUMERIC_PRECISION AS CHAR), \
             CAST(NUMERIC_SCALE AS CHAR), CAST(IS_NULLABLE AS CHAR), CAST(COLUMN_DEFAULT AS CHAR), \
             CAST(EXTRA AS CHAR), CAST(COLUMN_COMMENT AS CHAR) \
             FROM information_schema.COLUMNS \
             WHERE TABLE_NAME = ? AND TABLE_SCHEMA = {} \
             ORDER BY ORDINAL_POSITION",
            schema_condition
        )
    }

    fn indexes_sql(schema_condition: &str) -> String {
        format!(
            "SELECT CAST(INDEX_NAME AS CHAR), CAST(COLUMN_NAME AS CHAR), CAST(NON_UNIQUE AS CHAR), \
             CAST(INDEX_TYPE AS CHAR) \
             FROM information_schema.STATISTICS \
             WHERE TABLE_NAME = ? AND TABLE_SCHEMA = {} \
             ORDER BY INDEX_NAME, SEQ_IN_INDEX",
            schema_condition
        )
    }
}

#[async_trait]
impl DatabaseIntrospector for MySqlIntrospector {
    async fn introspect(
        &self,
        connection: &dyn SchemaConnection,
        schema: Option<&str>,
        table: &str,
    ) -> Result<Option<TableDefinition>, DatabaseError> {
        let (params, condition) = schema_filter(table, schema, "?", DEFAULT_SCHEMA);

        let tables = connection
            .fetch_rows(&Self::table_sql(&condition), &params)
            .await?;
        let Some(row) = tables.first() else {
            return Ok(None);
        };
        let collation = row.non_empty(2);
        let info = RawTableInfo {
            comment: row.non_empty(0),
            engine: row.non_empty(1),
            charset: collation
                .as_deref()
                .and_then(|c| c.split('_').next())
                .map(str::to_string),
            collation,
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
                default_value: row.text(6).map(str::to_string),
                auto_increment: row.string(7).to_ascii_lowercase().contains("auto_increment"),
                comment: row.non_empty(8),
            })
            .collect();

        let indexes: Vec<RawIndexInfo> = connection
            .fetch_rows(&Self::indexes_sql(&condition), &params)
            .await?
            .iter()
            .map(|row| {
                let index_name = row.string(0);
                RawIndexInfo {
                    primary: index_name == "PRIMARY",
                    index_name,
                    column_name: row.string(1),
                    unique: row.string(2) == "0",
                    index_type: row.non_empty(3),
                }
            })
            .collect();

        Ok(Some(assemble_table(
            table,
            schema,
            info,
            columns,
            indexes,
            &MySqlTypeMapper,
        )))
    }
}

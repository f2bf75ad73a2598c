// SQL Server用イントロスペクター
//
// sys.tables / sys.columns / sys.types / sys.indexes と拡張プロパティを参照します。

use super::{
    assemble_table, schema_filter, DatabaseIntrospector, RawColumnInfo, RawIndexInfo,
    RawTableInfo,
};
use crate::adapters::connection::SchemaConnection;
use crate::adapters::type_mapping::{SqlServerTypeMapper, TypeMetadata};
use crate::core::error::DatabaseError;
use crate::core::table::TableDefinition;
use async_trait::async_trait;

const DEFAULT_SCHEMA: &str = "SCHEMA_NAME()";

/// SQL Server用イントロスペクター
#[derive(Debug, Clone, Default)]
pub struct SqlServerIntrospector {}

impl SqlServerIntrospector {
    pub fn new() -> Self {
        Self {}
    }

    fn table_sql(schema_condition: &str) -> String {
        format!(
            "SELECT CAST(ep.value AS NVARCHAR(MAX)) \
             FROM sys.tables t \
             JOIN sys.schemas s ON s.schema_id = t.schema_id \
             LEFT JOIN sys.extended_properties ep ON ep.major_id = t.object_id AND ep.minor_id = 0 AND ep.name = 'MS_Description' \
             WHERE t.name = @P1 AND s.name = {}",
            schema_condition
        )
    }

    fn columns_sql(schema_condition: &str) -> String {
        format!(
            "SELECT c.name, ty.name, CAST(c.max_length AS NVARCHAR(20)), CAST(c.precision AS NVARCHAR(20)), \
             CAST(c.scale AS NVARCHAR(20)), CAST(c.is_nullable AS NVARCHAR(1)), dc.definition, \
             CAST(c.is_identity AS NVARCHAR(1)), CAST(ep.value AS NVARCHAR(MAX)) \
             FROM sys.columns c \
             JOIN sys.tables t ON t.object_id = c.object_id \
             JOIN sys.schemas s ON s.schema_id = t.schema_id \
             JOIN sys.types ty ON ty.user_type_id = c.user_type_id \
             LEFT JOIN sys.default_constraints dc ON dc.object_id = c.default_object_id \
             LEFT JOIN sys.extended_properties ep ON ep.major_id = c.object_id AND ep.minor_id = c.column_id AND ep.name = 'MS_Description' \
             WHERE t.name = @P1 AND s.name = {} \
             ORDER BY c.column_id",
            schema_condition
        )
    }

    fn indexes_sql(schema_condition: &str) -> String {
        format!(
            "SELECT i.name, c.name, CAST(i.is_unique AS NVARCHAR(1)), CAST(i.is_primary_key AS NVARCHAR(1)), i.type_desc \
             FROM sys.indexes i \
             JOIN sys.tables t ON t.object_id = i.object_id \
             JOIN sys.schemas s ON s.schema_id = t.schema_id \
             JOIN sys.index_columns ic ON ic.object_id = i.object_id AND ic.index_id = i.index_id \
             JOIN sys.columns c ON c.object_id = ic.object_id AND c.column_id = ic.column_id \
             WHERE t.name = @P1 AND s.name = {} AND i.name IS NOT NULL AND ic.is_included_column = 0 \
             ORDER BY i.name, ic.key_ordinal",
            schema_condition
        )
    }
}

#[async_trait]
impl DatabaseIntrospector for SqlServerIntrospector {
    async fn introspect(
        &self,
        connection: &dyn SchemaConnection,
        schema: Option<&str>,
        table: &str,
    ) -> Result<Option<TableDefinition>, DatabaseError> {
        let (params, condition) = schema_filter(table, schema, "@P2", DEFAULT_SCHEMA);

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
                unique: row.flag(2),
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
            &SqlServerTypeMapper,
        )))
    }
}

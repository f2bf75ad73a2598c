// PostgreSQL用イントロスペクター
//
// information_schema.columns と pg_catalog (pg_class / pg_index / pg_am) を参照します。

use super::{
    assemble_table, schema_filter, DatabaseIntrospector, RawColumnInfo, RawIndexInfo,
    RawTableInfo,
};
use crate::adapters::connection::SchemaConnection;
use crate::adapters::type_mapping::{PostgresTypeMapper, TypeMetadata};
use crate::core::error::DatabaseError;
use crate::core::table::TableDefinition;
use async_trait::async_trait;

const DEFAULT_SCHEMA: &str = "current_schema()";

/// PostgreSQL用イントロスペクター
#[derive(Debug, Clone, Default)]
pub struct PostgresIntrospector {}

impl PostgresIntrospector {
    pub fn new() -> Self {
        Self {}
    }

    fn table_sql(schema_condition: &str) -> String {
        format!(
            "SELECT obj_description(c.oid, 'pg_class')::text \
             FROM pg_class c \
             JOIN pg_namespace n ON n.oid = c.relnamespace \
             WHERE c.relname = $1 AND n.nspname = {} AND c.relkind IN ('r', 'p')",
            schema_condition
        )
    }

    fn columns_sql(schema_condition: &str) -> String {
        format!(
            "SELECT c.column_name::text, c.data_type::text, c.udt_name::text, \
             c.character_maximum_length::text, c.numeric_precision::text, c.numeric_scale::text, \
             c.is_nullable::text, c.column_default::text, c.is_identity::text, \
             col_description(format('%I.%I', c.table_schema, c.table_name)::regclass, c.ordinal_position::int)::text \
             FROM information_schema.columns c \
             WHERE c.table_name = $1 AND c.table_schema = {} \
             ORDER BY c.ordinal_position",
            schema_condition
        )
    }

    fn indexes_sql(schema_condition: &str) -> String {
        format!(
            "SELECT i.relname::text, a.attname::text, ix.indisunique::text, ix.indisprimary::text, am.amname::text \
             FROM pg_index ix \
             JOIN pg_class t ON t.oid = ix.indrelid \
             JOIN pg_namespace n ON n.oid = t.relnamespace \
             JOIN pg_class i ON i.oid = ix.indexrelid \
             JOIN pg_am am ON am.oid = i.relam \
             CROSS JOIN LATERAL unnest(ix.indkey) WITH ORDINALITY AS k(attnum, ord) \
             JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = k.attnum \
             WHERE t.relname = $1 AND n.nspname = {} \
             ORDER BY i.relname, k.ord",
            schema_condition
        )
    }
}

/// 配列型・ユーザー定義型はudt_nameを型名として使う
fn column_type(data_type: String, udt_name: String) -> String {
    match data_type.as_str() {
        "USER-DEFINED" | "ARRAY" => udt_name,
        _ => data_type,
    }
}

#[async_trait]
impl DatabaseIntrospector for PostgresIntrospector {
    async fn introspect(
        &self,
        connection: &dyn SchemaConnection,
        schema: Option<&str>,
        table: &str,
    ) -> Result<Option<TableDefinition>, DatabaseError> {
        let (params, condition) = schema_filter(table, schema, "$2", DEFAULT_SCHEMA);

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
            .map(|row| {
                let default_value = row.text(7).map(str::to_string);
                let sequence_default = default_value
                    .as_deref()
                    .is_some_and(|d| d.starts_with("nextval("));
                RawColumnInfo {
                    name: row.string(0),
                    data_type: column_type(row.string(1), row.string(2)),
                    metadata: TypeMetadata {
                        char_max_length: row.int(3),
                        numeric_precision: row.int(4),
                        numeric_scale: row.int(5),
                    },
                    nullable: row.flag(6),
                    default_value,
                    auto_increment: row.flag(8) || sequence_default,
                    comment: row.non_empty(9),
                }
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
            &PostgresTypeMapper,
        )))
    }
}

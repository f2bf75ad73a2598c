// PostgreSQL用SQLジェネレーター
//
// テーブル定義からPostgreSQL用のDDL文を生成します。

use crate::adapters::sql_generator::{
    implicit_only_indexes, join_clauses, raw_column_definition, raw_primary_key_constraint,
    Identity, SqlGenerator,
};
use crate::adapters::sql_quote::{
    qualify, quote_columns, quote_identifier_postgres, quote_string_literal,
};
use crate::adapters::type_mapping::{PostgresTypeMapper, TypeMapper};
use crate::core::change_set::{ColumnChangeKind, ColumnModification};
use crate::core::table::{ColumnDefinition, IndexDefinition, IndexType, TableDefinition};

/// PostgreSQL用SQLジェネレーター
#[derive(Debug, Clone)]
pub struct PostgresSqlGenerator {}

impl PostgresSqlGenerator {
    /// 新しいPostgresSqlGeneratorを作成
    pub fn new() -> Self {
        Self {}
    }

    /// スキーマ修飾付きのシーケンス名
    fn sequence_name(&self, table: &TableDefinition, sequence: &str) -> String {
        qualify(table.schema.as_deref(), sequence, self.quote_fn())
    }

    /// シーケンス作成文（SEQUENCE戦略の主キーがある場合のみ）
    fn sequence_statement(&self, table: &TableDefinition, column: &ColumnDefinition) -> Option<String> {
        match Identity::of(table, column) {
            Identity::Sequence(sequence) => Some(format!(
                "CREATE SEQUENCE IF NOT EXISTS {}",
                self.sequence_name(table, sequence)
            )),
            _ => None,
        }
    }

    /// COMMENT ON文（テーブル・カラム）
    fn comment_statements(&self, table: &TableDefinition, columns: &[&ColumnDefinition]) -> Vec<String> {
        let table_name = self.table_name(table);
        let mut statements = Vec::new();
        for column in columns {
            if let Some(comment) = &column.comment {
                statements.push(format!(
                    "COMMENT ON COLUMN {}.{} IS {}",
                    table_name,
                    self.quote(&column.name),
                    quote_string_literal(comment)
                ));
            }
        }
        statements
    }
}

impl SqlGenerator for PostgresSqlGenerator {
    fn quote_fn(&self) -> fn(&str) -> String {
        quote_identifier_postgres
    }

    fn type_mapper(&self) -> &dyn TypeMapper {
        &PostgresTypeMapper
    }

    fn column_definition(&self, table: &TableDefinition, column: &ColumnDefinition) -> String {
        if let Some(raw) = raw_column_definition(self, column) {
            return raw;
        }

        let primary_key = table.is_primary_key(&column.name, true);
        let mut parts = vec![self.quote(&column.name), self.type_mapper().format_sql_type(column)];

        match Identity::of(table, column) {
            Identity::Sequence(sequence) => parts.push(format!(
                "DEFAULT nextval({})",
                quote_string_literal(&self.sequence_name(table, sequence))
            )),
            Identity::AutoIncrement => parts.push("GENERATED BY DEFAULT AS IDENTITY".to_string()),
            Identity::None => {
                if let Some(default_value) = &column.default_value {
                    parts.push(format!("DEFAULT {}", default_value));
                }
            }
        }

        if !column.nullable && !primary_key {
            parts.push("NOT NULL".to_string());
        }
        if primary_key {
            parts.push("PRIMARY KEY".to_string());
        }

        join_clauses(parts)
    }

    fn generate_create_table(&self, table: &TableDefinition) -> Vec<String> {
        let mut statements: Vec<String> = table
            .columns
            .iter()
            .filter_map(|column| self.sequence_statement(table, column))
            .collect();

        let mut elements: Vec<String> = table
            .columns
            .iter()
            .map(|column| format!("    {}", self.column_definition(table, column)))
            .collect();
        if let Some(primary_key) = raw_primary_key_constraint(self, table) {
            elements.push(format!("    {}", primary_key));
        }

        statements.push(format!(
            "CREATE TABLE {} (\n{}\n)",
            self.table_name(table),
            elements.join(",\n")
        ));

        if let Some(comment) = &table.comment {
            statements.push(format!(
                "COMMENT ON TABLE {} IS {}",
                self.table_name(table),
                quote_string_literal(comment)
            ));
        }
        let columns: Vec<&ColumnDefinition> = table.columns.iter().collect();
        statements.extend(self.comment_statements(table, &columns));

        for index in table.indexes.iter().cloned().chain(implicit_only_indexes(table)) {
            statements.extend(self.generate_create_index(table, &index));
        }
        statements
    }

    fn generate_add_column(
        &self,
        table: &TableDefinition,
        column: &ColumnDefinition,
    ) -> Vec<String> {
        let mut statements: Vec<String> = self.sequence_statement(table, column).into_iter().collect();
        statements.push(format!(
            "ALTER TABLE {} ADD COLUMN {}",
            self.table_name(table),
            self.column_definition(table, column)
        ));
        statements.extend(self.comment_statements(table, &[column]));
        statements
    }

    fn generate_modify_column(
        &self,
        table: &TableDefinition,
        modification: &ColumnModification,
    ) -> Vec<String> {
        let table_name = self.table_name(table);
        let column = &modification.desired;
        let column_name = self.quote(&column.name);
        let mut statements = Vec::new();

        if modification.has_change(ColumnChangeKind::Type) {
            let sql_type = self.type_mapper().format_sql_type(column);
            statements.push(format!(
                "ALTER TABLE {} ALTER COLUMN {} TYPE {} USING {}::{}",
                table_name, column_name, sql_type, column_name, sql_type
            ));
        }
        if modification.has_change(ColumnChangeKind::Nullability) {
            let action = if column.nullable { "DROP NOT NULL" } else { "SET NOT NULL" };
            statements.push(format!(
                "ALTER TABLE {} ALTER COLUMN {} {}",
                table_name, column_name, action
            ));
        }
        if modification.has_change(ColumnChangeKind::Default) {
            let action = match &column.default_value {
                Some(value) => format!("SET DEFAULT {}", value),
                None => "DROP DEFAULT".to_string(),
            };
            statements.push(format!(
                "ALTER TABLE {} ALTER COLUMN {} {}",
                table_name, column_name, action
            ));
        }
        statements
    }

    fn generate_create_index(
        &self,
        table: &TableDefinition,
        index: &IndexDefinition,
    ) -> Vec<String> {
        let method = match index.index_type {
            IndexType::Btree => "btree",
            IndexType::Hash => "hash",
            IndexType::Fulltext => "gin",
            IndexType::Spatial => "gist",
        };
        let mut statements = vec![format!(
            "CREATE {}INDEX {} ON {} USING {} ({})",
            if index.unique { "UNIQUE " } else { "" },
            self.quote(&index.name),
            self.table_name(table),
            method,
            quote_columns(&index.columns, self.quote_fn())
        )];
        if let Some(comment) = &index.comment {
            statements.push(format!(
                "COMMENT ON INDEX {} IS {}",
                qualify(table.schema.as_deref(), &index.name, self.quote_fn()),
                quote_string_literal(comment)
            ));
        }
        statements
    }

    fn generate_drop_index(&self, table: &TableDefinition, index_name: &str) -> String {
        format!(
            "DROP INDEX IF EXISTS {}",
            qualify(table.schema.as_deref(), index_name, self.quote_fn())
        )
    }
}

impl Default for PostgresSqlGenerator {
    fn default() -> Self {
        Self::new()
    }
}

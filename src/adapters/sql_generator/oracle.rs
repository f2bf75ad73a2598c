// Oracle用SQLジェネレーター
//
// テーブル定義からOracle用のDDL文を生成します。

use crate::adapters::sql_generator::{
    implicit_only_indexes, join_clauses, raw_column_definition, raw_primary_key_constraint,
    Identity, SqlGenerator,
};
use crate::adapters::sql_quote::{
    qualify, quote_columns, quote_identifier_oracle, quote_string_literal,
};
use crate::adapters::type_mapping::{OracleTypeMapper, TypeMapper};
use crate::core::change_set::{ColumnChangeKind, ColumnModification};
use crate::core::table::{ColumnDefinition, IndexDefinition, TableDefinition};

/// 「オブジェクト名は既に使用されています」
const ORA_NAME_ALREADY_USED: i32 = -955;

/// Oracle用SQLジェネレーター
#[derive(Debug, Clone)]
pub struct OracleSqlGenerator {}

impl OracleSqlGenerator {
    /// 新しいOracleSqlGeneratorを作成
    pub fn new() -> Self {
        Self {}
    }

    fn sequence_name(&self, table: &TableDefinition, sequence: &str) -> String {
        qualify(table.schema.as_deref(), sequence, self.quote_fn())
    }

    /// 既に存在する場合は無視するシーケンス作成ブロック
    fn sequence_statement(&self, table: &TableDefinition, column: &ColumnDefinition) -> Option<String> {
        match Identity::of(table, column) {
            Identity::Sequence(sequence) => {
                let create = format!("CREATE SEQUENCE {}", self.sequence_name(table, sequence));
                Some(format!(
                    "BEGIN EXECUTE IMMEDIATE {}; EXCEPTION WHEN OTHERS THEN IF SQLCODE != {} THEN RAISE; END IF; END;",
                    quote_string_literal(&create),
                    ORA_NAME_ALREADY_USED
                ))
            }
            _ => None,
        }
    }

    fn comment_statements(&self, table: &TableDefinition, columns: &[&ColumnDefinition]) -> Vec<String> {
        let table_name = self.table_name(table);
        columns
            .iter()
            .filter_map(|column| {
                column.comment.as_ref().map(|comment| {
                    format!(
                        "COMMENT ON COLUMN {}.{} IS {}",
                        table_name,
                        self.quote(&column.name),
                        quote_string_literal(comment)
                    )
                })
            })
            .collect()
    }
}

impl SqlGenerator for OracleSqlGenerator {
    fn quote_fn(&self) -> fn(&str) -> String {
        quote_identifier_oracle
    }

    fn type_mapper(&self) -> &dyn TypeMapper {
        &OracleTypeMapper
    }

    fn column_definition(&self, table: &TableDefinition, column: &ColumnDefinition) -> String {
        if let Some(raw) = raw_column_definition(self, column) {
            return raw;
        }

        let primary_key = table.is_primary_key(&column.name, true);
        let mut parts = vec![self.quote(&column.name), self.type_mapper().format_sql_type(column)];

        match Identity::of(table, column) {
            Identity::Sequence(sequence) => parts.push(format!(
                "DEFAULT {}.NEXTVAL",
                self.sequence_name(table, sequence)
            )),
            Identity::AutoIncrement => parts.push("GENERATED BY DEFAULT AS IDENTITY".to_string()),
            Identity::None => {
                if let Some(default_value) = &column.default_value {
                    parts.push(format!("DEFAULT {}", default_value));
                }
            }
        }

        if primary_key {
            parts.push("PRIMARY KEY".to_string());
        } else if !column.nullable {
            parts.push("NOT NULL".to_string());
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
            "ALTER TABLE {} ADD ({})",
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
        let column = &modification.desired;
        let mut parts = vec![self.quote(&column.name)];

        if modification.has_change(ColumnChangeKind::Type) {
            parts.push(self.type_mapper().format_sql_type(column));
        }
        if modification.has_change(ColumnChangeKind::Default) {
            let value = column.default_value.as_deref().unwrap_or("NULL");
            parts.push(format!("DEFAULT {}", value));
        }
        // 変化していないNULL制約を指定するとORA-01442/01451になる
        if modification.has_change(ColumnChangeKind::Nullability) {
            parts.push(if column.nullable { "NULL" } else { "NOT NULL" }.to_string());
        }

        if parts.len() == 1 {
            return Vec::new();
        }
        vec![format!(
            "ALTER TABLE {} MODIFY ({})",
            self.table_name(table),
            parts.join(" ")
        )]
    }

    fn generate_create_index(
        &self,
        table: &TableDefinition,
        index: &IndexDefinition,
    ) -> Vec<String> {
        vec![format!(
            "CREATE {}INDEX {} ON {} ({})",
            if index.unique { "UNIQUE " } else { "" },
            qualify(table.schema.as_deref(), &index.name, self.quote_fn()),
            self.table_name(table),
            quote_columns(&index.columns, self.quote_fn())
        )]
    }

    fn generate_drop_index(&self, table: &TableDefinition, index_name: &str) -> String {
        format!(
            "DROP INDEX {}",
            qualify(table.schema.as_deref(), index_name, self.quote_fn())
        )
    }
}

impl Default for OracleSqlGenerator {
    fn default() -> Self {
        Self::new()
    }
}

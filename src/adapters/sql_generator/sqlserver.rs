// SQL Server用SQLジェネレーター
//
// テーブル定義からSQL Server (T-SQL) 用のDDL文を生成します。

use crate::adapters::sql_generator::{
    implicit_only_indexes, join_clauses, raw_column_definition, raw_primary_key_constraint,
    Identity, SqlGenerator,
};
use crate::adapters::sql_quote::{quote_columns, quote_identifier_sqlserver, quote_string_literal};
use crate::adapters::type_mapping::{SqlServerTypeMapper, TypeMapper};
use crate::core::change_set::{ColumnChangeKind, ColumnModification};
use crate::core::table::{ColumnDefinition, IndexDefinition, TableDefinition};

/// 既定スキーマ
const DEFAULT_SCHEMA: &str = "dbo";

/// SQL Server用SQLジェネレーター
#[derive(Debug, Clone)]
pub struct SqlServerSqlGenerator {}

impl SqlServerSqlGenerator {
    /// 新しいSqlServerSqlGeneratorを作成
    pub fn new() -> Self {
        Self {}
    }

    fn schema<'a>(&self, table: &'a TableDefinition) -> &'a str {
        table
            .schema
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SCHEMA)
    }

    fn sequence_name(&self, table: &TableDefinition, sequence: &str) -> String {
        format!("{}.{}", self.quote(self.schema(table)), self.quote(sequence))
    }

    fn sequence_statement(&self, table: &TableDefinition, column: &ColumnDefinition) -> Option<String> {
        match Identity::of(table, column) {
            Identity::Sequence(sequence) => Some(format!(
                "IF NOT EXISTS (SELECT 1 FROM sys.sequences WHERE name = {} AND schema_id = SCHEMA_ID({})) CREATE SEQUENCE {} AS BIGINT START WITH 1 INCREMENT BY 1",
                quote_string_literal(sequence),
                quote_string_literal(self.schema(table)),
                self.sequence_name(table, sequence)
            )),
            _ => None,
        }
    }

    /// 拡張プロパティによるコメント（カラム指定なしでテーブルコメント）
    fn comment_statement(&self, table: &TableDefinition, column: Option<&str>, comment: &str) -> String {
        let mut sql = format!(
            "EXEC sp_addextendedproperty @name = N'MS_Description', @value = N{}, @level0type = N'SCHEMA', @level0name = N{}, @level1type = N'TABLE', @level1name = N{}",
            quote_string_literal(comment),
            quote_string_literal(self.schema(table)),
            quote_string_literal(&table.name)
        );
        if let Some(column) = column {
            sql.push_str(&format!(
                ", @level2type = N'COLUMN', @level2name = N{}",
                quote_string_literal(column)
            ));
        }
        sql
    }

    /// 既存のデフォルト制約を削除する動的SQL
    fn drop_default_constraint(&self, table: &TableDefinition, column: &str) -> String {
        let table_name = self.table_name(table);
        format!(
            "DECLARE @df NVARCHAR(256); SELECT @df = dc.name FROM sys.default_constraints dc JOIN sys.columns c ON c.default_object_id = dc.object_id WHERE dc.parent_object_id = OBJECT_ID(N{}) AND c.name = N{}; IF @df IS NOT NULL EXEC(N{} + QUOTENAME(@df))",
            quote_string_literal(&table_name),
            quote_string_literal(column),
            quote_string_literal(&format!("ALTER TABLE {} DROP CONSTRAINT ", table_name))
        )
    }
}

impl SqlGenerator for SqlServerSqlGenerator {
    fn quote_fn(&self) -> fn(&str) -> String {
        quote_identifier_sqlserver
    }

    fn type_mapper(&self) -> &dyn TypeMapper {
        &SqlServerTypeMapper
    }

    fn column_definition(&self, table: &TableDefinition, column: &ColumnDefinition) -> String {
        if let Some(raw) = raw_column_definition(self, column) {
            return raw;
        }

        let primary_key = table.is_primary_key(&column.name, false);
        let mut parts = vec![self.quote(&column.name), self.type_mapper().format_sql_type(column)];

        match Identity::of(table, column) {
            Identity::Sequence(sequence) => parts.push(format!(
                "DEFAULT NEXT VALUE FOR {}",
                self.sequence_name(table, sequence)
            )),
            Identity::AutoIncrement => parts.push("IDENTITY(1,1)".to_string()),
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
            statements.push(self.comment_statement(table, None, comment));
        }
        for column in &table.columns {
            if let Some(comment) = &column.comment {
                statements.push(self.comment_statement(table, Some(&column.name), comment));
            }
        }

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
            "ALTER TABLE {} ADD {}",
            self.table_name(table),
            self.column_definition(table, column)
        ));
        if let Some(comment) = &column.comment {
            statements.push(self.comment_statement(table, Some(&column.name), comment));
        }
        statements
    }

    fn generate_modify_column(
        &self,
        table: &TableDefinition,
        modification: &ColumnModification,
    ) -> Vec<String> {
        let table_name = self.table_name(table);
        let column = &modification.desired;
        let mut statements = Vec::new();

        // ALTER COLUMNは型とNULL制約を同時に指定する
        if modification.has_change(ColumnChangeKind::Type)
            || modification.has_change(ColumnChangeKind::Nullability)
        {
            statements.push(format!(
                "ALTER TABLE {} ALTER COLUMN {} {} {}",
                table_name,
                self.quote(&column.name),
                self.type_mapper().format_sql_type(column),
                if column.nullable { "NULL" } else { "NOT NULL" }
            ));
        }
        if modification.has_change(ColumnChangeKind::Default) {
            statements.push(self.drop_default_constraint(table, &column.name));
            if let Some(default_value) = &column.default_value {
                statements.push(format!(
                    "ALTER TABLE {} ADD DEFAULT {} FOR {}",
                    table_name,
                    default_value,
                    self.quote(&column.name)
                ));
            }
        }
        statements
    }

    fn generate_create_index(
        &self,
        table: &TableDefinition,
        index: &IndexDefinition,
    ) -> Vec<String> {
        vec![format!(
            "CREATE {}INDEX {} ON {} ({})",
            if index.unique { "UNIQUE " } else { "" },
            self.quote(&index.name),
            self.table_name(table),
            quote_columns(&index.columns, self.quote_fn())
        )]
    }

    fn generate_drop_index(&self, table: &TableDefinition, index_name: &str) -> String {
        format!(
            "DROP INDEX {} ON {}",
            self.quote(index_name),
            self.table_name(table)
        )
    }
}

impl Default for SqlServerSqlGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::table::{IdStrategy, LogicalType};

    fn sys_user() -> TableDefinition {
        let mut table = TableDefinition::new("sys_user");
        table.add_column(ColumnDefinition::new("id", LogicalType::BigInt).auto_increment());
        table.add_column(
            ColumnDefinition::new("username", LogicalType::Varchar)
                .with_length(50)
                .not_null()
                .unique(),
        );
        table.set_id("id", IdStrategy::Auto, None);
        table
    }

    #[test]
    fn test_create_table_uses_identity() {
        let generator = SqlServerSqlGenerator::new();
        let statements = generator.generate_create_table(&sys_user());

        assert_eq!(
            statements[0],
            "CREATE TABLE [sys_user] (\n    [id] BIGINT IDENTITY(1,1) PRIMARY KEY,\n    [username] NVARCHAR(50) NOT NULL\n)"
        );
        assert_eq!(
            statements[1],
            "CREATE UNIQUE INDEX [uk_sys_user_username] ON [sys_user] ([username])"
        );
    }

    #[test]
    fn test_sequence_default() {
        let generator = SqlServerSqlGenerator::new();
        let mut table = TableDefinition::new("orders");
        table.add_column(ColumnDefinition::new("id", LogicalType::BigInt).not_null());
        table.set_id("id", IdStrategy::Sequence, Some("orders_seq".to_string()));

        let statements = generator.generate_create_table(&table);
        assert!(statements[0].starts_with("IF NOT EXISTS (SELECT 1 FROM sys.sequences"));
        assert!(statements[0].ends_with("CREATE SEQUENCE [dbo].[orders_seq] AS BIGINT START WITH 1 INCREMENT BY 1"));
        assert!(statements[1].contains("[id] BIGINT DEFAULT NEXT VALUE FOR [dbo].[orders_seq] PRIMARY KEY"));
    }

    #[test]
    fn test_column_comment_uses_extended_property() {
        let generator = SqlServerSqlGenerator::new();
        let table = sys_user();
        let column = ColumnDefinition::new("nickname", LogicalType::Varchar).with_comment("表示名");

        let statements = generator.generate_add_column(&table, &column);
        assert_eq!(statements[0], "ALTER TABLE [sys_user] ADD [nickname] NVARCHAR(255)");
        assert!(statements[1].starts_with("EXEC sp_addextendedproperty"));
        assert!(statements[1].contains("@level2name = N'nickname'"));
    }

    #[test]
    fn test_modify_column_alter_and_default() {
        let generator = SqlServerSqlGenerator::new();
        let table = sys_user();
        let desired = ColumnDefinition::new("score", LogicalType::Integer)
            .not_null()
            .with_default("0");
        let live = ColumnDefinition::new("score", LogicalType::Integer);
        let modification = ColumnModification {
            desired,
            live,
            changes: vec![ColumnChangeKind::Nullability, ColumnChangeKind::Default],
        };

        let statements = generator.generate_modify_column(&table, &modification);
        assert_eq!(statements.len(), 3);
        assert_eq!(statements[0], "ALTER TABLE [sys_user] ALTER COLUMN [score] INT NOT NULL");
        assert!(statements[1].starts_with("DECLARE @df"));
        assert_eq!(statements[2], "ALTER TABLE [sys_user] ADD DEFAULT 0 FOR [score]");
    }
}

// MySQL用SQLジェネレーター
//
// テーブル定義からMySQL用のDDL文を生成します。

use crate::adapters::sql_generator::{
    implicit_only_indexes, join_clauses, raw_column_definition, raw_primary_key_constraint,
    Identity, SqlGenerator,
};
use crate::adapters::sql_quote::{quote_columns, quote_identifier_mysql, quote_string_literal};
use crate::adapters::type_mapping::{MySqlTypeMapper, TypeMapper};
use crate::core::change_set::ColumnModification;
use crate::core::table::{ColumnDefinition, IndexDefinition, IndexType, TableDefinition};

/// MySQL用SQLジェネレーター
#[derive(Debug, Clone)]
pub struct MysqlSqlGenerator {}

impl MysqlSqlGenerator {
    /// 新しいMysqlSqlGeneratorを作成
    pub fn new() -> Self {
        Self {}
    }

    /// カラム定義を生成（主キー句の有無を指定）
    fn build_column_definition(
        &self,
        table: &TableDefinition,
        column: &ColumnDefinition,
        with_primary_key: bool,
    ) -> String {
        if let Some(raw) = raw_column_definition(self, column) {
            return raw;
        }

        let primary_key = with_primary_key && table.is_primary_key(&column.name, false);
        // SEQUENCEはMySQLにないためAUTO_INCREMENTで代替
        let auto_increment = Identity::of(table, column) != Identity::None;

        let mut parts = vec![self.quote(&column.name), self.type_mapper().format_sql_type(column)];

        // 主キーはNOT NULLを暗黙に含む
        if !column.nullable && !primary_key {
            parts.push("NOT NULL".to_string());
        }
        if auto_increment {
            parts.push("AUTO_INCREMENT".to_string());
        } else if let Some(default_value) = &column.default_value {
            parts.push(format!("DEFAULT {}", default_value));
        }
        if primary_key {
            parts.push("PRIMARY KEY".to_string());
        }
        if let Some(comment) = &column.comment {
            parts.push(format!("COMMENT {}", quote_string_literal(comment)));
        }

        join_clauses(parts)
    }

    /// テーブルオプション（ENGINE / CHARSET / COLLATE / COMMENT）
    fn table_options(&self, table: &TableDefinition) -> String {
        let mut options = Vec::new();
        if let Some(engine) = &table.engine {
            options.push(format!("ENGINE={}", engine));
        }
        if let Some(charset) = &table.charset {
            options.push(format!("DEFAULT CHARSET={}", charset));
        }
        if let Some(collation) = &table.collation {
            options.push(format!("COLLATE={}", collation));
        }
        if let Some(comment) = &table.comment {
            options.push(format!("COMMENT={}", quote_string_literal(comment)));
        }
        join_clauses(options)
    }

    fn index_keyword(index: &IndexDefinition) -> &'static str {
        match index.index_type {
            IndexType::Fulltext => "FULLTEXT INDEX",
            IndexType::Spatial => "SPATIAL INDEX",
            _ if index.unique => "UNIQUE INDEX",
            _ => "INDEX",
        }
    }
}

impl SqlGenerator for MysqlSqlGenerator {
    fn quote_fn(&self) -> fn(&str) -> String {
        quote_identifier_mysql
    }

    fn type_mapper(&self) -> &dyn TypeMapper {
        &MySqlTypeMapper
    }

    fn column_definition(&self, table: &TableDefinition, column: &ColumnDefinition) -> String {
        self.build_column_definition(table, column, true)
    }

    fn generate_create_table(&self, table: &TableDefinition) -> Vec<String> {
        let mut elements = Vec::new();

        // カラム定義
        for column in &table.columns {
            elements.push(format!("    {}", self.column_definition(table, column)));
        }

        if let Some(primary_key) = raw_primary_key_constraint(self, table) {
            elements.push(format!("    {}", primary_key));
        }

        // 単一カラムのユニーク制約はテーブル定義内に含める
        for index in implicit_only_indexes(table) {
            elements.push(format!(
                "    UNIQUE KEY {} ({})",
                self.quote(&index.name),
                quote_columns(&index.columns, self.quote_fn())
            ));
        }

        let mut create = format!(
            "CREATE TABLE {} (\n{}\n)",
            self.table_name(table),
            elements.join(",\n")
        );
        let options = self.table_options(table);
        if !options.is_empty() {
            create.push(' ');
            create.push_str(&options);
        }

        let mut statements = vec![create];
        for index in &table.indexes {
            statements.extend(self.generate_create_index(table, index));
        }
        statements
    }

    fn generate_add_column(
        &self,
        table: &TableDefinition,
        column: &ColumnDefinition,
    ) -> Vec<String> {
        vec![format!(
            "ALTER TABLE {} ADD COLUMN {}",
            self.table_name(table),
            self.column_definition(table, column)
        )]
    }

    fn generate_modify_column(
        &self,
        table: &TableDefinition,
        modification: &ColumnModification,
    ) -> Vec<String> {
        // MODIFY COLUMNは完全なカラム定義が必要
        vec![format!(
            "ALTER TABLE {} MODIFY COLUMN {}",
            self.table_name(table),
            self.build_column_definition(table, &modification.desired, false)
        )]
    }

    fn generate_create_index(
        &self,
        table: &TableDefinition,
        index: &IndexDefinition,
    ) -> Vec<String> {
        let mut sql = format!(
            "CREATE {} {} ON {} ({})",
            Self::index_keyword(index),
            self.quote(&index.name),
            self.table_name(table),
            quote_columns(&index.columns, self.quote_fn())
        );
        match index.index_type {
            IndexType::Btree => sql.push_str(" USING BTREE"),
            IndexType::Hash => sql.push_str(" USING HASH"),
            IndexType::Fulltext | IndexType::Spatial => {}
        }
        if let Some(comment) = &index.comment {
            sql.push_str(&format!(" COMMENT {}", quote_string_literal(comment)));
        }
        vec![sql]
    }

    fn generate_drop_index(&self, table: &TableDefinition, index_name: &str) -> String {
        format!(
            "DROP INDEX {} ON {}",
            self.quote(index_name),
            self.table_name(table)
        )
    }
}

impl Default for MysqlSqlGenerator {
    fn default() -> Self {
        Self::new()
    }
}

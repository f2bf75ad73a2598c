// SQL生成アダプター
//
// テーブル定義と変更セットから各データベース方言用のDDL文を生成するアダプター層。

pub mod mysql;
pub mod oracle;
pub mod postgres;
pub mod sqlserver;

pub use mysql::MysqlSqlGenerator;
pub use oracle::OracleSqlGenerator;
pub use postgres::PostgresSqlGenerator;
pub use sqlserver::SqlServerSqlGenerator;

use crate::adapters::sql_quote::{qualify, quote_columns};
use crate::adapters::type_mapping::TypeMapper;
use crate::core::change_set::ColumnModification;
use crate::core::config::Dialect;
use crate::core::table::{ColumnDefinition, IdStrategy, IndexDefinition, TableDefinition};

/// 主キーカラムの採番方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity<'a> {
    /// 採番なし
    None,
    /// 自動採番（AUTO_INCREMENT / IDENTITY）
    AutoIncrement,
    /// シーケンスによる採番
    Sequence(&'a str),
}

impl<'a> Identity<'a> {
    /// カラムの採番方式を判定
    ///
    /// SEQUENCE戦略でシーケンス名がない場合は自動採番にフォールバックします。
    pub fn of(table: &'a TableDefinition, column: &ColumnDefinition) -> Self {
        if let Some(id) = &table.id {
            if id.column == column.name && id.strategy == IdStrategy::Sequence {
                return match id.sequence_name.as_deref() {
                    Some(name) => Identity::Sequence(name),
                    None => Identity::AutoIncrement,
                };
            }
        }
        if column.auto_increment {
            Identity::AutoIncrement
        } else {
            Identity::None
        }
    }
}

/// SQLジェネレータートレイト
///
/// 各データベース方言用のSQLジェネレーターが実装すべきインターフェース。
/// 識別子は常にクォートされ、テーブル名はスキーマ修飾されます。
pub trait SqlGenerator: Send + Sync {
    /// 識別子クォート関数
    fn quote_fn(&self) -> fn(&str) -> String;

    /// 方言の型マッパー
    fn type_mapper(&self) -> &dyn TypeMapper;

    /// 識別子をクォート
    fn quote(&self, identifier: &str) -> String {
        (self.quote_fn())(identifier)
    }

    /// スキーマ修飾付きのテーブル名
    fn table_name(&self, table: &TableDefinition) -> String {
        qualify(table.schema.as_deref(), &table.name, self.quote_fn())
    }

    /// カラム定義のSQL文字列を生成
    ///
    /// # Arguments
    ///
    /// * `table` - カラムが属するテーブル（主キー・採番の判定に使用）
    /// * `column` - カラム定義
    fn column_definition(&self, table: &TableDefinition, column: &ColumnDefinition) -> String;

    /// CREATE TABLE文と付随する文（シーケンス、コメント、インデックス）を生成
    fn generate_create_table(&self, table: &TableDefinition) -> Vec<String>;

    /// カラム追加文を生成
    fn generate_add_column(&self, table: &TableDefinition, column: &ColumnDefinition)
        -> Vec<String>;

    /// カラム変更文を生成
    ///
    /// 実テーブルのカラムと比較し、変化した属性のみを変更します。
    fn generate_modify_column(
        &self,
        table: &TableDefinition,
        modification: &ColumnModification,
    ) -> Vec<String>;

    /// カラム削除文を生成
    fn generate_drop_column(&self, table: &TableDefinition, column: &str) -> Vec<String> {
        vec![format!(
            "ALTER TABLE {} DROP COLUMN {}",
            self.table_name(table),
            self.quote(column)
        )]
    }

    /// CREATE INDEX文を生成
    fn generate_create_index(&self, table: &TableDefinition, index: &IndexDefinition)
        -> Vec<String>;

    /// DROP INDEX文を生成
    fn generate_drop_index(&self, table: &TableDefinition, index_name: &str) -> String;
}

/// 方言に応じたSQLジェネレーターを作成
pub fn create_sql_generator(dialect: Dialect) -> Box<dyn SqlGenerator> {
    match dialect {
        Dialect::MySQL => Box::new(MysqlSqlGenerator::new()),
        Dialect::PostgreSQL => Box::new(PostgresSqlGenerator::new()),
        Dialect::SqlServer => Box::new(SqlServerSqlGenerator::new()),
        Dialect::Oracle => Box::new(OracleSqlGenerator::new()),
    }
}

/// 生のカラム定義を使う場合の定義文字列
pub(crate) fn raw_column_definition(
    generator: &dyn SqlGenerator,
    column: &ColumnDefinition,
) -> Option<String> {
    column
        .column_definition
        .as_ref()
        .map(|raw| format!("{} {}", generator.quote(&column.name), raw.trim()))
}

/// 主キーが生のカラム定義の場合にテーブル制約として付与する主キー
pub(crate) fn raw_primary_key_constraint(
    generator: &dyn SqlGenerator,
    table: &TableDefinition,
) -> Option<String> {
    let id = table.id.as_ref()?;
    let column = table.get_column(&id.column, true)?;
    if !column.is_raw() {
        return None;
    }
    Some(format!(
        "PRIMARY KEY ({})",
        quote_columns(std::slice::from_ref(&column.name), generator.quote_fn())
    ))
}

/// 明示的インデックスに隠されていない暗黙のユニークインデックス
pub(crate) fn implicit_only_indexes(table: &TableDefinition) -> Vec<IndexDefinition> {
    table
        .implicit_unique_indexes()
        .into_iter()
        .filter(|implicit| {
            !table
                .indexes
                .iter()
                .any(|i| i.name.eq_ignore_ascii_case(&implicit.name))
        })
        .collect()
}

/// 空要素を除いて空白区切りで結合
pub(crate) fn join_clauses(parts: Vec<String>) -> String {
    parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

// 型マッピング
//
// 論理型 <-> 方言固有のSQL型文字列 の双方向変換と、
// カタログから取得した型文字列の正規化を方言ごとに提供します。

pub mod common;
mod mysql_mapper;
mod oracle_mapper;
mod postgres_mapper;
mod sqlserver_mapper;

pub use mysql_mapper::MySqlTypeMapper;
pub use oracle_mapper::OracleTypeMapper;
pub use postgres_mapper::PostgresTypeMapper;
pub use sqlserver_mapper::SqlServerTypeMapper;

use crate::core::config::Dialect;
use crate::core::table::{ColumnDefinition, LogicalType};

/// 型メタデータ
///
/// カタログから取得した型の追加情報を保持します。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeMetadata {
    /// 文字列型の最大長（SQL Serverでは -1 がMAX）
    pub char_max_length: Option<i64>,
    /// 数値型の精度
    pub numeric_precision: Option<i64>,
    /// 数値型の小数点以下桁数
    pub numeric_scale: Option<i64>,
}

/// 方言固有の型マッピング
pub trait TypeMapper: Send + Sync {
    /// カラム定義からSQL型文字列へ変換
    ///
    /// # Arguments
    /// * `column` - 変換対象のカラム（論理型・長さ・精度を参照）
    ///
    /// # Returns
    /// SQL型文字列（例: "VARCHAR(50)", "BIGINT"）
    fn format_sql_type(&self, column: &ColumnDefinition) -> String;

    /// 正規化済みのSQL型文字列から論理型へ変換
    ///
    /// 変換できない場合はNoneを返します。
    fn parse_sql_type(&self, sql_type: &str) -> Option<LogicalType>;

    /// 比較用にSQL型文字列を正規化
    fn normalize_sql_type(&self, sql_type: &str) -> String {
        common::canonical_type(sql_type)
    }

    /// カタログの型名と追加情報から物理型文字列を組み立てる
    fn physical_type(&self, data_type: &str, metadata: &TypeMetadata) -> String {
        let _ = metadata;
        self.normalize_sql_type(data_type)
    }

    /// 比較用にデフォルト値を正規化
    fn normalize_default(&self, value: Option<&str>) -> Option<String> {
        common::normalize_default_value(value)
    }

    /// パース失敗時のフォールバック型
    fn default_type(&self) -> LogicalType {
        LogicalType::Text
    }
}

/// 方言に応じた型マッパーを作成
pub fn create_type_mapper(dialect: Dialect) -> Box<dyn TypeMapper> {
    match dialect {
        Dialect::MySQL => Box::new(MySqlTypeMapper),
        Dialect::PostgreSQL => Box::new(PostgresTypeMapper),
        Dialect::SqlServer => Box::new(SqlServerTypeMapper),
        Dialect::Oracle => Box::new(OracleTypeMapper),
    }
}

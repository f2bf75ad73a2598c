// データベースイントロスペクター
//
// 各方言のカタログから実テーブルの構造を読み取り、
// 方言非依存のTableDefinitionとして組み立てます。

mod mysql;
mod oracle;
mod postgres;
mod sqlserver;

pub use mysql::MySqlIntrospector;
pub use oracle::OracleIntrospector;
pub use postgres::PostgresIntrospector;
pub use sqlserver::SqlServerIntrospector;

use crate::adapters::connection::SchemaConnection;
use crate::adapters::type_mapping::{TypeMapper, TypeMetadata};
use crate::core::config::Dialect;
use crate::core::error::DatabaseError;
use crate::core::table::{
    ColumnDefinition, IdStrategy, IndexDefinition, IndexType, TableDefinition,
};
use async_trait::async_trait;

/// データベースイントロスペクタートレイト
#[async_trait]
pub trait DatabaseIntrospector: Send + Sync {
    /// テーブルの実際の構造を取得
    ///
    /// # Arguments
    /// * `connection` - カタログ問い合わせに使う接続
    /// * `schema` - スキーマ名（Noneの場合は接続の既定スキーマ）
    /// * `table` - テーブル名
    ///
    /// # Returns
    /// テーブルが存在しない場合はNone
    async fn introspect(
        &self,
        connection: &dyn SchemaConnection,
        schema: Option<&str>,
        table: &str,
    ) -> Result<Option<TableDefinition>, DatabaseError>;
}

/// 方言に応じたイントロスペクターを作成
pub fn create_introspector(dialect: Dialect) -> Box<dyn DatabaseIntrospector> {
    match dialect {
        Dialect::MySQL => Box::new(MySqlIntrospector::new()),
        Dialect::PostgreSQL => Box::new(PostgresIntrospector::new()),
        Dialect::SqlServer => Box::new(SqlServerIntrospector::new()),
        Dialect::Oracle => Box::new(OracleIntrospector::new()),
    }
}

/// カタログから読み取ったテーブル属性
#[derive(Debug, Clone, Default)]
pub struct RawTableInfo {
    pub comment: Option<String>,
    pub engine: Option<String>,
    pub charset: Option<String>,
    pub collation: Option<String>,
}

/// カタログから読み取ったカラム情報
#[derive(Debug, Clone, Default)]
pub struct RawColumnInfo {
    pub name: String,
    /// カタログ上の型名（方言の型マッパーで物理型へ変換する）
    pub data_type: String,
    pub metadata: TypeMetadata,
    pub nullable: bool,
    pub default_value: Option<String>,
    pub auto_increment: bool,
    pub comment: Option<String>,
}

/// カタログから読み取ったインデックス構成カラム（1行 = 1カラム）
#[derive(Debug, Clone, Default)]
pub struct RawIndexInfo {
    pub index_name: String,
    pub column_name: String,
    pub unique: bool,
    pub primary: bool,
    pub index_type: Option<String>,
}

/// テーブル名とスキーマからバインドパラメータとスキーマ条件を組み立てる
///
/// スキーマ指定がない場合は `default_schema` のSQL式を条件に使います。
pub(crate) fn schema_filter<'a>(
    table: &'a str,
    schema: Option<&'a str>,
    placeholder: &str,
    default_schema: &str,
) -> (Vec<&'a str>, String) {
    match schema.filter(|s| !s.is_empty()) {
        Some(schema) => (vec![table, schema], placeholder.to_string()),
        None => (vec![table], default_schema.to_string()),
    }
}

/// カタログのインデックス方式名を変換
pub(crate) fn parse_index_type(value: Option<&str>) -> IndexType {
    match value.map(|v| v.trim().to_ascii_uppercase()).as_deref() {
        Some("HASH") => IndexType::Hash,
        Some("FULLTEXT") | Some("GIN") | Some("FULLTEXT INDEX") => IndexType::Fulltext,
        Some("SPATIAL") | Some("GIST") | Some("SPATIAL INDEX") => IndexType::Spatial,
        _ => IndexType::Btree,
    }
}

/// カタログ情報から実テーブル定義を組み立てる
///
/// 主キーのインデックスはインデックス一覧から除外し、単一カラムの主キーをIDとして設定します。
pub fn assemble_table(
    name: &str,
    schema: Option<&str>,
    info: RawTableInfo,
    columns: Vec<RawColumnInfo>,
    index_rows: Vec<RawIndexInfo>,
    mapper: &dyn TypeMapper,
) -> TableDefinition {
    let mut table = TableDefinition::new(name);
    table.schema = schema.map(str::to_string);
    table.comment = info.comment;
    table.engine = info.engine;
    table.charset = info.charset;
    table.collation = info.collation;

    for raw in columns {
        let physical = mapper.physical_type(&raw.data_type, &raw.metadata);
        let logical_type = mapper
            .parse_sql_type(&physical)
            .unwrap_or_else(|| mapper.default_type());

        let mut column = ColumnDefinition::new(&raw.name, logical_type);
        if logical_type.has_length() {
            column.length = raw
                .metadata
                .char_max_length
                .filter(|len| *len > 0)
                .and_then(|len| u32::try_from(len).ok());
        }
        if logical_type.has_precision() {
            column.precision = raw.metadata.numeric_precision.and_then(|p| u32::try_from(p).ok());
            column.scale = raw.metadata.numeric_scale.and_then(|s| u32::try_from(s).ok());
        }
        column.nullable = raw.nullable;
        column.default_value = raw.default_value;
        column.auto_increment = raw.auto_increment;
        column.comment = raw.comment;
        column.physical_type = Some(physical);
        table.add_column(column);
    }

    let mut primary_key: Vec<String> = Vec::new();
    for row in index_rows {
        if row.primary {
            primary_key.push(row.column_name);
            continue;
        }
        match table.indexes.iter_mut().find(|i| i.name == row.index_name) {
            Some(index) => index.columns.push(row.column_name),
            None => {
                let mut index =
                    IndexDefinition::new(&row.index_name, vec![row.column_name], row.unique);
                index.index_type = parse_index_type(row.index_type.as_deref());
                table.add_index(index);
            }
        }
    }

    if let [column] = primary_key.as_slice() {
        let strategy = match table.get_column(column, true) {
            Some(c) if c.auto_increment => IdStrategy::Identity,
            _ => IdStrategy::Assigned,
        };
        let column = column.clone();
        table.set_id(&column, strategy, None);
    }

    table
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::adapters::connection::{CatalogRow, SchemaConnection};
    use crate::core::error::DatabaseError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// SQL断片に応じて固定の行を返すテスト用接続
    pub struct StubConnection {
        pub product: String,
        pub responses: Vec<(&'static str, Vec<CatalogRow>)>,
        pub queries: Mutex<Vec<(String, Vec<String>)>>,
    }

    impl StubConnection {
        pub fn new(product: &str, responses: Vec<(&'static str, Vec<CatalogRow>)>) -> Self {
            Self {
                product: product.to_string(),
                responses,
                queries: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SchemaConnection for StubConnection {
        fn product_name(&self) -> String {
            self.product.clone()
        }

        async fn fetch_rows(
            &self,
            sql: &str,
            params: &[&str],
        ) -> Result<Vec<CatalogRow>, DatabaseError> {
            self.queries.lock().unwrap().push((
                sql.to_string(),
                params.iter().map(|p| p.to_string()).collect(),
            ));
            Ok(self
                .responses
                .iter()
                .find(|(fragment, _)| sql.contains(fragment))
                .map(|(_, rows)| rows.clone())
                .unwrap_or_default())
        }

        async fn execute(&self, _sql: &str) -> Result<(), DatabaseError> {
            Ok(())
        }
    }
}

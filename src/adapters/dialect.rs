// SQL方言
//
// DDL生成（SqlGenerator）とカタログ読み取り（DatabaseIntrospector）を
// 1つの方言オブジェクトにまとめ、接続の製品名から一度だけ選択します。

use crate::adapters::connection::SchemaConnection;
use crate::adapters::database_introspector::{create_introspector, DatabaseIntrospector};
use crate::adapters::sql_generator::{create_sql_generator, SqlGenerator};
use crate::core::change_set::{ChangeSet, ColumnModification};
use crate::core::config::Dialect;
use crate::core::error::{DatabaseError, MaintenanceError, MetadataError};
use crate::core::table::{ColumnDefinition, IdStrategy, IndexDefinition, TableDefinition};
use tracing::debug;

/// SQL方言
///
/// 識別子クォート、型マッピング、DDL生成、イントロスペクションを提供します。
pub struct SqlDialect {
    kind: Dialect,
    generator: Box<dyn SqlGenerator>,
    introspector: Box<dyn DatabaseIntrospector>,
}

impl std::fmt::Debug for SqlDialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlDialect").field("kind", &self.kind).finish()
    }
}

impl SqlDialect {
    /// 方言種別から標準のジェネレーターとイントロスペクターで作成
    pub fn new(kind: Dialect) -> Self {
        Self {
            kind,
            generator: create_sql_generator(kind),
            introspector: create_introspector(kind),
        }
    }

    /// イントロスペクターを差し替えて作成
    pub fn with_introspector(kind: Dialect, introspector: Box<dyn DatabaseIntrospector>) -> Self {
        Self {
            kind,
            generator: create_sql_generator(kind),
            introspector,
        }
    }

    /// 方言種別
    pub fn kind(&self) -> Dialect {
        self.kind
    }

    /// 識別子をクォート
    pub fn quote(&self, identifier: &str) -> String {
        self.generator.quote(identifier)
    }

    /// カラムの物理型
    pub fn map_type(&self, column: &ColumnDefinition) -> String {
        self.generator.type_mapper().format_sql_type(column)
    }

    /// 比較用に型文字列を正規化
    pub fn normalize_type(&self, sql_type: &str) -> String {
        self.generator.type_mapper().normalize_sql_type(sql_type)
    }

    /// 比較用にデフォルト値を正規化
    pub fn normalize_default(&self, value: Option<&str>) -> Option<String> {
        self.generator.type_mapper().normalize_default(value)
    }

    /// 識別子の大文字小文字を区別するか
    pub fn identifiers_case_sensitive(&self) -> bool {
        self.kind.identifiers_case_sensitive()
    }

    pub fn render_create_table(&self, table: &TableDefinition) -> Vec<String> {
        self.generator.generate_create_table(table)
    }

    pub fn render_add_column(&self, table: &TableDefinition, column: &ColumnDefinition) -> Vec<String> {
        self.generator.generate_add_column(table, column)
    }

    pub fn render_modify_column(
        &self,
        table: &TableDefinition,
        modification: &ColumnModification,
    ) -> Vec<String> {
        self.generator.generate_modify_column(table, modification)
    }

    pub fn render_drop_column(&self, table: &TableDefinition, column: &str) -> Vec<String> {
        self.generator.generate_drop_column(table, column)
    }

    pub fn render_create_index(&self, table: &TableDefinition, index: &IndexDefinition) -> Vec<String> {
        self.generator.generate_create_index(table, index)
    }

    pub fn render_drop_index(&self, table: &TableDefinition, index_name: &str) -> String {
        self.generator.generate_drop_index(table, index_name)
    }

    /// 変更セットを実行順のDDL文に変換
    ///
    /// 順序: テーブル作成、カラム追加、カラム変更、カラム削除、
    /// インデックス追加（再作成は削除してから作成）、インデックス削除
    pub fn render_changes(&self, desired: &TableDefinition, changes: &ChangeSet) -> Vec<String> {
        if changes.create {
            return self.render_create_table(desired);
        }

        let mut statements = Vec::new();
        for column in &changes.columns_to_add {
            statements.extend(self.render_add_column(desired, column));
        }
        for modification in &changes.columns_to_modify {
            statements.extend(self.render_modify_column(desired, modification));
        }
        for column in &changes.columns_to_drop {
            statements.extend(self.render_drop_column(desired, column));
        }
        for index in &changes.indexes_to_rebuild {
            statements.push(self.render_drop_index(desired, &index.name));
            statements.extend(self.render_create_index(desired, index));
        }
        for index in &changes.indexes_to_add {
            statements.extend(self.render_create_index(desired, index));
        }
        for index in &changes.indexes_to_drop {
            statements.push(self.render_drop_index(desired, index));
        }
        statements
    }

    /// 実テーブルの構造を取得
    pub async fn introspect(
        &self,
        connection: &dyn SchemaConnection,
        schema: Option<&str>,
        table: &str,
    ) -> Result<Option<TableDefinition>, DatabaseError> {
        self.introspector.introspect(connection, schema, table).await
    }

    /// 方言固有の制約に照らしてテーブル定義を検査
    pub fn check_definition(&self, table: &TableDefinition) -> Result<(), MetadataError> {
        if let Some(id) = &table.id {
            if id.strategy == IdStrategy::Sequence
                && id.sequence_name.is_none()
                && self.kind.requires_sequence_name()
            {
                return Err(MetadataError::MissingSequenceName {
                    table: table.name.clone(),
                    dialect: self.kind.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// 方言ファクトリー
pub struct DialectFactory;

impl DialectFactory {
    /// 製品名から方言種別を判定
    pub fn detect(product: &str) -> Result<Dialect, MaintenanceError> {
        let name = product.to_ascii_lowercase();
        if name.contains("mysql") || name.contains("mariadb") {
            Ok(Dialect::MySQL)
        } else if name.contains("postgres") {
            Ok(Dialect::PostgreSQL)
        } else if name.contains("sql server") || name.contains("sqlserver") || name.contains("mssql") {
            Ok(Dialect::SqlServer)
        } else if name.contains("oracle") {
            Ok(Dialect::Oracle)
        } else {
            Err(MaintenanceError::UnsupportedDialect {
                product: product.to_string(),
            })
        }
    }

    /// 方言種別から方言を作成
    pub fn create(kind: Dialect) -> SqlDialect {
        SqlDialect::new(kind)
    }

    /// 接続の製品名から方言を選択
    pub fn select(connection: &dyn SchemaConnection) -> Result<SqlDialect, MaintenanceError> {
        let product = connection.product_name();
        let kind = Self::detect(&product)?;
        debug!(product = %product, dialect = %kind, "Selected SQL dialect");
        Ok(Self::create(kind))
    }
}

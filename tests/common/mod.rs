// 統合テスト共通のヘルパー
//
// - ScriptedConnection: DDLの失敗を台本どおりに返し、実行したSQLを記録する接続
//   （カタログクエリにはSQL断片ごとに固定の行を返す）
// - InMemoryCatalog / InMemoryIntrospector: 実テーブル定義をメモリ上に保持するイントロスペクター
// - エンティティ記述子のフィクスチャ

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tablewright::adapters::connection::{CatalogRow, SchemaConnection};
use tablewright::adapters::database_introspector::DatabaseIntrospector;
use tablewright::adapters::dialect::SqlDialect;
use tablewright::core::config::{Dialect, TableMaintenanceConfig};
use tablewright::core::entity::{ColumnMarker, EntityDescriptor, FieldDescriptor, TableMarker};
use tablewright::core::error::DatabaseError;
use tablewright::core::table::TableDefinition;
use tablewright::services::metadata_extractor::{MetadataExtractor, NamingOptions};

/// 台本付きの接続
///
/// `fail_times(pattern, n)` で、`pattern` を含むSQLを n 回失敗させます。
#[derive(Debug, Default)]
pub struct ScriptedConnection {
    product: String,
    rows: Vec<(&'static str, Vec<CatalogRow>)>,
    failures: Mutex<Vec<(String, u32)>>,
    executed: Mutex<Vec<String>>,
    attempts: Mutex<u32>,
    delay: Option<Duration>,
}

impl ScriptedConnection {
    pub fn new(product: &str) -> Self {
        Self {
            product: product.to_string(),
            ..Default::default()
        }
    }

    pub fn mysql() -> Self {
        Self::new("MySQL")
    }

    /// `fragment` を含むカタログクエリに返す行
    pub fn with_rows(mut self, fragment: &'static str, rows: Vec<CatalogRow>) -> Self {
        self.rows.push((fragment, rows));
        self
    }

    /// 実行ごとに待機する
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fail_times(&self, pattern: &str, times: u32) {
        self.failures
            .lock()
            .unwrap()
            .push((pattern.to_string(), times));
    }

    /// 成功したSQL
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    /// 失敗を含む実行回数
    pub fn attempts(&self) -> u32 {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl SchemaConnection for ScriptedConnection {
    fn product_name(&self) -> String {
        self.product.clone()
    }

    async fn fetch_rows(
        &self,
        sql: &str,
        _params: &[&str],
    ) -> Result<Vec<CatalogRow>, DatabaseError> {
        Ok(self
            .rows
            .iter()
            .find(|(fragment, _)| sql.contains(fragment))
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default())
    }

    async fn execute(&self, sql: &str) -> Result<(), DatabaseError> {
        *self.attempts.lock().unwrap() += 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let failed = {
            let mut failures = self.failures.lock().unwrap();
            match failures
                .iter_mut()
                .find(|(pattern, remaining)| *remaining > 0 && sql.contains(pattern.as_str()))
            {
                Some((_, remaining)) => {
                    *remaining -= 1;
                    true
                }
                None => false,
            }
        };
        if failed {
            return Err(DatabaseError::Query {
                message: "Lock wait timeout exceeded".to_string(),
            });
        }

        self.executed.lock().unwrap().push(sql.to_string());
        Ok(())
    }
}

/// メモリ上の実テーブル定義
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    tables: Arc<Mutex<HashMap<String, TableDefinition>>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, table: TableDefinition) {
        self.tables.lock().unwrap().insert(table.name.clone(), table);
    }

    pub fn get(&self, name: &str) -> Option<TableDefinition> {
        self.tables.lock().unwrap().get(name).cloned()
    }

    /// カタログを参照する方言を作成
    pub fn dialect(&self, kind: Dialect) -> SqlDialect {
        SqlDialect::with_introspector(
            kind,
            Box::new(InMemoryIntrospector {
                catalog: self.clone(),
            }),
        )
    }
}

/// InMemoryCatalog を参照するイントロスペクター
#[derive(Debug)]
pub struct InMemoryIntrospector {
    catalog: InMemoryCatalog,
}

#[async_trait]
impl DatabaseIntrospector for InMemoryIntrospector {
    async fn introspect(
        &self,
        _connection: &dyn SchemaConnection,
        _schema: Option<&str>,
        table: &str,
    ) -> Result<Option<TableDefinition>, DatabaseError> {
        Ok(self.catalog.get(table))
    }
}

/// テスト用の設定（リトライ待機を短くする）
pub fn fast_config() -> TableMaintenanceConfig {
    TableMaintenanceConfig {
        retry_backoff_millis: 1,
        ..Default::default()
    }
}

/// エンティティ記述子から望ましいテーブル定義を作成
pub fn desired_table(entity: &EntityDescriptor) -> TableDefinition {
    MetadataExtractor::new(NamingOptions::default())
        .extract(entity)
        .unwrap()
}

/// `app::domain::SysUser`（id BIGINT自動採番、username VARCHAR(50) NOT NULL UNIQUE）
pub fn sys_user() -> EntityDescriptor {
    EntityDescriptor::new("app::domain::SysUser")
        .with_table(TableMarker::default())
        .with_field(FieldDescriptor::new("id", "i64").identifier())
        .with_field(FieldDescriptor::new("username", "String").with_column(ColumnMarker {
            length: Some(50),
            unique: true,
            ..Default::default()
        }))
}

/// 主キーと1カラムだけを持つエンティティ
pub fn simple_entity(type_name: &str) -> EntityDescriptor {
    EntityDescriptor::new(type_name)
        .with_table(TableMarker::default())
        .with_field(FieldDescriptor::new("id", "i64").identifier())
        .with_field(FieldDescriptor::new("title", "Option<String>"))
}

/// IDフィールドを2つ持つため抽出に失敗するエンティティ
pub fn entity_with_two_identifiers(type_name: &str) -> EntityDescriptor {
    simple_entity(type_name).with_field(FieldDescriptor::new("code", "i64").identifier())
}

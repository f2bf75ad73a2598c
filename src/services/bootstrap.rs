// 組み立て
//
// 設定・エンティティレジストリ・接続から、方言とメンテナンスサービスを一度だけ組み立てます。

use crate::adapters::connection::SchemaConnection;
use crate::adapters::dialect::{DialectFactory, SqlDialect};
use crate::core::config::TableMaintenanceConfig;
use crate::core::entity::EntityDescriptor;
use crate::core::error::MaintenanceError;
use crate::services::async_table_maintenance::AsyncTableMaintenanceService;
use crate::services::entity_registry::EntityRegistry;
use crate::services::entity_scanner::EntityScanner;
use crate::services::table_maintenance::TableMaintenanceService;
use crate::services::worker_pool::WorkerPoolConfig;
use std::sync::Arc;
use tracing::debug;

/// テーブルメンテナンスのコンテキスト
pub struct TableMaintenanceContext {
    pub config: Arc<TableMaintenanceConfig>,
    pub registry: EntityRegistry,
    pub connection: Arc<dyn SchemaConnection>,
    pub dialect: Arc<SqlDialect>,
    pub service: Arc<TableMaintenanceService>,
}

impl std::fmt::Debug for TableMaintenanceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableMaintenanceContext")
            .field("dialect", &self.dialect.kind())
            .field("entities", &self.registry.len())
            .finish()
    }
}

impl TableMaintenanceContext {
    /// 接続の製品名から方言を選択して組み立てる
    ///
    /// # Errors
    ///
    /// 設定値が不正な場合は `Config`、未対応のデータベースの場合は `UnsupportedDialect`
    pub fn build(
        config: TableMaintenanceConfig,
        registry: EntityRegistry,
        connection: Arc<dyn SchemaConnection>,
    ) -> Result<Self, MaintenanceError> {
        config.validate()?;
        let dialect = DialectFactory::select(connection.as_ref())?;
        Ok(Self::with_dialect(config, registry, connection, dialect))
    }

    /// 方言を指定して組み立てる
    pub fn with_dialect(
        config: TableMaintenanceConfig,
        registry: EntityRegistry,
        connection: Arc<dyn SchemaConnection>,
        dialect: SqlDialect,
    ) -> Self {
        let config = Arc::new(config);
        let dialect = Arc::new(dialect);
        let service = Arc::new(TableMaintenanceService::new(
            config.clone(),
            connection.clone(),
            dialect.clone(),
        ));
        debug!(
            dialect = %dialect.kind(),
            entities = registry.len(),
            "Table maintenance context built"
        );

        Self {
            config,
            registry,
            connection,
            dialect,
            service,
        }
    }

    /// 設定に従ってメンテナンス対象のエンティティを選ぶ
    pub fn candidates(&self) -> Vec<EntityDescriptor> {
        EntityScanner::new(self.registry.clone()).scan(
            &self.config.entity_packages,
            &self.config.include_entities,
            &self.config.exclude_entities,
        )
    }

    /// 名前（完全修飾名・単純名・テーブル名）で対象エンティティを絞り込む
    pub fn select(&self, names: &[String]) -> Vec<EntityDescriptor> {
        let candidates = self.candidates();
        if names.is_empty() {
            return candidates;
        }
        candidates
            .into_iter()
            .filter(|entity| {
                names.iter().any(|name| {
                    name == &entity.type_name
                        || name == entity.simple_name()
                        || entity
                            .table
                            .as_ref()
                            .and_then(|t| t.name.as_deref())
                            .is_some_and(|table| table == name)
                })
            })
            .collect()
    }

    /// ワーカープール付きのサービスを作成
    pub fn async_service(&self) -> AsyncTableMaintenanceService {
        AsyncTableMaintenanceService::new(
            self.service.clone(),
            WorkerPoolConfig::from(self.config.as_ref()),
        )
    }
}

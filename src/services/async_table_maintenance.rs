// 非同期テーブルメンテナンスサービス
//
// TableMaintenanceService の処理をワーカープールに投入します。
// 非同期実行の失敗はログ出力のみで、呼び出し元には伝播しません。

use crate::core::entity::EntityDescriptor;
use crate::core::error::MaintenanceError;
use crate::core::report::{MaintenanceReport, TableReport};
use crate::services::table_maintenance::TableMaintenanceService;
use crate::services::worker_pool::{TaskHandle, WorkerPool, WorkerPoolConfig};
use std::sync::Arc;
use tracing::{error, info};

/// 非同期テーブルメンテナンスサービス
#[derive(Debug)]
pub struct AsyncTableMaintenanceService {
    service: Arc<TableMaintenanceService>,
    pool: WorkerPool,
}

impl AsyncTableMaintenanceService {
    pub fn new(service: Arc<TableMaintenanceService>, pool_config: WorkerPoolConfig) -> Self {
        Self {
            service,
            pool: WorkerPool::new(pool_config),
        }
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// バッチ全体を1つのタスクとして投入
    pub async fn submit_batch(
        &self,
        entities: Vec<EntityDescriptor>,
    ) -> Result<TaskHandle<Option<MaintenanceReport>>, MaintenanceError> {
        let service = self.service.clone();
        let count = entities.len();
        let handle = self
            .pool
            .submit(async move {
                match service.maintain_tables(&entities).await {
                    Ok(report) => Some(report),
                    Err(e) => {
                        error!("Async table maintenance aborted: {}", e);
                        None
                    }
                }
            })
            .await?;
        info!(entities = count, "Submitted table maintenance batch");
        Ok(handle)
    }

    /// エンティティごとにタスクを投入
    pub async fn submit_each(
        &self,
        entities: Vec<EntityDescriptor>,
    ) -> Result<Vec<TaskHandle<Option<TableReport>>>, MaintenanceError> {
        let mut handles = Vec::with_capacity(entities.len());
        for entity in entities {
            let service = self.service.clone();
            let handle = self
                .pool
                .submit(async move {
                    match service.maintain_table(&entity).await {
                        Ok(report) => Some(report),
                        Err(e) => {
                            error!(entity = %entity.type_name, "Async table maintenance failed: {}", e);
                            None
                        }
                    }
                })
                .await?;
            handles.push(handle);
        }
        info!(entities = handles.len(), "Submitted table maintenance tasks");
        Ok(handles)
    }

    /// 投入済みのタスクを待ってプールを停止
    pub async fn shutdown(&self) {
        self.pool.shutdown().await;
    }
}

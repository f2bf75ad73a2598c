// 起動オーケストレーター
//
// ホストアプリケーションの準備完了後に、メンテナンスを1プロセスにつき1回だけ実行します。
// enabled / auto-execute-on-startup / 環境ゲートに従い、
// async-enabled の場合はワーカープールに投入して即座に戻ります。
// continue-on-error が false ならバッチ全体を1タスク、true ならエンティティごとに投入します。

use crate::core::error::MaintenanceError;
use crate::core::report::MaintenanceReport;
use crate::services::async_table_maintenance::AsyncTableMaintenanceService;
use crate::services::bootstrap::TableMaintenanceContext;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

/// 実行しなかった理由
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// enabled が false
    Disabled,
    /// auto-execute-on-startup が false
    AutoExecuteDisabled,
    /// テスト環境で execute-in-test-environment が false
    TestEnvironment,
    /// 対象エンティティがない
    NoEntities,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Disabled => write!(f, "table maintenance is disabled"),
            SkipReason::AutoExecuteDisabled => write!(f, "auto-execute-on-startup is false"),
            SkipReason::TestEnvironment => write!(f, "running in a test environment"),
            SkipReason::NoEntities => write!(f, "no entities to maintain"),
        }
    }
}

/// 起動時実行の結果
#[derive(Debug)]
pub enum StartupOutcome {
    /// 実行しなかった
    Skipped(SkipReason),
    /// 同期実行が完了した
    Completed(MaintenanceReport),
    /// ワーカープールに投入した（エンティティ数）
    Submitted(usize),
    /// 既に実行済み
    AlreadyRan,
}

/// 起動オーケストレーター
#[derive(Debug)]
pub struct StartupOrchestrator {
    context: TableMaintenanceContext,
    async_service: Option<AsyncTableMaintenanceService>,
    ran: AtomicBool,
}

impl StartupOrchestrator {
    pub fn new(context: TableMaintenanceContext) -> Self {
        let async_service = context
            .config
            .async_enabled
            .then(|| context.async_service());
        Self {
            context,
            async_service,
            ran: AtomicBool::new(false),
        }
    }

    pub fn context(&self) -> &TableMaintenanceContext {
        &self.context
    }

    /// 実行済みかどうか
    pub fn has_run(&self) -> bool {
        self.ran.load(Ordering::SeqCst)
    }

    /// 準備完了シグナルの受信時に呼ぶ
    ///
    /// 同期実行のエラーは `continue-on-error` が false の場合のみ返ります。
    pub async fn on_ready(&self) -> Result<StartupOutcome, MaintenanceError> {
        let config = &self.context.config;
        if !config.enabled {
            return Ok(self.skip(SkipReason::Disabled));
        }
        if !config.auto_execute_on_startup {
            return Ok(self.skip(SkipReason::AutoExecuteDisabled));
        }
        if config.is_test_environment() && !config.execute_in_test_environment {
            return Ok(self.skip(SkipReason::TestEnvironment));
        }
        if self.ran.swap(true, Ordering::SeqCst) {
            return Ok(StartupOutcome::AlreadyRan);
        }
        self.run().await
    }

    /// 手動実行（実行済みフラグ・自動実行設定・環境ゲートを無視）
    pub async fn run_manually(&self) -> Result<StartupOutcome, MaintenanceError> {
        if !self.context.config.enabled {
            return Ok(self.skip(SkipReason::Disabled));
        }
        self.ran.store(true, Ordering::SeqCst);
        self.run().await
    }

    /// 非同期実行中のタスクを待ってプールを停止
    pub async fn shutdown(&self) {
        if let Some(async_service) = &self.async_service {
            async_service.shutdown().await;
        }
    }

    async fn run(&self) -> Result<StartupOutcome, MaintenanceError> {
        let candidates = self.context.candidates();
        if candidates.is_empty() {
            return Ok(self.skip(SkipReason::NoEntities));
        }
        info!(entities = candidates.len(), "Starting table maintenance");

        let count = candidates.len();
        match &self.async_service {
            // 中断ポリシーはバッチ単位でのみ守れる
            Some(async_service) if !self.context.config.continue_on_error => {
                async_service.submit_batch(candidates).await?;
                Ok(StartupOutcome::Submitted(count))
            }
            Some(async_service) => {
                async_service.submit_each(candidates).await?;
                Ok(StartupOutcome::Submitted(count))
            }
            None => {
                let report = self.context.service.maintain_tables(&candidates).await?;
                Ok(StartupOutcome::Completed(report))
            }
        }
    }

    fn skip(&self, reason: SkipReason) -> StartupOutcome {
        info!("Table maintenance skipped: {}", reason);
        StartupOutcome::Skipped(reason)
    }
}

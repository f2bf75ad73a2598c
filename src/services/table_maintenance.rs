// テーブルメンテナンスサービス
//
// エンティティごとに 抽出 → イントロスペクト → 差分 → 検証 → バックアップ → 実行
// のパイプラインを進め、状態遷移をTableReportに記録します。

use crate::adapters::connection::SchemaConnection;
use crate::adapters::dialect::SqlDialect;
use crate::core::change_set::ChangeSet;
use crate::core::config::TableMaintenanceConfig;
use crate::core::entity::EntityDescriptor;
use crate::core::error::{MaintenanceError, ValidationResult};
use crate::core::report::{EntityState, MaintenanceReport, TableReport};
use crate::core::table::TableDefinition;
use crate::services::change_set_validator::ChangeSetValidator;
use crate::services::metadata_extractor::{MetadataExtractor, NamingOptions};
use crate::services::retry::RetryPolicy;
use crate::services::schema_diff_detector::{DiffPolicy, SchemaDiffDetector};
use crate::services::table_backup::BackupService;
use chrono::Local;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// 1テーブル分の実行計画
#[derive(Debug, Clone)]
pub struct TablePlan {
    /// 望ましいテーブル定義
    pub table: TableDefinition,
    /// 実テーブルの定義
    pub live: Option<TableDefinition>,
    /// 変更セット
    pub changes: ChangeSet,
    /// 実行されるSQL
    pub statements: Vec<String>,
    /// 検証結果
    pub validation: ValidationResult,
}

/// テーブルメンテナンスサービス
pub struct TableMaintenanceService {
    config: Arc<TableMaintenanceConfig>,
    connection: Arc<dyn SchemaConnection>,
    dialect: Arc<SqlDialect>,
    extractor: MetadataExtractor,
    differ: SchemaDiffDetector,
    validator: ChangeSetValidator,
    backup: BackupService,
    retry: RetryPolicy,
}

impl std::fmt::Debug for TableMaintenanceService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableMaintenanceService")
            .field("dialect", &self.dialect.kind())
            .field("retry", &self.retry)
            .finish()
    }
}

impl TableMaintenanceService {
    /// 新しいTableMaintenanceServiceを作成
    pub fn new(
        config: Arc<TableMaintenanceConfig>,
        connection: Arc<dyn SchemaConnection>,
        dialect: Arc<SqlDialect>,
    ) -> Self {
        Self {
            extractor: MetadataExtractor::new(NamingOptions::from(config.as_ref())),
            differ: SchemaDiffDetector::new(DiffPolicy::from(config.as_ref())),
            validator: ChangeSetValidator::new(),
            backup: BackupService::new(config.backup.clone()),
            retry: RetryPolicy::from(config.as_ref()),
            config,
            connection,
            dialect,
        }
    }

    /// リトライポリシーを差し替える
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn config(&self) -> &TableMaintenanceConfig {
        &self.config
    }

    pub fn dialect(&self) -> &SqlDialect {
        &self.dialect
    }

    /// エンティティをスキャン順に処理
    ///
    /// `continue-on-error` が false の場合は最初のエラーで中断して返します。
    pub async fn maintain_tables(
        &self,
        entities: &[EntityDescriptor],
    ) -> Result<MaintenanceReport, MaintenanceError> {
        self.maintain_tables_with_progress(entities, |_| {}).await
    }

    /// エンティティをスキャン順に処理（テーブルごとにコールバック）
    pub async fn maintain_tables_with_progress<F>(
        &self,
        entities: &[EntityDescriptor],
        mut on_table: F,
    ) -> Result<MaintenanceReport, MaintenanceError>
    where
        F: FnMut(&TableReport) + Send,
    {
        let mut report = MaintenanceReport::default();
        let continue_on_error = self.config.continue_on_error;

        for entity in entities {
            let (mut table_report, outcome) = self.run_entity(entity).await;
            if let Err(e) = outcome {
                finish_failed(&mut table_report, &e, continue_on_error);
                error!(
                    entity = %entity.type_name,
                    state = %table_report.state(),
                    "Table maintenance failed: {}",
                    e
                );
                on_table(&table_report);
                report.push(table_report);
                if !continue_on_error {
                    return Err(e);
                }
                continue;
            }
            on_table(&table_report);
            report.push(table_report);
        }

        info!(
            tables = report.tables.len(),
            changed = report.changed_count(),
            failed = report.failed().count(),
            statements = report.statement_count(),
            "Table maintenance finished"
        );
        Ok(report)
    }

    /// 1エンティティを処理（エラーは常に返す）
    pub async fn maintain_table(
        &self,
        entity: &EntityDescriptor,
    ) -> Result<TableReport, MaintenanceError> {
        let (mut report, outcome) = self.run_entity(entity).await;
        match outcome {
            Ok(()) => Ok(report),
            Err(e) => {
                finish_failed(&mut report, &e, false);
                error!(entity = %entity.type_name, "Table maintenance failed: {}", e);
                Err(e)
            }
        }
    }

    /// 変更セットを検証のみ行う
    pub async fn validate_table(
        &self,
        entity: &EntityDescriptor,
    ) -> Result<ValidationResult, MaintenanceError> {
        Ok(self.plan_table(entity).await?.validation)
    }

    /// 実行せずにSQLを生成
    pub async fn plan_table(&self, entity: &EntityDescriptor) -> Result<TablePlan, MaintenanceError> {
        let table = self.extract(entity)?;
        let live = self.introspect(&table).await?;
        let changes = self.differ.detect_diff(&self.dialect, &table, live.as_ref());
        let statements = self.dialect.render_changes(&table, &changes);
        let validation = self
            .validator
            .validate(&self.dialect, &table, live.as_ref(), &changes);

        Ok(TablePlan {
            table,
            live,
            changes,
            statements,
            validation,
        })
    }

    fn extract(&self, entity: &EntityDescriptor) -> Result<TableDefinition, MaintenanceError> {
        let table = self.extractor.extract(entity)?;
        self.dialect.check_definition(&table)?;
        Ok(table)
    }

    async fn introspect(
        &self,
        table: &TableDefinition,
    ) -> Result<Option<TableDefinition>, MaintenanceError> {
        Ok(self
            .dialect
            .introspect(self.connection.as_ref(), table.schema.as_deref(), &table.name)
            .await?)
    }

    /// タイムアウト付きで1エンティティを処理
    async fn run_entity(
        &self,
        entity: &EntityDescriptor,
    ) -> (TableReport, Result<(), MaintenanceError>) {
        let started = Instant::now();
        let mut report = TableReport::new(&entity.type_name);

        let outcome = match self.config.execution_timeout() {
            Some(limit) => {
                let timed = tokio::time::timeout(limit, self.reconcile(entity, &mut report)).await;
                match timed {
                    Ok(outcome) => outcome,
                    Err(_) => Err(MaintenanceError::Timeout {
                        table: report.display_name().to_string(),
                        seconds: limit.as_secs(),
                    }),
                }
            }
            None => self.reconcile(entity, &mut report).await,
        };

        report.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        if let Err(e) = &outcome {
            report.error = Some(e.to_string());
        }
        (report, outcome)
    }

    async fn reconcile(
        &self,
        entity: &EntityDescriptor,
        report: &mut TableReport,
    ) -> Result<(), MaintenanceError> {
        let table = self.extract(entity)?;
        report.table = Some(table.name.clone());
        report.transition(EntityState::MetadataExtracted);

        let live = self.introspect(&table).await?;
        report.transition(EntityState::Introspected);

        let changes = self.differ.detect_diff(&self.dialect, &table, live.as_ref());
        report.transition(EntityState::Diffed);
        for skipped in &changes.skipped {
            warn!(table = %table.name, "{}", skipped);
        }
        report.skipped = changes.skipped.clone();

        let statements = self.dialect.render_changes(&table, &changes);
        if statements.is_empty() {
            debug!(table = %table.name, "Table is up to date");
            report.transition(EntityState::NoChange);
            report.transition(EntityState::Done);
            return Ok(());
        }

        if self.config.validate_before_execution {
            report.transition(EntityState::Validating);
            let result = self
                .validator
                .validate(&self.dialect, &table, live.as_ref(), &changes);
            for warning in &result.warnings {
                warn!(table = %table.name, "{}", warning.format());
            }
            if let Err(errors) = result.into_result() {
                report.transition(EntityState::ValidationFailed);
                return Err(MaintenanceError::Validation {
                    table: table.name.clone(),
                    errors,
                });
            }
            report.transition(EntityState::Validated);
        }

        if let Some(live) = live.as_ref().filter(|_| self.backup.is_enabled()) {
            report.transition(EntityState::BackingUp);
            report.backup_file = Some(self.backup_table(live)?);
        }

        report.transition(EntityState::Executing);
        for statement in &statements {
            self.execute_statement(&table.name, statement, report).await?;
        }

        report.transition(EntityState::Success);
        report.transition(EntityState::Done);
        info!(
            table = %table.name,
            statements = statements.len(),
            created = changes.create,
            "Table maintained"
        );
        Ok(())
    }

    /// 実テーブルの定義をバックアップし、期限切れのファイルを削除
    fn backup_table(&self, live: &TableDefinition) -> Result<PathBuf, MaintenanceError> {
        let now = Local::now();
        let ddl = self.dialect.render_create_table(live);
        let path = self.backup.write_snapshot(&live.name, &ddl, now)?;
        if let Err(e) = self.backup.purge_expired(now) {
            warn!(directory = %self.backup.directory().display(), "Failed to purge old backups: {}", e);
        }
        Ok(path)
    }

    /// DDL文をリトライ付きで実行
    async fn execute_statement(
        &self,
        table: &str,
        statement: &str,
        report: &mut TableReport,
    ) -> Result<(), MaintenanceError> {
        if self.config.print_sql {
            info!(table = %table, sql = %statement, "Executing DDL");
        }

        let result = self
            .retry
            .execute(
                || self.connection.execute(statement),
                |attempt, error, delay| {
                    warn!(
                        table = %table,
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "DDL failed, retrying: {}",
                        error
                    );
                    report.retries += 1;
                    report.transition(EntityState::Retrying { attempt });
                },
            )
            .await;

        match result {
            Ok(()) => {
                report.statements.push(statement.to_string());
                Ok(())
            }
            Err(exhausted) => {
                report.transition(EntityState::Exhausted);
                Err(MaintenanceError::DdlExecution {
                    table: table.to_string(),
                    sql: statement.to_string(),
                    attempts: exhausted.attempts,
                    cause: exhausted.error.to_string(),
                })
            }
        }
    }
}

/// 失敗したエンティティの終端状態を記録
///
/// 検証失敗は継続時 Skipped、中断時 Aborted、それ以外は Failed。
fn finish_failed(report: &mut TableReport, error: &MaintenanceError, continue_on_error: bool) {
    let state = match (error.is_validation(), continue_on_error) {
        (true, true) => EntityState::Skipped,
        (true, false) => EntityState::Aborted,
        (false, _) => EntityState::Failed,
    };
    report.transition(state);
}

/// テーブルメンテナンスサービスの統合テスト
///
/// メモリ上のカタログと台本付き接続を使い、
/// 作成・冪等性・リトライ・continue-on-error・バックアップ・削除の抑止を確認します。
mod common;

#[cfg(test)]
mod table_maintenance_tests {
    use super::common::{
        desired_table, entity_with_two_identifiers, fast_config, simple_entity, sys_user,
        InMemoryCatalog, ScriptedConnection,
    };
    use std::fs;
    use std::sync::Arc;
    use std::time::Duration;
    use tablewright::adapters::connection::SchemaConnection;
    use tablewright::core::change_set::SkippedChangeKind;
    use tablewright::core::config::{BackupConfig, Dialect, TableMaintenanceConfig};
    use tablewright::core::error::MaintenanceError;
    use tablewright::core::report::EntityState;
    use tablewright::core::table::{ColumnDefinition, IdStrategy, LogicalType, TableDefinition};
    use tablewright::services::table_maintenance::TableMaintenanceService;
    use tempfile::TempDir;

    fn service(
        config: TableMaintenanceConfig,
        catalog: &InMemoryCatalog,
        connection: &Arc<ScriptedConnection>,
    ) -> TableMaintenanceService {
        let connection: Arc<dyn SchemaConnection> = connection.clone();
        TableMaintenanceService::new(
            Arc::new(config),
            connection,
            Arc::new(catalog.dialect(Dialect::MySQL)),
        )
    }

    /// `purchase_order` の実テーブル（id のみ）
    fn live_purchase_order() -> TableDefinition {
        let mut table = TableDefinition::new("purchase_order");
        table.add_column(ColumnDefinition::new("id", LogicalType::BigInt).auto_increment());
        table.set_id("id", IdStrategy::Auto, None);
        table
    }

    // ==========================================
    // 作成と冪等性
    // ==========================================

    /// 存在しないテーブルは作成され、2回目の実行では変更がない
    #[tokio::test]
    async fn test_create_then_idempotent() {
        let catalog = InMemoryCatalog::new();
        let connection = Arc::new(ScriptedConnection::mysql());
        let service = service(fast_config(), &catalog, &connection);

        let first = service.maintain_table(&sys_user()).await.unwrap();
        assert!(first.is_success());
        assert_eq!(first.statements.len(), 1);
        assert!(first.statements[0].starts_with("CREATE TABLE `sys_user`"));

        catalog.put(desired_table(&sys_user()));

        let second = service.maintain_table(&sys_user()).await.unwrap();
        assert!(second.is_success());
        assert!(second.passed_through(EntityState::NoChange));
        assert!(second.statements.is_empty());
        assert_eq!(connection.executed().len(), 1);
    }

    /// planは実行しない
    #[tokio::test]
    async fn test_plan_does_not_execute() {
        let catalog = InMemoryCatalog::new();
        let connection = Arc::new(ScriptedConnection::mysql());
        let service = service(fast_config(), &catalog, &connection);

        let plan = service.plan_table(&sys_user()).await.unwrap();
        assert!(plan.changes.create);
        assert_eq!(plan.statements.len(), 1);
        assert_eq!(connection.attempts(), 0);
    }

    // ==========================================
    // リトライ
    // ==========================================

    /// 一時的な失敗の後にリトライで成功する
    #[tokio::test]
    async fn test_retry_after_transient_failure() {
        let catalog = InMemoryCatalog::new();
        let connection = Arc::new(ScriptedConnection::mysql());
        connection.fail_times("CREATE TABLE", 1);
        let service = service(fast_config(), &catalog, &connection);

        let report = service.maintain_table(&sys_user()).await.unwrap();

        assert!(report.is_success());
        assert_eq!(report.retries, 1);
        assert!(report.passed_through(EntityState::Retrying { attempt: 1 }));
        assert_eq!(connection.attempts(), 2);
        assert_eq!(connection.executed().len(), 1);
    }

    /// リトライ上限に達すると実行エラーになる
    #[tokio::test]
    async fn test_retry_exhausted() {
        let catalog = InMemoryCatalog::new();
        let connection = Arc::new(ScriptedConnection::mysql());
        connection.fail_times("CREATE TABLE", 10);
        let config = TableMaintenanceConfig {
            max_retry_count: 2,
            ..fast_config()
        };
        let service = service(config, &catalog, &connection);

        let error = service.maintain_table(&sys_user()).await.unwrap_err();

        assert!(matches!(
            error,
            MaintenanceError::DdlExecution { attempts: 3, .. }
        ));
        assert_eq!(connection.attempts(), 3);
        assert!(connection.executed().is_empty());
    }

    // ==========================================
    // continue-on-error
    // ==========================================

    fn three_entities() -> Vec<tablewright::core::entity::EntityDescriptor> {
        vec![
            simple_entity("app::Alpha"),
            simple_entity("app::Beta"),
            simple_entity("app::Gamma"),
        ]
    }

    /// 2番目のエンティティが失敗しても3番目が処理される
    #[tokio::test]
    async fn test_continue_on_error_processes_remaining() {
        let catalog = InMemoryCatalog::new();
        let connection = Arc::new(ScriptedConnection::mysql());
        connection.fail_times("`beta`", 10);
        let config = TableMaintenanceConfig {
            max_retry_count: 0,
            continue_on_error: true,
            ..fast_config()
        };
        let service = service(config, &catalog, &connection);

        let report = service.maintain_tables(&three_entities()).await.unwrap();

        let states: Vec<EntityState> = report.tables.iter().map(|t| t.state()).collect();
        assert_eq!(
            states,
            vec![EntityState::Done, EntityState::Failed, EntityState::Done]
        );
        assert!(!report.is_success());
        assert!(report.find("beta").unwrap().error.is_some());

        let executed = connection.executed();
        assert_eq!(executed.len(), 2);
        assert!(executed[0].contains("`alpha`"));
        assert!(executed[1].contains("`gamma`"));
    }

    /// continue-on-error が false の場合は最初の失敗で中断する
    #[tokio::test]
    async fn test_stop_on_first_error() {
        let catalog = InMemoryCatalog::new();
        let connection = Arc::new(ScriptedConnection::mysql());
        connection.fail_times("`beta`", 10);
        let config = TableMaintenanceConfig {
            max_retry_count: 0,
            continue_on_error: false,
            ..fast_config()
        };
        let service = service(config, &catalog, &connection);

        let error = service.maintain_tables(&three_entities()).await.unwrap_err();

        assert!(error.is_ddl_execution());
        let executed = connection.executed();
        assert_eq!(executed.len(), 1);
        assert!(executed[0].contains("`alpha`"));
    }

    /// メタデータが不正なエンティティでも continue-on-error が false なら中断する
    #[tokio::test]
    async fn test_stop_on_invalid_metadata() {
        let catalog = InMemoryCatalog::new();
        let connection = Arc::new(ScriptedConnection::mysql());
        let config = TableMaintenanceConfig {
            continue_on_error: false,
            ..fast_config()
        };
        let service = service(config, &catalog, &connection);
        let entities = vec![
            simple_entity("app::Alpha"),
            entity_with_two_identifiers("app::Beta"),
            simple_entity("app::Gamma"),
        ];

        let error = service.maintain_tables(&entities).await.unwrap_err();

        assert!(error.is_metadata());
        let executed = connection.executed();
        assert_eq!(executed.len(), 1);
        assert!(executed[0].contains("`alpha`"));
    }

    // ==========================================
    // 削除の抑止と検証
    // ==========================================

    /// allow-drop-column が false の場合はカラムを削除しない
    #[tokio::test]
    async fn test_drop_column_is_skipped_by_default() {
        let catalog = InMemoryCatalog::new();
        let mut live = desired_table(&simple_entity("app::PurchaseOrder"));
        live.add_column(ColumnDefinition::new("legacy", LogicalType::Integer));
        catalog.put(live);
        let connection = Arc::new(ScriptedConnection::mysql());
        let service = service(fast_config(), &catalog, &connection);

        let report = service
            .maintain_table(&simple_entity("app::PurchaseOrder"))
            .await
            .unwrap();

        assert!(report.is_success());
        assert!(report.statements.is_empty());
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].kind, SkippedChangeKind::DropColumn);
        assert_eq!(report.skipped[0].target, "legacy");
        assert_eq!(connection.attempts(), 0);
    }

    /// allow-drop-column が true の場合は削除する
    #[tokio::test]
    async fn test_drop_column_when_allowed() {
        let catalog = InMemoryCatalog::new();
        let mut live = desired_table(&simple_entity("app::PurchaseOrder"));
        live.add_column(ColumnDefinition::new("legacy", LogicalType::Integer));
        catalog.put(live);
        let connection = Arc::new(ScriptedConnection::mysql());
        let config = TableMaintenanceConfig {
            allow_drop_column: true,
            ..fast_config()
        };
        let service = service(config, &catalog, &connection);

        let report = service
            .maintain_table(&simple_entity("app::PurchaseOrder"))
            .await
            .unwrap();

        assert_eq!(
            report.statements,
            vec!["ALTER TABLE `purchase_order` DROP COLUMN `legacy`".to_string()]
        );
    }

    /// 主キーの変更は検証エラーになり、継続時はスキップされる
    #[tokio::test]
    async fn test_primary_key_change_is_skipped() {
        let catalog = InMemoryCatalog::new();
        let mut live = TableDefinition::new("purchase_order");
        live.add_column(ColumnDefinition::new("id", LogicalType::BigInt).auto_increment());
        live.add_column(
            ColumnDefinition::new("code", LogicalType::Varchar)
                .with_length(20)
                .not_null(),
        );
        live.set_id("code", IdStrategy::Assigned, None);
        catalog.put(live);
        let connection = Arc::new(ScriptedConnection::mysql());
        let service = service(fast_config(), &catalog, &connection);
        let entity = simple_entity("app::PurchaseOrder");

        let report = service.maintain_tables(&[entity.clone()]).await.unwrap();
        assert_eq!(report.tables[0].state(), EntityState::Skipped);
        assert!(report.tables[0].passed_through(EntityState::ValidationFailed));
        assert_eq!(connection.attempts(), 0);

        let error = service.maintain_table(&entity).await.unwrap_err();
        assert!(error.is_validation());

        let validation = service.validate_table(&entity).await.unwrap();
        assert!(!validation.is_valid());
        assert!(validation.errors[0].is_primary_key());
    }

    // ==========================================
    // バックアップとタイムアウト
    // ==========================================

    /// 既存テーブルの変更前にスナップショットを書き出す
    #[tokio::test]
    async fn test_backup_before_alter() {
        let backup_dir = TempDir::new().unwrap();
        let catalog = InMemoryCatalog::new();
        catalog.put(live_purchase_order());
        let connection = Arc::new(ScriptedConnection::mysql());
        let config = TableMaintenanceConfig {
            backup: BackupConfig {
                enabled: true,
                backup_directory: backup_dir.path().to_path_buf(),
                backup_before_execution: true,
                retention_days: 30,
            },
            ..fast_config()
        };
        let service = service(config, &catalog, &connection);

        let report = service
            .maintain_table(&simple_entity("app::PurchaseOrder"))
            .await
            .unwrap();

        assert!(report.passed_through(EntityState::BackingUp));
        assert_eq!(
            report.statements,
            vec!["ALTER TABLE `purchase_order` ADD COLUMN `title` VARCHAR(255)".to_string()]
        );
        let backup_file = report.backup_file.expect("backup file");
        assert!(backup_file.starts_with(backup_dir.path()));
        let content = fs::read_to_string(&backup_file).unwrap();
        assert!(content.starts_with("-- Snapshot of table purchase_order"));
        assert!(content.contains("CREATE TABLE `purchase_order`"));
    }

    /// 新規作成時はバックアップしない
    #[tokio::test]
    async fn test_no_backup_for_new_table() {
        let backup_dir = TempDir::new().unwrap();
        let catalog = InMemoryCatalog::new();
        let connection = Arc::new(ScriptedConnection::mysql());
        let config = TableMaintenanceConfig {
            backup: BackupConfig {
                enabled: true,
                backup_directory: backup_dir.path().to_path_buf(),
                backup_before_execution: true,
                retention_days: 0,
            },
            ..fast_config()
        };
        let service = service(config, &catalog, &connection);

        let report = service.maintain_table(&sys_user()).await.unwrap();

        assert!(report.backup_file.is_none());
        assert!(!report.passed_through(EntityState::BackingUp));
    }

    /// エンティティ単位のタイムアウト
    #[tokio::test]
    async fn test_execution_timeout() {
        let catalog = InMemoryCatalog::new();
        let connection =
            Arc::new(ScriptedConnection::mysql().with_delay(Duration::from_millis(1500)));
        let config = TableMaintenanceConfig {
            execution_timeout_seconds: 1,
            ..fast_config()
        };
        let service = service(config, &catalog, &connection);

        let error = service.maintain_table(&sys_user()).await.unwrap_err();

        assert!(error.is_timeout());
        assert!(matches!(
            error,
            MaintenanceError::Timeout { seconds: 1, .. }
        ));
    }
}

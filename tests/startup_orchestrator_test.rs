/// 起動オーケストレーターの統合テスト
///
/// enabled / auto-execute-on-startup / 環境ゲート / 1回だけの実行 / 非同期投入を確認します。
mod common;

#[cfg(test)]
mod startup_orchestrator_tests {
    use super::common::{
        entity_with_two_identifiers, fast_config, simple_entity, InMemoryCatalog, ScriptedConnection,
    };
    use std::sync::Arc;
    use tablewright::adapters::connection::SchemaConnection;
    use tablewright::core::config::{Dialect, TableMaintenanceConfig};
    use tablewright::services::bootstrap::TableMaintenanceContext;
    use tablewright::services::entity_registry::EntityRegistry;
    use tablewright::services::startup_orchestrator::{
        SkipReason, StartupOrchestrator, StartupOutcome,
    };
    use tokio_test::{assert_err, assert_ok};

    fn registry() -> EntityRegistry {
        vec![simple_entity("app::Alpha"), simple_entity("app::Beta")]
            .into_iter()
            .collect()
    }

    fn orchestrator_with(
        config: TableMaintenanceConfig,
        registry: EntityRegistry,
        connection: &Arc<ScriptedConnection>,
    ) -> StartupOrchestrator {
        let catalog = InMemoryCatalog::new();
        let connection: Arc<dyn SchemaConnection> = connection.clone();
        let context = TableMaintenanceContext::with_dialect(
            config,
            registry,
            connection,
            catalog.dialect(Dialect::MySQL),
        );
        StartupOrchestrator::new(context)
    }

    fn orchestrator(
        config: TableMaintenanceConfig,
        connection: &Arc<ScriptedConnection>,
    ) -> StartupOrchestrator {
        orchestrator_with(config, registry(), connection)
    }

    // ==========================================
    // 実行条件
    // ==========================================

    /// enabled が false の場合は何もしない
    #[tokio::test]
    async fn test_disabled() {
        let connection = Arc::new(ScriptedConnection::mysql());
        let config = TableMaintenanceConfig {
            enabled: false,
            ..fast_config()
        };
        let orchestrator = orchestrator(config, &connection);

        let outcome = orchestrator.on_ready().await.unwrap();
        assert!(matches!(outcome, StartupOutcome::Skipped(SkipReason::Disabled)));

        let manual = orchestrator.run_manually().await.unwrap();
        assert!(matches!(manual, StartupOutcome::Skipped(SkipReason::Disabled)));
        assert_eq!(connection.attempts(), 0);
    }

    /// 自動実行が無効でも手動実行はできる
    #[tokio::test]
    async fn test_auto_execute_disabled_allows_manual_run() {
        let connection = Arc::new(ScriptedConnection::mysql());
        let config = TableMaintenanceConfig {
            auto_execute_on_startup: false,
            ..fast_config()
        };
        let orchestrator = orchestrator(config, &connection);

        let outcome = orchestrator.on_ready().await.unwrap();
        assert!(matches!(
            outcome,
            StartupOutcome::Skipped(SkipReason::AutoExecuteDisabled)
        ));
        assert!(!orchestrator.has_run());

        match orchestrator.run_manually().await.unwrap() {
            StartupOutcome::Completed(report) => assert_eq!(report.tables.len(), 2),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(orchestrator.has_run());
    }

    /// テスト環境では既定で実行しない
    #[tokio::test]
    async fn test_environment_gate() {
        let connection = Arc::new(ScriptedConnection::mysql());
        let config = TableMaintenanceConfig {
            environment: Some("test".to_string()),
            ..fast_config()
        };
        let outcome = orchestrator(config, &connection).on_ready().await.unwrap();
        assert!(matches!(
            outcome,
            StartupOutcome::Skipped(SkipReason::TestEnvironment)
        ));

        let config = TableMaintenanceConfig {
            environment: Some("test".to_string()),
            execute_in_test_environment: true,
            ..fast_config()
        };
        let outcome = orchestrator(config, &connection).on_ready().await.unwrap();
        assert!(matches!(outcome, StartupOutcome::Completed(_)));
    }

    /// 対象エンティティがない場合はスキップ
    #[tokio::test]
    async fn test_no_entities() {
        let connection = Arc::new(ScriptedConnection::mysql());
        let orchestrator = orchestrator_with(fast_config(), EntityRegistry::new(), &connection);

        let outcome = orchestrator.on_ready().await.unwrap();
        assert!(matches!(outcome, StartupOutcome::Skipped(SkipReason::NoEntities)));
    }

    // ==========================================
    // 実行
    // ==========================================

    /// 準備完了シグナルでの実行はプロセスにつき1回
    #[tokio::test]
    async fn test_runs_once() {
        let connection = Arc::new(ScriptedConnection::mysql());
        let orchestrator = orchestrator(fast_config(), &connection);

        match orchestrator.on_ready().await.unwrap() {
            StartupOutcome::Completed(report) => {
                assert!(report.is_success());
                assert_eq!(report.statement_count(), 2);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        let again = orchestrator.on_ready().await.unwrap();
        assert!(matches!(again, StartupOutcome::AlreadyRan));
        assert_eq!(connection.executed().len(), 2);
    }

    /// 同期実行の失敗は continue-on-error が false の場合に伝播する
    #[tokio::test]
    async fn test_sync_failure_propagates() {
        let connection = Arc::new(ScriptedConnection::mysql());
        connection.fail_times("CREATE TABLE", 10);
        let config = TableMaintenanceConfig {
            continue_on_error: false,
            max_retry_count: 0,
            ..fast_config()
        };

        let error = assert_err!(orchestrator(config, &connection).on_ready().await);
        assert!(error.is_ddl_execution());
    }

    /// 非同期モードではワーカープールに投入して戻る
    #[tokio::test]
    async fn test_async_submits_and_shuts_down() {
        let connection = Arc::new(ScriptedConnection::mysql());
        let config = TableMaintenanceConfig {
            async_enabled: true,
            ..fast_config()
        };
        let orchestrator = orchestrator(config, &connection);

        let outcome = assert_ok!(orchestrator.on_ready().await);
        assert!(matches!(outcome, StartupOutcome::Submitted(2)));

        orchestrator.shutdown().await;
        assert_eq!(connection.executed().len(), 2);
    }

    /// 非同期モードの失敗はログ出力のみ
    #[tokio::test]
    async fn test_async_failure_is_not_propagated() {
        let connection = Arc::new(ScriptedConnection::mysql());
        connection.fail_times("CREATE TABLE", 10);
        let config = TableMaintenanceConfig {
            async_enabled: true,
            continue_on_error: false,
            max_retry_count: 0,
            ..fast_config()
        };
        let orchestrator = orchestrator(config, &connection);

        let outcome = assert_ok!(orchestrator.on_ready().await);
        assert!(matches!(outcome, StartupOutcome::Submitted(2)));

        orchestrator.shutdown().await;
        assert!(connection.executed().is_empty());
    }

    fn registry_with_invalid_second() -> EntityRegistry {
        vec![
            simple_entity("app::Alpha"),
            entity_with_two_identifiers("app::Beta"),
            simple_entity("app::Gamma"),
        ]
        .into_iter()
        .collect()
    }

    /// 非同期モードでも continue-on-error が false なら後続を処理しない
    #[tokio::test]
    async fn test_async_batch_stops_after_invalid_entity() {
        let connection = Arc::new(ScriptedConnection::mysql());
        let config = TableMaintenanceConfig {
            async_enabled: true,
            continue_on_error: false,
            async_core_pool_size: 1,
            async_max_pool_size: 1,
            ..fast_config()
        };
        let orchestrator = orchestrator_with(config, registry_with_invalid_second(), &connection);

        let outcome = assert_ok!(orchestrator.on_ready().await);
        assert!(matches!(outcome, StartupOutcome::Submitted(3)));

        orchestrator.shutdown().await;
        let executed = connection.executed();
        assert_eq!(executed.len(), 1);
        assert!(executed[0].contains("`alpha`"));
    }

    /// continue-on-error が true ならエンティティごとに処理を続ける
    #[tokio::test]
    async fn test_async_each_continues_after_invalid_entity() {
        let connection = Arc::new(ScriptedConnection::mysql());
        let config = TableMaintenanceConfig {
            async_enabled: true,
            continue_on_error: true,
            async_core_pool_size: 1,
            async_max_pool_size: 1,
            ..fast_config()
        };
        let orchestrator = orchestrator_with(config, registry_with_invalid_second(), &connection);

        let outcome = assert_ok!(orchestrator.on_ready().await);
        assert!(matches!(outcome, StartupOutcome::Submitted(3)));

        orchestrator.shutdown().await;
        let mut executed = connection.executed();
        executed.sort();
        assert_eq!(executed.len(), 2);
        assert!(executed[0].contains("`alpha`"));
        assert!(executed[1].contains("`gamma`"));
    }
}

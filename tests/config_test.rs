/// 設定ファイル管理機能のテスト
///
/// 設定ファイルの読み込み、検証、環境変数による上書きが
/// 正しく動作することを確認します。

#[cfg(test)]
mod config_tests {
    use std::collections::HashMap;
    use std::fs;
    use std::path::Path;
    use std::time::Duration;
    use tablewright::core::config::{DataSourceConfig, TableMaintenanceConfig};
    use tablewright::core::error::ConfigError;
    use tablewright::services::config_loader::ConfigLoader;
    use tablewright::services::config_resolver::ConfigResolver;
    use tempfile::TempDir;

    /// 全てのキーをkebab-caseで指定できることを確認
    #[test]
    fn test_full_config_deserialization() {
        let yaml = r#"
enabled: true
auto-execute-on-startup: false
entity-packages:
  - app::domain
  - app::billing
exclude-entities:
  - app::domain::Audit
include-entities:
  - app::legacy::Invoice
allow-drop-column: true
allow-drop-index: false
allow-modify-column-type: true
validate-before-execution: false
print-sql: false
execute-in-test-environment: true
default-schema: sales
table-prefix: t_
table-suffix: _tab
camel-case-to-underscore: false
execution-timeout-seconds: 0
max-retry-count: 1
retry-backoff-millis: 50
continue-on-error: false
async-enabled: true
async-core-pool-size: 1
async-max-pool-size: 3
async-queue-capacity: 10
async-thread-name-prefix: ddl-
environment: staging
descriptor-paths:
  - entities
backup:
  enabled: true
  backup-directory: backups
  backup-before-execution: false
  retention-days: 0
datasource:
  url: mysql://root@localhost/app
  max-connections: 8
  min-connections: 2
  timeout: 10
  idle-timeout: 60
"#;

        let config = ConfigLoader::from_yaml(yaml).unwrap();

        assert!(!config.auto_execute_on_startup);
        assert_eq!(config.entity_packages.len(), 2);
        assert_eq!(config.exclude_entities, vec!["app::domain::Audit".to_string()]);
        assert_eq!(config.include_entities, vec!["app::legacy::Invoice".to_string()]);
        assert!(config.allow_drop_column);
        assert!(!config.allow_drop_index);
        assert!(config.allow_modify_column_type);
        assert!(!config.validate_before_execution);
        assert!(!config.print_sql);
        assert!(config.execute_in_test_environment);
        assert_eq!(config.default_schema.as_deref(), Some("sales"));
        assert_eq!(config.table_prefix, "t_");
        assert_eq!(config.table_suffix, "_tab");
        assert!(!config.camel_case_to_underscore);
        assert_eq!(config.execution_timeout(), None);
        assert_eq!(config.max_retry_count, 1);
        assert_eq!(config.retry_backoff_millis, 50);
        assert!(!config.continue_on_error);
        assert!(config.async_enabled);
        assert_eq!(config.async_max_pool_size, 3);
        assert_eq!(config.async_thread_name_prefix, "ddl-");
        assert_eq!(config.environment.as_deref(), Some("staging"));
        assert!(!config.is_test_environment());
        assert_eq!(config.descriptor_paths, vec![Path::new("entities").to_path_buf()]);
        assert!(config.backup.enabled);
        assert!(!config.backup.backup_before_execution);
        assert_eq!(config.backup.retention_days, 0);
        assert_eq!(config.datasource.min_connections, Some(2));
        assert_eq!(config.datasource.idle_timeout, Some(60));
    }

    /// 未指定のキーは既定値になることを確認
    #[test]
    fn test_unspecified_keys_use_defaults() {
        let config = ConfigLoader::from_yaml("enabled: true\n").unwrap();

        assert_eq!(config, TableMaintenanceConfig::default());
        assert_eq!(config.execution_timeout(), Some(Duration::from_secs(300)));
        assert_eq!(config.max_retry_count, 3);
        assert_eq!(config.async_core_pool_size, 2);
        assert_eq!(config.async_max_pool_size, 4);
        assert_eq!(config.async_queue_capacity, 100);
    }

    /// ファイルから読み込めることを確認
    #[test]
    fn test_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(TableMaintenanceConfig::DEFAULT_CONFIG_PATH);
        fs::write(&path, "enabled: false\nprint-sql: false\n").unwrap();

        let config = ConfigLoader::from_file(&path).unwrap();
        assert!(!config.enabled);
        assert!(!config.print_sql);
    }

    // ==========================================
    // 検証
    // ==========================================

    /// 不正な値はキー名付きのエラーになることを確認
    #[test]
    fn test_invalid_values_are_rejected() {
        let cases = [
            ("async-core-pool-size: 0\n", "async-core-pool-size"),
            ("async-queue-capacity: 0\n", "async-queue-capacity"),
            (
                "async-core-pool-size: 3\nasync-max-pool-size: 2\n",
                "async-max-pool-size",
            ),
            (
                "datasource:\n  max-connections: 0\n",
                "datasource.max-connections",
            ),
            (
                "datasource:\n  max-connections: 2\n  min-connections: 5\n",
                "datasource.min-connections",
            ),
            (
                "backup:\n  enabled: true\n  backup-directory: \"\"\n",
                "backup.backup-directory",
            ),
        ];

        for (yaml, key) in cases {
            let error = ConfigLoader::from_yaml(yaml).unwrap_err();
            assert!(
                format!("{:#}", error).contains(key),
                "expected '{}' in error: {:#}",
                key,
                error
            );
        }
    }

    /// 型の合わない値はパースエラーになることを確認
    #[test]
    fn test_type_mismatch_is_parse_error() {
        let error = ConfigLoader::from_yaml("max-retry-count: many\n").unwrap_err();
        assert!(format!("{:#}", error).contains("Failed to parse config file"));
    }

    /// 接続URLが必須であることを確認
    #[test]
    fn test_require_url() {
        let datasource = DataSourceConfig::default();
        assert!(matches!(
            datasource.require_url(),
            Err(ConfigError::MissingDataSourceUrl)
        ));

        let blank = DataSourceConfig {
            url: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(blank.require_url().is_err());
    }

    // ==========================================
    // 環境変数による上書き
    // ==========================================

    /// 環境変数で接続URLと環境名を上書きできることを確認
    #[test]
    fn test_overrides_replace_url_and_environment() {
        let base = ConfigLoader::from_yaml(
            "environment: production\ndatasource:\n  url: mysql://prod/app\n  max-connections: 4\n",
        )
        .unwrap();
        let vars: HashMap<&str, &str> = [
            ("TABLEWRIGHT_DATABASE_URL", "postgres://localhost/app_test"),
            ("TABLEWRIGHT_ENV", "TEST"),
        ]
        .into_iter()
        .collect();

        let config = ConfigResolver::apply_overrides(&base, |key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(
            config.datasource.url.as_deref(),
            Some("postgres://localhost/app_test")
        );
        assert_eq!(config.datasource.max_connections, Some(4));
        assert!(config.is_test_environment());
        assert_eq!(base.environment.as_deref(), Some("production"));
    }
}

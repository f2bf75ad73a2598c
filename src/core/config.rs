// 設定管理
//
// テーブル自動メンテナンスの設定（YAML形式、kebab-caseキー）と
// 接続先データソースの設定を定義します。
// ファイルI/Oと環境変数の上書きは services 層で扱います。

use crate::core::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// データベース方言
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dialect {
    #[serde(rename = "mysql")]
    MySQL,
    #[serde(rename = "postgresql")]
    PostgreSQL,
    #[serde(rename = "sqlserver")]
    SqlServer,
    #[serde(rename = "oracle")]
    Oracle,
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::MySQL => write!(f, "mysql"),
            Dialect::PostgreSQL => write!(f, "postgresql"),
            Dialect::SqlServer => write!(f, "sqlserver"),
            Dialect::Oracle => write!(f, "oracle"),
        }
    }
}

impl Dialect {
    /// 識別子の比較で大文字小文字を区別するかどうか
    ///
    /// - MySQL / SQL Server: 区別しない（既定の照合順序）
    /// - PostgreSQL / Oracle: クォート済み識別子は区別する
    pub fn identifiers_case_sensitive(&self) -> bool {
        matches!(self, Dialect::PostgreSQL | Dialect::Oracle)
    }

    /// SEQUENCE戦略にシーケンス名が必須かどうか
    pub fn requires_sequence_name(&self) -> bool {
        matches!(self, Dialect::PostgreSQL | Dialect::Oracle)
    }
}

/// テーブル自動メンテナンス設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct TableMaintenanceConfig {
    /// 機能全体の有効化
    pub enabled: bool,
    /// アプリケーション起動完了時に自動実行するか
    pub auto_execute_on_startup: bool,
    /// スキャン対象のモジュールパス（空の場合は登録済み全エンティティ）
    pub entity_packages: Vec<String>,
    /// 除外するエンティティ（完全修飾名または単純名）
    pub exclude_entities: Vec<String>,
    /// マーカーの有無にかかわらず対象とするエンティティ
    pub include_entities: Vec<String>,
    /// カラム削除を適用するか
    pub allow_drop_column: bool,
    /// インデックス削除を適用するか
    pub allow_drop_index: bool,
    /// カラム型変更を適用するか
    pub allow_modify_column_type: bool,
    /// 実行前に変更セットを検証するか
    pub validate_before_execution: bool,
    /// 実行するSQLをログ出力するか
    pub print_sql: bool,
    /// テスト環境でも実行するか
    pub execute_in_test_environment: bool,
    /// テーブルにスキーマ指定がない場合の既定スキーマ
    pub default_schema: Option<String>,
    /// 導出テーブル名の接頭辞
    pub table_prefix: String,
    /// 導出テーブル名の接尾辞
    pub table_suffix: String,
    /// キャメルケースをスネークケースに変換するか
    pub camel_case_to_underscore: bool,
    /// 1エンティティあたりの実行タイムアウト（秒、0で無制限）
    pub execution_timeout_seconds: u64,
    /// DDL文の最大リトライ回数
    pub max_retry_count: u32,
    /// リトライ間隔の初期値（ミリ秒、指数的に増加）
    pub retry_backoff_millis: u64,
    /// エラー発生時に次のエンティティへ進むか
    pub continue_on_error: bool,
    /// ワーカープールで非同期実行するか
    pub async_enabled: bool,
    /// ワーカープールのコアサイズ
    pub async_core_pool_size: usize,
    /// ワーカープールの最大サイズ
    pub async_max_pool_size: usize,
    /// ワーカープールのキュー容量
    pub async_queue_capacity: usize,
    /// ワーカー名の接頭辞
    pub async_thread_name_prefix: String,
    /// バックアップ設定
    pub backup: BackupConfig,
    /// 実行環境名（"test" の場合は環境ゲートの対象）
    pub environment: Option<String>,
    /// エンティティ記述子ファイル（またはディレクトリ）
    pub descriptor_paths: Vec<PathBuf>,
    /// 接続先データソース
    pub datasource: DataSourceConfig,
}

impl Default for TableMaintenanceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            auto_execute_on_startup: true,
            entity_packages: Vec::new(),
            exclude_entities: Vec::new(),
            include_entities: Vec::new(),
            allow_drop_column: false,
            allow_drop_index: true,
            allow_modify_column_type: false,
            validate_before_execution: true,
            print_sql: true,
            execute_in_test_environment: false,
            default_schema: None,
            table_prefix: String::new(),
            table_suffix: String::new(),
            camel_case_to_underscore: true,
            execution_timeout_seconds: 300,
            max_retry_count: 3,
            retry_backoff_millis: 500,
            continue_on_error: true,
            async_enabled: false,
            async_core_pool_size: 2,
            async_max_pool_size: 4,
            async_queue_capacity: 100,
            async_thread_name_prefix: "table-maintenance-".to_string(),
            backup: BackupConfig::default(),
            environment: None,
            descriptor_paths: Vec::new(),
            datasource: DataSourceConfig::default(),
        }
    }
}

impl TableMaintenanceConfig {
    /// 既定の設定ファイルパス
    pub const DEFAULT_CONFIG_PATH: &'static str = "tablewright.yaml";

    /// 設定値を検証
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.async_core_pool_size == 0 {
            return Err(ConfigError::invalid(
                "async-core-pool-size",
                "must be at least 1",
            ));
        }
        if self.async_max_pool_size < self.async_core_pool_size {
            return Err(ConfigError::invalid(
                "async-max-pool-size",
                format!(
                    "must be greater than or equal to async-core-pool-size ({})",
                    self.async_core_pool_size
                ),
            ));
        }
        if self.async_queue_capacity == 0 {
            return Err(ConfigError::invalid(
                "async-queue-capacity",
                "must be at least 1",
            ));
        }
        if self.backup.enabled && self.backup.backup_directory.as_os_str().is_empty() {
            return Err(ConfigError::invalid(
                "backup.backup-directory",
                "must not be empty when backup is enabled",
            ));
        }
        self.datasource.validate()
    }

    /// エンティティ単位のタイムアウト（0の場合はNone）
    pub fn execution_timeout(&self) -> Option<Duration> {
        if self.execution_timeout_seconds == 0 {
            None
        } else {
            Some(Duration::from_secs(self.execution_timeout_seconds))
        }
    }

    /// テスト環境として扱うかどうか
    pub fn is_test_environment(&self) -> bool {
        self.environment
            .as_deref()
            .is_some_and(|env| env.trim().eq_ignore_ascii_case("test"))
    }
}

/// バックアップ設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BackupConfig {
    /// バックアップの有効化
    pub enabled: bool,
    /// 出力ディレクトリ
    pub backup_directory: PathBuf,
    /// 変更実行前にバックアップするか
    pub backup_before_execution: bool,
    /// 保持日数（0で削除しない）
    pub retention_days: u32,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            backup_directory: PathBuf::from("table-backups"),
            backup_before_execution: true,
            retention_days: 30,
        }
    }
}

/// データソース設定
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DataSourceConfig {
    /// 接続URL（mysql://, postgres://）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// 最大接続数
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,

    /// 最小接続数
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_connections: Option<u32>,

    /// 接続取得タイムアウト（秒）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// アイドル接続のタイムアウト（秒）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idle_timeout: Option<u64>,
}

impl DataSourceConfig {
    /// 接続プール設定を検証
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(max) = self.max_connections {
            if max == 0 {
                return Err(ConfigError::invalid(
                    "datasource.max-connections",
                    "must be at least 1",
                ));
            }
            if let Some(min) = self.min_connections {
                if min > max {
                    return Err(ConfigError::invalid(
                        "datasource.min-connections",
                        format!("must not exceed max-connections ({})", max),
                    ));
                }
            }
        }
        Ok(())
    }

    /// 接続URLを取得（未設定の場合はエラー）
    pub fn require_url(&self) -> Result<&str, ConfigError> {
        self.url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::MissingDataSourceUrl)
    }
}

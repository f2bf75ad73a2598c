// データベース接続アダプター
//
// SQLxを使用したデータベース接続プールの管理を行います。
// MySQLとPostgreSQLに対応し、スキーマ接続（SchemaConnection）を生成します。

use crate::adapters::connection::{SchemaConnection, SqlxSchemaConnection};
use crate::core::config::DataSourceConfig;
use crate::core::error::DatabaseError;
use sqlx::pool::PoolOptions;
use sqlx::{Any, AnyPool};
use std::time::Duration;
use tracing::debug;

/// データベース接続サービス
#[derive(Debug, Clone)]
pub struct DatabaseConnectionService {}

impl DatabaseConnectionService {
    /// 新しいDatabaseConnectionServiceを作成
    pub fn new() -> Self {
        Self {}
    }

    /// データベース接続プールを作成
    ///
    /// # Arguments
    ///
    /// * `config` - データソース設定
    ///
    /// # Returns
    ///
    /// 接続プールまたはエラー
    pub async fn create_pool(&self, config: &DataSourceConfig) -> Result<AnyPool, DatabaseError> {
        let url = config
            .require_url()
            .map_err(|e| DatabaseError::Connection {
                message: "Cannot create connection pool".to_string(),
                cause: e.to_string(),
            })?;

        let pool_options = self.create_pool_options_from_config(config);

        pool_options
            .connect(url)
            .await
            .map_err(|e| DatabaseError::Connection {
                message: format!("Failed to create database connection pool: {}", redact_url(url)),
                cause: e.to_string(),
            })
    }

    /// 接続プールを作成し、スキーマ接続を返す
    pub async fn connect(
        &self,
        config: &DataSourceConfig,
    ) -> Result<SqlxSchemaConnection, DatabaseError> {
        let pool = self.create_pool(config).await?;
        let connection = SqlxSchemaConnection::from_pool(pool).await?;
        debug!(product = %connection.product_name(), "Connected to data source");
        Ok(connection)
    }

    /// DataSourceConfigからプールオプションを作成
    ///
    /// 未設定の場合はデフォルト値（max_connections=5, timeout=30秒）を使用します。
    pub fn create_pool_options_from_config(&self, config: &DataSourceConfig) -> PoolOptions<Any> {
        let max_conn = config.max_connections.unwrap_or(5);
        let timeout = config.timeout.unwrap_or(30);

        let mut opts = PoolOptions::new()
            .max_connections(max_conn)
            .acquire_timeout(Duration::from_secs(timeout));

        if let Some(min_conn) = config.min_connections {
            opts = opts.min_connections(min_conn);
        }

        if let Some(idle_secs) = config.idle_timeout {
            opts = opts.idle_timeout(Duration::from_secs(idle_secs));
        }

        opts
    }
}

impl Default for DatabaseConnectionService {
    fn default() -> Self {
        Self::new()
    }
}

/// 接続URLからパスワードを伏せる
fn redact_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            let credentials = &url[scheme_end + 3..at];
            match credentials.find(':') {
                Some(colon) => format!(
                    "{}{}:***{}",
                    &url[..scheme_end + 3],
                    &credentials[..colon],
                    &url[at..]
                ),
                None => url.to_string(),
            }
        }
        _ => url.to_string(),
    }
}

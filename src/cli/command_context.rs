// コマンド共通コンテキスト
//
// 設定ファイル読み込み・エンティティ記述子の読み込み・接続の組み立てをCLI層で集約する。

use crate::adapters::connection::SchemaConnection;
use crate::adapters::database::DatabaseConnectionService;
use crate::core::config::TableMaintenanceConfig;
use crate::core::entity::EntityDescriptor;
use crate::services::bootstrap::TableMaintenanceContext;
use crate::services::config_loader::ConfigLoader;
use crate::services::config_resolver::ConfigResolver;
use crate::services::descriptor_loader::DescriptorLoader;
use crate::services::entity_registry::EntityRegistry;
use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// CLIコマンド共通の実行コンテキスト
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub project_path: PathBuf,
    pub config_path: PathBuf,
    pub config: TableMaintenanceConfig,
    pub entities: Vec<EntityDescriptor>,
}

impl CommandContext {
    /// プロジェクトルートから設定を読み込んでコンテキストを作成
    pub fn load(project_path: PathBuf) -> Result<Self> {
        Self::load_with_config(project_path, None)
    }

    /// カスタム設定ファイルパスを指定してコンテキストを作成
    pub fn load_with_config(
        project_path: PathBuf,
        custom_config_path: Option<PathBuf>,
    ) -> Result<Self> {
        let config_path = custom_config_path
            .unwrap_or_else(|| project_path.join(TableMaintenanceConfig::DEFAULT_CONFIG_PATH));

        if !config_path.exists() {
            return Err(anyhow!("Config file not found: {:?}", config_path));
        }

        let config =
            ConfigLoader::from_file(&config_path).with_context(|| "Failed to read config file")?;
        let config = ConfigResolver::apply_env_overrides(&config);

        let descriptor_paths: Vec<PathBuf> = config
            .descriptor_paths
            .iter()
            .map(|path| {
                if path.is_absolute() {
                    path.clone()
                } else {
                    project_path.join(path)
                }
            })
            .collect();
        let entities = DescriptorLoader::load_all(&descriptor_paths)
            .with_context(|| "Failed to load entity descriptors")?;
        debug!(entities = entities.len(), "Loaded entity descriptors");

        Ok(Self {
            project_path,
            config_path,
            config,
            entities,
        })
    }

    /// 読み込んだ記述子からレジストリを作成
    pub fn registry(&self) -> EntityRegistry {
        self.entities.iter().cloned().collect()
    }

    /// データソースに接続してメンテナンスコンテキストを組み立てる
    pub async fn connect(&self) -> Result<TableMaintenanceContext> {
        self.connect_with_config(self.config.clone()).await
    }

    /// 上書きした設定で接続してメンテナンスコンテキストを組み立てる
    pub async fn connect_with_config(
        &self,
        config: TableMaintenanceConfig,
    ) -> Result<TableMaintenanceContext> {
        let connection = DatabaseConnectionService::new()
            .connect(&config.datasource)
            .await
            .with_context(|| "Failed to connect to the data source")?;
        let connection: Arc<dyn SchemaConnection> = Arc::new(connection);

        TableMaintenanceContext::build(config, self.registry(), connection)
            .with_context(|| "Failed to set up table maintenance")
    }
}

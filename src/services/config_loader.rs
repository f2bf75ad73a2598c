// 設定ファイル読み込みサービス
//
// core::config の純粋性を保つため、ファイルI/Oはこのサービスに集約する。

use crate::core::config::TableMaintenanceConfig;
use anyhow::{Context, Result};
use std::path::Path;

/// 設定ファイル読み込みサービス
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader;

impl ConfigLoader {
    /// YAMLファイルから設定を読み込み、検証する
    pub fn from_file(path: &Path) -> Result<TableMaintenanceConfig> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config = Self::from_yaml(&content)
            .with_context(|| format!("Invalid config file: {:?}", path))?;
        Ok(config)
    }

    /// YAML文字列から設定を読み込み、検証する
    pub fn from_yaml(content: &str) -> Result<TableMaintenanceConfig> {
        let config: TableMaintenanceConfig =
            serde_saphyr::from_str(content).with_context(|| "Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    /// デフォルトパスから設定を読み込む
    pub fn load_default() -> Result<TableMaintenanceConfig> {
        let path = Path::new(TableMaintenanceConfig::DEFAULT_CONFIG_PATH);
        Self::from_file(path)
    }
}

// 設定の解決サービス
//
// 環境変数による上書きをサービス層で扱い、coreは純粋な構造体に保つ。

use crate::core::config::TableMaintenanceConfig;
use crate::core::naming::ENV_PREFIX;

/// 設定の解決ユーティリティ
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver;

impl ConfigResolver {
    /// 環境変数による上書きを適用
    ///
    /// - `TABLEWRIGHT_DATABASE_URL`: datasource.url
    /// - `TABLEWRIGHT_ENV`: environment
    pub fn apply_env_overrides(base: &TableMaintenanceConfig) -> TableMaintenanceConfig {
        Self::apply_overrides(base, |key| std::env::var(key).ok())
    }

    /// 任意の値の取得関数で上書きを適用
    pub fn apply_overrides<F>(base: &TableMaintenanceConfig, lookup: F) -> TableMaintenanceConfig
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = base.clone();

        if let Some(url) = lookup(&format!("{}_DATABASE_URL", ENV_PREFIX)) {
            config.datasource.url = Some(url);
        }
        if let Some(environment) = lookup(&format!("{}_ENV", ENV_PREFIX)) {
            config.environment = Some(environment);
        }

        config
    }
}

// Services Layer
// エンティティの抽出からDDL実行までのパイプラインを担うサービス層

pub mod async_table_maintenance;
pub mod bootstrap;
pub mod change_set_validator;
pub mod config_loader;
pub mod config_resolver;
pub mod descriptor_loader;
pub mod entity_registry;
pub mod entity_scanner;
pub mod metadata_extractor;
pub mod retry;
pub mod schema_diff_detector;
pub mod startup_orchestrator;
pub mod table_backup;
pub mod table_maintenance;
pub mod worker_pool;

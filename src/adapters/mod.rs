// Adapters
// データベースとファイルシステムへのアクセスを抽象化

pub mod connection;
pub mod database;
pub mod database_introspector;
pub mod dialect;
pub mod sql_generator;
pub mod sql_quote;
pub mod type_mapping;

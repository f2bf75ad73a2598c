// エラー型定義
//
// テーブル自動メンテナンス全体で使用されるカスタムエラー型を提供します。
// thiserrorを使用して、MetadataError, ValidationError, DatabaseError, IoError,
// ConfigError, MaintenanceError を定義します。

use thiserror::Error;

/// メタデータエラー
///
/// エンティティ記述子（テーブル・カラム・インデックス・ID）が
/// 不正または矛盾している場合に発生します。
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetadataError {
    /// Duplicate column name
    #[error("Entity '{entity}' declares column '{column}' more than once")]
    DuplicateColumn {
        /// エンティティの型名
        entity: String,
        /// 重複したカラム名
        column: String,
    },

    /// Multiple identifiers
    #[error("Entity '{entity}' marks more than one field as identifier: {fields:?}")]
    MultipleIdentifiers {
        /// エンティティの型名
        entity: String,
        /// ID指定されたフィールド
        fields: Vec<String>,
    },

    /// Index references an unknown column
    #[error("Index '{index}' on entity '{entity}' references unknown column '{column}'")]
    UnknownIndexColumn {
        /// エンティティの型名
        entity: String,
        /// インデックス名
        index: String,
        /// 存在しないカラム名
        column: String,
    },

    /// Index without columns
    #[error("Index '{index}' on entity '{entity}' has no columns")]
    EmptyIndex {
        /// エンティティの型名
        entity: String,
        /// インデックス名
        index: String,
    },

    /// Duplicate index name
    #[error("Entity '{entity}' declares index '{index}' more than once")]
    DuplicateIndex {
        /// エンティティの型名
        entity: String,
        /// 重複したインデックス名
        index: String,
    },

    /// Field type cannot be mapped to a column type
    #[error("Field '{field}' on entity '{entity}' has unsupported type '{field_type}'; declare a column type explicitly")]
    UnsupportedFieldType {
        /// エンティティの型名
        entity: String,
        /// フィールド名
        field: String,
        /// フィールドの型
        field_type: String,
    },

    /// Sequence strategy without sequence name
    #[error("Table '{table}' uses a SEQUENCE identifier on {dialect} but no sequence name is declared")]
    MissingSequenceName {
        /// テーブル名
        table: String,
        /// データベース方言
        dialect: String,
    },
}

impl MetadataError {
    /// カラム重複エラーかどうか
    pub fn is_duplicate_column(&self) -> bool {
        matches!(self, MetadataError::DuplicateColumn { .. })
    }

    /// ID重複エラーかどうか
    pub fn is_multiple_identifiers(&self) -> bool {
        matches!(self, MetadataError::MultipleIdentifiers { .. })
    }

    /// インデックスの参照エラーかどうか
    pub fn is_unknown_index_column(&self) -> bool {
        matches!(self, MetadataError::UnknownIndexColumn { .. })
    }

    /// シーケンス名欠落エラーかどうか
    pub fn is_missing_sequence_name(&self) -> bool {
        matches!(self, MetadataError::MissingSequenceName { .. })
    }
}

/// バリデーションエラー
///
/// 変更セット実行前のサニティチェックで検出されたエラーを表現します。
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Duplicate index name in the proposed change set
    #[error("Duplicate index error: {message}{}", format_location_opt(.location))]
    DuplicateIndex {
        /// エラーメッセージ
        message: String,
        /// エラー発生位置
        location: Option<ErrorLocation>,
    },

    /// Primary key would be altered
    #[error("Primary key error: {message}{}", format_location_opt(.location))]
    PrimaryKey {
        /// エラーメッセージ
        message: String,
        /// エラー発生位置
        location: Option<ErrorLocation>,
    },
}

impl ValidationError {
    /// インデックス名重複エラーかどうか
    pub fn is_duplicate_index(&self) -> bool {
        matches!(self, ValidationError::DuplicateIndex { .. })
    }

    /// 主キー変更エラーかどうか
    pub fn is_primary_key(&self) -> bool {
        matches!(self, ValidationError::PrimaryKey { .. })
    }

    /// エラー発生位置を取得
    pub fn location(&self) -> Option<&ErrorLocation> {
        match self {
            ValidationError::DuplicateIndex { location, .. }
            | ValidationError::PrimaryKey { location, .. } => location.as_ref(),
        }
    }
}

/// バリデーション警告
///
/// 実行は妨げないが、運用者に知らせるべき事項を表します。
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationWarning {
    /// 警告メッセージ
    pub message: String,
    /// 警告発生位置
    pub location: Option<ErrorLocation>,
    /// 警告の種類
    pub kind: WarningKind,
}

/// 警告の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// ポリシーにより適用されない変更
    SkippedChange,
    /// データ損失の可能性がある変更
    DataLoss,
}

impl ValidationWarning {
    /// 新しい警告を作成
    pub fn new(message: String, location: Option<ErrorLocation>, kind: WarningKind) -> Self {
        Self {
            message,
            location,
            kind,
        }
    }

    /// スキップされた変更の警告を作成
    pub fn skipped_change(message: String, location: Option<ErrorLocation>) -> Self {
        Self::new(message, location, WarningKind::SkippedChange)
    }

    /// データ損失の警告を作成
    pub fn data_loss(message: String, location: Option<ErrorLocation>) -> Self {
        Self::new(message, location, WarningKind::DataLoss)
    }

    /// 位置情報をフォーマット
    pub fn format(&self) -> String {
        let location_str = self
            .location
            .as_ref()
            .map_or(String::new(), |loc| loc.format());
        format!("Warning: {}{}", self.message, location_str)
    }
}

/// エラー発生位置
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ErrorLocation {
    /// テーブル名
    pub table: Option<String>,
    /// カラム名
    pub column: Option<String>,
    /// インデックス名
    pub index: Option<String>,
}

impl ErrorLocation {
    /// テーブル名を指定してエラー位置を作成
    pub fn with_table(table: &str) -> Self {
        Self {
            table: Some(table.to_string()),
            ..Default::default()
        }
    }

    /// テーブル名とカラム名を指定してエラー位置を作成
    pub fn with_table_and_column(table: &str, column: &str) -> Self {
        Self {
            table: Some(table.to_string()),
            column: Some(column.to_string()),
            index: None,
        }
    }

    /// テーブル名とインデックス名を指定してエラー位置を作成
    pub fn with_table_and_index(table: &str, index: &str) -> Self {
        Self {
            table: Some(table.to_string()),
            column: None,
            index: Some(index.to_string()),
        }
    }

    /// 位置情報をフォーマット
    pub fn format(&self) -> String {
        let mut parts = Vec::new();

        if let Some(table) = &self.table {
            parts.push(format!("table: {}", table));
        }
        if let Some(column) = &self.column {
            parts.push(format!("column: {}", column));
        }
        if let Some(index) = &self.index {
            parts.push(format!("index: {}", index));
        }

        if parts.is_empty() {
            String::new()
        } else {
            format!(" ({})", parts.join(", "))
        }
    }
}

fn format_location_opt(location: &Option<ErrorLocation>) -> String {
    location.as_ref().map_or(String::new(), |loc| loc.format())
}

/// バリデーション結果
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// エラーのリスト
    pub errors: Vec<ValidationError>,
    /// 警告のリスト
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    /// 新しいバリデーション結果を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// エラーを追加
    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// 警告を追加
    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// 検証が成功したかどうか（エラーがない場合は成功）
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// エラーの数を取得
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// 警告の数を取得
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Result型に変換する
    ///
    /// エラーがない場合は `Ok(warnings)` を返し、
    /// エラーがある場合は `Err(errors)` を返します。
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, Vec<ValidationError>> {
        if self.errors.is_empty() {
            Ok(self.warnings)
        } else {
            Err(self.errors)
        }
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// データベースエラー
///
/// カタログ問い合わせやDDL実行時に発生するエラーを表現します。
#[derive(Debug, Clone, Error)]
pub enum DatabaseError {
    /// Connection error
    #[error("Database connection error: {message} (cause: {cause})")]
    Connection {
        /// エラーメッセージ
        message: String,
        /// エラー原因
        cause: String,
    },

    /// Query execution error
    #[error("Query execution error: {message}")]
    Query {
        /// エラーメッセージ
        message: String,
    },
}

/// I/Oエラー
///
/// バックアップファイルや記述子ファイルの操作時に発生するエラーを表現します。
#[derive(Debug, Clone, Error)]
pub enum IoError {
    /// File read error
    #[error("Failed to read file '{path}': {cause}")]
    FileRead {
        /// ファイルパス
        path: String,
        /// エラー原因
        cause: String,
    },

    /// File write error
    #[error("Failed to write file '{path}': {cause}")]
    FileWrite {
        /// ファイルパス
        path: String,
        /// エラー原因
        cause: String,
    },

    /// Directory error
    #[error("Failed to access directory '{path}': {cause}")]
    Directory {
        /// ディレクトリパス
        path: String,
        /// エラー原因
        cause: String,
    },
}

/// 設定エラー
///
/// 設定値の検証時に発生するエラーを表現します。
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Invalid value
    #[error("Invalid value for '{key}': {message}")]
    InvalidValue {
        /// 設定キー
        key: String,
        /// エラーメッセージ
        message: String,
    },

    /// Missing data source URL
    #[error("Data source URL is not configured (set datasource.url or TABLEWRIGHT_DATABASE_URL)")]
    MissingDataSourceUrl,
}

impl ConfigError {
    /// 不正値エラーを作成
    pub fn invalid(key: &str, message: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

/// メンテナンスエラー
///
/// 1エンティティの調整処理（抽出・イントロスペクト・差分・検証・実行）の失敗を表現します。
#[derive(Debug, Clone, Error)]
pub enum MaintenanceError {
    /// Metadata error
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    /// Unsupported database product
    #[error("Unsupported database product: '{product}'")]
    UnsupportedDialect {
        /// 接続から取得した製品名
        product: String,
    },

    /// Validation failure
    #[error("Validation failed for table '{table}':\n{}", join_errors(.errors))]
    Validation {
        /// テーブル名
        table: String,
        /// 検出されたエラー
        errors: Vec<ValidationError>,
    },

    /// DDL execution failure after retries
    #[error("DDL execution failed for table '{table}' after {attempts} attempt(s): {cause}\nSQL: {sql}")]
    DdlExecution {
        /// テーブル名
        table: String,
        /// 失敗したSQL
        sql: String,
        /// 試行回数
        attempts: u32,
        /// エラー原因
        cause: String,
    },

    /// Execution timeout
    #[error("Maintenance of table '{table}' exceeded {seconds}s")]
    Timeout {
        /// テーブル名
        table: String,
        /// タイムアウト秒数
        seconds: u64,
    },

    /// Database error
    #[error(transparent)]
    Database(#[from] DatabaseError),

    /// I/O error
    #[error(transparent)]
    Io(#[from] IoError),

    /// Config error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Worker pool is no longer accepting work
    #[error("Async maintenance pool is shut down")]
    PoolShutdown,
}

impl MaintenanceError {
    /// メタデータエラーかどうか
    pub fn is_metadata(&self) -> bool {
        matches!(self, MaintenanceError::Metadata(_))
    }

    /// 未対応方言エラーかどうか
    pub fn is_unsupported_dialect(&self) -> bool {
        matches!(self, MaintenanceError::UnsupportedDialect { .. })
    }

    /// バリデーションエラーかどうか
    pub fn is_validation(&self) -> bool {
        matches!(self, MaintenanceError::Validation { .. })
    }

    /// DDL実行エラーかどうか
    pub fn is_ddl_execution(&self) -> bool {
        matches!(self, MaintenanceError::DdlExecution { .. })
    }

    /// タイムアウトかどうか
    pub fn is_timeout(&self) -> bool {
        matches!(self, MaintenanceError::Timeout { .. })
    }

    /// 起動を中断すべき致命的エラーかどうか
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            MaintenanceError::UnsupportedDialect { .. } | MaintenanceError::Config(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_location_format() {
        let location = ErrorLocation::with_table_and_column("sys_user", "username");
        assert_eq!(location.format(), " (table: sys_user, column: username)");
        assert_eq!(ErrorLocation::default().format(), "");
    }

    #[test]
    fn test_validation_error_display_includes_location() {
        let error = ValidationError::DuplicateIndex {
            message: "index 'idx_a' is created twice".to_string(),
            location: Some(ErrorLocation::with_table_and_index("t", "idx_a")),
        };
        assert_eq!(
            error.to_string(),
            "Duplicate index error: index 'idx_a' is created twice (table: t, index: idx_a)"
        );
        assert!(error.is_duplicate_index());
    }

    #[test]
    fn test_validation_result_into_result() {
        let mut result = ValidationResult::new();
        result.add_warning(ValidationWarning::skipped_change("skip".to_string(), None));
        assert!(result.is_valid());

        result.add_error(ValidationError::PrimaryKey {
            message: "pk changed".to_string(),
            location: None,
        });
        assert_eq!(result.error_count(), 1);
        assert_eq!(result.warning_count(), 1);
        assert!(result.into_result().is_err());
    }

    #[test]
    fn test_maintenance_error_classification() {
        let unsupported = MaintenanceError::UnsupportedDialect {
            product: "SQLite".to_string(),
        };
        assert!(unsupported.is_fatal());
        assert!(unsupported.is_unsupported_dialect());

        let ddl = MaintenanceError::DdlExecution {
            table: "t".to_string(),
            sql: "ALTER TABLE t".to_string(),
            attempts: 4,
            cause: "lock wait timeout".to_string(),
        };
        assert!(ddl.is_ddl_execution());
        assert!(!ddl.is_fatal());
        assert!(ddl.to_string().contains("after 4 attempt(s)"));
    }

    #[test]
    fn test_metadata_error_converts_into_maintenance_error() {
        let error: MaintenanceError = MetadataError::DuplicateColumn {
            entity: "app::User".to_string(),
            column: "name".to_string(),
        }
        .into();
        assert!(error.is_metadata());
        assert_eq!(
            error.to_string(),
            "Entity 'app::User' declares column 'name' more than once"
        );
    }
}

// 変更セットバリデーターサービス
//
// 実行前のサニティチェックを行います。
// 提案されたインデックス名の重複と主キーの変更をエラー、
// ポリシーでスキップされた変更とデータ損失の可能性を警告として報告します。

use crate::adapters::dialect::SqlDialect;
use crate::core::change_set::{ChangeSet, SkippedChangeKind};
use crate::core::error::{ErrorLocation, ValidationError, ValidationResult, ValidationWarning};
use crate::core::table::{names_equal, IndexDefinition, TableDefinition};

/// 変更セットバリデーターサービス
#[derive(Debug, Clone, Default)]
pub struct ChangeSetValidator {}

impl ChangeSetValidator {
    /// 新しいChangeSetValidatorを作成
    pub fn new() -> Self {
        Self {}
    }

    /// 変更セットを検証
    ///
    /// # Arguments
    ///
    /// * `dialect` - 識別子の比較規則に使う方言
    /// * `desired` - 望ましいテーブル定義
    /// * `live` - 実テーブルの定義
    /// * `changes` - 検証対象の変更セット
    pub fn validate(
        &self,
        dialect: &SqlDialect,
        desired: &TableDefinition,
        live: Option<&TableDefinition>,
        changes: &ChangeSet,
    ) -> ValidationResult {
        let mut result = ValidationResult::new();
        let case_sensitive = dialect.identifiers_case_sensitive();

        self.validate_index_names(desired, live, changes, case_sensitive, &mut result);
        if let Some(live) = live.filter(|_| !changes.create) {
            self.validate_primary_key(desired, live, changes, case_sensitive, &mut result);
        }
        self.collect_warnings(desired, changes, &mut result);

        result
    }

    /// 提案されたインデックス名が重複しないことを検証
    fn validate_index_names(
        &self,
        desired: &TableDefinition,
        live: Option<&TableDefinition>,
        changes: &ChangeSet,
        case_sensitive: bool,
        result: &mut ValidationResult,
    ) {
        let proposed: Vec<IndexDefinition> = if changes.create {
            desired.effective_indexes()
        } else {
            changes
                .indexes_to_add
                .iter()
                .chain(changes.indexes_to_rebuild.iter())
                .cloned()
                .collect()
        };

        for (i, index) in proposed.iter().enumerate() {
            let repeated = proposed[..i]
                .iter()
                .any(|other| names_equal(&other.name, &index.name, case_sensitive));
            if repeated {
                result.add_error(ValidationError::DuplicateIndex {
                    message: format!("index '{}' is created more than once", index.name),
                    location: Some(ErrorLocation::with_table_and_index(&desired.name, &index.name)),
                });
            }
        }

        let Some(live) = live.filter(|_| !changes.create) else {
            return;
        };
        for index in &changes.indexes_to_add {
            let collides = live.effective_indexes().iter().any(|existing| {
                names_equal(&existing.name, &index.name, case_sensitive)
                    && !changes
                        .indexes_to_drop
                        .iter()
                        .any(|dropped| names_equal(dropped, &existing.name, case_sensitive))
            });
            if collides {
                result.add_error(ValidationError::DuplicateIndex {
                    message: format!("index '{}' already exists on the live table", index.name),
                    location: Some(ErrorLocation::with_table_and_index(&desired.name, &index.name)),
                });
            }
        }
    }

    /// 主キーが変更されないことを検証
    fn validate_primary_key(
        &self,
        desired: &TableDefinition,
        live: &TableDefinition,
        changes: &ChangeSet,
        case_sensitive: bool,
        result: &mut ValidationResult,
    ) {
        let desired_pk = desired.id.as_ref().map(|id| id.column.as_str());
        let live_pk = live.id.as_ref().map(|id| id.column.as_str());

        let same = match (desired_pk, live_pk) {
            (Some(a), Some(b)) => names_equal(a, b, case_sensitive),
            (None, None) => true,
            _ => false,
        };
        if !same {
            result.add_error(ValidationError::PrimaryKey {
                message: format!(
                    "primary key would change from {} to {}",
                    live_pk.unwrap_or("(none)"),
                    desired_pk.unwrap_or("(none)")
                ),
                location: Some(ErrorLocation::with_table(&desired.name)),
            });
        }

        for modification in &changes.columns_to_modify {
            if live.is_primary_key(&modification.live.name, case_sensitive) {
                result.add_error(ValidationError::PrimaryKey {
                    message: format!(
                        "primary key column '{}' would be modified",
                        modification.live.name
                    ),
                    location: Some(ErrorLocation::with_table_and_column(
                        &desired.name,
                        &modification.live.name,
                    )),
                });
            }
        }

        for column in &changes.columns_to_drop {
            if live.is_primary_key(column, case_sensitive) {
                result.add_error(ValidationError::PrimaryKey {
                    message: format!("primary key column '{}' would be dropped", column),
                    location: Some(ErrorLocation::with_table_and_column(&desired.name, column)),
                });
            }
        }
    }

    fn collect_warnings(
        &self,
        desired: &TableDefinition,
        changes: &ChangeSet,
        result: &mut ValidationResult,
    ) {
        for skipped in &changes.skipped {
            let location = match skipped.kind {
                SkippedChangeKind::ModifyColumn | SkippedChangeKind::DropColumn => {
                    ErrorLocation::with_table_and_column(&desired.name, &skipped.target)
                }
                SkippedChangeKind::DropIndex | SkippedChangeKind::RebuildIndex => {
                    ErrorLocation::with_table_and_index(&desired.name, &skipped.target)
                }
            };
            result.add_warning(ValidationWarning::skipped_change(
                skipped.to_string(),
                Some(location),
            ));
        }

        for column in &changes.columns_to_drop {
            result.add_warning(ValidationWarning::data_loss(
                format!("dropping column '{}' discards its data", column),
                Some(ErrorLocation::with_table_and_column(&desired.name, column)),
            ));
        }
    }
}

// スキーマ差分検出サービス
//
// 望ましいテーブル定義と実テーブルの定義を比較し、変更セットを構築します。
// カラム・インデックスは方言の大文字小文字規則に従って名前で照合し、
// リネームは検出しません。

use crate::adapters::dialect::SqlDialect;
use crate::core::change_set::{
    ChangeSet, ColumnChangeKind, ColumnModification, SkippedChange, SkippedChangeKind,
};
use crate::core::config::TableMaintenanceConfig;
use crate::core::table::{ColumnDefinition, TableDefinition};

/// 差分適用ポリシー
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffPolicy {
    /// カラム削除を適用するか
    pub allow_drop_column: bool,
    /// インデックス削除（再作成を含む）を適用するか
    pub allow_drop_index: bool,
    /// カラム変更を適用するか
    pub allow_modify_column_type: bool,
}

impl Default for DiffPolicy {
    fn default() -> Self {
        Self {
            allow_drop_column: false,
            allow_drop_index: true,
            allow_modify_column_type: false,
        }
    }
}

impl From<&TableMaintenanceConfig> for DiffPolicy {
    fn from(config: &TableMaintenanceConfig) -> Self {
        Self {
            allow_drop_column: config.allow_drop_column,
            allow_drop_index: config.allow_drop_index,
            allow_modify_column_type: config.allow_modify_column_type,
        }
    }
}

/// スキーマ差分検出サービス
#[derive(Debug, Clone, Default)]
pub struct SchemaDiffDetector {
    policy: DiffPolicy,
}

impl SchemaDiffDetector {
    /// 新しいSchemaDiffDetectorを作成
    pub fn new(policy: DiffPolicy) -> Self {
        Self { policy }
    }

    /// 適用ポリシー
    pub fn policy(&self) -> DiffPolicy {
        self.policy
    }

    /// 差分を検出
    ///
    /// # Arguments
    ///
    /// * `dialect` - 型の正規化と識別子の比較規則に使う方言
    /// * `desired` - 望ましいテーブル定義
    /// * `live` - 実テーブルの定義（存在しない場合は None）
    ///
    /// # Returns
    ///
    /// 変更セット（ポリシーで適用しない変更は `skipped` に記録）
    pub fn detect_diff(
        &self,
        dialect: &SqlDialect,
        desired: &TableDefinition,
        live: Option<&TableDefinition>,
    ) -> ChangeSet {
        let Some(live) = live else {
            return ChangeSet::create_table();
        };

        let mut changes = ChangeSet::default();
        self.detect_column_diff(dialect, desired, live, &mut changes);
        self.detect_index_diff(dialect, desired, live, &mut changes);
        changes
    }

    fn detect_column_diff(
        &self,
        dialect: &SqlDialect,
        desired: &TableDefinition,
        live: &TableDefinition,
        changes: &mut ChangeSet,
    ) {
        let case_sensitive = dialect.identifiers_case_sensitive();

        for column in &desired.columns {
            let Some(live_column) = live.get_column(&column.name, case_sensitive) else {
                changes.columns_to_add.push(column.clone());
                continue;
            };

            // 生のカラム定義は名前のみで照合
            if column.is_raw() {
                continue;
            }

            let is_primary_key = desired.is_primary_key(&column.name, case_sensitive);
            let kinds = column_changes(dialect, column, live_column, is_primary_key);
            if kinds.is_empty() {
                continue;
            }

            if self.policy.allow_modify_column_type {
                changes.columns_to_modify.push(ColumnModification {
                    desired: column.clone(),
                    live: live_column.clone(),
                    changes: kinds,
                });
            } else {
                let described: Vec<String> = kinds.iter().map(|k| k.to_string()).collect();
                changes.skipped.push(SkippedChange {
                    kind: SkippedChangeKind::ModifyColumn,
                    target: column.name.clone(),
                    reason: format!(
                        "allow-modify-column-type is false ({} differs: {} -> {})",
                        described.join(", "),
                        describe_column(dialect, live_column),
                        describe_column(dialect, column)
                    ),
                });
            }
        }

        for live_column in &live.columns {
            if desired.get_column(&live_column.name, case_sensitive).is_some() {
                continue;
            }
            if self.policy.allow_drop_column {
                changes.columns_to_drop.push(live_column.name.clone());
            } else {
                changes.skipped.push(SkippedChange {
                    kind: SkippedChangeKind::DropColumn,
                    target: live_column.name.clone(),
                    reason: "allow-drop-column is false".to_string(),
                });
            }
        }
    }

    fn detect_index_diff(
        &self,
        dialect: &SqlDialect,
        desired: &TableDefinition,
        live: &TableDefinition,
        changes: &mut ChangeSet,
    ) {
        let case_sensitive = dialect.identifiers_case_sensitive();
        let desired_indexes = desired.effective_indexes();

        for index in &desired_indexes {
            match live.get_index(&index.name, case_sensitive) {
                None => changes.indexes_to_add.push(index.clone()),
                Some(live_index) if !live_index.same_shape(index, case_sensitive) => {
                    if self.policy.allow_drop_index {
                        changes.indexes_to_rebuild.push(index.clone());
                    } else {
                        changes.skipped.push(SkippedChange {
                            kind: SkippedChangeKind::RebuildIndex,
                            target: index.name.clone(),
                            reason: format!(
                                "allow-drop-index is false (columns: [{}] -> [{}])",
                                live_index.columns.join(", "),
                                index.columns.join(", ")
                            ),
                        });
                    }
                }
                Some(_) => {}
            }
        }

        for live_index in live.effective_indexes() {
            if desired.get_index(&live_index.name, case_sensitive).is_some() {
                continue;
            }
            if self.policy.allow_drop_index {
                changes.indexes_to_drop.push(live_index.name);
            } else {
                changes.skipped.push(SkippedChange {
                    kind: SkippedChangeKind::DropIndex,
                    target: live_index.name,
                    reason: "allow-drop-index is false".to_string(),
                });
            }
        }
    }
}

/// カラムの差分の種類を判定
fn column_changes(
    dialect: &SqlDialect,
    desired: &ColumnDefinition,
    live: &ColumnDefinition,
    is_primary_key: bool,
) -> Vec<ColumnChangeKind> {
    let mut kinds = Vec::new();

    if type_differs(dialect, desired, live) {
        kinds.push(ColumnChangeKind::Type);
    }

    // 主キーはNOT NULLが暗黙
    if !is_primary_key && desired.nullable != live.nullable {
        kinds.push(ColumnChangeKind::Nullability);
    }

    let generated = is_primary_key || desired.auto_increment || live.auto_increment;
    if !generated && !defaults_equal(dialect, desired, live) {
        kinds.push(ColumnChangeKind::Default);
    }

    kinds
}

/// デフォルト値を大文字小文字を無視して比較（カタログはクォートを外した値を返す場合がある）
fn defaults_equal(dialect: &SqlDialect, desired: &ColumnDefinition, live: &ColumnDefinition) -> bool {
    match (
        dialect.normalize_default(desired.default_value.as_deref()),
        dialect.normalize_default(live.default_value.as_deref()),
    ) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(&b),
        (a, b) => a == b,
    }
}

/// 型・長さ・精度が実質的に異なるかどうか
fn type_differs(dialect: &SqlDialect, desired: &ColumnDefinition, live: &ColumnDefinition) -> bool {
    if let Some(physical) = &live.physical_type {
        let wanted = dialect.normalize_type(&dialect.map_type(desired));
        let actual = dialect.normalize_type(physical);
        return !wanted.eq_ignore_ascii_case(&actual);
    }

    if desired.logical_type != live.logical_type {
        return true;
    }
    if desired.logical_type.has_length() && desired.effective_length() != live.effective_length() {
        return true;
    }
    desired.logical_type.has_precision()
        && desired.effective_precision() != live.effective_precision()
}

fn describe_column(dialect: &SqlDialect, column: &ColumnDefinition) -> String {
    let sql_type = column
        .physical_type
        .clone()
        .unwrap_or_else(|| dialect.map_type(column));
    let nullability = if column.nullable { "NULL" } else { "NOT NULL" };
    match &column.default_value {
        Some(default) => format!("{} {} DEFAULT {}", sql_type, nullability, default),
        None => format!("{} {}", sql_type, nullability),
    }
}

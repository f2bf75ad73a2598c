// 変更セット
//
// 1テーブル分の調整パスで必要となる追加・変更・削除操作を表現します。
// 実行ごとに新しく構築され、永続化されません。

use crate::core::table::{ColumnDefinition, IndexDefinition};
use serde::Serialize;

/// カラムの変更内容の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnChangeKind {
    /// 型・長さ・精度の変更
    Type,
    /// NULL許可の変更
    Nullability,
    /// デフォルト値の変更
    Default,
}

impl std::fmt::Display for ColumnChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnChangeKind::Type => write!(f, "type"),
            ColumnChangeKind::Nullability => write!(f, "nullability"),
            ColumnChangeKind::Default => write!(f, "default"),
        }
    }
}

/// カラム変更
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnModification {
    /// 望ましいカラム定義
    pub desired: ColumnDefinition,
    /// 現在のカラム定義
    pub live: ColumnDefinition,
    /// 検出された差分
    pub changes: Vec<ColumnChangeKind>,
}

impl ColumnModification {
    /// 指定の種類の差分を含むかどうか
    pub fn has_change(&self, kind: ColumnChangeKind) -> bool {
        self.changes.contains(&kind)
    }
}

/// ポリシーで適用されなかった変更の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkippedChangeKind {
    ModifyColumn,
    DropColumn,
    DropIndex,
    RebuildIndex,
}

/// ポリシーで適用されなかった変更
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedChange {
    /// 種類
    pub kind: SkippedChangeKind,
    /// 対象（カラム名またはインデックス名）
    pub target: String,
    /// 理由
    pub reason: String,
}

impl std::fmt::Display for SkippedChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} '{}' skipped: {}", self.kind, self.target, self.reason)
    }
}

/// 変更セット
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChangeSet {
    /// テーブル新規作成
    pub create: bool,
    /// 追加するカラム
    pub columns_to_add: Vec<ColumnDefinition>,
    /// 変更するカラム
    pub columns_to_modify: Vec<ColumnModification>,
    /// 削除するカラム
    pub columns_to_drop: Vec<String>,
    /// 追加するインデックス
    pub indexes_to_add: Vec<IndexDefinition>,
    /// 再作成するインデックス（削除してから作成）
    pub indexes_to_rebuild: Vec<IndexDefinition>,
    /// 削除するインデックス
    pub indexes_to_drop: Vec<String>,
    /// ポリシーで適用されなかった変更
    pub skipped: Vec<SkippedChange>,
}

impl ChangeSet {
    /// テーブル作成の変更セット
    pub fn create_table() -> Self {
        Self {
            create: true,
            ..Default::default()
        }
    }

    /// 適用する操作がないかどうか（スキップされた変更は含まない）
    pub fn is_empty(&self) -> bool {
        !self.create
            && self.columns_to_add.is_empty()
            && self.columns_to_modify.is_empty()
            && self.columns_to_drop.is_empty()
            && self.indexes_to_add.is_empty()
            && self.indexes_to_rebuild.is_empty()
            && self.indexes_to_drop.is_empty()
    }

    /// 適用する操作の数
    pub fn operation_count(&self) -> usize {
        usize::from(self.create)
            + self.columns_to_add.len()
            + self.columns_to_modify.len()
            + self.columns_to_drop.len()
            + self.indexes_to_add.len()
            + self.indexes_to_rebuild.len()
            + self.indexes_to_drop.len()
    }

    /// 破壊的な操作（削除・再作成）を含むかどうか
    pub fn has_destructive_changes(&self) -> bool {
        !self.columns_to_drop.is_empty()
            || !self.indexes_to_drop.is_empty()
            || !self.indexes_to_rebuild.is_empty()
    }
}

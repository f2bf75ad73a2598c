// メンテナンスレポート
//
// エンティティごとの状態遷移と実行結果、バッチ全体の集計を表現します。

use crate::core::change_set::SkippedChange;
use serde::Serialize;
use std::path::PathBuf;

/// エンティティ単位の処理状態
///
/// `NotStarted → MetadataExtracted → Introspected → Diffed →
/// {NoChange → Done | Validating → {Validated → (BackingUp →) Executing →
/// {Success → Done | Retrying → {Success → Done | Exhausted → Failed}} |
/// ValidationFailed → {Skipped | Aborted}}}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum EntityState {
    NotStarted,
    MetadataExtracted,
    Introspected,
    Diffed,
    NoChange,
    Validating,
    Validated,
    ValidationFailed,
    BackingUp,
    Executing,
    Retrying { attempt: u32 },
    Exhausted,
    Success,
    Skipped,
    Aborted,
    Failed,
    Done,
}

impl EntityState {
    /// 終端状態かどうか
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EntityState::Done | EntityState::Failed | EntityState::Skipped | EntityState::Aborted
        )
    }
}

impl std::fmt::Display for EntityState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityState::Retrying { attempt } => write!(f, "Retrying({})", attempt),
            other => write!(f, "{:?}", other),
        }
    }
}

/// テーブル単位のレポート
#[derive(Debug, Clone, Serialize)]
pub struct TableReport {
    /// エンティティの型名
    pub entity: String,
    /// テーブル名（抽出に成功した場合）
    pub table: Option<String>,
    /// 状態遷移の履歴
    pub history: Vec<EntityState>,
    /// 実行したSQL
    pub statements: Vec<String>,
    /// ポリシーで適用されなかった変更
    pub skipped: Vec<SkippedChange>,
    /// リトライ回数の合計
    pub retries: u32,
    /// バックアップファイル
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_file: Option<PathBuf>,
    /// エラーメッセージ
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// 所要時間（ミリ秒）
    pub duration_ms: u64,
}

impl TableReport {
    /// 新しいレポートを作成
    pub fn new(entity: &str) -> Self {
        Self {
            entity: entity.to_string(),
            table: None,
            history: vec![EntityState::NotStarted],
            statements: Vec::new(),
            skipped: Vec::new(),
            retries: 0,
            backup_file: None,
            error: None,
            duration_ms: 0,
        }
    }

    /// 状態を遷移
    pub fn transition(&mut self, state: EntityState) {
        self.history.push(state);
    }

    /// 現在の状態
    pub fn state(&self) -> EntityState {
        self.history
            .last()
            .copied()
            .unwrap_or(EntityState::NotStarted)
    }

    /// 正常終了したかどうか
    pub fn is_success(&self) -> bool {
        self.state() == EntityState::Done
    }

    /// 失敗したかどうか（スキップ・中断を含む）
    pub fn is_failed(&self) -> bool {
        matches!(
            self.state(),
            EntityState::Failed | EntityState::Skipped | EntityState::Aborted
        )
    }

    /// 変更を適用したかどうか
    pub fn changed(&self) -> bool {
        !self.statements.is_empty()
    }

    /// 状態を経由したかどうか
    pub fn passed_through(&self, state: EntityState) -> bool {
        self.history.contains(&state)
    }

    /// 表示用の名前（テーブル名、なければ型名）
    pub fn display_name(&self) -> &str {
        self.table.as_deref().unwrap_or(&self.entity)
    }
}

/// バッチ全体のレポート
#[derive(Debug, Clone, Default, Serialize)]
pub struct MaintenanceReport {
    /// テーブルごとのレポート（処理順）
    pub tables: Vec<TableReport>,
}

impl MaintenanceReport {
    /// レポートを追加
    pub fn push(&mut self, report: TableReport) {
        self.tables.push(report);
    }

    /// 正常終了したテーブル
    pub fn succeeded(&self) -> impl Iterator<Item = &TableReport> {
        self.tables.iter().filter(|t| t.is_success())
    }

    /// 失敗したテーブル
    pub fn failed(&self) -> impl Iterator<Item = &TableReport> {
        self.tables.iter().filter(|t| t.is_failed())
    }

    /// 変更を適用したテーブル数
    pub fn changed_count(&self) -> usize {
        self.tables.iter().filter(|t| t.changed()).count()
    }

    /// 実行したSQLの総数
    pub fn statement_count(&self) -> usize {
        self.tables.iter().map(|t| t.statements.len()).sum()
    }

    /// 失敗がないかどうか
    pub fn is_success(&self) -> bool {
        self.failed().next().is_none()
    }

    /// 名前（テーブル名または型名）でレポートを検索
    pub fn find(&self, name: &str) -> Option<&TableReport> {
        self.tables
            .iter()
            .find(|t| t.table.as_deref() == Some(name) || t.entity == name)
    }
}

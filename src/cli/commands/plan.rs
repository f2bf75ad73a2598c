// planコマンドハンドラー
//
// 選択したエンティティごとに実テーブルを参照し、実行予定のDDLを表示します。
// データベースへの変更は行いません。

use crate::cli::command_context::CommandContext;
use crate::cli::commands::{describe_validation, render_output, select_entities, CommandOutput};
use crate::cli::OutputFormat;
use crate::core::change_set::SkippedChange;
use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

/// planコマンドの出力構造体
#[derive(Debug, Clone, Serialize)]
pub struct PlanOutput {
    pub tables: Vec<TablePlanOutput>,
    /// 実行予定のSQLの総数
    pub statement_count: usize,
}

/// テーブル単位の計画
#[derive(Debug, Clone, Serialize)]
pub struct TablePlanOutput {
    pub entity: String,
    pub table: String,
    /// テーブルを新規作成するか
    pub create: bool,
    pub statements: Vec<String>,
    pub skipped: Vec<SkippedChange>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl CommandOutput for PlanOutput {
    fn to_text(&self) -> String {
        if self.tables.is_empty() {
            return "No entities to maintain.".to_string();
        }

        let mut lines = Vec::new();
        for table in &self.tables {
            let header = if table.create {
                format!("{} ({}) - create", table.table, table.entity)
            } else {
                format!("{} ({})", table.table, table.entity)
            };
            lines.push(header.bold().to_string());

            if table.statements.is_empty() {
                lines.push(format!("  {}", "No changes".green()));
            }
            for statement in &table.statements {
                lines.push(format!("  {};", statement));
            }
            for skipped in &table.skipped {
                lines.push(format!("  {} {}", "skipped:".yellow(), skipped));
            }
            for error in &table.errors {
                lines.push(format!("  {} {}", "error:".red(), error));
            }
            for warning in &table.warnings {
                lines.push(format!("  {}", warning.yellow()));
            }
        }
        lines.push(String::new());
        lines.push(format!(
            "{} statement(s) planned for {} table(s)",
            self.statement_count,
            self.tables.len()
        ));
        lines.join("\n")
    }
}

/// planコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct PlanCommand {
    /// プロジェクトのルートパス
    pub project_path: PathBuf,
    /// カスタム設定ファイルパス
    pub config_path: Option<PathBuf>,
    /// 対象エンティティ（空なら全候補）
    pub entities: Vec<String>,
    /// 出力フォーマット
    pub format: OutputFormat,
}

/// planコマンドハンドラー
#[derive(Debug, Default)]
pub struct PlanCommandHandler {}

impl PlanCommandHandler {
    /// 新しいPlanCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// planコマンドを実行
    pub async fn execute(&self, command: &PlanCommand) -> Result<String> {
        let context = CommandContext::load_with_config(
            command.project_path.clone(),
            command.config_path.clone(),
        )?;
        let maintenance = context.connect().await?;
        let entities = select_entities(&maintenance, &command.entities)?;

        let mut tables = Vec::new();
        for entity in &entities {
            let plan = maintenance
                .service
                .plan_table(entity)
                .await
                .with_context(|| format!("Failed to plan entity {}", entity.type_name))?;
            let (errors, warnings) = describe_validation(&plan.validation);
            tables.push(TablePlanOutput {
                entity: entity.type_name.clone(),
                table: plan.table.name.clone(),
                create: plan.changes.create,
                statements: plan.statements,
                skipped: plan.changes.skipped,
                errors,
                warnings,
            });
        }

        let output = PlanOutput {
            statement_count: tables.iter().map(|t| t.statements.len()).sum(),
            tables,
        };
        render_output(&output, &command.format)
    }
}

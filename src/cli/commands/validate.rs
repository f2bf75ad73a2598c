// validateコマンドハンドラー
//
// 変更セットを実行せずに検証します。
// インデックス名の重複と主キーの変更はエラー、スキップされる変更とデータ損失は警告です。

use crate::cli::command_context::CommandContext;
use crate::cli::commands::{describe_validation, render_output, select_entities, CommandOutput};
use crate::cli::OutputFormat;
use anyhow::{anyhow, Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

/// validateコマンドの出力構造体
#[derive(Debug, Clone, Serialize)]
pub struct ValidateOutput {
    pub is_valid: bool,
    pub error_count: usize,
    pub warning_count: usize,
    pub tables: Vec<TableValidation>,
}

/// テーブル単位の検証結果
#[derive(Debug, Clone, Serialize)]
pub struct TableValidation {
    pub entity: String,
    pub table: String,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidateOutput {
    fn new(tables: Vec<TableValidation>) -> Self {
        let error_count = tables.iter().map(|t| t.errors.len()).sum();
        let warning_count = tables.iter().map(|t| t.warnings.len()).sum();
        Self {
            is_valid: error_count == 0,
            error_count,
            warning_count,
            tables,
        }
    }
}

impl CommandOutput for ValidateOutput {
    fn to_text(&self) -> String {
        let mut lines = Vec::new();
        for table in &self.tables {
            let mark = if table.errors.is_empty() {
                "✓".green()
            } else {
                "✗".red()
            };
            lines.push(format!("{} {} ({})", mark, table.table, table.entity));
            for error in &table.errors {
                lines.push(format!("    {}", error.red()));
            }
            for warning in &table.warnings {
                lines.push(format!("    {}", warning.yellow()));
            }
        }

        let summary = format!(
            "{} table(s) checked, {} error(s), {} warning(s)",
            self.tables.len(),
            self.error_count,
            self.warning_count
        );
        if self.is_valid {
            lines.push(summary.green().to_string());
        } else {
            lines.push(summary.red().to_string());
        }
        lines.join("\n")
    }
}

/// validateコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct ValidateCommand {
    /// プロジェクトのルートパス
    pub project_path: PathBuf,
    /// カスタム設定ファイルパス
    pub config_path: Option<PathBuf>,
    /// 対象エンティティ（空なら全候補）
    pub entities: Vec<String>,
    /// 出力フォーマット
    pub format: OutputFormat,
}

/// validateコマンドハンドラー
#[derive(Debug, Default)]
pub struct ValidateCommandHandler {}

impl ValidateCommandHandler {
    /// 新しいValidateCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// validateコマンドを実行
    ///
    /// エラーがある場合は結果を出力したうえでエラーを返します。
    pub async fn execute(&self, command: &ValidateCommand) -> Result<String> {
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
                .with_context(|| format!("Failed to validate entity {}", entity.type_name))?;
            let (errors, warnings) = describe_validation(&plan.validation);
            tables.push(TableValidation {
                entity: entity.type_name.clone(),
                table: plan.table.name,
                errors,
                warnings,
            });
        }

        let output = ValidateOutput::new(tables);
        if output.is_valid {
            return render_output(&output, &command.format);
        }

        let rendered = render_output(&output, &command.format)?;
        match &command.format {
            OutputFormat::Json => println!("{}", rendered),
            OutputFormat::Text => eprintln!("{}", rendered),
        }
        Err(anyhow!("Validation failed with {} error(s)", output.error_count))
    }
}

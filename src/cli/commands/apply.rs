// applyコマンドハンドラー
//
// 選択したエンティティのテーブルをエンティティ記述子に合わせて更新します。
// - データベース接続の確立と方言の選択
// - テーブルごとの差分検出・検証・バックアップ・実行（リトライ付き）
// - 進捗表示と実行結果の集計

use crate::cli::command_context::CommandContext;
use crate::cli::commands::{render_output, select_entities, CommandOutput};
use crate::cli::OutputFormat;
use crate::core::config::TableMaintenanceConfig;
use crate::core::report::{MaintenanceReport, TableReport};
use anyhow::{anyhow, Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::debug;

/// applyコマンドの出力構造体
#[derive(Debug, Clone, Serialize)]
pub struct ApplyOutput {
    pub tables: Vec<TableReport>,
    /// 変更を適用したテーブル数
    pub changed_count: usize,
    pub failed_count: usize,
    pub statement_count: usize,
    /// 合計実行時間（ミリ秒）
    pub total_duration_ms: u64,
}

impl ApplyOutput {
    fn new(report: MaintenanceReport, total_duration_ms: u64) -> Self {
        Self {
            changed_count: report.changed_count(),
            failed_count: report.failed().count(),
            statement_count: report.statement_count(),
            tables: report.tables,
            total_duration_ms,
        }
    }
}

impl CommandOutput for ApplyOutput {
    fn to_text(&self) -> String {
        if self.tables.is_empty() {
            return "No entities to maintain.".to_string();
        }

        let mut lines = Vec::new();
        for table in &self.tables {
            let state = table.state().to_string();
            let state = if table.is_failed() {
                state.red()
            } else if table.changed() {
                state.green()
            } else {
                state.normal()
            };
            let mut line = format!(
                "{} {} ({} statement(s), {}ms)",
                state,
                table.display_name(),
                table.statements.len(),
                table.duration_ms
            );
            if table.retries > 0 {
                line.push_str(&format!(", {} retries", table.retries));
            }
            lines.push(line);

            if let Some(backup) = &table.backup_file {
                lines.push(format!("    backup: {}", backup.display()));
            }
            for skipped in &table.skipped {
                lines.push(format!("    {} {}", "skipped:".yellow(), skipped));
            }
            if let Some(error) = &table.error {
                lines.push(format!("    {}", error.red()));
            }
        }

        lines.push(String::new());
        lines.push(format!(
            "{} table(s) changed, {} failed, {} statement(s) executed in {}ms",
            self.changed_count, self.failed_count, self.statement_count, self.total_duration_ms
        ));
        lines.join("\n")
    }
}

/// applyコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct ApplyCommand {
    /// プロジェクトのルートパス
    pub project_path: PathBuf,
    /// カスタム設定ファイルパス
    pub config_path: Option<PathBuf>,
    /// 対象エンティティ（空なら全候補）
    pub entities: Vec<String>,
    /// 失敗したテーブルの後も処理を続ける
    pub continue_on_error: bool,
    /// カラム削除を許可
    pub allow_drop_column: bool,
    /// カラム型変更を許可
    pub allow_modify_column_type: bool,
    /// テーブルごとのタイムアウト（秒）
    pub timeout: Option<u64>,
    /// 出力フォーマット
    pub format: OutputFormat,
}

impl ApplyCommand {
    /// コマンドラインの指定で設定を上書き（フラグは有効化のみ）
    pub fn override_config(&self, base: &TableMaintenanceConfig) -> TableMaintenanceConfig {
        let mut config = base.clone();
        config.continue_on_error |= self.continue_on_error;
        config.allow_drop_column |= self.allow_drop_column;
        config.allow_modify_column_type |= self.allow_modify_column_type;
        if let Some(timeout) = self.timeout {
            config.execution_timeout_seconds = timeout;
        }
        config
    }
}

/// applyコマンドハンドラー
#[derive(Debug, Default)]
pub struct ApplyCommandHandler {}

impl ApplyCommandHandler {
    /// 新しいApplyCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// applyコマンドを実行
    ///
    /// # Returns
    ///
    /// 成功時はテーブルごとの結果の概要、失敗したテーブルがある場合はエラー
    pub async fn execute(&self, command: &ApplyCommand) -> Result<String> {
        let context = CommandContext::load_with_config(
            command.project_path.clone(),
            command.config_path.clone(),
        )?;
        let config = command.override_config(&context.config);
        let maintenance = context.connect_with_config(config).await?;
        let entities = select_entities(&maintenance, &command.entities)?;
        debug!(entities = entities.len(), "Selected entities to apply");

        let progress = self.progress_bar(entities.len() as u64, &command.format)?;
        let started = Instant::now();
        let result = maintenance
            .service
            .maintain_tables_with_progress(&entities, |table| {
                progress.set_message(table.display_name().to_string());
                progress.inc(1);
            })
            .await;

        let report = match result {
            Ok(report) => {
                progress.finish_and_clear();
                report
            }
            Err(e) => {
                progress.abandon();
                return Err(anyhow::Error::new(e)).with_context(|| "Table maintenance aborted");
            }
        };

        let output = ApplyOutput::new(report, started.elapsed().as_millis() as u64);
        if output.failed_count == 0 {
            return render_output(&output, &command.format);
        }

        let rendered = render_output(&output, &command.format)?;
        match &command.format {
            OutputFormat::Json => println!("{}", rendered),
            OutputFormat::Text => eprintln!("{}", rendered),
        }
        Err(anyhow!("{} table(s) failed to apply", output.failed_count))
    }

    /// テキスト出力時のみ表示される進捗バー
    fn progress_bar(&self, len: u64, format: &OutputFormat) -> Result<ProgressBar> {
        if *format == OutputFormat::Json {
            return Ok(ProgressBar::hidden());
        }
        let style =
            ProgressStyle::with_template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .map_err(|e| anyhow!("Invalid progress template: {}", e))?
                .progress_chars("=> ");
        let bar = ProgressBar::new(len);
        bar.set_style(style);
        Ok(bar)
    }
}

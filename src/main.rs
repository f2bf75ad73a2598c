use anyhow::{Context, Result};
use clap::Parser;
use colored::control as color_control;
use std::env;
use std::path::PathBuf;
use std::process;
use tablewright::cli::commands::apply::{ApplyCommand, ApplyCommandHandler};
use tablewright::cli::commands::plan::{PlanCommand, PlanCommandHandler};
use tablewright::cli::commands::validate::{ValidateCommand, ValidateCommandHandler};
use tablewright::cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() {
    sqlx::any::install_default_drivers();

    // CLIをパースして実行
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // 非同期ランタイムを作成して実行
    let runtime = tokio::runtime::Runtime::new()
        .context("Failed to create Tokio runtime")
        .unwrap_or_else(|e| {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        });

    let result = runtime.block_on(run_command(cli));

    match result {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

/// ログ出力を初期化（RUST_LOG 優先、--verbose でdebug）
fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "tablewright=debug" } else { "tablewright=warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// コマンドを実行する
async fn run_command(cli: Cli) -> Result<String> {
    // --no-color フラグの処理
    if cli.no_color {
        color_control::set_override(false);
    }

    // プロジェクトのルートパスを取得
    let project_path = env::current_dir()?;

    // --config フラグの処理（絶対パスに変換）
    let config_path: Option<PathBuf> = cli.config.map(|p| {
        if p.is_absolute() {
            p
        } else {
            project_path.join(p)
        }
    });

    match cli.command {
        Commands::Plan { entities } => {
            let handler = PlanCommandHandler::new();
            let command = PlanCommand {
                project_path,
                config_path,
                entities,
                format: cli.format,
            };
            handler.execute(&command).await
        }

        Commands::Apply {
            entities,
            continue_on_error,
            allow_drop_column,
            allow_modify_column_type,
            timeout,
        } => {
            let handler = ApplyCommandHandler::new();
            let command = ApplyCommand {
                project_path,
                config_path,
                entities,
                continue_on_error,
                allow_drop_column,
                allow_modify_column_type,
                timeout,
                format: cli.format,
            };
            handler.execute(&command).await
        }

        Commands::Validate { entities } => {
            let handler = ValidateCommandHandler::new();
            let command = ValidateCommand {
                project_path,
                config_path,
                entities,
                format: cli.format,
            };
            handler.execute(&command).await
        }
    }
}

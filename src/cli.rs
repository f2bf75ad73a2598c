// CLI Layer
// ユーザー入力の受付とコマンドルーティング

pub mod command_context;
pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// 出力フォーマット
#[derive(Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output (default)
    #[default]
    Text,
    /// Structured JSON output
    Json,
}

/// Tablewright - Declarative table auto-maintenance
///
/// Reconcile live database tables with entity descriptors.
#[derive(Parser, Debug)]
#[command(name = "tablewright")]
#[command(author = "Tablewright Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Declarative table auto-maintenance CLI tool")]
#[command(long_about = "Tablewright - Declarative table auto-maintenance

Entity descriptors declare the tables an application expects.
Tablewright introspects the live database, computes a safe change set
and applies it with retry, backup and continue-on-error policies.

Supported databases: MySQL, PostgreSQL (SQL Server and Oracle through the library API)")]
#[command(propagate_version = true)]
#[command(after_help = "GETTING STARTED:
  1. Describe your entities:       Edit files listed in descriptor-paths
  2. Preview the DDL:              tablewright plan
  3. Check the change set:         tablewright validate
  4. Apply the changes:            tablewright apply

For detailed help on each command, use: tablewright <command> --help")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Output format (text or json)
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the DDL that would be executed
    ///
    /// Introspects each selected table and renders the statements
    /// needed to reconcile it, without executing anything.
    ///
    /// EXAMPLES:
    ///   # Plan every candidate entity
    ///   tablewright plan
    ///
    ///   # Plan a single entity by name or table name
    ///   tablewright plan --entity SysUser
    Plan {
        /// Entity type name, simple name or table name (repeatable)
        #[arg(short, long = "entity", value_name = "NAME")]
        entities: Vec<String>,
    },

    /// Reconcile the live tables with the entity descriptors
    ///
    /// Runs the full pipeline for each selected entity: introspect, diff,
    /// validate, back up and execute with retry.
    ///
    /// EXAMPLES:
    ///   # Apply every candidate entity
    ///   tablewright apply
    ///
    ///   # Keep going after a failed table
    ///   tablewright apply --continue-on-error
    ///
    ///   # Allow dropping columns missing from the descriptors
    ///   tablewright apply --allow-drop-column
    Apply {
        /// Entity type name, simple name or table name (repeatable)
        #[arg(short, long = "entity", value_name = "NAME")]
        entities: Vec<String>,

        /// Continue with the next table when one fails
        #[arg(long)]
        continue_on_error: bool,

        /// Allow dropping columns that are no longer described
        #[arg(long)]
        allow_drop_column: bool,

        /// Allow modifying column types
        #[arg(long)]
        allow_modify_column_type: bool,

        /// Timeout per table (in seconds)
        #[arg(long, value_name = "SECONDS")]
        timeout: Option<u64>,
    },

    /// Validate the change sets without executing them
    ///
    /// Reports duplicate index names and primary key changes as errors,
    /// and skipped or data-losing changes as warnings.
    ///
    /// EXAMPLES:
    ///   tablewright validate
    ///   tablewright validate --entity sys_user
    Validate {
        /// Entity type name, simple name or table name (repeatable)
        #[arg(short, long = "entity", value_name = "NAME")]
        entities: Vec<String>,
    },
}

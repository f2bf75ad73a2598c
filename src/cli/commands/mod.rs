// コマンドハンドラー層
// 各CLIコマンドの実装と共通の出力処理

pub mod apply;
pub mod plan;
pub mod validate;

use crate::cli::OutputFormat;
use crate::core::entity::EntityDescriptor;
use crate::core::error::ValidationResult;
use crate::services::bootstrap::TableMaintenanceContext;
use anyhow::{anyhow, Context, Result};
use serde::Serialize;

/// コマンド出力（テキストとJSONの両方で表現できる）
pub trait CommandOutput: Serialize {
    /// テキスト形式の出力
    fn to_text(&self) -> String;
}

/// 出力フォーマットに従って出力を文字列化
pub fn render_output<T: CommandOutput>(output: &T, format: &OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(output.to_text()),
        OutputFormat::Json => {
            serde_json::to_string_pretty(output).with_context(|| "Failed to serialize output")
        }
    }
}

/// 名前指定に一致するエンティティを選ぶ（指定なしなら全候補）
pub(crate) fn select_entities(
    context: &TableMaintenanceContext,
    names: &[String],
) -> Result<Vec<EntityDescriptor>> {
    let entities = context.select(names);
    if !names.is_empty() && entities.is_empty() {
        return Err(anyhow!("No entity matches: {}", names.join(", ")));
    }
    Ok(entities)
}

/// バリデーション結果をエラー文と警告文に分ける
pub(crate) fn describe_validation(result: &ValidationResult) -> (Vec<String>, Vec<String>) {
    let errors = result.errors.iter().map(|e| e.to_string()).collect();
    let warnings = result.warnings.iter().map(|w| w.format()).collect();
    (errors, warnings)
}

// 共通型処理ロジック
//
// 複数の方言で共通する型文字列・デフォルト値の正規化を提供します。

use regex::Regex;
use std::sync::LazyLock;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static OPEN_SPACING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*([(,])\s*").expect("valid regex"));
static CLOSE_SPACING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\)").expect("valid regex"));
static PG_CAST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"::[A-Za-z_][A-Za-z0-9_ ]*(\(\d+(,\s*\d+)?\))?(\[\])?$").expect("valid regex")
});

/// 型文字列を大文字化し、空白を正規化
///
/// `varchar( 50 )` → `VARCHAR(50)`、`double  precision` → `DOUBLE PRECISION`
pub fn canonical_type(sql_type: &str) -> String {
    let collapsed = WHITESPACE.replace_all(sql_type.trim(), " ");
    let opened = OPEN_SPACING.replace_all(&collapsed, "$1");
    CLOSE_SPACING.replace_all(&opened, ")").to_uppercase()
}

/// 型文字列を基本名と引数に分割
///
/// `DECIMAL(19,2)` → (`DECIMAL`, Some(`19,2`))
pub fn split_type(sql_type: &str) -> (&str, Option<&str>) {
    match (sql_type.find('('), sql_type.rfind(')')) {
        (Some(open), Some(close)) if close > open => {
            let base = sql_type[..open].trim();
            (base, Some(sql_type[open + 1..close].trim()))
        }
        _ => (sql_type.trim(), None),
    }
}

/// 型引数を数値リストとして解釈
pub fn type_args(args: Option<&str>) -> Vec<u32> {
    args.map(|a| {
        a.split(',')
            .filter_map(|part| part.trim().parse::<u32>().ok())
            .collect()
    })
    .unwrap_or_default()
}

/// 長さ付き型を組み立てる（長さ未指定の場合は基本名のみ）
pub fn with_length(base: &str, length: Option<i64>) -> String {
    match length {
        Some(len) if len > 0 => format!("{}({})", base, len),
        _ => base.to_string(),
    }
}

/// 精度・スケール付き型を組み立てる
pub fn with_precision(base: &str, precision: Option<i64>, scale: Option<i64>) -> String {
    match (precision, scale) {
        (Some(p), Some(s)) => format!("{}({},{})", base, p, s),
        (Some(p), None) => format!("{}({})", base, p),
        _ => base.to_string(),
    }
}

/// デフォルト値を比較用に正規化
///
/// - 外側の括弧を除去（SQL Serverの `((0))`）
/// - PostgreSQLの型キャストを除去（`'a'::character varying`）
/// - 文字列リテラルのクォートを除去
/// - 現在時刻を表す関数を `CURRENT_TIMESTAMP` に統一
/// - `NULL` は未指定として扱う
pub fn normalize_default_value(value: Option<&str>) -> Option<String> {
    let mut current = value?.trim().to_string();

    loop {
        let stripped = strip_wrapping_parens(&current);
        let uncast = PG_CAST.replace(stripped, "").trim().to_string();
        if uncast == current {
            break;
        }
        current = uncast;
    }

    if let Some(inner) = current
        .strip_prefix("N'")
        .or_else(|| current.strip_prefix('\''))
        .and_then(|rest| rest.strip_suffix('\''))
    {
        return Some(inner.replace("''", "'"));
    }

    let upper = current.to_uppercase();
    match upper.as_str() {
        "" | "NULL" => None,
        "NOW()" | "CURRENT_TIMESTAMP()" | "GETDATE()" | "SYSDATETIME()" | "SYSDATE"
        | "SYSTIMESTAMP" | "LOCALTIMESTAMP" => Some("CURRENT_TIMESTAMP".to_string()),
        _ => Some(upper),
    }
}

/// 全体を囲む括弧を1組だけ除去
fn strip_wrapping_parens(value: &str) -> &str {
    if !(value.starts_with('(') && value.ends_with(')')) {
        return value;
    }

    let mut depth = 0i32;
    for (i, ch) in value.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 && i != value.len() - 1 {
                    return value;
                }
            }
            _ => {}
        }
    }
    value[1..value.len() - 1].trim()
}

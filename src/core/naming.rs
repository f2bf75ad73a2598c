// 命名ポリシー
//
// 識別子のスネークケース変換、
// 自動生成インデックス名の規則を提供します。

use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::LazyLock;

/// 環境変数の接頭辞
pub const ENV_PREFIX: &str = "TABLEWRIGHT";

/// 自動生成する識別子の最大長（全方言で安全な長さ）
pub const MAX_IDENTIFIER_LENGTH: usize = 30;

static LOWER_UPPER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("valid regex"));
static ACRONYM_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z]+)([A-Z][a-z])").expect("valid regex"));

/// キャメルケース・パスカルケースをスネークケースに変換
///
/// `SysUser` → `sys_user`、`HTTPRequestLog` → `http_request_log`、
/// 既にスネークケースの名前はそのまま返します。
pub fn to_snake_case(name: &str) -> String {
    let step = ACRONYM_WORD.replace_all(name, "${1}_${2}");
    let step = LOWER_UPPER.replace_all(&step, "${1}_${2}");
    step.replace('-', "_").to_lowercase()
}

/// 型名の末尾セグメント（モジュールパスを除いた名前）
pub fn simple_type_name(type_name: &str) -> &str {
    type_name.rsplit("::").next().unwrap_or(type_name)
}

/// インデックス名を自動生成
///
/// `idx_<table>_<columns>`（ユニークの場合は `uk_`）の形式で、
/// 最大長を超える場合は SHA-256 の先頭8桁で短縮します。
pub fn auto_index_name(table: &str, columns: &[String], unique: bool) -> String {
    let prefix = if unique { "uk" } else { "idx" };
    let name = format!("{}_{}_{}", prefix, table, columns.join("_")).to_lowercase();
    shorten_identifier(&name)
}

/// 長すぎる識別子をハッシュ付きで短縮
pub fn shorten_identifier(name: &str) -> String {
    if name.len() <= MAX_IDENTIFIER_LENGTH {
        return name.to_string();
    }

    let digest = Sha256::digest(name.as_bytes());
    let hash: String = digest.iter().take(4).map(|b| format!("{:02x}", b)).collect();
    let keep = MAX_IDENTIFIER_LENGTH - hash.len() - 1;
    let mut head: String = name.chars().take(keep).collect();
    while head.ends_with('_') {
        head.pop();
    }
    format!("{}_{}", head, hash)
}

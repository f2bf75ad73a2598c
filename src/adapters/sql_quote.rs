// SQL識別子クォートユーティリティ
//
// 各データベース方言用の識別子・文字列リテラルのクォート関数を提供します。
// sql_generatorとdatabase_introspectorの両方から使用される共有モジュールです。

/// PostgreSQL用識別子クォート（ダブルクォート）
///
/// # Examples
/// ```
/// use tablewright::adapters::sql_quote::quote_identifier_postgres;
/// assert_eq!(quote_identifier_postgres("users"), r#""users""#);
/// assert_eq!(quote_identifier_postgres(r#"table"name"#), r#""table""name""#);
/// ```
pub fn quote_identifier_postgres(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// MySQL用識別子クォート（バッククォート）
///
/// # Examples
/// ```
/// use tablewright::adapters::sql_quote::quote_identifier_mysql;
/// assert_eq!(quote_identifier_mysql("users"), "`users`");
/// assert_eq!(quote_identifier_mysql("table`name"), "`table``name`");
/// ```
pub fn quote_identifier_mysql(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// SQL Server用識別子クォート（角括弧）
///
/// # Examples
/// ```
/// use tablewright::adapters::sql_quote::quote_identifier_sqlserver;
/// assert_eq!(quote_identifier_sqlserver("users"), "[users]");
/// assert_eq!(quote_identifier_sqlserver("odd]name"), "[odd]]name]");
/// ```
pub fn quote_identifier_sqlserver(name: &str) -> String {
    format!("[{}]", name.replace(']', "]]"))
}

/// Oracle用識別子クォート（ダブルクォート）
pub fn quote_identifier_oracle(name: &str) -> String {
    quote_identifier_postgres(name)
}

/// 文字列リテラルのクォート（シングルクォートを二重にエスケープ）
pub fn quote_string_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// スキーマ修飾付きの名前を組み立てる
pub fn qualify(schema: Option<&str>, name: &str, quote: fn(&str) -> String) -> String {
    match schema {
        Some(schema) if !schema.is_empty() => format!("{}.{}", quote(schema), quote(name)),
        _ => quote(name),
    }
}

/// カラム名リストをクォートしてカンマ区切りで結合
pub fn quote_columns(columns: &[String], quote: fn(&str) -> String) -> String {
    columns
        .iter()
        .map(|c| quote(c))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // 識別子クォート
    // =========================================================================

    #[test]
    fn test_quote_identifier_per_dialect() {
        assert_eq!(quote_identifier_mysql("sys_user"), "`sys_user`");
        assert_eq!(quote_identifier_postgres("sys_user"), "\"sys_user\"");
        assert_eq!(quote_identifier_sqlserver("sys_user"), "[sys_user]");
        assert_eq!(quote_identifier_oracle("sys_user"), "\"sys_user\"");
    }

    #[test]
    fn test_quote_string_literal_escapes() {
        assert_eq!(quote_string_literal("user's table"), "'user''s table'");
    }

    // =========================================================================
    // 修飾名・カラムリスト
    // =========================================================================

    #[test]
    fn test_qualify() {
        assert_eq!(
            qualify(Some("app"), "sys_user", quote_identifier_postgres),
            "\"app\".\"sys_user\""
        );
        assert_eq!(qualify(None, "sys_user", quote_identifier_mysql), "`sys_user`");
        assert_eq!(qualify(Some(""), "t", quote_identifier_sqlserver), "[t]");
    }

    #[test]
    fn test_quote_columns() {
        let columns = vec!["tenant_id".to_string(), "email".to_string()];
        assert_eq!(
            quote_columns(&columns, quote_identifier_mysql),
            "`tenant_id`, `email`"
        );
    }
}

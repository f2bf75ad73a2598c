// スキーマ接続アダプター
//
// カタログ問い合わせとDDL実行のための最小限の接続インターフェース。
// MySQL/PostgreSQLはSQLxのAnyPoolで実装し、SQL Server/Oracleは
// ホストアプリケーションが自前のドライバーで実装します。

use crate::core::error::DatabaseError;
use async_trait::async_trait;
use sqlx::{AnyPool, Row};

/// カタログ問い合わせ結果の1行
///
/// 全ての値を文字列として保持します（カタログクエリ側でテキストにキャストする）。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogRow {
    values: Vec<Option<String>>,
}

impl CatalogRow {
    /// 新しい行を作成
    pub fn new(values: Vec<Option<String>>) -> Self {
        Self { values }
    }

    /// 文字列スライスから行を作成（空文字列はNULL扱いしない）
    pub fn from_values(values: &[Option<&str>]) -> Self {
        Self {
            values: values.iter().map(|v| v.map(str::to_string)).collect(),
        }
    }

    /// 列数
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 列がないかどうか
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// テキスト値（NULLまたは範囲外はNone）
    pub fn text(&self, index: usize) -> Option<&str> {
        self.values.get(index).and_then(|v| v.as_deref())
    }

    /// テキスト値（NULLは空文字列）
    pub fn string(&self, index: usize) -> String {
        self.text(index).unwrap_or_default().trim().to_string()
    }

    /// 空白を除いた非空のテキスト値
    pub fn non_empty(&self, index: usize) -> Option<String> {
        self.text(index)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// 数値として解釈
    pub fn int(&self, index: usize) -> Option<i64> {
        self.text(index).and_then(|v| v.trim().parse::<i64>().ok())
    }

    /// 真偽値として解釈（YES/Y/TRUE/T/1）
    pub fn flag(&self, index: usize) -> bool {
        self.text(index).is_some_and(|v| {
            matches!(
                v.trim().to_ascii_uppercase().as_str(),
                "YES" | "Y" | "TRUE" | "T" | "1"
            )
        })
    }
}

/// スキーマ接続インターフェース
#[async_trait]
pub trait SchemaConnection: Send + Sync {
    /// 接続先データベースの製品名（"MySQL", "PostgreSQL" など）
    fn product_name(&self) -> String;

    /// カタログクエリを実行して全行を取得
    ///
    /// # Arguments
    /// * `sql` - 方言固有のプレースホルダーを含むSQL
    /// * `params` - バインドする文字列パラメータ
    async fn fetch_rows(&self, sql: &str, params: &[&str]) -> Result<Vec<CatalogRow>, DatabaseError>;

    /// DDL文を実行
    async fn execute(&self, sql: &str) -> Result<(), DatabaseError>;
}

/// SQLxのAnyPoolによるスキーマ接続
#[derive(Debug, Clone)]
pub struct SqlxSchemaConnection {
    pool: AnyPool,
    product: String,
}

impl SqlxSchemaConnection {
    /// 接続プールから作成し、製品名を取得
    pub async fn from_pool(pool: AnyPool) -> Result<Self, DatabaseError> {
        let conn = pool
            .acquire()
            .await
            .map_err(|e| DatabaseError::Connection {
                message: "Failed to acquire connection for product detection".to_string(),
                cause: e.to_string(),
            })?;
        let product = conn.backend_name().to_string();
        drop(conn);

        Ok(Self { pool, product })
    }

    /// 接続プールを取得
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }
}

#[async_trait]
impl SchemaConnection for SqlxSchemaConnection {
    fn product_name(&self) -> String {
        self.product.clone()
    }

    async fn fetch_rows(&self, sql: &str, params: &[&str]) -> Result<Vec<CatalogRow>, DatabaseError> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = query.bind(param.to_string());
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DatabaseError::Query {
                message: e.to_string(),
            })?;

        rows.iter()
            .map(|row| {
                (0..row.len())
                    .map(|i| row.try_get::<Option<String>, _>(i))
                    .collect::<Result<Vec<_>, _>>()
                    .map(CatalogRow::new)
                    .map_err(|e| DatabaseError::Query {
                        message: format!("Failed to decode catalog row: {}", e),
                    })
            })
            .collect()
    }

    async fn execute(&self, sql: &str) -> Result<(), DatabaseError> {
        sqlx::raw_sql(sql)
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| DatabaseError::Query {
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_row_accessors() {
        let row = CatalogRow::from_values(&[
            Some("username"),
            Some(" 50 "),
            Some("YES"),
            None,
            Some("  "),
        ]);

        assert_eq!(row.len(), 5);
        assert_eq!(row.text(0), Some("username"));
        assert_eq!(row.int(1), Some(50));
        assert!(row.flag(2));
        assert!(!row.flag(3));
        assert_eq!(row.string(3), "");
        assert_eq!(row.non_empty(4), None);
        assert_eq!(row.text(10), None);
    }

    #[test]
    fn test_catalog_row_flag_variants() {
        for value in ["t", "true", "1", "Y", "yes"] {
            assert!(CatalogRow::from_values(&[Some(value)]).flag(0), "{}", value);
        }
        for value in ["f", "false", "0", "NO"] {
            assert!(!CatalogRow::from_values(&[Some(value)]).flag(0), "{}", value);
        }
    }
}

// リトライポリシー
//
// DDL文の実行失敗を指数バックオフで再試行します。

use crate::core::config::TableMaintenanceConfig;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// バックオフ間隔の上限
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// リトライポリシー
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 初回実行後の最大リトライ回数
    pub max_retries: u32,
    /// 1回目のリトライまでの待機時間
    pub base_delay: Duration,
    /// 待機時間の上限
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(500))
    }
}

impl From<&TableMaintenanceConfig> for RetryPolicy {
    fn from(config: &TableMaintenanceConfig) -> Self {
        Self::new(
            config.max_retry_count,
            Duration::from_millis(config.retry_backoff_millis),
        )
    }
}

/// リトライを使い切った操作の最後のエラー
#[derive(Debug, Clone, PartialEq)]
pub struct RetryExhausted<E> {
    /// 最後のエラー
    pub error: E,
    /// 試行回数（初回を含む）
    pub attempts: u32,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay: MAX_RETRY_DELAY,
        }
    }

    /// n回目（1始まり）のリトライ前の待機時間
    ///
    /// `base_delay * 2^(n-1)` を `max_delay` で打ち切ります。
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }

    /// 操作を実行し、失敗時はリトライする
    ///
    /// # Arguments
    ///
    /// * `operation` - 実行する操作
    /// * `on_retry` - リトライ前に (リトライ回数, 直前のエラー, 待機時間) で呼ばれる
    pub async fn execute<T, E, F, Fut, R>(
        &self,
        mut operation: F,
        mut on_retry: R,
    ) -> Result<T, RetryExhausted<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        R: FnMut(u32, &E, Duration),
    {
        let mut retry = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) if retry >= self.max_retries => {
                    return Err(RetryExhausted {
                        error,
                        attempts: retry + 1,
                    })
                }
                Err(error) => {
                    retry += 1;
                    let delay = self.delay_for(retry);
                    on_retry(retry, &error, delay);
                    sleep(delay).await;
                }
            }
        }
    }
}

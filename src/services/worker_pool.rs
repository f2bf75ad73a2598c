// ワーカープール
//
// コアサイズ・最大サイズ・キュー容量を持つ有界ワーカープール。
// 投入順に 1) コア未満ならワーカー起動 2) キューに投入 3) 最大未満ならワーカー追加
// 4) いずれも不可なら呼び出し元で実行（caller-runs）します。

use crate::core::config::TableMaintenanceConfig;
use crate::core::error::MaintenanceError;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, Instrument};

type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// ワーカープール設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerPoolConfig {
    pub core_size: usize,
    pub max_size: usize,
    pub queue_capacity: usize,
    /// ワーカー名の接頭辞（`<prefix><n>`）
    pub name_prefix: String,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            core_size: 2,
            max_size: 4,
            queue_capacity: 100,
            name_prefix: "table-maintenance-".to_string(),
        }
    }
}

impl From<&TableMaintenanceConfig> for WorkerPoolConfig {
    fn from(config: &TableMaintenanceConfig) -> Self {
        Self {
            core_size: config.async_core_pool_size,
            max_size: config.async_max_pool_size,
            queue_capacity: config.async_queue_capacity,
            name_prefix: config.async_thread_name_prefix.clone(),
        }
    }
}

/// 実行統計
#[derive(Debug, Default)]
struct PoolCounters {
    submitted: AtomicU64,
    queued: AtomicU64,
    caller_runs: AtomicU64,
    completed: AtomicU64,
}

/// 統計スナップショット
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerPoolStats {
    pub submitted: u64,
    pub queued: u64,
    pub caller_runs: u64,
    pub completed: u64,
    pub workers: usize,
}

/// 投入したタスクの結果ハンドル
#[derive(Debug)]
pub struct TaskHandle<T> {
    receiver: oneshot::Receiver<T>,
}

impl<T> TaskHandle<T> {
    /// タスクの完了を待つ
    ///
    /// タスクが結果を返さずに終了した場合（パニックなど）は `PoolShutdown` を返します。
    pub async fn join(self) -> Result<T, MaintenanceError> {
        self.receiver.await.map_err(|_| MaintenanceError::PoolShutdown)
    }
}

/// ワーカープール
pub struct WorkerPool {
    config: WorkerPoolConfig,
    sender: StdMutex<Option<mpsc::Sender<Job>>>,
    receiver: Arc<Mutex<mpsc::Receiver<Job>>>,
    workers: StdMutex<Vec<JoinHandle<()>>>,
    counters: Arc<PoolCounters>,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish()
    }
}

/// ロックの毒化を無視して取得
fn lock<T>(mutex: &StdMutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl WorkerPool {
    /// 新しいワーカープールを作成（ワーカーは投入時に起動）
    pub fn new(config: WorkerPoolConfig) -> Self {
        let config = WorkerPoolConfig {
            core_size: config.core_size.max(1),
            max_size: config.max_size.max(config.core_size.max(1)),
            queue_capacity: config.queue_capacity.max(1),
            name_prefix: config.name_prefix,
        };
        let (sender, receiver) = mpsc::channel(config.queue_capacity);

        Self {
            config,
            sender: StdMutex::new(Some(sender)),
            receiver: Arc::new(Mutex::new(receiver)),
            workers: StdMutex::new(Vec::new()),
            counters: Arc::new(PoolCounters::default()),
        }
    }

    pub fn config(&self) -> &WorkerPoolConfig {
        &self.config
    }

    /// 起動済みワーカー数
    pub fn worker_count(&self) -> usize {
        lock(&self.workers).len()
    }

    pub fn stats(&self) -> WorkerPoolStats {
        WorkerPoolStats {
            submitted: self.counters.submitted.load(Ordering::Relaxed),
            queued: self.counters.queued.load(Ordering::Relaxed),
            caller_runs: self.counters.caller_runs.load(Ordering::Relaxed),
            completed: self.counters.completed.load(Ordering::Relaxed),
            workers: self.worker_count(),
        }
    }

    /// タスクを投入
    ///
    /// キューが満杯で最大ワーカー数に達している場合は、この呼び出しの中でタスクを実行します。
    pub async fn submit<F, T>(&self, task: F) -> Result<TaskHandle<T>, MaintenanceError>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let sender = lock(&self.sender)
            .clone()
            .ok_or(MaintenanceError::PoolShutdown)?;

        let (result_sender, receiver) = oneshot::channel();
        let counters = self.counters.clone();
        let job: Job = Box::pin(async move {
            let value = task.await;
            let _ = result_sender.send(value);
            counters.completed.fetch_add(1, Ordering::Relaxed);
        });
        self.counters.submitted.fetch_add(1, Ordering::Relaxed);

        let job = match self.spawn_worker_within(self.config.core_size, job) {
            Ok(()) => return Ok(TaskHandle { receiver }),
            Err(job) => job,
        };

        match sender.try_send(job) {
            Ok(()) => {
                self.counters.queued.fetch_add(1, Ordering::Relaxed);
            }
            Err(TrySendError::Full(job)) => {
                if let Err(job) = self.spawn_worker_within(self.config.max_size, job) {
                    debug!("Worker pool saturated, running task on the caller");
                    self.counters.caller_runs.fetch_add(1, Ordering::Relaxed);
                    job.await;
                }
            }
            Err(TrySendError::Closed(_)) => return Err(MaintenanceError::PoolShutdown),
        }
        Ok(TaskHandle { receiver })
    }

    /// ワーカー数が `limit` 未満なら最初のタスクを持つワーカーを起動
    ///
    /// 上限に達している場合はタスクをそのまま返します。
    /// 判定と起動は同じロックの中で行います。
    fn spawn_worker_within(&self, limit: usize, first: Job) -> Result<(), Job> {
        let mut workers = lock(&self.workers);
        if workers.len() >= limit {
            return Err(first);
        }
        let name = format!("{}{}", self.config.name_prefix, workers.len() + 1);
        let receiver = self.receiver.clone();
        let span = info_span!("worker", name = %name);

        debug!(worker = %name, "Starting worker");
        let handle = tokio::spawn(
            async move {
                first.await;
                loop {
                    let next = receiver.lock().await.recv().await;
                    match next {
                        Some(job) => job.await,
                        None => break,
                    }
                }
                debug!("Worker stopped");
            }
            .instrument(span),
        );
        workers.push(handle);
        Ok(())
    }

    /// キューを閉じ、投入済みのタスクが終わるまで待つ
    pub async fn shutdown(&self) {
        drop(lock(&self.sender).take());
        let workers: Vec<JoinHandle<()>> = lock(&self.workers).drain(..).collect();
        let count = workers.len();
        for worker in workers {
            let _ = worker.await;
        }
        info!(workers = count, "Worker pool shut down");
    }
}

//! Worker Pool Module
//!
//! Fixed set of worker lanes pulling units of work from one shared FIFO queue.
//! Each unit runs on tokio's blocking thread pool, so a closure that blocks never
//! stalls the runtime and a panic comes back to the lane as a `JoinError`.

use std::any::Any;
use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex as SyncMutex;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, error, info, warn};

use crate::error::{CoreError, Result};
use crate::pool::{PoolStats, PoolStatsSnapshot};

/// A queued unit of work. `Err` carries the failure reason.
type Job = Box<dyn FnOnce() -> std::result::Result<(), String> + Send + 'static>;

type JobReceiver = Arc<Mutex<mpsc::UnboundedReceiver<Job>>>;

// == Worker Pool ==
/// Executes submitted closures off the caller's task, at most once each.
///
/// The queue is unbounded, so `submit` never blocks. After `shutdown`, `submit`
/// returns `CoreError::PoolShutDown`; lanes finish the unit they are running and
/// exit, and work still queued is dropped without running.
///
/// Must be created inside a tokio runtime.
pub struct WorkerPool {
    sender: mpsc::UnboundedSender<Job>,
    receiver: JobReceiver,
    shutdown_tx: watch::Sender<bool>,
    accepting: AtomicBool,
    lanes: SyncMutex<Vec<JoinHandle<()>>>,
    stats: Arc<PoolStats>,
    size: usize,
}

impl WorkerPool {
    // == Constructor ==
    /// Starts `pool_size` worker lanes on the current tokio runtime.
    pub fn new(pool_size: usize) -> Result<Self> {
        if pool_size == 0 {
            return Err(CoreError::InvalidConfig(
                "worker pool size must be at least 1".to_string(),
            ));
        }

        let runtime = Handle::try_current().map_err(|e| {
            CoreError::Internal(format!("worker pool needs a tokio runtime: {}", e))
        })?;

        let (sender, receiver) = mpsc::unbounded_channel();
        let receiver: JobReceiver = Arc::new(Mutex::new(receiver));
        let (shutdown_tx, _) = watch::channel(false);
        let stats = Arc::new(PoolStats::new());

        let lanes = (0..pool_size)
            .map(|lane| {
                runtime.spawn(run_lane(
                    lane,
                    Arc::clone(&receiver),
                    shutdown_tx.subscribe(),
                    Arc::clone(&stats),
                ))
            })
            .collect();

        info!(pool_size, "Worker pool started");

        Ok(Self {
            sender,
            receiver,
            shutdown_tx,
            accepting: AtomicBool::new(true),
            lanes: SyncMutex::new(lanes),
            stats,
            size: pool_size,
        })
    }

    // == Submit ==
    /// Queues a closure for execution. A panic inside it is logged and counted.
    pub fn submit<F>(&self, work: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.enqueue(Box::new(move || {
            work();
            Ok(())
        }))
    }

    /// Queues a fallible closure. An `Err` is logged and counted like a panic.
    pub fn submit_fallible<F, E>(&self, work: F) -> Result<()>
    where
        F: FnOnce() -> std::result::Result<(), E> + Send + 'static,
        E: Display,
    {
        self.enqueue(Box::new(move || work().map_err(|e| e.to_string())))
    }

    /// Counts the unit as submitted before it is queued, so a lane can never report
    /// it finished ahead of its submission.
    fn enqueue(&self, job: Job) -> Result<()> {
        if !self.accepting.load(Ordering::SeqCst) {
            self.stats.record_rejected();
            return Err(CoreError::PoolShutDown);
        }

        self.stats.record_submitted();
        if self.sender.send(job).is_err() {
            self.stats.retract_submitted();
            return Err(CoreError::PoolShutDown);
        }
        Ok(())
    }

    // == Shutdown ==
    /// Stops accepting work and tells every lane to exit after its current unit.
    ///
    /// Idempotent and non-blocking. Use `await_termination` to wait for the lanes.
    pub fn shutdown(&self) {
        if self.accepting.swap(false, Ordering::SeqCst) {
            info!(pool_size = self.size, "Worker pool shutting down");
            self.shutdown_tx.send_replace(true);
        }
    }

    /// Waits for every lane to exit, then drops whatever is still queued.
    ///
    /// Only returns once `shutdown` has been called.
    pub async fn await_termination(&self) {
        let lanes = std::mem::take(&mut *self.lanes.lock());
        for handle in lanes {
            if let Err(e) = handle.await {
                warn!(error = %e, "Worker lane ended abnormally");
            }
        }

        let mut receiver = self.receiver.lock().await;
        receiver.close();
        let mut dropped = 0u64;
        while receiver.try_recv().is_ok() {
            dropped += 1;
        }

        if dropped > 0 {
            self.stats.record_dropped(dropped);
            warn!(dropped, "Dropped queued work on shutdown");
        }
        info!("Worker pool terminated");
    }

    // == Accessors ==
    pub fn pool_size(&self) -> usize {
        self.size
    }

    pub fn is_shut_down(&self) -> bool {
        !self.accepting.load(Ordering::SeqCst)
    }

    /// True when every accepted unit has finished.
    pub fn is_idle(&self) -> bool {
        self.stats.is_idle()
    }

    pub fn stats(&self) -> PoolStatsSnapshot {
        self.stats.snapshot(self.size)
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("size", &self.size)
            .field("shut_down", &self.is_shut_down())
            .field("stats", &self.stats())
            .finish()
    }
}

// == Worker Lane ==
/// Pulls and runs units until shutdown is signalled or the queue closes.
///
/// Shutdown wins over a ready unit, so queued work is not started once it is seen.
async fn run_lane(
    lane: usize,
    receiver: JobReceiver,
    mut shutdown: watch::Receiver<bool>,
    stats: Arc<PoolStats>,
) {
    debug!(lane, "Worker lane started");

    loop {
        if *shutdown.borrow() {
            break;
        }

        let next = tokio::select! {
            biased;
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
                continue;
            }
            job = next_job(&receiver) => job,
        };

        let Some(job) = next else {
            break;
        };

        match tokio::task::spawn_blocking(job).await {
            Ok(Ok(())) => stats.record_completed(),
            Ok(Err(reason)) => {
                stats.record_failed();
                error!(lane, %reason, "Unit of work failed");
            }
            Err(e) => {
                stats.record_failed();
                error!(lane, reason = %join_failure(e), "Unit of work panicked");
            }
        }
    }

    debug!(lane, "Worker lane stopped");
}

async fn next_job(receiver: &Mutex<mpsc::UnboundedReceiver<Job>>) -> Option<Job> {
    receiver.lock().await.recv().await
}

fn join_failure(err: JoinError) -> String {
    if err.is_panic() {
        panic_message(err.into_panic())
    } else {
        err.to_string()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    async fn wait_until_idle(pool: &WorkerPool) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !pool.is_idle() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("pool did not become idle");
    }

    #[test]
    fn test_new_requires_runtime() {
        let result = WorkerPool::new(1);
        assert!(matches!(result, Err(CoreError::Internal(_))));
    }

    #[tokio::test]
    async fn test_zero_pool_size_rejected() {
        let result = WorkerPool::new(0);
        assert!(matches!(result, Err(CoreError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_submit_runs_work() {
        let pool = WorkerPool::new(2).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..10 {
            let counter = Arc::clone(&counter);
            pool.submit(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        }

        wait_until_idle(&pool).await;
        assert_eq!(counter.load(Ordering::SeqCst), 10);

        let stats = pool.stats();
        assert_eq!(stats.submitted, 10);
        assert_eq!(stats.completed, 10);
        assert_eq!(stats.pool_size, 2);
    }

    #[tokio::test]
    async fn test_panic_does_not_stop_lane() {
        let pool = WorkerPool::new(1).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        pool.submit(|| panic!("boom")).unwrap();
        let after = Arc::clone(&counter);
        pool.submit(move || {
            after.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        wait_until_idle(&pool).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(pool.stats().failed, 1);
        assert_eq!(pool.stats().completed, 1);
    }

    #[tokio::test]
    async fn test_fallible_error_is_counted() {
        let pool = WorkerPool::new(1).unwrap();

        pool.submit_fallible(|| Err::<(), _>("write failed")).unwrap();
        pool.submit_fallible(|| Ok::<(), String>(())).unwrap();

        wait_until_idle(&pool).await;
        let stats = pool.stats();
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.completed, 1);
    }

    #[tokio::test]
    async fn test_submit_after_shutdown_rejected() {
        let pool = WorkerPool::new(1).unwrap();

        pool.shutdown();
        pool.shutdown();

        assert!(pool.is_shut_down());
        assert!(matches!(pool.submit(|| {}), Err(CoreError::PoolShutDown)));
        assert_eq!(pool.stats().rejected, 1);

        pool.await_termination().await;
    }

    #[test]
    fn test_panic_message() {
        assert_eq!(panic_message(Box::new("static")), "static");
        assert_eq!(panic_message(Box::new(String::from("owned"))), "owned");
        assert_eq!(panic_message(Box::new(7u8)), "unknown panic");
    }
}

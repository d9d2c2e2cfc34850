//! Integration Tests for the Worker Pool
//!
//! Runs real units of work on a multi-threaded runtime.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use task_core::{CoreError, WorkerPool};

// == Helper Functions ==

async fn wait_until_idle(pool: &WorkerPool) {
    tokio::time::timeout(Duration::from_secs(10), async {
        while !pool.is_idle() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("pool did not become idle");
}

async fn wait_for(flag: &AtomicBool) {
    tokio::time::timeout(Duration::from_secs(10), async {
        while !flag.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("flag was never set");
}

// == Execution Tests ==

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_panics_do_not_stop_other_units() {
    let pool = WorkerPool::new(3).unwrap();
    let counter = Arc::new(AtomicUsize::new(0));

    for i in 0..30 {
        let counter = Arc::clone(&counter);
        pool.submit(move || {
            if i % 3 == 0 {
                panic!("unit {} failed", i);
            }
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    }

    wait_until_idle(&pool).await;

    assert_eq!(counter.load(Ordering::SeqCst), 20);
    let stats = pool.stats();
    assert_eq!(stats.submitted, 30);
    assert_eq!(stats.completed, 20);
    assert_eq!(stats.failed, 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_every_unit_runs_exactly_once() {
    let pool = WorkerPool::new(2).unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let started = Instant::now();

    for i in 0..5 {
        let seen = Arc::clone(&seen);
        pool.submit(move || {
            std::thread::sleep(Duration::from_millis(50));
            seen.lock().unwrap().push(i);
        })
        .unwrap();
    }

    wait_until_idle(&pool).await;

    // Five 50ms units on two lanes need at least three rounds
    assert!(started.elapsed() >= Duration::from_millis(150));

    let mut seen = seen.lock().unwrap().clone();
    seen.sort_unstable();
    assert_eq!(seen, vec![0, 1, 2, 3, 4]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_fallible_units_are_counted() {
    let pool = WorkerPool::new(2).unwrap();

    pool.submit_fallible(|| Err::<(), _>("no database")).unwrap();
    pool.submit_fallible(|| Ok::<(), String>(())).unwrap();

    wait_until_idle(&pool).await;

    let stats = pool.stats();
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.failed, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_finished_never_exceeds_submitted() {
    let pool = Arc::new(WorkerPool::new(4).unwrap());
    let done = Arc::new(AtomicBool::new(false));

    let submitter = {
        let pool = Arc::clone(&pool);
        let done = Arc::clone(&done);
        std::thread::spawn(move || {
            for _ in 0..2000 {
                pool.submit(|| {}).unwrap();
            }
            done.store(true, Ordering::SeqCst);
        })
    };

    let observer = {
        let pool = Arc::clone(&pool);
        let done = Arc::clone(&done);
        std::thread::spawn(move || {
            while !done.load(Ordering::SeqCst) || !pool.is_idle() {
                let stats = pool.stats();
                assert!(
                    stats.completed + stats.failed + stats.dropped <= stats.submitted,
                    "finished units outran submissions: {:?}",
                    stats
                );
            }
        })
    };

    submitter.join().unwrap();
    observer.join().unwrap();

    wait_until_idle(&pool).await;
    let stats = pool.stats();
    assert_eq!(stats.submitted, 2000);
    assert_eq!(stats.completed, 2000);
}

// == Shutdown Tests ==

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_submit_after_shutdown_is_rejected() {
    let pool = WorkerPool::new(2).unwrap();
    pool.shutdown();

    let flag = Arc::new(AtomicBool::new(false));
    let observed = Arc::clone(&flag);
    let result = pool.submit(move || observed.store(true, Ordering::SeqCst));

    assert!(matches!(result, Err(CoreError::PoolShutDown)));

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!flag.load(Ordering::SeqCst));
    assert_eq!(pool.stats().rejected, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_in_flight_unit_finishes_after_shutdown() {
    let pool = WorkerPool::new(1).unwrap();
    let started = Arc::new(AtomicBool::new(false));
    let finished = Arc::new(AtomicBool::new(false));

    {
        let started = Arc::clone(&started);
        let finished = Arc::clone(&finished);
        pool.submit(move || {
            started.store(true, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(100));
            finished.store(true, Ordering::SeqCst);
        })
        .unwrap();
    }

    wait_for(&started).await;
    pool.shutdown();
    pool.await_termination().await;

    assert!(finished.load(Ordering::SeqCst));
    assert_eq!(pool.stats().completed, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_backlog_is_dropped_on_shutdown() {
    let pool = WorkerPool::new(1).unwrap();
    let started = Arc::new(AtomicBool::new(false));
    let ran = Arc::new(AtomicUsize::new(0));

    {
        let started = Arc::clone(&started);
        pool.submit(move || {
            started.store(true, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(150));
        })
        .unwrap();
    }
    wait_for(&started).await;

    for _ in 0..3 {
        let ran = Arc::clone(&ran);
        pool.submit(move || {
            ran.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    }

    pool.shutdown();
    pool.await_termination().await;

    assert_eq!(ran.load(Ordering::SeqCst), 0);
    let stats = pool.stats();
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.dropped, 3);
    assert!(pool.is_idle());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_shutdown_is_idempotent() {
    let pool = WorkerPool::new(2).unwrap();

    pool.shutdown();
    pool.shutdown();
    pool.await_termination().await;

    assert!(pool.is_shut_down());
    assert_eq!(pool.stats().dropped, 0);
}

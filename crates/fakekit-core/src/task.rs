//! Scheduler flush helpers.
//!
//! Equivalent of waiting for pending UI updates to settle: yield to the
//! runtime enough times for tasks woken by a fake to run.

/// Yields performed by [`flush_tasks`].
pub const DEFAULT_FLUSH_ITERATIONS: usize = 8;

/// Yield to the runtime [`DEFAULT_FLUSH_ITERATIONS`] times.
pub async fn flush_tasks() {
    flush_tasks_n(DEFAULT_FLUSH_ITERATIONS).await;
}

/// Yield to the runtime `iterations` times.
pub async fn flush_tasks_n(iterations: usize) {
    for _ in 0..iterations {
        tokio::task::yield_now().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test(flavor = "current_thread")]
    async fn test_flush_runs_spawned_task() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        let _handle = tokio::spawn(async move {
            flag.store(true, Ordering::SeqCst);
        });
        flush_tasks().await;
        assert!(ran.load(Ordering::SeqCst));
    }
}

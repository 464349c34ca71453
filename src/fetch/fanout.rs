use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::error::Result;

/// Concurrency ceiling for per-parent fetches.
pub const MAX_CONCURRENT_TASK: usize = 10;

/// Runs `task` once per parent with at most `limit` running at a time.
///
/// Slot `i` of the returned list always belongs to `parents[i]`, whatever the
/// completion order. A failed (or panicked) task leaves `None` in its slot.
/// Launched tasks are detached: dropping the returned future does not stop
/// them, they always run to completion.
pub async fn fan_out<P, T, F, Fut>(parents: Vec<P>, limit: usize, task: F) -> Vec<Option<T>>
where
    P: Send + 'static,
    T: Send + 'static,
    F: Fn(P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    let permits = Arc::new(Semaphore::new(limit.max(1)));
    let task = Arc::new(task);

    let handles: Vec<JoinHandle<Option<T>>> = parents
        .into_iter()
        .enumerate()
        .map(|(slot, parent)| {
            let permits = Arc::clone(&permits);
            let task = Arc::clone(&task);
            tokio::spawn(async move {
                // The semaphore is never closed, so acquiring only waits.
                let _permit = permits.acquire_owned().await.ok()?;
                match task(parent).await {
                    Ok(value) => Some(value),
                    Err(e) => {
                        warn!(slot, error = %e, "Fan-out task failed.");
                        None
                    }
                }
            })
        })
        .collect();

    join_all(handles)
        .await
        .into_iter()
        .enumerate()
        .map(|(slot, joined)| {
            joined.unwrap_or_else(|e| {
                warn!(slot, error = %e, "Fan-out task did not complete.");
                None
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackupError;
    use rand::Rng;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_results_follow_input_order() {
        for count in [3usize, MAX_CONCURRENT_TASK, 37] {
            let delays: Vec<u64> = {
                let mut rng = rand::rng();
                (0..count).map(|_| rng.random_range(0..20)).collect()
            };
            let parents: Vec<(usize, u64)> = delays.into_iter().enumerate().collect();

            let results = fan_out(parents, MAX_CONCURRENT_TASK, |(i, delay)| async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                Ok(i * 10)
            })
            .await;

            let expected: Vec<Option<usize>> = (0..count).map(|i| Some(i * 10)).collect();
            assert_eq!(results, expected);
        }
    }

    #[tokio::test]
    async fn test_never_exceeds_limit() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (running_c, peak_c) = (Arc::clone(&running), Arc::clone(&peak));

        let results = fan_out((0..40).collect::<Vec<_>>(), 4, move |i: i32| {
            let running = Arc::clone(&running_c);
            let peak = Arc::clone(&peak_c);
            async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(2)).await;
                running.fetch_sub(1, Ordering::SeqCst);
                Ok(i)
            }
        })
        .await;

        assert_eq!(results.len(), 40);
        assert!(peak.load(Ordering::SeqCst) <= 4);
    }

    #[tokio::test]
    async fn test_failed_task_leaves_empty_slot() {
        let results = fan_out(vec![1, 2, 3], 2, |i: i32| async move {
            if i == 2 {
                Err(BackupError::status("Get Monitor Script", 500))
            } else {
                Ok(i)
            }
        })
        .await;
        assert_eq!(results, vec![Some(1), None, Some(3)]);
    }
}

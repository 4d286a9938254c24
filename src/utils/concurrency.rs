//! Bounded fan-out over futures.

use futures_util::future::join_all;
use std::future::Future;
use tokio::sync::Semaphore;

/// Await every future with at most `limit` running at once.
///
/// Output order matches input order regardless of completion order.
pub async fn join_bounded<I, F>(limit: usize, tasks: I) -> Vec<F::Output>
where
    I: IntoIterator<Item = F>,
    F: Future,
{
    let semaphore = Semaphore::new(limit.max(1));
    let semaphore = &semaphore;
    join_all(tasks.into_iter().map(|task| async move {
        // A closed semaphore only happens on drop; run unbounded rather than stall
        let _permit = semaphore.acquire().await.ok();
        task.await
    }))
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn preserves_input_order() {
        let delays = [30u64, 5, 15, 0];
        let out = join_bounded(
            4,
            delays.iter().enumerate().map(|(i, d)| async move {
                tokio::time::sleep(Duration::from_millis(*d)).await;
                i
            }),
        )
        .await;
        assert_eq!(out, vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn never_exceeds_the_limit() {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let tasks = (0..8).map(|_| {
            let active = Arc::clone(&active);
            let peak = Arc::clone(&peak);
            async move {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                active.fetch_sub(1, Ordering::SeqCst);
            }
        });
        join_bounded(2, tasks).await;
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn zero_limit_still_makes_progress() {
        let out = join_bounded(0, (0..3).map(|i| async move { i * 2 })).await;
        assert_eq!(out, vec![0, 2, 4]);
    }
}

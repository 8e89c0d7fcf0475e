//! Usage: Creator fan-out in small concurrent batches, batches run one after another.

use crate::shared::error::AppResult;
use crate::upstream::models::Creator;
use futures::future::join_all;
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub(crate) struct FanOut {
    batch_size: usize,
    batch_delay: Duration,
}

impl FanOut {
    pub(crate) fn new(batch_size: usize, batch_delay: Duration) -> Self {
        Self {
            batch_size: batch_size.max(1),
            batch_delay,
        }
    }

    /// Runs `fetch` for every creator, `batch_size` at a time, pausing between batches.
    /// Results come back in creator order.
    pub(crate) async fn run<'c, T, F, Fut>(
        &self,
        creators: &'c [Creator],
        fetch: F,
    ) -> Vec<(&'c Creator, AppResult<T>)>
    where
        F: Fn(&'c Creator) -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let mut results = Vec::with_capacity(creators.len());
        let batch_count = creators.len().div_ceil(self.batch_size);
        for (index, batch) in creators.chunks(self.batch_size).enumerate() {
            let outcomes = join_all(batch.iter().map(&fetch)).await;
            results.extend(batch.iter().zip(outcomes));
            if index + 1 < batch_count && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }
        }
        results
    }

    /// Like `run`, dropping creators whose fetch failed (each failure is logged).
    pub(crate) async fn run_best_effort<'c, T, F, Fut>(
        &self,
        label: &str,
        creators: &'c [Creator],
        fetch: F,
    ) -> Vec<(&'c Creator, T)>
    where
        F: Fn(&'c Creator) -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        self.run(creators, fetch)
            .await
            .into_iter()
            .filter_map(|(creator, outcome)| match outcome {
                Ok(value) => Some((creator, value)),
                Err(err) => {
                    tracing::warn!(
                        creator_uuid = %creator.uuid,
                        task = label,
                        code = %err.code(),
                        "creator skipped: {}",
                        err.message()
                    );
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn creators(n: usize) -> Vec<Creator> {
        (0..n)
            .map(|i| {
                serde_json::from_value(serde_json::json!({"uuid": format!("c{i}")}))
                    .expect("creator")
            })
            .collect()
    }

    #[tokio::test]
    async fn keeps_creator_order_across_batches() {
        let list = creators(7);
        let fanout = FanOut::new(3, Duration::ZERO);
        let results = fanout
            .run(&list, |c| async move { Ok::<_, crate::shared::error::AppError>(c.uuid.clone()) })
            .await;
        let ids: Vec<String> = results
            .into_iter()
            .map(|(_, r)| r.expect("ok"))
            .collect();
        assert_eq!(ids, vec!["c0", "c1", "c2", "c3", "c4", "c5", "c6"]);
    }

    #[tokio::test]
    async fn batch_concurrency_never_exceeds_batch_size() {
        let list = creators(5);
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let fanout = FanOut::new(2, Duration::ZERO);
        fanout
            .run(&list, |_| {
                let in_flight = Arc::clone(&in_flight);
                let peak = Arc::clone(&peak);
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Ok::<_, crate::shared::error::AppError>(())
                }
            })
            .await;
        assert_eq!(peak.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failures_are_skipped_in_best_effort_mode() {
        let list = creators(3);
        let fanout = FanOut::new(3, Duration::ZERO);
        let kept = fanout
            .run_best_effort("test", &list, |c| async move {
                if c.uuid == "c1" {
                    Err("UPSTREAM_UNAVAILABLE: boom".into())
                } else {
                    Ok(c.uuid.len())
                }
            })
            .await;
        let ids: Vec<&str> = kept.iter().map(|(c, _)| c.uuid.as_str()).collect();
        assert_eq!(ids, vec!["c0", "c2"]);
    }
}

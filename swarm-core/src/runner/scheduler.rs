use std::collections::HashMap;
use std::future::Future;
use std::ops::Range;
use std::time::{Duration, Instant};

use tokio::task::JoinSet;

use crate::config::SkillLevel;
use crate::user::JourneyResult;

use super::progress::{BatchProgress, ProgressFn, ProgressUpdate};

/// Splits `[0, population)` into contiguous batches of at most `limit` users.
pub fn partition(population: u64, limit: usize) -> Vec<Range<u64>> {
    let limit = limit.max(1) as u64;
    let mut out = Vec::with_capacity(population.div_ceil(limit) as usize);
    let mut start = 0;
    while start < population {
        let end = (start + limit).min(population);
        out.push(start..end);
        start = end;
    }
    out
}

/// Runs a cohort batch by batch: users within a batch run in parallel, batches run in sequence
/// with a pause in between. Peak concurrency never exceeds `concurrency_limit`.
#[derive(Debug, Clone, Copy)]
pub struct BatchScheduler {
    pub concurrency_limit: usize,
    pub inter_batch_delay: Duration,
}

impl BatchScheduler {
    pub fn new(concurrency_limit: usize, inter_batch_delay: Duration) -> Self {
        Self {
            concurrency_limit,
            inter_batch_delay,
        }
    }

    /// Launches `launch(index)` for every user index and collects one result per user, in index
    /// order. A journey task that dies is reported as a failed user; its siblings are unaffected.
    pub async fn run<F, Fut>(
        &self,
        cohort: SkillLevel,
        population: u64,
        mut launch: F,
        progress: Option<&ProgressFn>,
    ) -> Vec<JourneyResult>
    where
        F: FnMut(u64) -> Fut,
        Fut: Future<Output = JourneyResult> + Send + 'static,
    {
        let batches = partition(population, self.concurrency_limit);
        let started = Instant::now();

        if let Some(progress) = progress {
            progress(ProgressUpdate::CohortStarted {
                cohort,
                users: population,
                batches: batches.len(),
            });
        }

        let mut results = Vec::with_capacity(population as usize);
        let mut failed = 0u64;

        for (i, range) in batches.iter().enumerate() {
            let mut set = JoinSet::new();
            let mut index_of = HashMap::with_capacity(range.clone().count());
            for index in range.clone() {
                let handle = set.spawn(launch(index));
                index_of.insert(handle.id(), index);
            }

            // Drained in completion order so failures are logged as they happen.
            let mut batch = Vec::with_capacity(index_of.len());
            while let Some(joined) = set.join_next_with_id().await {
                let (index, result) = match joined {
                    Ok((id, result)) => (index_of.get(&id).copied().unwrap_or(u64::MAX), result),
                    Err(err) => {
                        let index = index_of.get(&err.id()).copied().unwrap_or(u64::MAX);
                        (index, JourneyResult::aborted(cohort, index, err.to_string()))
                    }
                };

                if !result.succeeded() {
                    failed += 1;
                    tracing::warn!(
                        user = %result.user.id,
                        reason = result.user.failure.as_deref().unwrap_or("unknown"),
                        "virtual user failed"
                    );
                }
                batch.push((index, result));
            }
            batch.sort_by_key(|(index, _)| *index);
            results.extend(batch.into_iter().map(|(_, result)| result));

            tracing::debug!(
                %cohort,
                batch = i + 1,
                batches = batches.len(),
                users_done = results.len(),
                "batch completed"
            );
            if let Some(progress) = progress {
                progress(ProgressUpdate::BatchCompleted(BatchProgress {
                    cohort,
                    batch: i + 1,
                    batches: batches.len(),
                    users_done: results.len() as u64,
                    users_total: population,
                    users_failed: failed,
                    elapsed: started.elapsed(),
                }));
            }

            if i + 1 < batches.len() && !self.inter_batch_delay.is_zero() {
                tokio::time::sleep(self.inter_batch_delay).await;
            }
        }

        results
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use std::sync::{Arc, Mutex};
    use std::sync::atomic::{AtomicU64, Ordering};

    use crate::user::VirtualUser;

    fn ok_result(cohort: SkillLevel, index: u64) -> JourneyResult {
        JourneyResult::completed(&VirtualUser::new(cohort, index))
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn partition_is_contiguous_and_bounded() {
        assert_eq!(partition(10, 4), vec![0..4, 4..8, 8..10]);
        assert_eq!(partition(8, 4), vec![0..4, 4..8]);
        assert_eq!(partition(3, 50), vec![0..3]);
        assert!(partition(0, 5).is_empty());
        assert_eq!(partition(2, 0), vec![0..1, 1..2]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn never_exceeds_the_concurrency_limit() {
        let in_flight = Arc::new(AtomicU64::new(0));
        let peak = Arc::new(AtomicU64::new(0));
        let scheduler = BatchScheduler::new(5, Duration::ZERO);

        let results = scheduler
            .run(
                SkillLevel::Beginner,
                23,
                |index| {
                    let in_flight = in_flight.clone();
                    let peak = peak.clone();
                    async move {
                        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                        ok_result(SkillLevel::Beginner, index)
                    }
                },
                None,
            )
            .await;

        assert_eq!(results.len(), 23);
        let peak = peak.load(Ordering::SeqCst);
        assert!(peak <= 5 && peak > 1, "peak in-flight journeys: {peak}");
        let ids: Vec<&str> = results.iter().map(|r| r.user.id.as_str()).collect();
        assert_eq!(ids[0], "beginner-0");
        assert_eq!(ids[22], "beginner-22");
    }

    #[tokio::test]
    async fn panicking_journey_does_not_abort_siblings() {
        let scheduler = BatchScheduler::new(4, Duration::ZERO);
        let results = scheduler
            .run(
                SkillLevel::Advanced,
                4,
                |index| async move {
                    if index == 2 {
                        panic!("boom");
                    }
                    ok_result(SkillLevel::Advanced, index)
                },
                None,
            )
            .await;

        assert_eq!(results.len(), 4);
        assert_eq!(results.iter().filter(|r| r.succeeded()).count(), 3);
        assert!(results[2].error.is_some());
        assert!(!results[2].user.succeeded);
    }

    #[tokio::test]
    async fn reports_progress_after_every_batch() {
        let updates = Arc::new(Mutex::new(Vec::new()));
        let sink = updates.clone();
        let progress: ProgressFn = Arc::new(move |u: ProgressUpdate| sink.lock().unwrap().push(u));

        let scheduler = BatchScheduler::new(3, Duration::ZERO);
        scheduler
            .run(
                SkillLevel::Intermediate,
                7,
                |index| async move { ok_result(SkillLevel::Intermediate, index) },
                Some(&progress),
            )
            .await;

        let updates = updates.lock().unwrap().clone();
        assert_eq!(updates.len(), 4);
        assert!(matches!(
            updates[0],
            ProgressUpdate::CohortStarted { users: 7, batches: 3, .. }
        ));
        let ProgressUpdate::BatchCompleted(last) = &updates[3] else {
            panic!("expected batch progress, got {:?}", updates[3]);
        };
        assert_eq!(last.batch, 3);
        assert_eq!(last.users_done, 7);
        assert_eq!(last.users_failed, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn sleeps_between_batches_only() {
        let scheduler = BatchScheduler::new(2, Duration::from_secs(1));
        let started = tokio::time::Instant::now();
        scheduler
            .run(
                SkillLevel::Beginner,
                6,
                |index| async move { ok_result(SkillLevel::Beginner, index) },
                None,
            )
            .await;

        let elapsed = started.elapsed();
        assert!(
            elapsed >= Duration::from_secs(2) && elapsed < Duration::from_secs(3),
            "elapsed={elapsed:?}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn failures_are_logged_before_slower_siblings_finish() {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let logged_early = Arc::new(Mutex::new(None));
        let scheduler = BatchScheduler::new(2, Duration::ZERO);
        let results = scheduler
            .run(
                SkillLevel::Beginner,
                2,
                |index| {
                    let logs = logs.clone();
                    let logged_early = logged_early.clone();
                    async move {
                        if index == 1 {
                            return JourneyResult::aborted(
                                SkillLevel::Beginner,
                                1,
                                "catalog unavailable",
                            );
                        }
                        tokio::time::sleep(Duration::from_millis(800)).await;
                        *logged_early.lock().unwrap() = Some(logs.contents().contains("beginner-1"));
                        ok_result(SkillLevel::Beginner, 0)
                    }
                },
                None,
            )
            .await;

        assert_eq!(*logged_early.lock().unwrap(), Some(true), "logs: {}", logs.contents());
        let ids: Vec<&str> = results.iter().map(|r| r.user.id.as_str()).collect();
        assert_eq!(ids, ["beginner-0", "beginner-1"]);
        assert!(results[0].succeeded());
        assert!(!results[1].succeeded());
    }
}

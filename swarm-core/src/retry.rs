use std::future::Future;
use std::time::Duration;

/// Flat-delay retry: up to `attempts` tries with a fixed pause between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
        }
    }
}

/// Final result of a retried operation and how many tries it took.
#[derive(Debug)]
pub struct Retried<T, E> {
    pub result: Result<T, E>,
    pub attempts: u32,
}

/// Runs `op` until it returns `Ok` or the policy's attempts are used up.
///
/// `op` receives the 1-based attempt number. Any `Err` is retried; the last one is returned.
pub async fn retry<F, Fut, T, E>(policy: RetryPolicy, op: F) -> Retried<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    retry_if(policy, op, |_| true).await
}

/// Like [`retry`], but only errors accepted by `should_retry` are retried.
pub async fn retry_if<F, Fut, T, E, P>(
    policy: RetryPolicy,
    mut op: F,
    should_retry: P,
) -> Retried<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => {
                return Retried {
                    result: Ok(value),
                    attempts: attempt,
                };
            }
            Err(err) if attempt < attempts && should_retry(&err) => {
                if !policy.delay.is_zero() {
                    tokio::time::sleep(policy.delay).await;
                }
                attempt += 1;
            }
            Err(err) => {
                return Retried {
                    result: Err(err),
                    attempts: attempt,
                };
            }
        }
    }
}

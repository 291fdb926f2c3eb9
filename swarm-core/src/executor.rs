use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use swarm_http::{HttpClient, HttpRequest, HttpResponse};

use crate::retry::{RetryPolicy, retry_if};

/// Result of one logical request (after retries).
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOutcome {
    /// Absent when no response was received.
    pub status: Option<u16>,
    /// Wall-clock time of the final attempt, timeout waiting included.
    pub duration_ms: f64,
    /// A status was received and it is 2xx or 3xx.
    pub succeeded: bool,
    pub error: Option<String>,
    pub body: Bytes,
    pub attempts: u32,
}

impl RequestOutcome {
    fn from_response(res: HttpResponse, elapsed: Duration, attempts: u32) -> Self {
        Self {
            status: Some(res.status),
            duration_ms: millis(elapsed),
            succeeded: (200..400).contains(&res.status),
            error: None,
            body: res.body,
            attempts,
        }
    }

    fn from_error(err: &swarm_http::Error, elapsed: Duration, attempts: u32) -> Self {
        Self {
            status: None,
            duration_ms: millis(elapsed),
            succeeded: false,
            error: Some(err.to_string()),
            body: Bytes::new(),
            attempts,
        }
    }

    pub fn is_2xx(&self) -> bool {
        self.status.is_some_and(|s| (200..300).contains(&s))
    }

    /// Whether the target answered at all.
    pub fn reached(&self) -> bool {
        self.status.is_some()
    }
}

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

struct Timed<T> {
    value: T,
    elapsed: Duration,
}

/// Issues GETs with a per-request timeout and flat-delay retries on transport failures.
///
/// Never returns an error: failures are folded into the [`RequestOutcome`].
#[derive(Debug, Clone)]
pub struct TimedExecutor {
    client: Arc<HttpClient>,
    timeout: Duration,
    retry: RetryPolicy,
}

impl TimedExecutor {
    pub fn new(client: Arc<HttpClient>, timeout: Duration, retry: RetryPolicy) -> Self {
        Self {
            client,
            timeout,
            retry,
        }
    }

    pub async fn get(&self, url: &str) -> RequestOutcome {
        self.execute(http::Method::GET, url).await
    }

    pub async fn execute(&self, method: http::Method, url: &str) -> RequestOutcome {
        let method = &method;
        let retried = retry_if(
            self.retry,
            move |_| self.attempt(method, url),
            |err: &Timed<swarm_http::Error>| err.value.is_transport(),
        )
        .await;

        match retried.result {
            Ok(res) => RequestOutcome::from_response(res.value, res.elapsed, retried.attempts),
            Err(err) => RequestOutcome::from_error(&err.value, err.elapsed, retried.attempts),
        }
    }

    async fn attempt(
        &self,
        method: &http::Method,
        url: &str,
    ) -> Result<Timed<HttpResponse>, Timed<swarm_http::Error>> {
        let req = HttpRequest::new(method.clone(), url.to_string()).with_timeout(self.timeout);

        let started = Instant::now();
        let res = self.client.request(req).await;
        let elapsed = started.elapsed();

        match res {
            Ok(value) => Ok(Timed { value, elapsed }),
            Err(value) => {
                tracing::trace!(url, error = %value, "request attempt failed");
                Err(Timed { value, elapsed })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn executor(attempts: u32) -> TimedExecutor {
        TimedExecutor::new(
            Arc::new(HttpClient::new(Some(Duration::from_millis(200)))),
            Duration::from_millis(500),
            RetryPolicy::new(attempts, Duration::ZERO),
        )
    }

    #[tokio::test]
    async fn transport_failure_becomes_failed_outcome() {
        // Bind then drop to get a port nothing listens on.
        let port = match std::net::TcpListener::bind("127.0.0.1:0") {
            Ok(l) => match l.local_addr() {
                Ok(addr) => addr.port(),
                Err(err) => panic!("local_addr: {err}"),
            },
            Err(err) => panic!("bind: {err}"),
        };

        let out = executor(2).get(&format!("http://127.0.0.1:{port}/")).await;
        assert!(!out.succeeded);
        assert_eq!(out.status, None);
        assert!(out.error.is_some());
        assert_eq!(out.attempts, 2);
        assert!(out.duration_ms >= 0.0);
        assert!(!out.reached());
    }

    #[tokio::test]
    async fn malformed_url_is_not_retried() {
        let out = executor(3).get("ftp://example.com/").await;
        assert!(!out.succeeded);
        assert_eq!(out.attempts, 1);
    }

    #[test]
    fn success_covers_2xx_and_3xx() {
        let ok = |status| {
            RequestOutcome::from_response(
                HttpResponse {
                    status,
                    body: Bytes::new(),
                },
                Duration::from_millis(3),
                1,
            )
        };

        assert!(ok(200).succeeded && ok(200).is_2xx());
        assert!(ok(304).succeeded && !ok(304).is_2xx());
        assert!(!ok(404).succeeded);
        assert!(!ok(500).succeeded);
        assert!((ok(200).duration_ms - 3.0).abs() < 1e-9);
    }
}

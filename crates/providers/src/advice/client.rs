use crate::advice::config::AdviceConfig;
use pulse_core::advice::{
    parse_answer, snippet, AdviceBackend, AdviceError, AdviceRequest, PriceMap,
};
use reqwest::Client;
use std::future::Future;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

#[derive(Clone)]
pub struct AdviceClient {
    http: Client,
    cfg: AdviceConfig,
}

impl AdviceClient {
    pub fn new(cfg: AdviceConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .use_rustls_tls()
            .pool_idle_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(2)
            .build()?;
        Ok(Self { http, cfg })
    }

    pub fn config(&self) -> &AdviceConfig {
        &self.cfg
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.cfg.api_base.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[allow(async_fn_in_trait)]
impl AdviceBackend for AdviceClient {
    /// One advice exchange: per-attempt deadline, bounded retry, and a
    /// body that is forgiven its shape (missing `answer` becomes the
    /// fallback text, never an error).
    async fn ask(&self, req: &AdviceRequest) -> Result<String, AdviceError> {
        let url = self.endpoint("advice");
        debug!(target: "providers::advice", "ask url={} query_len={}", url, req.user_query.len());
        let attempt = || {
            let url = url.clone();
            async move {
                let resp = self
                    .http
                    .post(&url)
                    .timeout(self.cfg.advice_timeout)
                    .json(req)
                    .send()
                    .await
                    .map_err(map_reqwest_err)?;
                if !resp.status().is_success() {
                    return Err(status_failure(resp).await);
                }
                resp.text().await.map_err(map_reqwest_err)
            }
        };
        let body = with_retry(attempt, self.cfg.advice_retries, self.cfg.retry_backoff).await?;
        Ok(parse_answer(&body))
    }

    /// Best-effort digest figures: shorter deadline, no retry. Failures
    /// propagate so the caller can decide to show the placeholder digest.
    async fn prices(&self, symbols: &[String]) -> Result<PriceMap, AdviceError> {
        let mut url = url::Url::parse(&self.endpoint("prices"))
            .map_err(|e| AdviceError::Other(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("symbols", &symbols.join(","));
        debug!(target: "providers::advice", "prices url={}", url);
        let resp = self
            .http
            .get(url)
            .timeout(self.cfg.digest_timeout)
            .send()
            .await
            .map_err(map_reqwest_err)?;
        if !resp.status().is_success() {
            return Err(status_failure(resp).await);
        }
        resp.json::<PriceMap>()
            .await
            .map_err(|e| AdviceError::Decode(e.to_string()))
    }
}

/// Bounded-retry driver: run `op`; on failure wait the fixed backoff and
/// reissue while the budget lasts, then propagate. `retries` counts
/// re-attempts, so a budget of 1 means two attempts total.
async fn with_retry<T, F, Fut>(
    mut op: F,
    mut retries: u32,
    backoff: Duration,
) -> Result<T, AdviceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AdviceError>>,
{
    loop {
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) if retries > 0 => {
                warn!(target: "providers::advice", "attempt failed ({}), {} left", e, retries);
                retries -= 1;
                sleep(backoff).await;
            }
            Err(e) => return Err(e),
        }
    }
}

fn map_reqwest_err(e: reqwest::Error) -> AdviceError {
    if e.is_timeout() {
        AdviceError::Timeout(e.to_string())
    } else if e.is_request() || e.is_connect() {
        AdviceError::Network(e.to_string())
    } else {
        AdviceError::Other(e.to_string())
    }
}

/// A non-success status is a failure even though transport succeeded; keep
/// the code plus a capped slice of the body for the inline diagnostics.
async fn status_failure(resp: reqwest::Response) -> AdviceError {
    let code = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    AdviceError::Status {
        code,
        snippet: snippet(&body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn budget_one_with_two_failures_makes_two_attempts_then_fails() {
        let calls = AtomicU32::new(0);
        let res = with_retry(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(AdviceError::Network("connection refused".into())) }
            },
            1,
            Duration::from_millis(1),
        )
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(matches!(res, Err(AdviceError::Network(_))));
    }

    #[tokio::test]
    async fn budget_one_with_fail_then_success_makes_two_attempts() {
        let calls = AtomicU32::new(0);
        let res = with_retry(
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(AdviceError::Timeout("deadline elapsed".into()))
                    } else {
                        Ok("answer")
                    }
                }
            },
            1,
            Duration::from_millis(1),
        )
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(res.unwrap(), "answer");
    }

    #[tokio::test]
    async fn zero_budget_fails_on_first_error() {
        let calls = AtomicU32::new(0);
        let res = with_retry(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err::<(), _>(AdviceError::Status {
                        code: 503,
                        snippet: "unavailable".into(),
                    })
                }
            },
            0,
            Duration::from_millis(1),
        )
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(res, Err(AdviceError::Status { code: 503, .. })));
    }

    #[tokio::test]
    async fn immediate_success_makes_one_attempt() {
        let calls = AtomicU32::new(0);
        let res = with_retry(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, AdviceError>(7u32) }
            },
            3,
            Duration::from_millis(1),
        )
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(res.unwrap(), 7);
    }

    #[test]
    fn endpoint_joins_without_doubled_slashes() {
        let mut cfg = AdviceConfig::from_env_and_file();
        cfg.api_base = "https://advice.example/".into();
        let client = AdviceClient::new(cfg).unwrap();
        assert_eq!(client.endpoint("advice"), "https://advice.example/advice");
        assert_eq!(client.endpoint("/prices"), "https://advice.example/prices");
    }
}

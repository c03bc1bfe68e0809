// SPDX-FileCopyrightText: 2026 Harvest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Whole-run retry with rate-limit and transient back-off.

use std::future::Future;
use std::time::Duration;

use harvest_config::model::RetryConfig;
use harvest_core::{FailureClass, HarvestError};
use tracing::{error, warn};

/// Re-runs an operation from the top until it succeeds.
///
/// Rate-limit errors wait for the duration the source asked for, every
/// other error waits the fixed transient delay, source rejections included.
/// Only configuration errors are returned at once. Without `max_attempts`
/// the controller never gives up.
#[derive(Debug, Clone)]
pub struct RetryController {
    transient_delay: Duration,
    max_attempts: Option<u32>,
}

impl RetryController {
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            transient_delay: Duration::from_secs(config.transient_delay_secs),
            max_attempts: config.max_attempts,
        }
    }

    /// Drive `op` to completion. `label` names the run in log lines.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, HarvestError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, HarvestError>>,
    {
        let mut failures: u32 = 0;
        loop {
            let err = match op().await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            if err.is_terminal() {
                error!(run = label, error = %err, "unrecoverable error, not retrying");
                return Err(err);
            }
            failures = failures.saturating_add(1);

            let wait = match err.class() {
                FailureClass::Fatal => {
                    error!(
                        run = label,
                        error = %err,
                        attempt = failures,
                        delay_secs = self.transient_delay.as_secs(),
                        "source rejected the run, resuming after delay"
                    );
                    self.transient_delay
                }
                FailureClass::RateLimit(wait) => {
                    warn!(
                        run = label,
                        wait_secs = wait.as_secs_f64(),
                        attempt = failures,
                        "rate limited, waiting before resuming"
                    );
                    wait
                }
                FailureClass::Transient => {
                    warn!(
                        run = label,
                        error = %err,
                        attempt = failures,
                        delay_secs = self.transient_delay.as_secs(),
                        "run failed, resuming after delay"
                    );
                    self.transient_delay
                }
            };

            if let Some(max) = self.max_attempts
                && failures >= max
            {
                error!(run = label, attempts = failures, error = %err, "giving up");
                return Err(HarvestError::RetriesExhausted {
                    attempts: failures,
                    last: Box::new(err),
                });
            }

            tokio::time::sleep(wait).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn controller(max_attempts: Option<u32>) -> RetryController {
        RetryController::new(&RetryConfig {
            transient_delay_secs: 5,
            max_attempts,
        })
    }

    fn transient() -> HarvestError {
        HarvestError::Transient {
            message: "connection reset".into(),
            source: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn transient_errors_wait_fixed_delay() {
        let calls = &AtomicU32::new(0);
        let start = Instant::now();
        let result = controller(None)
            .run("test", || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(transient())
                } else {
                    Ok("done")
                }
            })
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(start.elapsed() >= Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_waits_requested_duration() {
        let calls = &AtomicU32::new(0);
        let start = Instant::now();
        controller(None)
            .run("test", || async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(HarvestError::RateLimited {
                        wait: Duration::from_secs(120),
                    })
                } else {
                    Ok(())
                }
            })
            .await
            .unwrap();

        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(120));
        assert!(elapsed < Duration::from_secs(125));
    }

    #[tokio::test(start_paused = true)]
    async fn source_rejections_are_retried_after_fixed_delay() {
        let calls = &AtomicU32::new(0);
        let start = Instant::now();
        let result = controller(None)
            .run("test", || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 3 {
                    Err(HarvestError::Fatal {
                        message: "channel not found".into(),
                    })
                } else {
                    Ok("found")
                }
            })
            .await;

        assert_eq!(result.unwrap(), "found");
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert!(start.elapsed() >= Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn config_errors_are_not_retried() {
        let calls = &AtomicU32::new(0);
        let err = controller(None)
            .run("test", || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(HarvestError::Config("bad base_url".into()))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, HarvestError::Config(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn attempt_cap_converts_to_exhausted() {
        let calls = &AtomicU32::new(0);
        let err = controller(Some(3))
            .run("test", || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(transient())
            })
            .await
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match err {
            HarvestError::RetriesExhausted { attempts, last } => {
                assert_eq!(attempts, 3);
                assert!(matches!(*last, HarvestError::Transient { .. }));
            }
            other => panic!("expected RetriesExhausted, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn storage_errors_are_retried_as_transient() {
        let calls = &AtomicU32::new(0);
        controller(Some(5))
            .run("test", || async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(HarvestError::Storage {
                        source: "database is locked".into(),
                    })
                } else {
                    Ok(())
                }
            })
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}

//! Call policy for hosted collaborators (Gemini, mail relay)
//!
//! Every outbound call runs under an explicit client timeout. A timeout or
//! connect failure is retried once after a fixed backoff; a second failure is
//! surfaced as `UpstreamUnavailable`. Nothing else is retried.

use crate::error::AssistantError;
use crate::Result;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Copy)]
pub struct CallPolicy {
    pub timeout: Duration,
    pub backoff: Duration,
}

impl Default for CallPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            backoff: Duration::from_millis(500),
        }
    }
}

/// Run `op`, retrying once on a retryable failure.
pub async fn call_with_retry<T, F, Fut>(upstream: &str, policy: CallPolicy, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match op().await {
        Err(e) if e.is_retryable() => {
            warn!(upstream, error = %e, "Upstream call failed, retrying once");
            tokio::time::sleep(policy.backoff).await;

            op().await.map_err(|e| {
                if e.is_retryable() {
                    AssistantError::UpstreamUnavailable(format!("{} after retry: {}", upstream, e))
                } else {
                    e
                }
            })
        }
        other => other,
    }
}

use std::time::Duration;

/// Node error messages that indicate a nonce-state rejection. Matched
/// case-insensitively as substrings, the way nodes actually phrase them:
/// "nonce too low", "replacement transaction underpriced", "already known".
const NONCE_CONFLICT_PATTERNS: &[&str] =
    &["nonce", "replacement transaction underpriced", "already known"];

#[derive(Clone, Debug)]
pub struct NonceRetryConfig {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Backoff grows linearly: `base_delay * attempt_number`.
    pub base_delay: Duration,
}

impl Default for NonceRetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

/// Whether a failure message looks like a nonce conflict worth retrying.
pub fn is_nonce_conflict(message: &str) -> bool {
    let msg_lower = message.to_lowercase();
    NONCE_CONFLICT_PATTERNS
        .iter()
        .any(|pattern| msg_lower.contains(pattern))
}

/// Run `op`, retrying only nonce-conflict failures.
///
/// Non-matching failures propagate immediately with no backoff. Exhausting
/// `max_attempts` propagates the last observed failure.
pub async fn with_nonce_retry<T, E, F, Fut>(config: &NonceRetryConfig, mut op: F) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 1u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_nonce_conflict(&err.to_string()) || attempt >= config.max_attempts {
                    return Err(err);
                }
                let delay = config.base_delay * attempt;
                tracing::warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "nonce conflict, retrying submission"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

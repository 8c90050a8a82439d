//! Connectivity probe

use super::Session;
use crate::error::{LoadError, Result};
use std::time::Duration;
use tracing::{info, warn};

/// Ping attempts before giving up
pub const DEFAULT_MAX_ATTEMPTS: u32 = 6;

/// Delay unit for linear backoff
pub const DEFAULT_BASE_DELAY_MS: u64 = 100;

/// How often and how patiently to ping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    /// Sleep after the given failed attempt (1-based): `attempt × base_delay`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

/// Ping until the server answers, then run one verification query.
///
/// Every failed ping is logged at warn level. Running out of attempts returns
/// [`LoadError::Connectivity`] with the attempt count and the last failure.
/// A failing verification query is returned as is.
pub async fn status_check(session: &dyn Session, policy: RetryPolicy) -> Result<()> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match session.ping().await {
            Ok(()) => break,
            Err(e) => {
                warn!(attempt, max_attempts, error = %e, "Database ping failed");
                if attempt >= max_attempts {
                    return Err(LoadError::Connectivity {
                        attempts: attempt,
                        source: Box::new(e),
                    });
                }
                tokio::time::sleep(policy.delay_after(attempt)).await;
            },
        }
    }

    info!(attempts = attempt, "Database answered ping");
    session.verify().await?;
    info!("Database connectivity verified");
    Ok(())
}

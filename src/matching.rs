use std::time::Duration;

use crate::catalog::{Catalog, CatalogEntry};
use crate::config::CatalogConfig;
use crate::error::StoreError;
use crate::melody::Fingerprint;

#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    /// Total store calls, the first one included.
    pub max_attempts: u32,
    /// Delay before the second call; doubled after every further failure.
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_millis(100),
        }
    }
}

impl From<&CatalogConfig> for RetryPolicy {
    fn from(config: &CatalogConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_backoff: Duration::from_millis(config.backoff_ms),
        }
    }
}

impl RetryPolicy {
    pub fn backoff(&self, failed_attempts: u32) -> Duration {
        let shift = failed_attempts.saturating_sub(1).min(16);
        self.base_backoff.saturating_mul(1 << shift)
    }
}

pub struct MatchEngine<'a> {
    catalog: &'a dyn Catalog,
    retry: RetryPolicy,
}

impl<'a> MatchEngine<'a> {
    pub fn new(catalog: &'a dyn Catalog, retry: RetryPolicy) -> Self {
        Self { catalog, retry }
    }

    /// Catalog entries containing `fingerprint`, in store order.
    pub fn find_matches(&self, fingerprint: &Fingerprint) -> Result<Vec<CatalogEntry>, StoreError> {
        let pattern = fingerprint.to_string();
        let attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.catalog.find_by_signature_substring(&pattern) {
                Ok(entries) => {
                    log::info!("Catalog returned {} matches for {}", entries.len(), pattern);
                    return Ok(entries);
                }
                Err(err) if !err.is_transient() => {
                    log::error!("Catalog query failed: {}", err);
                    return Err(err);
                }
                Err(err) if attempt >= attempts => {
                    log::error!("Catalog query failed after {} attempts: {}", attempt, err);
                    return Err(err);
                }
                Err(err) => {
                    let delay = self.retry.backoff(attempt);
                    log::warn!(
                        "Catalog query attempt {}/{} failed: {}; retrying in {:?}",
                        attempt,
                        attempts,
                        err,
                        delay
                    );
                    std::thread::sleep(delay);
                    attempt += 1;
                }
            }
        }
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 The relaychat contributors

//! Retry logic for upstream calls with exponential backoff
//!
//! Only the "temporarily overloaded" signal is retried. Everything else
//! propagates on the first failure.

use crate::config::settings::ResilienceConfig;
use crate::error::{ApiError, RelayError, Result};
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Retry configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total number of attempts, including the first one
    pub max_attempts: u32,
    /// Base delay in milliseconds (doubled per attempt)
    pub base_delay_ms: u64,
    /// Upper bound of the uniform jitter added to each delay
    pub max_jitter_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::from(&ResilienceConfig::default())
    }
}

impl From<&ResilienceConfig> for RetryConfig {
    fn from(config: &ResilienceConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay_ms: config.base_delay_ms,
            max_jitter_ms: config.max_jitter_ms,
        }
    }
}

impl RetryConfig {
    /// Delay before the retry that follows failed attempt `attempt` (0-based):
    /// `base * 2^attempt + jitter`, jitter uniform in `[0, max_jitter_ms]`.
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let exponential_ms = self
            .base_delay_ms
            .saturating_mul(2u64.saturating_pow(attempt));

        let jitter_ms = if self.max_jitter_ms == 0 {
            0
        } else {
            rand::rng().random_range(0..=self.max_jitter_ms)
        };

        Duration::from_millis(exponential_ms.saturating_add(jitter_ms))
    }
}

/// Determine if an error is retryable
pub fn is_retryable(error: &RelayError) -> bool {
    matches!(error, RelayError::Api(ApiError::Overloaded(_)))
}

/// Calls `operation` until it succeeds, fails with something other than an
/// overload, or `max_attempts` calls have been made. The last error wins.
/// `operation_name` only labels the log lines.
pub async fn with_retry<F, Fut, T>(
    mut operation: F,
    config: Option<RetryConfig>,
    operation_name: &str,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let config = config.unwrap_or_default();
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    tracing::info!(
                        operation = operation_name,
                        attempts = attempt + 1,
                        "succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(error) => {
                if !is_retryable(&error) {
                    tracing::warn!(
                        operation = operation_name,
                        %error,
                        "failed with non-retryable error"
                    );
                    return Err(error);
                }

                if attempt + 1 >= max_attempts {
                    tracing::warn!(
                        operation = operation_name,
                        max_attempts,
                        "exhausted all attempts"
                    );
                    return Err(error);
                }

                let delay = config.calculate_delay(attempt);
                tracing::warn!(
                    operation = operation_name,
                    attempt = attempt + 1,
                    max_attempts,
                    %error,
                    delay_ms = delay.as_millis() as u64,
                    "upstream overloaded, retrying"
                );

                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

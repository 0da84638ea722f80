// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Engine configuration.

use seatwise_domain::PaymentFailurePolicy;
use thiserror::Error;
use time::Duration;

/// Default lock time-to-live in seconds.
pub const DEFAULT_LOCK_TTL_SECS: i64 = 300;

/// Default interval between expiry sweeps in seconds.
pub const DEFAULT_SWEEP_INTERVAL_SECS: i64 = 5;

/// Configuration errors raised when building an [`EngineConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The lock TTL must be a positive number of seconds.
    #[error("lock TTL must be at least 1 second, got {0}")]
    InvalidLockTtl(i64),
    /// The sweep interval must be a positive number of seconds.
    #[error("sweep interval must be at least 1 second, got {0}")]
    InvalidSweepInterval(i64),
}

/// Deployment configuration for the reservation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// How long a seat lock lives without a refresh.
    pub lock_ttl: Duration,
    /// How often the background sweep clears expired locks.
    pub sweep_interval: Duration,
    /// How failed or refunded payments map onto the booking lifecycle.
    pub payment_failure_policy: PaymentFailurePolicy,
}

impl EngineConfig {
    /// Builds a validated configuration.
    ///
    /// # Arguments
    ///
    /// * `lock_ttl_secs` - Lock time-to-live in seconds
    /// * `sweep_interval_secs` - Expiry sweep interval in seconds
    /// * `payment_failure_policy` - Failed-payment lifecycle policy
    ///
    /// # Errors
    ///
    /// Returns an error if either duration is not positive.
    pub const fn new(
        lock_ttl_secs: i64,
        sweep_interval_secs: i64,
        payment_failure_policy: PaymentFailurePolicy,
    ) -> Result<Self, ConfigError> {
        if lock_ttl_secs < 1 {
            return Err(ConfigError::InvalidLockTtl(lock_ttl_secs));
        }
        if sweep_interval_secs < 1 {
            return Err(ConfigError::InvalidSweepInterval(sweep_interval_secs));
        }
        Ok(Self {
            lock_ttl: Duration::seconds(lock_ttl_secs),
            sweep_interval: Duration::seconds(sweep_interval_secs),
            payment_failure_policy,
        })
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lock_ttl: Duration::seconds(DEFAULT_LOCK_TTL_SECS),
            sweep_interval: Duration::seconds(DEFAULT_SWEEP_INTERVAL_SECS),
            payment_failure_policy: PaymentFailurePolicy::default(),
        }
    }
}

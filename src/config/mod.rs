// src/config/mod.rs
//! Acquisition configuration
//!
//! Deserialized from TOML by the loader; every field has a default so a
//! partial file works. `validate` runs before any device I/O.

pub mod constants;
pub mod loader;

pub use loader::ConfigLoader;

use crate::config::constants::*;
use crate::registers::{Averaging, ConversionTime, DeviceConfiguration};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file is not valid TOML.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Configuration parsed but describes an unusable run.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// What the validation pass rejected.
        reason: String,
    },
}

/// Retry and timing knobs for device setup and mid-run recovery.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecoveryConfig {
    /// Configuration attempts per device before marking it unreachable.
    #[serde(default = "defaults::setup_attempts")]
    pub setup_attempts: u32,

    /// Wait between configuration attempts.
    #[serde(default = "defaults::setup_backoff_ms")]
    pub setup_backoff_ms: u64,

    /// Read-retry budget shared across all devices and all samples; once
    /// spent, the run ends with a bus failure.
    #[serde(default = "defaults::read_retry_budget")]
    pub read_retry_budget: u32,

    /// Settle wait after config-register writes.
    #[serde(default = "defaults::settle_time_ms")]
    pub settle_time_ms: u64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            setup_attempts: DEFAULT_SETUP_ATTEMPTS,
            setup_backoff_ms: DEFAULT_SETUP_BACKOFF_MS,
            read_retry_budget: DEFAULT_READ_RETRY_BUDGET,
            settle_time_ms: DEFAULT_SETTLE_TIME_MS,
        }
    }
}

/// Complete acquisition configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AcquisitionConfig {
    /// 7-bit addresses of the monitored devices, one slot each.
    #[serde(default = "defaults::addresses")]
    pub addresses: Vec<u8>,

    /// Sample the current register.
    #[serde(default = "defaults::measure_current")]
    pub measure_current: bool,

    /// Sample the bus-voltage register.
    #[serde(default)]
    pub measure_voltage: bool,

    /// Continuous conversion mode.
    #[serde(default = "defaults::continuous")]
    pub continuous: bool,

    /// Requested conversion-time bucket in microseconds; values that are
    /// not one of the eight chip buckets fall back to 140 µs.
    #[serde(default = "defaults::conversion_time_us")]
    pub conversion_time_us: u32,

    /// Conversions averaged per reported value; unsupported lengths fall
    /// back to 1.
    #[serde(default = "defaults::averaging_samples")]
    pub averaging_samples: u16,

    /// Total acquisition duration in microseconds.
    #[serde(default = "defaults::duration_us")]
    pub duration_us: u64,

    /// Retry and timing knobs.
    #[serde(default)]
    pub recovery: RecoveryConfig,
}

mod defaults {
    use crate::config::constants::*;

    pub fn addresses() -> Vec<u8> {
        vec![DEFAULT_DEVICE_ADDRESS]
    }

    pub fn measure_current() -> bool {
        true
    }

    pub fn continuous() -> bool {
        true
    }

    pub fn conversion_time_us() -> u32 {
        DEFAULT_CONVERSION_TIME_US
    }

    pub fn averaging_samples() -> u16 {
        DEFAULT_AVERAGING_SAMPLES
    }

    pub fn duration_us() -> u64 {
        DEFAULT_DURATION_US
    }

    pub fn setup_attempts() -> u32 {
        DEFAULT_SETUP_ATTEMPTS
    }

    pub fn setup_backoff_ms() -> u64 {
        DEFAULT_SETUP_BACKOFF_MS
    }

    pub fn read_retry_budget() -> u32 {
        DEFAULT_READ_RETRY_BUDGET
    }

    pub fn settle_time_ms() -> u64 {
        DEFAULT_SETTLE_TIME_MS
    }
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            addresses: defaults::addresses(),
            measure_current: defaults::measure_current(),
            measure_voltage: false,
            continuous: defaults::continuous(),
            conversion_time_us: defaults::conversion_time_us(),
            averaging_samples: defaults::averaging_samples(),
            duration_us: defaults::duration_us(),
            recovery: RecoveryConfig::default(),
        }
    }
}

impl AcquisitionConfig {
    /// Per-device register configuration derived from this run config.
    pub fn device_configuration(&self) -> DeviceConfiguration {
        DeviceConfiguration {
            measure_current: self.measure_current,
            measure_voltage: self.measure_voltage,
            continuous: self.continuous,
            averaging: Averaging::from_samples(self.averaging_samples),
            conversion_time: ConversionTime::from_micros(self.conversion_time_us),
        }
    }

    /// Sampling period: the device cannot convert faster than its
    /// conversion-time bucket.
    pub fn period_us(&self) -> u32 {
        ConversionTime::from_micros(self.conversion_time_us).micros()
    }

    /// Requested sample count, `duration / period` rounded to nearest.
    pub fn requested_samples(&self) -> usize {
        let period = u64::from(self.period_us());
        ((self.duration_us + period / 2) / period) as usize
    }

    /// Settle wait as a [`Duration`].
    pub fn settle_time(&self) -> Duration {
        Duration::from_millis(self.recovery.settle_time_ms)
    }

    /// Backoff between setup attempts as a [`Duration`].
    pub fn setup_backoff(&self) -> Duration {
        Duration::from_millis(self.recovery.setup_backoff_ms)
    }

    /// Reject configurations that cannot produce a run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.addresses.is_empty() {
            return Err(ConfigError::Invalid {
                reason: "at least one device address is required".to_string(),
            });
        }
        for &address in &self.addresses {
            if address > MAX_DEVICE_ADDRESS {
                return Err(ConfigError::Invalid {
                    reason: format!("0x{address:02X} is not a 7-bit bus address"),
                });
            }
        }
        let mut seen = std::collections::HashSet::new();
        for &address in &self.addresses {
            if !seen.insert(address) {
                return Err(ConfigError::Invalid {
                    reason: format!("duplicate device address 0x{address:02X}"),
                });
            }
        }
        if self.duration_us == 0 {
            return Err(ConfigError::Invalid {
                reason: "duration must be non-zero".to_string(),
            });
        }
        if self.requested_samples() == 0 {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "duration of {} us rounds to zero samples at a {} us period",
                    self.duration_us,
                    self.period_us()
                ),
            });
        }
        if self.recovery.setup_attempts == 0 {
            return Err(ConfigError::Invalid {
                reason: "at least one setup attempt is required".to_string(),
            });
        }
        if self.recovery.settle_time_ms < MIN_SETTLE_TIME_MS {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "settle time must be at least {MIN_SETTLE_TIME_MS} ms"
                ),
            });
        }
        Ok(())
    }
}

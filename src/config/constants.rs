// src/config/constants.rs
//! Default values for the acquisition configuration

/// Factory-default INA260 bus address (A0/A1 tied to GND).
pub const DEFAULT_DEVICE_ADDRESS: u8 = 0x40;

/// Default total acquisition duration.
pub const DEFAULT_DURATION_US: u64 = 1_000_000;

/// Default conversion-time bucket.
pub const DEFAULT_CONVERSION_TIME_US: u32 = 140;

/// Default averaging length (no averaging).
pub const DEFAULT_AVERAGING_SAMPLES: u16 = 1;

/// Default configuration attempts per device before it is marked
/// unreachable.
pub const DEFAULT_SETUP_ATTEMPTS: u32 = 5;

/// Default wait between configuration attempts.
pub const DEFAULT_SETUP_BACKOFF_MS: u64 = 50;

/// Default read-retry budget shared across all devices and samples.
pub const DEFAULT_READ_RETRY_BUDGET: u32 = 8;

/// Default settle wait after a config-register write.
pub const DEFAULT_SETTLE_TIME_MS: u64 = 10;

/// The chip is not readable sooner than this after a config write.
pub const MIN_SETTLE_TIME_MS: u64 = 10;

/// Largest valid 7-bit bus address.
pub const MAX_DEVICE_ADDRESS: u8 = 0x7F;

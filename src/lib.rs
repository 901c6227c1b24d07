//! powermon-core: timed telemetry acquisition for INA260 power monitors
//!
//! The crate drives one or more INA260 current/voltage/power monitors over a
//! register-oriented bus and captures their readings on a fixed cadence:
//!
//! - Register codec for the chip's 16-bit register map
//! - Device configurator (reset, identity check, configure, read back)
//! - Spin-wait acquisition scheduler with transient-fault recovery
//! - Fixed-capacity sample store with out-of-band validity tracking
//! - TOML configuration with validation
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use powermon_core::acquisition::{AcquisitionEngine, StopToken};
//! use powermon_core::config::AcquisitionConfig;
//! use powermon_core::hal::LinuxI2cBus;
//! use powermon_core::utils::time::SystemClock;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AcquisitionConfig::default();
//!     let bus = LinuxI2cBus::default();
//!     let engine = AcquisitionEngine::new(bus, SystemClock::new(), config);
//!
//!     let run = engine.run(&StopToken::new())?;
//!     for record in run.records() {
//!         println!("{} us: {:?}", record.time_offset_us, record.readings);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod acquisition;
pub mod config;
pub mod device;
pub mod error;
pub mod hal;
pub mod registers;
pub mod utils;

// Re-export commonly used types for convenience
pub use acquisition::{AcquisitionEngine, AcquisitionRun, RunOutcome, StopToken};
pub use config::{AcquisitionConfig, ConfigLoader};
pub use device::{DeviceConfigurator, SetupReport};
pub use error::{Error, Result};
pub use hal::{BusError, BusProvider, BusTransport};
pub use utils::time::{MonotonicClock, SystemClock};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert!(!VERSION.is_empty());
        assert!(!NAME.is_empty());
    }
}

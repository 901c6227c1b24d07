// src/hal/mod.rs
//! Bus transport layer for register-oriented power monitors

pub mod traits;
pub mod mock;

#[cfg(feature = "linux-i2c")]
pub mod linux_i2c;

pub use traits::*;
pub use mock::MockBus;

#[cfg(feature = "linux-i2c")]
pub use linux_i2c::{LinuxI2cBus, LinuxI2cConfig};

// src/hal/linux_i2c.rs
//! Linux SMBus transport over `/dev/i2c-*`

use crate::hal::{BusError, BusProvider, BusTransport};
use crate::registers::{self, Register};
use i2cdev::core::I2CDevice;
use i2cdev::linux::LinuxI2CDevice;
use serde::{Deserialize, Serialize};

/// Linux I2C adapter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LinuxI2cConfig {
    /// Character device of the adapter, e.g. `/dev/i2c-1`.
    pub bus_path: String,
}

impl Default for LinuxI2cConfig {
    fn default() -> Self {
        Self {
            bus_path: "/dev/i2c-1".to_string(),
        }
    }
}

/// Bus provider for one Linux I2C adapter.
pub struct LinuxI2cBus {
    config: LinuxI2cConfig,
}

impl LinuxI2cBus {
    /// Create a provider for the given adapter.
    pub fn new(config: LinuxI2cConfig) -> Self {
        Self { config }
    }
}

impl Default for LinuxI2cBus {
    fn default() -> Self {
        Self::new(LinuxI2cConfig::default())
    }
}

impl BusProvider for LinuxI2cBus {
    type Session = LinuxI2cSession;

    fn open(&mut self, address: u8) -> Result<Self::Session, BusError> {
        let device = LinuxI2CDevice::new(&self.config.bus_path, u16::from(address)).map_err(
            |err| BusError::Unreachable {
                address,
                reason: err.to_string(),
            },
        )?;
        Ok(LinuxI2cSession { device })
    }
}

/// One open SMBus session.
///
/// SMBus word transactions are little-endian; the codec swaps to the chip's
/// big-endian register order on the way through.
pub struct LinuxI2cSession {
    device: LinuxI2CDevice,
}

impl BusTransport for LinuxI2cSession {
    fn read_word(&mut self, register: Register) -> Result<u16, BusError> {
        let wire = self
            .device
            .smbus_read_word_data(register.into())
            .map_err(|err| BusError::Transport {
                register,
                reason: err.to_string(),
            })?;
        Ok(registers::from_wire(wire))
    }

    fn write_word(&mut self, register: Register, value: u16) -> Result<(), BusError> {
        self.device
            .smbus_write_word_data(register.into(), registers::to_wire(value))
            .map_err(|err| BusError::Transport {
                register,
                reason: err.to_string(),
            })
    }

    // The file descriptor closes on drop; the default close() is enough.
}

// src/device.rs
//! Device configurator: reset, identity check, configure, read back
//!
//! Drives one device through `Reset -> VerifyIdentity -> Configure`. Every
//! check runs even after an earlier one fails, so a caller can tell a wrong
//! manufacturer from a wrong die from a configuration that did not stick;
//! the distinct causes come back together in a [`SetupReport`].

use crate::hal::{BusError, BusTransport};
use crate::registers::{self, DeviceConfiguration, Register, DIE_ID, MANUFACTURER_ID};
use crate::utils::time::MonotonicClock;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// One distinct setup failure cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SetupFault {
    /// Manufacturer ID register did not read back 0x5449.
    #[error("manufacturer ID mismatch: expected 0x5449, read 0x{actual:04X}")]
    WrongManufacturerId {
        /// Value the device reported.
        actual: u16,
    },

    /// Die ID register did not read back 0x2270.
    #[error("die ID mismatch: expected 0x2270, read 0x{actual:04X}")]
    WrongDieId {
        /// Value the device reported.
        actual: u16,
    },

    /// Config register read-back differed from the written word.
    #[error("config read-back mismatch: wrote 0x{written:04X}, read 0x{read:04X}")]
    ConfigReadback {
        /// Word that was written.
        written: u16,
        /// Word that came back.
        read: u16,
    },
}

/// Outcome of one configuration pass: empty means fully configured.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SetupReport {
    faults: Vec<SetupFault>,
}

impl SetupReport {
    /// True when no fault was recorded.
    pub fn is_ok(&self) -> bool {
        self.faults.is_empty()
    }

    /// All recorded faults, in check order.
    pub fn faults(&self) -> &[SetupFault] {
        &self.faults
    }

    fn record(&mut self, fault: SetupFault) {
        warn!(%fault, "device setup check failed");
        self.faults.push(fault);
    }
}

/// Runs the per-device configuration state machine.
///
/// The settle wait is mandatory: the chip is not readable immediately after
/// a config-register write, so both the reset and the configuration write
/// are followed by it.
pub struct DeviceConfigurator<'c, C: MonotonicClock> {
    clock: &'c C,
    settle_time: Duration,
}

impl<'c, C: MonotonicClock> DeviceConfigurator<'c, C> {
    /// Configurator with the given settle time (at least 10 ms on real
    /// hardware).
    pub fn new(clock: &'c C, settle_time: Duration) -> Self {
        Self { clock, settle_time }
    }

    /// Run the full state machine on one open session.
    ///
    /// Transport failures abort with `Err`; protocol-level mismatches are
    /// collected into the returned [`SetupReport`].
    pub fn configure<S: BusTransport>(
        &self,
        session: &mut S,
        cfg: &DeviceConfiguration,
    ) -> Result<SetupReport, BusError> {
        let mut report = SetupReport::default();

        session.write_word(Register::Config, registers::reset_word())?;
        self.clock.sleep(self.settle_time);

        let manufacturer = session.read_word(Register::ManufacturerId)?;
        if manufacturer != MANUFACTURER_ID {
            report.record(SetupFault::WrongManufacturerId {
                actual: manufacturer,
            });
        }

        let die = session.read_word(Register::DieId)?;
        if die != DIE_ID {
            report.record(SetupFault::WrongDieId { actual: die });
        }

        let written = registers::encode_config(cfg);
        session.write_word(Register::Config, written)?;
        self.clock.sleep(self.settle_time);

        let read = session.read_word(Register::Config)?;
        if read != written {
            report.record(SetupFault::ConfigReadback { written, read });
        }

        if report.is_ok() {
            debug!(config = %format_args!("0x{written:04X}"), "device configured");
        }
        Ok(report)
    }
}

/// Raw manufacturer ID register, for diagnostics.
pub fn manufacturer_id<S: BusTransport>(session: &mut S) -> Result<u16, BusError> {
    session.read_word(Register::ManufacturerId)
}

/// Raw die ID register, for diagnostics.
pub fn die_id<S: BusTransport>(session: &mut S) -> Result<u16, BusError> {
    session.read_word(Register::DieId)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{BusProvider, MockBus};
    use crate::utils::time::MockClock;

    const ADDR: u8 = 0x40;

    fn configurator(clock: &MockClock) -> DeviceConfigurator<'_, MockClock> {
        DeviceConfigurator::new(clock, Duration::from_millis(10))
    }

    #[test]
    fn test_healthy_device_configures_cleanly() {
        let mut bus = MockBus::new();
        bus.add_device(ADDR);
        let clock = MockClock::new(0);
        let mut session = bus.open(ADDR).unwrap();

        let report = configurator(&clock)
            .configure(&mut session, &DeviceConfiguration::default())
            .unwrap();
        assert!(report.is_ok());

        // First write resets, second write configures.
        let writes = bus.writes(ADDR);
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0], (Register::Config, registers::reset_word()));
        assert_eq!(
            writes[1],
            (
                Register::Config,
                registers::encode_config(&DeviceConfiguration::default())
            )
        );
    }

    #[test]
    fn test_settle_time_elapses_between_transactions() {
        let mut bus = MockBus::new();
        bus.add_device(ADDR);
        let clock = MockClock::new(0);
        let mut session = bus.open(ADDR).unwrap();

        configurator(&clock)
            .configure(&mut session, &DeviceConfiguration::default())
            .unwrap();

        // Two settle waits of 10 ms each.
        assert_eq!(clock.now_micros(), 20_000);
    }

    #[test]
    fn test_wrong_manufacturer_id_is_reported() {
        let mut bus = MockBus::new();
        bus.add_device(ADDR);
        bus.set_register(ADDR, Register::ManufacturerId, 0xBEEF);
        let clock = MockClock::new(0);
        let mut session = bus.open(ADDR).unwrap();

        let report = configurator(&clock)
            .configure(&mut session, &DeviceConfiguration::default())
            .unwrap();
        assert_eq!(
            report.faults(),
            &[SetupFault::WrongManufacturerId { actual: 0xBEEF }]
        );
    }

    #[test]
    fn test_all_identity_checks_run_even_after_first_failure() {
        let mut bus = MockBus::new();
        bus.add_device(ADDR);
        bus.set_register(ADDR, Register::ManufacturerId, 0x0000);
        bus.set_register(ADDR, Register::DieId, 0x1111);
        let clock = MockClock::new(0);
        let mut session = bus.open(ADDR).unwrap();

        let report = configurator(&clock)
            .configure(&mut session, &DeviceConfiguration::default())
            .unwrap();
        assert_eq!(report.faults().len(), 2);
        assert!(matches!(
            report.faults()[0],
            SetupFault::WrongManufacturerId { actual: 0x0000 }
        ));
        assert!(matches!(
            report.faults()[1],
            SetupFault::WrongDieId { actual: 0x1111 }
        ));
    }

    #[test]
    fn test_config_readback_mismatch_is_reported() {
        let mut bus = MockBus::new();
        bus.add_device(ADDR);
        // The only config read is the read-back; answer it with a stale word.
        bus.inject_sentinel_read(ADDR, Register::Config, 1);
        let clock = MockClock::new(0);
        let mut session = bus.open(ADDR).unwrap();

        let report = configurator(&clock)
            .configure(&mut session, &DeviceConfiguration::default())
            .unwrap();
        assert_eq!(report.faults().len(), 1);
        assert!(matches!(
            report.faults()[0],
            SetupFault::ConfigReadback { .. }
        ));
    }

    #[test]
    fn test_transport_error_aborts_configuration() {
        let mut bus = MockBus::new();
        bus.add_device(ADDR);
        bus.inject_error_read(ADDR, Register::ManufacturerId, 1);
        let clock = MockClock::new(0);
        let mut session = bus.open(ADDR).unwrap();

        let result = configurator(&clock).configure(&mut session, &DeviceConfiguration::default());
        assert!(matches!(result, Err(BusError::Transport { .. })));
    }

    #[test]
    fn test_raw_id_accessors() {
        let mut bus = MockBus::new();
        bus.add_device(ADDR);
        let mut session = bus.open(ADDR).unwrap();
        assert_eq!(manufacturer_id(&mut session).unwrap(), MANUFACTURER_ID);
        assert_eq!(die_id(&mut session).unwrap(), DIE_ID);
    }
}

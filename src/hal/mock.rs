// src/hal/mock.rs
//! Scripted in-memory bus used by unit and integration tests
//!
//! The mock holds a register file per device address and a fault script:
//! individual reads can be answered with the in-band sentinel or a transport
//! error, counted per register so tests can target "read #3 of the current
//! register". Cloning the provider shares the underlying state, which lets a
//! test keep a handle for scripting and inspection while the scheduler owns
//! the provider.

use crate::hal::{BusError, BusProvider, BusTransport};
use crate::registers::{Register, DIE_ID, MANUFACTURER_ID, SENTINEL_INVALID};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// Power-on value of the config register.
const POR_CONFIG: u16 = 0x6127;

#[derive(Default)]
struct MockDevice {
    registers: HashMap<u8, u16>,
    writes: Vec<(Register, u16)>,
    opens: u32,
    absent: bool,
    read_counts: HashMap<u8, u32>,
    sentinel_reads: HashMap<u8, HashSet<u32>>,
    error_reads: HashMap<u8, HashSet<u32>>,
    sentinel_from: HashMap<u8, u32>,
}

impl MockDevice {
    fn fresh() -> Self {
        let mut registers = HashMap::new();
        registers.insert(u8::from(Register::Config), POR_CONFIG);
        registers.insert(u8::from(Register::ManufacturerId), MANUFACTURER_ID);
        registers.insert(u8::from(Register::DieId), DIE_ID);
        registers.insert(u8::from(Register::Current), 0x0040);
        registers.insert(u8::from(Register::BusVoltage), 0x0FA0);
        registers.insert(u8::from(Register::Power), 0x0064);
        Self {
            registers,
            ..Default::default()
        }
    }
}

#[derive(Default)]
struct MockState {
    devices: HashMap<u8, MockDevice>,
}

/// Shared-state mock bus provider.
#[derive(Clone, Default)]
pub struct MockBus {
    state: Arc<Mutex<MockState>>,
}

impl MockBus {
    /// Create an empty bus with no devices attached.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a well-behaved device with correct identity registers.
    pub fn add_device(&self, address: u8) {
        let mut state = self.state.lock().unwrap();
        state.devices.insert(address, MockDevice::fresh());
    }

    /// Overwrite one register of an attached device.
    pub fn set_register(&self, address: u8, register: Register, value: u16) {
        let mut state = self.state.lock().unwrap();
        state
            .devices
            .entry(address)
            .or_insert_with(MockDevice::fresh)
            .registers
            .insert(register.into(), value);
    }

    /// Make future `open` calls for `address` fail.
    pub fn set_absent(&self, address: u8, absent: bool) {
        let mut state = self.state.lock().unwrap();
        state
            .devices
            .entry(address)
            .or_insert_with(MockDevice::fresh)
            .absent = absent;
    }

    /// Answer the `nth` read (1-based, counted per register) with the
    /// in-band sentinel value.
    pub fn inject_sentinel_read(&self, address: u8, register: Register, nth: u32) {
        let mut state = self.state.lock().unwrap();
        state
            .devices
            .entry(address)
            .or_insert_with(MockDevice::fresh)
            .sentinel_reads
            .entry(register.into())
            .or_default()
            .insert(nth);
    }

    /// Answer every read from the `nth` onward (1-based) with the sentinel.
    pub fn inject_sentinel_reads_from(&self, address: u8, register: Register, nth: u32) {
        let mut state = self.state.lock().unwrap();
        state
            .devices
            .entry(address)
            .or_insert_with(MockDevice::fresh)
            .sentinel_from
            .insert(register.into(), nth);
    }

    /// Answer the `nth` read (1-based) with a transport error.
    pub fn inject_error_read(&self, address: u8, register: Register, nth: u32) {
        let mut state = self.state.lock().unwrap();
        state
            .devices
            .entry(address)
            .or_insert_with(MockDevice::fresh)
            .error_reads
            .entry(register.into())
            .or_default()
            .insert(nth);
    }

    /// Every `(register, value)` write the device has seen, in order.
    pub fn writes(&self, address: u8) -> Vec<(Register, u16)> {
        let state = self.state.lock().unwrap();
        state
            .devices
            .get(&address)
            .map(|d| d.writes.clone())
            .unwrap_or_default()
    }

    /// How many sessions have been opened for `address`.
    pub fn open_count(&self, address: u8) -> u32 {
        let state = self.state.lock().unwrap();
        state.devices.get(&address).map(|d| d.opens).unwrap_or(0)
    }

    /// How many reads of `register` the device has answered.
    pub fn read_count(&self, address: u8, register: Register) -> u32 {
        let state = self.state.lock().unwrap();
        state
            .devices
            .get(&address)
            .and_then(|d| d.read_counts.get(&register.into()).copied())
            .unwrap_or(0)
    }
}

impl BusProvider for MockBus {
    type Session = MockSession;

    fn open(&mut self, address: u8) -> Result<Self::Session, BusError> {
        let mut state = self.state.lock().unwrap();
        match state.devices.get_mut(&address) {
            Some(device) if !device.absent => {
                device.opens += 1;
                Ok(MockSession {
                    state: Arc::clone(&self.state),
                    address,
                })
            }
            Some(_) => Err(BusError::Unreachable {
                address,
                reason: "device marked absent".to_string(),
            }),
            None => Err(BusError::Unreachable {
                address,
                reason: "no such device".to_string(),
            }),
        }
    }
}

/// One open mock session.
pub struct MockSession {
    state: Arc<Mutex<MockState>>,
    address: u8,
}

impl BusTransport for MockSession {
    fn read_word(&mut self, register: Register) -> Result<u16, BusError> {
        let mut state = self.state.lock().unwrap();
        let device = state
            .devices
            .get_mut(&self.address)
            .ok_or(BusError::Transport {
                register,
                reason: "device detached".to_string(),
            })?;

        let key = u8::from(register);
        let count = device.read_counts.entry(key).or_insert(0);
        *count += 1;
        let nth = *count;

        if device
            .error_reads
            .get(&key)
            .is_some_and(|faults| faults.contains(&nth))
        {
            return Err(BusError::Transport {
                register,
                reason: "injected transport fault".to_string(),
            });
        }

        let scripted_sentinel = device
            .sentinel_reads
            .get(&key)
            .is_some_and(|faults| faults.contains(&nth))
            || device.sentinel_from.get(&key).is_some_and(|from| nth >= *from);
        if scripted_sentinel {
            return Ok(SENTINEL_INVALID);
        }

        Ok(device.registers.get(&key).copied().unwrap_or(0))
    }

    fn write_word(&mut self, register: Register, value: u16) -> Result<(), BusError> {
        let mut state = self.state.lock().unwrap();
        let device = state
            .devices
            .get_mut(&self.address)
            .ok_or(BusError::Transport {
                register,
                reason: "device detached".to_string(),
            })?;
        device.writes.push((register, value));
        device.registers.insert(register.into(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_unknown_address_fails() {
        let mut bus = MockBus::new();
        assert!(matches!(
            bus.open(0x40),
            Err(BusError::Unreachable { address: 0x40, .. })
        ));
    }

    #[test]
    fn test_fresh_device_has_correct_identity() {
        let mut bus = MockBus::new();
        bus.add_device(0x40);
        let mut session = bus.open(0x40).unwrap();
        assert_eq!(session.read_word(Register::ManufacturerId).unwrap(), MANUFACTURER_ID);
        assert_eq!(session.read_word(Register::DieId).unwrap(), DIE_ID);
    }

    #[test]
    fn test_write_is_recorded_and_readable() {
        let mut bus = MockBus::new();
        bus.add_device(0x40);
        let mut session = bus.open(0x40).unwrap();
        session.write_word(Register::Config, 0x6001).unwrap();
        assert_eq!(session.read_word(Register::Config).unwrap(), 0x6001);
        assert_eq!(bus.writes(0x40), vec![(Register::Config, 0x6001)]);
    }

    #[test]
    fn test_sentinel_injection_hits_exactly_nth_read() {
        let mut bus = MockBus::new();
        bus.add_device(0x40);
        bus.set_register(0x40, Register::Current, 0x0010);
        bus.inject_sentinel_read(0x40, Register::Current, 2);

        let mut session = bus.open(0x40).unwrap();
        assert_eq!(session.read_word(Register::Current).unwrap(), 0x0010);
        assert_eq!(session.read_word(Register::Current).unwrap(), SENTINEL_INVALID);
        assert_eq!(session.read_word(Register::Current).unwrap(), 0x0010);
        assert_eq!(bus.read_count(0x40, Register::Current), 3);
    }

    #[test]
    fn test_error_injection_returns_transport_error() {
        let mut bus = MockBus::new();
        bus.add_device(0x40);
        bus.inject_error_read(0x40, Register::Current, 1);

        let mut session = bus.open(0x40).unwrap();
        assert!(matches!(
            session.read_word(Register::Current),
            Err(BusError::Transport { .. })
        ));
        assert!(session.read_word(Register::Current).is_ok());
    }

    #[test]
    fn test_open_count_tracks_reopens() {
        let mut bus = MockBus::new();
        bus.add_device(0x40);
        let _first = bus.open(0x40).unwrap();
        let _second = bus.open(0x40).unwrap();
        assert_eq!(bus.open_count(0x40), 2);
    }
}

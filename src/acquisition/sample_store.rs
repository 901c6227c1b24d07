// src/acquisition/sample_store.rs
//! Fixed-capacity arena for raw samples and time offsets
//!
//! Flat layout `sample_index * device_count + device_index`, identical to a
//! binary export of the buffers, behind bounds-checked row/column accessors.
//! Capacity is computed once before the run; nothing reallocates while the
//! sampling loop is live.

use thiserror::Error;

/// One raw register slot.
///
/// Validity is tracked here, out-of-band, instead of reserving a value in
/// the data range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RawReading {
    /// Slot was never written (device unreachable, channel disabled, or
    /// beyond the captured count).
    #[default]
    Missing,
    /// A read failed and was not recovered before the run ended.
    Invalid,
    /// Raw register word as read from the device.
    Valid(u16),
}

impl RawReading {
    /// The raw word, if the slot holds one.
    pub fn value(self) -> Option<u16> {
        match self {
            RawReading::Valid(raw) => Some(raw),
            _ => None,
        }
    }
}

/// Sample store errors.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Up-front buffer allocation failed.
    #[error("failed to allocate sample store for {samples} samples x {devices} devices")]
    Allocation {
        /// Requested sample capacity.
        samples: usize,
        /// Devices per sample.
        devices: usize,
    },

    /// A write addressed a slot outside the allocated arena.
    #[error("sample store index out of bounds: sample {sample}, device {device}")]
    OutOfBounds {
        /// Sample row.
        sample: usize,
        /// Device column.
        device: usize,
    },
}

/// Raw sample buffers for one run.
#[derive(Debug)]
pub struct SampleStore {
    device_count: usize,
    capacity: usize,
    time_offsets_us: Vec<u32>,
    currents: Vec<RawReading>,
    voltages: Vec<RawReading>,
    captured: usize,
}

impl SampleStore {
    /// Allocate buffers for `capacity` samples across `device_count`
    /// devices. Allocation failure is reported, not aborted on, so the
    /// caller can refuse the run before touching any device.
    pub fn new(capacity: usize, device_count: usize) -> Result<Self, StoreError> {
        let slots = capacity.checked_mul(device_count).ok_or(StoreError::Allocation {
            samples: capacity,
            devices: device_count,
        })?;

        let allocation_failed = StoreError::Allocation {
            samples: capacity,
            devices: device_count,
        };

        let mut time_offsets_us = Vec::new();
        time_offsets_us
            .try_reserve_exact(capacity)
            .map_err(|_| allocation_failed.clone())?;
        time_offsets_us.resize(capacity, 0);

        let mut currents = Vec::new();
        currents
            .try_reserve_exact(slots)
            .map_err(|_| allocation_failed.clone())?;
        currents.resize(slots, RawReading::Missing);

        let mut voltages = Vec::new();
        voltages
            .try_reserve_exact(slots)
            .map_err(|_| allocation_failed)?;
        voltages.resize(slots, RawReading::Missing);

        Ok(Self {
            device_count,
            capacity,
            time_offsets_us,
            currents,
            voltages,
            captured: 0,
        })
    }

    /// Number of samples the store can hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Devices per sample row.
    pub fn device_count(&self) -> usize {
        self.device_count
    }

    /// Samples actually captured; always `<= capacity`.
    pub fn captured(&self) -> usize {
        self.captured
    }

    /// Set the captured count, clamped to capacity.
    pub fn set_captured(&mut self, captured: usize) {
        self.captured = captured.min(self.capacity);
    }

    fn index(&self, sample: usize, device: usize) -> Result<usize, StoreError> {
        if sample >= self.capacity || device >= self.device_count {
            return Err(StoreError::OutOfBounds { sample, device });
        }
        Ok(sample * self.device_count + device)
    }

    /// Record the monotonic offset of one sample row.
    pub fn record_offset(&mut self, sample: usize, offset_us: u32) -> Result<(), StoreError> {
        if sample >= self.capacity {
            return Err(StoreError::OutOfBounds { sample, device: 0 });
        }
        self.time_offsets_us[sample] = offset_us;
        Ok(())
    }

    /// Write a current reading slot.
    pub fn set_current(
        &mut self,
        sample: usize,
        device: usize,
        reading: RawReading,
    ) -> Result<(), StoreError> {
        let index = self.index(sample, device)?;
        self.currents[index] = reading;
        Ok(())
    }

    /// Write a voltage reading slot.
    pub fn set_voltage(
        &mut self,
        sample: usize,
        device: usize,
        reading: RawReading,
    ) -> Result<(), StoreError> {
        let index = self.index(sample, device)?;
        self.voltages[index] = reading;
        Ok(())
    }

    /// Current slot at (sample, device); `Missing` when out of bounds.
    pub fn current_at(&self, sample: usize, device: usize) -> RawReading {
        self.index(sample, device)
            .map(|i| self.currents[i])
            .unwrap_or_default()
    }

    /// Voltage slot at (sample, device); `Missing` when out of bounds.
    pub fn voltage_at(&self, sample: usize, device: usize) -> RawReading {
        self.index(sample, device)
            .map(|i| self.voltages[i])
            .unwrap_or_default()
    }

    /// Time offset of one sample row.
    pub fn time_offset_at(&self, sample: usize) -> Option<u32> {
        self.time_offsets_us.get(sample).copied()
    }

    /// Offsets of the captured rows only.
    pub fn time_offsets(&self) -> &[u32] {
        &self.time_offsets_us[..self.captured]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_store_is_all_missing() {
        let store = SampleStore::new(4, 2).unwrap();
        assert_eq!(store.capacity(), 4);
        assert_eq!(store.device_count(), 2);
        assert_eq!(store.captured(), 0);
        for sample in 0..4 {
            for device in 0..2 {
                assert_eq!(store.current_at(sample, device), RawReading::Missing);
                assert_eq!(store.voltage_at(sample, device), RawReading::Missing);
            }
        }
    }

    #[test]
    fn test_flat_indexing_keeps_slots_independent() {
        let mut store = SampleStore::new(3, 2).unwrap();
        store.set_current(1, 0, RawReading::Valid(0x1111)).unwrap();
        store.set_current(1, 1, RawReading::Valid(0x2222)).unwrap();
        store.set_voltage(2, 1, RawReading::Invalid).unwrap();

        assert_eq!(store.current_at(1, 0), RawReading::Valid(0x1111));
        assert_eq!(store.current_at(1, 1), RawReading::Valid(0x2222));
        assert_eq!(store.current_at(0, 0), RawReading::Missing);
        assert_eq!(store.voltage_at(2, 1), RawReading::Invalid);
    }

    #[test]
    fn test_out_of_bounds_writes_are_rejected() {
        let mut store = SampleStore::new(2, 2).unwrap();
        assert!(matches!(
            store.set_current(2, 0, RawReading::Valid(1)),
            Err(StoreError::OutOfBounds { .. })
        ));
        assert!(matches!(
            store.set_voltage(0, 2, RawReading::Valid(1)),
            Err(StoreError::OutOfBounds { .. })
        ));
        assert!(matches!(
            store.record_offset(5, 0),
            Err(StoreError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_captured_is_clamped_to_capacity() {
        let mut store = SampleStore::new(3, 1).unwrap();
        store.set_captured(10);
        assert_eq!(store.captured(), 3);
        store.set_captured(2);
        assert_eq!(store.captured(), 2);
    }

    #[test]
    fn test_time_offsets_expose_captured_rows_only() {
        let mut store = SampleStore::new(4, 1).unwrap();
        for (i, offset) in [0u32, 150, 300, 450].iter().enumerate() {
            store.record_offset(i, *offset).unwrap();
        }
        store.set_captured(2);
        assert_eq!(store.time_offsets(), &[0, 150]);
    }

    #[test]
    fn test_raw_reading_value() {
        assert_eq!(RawReading::Valid(42).value(), Some(42));
        assert_eq!(RawReading::Invalid.value(), None);
        assert_eq!(RawReading::Missing.value(), None);
    }

    #[test]
    fn test_capacity_overflow_is_an_allocation_error() {
        let result = SampleStore::new(usize::MAX, 2);
        assert!(matches!(result, Err(StoreError::Allocation { .. })));
    }
}

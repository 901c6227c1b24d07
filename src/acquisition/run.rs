// src/acquisition/run.rs
//! Finished-run metadata and the export surface
//!
//! After the sampling loop exits, ownership of the sample store passes
//! (read-only) to whoever persists it. [`AcquisitionRun`] carries the run
//! metadata a writer embeds as a header plus an ordered iterator of decoded
//! records.

use crate::acquisition::sample_store::SampleStore;
use crate::registers::{self, DeviceConfiguration};
use std::time::SystemTime;

/// Per-device state, fixed at setup and updated only by recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceStatus {
    /// Setup has not run yet.
    Unconfigured,
    /// Identity verified and configuration read back correctly.
    Reachable,
    /// Setup exhausted its retry budget; skipped for the whole run.
    Unreachable,
}

/// Why the sampling loop exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// All requested samples were captured.
    Completed,
    /// A user stop was requested.
    Stopped,
    /// The run deadline was reached.
    DeadlineReached,
    /// The shared read-retry budget was exhausted.
    BusFailure,
}

/// Address and final status of one device slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceRecord {
    /// 7-bit bus address.
    pub address: u8,
    /// Status at the end of the run.
    pub status: DeviceStatus,
}

/// Metadata of one finished run.
#[derive(Debug, Clone)]
pub struct RunInfo {
    /// Wall-clock time at which sampling started.
    pub started_at: SystemTime,
    /// Configured sampling period in microseconds.
    pub period_us: u32,
    /// Samples the caller asked for.
    pub requested_samples: usize,
    /// Samples actually captured; `<= requested_samples`.
    pub captured_samples: usize,
    /// Why the loop exited.
    pub outcome: RunOutcome,
    /// One entry per configured device, in slot order.
    pub devices: Vec<DeviceRecord>,
}

/// Decoded readings of one device within one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceReading {
    /// 7-bit bus address.
    pub address: u8,
    /// Current in milliamps; `None` when disabled, unreachable, or invalid.
    pub current_ma: Option<i32>,
    /// Bus voltage in millivolts; `None` when disabled, unreachable, or
    /// invalid.
    pub voltage_mv: Option<i32>,
}

/// One exported record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleRecord {
    /// Monotonic offset from run start in microseconds.
    pub time_offset_us: u32,
    /// Readings per device, in slot order.
    pub readings: Vec<DeviceReading>,
}

/// A finished acquisition run: metadata plus the raw buffers.
#[derive(Debug)]
pub struct AcquisitionRun {
    /// Run metadata for the persistence header.
    pub info: RunInfo,
    configuration: DeviceConfiguration,
    store: SampleStore,
}

impl AcquisitionRun {
    pub(crate) fn new(
        info: RunInfo,
        configuration: DeviceConfiguration,
        store: SampleStore,
    ) -> Self {
        Self {
            info,
            configuration,
            store,
        }
    }

    /// Raw buffers, for binary-compatible export.
    pub fn store(&self) -> &SampleStore {
        &self.store
    }

    /// Ordered decoded records, terminated after `captured_samples` entries.
    pub fn records(&self) -> impl Iterator<Item = SampleRecord> + '_ {
        // Mirror of the encoder's fallback: a config that enables nothing
        // was written with the current channel enabled.
        let current_enabled =
            self.configuration.measure_current || !self.configuration.measure_voltage;
        let voltage_enabled = self.configuration.measure_voltage;

        (0..self.info.captured_samples).map(move |sample| SampleRecord {
            time_offset_us: self.store.time_offset_at(sample).unwrap_or(0),
            readings: self
                .info
                .devices
                .iter()
                .enumerate()
                .map(|(slot, device)| DeviceReading {
                    address: device.address,
                    current_ma: if current_enabled {
                        self.store
                            .current_at(sample, slot)
                            .value()
                            .map(registers::decode_current)
                    } else {
                        None
                    },
                    voltage_mv: if voltage_enabled {
                        self.store
                            .voltage_at(sample, slot)
                            .value()
                            .map(registers::decode_voltage)
                    } else {
                        None
                    },
                })
                .collect(),
        })
    }
}

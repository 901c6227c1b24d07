// src/acquisition/scheduler.rs
//! Timed acquisition engine
//!
//! Single-threaded by design: one control flow owns every device session and
//! the sample store's write position for the whole run. The inter-sample
//! wait is a tight spin on the injected monotonic clock, not a sleep;
//! sleep-based delays on a general-purpose scheduler jitter far beyond the
//! sub-millisecond periods this loop has to hold. Stop and deadline flags
//! are polled once per iteration, so cancellation latency is bounded by one
//! sampling period.

use crate::acquisition::run::{AcquisitionRun, DeviceRecord, DeviceStatus, RunInfo, RunOutcome};
use crate::acquisition::sample_store::{RawReading, SampleStore, StoreError};
use crate::acquisition::stop::StopToken;
use crate::config::{AcquisitionConfig, ConfigError};
use crate::device::DeviceConfigurator;
use crate::hal::{BusProvider, BusTransport};
use crate::registers::{DeviceConfiguration, Register, SENTINEL_INVALID};
use crate::utils::time::MonotonicClock;
use std::time::SystemTime;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Failures that prevent a run from starting.
///
/// Everything that happens after the loop starts degrades to a truncated
/// run instead of an error; the captured samples are always handed back.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    /// The configuration cannot produce a run.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The sample store could not be allocated.
    #[error(transparent)]
    Store(#[from] StoreError),
}

struct Slot<S> {
    address: u8,
    status: DeviceStatus,
    session: Option<S>,
}

/// The timed acquisition engine.
///
/// Owns the bus provider, one session slot per configured device, and the
/// injected clock. `run` consumes the engine; sessions never outlive the
/// run they served.
pub struct AcquisitionEngine<P: BusProvider, C: MonotonicClock> {
    provider: P,
    clock: C,
    config: AcquisitionConfig,
    device_config: DeviceConfiguration,
    slots: Vec<Slot<P::Session>>,
}

impl<P: BusProvider, C: MonotonicClock> AcquisitionEngine<P, C> {
    /// Engine for the given bus, clock, and run configuration.
    pub fn new(provider: P, clock: C, config: AcquisitionConfig) -> Self {
        let slots = config
            .addresses
            .iter()
            .map(|&address| Slot {
                address,
                status: DeviceStatus::Unconfigured,
                session: None,
            })
            .collect();
        let device_config = config.device_configuration();
        Self {
            provider,
            clock,
            config,
            device_config,
            slots,
        }
    }

    /// Execute one complete run: validate, allocate, bring up devices,
    /// sample until done or told to stop.
    pub fn run(mut self, token: &StopToken) -> Result<AcquisitionRun, AcquisitionError> {
        self.config.validate()?;

        let requested = self.config.requested_samples();
        let period_us = self.config.period_us();

        // Allocate before any device I/O so an impossible run never touches
        // the bus.
        let mut store = SampleStore::new(requested, self.slots.len())?;

        self.setup_devices();
        if !self
            .slots
            .iter()
            .any(|slot| slot.status == DeviceStatus::Reachable)
        {
            warn!("no reachable devices; run will capture time offsets only");
        }

        let capture_current =
            self.device_config.measure_current || !self.device_config.measure_voltage;
        let capture_voltage = self.device_config.measure_voltage;
        let mut retry_budget = self.config.recovery.read_retry_budget;

        let started_at = SystemTime::now();
        let run_start = self.clock.now_micros();
        let mut deadline = run_start;
        let mut captured = 0usize;
        let mut outcome = RunOutcome::Completed;

        info!(
            requested,
            period_us,
            devices = self.slots.len(),
            "starting acquisition"
        );

        for sample in 0..requested {
            // The first sample goes out immediately; configuration time is
            // the only startup delay.
            if sample > 0 {
                while self.clock.now_micros() < deadline {
                    std::hint::spin_loop();
                }
            }
            let now = self.clock.now_micros();
            deadline = now + u64::from(period_us);
            store.record_offset(sample, (now - run_start) as u32)?;

            let mut fatal_bus_error = false;
            for slot_index in 0..self.slots.len() {
                if self.slots[slot_index].status != DeviceStatus::Reachable {
                    continue;
                }
                if capture_current
                    && !self.capture(slot_index, Register::Current, sample, &mut store, &mut retry_budget)?
                {
                    fatal_bus_error = true;
                    break;
                }
                if capture_voltage
                    && !self.capture(slot_index, Register::BusVoltage, sample, &mut store, &mut retry_budget)?
                {
                    fatal_bus_error = true;
                    break;
                }
            }
            captured = sample + 1;

            // Termination flags, fixed priority order.
            if token.stop_requested() {
                info!(sample, "stop requested; truncating run");
                outcome = RunOutcome::Stopped;
                captured = sample;
                break;
            }
            if token.deadline_reached() {
                info!(sample, "deadline reached; truncating run");
                outcome = RunOutcome::DeadlineReached;
                captured = sample;
                break;
            }
            if fatal_bus_error {
                error!(sample, "unrecoverable bus error; truncating run");
                outcome = RunOutcome::BusFailure;
                captured = sample;
                break;
            }
        }

        store.set_captured(captured);
        self.close_sessions();
        info!(captured, requested, outcome = ?outcome, "acquisition finished");

        let info = RunInfo {
            started_at,
            period_us,
            requested_samples: requested,
            captured_samples: captured,
            outcome,
            devices: self
                .slots
                .iter()
                .map(|slot| DeviceRecord {
                    address: slot.address,
                    status: slot.status,
                })
                .collect(),
        };
        Ok(AcquisitionRun::new(info, self.device_config, store))
    }

    /// Bring every configured device to a known state, retrying with a
    /// fixed backoff; devices that never configure are skipped for the
    /// whole run.
    fn setup_devices(&mut self) {
        let attempts = self.config.recovery.setup_attempts;
        for slot_index in 0..self.slots.len() {
            let address = self.slots[slot_index].address;
            for attempt in 1..=attempts {
                if let Some(session) = self.try_bring_up(address) {
                    debug!(address, attempt, "device configured");
                    self.slots[slot_index].session = Some(session);
                    self.slots[slot_index].status = DeviceStatus::Reachable;
                    break;
                }
                if attempt < attempts {
                    self.clock.sleep(self.config.setup_backoff());
                }
            }
            if self.slots[slot_index].session.is_none() {
                warn!(address, attempts, "device unreachable; skipping for this run");
                self.slots[slot_index].status = DeviceStatus::Unreachable;
            }
        }
    }

    /// One open-and-configure attempt. Failures are logged, not propagated;
    /// the caller owns the retry policy.
    fn try_bring_up(&mut self, address: u8) -> Option<P::Session> {
        let mut session = match self.provider.open(address) {
            Ok(session) => session,
            Err(err) => {
                warn!(address, %err, "failed to open bus session");
                return None;
            }
        };
        let configurator = DeviceConfigurator::new(&self.clock, self.config.settle_time());
        match configurator.configure(&mut session, &self.device_config) {
            Ok(report) if report.is_ok() => Some(session),
            Ok(report) => {
                for fault in report.faults() {
                    warn!(address, %fault, "device setup fault");
                }
                None
            }
            Err(err) => {
                warn!(address, %err, "transport error during setup");
                None
            }
        }
    }

    /// Read one register into the store, recovering from transient faults.
    ///
    /// Returns `Ok(false)` when the shared retry budget is exhausted; the
    /// caller treats that as fatal for the run.
    fn capture(
        &mut self,
        slot_index: usize,
        register: Register,
        sample: usize,
        store: &mut SampleStore,
        retry_budget: &mut u32,
    ) -> Result<bool, StoreError> {
        let address = self.slots[slot_index].address;
        let mut faulted = false;
        loop {
            let attempt = match self.slots[slot_index].session.as_mut() {
                Some(session) => session.read_word(register),
                None => Err(crate::hal::BusError::Unreachable {
                    address,
                    reason: "no open session".to_string(),
                }),
            };
            match attempt {
                Ok(raw) if raw != SENTINEL_INVALID => {
                    Self::write_slot(store, register, sample, slot_index, RawReading::Valid(raw))?;
                    return Ok(true);
                }
                Ok(_) => {
                    warn!(address, ?register, sample, "read returned the invalid sentinel");
                }
                Err(err) => {
                    warn!(address, ?register, sample, %err, "read failed");
                }
            }
            if !faulted {
                faulted = true;
                Self::write_slot(store, register, sample, slot_index, RawReading::Invalid)?;
            }
            if *retry_budget == 0 {
                error!(address, "shared read-retry budget exhausted");
                self.slots[slot_index].status = DeviceStatus::Unreachable;
                return Ok(false);
            }
            *retry_budget -= 1;
            self.recover(slot_index);
        }
    }

    /// Route one reading to the store slot its register belongs to.
    /// Registers the scheduler never samples are ignored.
    fn write_slot(
        store: &mut SampleStore,
        register: Register,
        sample: usize,
        device: usize,
        reading: RawReading,
    ) -> Result<(), StoreError> {
        match register {
            Register::Current => store.set_current(sample, device, reading),
            Register::BusVoltage => store.set_voltage(sample, device, reading),
            _ => Ok(()),
        }
    }

    /// Transient-error recovery: discard the handle, re-open, re-run the
    /// configuration state machine. Blocks the whole loop until it resolves
    /// or the budget runs out; all devices share the one bus anyway.
    fn recover(&mut self, slot_index: usize) {
        let address = self.slots[slot_index].address;
        info!(address, "recovering device: reopening session and reconfiguring");
        // The stale handle must never be used again.
        self.slots[slot_index].session = None;
        let session = match self.provider.open(address) {
            Ok(session) => session,
            Err(err) => {
                warn!(address, %err, "reopen failed");
                return;
            }
        };
        let mut session = session;
        let configurator = DeviceConfigurator::new(&self.clock, self.config.settle_time());
        match configurator.configure(&mut session, &self.device_config) {
            Ok(report) => {
                if !report.is_ok() {
                    warn!(
                        address,
                        faults = report.faults().len(),
                        "reconfiguration reported faults"
                    );
                }
                self.slots[slot_index].session = Some(session);
            }
            Err(err) => {
                warn!(address, %err, "reconfiguration failed");
            }
        }
    }

    fn close_sessions(&mut self) {
        for slot in &mut self.slots {
            if let Some(session) = slot.session.take() {
                if let Err(err) = session.close() {
                    warn!(address = slot.address, %err, "failed to close bus session");
                }
            }
        }
    }
}

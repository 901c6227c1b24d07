// src/acquisition/mod.rs
//! Timed sample acquisition: scheduler, sample store, run results

pub mod run;
pub mod sample_store;
pub mod scheduler;
pub mod stop;

pub use run::{
    AcquisitionRun, DeviceReading, DeviceRecord, DeviceStatus, RunInfo, RunOutcome, SampleRecord,
};
pub use sample_store::{RawReading, SampleStore, StoreError};
pub use scheduler::{AcquisitionEngine, AcquisitionError};
pub use stop::StopToken;

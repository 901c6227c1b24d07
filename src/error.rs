// src/error.rs
//! Crate-level error type
//!
//! Each layer keeps its own error enum; this umbrella exists so binaries and
//! integration code can carry one type through `?` without mapping at every
//! boundary.

use thiserror::Error;

/// Any failure the crate can report.
#[derive(Debug, Error)]
pub enum Error {
    /// Bus transport failure.
    #[error(transparent)]
    Bus(#[from] crate::hal::BusError),

    /// Configuration loading or validation failure.
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    /// Acquisition run could not start.
    #[error(transparent)]
    Acquisition(#[from] crate::acquisition::AcquisitionError),

    /// Sample store failure.
    #[error(transparent)]
    Store(#[from] crate::acquisition::StoreError),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }

    #[test]
    fn test_bus_error_converts() {
        let bus = crate::hal::BusError::Unreachable {
            address: 0x40,
            reason: "no ack".to_string(),
        };
        let err: Error = bus.into();
        assert!(matches!(err, Error::Bus(_)));
    }
}

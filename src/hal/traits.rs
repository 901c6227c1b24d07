// src/hal/traits.rs
//! Transport traits the protocol layer calls into
//!
//! A [`BusProvider`] opens sessions bound to a 7-bit device address; a
//! [`BusTransport`] performs 16-bit register transactions on one open
//! session. The acquisition scheduler owns sessions exclusively and re-opens
//! them through the provider when recovering from a transient failure.

use crate::registers::Register;
use thiserror::Error;

/// Transport-level failures.
#[derive(Debug, Clone, Error)]
pub enum BusError {
    /// The device did not respond to an open/bind attempt.
    #[error("device 0x{address:02x} is unreachable: {reason}")]
    Unreachable {
        /// 7-bit device address.
        address: u8,
        /// Transport-specific detail.
        reason: String,
    },

    /// A register transaction failed on an open session.
    #[error("transport error on register {register:?}: {reason}")]
    Transport {
        /// Register the transaction addressed.
        register: Register,
        /// Transport-specific detail.
        reason: String,
    },
}

/// One open bus session, bound to a single device address.
///
/// Words passed through this trait are in host order; the wire byte order is
/// the codec's concern (`registers::from_wire` / `registers::to_wire`).
pub trait BusTransport {
    /// Read a 16-bit register.
    fn read_word(&mut self, register: Register) -> Result<u16, BusError>;

    /// Write a 16-bit register.
    fn write_word(&mut self, register: Register, value: u16) -> Result<(), BusError>;

    /// Release the session. Implementations also release on drop; this
    /// exists for callers that want the failure surfaced.
    fn close(self) -> Result<(), BusError>
    where
        Self: Sized,
    {
        Ok(())
    }
}

/// Factory for bus sessions.
pub trait BusProvider {
    /// Session type produced by this provider.
    type Session: BusTransport;

    /// Open a session bound to `address`.
    fn open(&mut self, address: u8) -> Result<Self::Session, BusError>;
}

//! Transport layer for EL406 instruments
//!
//! Provides USB-serial communication with instruments, plus an in-memory
//! mock for driving the protocol stack in tests.

pub mod error;
pub mod mock;
pub mod serial;

pub use error::{Error, Result};
pub use mock::MockTransport;
pub use serial::{list_ports, PortInfo, SerialTransport};

use async_trait::async_trait;
use bytes::BytesMut;

/// Transport trait for different communication methods
///
/// Reads block until the requested bytes arrive or the link fails.
/// Callers are expected to bound them with their own deadline.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Connect to instrument
    async fn connect(&mut self) -> Result<()>;

    /// Disconnect from instrument
    async fn disconnect(&mut self) -> Result<()>;

    /// Check if connected
    fn is_connected(&self) -> bool;

    /// Send raw bytes
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Read a single byte
    async fn read_byte(&mut self) -> Result<u8>;

    /// Read exactly `len` bytes
    async fn read_exact(&mut self, len: usize) -> Result<BytesMut>;

    /// Get a human readable name for the underlying port
    fn descriptor(&self) -> String;
}

//! High-level error types

use std::time::Duration;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Core protocol error: {0}")]
    Core(#[from] el406_core::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] el406_transport::Error),

    #[error("Type error: {0}")]
    Types(#[from] el406_types::Error),

    #[error("Device not connected")]
    NotConnected,

    #[error("Timed out after {timeout:?} waiting for {operation}")]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },

    #[error("Device rejected command (NAK)")]
    Nak,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid response from device: {0}")]
    InvalidResponse(String),
}

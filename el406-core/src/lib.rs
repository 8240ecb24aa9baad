//! # el406-core
//!
//! Core protocol implementation for the BioTek EL406 washer dispenser.
//!
//! This crate provides the low-level protocol primitives:
//! - Frame structure and encoding/decoding
//! - Checksum calculation
//! - Command definitions
//! - Mask and selection encoders
//! - Protocol constants

pub mod checksum;
pub mod command;
pub mod constants;
pub mod encode;
pub mod error;
pub mod frame;
pub mod session;

pub use command::Command;
pub use error::{Error, Result};
pub use frame::{Frame, ReplyHeader};
pub use session::Session;

/// Frame header size
pub const HEADER_SIZE: usize = 11;

/// Maximum payload a frame length field can declare
pub const MAX_PAYLOAD_SIZE: usize = 65535;

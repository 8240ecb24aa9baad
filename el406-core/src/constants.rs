//! Protocol constants

use std::time::Duration;

/// Positive acknowledgement byte
pub const ACK: u8 = 0x06;

/// Negative acknowledgement byte, the device refused the command
pub const NAK: u8 = 0x15;

/// Software flow-control bytes. The device interleaves these with
/// replies and they carry no protocol meaning.
pub const XON: u8 = 0x11;
pub const XOFF: u8 = 0x13;

/// First header byte of every frame
pub const START_MARKER: u8 = 0x01;

/// Second header byte of every frame
pub const VERSION_MARKER: u8 = 0x02;

/// Constant byte at header offset 4
pub const HEADER_CONSTANT: u8 = 0x01;

/// Serial line speed
pub const BAUD_RATE: u32 = 38400;

/// Default reply timeout
pub const READ_TIMEOUT: Duration = Duration::from_secs(15);

/// Default write timeout
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Reply timeout for long operations (reset, self-check)
pub const LONG_READ_TIMEOUT: Duration = Duration::from_secs(120);

/// Reply timeout for the end-of-batch marker
pub const END_OF_BATCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Reply timeout for motor homing and verification
pub const HOMING_TIMEOUT: Duration = Duration::from_secs(120);

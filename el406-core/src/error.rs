//! Error types for el406-core

/// Result type alias for core protocol operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core protocol errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Reply header is too short to be valid
    #[error("Reply header too short: expected {expected} bytes, got {actual} bytes")]
    HeaderTooShort {
        expected: usize,
        actual: usize,
    },

    /// Reply header marker byte does not match the frame layout
    #[error("Bad reply header marker at offset {offset}: expected 0x{expected:02X}, got 0x{actual:02X}")]
    BadHeaderMarker {
        offset: usize,
        expected: u8,
        actual: u8,
    },

    /// Declared data length does not match the bytes present
    #[error("Frame length mismatch: header declares {declared} data bytes, got {actual}")]
    LengthMismatch {
        declared: usize,
        actual: usize,
    },

    /// Frame checksum does not cancel the byte sum
    #[error("Checksum mismatch: expected 0x{expected:04X}, got 0x{actual:04X}")]
    ChecksumMismatch {
        expected: u16,
        actual: u16,
    },

    /// Unknown command code
    #[error("Unknown command code: 0x{0:04X}")]
    UnknownCommand(u16),

    /// Well index outside the 48-bit mask
    #[error("Well index {0} out of range. Must be 0-47.")]
    WellIndexOutOfRange(u8),

    /// Column number outside the plate format
    #[error("Column {column} out of range. Must be 1-{max_columns}.")]
    ColumnOutOfRange {
        column: u8,
        max_columns: u8,
    },

    /// Row group outside the plate format
    #[error("Row {row} out of range. Must be 1-{row_groups}.")]
    RowOutOfRange {
        row: u8,
        row_groups: u8,
    },

    /// Invalid session state transition
    #[error("Invalid session state: {0}")]
    InvalidSessionState(String),
}

//! EL406 frame checksum
//!
//! The checksum is the two's complement of the byte sum over the first
//! nine header bytes and the data:
//! 1. Sum the header prefix bytes (offsets 0 through 8)
//! 2. Add every data byte
//! 3. Checksum = (0xFFFF - sum + 1) & 0xFFFF
//!
//! Adding the checksum value back to the sum always yields zero
//! modulo 0x10000.

use tracing::trace;

/// Calculate the checksum over a header prefix and data.
///
/// # Algorithm
///
/// ```text
/// 1. sum = header_prefix[0] + ... + header_prefix[8] + data[0] + ...
/// 2. checksum = (0x10000 - sum) mod 0x10000
/// ```
///
/// # Examples
///
/// ```
/// use el406_core::checksum;
///
/// // TEST_COMM header prefix with no data
/// let prefix = [0x01, 0x02, 0x73, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00];
/// assert_eq!(checksum::calculate(&prefix, &[]), 0xFF89);
/// ```
pub fn calculate(header_prefix: &[u8], data: &[u8]) -> u16 {
    let mut sum: u32 = 0;

    for &byte in header_prefix.iter().chain(data.iter()) {
        sum = sum.wrapping_add(byte as u32);
    }

    let checksum = (sum as u16).wrapping_neg();

    trace!(
        prefix_len = header_prefix.len(),
        data_len = data.len(),
        checksum = format!("0x{:04X}", checksum),
        "Calculated checksum"
    );

    checksum
}

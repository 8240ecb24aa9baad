//! EL406 frame structure and encoding/decoding

use std::fmt;

use byteorder::{ByteOrder, LittleEndian};
use bytes::{BufMut, Bytes, BytesMut};
use tracing::trace;

use crate::{
    checksum,
    command::Command,
    constants::{START_MARKER, VERSION_MARKER},
    error::{Error, Result},
};

/// Outbound EL406 frame
///
/// # Frame Structure
///
/// ```text
/// ┌──────┬──────┬─────────┬──────┬──────────┬─────────┬──────────┬────────┐
/// │ 0x01 │ 0x02 │ Command │ 0x01 │ 0x00 00  │ DataLen │ Checksum │  Data  │
/// │  [0] │  [1] │  [2-3]  │  [4] │  [5-6]   │  [7-8]  │  [9-10]  │   [N]  │
/// └──────┴──────┴─────────┴──────┴──────────┴─────────┴──────────┴────────┘
/// ```
///
/// Command, length and checksum are little-endian u16. The checksum
/// covers header bytes 0 through 8 plus the data.
///
/// # Examples
///
/// ```
/// use el406_core::{Command, Frame};
///
/// let frame = Frame::new(Command::TestComm);
/// let bytes = frame.encode();
/// assert_eq!(bytes.len(), 11);
/// assert_eq!(&bytes[..4], &[0x01, 0x02, 0x73, 0x00]);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    /// Command code
    pub command: Command,

    /// Command-specific data
    pub data: Bytes,
}

impl Frame {
    /// Frame header size in bytes
    pub const HEADER_SIZE: usize = 11;

    /// Create a frame with no data
    pub fn new(command: Command) -> Self {
        Self {
            command,
            data: Bytes::new(),
        }
    }

    /// Create a frame carrying data
    ///
    /// # Examples
    ///
    /// ```
    /// use el406_core::{Command, Frame};
    ///
    /// let frame = Frame::with_data(Command::Abort, vec![0x06]);
    /// assert_eq!(frame.data.len(), 1);
    /// ```
    pub fn with_data(command: Command, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        debug_assert!(data.len() <= u16::MAX as usize);

        Self { command, data }
    }

    /// First nine header bytes, the checksum input.
    fn header_prefix(&self) -> [u8; 9] {
        let [cmd_lo, cmd_hi] = self.command.code().to_le_bytes();
        let [len_lo, len_hi] = (self.data.len() as u16).to_le_bytes();

        [
            START_MARKER,
            VERSION_MARKER,
            cmd_lo,
            cmd_hi,
            0x01,
            0x00,
            0x00,
            len_lo,
            len_hi,
        ]
    }

    /// Checksum for this frame
    pub fn checksum(&self) -> u16 {
        checksum::calculate(&self.header_prefix(), &self.data)
    }

    /// Encode the frame to wire bytes
    ///
    /// # Examples
    ///
    /// ```
    /// use el406_core::{Command, Frame};
    ///
    /// let bytes = Frame::new(Command::TestComm).encode();
    /// // Header checksum at [9-10], little-endian
    /// assert_eq!(&bytes[9..], &[0x89, 0xFF]);
    /// ```
    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(Self::HEADER_SIZE + self.data.len());

        buf.put_slice(&self.header_prefix());
        buf.put_u16_le(self.checksum());
        buf.put_slice(&self.data);

        trace!(
            command = %self.command,
            frame = %hex::encode(&buf),
            "Encoded frame"
        );

        buf
    }

    /// Total encoded size
    pub fn size(&self) -> usize {
        Self::HEADER_SIZE + self.data.len()
    }

    /// Decode a complete frame, verifying structure and checksum
    ///
    /// The inverse of [`Frame::encode`]. Device replies do not pass
    /// here (their checksum field is unreliable, see [`ReplyHeader`]);
    /// this is for frames produced by this crate, captures and tests.
    ///
    /// # Errors
    ///
    /// Returns an error on a short buffer, wrong marker byte, length
    /// field not matching the bytes present, checksum mismatch or an
    /// unknown command code.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < Self::HEADER_SIZE {
            return Err(Error::HeaderTooShort {
                expected: Self::HEADER_SIZE,
                actual: buf.len(),
            });
        }
        for (offset, expected) in [(0, START_MARKER), (1, VERSION_MARKER), (4, 0x01)] {
            if buf[offset] != expected {
                return Err(Error::BadHeaderMarker {
                    offset,
                    expected,
                    actual: buf[offset],
                });
            }
        }

        let declared = LittleEndian::read_u16(&buf[7..9]) as usize;
        let actual = buf.len() - Self::HEADER_SIZE;
        if declared != actual {
            return Err(Error::LengthMismatch { declared, actual });
        }

        let expected = checksum::calculate(&buf[..9], &buf[Self::HEADER_SIZE..]);
        let received = LittleEndian::read_u16(&buf[9..11]);
        if received != expected {
            return Err(Error::ChecksumMismatch {
                expected,
                actual: received,
            });
        }

        let command = Command::try_from(LittleEndian::read_u16(&buf[2..4]))?;
        Ok(Self {
            command,
            data: Bytes::copy_from_slice(&buf[Self::HEADER_SIZE..]),
        })
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("command", &self.command)
            .field("checksum", &format!("0x{:04X}", self.checksum()))
            .field("data_len", &self.data.len())
            .finish()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frame[{}](len={})", self.command, self.data.len())
    }
}

/// Parsed reply frame header
///
/// Replies reuse the outbound header layout. Only the two marker bytes
/// are validated: firmware zero-fills the command and checksum fields
/// in completion replies, so neither is checked against the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyHeader {
    /// Command field as received, often zero
    pub command: u16,

    /// Data length the device is about to send
    pub data_len: u16,

    /// Checksum field as received, often zero
    pub checksum: u16,
}

impl ReplyHeader {
    /// Parse an 11-byte reply header
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer is shorter than 11 bytes or a
    /// marker byte does not match.
    pub fn parse(buf: &[u8]) -> Result<Self> {
        if buf.len() < Frame::HEADER_SIZE {
            return Err(Error::HeaderTooShort {
                expected: Frame::HEADER_SIZE,
                actual: buf.len(),
            });
        }

        if buf[0] != START_MARKER {
            return Err(Error::BadHeaderMarker {
                offset: 0,
                expected: START_MARKER,
                actual: buf[0],
            });
        }
        if buf[1] != VERSION_MARKER {
            return Err(Error::BadHeaderMarker {
                offset: 1,
                expected: VERSION_MARKER,
                actual: buf[1],
            });
        }

        Ok(Self {
            command: LittleEndian::read_u16(&buf[2..4]),
            data_len: LittleEndian::read_u16(&buf[7..9]),
            checksum: LittleEndian::read_u16(&buf[9..11]),
        })
    }
}

//! High-level driver interface

use std::time::Duration;

use bytes::Bytes;
use tracing::{info, trace, warn};

use el406_core::constants::{ACK, NAK, READ_TIMEOUT, WRITE_TIMEOUT, XOFF, XON};
use el406_core::{Command, Frame, ReplyHeader, Session, HEADER_SIZE};
use el406_transport::{SerialTransport, Transport};

use crate::error::{Error, Result};

/// EL406 washer dispenser
///
/// High-level interface for driving a BioTek EL406 over its USB-serial
/// link. Commands run one at a time through a `&mut` receiver; step
/// commands wrap themselves in a batch unless one is already open.
///
/// # Examples
///
/// ```no_run
/// use el406::{El406, PlateFormat, WashParams};
///
/// #[tokio::main]
/// async fn main() -> el406::Result<()> {
///     let mut device = El406::new("/dev/ttyUSB0");
///
///     device.setup().await?;
///     println!("Connected to {}", device.descriptor());
///
///     device
///         .manifold_wash(PlateFormat::Well96, &WashParams::default())
///         .await?;
///
///     device.stop().await?;
///     Ok(())
/// }
/// ```
pub struct El406 {
    transport: Box<dyn Transport>,
    pub(crate) session: Session,
    timeout: Duration,
}

impl El406 {
    /// Create a new driver for a serial port path
    pub fn new(path: impl Into<String>) -> Self {
        Self::with_transport(Box::new(SerialTransport::new(path)))
    }

    /// Create a new driver over an already constructed transport
    pub fn with_transport(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            session: Session::new(),
            timeout: READ_TIMEOUT,
        }
    }

    /// Set the default reply timeout
    ///
    /// Long running operations (reset, homing, washes) add their own
    /// margins on top of this.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check if connected
    pub fn is_connected(&self) -> bool {
        self.session.is_open() && self.transport.is_connected()
    }

    /// Human readable name of the underlying port
    pub fn descriptor(&self) -> String {
        self.transport.descriptor()
    }

    /// Default reply timeout for ordinary commands
    pub(crate) fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Connect to the instrument
    ///
    /// Opens the port, verifies communication with a test frame, and
    /// resets the instrument's protocol state machine. On failure the
    /// port is closed again.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The port cannot be opened
    /// - The instrument does not answer the communication test
    pub async fn setup(&mut self) -> Result<()> {
        info!("Connecting to {}...", self.transport.descriptor());

        self.transport.connect().await?;
        self.session.open()?;

        if let Err(e) = self.handshake().await {
            warn!("Setup failed: {}", e);
            self.session.close();
            if let Err(close_err) = self.transport.disconnect().await {
                warn!("Failed to close port after setup failure: {}", close_err);
            }
            return Err(e);
        }

        info!("Connected to {}", self.transport.descriptor());
        Ok(())
    }

    async fn handshake(&mut self) -> Result<()> {
        self.exchange(&Frame::new(Command::TestComm), self.timeout)
            .await?;
        self.exchange(&Frame::new(Command::InitState), self.timeout)
            .await?;
        Ok(())
    }

    /// Disconnect from the instrument
    ///
    /// Safe to call when already disconnected.
    pub async fn stop(&mut self) -> Result<()> {
        if !self.transport.is_connected() {
            self.session.close();
            return Ok(());
        }

        info!("Disconnecting from {}...", self.transport.descriptor());

        self.transport.disconnect().await?;
        self.session.close();

        info!("Disconnected");
        Ok(())
    }

    /// Check whether the port at `path` carries a responding instrument
    ///
    /// Opens the port, sends a single communication test frame, and
    /// reports whether a well formed answer came back. Never returns an
    /// error; any failure reads as `false`.
    pub async fn test_port(path: impl Into<String>) -> bool {
        let mut device = Self::new(path);
        device.probe().await
    }

    pub(crate) async fn probe(&mut self) -> bool {
        let result = self.probe_inner().await;
        if let Err(e) = &result {
            trace!("Probe failed: {}", e);
        }
        if self.transport.is_connected() {
            if let Err(e) = self.transport.disconnect().await {
                warn!("Failed to close probed port: {}", e);
            }
        }
        self.session.close();
        result.is_ok()
    }

    async fn probe_inner(&mut self) -> Result<Bytes> {
        self.transport.connect().await?;
        self.session.open()?;
        self.exchange(&Frame::new(Command::TestComm), self.timeout)
            .await
    }

    // Protocol plumbing

    pub(crate) fn ensure_connected(&self) -> Result<()> {
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }
        Ok(())
    }

    /// Send a frame and wait for its completion reply
    ///
    /// Returns the reply payload, empty for plain acknowledgements. The
    /// whole reply must arrive within `timeout`.
    pub(crate) async fn exchange(&mut self, frame: &Frame, timeout: Duration) -> Result<Bytes> {
        self.ensure_connected()?;
        self.session.begin_command()?;
        let result = self.exchange_inner(frame, timeout).await;
        self.session.end_command();
        result
    }

    async fn exchange_inner(&mut self, frame: &Frame, timeout: Duration) -> Result<Bytes> {
        let encoded = frame.encode();

        tokio::time::timeout(WRITE_TIMEOUT, self.transport.send(&encoded))
            .await
            .map_err(|_| Error::Timeout {
                operation: frame.command.name(),
                timeout: WRITE_TIMEOUT,
            })??;

        tokio::time::timeout(timeout, self.read_reply(frame.command))
            .await
            .map_err(|_| Error::Timeout {
                operation: frame.command.name(),
                timeout,
            })?
    }

    /// Read one reply: scan to the ACK, then header, then payload
    async fn read_reply(&mut self, command: Command) -> Result<Bytes> {
        loop {
            let byte = self.transport.read_byte().await?;
            match byte {
                ACK => break,
                NAK => {
                    warn!("{} rejected by instrument (NAK)", command);
                    return Err(Error::Nak);
                }
                XON | XOFF => trace!("Flow control byte 0x{:02X}", byte),
                other => trace!("Skipping byte 0x{:02X} while waiting for ACK", other),
            }
        }

        let header_bytes = self.transport.read_exact(HEADER_SIZE).await?;
        let header = ReplyHeader::parse(&header_bytes)?;

        let data = if header.data_len > 0 {
            self.transport
                .read_exact(header.data_len as usize)
                .await?
                .freeze()
        } else {
            Bytes::new()
        };

        trace!("{} completed, {} payload bytes", command, data.len());
        Ok(data)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use el406_transport::MockTransport;

    pub(crate) fn mock_device() -> (El406, MockTransport) {
        let mock = MockTransport::new();
        let device = El406::with_transport(Box::new(mock.clone()));
        (device, mock)
    }

    pub(crate) async fn connected_device() -> (El406, MockTransport) {
        let (mut device, mock) = mock_device();
        mock.queue_acks(2);
        device.setup().await.unwrap();
        mock.take_sent();
        (device, mock)
    }

    #[test]
    fn test_device_create() {
        let device = El406::new("/dev/ttyUSB0");
        assert!(!device.is_connected());
        assert_eq!(device.descriptor(), "/dev/ttyUSB0");
    }

    #[tokio::test]
    async fn test_setup_runs_handshake() {
        let (mut device, mock) = mock_device();
        mock.queue_acks(2);

        device.setup().await.unwrap();
        assert!(device.is_connected());

        let sent = mock.sent();
        assert_eq!(sent.len(), 2);
        // Communication test frame, byte for byte
        assert_eq!(
            sent[0],
            [0x01, 0x02, 0x73, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x89, 0xFF]
        );
        // Followed by the state machine reset
        assert_eq!(sent[1][2..4], [0xA0, 0x00]);
        assert_eq!(mock.unread(), 0);
    }

    #[tokio::test]
    async fn test_setup_failure_closes_port() {
        let (mut device, mock) = mock_device();
        mock.queue_bytes(&[NAK]);

        let err = device.setup().await.unwrap_err();
        assert!(matches!(err, Error::Nak));
        assert!(!device.is_connected());
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let (mut device, mock) = mock_device();
        mock.queue_acks(2);

        device.setup().await.unwrap();
        device.stop().await.unwrap();
        assert!(!device.is_connected());

        device.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_commands_require_connection() {
        let (mut device, _mock) = mock_device();
        let err = device.pause().await.unwrap_err();
        assert!(matches!(err, Error::NotConnected));
    }

    #[tokio::test]
    async fn test_reply_scan_skips_noise() {
        let (mut device, mock) = connected_device().await;

        mock.queue_bytes(&[XON, 0x55, XOFF]);
        mock.queue_acks(1);

        device.pause().await.unwrap();
        assert_eq!(mock.unread(), 0);
    }

    #[tokio::test]
    async fn test_nak_maps_to_error() {
        let (mut device, mock) = connected_device().await;

        mock.queue_bytes(&[NAK]);
        let err = device.pause().await.unwrap_err();
        assert!(matches!(err, Error::Nak));
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_instrument_times_out() {
        let (mut device, mock) = connected_device().await;

        let err = device.pause().await.unwrap_err();
        match err {
            Error::Timeout { operation, timeout } => {
                assert_eq!(operation, "PAUSE");
                assert_eq!(timeout, READ_TIMEOUT);
            }
            other => panic!("expected timeout, got {:?}", other),
        }

        // The driver stays usable after a timeout
        mock.queue_acks(1);
        device.pause().await.unwrap();
    }

    #[tokio::test]
    async fn test_probe_reports_responding_port() {
        let mock = MockTransport::new();
        mock.queue_acks(1);
        let mut device = El406::with_transport(Box::new(mock.clone()));

        assert!(device.probe().await);
        assert!(!device.is_connected());

        let sent = mock.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0][2], 0x73);
    }

    #[tokio::test]
    async fn test_probe_reports_refusal_as_dead_port() {
        let mock = MockTransport::new();
        mock.queue_bytes(&[NAK]);
        let mut device = El406::with_transport(Box::new(mock.clone()));

        assert!(!device.probe().await);
    }

    // Integration tests require a real instrument

    #[tokio::test]
    #[ignore] // Only run with a connected instrument
    async fn test_device_setup() {
        let mut device = El406::new("/dev/ttyUSB0");

        device.setup().await.unwrap();
        assert!(device.is_connected());

        device.stop().await.unwrap();
        assert!(!device.is_connected());
    }

    #[tokio::test]
    #[ignore] // Only run with a connected instrument
    async fn test_port_probe() {
        assert!(El406::test_port("/dev/ttyUSB0").await);
    }
}

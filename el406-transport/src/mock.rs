//! In-memory transport for tests
//!
//! Plays back scripted reply bytes and records everything written, so the
//! protocol stack can run without an instrument attached.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::{BufMut, BytesMut};
use parking_lot::Mutex;

use el406_core::constants::{ACK, HEADER_CONSTANT, START_MARKER, VERSION_MARKER};
use el406_core::HEADER_SIZE;

use crate::{error::*, Transport};

const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Scripted in-memory transport
///
/// Clones share the same buffers, so a test can keep one handle for
/// queueing replies and inspecting writes while the device owns another.
///
/// Reads on an empty buffer wait for more bytes; pair them with a
/// deadline (`tokio::time::timeout`) when testing timeout paths.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<MockState>,
}

#[derive(Default)]
struct MockState {
    connected: AtomicBool,
    reads: Mutex<VecDeque<u8>>,
    sent: Mutex<Vec<Vec<u8>>>,
}

/// Reply header with the given data length. Command echo and checksum
/// stay zeroed, as in real completion frames captured from hardware.
fn reply_header(data_len: u16) -> [u8; HEADER_SIZE] {
    let mut header = [0u8; HEADER_SIZE];
    header[0] = START_MARKER;
    header[1] = VERSION_MARKER;
    header[4] = HEADER_CONSTANT;
    header[7..9].copy_from_slice(&data_len.to_le_bytes());
    header
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `count` completion frames (ACK plus empty reply header)
    pub fn queue_acks(&self, count: usize) {
        let mut reads = self.state.reads.lock();
        for _ in 0..count {
            reads.push_back(ACK);
            reads.extend(reply_header(0));
        }
    }

    /// Queue a query reply carrying `data`
    ///
    /// The frame is ACK, a reply header, then the two status bytes the
    /// instrument prefixes to every query payload, then `data`.
    pub fn queue_reply(&self, data: &[u8]) {
        let payload_len = data.len() + 2;
        let mut reads = self.state.reads.lock();
        reads.push_back(ACK);
        reads.extend(reply_header(payload_len as u16));
        reads.push_back(0x01);
        reads.push_back(0x00);
        reads.extend(data.iter().copied());
    }

    /// Queue a completion frame whose payload is exactly `payload`
    pub fn queue_frame(&self, payload: &[u8]) {
        let mut reads = self.state.reads.lock();
        reads.push_back(ACK);
        reads.extend(reply_header(payload.len() as u16));
        reads.extend(payload.iter().copied());
    }

    /// Queue raw bytes with no framing
    pub fn queue_bytes(&self, bytes: &[u8]) {
        self.state.reads.lock().extend(bytes.iter().copied());
    }

    /// Number of unread bytes left in the reply buffer
    pub fn unread(&self) -> usize {
        self.state.reads.lock().len()
    }

    /// All writes so far, one entry per `send` call
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.state.sent.lock().clone()
    }

    /// Drain and return the writes recorded so far
    pub fn take_sent(&self) -> Vec<Vec<u8>> {
        std::mem::take(&mut *self.state.sent.lock())
    }

    /// The most recent write, if any
    pub fn last_sent(&self) -> Option<Vec<u8>> {
        self.state.sent.lock().last().cloned()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&mut self) -> Result<()> {
        if self.state.connected.swap(true, Ordering::AcqRel) {
            return Err(Error::AlreadyConnected);
        }
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.state.connected.store(false, Ordering::Release);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.state.connected.load(Ordering::Acquire)
    }

    async fn send(&mut self, data: &[u8]) -> Result<()> {
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }
        self.state.sent.lock().push(data.to_vec());
        Ok(())
    }

    async fn read_byte(&mut self) -> Result<u8> {
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }
        loop {
            if let Some(byte) = self.state.reads.lock().pop_front() {
                return Ok(byte);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn read_exact(&mut self, len: usize) -> Result<BytesMut> {
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }
        let mut buf = BytesMut::with_capacity(len);
        while buf.len() < len {
            {
                let mut reads = self.state.reads.lock();
                while buf.len() < len {
                    match reads.pop_front() {
                        Some(byte) => buf.put_u8(byte),
                        None => break,
                    }
                }
            }
            if buf.len() < len {
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        }
        Ok(buf)
    }

    fn descriptor(&self) -> String {
        String::from("mock")
    }
}

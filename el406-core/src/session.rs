//! Session management for the EL406 link
//!
//! A session represents one open serial connection and tracks:
//! - Connection state (closed, open, mid-command)
//! - Protocol batch nesting depth

use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Not connected
    Closed,

    /// Connected and idle
    Open,

    /// A command exchange is in flight
    Busy,
}

/// Session manager
///
/// Tracks connection state and protocol batch depth. Thread-safe and
/// can be cloned cheaply (Arc internally).
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    /// Nesting depth of protocol batches, 0 outside any batch
    batch_depth: AtomicU16,

    /// Current session state
    state: parking_lot::RwLock<SessionState>,
}

impl Session {
    /// Create a new closed session
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SessionInner {
                batch_depth: AtomicU16::new(0),
                state: parking_lot::RwLock::new(SessionState::Closed),
            }),
        }
    }

    /// Get current state
    pub fn state(&self) -> SessionState {
        *self.inner.state.read()
    }

    /// Check if connected
    pub fn is_open(&self) -> bool {
        !matches!(self.state(), SessionState::Closed)
    }

    /// Mark the session open after the transport connects
    pub fn open(&self) -> Result<()> {
        let mut state = self.inner.state.write();

        if *state != SessionState::Closed {
            return Err(Error::InvalidSessionState(format!(
                "Cannot open from state: {:?}",
                *state
            )));
        }

        self.inner.batch_depth.store(0, Ordering::Release);
        *state = SessionState::Open;

        Ok(())
    }

    /// Mark a command exchange as started
    pub fn begin_command(&self) -> Result<()> {
        let mut state = self.inner.state.write();

        if *state != SessionState::Open {
            return Err(Error::InvalidSessionState(format!(
                "Cannot start a command from state: {:?}",
                *state
            )));
        }

        *state = SessionState::Busy;
        Ok(())
    }

    /// Mark the in-flight command exchange as finished
    pub fn end_command(&self) {
        let mut state = self.inner.state.write();

        if *state == SessionState::Busy {
            *state = SessionState::Open;
        }
    }

    /// Close the session. Idempotent.
    pub fn close(&self) {
        self.inner.batch_depth.store(0, Ordering::Release);
        *self.inner.state.write() = SessionState::Closed;
    }

    /// Current batch nesting depth
    pub fn batch_depth(&self) -> u16 {
        self.inner.batch_depth.load(Ordering::Acquire)
    }

    /// Whether a protocol batch is active
    pub fn in_batch(&self) -> bool {
        self.batch_depth() > 0
    }

    /// Enter one batch level. Returns the depth before entering, so 0
    /// means this call opened the outermost batch.
    pub fn enter_batch(&self) -> u16 {
        self.inner.batch_depth.fetch_add(1, Ordering::AcqRel)
    }

    /// Leave one batch level. Returns the depth after leaving, so 0
    /// means the outermost batch just closed.
    pub fn exit_batch(&self) -> Result<u16> {
        let previous = self.inner.batch_depth.fetch_sub(1, Ordering::AcqRel);

        if previous == 0 {
            // Undo the wrap and report the imbalance
            self.inner.batch_depth.store(0, Ordering::Release);
            return Err(Error::InvalidSessionState(
                "Batch exit without a matching enter".to_string(),
            ));
        }

        Ok(previous - 1)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

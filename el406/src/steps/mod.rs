//! Step commands
//!
//! Steps are the operations that act on a plate: washes, dispenses,
//! aspirates, primes, purges and shakes. Each one validates its
//! parameters host-side, builds the payload for its command code and
//! runs inside a batch window.

mod manifold;
mod peristaltic;
mod shake;
mod syringe;

use crate::error::{Error, Result};

/// Bounds check that names the offending field in the error.
pub(crate) fn require_range(name: &str, value: i64, min: i64, max: i64) -> Result<()> {
    if value < min || value > max {
        return Err(Error::InvalidParameter(format!(
            "{} must be {}-{}, got {}",
            name, min, max, value
        )));
    }
    Ok(())
}

/// Like [`require_range`] but 0 also passes, meaning disabled.
pub(crate) fn require_zero_or_range(name: &str, value: i64, min: i64, max: i64) -> Result<()> {
    if value == 0 {
        return Ok(());
    }
    if value < min || value > max {
        return Err(Error::InvalidParameter(format!(
            "{} must be 0 (disabled) or {}-{}, got {}",
            name, min, max, value
        )));
    }
    Ok(())
}

/// Manifold carrier offsets share one envelope: X within -60..60 and
/// Y within -40..40.
pub(crate) fn require_manifold_xy(label: &str, x: i8, y: i8) -> Result<()> {
    if !(-60..=60).contains(&x) {
        return Err(Error::InvalidParameter(format!(
            "{} X offset must be -60..60, got {}",
            label, x
        )));
    }
    if !(-40..=40).contains(&y) {
        return Err(Error::InvalidParameter(format!(
            "{} Y offset must be -40..40, got {}",
            label, y
        )));
    }
    Ok(())
}

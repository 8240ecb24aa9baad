//! Standalone shake and soak step

use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::info;

use el406_core::{Command, Frame};
use el406_types::{PlateFormat, ShakeIntensity, ShakeParams};

use crate::device::El406;
use crate::error::{Error, Result};
use crate::steps::require_range;

fn validate_shake(params: &ShakeParams) -> Result<()> {
    require_range(
        "shake duration",
        i64::from(params.duration_secs),
        0,
        3599,
    )?;
    require_range(
        "soak duration",
        i64::from(params.soak_duration_secs),
        0,
        3599,
    )?;
    if params.duration_secs == 0 && params.soak_duration_secs == 0 {
        return Err(Error::InvalidParameter(
            "shake and soak durations cannot both be 0".to_string(),
        ));
    }
    Ok(())
}

fn build_shake(plate: PlateFormat, params: &ShakeParams) -> Bytes {
    // A disabled shake phase still carries an intensity byte; the
    // instrument wants Medium there
    let intensity = if params.duration_secs > 0 {
        params.intensity.wire_byte()
    } else {
        ShakeIntensity::Medium.wire_byte()
    };

    let mut data = BytesMut::with_capacity(12);
    data.put_u8(plate.wire_byte());
    data.put_u8(u8::from(params.move_home_first));
    data.put_u16_le(params.duration_secs);
    data.put_u8(intensity);
    data.put_u8(0);
    data.put_u16_le(params.soak_duration_secs);
    data.put_bytes(0, 4);

    debug_assert_eq!(data.len(), 12);
    data.freeze()
}

impl El406 {
    /// Shake and/or soak the plate.
    ///
    /// At least one of the two durations must be nonzero. The soak
    /// phase follows the shake phase.
    pub async fn shake(&mut self, plate: PlateFormat, params: &ShakeParams) -> Result<()> {
        validate_shake(params)?;

        info!(
            "Shake: {} s at {:?}, soak {} s",
            params.duration_secs, params.intensity, params.soak_duration_secs
        );

        let frame = Frame::with_data(Command::ShakeSoak, build_shake(plate, params));
        let timeout = self.timeout()
            + Duration::from_secs(
                u64::from(params.duration_secs) + u64::from(params.soak_duration_secs),
            );
        self.run_step(plate, &frame, timeout).await
    }
}

//! Washer manifold steps: wash, aspirate, dispense, prime, auto-clean

use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::info;

use el406_core::{Command, Frame};
use el406_types::{AspirateParams, Buffer, DispenseParams, PlateFormat, PrimeParams, WashParams};

use crate::device::El406;
use crate::error::{Error, Result};
use crate::steps::{require_manifold_xy, require_range, require_zero_or_range};

/// Wash heights and volume after plate-format defaults are applied.
struct ResolvedWash {
    dispense_volume: u16,
    dispense_z: u16,
    aspirate_z: u16,
    secondary_z: u16,
    final_secondary_z: u16,
}

fn resolve_wash(plate: PlateFormat, params: &WashParams) -> ResolvedWash {
    let geometry = plate.geometry();
    ResolvedWash {
        dispense_volume: params
            .dispense_volume
            .unwrap_or_else(|| plate.default_dispense_volume()),
        dispense_z: params.dispense_z.unwrap_or(geometry.dispense_z),
        aspirate_z: params.aspirate_z.unwrap_or(geometry.aspirate_z),
        secondary_z: params.secondary_z.unwrap_or(geometry.aspirate_z),
        final_secondary_z: params.final_secondary_z.unwrap_or(geometry.aspirate_z),
    }
}

fn validate_wash(params: &WashParams, resolved: &ResolvedWash) -> Result<()> {
    require_range("cycles", i64::from(params.cycles), 1, 250)?;
    if resolved.dispense_volume == 0 {
        return Err(Error::InvalidParameter(
            "dispense_volume must be positive, got 0".to_string(),
        ));
    }
    require_range(
        "dispense flow rate",
        i64::from(params.dispense_flow_rate),
        1,
        9,
    )?;
    require_manifold_xy("Wash dispense", params.dispense_x, params.dispense_y)?;
    require_range(
        "aspirate travel rate",
        i64::from(params.aspirate_travel_rate),
        1,
        9,
    )?;
    require_manifold_xy("Wash aspirate", params.aspirate_x, params.aspirate_y)?;
    require_range(
        "pre-dispense flow rate",
        i64::from(params.pre_dispense_flow_rate),
        1,
        9,
    )?;
    require_manifold_xy(
        "Final aspirate",
        params.final_aspirate_x,
        params.final_aspirate_y,
    )?;
    require_zero_or_range(
        "wash pre-dispense volume",
        i64::from(params.pre_dispense_volume),
        25,
        3000,
    )?;
    require_range(
        "wash vacuum delay volume",
        i64::from(params.vacuum_delay_volume),
        0,
        3000,
    )?;
    require_range("wash soak duration", i64::from(params.soak_duration), 0, 3599)?;
    require_range(
        "wash shake duration",
        i64::from(params.shake_duration),
        0,
        3599,
    )?;
    if params.secondary_aspirate {
        require_manifold_xy("Secondary", params.secondary_x, params.secondary_y)?;
    }
    if params.final_secondary_aspirate {
        require_manifold_xy(
            "Final secondary",
            params.final_secondary_x,
            params.final_secondary_y,
        )?;
    }
    if params.bottom_wash {
        require_range(
            "bottom wash volume",
            i64::from(params.bottom_wash_volume),
            25,
            3000,
        )?;
        require_range(
            "bottom wash flow rate",
            i64::from(params.bottom_wash_flow_rate),
            1,
            9,
        )?;
    }
    if params.between_cycles_volume != 0 {
        require_range(
            "between-cycles pre-dispense volume",
            i64::from(params.between_cycles_volume),
            25,
            3000,
        )?;
        require_range(
            "between-cycles flow rate",
            i64::from(params.between_cycles_flow_rate),
            1,
            9,
        )?;
    }
    Ok(())
}

/// Build the 102-byte wash payload.
///
/// Five fixed-width sections follow the 7-byte header: a first
/// dispense (bottom wash, or a mirror of the main one), the final
/// aspirate, the per-cycle aspirate, the main dispense, then shake
/// and soak. The instrument reads the first dispense before cycling
/// through aspirate and main dispense.
fn build_wash(plate: PlateFormat, params: &WashParams, resolved: &ResolvedWash) -> Bytes {
    let final_asp_z = params.final_aspirate_z.unwrap_or(resolved.aspirate_z);
    let intensity = if params.shake_duration > 0 {
        params.shake_intensity.wire_byte()
    } else {
        0x03
    };

    // Secondary offsets only count when their phase is enabled
    let sec_x = if params.secondary_aspirate {
        params.secondary_x
    } else {
        0
    };
    let sec_y = if params.secondary_aspirate {
        params.secondary_y
    } else {
        0
    };
    let final_sec_x = if params.final_secondary_aspirate {
        params.final_secondary_x
    } else {
        0
    };
    let final_sec_y = if params.final_secondary_aspirate {
        params.final_secondary_y
    } else {
        0
    };
    let final_sec_z = if params.final_secondary_aspirate {
        resolved.final_secondary_z
    } else {
        final_asp_z
    };

    let (first_vol, first_flow) = if params.bottom_wash {
        (params.bottom_wash_volume, params.bottom_wash_flow_rate)
    } else {
        (resolved.dispense_volume, params.dispense_flow_rate)
    };
    let (midcyc_vol, midcyc_flow) = if params.between_cycles_volume > 0 {
        (params.between_cycles_volume, params.between_cycles_flow_rate)
    } else {
        (params.pre_dispense_volume, params.pre_dispense_flow_rate)
    };

    let [asp_delay_lo, asp_delay_hi] = params.aspirate_delay_ms.to_le_bytes();

    let mut data = BytesMut::with_capacity(102);

    // Header
    data.put_u8(plate.wire_byte());
    data.put_u8(u8::from(params.bottom_wash));
    data.put_u8(u8::from(params.final_aspirate));
    data.put_u8(params.wash_format.wire_byte());
    data.put_u16_le(params.sectors.bits());
    data.put_u8(params.cycles);

    // First dispense
    data.put_u8(params.buffer.ascii_byte());
    data.put_u16_le(first_vol);
    data.put_u8(first_flow);
    data.put_i8(params.dispense_x);
    data.put_i8(params.dispense_y);
    data.put_u16_le(resolved.dispense_z);
    data.put_u16_le(params.pre_dispense_volume);
    data.put_u8(params.pre_dispense_flow_rate);
    data.put_u16_le(params.vacuum_delay_volume);
    data.put_bytes(0, 7);
    data.put_u16_le(params.final_aspirate_delay_ms);

    // Final aspirate
    data.put_u8(params.aspirate_travel_rate);
    data.put_u16_le(0);
    data.put_u16_le(final_asp_z);
    data.put_u8(u8::from(params.final_secondary_aspirate));
    data.put_i8(params.final_aspirate_x);
    data.put_i8(params.final_aspirate_y);
    data.put_u16_le(final_sec_z);
    data.put_u8(0);
    data.put_i8(final_sec_x);
    data.put_i8(final_sec_y);
    data.put_bytes(0, 5);
    data.put_u8(0);
    // The per-cycle aspirate delay straddles the section boundary
    data.put_u8(asp_delay_lo);

    // Per-cycle aspirate
    data.put_u8(asp_delay_hi);
    data.put_u8(params.aspirate_travel_rate);
    data.put_i8(params.aspirate_x);
    data.put_i8(params.aspirate_y);
    data.put_u16_le(resolved.aspirate_z);
    data.put_u8(u8::from(params.secondary_aspirate));
    data.put_i8(sec_x);
    data.put_i8(sec_y);
    data.put_u16_le(resolved.secondary_z);
    data.put_bytes(0, 8);

    // Main dispense
    data.put_u8(params.buffer.ascii_byte());
    data.put_u16_le(resolved.dispense_volume);
    data.put_u8(params.dispense_flow_rate);
    data.put_i8(params.dispense_x);
    data.put_i8(params.dispense_y);
    data.put_u16_le(resolved.dispense_z);
    data.put_u16_le(midcyc_vol);
    data.put_u8(midcyc_flow);
    data.put_u16_le(params.vacuum_delay_volume);
    data.put_bytes(0, 6);

    // Shake and soak
    data.put_u8(u8::from(params.move_home_first));
    data.put_u16_le(params.shake_duration);
    data.put_u8(intensity);
    data.put_u8(0);
    data.put_u16_le(params.soak_duration);
    data.put_bytes(0, 8);

    debug_assert_eq!(data.len(), 102);
    data.freeze()
}

fn build_aspirate(
    plate: PlateFormat,
    params: &AspirateParams,
    offset_z: u16,
    secondary_z: u16,
    time_value: u16,
    rate_byte: u8,
) -> Bytes {
    let mut data = BytesMut::with_capacity(22);
    data.put_u8(plate.wire_byte());
    data.put_u8(u8::from(params.vacuum_filtration));
    data.put_u16_le(time_value);
    data.put_u8(rate_byte);
    data.put_i8(params.offset_x);
    data.put_i8(params.offset_y);
    data.put_u16_le(offset_z);
    data.put_u8(u8::from(params.secondary_aspirate));
    data.put_i8(params.secondary_x);
    data.put_i8(params.secondary_y);
    data.put_u16_le(secondary_z);
    data.put_bytes(0, 2);
    // Column selection, all columns
    data.put_slice(&[0xFF, 0x0F]);
    data.put_bytes(0, 4);

    debug_assert_eq!(data.len(), 22);
    data.freeze()
}

fn build_dispense(
    plate: PlateFormat,
    volume: u16,
    params: &DispenseParams,
    offset_z: u16,
) -> Bytes {
    let mut data = BytesMut::with_capacity(20);
    data.put_u8(plate.wire_byte());
    data.put_u8(params.buffer.ascii_byte());
    data.put_u16_le(volume);
    data.put_u8(params.flow_rate);
    data.put_i8(params.offset_x);
    data.put_i8(params.offset_y);
    data.put_u16_le(offset_z);
    data.put_u16_le(params.pre_dispense_volume);
    data.put_u8(params.pre_dispense_flow_rate);
    data.put_u16_le(params.vacuum_delay_volume);
    data.put_bytes(0, 6);

    debug_assert_eq!(data.len(), 20);
    data.freeze()
}

fn build_prime(
    plate: PlateFormat,
    buffer: Buffer,
    flow_rate: u8,
    volume_ml: u16,
    low_flow_ml: u16,
    submerge_min: u16,
) -> Bytes {
    let mut data = BytesMut::with_capacity(13);
    data.put_u8(plate.wire_byte());
    data.put_u8(buffer.ascii_byte());
    data.put_u16_le(volume_ml);
    data.put_u8(flow_rate);
    data.put_u16_le(low_flow_ml);
    data.put_u16_le(submerge_min);
    data.put_bytes(0, 4);

    debug_assert_eq!(data.len(), 13);
    data.freeze()
}

fn build_auto_clean(plate: PlateFormat, buffer: Buffer, duration_min: u16) -> Bytes {
    let mut data = BytesMut::with_capacity(8);
    data.put_u8(plate.wire_byte());
    data.put_u8(buffer.ascii_byte());
    data.put_u16_le(duration_min);
    data.put_bytes(0, 4);

    debug_assert_eq!(data.len(), 8);
    data.freeze()
}

/// Microliters to whole milliliters, rounding half up.
fn ul_to_ml(volume_ul: u32) -> u16 {
    ((volume_ul + 500) / 1000) as u16
}

impl El406 {
    /// Run wash cycles with the washer manifold.
    ///
    /// A wash is `cycles` rounds of dispense then aspirate, with
    /// optional shake, soak, bottom-wash and final-aspirate phases.
    /// Heights and the volume left as `None` in `params` resolve to
    /// the plate format's defaults.
    pub async fn manifold_wash(&mut self, plate: PlateFormat, params: &WashParams) -> Result<()> {
        let resolved = resolve_wash(plate, params);
        validate_wash(params, &resolved)?;

        info!(
            "Manifold wash: {} cycles of {} uL from buffer {}, flow {}",
            params.cycles, resolved.dispense_volume, params.buffer, params.dispense_flow_rate
        );

        let frame = Frame::with_data(Command::ManifoldWash, build_wash(plate, params, &resolved));
        // Cycle time depends on volume, flow and plate, 60 s each is a
        // safe ceiling
        let timeout = Duration::from_secs(
            u64::from(params.cycles) * 60
                + u64::from(params.shake_duration)
                + u64::from(params.soak_duration)
                + 120,
        );
        self.run_step(plate, &frame, timeout).await
    }

    /// Aspirate the plate with the washer manifold.
    ///
    /// Normal mode crosses the wells at the configured travel rate and
    /// holds for `delay_ms` after. Vacuum filtration mode instead pulls
    /// vacuum for `vacuum_time_secs` and ignores travel rate and delay.
    pub async fn manifold_aspirate(
        &mut self,
        plate: PlateFormat,
        params: &AspirateParams,
    ) -> Result<()> {
        let geometry = plate.geometry();
        let offset_z = params.offset_z.unwrap_or(geometry.aspirate_z);
        let secondary_z = params.secondary_z.unwrap_or(geometry.aspirate_z);

        let (time_value, rate_byte) = if params.vacuum_filtration {
            require_range(
                "vacuum filtration time",
                i64::from(params.vacuum_time_secs),
                5,
                999,
            )?;
            (params.vacuum_time_secs, 3)
        } else {
            require_range("aspirate delay", i64::from(params.delay_ms), 0, 5000)?;
            (params.delay_ms, params.travel_rate.wire_byte())
        };
        require_manifold_xy("Aspirate", params.offset_x, params.offset_y)?;
        require_range("aspirate Z offset", i64::from(offset_z), 1, 210)?;
        if params.secondary_aspirate {
            require_manifold_xy("Secondary", params.secondary_x, params.secondary_y)?;
            require_range("secondary Z offset", i64::from(secondary_z), 1, 210)?;
        }

        if params.vacuum_filtration {
            info!(
                "Manifold aspirate: vacuum filtration, {} s",
                params.vacuum_time_secs
            );
        } else {
            info!(
                "Manifold aspirate: travel rate {}, delay {} ms",
                params.travel_rate, params.delay_ms
            );
        }

        let frame = Frame::with_data(
            Command::ManifoldAspirate,
            build_aspirate(plate, params, offset_z, secondary_z, time_value, rate_byte),
        );
        self.run_step(plate, &frame, self.timeout()).await
    }

    /// Dispense `volume` microliters per well from the washer manifold.
    pub async fn manifold_dispense(
        &mut self,
        plate: PlateFormat,
        volume: u16,
        params: &DispenseParams,
    ) -> Result<()> {
        let offset_z = params.offset_z.unwrap_or(plate.geometry().dispense_z);

        require_range("manifold dispense volume", i64::from(volume), 25, 3000)?;
        require_range(
            "manifold dispense flow rate",
            i64::from(params.flow_rate),
            1,
            11,
        )?;
        if params.flow_rate <= 2 && params.vacuum_delay_volume == 0 {
            return Err(Error::InvalidParameter(format!(
                "flow rates 1-2 (cell wash) require vacuum_delay_volume > 0, got flow rate {}",
                params.flow_rate
            )));
        }
        require_manifold_xy("Manifold dispense", params.offset_x, params.offset_y)?;
        require_range("manifold dispense Z offset", i64::from(offset_z), 1, 210)?;
        require_zero_or_range(
            "manifold pre-dispense volume",
            i64::from(params.pre_dispense_volume),
            25,
            3000,
        )?;
        require_range(
            "manifold pre-dispense flow rate",
            i64::from(params.pre_dispense_flow_rate),
            3,
            11,
        )?;
        require_range(
            "manifold vacuum delay volume",
            i64::from(params.vacuum_delay_volume),
            0,
            3000,
        )?;

        info!(
            "Manifold dispense: {} uL from buffer {}, flow {}",
            volume, params.buffer, params.flow_rate
        );

        let frame = Frame::with_data(
            Command::ManifoldDispense,
            build_dispense(plate, volume, params, offset_z),
        );
        self.run_step(plate, &frame, self.timeout()).await
    }

    /// Prime the manifold lines with `volume_ul` microliters of buffer.
    ///
    /// The wire carries the volume in whole milliliters and the
    /// submerge time in whole minutes, so `volume_ul` is rounded to
    /// the nearest milliliter and the submerge duration must be a
    /// multiple of 60 seconds.
    pub async fn manifold_prime(
        &mut self,
        plate: PlateFormat,
        volume_ul: u32,
        params: &PrimeParams,
    ) -> Result<()> {
        require_range(
            "manifold prime volume",
            i64::from(volume_ul),
            5000,
            999_000,
        )?;
        require_range(
            "manifold prime flow rate",
            i64::from(params.flow_rate),
            3,
            11,
        )?;
        require_zero_or_range(
            "low flow path volume",
            i64::from(params.low_flow_volume),
            5000,
            999_000,
        )?;
        require_zero_or_range(
            "submerge duration",
            i64::from(params.submerge_duration_secs),
            60,
            86_340,
        )?;
        if params.submerge_duration_secs % 60 != 0 {
            return Err(Error::InvalidParameter(format!(
                "submerge duration must be a multiple of 60 seconds, got {}",
                params.submerge_duration_secs
            )));
        }

        info!(
            "Manifold prime: {} uL from buffer {}, flow {}",
            volume_ul, params.buffer, params.flow_rate
        );

        let frame = Frame::with_data(
            Command::ManifoldPrime,
            build_prime(
                plate,
                params.buffer,
                params.flow_rate,
                ul_to_ml(volume_ul),
                ul_to_ml(params.low_flow_volume),
                (params.submerge_duration_secs / 60) as u16,
            ),
        );
        let timeout =
            self.timeout() + Duration::from_secs(u64::from(params.submerge_duration_secs) + 30);
        self.run_step(plate, &frame, timeout).await
    }

    /// Run an automatic manifold cleaning cycle.
    ///
    /// The duration is carried in whole minutes, so it must be a
    /// multiple of 60 seconds, up to 3 h 59 min.
    pub async fn manifold_auto_clean(
        &mut self,
        plate: PlateFormat,
        buffer: Buffer,
        duration_secs: u16,
    ) -> Result<()> {
        require_range("auto-clean duration", i64::from(duration_secs), 60, 14_340)?;
        if duration_secs % 60 != 0 {
            return Err(Error::InvalidParameter(format!(
                "auto-clean duration must be a multiple of 60 seconds, got {}",
                duration_secs
            )));
        }

        info!("Auto-clean: buffer {}, {} s", buffer, duration_secs);

        let frame = Frame::with_data(
            Command::ManifoldAutoClean,
            build_auto_clean(plate, buffer, duration_secs / 60),
        );
        let timeout = Duration::from_secs(u64::from(duration_secs) + 30).max(Duration::from_secs(120));
        self.run_step(plate, &frame, timeout).await
    }
}

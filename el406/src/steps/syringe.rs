//! Syringe pump steps: dispense and prime

use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::info;

use el406_core::{encode, Command, Frame};
use el406_types::{PlateFormat, Syringe, SyringeDispenseParams, SyringePrimeParams};

use crate::device::El406;
use crate::error::Result;
use crate::steps::require_range;

fn build_syringe_dispense(
    plate: PlateFormat,
    volume: u16,
    params: &SyringeDispenseParams,
    offset_z: u16,
) -> Result<Bytes> {
    let columns = encode::column_mask(params.columns.as_deref(), plate.max_columns())?;
    let pre_volume = if params.pre_dispense {
        params.pre_dispense_volume
    } else {
        0
    };

    let mut data = BytesMut::with_capacity(26);
    data.put_u8(plate.wire_byte());
    data.put_u8(params.syringe.index_byte());
    data.put_u16_le(volume);
    data.put_u8(params.flow_rate);
    data.put_i8(params.offset_x);
    data.put_i8(params.offset_y);
    data.put_u16_le(offset_z);
    data.put_u16_le(params.pump_delay_ms);
    data.put_u16_le(pre_volume);
    data.put_u8(params.num_pre_dispenses);
    data.put_slice(&columns);
    data.put_u8(params.syringe.bottle_byte());
    data.put_bytes(0, 5);

    debug_assert_eq!(data.len(), 26);
    Ok(data.freeze())
}

fn build_syringe_prime(plate: PlateFormat, params: &SyringePrimeParams) -> Bytes {
    let submerge_min = if params.submerge_tips {
        params.submerge_duration_min
    } else {
        0
    };
    // The bottle selector has no "both" position here; priming both
    // syringes draws from bottle A
    let bottle = match params.syringe {
        Syringe::Both => Syringe::A.bottle_byte(),
        other => other.bottle_byte(),
    };

    let mut data = BytesMut::with_capacity(13);
    data.put_u8(plate.wire_byte());
    data.put_u8(params.syringe.index_byte());
    data.put_u16_le(params.volume);
    data.put_u8(params.flow_rate);
    data.put_u8(params.refills);
    data.put_u16_le(params.pump_delay_ms);
    data.put_u8(u8::from(params.submerge_tips));
    data.put_u16_le(submerge_min);
    data.put_u8(bottle);
    data.put_u8(0);

    debug_assert_eq!(data.len(), 13);
    data.freeze()
}

impl El406 {
    /// Dispense `volume` microliters per well from a syringe pump.
    pub async fn syringe_dispense(
        &mut self,
        plate: PlateFormat,
        volume: u16,
        params: &SyringeDispenseParams,
    ) -> Result<()> {
        let offset_z = params.offset_z.unwrap_or(plate.geometry().dispenser_height);

        require_range("syringe dispense volume", i64::from(volume), 3, 3000)?;
        require_range("syringe flow rate", i64::from(params.flow_rate), 1, 5)?;
        require_range("pump delay", i64::from(params.pump_delay_ms), 0, 5000)?;
        if params.pre_dispense {
            require_range(
                "syringe pre-dispense volume",
                i64::from(params.pre_dispense_volume),
                3,
                3000,
            )?;
        }

        info!(
            "Syringe dispense: {} uL from syringe {}, flow {}",
            volume, params.syringe, params.flow_rate
        );

        let frame = Frame::with_data(
            Command::SyringeDispense,
            build_syringe_dispense(plate, volume, params, offset_z)?,
        );
        self.run_step(plate, &frame, self.timeout()).await
    }

    /// Prime a syringe pump's fluid line.
    ///
    /// The wire carries the submerge time in whole minutes, so
    /// `submerge_duration_min` is a minute count to begin with.
    pub async fn syringe_prime(
        &mut self,
        plate: PlateFormat,
        params: &SyringePrimeParams,
    ) -> Result<()> {
        require_range("syringe prime volume", i64::from(params.volume), 80, 9999)?;
        require_range("syringe flow rate", i64::from(params.flow_rate), 1, 5)?;
        require_range("prime refills", i64::from(params.refills), 1, 255)?;
        require_range("pump delay", i64::from(params.pump_delay_ms), 0, 5000)?;
        if params.submerge_tips {
            require_range(
                "submerge duration",
                i64::from(params.submerge_duration_min),
                0,
                1439,
            )?;
        }

        info!(
            "Syringe prime: {} uL x {} from syringe {}, flow {}",
            params.volume, params.refills, params.syringe, params.flow_rate
        );

        let frame = Frame::with_data(Command::SyringePrime, build_syringe_prime(plate, params));
        let submerge_min = if params.submerge_tips {
            u64::from(params.submerge_duration_min)
        } else {
            0
        };
        let timeout = self.timeout() + Duration::from_secs(submerge_min * 60 + 30);
        self.run_step(plate, &frame, timeout).await
    }
}

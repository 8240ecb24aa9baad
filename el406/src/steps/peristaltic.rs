//! Peristaltic pump steps: prime, purge and dispense

use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::info;

use el406_core::{encode, Command, Frame};
use el406_types::{
    PeristalticAmount, PeristalticDispenseParams, PeristalticPrimeParams, PlateFormat,
};

use crate::device::El406;
use crate::error::{Error, Result};
use crate::steps::require_range;

/// Validated volume and duration halves of a prime or purge amount.
/// The instrument reads whichever field is nonzero.
fn split_amount(amount: PeristalticAmount) -> Result<(u16, u16)> {
    match amount {
        PeristalticAmount::Volume(volume) => {
            require_range("peristaltic volume", i64::from(volume), 1, 3000)?;
            Ok((volume, 0))
        }
        PeristalticAmount::Duration(secs) => {
            require_range("peristaltic duration", i64::from(secs), 1, 300)?;
            Ok((0, secs))
        }
    }
}

fn build_peristaltic_prime(
    plate: PlateFormat,
    params: &PeristalticPrimeParams,
    volume: u16,
    duration_secs: u16,
) -> Bytes {
    let mut data = BytesMut::with_capacity(11);
    data.put_u8(plate.wire_byte());
    data.put_u16_le(volume);
    data.put_u16_le(duration_secs);
    data.put_u8(params.flow_rate.wire_byte());
    data.put_u8(1);
    data.put_u8(params.cassette.wire_byte());
    data.put_u8(params.pump.wire_byte());
    data.put_bytes(0, 2);

    debug_assert_eq!(data.len(), 11);
    data.freeze()
}

fn build_peristaltic_dispense(
    plate: PlateFormat,
    volume: u16,
    params: &PeristalticDispenseParams,
    offset_z: u16,
) -> Result<Bytes> {
    let columns = encode::column_mask(params.columns.as_deref(), plate.max_columns())?;
    let rows = encode::inverted_row_mask(params.rows.as_deref(), plate.row_groups())?;

    let mut data = BytesMut::with_capacity(24);
    data.put_u8(plate.wire_byte());
    data.put_u16_le(volume);
    data.put_u8(params.flow_rate.wire_byte());
    data.put_u8(params.cassette.wire_byte());
    data.put_i8(params.offset_x);
    data.put_i8(params.offset_y);
    data.put_u16_le(offset_z);
    data.put_u16_le(params.pre_dispense_volume);
    data.put_u8(params.num_pre_dispenses);
    data.put_slice(&columns);
    data.put_u8(rows);
    data.put_u8(params.pump.wire_byte());
    data.put_bytes(0, 4);

    debug_assert_eq!(data.len(), 24);
    Ok(data.freeze())
}

impl El406 {
    /// Prime a peristaltic pump cassette.
    ///
    /// Without an explicit amount the pump moves 1000 microliters.
    pub async fn peristaltic_prime(
        &mut self,
        plate: PlateFormat,
        params: &PeristalticPrimeParams,
    ) -> Result<()> {
        let amount = params.amount.unwrap_or(PeristalticAmount::Volume(1000));
        let (volume, duration_secs) = split_amount(amount)?;

        info!(
            "Peristaltic prime: {:?} on {:?} pump, flow {:?}",
            amount, params.pump, params.flow_rate
        );

        let frame = Frame::with_data(
            Command::PeristalticPrime,
            build_peristaltic_prime(plate, params, volume, duration_secs),
        );
        let timeout = self.timeout() + Duration::from_secs(u64::from(duration_secs) + 30);
        self.run_step(plate, &frame, timeout).await
    }

    /// Purge a peristaltic pump cassette back to its bottle.
    ///
    /// Unlike a prime, a purge has no default amount.
    pub async fn peristaltic_purge(
        &mut self,
        plate: PlateFormat,
        params: &PeristalticPrimeParams,
    ) -> Result<()> {
        let Some(amount) = params.amount else {
            return Err(Error::InvalidParameter(
                "peristaltic purge requires an explicit volume or duration".to_string(),
            ));
        };
        let (volume, duration_secs) = split_amount(amount)?;

        info!(
            "Peristaltic purge: {:?} on {:?} pump, flow {:?}",
            amount, params.pump, params.flow_rate
        );

        let frame = Frame::with_data(
            Command::PeristalticPurge,
            build_peristaltic_prime(plate, params, volume, duration_secs),
        );
        let timeout = self.timeout() + Duration::from_secs(u64::from(duration_secs) + 30);
        self.run_step(plate, &frame, timeout).await
    }

    /// Dispense `volume` microliters per well from a peristaltic pump.
    pub async fn peristaltic_dispense(
        &mut self,
        plate: PlateFormat,
        volume: u16,
        params: &PeristalticDispenseParams,
    ) -> Result<()> {
        let offset_z = params.offset_z.unwrap_or(plate.geometry().dispenser_height);

        require_range("peristaltic dispense volume", i64::from(volume), 1, 3000)?;
        if !(-125..=125).contains(&params.offset_x) {
            return Err(Error::InvalidParameter(format!(
                "peristaltic X offset must be -125..125, got {}",
                params.offset_x
            )));
        }
        if !(-40..=40).contains(&params.offset_y) {
            return Err(Error::InvalidParameter(format!(
                "peristaltic Y offset must be -40..40, got {}",
                params.offset_y
            )));
        }
        require_range("peristaltic dispense height", i64::from(offset_z), 1, 1500)?;
        require_range(
            "peristaltic pre-dispense volume",
            i64::from(params.pre_dispense_volume),
            0,
            3000,
        )?;

        info!(
            "Peristaltic dispense: {} uL on {:?} pump, flow {:?}",
            volume, params.pump, params.flow_rate
        );

        let frame = Frame::with_data(
            Command::PeristalticDispense,
            build_peristaltic_dispense(plate, volume, params, offset_z)?,
        );
        self.run_step(plate, &frame, self.timeout()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::tests::connected_device;
    use el406_types::{Cassette, PeristalticFlowRate, PeristalticPump};

    #[test]
    fn test_prime_volume_mode_payload() {
        let params = PeristalticPrimeParams {
            amount: Some(PeristalticAmount::Volume(1000)),
            ..PeristalticPrimeParams::default()
        };
        let data = build_peristaltic_prime(PlateFormat::Well96, &params, 1000, 0);
        let expected: [u8; 11] = [
            0x04, 0xE8, 0x03, 0x00, 0x00, 0x02, 0x01, 0x00, 0x01, 0x00, 0x00,
        ];
        assert_eq!(&data[..], &expected[..]);
    }

    #[test]
    fn test_prime_duration_mode_zeroes_volume() {
        let params = PeristalticPrimeParams {
            cassette: Cassette::FiveMicroliter,
            pump: PeristalticPump::Secondary,
            flow_rate: PeristalticFlowRate::Low,
            ..PeristalticPrimeParams::default()
        };
        let data = build_peristaltic_prime(PlateFormat::Well96, &params, 0, 120);
        assert_eq!(data[1], 0x00);
        assert_eq!(data[2], 0x00);
        assert_eq!(data[3], 120);
        assert_eq!(data[4], 0x00);
        assert_eq!(data[5], 0x00);
        assert_eq!(data[7], 0x02);
        assert_eq!(data[8], 0x02);
    }

    #[tokio::test]
    async fn test_prime_defaults_to_one_milliliter() {
        let (mut dev, mock) = connected_device().await;
        mock.queue_acks(12);

        dev.peristaltic_prime(PlateFormat::Well96, &PeristalticPrimeParams::default())
            .await
            .unwrap();

        let sent = mock.take_sent();
        assert_eq!(sent[8][2..4], [0x90, 0x00]);
        let data = &sent[8][11..];
        assert_eq!(data.len(), 11);
        assert_eq!(data[1], 0xE8);
        assert_eq!(data[2], 0x03);
        assert_eq!(data[3], 0x00);
        assert_eq!(data[4], 0x00);
    }

    #[tokio::test]
    async fn test_purge_requires_an_amount() {
        let (mut dev, mock) = connected_device().await;

        let err = dev
            .peristaltic_purge(PlateFormat::Well96, &PeristalticPrimeParams::default())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidParameter(_)));
        assert!(mock.take_sent().is_empty());
    }

    #[tokio::test]
    async fn test_purge_sends_command() {
        let (mut dev, mock) = connected_device().await;
        mock.queue_acks(12);

        let params = PeristalticPrimeParams {
            amount: Some(PeristalticAmount::Duration(60)),
            ..PeristalticPrimeParams::default()
        };
        dev.peristaltic_purge(PlateFormat::Well96, &params)
            .await
            .unwrap();

        let sent = mock.take_sent();
        assert_eq!(sent[8][2..4], [0x91, 0x00]);
        let data = &sent[8][11..];
        assert_eq!(data[3], 60);
    }

    #[tokio::test]
    async fn test_prime_rejects_out_of_range_amounts() {
        let (mut dev, mock) = connected_device().await;

        for amount in [
            PeristalticAmount::Volume(0),
            PeristalticAmount::Volume(3001),
            PeristalticAmount::Duration(0),
            PeristalticAmount::Duration(301),
        ] {
            let params = PeristalticPrimeParams {
                amount: Some(amount),
                ..PeristalticPrimeParams::default()
            };
            let err = dev
                .peristaltic_prime(PlateFormat::Well96, &params)
                .await
                .unwrap_err();
            assert!(matches!(err, Error::InvalidParameter(_)), "{:?}", amount);
        }
        assert!(mock.take_sent().is_empty());
    }

    #[test]
    fn test_dispense_default_payload() {
        let data = build_peristaltic_dispense(
            PlateFormat::Well96,
            50,
            &PeristalticDispenseParams::default(),
            336,
        )
        .unwrap();
        let expected: [u8; 24] = [
            0x04, 0x32, 0x00, 0x02, 0x00, 0x00, 0x00, 0x50, 0x01, 0x0A, 0x00, 0x02, 0xFF, 0xFF,
            0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00,
        ];
        assert_eq!(&data[..], &expected[..]);
    }

    #[test]
    fn test_dispense_row_mask_is_inverted() {
        let params = PeristalticDispenseParams {
            rows: Some(vec![1]),
            ..PeristalticDispenseParams::default()
        };
        let data =
            build_peristaltic_dispense(PlateFormat::Well1536, 50, &params, 250).unwrap();
        // Row 1 of 4 selected: bit 0 cleared, bits 1-3 left set
        assert_eq!(data[18], 0x0E);
    }

    #[test]
    fn test_dispense_row_mask_bounded_by_format() {
        let params = PeristalticDispenseParams {
            rows: Some(vec![2]),
            ..PeristalticDispenseParams::default()
        };
        // A 96-well plate has a single row group
        assert!(build_peristaltic_dispense(PlateFormat::Well96, 50, &params, 336).is_err());
        assert!(build_peristaltic_dispense(PlateFormat::Well384, 50, &params, 333).is_ok());
    }

    #[tokio::test]
    async fn test_dispense_sends_command_inside_batch() {
        let (mut dev, mock) = connected_device().await;
        mock.queue_acks(12);

        dev.peristaltic_dispense(PlateFormat::Well96, 50, &PeristalticDispenseParams::default())
            .await
            .unwrap();

        let sent = mock.take_sent();
        assert_eq!(sent.len(), 12);
        assert_eq!(sent[8][2..4], [0x8F, 0x00]);
        assert_eq!(sent[8].len(), 11 + 24);
    }

    #[tokio::test]
    async fn test_dispense_height_defaults_to_dispenser_height() {
        let (mut dev, mock) = connected_device().await;
        mock.queue_acks(12);

        dev.peristaltic_dispense(
            PlateFormat::Well1536,
            50,
            &PeristalticDispenseParams::default(),
        )
        .await
        .unwrap();

        let sent = mock.take_sent();
        let data = &sent[8][11..];
        assert_eq!(data[7], 250);
        assert_eq!(data[8], 0x00);
    }

    #[tokio::test]
    async fn test_dispense_rejects_out_of_range_parameters() {
        let (mut dev, mock) = connected_device().await;

        for (volume, params) in [
            (0, PeristalticDispenseParams::default()),
            (3001, PeristalticDispenseParams::default()),
            (
                50,
                PeristalticDispenseParams {
                    offset_x: 126,
                    ..PeristalticDispenseParams::default()
                },
            ),
            (
                50,
                PeristalticDispenseParams {
                    offset_y: -41,
                    ..PeristalticDispenseParams::default()
                },
            ),
            (
                50,
                PeristalticDispenseParams {
                    offset_z: Some(0),
                    ..PeristalticDispenseParams::default()
                },
            ),
            (
                50,
                PeristalticDispenseParams {
                    offset_z: Some(1501),
                    ..PeristalticDispenseParams::default()
                },
            ),
        ] {
            let err = dev
                .peristaltic_dispense(PlateFormat::Well96, volume, &params)
                .await
                .unwrap_err();
            assert!(matches!(err, Error::InvalidParameter(_)), "{:?}", params);
        }
        assert!(mock.take_sent().is_empty());
    }
}

//! Batch lifecycle around step commands
//!
//! The instrument executes steps between a start-step marker and an
//! end-of-batch marker. Step methods open and close that window
//! themselves when called bare; [`El406::batch`] holds one window open
//! across several steps so the carrier is prepared only once.

use std::time::Duration;

use tracing::debug;

use el406_core::constants::{END_OF_BATCH_TIMEOUT, HOMING_TIMEOUT};
use el406_core::{Command, Frame};
use el406_types::{MotorHomeType, PlateFormat};

use crate::device::El406;
use crate::error::Result;

impl El406 {
    /// Whether a batch window is currently open
    pub fn in_batch(&self) -> bool {
        self.session.in_batch()
    }

    /// Run several steps inside a single batch
    ///
    /// The carrier preparation and end-of-batch cleanup run once around
    /// the whole body instead of once per step. Cleanup runs even when
    /// the body fails, and the body's error wins over any cleanup error.
    /// Nesting is allowed; inner calls reuse the open window.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use el406::{El406, PlateFormat, ShakeParams, WashParams};
    ///
    /// #[tokio::main]
    /// async fn main() -> el406::Result<()> {
    ///     let mut device = El406::new("/dev/ttyUSB0");
    ///     device.setup().await?;
    ///
    ///     let plate = PlateFormat::Well96;
    ///     device
    ///         .batch(plate, async |dev| {
    ///             dev.manifold_wash(plate, &WashParams::default()).await?;
    ///             let soak = ShakeParams {
    ///                 soak_duration_secs: 120,
    ///                 ..ShakeParams::default()
    ///             };
    ///             dev.shake(plate, &soak).await
    ///         })
    ///         .await?;
    ///
    ///     device.stop().await?;
    ///     Ok(())
    /// }
    /// ```
    pub async fn batch<T, F>(&mut self, plate: PlateFormat, body: F) -> Result<T>
    where
        F: AsyncFnOnce(&mut Self) -> Result<T>,
    {
        self.enter_batch(plate).await?;
        let result = body(self).await;
        let exit = self.exit_batch().await;
        let value = result?;
        exit?;
        Ok(value)
    }

    /// Run one step frame inside its own batch window
    pub(crate) async fn run_step(
        &mut self,
        plate: PlateFormat,
        frame: &Frame,
        timeout: Duration,
    ) -> Result<()> {
        self.enter_batch(plate).await?;
        let result = self.exchange(frame, timeout).await;
        let exit = self.exit_batch().await;
        result?;
        exit?;
        Ok(())
    }

    /// Open the batch window, preparing the carrier if outermost
    ///
    /// The depth only moves once preparation succeeds, so a failed
    /// start leaves no window to unwind.
    pub(crate) async fn enter_batch(&mut self, plate: PlateFormat) -> Result<()> {
        if self.session.in_batch() {
            self.session.enter_batch();
            return Ok(());
        }
        self.start_batch(plate).await?;
        self.session.enter_batch();
        Ok(())
    }

    /// Close the batch window, cleaning up if outermost
    pub(crate) async fn exit_batch(&mut self) -> Result<()> {
        let depth = self.session.exit_batch()?;
        if depth > 0 {
            return Ok(());
        }
        self.finish_batch().await
    }

    /// Carrier preparation sequence sent before the first step
    async fn start_batch(&mut self, plate: PlateFormat) -> Result<()> {
        debug!("Starting batch for {} plate", plate.name());

        let timeout = self.timeout();
        self.exchange(&Frame::new(Command::TestComm), timeout)
            .await?;
        self.exchange(&Frame::new(Command::InitState), timeout)
            .await?;
        self.exchange(&Frame::new(Command::StatusPoll), timeout)
            .await?;
        self.exchange(
            &Frame::with_data(
                Command::HomeMotors,
                vec![MotorHomeType::VerifyXyzMotors.wire_byte(), 0],
            ),
            HOMING_TIMEOUT,
        )
        .await?;
        self.exchange(
            &Frame::with_data(
                Command::HomeMotors,
                vec![MotorHomeType::InitPeriPump.wire_byte(), 0],
            ),
            HOMING_TIMEOUT,
        )
        .await?;
        self.exchange(&Frame::with_data(Command::VacuumPump, vec![0]), timeout)
            .await?;
        self.exchange(&Frame::new(Command::StatusPoll), timeout)
            .await?;
        self.exchange(
            &Frame::with_data(Command::StartStep, vec![plate.wire_byte()]),
            timeout,
        )
        .await?;
        Ok(())
    }

    /// Cleanup sequence sent after the last step
    async fn finish_batch(&mut self) -> Result<()> {
        debug!("Finishing batch");

        let timeout = self.timeout();
        self.exchange(&Frame::with_data(Command::VacuumPump, vec![0]), timeout)
            .await?;
        self.exchange(
            &Frame::with_data(
                Command::HomeMotors,
                vec![MotorHomeType::HomeXyzMotors.wire_byte(), 0],
            ),
            HOMING_TIMEOUT,
        )
        .await?;
        self.exchange(&Frame::new(Command::EndOfBatch), END_OF_BATCH_TIMEOUT)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::tests::connected_device;
    use crate::error::Error;
    use el406_core::constants::NAK;
    use el406_types::ShakeParams;

    const PLATE: PlateFormat = PlateFormat::Well96;

    fn soak_step() -> ShakeParams {
        ShakeParams {
            soak_duration_secs: 5,
            ..ShakeParams::default()
        }
    }

    fn command_bytes(sent: &[Vec<u8>]) -> Vec<u8> {
        sent.iter().map(|frame| frame[2]).collect()
    }

    fn count_command(sent: &[Vec<u8>], low_byte: u8) -> usize {
        sent.iter().filter(|frame| frame[2] == low_byte).count()
    }

    #[tokio::test]
    async fn test_batch_tracks_open_window() {
        let (mut device, mock) = connected_device().await;
        mock.queue_acks(11);

        assert!(!device.in_batch());
        device
            .batch(PLATE, async |dev| {
                assert!(dev.in_batch());
                Ok(())
            })
            .await
            .unwrap();
        assert!(!device.in_batch());
    }

    #[tokio::test]
    async fn test_batch_start_and_cleanup_sequences() {
        let (mut device, mock) = connected_device().await;
        mock.queue_acks(11);

        device.batch(PLATE, async |_| Ok(())).await.unwrap();

        let sent = mock.sent();
        assert_eq!(
            command_bytes(&sent),
            // Preparation: comm test, init, poll, verify XYZ, init peri
            // pump, vacuum off, poll, start step. Cleanup: vacuum off,
            // home XYZ, end of batch.
            [0x73, 0xA0, 0x92, 0xC8, 0xC8, 0x2B, 0x92, 0x8D, 0x2B, 0xC8, 0x8C]
        );

        // Start step carries the plate format
        let start = &sent[7];
        assert_eq!(start[2..4], [0x8D, 0x00]);
        assert_eq!(start[11], PLATE.wire_byte());

        // Homing selectors: verify XYZ, init peri pump, home XYZ
        assert_eq!(sent[3][11..13], [6, 0]);
        assert_eq!(sent[4][11..13], [2, 0]);
        assert_eq!(sent[9][11..13], [4, 0]);

        assert_eq!(mock.unread(), 0);
    }

    #[tokio::test]
    async fn test_batch_cleans_up_after_body_error() {
        let (mut device, mock) = connected_device().await;
        mock.queue_acks(11);

        let err = device
            .batch(PLATE, async |_| -> Result<()> {
                Err(Error::InvalidParameter("boom".into()))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidParameter(_)));
        assert!(!device.in_batch());

        // Cleanup still ran
        let sent = mock.sent();
        assert_eq!(count_command(&sent, 0x8C), 1);
    }

    #[tokio::test]
    async fn test_failed_start_leaves_no_window() {
        let (mut device, mock) = connected_device().await;
        mock.queue_acks(2);
        mock.queue_bytes(&[NAK]);

        let err = device.batch(PLATE, async |_| Ok(())).await.unwrap_err();
        assert!(matches!(err, Error::Nak));
        assert!(!device.in_batch());

        // No start step reached, no cleanup attempted
        let sent = mock.sent();
        assert_eq!(count_command(&sent, 0x8D), 0);
        assert_eq!(count_command(&sent, 0x8C), 0);
    }

    #[tokio::test]
    async fn test_nested_batch_is_passthrough() {
        let (mut device, mock) = connected_device().await;
        mock.queue_acks(11);

        device
            .batch(PLATE, async |dev| {
                assert_eq!(dev.session.batch_depth(), 1);
                dev.batch(PLATE, async |inner| {
                    assert_eq!(inner.session.batch_depth(), 2);
                    Ok(())
                })
                .await?;
                assert!(dev.in_batch());
                Ok(())
            })
            .await
            .unwrap();

        // Inner batch added no frames: one start, one cleanup in total
        let sent = mock.sent();
        assert_eq!(sent.len(), 11);
        assert_eq!(count_command(&sent, 0x8D), 1);
        assert_eq!(count_command(&sent, 0x8C), 1);
    }

    #[tokio::test]
    async fn test_bare_step_wraps_itself() {
        let (mut device, mock) = connected_device().await;
        mock.queue_acks(12);

        device.shake(PLATE, &soak_step()).await.unwrap();
        assert!(!device.in_batch());

        let sent = mock.sent();
        assert_eq!(count_command(&sent, 0x8D), 1);
        assert_eq!(count_command(&sent, 0xA3), 1);
        assert_eq!(count_command(&sent, 0x8C), 1);
    }

    #[tokio::test]
    async fn test_step_inside_batch_sends_no_markers() {
        let (mut device, mock) = connected_device().await;
        mock.queue_acks(12);

        let recorder = mock.clone();
        device
            .batch(PLATE, async |dev| {
                recorder.take_sent();
                dev.shake(PLATE, &soak_step()).await?;

                let during_step = recorder.take_sent();
                assert_eq!(count_command(&during_step, 0x8D), 0);
                assert_eq!(count_command(&during_step, 0x8C), 0);
                assert_eq!(count_command(&during_step, 0xA3), 1);
                Ok(())
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_steps_share_one_batch() {
        let (mut device, mock) = connected_device().await;
        mock.queue_acks(13);

        device
            .batch(PLATE, async |dev| {
                dev.shake(PLATE, &soak_step()).await?;
                dev.shake(PLATE, &soak_step()).await
            })
            .await
            .unwrap();

        let sent = mock.sent();
        assert_eq!(count_command(&sent, 0x8D), 1);
        assert_eq!(count_command(&sent, 0xA3), 2);
        assert_eq!(count_command(&sent, 0x8C), 1);
    }
}

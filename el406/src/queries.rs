//! Hardware configuration and status queries

use tracing::{debug, info};

use el406_core::constants::LONG_READ_TIMEOUT;
use el406_core::{Command, Frame};
use el406_types::{
    DeviceState, InstrumentSettings, PeristalticPump, SelfCheckReport, Sensor, SyringeBoxInfo,
    SyringeManifold, WasherManifold,
};

use crate::device::El406;
use crate::error::{Error, Result};

/// First payload byte of a query reply
///
/// Query replies carry a two byte status prefix before the payload;
/// short replies from older firmware omit it.
fn value_byte(data: &[u8]) -> Result<u8> {
    if data.len() > 2 {
        return Ok(data[2]);
    }
    data.first()
        .copied()
        .ok_or_else(|| Error::InvalidResponse("empty query reply".into()))
}

impl El406 {
    /// Query the installed washer manifold type
    pub async fn get_washer_manifold(&mut self) -> Result<WasherManifold> {
        info!("Querying washer manifold type");
        let data = self
            .exchange(&Frame::new(Command::GetWasherManifold), self.timeout())
            .await?;
        debug!("Washer manifold reply: {:02X?}", &data[..]);

        let manifold = WasherManifold::try_from(value_byte(&data)?)?;
        info!("Washer manifold: {:?}", manifold);
        Ok(manifold)
    }

    /// Query the installed syringe manifold type
    pub async fn get_syringe_manifold(&mut self) -> Result<SyringeManifold> {
        info!("Querying syringe manifold type");
        let data = self
            .exchange(&Frame::new(Command::GetSyringeManifold), self.timeout())
            .await?;
        debug!("Syringe manifold reply: {:02X?}", &data[..]);

        let manifold = SyringeManifold::try_from(value_byte(&data)?)?;
        info!("Syringe manifold: {:?}", manifold);
        Ok(manifold)
    }

    /// Query the product serial number
    pub async fn get_serial_number(&mut self) -> Result<String> {
        info!("Querying product serial number");
        let data = self
            .exchange(&Frame::new(Command::GetSerialNumber), self.timeout())
            .await?;

        let ascii: String = data
            .get(2..)
            .unwrap_or(&[])
            .iter()
            .filter(|b| b.is_ascii())
            .map(|&b| b as char)
            .collect();
        let serial = ascii.trim().trim_end_matches('\0').to_string();

        info!("Product serial number: {}", serial);
        Ok(serial)
    }

    /// Query whether a sensor is enabled
    pub async fn get_sensor_enabled(&mut self, sensor: Sensor) -> Result<bool> {
        info!("Querying sensor enabled status: {:?}", sensor);
        let data = self
            .exchange(
                &Frame::with_data(Command::GetSensorEnabled, vec![sensor.wire_byte()]),
                self.timeout(),
            )
            .await?;

        let enabled = value_byte(&data)? != 0;
        info!("Sensor {:?} enabled: {}", sensor, enabled);
        Ok(enabled)
    }

    /// Query the syringe box configuration
    pub async fn get_syringe_box_info(&mut self) -> Result<SyringeBoxInfo> {
        info!("Querying syringe box info");
        let data = self
            .exchange(&Frame::new(Command::GetSyringeBoxInfo), self.timeout())
            .await?;
        debug!("Syringe box reply: {:02X?}", &data[..]);

        let box_type = value_byte(&data)?;
        let box_size = if data.len() > 3 {
            data[3]
        } else if data.len() > 1 {
            data[1]
        } else {
            0
        };

        let info = SyringeBoxInfo {
            box_type,
            box_size,
            installed: box_type != 0,
        };
        info!("Syringe box info: {:?}", info);
        Ok(info)
    }

    /// Query whether a peristaltic pump is installed
    pub async fn get_peristaltic_installed(&mut self, pump: PeristalticPump) -> Result<bool> {
        // The query selector counts from zero, unlike the pump byte in
        // step frames.
        let selector = match pump {
            PeristalticPump::Primary => 0,
            PeristalticPump::Secondary => 1,
        };

        info!("Querying peristaltic pump installed: {:?}", pump);
        let data = self
            .exchange(
                &Frame::with_data(Command::GetPeristalticInstalled, vec![selector]),
                self.timeout(),
            )
            .await?;

        let installed = value_byte(&data)? != 0;
        info!("Peristaltic pump {:?} installed: {}", pump, installed);
        Ok(installed)
    }

    /// Query the full hardware configuration
    pub async fn get_instrument_settings(&mut self) -> Result<InstrumentSettings> {
        info!("Querying instrument settings");

        let washer_manifold = self.get_washer_manifold().await?;
        let syringe_manifold = self.get_syringe_manifold().await?;
        let syringe_box = self.get_syringe_box_info().await?;
        let peristaltic_pump_1 = self.get_peristaltic_installed(PeristalticPump::Primary).await?;
        let peristaltic_pump_2 = self
            .get_peristaltic_installed(PeristalticPump::Secondary)
            .await?;

        let settings = InstrumentSettings {
            washer_manifold,
            syringe_manifold,
            syringe_box,
            peristaltic_pump_1,
            peristaltic_pump_2,
        };
        info!("Instrument settings: {:?}", settings);
        Ok(settings)
    }

    /// Query the run state
    pub async fn get_status(&mut self) -> Result<DeviceState> {
        let data = self
            .exchange(&Frame::new(Command::StatusPoll), self.timeout())
            .await?;

        let state = DeviceState::try_from(value_byte(&data)?)?;
        debug!("Run state: {:?}", state);
        Ok(state)
    }

    /// Run the instrument self-check diagnostics
    ///
    /// A failed check is reported through the returned value, not as an
    /// error.
    pub async fn run_self_check(&mut self) -> Result<SelfCheckReport> {
        info!("Running instrument self-check");
        let data = self
            .exchange(&Frame::new(Command::RunSelfCheck), LONG_READ_TIMEOUT)
            .await?;

        let error_code = value_byte(&data)?;
        let success = error_code == 0;
        let message = if success {
            "Self-check passed".to_string()
        } else {
            format!("Self-check failed (error code: {})", error_code)
        };

        info!("Self-check result: {}", message);
        Ok(SelfCheckReport {
            success,
            error_code,
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::tests::connected_device;

    #[test]
    fn test_value_byte_prefix_handling() {
        assert_eq!(value_byte(&[0x01, 0x00, 0x04]).unwrap(), 0x04);
        assert_eq!(value_byte(&[0x07]).unwrap(), 0x07);
        assert_eq!(value_byte(&[0x07, 0x09]).unwrap(), 0x07);
        assert!(value_byte(&[]).is_err());
    }

    #[tokio::test]
    async fn test_get_washer_manifold() {
        let (mut device, mock) = connected_device().await;
        mock.queue_reply(&[0x01]);

        let manifold = device.get_washer_manifold().await.unwrap();
        assert_eq!(manifold, WasherManifold::Tube192);
        assert_eq!(mock.last_sent().unwrap()[2..4], [0xD8, 0x00]);
    }

    #[tokio::test]
    async fn test_unknown_manifold_byte_is_an_error() {
        let (mut device, mock) = connected_device().await;
        mock.queue_reply(&[0x77]);

        let err = device.get_washer_manifold().await.unwrap_err();
        assert!(matches!(err, Error::Types(_)));
        assert!(err.to_string().contains("0x77"));
    }

    #[tokio::test]
    async fn test_get_serial_number_strips_padding() {
        let (mut device, mock) = connected_device().await;
        mock.queue_reply(b" 406PVS123456\x00\x00");

        let serial = device.get_serial_number().await.unwrap();
        assert_eq!(serial, "406PVS123456");
        assert_eq!(mock.last_sent().unwrap()[2..4], [0x00, 0x01]);
    }

    #[tokio::test]
    async fn test_get_serial_number_ignores_non_ascii() {
        let (mut device, mock) = connected_device().await;
        mock.queue_reply(b"EL\xFF406");

        let serial = device.get_serial_number().await.unwrap();
        assert_eq!(serial, "EL406");
    }

    #[tokio::test]
    async fn test_get_sensor_enabled() {
        let (mut device, mock) = connected_device().await;
        mock.queue_reply(&[0x01]);

        let enabled = device.get_sensor_enabled(Sensor::Waste).await.unwrap();
        assert!(enabled);

        let frame = mock.last_sent().unwrap();
        assert_eq!(frame[2..4], [0xD2, 0x00]);
        assert_eq!(frame[11], Sensor::Waste.wire_byte());
    }

    #[tokio::test]
    async fn test_get_syringe_box_info() {
        let (mut device, mock) = connected_device().await;
        mock.queue_reply(&[0x02, 0x30]);

        let info = device.get_syringe_box_info().await.unwrap();
        assert_eq!(info.box_type, 0x02);
        assert_eq!(info.box_size, 0x30);
        assert!(info.installed);
    }

    #[tokio::test]
    async fn test_absent_syringe_box() {
        let (mut device, mock) = connected_device().await;
        mock.queue_reply(&[0x00, 0x00]);

        let info = device.get_syringe_box_info().await.unwrap();
        assert!(!info.installed);
    }

    #[tokio::test]
    async fn test_get_peristaltic_installed_selectors() {
        let (mut device, mock) = connected_device().await;
        mock.queue_reply(&[0x01]);
        mock.queue_reply(&[0x00]);

        assert!(device
            .get_peristaltic_installed(PeristalticPump::Primary)
            .await
            .unwrap());
        let first = mock.sent()[0].clone();
        assert_eq!(first[2..4], [0x04, 0x01]);
        assert_eq!(first[11], 0);

        assert!(!device
            .get_peristaltic_installed(PeristalticPump::Secondary)
            .await
            .unwrap());
        assert_eq!(mock.last_sent().unwrap()[11], 1);
    }

    #[tokio::test]
    async fn test_get_instrument_settings_runs_all_queries() {
        let (mut device, mock) = connected_device().await;
        mock.queue_reply(&[0x00]); // washer manifold: dual 96
        mock.queue_reply(&[0x04]); // syringe manifold: 96-well
        mock.queue_reply(&[0x02, 0x10]);
        mock.queue_reply(&[0x01]);
        mock.queue_reply(&[0x00]);

        let settings = device.get_instrument_settings().await.unwrap();
        assert_eq!(settings.washer_manifold, WasherManifold::Tube96Dual);
        assert!(settings.syringe_box.installed);
        assert!(settings.peristaltic_pump_1);
        assert!(!settings.peristaltic_pump_2);

        assert_eq!(mock.sent().len(), 5);
        assert_eq!(mock.unread(), 0);
    }

    #[tokio::test]
    async fn test_get_status() {
        let (mut device, mock) = connected_device().await;
        mock.queue_reply(&[0x02]);

        let state = device.get_status().await.unwrap();
        assert_eq!(state, DeviceState::Running);
        assert_eq!(mock.last_sent().unwrap()[2], 0x92);
    }

    #[tokio::test]
    async fn test_self_check_pass() {
        let (mut device, mock) = connected_device().await;
        mock.queue_reply(&[0x00]);

        let report = device.run_self_check().await.unwrap();
        assert!(report.success);
        assert_eq!(report.error_code, 0);
        assert_eq!(report.message, "Self-check passed");
        assert_eq!(mock.last_sent().unwrap()[2], 0x95);
    }

    #[tokio::test]
    async fn test_self_check_failure_is_reported_not_raised() {
        let (mut device, mock) = connected_device().await;
        mock.queue_reply(&[0x07]);

        let report = device.run_self_check().await.unwrap();
        assert!(!report.success);
        assert_eq!(report.error_code, 7);
        assert_eq!(report.message, "Self-check failed (error code: 7)");
    }
}

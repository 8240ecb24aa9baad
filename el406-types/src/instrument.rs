//! Instrument hardware descriptors reported by the query commands

use std::fmt;

use crate::error::{Error, Result};

/// Washer manifold fitted to the instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WasherManifold {
    Tube96Dual = 0,
    Tube192 = 1,
    Tube128 = 2,
    Tube96Single = 3,
    DeepPin96 = 4,
    NotInstalled = 255,
}

impl WasherManifold {
    pub const fn wire_byte(self) -> u8 {
        self as u8
    }

    pub const fn installed(self) -> bool {
        !matches!(self, WasherManifold::NotInstalled)
    }
}

impl TryFrom<u8> for WasherManifold {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(WasherManifold::Tube96Dual),
            1 => Ok(WasherManifold::Tube192),
            2 => Ok(WasherManifold::Tube128),
            3 => Ok(WasherManifold::Tube96Single),
            4 => Ok(WasherManifold::DeepPin96),
            255 => Ok(WasherManifold::NotInstalled),
            _ => Err(Error::UnknownValue {
                what: "washer manifold type",
                value,
                valid: "0, 1, 2, 3, 4, 255",
            }),
        }
    }
}

impl fmt::Display for WasherManifold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WasherManifold::Tube96Dual => "96-tube dual",
            WasherManifold::Tube192 => "192-tube",
            WasherManifold::Tube128 => "128-tube",
            WasherManifold::Tube96Single => "96-tube single",
            WasherManifold::DeepPin96 => "96 deep pin",
            WasherManifold::NotInstalled => "not installed",
        };
        f.write_str(label)
    }
}

/// Syringe manifold fitted to the instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SyringeManifold {
    NotInstalled = 0,
    Tube16 = 1,
    Tube32LargeBore = 2,
    Tube32SmallBore = 3,
    Tube16_7 = 4,
    Tube8 = 5,
    Plate6Well = 6,
    Plate12Well = 7,
    Plate24Well = 8,
    Plate48Well = 9,
}

impl SyringeManifold {
    pub const fn wire_byte(self) -> u8 {
        self as u8
    }

    pub const fn installed(self) -> bool {
        !matches!(self, SyringeManifold::NotInstalled)
    }
}

impl TryFrom<u8> for SyringeManifold {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(SyringeManifold::NotInstalled),
            1 => Ok(SyringeManifold::Tube16),
            2 => Ok(SyringeManifold::Tube32LargeBore),
            3 => Ok(SyringeManifold::Tube32SmallBore),
            4 => Ok(SyringeManifold::Tube16_7),
            5 => Ok(SyringeManifold::Tube8),
            6 => Ok(SyringeManifold::Plate6Well),
            7 => Ok(SyringeManifold::Plate12Well),
            8 => Ok(SyringeManifold::Plate24Well),
            9 => Ok(SyringeManifold::Plate48Well),
            _ => Err(Error::UnknownValue {
                what: "syringe manifold type",
                value,
                valid: "0-9",
            }),
        }
    }
}

/// Sensor channels whose enablement can be queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Sensor {
    Vacuum = 0,
    Waste = 1,
    Fluid = 2,
    Flow = 3,
    FilterVac = 4,
    Plate = 5,
}

impl Sensor {
    pub const fn wire_byte(self) -> u8 {
        self as u8
    }
}

/// Addressable motors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Motor {
    CarrierX = 0,
    CarrierY = 1,
    DispHeadZ = 2,
    WashHeadZ = 3,
    SyringeA = 4,
    SyringeB = 5,
    PeriPumpPrimary = 6,
    PeriPumpSecondary = 7,
}

impl Motor {
    pub const fn wire_byte(self) -> u8 {
        self as u8
    }
}

/// Home and verify operations accepted by the motor command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MotorHomeType {
    InitAllMotors = 1,
    InitPeriPump = 2,
    HomeMotor = 3,
    HomeXyzMotors = 4,
    VerifyMotor = 5,
    VerifyXyzMotors = 6,
}

impl MotorHomeType {
    pub const fn wire_byte(self) -> u8 {
        self as u8
    }
}

/// Step categories an abort can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StepType {
    PeristalticPrime = 2,
    ManifoldWash = 6,
    ManifoldAspirate = 7,
}

impl StepType {
    pub const fn wire_byte(self) -> u8 {
        self as u8
    }
}

/// Run state reported by the status poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DeviceState {
    /// Idle, ready for commands
    Initial = 1,

    /// Executing a step
    Running = 2,

    Paused = 3,

    /// Stopped after an abort, ready for commands
    Stopped = 4,
}

impl TryFrom<u8> for DeviceState {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(DeviceState::Initial),
            2 => Ok(DeviceState::Running),
            3 => Ok(DeviceState::Paused),
            4 => Ok(DeviceState::Stopped),
            _ => Err(Error::UnknownValue {
                what: "device state",
                value,
                valid: "1, 2, 3, 4",
            }),
        }
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DeviceState::Initial => "initial",
            DeviceState::Running => "running",
            DeviceState::Paused => "paused",
            DeviceState::Stopped => "stopped",
        };
        f.write_str(label)
    }
}

/// Syringe box description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyringeBoxInfo {
    pub box_type: u8,
    pub box_size: u8,
    pub installed: bool,
}

/// Self-check outcome. A nonzero code is reported, not raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfCheckReport {
    pub success: bool,
    pub error_code: u8,
    pub message: String,
}

/// Hardware configuration assembled from the individual queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentSettings {
    pub washer_manifold: WasherManifold,
    pub syringe_manifold: SyringeManifold,
    pub syringe_box: SyringeBoxInfo,
    pub peristaltic_pump_1: bool,
    pub peristaltic_pump_2: bool,
}

impl fmt::Display for InstrumentSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "washer: {}, syringe: {:?}, peristaltic: [{}, {}]",
            self.washer_manifold,
            self.syringe_manifold,
            self.peristaltic_pump_1,
            self.peristaltic_pump_2
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn washer_manifold_values() {
        assert_eq!(WasherManifold::try_from(0).ok(), Some(WasherManifold::Tube96Dual));
        assert_eq!(WasherManifold::try_from(1).ok(), Some(WasherManifold::Tube192));
        assert_eq!(WasherManifold::try_from(2).ok(), Some(WasherManifold::Tube128));
        assert_eq!(WasherManifold::try_from(3).ok(), Some(WasherManifold::Tube96Single));
        assert_eq!(WasherManifold::try_from(4).ok(), Some(WasherManifold::DeepPin96));
        assert_eq!(WasherManifold::try_from(255).ok(), Some(WasherManifold::NotInstalled));
        assert!(!WasherManifold::NotInstalled.installed());
        assert!(WasherManifold::Tube192.installed());
    }

    #[test]
    fn washer_manifold_unknown_value_names_valid_set() {
        let err = WasherManifold::try_from(7).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("washer manifold type"));
        assert!(text.contains("7 (0x07)"));
        assert!(text.contains("0, 1, 2, 3, 4, 255"));
    }

    #[test]
    fn syringe_manifold_values() {
        assert_eq!(SyringeManifold::try_from(0).ok(), Some(SyringeManifold::NotInstalled));
        assert_eq!(SyringeManifold::try_from(4).ok(), Some(SyringeManifold::Tube16_7));
        assert_eq!(SyringeManifold::try_from(9).ok(), Some(SyringeManifold::Plate48Well));
        assert!(SyringeManifold::try_from(10).is_err());
    }

    #[test]
    fn sensor_and_motor_values() {
        assert_eq!(Sensor::Vacuum.wire_byte(), 0);
        assert_eq!(Sensor::Plate.wire_byte(), 5);
        assert_eq!(Motor::CarrierX.wire_byte(), 0);
        assert_eq!(Motor::PeriPumpSecondary.wire_byte(), 7);
    }

    #[test]
    fn home_type_values() {
        assert_eq!(MotorHomeType::InitAllMotors.wire_byte(), 1);
        assert_eq!(MotorHomeType::InitPeriPump.wire_byte(), 2);
        assert_eq!(MotorHomeType::HomeMotor.wire_byte(), 3);
        assert_eq!(MotorHomeType::HomeXyzMotors.wire_byte(), 4);
        assert_eq!(MotorHomeType::VerifyMotor.wire_byte(), 5);
        assert_eq!(MotorHomeType::VerifyXyzMotors.wire_byte(), 6);
    }

    #[test]
    fn step_type_values() {
        assert_eq!(StepType::PeristalticPrime.wire_byte(), 2);
        assert_eq!(StepType::ManifoldWash.wire_byte(), 6);
        assert_eq!(StepType::ManifoldAspirate.wire_byte(), 7);
    }

    #[test]
    fn device_state_decodes() {
        assert_eq!(DeviceState::try_from(1).ok(), Some(DeviceState::Initial));
        assert_eq!(DeviceState::try_from(4).ok(), Some(DeviceState::Stopped));
        assert!(DeviceState::try_from(0).is_err());
        assert!(DeviceState::try_from(5).is_err());
    }
}

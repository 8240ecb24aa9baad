//! EL406 protocol command definitions

use std::fmt;

use crate::error::{Error, Result};

/// Protocol command codes
///
/// Codes above 0xFF occupy both command bytes of the frame header.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Command {
    // Control commands
    Reset = 0x70,
    TestComm = 0x73,
    Abort = 0x89,
    Pause = 0x8A,
    Resume = 0x8B,
    EndOfBatch = 0x8C,
    StartStep = 0x8D,
    StatusPoll = 0x92,
    RunSelfCheck = 0x95,
    InitState = 0xA0,

    // Step commands
    PeristalticDispense = 0x8F,
    PeristalticPrime = 0x90,
    PeristalticPurge = 0x91,
    SyringeDispense = 0xA1,
    SyringePrime = 0xA2,
    ShakeSoak = 0xA3,
    ManifoldWash = 0xA4,
    ManifoldAspirate = 0xA5,
    ManifoldDispense = 0xA6,
    ManifoldPrime = 0xA7,
    ManifoldAutoClean = 0xA8,

    /// Peristaltic dispense on AO-fitted instruments
    PeristalticDispenseAo = 0x177,

    // Action commands
    AutoPrime = 0xC7,
    HomeMotors = 0xC8,
    SetWasherManifold = 0xD9,
    VacuumPump = 0x12B,

    // Query commands
    GetSyringeManifold = 0xBB,
    GetSensorEnabled = 0xD2,
    GetWasherManifold = 0xD8,
    GetSyringeBoxInfo = 0xF6,
    GetSerialNumber = 0x100,
    GetPeristalticInstalled = 0x104,
}

impl Command {
    /// Command code as carried in the frame header.
    pub fn code(self) -> u16 {
        self as u16
    }

    /// Get command name
    pub fn name(self) -> &'static str {
        match self {
            Self::Reset => "RESET",
            Self::TestComm => "TEST_COMM",
            Self::Abort => "ABORT",
            Self::Pause => "PAUSE",
            Self::Resume => "RESUME",
            Self::EndOfBatch => "END_OF_BATCH",
            Self::StartStep => "START_STEP",
            Self::StatusPoll => "STATUS_POLL",
            Self::RunSelfCheck => "RUN_SELF_CHECK",
            Self::InitState => "INIT_STATE",
            Self::PeristalticDispense => "PERISTALTIC_DISPENSE",
            Self::PeristalticPrime => "PERISTALTIC_PRIME",
            Self::PeristalticPurge => "PERISTALTIC_PURGE",
            Self::SyringeDispense => "SYRINGE_DISPENSE",
            Self::SyringePrime => "SYRINGE_PRIME",
            Self::ShakeSoak => "SHAKE_SOAK",
            Self::ManifoldWash => "MANIFOLD_WASH",
            Self::ManifoldAspirate => "MANIFOLD_ASPIRATE",
            Self::ManifoldDispense => "MANIFOLD_DISPENSE",
            Self::ManifoldPrime => "MANIFOLD_PRIME",
            Self::ManifoldAutoClean => "MANIFOLD_AUTO_CLEAN",
            Self::PeristalticDispenseAo => "PERISTALTIC_DISPENSE_AO",
            Self::AutoPrime => "AUTO_PRIME",
            Self::HomeMotors => "HOME_VERIFY_MOTORS",
            Self::SetWasherManifold => "SET_WASHER_MANIFOLD",
            Self::VacuumPump => "VACUUM_PUMP_CONTROL",
            Self::GetSyringeManifold => "GET_SYRINGE_MANIFOLD",
            Self::GetSensorEnabled => "GET_SENSOR_ENABLED",
            Self::GetWasherManifold => "GET_WASHER_MANIFOLD",
            Self::GetSyringeBoxInfo => "GET_SYRINGE_BOX_INFO",
            Self::GetSerialNumber => "GET_SERIAL_NUMBER",
            Self::GetPeristalticInstalled => "GET_PERISTALTIC_INSTALLED",
        }
    }
}

impl From<Command> for u16 {
    fn from(cmd: Command) -> u16 {
        cmd as u16
    }
}

impl TryFrom<u16> for Command {
    type Error = Error;

    fn try_from(value: u16) -> Result<Self> {
        match value {
            0x70 => Ok(Self::Reset),
            0x73 => Ok(Self::TestComm),
            0x89 => Ok(Self::Abort),
            0x8A => Ok(Self::Pause),
            0x8B => Ok(Self::Resume),
            0x8C => Ok(Self::EndOfBatch),
            0x8D => Ok(Self::StartStep),
            0x8F => Ok(Self::PeristalticDispense),
            0x90 => Ok(Self::PeristalticPrime),
            0x91 => Ok(Self::PeristalticPurge),
            0x92 => Ok(Self::StatusPoll),
            0x95 => Ok(Self::RunSelfCheck),
            0xA0 => Ok(Self::InitState),
            0xA1 => Ok(Self::SyringeDispense),
            0xA2 => Ok(Self::SyringePrime),
            0xA3 => Ok(Self::ShakeSoak),
            0xA4 => Ok(Self::ManifoldWash),
            0xA5 => Ok(Self::ManifoldAspirate),
            0xA6 => Ok(Self::ManifoldDispense),
            0xA7 => Ok(Self::ManifoldPrime),
            0xA8 => Ok(Self::ManifoldAutoClean),
            0xBB => Ok(Self::GetSyringeManifold),
            0xC7 => Ok(Self::AutoPrime),
            0xC8 => Ok(Self::HomeMotors),
            0xD2 => Ok(Self::GetSensorEnabled),
            0xD8 => Ok(Self::GetWasherManifold),
            0xD9 => Ok(Self::SetWasherManifold),
            0xF6 => Ok(Self::GetSyringeBoxInfo),
            0x100 => Ok(Self::GetSerialNumber),
            0x104 => Ok(Self::GetPeristalticInstalled),
            0x12B => Ok(Self::VacuumPump),
            0x177 => Ok(Self::PeristalticDispenseAo),
            _ => Err(Error::UnknownCommand(value)),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:02X})", self.name(), self.code())
    }
}

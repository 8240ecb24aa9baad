//! Type definitions for el406

pub mod error;
pub mod fluidics;
pub mod instrument;
pub mod params;
pub mod plate;

pub use error::{Error, Result};
pub use fluidics::{
    Buffer, Cassette, PeristalticAmount, PeristalticFlowRate, PeristalticPump, ShakeIntensity,
    Syringe, TravelRate,
};
pub use instrument::{
    DeviceState, InstrumentSettings, Motor, MotorHomeType, SelfCheckReport, Sensor, StepType,
    SyringeBoxInfo, SyringeManifold, WasherManifold,
};
pub use params::{
    AspirateParams, DispenseParams, PeristalticDispenseParams, PeristalticPrimeParams,
    PrimeParams, ShakeParams, SyringeDispenseParams, SyringePrimeParams, WashParams,
};
pub use plate::{PlateFormat, PlateGeometry, Sectors, WashFormat};

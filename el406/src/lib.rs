//! # el406
//!
//! Driver for BioTek EL406 microplate washer dispensers over their
//! USB-serial link.
//!
//! ## Features
//!
//! - Type-safe command surface for every washer, syringe and
//!   peristaltic operation
//! - Async/await API using Tokio
//! - Plate-format aware parameter defaults and host-side validation
//! - Automatic batch lifecycle around step commands
//!
//! ## Quick Start
//!
//! ```no_run
//! use el406::{El406, PlateFormat, WashParams};
//!
//! #[tokio::main]
//! async fn main() -> el406::Result<()> {
//!     // Connect to the instrument
//!     let mut device = El406::new("/dev/ttyUSB0");
//!     device.setup().await?;
//!
//!     // Wash a 96-well plate with the front-panel defaults
//!     device
//!         .manifold_wash(PlateFormat::Well96, &WashParams::default())
//!         .await?;
//!
//!     device.stop().await?;
//!     Ok(())
//! }
//! ```

pub mod actions;
pub mod batch;
pub mod device;
pub mod error;
pub mod queries;
pub mod steps;

// Re-exports
pub use device::El406;
pub use error::{Error, Result};

// Re-export the domain vocabulary
pub use el406_core::Command;
pub use el406_transport::{list_ports, MockTransport, PortInfo, SerialTransport, Transport};
pub use el406_types::{
    AspirateParams, Buffer, Cassette, DeviceState, DispenseParams, InstrumentSettings, Motor,
    MotorHomeType, PeristalticAmount, PeristalticDispenseParams, PeristalticFlowRate,
    PeristalticPrimeParams, PeristalticPump, PlateFormat, PlateGeometry, PrimeParams, Sectors,
    SelfCheckReport, Sensor, ShakeIntensity, ShakeParams, StepType, Syringe, SyringeBoxInfo,
    SyringeDispenseParams, SyringeManifold, SyringePrimeParams, TravelRate, WashFormat,
    WashParams, WasherManifold,
};

//! Parameter bundles for the step commands
//!
//! Each struct mirrors the front-panel options of one step. `Default`
//! gives the instrument's own defaults; fields left as `None` resolve
//! against the plate format's geometry when the command is built.

use crate::fluidics::{
    Buffer, Cassette, PeristalticAmount, PeristalticFlowRate, PeristalticPump, ShakeIntensity,
    Syringe, TravelRate,
};
use crate::plate::{Sectors, WashFormat};

/// Options for a manifold wash.
///
/// A wash is cycles of dispense then aspirate with optional shake,
/// soak, bottom-wash and final-aspirate phases. Offsets are in device
/// steps, volumes in microliters, durations in seconds unless a field
/// name says otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct WashParams {
    /// Number of wash cycles, 1 to 250
    pub cycles: u8,

    /// Buffer valve for both dispense phases
    pub buffer: Buffer,

    /// Dispense volume per well, 25 to 3000. `None` uses the format
    /// default (300 for 96 wells, otherwise 100).
    pub dispense_volume: Option<u16>,

    /// Dispense flow rate, 1 to 9
    pub dispense_flow_rate: u8,

    pub dispense_x: i8,
    pub dispense_y: i8,

    /// `None` uses the format's dispense height
    pub dispense_z: Option<u16>,

    /// Aspirate head travel rate, 1 to 9
    pub aspirate_travel_rate: u8,

    /// `None` uses the format's aspirate height
    pub aspirate_z: Option<u16>,

    /// Pre-dispense flow rate, 3 to 11
    pub pre_dispense_flow_rate: u8,

    /// Post-aspirate delay between cycles, milliseconds
    pub aspirate_delay_ms: u16,

    pub aspirate_x: i8,
    pub aspirate_y: i8,

    /// Aspirate once more after the last cycle
    pub final_aspirate: bool,

    /// `None` inherits the primary aspirate height
    pub final_aspirate_z: Option<u16>,

    pub final_aspirate_x: i8,
    pub final_aspirate_y: i8,

    /// Post-aspirate delay for the final aspirate, milliseconds
    pub final_aspirate_delay_ms: u16,

    /// 0 disables, otherwise 25 to 3000
    pub pre_dispense_volume: u16,

    /// 0 disables. Required above 0 for cell-wash flow rates 1 and 2.
    pub vacuum_delay_volume: u16,

    pub soak_duration: u16,
    pub shake_duration: u16,
    pub shake_intensity: ShakeIntensity,

    /// Aspirate a second position each cycle
    pub secondary_aspirate: bool,

    /// `None` uses the format's aspirate height
    pub secondary_z: Option<u16>,

    pub secondary_x: i8,
    pub secondary_y: i8,

    /// Aspirate a second position after the final aspirate
    pub final_secondary_aspirate: bool,

    /// `None` inherits the final aspirate height
    pub final_secondary_z: Option<u16>,

    pub final_secondary_x: i8,
    pub final_secondary_y: i8,

    /// First-cycle dispense uses the bottom-wash volume and flow
    pub bottom_wash: bool,

    pub bottom_wash_volume: u16,

    /// Bottom-wash flow rate, 1 to 9
    pub bottom_wash_flow_rate: u8,

    /// Pre-dispense between cycles. 0 falls back to the main
    /// pre-dispense volume and flow.
    pub between_cycles_volume: u16,

    pub between_cycles_flow_rate: u8,

    pub wash_format: WashFormat,

    /// Quadrants addressed when `wash_format` is `Sector`
    pub sectors: Sectors,

    pub move_home_first: bool,
}

impl Default for WashParams {
    fn default() -> Self {
        Self {
            cycles: 3,
            buffer: Buffer::A,
            dispense_volume: None,
            dispense_flow_rate: 7,
            dispense_x: 0,
            dispense_y: 0,
            dispense_z: None,
            aspirate_travel_rate: 3,
            aspirate_z: None,
            pre_dispense_flow_rate: 9,
            aspirate_delay_ms: 0,
            aspirate_x: 0,
            aspirate_y: 0,
            final_aspirate: true,
            final_aspirate_z: None,
            final_aspirate_x: 0,
            final_aspirate_y: 0,
            final_aspirate_delay_ms: 0,
            pre_dispense_volume: 0,
            vacuum_delay_volume: 0,
            soak_duration: 0,
            shake_duration: 0,
            shake_intensity: ShakeIntensity::Medium,
            secondary_aspirate: false,
            secondary_z: None,
            secondary_x: 0,
            secondary_y: 0,
            final_secondary_aspirate: false,
            final_secondary_z: None,
            final_secondary_x: 0,
            final_secondary_y: 0,
            bottom_wash: false,
            bottom_wash_volume: 0,
            bottom_wash_flow_rate: 5,
            between_cycles_volume: 0,
            between_cycles_flow_rate: 9,
            wash_format: WashFormat::Plate,
            sectors: Sectors::all(),
            move_home_first: false,
        }
    }
}

/// Options for a manifold aspirate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AspirateParams {
    /// Vacuum filtration mode. Ignores the travel rate and delay and
    /// holds vacuum for `vacuum_time_secs` instead.
    pub vacuum_filtration: bool,

    pub travel_rate: TravelRate,

    /// Post-aspirate delay, 0 to 5000 ms
    pub delay_ms: u16,

    /// Vacuum filtration hold, 5 to 999 s
    pub vacuum_time_secs: u16,

    pub offset_x: i8,
    pub offset_y: i8,

    /// `None` uses the format's aspirate height
    pub offset_z: Option<u16>,

    /// Aspirate a second position
    pub secondary_aspirate: bool,

    pub secondary_x: i8,
    pub secondary_y: i8,
    pub secondary_z: Option<u16>,
}

impl Default for AspirateParams {
    fn default() -> Self {
        Self {
            vacuum_filtration: false,
            travel_rate: TravelRate::Standard3,
            delay_ms: 0,
            vacuum_time_secs: 30,
            offset_x: 0,
            offset_y: 0,
            offset_z: None,
            secondary_aspirate: false,
            secondary_x: 0,
            secondary_y: 0,
            secondary_z: None,
        }
    }
}

/// Options for a manifold dispense. The volume is passed with the
/// command itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispenseParams {
    pub buffer: Buffer,

    /// Flow rate, 1 to 11. Rates 1 and 2 are cell-wash rates and
    /// require a vacuum delay volume.
    pub flow_rate: u8,

    pub offset_x: i8,
    pub offset_y: i8,

    /// `None` uses the format's dispense height
    pub offset_z: Option<u16>,

    /// 0 disables, otherwise 25 to 3000
    pub pre_dispense_volume: u16,

    /// Pre-dispense flow rate, 3 to 11
    pub pre_dispense_flow_rate: u8,

    pub vacuum_delay_volume: u16,
}

impl Default for DispenseParams {
    fn default() -> Self {
        Self {
            buffer: Buffer::A,
            flow_rate: 7,
            offset_x: 0,
            offset_y: 0,
            offset_z: None,
            pre_dispense_volume: 0,
            pre_dispense_flow_rate: 9,
            vacuum_delay_volume: 0,
        }
    }
}

/// Options for a manifold prime. The volume is passed with the
/// command itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimeParams {
    pub buffer: Buffer,

    /// Flow rate, 3 to 11
    pub flow_rate: u8,

    /// Low-flow phase volume in microliters, 0 or 5000 to 999000
    pub low_flow_volume: u32,

    /// Tip submerge after the prime, 0 or a whole minute count given
    /// in seconds (60 to 86340)
    pub submerge_duration_secs: u32,
}

impl Default for PrimeParams {
    fn default() -> Self {
        Self {
            buffer: Buffer::A,
            flow_rate: 9,
            low_flow_volume: 5000,
            submerge_duration_secs: 0,
        }
    }
}

/// Options for a standalone shake or soak.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShakeParams {
    /// Shake duration, 0 to 3599 s. 0 disables the shake phase.
    pub duration_secs: u16,

    pub intensity: ShakeIntensity,

    /// Soak duration, 0 to 3599 s. 0 disables the soak phase.
    pub soak_duration_secs: u16,

    pub move_home_first: bool,
}

impl Default for ShakeParams {
    fn default() -> Self {
        Self {
            duration_secs: 0,
            intensity: ShakeIntensity::Medium,
            soak_duration_secs: 0,
            move_home_first: true,
        }
    }
}

/// Options for a syringe dispense. The volume is passed with the
/// command itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyringeDispenseParams {
    pub syringe: Syringe,

    /// Flow rate, 1 to 5
    pub flow_rate: u8,

    pub offset_x: i8,
    pub offset_y: i8,

    /// `None` uses the format's dispenser height
    pub offset_z: Option<u16>,

    /// Delay between pump strokes, 0 to 5000 ms
    pub pump_delay_ms: u16,

    pub pre_dispense: bool,

    /// Encoded only when `pre_dispense` is set
    pub pre_dispense_volume: u16,

    pub num_pre_dispenses: u8,

    /// 1-indexed columns to dispense to, `None` for the whole plate
    pub columns: Option<Vec<u8>>,
}

impl Default for SyringeDispenseParams {
    fn default() -> Self {
        Self {
            syringe: Syringe::A,
            flow_rate: 2,
            offset_x: 0,
            offset_y: 0,
            offset_z: None,
            pump_delay_ms: 0,
            pre_dispense: false,
            pre_dispense_volume: 0,
            num_pre_dispenses: 2,
            columns: None,
        }
    }
}

/// Options for a syringe prime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyringePrimeParams {
    pub syringe: Syringe,

    /// Prime volume, 80 to 9999 microliters
    pub volume: u16,

    /// Flow rate, 1 to 5
    pub flow_rate: u8,

    /// Prime cycles, 1 to 255
    pub refills: u8,

    /// Delay between cycles, 0 to 5000 ms
    pub pump_delay_ms: u16,

    /// Leave the tips submerged after the prime
    pub submerge_tips: bool,

    /// Submerge time in minutes, 0 to 1439. Encoded only when
    /// `submerge_tips` is set.
    pub submerge_duration_min: u16,
}

impl Default for SyringePrimeParams {
    fn default() -> Self {
        Self {
            syringe: Syringe::A,
            volume: 5000,
            flow_rate: 5,
            refills: 2,
            pump_delay_ms: 0,
            submerge_tips: true,
            submerge_duration_min: 0,
        }
    }
}

/// Options for a peristaltic prime or purge.
///
/// A prime without an amount moves 1000 microliters; a purge requires
/// an explicit amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PeristalticPrimeParams {
    pub amount: Option<PeristalticAmount>,
    pub flow_rate: PeristalticFlowRate,
    pub cassette: Cassette,
    pub pump: PeristalticPump,
}

/// Options for a peristaltic dispense. The volume is passed with the
/// command itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeristalticDispenseParams {
    pub flow_rate: PeristalticFlowRate,
    pub cassette: Cassette,

    /// X offset, -125 to 125
    pub offset_x: i8,

    /// Y offset, -40 to 40
    pub offset_y: i8,

    /// Dispense height, 1 to 1500. `None` uses the format's dispenser
    /// height.
    pub offset_z: Option<u16>,

    pub pre_dispense_volume: u16,
    pub num_pre_dispenses: u8,

    /// 1-indexed columns to dispense to, `None` for the whole plate
    pub columns: Option<Vec<u8>>,

    /// 1-indexed row groups to dispense to, `None` for all
    pub rows: Option<Vec<u8>>,

    pub pump: PeristalticPump,
}

impl Default for PeristalticDispenseParams {
    fn default() -> Self {
        Self {
            flow_rate: PeristalticFlowRate::High,
            cassette: Cassette::Any,
            offset_x: 0,
            offset_y: 0,
            offset_z: None,
            pre_dispense_volume: 10,
            num_pre_dispenses: 2,
            columns: None,
            rows: None,
            pump: PeristalticPump::Primary,
        }
    }
}

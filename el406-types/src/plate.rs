//! Plate formats and their physical defaults

use std::fmt;

use crate::error::{Error, Result};

/// Plate format selector.
///
/// The discriminant is the byte the instrument expects as the first
/// payload byte of every step command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PlateFormat {
    /// 1536-well, standard height
    Well1536 = 0,

    /// 384-well, standard height
    Well384 = 1,

    /// 384-well PCR (low profile)
    Well384Pcr = 2,

    /// 96-well
    Well96 = 4,

    /// 1536-well with flange (low profile)
    Well1536Flange = 14,
}

/// Physical defaults for one plate format, in device Z units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlateGeometry {
    /// Dispense head height for the syringe and peristaltic pumps
    pub dispenser_height: u16,

    /// Default manifold dispense height
    pub dispense_z: u16,

    /// Default manifold aspirate height
    pub aspirate_z: u16,

    /// Well columns across the long axis (12, 24 or 48)
    pub columns: u8,

    /// Wells per column (8, 16 or 32)
    pub rows: u8,
}

impl PlateFormat {
    /// Byte sent on the wire to select this format.
    pub const fn wire_byte(self) -> u8 {
        self as u8
    }

    /// Physical defaults for this format.
    pub const fn geometry(self) -> PlateGeometry {
        match self {
            PlateFormat::Well1536 => PlateGeometry {
                dispenser_height: 250,
                dispense_z: 94,
                aspirate_z: 42,
                columns: 48,
                rows: 32,
            },
            PlateFormat::Well384 => PlateGeometry {
                dispenser_height: 333,
                dispense_z: 120,
                aspirate_z: 22,
                columns: 24,
                rows: 16,
            },
            PlateFormat::Well384Pcr => PlateGeometry {
                dispenser_height: 230,
                dispense_z: 83,
                aspirate_z: 2,
                columns: 24,
                rows: 16,
            },
            PlateFormat::Well96 => PlateGeometry {
                dispenser_height: 336,
                dispense_z: 121,
                aspirate_z: 29,
                columns: 12,
                rows: 8,
            },
            PlateFormat::Well1536Flange => PlateGeometry {
                dispenser_height: 196,
                dispense_z: 93,
                aspirate_z: 13,
                columns: 48,
                rows: 32,
            },
        }
    }

    /// Total number of wells.
    pub const fn well_count(self) -> u16 {
        let g = self.geometry();
        g.columns as u16 * g.rows as u16
    }

    /// Highest 1-indexed column number addressable on this format.
    pub const fn max_columns(self) -> u8 {
        self.geometry().columns
    }

    /// Number of row groups addressable by the peristaltic row mask.
    pub const fn row_groups(self) -> u8 {
        match self {
            PlateFormat::Well96 => 1,
            PlateFormat::Well384 | PlateFormat::Well384Pcr => 2,
            PlateFormat::Well1536 | PlateFormat::Well1536Flange => 4,
        }
    }

    /// Default wash dispense volume in microliters.
    pub const fn default_dispense_volume(self) -> u16 {
        if self.well_count() == 96 {
            300
        } else {
            100
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            PlateFormat::Well1536 => "1536-well",
            PlateFormat::Well384 => "384-well",
            PlateFormat::Well384Pcr => "384-well PCR",
            PlateFormat::Well96 => "96-well",
            PlateFormat::Well1536Flange => "1536-well flanged",
        }
    }
}

impl TryFrom<u8> for PlateFormat {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(PlateFormat::Well1536),
            1 => Ok(PlateFormat::Well384),
            2 => Ok(PlateFormat::Well384Pcr),
            4 => Ok(PlateFormat::Well96),
            14 => Ok(PlateFormat::Well1536Flange),
            _ => Err(Error::UnknownValue {
                what: "plate format",
                value,
                valid: "0, 1, 2, 4, 14",
            }),
        }
    }
}

impl fmt::Display for PlateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Addressing mode of a wash step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WashFormat {
    /// Whole plate
    Plate = 0,

    /// Selected sectors only
    Sector = 1,
}

impl WashFormat {
    pub const fn wire_byte(self) -> u8 {
        self as u8
    }
}

bitflags::bitflags! {
    /// Plate quadrants addressed by a sector-format wash.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Sectors: u16 {
        const QUADRANT_1 = 1 << 0;
        const QUADRANT_2 = 1 << 1;
        const QUADRANT_3 = 1 << 2;
        const QUADRANT_4 = 1 << 3;
    }
}

impl Default for Sectors {
    fn default() -> Self {
        Sectors::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometry_defaults_96_well() {
        let g = PlateFormat::Well96.geometry();
        assert_eq!(g.dispenser_height, 336);
        assert_eq!(g.dispense_z, 121);
        assert_eq!(g.aspirate_z, 29);
        assert_eq!(g.columns, 12);
        assert_eq!(g.rows, 8);
    }

    #[test]
    fn geometry_defaults_1536_flanged() {
        let g = PlateFormat::Well1536Flange.geometry();
        assert_eq!(g.dispenser_height, 196);
        assert_eq!(g.dispense_z, 93);
        assert_eq!(g.aspirate_z, 13);
        assert_eq!(g.columns, 48);
        assert_eq!(g.rows, 32);
    }

    #[test]
    fn well_counts() {
        assert_eq!(PlateFormat::Well96.well_count(), 96);
        assert_eq!(PlateFormat::Well384.well_count(), 384);
        assert_eq!(PlateFormat::Well384Pcr.well_count(), 384);
        assert_eq!(PlateFormat::Well1536.well_count(), 1536);
        assert_eq!(PlateFormat::Well1536Flange.well_count(), 1536);
    }

    #[test]
    fn default_volume_is_300_only_for_96_wells() {
        assert_eq!(PlateFormat::Well96.default_dispense_volume(), 300);
        assert_eq!(PlateFormat::Well384.default_dispense_volume(), 100);
        assert_eq!(PlateFormat::Well384Pcr.default_dispense_volume(), 100);
        assert_eq!(PlateFormat::Well1536.default_dispense_volume(), 100);
        assert_eq!(PlateFormat::Well1536Flange.default_dispense_volume(), 100);
    }

    #[test]
    fn row_groups_per_format() {
        assert_eq!(PlateFormat::Well96.row_groups(), 1);
        assert_eq!(PlateFormat::Well384.row_groups(), 2);
        assert_eq!(PlateFormat::Well384Pcr.row_groups(), 2);
        assert_eq!(PlateFormat::Well1536.row_groups(), 4);
        assert_eq!(PlateFormat::Well1536Flange.row_groups(), 4);
    }

    #[test]
    fn wire_bytes_round_trip() {
        for format in [
            PlateFormat::Well1536,
            PlateFormat::Well384,
            PlateFormat::Well384Pcr,
            PlateFormat::Well96,
            PlateFormat::Well1536Flange,
        ] {
            assert_eq!(PlateFormat::try_from(format.wire_byte()).ok(), Some(format));
        }
    }

    #[test]
    fn unknown_wire_byte_is_rejected() {
        let err = PlateFormat::try_from(3).unwrap_err();
        assert!(err.to_string().contains("plate format"));
        assert!(err.to_string().contains("0x03"));
    }

    #[test]
    fn sectors_default_to_all_quadrants() {
        assert_eq!(Sectors::default().bits(), 0x000F);
    }
}

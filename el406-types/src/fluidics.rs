//! Fluid path selectors shared by the step commands

use std::fmt;

use crate::error::{Error, Result};

/// Buffer supply valve.
///
/// The manifold commands carry the valve as an ASCII letter while the
/// syringe commands expect a zero-based index. The two encodings are
/// not interchangeable on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Buffer {
    A,
    B,
    C,
    D,
}

impl Buffer {
    /// ASCII encoding used by the manifold command family.
    pub const fn ascii_byte(self) -> u8 {
        b'A' + self.index_byte()
    }

    /// Index encoding used where a numeric valve is expected.
    pub const fn index_byte(self) -> u8 {
        match self {
            Buffer::A => 0,
            Buffer::B => 1,
            Buffer::C => 2,
            Buffer::D => 3,
        }
    }
}

impl TryFrom<char> for Buffer {
    type Error = Error;

    fn try_from(value: char) -> Result<Self> {
        match value.to_ascii_uppercase() {
            'A' => Ok(Buffer::A),
            'B' => Ok(Buffer::B),
            'C' => Ok(Buffer::C),
            'D' => Ok(Buffer::D),
            _ => Err(Error::UnknownLabel {
                what: "buffer",
                value: value.to_string(),
                valid: "A, B, C, D",
            }),
        }
    }
}

impl fmt::Display for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ascii_byte() as char)
    }
}

/// Syringe pump selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Syringe {
    A = 0,
    B = 1,
    Both = 2,
}

impl Syringe {
    /// Pump index carried at the head of syringe payloads.
    pub const fn index_byte(self) -> u8 {
        self as u8
    }

    /// Bottle selector used by syringe dispense.
    pub const fn bottle_byte(self) -> u8 {
        match self {
            Syringe::A => 0,
            Syringe::B => 2,
            Syringe::Both => 4,
        }
    }
}

impl fmt::Display for Syringe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Syringe::A => "A",
            Syringe::B => "B",
            Syringe::Both => "Both",
        };
        f.write_str(label)
    }
}

/// Peristaltic pump cassette size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Cassette {
    #[default]
    Any = 0,
    OneMicroliter = 1,
    FiveMicroliter = 2,
    TenMicroliter = 3,
}

impl Cassette {
    pub const fn wire_byte(self) -> u8 {
        self as u8
    }
}

/// Peristaltic pump selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum PeristalticPump {
    #[default]
    Primary = 1,
    Secondary = 2,
}

impl PeristalticPump {
    pub const fn wire_byte(self) -> u8 {
        self as u8
    }
}

/// Peristaltic flow rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum PeristalticFlowRate {
    Low = 0,
    Medium = 1,
    #[default]
    High = 2,
}

impl PeristalticFlowRate {
    pub const fn wire_byte(self) -> u8 {
        self as u8
    }
}

/// Amount moved by a peristaltic prime or purge. The instrument accepts
/// a volume or a duration, never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeristalticAmount {
    /// Microliters, 1 to 3000
    Volume(u16),

    /// Seconds, 1 to 300
    Duration(u16),
}

/// Aspirate carrier travel rate.
///
/// Rates map through a fixed table. The cell-wash rates are not a
/// linear extension of the standard ones and rate "5 CW" does not
/// exist on this instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TravelRate {
    Standard1,
    Standard2,
    Standard3,
    Standard4,
    Standard5,
    CellWash1,
    CellWash2,
    CellWash3,
    CellWash4,
    CellWash6,
}

impl TravelRate {
    pub const fn wire_byte(self) -> u8 {
        match self {
            TravelRate::Standard1 => 1,
            TravelRate::Standard2 => 2,
            TravelRate::Standard3 => 3,
            TravelRate::Standard4 => 4,
            TravelRate::Standard5 => 5,
            TravelRate::CellWash1 => 7,
            TravelRate::CellWash2 => 8,
            TravelRate::CellWash3 => 9,
            TravelRate::CellWash4 => 10,
            TravelRate::CellWash6 => 6,
        }
    }

    /// Parses the front-panel label, e.g. `"3"` or `"2 CW"`.
    pub fn from_label(label: &str) -> Result<Self> {
        match label {
            "1" => Ok(TravelRate::Standard1),
            "2" => Ok(TravelRate::Standard2),
            "3" => Ok(TravelRate::Standard3),
            "4" => Ok(TravelRate::Standard4),
            "5" => Ok(TravelRate::Standard5),
            "1 CW" => Ok(TravelRate::CellWash1),
            "2 CW" => Ok(TravelRate::CellWash2),
            "3 CW" => Ok(TravelRate::CellWash3),
            "4 CW" => Ok(TravelRate::CellWash4),
            "6 CW" => Ok(TravelRate::CellWash6),
            _ => Err(Error::UnknownLabel {
                what: "travel rate",
                value: label.to_string(),
                valid: "1, 2, 3, 4, 5, 1 CW, 2 CW, 3 CW, 4 CW, 6 CW",
            }),
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            TravelRate::Standard1 => "1",
            TravelRate::Standard2 => "2",
            TravelRate::Standard3 => "3",
            TravelRate::Standard4 => "4",
            TravelRate::Standard5 => "5",
            TravelRate::CellWash1 => "1 CW",
            TravelRate::CellWash2 => "2 CW",
            TravelRate::CellWash3 => "3 CW",
            TravelRate::CellWash4 => "4 CW",
            TravelRate::CellWash6 => "6 CW",
        }
    }
}

impl fmt::Display for TravelRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Shake intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum ShakeIntensity {
    Variable = 1,
    Slow = 2,
    #[default]
    Medium = 3,
    Fast = 4,
}

impl ShakeIntensity {
    pub const fn wire_byte(self) -> u8 {
        self as u8
    }
}

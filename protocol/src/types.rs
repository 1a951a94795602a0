//! Shared protocol vocabulary: link protocols, attributes and device sides

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Link protocol spoken by a pair of devices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Protocol {
    #[serde(rename = "DMC_BS")]
    DmcBs,
    #[serde(rename = "DM20_BS")]
    Dm20Bs,
    #[serde(rename = "PEN20_BS")]
    Pen20Bs,
    #[serde(rename = "DMX_BS")]
    DmxBs,
}

impl Protocol {
    pub const ALL: [Protocol; 4] = [
        Protocol::DmcBs,
        Protocol::Dm20Bs,
        Protocol::Pen20Bs,
        Protocol::DmxBs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::DmcBs => "DMC_BS",
            Protocol::Dm20Bs => "DM20_BS",
            Protocol::Pen20Bs => "PEN20_BS",
            Protocol::DmxBs => "DMX_BS",
        }
    }

    /// Packets each device sends during one encounter
    pub fn packet_count(&self) -> usize {
        match self {
            Protocol::DmcBs => 4,
            Protocol::Dm20Bs => 11,
            Protocol::Pen20Bs => 10,
            Protocol::DmxBs => 6,
        }
    }

    /// Upper bound on the number of turns in the battle log
    pub fn turn_limit(&self) -> usize {
        match self {
            Protocol::DmcBs => 5,
            Protocol::Dm20Bs => 6,
            Protocol::Pen20Bs => 6,
            Protocol::DmxBs => 5,
        }
    }

    /// Whether attribute advantage is applied as a raw power bonus
    /// (DM20 family and DMX) rather than flat hit-rate points
    pub fn uses_power_bonus(&self) -> bool {
        !matches!(self, Protocol::DmcBs)
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DMC_BS" | "DMC" => Ok(Protocol::DmcBs),
            "DM20_BS" | "DM20" => Ok(Protocol::Dm20Bs),
            "PEN20_BS" | "PEN20" => Ok(Protocol::Pen20Bs),
            "DMX_BS" | "DMX" => Ok(Protocol::DmxBs),
            _ => Err(ProtocolError::UnknownProtocol(s.to_string())),
        }
    }
}

/// Combatant attribute. Vaccine beats Virus, Virus beats Data,
/// Data beats Vaccine. Free is neutral against everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Attribute {
    Vaccine = 0,
    Data = 1,
    Virus = 2,
    #[default]
    Free = 3,
}

impl Attribute {
    pub const ALL: [Attribute; 4] = [
        Attribute::Vaccine,
        Attribute::Data,
        Attribute::Virus,
        Attribute::Free,
    ];

    /// 2-bit wire code
    pub fn code(&self) -> u8 {
        *self as u8
    }

    pub fn from_code(code: u8) -> Self {
        match code & 0x3 {
            0 => Attribute::Vaccine,
            1 => Attribute::Data,
            2 => Attribute::Virus,
            _ => Attribute::Free,
        }
    }

    /// Whether `self` has the advantage over `other`
    pub fn beats(&self, other: Attribute) -> bool {
        matches!(
            (self, other),
            (Attribute::Vaccine, Attribute::Virus)
                | (Attribute::Virus, Attribute::Data)
                | (Attribute::Data, Attribute::Vaccine)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Attribute::Vaccine => "Vaccine",
            Attribute::Data => "Data",
            Attribute::Virus => "Virus",
            Attribute::Free => "Free",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Attribute {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "vaccine" | "va" => Ok(Attribute::Vaccine),
            "data" | "da" => Ok(Attribute::Data),
            "virus" | "vi" => Ok(Attribute::Virus),
            "free" | "" => Ok(Attribute::Free),
            _ => Err(ProtocolError::UnknownAttribute(s.to_string())),
        }
    }
}

/// One end of a battle link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Device1,
    Device2,
}

impl Side {
    pub fn opposite(&self) -> Side {
        match self {
            Side::Device1 => Side::Device2,
            Side::Device2 => Side::Device1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Device1 => "device1",
            Side::Device2 => "device2",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

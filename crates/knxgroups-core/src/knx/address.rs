use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupAddressStyle {
    ThreeLevel, // Main/Middle/Sub (5/3/8)
    TwoLevel,   // Main/Sub (5/11)
    Free,       // 16-bit identifier
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupAddress {
    pub value: u16,
    pub style: GroupAddressStyle,
}

impl GroupAddress {
    /// Creates a new GroupAddress with the default 3-level style.
    pub fn new(value: u16) -> Self {
        Self {
            value,
            style: GroupAddressStyle::ThreeLevel,
        }
    }

    /// Creates a new GroupAddress with a specific style.
    pub fn with_style(value: u16, style: GroupAddressStyle) -> Self {
        Self { value, style }
    }

    /// Parses `M/M/S`, `M/S` or a raw decimal value.
    ///
    /// The style of the result follows the notation that was parsed. Parts
    /// outside their bit width (main > 31, middle > 7, sub > 255 or > 2047)
    /// are rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        let parts: Vec<&str> = raw.trim().split('/').map(str::trim).collect();
        match parts.as_slice() {
            [value] => value
                .parse::<u16>()
                .ok()
                .map(|value| Self::with_style(value, GroupAddressStyle::Free)),
            [main, sub] => {
                let main = main.parse::<u16>().ok().filter(|v| *v <= 0x1F)?;
                let sub = sub.parse::<u16>().ok().filter(|v| *v <= 0x07FF)?;
                Some(Self::with_style((main << 11) | sub, GroupAddressStyle::TwoLevel))
            }
            [main, middle, sub] => {
                let main = main.parse::<u16>().ok().filter(|v| *v <= 0x1F)?;
                let middle = middle.parse::<u16>().ok().filter(|v| *v <= 0x07)?;
                let sub = sub.parse::<u16>().ok().filter(|v| *v <= 0xFF)?;
                Some(Self::with_style(
                    (main << 11) | (middle << 8) | sub,
                    GroupAddressStyle::ThreeLevel,
                ))
            }
            _ => None,
        }
    }

    /// Returns the raw 16-bit value.
    pub fn as_u16(&self) -> u16 {
        self.value
    }

    pub fn main_group(&self) -> u16 {
        (self.value >> 11) & 0x1F
    }
}

impl fmt::Display for GroupAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.style {
            GroupAddressStyle::ThreeLevel => {
                // 5 bits / 3 bits / 8 bits
                let main = self.main_group();
                let middle = (self.value >> 8) & 0x07;
                let sub = self.value & 0xFF;
                write!(f, "{}/{}/{}", main, middle, sub)
            }
            GroupAddressStyle::TwoLevel => {
                // 5 bits / 11 bits
                let main = self.main_group();
                let sub = self.value & 0x07FF;
                write!(f, "{}/{}", main, sub)
            }
            GroupAddressStyle::Free => write!(f, "{}", self.value),
        }
    }
}

use std::fmt;
use std::str::FromStr;

use super::errors::DomainError;

/// A six-digit Indian postal code with no leading zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pincode(u32);

impl Pincode {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let bytes = raw.as_bytes();
        let well_formed = bytes.len() == 6
            && bytes.iter().all(u8::is_ascii_digit)
            && bytes[0] != b'0';
        if !well_formed {
            return Err(DomainError::InvalidAddress(format!(
                "'{raw}' is not a valid 6-digit pincode"
            )));
        }
        raw.parse::<u32>()
            .map(Pincode)
            .map_err(|e| DomainError::InvalidAddress(e.to_string()))
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// Absolute numeric gap between two pincodes, the input to distance banding.
    pub fn gap(self, other: Pincode) -> u32 {
        self.0.abs_diff(other.0)
    }
}

impl FromStr for Pincode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Pincode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Number of function outputs (F0..F9) tracked per locomotive.
pub const FUNCTION_COUNT: usize = 10;

/// Opaque locomotive address token as configured on the address buttons.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocoAddress(String);

impl LocoAddress {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for LocoAddress {
    type Err = DomainError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let token = raw.trim();
        if token.is_empty() || token.chars().any(char::is_whitespace) {
            return Err(DomainError::InvalidAddress(raw.to_string()));
        }
        Ok(Self(token.to_string()))
    }
}

impl fmt::Display for LocoAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Speed step in `0..=1000`; the connector box caps every higher value at 1000.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Speed(u16);

impl Speed {
    pub const MAX: u16 = 1000;
    pub const ZERO: Speed = Speed(0);

    /// Clamps an arbitrary slider value into the accepted range.
    pub fn clamped(raw: i64) -> Self {
        Self(raw.clamp(0, i64::from(Self::MAX)) as u16)
    }

    pub fn value(self) -> u16 {
        self.0
    }

    /// Percentage shown next to the slider, rounded half up.
    pub fn percent(self) -> u8 {
        ((u32::from(self.0) * 100 + 500) / 1000) as u8
    }
}

impl fmt::Display for Speed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Forward,
    Reverse,
}

impl Direction {
    pub fn toggled(self) -> Self {
        match self {
            Self::Forward => Self::Reverse,
            Self::Reverse => Self::Forward,
        }
    }

    /// Binary form used by the locomotive record (0 or 1).
    pub fn bit(self) -> u8 {
        match self {
            Self::Forward => 0,
            Self::Reverse => 1,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forward => f.write_str("Forward"),
            Self::Reverse => f.write_str("Reverse"),
        }
    }
}

/// Function number in `0..FUNCTION_COUNT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct FunctionIndex(u8);

impl FunctionIndex {
    pub fn all() -> impl Iterator<Item = FunctionIndex> {
        (0..FUNCTION_COUNT as u8).map(FunctionIndex)
    }

    pub fn get(self) -> usize {
        usize::from(self.0)
    }
}

impl TryFrom<u8> for FunctionIndex {
    type Error = DomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if usize::from(value) < FUNCTION_COUNT {
            Ok(Self(value))
        } else {
            Err(DomainError::FunctionOutOfRange(i64::from(value)))
        }
    }
}

impl From<FunctionIndex> for u8 {
    fn from(value: FunctionIndex) -> Self {
        value.0
    }
}

impl FromStr for FunctionIndex {
    type Err = DomainError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let token = raw.trim();
        let token = token
            .strip_prefix('F')
            .or_else(|| token.strip_prefix('f'))
            .unwrap_or(token);
        let value: i64 = token
            .parse()
            .map_err(|_| DomainError::InvalidFunction(raw.to_string()))?;
        u8::try_from(value)
            .map_err(|_| DomainError::FunctionOutOfRange(value))
            .and_then(FunctionIndex::try_from)
    }
}

impl fmt::Display for FunctionIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "F{}", self.0)
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;

use std::fmt;
use std::str::FromStr;

use anyhow::{Result, anyhow};

use crate::shift;

/// Shift used when nothing is configured. Every participant has to agree on
/// the same value, so changing it orphans all previously stored text.
pub const DEFAULT_SHIFT: i64 = 12;

/// The configured shift shared by everyone in a deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShiftKey {
    shift: i64,
}

impl ShiftKey {
    pub const fn new(shift: i64) -> Self {
        Self { shift }
    }

    /// The raw configured value.
    pub fn shift(&self) -> i64 {
        self.shift
    }

    /// The normalized forward rotation, in `0..26`.
    pub fn offset(&self) -> u8 {
        shift::forward_offset(self.shift)
    }

    /// Two keys interoperate when they rotate by the same amount, e.g. 12 and 38.
    pub fn is_compatible_with(&self, other: &ShiftKey) -> bool {
        self.offset() == other.offset()
    }

    pub fn encode(&self, text: &str) -> String {
        shift::encode(text, self.shift)
    }

    pub fn decode(&self, text: &str) -> String {
        shift::decode(text, self.shift)
    }
}

impl Default for ShiftKey {
    fn default() -> Self {
        Self::new(DEFAULT_SHIFT)
    }
}

impl From<i64> for ShiftKey {
    fn from(shift: i64) -> Self {
        Self::new(shift)
    }
}

impl fmt::Display for ShiftKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.shift)
    }
}

/// Parse a shift from configuration, e.g. `"12"` or `" -14 "`.
impl FromStr for ShiftKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let shift = trimmed
            .parse::<i64>()
            .map_err(|e| anyhow!("Invalid shift '{}': {}", trimmed, e))?;
        Ok(Self::new(shift))
    }
}

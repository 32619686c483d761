//! Transit mode of a board.

use std::fmt;
use std::str::FromStr;

/// Error returned when parsing an unknown transit mode.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown transit mode: {0}")]
pub struct InvalidMode(String);

/// The kind of vehicle a board shows.
///
/// The mode decides which route filter applies to the board and how
/// simulated departures are spaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Train,
    Bus,
    Ferry,
}

impl Mode {
    /// All modes, in display order.
    pub const ALL: [Mode; 3] = [Mode::Train, Mode::Bus, Mode::Ferry];

    /// Lowercase name, as used in configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Train => "train",
            Mode::Bus => "bus",
            Mode::Ferry => "ferry",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = InvalidMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "train" => Ok(Mode::Train),
            "bus" => Ok(Mode::Bus),
            "ferry" => Ok(Mode::Ferry),
            _ => Err(InvalidMode(s.to_string())),
        }
    }
}

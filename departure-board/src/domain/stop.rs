//! Stop references.

use std::fmt;

use super::Mode;

/// A resolved stop that one board displays.
///
/// Created once at startup by stop discovery and never modified.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StopRef {
    mode: Mode,
    stop_id: String,
    display_name: String,
}

impl StopRef {
    /// Create a new stop reference.
    pub fn new(mode: Mode, stop_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            mode,
            stop_id: stop_id.into(),
            display_name: display_name.into(),
        }
    }

    /// The board's transit mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The upstream stop identifier.
    pub fn stop_id(&self) -> &str {
        &self.stop_id
    }

    /// Human-readable board name.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

impl fmt::Display for StopRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} stop {})", self.display_name, self.mode, self.stop_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors() {
        let stop = StopRef::new(Mode::Ferry, "9600-1", "Downtown Ferry Terminal");
        assert_eq!(stop.mode(), Mode::Ferry);
        assert_eq!(stop.stop_id(), "9600-1");
        assert_eq!(stop.display_name(), "Downtown Ferry Terminal");
    }

    #[test]
    fn display() {
        let stop = StopRef::new(Mode::Train, "133-b", "Waitemata Station");
        assert_eq!(stop.to_string(), "Waitemata Station (train stop 133-b)");
    }
}

//! Board output.
//!
//! The engine hands a board snapshot to a [`Renderer`] whenever the
//! displayed board changes. Rendering failures are logged by the caller
//! and never stop the refresh or rotation loops.

mod console;

pub use console::{ConsoleRenderer, RowView, format_until};

use crate::board::RefreshOutcome;
use crate::domain::{Departure, StopRef};

/// Errors from drawing a board.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to write board: {0}")]
    Io(#[from] std::io::Error),
}

/// A display surface for one board at a time.
pub trait Renderer: Send + 'static {
    /// Draw `departures` for `stop`, replacing whatever was shown before.
    fn render(
        &mut self,
        stop: &StopRef,
        departures: &[Departure],
        outcome: RefreshOutcome,
    ) -> Result<(), RenderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = RenderError::from(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "pipe closed",
        ));
        assert_eq!(err.to_string(), "failed to write board: pipe closed");
    }
}

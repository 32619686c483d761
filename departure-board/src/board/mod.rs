//! Board state.
//!
//! A board is one (mode, stop) pairing with its own refresh cycle. The
//! [`BoardModel`] holds its latest departures; which board is on screen is
//! tracked by the controller, not here.

mod model;

pub use model::{BoardModel, BoardSnapshot, RefreshOutcome};

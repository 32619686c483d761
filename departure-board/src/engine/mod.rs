//! The refresh and rotation engine.
//!
//! Two independent cadences drive the display. Each board refreshes its
//! departures on its own [`RefreshScheduler`] task, while a single
//! [`RotationController`] decides which board is on screen. Neither waits
//! for the other.
//!
//! Both count ticks from one: with a 30 s refresh and a 45 s rotation, the
//! first refresh happens 30 s after start and the first rotation 45 s after
//! start. A tick that falls exactly on a deadline counts as within it.

mod controller;
mod refresh;
mod rotation;
pub mod shutdown;


pub use controller::{Controller, ControllerHandle};
pub use refresh::{RefreshScheduler, RefreshSettings, build_departures};
pub use rotation::RotationController;
pub use shutdown::{ShutdownSignal, ShutdownTrigger};

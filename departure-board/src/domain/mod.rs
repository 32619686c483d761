//! Domain types for the departure board.
//!
//! Everything here is pure data and pure functions: no I/O and no clocks.
//! The refresh engine composes them into a board update.

mod delay;
mod departure;
mod mode;
pub mod route_filter;
mod stop;

pub use delay::{DEFAULT_DELAY_THRESHOLD_SECS, DelayStatus, classify};
pub use departure::{Departure, RawDeparture, is_chronological, sort_chronologically};
pub use mode::{InvalidMode, Mode};
pub use route_filter::{RouteFilterRule, RouteRules};
pub use stop::StopRef;

//! Departure feeds.
//!
//! The live source is the Auckland Transport GTFS-Realtime trip-updates
//! feed, a protobuf `FeedMessage` covering the whole network. The simulated
//! source fabricates plausible boards when the live one is not available.
//!
//! Both sit behind [`DepartureSource`], which the refresh engine selects
//! once per refresh attempt.

mod client;
mod convert;
mod error;
mod simulation;
mod source;

pub use client::{AtFeedClient, FeedClient, FeedConfig};
pub use convert::{decode_feed, departures_for_stop};
pub use error::{UpstreamError, UpstreamErrorKind};
pub use simulation::{DEFAULT_SIMULATED_DEPARTURES, SimulationSource};
pub use source::DepartureSource;

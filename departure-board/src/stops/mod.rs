//! Stop discovery.
//!
//! Resolves each configured board location to an upstream stop id once at
//! startup, using the AT GTFS stop search API.

mod client;
mod discovery;
mod error;

pub use client::{
    StopAttributes, StopItem, StopSearchClient, StopSearchConfig, StopsResponse, parse_stops,
    select_stop,
};
pub use discovery::{BoardLocation, StopDirectory};
pub use error::DiscoveryError;

//! Real-time transit departure boards.
//!
//! Shows upcoming train, bus and ferry departures for a fixed set of stops,
//! refreshing each board from the Auckland Transport GTFS-Realtime feed and
//! rotating between boards on a timer. Without an API key, or when the feed
//! is down, boards fall back to simulated departures.

pub mod board;
pub mod config;
pub mod domain;
pub mod engine;
pub mod feed;
pub mod render;
pub mod stops;

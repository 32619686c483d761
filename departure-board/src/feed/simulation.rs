//! Simulated departures.
//!
//! Used when no API key is configured, and as the fallback when the live
//! feed is unavailable. The data is random but plausible: departures are
//! spaced at a typical headway for the mode, routes come from a small pool,
//! and most predictions are jittered from the timetable so every delay
//! status shows up on screen.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rand::seq::IndexedRandom;

use crate::domain::{Mode, RawDeparture, RouteRules, StopRef, sort_chronologically};

/// Default number of departures per generated board.
pub const DEFAULT_SIMULATED_DEPARTURES: usize = 10;

/// Train lines served from the city terminus.
const TRAIN_ROUTES: &[&str] = &["EAST-201", "STH-201", "WEST-201", "ONE-201"];

/// Suffixes appended to configured prefixes to make route codes.
const ROUTE_SUFFIXES: &[&str] = &["202", "203", "209"];

/// Most prefixes a generated pool draws from.
const MAX_POOL_PREFIXES: usize = 6;

const TRAIN_DESTINATIONS: &[&str] = &["Manukau", "Pukekohe", "Swanson", "Onehunga", "Newmarket"];
const BUS_DESTINATIONS: &[&str] = &["Glen Innes", "Newmarket", "Onehunga", "Botany", "Ponsonby"];
const FERRY_DESTINATIONS: &[&str] = &["Devonport", "Waiheke", "Half Moon Bay", "Birkenhead", "Pine Harbour"];

/// Delay jitter range in seconds (early to late).
const DELAY_RANGE_SECS: (i64, i64) = (-120, 300);

/// Share of departures with no live prediction.
const UNPREDICTED_SHARE: f64 = 0.2;

/// Generator of plausible departures. Never fails.
#[derive(Debug, Clone)]
pub struct SimulationSource {
    count: usize,
    train_routes: Vec<String>,
    bus_routes: Vec<String>,
    ferry_routes: Vec<String>,
}

impl SimulationSource {
    /// Create a generator whose route codes pass the given rules.
    ///
    /// `count` is clamped to at least one departure.
    pub fn new(count: usize, rules: &RouteRules) -> Self {
        Self {
            count: count.max(1),
            train_routes: TRAIN_ROUTES.iter().map(|r| r.to_string()).collect(),
            bus_routes: route_pool(&rules.bus_prefixes, "70-"),
            ferry_routes: route_pool(&rules.ferry_prefixes, "BAYS-"),
        }
    }

    /// Number of departures per generated board.
    pub fn count(&self) -> usize {
        self.count
    }

    /// The route codes a mode draws from.
    pub fn routes(&self, mode: Mode) -> &[String] {
        match mode {
            Mode::Train => &self.train_routes,
            Mode::Bus => &self.bus_routes,
            Mode::Ferry => &self.ferry_routes,
        }
    }

    /// Generate departures for `stop` starting after `now`.
    pub fn generate(&self, stop: &StopRef, now: DateTime<Utc>) -> Vec<RawDeparture> {
        self.generate_with(&mut rand::rng(), stop, now)
    }

    /// Generate departures using the given random source.
    pub fn generate_with<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        stop: &StopRef,
        now: DateTime<Utc>,
    ) -> Vec<RawDeparture> {
        let mode = stop.mode();
        let headway = headway_secs(mode);
        let routes = self.routes(mode);
        let destinations = destinations(mode);

        let mut scheduled = now + Duration::seconds(rng.random_range(60..=headway));
        let mut departures = Vec::with_capacity(self.count);

        for n in 0..self.count {
            let predicted_time = if rng.random_bool(UNPREDICTED_SHARE) {
                None
            } else {
                let delay = rng.random_range(DELAY_RANGE_SECS.0..=DELAY_RANGE_SECS.1);
                // Never predict a departure that has already left.
                Some((scheduled + Duration::seconds(delay)).max(now + Duration::seconds(30)))
            };

            departures.push(RawDeparture {
                route_code: pick(rng, routes),
                scheduled_time: scheduled,
                predicted_time,
                destination: pick(rng, destinations),
                trip_id: format!("sim-{}-{}-{n:02}", stop.stop_id(), now.timestamp()),
            });

            let spacing = headway + rng.random_range(-(headway / 4)..=headway / 4);
            scheduled += Duration::seconds(spacing.max(60));
        }

        sort_chronologically(&mut departures);
        departures
    }
}

impl Default for SimulationSource {
    fn default() -> Self {
        Self::new(DEFAULT_SIMULATED_DEPARTURES, &RouteRules::default())
    }
}

/// Typical spacing between departures, in seconds.
fn headway_secs(mode: Mode) -> i64 {
    match mode {
        Mode::Train => 10 * 60,
        Mode::Bus => 4 * 60,
        Mode::Ferry => 20 * 60,
    }
}

fn destinations(mode: Mode) -> &'static [&'static str] {
    match mode {
        Mode::Train => TRAIN_DESTINATIONS,
        Mode::Bus => BUS_DESTINATIONS,
        Mode::Ferry => FERRY_DESTINATIONS,
    }
}

/// Route codes built from configured prefixes, so a board's own filter
/// admits them. An unfiltered mode uses `fallback_prefix`.
fn route_pool(prefixes: &[String], fallback_prefix: &str) -> Vec<String> {
    let prefixes: Vec<&str> = if prefixes.is_empty() {
        vec![fallback_prefix]
    } else {
        prefixes
            .iter()
            .take(MAX_POOL_PREFIXES)
            .map(String::as_str)
            .collect()
    };

    prefixes
        .iter()
        .enumerate()
        .map(|(i, prefix)| format!("{prefix}{}", ROUTE_SUFFIXES[i % ROUTE_SUFFIXES.len()]))
        .collect()
}

fn pick<R: Rng + ?Sized, T: AsRef<str>>(rng: &mut R, pool: &[T]) -> String {
    pool.choose(rng)
        .map(|s| s.as_ref().to_string())
        .unwrap_or_else(|| "SIM".to_string())
}

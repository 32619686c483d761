//! Board configuration.
//!
//! Everything is read from environment variables at startup. Unset
//! variables take the defaults below; set but unparseable ones are errors.

use std::time::Duration;

use crate::domain::{DEFAULT_DELAY_THRESHOLD_SECS, Mode, RouteRules};
use crate::engine::RefreshSettings;
use crate::feed::UpstreamError;
use crate::stops::{BoardLocation, DiscoveryError};

/// Longest refresh or rotation interval (one day).
const MAX_INTERVAL_SECS: u64 = 86_400;

/// Most departures a board keeps.
const MAX_DEPARTURES: usize = 100;

/// Largest delay threshold (one day).
const MAX_DELAY_THRESHOLD_SECS: i64 = 86_400;

/// Startup configuration errors. All of them are fatal.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },

    #[error("no boards configured")]
    NoBoards,

    #[error("stop discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("feed client setup failed: {0}")]
    Feed(#[from] UpstreamError),
}

/// Configuration for the whole departure board.
#[derive(Debug, Clone)]
pub struct BoardConfig {
    /// Subscription key for the AT APIs. `None` runs in simulation mode.
    pub api_key: Option<String>,

    /// Seconds between refreshes of each board.
    pub refresh_interval_secs: u64,

    /// Seconds between board rotations.
    pub rotation_interval_secs: u64,

    /// Seconds a prediction may deviate from the timetable and still be
    /// on time.
    pub delay_threshold_secs: i64,

    /// Departures kept per board.
    pub max_departures: usize,

    /// Upper bound on one live fetch (seconds).
    pub fetch_timeout_secs: u64,

    /// Show simulated departures when the live feed fails. When off, a
    /// failing board keeps its last departures and is marked stale.
    pub simulation_fallback: bool,

    /// Route prefixes for bus and ferry boards.
    pub route_rules: RouteRules,

    /// Boards in display order.
    pub locations: Vec<BoardLocation>,

    /// Override for the trip-updates feed URL.
    pub feed_url: Option<String>,

    /// Override for the stop search base URL.
    pub stops_url: Option<String>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            refresh_interval_secs: 30,
            rotation_interval_secs: 45,
            delay_threshold_secs: DEFAULT_DELAY_THRESHOLD_SECS,
            max_departures: 10,
            fetch_timeout_secs: 10,
            simulation_fallback: true,
            route_rules: RouteRules::default(),
            locations: BoardLocation::defaults(),
            feed_url: None,
            stops_url: None,
        }
    }
}

impl BoardConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read configuration through `lookup`, which returns a variable's value
    /// if it is set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string());

        let api_key = get("AT_API_KEY").filter(|key| !key.is_empty());

        let bus_prefixes = get("BOARD_BUS_PREFIXES")
            .map(|v| parse_prefixes(&v))
            .unwrap_or(defaults.route_rules.bus_prefixes);
        let ferry_prefixes = get("BOARD_FERRY_PREFIXES")
            .map(|v| parse_prefixes(&v))
            .unwrap_or(defaults.route_rules.ferry_prefixes);

        let mut config = Self {
            api_key,
            refresh_interval_secs: parse_var(
                "BOARD_REFRESH_SECS",
                get("BOARD_REFRESH_SECS"),
                defaults.refresh_interval_secs,
            )?,
            rotation_interval_secs: parse_var(
                "BOARD_ROTATION_SECS",
                get("BOARD_ROTATION_SECS"),
                defaults.rotation_interval_secs,
            )?,
            delay_threshold_secs: parse_var(
                "BOARD_DELAY_THRESHOLD_SECS",
                get("BOARD_DELAY_THRESHOLD_SECS"),
                defaults.delay_threshold_secs,
            )?,
            max_departures: parse_var(
                "BOARD_MAX_DEPARTURES",
                get("BOARD_MAX_DEPARTURES"),
                defaults.max_departures,
            )?,
            fetch_timeout_secs: parse_var(
                "BOARD_FETCH_TIMEOUT_SECS",
                get("BOARD_FETCH_TIMEOUT_SECS"),
                defaults.fetch_timeout_secs,
            )?,
            simulation_fallback: parse_bool(
                "BOARD_SIMULATION_FALLBACK",
                get("BOARD_SIMULATION_FALLBACK"),
                defaults.simulation_fallback,
            )?,
            route_rules: RouteRules::new(bus_prefixes, ferry_prefixes),
            locations: defaults.locations,
            feed_url: get("AT_FEED_URL").filter(|v| !v.is_empty()),
            stops_url: get("AT_STOPS_URL").filter(|v| !v.is_empty()),
        };

        if let Some(value) = get("BOARD_LOCATIONS").filter(|v| !v.is_empty()) {
            config = config.with_locations(parse_locations(&value)?);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check every value is within the range the engine can run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        in_range(
            "BOARD_REFRESH_SECS",
            self.refresh_interval_secs,
            1,
            MAX_INTERVAL_SECS,
        )?;
        in_range(
            "BOARD_ROTATION_SECS",
            self.rotation_interval_secs,
            1,
            MAX_INTERVAL_SECS,
        )?;
        // A fetch may not outlive its own refresh interval.
        in_range(
            "BOARD_FETCH_TIMEOUT_SECS",
            self.fetch_timeout_secs,
            1,
            self.refresh_interval_secs,
        )?;
        in_range(
            "BOARD_MAX_DEPARTURES",
            self.max_departures,
            1,
            MAX_DEPARTURES,
        )?;
        in_range(
            "BOARD_DELAY_THRESHOLD_SECS",
            self.delay_threshold_secs,
            0,
            MAX_DELAY_THRESHOLD_SECS,
        )?;
        if self.locations.is_empty() {
            return Err(ConfigError::NoBoards);
        }
        Ok(())
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_simulation_fallback(mut self, enabled: bool) -> Self {
        self.simulation_fallback = enabled;
        self
    }

    pub fn with_fetch_timeout(mut self, secs: u64) -> Self {
        self.fetch_timeout_secs = secs;
        self
    }

    pub fn with_locations(mut self, locations: Vec<BoardLocation>) -> Self {
        self.locations = locations;
        self
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Returns the refresh interval as a Duration.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    /// Returns the rotation interval as a Duration.
    pub fn rotation_interval(&self) -> Duration {
        Duration::from_secs(self.rotation_interval_secs)
    }

    /// Returns the fetch timeout as a Duration.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Returns the delay threshold as a signed Duration.
    pub fn delay_threshold(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.delay_threshold_secs)
    }

    /// Settings shared by every refresh loop.
    pub fn refresh_settings(&self) -> RefreshSettings {
        RefreshSettings {
            interval: self.refresh_interval(),
            fetch_timeout: self.fetch_timeout(),
            delay_threshold: self.delay_threshold(),
            max_departures: self.max_departures,
        }
    }
}

fn parse_var<T: std::str::FromStr>(
    var: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(v) if v.is_empty() => Ok(default),
        Some(v) => v.parse().map_err(|_| ConfigError::InvalidValue { var, value: v }),
    }
}

fn in_range<T>(var: &'static str, value: T, min: T, max: T) -> Result<(), ConfigError>
where
    T: PartialOrd + ToString,
{
    if value < min || value > max {
        return Err(ConfigError::InvalidValue {
            var,
            value: value.to_string(),
        });
    }
    Ok(())
}

fn parse_bool(var: &'static str, value: Option<String>, default: bool) -> Result<bool, ConfigError> {
    let Some(v) = value.filter(|v| !v.is_empty()) else {
        return Ok(default);
    };
    match v.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue { var, value: v }),
    }
}

/// Parse `name|search term|mode` entries separated by `;`.
fn parse_locations(value: &str) -> Result<Vec<BoardLocation>, ConfigError> {
    let invalid = |entry: &str| ConfigError::InvalidValue {
        var: "BOARD_LOCATIONS",
        value: entry.to_string(),
    };

    value
        .split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let fields: Vec<&str> = entry.split('|').map(str::trim).collect();
            let &[name, search_term, mode] = fields.as_slice() else {
                return Err(invalid(entry));
            };
            if name.is_empty() || search_term.is_empty() {
                return Err(invalid(entry));
            }
            let mode: Mode = mode.parse().map_err(|_| invalid(entry))?;
            Ok(BoardLocation::new(name, search_term, mode))
        })
        .collect()
}

/// Split a comma-separated prefix list. An empty list disables filtering.
fn parse_prefixes(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

//! Terminal renderer.

use std::io::{self, Write};
use std::time::Duration;

use chrono::{DateTime, Local, Utc};

use crate::board::RefreshOutcome;
use crate::domain::{DelayStatus, Departure, Mode, StopRef};

use super::{RenderError, Renderer};

const GREEN: &str = "\x1b[92m";
const RED: &str = "\x1b[91m";
const YELLOW: &str = "\x1b[93m";
const RESET: &str = "\x1b[0m";
const CLEAR: &str = "\x1b[2J\x1b[H";

/// Inner width of the board frame.
const WIDTH: usize = 78;

const ROUTE_WIDTH: usize = 9;
const DESTINATION_WIDTH: usize = 24;

/// Display row for one departure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView {
    pub route: String,
    pub destination: String,
    pub departs: String,
    pub until: String,
    pub marker: &'static str,
    pub status: String,
    pub color: &'static str,
}

impl RowView {
    /// Build a row as seen at `now`.
    pub fn from_departure(departure: &Departure, now: DateTime<Utc>) -> Self {
        let minutes = departure
            .effective_time()
            .signed_duration_since(now)
            .num_minutes();
        let delay_mins = departure
            .delay()
            .map(|d| d.num_minutes().abs())
            .unwrap_or(0);

        let (marker, status, color) = match departure.status() {
            DelayStatus::OnTime => ("✓", "ON TIME".to_string(), GREEN),
            DelayStatus::Late => ("⚠", format!("{delay_mins}m LATE"), RED),
            DelayStatus::Early => ("⚡", format!("{delay_mins}m EARLY"), YELLOW),
        };

        Self {
            route: truncate(departure.route_code(), ROUTE_WIDTH),
            destination: truncate(departure.destination(), DESTINATION_WIDTH),
            departs: departure
                .effective_time()
                .with_timezone(&Local)
                .format("%H:%M")
                .to_string(),
            until: format_until(minutes),
            marker,
            status,
            color,
        }
    }
}

/// Format minutes until departure: `NOW`, `7m` or `1h5m`.
pub fn format_until(minutes: i64) -> String {
    match minutes {
        m if m <= 0 => "NOW".to_string(),
        m if m < 60 => format!("{m}m"),
        m => format!("{}h{}m", m / 60, m % 60),
    }
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

fn icon(mode: Mode) -> &'static str {
    match mode {
        Mode::Train => "🚆",
        Mode::Bus => "🚌",
        Mode::Ferry => "⛴️",
    }
}

/// Draws boards as a framed table of ANSI text.
pub struct ConsoleRenderer<W> {
    out: W,
    refresh_interval: Duration,
    rotation_interval: Duration,
    clear_screen: bool,
}

impl ConsoleRenderer<io::Stdout> {
    /// Renderer on standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            refresh_interval: Duration::from_secs(30),
            rotation_interval: Duration::from_secs(45),
            clear_screen: true,
        }
    }

    /// Cadence shown in the footer.
    pub fn with_cadence(mut self, refresh: Duration, rotation: Duration) -> Self {
        self.refresh_interval = refresh;
        self.rotation_interval = rotation;
        self
    }

    /// Append boards instead of clearing the screen first.
    pub fn without_clear(mut self) -> Self {
        self.clear_screen = false;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Draw a board as seen at `now`.
    pub fn draw(
        &mut self,
        stop: &StopRef,
        departures: &[Departure],
        outcome: RefreshOutcome,
        now: DateTime<Utc>,
    ) -> io::Result<()> {
        let out = &mut self.out;
        let rule = "═".repeat(WIDTH);

        if self.clear_screen {
            write!(out, "{CLEAR}")?;
        }

        writeln!(out, "╔{rule}╗")?;
        writeln!(
            out,
            "║ {} {:<w$}║",
            icon(stop.mode()),
            "AUCKLAND TRANSPORT - REAL-TIME DEPARTURES",
            w = WIDTH - 4
        )?;
        writeln!(
            out,
            "║ {:<50} {:>25} ║",
            stop.display_name(),
            now.with_timezone(&Local).format("%H:%M:%S").to_string(),
        )?;
        match outcome {
            RefreshOutcome::SimulatedFallback => {
                writeln!(out, "║ {YELLOW}{:<w$}{RESET} ║", "SIMULATED DATA", w = WIDTH - 2)?
            }
            RefreshOutcome::FailedStale => writeln!(
                out,
                "║ {RED}{:<w$}{RESET} ║",
                "STALE - live feed unavailable",
                w = WIDTH - 2
            )?,
            RefreshOutcome::NotYetRefreshed | RefreshOutcome::Success => {}
        }
        writeln!(out, "╠{rule}╣")?;
        writeln!(
            out,
            "║ {:<rw$}│ {:<dw$}│ {:<8}│ {:<6}│ {:<w$}║",
            "Route",
            "Destination",
            "Departs",
            "In",
            "Status",
            rw = ROUTE_WIDTH,
            dw = DESTINATION_WIDTH,
            w = WIDTH - ROUTE_WIDTH - DESTINATION_WIDTH - 25,
        )?;
        writeln!(out, "╠{rule}╣")?;

        if outcome == RefreshOutcome::NotYetRefreshed {
            writeln!(out, "║ {:<w$} ║", "Loading departures...", w = WIDTH - 2)?;
        } else if departures.is_empty() {
            writeln!(out, "║ {:<w$} ║", "No departures found", w = WIDTH - 2)?;
        } else {
            for departure in departures {
                let row = RowView::from_departure(departure, now);
                writeln!(
                    out,
                    "║ {:<rw$}│ {:<dw$}│ {:<8}│ {:<6}│ {} {}{}{}",
                    row.route,
                    row.destination,
                    row.departs,
                    row.until,
                    row.marker,
                    row.color,
                    row.status,
                    RESET,
                    rw = ROUTE_WIDTH,
                    dw = DESTINATION_WIDTH,
                )?;
            }
        }

        writeln!(out, "╚{rule}╝")?;
        writeln!(
            out,
            "\nRefreshing every {}s | Rotating boards every {}s",
            self.refresh_interval.as_secs(),
            self.rotation_interval.as_secs()
        )?;
        out.flush()
    }
}

impl<W: Write + Send + 'static> Renderer for ConsoleRenderer<W> {
    fn render(
        &mut self,
        stop: &StopRef,
        departures: &[Departure],
        outcome: RefreshOutcome,
    ) -> Result<(), RenderError> {
        self.draw(stop, departures, outcome, Utc::now())?;
        Ok(())
    }
}

//! Per-board departure state.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::domain::{Departure, StopRef};

/// Result of the most recent refresh cycle of a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefreshOutcome {
    /// No refresh has completed yet; the board shows as loading.
    NotYetRefreshed,
    /// Departures came from the live feed.
    Success,
    /// The live feed was unavailable and departures were simulated.
    SimulatedFallback,
    /// The refresh failed and the previous departures were kept.
    FailedStale,
}

impl fmt::Display for RefreshOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RefreshOutcome::NotYetRefreshed => "not yet refreshed",
            RefreshOutcome::Success => "live",
            RefreshOutcome::SimulatedFallback => "simulated",
            RefreshOutcome::FailedStale => "stale",
        };
        f.write_str(s)
    }
}

/// A consistent view of one board.
#[derive(Debug, Clone)]
pub struct BoardSnapshot {
    departures: Arc<[Departure]>,
    outcome: RefreshOutcome,
    refreshed_at: Option<DateTime<Utc>>,
    generation: u64,
}

impl BoardSnapshot {
    fn empty() -> Self {
        Self {
            departures: Arc::from(Vec::new()),
            outcome: RefreshOutcome::NotYetRefreshed,
            refreshed_at: None,
            generation: 0,
        }
    }

    /// Departures in board order.
    pub fn departures(&self) -> &[Departure] {
        &self.departures
    }

    pub fn outcome(&self) -> RefreshOutcome {
        self.outcome
    }

    /// When the last refresh cycle finished.
    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    /// Number of refresh cycles completed so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Departure state of one board.
///
/// Written only by the board's own refresh loop and read by the render
/// path. Every write swaps in a whole new [`BoardSnapshot`], so a reader
/// sees either the old board or the new one, never a mix.
#[derive(Debug)]
pub struct BoardModel {
    stop: StopRef,
    current: RwLock<Arc<BoardSnapshot>>,
    generation: watch::Sender<u64>,
}

impl BoardModel {
    /// Create an empty board that has not been refreshed.
    pub fn new(stop: StopRef) -> Self {
        Self {
            stop,
            current: RwLock::new(Arc::new(BoardSnapshot::empty())),
            generation: watch::channel(0).0,
        }
    }

    pub fn stop(&self) -> &StopRef {
        &self.stop
    }

    /// Replace the whole departure list.
    pub fn replace(&self, departures: Vec<Departure>, outcome: RefreshOutcome, at: DateTime<Utc>) {
        self.swap(|previous| BoardSnapshot {
            departures: Arc::from(departures),
            outcome,
            refreshed_at: Some(at),
            generation: previous.generation + 1,
        });
    }

    /// Record a failed refresh, keeping the current departures on display.
    pub fn mark_stale(&self, at: DateTime<Utc>) {
        self.swap(|previous| BoardSnapshot {
            departures: Arc::clone(&previous.departures),
            outcome: RefreshOutcome::FailedStale,
            refreshed_at: Some(at),
            generation: previous.generation + 1,
        });
    }

    /// The current state of the board.
    pub fn snapshot(&self) -> Arc<BoardSnapshot> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Watch the generation counter; it changes after every write.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.generation.subscribe()
    }

    fn swap(&self, next: impl FnOnce(&BoardSnapshot) -> BoardSnapshot) {
        let generation = {
            let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
            let snapshot = next(&guard);
            let generation = snapshot.generation;
            *guard = Arc::new(snapshot);
            generation
        };
        self.generation.send_replace(generation);
    }
}

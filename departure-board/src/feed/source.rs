//! Departure source selection.

use chrono::{DateTime, Utc};

use crate::domain::{RawDeparture, StopRef};

use super::client::FeedClient;
use super::error::UpstreamError;
use super::simulation::SimulationSource;

/// Where one refresh attempt takes its departures from.
///
/// The refresh engine picks a variant per attempt: live first when a
/// credential is configured, simulated when there is none or the live
/// attempt failed.
pub enum DepartureSource<'a, F> {
    LiveFeed(&'a F),
    Simulated(&'a SimulationSource),
}

impl<F: FeedClient> DepartureSource<'_, F> {
    /// Fetch departures for `stop`. The simulated variant never fails.
    pub async fn departures(
        &self,
        stop: &StopRef,
        now: DateTime<Utc>,
    ) -> Result<Vec<RawDeparture>, UpstreamError> {
        match self {
            DepartureSource::LiveFeed(client) => client.fetch(stop).await,
            DepartureSource::Simulated(simulation) => Ok(simulation.generate(stop, now)),
        }
    }
}

//! Conversion from GTFS-Realtime trip updates to raw departures.
//!
//! A trip-updates feed covers the whole network. For one board we keep the
//! stop-time updates at that board's stop, read their absolute event time,
//! and recover the timetabled time from the reported delay.
//!
//! Trip updates carry no headsign. The vehicle descriptor's `label` is a
//! fleet number (e.g. "AMP 412"), not a destination, so every live departure
//! shows "N/A" until a static GTFS trips table is joined in.

use chrono::{DateTime, Duration, Utc};
use gtfs_rt::FeedMessage;
use gtfs_rt::trip_update::{StopTimeEvent, StopTimeUpdate};
use prost::Message;

use crate::domain::{RawDeparture, sort_chronologically};

use super::error::UpstreamError;

/// Destination text for live departures.
const UNKNOWN_DESTINATION: &str = "N/A";

/// Decode a protobuf trip-updates payload.
pub fn decode_feed(body: &[u8]) -> Result<FeedMessage, UpstreamError> {
    Ok(FeedMessage::decode(body)?)
}

/// Extract the departures at `stop_id` that have not yet left.
///
/// The result is in board order. Updates without an absolute event time,
/// and trips without a route, are skipped rather than guessed at.
pub fn departures_for_stop(
    feed: &FeedMessage,
    stop_id: &str,
    now: DateTime<Utc>,
) -> Vec<RawDeparture> {
    let mut departures = Vec::new();

    for entity in &feed.entity {
        if entity.is_deleted == Some(true) {
            continue;
        }
        let Some(trip_update) = &entity.trip_update else {
            continue;
        };
        let Some(route_code) = &trip_update.trip.route_id else {
            continue;
        };

        let trip_id = trip_update
            .trip
            .trip_id
            .clone()
            .unwrap_or_else(|| entity.id.clone());
        for update in &trip_update.stop_time_update {
            if update.stop_id.as_deref() != Some(stop_id) {
                continue;
            }
            let Some((scheduled_time, predicted_time)) = event_times(update) else {
                continue;
            };

            let departure = RawDeparture {
                route_code: route_code.clone(),
                scheduled_time,
                predicted_time,
                destination: UNKNOWN_DESTINATION.to_string(),
                trip_id: trip_id.clone(),
            };
            if departure.effective_time() > now {
                departures.push(departure);
            }
        }
    }

    sort_chronologically(&mut departures);
    departures
}

/// Scheduled and predicted time of a stop-time update.
///
/// Prefers the departure event and falls back to the arrival event.
fn event_times(update: &StopTimeUpdate) -> Option<(DateTime<Utc>, Option<DateTime<Utc>>)> {
    let event: &StopTimeEvent = update.departure.as_ref().or(update.arrival.as_ref())?;
    let time = DateTime::from_timestamp(event.time?, 0)?;

    match event.delay {
        Some(delay) => Some((time - Duration::seconds(i64::from(delay)), Some(time))),
        None => Some((time, None)),
    }
}

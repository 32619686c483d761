//! Departure records.
//!
//! [`RawDeparture`] is what a departure source hands back: the feed's view
//! of one vehicle leaving the stop. [`Departure`] is the display-ready
//! record with its delay status resolved. A refresh always builds a fresh
//! `Vec<Departure>`; records are never edited in place.

use std::cmp::Ordering;

use chrono::{DateTime, Duration, Utc};

use super::delay::{DelayStatus, classify};

/// A departure as reported by a feed or the simulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDeparture {
    /// Public route code, e.g. `"70-202"` or `"EAST-201"`.
    pub route_code: String,
    /// Timetabled departure time.
    pub scheduled_time: DateTime<Utc>,
    /// Live prediction, if the feed has one.
    pub predicted_time: Option<DateTime<Utc>>,
    /// Headsign or destination text.
    pub destination: String,
    /// Upstream trip identifier.
    pub trip_id: String,
}

impl RawDeparture {
    /// The time the vehicle is actually expected to leave.
    pub fn effective_time(&self) -> DateTime<Utc> {
        self.predicted_time.unwrap_or(self.scheduled_time)
    }
}

/// A display-ready departure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    route_code: String,
    destination: String,
    scheduled_time: DateTime<Utc>,
    predicted_time: Option<DateTime<Utc>>,
    status: DelayStatus,
    trip_id: String,
}

impl Departure {
    /// Build a departure from a raw record, classifying its delay.
    pub fn from_raw(raw: RawDeparture, threshold: Duration) -> Self {
        let status = classify(raw.scheduled_time, raw.predicted_time, threshold);
        Self {
            route_code: raw.route_code,
            destination: raw.destination,
            scheduled_time: raw.scheduled_time,
            predicted_time: raw.predicted_time,
            status,
            trip_id: raw.trip_id,
        }
    }

    pub fn route_code(&self) -> &str {
        &self.route_code
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn scheduled_time(&self) -> DateTime<Utc> {
        self.scheduled_time
    }

    pub fn predicted_time(&self) -> Option<DateTime<Utc>> {
        self.predicted_time
    }

    pub fn status(&self) -> DelayStatus {
        self.status
    }

    pub fn trip_id(&self) -> &str {
        &self.trip_id
    }

    /// Predicted time if known, otherwise the scheduled time.
    pub fn effective_time(&self) -> DateTime<Utc> {
        self.predicted_time.unwrap_or(self.scheduled_time)
    }

    /// Signed delay (positive when late). `None` without a prediction.
    pub fn delay(&self) -> Option<Duration> {
        self.predicted_time
            .map(|p| p.signed_duration_since(self.scheduled_time))
    }
}

/// Board ordering: effective time, then trip id.
fn chronological(a: &RawDeparture, b: &RawDeparture) -> Ordering {
    a.effective_time()
        .cmp(&b.effective_time())
        .then_with(|| a.trip_id.cmp(&b.trip_id))
}

/// Sort raw departures into board order.
pub fn sort_chronologically(departures: &mut [RawDeparture]) {
    departures.sort_by(chronological);
}

/// Check that departures are in board order.
pub fn is_chronological(departures: &[Departure]) -> bool {
    departures.windows(2).all(|pair| {
        (pair[0].effective_time(), pair[0].trip_id()) <= (pair[1].effective_time(), pair[1].trip_id())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, h, m, 0).unwrap()
    }

    fn raw(trip: &str, scheduled: DateTime<Utc>, predicted: Option<DateTime<Utc>>) -> RawDeparture {
        RawDeparture {
            route_code: "70-202".to_string(),
            scheduled_time: scheduled,
            predicted_time: predicted,
            destination: "Botany".to_string(),
            trip_id: trip.to_string(),
        }
    }

    #[test]
    fn effective_time_prefers_prediction() {
        let r = raw("t1", at(8, 0), Some(at(8, 4)));
        assert_eq!(r.effective_time(), at(8, 4));

        let r = raw("t2", at(8, 0), None);
        assert_eq!(r.effective_time(), at(8, 0));
    }

    #[test]
    fn from_raw_classifies() {
        let threshold = Duration::seconds(120);

        let late = Departure::from_raw(raw("t1", at(8, 0), Some(at(8, 5))), threshold);
        assert_eq!(late.status(), DelayStatus::Late);
        assert_eq!(late.delay(), Some(Duration::minutes(5)));

        let unknown = Departure::from_raw(raw("t2", at(8, 0), None), threshold);
        assert_eq!(unknown.status(), DelayStatus::OnTime);
        assert_eq!(unknown.delay(), None);
    }

    #[test]
    fn sort_uses_prediction_then_trip_id() {
        let mut deps = vec![
            raw("c", at(8, 10), None),
            raw("b", at(8, 0), Some(at(8, 12))),
            raw("a", at(8, 10), None),
            raw("d", at(8, 5), Some(at(8, 3))),
        ];

        sort_chronologically(&mut deps);

        let order: Vec<&str> = deps.iter().map(|d| d.trip_id.as_str()).collect();
        assert_eq!(order, vec!["d", "a", "c", "b"]);
    }

    #[test]
    fn is_chronological_detects_disorder() {
        let threshold = Duration::seconds(120);
        let ordered: Vec<Departure> = [raw("a", at(8, 0), None), raw("b", at(8, 1), None)]
            .into_iter()
            .map(|r| Departure::from_raw(r, threshold))
            .collect();
        assert!(is_chronological(&ordered));

        let reversed: Vec<Departure> = ordered.iter().rev().cloned().collect();
        assert!(!is_chronological(&reversed));
        assert!(is_chronological(&[]));
    }
}

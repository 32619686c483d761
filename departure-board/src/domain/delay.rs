//! Delay classification.
//!
//! A departure is on time while its prediction stays within the threshold
//! of the schedule, in either direction. The boundary itself counts as on
//! time so that exact-threshold data does not flap between states.

use chrono::{DateTime, Duration, Utc};

/// Default delay threshold in seconds.
pub const DEFAULT_DELAY_THRESHOLD_SECS: i64 = 120;

/// Delay status of a departure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DelayStatus {
    OnTime,
    Late,
    Early,
}

/// Classify a departure from its scheduled and predicted times.
///
/// A missing prediction means no delay was detected, so it is `OnTime`.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use departure_board::domain::{DelayStatus, classify};
///
/// let scheduled = Utc.with_ymd_and_hms(2025, 3, 14, 8, 0, 0).unwrap();
/// let threshold = Duration::seconds(120);
///
/// assert_eq!(classify(scheduled, None, threshold), DelayStatus::OnTime);
/// assert_eq!(
///     classify(scheduled, Some(scheduled + Duration::seconds(120)), threshold),
///     DelayStatus::OnTime
/// );
/// assert_eq!(
///     classify(scheduled, Some(scheduled + Duration::seconds(121)), threshold),
///     DelayStatus::Late
/// );
/// assert_eq!(
///     classify(scheduled, Some(scheduled - Duration::seconds(121)), threshold),
///     DelayStatus::Early
/// );
/// ```
pub fn classify(
    scheduled: DateTime<Utc>,
    predicted: Option<DateTime<Utc>>,
    threshold: Duration,
) -> DelayStatus {
    let Some(predicted) = predicted else {
        return DelayStatus::OnTime;
    };

    let delta = predicted.signed_duration_since(scheduled);
    if delta > threshold {
        DelayStatus::Late
    } else if -delta > threshold {
        DelayStatus::Early
    } else {
        DelayStatus::OnTime
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn scheduled() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 17, 30, 0).unwrap()
    }

    fn threshold() -> Duration {
        Duration::seconds(DEFAULT_DELAY_THRESHOLD_SECS)
    }

    #[test]
    fn exact_match_is_on_time() {
        let s = scheduled();
        assert_eq!(
            classify(s, Some(s), threshold()),
            DelayStatus::OnTime
        );
    }

    #[test]
    fn boundary_belongs_to_on_time() {
        let s = scheduled();
        let t = threshold();
        assert_eq!(classify(s, Some(s + t), t), DelayStatus::OnTime);
        assert_eq!(classify(s, Some(s - t), t), DelayStatus::OnTime);
    }

    #[test]
    fn one_second_past_boundary() {
        let s = scheduled();
        let t = threshold();
        let one = Duration::seconds(1);
        assert_eq!(classify(s, Some(s + t + one), t), DelayStatus::Late);
        assert_eq!(classify(s, Some(s - t - one), t), DelayStatus::Early);
    }

    #[test]
    fn zero_threshold_is_strict() {
        let s = scheduled();
        let zero = Duration::zero();
        assert_eq!(classify(s, Some(s), zero), DelayStatus::OnTime);
        assert_eq!(
            classify(s, Some(s + Duration::seconds(1)), zero),
            DelayStatus::Late
        );
    }

    #[test]
    fn missing_prediction_is_on_time() {
        assert_eq!(
            classify(scheduled(), None, Duration::zero()),
            DelayStatus::OnTime
        );
    }
}

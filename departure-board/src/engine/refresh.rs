//! Per-board refresh loop.
//!
//! Each board has its own [`RefreshScheduler`] running on its own task.
//! A cycle is strictly sequential (wait for tick, fetch, process, replace),
//! so two cycles of the same board never overlap, while different boards
//! refresh independently of each other.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::board::{BoardModel, RefreshOutcome};
use crate::domain::{Departure, RawDeparture, RouteFilterRule, route_filter, sort_chronologically};
use crate::feed::{DepartureSource, FeedClient, SimulationSource, UpstreamError};

use super::shutdown::ShutdownSignal;

/// Timing and shaping parameters shared by all refresh loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSettings {
    /// Time between refresh ticks.
    pub interval: Duration,
    /// Upper bound on one live fetch.
    pub fetch_timeout: Duration,
    /// Delay classification threshold.
    pub delay_threshold: chrono::Duration,
    /// Departures kept per board.
    pub max_departures: usize,
}

/// Filter, order, truncate and classify raw departures for display.
pub fn build_departures(
    rule: &RouteFilterRule,
    raw: Vec<RawDeparture>,
    threshold: chrono::Duration,
    max_departures: usize,
) -> Vec<Departure> {
    let mut kept = route_filter::apply(rule, raw);
    sort_chronologically(&mut kept);
    kept.truncate(max_departures);
    kept.into_iter()
        .map(|raw| Departure::from_raw(raw, threshold))
        .collect()
}

/// Result of one attempt at the live feed.
enum LiveAttempt {
    Fetched(Vec<RawDeparture>),
    Failed(UpstreamError),
    NoCredential,
    Cancelled,
}

/// Drives the refresh cycles of one board.
pub struct RefreshScheduler<F> {
    board: Arc<BoardModel>,
    rule: RouteFilterRule,
    live: Option<Arc<F>>,
    simulation: Option<Arc<SimulationSource>>,
    settings: RefreshSettings,
    next_fire: Instant,
    shutdown: ShutdownSignal,
}

impl<F: FeedClient> RefreshScheduler<F> {
    /// Create a scheduler whose first tick fires one interval after `start`.
    ///
    /// `live` is `None` when no credential is configured; `simulation` is
    /// `None` when simulated fallback is disabled.
    pub fn new(
        board: Arc<BoardModel>,
        rule: RouteFilterRule,
        live: Option<Arc<F>>,
        simulation: Option<Arc<SimulationSource>>,
        settings: RefreshSettings,
        start: Instant,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            board,
            rule,
            live,
            simulation,
            next_fire: start + settings.interval,
            settings,
            shutdown,
        }
    }

    /// Run refresh cycles until shutdown.
    pub async fn run(mut self) {
        let name = self.board.stop().display_name().to_string();
        debug!(board = %name, "refresh loop started");

        while self.wait_for_tick().await {
            if self.refresh_once().await.is_none() {
                break;
            }
            self.schedule_next();
        }

        debug!(board = %name, "refresh loop stopped");
    }

    /// Run a single refresh cycle now.
    ///
    /// Returns the outcome written to the board, or `None` if shutdown
    /// interrupted the cycle before anything was written.
    pub async fn refresh_once(&mut self) -> Option<RefreshOutcome> {
        let now = Utc::now();

        let outcome = match self.attempt_live(now).await {
            LiveAttempt::Cancelled => return None,
            LiveAttempt::Fetched(raw) => {
                self.publish(raw, RefreshOutcome::Success, now);
                RefreshOutcome::Success
            }
            LiveAttempt::Failed(err) => {
                warn!(
                    board = %self.board.stop().display_name(),
                    kind = ?err.kind(),
                    error = %err,
                    "live fetch failed"
                );
                self.fall_back(now).await
            }
            LiveAttempt::NoCredential => self.fall_back(now).await,
        };

        let snapshot = self.board.snapshot();
        debug!(
            board = %self.board.stop().display_name(),
            outcome = %outcome,
            departures = snapshot.departures().len(),
            generation = snapshot.generation(),
            "board refreshed"
        );
        Some(outcome)
    }

    async fn attempt_live(&mut self, now: DateTime<Utc>) -> LiveAttempt {
        let Some(client) = self.live.as_deref() else {
            return LiveAttempt::NoCredential;
        };

        let source = DepartureSource::LiveFeed(client);
        let fetch = tokio::time::timeout(
            self.settings.fetch_timeout,
            source.departures(self.board.stop(), now),
        );

        tokio::select! {
            result = fetch => match result {
                Ok(Ok(raw)) => LiveAttempt::Fetched(raw),
                Ok(Err(err)) => LiveAttempt::Failed(err),
                Err(_) => LiveAttempt::Failed(UpstreamError::network(format!(
                    "fetch timed out after {}s",
                    self.settings.fetch_timeout.as_secs()
                ))),
            },
            _ = self.shutdown.triggered() => LiveAttempt::Cancelled,
        }
    }

    async fn fall_back(&self, now: DateTime<Utc>) -> RefreshOutcome {
        let Some(simulation) = self.simulation.as_deref() else {
            info!(
                board = %self.board.stop().display_name(),
                "no simulated fallback, keeping stale departures"
            );
            self.board.mark_stale(now);
            return RefreshOutcome::FailedStale;
        };

        let source: DepartureSource<'_, F> = DepartureSource::Simulated(simulation);
        match source.departures(self.board.stop(), now).await {
            Ok(raw) => {
                self.publish(raw, RefreshOutcome::SimulatedFallback, now);
                RefreshOutcome::SimulatedFallback
            }
            Err(err) => {
                warn!(error = %err, "simulation failed, keeping stale departures");
                self.board.mark_stale(now);
                RefreshOutcome::FailedStale
            }
        }
    }

    fn publish(&self, raw: Vec<RawDeparture>, outcome: RefreshOutcome, now: DateTime<Utc>) {
        let departures = build_departures(
            &self.rule,
            raw,
            self.settings.delay_threshold,
            self.settings.max_departures,
        );
        self.board.replace(departures, outcome, now);
    }

    /// Sleep until the next tick. Returns `false` on shutdown.
    async fn wait_for_tick(&mut self) -> bool {
        if self.shutdown.is_triggered() {
            return false;
        }
        tokio::select! {
            _ = tokio::time::sleep_until(self.next_fire) => true,
            _ = self.shutdown.triggered() => false,
        }
    }

    /// Advance to the following tick. Ticks missed by an overrunning cycle
    /// are skipped, not replayed.
    fn schedule_next(&mut self) {
        self.next_fire += self.settings.interval;
        let now = Instant::now();
        if self.next_fire <= now {
            self.next_fire = now + self.settings.interval;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DelayStatus, Mode, RouteRules, StopRef, is_chronological};
    use crate::engine::shutdown;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const INTERVAL: Duration = Duration::from_secs(30);

    fn settings() -> RefreshSettings {
        RefreshSettings {
            interval: INTERVAL,
            fetch_timeout: Duration::from_secs(10),
            delay_threshold: chrono::Duration::seconds(120),
            max_departures: 10,
        }
    }

    fn bus_stop() -> StopRef {
        StopRef::new(Mode::Bus, "7150-1", "Britomart Bus Hub")
    }

    fn raw(route: &str, trip: &str, mins: i64, delay_secs: Option<i64>) -> RawDeparture {
        let scheduled = Utc::now() + chrono::Duration::minutes(mins);
        RawDeparture {
            route_code: route.to_string(),
            scheduled_time: scheduled,
            predicted_time: delay_secs.map(|d| scheduled + chrono::Duration::seconds(d)),
            destination: "Botany".to_string(),
            trip_id: trip.to_string(),
        }
    }

    /// Feed that replays scripted responses, then repeats the last one.
    struct ScriptedFeed {
        responses: Mutex<Vec<Result<Vec<RawDeparture>, UpstreamError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedFeed {
        fn new(responses: Vec<Result<Vec<RawDeparture>, UpstreamError>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl FeedClient for ScriptedFeed {
        async fn fetch(&self, _stop: &StopRef) -> Result<Vec<RawDeparture>, UpstreamError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut responses = self.responses.lock().unwrap();
            if responses.len() > 1 {
                responses.remove(0)
            } else {
                responses[0].clone()
            }
        }
    }

    /// Feed whose fetch never completes.
    struct HangingFeed;

    impl FeedClient for HangingFeed {
        async fn fetch(&self, _stop: &StopRef) -> Result<Vec<RawDeparture>, UpstreamError> {
            std::future::pending().await
        }
    }

    fn scheduler<F: FeedClient>(
        live: Option<Arc<F>>,
        simulate: bool,
    ) -> (RefreshScheduler<F>, Arc<BoardModel>, shutdown::ShutdownTrigger) {
        let rules = RouteRules::default();
        let board = Arc::new(BoardModel::new(bus_stop()));
        let simulation = simulate.then(|| Arc::new(SimulationSource::new(10, &rules)));
        let (trigger, signal) = shutdown::channel();
        let scheduler = RefreshScheduler::new(
            Arc::clone(&board),
            rules.rule_for(Mode::Bus),
            live,
            simulation,
            settings(),
            Instant::now(),
            signal,
        );
        (scheduler, board, trigger)
    }

    #[test]
    fn build_departures_filters_sorts_and_truncates() {
        let rule = RouteFilterRule::Prefixes(vec!["70-".to_string()]);
        let input = vec![
            raw("70-202", "c", 20, None),
            raw("BAYS-209", "x", 1, None),
            raw("70-202", "a", 5, Some(600)),
            raw("70-203", "b", 10, Some(-300)),
        ];

        let deps = build_departures(&rule, input, chrono::Duration::seconds(120), 2);

        let trips: Vec<&str> = deps.iter().map(|d| d.trip_id()).collect();
        assert_eq!(trips, vec!["b", "a"]);
        assert_eq!(deps[0].status(), DelayStatus::Early);
        assert_eq!(deps[1].status(), DelayStatus::Late);
        assert!(is_chronological(&deps));
    }

    #[tokio::test]
    async fn live_success_is_filtered() {
        let feed = Arc::new(ScriptedFeed::new(vec![Ok(vec![
            raw("70-202", "a", 3, Some(0)),
            raw("EAST-201", "b", 4, None),
        ])]));
        let (mut sched, board, _trigger) = scheduler(Some(feed), true);

        assert_eq!(sched.refresh_once().await, Some(RefreshOutcome::Success));

        let snap = board.snapshot();
        assert_eq!(snap.outcome(), RefreshOutcome::Success);
        assert_eq!(snap.departures().len(), 1);
        assert_eq!(snap.departures()[0].route_code(), "70-202");
    }

    #[tokio::test]
    async fn no_credential_always_simulates() {
        let (mut sched, board, _trigger) = scheduler::<ScriptedFeed>(None, true);

        for generation in 1..=5 {
            assert_eq!(
                sched.refresh_once().await,
                Some(RefreshOutcome::SimulatedFallback)
            );
            let snap = board.snapshot();
            assert_eq!(snap.generation(), generation);
            assert!(!snap.departures().is_empty());
            assert!(is_chronological(snap.departures()));
        }
    }

    #[tokio::test]
    async fn network_error_falls_back_to_simulation() {
        let feed = Arc::new(ScriptedFeed::new(vec![Err(UpstreamError::network(
            "connection reset",
        ))]));
        let (mut sched, board, _trigger) = scheduler(Some(Arc::clone(&feed)), true);

        assert_eq!(
            sched.refresh_once().await,
            Some(RefreshOutcome::SimulatedFallback)
        );
        assert_eq!(feed.calls(), 1);

        let snap = board.snapshot();
        let rule = RouteRules::default().rule_for(Mode::Bus);
        assert!(!snap.departures().is_empty());
        assert!(snap.departures().iter().all(|d| rule.admits(d.route_code())));
    }

    #[tokio::test]
    async fn failure_without_fallback_keeps_stale_data() {
        let feed = Arc::new(ScriptedFeed::new(vec![
            Ok(vec![raw("70-202", "a", 3, None), raw("75-203", "b", 6, None)]),
            Err(UpstreamError::EmptyQuota),
        ]));
        let (mut sched, board, _trigger) = scheduler(Some(feed), false);

        assert_eq!(sched.refresh_once().await, Some(RefreshOutcome::Success));
        assert_eq!(sched.refresh_once().await, Some(RefreshOutcome::FailedStale));

        let snap = board.snapshot();
        assert_eq!(snap.outcome(), RefreshOutcome::FailedStale);
        let trips: Vec<&str> = snap.departures().iter().map(|d| d.trip_id()).collect();
        assert_eq!(trips, vec!["a", "b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_fetch_times_out_into_fallback() {
        let (mut sched, board, _trigger) = scheduler(Some(Arc::new(HangingFeed)), true);

        assert_eq!(
            sched.refresh_once().await,
            Some(RefreshOutcome::SimulatedFallback)
        );
        assert_eq!(board.snapshot().generation(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_interrupts_in_flight_fetch() {
        let (sched, board, trigger) = scheduler(Some(Arc::new(HangingFeed)), true);
        let task = tokio::spawn(sched.run());

        // Past the first tick, inside the hung fetch.
        tokio::time::sleep(INTERVAL + Duration::from_secs(1)).await;
        trigger.trigger();

        tokio::time::timeout(Duration::from_millis(10), task)
            .await
            .expect("loop exits promptly")
            .unwrap();
        assert_eq!(board.snapshot().generation(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_are_one_based() {
        let (sched, board, trigger) = scheduler::<ScriptedFeed>(None, true);
        let task = tokio::spawn(sched.run());

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert_eq!(board.snapshot().generation(), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(board.snapshot().generation(), 1);

        // Ticks at 30, 60 and 90.
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(board.snapshot().generation(), 3);

        trigger.trigger();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_before_first_tick() {
        let (sched, board, trigger) = scheduler::<ScriptedFeed>(None, true);
        trigger.trigger();

        sched.run().await;

        assert_eq!(board.snapshot().outcome(), RefreshOutcome::NotYetRefreshed);
    }
}

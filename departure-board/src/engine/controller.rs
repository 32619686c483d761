//! Top-level controller: owns the boards and all engine loops.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::board::BoardModel;
use crate::config::{BoardConfig, ConfigError};
use crate::domain::{RouteFilterRule, StopRef};
use crate::feed::{FeedClient, SimulationSource};
use crate::render::Renderer;

use super::refresh::{RefreshScheduler, RefreshSettings};
use super::rotation::RotationController;
use super::shutdown::{self, ShutdownSignal, ShutdownTrigger};

/// Owns every board, the feed client and the renderer until started.
pub struct Controller<F, R> {
    boards: Vec<Arc<BoardModel>>,
    rules: Vec<RouteFilterRule>,
    live: Option<Arc<F>>,
    simulation: Option<Arc<SimulationSource>>,
    settings: RefreshSettings,
    rotation_interval: Duration,
    renderer: R,
}

impl<F, R> Controller<F, R>
where
    F: FeedClient + 'static,
    R: Renderer,
{
    /// Build one board per stop, in display order.
    ///
    /// Without a live client every refresh is simulated. With one, failed
    /// fetches fall back to simulation unless the config disables it.
    pub fn new(
        stops: Vec<StopRef>,
        config: &BoardConfig,
        live: Option<F>,
        renderer: R,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if stops.is_empty() {
            return Err(ConfigError::NoBoards);
        }

        let simulation = (config.simulation_fallback || live.is_none()).then(|| {
            Arc::new(SimulationSource::new(
                config.max_departures,
                &config.route_rules,
            ))
        });
        let rules = stops
            .iter()
            .map(|stop| config.route_rules.rule_for(stop.mode()))
            .collect();
        let boards = stops
            .into_iter()
            .map(|stop| Arc::new(BoardModel::new(stop)))
            .collect();

        Ok(Self {
            boards,
            rules,
            live: live.map(Arc::new),
            simulation,
            settings: config.refresh_settings(),
            rotation_interval: config.rotation_interval(),
            renderer,
        })
    }

    pub fn boards(&self) -> &[Arc<BoardModel>] {
        &self.boards
    }

    /// Spawn all loops. Board 0 is drawn immediately; the first refresh and
    /// rotation ticks come one interval later. The board on display is also
    /// redrawn whenever it refreshes.
    pub fn start(self) -> ControllerHandle {
        let start = Instant::now();
        let (trigger, signal) = shutdown::channel();
        let (focus_tx, focus_rx) = watch::channel(0usize);

        info!(
            boards = self.boards.len(),
            live = self.live.is_some(),
            fallback = self.simulation.is_some(),
            refresh_secs = self.settings.interval.as_secs(),
            rotation_secs = self.rotation_interval.as_secs(),
            "starting departure boards"
        );

        let mut tasks = Vec::with_capacity(self.boards.len() + 2);

        for (board, rule) in self.boards.iter().zip(self.rules) {
            let scheduler = RefreshScheduler::new(
                Arc::clone(board),
                rule,
                self.live.clone(),
                self.simulation.clone(),
                self.settings,
                start,
                signal.clone(),
            );
            tasks.push(tokio::spawn(scheduler.run()));
        }

        let rotation = RotationController::new(
            self.boards.len(),
            self.rotation_interval,
            start,
            signal.clone(),
        );
        tasks.push(tokio::spawn(rotation.run(focus_tx)));

        tasks.push(tokio::spawn(render_loop(
            self.boards.clone(),
            self.renderer,
            focus_rx.clone(),
            signal,
        )));

        ControllerHandle {
            boards: self.boards,
            focus: focus_rx,
            trigger,
            tasks,
        }
    }

    /// Run until `signal` completes, then shut down.
    pub async fn run_until(self, signal: impl Future<Output = ()>) {
        let handle = self.start();
        signal.await;
        info!("shutting down");
        handle.shutdown().await;
    }
}

/// A running controller.
pub struct ControllerHandle {
    boards: Vec<Arc<BoardModel>>,
    focus: watch::Receiver<usize>,
    trigger: ShutdownTrigger,
    tasks: Vec<JoinHandle<()>>,
}

impl ControllerHandle {
    pub fn boards(&self) -> &[Arc<BoardModel>] {
        &self.boards
    }

    /// Index of the board on display.
    pub fn current_index(&self) -> usize {
        *self.focus.borrow()
    }

    /// Stop every loop and wait for them to finish.
    pub async fn shutdown(self) {
        self.trigger.trigger();
        for result in futures::future::join_all(self.tasks).await {
            if let Err(e) = result {
                warn!(error = %e, "engine task did not finish cleanly");
            }
        }
        debug!("all engine tasks stopped");
    }
}

/// Draw the focused board: once at startup, on every rotation, and
/// whenever the focused board refreshes.
async fn render_loop<R: Renderer>(
    boards: Vec<Arc<BoardModel>>,
    mut renderer: R,
    mut focus: watch::Receiver<usize>,
    mut shutdown: ShutdownSignal,
) {
    let mut updates: Vec<watch::Receiver<u64>> = boards.iter().map(|b| b.subscribe()).collect();
    let mut index = *focus.borrow_and_update();

    loop {
        if let Some(rx) = updates.get_mut(index) {
            let _ = rx.borrow_and_update();
        }
        renderer = match draw(renderer, boards.get(index)).await {
            Some(renderer) => renderer,
            None => break,
        };

        tokio::select! {
            changed = focus.changed() => {
                if changed.is_err() {
                    break;
                }
                index = *focus.borrow_and_update();
            }
            _ = board_updated(updates.get_mut(index)) => {}
            _ = shutdown.triggered() => break,
        }
    }
    debug!("render loop stopped");
}

/// Resolves when the board behind `rx` has been written.
async fn board_updated(rx: Option<&mut watch::Receiver<u64>>) {
    let Some(rx) = rx else {
        return std::future::pending().await;
    };
    if rx.changed().await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Render one board on the blocking pool, handing the renderer back.
///
/// Returns `None` if the renderer panicked and is gone.
async fn draw<R: Renderer>(renderer: R, board: Option<&Arc<BoardModel>>) -> Option<R> {
    let Some(board) = board else {
        warn!("focus points past the last board");
        return Some(renderer);
    };
    let board = Arc::clone(board);

    let task = tokio::task::spawn_blocking(move || {
        let mut renderer = renderer;
        let snapshot = board.snapshot();
        if let Err(e) = renderer.render(board.stop(), snapshot.departures(), snapshot.outcome()) {
            warn!(board = %board.stop().display_name(), error = %e, "render failed");
        }
        renderer
    });

    match task.await {
        Ok(renderer) => Some(renderer),
        Err(e) => {
            error!(error = %e, "renderer panicked, display stopped");
            None
        }
    }
}

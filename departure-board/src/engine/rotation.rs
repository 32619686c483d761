//! Board rotation.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::debug;

use super::shutdown::ShutdownSignal;

/// Cycles the displayed board index on a fixed cadence.
///
/// Knows nothing about board contents; it only publishes which index is
/// current. Starts at 0 and wraps around forever.
pub struct RotationController {
    board_count: usize,
    index: usize,
    interval: Duration,
    next_fire: Instant,
    shutdown: ShutdownSignal,
}

impl RotationController {
    /// Create a controller whose first tick fires one interval after `start`.
    pub fn new(
        board_count: usize,
        interval: Duration,
        start: Instant,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            board_count,
            index: 0,
            interval,
            next_fire: start + interval,
            shutdown,
        }
    }

    /// Move to the next board and return its index.
    pub fn advance(&mut self) -> usize {
        if self.board_count > 0 {
            self.index = (self.index + 1) % self.board_count;
        }
        self.index
    }

    /// Advance on every tick, publishing the new index to `focus`, until
    /// shutdown or until nobody is listening.
    pub async fn run(mut self, focus: watch::Sender<usize>) {
        loop {
            tokio::select! {
                _ = tokio::time::sleep_until(self.next_fire) => {}
                _ = self.shutdown.triggered() => break,
            }

            let index = self.advance();
            debug!(index, "rotating board");
            if focus.send(index).is_err() {
                break;
            }

            self.next_fire += self.interval;
            let now = Instant::now();
            if self.next_fire <= now {
                self.next_fire = now + self.interval;
            }
        }
        debug!("rotation loop stopped");
    }
}

//! Cycle scheduling
//!
//! Derives the trigger cadence from the export window size and runs the
//! controller loop: one cycle per table per tick, a single stale-bounded
//! retry on trigger failure, and a jitter window so co-located deployments
//! don't fire in lockstep.

use crate::adapters::clock::Clock;
use crate::core::controller::LifecycleController;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Jitter window added on top of the cadence
pub const FLEX_WINDOW: Duration = Duration::from_secs(15 * 60);

/// Trigger cadence for a given export window size
///
/// One third of the window, so a transiently failing trigger still gets
/// two more chances before the window's worth of changes risks aging out.
pub fn cadence(window_minutes: u32) -> Duration {
    Duration::from_secs(u64::from(window_minutes / 3) * 60)
}

/// Maximum age at which a failed trigger is still worth retrying
///
/// Half the cadence: beyond that the next scheduled trigger is closer than
/// the stale one.
pub fn max_event_age(window_minutes: u32) -> Duration {
    cadence(window_minutes) / 2
}

/// Scheduler driving one or more table controllers
pub struct Scheduler {
    controllers: Vec<Arc<LifecycleController>>,
    clock: Arc<dyn Clock>,
    window_minutes: u32,
}

impl Scheduler {
    /// Create a scheduler over the given controllers
    pub fn new(
        controllers: Vec<Arc<LifecycleController>>,
        clock: Arc<dyn Clock>,
        window_minutes: u32,
    ) -> Self {
        Self {
            controllers,
            clock,
            window_minutes,
        }
    }

    /// Run cycles on the derived cadence until `shutdown` flips to true
    pub async fn run_loop(&self, mut shutdown: watch::Receiver<bool>) {
        let cadence = cadence(self.window_minutes);
        tracing::info!(
            cadence_secs = cadence.as_secs(),
            flex_secs = FLEX_WINDOW.as_secs(),
            tables = self.controllers.len(),
            "Scheduler started"
        );

        loop {
            self.tick().await;

            let delay = cadence + jitter();
            tracing::debug!(delay_secs = delay.as_secs(), "Sleeping until next tick");

            tokio::select! {
                _ = self.clock.sleep(delay) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("Scheduler shutting down");
                        return;
                    }
                }
            }
        }
    }

    /// Run one tick: a cycle per table, with one stale-bounded retry
    pub async fn tick(&self) {
        let max_age = max_event_age(self.window_minutes);

        for controller in &self.controllers {
            let tick_started = self.clock.now();

            if controller.run_cycle().await.is_ok() {
                continue;
            }

            let age = (self.clock.now() - tick_started)
                .to_std()
                .unwrap_or(Duration::ZERO);
            if age >= max_age {
                tracing::warn!(
                    table_id = %controller.table_id(),
                    age_secs = age.as_secs(),
                    max_age_secs = max_age.as_secs(),
                    "Trigger too stale to retry, waiting for the next tick"
                );
                continue;
            }

            tracing::warn!(
                table_id = %controller.table_id(),
                "Cycle failed, retrying trigger once"
            );
            if let Err(e) = controller.run_cycle().await {
                tracing::error!(
                    table_id = %controller.table_id(),
                    error = %e,
                    "Cycle failed on retried trigger, waiting for the next tick"
                );
            }
        }
    }
}

fn jitter() -> Duration {
    let millis = rand::thread_rng().gen_range(0..FLEX_WINDOW.as_millis() as u64);
    Duration::from_millis(millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cadence_is_a_third_of_the_window() {
        assert_eq!(cadence(60), Duration::from_secs(20 * 60));
        assert_eq!(cadence(15), Duration::from_secs(5 * 60));
        assert_eq!(cadence(1440), Duration::from_secs(480 * 60));
    }

    #[test]
    fn test_cadence_floors_uneven_windows() {
        // 25 / 3 = 8 with integer division
        assert_eq!(cadence(25), Duration::from_secs(8 * 60));
    }

    #[test]
    fn test_max_event_age_is_half_the_cadence() {
        assert_eq!(max_event_age(60), Duration::from_secs(10 * 60));
    }

    #[test]
    fn test_jitter_stays_inside_flex_window() {
        for _ in 0..100 {
            assert!(jitter() < FLEX_WINDOW);
        }
    }
}

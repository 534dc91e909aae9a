//! Auto-tracking scheduler. Once per tick it reconciles the engine with
//! the configured daily window: inside the window a session must be
//! running, outside of it nothing may be.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use anyhow::Result;
use chrono::Local;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::{
    detect::ActivityDetector,
    storage::store::KeyValueStore,
    utils::{clock::Clock, time::minutes_of_day},
};

use super::ActivityEngine;

pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(60);

/// Shared handle to the engine. The scheduler task and the caller layer
/// both mutate session state through this, one operation at a time.
pub type SharedEngine<K> = Arc<Mutex<ActivityEngine<K>>>;

pub struct AutoTracker<K, D> {
    engine: SharedEngine<K>,
    detector: D,
    clock: Box<dyn Clock>,
    tick_period: Duration,
    shutdown: CancellationToken,
}

impl<K, D> AutoTracker<K, D>
where
    K: KeyValueStore + Send + 'static,
    D: ActivityDetector,
{
    pub fn new(
        engine: SharedEngine<K>,
        detector: D,
        clock: Box<dyn Clock>,
        tick_period: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            engine,
            detector,
            clock,
            tick_period,
            shutdown,
        }
    }

    /// Executes the scheduler event loop. The first tick runs immediately,
    /// so enabling auto-tracking inside the window starts a session without
    /// waiting a full period. The loop ends on cancellation or when the
    /// settings disable auto-tracking.
    pub async fn run(mut self) -> Result<()> {
        let mut tick_point = self.clock.instant();
        loop {
            if !self.tick() {
                info!("Auto-tracking disabled, stopping scheduler");
                return Ok(());
            }
            tick_point += self.tick_period;

            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    return Ok(())
                }
                _ = self.clock.sleep_until(tick_point) => ()
            }
        }
    }

    /// One scheduler step. Returns false when auto-tracking is disabled and
    /// the timer should cancel itself.
    fn tick(&mut self) -> bool {
        let Ok(mut engine) = self.engine.lock() else {
            error!("Engine lock is poisoned, skipping tick");
            return true;
        };

        let settings = engine.tracker_settings();
        if !settings.auto_track_enabled {
            return false;
        }

        let now = self.clock.time().with_timezone(&Local);
        let now_minutes = minutes_of_day(&now);
        let (start_minutes, end_minutes) = settings.window_minutes();

        // Inclusive on both ends. Windows wrapping past midnight are not
        // special-cased, callers keep start before end.
        let inside_window = start_minutes <= now_minutes && now_minutes <= end_minutes;

        if inside_window {
            if engine.current_activity().is_none() {
                match self.detector.detect_active_label() {
                    Ok(label) => {
                        debug!("Inside tracking window, auto-starting {label:?}");
                        engine.start_activity(&label);
                    }
                    Err(e) => {
                        error!("Failed to detect the active application {e:?}")
                    }
                }
            }
        } else if engine.current_activity().is_some() {
            debug!("Outside tracking window, ending session");
            engine.end_activity();
        }
        true
    }

    /// Spawns the event loop onto the runtime. [setup_auto_tracking] is the
    /// intended entry point, it enforces the single-timer rule.
    pub fn spawn(self) -> AutoTrackHandle {
        let shutdown = self.shutdown.clone();
        let task = tokio::spawn(self.run());
        AutoTrackHandle { shutdown, task }
    }
}

/// Cancels and awaits a running scheduler task.
pub struct AutoTrackHandle {
    shutdown: CancellationToken,
    task: JoinHandle<Result<()>>,
}

impl AutoTrackHandle {
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        match self.task.await {
            Ok(Err(e)) => error!("Auto tracker stopped with an error {e:?}"),
            Err(e) => error!("Auto tracker task failed {e:?}"),
            Ok(Ok(())) => {}
        }
    }
}

/// Replaces any running scheduler with a fresh one, so at most one timer is
/// ever active. Re-enabling inside the window starts tracking immediately
/// through the new scheduler's first tick.
pub async fn setup_auto_tracking<K, D>(
    previous: Option<AutoTrackHandle>,
    engine: SharedEngine<K>,
    detector: D,
    clock: Box<dyn Clock>,
    tick_period: Duration,
) -> AutoTrackHandle
where
    K: KeyValueStore + Send + 'static,
    D: ActivityDetector,
{
    if let Some(previous) = previous {
        previous.shutdown().await;
    }
    AutoTracker::new(engine, detector, clock, tick_period, CancellationToken::new()).spawn()
}

/// Stops auto-tracking if a scheduler is running.
pub async fn clear_auto_tracking(handle: Option<AutoTrackHandle>) {
    if let Some(handle) = handle {
        handle.shutdown().await;
    }
}

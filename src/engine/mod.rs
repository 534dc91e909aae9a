//! Core of the tracker. [ActivityEngine] owns the single current session
//! and the closed-session history, persisting every transition through the
//! session store. In-memory state stays authoritative when a persistence
//! write fails.

pub mod analytics;
pub mod normalize;
pub mod scheduler;

use chrono::Duration;
use tracing::{debug, error};

use crate::{
    storage::{
        entities::{ActivitySession, TrackerSettings},
        store::{KeyValueStore, SessionStore},
    },
    utils::clock::Clock,
};

use normalize::normalize;

pub struct ActivityEngine<K> {
    store: SessionStore<K>,
    clock: Box<dyn Clock>,
    current: Option<ActivitySession>,
    history: Vec<ActivitySession>,
    next_id: u64,
}

impl<K: KeyValueStore> ActivityEngine<K> {
    /// Restores engine state from the store. Session ids keep growing past
    /// the largest persisted id.
    pub fn load(store: SessionStore<K>, clock: Box<dyn Clock>) -> Self {
        let (current, history) = store.load();
        let next_id = history
            .iter()
            .chain(current.as_ref())
            .map(|session| session.id + 1)
            .max()
            .unwrap_or(0);
        Self {
            store,
            clock,
            current,
            history,
            next_id,
        }
    }

    /// Starts tracking `raw_label`, closing whatever was running first.
    pub fn start_activity(&mut self, raw_label: &str) -> ActivitySession {
        if self.current.is_some() {
            self.end_activity();
        }
        let session = ActivitySession {
            id: self.take_id(),
            app_name: normalize(raw_label).into(),
            start_time: self.clock.time(),
            end_time: None,
            duration: Duration::zero(),
        };
        debug!("Starting session {session:?}");
        self.current = Some(session.clone());
        self.persist();
        session
    }

    /// Closes the running session, finalizes its duration and appends it to
    /// history. Without a running session this is a no-op.
    pub fn end_activity(&mut self) -> Option<ActivitySession> {
        let mut session = self.current.take()?;
        let end_time = self.clock.time();
        session.duration = (end_time - session.start_time).max(Duration::zero());
        session.end_time = Some(end_time);
        debug!("Ending session {session:?}");
        self.history.push(session.clone());
        self.persist();
        Some(session)
    }

    /// The running session with its duration recomputed against the clock.
    /// Intended to be polled, never mutates stored state.
    pub fn current_activity(&self) -> Option<ActivitySession> {
        let mut session = self.current.clone()?;
        session.duration = session.duration_at(self.clock.time());
        Some(session)
    }

    /// Closed sessions, oldest first.
    pub fn activity_history(&self) -> Vec<ActivitySession> {
        self.history.clone()
    }

    /// Forgets all closed sessions. The current session is untouched.
    pub fn clear_history(&mut self) {
        self.history.clear();
        self.persist();
    }

    pub fn tracker_settings(&self) -> TrackerSettings {
        self.store.tracker_settings()
    }

    pub fn update_tracker_settings(&mut self, settings: TrackerSettings) {
        if let Err(e) = self.store.save_tracker_settings(&settings) {
            error!("Failed to persist tracker settings {e:?}");
        }
    }

    fn take_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn persist(&self) {
        if let Err(e) = self.store.save(self.current.as_ref(), &self.history) {
            error!("Failed to persist tracker state {e:?}");
        }
    }
}

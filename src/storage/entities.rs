use chrono::Duration;
use chrono::Utc;

use chrono::DateTime;
use serde::Deserialize;
use serde::Serialize;

use std::sync::Arc;

use crate::utils::time::parse_minutes_of_day;

/// One contiguous interval of tracked activity under a single normalized
/// document name. `end_time` of `None` marks the session as currently
/// running; closed sessions carry their finalized duration.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
pub struct ActivitySession {
    pub id: u64,
    pub app_name: Arc<str>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start_time: DateTime<Utc>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(with = "duration_ser")]
    pub duration: Duration,
}

impl ActivitySession {
    pub fn is_active(&self) -> bool {
        self.end_time.is_none()
    }

    /// Duration of the session with respect to `now`. Closed sessions keep
    /// their finalized value, active sessions are measured against the
    /// clock on every read.
    pub fn duration_at(&self, now: DateTime<Utc>) -> Duration {
        match self.end_time {
            Some(_) => self.duration,
            None => (now - self.start_time).max(Duration::zero()),
        }
    }
}

mod duration_ser {
    use chrono::Duration;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(duration.num_milliseconds())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ms = i64::deserialize(deserializer)?;
        Ok(Duration::milliseconds(ms))
    }
}

const DEFAULT_WINDOW_START: &str = "09:00";
const DEFAULT_WINDOW_END: &str = "17:00";

const DEFAULT_WINDOW_START_MINUTES: u32 = 9 * 60;
const DEFAULT_WINDOW_END_MINUTES: u32 = 17 * 60;

/// User configuration for automatic tracking. Read and written wholesale,
/// the engine never patches individual fields.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct TrackerSettings {
    pub auto_track_enabled: bool,
    /// Start of the daily auto-tracking window, `"HH:MM"` local time.
    pub start_time: String,
    /// End of the daily auto-tracking window, `"HH:MM"` local time. Callers
    /// keep this after `start_time`, the engine does not enforce it.
    pub end_time: String,
    pub track_dormant_activity: bool,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            auto_track_enabled: false,
            start_time: DEFAULT_WINDOW_START.into(),
            end_time: DEFAULT_WINDOW_END.into(),
            track_dormant_activity: false,
        }
    }
}

impl TrackerSettings {
    /// Window bounds in minutes since local midnight. A bound that fails to
    /// parse falls back to its default value.
    pub fn window_minutes(&self) -> (u32, u32) {
        let start =
            parse_minutes_of_day(&self.start_time).unwrap_or(DEFAULT_WINDOW_START_MINUTES);
        let end = parse_minutes_of_day(&self.end_time).unwrap_or(DEFAULT_WINDOW_END_MINUTES);
        (start, end)
    }
}

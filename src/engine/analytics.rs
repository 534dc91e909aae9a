//! Pure aggregations over closed sessions. Everything here is
//! deterministic, takes `now` explicitly, and is safe to recompute on
//! every read of a growing history.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use chrono::{DateTime, Duration, Local, NaiveDate, Timelike};

use crate::storage::entities::ActivitySession;

/// Headline metrics over the whole history.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageSummary {
    /// Duration of sessions that started on the current calendar day.
    pub total_duration_today: Duration,
    pub total_duration_all: Duration,
    /// Count of distinct normalized document names.
    pub unique_documents: usize,
    pub average_session_duration: Duration,
    pub most_active_document: Option<DocumentUsage>,
    /// Number of distinct calendar days represented in history.
    pub days_tracked: usize,
    pub average_duration_per_day: Duration,
    pub average_hours_per_day: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentUsage {
    pub app_name: Arc<str>,
    pub duration: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourlyBucket {
    pub sessions: u32,
    pub duration: Duration,
}

impl Default for HourlyBucket {
    fn default() -> Self {
        Self {
            sessions: 0,
            duration: Duration::zero(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyUsage {
    pub date: NaiveDate,
    pub duration: Duration,
}

/// Computes the summary metrics over the full history. A single pass in
/// history order keeps the most-active tie-break at first-encountered.
pub fn summarize(history: &[ActivitySession], now: DateTime<Local>) -> UsageSummary {
    let today = now.date_naive();

    let mut total_all = Duration::zero();
    let mut total_today = Duration::zero();
    let mut by_document = HashMap::<Arc<str>, Duration>::new();
    let mut days = HashSet::<NaiveDate>::new();
    let mut most_active: Option<DocumentUsage> = None;

    for session in history {
        let day = session.start_time.with_timezone(&Local).date_naive();
        total_all += session.duration;
        if day == today {
            total_today += session.duration;
        }
        days.insert(day);

        let document_total = by_document
            .entry(session.app_name.clone())
            .and_modify(|total| *total += session.duration)
            .or_insert(session.duration);
        // Strict comparison keeps the earlier document on equal totals.
        let is_new_best = most_active
            .as_ref()
            .map_or(true, |best| *document_total > best.duration);
        if is_new_best {
            most_active = Some(DocumentUsage {
                app_name: session.app_name.clone(),
                duration: *document_total,
            });
        }
    }

    let average_session_duration = if history.is_empty() {
        Duration::zero()
    } else {
        total_all / history.len() as i32
    };
    let average_duration_per_day = if days.is_empty() {
        Duration::zero()
    } else {
        total_all / days.len() as i32
    };
    let average_hours_per_day = if days.is_empty() {
        0.
    } else {
        total_all.num_seconds() as f64 / 3600. / days.len() as f64
    };

    UsageSummary {
        total_duration_today: total_today,
        total_duration_all: total_all,
        unique_documents: by_document.len(),
        average_session_duration,
        most_active_document: most_active,
        days_tracked: days.len(),
        average_duration_per_day,
        average_hours_per_day,
    }
}

/// Session counts and duration sums bucketed by the local hour a session
/// started in. Hours without sessions stay zero.
pub fn hourly_pattern(history: &[ActivitySession]) -> [HourlyBucket; 24] {
    let mut buckets = [HourlyBucket::default(); 24];
    for session in history {
        let hour = session.start_time.with_timezone(&Local).hour() as usize;
        buckets[hour].sessions += 1;
        buckets[hour].duration += session.duration;
    }
    buckets
}

/// Daily totals for the 7 calendar days ending today, oldest first. Always
/// exactly 7 entries, days without activity stay zero.
pub fn weekly_trend(history: &[ActivitySession], now: DateTime<Local>) -> Vec<DailyUsage> {
    let today = now.date_naive();
    (0..7i64)
        .rev()
        .map(|offset| {
            let date = today - Duration::days(offset);
            let duration = history
                .iter()
                .filter(|session| {
                    session.start_time.with_timezone(&Local).date_naive() == date
                })
                .fold(Duration::zero(), |total, session| total + session.duration);
            DailyUsage { date, duration }
        })
        .collect()
}

#[cfg(test)]
mod analytics_tests {
    use chrono::{DateTime, Duration, Local, TimeZone};

    use crate::storage::entities::ActivitySession;

    use super::{hourly_pattern, summarize, weekly_trend};

    fn moment(day: u32, hour: u32, minute: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, day, hour, minute, 0).unwrap()
    }

    fn closed(id: u64, name: &str, start: DateTime<Local>, minutes: i64) -> ActivitySession {
        let start = start.with_timezone(&chrono::Utc);
        ActivitySession {
            id,
            app_name: name.into(),
            start_time: start,
            end_time: Some(start + Duration::minutes(minutes)),
            duration: Duration::minutes(minutes),
        }
    }

    #[test]
    fn summary_of_two_sessions_on_one_day() {
        let history = vec![
            closed(0, "A", moment(2, 10, 0), 30),
            closed(1, "B", moment(2, 10, 30), 45),
        ];

        let summary = summarize(&history, moment(2, 12, 0));

        assert_eq!(summary.total_duration_all, Duration::minutes(75));
        assert_eq!(summary.total_duration_today, Duration::minutes(75));
        assert_eq!(summary.unique_documents, 2);
        let most_active = summary.most_active_document.unwrap();
        assert_eq!(&*most_active.app_name, "B");
        assert_eq!(most_active.duration, Duration::minutes(45));
        assert_eq!(summary.days_tracked, 1);
        assert_eq!(summary.average_session_duration, Duration::minutes(37) + Duration::seconds(30));
        assert_eq!(summary.average_duration_per_day, Duration::minutes(75));
        assert_eq!(summary.average_hours_per_day, 1.25);
    }

    #[test]
    fn summary_only_counts_today_for_todays_total() {
        let history = vec![
            closed(0, "A", moment(1, 9, 0), 60),
            closed(1, "A", moment(2, 9, 0), 30),
        ];

        let summary = summarize(&history, moment(2, 18, 0));

        assert_eq!(summary.total_duration_today, Duration::minutes(30));
        assert_eq!(summary.total_duration_all, Duration::minutes(90));
        assert_eq!(summary.unique_documents, 1);
        assert_eq!(summary.days_tracked, 2);
        assert_eq!(summary.average_duration_per_day, Duration::minutes(45));
        assert_eq!(summary.average_hours_per_day, 0.75);
    }

    #[test]
    fn most_active_ties_keep_the_first_document() {
        let history = vec![
            closed(0, "A", moment(2, 9, 0), 30),
            closed(1, "B", moment(2, 10, 0), 30),
        ];

        let summary = summarize(&history, moment(2, 12, 0));

        assert_eq!(&*summary.most_active_document.unwrap().app_name, "A");
    }

    #[test]
    fn summary_of_empty_history_is_all_zero() {
        let summary = summarize(&[], moment(2, 12, 0));

        assert_eq!(summary.total_duration_all, Duration::zero());
        assert_eq!(summary.total_duration_today, Duration::zero());
        assert_eq!(summary.unique_documents, 0);
        assert_eq!(summary.average_session_duration, Duration::zero());
        assert_eq!(summary.most_active_document, None);
        assert_eq!(summary.days_tracked, 0);
        assert_eq!(summary.average_duration_per_day, Duration::zero());
        assert_eq!(summary.average_hours_per_day, 0.);
    }

    #[test]
    fn hourly_buckets_land_on_the_starting_hour() {
        let history = vec![
            closed(0, "A", moment(2, 10, 0), 30),
            closed(1, "B", moment(2, 10, 30), 45),
            closed(2, "C", moment(2, 14, 5), 10),
        ];

        let pattern = hourly_pattern(&history);

        assert_eq!(pattern[10].sessions, 2);
        assert_eq!(pattern[10].duration, Duration::minutes(75));
        assert_eq!(pattern[14].sessions, 1);
        assert_eq!(pattern[14].duration, Duration::minutes(10));
        assert_eq!(pattern[0].sessions, 0);
        assert_eq!(pattern[0].duration, Duration::zero());
    }

    #[test]
    fn hourly_durations_sum_to_the_session_total() {
        let history = vec![
            closed(0, "A", moment(1, 23, 50), 30),
            closed(1, "B", moment(2, 0, 10), 45),
            closed(2, "C", moment(2, 10, 0), 90),
        ];

        let session_total = history
            .iter()
            .fold(Duration::zero(), |total, session| total + session.duration);
        let bucket_total = hourly_pattern(&history)
            .iter()
            .fold(Duration::zero(), |total, bucket| total + bucket.duration);

        assert_eq!(bucket_total, session_total);
    }

    #[test]
    fn weekly_trend_always_has_seven_days() {
        assert_eq!(weekly_trend(&[], moment(2, 12, 0)).len(), 7);

        let history = vec![closed(0, "A", moment(2, 10, 0), 30)];
        let trend = weekly_trend(&history, moment(2, 12, 0));
        assert_eq!(trend.len(), 7);
    }

    #[test]
    fn weekly_trend_ends_today_and_buckets_by_day() {
        let history = vec![
            closed(0, "A", moment(1, 10, 0), 60),
            closed(1, "B", moment(2, 10, 0), 30),
            // Eight days ago, outside the window.
            closed(2, "C", moment(2, 10, 0) - Duration::days(8), 90),
        ];

        let trend = weekly_trend(&history, moment(2, 12, 0));

        assert_eq!(trend[6].date, moment(2, 12, 0).date_naive());
        assert_eq!(trend[6].duration, Duration::minutes(30));
        assert_eq!(trend[5].duration, Duration::minutes(60));
        let earlier_total = trend[..5]
            .iter()
            .fold(Duration::zero(), |total, day| total + day.duration);
        assert_eq!(earlier_total, Duration::zero());
    }
}

use ansi_term::Style;
use chrono::Local;

use crate::{
    engine::analytics::{DailyUsage, HourlyBucket, UsageSummary},
    storage::entities::{ActivitySession, TrackerSettings},
    utils::time::format_duration,
};

pub fn print_status(current: Option<ActivitySession>) {
    match current {
        Some(session) => {
            let started = session.start_time.with_timezone(&Local);
            println!(
                "Tracking {} for {} (since {})",
                Style::new().bold().paint(&*session.app_name),
                format_duration(session.duration),
                started.format("%H:%M"),
            );
        }
        None => println!("Nothing is being tracked"),
    }
}

pub fn print_history(history: &[ActivitySession]) {
    if history.is_empty() {
        println!("No closed sessions");
        return;
    }
    for session in history {
        let started = session.start_time.with_timezone(&Local);
        println!(
            "{}\t{}\t{}",
            started.format("%x %H:%M"),
            format_duration(session.duration),
            session.app_name
        );
    }
}

pub fn print_summary(summary: &UsageSummary) {
    let label = Style::new().bold();
    println!(
        "{}\t{}",
        label.paint("Today"),
        format_duration(summary.total_duration_today)
    );
    println!(
        "{}\t{}",
        label.paint("All time"),
        format_duration(summary.total_duration_all)
    );
    println!("{}\t{}", label.paint("Documents"), summary.unique_documents);
    println!(
        "{}\t{}",
        label.paint("Avg session"),
        format_duration(summary.average_session_duration)
    );
    match &summary.most_active_document {
        Some(document) => println!(
            "{}\t{} ({})",
            label.paint("Most active"),
            document.app_name,
            format_duration(document.duration)
        ),
        None => println!("{}\t-", label.paint("Most active")),
    }
    println!("{}\t{}", label.paint("Days tracked"), summary.days_tracked);
    println!(
        "{}\t{} ({:.1}h)",
        label.paint("Avg per day"),
        format_duration(summary.average_duration_per_day),
        summary.average_hours_per_day
    );
}

pub fn print_hourly(pattern: &[HourlyBucket; 24]) {
    println!("{}", Style::new().dimmed().paint("hour\tsessions\tduration"));
    for (hour, bucket) in pattern.iter().enumerate() {
        println!(
            "{hour:02}:00\t{}\t{}",
            bucket.sessions,
            format_duration(bucket.duration)
        );
    }
}

pub fn print_weekly(trend: &[DailyUsage]) {
    println!("{}", Style::new().dimmed().paint("day\tduration"));
    for day in trend {
        println!(
            "{}\t{}",
            day.date.format("%a %x"),
            format_duration(day.duration)
        );
    }
}

pub fn print_settings(settings: &TrackerSettings) {
    let state = if settings.auto_track_enabled {
        "enabled"
    } else {
        "disabled"
    };
    println!("Auto-tracking {state}");
    println!("Window {} - {}", settings.start_time, settings.end_time);
    println!(
        "Track dormant activity: {}",
        settings.track_dormant_activity
    );
}

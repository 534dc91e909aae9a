pub mod output;

use std::{
    fmt::Display,
    sync::{Arc, Mutex},
    time::Duration,
};

use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use chrono_english::parse_date_string;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use now::DateTimeNow;
use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::level_filters::LevelFilter;

use crate::{
    detect::SimulatedDetector,
    engine::{
        analytics::{hourly_pattern, summarize, weekly_trend},
        scheduler::{AutoTracker, DEFAULT_TICK_PERIOD},
        ActivityEngine,
    },
    storage::{
        entities::TrackerSettings,
        store::{FileKeyValueStore, SessionStore},
    },
    utils::{
        clock::DefaultClock,
        dir::create_application_default_path,
        logging::enable_logging,
        time::{format_duration, parse_minutes_of_day},
    },
};

#[derive(Parser, Debug)]
#[command(name = "Worklens", version, long_about = None)]
#[command(about = "Personal activity tracker with usage analytics", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, help = "Enable logging")]
    log: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Start tracking an activity, ending whatever was running")]
    Start {
        #[arg(help = "Raw window or document title, e.g. \"Quarterly Report.docx - Word\"")]
        label: String,
    },
    #[command(about = "End the current activity")]
    Stop {},
    #[command(about = "Show the currently tracked activity")]
    Status {},
    #[command(about = "List closed sessions, oldest first")]
    History {
        #[arg(
            long,
            help = "Only sessions starting after this moment. Examples are \"yesterday\", \"1 hour ago\", \"15/03/2026\""
        )]
        since: Option<String>,
        #[arg(
            long,
            default_value_t = false,
            help = "Take the since date as a whole day. For example --since yesterday keeps everything from yesterday's midnight on"
        )]
        whole_days: bool,
        #[arg(long, help = "Keep only the most recent N sessions")]
        limit: Option<usize>,
        #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
        date_style: DateStyle,
    },
    #[command(about = "Forget all closed sessions")]
    Clear {},
    #[command(about = "Usage metrics over the session history")]
    Stats {
        #[command(subcommand)]
        report: StatsReport,
    },
    #[command(about = "Configure automatic tracking")]
    Autotrack {
        #[command(subcommand)]
        command: AutotrackCommand,
    },
    #[command(about = "Run the auto-tracking scheduler in the foreground")]
    Watch {
        #[arg(long, default_value_t = DEFAULT_TICK_PERIOD.as_secs(), help = "Seconds between scheduler ticks")]
        interval_secs: u64,
    },
}

#[derive(Subcommand, Debug)]
enum StatsReport {
    #[command(about = "Headline metrics over the whole history")]
    Summary {},
    #[command(about = "Session counts and durations by hour of day")]
    Hourly {},
    #[command(about = "Daily totals for the last 7 days")]
    Weekly {},
}

#[derive(Subcommand, Debug)]
enum AutotrackCommand {
    #[command(about = "Enable the daily auto-tracking window")]
    Enable {
        #[arg(long, default_value = "09:00", help = "Window start, HH:MM local time")]
        start: String,
        #[arg(long, default_value = "17:00", help = "Window end, HH:MM local time")]
        end: String,
        #[arg(long, help = "Also track dormant activity")]
        dormant: bool,
    },
    #[command(about = "Disable auto-tracking")]
    Disable {},
    #[command(about = "Show the stored auto-tracking settings")]
    Show {},
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    let app_dir = create_application_default_path()?;
    enable_logging(&app_dir, logging_level, args.log)?;

    let store = SessionStore::new(FileKeyValueStore::new(app_dir.join("state"))?);
    let mut engine = ActivityEngine::load(store, Box::new(DefaultClock));

    match args.commands {
        Commands::Start { label } => {
            let session = engine.start_activity(&label);
            println!("Tracking {}", session.app_name);
            Ok(())
        }
        Commands::Stop {} => {
            match engine.end_activity() {
                Some(session) => println!(
                    "Ended {} after {}",
                    session.app_name,
                    format_duration(session.duration)
                ),
                None => println!("Nothing is being tracked"),
            }
            Ok(())
        }
        Commands::Status {} => {
            output::print_status(engine.current_activity());
            Ok(())
        }
        Commands::History {
            since,
            whole_days,
            limit,
            date_style,
        } => {
            let mut history = engine.activity_history();
            if let Some(since) = since {
                let mut since = parse_since(&since, date_style)?;
                if whole_days {
                    since = since.beginning_of_day();
                }
                let since = since.with_timezone(&Utc);
                history.retain(|session| session.start_time >= since);
            }
            if let Some(limit) = limit {
                let skip = history.len().saturating_sub(limit);
                history.drain(..skip);
            }
            output::print_history(&history);
            Ok(())
        }
        Commands::Clear {} => {
            engine.clear_history();
            println!("History cleared");
            Ok(())
        }
        Commands::Stats { report } => {
            let history = engine.activity_history();
            match report {
                StatsReport::Summary {} => {
                    output::print_summary(&summarize(&history, Local::now()))
                }
                StatsReport::Hourly {} => output::print_hourly(&hourly_pattern(&history)),
                StatsReport::Weekly {} => {
                    output::print_weekly(&weekly_trend(&history, Local::now()))
                }
            }
            Ok(())
        }
        Commands::Autotrack { command } => process_autotrack_command(command, &mut engine),
        Commands::Watch { interval_secs } => {
            let settings = engine.tracker_settings();
            if !settings.auto_track_enabled {
                println!("Auto-tracking is disabled. Enable it with `worklens autotrack enable`.");
                return Ok(());
            }
            println!(
                "Auto-tracking between {} and {}. Press Ctrl-C to stop.",
                settings.start_time, settings.end_time
            );

            let shutdown = CancellationToken::new();
            let tracker = AutoTracker::new(
                Arc::new(Mutex::new(engine)),
                SimulatedDetector::new(),
                Box::new(DefaultClock),
                Duration::from_secs(interval_secs),
                shutdown.clone(),
            );

            select! {
                _ = detect_shutdown(shutdown) => Ok(()),
                result = tracker.run() => result,
            }
        }
    }
}

fn process_autotrack_command(
    command: AutotrackCommand,
    engine: &mut ActivityEngine<FileKeyValueStore>,
) -> Result<()> {
    match command {
        AutotrackCommand::Enable {
            start,
            end,
            dormant,
        } => {
            let (Some(start_minutes), Some(end_minutes)) =
                (parse_minutes_of_day(&start), parse_minutes_of_day(&end))
            else {
                return Err(Args::command()
                    .error(
                        clap::error::ErrorKind::ValueValidation,
                        format!("Window bounds must be HH:MM, got {start} and {end}"),
                    )
                    .into());
            };
            if start_minutes >= end_minutes {
                return Err(Args::command()
                    .error(
                        clap::error::ErrorKind::ValueValidation,
                        format!("Window start {start} must be before its end {end}"),
                    )
                    .into());
            }
            engine.update_tracker_settings(TrackerSettings {
                auto_track_enabled: true,
                start_time: start,
                end_time: end,
                track_dormant_activity: dormant,
            });
            println!("Auto-tracking enabled. Run `worklens watch` to keep it running.");
            Ok(())
        }
        AutotrackCommand::Disable {} => {
            let settings = TrackerSettings {
                auto_track_enabled: false,
                ..engine.tracker_settings()
            };
            engine.update_tracker_settings(settings);
            println!("Auto-tracking disabled");
            Ok(())
        }
        AutotrackCommand::Show {} => {
            output::print_settings(&engine.tracker_settings());
            Ok(())
        }
    }
}

fn parse_since(value: &str, date_style: DateStyle) -> Result<DateTime<Local>> {
    match parse_date_string(value, Local::now(), date_style.into()) {
        Ok(moment) => Ok(moment),
        Err(e) => Err(Args::command()
            .error(
                clap::error::ErrorKind::ValueValidation,
                format!("Failed to validate since date {e}"),
            )
            .into()),
    }
}

/// Detects signals sent to the process and cancels the scheduler.
async fn detect_shutdown(cancelation: CancellationToken) {
    select! {
        _ = tokio::signal::ctrl_c() => {
            cancelation.cancel();
        },
    };
}

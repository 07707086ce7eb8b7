use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{Local, TimeZone};
use clap::{Parser, Subcommand};
use itertools::Itertools;
use serde::Deserialize;

use levelstars::game::settings::Settings;
use levelstars::game::{GameContext, LevelSession, RunStatsTable, ThresholdTuner};
use levelstars::model::{LevelNumber, StarThresholds};
use levelstars::ui::LevelSelection;

/// Star thresholds and records for the platformer's levels.
#[derive(Debug, Parser)]
#[command(name = "levelstars", version)]
struct Cli {
    /// Star database file; overrides settings and LEVELSTARS_DB
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Settings JSON file instead of the one in the user data dir
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create the level table and seed thresholds for levels that have none
    Init {
        /// Number of levels to seed, defaults to the configured last level
        #[arg(long)]
        levels: Option<LevelNumber>,
        /// Default 3, 2 and 1 star times in seconds
        #[arg(long, num_args = 3, default_values_t = [30.0, 45.0, 60.0])]
        thresholds: Vec<f64>,
    },
    /// Show thresholds, best times and stars per level
    List,
    /// Set the 3, 2 and 1 star times for a level
    Set {
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        level: LevelNumber,
        three_star: f64,
        two_star: f64,
        one_star: f64,
    },
    /// Show the level selection doors
    Stars {
        /// Number of doors, defaults to the configured last level
        #[arg(long)]
        doors: Option<usize>,
    },
    /// Play a level session that finishes after TIME seconds
    Finish {
        level: LevelNumber,
        time: f64,
        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// Suggest thresholds from recorded runs
    Suggest {
        /// JSON array of {"level": N, "time": SECONDS}
        runs: PathBuf,
        /// Save the suggestions to the database
        #[arg(long)]
        apply: bool,
    },
}

#[derive(Debug, Deserialize)]
struct RecordedRun {
    level: LevelNumber,
    time: f64,
}

fn init_logging() {
    let mut builder = env_logger::Builder::from_default_env();
    if Settings::is_debug_mode() && std::env::var_os("RUST_LOG").is_none() {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();
}

fn main() {
    init_logging();
    if let Err(err) = run(Cli::parse()) {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match &cli.settings {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read settings {}", path.display()))?;
            let mut settings = Settings::from_json(&contents)
                .with_context(|| format!("failed to parse settings {}", path.display()))?;
            settings.apply_env();
            settings
        }
        None => Settings::load(),
    };
    if let Some(db) = &cli.db {
        settings.database_path = db.clone();
    }
    Ok(settings)
}

fn format_time(time: Option<f64>) -> String {
    time.map(|t| format!("{:.2}s", t))
        .unwrap_or_else(|| "-".to_string())
}

fn format_thresholds(thresholds: &StarThresholds) -> String {
    format!(
        "{:.2} / {:.2} / {:.2}",
        thresholds.three_star, thresholds.two_star, thresholds.one_star
    )
}

fn run(cli: Cli) -> Result<()> {
    let settings = load_settings(&cli)?;
    let context = GameContext::open(settings).with_context(|| "failed to open star database")?;

    match cli.command {
        Command::Init { levels, thresholds } => {
            let [three, two, one] = thresholds[..] else {
                bail!("expected three threshold times");
            };
            let defaults = StarThresholds::new(three, two, one);
            let last = levels.unwrap_or(context.settings.last_level);
            let mut seeded = 0;
            for level in 1..=last {
                if context.store.read_thresholds(level).is_none()
                    && context.store.write_thresholds(level, &defaults)
                {
                    seeded += 1;
                }
            }
            println!(
                "Initialized {} ({} levels seeded)",
                context.settings.database_path.display(),
                seeded
            );
        }
        Command::List => {
            let records = context.store.read_all_records();
            if records.is_empty() {
                println!("No levels in database");
            }
            for record in records {
                let thresholds = record
                    .thresholds
                    .as_ref()
                    .map(format_thresholds)
                    .unwrap_or_else(|| "unset".to_string());
                println!(
                    "Level {}: thresholds {} | best {} | stars {}",
                    record.level_number,
                    thresholds,
                    format_time(record.best_finish_time),
                    record.stars_earned
                );
                for warning in record.thresholds.iter().flat_map(|t| t.warnings()) {
                    println!("  warning: {}", warning);
                }
            }
        }
        Command::Set {
            level,
            three_star,
            two_star,
            one_star,
        } => {
            let mut tuner = ThresholdTuner::load(&context.store);
            tuner.set_thresholds(level, StarThresholds::new(three_star, two_star, one_star));
            for (warned_level, warning) in tuner.warnings() {
                println!("Level {}: warning: {}", warned_level, warning);
            }
            let saved = tuner.save();
            println!("Saved {} level thresholds", saved);
        }
        Command::Stars { doors } => {
            let door_count = doors.unwrap_or(context.settings.last_level as usize);
            let selection = LevelSelection::load(&context.store, door_count);
            for door in selection.doors() {
                if door.locked {
                    println!("Level {}: locked", door.level);
                } else {
                    println!("Level {}: {} stars", door.level, door.stars);
                }
            }
            println!("Total: {} stars", selection.total_stars());
        }
        Command::Finish { level, time, json } => {
            if !time.is_finite() || time < 0.0 {
                bail!("finish time must be a non-negative number of seconds");
            }
            let mut session = LevelSession::start(&context, level);
            session.tick(time);
            match session.player_finished() {
                Some(outcome) if json => {
                    println!("{}", serde_json::to_string_pretty(&outcome)?);
                }
                Some(outcome) => {
                    let verdict = if outcome.new_best {
                        "new best".to_string()
                    } else {
                        format!("best remains {}", format_time(outcome.previous_best))
                    };
                    println!(
                        "Level {} finished in {}: {} stars ({}), level has {} stars",
                        outcome.level,
                        session.timer().formatted(),
                        outcome.run_stars,
                        verdict,
                        outcome.stored_stars
                    );
                }
                None => println!("Finish not recorded for level {}", level),
            }
        }
        Command::Suggest { runs, apply } => {
            let contents = fs::read_to_string(&runs)
                .with_context(|| format!("failed to read runs {}", runs.display()))?;
            let recorded: Vec<RecordedRun> = serde_json::from_str(&contents)
                .with_context(|| format!("failed to parse runs {}", runs.display()))?;

            let mut run_stats = RunStatsTable::new();
            for run in &recorded {
                run_stats.record(run.level, run.time);
            }
            if run_stats.is_empty() {
                println!("Recorded runs: none yet");
                return Ok(());
            }

            let multipliers = context.settings.multipliers;
            let mut tuner = ThresholdTuner::load(&context.store);
            for level in run_stats.levels() {
                let Some(stats) = run_stats.get(level) else {
                    continue;
                };
                let last_run = Local
                    .timestamp_opt(stats.last_recorded_at, 0)
                    .single()
                    .map(|date| date.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default();
                println!(
                    "Level {}: runs {} | fastest {:.2}s | avg {:.2}s | slowest {:.2}s | last {}",
                    level,
                    stats.runs,
                    stats.fastest,
                    stats.average(),
                    stats.slowest,
                    last_run
                );
                match tuner.suggestion(level, &run_stats, &multipliers) {
                    Some(suggestion) if suggestion.is_valid() => {
                        println!("  suggested {}", format_thresholds(&suggestion.as_thresholds()));
                    }
                    _ => println!("  no suggestion"),
                }
            }

            if apply {
                let applied = run_stats
                    .levels()
                    .into_iter()
                    .filter(|level| tuner.apply_suggestion(*level, &run_stats, &multipliers))
                    .collect_vec();
                let saved = tuner.save();
                println!(
                    "Applied suggestions for levels [{}]; saved {} level thresholds",
                    applied.iter().join(", "),
                    saved
                );
            }
        }
    }
    Ok(())
}

// ABOUTME: Demo data seeder for the Stride engine record store
// ABOUTME: Generates plausible step history and workout records for dashboards and demos
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Stride Contributors

//! Demo data seeder for the Stride engine.
//!
//! This binary populates the record store with plausible step history and
//! workout records so dashboards and analytics have something to show.
//!
//! Usage:
//! ```bash
//! # Seed 30 days into the default store
//! cargo run --bin seed-demo-data
//!
//! # Seed a specific user and store
//! cargo run --bin seed-demo-data -- --user-id 6d1f... --database-url sqlite:./data/stride.db
//!
//! # Reproducible data, fresh database
//! cargo run --bin seed-demo-data -- --seed 42 --reset
//!
//! # Verbose output
//! cargo run --bin seed-demo-data -- -v
//! ```

use anyhow::Result;
use chrono::{DateTime, Datelike, Days, Duration, NaiveDate, Timelike, Utc, Weekday};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::env;
use tracing::info;
use uuid::Uuid;

use stride_engine::config::StoreUrl;
use stride_engine::constants::energy::{
    KCAL_PER_STEP, METERS_PER_STEP, WORKOUT_INTENSITY_FACTOR, WORKOUT_KCAL_PER_MINUTE,
};
use stride_engine::models::{GoalProfile, NewDailySteps, NewWorkout, StepSource, WorkoutSource};
use stride_engine::store::{RecordStore, Store};

#[derive(Parser)]
#[command(
    name = "seed-demo-data",
    about = "Stride Demo Data Seeder",
    long_about = "Populate the record store with plausible step history and workout records"
)]
struct SeedArgs {
    /// Store URL override (defaults to STRIDE_DATABASE_URL, then the
    /// built-in SQLite path)
    #[arg(long)]
    database_url: Option<String>,

    /// User to seed records for (a fresh id is generated if not specified)
    #[arg(long)]
    user_id: Option<Uuid>,

    /// Number of days of historical data to generate
    #[arg(long, default_value = "30")]
    days: u32,

    /// RNG seed for reproducible data
    #[arg(long)]
    seed: Option<u64>,

    /// Remove an existing SQLite database file before seeding
    #[arg(long)]
    reset: bool,

    /// Enable verbose logging
    #[arg(long, short = 'v')]
    verbose: bool,
}

/// Workout names cycled through the generated records
const WORKOUT_NAMES: &[&str] = &[
    "Full Body Strength",
    "Upper Body Push",
    "Lower Body Power",
    "Core & Mobility",
    "HIIT Circuit",
    "Morning Stretch",
];

/// Check if a date is a weekend
fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = SeedArgs::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(log_level).init();

    info!("=== Stride Demo Data Seeder ===");

    // Load store URL
    let raw_url = args
        .database_url
        .or_else(|| env::var("STRIDE_DATABASE_URL").ok())
        .unwrap_or_else(|| StoreUrl::default().to_connection_string());
    let store_url = StoreUrl::parse(&raw_url)?;

    if args.reset {
        reset_database(&store_url)?;
    }
    prepare_database_dir(&store_url)?;

    info!("Connecting to store: {}", store_url);
    let store = Store::new(&store_url).await?;

    let user_id = args.user_id.unwrap_or_else(Uuid::new_v4);
    info!("Seeding for user: {}", user_id);

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    info!("Step 1: Setting the goal profile...");
    let goal = GoalProfile::default();
    store.upsert_goal_profile(user_id, &goal).await?;
    info!("  Daily step goal: {}", goal.step_goal);

    info!("Step 2: Generating step history ({} days)...", args.days);
    let step_days = seed_step_history(&store, user_id, args.days, goal.step_goal, &mut rng).await?;
    info!("  Wrote {} daily step records", step_days);

    info!("Step 3: Generating workout records...");
    let workout_count = seed_workouts(&store, user_id, args.days, &mut rng).await?;
    info!("  Wrote {} workouts", workout_count);

    info!("");
    info!("=== Seeding Complete ===");
    print_summary(&store, user_id, args.days).await?;

    Ok(())
}

/// Remove an existing SQLite database file so seeding starts clean
fn reset_database(url: &StoreUrl) -> Result<()> {
    if let StoreUrl::Sqlite { path } = url {
        match std::fs::remove_file(path) {
            Ok(()) => info!("Removed existing database: {}", path.display()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
            Err(error) => return Err(error.into()),
        }
    }
    Ok(())
}

/// Create the parent directory of a SQLite database file if needed
fn prepare_database_dir(url: &StoreUrl) -> Result<()> {
    if let StoreUrl::Sqlite { path } = url {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
    }
    Ok(())
}

/// Seed daily step records with weekday/weekend shaping
///
/// Weekdays land around the goal with wide variance, weekends run lower,
/// and roughly one day in twelve is a rest day well under goal.
async fn seed_step_history(
    store: &Store,
    user_id: Uuid,
    days: u32,
    step_goal: u32,
    rng: &mut StdRng,
) -> Result<u32> {
    let today = Utc::now().date_naive();
    let mut written = 0;

    for day_offset in 0..days {
        let date = today
            .checked_sub_days(Days::new(u64::from(day_offset)))
            .unwrap_or(NaiveDate::MIN);

        let factor: f64 = if is_weekend(date) {
            rng.gen_range(0.45..0.95)
        } else {
            rng.gen_range(0.65..1.35)
        };
        let steps: u32 = if rng.gen_bool(1.0 / 12.0) {
            rng.gen_range(500..2_000)
        } else {
            (f64::from(step_goal) * factor) as u32
        };

        let record = NewDailySteps {
            user_id,
            date,
            steps,
            calories_est: f64::from(steps) * KCAL_PER_STEP,
            distance_m: f64::from(steps) * METERS_PER_STEP,
            source: StepSource::DeviceMotion,
        };
        store.upsert_daily_steps(&record).await?;
        written += 1;
    }

    Ok(written)
}

/// Seed workout records on a plausible weekly rhythm
async fn seed_workouts(store: &Store, user_id: Uuid, days: u32, rng: &mut StdRng) -> Result<u32> {
    let mut written = 0;

    for day_offset in 0..days {
        let day = Utc::now() - Duration::days(i64::from(day_offset));

        // Roughly three sessions a week, fewer on weekends
        let chance = if is_weekend(day.date_naive()) {
            0.25
        } else {
            0.45
        };
        if !rng.gen_bool(chance) {
            continue;
        }

        let name = WORKOUT_NAMES[rng.gen_range(0..WORKOUT_NAMES.len())];
        let duration_min: u32 = rng.gen_range(20..75);
        let calories_est =
            (f64::from(duration_min) * WORKOUT_KCAL_PER_MINUTE * WORKOUT_INTENSITY_FACTOR) as u32;

        // Morning or evening slot with minute jitter
        let hour: u32 = if rng.gen_bool(0.7) {
            rng.gen_range(6..10)
        } else {
            rng.gen_range(17..21)
        };
        let completed_at = at_time(day, hour, rng.gen_range(0..60));

        let record = NewWorkout {
            user_id,
            workout_name: name.to_owned(),
            duration_min,
            calories_est,
            source: WorkoutSource::App,
            completed_at,
        };
        store.create_workout(&record).await?;
        written += 1;
    }

    Ok(written)
}

/// Place a timestamp at the given hour and minute of `day`
fn at_time(day: DateTime<Utc>, hour: u32, minute: u32) -> DateTime<Utc> {
    day.with_hour(hour)
        .unwrap_or(day)
        .with_minute(minute)
        .unwrap_or(day)
        .with_second(0)
        .unwrap_or(day)
}

/// Print summary statistics through the store
async fn print_summary(store: &Store, user_id: Uuid, days: u32) -> Result<()> {
    let history = store.get_steps_history(user_id, days).await?;
    let total_steps: u64 = history.iter().map(|r| u64::from(r.steps)).sum();
    let since = Utc::now() - Duration::days(i64::from(days));
    let workouts = store.count_workouts_since(user_id, since).await?;

    info!("Daily step records: {}", history.len());
    info!("Total steps: {}", total_steps);
    info!("Workout records: {}", workouts);
    info!(
        "Done! Point STRIDE_DATABASE_URL at this store and seed the same \
         --user-id to browse the data."
    );
    Ok(())
}

// ABOUTME: Pure derived statistics over step counters and persisted step history
// ABOUTME: Goal progress, calorie and distance estimates, streaks, and trend classification
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Stride Contributors

//! Derived step statistics and history analytics.

use crate::constants::analytics::TREND_STABLE_BAND_PERCENT;
use crate::constants::energy::{KCAL_PER_STEP, METERS_PER_STEP, STEPS_PER_ACTIVE_MINUTE};
use crate::models::{DailyStepRecord, GoalProfile};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Today-centric view over the live counters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepStatistics {
    /// Steps counted today
    pub daily_steps: u32,
    /// Steps counted this calendar week
    pub weekly_steps: u32,
    /// Steps counted this calendar month
    pub monthly_steps: u32,
    /// The user's daily step goal
    pub step_goal: u32,
    /// Today's progress toward the goal, clamped to 100
    pub goal_progress_percent: f64,
    /// Weekly progress against seven times the daily goal, clamped to 100
    pub weekly_progress_percent: f64,
    /// Estimated calories burned today (kcal)
    pub calories_est: u32,
    /// Estimated distance covered today in kilometers
    pub distance_km: f64,
    /// Estimated active minutes today
    pub active_minutes: u32,
}

impl StepStatistics {
    /// Derive statistics from the live counters and the current goal
    #[must_use]
    pub fn compute(daily: u32, weekly: u32, monthly: u32, goal: &GoalProfile) -> Self {
        let step_goal = goal.step_goal.max(1);
        let goal_progress_percent =
            (f64::from(daily) / f64::from(step_goal) * 100.0).clamp(0.0, 100.0);
        let weekly_progress_percent =
            (f64::from(weekly) / (f64::from(step_goal) * 7.0) * 100.0).clamp(0.0, 100.0);

        Self {
            daily_steps: daily,
            weekly_steps: weekly,
            monthly_steps: monthly,
            step_goal,
            goal_progress_percent,
            weekly_progress_percent,
            calories_est: (f64::from(daily) * KCAL_PER_STEP).round() as u32,
            distance_km: f64::from(daily) * METERS_PER_STEP / 1000.0,
            active_minutes: (f64::from(daily) / STEPS_PER_ACTIVE_MINUTE).round() as u32,
        }
    }
}

/// Direction of the step trend over a history window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StepTrend {
    /// Second half of the window averaged more than 5% above the first
    Up,
    /// Second half of the window averaged more than 5% below the first
    Down,
    /// Within the 5% band either way
    #[default]
    Stable,
}

/// The best single day in a history window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestDay {
    /// Date of the highest count
    pub date: NaiveDate,
    /// Steps on that date
    pub steps: u32,
}

/// Aggregates over a window of persisted daily records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepAnalytics {
    /// Number of days that actually have records
    pub recorded_days: u32,
    /// Total steps across the window
    pub total_steps: u64,
    /// Mean steps per recorded day
    pub average_daily: f64,
    /// Highest single-day count, if any records exist
    pub best_day: Option<BestDay>,
    /// Consecutive goal-met days ending at the most recent record
    pub streak_days: u32,
    /// Share of recorded days that met the goal, 0 to 100
    pub goal_achievement_rate: f64,
    /// Sum of recorded distance estimates in kilometers
    pub total_distance_km: f64,
    /// Sum of recorded calorie estimates (kcal)
    pub total_calories: f64,
    /// Direction of change between the window's halves
    pub trend: StepTrend,
    /// Signed percentage change behind the trend
    pub trend_percent: f64,
}

impl StepAnalytics {
    /// Aggregate a history window, most-recent-first as the store returns it
    ///
    /// An empty history yields all zeros and a stable trend.
    #[must_use]
    pub fn from_history(records: &[DailyStepRecord], goal: &GoalProfile) -> Self {
        if records.is_empty() {
            return Self::empty();
        }

        let step_goal = goal.step_goal.max(1);
        let total_steps: u64 = records.iter().map(|r| u64::from(r.steps)).sum();
        let recorded_days = records.len() as u32;
        let average_daily = total_steps as f64 / f64::from(recorded_days);

        let best_day = records
            .iter()
            .max_by_key(|r| r.steps)
            .map(|r| BestDay {
                date: r.date,
                steps: r.steps,
            });

        let goal_met = records.iter().filter(|r| r.steps >= step_goal).count();
        let goal_achievement_rate = goal_met as f64 / f64::from(recorded_days) * 100.0;

        let total_distance_km: f64 = records.iter().map(|r| r.distance_m).sum::<f64>() / 1000.0;
        let total_calories: f64 = records.iter().map(|r| r.calories_est).sum();

        let (trend, trend_percent) = Self::classify_trend(records);

        Self {
            recorded_days,
            total_steps,
            average_daily,
            best_day,
            streak_days: Self::streak(records, step_goal),
            goal_achievement_rate,
            total_distance_km,
            total_calories,
            trend,
            trend_percent,
        }
    }

    fn empty() -> Self {
        Self {
            recorded_days: 0,
            total_steps: 0,
            average_daily: 0.0,
            best_day: None,
            streak_days: 0,
            goal_achievement_rate: 0.0,
            total_distance_km: 0.0,
            total_calories: 0.0,
            trend: StepTrend::Stable,
            trend_percent: 0.0,
        }
    }

    /// Count goal-met days backward from the newest record
    ///
    /// A calendar gap breaks the streak the same way a missed goal does.
    fn streak(records: &[DailyStepRecord], step_goal: u32) -> u32 {
        let mut streak = 0;
        let mut expected: Option<NaiveDate> = None;

        for record in records {
            if let Some(date) = expected {
                if record.date != date {
                    break;
                }
            }
            if record.steps < step_goal {
                break;
            }
            streak += 1;
            expected = record.date.checked_sub_days(Days::new(1));
            if expected.is_none() {
                break;
            }
        }
        streak
    }

    /// Compare chronological half-averages; a 5% band counts as stable
    fn classify_trend(records: &[DailyStepRecord]) -> (StepTrend, f64) {
        if records.len() < 2 {
            return (StepTrend::Stable, 0.0);
        }

        // Records arrive newest first; the back half is the older one
        let midpoint = records.len() / 2;
        let newer = &records[..midpoint];
        let older = &records[midpoint..];

        let half_average = |half: &[DailyStepRecord]| {
            half.iter().map(|r| f64::from(r.steps)).sum::<f64>() / half.len() as f64
        };
        let newer_avg = half_average(newer);
        let older_avg = half_average(older);

        if older_avg == 0.0 {
            return (StepTrend::Stable, 0.0);
        }

        let change_percent = (newer_avg - older_avg) / older_avg * 100.0;
        let trend = if change_percent > TREND_STABLE_BAND_PERCENT {
            StepTrend::Up
        } else if change_percent < -TREND_STABLE_BAND_PERCENT {
            StepTrend::Down
        } else {
            StepTrend::Stable
        };
        (trend, change_percent)
    }
}

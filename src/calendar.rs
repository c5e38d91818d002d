//! Date and progress arithmetic: which month of the plan is "now", how much of
//! the plan is done, and how much ought to be done by now.
//!
//! Everything here is a pure function of its arguments. `now` and the progress
//! store are always passed in, never read ambiently.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};

use crate::plan::Plan;
use crate::progress::{ProgressStore, StoreResult, TaskStatus};

/// Signed whole calendar months from `start` to `now`; the day of month is ignored.
pub fn period_offset(start: NaiveDate, now: NaiveDate) -> i64 {
    let years = i64::from(now.year()) - i64::from(start.year());
    let months = i64::from(now.month0()) - i64::from(start.month0());
    years * 12 + months
}

/// Index of the current month, clamped to `[0, max_month_index]`.
pub fn current_period_index(start: NaiveDate, now: NaiveDate, max_month_index: u32) -> u32 {
    let clamped = period_offset(start, now).clamp(0, i64::from(max_month_index));
    // In range by construction.
    clamped as u32
}

/// Where `now` falls relative to the plan's months.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanPosition {
    /// Clamped month index.
    pub month: u32,
    /// Unclamped month offset from the start date.
    pub offset: i64,
}

impl PlanPosition {
    pub fn of(plan: &Plan, start: NaiveDate, now: NaiveDate) -> Self {
        let max = plan.max_month_index().unwrap_or(0);
        Self {
            month: current_period_index(start, now, max),
            offset: period_offset(start, now),
        }
    }

    pub fn before_start(&self) -> bool {
        self.offset < 0
    }

    /// `now` lies past the last month; the clamp is hiding the overrun.
    pub fn past_end(&self) -> bool {
        self.offset > i64::from(self.month)
    }
}

/// Completed vs. total action counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressSummary {
    pub completed: usize,
    pub total: usize,
    pub percentage: u32,
}

impl ProgressSummary {
    pub fn new(completed: usize, total: usize) -> Self {
        Self {
            completed,
            total,
            percentage: rounded_percentage(completed as u64, total as u64),
        }
    }
}

/// `part / whole` as a percentage rounded half-up; zero when `whole` is zero.
fn rounded_percentage(part: u64, whole: u64) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((part * 100 + whole / 2) / whole) as u32
}

/// Scan every action in the plan and count the completed ones.
pub fn aggregate_progress<S>(plan: &Plan, store: &S) -> StoreResult<ProgressSummary>
where
    S: ProgressStore + ?Sized,
{
    let mut completed = 0;
    let mut total = 0;
    for action in plan.actions() {
        total += 1;
        if store.status(&action.id)? == TaskStatus::Completed {
            completed += 1;
        }
    }
    Ok(ProgressSummary::new(completed, total))
}

/// Linear pacing benchmark: elapsed time over plan days, in `[0, 100]`.
///
/// The plan starts at midnight on `start`. Elapsed time counts partial days,
/// so the benchmark moves during the day rather than at midnight.
pub fn expected_progress(start: NaiveDate, now: NaiveDateTime, total_plan_days: u32) -> u32 {
    if total_plan_days == 0 {
        return 0;
    }
    let elapsed = (now - start.and_time(NaiveTime::MIN)).num_seconds().max(0) as f64;
    let plan = f64::from(total_plan_days) * SECONDS_PER_DAY;
    (elapsed / plan * 100.0).round().min(100.0) as u32
}

const SECONDS_PER_DAY: f64 = 86_400.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pace {
    OnTrack,
    Behind,
}

pub fn pace(actual: u32, expected: u32) -> Pace {
    if actual < expected {
        Pace::Behind
    } else {
        Pace::OnTrack
    }
}

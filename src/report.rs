//! Weekly execution report: effort, completion and struggle time for one week.

use std::fmt::Write as _;

use chrono::NaiveDate;

use crate::plan::{Lane, Plan};
use crate::progress::{ProgressStore, StoreResult, TaskStatus};

/// Struggle minutes per week at or above which the week counts as fully enforced.
pub const ENFORCEMENT_MINUTES: u32 = 6 * 60;

#[derive(Debug, Clone, PartialEq)]
pub struct ReportLine {
    pub lane: Lane,
    pub action_id: String,
    pub description: String,
    pub effort_hours: f32,
    pub status: TaskStatus,
    pub struggle_minutes: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WeekStats {
    pub action_count: usize,
    pub completed_count: usize,
    pub total_effort: f32,
    pub completed_effort: f32,
    pub struggle_minutes: u32,
}

impl WeekStats {
    /// Struggle time in hours, one decimal.
    pub fn struggle_hours(&self) -> String {
        format!("{:.1}", f64::from(self.struggle_minutes) / 60.0)
    }

    pub fn fully_enforced(&self) -> bool {
        self.struggle_minutes >= ENFORCEMENT_MINUTES
    }

    /// One-line summary shown under the week view.
    pub fn summary_line(&self) -> String {
        format!(
            "{}/{} done · {:.1}/{:.1} h effort · {} h struggle",
            self.completed_count,
            self.action_count,
            self.completed_effort,
            self.total_effort,
            self.struggle_hours()
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeekReport {
    pub month: u32,
    pub month_title: String,
    pub week: u32,
    pub stats: WeekStats,
    pub lines: Vec<ReportLine>,
    pub exit_criteria: Vec<String>,
    pub failure_risk: String,
}

impl WeekReport {
    /// `None` if the week is not part of the month.
    pub fn build<S>(plan: &Plan, month: u32, week: u32, store: &S) -> StoreResult<Option<Self>>
    where
        S: ProgressStore + ?Sized,
    {
        let Some(month_data) = plan.month(month) else {
            return Ok(None);
        };
        let Some(week_data) = month_data.week(week) else {
            return Ok(None);
        };

        let mut stats = WeekStats::default();
        let mut lines = Vec::with_capacity(week_data.lanes.len());
        for (lane, action) in week_data.lanes.actions() {
            let status = store.status(&action.id)?;
            let struggle = store.struggle_minutes(&action.id)?;
            stats.action_count += 1;
            stats.total_effort += action.effort_hours;
            stats.struggle_minutes = stats.struggle_minutes.saturating_add(struggle);
            if status == TaskStatus::Completed {
                stats.completed_count += 1;
                stats.completed_effort += action.effort_hours;
            }
            lines.push(ReportLine {
                lane,
                action_id: action.id.clone(),
                description: action.description.clone(),
                effort_hours: action.effort_hours,
                status,
                struggle_minutes: struggle,
            });
        }

        Ok(Some(Self {
            month,
            month_title: month_data.title.clone(),
            week,
            stats,
            lines,
            exit_criteria: month_data.exit_criteria.clone(),
            failure_risk: month_data.failure_risk.clone(),
        }))
    }

    pub fn render_markdown(&self, generated: NaiveDate) -> String {
        let s = &self.stats;
        let mut out = String::new();
        let _ = writeln!(out, "# Execution Report");
        let _ = writeln!(
            out,
            "\nMonth {}: {} · Week {} · {}\n",
            self.month, self.month_title, self.week, generated
        );
        let _ = writeln!(out, "| Metric | Value |");
        let _ = writeln!(out, "|---|---|");
        let _ = writeln!(out, "| Completed | {}/{} |", s.completed_count, s.action_count);
        let _ = writeln!(out, "| Effort | {:.1}/{:.1} h |", s.completed_effort, s.total_effort);
        let _ = writeln!(
            out,
            "| Struggle | {} min ({} h) |",
            s.struggle_minutes,
            s.struggle_hours()
        );
        let _ = writeln!(
            out,
            "| Enforcement | {} |",
            if s.fully_enforced() { "full" } else { "at risk" }
        );

        let mut current_lane = None;
        for line in &self.lines {
            if current_lane != Some(line.lane) {
                let _ = writeln!(out, "\n## {}\n", line.lane.title());
                current_lane = Some(line.lane);
            }
            let mark = if line.status == TaskStatus::Completed { "x" } else { " " };
            let _ = write!(
                out,
                "- [{mark}] `{}` {} ({:.1} h, {})",
                line.action_id, line.description, line.effort_hours, line.status
            );
            if line.struggle_minutes > 0 {
                let _ = write!(out, " · {} min struggle", line.struggle_minutes);
            }
            out.push('\n');
        }

        if !self.exit_criteria.is_empty() {
            let _ = writeln!(out, "\n## Exit criteria\n");
            for criterion in &self.exit_criteria {
                let _ = writeln!(out, "- {criterion}");
            }
        }
        if !self.failure_risk.is_empty() {
            let _ = writeln!(out, "\n## Failure risk\n\n{}", self.failure_risk);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::fixtures::small_plan;
    use crate::progress::MemProgressStore;

    #[test]
    fn stats_sum_effort_and_struggle() {
        let plan = small_plan();
        let store = MemProgressStore::new();
        store.set_status("a1", TaskStatus::Completed).unwrap();
        store.add_struggle_minutes("a1", 50).unwrap();
        store.add_struggle_minutes("a2", 30).unwrap();

        let report = WeekReport::build(&plan, 0, 0, &store).unwrap().unwrap();
        assert_eq!(
            report.stats,
            WeekStats {
                action_count: 2,
                completed_count: 1,
                total_effort: 6.5,
                completed_effort: 4.0,
                struggle_minutes: 80,
            }
        );
        assert_eq!(report.stats.struggle_hours(), "1.3");
        assert!(!report.stats.fully_enforced());
        assert_eq!(report.lines[0].lane, Lane::CoreBuild);
        assert_eq!(report.exit_criteria, vec!["ship the thing".to_string()]);
    }

    #[test]
    fn week_outside_month_is_none() {
        let plan = small_plan();
        let store = MemProgressStore::new();
        assert!(WeekReport::build(&plan, 0, 2, &store).unwrap().is_none());
        assert!(WeekReport::build(&plan, 9, 0, &store).unwrap().is_none());
    }

    #[test]
    fn empty_week_reports_zeroes() {
        let plan = small_plan();
        let store = MemProgressStore::new();
        let report = WeekReport::build(&plan, 2, 3, &store).unwrap().unwrap();
        assert_eq!(report.stats, WeekStats::default());
        assert!(report.lines.is_empty());
    }

    #[test]
    fn enforcement_threshold() {
        let stats = WeekStats {
            struggle_minutes: ENFORCEMENT_MINUTES,
            ..WeekStats::default()
        };
        assert!(stats.fully_enforced());
        assert_eq!(stats.struggle_hours(), "6.0");
    }

    #[test]
    fn markdown_lists_lanes_and_risks() {
        let plan = small_plan();
        let store = MemProgressStore::new();
        store.set_status("a1", TaskStatus::Completed).unwrap();
        let report = WeekReport::build(&plan, 0, 0, &store).unwrap().unwrap();
        let md = report.render_markdown(NaiveDate::from_ymd_opt(2026, 1, 18).unwrap());

        assert!(md.starts_with("# Execution Report"));
        assert!(md.contains("Month 0: Month Zero · Week 0 · 2026-01-18"));
        assert!(md.contains("## Core Build"));
        assert!(md.contains("- [x] `a1` Build the first thing (4.0 h, completed)"));
        assert!(md.contains("- [ ] `a2` Reason about it (2.5 h, not-started)"));
        assert!(md.contains("| Enforcement | at risk |"));
        assert!(md.contains("- ship the thing"));
        assert!(md.contains("skipping basics"));
    }
}

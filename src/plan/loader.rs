//! Plan loading: TOML parsing, lane grouping and structural validation.
//!
//! The reference plan is bundled into the binary via `include_str!`; any other
//! plan file goes through the same parser and validator.

use std::collections::HashSet;
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;

use super::{
    AiPolicy, AtomicAction, Lane, Lanes, MonthData, PhaseData, PhaseMode, Plan, PlanResult,
    Protocols, WeekData,
};
use crate::error::PlanError;

const REFERENCE_PLAN: &str = include_str!("../../data/plans/reference.toml");

// ── TOML deserialization helpers ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct PlanToml {
    plan: PlanMeta,
    #[serde(default)]
    phases: Vec<PhaseData>,
    #[serde(default)]
    months: Vec<MonthToml>,
    #[serde(default)]
    protocols: Protocols,
}

#[derive(Debug, Deserialize)]
struct PlanMeta {
    title: String,
    start_date: NaiveDate,
}

#[derive(Debug, Deserialize)]
struct MonthToml {
    number: u32,
    title: String,
    #[serde(default)]
    objective: String,
    mode: PhaseMode,
    #[serde(default)]
    weeks: Vec<WeekToml>,
    #[serde(default)]
    exit_criteria: Vec<String>,
    #[serde(default)]
    failure_risk: String,
}

#[derive(Debug, Deserialize)]
struct WeekToml {
    number: u32,
    #[serde(default)]
    prerequisites: Vec<String>,
    #[serde(default)]
    actions: Vec<ActionToml>,
}

#[derive(Debug, Deserialize)]
struct ActionToml {
    id: String,
    lane: Lane,
    description: String,
    effort_hours: f32,
    ai_policy: AiPolicy,
    #[serde(default)]
    output_artifact: String,
    #[serde(default)]
    anchor: bool,
}

impl From<WeekToml> for WeekData {
    fn from(raw: WeekToml) -> Self {
        let mut lanes = Lanes::default();
        for a in raw.actions {
            lanes.push(
                a.lane,
                AtomicAction {
                    id: a.id,
                    description: a.description,
                    effort_hours: a.effort_hours,
                    ai_policy: a.ai_policy,
                    output_artifact: a.output_artifact,
                    anchor: a.anchor,
                },
            );
        }
        WeekData {
            number: raw.number,
            prerequisites: raw.prerequisites,
            lanes,
        }
    }
}

impl From<MonthToml> for MonthData {
    fn from(raw: MonthToml) -> Self {
        MonthData {
            number: raw.number,
            title: raw.title,
            objective: raw.objective,
            mode: raw.mode,
            weeks: raw.weeks.into_iter().map(WeekData::from).collect(),
            exit_criteria: raw.exit_criteria,
            failure_risk: raw.failure_risk,
        }
    }
}

impl Plan {
    /// Parse and validate a plan from TOML text.
    pub fn from_toml_str(content: &str) -> PlanResult<Self> {
        let parsed: PlanToml = toml::from_str(content).map_err(|e| PlanError::Parse {
            message: e.to_string(),
        })?;
        let plan = Plan {
            title: parsed.plan.title,
            start_date: parsed.plan.start_date,
            phases: parsed.phases,
            months: parsed.months.into_iter().map(MonthData::from).collect(),
            protocols: parsed.protocols,
        };
        plan.validate()?;
        tracing::debug!(
            phases = plan.phases.len(),
            months = plan.months.len(),
            actions = plan.action_count(),
            "plan loaded"
        );
        Ok(plan)
    }

    /// Load a plan file from disk.
    pub fn load(path: &Path) -> PlanResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| PlanError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_toml_str(&content)
    }

    /// The plan bundled with the binary.
    pub fn reference() -> PlanResult<Self> {
        Self::from_toml_str(REFERENCE_PLAN)
    }

    /// Check the structural invariants every other module relies on.
    pub fn validate(&self) -> PlanResult<()> {
        let mut next_week = 0u32;
        for (expected, month) in (0u32..).zip(&self.months) {
            if month.number != expected {
                return Err(PlanError::MonthSequence {
                    expected,
                    found: month.number,
                });
            }
            for week in &month.weeks {
                if week.number != next_week {
                    return Err(PlanError::WeekSequence {
                        month: month.number,
                        expected: next_week,
                        found: week.number,
                    });
                }
                next_week += 1;
            }
        }

        let mut ids = HashSet::new();
        for action in self.actions() {
            if !ids.insert(action.id.as_str()) {
                return Err(PlanError::DuplicateAction {
                    id: action.id.clone(),
                });
            }
        }

        let mut phase_ids = HashSet::new();
        for phase in &self.phases {
            if !phase_ids.insert(phase.id.as_str()) {
                return Err(PlanError::DuplicatePhase {
                    id: phase.id.clone(),
                });
            }
            if let Some(&month) = phase.months.iter().find(|&&m| self.month(m).is_none()) {
                return Err(PlanError::UnknownMonth {
                    phase: phase.id.clone(),
                    month,
                });
            }
            if phase.months.windows(2).any(|pair| pair[1] != pair[0] + 1) {
                return Err(PlanError::PhaseMonthsNotContiguous {
                    phase: phase.id.clone(),
                });
            }
        }

        Ok(())
    }
}

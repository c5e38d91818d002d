//! The roadmap itself: phases → months → weeks → lane-partitioned actions.
//!
//! A [`Plan`] is loaded once (see [`loader`]) and never mutated. Month and week
//! numbers are contiguous from zero and action ids are unique across the plan;
//! [`Plan::validate`] enforces both, so lookups here can rely on them.

pub mod loader;

#[cfg(test)]
pub(crate) mod fixtures;

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::PlanError;

/// Result type for plan operations.
pub type PlanResult<T> = std::result::Result<T, PlanError>;

/// Operating mode of a phase or month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PhaseMode {
    LearningHeavy,
    BuildingHeavy,
    InterviewHeavy,
    RiskHeavy,
}

impl PhaseMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LearningHeavy => "learning-heavy",
            Self::BuildingHeavy => "building-heavy",
            Self::InterviewHeavy => "interview-heavy",
            Self::RiskHeavy => "risk-heavy",
        }
    }

    /// Badge form: `learning`, `building`, ...
    pub fn short(self) -> &'static str {
        match self {
            Self::LearningHeavy => "learning",
            Self::BuildingHeavy => "building",
            Self::InterviewHeavy => "interview",
            Self::RiskHeavy => "risk",
        }
    }
}

impl fmt::Display for PhaseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether AI assistance is permitted on an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AiPolicy {
    Forbidden,
    CoachOnly,
    Allowed,
}

impl AiPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Forbidden => "forbidden",
            Self::CoachOnly => "coach-only",
            Self::Allowed => "allowed",
        }
    }
}

impl fmt::Display for AiPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category partition of the actions within a week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Lane {
    CoreBuild,
    Reasoning,
    Design,
    Enforcement,
    Deliverables,
}

impl Lane {
    pub const COUNT: usize = 5;

    /// Display order.
    pub const ALL: [Lane; Lane::COUNT] = [
        Lane::CoreBuild,
        Lane::Reasoning,
        Lane::Design,
        Lane::Enforcement,
        Lane::Deliverables,
    ];

    fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CoreBuild => "core-build",
            Self::Reasoning => "reasoning",
            Self::Design => "design",
            Self::Enforcement => "enforcement",
            Self::Deliverables => "deliverables",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::CoreBuild => "Core Build",
            Self::Reasoning => "Reasoning",
            Self::Design => "Design",
            Self::Enforcement => "Enforcement",
            Self::Deliverables => "Deliverables",
        }
    }
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single trackable unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomicAction {
    /// Unique across the plan; keys the stored progress.
    pub id: String,
    pub description: String,
    pub effort_hours: f32,
    pub ai_policy: AiPolicy,
    pub output_artifact: String,
    /// Flagship/anchor project marker.
    pub anchor: bool,
}

/// One ordered action list per [`Lane`]. Every lane is always present, possibly empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Lanes([Vec<AtomicAction>; Lane::COUNT]);

impl Lanes {
    pub fn get(&self, lane: Lane) -> &[AtomicAction] {
        &self.0[lane.index()]
    }

    pub fn push(&mut self, lane: Lane, action: AtomicAction) {
        self.0[lane.index()].push(action);
    }

    /// Lanes in display order, including empty ones.
    pub fn iter(&self) -> impl Iterator<Item = (Lane, &[AtomicAction])> {
        Lane::ALL.into_iter().map(move |lane| (lane, self.get(lane)))
    }

    /// All actions, lane by lane.
    pub fn actions(&self) -> impl Iterator<Item = (Lane, &AtomicAction)> {
        self.iter()
            .flat_map(|(lane, actions)| actions.iter().map(move |a| (lane, a)))
    }

    pub fn len(&self) -> usize {
        self.0.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeekData {
    /// Unique and contiguous across the whole plan.
    pub number: u32,
    /// Free-text references to earlier deliverables.
    pub prerequisites: Vec<String>,
    pub lanes: Lanes,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthData {
    pub number: u32,
    pub title: String,
    pub objective: String,
    pub mode: PhaseMode,
    pub weeks: Vec<WeekData>,
    pub exit_criteria: Vec<String>,
    pub failure_risk: String,
}

impl MonthData {
    pub fn week(&self, number: u32) -> Option<&WeekData> {
        self.weeks.iter().find(|w| w.number == number)
    }

    pub fn first_week(&self) -> Option<&WeekData> {
        self.weeks.first()
    }

    pub fn actions(&self) -> impl Iterator<Item = &AtomicAction> {
        self.weeks
            .iter()
            .flat_map(|w| w.lanes.actions().map(|(_, a)| a))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseData {
    pub id: String,
    pub title: String,
    pub months: Vec<u32>,
    #[serde(default)]
    pub description: String,
    pub mode: PhaseMode,
}

impl PhaseData {
    pub fn contains_month(&self, month: u32) -> bool {
        self.months.contains(&month)
    }
}

/// Escalation steps for when progress stalls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StuckProtocol {
    pub trigger: String,
    pub steps: Vec<String>,
    #[serde(default)]
    pub applicable_months: Vec<u32>,
}

impl StuckProtocol {
    pub fn applies_to(&self, month: u32) -> bool {
        self.applicable_months.contains(&month)
    }
}

/// Plan-wide rules on AI assistance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiContract {
    #[serde(default)]
    pub red_zone: Vec<String>,
    #[serde(default)]
    pub yellow_zone: Vec<String>,
    #[serde(default)]
    pub green_zone: Vec<String>,
    #[serde(default)]
    pub violation_consequences: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Protocols {
    #[serde(default)]
    pub stuck: Option<StuckProtocol>,
    #[serde(default)]
    pub ai_contract: Option<AiContract>,
}

/// Where an action sits in the plan.
#[derive(Debug, Clone, Copy)]
pub struct ActionRef<'a> {
    pub month: &'a MonthData,
    pub week: &'a WeekData,
    pub lane: Lane,
    pub action: &'a AtomicAction,
}

/// The immutable roadmap.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub title: String,
    /// Default start date; a configured start date takes precedence.
    pub start_date: NaiveDate,
    pub phases: Vec<PhaseData>,
    pub months: Vec<MonthData>,
    pub protocols: Protocols,
}

impl Plan {
    pub fn phase(&self, id: &str) -> Option<&PhaseData> {
        self.phases.iter().find(|p| p.id == id)
    }

    pub fn month(&self, number: u32) -> Option<&MonthData> {
        self.months
            .get(number as usize)
            .filter(|m| m.number == number)
    }

    /// First phase whose month list contains `month`.
    pub fn phase_for_month(&self, month: u32) -> Option<&PhaseData> {
        self.phases.iter().find(|p| p.contains_month(month))
    }

    /// The phase's months, in plan order.
    pub fn months_in_phase(&self, phase: &PhaseData) -> Vec<&MonthData> {
        self.months
            .iter()
            .filter(|m| phase.contains_month(m.number))
            .collect()
    }

    /// Highest month number, or `None` for a plan without months.
    pub fn max_month_index(&self) -> Option<u32> {
        self.months.last().map(|m| m.number)
    }

    pub fn actions(&self) -> impl Iterator<Item = &AtomicAction> {
        self.months.iter().flat_map(|m| m.actions())
    }

    pub fn action_count(&self) -> usize {
        self.months
            .iter()
            .flat_map(|m| &m.weeks)
            .map(|w| w.lanes.len())
            .sum()
    }

    /// Find an action and its month, week and lane.
    pub fn locate(&self, id: &str) -> Option<ActionRef<'_>> {
        for month in &self.months {
            for week in &month.weeks {
                if let Some((lane, action)) = week.lanes.actions().find(|(_, a)| a.id == id) {
                    return Some(ActionRef {
                        month,
                        week,
                        lane,
                        action,
                    });
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::fixtures::small_plan;

    #[test]
    fn lanes_keep_every_category() {
        let lanes = Lanes::default();
        assert_eq!(lanes.iter().count(), Lane::COUNT);
        assert!(lanes.is_empty());
    }

    #[test]
    fn lanes_iterate_in_display_order() {
        let mut lanes = Lanes::default();
        let action = |id: &str| AtomicAction {
            id: id.into(),
            description: String::new(),
            effort_hours: 1.0,
            ai_policy: AiPolicy::Allowed,
            output_artifact: String::new(),
            anchor: false,
        };
        lanes.push(Lane::Deliverables, action("d"));
        lanes.push(Lane::CoreBuild, action("c"));
        let order: Vec<_> = lanes.actions().map(|(_, a)| a.id.as_str()).collect();
        assert_eq!(order, ["c", "d"]);
        assert_eq!(lanes.len(), 2);
    }

    #[test]
    fn lookups() {
        let plan = small_plan();
        assert_eq!(plan.phase("beta").unwrap().months, vec![2]);
        assert!(plan.phase("gamma").is_none());
        assert_eq!(plan.month(1).unwrap().title, "Month One");
        assert!(plan.month(7).is_none());
        assert_eq!(plan.phase_for_month(1).unwrap().id, "alpha");
        assert_eq!(plan.max_month_index(), Some(2));
    }

    #[test]
    fn months_in_phase_follow_plan_order() {
        let plan = small_plan();
        let alpha = plan.phase("alpha").unwrap();
        let numbers: Vec<u32> = plan.months_in_phase(alpha).iter().map(|m| m.number).collect();
        assert_eq!(numbers, vec![0, 1]);
    }

    #[test]
    fn locate_finds_lane_and_week() {
        let plan = small_plan();
        let found = plan.locate("a3").unwrap();
        assert_eq!(found.month.number, 0);
        assert_eq!(found.week.number, 1);
        assert_eq!(found.lane, Lane::Deliverables);
        assert!(found.action.anchor);
        assert!(plan.locate("nope").is_none());
    }

    #[test]
    fn counts_every_action() {
        let plan = small_plan();
        assert_eq!(plan.action_count(), 4);
        assert_eq!(plan.actions().count(), 4);
    }

    #[test]
    fn modes_render_kebab_case() {
        assert_eq!(PhaseMode::InterviewHeavy.to_string(), "interview-heavy");
        assert_eq!(PhaseMode::RiskHeavy.short(), "risk");
        assert_eq!(AiPolicy::CoachOnly.to_string(), "coach-only");
        assert_eq!(Lane::CoreBuild.to_string(), "core-build");
    }
}

//! Drill-down navigation: phases → months of a phase → weeks of a month.
//!
//! [`ViewState`] holds ids and numbers only; the plan is passed to every
//! transition that needs to check membership. Every transition that cannot
//! apply leaves the state unchanged and returns `false`.

use crate::plan::{MonthData, PhaseData, Plan};

/// Current navigation level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ViewState {
    #[default]
    Phases,
    Months {
        phase: String,
    },
    Weeks {
        phase: String,
        month: u32,
        /// Selected week of the month; `None` only when the month has no weeks.
        week: Option<u32>,
    },
}

/// Level shown in the header breadcrumb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewLevel {
    Phases,
    Months,
    Weeks,
}

impl ViewLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Phases => "phases",
            Self::Months => "months",
            Self::Weeks => "weeks",
        }
    }
}

impl ViewState {
    pub fn level(&self) -> ViewLevel {
        match self {
            Self::Phases => ViewLevel::Phases,
            Self::Months { .. } => ViewLevel::Months,
            Self::Weeks { .. } => ViewLevel::Weeks,
        }
    }

    pub fn phase_id(&self) -> Option<&str> {
        match self {
            Self::Phases => None,
            Self::Months { phase } | Self::Weeks { phase, .. } => Some(phase),
        }
    }

    pub fn month(&self) -> Option<u32> {
        match self {
            Self::Weeks { month, .. } => Some(*month),
            _ => None,
        }
    }

    pub fn week(&self) -> Option<u32> {
        match self {
            Self::Weeks { week, .. } => *week,
            _ => None,
        }
    }

    /// `Phases → Months(id)`.
    pub fn select_phase(&mut self, plan: &Plan, id: &str) -> bool {
        if !matches!(self, Self::Phases) {
            return false;
        }
        if plan.phase(id).is_none() {
            tracing::debug!(phase = id, "select_phase: unknown phase");
            return false;
        }
        *self = Self::Months { phase: id.to_string() };
        true
    }

    /// `Months(p) → Weeks(p, n)`, provided month `n` belongs to phase `p`.
    pub fn select_month(&mut self, plan: &Plan, number: u32) -> bool {
        let Self::Months { phase } = self else {
            return false;
        };
        let in_phase = plan
            .phase(phase)
            .is_some_and(|p| p.contains_month(number));
        let Some(month) = plan.month(number).filter(|_| in_phase) else {
            tracing::warn!(phase = %phase, month = number, "select_month: month is not part of the phase");
            return false;
        };
        *self = Self::Weeks {
            phase: std::mem::take(phase),
            month: number,
            week: month.first_week().map(|w| w.number),
        };
        true
    }

    /// Switch the selected week within the current month.
    pub fn select_week(&mut self, plan: &Plan, number: u32) -> bool {
        let Self::Weeks { month, week, .. } = self else {
            return false;
        };
        if plan.month(*month).and_then(|m| m.week(number)).is_none() {
            return false;
        }
        *week = Some(number);
        true
    }

    /// Move the week selection by `delta`, staying inside the month.
    pub fn step_week(&mut self, plan: &Plan, delta: i32) -> bool {
        let Some(target) = self
            .week()
            .and_then(|w| w.checked_add_signed(delta))
        else {
            return false;
        };
        self.select_week(plan, target)
    }

    /// Pop one level. No-op at the top.
    pub fn back(&mut self) -> bool {
        match self {
            Self::Phases => false,
            Self::Months { .. } => {
                *self = Self::Phases;
                true
            }
            Self::Weeks { phase, .. } => {
                *self = Self::Months {
                    phase: std::mem::take(phase),
                };
                true
            }
        }
    }

    /// Jump straight to the week view of month `index` from any level.
    pub fn jump_to_today(&mut self, plan: &Plan, index: u32) -> bool {
        let (Some(phase), Some(month)) = (plan.phase_for_month(index), plan.month(index)) else {
            tracing::debug!(month = index, "jump_to_today: no phase contains the month");
            return false;
        };
        *self = Self::Weeks {
            phase: phase.id.clone(),
            month: index,
            week: month.first_week().map(|w| w.number),
        };
        true
    }

    pub fn current_phase<'p>(&self, plan: &'p Plan) -> Option<&'p PhaseData> {
        self.phase_id().and_then(|id| plan.phase(id))
    }

    pub fn current_month<'p>(&self, plan: &'p Plan) -> Option<&'p MonthData> {
        self.month().and_then(|n| plan.month(n))
    }

    /// Header text for the current level.
    pub fn title(&self, plan: &Plan) -> String {
        match self {
            Self::Phases => plan.title.clone(),
            Self::Months { phase } => plan
                .phase(phase)
                .map_or_else(|| "Phase not found".to_string(), |p| p.title.clone()),
            Self::Weeks { month, .. } => plan.month(*month).map_or_else(
                || "Month not found".to_string(),
                |m| format!("Month {}: {}", m.number, m.title),
            ),
        }
    }
}

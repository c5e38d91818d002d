//! Strip layout of the phase and month graphs.
//!
//! The entities of the current level are laid out left to right at a fixed y
//! and joined into a path. Coordinates are abstract layout units; a
//! [`Viewport`] maps them onto whatever surface draws them.

use crate::plan::{PhaseMode, Plan};
use crate::view::ViewState;

/// Box size, spacing and origin of one strip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutParams {
    pub node_width: f64,
    pub node_height: f64,
    pub gap: f64,
    pub start_x: f64,
    pub start_y: f64,
}

impl LayoutParams {
    pub const PHASES: Self = Self {
        node_width: 280.0,
        node_height: 140.0,
        gap: 100.0,
        start_x: 50.0,
        start_y: 150.0,
    };

    pub const MONTHS: Self = Self {
        node_width: 320.0,
        node_height: 180.0,
        gap: 80.0,
        start_x: 50.0,
        start_y: 100.0,
    };

    /// Left edge of the node at `index`.
    pub fn x(&self, index: usize) -> f64 {
        self.start_x + index as f64 * (self.node_width + self.gap)
    }
}

/// The transition a node triggers when activated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeTarget {
    Phase(String),
    Month(u32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimelineNode {
    pub id: String,
    pub label: String,
    pub subtitle: String,
    pub mode: PhaseMode,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub is_current: bool,
    pub target: NodeTarget,
}

impl TimelineNode {
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineEdge {
    pub id: String,
    pub source: String,
    pub target: String,
}

/// Axis-aligned box around every node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Positioned nodes and path edges for one view level.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    pub nodes: Vec<TimelineNode>,
    pub edges: Vec<TimelineEdge>,
}

impl Timeline {
    /// Graph for the current view. The week level has no graph.
    pub fn for_view(plan: &Plan, view: &ViewState, current_month: u32) -> Self {
        match view {
            ViewState::Phases => Self::phases(plan, current_month),
            ViewState::Months { phase } => Self::months(plan, phase, current_month),
            ViewState::Weeks { .. } => Self::default(),
        }
    }

    pub fn phases(plan: &Plan, current_month: u32) -> Self {
        let params = LayoutParams::PHASES;
        let nodes: Vec<_> = plan
            .phases
            .iter()
            .enumerate()
            .map(|(i, phase)| TimelineNode {
                id: phase.id.clone(),
                label: phase.title.clone(),
                subtitle: format!("{} · {} months", phase.mode.short(), phase.months.len()),
                mode: phase.mode,
                x: params.x(i),
                y: params.start_y,
                width: params.node_width,
                height: params.node_height,
                is_current: phase.contains_month(current_month),
                target: NodeTarget::Phase(phase.id.clone()),
            })
            .collect();
        let edges = (1..nodes.len())
            .map(|i| TimelineEdge {
                id: format!("phase-{}-{}", i - 1, i),
                source: nodes[i - 1].id.clone(),
                target: nodes[i].id.clone(),
            })
            .collect();
        Self { nodes, edges }
    }

    /// Months of `phase_id`; empty if the phase is unknown.
    pub fn months(plan: &Plan, phase_id: &str, current_month: u32) -> Self {
        let Some(phase) = plan.phase(phase_id) else {
            return Self::default();
        };
        let params = LayoutParams::MONTHS;
        let months = plan.months_in_phase(phase);
        let nodes = months
            .iter()
            .enumerate()
            .map(|(i, month)| TimelineNode {
                id: format!("month-{}", month.number),
                label: format!("Month {}: {}", month.number, month.title),
                subtitle: format!("{} · {} weeks", month.mode.short(), month.weeks.len()),
                mode: month.mode,
                x: params.x(i),
                y: params.start_y,
                width: params.node_width,
                height: params.node_height,
                is_current: month.number == current_month,
                target: NodeTarget::Month(month.number),
            })
            .collect();
        let edges = months
            .windows(2)
            .map(|pair| TimelineEdge {
                id: format!("month-{}-{}", pair[0].number, pair[1].number),
                source: format!("month-{}", pair[0].number),
                target: format!("month-{}", pair[1].number),
            })
            .collect();
        Self { nodes, edges }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Index of the first node flagged current.
    pub fn current_index(&self) -> Option<usize> {
        self.nodes.iter().position(|n| n.is_current)
    }

    /// Apply the transition of node `index` to `view`.
    pub fn activate(&self, index: usize, plan: &Plan, view: &mut ViewState) -> bool {
        match self.nodes.get(index).map(|n| &n.target) {
            Some(NodeTarget::Phase(id)) => view.select_phase(plan, id),
            Some(NodeTarget::Month(n)) => view.select_month(plan, *n),
            None => false,
        }
    }

    pub fn bounds(&self) -> Option<Bounds> {
        let first = self.nodes.first()?;
        let init = Bounds {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x + first.width,
            max_y: first.y + first.height,
        };
        Some(self.nodes.iter().fold(init, |b, n| Bounds {
            min_x: b.min_x.min(n.x),
            min_y: b.min_y.min(n.y),
            max_x: b.max_x.max(n.x + n.width),
            max_y: b.max_y.max(n.y + n.height),
        }))
    }
}

/// Next node index, wrapping.
pub fn next_index(current: usize, len: usize) -> usize {
    if len == 0 { 0 } else { (current + 1) % len }
}

/// Previous node index, wrapping.
pub fn prev_index(current: usize, len: usize) -> usize {
    if len == 0 {
        0
    } else {
        (current + len - 1) % len
    }
}

/// Zoom and pan mapping layout units onto a surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub zoom: f64,
    pub pan_x: f64,
    pub pan_y: f64,
}

impl Viewport {
    pub const MIN_ZOOM: f64 = 0.1;
    pub const MAX_ZOOM: f64 = 1.5;

    pub const IDENTITY: Self = Self {
        zoom: 1.0,
        pan_x: 0.0,
        pan_y: 0.0,
    };

    /// Zoom and centre `bounds` inside a `width` × `height` surface, keeping
    /// `padding` (a fraction of each side) free on every edge.
    pub fn fit(bounds: Bounds, width: f64, height: f64, padding: f64) -> Self {
        let usable_w = width * (1.0 - 2.0 * padding);
        let usable_h = height * (1.0 - 2.0 * padding);
        let zoom = if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
            Self::MAX_ZOOM
        } else {
            (usable_w / bounds.width()).min(usable_h / bounds.height())
        }
        .clamp(Self::MIN_ZOOM, Self::MAX_ZOOM);

        let center_x = (bounds.min_x + bounds.max_x) / 2.0;
        let center_y = (bounds.min_y + bounds.max_y) / 2.0;
        Self {
            zoom,
            pan_x: width / 2.0 - center_x * zoom,
            pan_y: height / 2.0 - center_y * zoom,
        }
    }

    pub fn project(&self, x: f64, y: f64) -> (f64, f64) {
        (x * self.zoom + self.pan_x, y * self.zoom + self.pan_y)
    }
}

//! TUI widget rendering: header, timeline canvas, week lanes, overlays, status bar.

use std::time::Instant;

use ratatui::Frame;
use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Line as CanvasLine, Rectangle};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use super::{Headline, NoticeKind, TrailTui};
use crate::calendar::Pace;
use crate::plan::{AiPolicy, PhaseMode, Plan};
use crate::progress::{ProgressStore, TaskStatus};
use crate::timeline::{Timeline, TimelineNode, Viewport};
use crate::timer::format_clock;
use crate::view::ViewState;

pub fn mode_color(mode: PhaseMode) -> Color {
    match mode {
        PhaseMode::LearningHeavy => Color::Blue,
        PhaseMode::BuildingHeavy => Color::Green,
        PhaseMode::InterviewHeavy => Color::Magenta,
        PhaseMode::RiskHeavy => Color::Red,
    }
}

pub fn status_glyph(status: TaskStatus) -> (&'static str, Color) {
    match status {
        TaskStatus::NotStarted => ("○", Color::DarkGray),
        TaskStatus::InProgress => ("◐", Color::Yellow),
        TaskStatus::Completed => ("●", Color::Green),
        TaskStatus::Blocked => ("✖", Color::Red),
    }
}

fn policy_color(policy: AiPolicy) -> Color {
    match policy {
        AiPolicy::Forbidden => Color::Red,
        AiPolicy::CoachOnly => Color::Yellow,
        AiPolicy::Allowed => Color::Green,
    }
}

/// Main TUI layout rendering.
pub fn render<S: ProgressStore>(frame: &mut Frame, app: &TrailTui<S>, headline: &Headline, now: Instant) {
    let [header_area, body_area, status_area] = Layout::vertical([
        Constraint::Length(2),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    render_header(frame, header_area, app, headline);

    match app.view() {
        ViewState::Weeks { .. } => render_week(frame, body_area, app, now),
        _ => {
            let position = headline.position.month;
            let timeline = Timeline::for_view(app.plan(), app.view(), position);
            render_timeline(frame, body_area, app.plan(), app.view(), &timeline, app.selected_node());
        }
    }

    render_status(frame, status_area, app);

    if app.show_protocols() {
        render_protocols(frame, app.plan(), headline.position.month);
    }
}

fn render_header<S: ProgressStore>(frame: &mut Frame, area: Rect, app: &TrailTui<S>, headline: &Headline) {
    let [title_area, stats_area] =
        Layout::vertical([Constraint::Length(1), Constraint::Length(1)]).areas(area);

    let title = Paragraph::new(Line::from(vec![
        Span::styled(
            " trailmap ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(" :: {} ", app.view().level().as_str())),
        Span::styled(
            app.view().title(app.plan()),
            Style::default().add_modifier(Modifier::BOLD),
        ),
    ]));
    frame.render_widget(title, title_area);

    let (pace_label, pace_color) = match headline.pace {
        Pace::OnTrack => ("on track", Color::Green),
        Pace::Behind => ("behind", Color::Red),
    };
    let mut spans = vec![
        Span::styled(
            format!(" month {} ", headline.position.month),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw("| "),
        Span::raw(format!(
            "{}/{} done ({}%) ",
            headline.progress.completed, headline.progress.total, headline.progress.percentage
        )),
        Span::raw("| "),
        Span::styled(
            format!("expected {}% ", headline.expected),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(pace_label, Style::default().fg(pace_color)),
    ];
    if headline.position.past_end() {
        spans.push(Span::styled(" | plan ended", Style::default().fg(Color::Yellow)));
    } else if headline.position.before_start() {
        spans.push(Span::styled(" | not started", Style::default().fg(Color::Yellow)));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), stats_area);
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

fn render_timeline(
    frame: &mut Frame,
    area: Rect,
    plan: &Plan,
    view: &ViewState,
    timeline: &Timeline,
    selected: usize,
) {
    let [canvas_area, detail_area] =
        Layout::vertical([Constraint::Fill(1), Constraint::Length(5)]).areas(area);

    let block = Block::default().borders(Borders::ALL).title(" timeline ");
    let inner = block.inner(canvas_area);
    let (width, height) = (f64::from(inner.width), f64::from(inner.height));
    let viewport = timeline
        .bounds()
        .map_or(Viewport::IDENTITY, |b| Viewport::fit(b, width, height, 0.05));

    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .x_bounds([0.0, width])
        .y_bounds([0.0, height])
        .paint(|ctx| {
            // Canvas y grows upwards; layout y grows downwards.
            let flip = |y: f64| height - y;

            for edge in &timeline.edges {
                let (Some(a), Some(b)) = (
                    timeline.nodes.iter().find(|n| n.id == edge.source),
                    timeline.nodes.iter().find(|n| n.id == edge.target),
                ) else {
                    continue;
                };
                let (x1, y1) = viewport.project(a.x + a.width, a.center().1);
                let (x2, y2) = viewport.project(b.x, b.center().1);
                ctx.draw(&CanvasLine {
                    x1,
                    y1: flip(y1),
                    x2,
                    y2: flip(y2),
                    color: Color::DarkGray,
                });
            }

            for (i, node) in timeline.nodes.iter().enumerate() {
                let (x, y) = viewport.project(node.x, node.y);
                let (w, h) = (node.width * viewport.zoom, node.height * viewport.zoom);
                let color = if i == selected { Color::Yellow } else { mode_color(node.mode) };
                ctx.draw(&Rectangle {
                    x,
                    y: flip(y + h),
                    width: w,
                    height: h,
                    color,
                });
            }

            ctx.layer();

            for (i, node) in timeline.nodes.iter().enumerate() {
                let (x, y) = viewport.project(node.x, node.y);
                let cols = (node.width * viewport.zoom).max(2.0) as usize - 1;
                let mut style = Style::default().fg(mode_color(node.mode));
                if i == selected {
                    style = style.add_modifier(Modifier::BOLD | Modifier::REVERSED);
                }
                ctx.print(x + 1.0, flip(y + 1.0), Span::styled(truncate(&node.label, cols), style));
                ctx.print(
                    x + 1.0,
                    flip(y + 2.0),
                    Span::styled(truncate(&node.subtitle, cols), Style::default().fg(Color::Gray)),
                );
                if node.is_current {
                    ctx.print(
                        x + 1.0,
                        flip(y + 3.0),
                        Span::styled("● you are here", Style::default().fg(Color::Cyan)),
                    );
                }
            }
        });
    frame.render_widget(canvas, canvas_area);

    let detail = timeline
        .nodes
        .get(selected)
        .map(|node| node_detail(plan, view, node))
        .unwrap_or_else(|| vec![Line::from("Nothing to show")]);
    frame.render_widget(
        Paragraph::new(detail)
            .block(Block::default().borders(Borders::ALL))
            .wrap(Wrap { trim: true }),
        detail_area,
    );
}

fn node_detail(plan: &Plan, view: &ViewState, node: &TimelineNode) -> Vec<Line<'static>> {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    match view {
        ViewState::Phases => plan
            .phase(&node.id)
            .map(|p| {
                vec![
                    Line::from(Span::styled(p.title.clone(), bold)),
                    Line::from(p.description.clone()),
                ]
            })
            .unwrap_or_default(),
        _ => {
            let Some(month) = plan
                .months
                .iter()
                .find(|m| format!("month-{}", m.number) == node.id)
            else {
                return Vec::new();
            };
            let mut lines = vec![
                Line::from(Span::styled(node.label.clone(), bold)),
                Line::from(month.objective.clone()),
            ];
            if !month.failure_risk.is_empty() {
                lines.push(Line::from(Span::styled(
                    format!("risk: {}", month.failure_risk),
                    Style::default().fg(Color::Red),
                )));
            }
            lines
        }
    }
}

fn render_week<S: ProgressStore>(frame: &mut Frame, area: Rect, app: &TrailTui<S>, now: Instant) {
    let [tabs_area, lanes_area, stats_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .areas(area);

    let plan = app.plan();
    let month = app.view().current_month(plan);
    let selected_week = app.view().week();

    let tabs: Vec<Span> = month
        .map(|m| {
            m.weeks
                .iter()
                .map(|w| {
                    let label = format!(" week {} ", w.number);
                    if Some(w.number) == selected_week {
                        Span::styled(label, Style::default().fg(Color::Black).bg(Color::Cyan))
                    } else {
                        Span::styled(label, Style::default().fg(Color::DarkGray))
                    }
                })
                .collect()
        })
        .unwrap_or_default();
    frame.render_widget(Paragraph::new(Line::from(tabs)), tabs_area);

    let mut lines = Vec::new();
    if let Some(m) = month {
        lines.push(Line::from(Span::styled(
            m.objective.clone(),
            Style::default().fg(Color::Gray),
        )));
    }
    match app.current_week() {
        None => lines.push(Line::from("No weeks planned for this month")),
        Some(week) => {
            if !week.prerequisites.is_empty() {
                lines.push(Line::from(Span::styled(
                    format!("requires: {}", week.prerequisites.join(", ")),
                    Style::default().fg(Color::Yellow),
                )));
            }
            let mut index = 0;
            for (lane, actions) in week.lanes.iter() {
                if actions.is_empty() {
                    continue;
                }
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    lane.title(),
                    Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
                )));
                for action in actions {
                    let status = app.store().status(&action.id).unwrap_or_default();
                    let (glyph, color) = status_glyph(status);
                    let mut spans = vec![
                        Span::styled(format!(" {glyph} "), Style::default().fg(color)),
                        Span::raw(action.description.clone()),
                        Span::styled(
                            format!("  {:.1}h ", action.effort_hours),
                            Style::default().fg(Color::DarkGray),
                        ),
                        Span::styled(
                            format!("ai:{} ", action.ai_policy),
                            Style::default().fg(policy_color(action.ai_policy)),
                        ),
                    ];
                    if action.anchor {
                        spans.push(Span::styled("★ ", Style::default().fg(Color::Yellow)));
                    }
                    if !action.output_artifact.is_empty() {
                        spans.push(Span::styled(
                            format!("→ {} ", action.output_artifact),
                            Style::default().fg(Color::Cyan),
                        ));
                    }
                    if let Some(timer) = app.timers().get(&action.id) {
                        let clock = format_clock(timer.remaining(now));
                        let style = if timer.is_running() {
                            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
                        } else {
                            Style::default().fg(Color::DarkGray)
                        };
                        spans.push(Span::styled(format!("[{clock}]"), style));
                    }
                    let struggle = app.store().struggle_minutes(&action.id).unwrap_or_default();
                    if struggle > 0 {
                        spans.push(Span::styled(
                            format!(" {struggle}m"),
                            Style::default().fg(Color::Magenta),
                        ));
                    }
                    let mut line = Line::from(spans);
                    if index == app.selected_action() {
                        line = line.style(Style::default().add_modifier(Modifier::REVERSED));
                    }
                    lines.push(line);
                    index += 1;
                }
            }
        }
    }

    frame.render_widget(
        Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(" lanes "))
            .wrap(Wrap { trim: false }),
        lanes_area,
    );

    let stats = app
        .week_stats()
        .map(|s| s.summary_line())
        .unwrap_or_default();
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(format!(" {stats} "), Style::default().fg(Color::DarkGray)),
            Span::raw("| "),
            Span::styled(
                "[ ] week · ↑/↓ select · space status · f focus",
                Style::default().fg(Color::DarkGray),
            ),
        ])),
        stats_area,
    );
}

fn render_status<S: ProgressStore>(frame: &mut Frame, area: Rect, app: &TrailTui<S>) {
    let line = match app.latest_notice() {
        Some(notice) => {
            let color = match notice.kind {
                NoticeKind::Info => Color::DarkGray,
                NoticeKind::Success => Color::Green,
                NoticeKind::Warning => Color::Yellow,
                NoticeKind::Error => Color::Red,
            };
            Line::from(Span::styled(format!(" {}", notice.text), Style::default().fg(color)))
        }
        None => Line::from(""),
    };
    let running = app.timers().running_count();
    let mut spans = line.spans;
    if running > 0 {
        spans.push(Span::styled(
            format!("  | {running} focus timer(s) running"),
            Style::default().fg(Color::Green),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn centered(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let [area] = Layout::horizontal([Constraint::Percentage(percent_x)])
        .flex(Flex::Center)
        .areas(area);
    let [area] = Layout::vertical([Constraint::Percentage(percent_y)])
        .flex(Flex::Center)
        .areas(area);
    area
}

fn render_protocols(frame: &mut Frame, plan: &Plan, current_month: u32) {
    let area = centered(frame.area(), 80, 80);
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let mut lines = Vec::new();

    if let Some(stuck) = &plan.protocols.stuck {
        let applies = if stuck.applies_to(current_month) {
            Span::styled(" (applies this month)", Style::default().fg(Color::Yellow))
        } else {
            Span::styled(" (not active this month)", Style::default().fg(Color::DarkGray))
        };
        lines.push(Line::from(vec![Span::styled("Stuck protocol", bold), applies]));
        lines.push(Line::from(Span::styled(
            stuck.trigger.clone(),
            Style::default().fg(Color::Gray),
        )));
        for (i, step) in stuck.steps.iter().enumerate() {
            lines.push(Line::from(format!("  {}. {step}", i + 1)));
        }
        lines.push(Line::from(""));
    }

    if let Some(contract) = &plan.protocols.ai_contract {
        lines.push(Line::from(Span::styled("AI contract", bold)));
        let zones = [
            ("red", Color::Red, &contract.red_zone),
            ("yellow", Color::Yellow, &contract.yellow_zone),
            ("green", Color::Green, &contract.green_zone),
            ("violations", Color::Magenta, &contract.violation_consequences),
        ];
        for (name, color, items) in zones {
            for item in items {
                lines.push(Line::from(vec![
                    Span::styled(format!("  {name:<10} "), Style::default().fg(color)),
                    Span::raw(item.clone()),
                ]));
            }
        }
    }

    if lines.is_empty() {
        lines.push(Line::from("This plan defines no protocols."));
    }

    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" protocols (esc to close) "),
            )
            .wrap(Wrap { trim: false }),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_adds_ellipsis() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer label", 6), "a lon…");
    }

    #[test]
    fn every_status_has_a_distinct_glyph() {
        let glyphs: std::collections::HashSet<_> = [
            TaskStatus::NotStarted,
            TaskStatus::InProgress,
            TaskStatus::Blocked,
            TaskStatus::Completed,
        ]
        .into_iter()
        .map(|s| status_glyph(s).0)
        .collect();
        assert_eq!(glyphs.len(), 4);
    }
}

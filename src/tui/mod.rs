//! ratatui dashboard over the plan.
//!
//! The TUI provides: the phase and month timelines, the week view with its
//! lanes, status cycling and focus timers, a protocols overlay and a
//! notification line. Terminal events are polled every 100 ms; timers are
//! polled on every pass of the loop.

pub mod widgets;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::{NaiveDate, NaiveDateTime};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use miette::IntoDiagnostic;

use crate::backup;
use crate::calendar::{self, Pace, PlanPosition, ProgressSummary};
use crate::plan::{AtomicAction, Plan, WeekData};
use crate::progress::ProgressStore;
use crate::report::{WeekReport, WeekStats};
use crate::timeline::{self, Timeline};
use crate::timer::TimerBoard;
use crate::view::ViewState;

/// How many notices are kept for the status line.
const NOTICE_HISTORY: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
    Warning,
    Error,
}

/// A line for the status bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    fn new(kind: NoticeKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Inputs the dashboard needs besides the plan and the store.
#[derive(Debug, Clone)]
pub struct TuiSettings {
    pub start_date: NaiveDate,
    pub total_plan_days: u32,
    pub session: Duration,
    pub backups_dir: PathBuf,
}

/// Figures shown in the header, recomputed once per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Headline {
    pub position: PlanPosition,
    pub progress: ProgressSummary,
    pub expected: u32,
    pub pace: Pace,
}

/// TUI application state.
pub struct TrailTui<S: ProgressStore> {
    plan: Plan,
    store: S,
    settings: TuiSettings,
    view: ViewState,
    selected_node: usize,
    selected_action: usize,
    timers: TimerBoard,
    notices: Vec<Notice>,
    show_protocols: bool,
    should_quit: bool,
}

impl<S: ProgressStore> TrailTui<S> {
    pub fn new(plan: Plan, store: S, settings: TuiSettings) -> Self {
        let timers = TimerBoard::new(settings.session);
        Self {
            plan,
            store,
            settings,
            view: ViewState::default(),
            selected_node: 0,
            selected_action: 0,
            timers,
            notices: vec![Notice::new(
                NoticeKind::Info,
                "←/→ select · enter open · esc back · t today · p protocols · e export · q quit",
            )],
            show_protocols: false,
            should_quit: false,
        }
    }

    /// Run the TUI event loop.
    pub fn run(&mut self) -> miette::Result<()> {
        let mut terminal = ratatui::init();
        let today = chrono::Local::now().date_naive();
        self.focus_current_node(today);

        let result = self.event_loop(&mut terminal);

        ratatui::restore();
        result
    }

    fn event_loop(&mut self, terminal: &mut ratatui::DefaultTerminal) -> miette::Result<()> {
        loop {
            let now = Instant::now();
            let clock = chrono::Local::now().naive_local();
            let today = clock.date();
            self.on_tick(now);

            let headline = self.headline(clock);
            terminal
                .draw(|frame| widgets::render(frame, self, &headline, now))
                .into_diagnostic()?;

            if self.should_quit {
                break;
            }

            if event::poll(Duration::from_millis(100)).into_diagnostic()? {
                if let Event::Key(key) = event::read().into_diagnostic()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    self.handle_key(key.code, key.modifiers, Instant::now(), today);
                }
            }
        }
        Ok(())
    }

    /// Credit finished focus sessions.
    pub fn on_tick(&mut self, now: Instant) {
        match self.timers.poll(now, &self.store) {
            Ok(done) => {
                for session in done {
                    self.notify(
                        NoticeKind::Success,
                        format!(
                            "Session complete: {} +{} min (total {} min)",
                            session.action_id, session.minutes, session.total_minutes
                        ),
                    );
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to credit focus session");
                self.notify(NoticeKind::Error, format!("Could not save session: {e}"));
            }
        }
    }

    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers, now: Instant, today: NaiveDate) {
        if self.show_protocols {
            if matches!(code, KeyCode::Esc | KeyCode::Char('p') | KeyCode::Char('q')) {
                self.show_protocols = false;
            }
            return;
        }

        match code {
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Esc | KeyCode::Backspace => {
                if self.view.back() {
                    self.after_view_change(today);
                }
            }
            KeyCode::Char('t') => self.jump_to_today(today),
            KeyCode::Char('p') => self.show_protocols = true,
            KeyCode::Char('e') => self.export_backup(today),
            _ if matches!(self.view, ViewState::Weeks { .. }) => self.handle_week_key(code, now),
            _ => self.handle_timeline_key(code, today),
        }
    }

    fn handle_timeline_key(&mut self, code: KeyCode, today: NaiveDate) {
        let timeline = self.timeline(today);
        let len = timeline.nodes.len();
        match code {
            KeyCode::Left | KeyCode::Char('h') => {
                self.selected_node = timeline::prev_index(self.selected_node, len);
            }
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Tab => {
                self.selected_node = timeline::next_index(self.selected_node, len);
            }
            KeyCode::Enter => {
                if timeline.activate(self.selected_node, &self.plan, &mut self.view) {
                    self.after_view_change(today);
                }
            }
            _ => {}
        }
    }

    fn handle_week_key(&mut self, code: KeyCode, now: Instant) {
        let count = self.week_actions().len();
        match code {
            KeyCode::Left | KeyCode::Char('[') | KeyCode::Char('h') => self.step_week(-1),
            KeyCode::Right | KeyCode::Char(']') | KeyCode::Char('l') => self.step_week(1),
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected_action = self.selected_action.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected_action + 1 < count {
                    self.selected_action += 1;
                }
            }
            KeyCode::Char(' ') | KeyCode::Enter => self.cycle_selected(),
            KeyCode::Char('f') => self.toggle_selected_timer(now),
            _ => {}
        }
    }

    fn step_week(&mut self, delta: i32) {
        if self.view.step_week(&self.plan, delta) {
            self.selected_action = 0;
            self.sync_timers();
        }
    }

    fn cycle_selected(&mut self) {
        let Some(id) = self.selected_action_id() else {
            return;
        };
        match self.store.cycle_status(&id) {
            Ok(status) => self.notify(NoticeKind::Info, format!("{id}: {status}")),
            Err(e) => {
                tracing::error!(action = %id, error = %e, "failed to update status");
                self.notify(NoticeKind::Error, format!("Could not save status: {e}"));
            }
        }
    }

    fn toggle_selected_timer(&mut self, now: Instant) {
        let Some(id) = self.selected_action_id() else {
            return;
        };
        let running = self.timers.toggle(&id, now);
        tracing::debug!(action = %id, running, "focus timer toggled");
    }

    fn jump_to_today(&mut self, today: NaiveDate) {
        let position = PlanPosition::of(&self.plan, self.settings.start_date, today);
        if self.view.jump_to_today(&self.plan, position.month) {
            self.after_view_change(today);
            if position.past_end() {
                self.notify(
                    NoticeKind::Warning,
                    format!(
                        "The plan ended {} month(s) ago; showing its last month",
                        position.offset - i64::from(position.month)
                    ),
                );
            } else if position.before_start() {
                self.notify(NoticeKind::Warning, "The plan has not started yet; showing month 0");
            }
        } else {
            self.notify(NoticeKind::Warning, format!("No phase covers month {}", position.month));
        }
    }

    fn export_backup(&mut self, today: NaiveDate) {
        let path = backup::default_path(&self.settings.backups_dir, today);
        let result = backup::export(&self.store).and_then(|b| b.write_file(&path).map(|()| b.len()));
        match result {
            Ok(n) => self.notify(
                NoticeKind::Success,
                format!("Exported {n} entries to {}", path.display()),
            ),
            Err(e) => {
                tracing::error!(error = %e, "backup export failed");
                self.notify(NoticeKind::Error, format!("Export failed: {e}"));
            }
        }
    }

    fn after_view_change(&mut self, today: NaiveDate) {
        self.selected_action = 0;
        self.focus_current_node(today);
        self.sync_timers();
        tracing::debug!(level = self.view.level().as_str(), "view changed");
    }

    fn focus_current_node(&mut self, today: NaiveDate) {
        self.selected_node = self.timeline(today).current_index().unwrap_or(0);
    }

    /// Timers live only as long as their week is on screen.
    fn sync_timers(&mut self) {
        let ids: Vec<String> = self.week_actions().iter().map(|a| a.id.clone()).collect();
        self.timers.retain_mounted(ids.iter().map(String::as_str));
    }

    fn notify(&mut self, kind: NoticeKind, text: impl Into<String>) {
        self.notices.push(Notice::new(kind, text));
        if self.notices.len() > NOTICE_HISTORY {
            self.notices.remove(0);
        }
    }

    // ── Read accessors for rendering ────────────────────────────────────

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn timers(&self) -> &TimerBoard {
        &self.timers
    }

    pub fn selected_node(&self) -> usize {
        self.selected_node
    }

    pub fn selected_action(&self) -> usize {
        self.selected_action
    }

    pub fn show_protocols(&self) -> bool {
        self.show_protocols
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn latest_notice(&self) -> Option<&Notice> {
        self.notices.last()
    }

    pub fn headline(&self, clock: NaiveDateTime) -> Headline {
        let position = PlanPosition::of(&self.plan, self.settings.start_date, clock.date());
        let progress = calendar::aggregate_progress(&self.plan, &self.store).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "progress unavailable");
            ProgressSummary::default()
        });
        let expected =
            calendar::expected_progress(self.settings.start_date, clock, self.settings.total_plan_days);
        Headline {
            position,
            progress,
            expected,
            pace: calendar::pace(progress.percentage, expected),
        }
    }

    pub fn timeline(&self, today: NaiveDate) -> Timeline {
        let position = PlanPosition::of(&self.plan, self.settings.start_date, today);
        Timeline::for_view(&self.plan, &self.view, position.month)
    }

    pub fn current_week(&self) -> Option<&WeekData> {
        let month = self.view.current_month(&self.plan)?;
        month.week(self.view.week()?)
    }

    /// Actions of the selected week, lane by lane.
    pub fn week_actions(&self) -> Vec<&AtomicAction> {
        self.current_week()
            .map(|w| w.lanes.actions().map(|(_, a)| a).collect())
            .unwrap_or_default()
    }

    fn selected_action_id(&self) -> Option<String> {
        self.week_actions()
            .get(self.selected_action)
            .map(|a| a.id.clone())
    }

    pub fn week_stats(&self) -> Option<WeekStats> {
        let (month, week) = (self.view.month()?, self.view.week()?);
        match WeekReport::build(&self.plan, month, week, &self.store) {
            Ok(report) => report.map(|r| r.stats),
            Err(e) => {
                tracing::warn!(error = %e, "week stats unavailable");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::fixtures::small_plan;
    use crate::progress::{MemProgressStore, TaskStatus};
    use tempfile::TempDir;

    fn app(backups_dir: PathBuf) -> TrailTui<MemProgressStore> {
        TrailTui::new(
            small_plan(),
            MemProgressStore::new(),
            TuiSettings {
                start_date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
                total_plan_days: 90,
                session: Duration::from_secs(60),
                backups_dir,
            },
        )
    }

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, d).unwrap()
    }

    fn press(app: &mut TrailTui<MemProgressStore>, code: KeyCode, now: Instant) {
        app.handle_key(code, KeyModifiers::NONE, now, day(2, 1));
    }

    #[test]
    fn keyboard_drill_down_and_back() {
        let now = Instant::now();
        let mut app = app(PathBuf::from("/tmp"));
        press(&mut app, KeyCode::Right, now);
        assert_eq!(app.selected_node(), 1);
        press(&mut app, KeyCode::Left, now);
        press(&mut app, KeyCode::Enter, now);
        assert_eq!(app.view(), &ViewState::Months { phase: "alpha".into() });
        // Month 1 is current on 2026-02-01.
        assert_eq!(app.selected_node(), 1);

        press(&mut app, KeyCode::Enter, now);
        assert_eq!(app.view().month(), Some(1));
        assert_eq!(app.week_actions().len(), 1);

        press(&mut app, KeyCode::Esc, now);
        press(&mut app, KeyCode::Esc, now);
        assert_eq!(app.view(), &ViewState::Phases);
    }

    #[test]
    fn space_cycles_selected_action() {
        let now = Instant::now();
        let mut app = app(PathBuf::from("/tmp"));
        app.handle_key(KeyCode::Char('t'), KeyModifiers::NONE, now, day(1, 20));
        assert_eq!(app.view().month(), Some(0));

        press(&mut app, KeyCode::Down, now);
        press(&mut app, KeyCode::Char(' '), now);
        assert_eq!(app.store().status("a2").unwrap(), TaskStatus::InProgress);
        press(&mut app, KeyCode::Down, now);
        assert_eq!(app.selected_action(), 1);
    }

    #[test]
    fn focus_session_credits_and_leaving_cancels() {
        let t0 = Instant::now();
        let mut app = app(PathBuf::from("/tmp"));
        app.handle_key(KeyCode::Char('t'), KeyModifiers::NONE, t0, day(1, 20));

        press(&mut app, KeyCode::Char('f'), t0);
        assert_eq!(app.timers().running_count(), 1);
        app.on_tick(t0 + Duration::from_secs(60));
        assert_eq!(app.store().struggle_minutes("a1").unwrap(), 1);
        assert_eq!(app.latest_notice().unwrap().kind, NoticeKind::Success);

        press(&mut app, KeyCode::Char('f'), t0);
        press(&mut app, KeyCode::Char(']'), t0);
        assert_eq!(app.view().week(), Some(1));
        assert!(app.timers().get("a1").is_none());
        app.on_tick(t0 + Duration::from_secs(600));
        assert_eq!(app.store().struggle_minutes("a1").unwrap(), 1);
    }

    #[test]
    fn today_past_the_end_warns() {
        let now = Instant::now();
        let mut app = app(PathBuf::from("/tmp"));
        app.handle_key(KeyCode::Char('t'), KeyModifiers::NONE, now, NaiveDate::from_ymd_opt(2027, 1, 1).unwrap());
        assert_eq!(app.view().month(), Some(2));
        assert_eq!(app.latest_notice().unwrap().kind, NoticeKind::Warning);
    }

    #[test]
    fn protocols_overlay_swallows_keys() {
        let now = Instant::now();
        let mut app = app(PathBuf::from("/tmp"));
        press(&mut app, KeyCode::Char('p'), now);
        assert!(app.show_protocols());
        press(&mut app, KeyCode::Enter, now);
        assert_eq!(app.view(), &ViewState::Phases);
        press(&mut app, KeyCode::Esc, now);
        assert!(!app.show_protocols());
        press(&mut app, KeyCode::Char('q'), now);
        assert!(app.should_quit());
    }

    #[test]
    fn export_writes_backup_file() {
        let dir = TempDir::new().unwrap();
        let now = Instant::now();
        let mut app = app(dir.path().to_path_buf());
        app.store().set_status("a1", TaskStatus::Completed).unwrap();
        press(&mut app, KeyCode::Char('e'), now);
        assert!(dir.path().join("trailmap-backup-2026-02-01.json").exists());
        assert_eq!(app.latest_notice().unwrap().kind, NoticeKind::Success);
    }

    #[test]
    fn headline_tracks_pace() {
        let app = app(PathBuf::from("/tmp"));
        app.store().set_status("a1", TaskStatus::Completed).unwrap();
        let headline = app.headline(day(3, 1).and_hms_opt(8, 0, 0).unwrap());
        assert_eq!(headline.position.month, 2);
        assert_eq!(headline.progress.percentage, 25);
        assert_eq!(headline.expected, 50);
        assert_eq!(headline.pace, Pace::Behind);
    }
}

//! Per-action focus session countdown.
//!
//! A [`FocusTimer`] never reads the clock itself: every method takes the
//! caller's `Instant`, and the render loop drives expiry through
//! [`FocusTimer::poll`]. Expiry is reported once per session and the timer is
//! back to a full, idle countdown afterwards.
//!
//! [`TimerBoard`] keeps one timer per action of the mounted week and credits
//! finished sessions to the progress store as struggle minutes.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::progress::{ProgressStore, StoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerState {
    Idle { remaining: Duration },
    Running { started_at: Instant, remaining_at_start: Duration },
}

/// Countdown from a fixed session length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusTimer {
    session: Duration,
    state: TimerState,
}

/// A session that ran to zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionComplete {
    pub action_id: String,
    /// Minutes credited for the session.
    pub minutes: u32,
    /// Struggle total after crediting.
    pub total_minutes: u32,
}

impl FocusTimer {
    pub fn new(session: Duration) -> Self {
        Self {
            session,
            state: TimerState::Idle { remaining: session },
        }
    }

    pub fn session(&self) -> Duration {
        self.session
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, TimerState::Running { .. })
    }

    /// `Idle → Running`. No-op while running.
    pub fn start(&mut self, now: Instant) {
        if let TimerState::Idle { remaining } = self.state {
            self.state = TimerState::Running {
                started_at: now,
                remaining_at_start: remaining,
            };
        }
    }

    /// `Running → Idle`, keeping the remaining time.
    pub fn pause(&mut self, now: Instant) {
        if self.is_running() {
            self.state = TimerState::Idle {
                remaining: self.exact_remaining(now),
            };
        }
    }

    pub fn toggle(&mut self, now: Instant) {
        if self.is_running() {
            self.pause(now);
        } else {
            self.start(now);
        }
    }

    fn exact_remaining(&self, now: Instant) -> Duration {
        match self.state {
            TimerState::Idle { remaining } => remaining,
            TimerState::Running {
                started_at,
                remaining_at_start,
            } => remaining_at_start.saturating_sub(now.saturating_duration_since(started_at)),
        }
    }

    /// Time left, truncated to whole seconds so the display ticks once a second.
    pub fn remaining(&self, now: Instant) -> Duration {
        Duration::from_secs(self.exact_remaining(now).as_secs())
    }

    /// Time spent in the current session so far.
    pub fn elapsed(&self, now: Instant) -> Duration {
        self.session.saturating_sub(self.exact_remaining(now))
    }

    /// Report expiry once and reset to a full idle countdown.
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.is_running() && self.exact_remaining(now).is_zero() {
            self.state = TimerState::Idle {
                remaining: self.session,
            };
            return true;
        }
        false
    }

    /// Whole minutes in a session, at least one.
    pub fn session_minutes(&self) -> u32 {
        u32::try_from(self.session.as_secs() / 60).unwrap_or(u32::MAX).max(1)
    }
}

/// `mm:ss` countdown text.
pub fn format_clock(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Timers for the actions of the mounted week.
#[derive(Debug, Clone)]
pub struct TimerBoard {
    session: Duration,
    timers: HashMap<String, FocusTimer>,
}

impl TimerBoard {
    pub fn new(session: Duration) -> Self {
        Self {
            session,
            timers: HashMap::new(),
        }
    }

    /// Ensure `action_id` has a timer.
    pub fn mount(&mut self, action_id: &str) {
        let session = self.session;
        self.timers
            .entry(action_id.to_string())
            .or_insert_with(|| FocusTimer::new(session));
    }

    /// Drop the timer without crediting anything.
    pub fn unmount(&mut self, action_id: &str) -> bool {
        self.timers.remove(action_id).is_some()
    }

    /// Mount exactly `ids`, cancelling every other timer.
    pub fn retain_mounted<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) {
        let keep: std::collections::HashSet<&str> = ids.into_iter().collect();
        let before = self.timers.len();
        self.timers.retain(|id, _| keep.contains(id.as_str()));
        let cancelled = before - self.timers.len();
        if cancelled > 0 {
            tracing::debug!(cancelled, "timers unmounted");
        }
        for id in keep {
            self.mount(id);
        }
    }

    pub fn get(&self, action_id: &str) -> Option<&FocusTimer> {
        self.timers.get(action_id)
    }

    /// Start or pause `action_id`'s timer, mounting it if needed. Returns whether it now runs.
    pub fn toggle(&mut self, action_id: &str, now: Instant) -> bool {
        self.mount(action_id);
        match self.timers.get_mut(action_id) {
            Some(timer) => {
                timer.toggle(now);
                timer.is_running()
            }
            None => false,
        }
    }

    pub fn running_count(&self) -> usize {
        self.timers.values().filter(|t| t.is_running()).count()
    }

    /// Credit every session that ran out since the last poll.
    pub fn poll<S>(&mut self, now: Instant, store: &S) -> StoreResult<Vec<SessionComplete>>
    where
        S: ProgressStore + ?Sized,
    {
        let mut done = Vec::new();
        for (id, timer) in &mut self.timers {
            if timer.poll(now) {
                let minutes = timer.session_minutes();
                let total_minutes = store.add_struggle_minutes(id, minutes)?;
                tracing::info!(action = %id, minutes, total_minutes, "focus session complete");
                done.push(SessionComplete {
                    action_id: id.clone(),
                    minutes,
                    total_minutes,
                });
            }
        }
        done.sort_by(|a, b| a.action_id.cmp(&b.action_id));
        Ok(done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::MemProgressStore;

    const SESSION: Duration = Duration::from_secs(25 * 60);

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn idle_timer_holds_full_session() {
        let t0 = Instant::now();
        let timer = FocusTimer::new(SESSION);
        assert!(!timer.is_running());
        assert_eq!(timer.remaining(t0 + secs(100)), SESSION);
        assert_eq!(timer.elapsed(t0), Duration::ZERO);
    }

    #[test]
    fn counts_down_in_whole_seconds() {
        let t0 = Instant::now();
        let mut timer = FocusTimer::new(SESSION);
        timer.start(t0);
        assert_eq!(timer.remaining(t0 + Duration::from_millis(1500)), SESSION - secs(2));
        assert_eq!(timer.elapsed(t0 + secs(60)), secs(60));
        assert_eq!(format_clock(timer.remaining(t0 + secs(61))), "23:59");
    }

    #[test]
    fn pause_preserves_remaining() {
        let t0 = Instant::now();
        let mut timer = FocusTimer::new(SESSION);
        timer.start(t0);
        timer.pause(t0 + secs(300));
        assert_eq!(timer.remaining(t0 + secs(10_000)), SESSION - secs(300));

        timer.toggle(t0 + secs(400));
        assert!(timer.is_running());
        assert_eq!(timer.remaining(t0 + secs(500)), SESSION - secs(400));
    }

    #[test]
    fn expiry_fires_once_and_resets() {
        let t0 = Instant::now();
        let mut timer = FocusTimer::new(SESSION);
        timer.start(t0);
        assert!(!timer.poll(t0 + SESSION - secs(1)));
        assert!(timer.poll(t0 + SESSION));
        assert!(!timer.poll(t0 + SESSION + secs(5)));
        assert!(!timer.is_running());
        assert_eq!(timer.remaining(t0 + SESSION + secs(5)), SESSION);
    }

    #[test]
    fn session_minutes_floor_at_one() {
        assert_eq!(FocusTimer::new(SESSION).session_minutes(), 25);
        assert_eq!(FocusTimer::new(secs(10)).session_minutes(), 1);
    }

    #[test]
    fn board_credits_exactly_once() {
        let t0 = Instant::now();
        let store = MemProgressStore::new();
        let mut board = TimerBoard::new(SESSION);
        board.mount("a1");
        assert!(board.toggle("a1", t0));

        let done = board.poll(t0 + SESSION + secs(3), &store).unwrap();
        assert_eq!(
            done,
            vec![SessionComplete {
                action_id: "a1".into(),
                minutes: 25,
                total_minutes: 25
            }]
        );
        assert!(board.poll(t0 + SESSION * 2, &store).unwrap().is_empty());
        assert_eq!(store.struggle_minutes("a1").unwrap(), 25);
    }

    #[test]
    fn start_pause_start_does_not_double_count() {
        let t0 = Instant::now();
        let store = MemProgressStore::new();
        let mut board = TimerBoard::new(SESSION);

        board.toggle("a1", t0);
        board.toggle("a1", t0 + secs(600));
        board.toggle("a1", t0 + secs(700));
        board.toggle("a1", t0 + secs(700));
        board.toggle("a1", t0 + secs(800));
        // 600s + 0s run so far; 900s left from t0+800.
        assert!(board.poll(t0 + secs(1699), &store).unwrap().is_empty());
        assert_eq!(board.poll(t0 + secs(1700), &store).unwrap().len(), 1);
        assert!(board.poll(t0 + secs(5000), &store).unwrap().is_empty());
        assert_eq!(store.struggle_minutes("a1").unwrap(), 25);
    }

    #[test]
    fn unmount_cancels_without_credit() {
        let t0 = Instant::now();
        let store = MemProgressStore::new();
        let mut board = TimerBoard::new(SESSION);
        board.toggle("a1", t0);
        board.toggle("a2", t0);
        board.retain_mounted(["a2", "a3"]);

        assert!(board.get("a1").is_none());
        assert!(board.get("a3").is_some());
        assert_eq!(board.running_count(), 1);
        assert!(board.unmount("a2"));
        assert!(board.poll(t0 + SESSION, &store).unwrap().is_empty());
        assert_eq!(store.struggle_minutes("a1").unwrap(), 0);
    }

    #[test]
    fn independent_timers_complete_separately() {
        let t0 = Instant::now();
        let store = MemProgressStore::new();
        let mut board = TimerBoard::new(secs(60));
        board.toggle("b", t0);
        board.toggle("a", t0 + secs(30));

        let first = board.poll(t0 + secs(60), &store).unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].action_id, "b");
        let second = board.poll(t0 + secs(90), &store).unwrap();
        assert_eq!(second[0].action_id, "a");
        assert_eq!(second[0].minutes, 1);
    }
}

//! Persistence and recovery tests for the durable progress store.
//!
//! These tests verify that statuses, struggle minutes and backups survive a
//! store restart (close + reopen cycle).

use trailmap::backup::{self, Backup};
use trailmap::calendar::aggregate_progress;
use trailmap::paths::TrailPaths;
use trailmap::plan::Plan;
use trailmap::progress::{DurableProgressStore, ProgressStore, TaskStatus};
use trailmap::timer::TimerBoard;

fn store_in(dir: &std::path::Path) -> DurableProgressStore {
    DurableProgressStore::open(&TrailPaths::rooted(dir).store_dir()).unwrap()
}

#[test]
fn progress_survives_restart() {
    let dir = tempfile::TempDir::new().unwrap();
    let plan = Plan::reference().unwrap();

    // First session: complete two actions and log some struggle time.
    {
        let store = store_in(dir.path());
        store.set_status("m0w0-cb1", TaskStatus::Completed).unwrap();
        store.set_status("m0w0-cb2", TaskStatus::Completed).unwrap();
        store.set_status("m0w0-cb3", TaskStatus::Blocked).unwrap();
        store.add_struggle_minutes("m0w0-cb1", 25).unwrap();
    }

    // Second session: reopen and verify.
    {
        let store = store_in(dir.path());
        assert_eq!(store.status("m0w0-cb1").unwrap(), TaskStatus::Completed);
        assert_eq!(store.status("m0w0-cb3").unwrap(), TaskStatus::Blocked);
        assert_eq!(store.struggle_minutes("m0w0-cb1").unwrap(), 25);

        let summary = aggregate_progress(&plan, &store).unwrap();
        assert_eq!(summary.completed, 2);
        assert_eq!(summary.total, plan.action_count());
    }
}

#[test]
fn focus_sessions_accumulate_across_restarts() {
    let dir = tempfile::TempDir::new().unwrap();
    let session = std::time::Duration::from_secs(25 * 60);

    for _ in 0..2 {
        let store = store_in(dir.path());
        let mut board = TimerBoard::new(session);
        let t0 = std::time::Instant::now();
        board.toggle("m0w0-cb1", t0);
        let done = board.poll(t0 + session, &store).unwrap();
        assert_eq!(done.len(), 1);
    }

    let store = store_in(dir.path());
    assert_eq!(store.struggle_minutes("m0w0-cb1").unwrap(), 50);
}

#[test]
fn backup_restores_into_fresh_store() {
    let old = tempfile::TempDir::new().unwrap();
    let new = tempfile::TempDir::new().unwrap();
    let file = old.path().join("backups").join("snapshot.json");

    {
        let store = store_in(old.path());
        store.set_status("m1w4-cb1", TaskStatus::InProgress).unwrap();
        store.add_struggle_minutes("m1w4-cb1", 75).unwrap();
        backup::export(&store).unwrap().write_file(&file).unwrap();
    }

    let store = store_in(new.path());
    let report = backup::import(&store, &Backup::read_file(&file).unwrap()).unwrap();
    assert_eq!(report.restored, 2);
    drop(store);

    let store = store_in(new.path());
    assert_eq!(store.status("m1w4-cb1").unwrap(), TaskStatus::InProgress);
    assert_eq!(store.struggle_minutes("m1w4-cb1").unwrap(), 75);
}

#[test]
fn reset_is_durable() {
    let dir = tempfile::TempDir::new().unwrap();
    {
        let store = store_in(dir.path());
        store.set_status("a", TaskStatus::Completed).unwrap();
        store.add_struggle_minutes("a", 10).unwrap();
        assert_eq!(backup::reset(&store).unwrap(), 2);
    }
    let store = store_in(dir.path());
    assert!(store.entries().unwrap().is_empty());
}

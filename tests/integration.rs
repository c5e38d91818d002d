//! End-to-end tests over the bundled reference plan: navigation, timeline
//! layout, progress and reports working together.

use chrono::NaiveDate;

use trailmap::calendar::{PlanPosition, aggregate_progress, current_period_index, expected_progress};
use trailmap::plan::Plan;
use trailmap::progress::{MemProgressStore, ProgressStore, TaskStatus};
use trailmap::report::WeekReport;
use trailmap::timeline::{LayoutParams, Timeline};
use trailmap::view::ViewState;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn navigate_reference_plan_by_clicking_nodes() {
    let plan = Plan::reference().unwrap();
    let current = current_period_index(plan.start_date, date(2026, 3, 10), plan.max_month_index().unwrap());
    assert_eq!(current, 3);

    let mut view = ViewState::default();
    let phases = Timeline::for_view(&plan, &view, current);
    assert_eq!(phases.nodes.len(), plan.phases.len());
    let here = phases.current_index().unwrap();
    assert_eq!(phases.nodes[here].id, "logic-cleanse");

    assert!(phases.activate(here, &plan, &mut view));
    let months = Timeline::for_view(&plan, &view, current);
    let ids: Vec<&str> = months.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, ["month-2", "month-3", "month-4"]);
    let edge_ids: Vec<&str> = months.edges.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(edge_ids, ["month-2-3", "month-3-4"]);
    for (i, node) in months.nodes.iter().enumerate() {
        assert_eq!(node.x, LayoutParams::MONTHS.x(i));
    }

    let here = months.current_index().unwrap();
    assert!(months.activate(here, &plan, &mut view));
    assert_eq!(view.month(), Some(3));
    assert!(Timeline::for_view(&plan, &view, current).is_empty());
    assert_eq!(view.title(&plan), format!("Month 3: {}", plan.month(3).unwrap().title));
}

#[test]
fn jump_to_today_matches_clamped_index() {
    let plan = Plan::reference().unwrap();
    let far_future = PlanPosition::of(&plan, plan.start_date, date(2030, 1, 1));
    assert_eq!(far_future.month, 14);
    assert!(far_future.past_end());

    let mut view = ViewState::default();
    assert!(view.jump_to_today(&plan, far_future.month));
    assert_eq!(view.phase_id(), Some("portfolio-conversion"));
    let first_week = plan.month(14).unwrap().first_week().unwrap().number;
    assert_eq!(view.week(), Some(first_week));
}

#[test]
fn every_week_reports_consistently() {
    let plan = Plan::reference().unwrap();
    let store = MemProgressStore::new();
    for action in plan.actions().step_by(3) {
        store.set_status(&action.id, TaskStatus::Completed).unwrap();
    }

    let mut completed = 0;
    let mut actions = 0;
    for month in &plan.months {
        for week in &month.weeks {
            let report = WeekReport::build(&plan, month.number, week.number, &store)
                .unwrap()
                .unwrap();
            assert!(report.stats.completed_effort <= report.stats.total_effort);
            completed += report.stats.completed_count;
            actions += report.stats.action_count;
        }
    }

    let summary = aggregate_progress(&plan, &store).unwrap();
    assert_eq!(summary.completed, completed);
    assert_eq!(summary.total, actions);
}

#[test]
fn finishing_everything_reaches_one_hundred_percent() {
    let plan = Plan::reference().unwrap();
    let store = MemProgressStore::new();
    for action in plan.actions() {
        store.set_status(&action.id, TaskStatus::Completed).unwrap();
    }
    assert_eq!(aggregate_progress(&plan, &store).unwrap().percentage, 100);
    let later = date(2030, 1, 1).and_hms_opt(9, 30, 0).unwrap();
    assert_eq!(expected_progress(plan.start_date, later, 365), 100);
}

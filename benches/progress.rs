//! Benchmarks for progress aggregation and timeline layout.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use trailmap::calendar::aggregate_progress;
use trailmap::plan::Plan;
use trailmap::progress::{MemProgressStore, ProgressStore, TaskStatus};
use trailmap::timeline::Timeline;
use trailmap::view::ViewState;

fn half_done(plan: &Plan) -> MemProgressStore {
    let store = MemProgressStore::new();
    for action in plan.actions().step_by(2) {
        store.set_status(&action.id, TaskStatus::Completed).unwrap();
    }
    store
}

fn bench_aggregate_mem(c: &mut Criterion) {
    let plan = Plan::reference().unwrap();
    let store = half_done(&plan);

    c.bench_function("aggregate_progress_mem", |bench| {
        bench.iter(|| black_box(aggregate_progress(&plan, &store).unwrap()))
    });
}

fn bench_aggregate_durable(c: &mut Criterion) {
    let plan = Plan::reference().unwrap();
    let dir = tempfile::TempDir::new().unwrap();
    let store = trailmap::progress::DurableProgressStore::open(dir.path()).unwrap();
    for action in plan.actions().step_by(2) {
        store.set_status(&action.id, TaskStatus::Completed).unwrap();
    }

    c.bench_function("aggregate_progress_redb", |bench| {
        bench.iter(|| black_box(aggregate_progress(&plan, &store).unwrap()))
    });
}

fn bench_timeline(c: &mut Criterion) {
    let plan = Plan::reference().unwrap();
    let view = ViewState::Months {
        phase: "portfolio-conversion".into(),
    };

    c.bench_function("timeline_months", |bench| {
        bench.iter(|| black_box(Timeline::for_view(&plan, &view, 12)))
    });
}

criterion_group!(benches, bench_aggregate_mem, bench_aggregate_durable, bench_timeline);
criterion_main!(benches);

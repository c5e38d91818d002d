// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # trailmap
//!
//! A terminal dashboard for a long-running learning roadmap: phases made of
//! months, months made of weeks, weeks made of lane-partitioned actions.
//!
//! ## Architecture
//!
//! - **Plan** (`plan`): the immutable roadmap, loaded from TOML and validated
//! - **Progress** (`progress`): per-action status and struggle minutes behind a
//!   store trait (in-memory DashMap or durable redb)
//! - **Calendar** (`calendar`): current month, actual vs. expected progress
//! - **View** (`view`): drill-down state machine (phases → months → weeks)
//! - **Timeline** (`timeline`): strip layout of the phase/month graphs
//! - **Timer** (`timer`): edge-triggered focus sessions credited to the store
//! - **Backup** (`backup`), **Report** (`report`): JSON export/import, weekly report
//! - **TUI** (`tui`): ratatui front end
//!
//! ## Library usage
//!
//! ```no_run
//! use trailmap::calendar::aggregate_progress;
//! use trailmap::plan::Plan;
//! use trailmap::progress::{MemProgressStore, ProgressStore, TaskStatus};
//!
//! let plan = Plan::reference().unwrap();
//! let store = MemProgressStore::new();
//! store.set_status("m0w0-cb1", TaskStatus::Completed).unwrap();
//! let summary = aggregate_progress(&plan, &store).unwrap();
//! println!("{}% done", summary.percentage);
//! ```

pub mod backup;
pub mod calendar;
pub mod config;
pub mod error;
pub mod paths;
pub mod plan;
pub mod progress;
pub mod report;
pub mod timeline;
pub mod timer;
pub mod tui;
pub mod view;

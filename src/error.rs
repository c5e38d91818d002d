//! Rich diagnostic error types for trailmap.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes, help text, and source chains so users know exactly what
//! went wrong and how to fix it.

use miette::Diagnostic;
use thiserror::Error;

use crate::config::ConfigError;
use crate::paths::PathError;

/// Top-level error type for trailmap.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text) through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum TrailError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Backup(#[from] BackupError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Path(#[from] PathError),
}

// ---------------------------------------------------------------------------
// Plan errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum PlanError {
    #[error("failed to read plan file: {path}")]
    #[diagnostic(
        code(trailmap::plan::read),
        help("Check that the plan file exists and is readable, or omit --plan to use the bundled plan.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse plan: {message}")]
    #[diagnostic(
        code(trailmap::plan::parse),
        help(
            "The plan must be valid TOML with [plan], [[phases]] and [[months]] tables. \
             Compare against data/plans/reference.toml."
        )
    )]
    Parse { message: String },

    #[error("month numbers must be contiguous from 0: expected {expected}, found {found}")]
    #[diagnostic(
        code(trailmap::plan::month_sequence),
        help("List [[months]] in order and number them 0, 1, 2, ... without gaps or repeats.")
    )]
    MonthSequence { expected: u32, found: u32 },

    #[error("week numbers must be contiguous from 0 across the plan: expected {expected}, found {found} (month {month})")]
    #[diagnostic(
        code(trailmap::plan::week_sequence),
        help("Week numbers run across the whole plan, not per month. Renumber so they continue from the previous month.")
    )]
    WeekSequence { month: u32, expected: u32, found: u32 },

    #[error("duplicate action id \"{id}\"")]
    #[diagnostic(
        code(trailmap::plan::duplicate_action),
        help(
            "Action ids key the stored progress, so each must be unique across the whole plan. \
             Rename the newer action; never rename one that already has history."
        )
    )]
    DuplicateAction { id: String },

    #[error("duplicate phase id \"{id}\"")]
    #[diagnostic(
        code(trailmap::plan::duplicate_phase),
        help("Give every [[phases]] entry a distinct id.")
    )]
    DuplicatePhase { id: String },

    #[error("phase \"{phase}\" references unknown month {month}")]
    #[diagnostic(
        code(trailmap::plan::unknown_month),
        help("A phase's `months` list may only name months defined under [[months]].")
    )]
    UnknownMonth { phase: String, month: u32 },

    #[error("phase \"{phase}\" months are not consecutive")]
    #[diagnostic(
        code(trailmap::plan::phase_months),
        help("A phase covers one unbroken run of months, listed in order, e.g. `months = [2, 3, 4]`.")
    )]
    PhaseMonthsNotContiguous { phase: String },
}

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("I/O error: {source}")]
    #[diagnostic(
        code(trailmap::store::io),
        help(
            "A filesystem operation failed. Check that the data directory exists, \
             has correct permissions, and that the disk is not full."
        )
    )]
    Io {
        #[source]
        source: std::io::Error,
    },

    #[error("redb transaction error: {message}")]
    #[diagnostic(
        code(trailmap::store::redb),
        help(
            "The embedded database encountered an error. If another trailmap is running \
             against the same data directory, close it first. A backup export can be \
             restored into a fresh data directory."
        )
    )]
    Redb { message: String },
}

// ---------------------------------------------------------------------------
// Backup errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum BackupError {
    #[error("invalid backup file: {message}")]
    #[diagnostic(
        code(trailmap::backup::malformed),
        help(
            "A backup is a flat JSON object mapping `action-<id>` and `struggle-<id>` keys \
             to string values. Nothing was imported."
        )
    )]
    Malformed { message: String },

    #[error("failed to access backup file: {path}")]
    #[diagnostic(
        code(trailmap::backup::io),
        help("Check the path and your permissions for it.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),
}

/// Convenience result type for trailmap operations.
pub type TrailResult<T> = std::result::Result<T, TrailError>;

//! Error taxonomy for the repair engine.
//!
//! Mirrors the shape of [`crate::algorithms::AlgorithmError`]-style enums:
//! a handful of variants, one per failure domain, each carrying just enough
//! context to explain itself without a backtrace.

use std::path::PathBuf;

use thiserror::Error;

/// Top level error type returned by every fallible entry point in this crate.
#[derive(Debug, Error)]
pub enum RepairError {
    /// The source tree could not be located, read, or parsed.
    #[error("source unavailable at {path}: {reason}")]
    SourceUnavailable { path: PathBuf, reason: String },

    /// A [`crate::config::Config`] was built with an inconsistent or
    /// out-of-range combination of options.
    #[error("invalid configuration: {0}")]
    ConfigurationInvalid(String),

    /// The test oracle could not be invoked at all (missing interpreter,
    /// crashed harness, ...). Distinct from a candidate merely failing its
    /// tests, which is a fitness of 0, not an error.
    #[error("oracle unavailable: {0}")]
    OracleUnavailable(String),

    /// A single candidate's evaluation exceeded its wall-clock budget.
    #[error("evaluation of candidate timed out after {0:?}")]
    EvaluationTimeout(std::time::Duration),

    /// An invariant the engine itself is supposed to guarantee was violated.
    /// This always indicates a bug in this crate, not bad input.
    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RepairError>;

/// The two ways a repair run can conclude. Not an error: a run that finds no
/// fix is a normal, reportable outcome (spec's `NoRepairFound`), never raised
/// as a [`RepairError`].
#[derive(Debug, Clone)]
pub enum RepairOutcome {
    /// At least one candidate reached the success threshold.
    Repaired(Vec<crate::candidate::Candidate>),
    /// The search ran to completion without finding a passing candidate.
    /// Carries whatever population the driver ended with, best-first.
    NoRepairFound(Vec<crate::candidate::Candidate>),
}

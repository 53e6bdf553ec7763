//! The test oracle boundary (spec §6): running a candidate's materialized
//! source tree against a test suite and reporting which tests passed.
//! Concrete oracle bindings (pytest-style runners, a system-under-test
//! harness, ...) are external collaborators out of scope for this crate;
//! this module only specifies the trait the fitness engine (C5) drives.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::error::Result;

/// Identifies a single test case by name.
pub type TestId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestOutcome {
    Passed,
    Failed,
}

/// The result of running a batch of tests against one materialized
/// working directory.
#[derive(Debug, Clone, Default)]
pub struct Report {
    pub passing: Vec<TestId>,
    pub failing: Vec<TestId>,
    /// Set when the oracle itself could not run (build failure, missing
    /// interpreter, harness crash) as opposed to the tests simply failing.
    pub raised: Option<String>,
}

impl Report {
    pub fn ok(passing: Vec<TestId>, failing: Vec<TestId>) -> Self {
        Report { passing, failing, raised: None }
    }

    pub fn raised(reason: impl Into<String>) -> Self {
        Report { passing: Vec::new(), failing: Vec::new(), raised: Some(reason.into()) }
    }
}

/// Runs a test suite against a materialized working directory.
pub trait Oracle: Send + Sync {
    /// Runs `selectors` (or the whole suite if empty) in `working_dir`.
    fn run_tests(
        &self,
        working_dir: &Path,
        env: &HashMap<String, String>,
        selectors: &[TestId],
        timeout: Duration,
    ) -> Result<Report>;

    /// Runs tests one at a time, yielding each result as it completes, so
    /// callers (the sequential/adaptive engines, C5/C8) can stop early on
    /// the first failure without paying for the rest of the suite.
    fn run_tests_streaming<'a>(
        &'a self,
        working_dir: &'a Path,
        env: &'a HashMap<String, String>,
        selectors: &'a [TestId],
        timeout: Duration,
    ) -> Box<dyn Iterator<Item = (TestId, TestOutcome)> + 'a>;
}

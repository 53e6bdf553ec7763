//! Fitness functions and evaluation engines (C5/C6, §5).
//!
//! A [`Fitness`] turns a test report into a single `f64` score. An
//! [`Engine`] turns a candidate into a fitness score by materializing its
//! edits into a private working directory and handing that directory to
//! an [`Oracle`]. Candidate evaluation is memoized by operator list: the
//! only shared mutable state in the whole engine is that memo map, and
//! because its value is a pure function of its key, two workers racing to
//! fill the same entry is harmless (spec §5).

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

use crate::apply::Applier;
use crate::candidate::Candidate;
use crate::error::{RepairError, Result};
use crate::lang::Unparser;
use crate::oracle::{Oracle, Report, TestId, TestOutcome};
use crate::stmt::Sid;

/// Scores a test report. Implementations never see the candidate itself,
/// only which tests passed and failed, so a `Fitness` is trivially
/// reusable across engines.
pub trait Fitness: Send + Sync {
    fn score(&self, passing: &HashSet<TestId>, failing: &HashSet<TestId>) -> f64;

    /// `true` once a candidate is good enough to stop searching. Default
    /// threshold mirrors the original's `1 - 1e-8` slack for floating
    /// point fitness sums that should equal exactly `1.0`.
    fn is_success(&self, score: f64) -> bool {
        score >= 1.0 - 1e-8
    }
}

/// The GenProg weighted fitness: rewards passing more of the positive
/// (previously-passing) tests and penalizes failing more of the negative
/// (previously-failing) tests, weighted more heavily than the former.
#[derive(Debug, Clone, Copy)]
pub struct GenProgFitness {
    pub w_pos: f64,
    pub w_neg: f64,
    pub total_pos: usize,
    pub total_neg: usize,
}

impl Default for GenProgFitness {
    fn default() -> Self {
        GenProgFitness { w_pos: 1.0, w_neg: 10.0, total_pos: 1, total_neg: 1 }
    }
}

impl Fitness for GenProgFitness {
    fn score(&self, passing: &HashSet<TestId>, failing: &HashSet<TestId>) -> f64 {
        let pos_passing = passing.len() as f64;
        let neg_passing = self.total_neg as f64 - failing.len() as f64;
        let numerator = self.w_pos * pos_passing + self.w_neg * neg_passing.max(0.0);
        let denominator = self.w_pos * self.total_pos as f64 + self.w_neg * self.total_neg as f64;
        if denominator == 0.0 {
            0.0
        } else {
            numerator / denominator
        }
    }
}

/// Fitness counted as the plain fraction of the full suite that passes,
/// with no positive/negative weighting distinction (used by the adaptive
/// engine, C8).
#[derive(Debug, Clone, Copy, Default)]
pub struct AbsoluteFitness {
    pub total_tests: usize,
}

impl Fitness for AbsoluteFitness {
    fn score(&self, passing: &HashSet<TestId>, _failing: &HashSet<TestId>) -> f64 {
        if self.total_tests == 0 {
            0.0
        } else {
            passing.len() as f64 / self.total_tests as f64
        }
    }
}

/// Shared, thread-safe memo: operator list -> already-computed fitness.
pub type Memo = Arc<Mutex<HashMap<Vec<crate::operators::Op>, f64>>>;

pub fn new_memo() -> Memo {
    Arc::new(Mutex::new(HashMap::new()))
}

/// What an [`Engine`] needs to materialize a candidate on disk before
/// handing it to the oracle.
pub struct Materializer<'a> {
    pub source_root: &'a Path,
    pub sids_by_file: &'a HashMap<PathBuf, Vec<Sid>>,
    pub unparser: &'a dyn Unparser,
}

impl<'a> Materializer<'a> {
    /// Copies the source tree into `working_dir` and overwrites every file
    /// that the candidate's overlay touches with its rewritten contents.
    /// Files with no touched statement are left as a plain copy, avoiding
    /// the cost of re-unparsing everything on every evaluation.
    pub fn materialize(&self, candidate: &Candidate, working_dir: &Path) -> Result<()> {
        copy_dir_recursive(self.source_root, working_dir)?;
        let overlay = Applier::apply(&candidate.statements, candidate.ops());
        let touched_files: HashSet<&PathBuf> = self
            .sids_by_file
            .iter()
            .filter(|(_, sids)| sids.iter().any(|s| overlay.contains_key(s)))
            .map(|(f, _)| f)
            .collect();
        for file in touched_files {
            let sids = &self.sids_by_file[file];
            let rendered = Applier::render_file(&candidate.statements, &overlay, sids, self.unparser);
            let relative = file.strip_prefix(self.source_root).unwrap_or(file);
            let dest = working_dir.join(relative);
            std::fs::write(&dest, rendered).map_err(|e| RepairError::SourceUnavailable {
                path: dest,
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }
}

fn copy_dir_recursive(from: &Path, to: &Path) -> Result<()> {
    std::fs::create_dir_all(to).map_err(|e| RepairError::SourceUnavailable {
        path: to.to_path_buf(),
        reason: e.to_string(),
    })?;
    if from.is_file() {
        let name = from.file_name().unwrap_or_default();
        std::fs::copy(from, to.join(name)).map_err(|e| RepairError::SourceUnavailable {
            path: to.to_path_buf(),
            reason: e.to_string(),
        })?;
        return Ok(());
    }
    for entry in std::fs::read_dir(from).map_err(|e| RepairError::SourceUnavailable {
        path: from.to_path_buf(),
        reason: e.to_string(),
    })? {
        let entry = entry.map_err(|e| RepairError::SourceUnavailable {
            path: from.to_path_buf(),
            reason: e.to_string(),
        })?;
        let dest = to.join(entry.file_name());
        if entry.path().is_dir() {
            copy_dir_recursive(&entry.path(), &dest)?;
        } else {
            std::fs::copy(entry.path(), &dest).map_err(|e| RepairError::SourceUnavailable {
                path: dest.clone(),
                reason: e.to_string(),
            })?;
        }
    }
    Ok(())
}

/// Evaluates a batch of candidates against the oracle, filling in each
/// candidate's fitness in place.
pub trait Engine {
    fn evaluate(&self, candidates: &[Candidate]) -> Result<()>;
}

/// Drains test results lazily and can stop after the first failure.
/// Returned by the sequential engine's streaming evaluation (used by the
/// adaptive search, C8, which wants to abort a candidate as soon as one
/// test fails rather than run the whole suite).
pub enum StreamOutcome {
    AllPassed,
    FailedEarly { at_test: TestId },
}

pub struct EngineConfig {
    pub selectors: Vec<TestId>,
    pub timeout: Duration,
    pub raise_on_failure: bool,
}

/// Single-threaded engine: evaluates candidates one at a time in the
/// caller's own working directory copy, streaming test results so a
/// caller can bail out after the first failure.
pub struct SequentialEngine<'a> {
    pub materializer: Materializer<'a>,
    pub oracle: &'a dyn Oracle,
    pub fitness: &'a dyn Fitness,
    pub memo: Memo,
    pub config: EngineConfig,
    pub working_dir: PathBuf,
}

impl<'a> SequentialEngine<'a> {
    fn evaluate_one(&self, candidate: &Candidate) -> Result<f64> {
        if let Some(cached) = self.memo.lock().unwrap().get(candidate.ops()) {
            return Ok(*cached);
        }
        self.materializer.materialize(candidate, &self.working_dir)?;
        let report = self.oracle.run_tests(
            &self.working_dir,
            &HashMap::new(),
            &self.config.selectors,
            self.config.timeout,
        );
        let score = match report {
            Ok(r) => score_report(&r, self.fitness, self.config.raise_on_failure)?,
            Err(e) if self.config.raise_on_failure => return Err(e),
            Err(_) => 0.0,
        };
        self.memo.lock().unwrap().insert(candidate.ops().to_vec(), score);
        Ok(score)
    }

    /// Evaluates tests one at a time against the materialized candidate,
    /// stopping at the first failing test and reporting how far it got
    /// (C8's early-abort evaluation).
    pub fn evaluate_streaming(&self, candidate: &Candidate, ordered_tests: &[TestId]) -> Result<StreamOutcome> {
        self.materializer.materialize(candidate, &self.working_dir)?;
        for (test, outcome) in self.oracle.run_tests_streaming(
            &self.working_dir,
            &HashMap::new(),
            ordered_tests,
            self.config.timeout,
        ) {
            if outcome == TestOutcome::Failed {
                return Ok(StreamOutcome::FailedEarly { at_test: test });
            }
        }
        Ok(StreamOutcome::AllPassed)
    }
}

impl<'a> Engine for SequentialEngine<'a> {
    fn evaluate(&self, candidates: &[Candidate]) -> Result<()> {
        for candidate in candidates {
            let score = self.evaluate_one(candidate)?;
            candidate.set_fitness(score);
        }
        Ok(())
    }
}

fn score_report(report: &Report, fitness: &dyn Fitness, raise_on_failure: bool) -> Result<f64> {
    if let Some(reason) = &report.raised {
        if raise_on_failure {
            return Err(RepairError::OracleUnavailable(reason.clone()));
        }
        return Ok(0.0);
    }
    let passing: HashSet<TestId> = report.passing.iter().cloned().collect();
    let failing: HashSet<TestId> = report.failing.iter().cloned().collect();
    Ok(fitness.score(&passing, &failing))
}

/// Thread-per-worker evaluation pool. Each worker owns a private working
/// directory (`rep_0`, `rep_1`, ... under `base_dir`) and drains a shared
/// queue of candidate indices, writing results back through a channel.
/// The memo map is the only state shared across workers.
pub struct ParallelEngine<'a> {
    pub materializer: Materializer<'a>,
    pub oracle: &'a (dyn Oracle + Sync),
    pub fitness: &'a (dyn Fitness + Sync),
    pub memo: Memo,
    pub config: EngineConfig,
    pub base_dir: PathBuf,
    pub workers: usize,
}

impl<'a> Engine for ParallelEngine<'a> {
    fn evaluate(&self, candidates: &[Candidate]) -> Result<()> {
        let pending: Vec<usize> = (0..candidates.len())
            .filter(|i| !self.memo.lock().unwrap().contains_key(candidates[*i].ops()))
            .collect();
        if pending.is_empty() {
            for c in candidates {
                let cached = *self.memo.lock().unwrap().get(c.ops()).unwrap();
                c.set_fitness(cached);
            }
            return Ok(());
        }

        let (job_tx, job_rx) = mpsc::channel::<usize>();
        let job_rx = Arc::new(Mutex::new(job_rx));
        for idx in &pending {
            job_tx.send(*idx).expect("job channel receiver dropped before sends completed");
        }
        drop(job_tx);

        let (result_tx, result_rx) = mpsc::channel::<(usize, f64)>();
        let worker_count = self.workers.max(1).min(pending.len().max(1));

        std::thread::scope(|scope| {
            for worker_id in 0..worker_count {
                let job_rx = Arc::clone(&job_rx);
                let result_tx = result_tx.clone();
                let working_dir = self.base_dir.join(format!("rep_{worker_id}"));
                scope.spawn(move || {
                    loop {
                        let idx = {
                            let rx = job_rx.lock().unwrap();
                            rx.try_recv()
                        };
                        let idx = match idx {
                            Ok(i) => i,
                            Err(_) => break,
                        };
                        let candidate = &candidates[idx];
                        if let Ok(cached) = self.try_cached(candidate) {
                            let _ = result_tx.send((idx, cached));
                            continue;
                        }
                        let score = self
                            .evaluate_in(candidate, &working_dir)
                            .unwrap_or(0.0);
                        self.memo.lock().unwrap().insert(candidate.ops().to_vec(), score);
                        let _ = result_tx.send((idx, score));
                    }
                });
            }
        });
        drop(result_tx);

        for (idx, score) in result_rx {
            candidates[idx].set_fitness(score);
        }
        Ok(())
    }
}

impl<'a> ParallelEngine<'a> {
    fn try_cached(&self, candidate: &Candidate) -> std::result::Result<f64, ()> {
        self.memo.lock().unwrap().get(candidate.ops()).copied().ok_or(())
    }

    fn evaluate_in(&self, candidate: &Candidate, working_dir: &Path) -> Result<f64> {
        self.materializer.materialize(candidate, working_dir)?;
        let report = self.oracle.run_tests(working_dir, &HashMap::new(), &self.config.selectors, self.config.timeout);
        match report {
            Ok(r) => score_report(&r, self.fitness, self.config.raise_on_failure),
            Err(e) if self.config.raise_on_failure => Err(e),
            Err(_) => Ok(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genprog_fitness_matches_weighted_formula() {
        let f = GenProgFitness { w_pos: 1.0, w_neg: 10.0, total_pos: 2, total_neg: 3 };
        let passing: HashSet<TestId> = ["p1".to_string()].into_iter().collect();
        let failing: HashSet<TestId> = ["n1".to_string()].into_iter().collect();
        let score = f.score(&passing, &failing);
        // pos_passing=1, neg_passing=3-1=2 -> (1*1 + 10*2) / (1*2 + 10*3) = 21/32
        assert!((score - 21.0 / 32.0).abs() < 1e-9);
    }

    #[test]
    fn success_threshold_tolerates_floating_point_slack() {
        let f = GenProgFitness::default();
        assert!(f.is_success(1.0 - 1e-9));
        assert!(!f.is_success(0.999));
    }

    #[test]
    fn absolute_fitness_is_plain_pass_fraction() {
        let f = AbsoluteFitness { total_tests: 4 };
        let passing: HashSet<TestId> = ["a".into(), "b".into(), "c".into()].into_iter().collect();
        assert!((f.score(&passing, &HashSet::new()) - 0.75).abs() < 1e-9);
    }
}

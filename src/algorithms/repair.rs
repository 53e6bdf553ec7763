//! The main repair driver: ties the statement index, fitness engine,
//! search strategy, and minimizer together into the
//! prepare → iterate → finalize pipeline every repair mode (GenProg-style
//! evolutionary, Kali, MutRepair, AE) runs through.
//!
//! Structurally this mirrors a cancellable evolutionary-algorithm driver:
//! one generation at a time, with an injectable callback and cooperative
//! cancellation token, exactly like the fixed-point numeric-optimization
//! loop this crate's ancestor used — only here a "generation" advances an
//! operator-list population instead of a real-valued gene matrix.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{info, warn};

use crate::candidate::Candidate;
use crate::error::{RepairError, RepairOutcome, Result};
use crate::fitness::Engine;
use crate::minimize::Minimizer;
use crate::random::RandomGenerator;
use crate::search::SearchStrategy;

/// Snapshot handed to the optional per-iteration callback.
pub struct IterationData<'a> {
    pub iteration: usize,
    pub population: &'a [Candidate],
}

pub struct GeneticRepairDriver<'a> {
    population: Vec<Candidate>,
    initial_candidate: Candidate,
    engine: Box<dyn Engine + 'a>,
    strategy: Box<dyn SearchStrategy + 'a>,
    minimizer: Box<dyn Minimizer + 'a>,
    rng: Box<dyn RandomGenerator + 'a>,
    population_size: usize,
    num_generations: usize,
    success_threshold: f64,
    verbose: bool,
}

impl<'a> GeneticRepairDriver<'a> {
    pub fn new(
        initial_candidate: Candidate,
        engine: Box<dyn Engine + 'a>,
        strategy: Box<dyn SearchStrategy + 'a>,
        minimizer: Box<dyn Minimizer + 'a>,
        rng: Box<dyn RandomGenerator + 'a>,
        population_size: usize,
        num_generations: usize,
        success_threshold: f64,
        verbose: bool,
    ) -> Self {
        GeneticRepairDriver {
            population: Vec::new(),
            initial_candidate,
            engine,
            strategy,
            minimizer,
            rng,
            population_size,
            num_generations,
            success_threshold,
            verbose,
        }
    }

    /// Fills the population up to `population_size` by cloning random
    /// existing members (or the initial candidate, if the population is
    /// still empty), then scores every member through the engine.
    fn fill_and_evaluate(&mut self) -> Result<()> {
        if self.population.is_empty() {
            self.population.push(self.initial_candidate.clone_candidate(false));
        }
        while self.population.len() < self.population_size {
            let pick = self.rng.choose(&self.population).clone_candidate(false);
            self.population.push(pick);
        }
        self.engine.evaluate(&self.population)
    }

    fn best_fitness(&self) -> f64 {
        self.population.iter().map(|c| c.fitness()).fold(f64::NEG_INFINITY, f64::max)
    }

    fn next(&mut self) -> Result<()> {
        self.fill_and_evaluate()?;
        if self.best_fitness() < self.success_threshold {
            let current = std::mem::take(&mut self.population);
            self.population = self.strategy.search(current, &self.initial_candidate, self.rng.as_mut());
        }
        Ok(())
    }

    pub fn run(&mut self) -> Result<RepairOutcome> {
        self.run_cancellable::<fn(IterationData)>(Arc::new(AtomicBool::new(false)), None)
    }

    pub fn run_cancellable<C>(
        &mut self,
        token: Arc<AtomicBool>,
        mut callback: Option<C>,
    ) -> Result<RepairOutcome>
    where
        C: FnMut(IterationData),
    {
        for current_iter in 0..self.num_generations {
            if token.load(Ordering::Relaxed) {
                if self.verbose {
                    info!("repair run cancelled at generation {current_iter}");
                }
                break;
            }

            self.next()?;

            if self.verbose {
                info!("generation {}: best fitness {:.6}", current_iter + 1, self.best_fitness());
            }
            if let Some(cb) = &mut callback {
                cb(IterationData { iteration: current_iter + 1, population: &self.population });
            }

            if self.best_fitness() >= self.success_threshold {
                break;
            }
        }

        self.finalize()
    }

    /// Filters to the candidates tied at the highest observed fitness,
    /// deduplicates by equality, and minimizes each survivor's operator
    /// list before reporting — unconditionally, whether or not that best
    /// fitness clears the success threshold (spec §4.7 step (b), §7).
    fn finalize(&self) -> Result<RepairOutcome> {
        let best = self.best_fitness();

        let mut seen = std::collections::HashSet::new();
        let mut tied: Vec<Candidate> = self
            .population
            .iter()
            .filter(|c| c.fitness() == best)
            .filter(|c| seen.insert((*c).clone()))
            .cloned()
            .collect();
        tied.sort_by(|a, b| b.fitness().partial_cmp(&a.fitness()).unwrap());

        let minimized: Vec<Candidate> =
            tied.iter().map(|c| self.minimizer.minimize(c, self.engine.as_ref())).collect();

        if best < self.success_threshold {
            return Ok(RepairOutcome::NoRepairFound(minimized));
        }

        if minimized.is_empty() {
            warn!("best fitness met the success threshold but no candidate survived finalization");
            return Err(RepairError::InternalInvariant(
                "success threshold met but finalize() produced no candidates".into(),
            ));
        }
        Ok(RepairOutcome::Repaired(minimized))
    }
}

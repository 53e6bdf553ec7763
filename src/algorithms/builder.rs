//! Fluent builder for [`GeneticRepairDriver`], in the same chained-setter
//! style as the rest of this crate's operator configuration.

use thiserror::Error;

use crate::candidate::Candidate;
use crate::fitness::Engine;
use crate::minimize::{Minimizer, NoopMinimizer};
use crate::random::{RandomGenerator, RepairRandomGenerator};
use crate::search::SearchStrategy;

use super::repair::GeneticRepairDriver;

#[derive(Debug, Error)]
pub enum RepairDriverBuilderError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

pub struct RepairDriverBuilder<'a> {
    initial_candidate: Option<Candidate>,
    engine: Option<Box<dyn Engine + 'a>>,
    strategy: Option<Box<dyn SearchStrategy + 'a>>,
    minimizer: Option<Box<dyn Minimizer + 'a>>,
    rng: Option<Box<dyn RandomGenerator + 'a>>,
    population_size: usize,
    num_generations: usize,
    success_threshold: f64,
    verbose: bool,
}

impl<'a> Default for RepairDriverBuilder<'a> {
    fn default() -> Self {
        RepairDriverBuilder {
            initial_candidate: None,
            engine: None,
            strategy: None,
            minimizer: None,
            rng: None,
            population_size: 40,
            num_generations: 10,
            success_threshold: 1.0 - 1e-8,
            verbose: false,
        }
    }
}

impl<'a> RepairDriverBuilder<'a> {
    pub fn initial_candidate(mut self, candidate: Candidate) -> Self {
        self.initial_candidate = Some(candidate);
        self
    }

    pub fn engine(mut self, engine: impl Engine + 'a) -> Self {
        self.engine = Some(Box::new(engine));
        self
    }

    pub fn strategy(mut self, strategy: impl SearchStrategy + 'a) -> Self {
        self.strategy = Some(Box::new(strategy));
        self
    }

    pub fn minimizer(mut self, minimizer: impl Minimizer + 'a) -> Self {
        self.minimizer = Some(Box::new(minimizer));
        self
    }

    pub fn rng(mut self, rng: impl RandomGenerator + 'a) -> Self {
        self.rng = Some(Box::new(rng));
        self
    }

    pub fn population_size(mut self, size: usize) -> Self {
        self.population_size = size;
        self
    }

    pub fn num_generations(mut self, generations: usize) -> Self {
        self.num_generations = generations;
        self
    }

    pub fn success_threshold(mut self, threshold: f64) -> Self {
        self.success_threshold = threshold;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn build(self) -> Result<GeneticRepairDriver<'a>, RepairDriverBuilderError> {
        let initial_candidate = self.initial_candidate.ok_or(RepairDriverBuilderError::MissingField("initial_candidate"))?;
        let engine = self.engine.ok_or(RepairDriverBuilderError::MissingField("engine"))?;
        let strategy = self.strategy.ok_or(RepairDriverBuilderError::MissingField("strategy"))?;
        let minimizer = self.minimizer.unwrap_or_else(|| Box::new(NoopMinimizer));
        let rng = self.rng.unwrap_or_else(|| Box::new(RepairRandomGenerator::new(0)));

        Ok(GeneticRepairDriver::new(
            initial_candidate,
            engine,
            strategy,
            minimizer,
            rng,
            self.population_size,
            self.num_generations,
            self.success_threshold,
            self.verbose,
        ))
    }
}

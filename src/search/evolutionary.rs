//! GenProg-style evolutionary search (C7, spec §4.7 steps 6-8).
//!
//! Takes an already-filled, already-evaluated population and produces the
//! next one: keep the viable (fitness > 0) candidates, select half of
//! them, cross them over in shuffled pairs, then mutate each survivor by
//! independently rolling each of its suggestions against the mutation
//! rate.

use std::collections::HashMap;

use crate::candidate::Candidate;
use crate::crossover::Crossover;
use crate::localization::WeightedSid;
use crate::operators::{BuildContext, Op, OpKind};
use crate::random::RandomGenerator;
use crate::selection::Selection;
use crate::stmt::StatementTable;
use crate::templates::CardumenEngine;

use super::SearchStrategy;

pub struct EvolutionaryStrategy<'a> {
    pub selection: &'a dyn Selection,
    pub crossover: &'a dyn Crossover,
    pub suggestions: &'a [WeightedSid],
    pub operator_kinds: &'a [OpKind],
    pub operator_weights: &'a HashMap<OpKind, f64>,
    pub universe: &'a [u32],
    pub names: &'a [String],
    pub statements: &'a StatementTable,
    pub cardumen: Option<&'a CardumenEngine>,
    pub mutation_rate: f64,
}

impl<'a> EvolutionaryStrategy<'a> {
    /// Keeps every candidate whose fitness is still positive. If the whole
    /// population dropped to 0, spec §4.7 step 4 restarts the search from
    /// the driver's true initial candidate, not an arbitrary survivor.
    fn viable(&self, population: Vec<Candidate>, initial: &Candidate) -> Vec<Candidate> {
        let viable: Vec<Candidate> = population.into_iter().filter(|c| c.fitness() > 0.0).collect();
        if viable.is_empty() {
            vec![initial.clone()]
        } else {
            viable
        }
    }

    fn crossover_population(&self, mut population: Vec<Candidate>, rng: &mut dyn RandomGenerator) -> Vec<Candidate> {
        rng.shuffle(&mut population);
        let mut offspring = population.clone();
        let mut iter = population.chunks_exact(2);
        for pair in &mut iter {
            if let Some((child_x, child_y)) = self.crossover.crossover(&pair[0], &pair[1], rng) {
                offspring.push(child_x);
                offspring.push(child_y);
            }
        }
        offspring
    }

    /// Per-candidate, per-suggestion mutation: each suggestion is rolled
    /// against its own weight AND, independently, against the global
    /// mutation rate. Both draws must succeed for that suggestion's
    /// statement to receive a fresh operator this round (two independent
    /// Bernoulli trials, not a single combined-probability draw).
    fn mutate_population(&self, population: Vec<Candidate>, rng: &mut dyn RandomGenerator) -> Vec<Candidate> {
        let ctx = BuildContext {
            universe: self.universe,
            names: self.names,
            statements: self.statements,
            cardumen: self.cardumen,
        };
        population
            .into_iter()
            .map(|candidate| {
                let mut ops = candidate.ops().to_vec();
                for suggestion in self.suggestions {
                    if !self.operator_kinds.is_empty() && self.should_mutate(suggestion.weight, rng) {
                        let kind = *rng.choose_weighted(self.operator_kinds, |k| {
                            self.operator_weights.get(k).copied().unwrap_or(1.0)
                        });
                        ops.push(Op::build(kind, suggestion.sid, &ctx, rng));
                    }
                }
                candidate.offspring(ops, true)
            })
            .collect()
    }

    fn should_mutate(&self, weight: f64, rng: &mut dyn RandomGenerator) -> bool {
        rng.gen_bool(weight) && rng.gen_bool(self.mutation_rate)
    }
}

impl<'a> SearchStrategy for EvolutionaryStrategy<'a> {
    fn search(
        &mut self,
        population: Vec<Candidate>,
        initial: &Candidate,
        rng: &mut dyn RandomGenerator,
    ) -> Vec<Candidate> {
        if population.is_empty() {
            return population;
        }
        let viable = self.viable(population, initial);
        let selected = self.selection.select(&viable, (viable.len() / 2).max(1), rng);
        let crossed = self.crossover_population(selected, rng);
        self.mutate_population(crossed, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crossover::OnePointCrossover;
    use crate::random::RepairRandomGenerator;
    use crate::selection::RandomSelection;
    use crate::stmt::StatementTable;
    use std::path::PathBuf;
    use std::sync::Arc;

    #[test]
    fn search_never_panics_on_a_single_candidate_population() {
        let root = Arc::new(PathBuf::from("/tmp/x"));
        let table = Arc::new(StatementTable::default());
        let candidate = Candidate::initial(root, table);
        candidate.set_fitness(0.5);

        let selection = RandomSelection;
        let crossover = OnePointCrossover;
        let suggestions = vec![WeightedSid { sid: 0, weight: 1.0 }];
        let kinds = [OpKind::Delete];
        let weights = HashMap::new();
        let universe = [0u32, 1, 2];
        let names: Vec<String> = Vec::new();
        let statements = StatementTable::default();
        let mut strategy = EvolutionaryStrategy {
            selection: &selection,
            crossover: &crossover,
            suggestions: &suggestions,
            operator_kinds: &kinds,
            operator_weights: &weights,
            universe: &universe,
            names: &names,
            statements: &statements,
            cardumen: None,
            mutation_rate: 1.0,
        };
        let mut rng = RepairRandomGenerator::new(3);
        let initial = candidate.clone();
        let next = strategy.search(vec![candidate], &initial, &mut rng);
        assert!(!next.is_empty());
    }
}

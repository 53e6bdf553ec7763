//! Selection operators (C6): choosing which candidates survive into the
//! next generation's mating pool.

use crate::candidate::Candidate;
use crate::random::RandomGenerator;

pub trait Selection {
    fn select(&self, population: &[Candidate], count: usize, rng: &mut dyn RandomGenerator) -> Vec<Candidate>;
}

/// Selects `count` distinct candidates uniformly at random, or the whole
/// population if it's no larger than `count`.
pub struct RandomSelection;

impl Selection for RandomSelection {
    fn select(&self, population: &[Candidate], count: usize, rng: &mut dyn RandomGenerator) -> Vec<Candidate> {
        if population.len() <= count {
            return population.to_vec();
        }
        rng.sample_indices(population.len(), count)
            .into_iter()
            .map(|i| population[i].clone())
            .collect()
    }
}

/// Stochastic-universal-style selection: candidates are drawn with
/// probability proportional to fitness. Falls back to [`RandomSelection`]
/// when the total fitness is too close to zero to weight meaningfully.
pub struct UniversalSelection;

const EPSILON: f64 = 1e-9;

impl Selection for UniversalSelection {
    fn select(&self, population: &[Candidate], count: usize, rng: &mut dyn RandomGenerator) -> Vec<Candidate> {
        let total: f64 = population.iter().map(|c| c.fitness()).sum();
        if total <= EPSILON {
            return RandomSelection.select(population, count, rng);
        }
        let mut chosen = Vec::with_capacity(count);
        for _ in 0..count {
            let mut target = rng.gen_float() * total;
            let mut picked = &population[population.len() - 1];
            for c in population {
                target -= c.fitness();
                if target <= 0.0 {
                    picked = c;
                    break;
                }
            }
            chosen.push(picked.clone());
        }
        chosen
    }
}

/// Repeated tournaments of `tournament_size` candidates drawn without
/// replacement from the remaining pool; the fittest of each tournament
/// wins and is removed from the pool before the next tournament starts.
pub struct TournamentSelection {
    pub tournament_size: usize,
}

impl Selection for TournamentSelection {
    fn select(&self, population: &[Candidate], count: usize, rng: &mut dyn RandomGenerator) -> Vec<Candidate> {
        let mut pool: Vec<Candidate> = population.to_vec();
        let mut chosen = Vec::with_capacity(count);
        while chosen.len() < count && !pool.is_empty() {
            let size = self.tournament_size.min(pool.len());
            let indices = rng.sample_indices(pool.len(), size);
            let winner_idx = indices
                .iter()
                .copied()
                .max_by(|&a, &b| pool[a].fitness().partial_cmp(&pool[b].fitness()).unwrap())
                .unwrap();
            chosen.push(pool.remove(winner_idx));
        }
        chosen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::RepairRandomGenerator;
    use crate::stmt::StatementTable;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn pop(fitnesses: &[f64]) -> Vec<Candidate> {
        let root = Arc::new(PathBuf::from("/tmp/x"));
        let table = Arc::new(StatementTable::default());
        fitnesses
            .iter()
            .map(|f| {
                let c = Candidate::initial(root.clone(), table.clone());
                c.set_fitness(*f);
                c
            })
            .collect()
    }

    #[test]
    fn random_selection_returns_whole_population_when_smaller_than_count() {
        let population = pop(&[0.1, 0.2]);
        let mut rng = RepairRandomGenerator::new(1);
        let selected = RandomSelection.select(&population, 5, &mut rng);
        assert_eq!(selected.len(), 2);
    }

    #[test]
    fn tournament_selection_never_returns_duplicates_from_one_pass() {
        let population = pop(&[0.1, 0.9, 0.5, 0.3]);
        let mut rng = RepairRandomGenerator::new(2);
        let selected = TournamentSelection { tournament_size: 2 }.select(&population, 4, &mut rng);
        assert_eq!(selected.len(), 4);
    }
}

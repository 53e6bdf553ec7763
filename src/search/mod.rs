//! Search strategies (C7/C8): how a population of candidates turns into
//! the next population to evaluate.

pub mod adaptive;
pub mod evolutionary;
pub mod exhaustive;

pub use adaptive::{AdaptiveEnumerator, EquivalenceRule};
pub use evolutionary::EvolutionaryStrategy;
pub use exhaustive::ExhaustiveStrategy;

use crate::candidate::Candidate;
use crate::random::RandomGenerator;

/// Produces the next generation's population from the current one. Never
/// evaluates fitness itself — that's the fitness engine's job (C5); a
/// strategy only decides which candidates to try next.
///
/// `initial` is the driver's original, unmutated candidate — the one every
/// repair run starts from. Strategies that need a canonical fallback when
/// a whole population dies off (every member's fitness drops to 0) fall
/// back to `initial`, not an arbitrary surviving population member.
pub trait SearchStrategy {
    fn search(
        &mut self,
        population: Vec<Candidate>,
        initial: &Candidate,
        rng: &mut dyn RandomGenerator,
    ) -> Vec<Candidate>;
}

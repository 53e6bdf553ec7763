//! Exhaustive search (C7, spec §4.8, used by the Kali and MutRepair repair
//! presets): no selection, no crossover, no feedback from fitness — just
//! the full Cartesian product of every positively-weighted suggestion with
//! every operator kind, each appended as a single-op clone of the
//! snapshotted population.

use crate::candidate::Candidate;
use crate::localization::WeightedSid;
use crate::operators::{BuildContext, Op, OpKind};
use crate::random::RandomGenerator;
use crate::stmt::StatementTable;
use crate::templates::CardumenEngine;

use super::SearchStrategy;

pub struct ExhaustiveStrategy<'a> {
    pub operator_kinds: &'a [OpKind],
    pub suggestions: &'a [WeightedSid],
    pub universe: &'a [u32],
    pub names: &'a [String],
    pub statements: &'a StatementTable,
    pub cardumen: Option<&'a CardumenEngine>,
}

impl<'a> SearchStrategy for ExhaustiveStrategy<'a> {
    fn search(
        &mut self,
        population: Vec<Candidate>,
        _initial: &Candidate,
        rng: &mut dyn RandomGenerator,
    ) -> Vec<Candidate> {
        let ctx = BuildContext {
            universe: self.universe,
            names: self.names,
            statements: self.statements,
            cardumen: self.cardumen,
        };
        let snapshot = population.clone();
        let mut next = population;
        for candidate in &snapshot {
            for suggestion in self.suggestions.iter().filter(|s| s.weight > 0.0) {
                for kind in self.operator_kinds {
                    let op = Op::build(*kind, suggestion.sid, &ctx, rng);
                    next.push(candidate.with_op(op));
                }
            }
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::RepairRandomGenerator;
    use crate::stmt::StatementTable;
    use std::path::PathBuf;
    use std::sync::Arc;

    #[test]
    fn produces_one_single_op_clone_per_operator_times_suggestion() {
        let root = Arc::new(PathBuf::from("/tmp/x"));
        let table = Arc::new(StatementTable::default());
        let initial = Candidate::initial(root, table);
        let kinds = [OpKind::Delete, OpKind::ModifyIfToTrue];
        let suggestions = vec![
            WeightedSid { sid: 0, weight: 1.0 },
            WeightedSid { sid: 1, weight: 0.5 },
        ];
        let universe = [0u32, 1];
        let names: Vec<String> = Vec::new();
        let statements = StatementTable::default();
        let mut strategy = ExhaustiveStrategy {
            operator_kinds: &kinds,
            suggestions: &suggestions,
            universe: &universe,
            names: &names,
            statements: &statements,
            cardumen: None,
        };
        let mut rng = RepairRandomGenerator::new(9);
        let seed = initial.clone();
        let next = strategy.search(vec![initial], &seed, &mut rng);
        // 1 original + 2 suggestions * 2 kinds = 5
        assert_eq!(next.len(), 5);
    }
}

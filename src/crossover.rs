//! Crossover operators (C6).

use crate::candidate::Candidate;
use crate::random::RandomGenerator;

pub trait Crossover {
    /// Recombines two parents into two offspring, or `None` if this pair
    /// can't meaningfully be crossed (e.g. both empty).
    fn crossover(
        &self,
        parent_x: &Candidate,
        parent_y: &Candidate,
        rng: &mut dyn RandomGenerator,
    ) -> Option<(Candidate, Candidate)>;
}

/// Cuts each parent's operator list at an independently chosen index
/// (inclusive of the full length, so "no edit" is a possible cut) and
/// recombines the head of one with the tail of the other.
pub struct OnePointCrossover;

impl Crossover for OnePointCrossover {
    fn crossover(
        &self,
        parent_x: &Candidate,
        parent_y: &Candidate,
        rng: &mut dyn RandomGenerator,
    ) -> Option<(Candidate, Candidate)> {
        let index_x = rng.gen_range(0, parent_x.len() + 1);
        let index_y = rng.gen_range(0, parent_y.len() + 1);

        let (ax, bx) = parent_x.ops().split_at(index_x);
        let (ay, by) = parent_y.ops().split_at(index_y);

        let mut child_x_ops = ax.to_vec();
        child_x_ops.extend_from_slice(by);
        let mut child_y_ops = ay.to_vec();
        child_y_ops.extend_from_slice(bx);

        Some((parent_x.offspring(child_x_ops, true), parent_y.offspring(child_y_ops, true)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operators::Op;
    use crate::random::TestDummyRng;
    use crate::stmt::StatementTable;
    use std::path::PathBuf;
    use std::sync::Arc;

    #[test]
    fn one_point_crossover_recombines_heads_and_tails() {
        let root = Arc::new(PathBuf::from("/tmp/x"));
        let table = Arc::new(StatementTable::default());
        let px = Candidate::initial(root.clone(), table.clone())
            .with_op(Op::Delete { target: 0 })
            .with_op(Op::Delete { target: 1 });
        let py = Candidate::initial(root, table)
            .with_op(Op::Delete { target: 2 })
            .with_op(Op::Delete { target: 3 });

        // deterministic cuts: index_x = 1, index_y = 1
        let mut rng = TestDummyRng::new(vec![0.4]);
        let (cx, cy) = OnePointCrossover.crossover(&px, &py, &mut rng).unwrap();

        assert_eq!(cx.ops(), &[Op::Delete { target: 0 }, Op::Delete { target: 3 }]);
        assert_eq!(cy.ops(), &[Op::Delete { target: 2 }, Op::Delete { target: 1 }]);
    }
}

//! Delta-debugging-style minimization (C9): shrinks a successful
//! candidate's operator list to a smaller one that still succeeds, by
//! repeatedly trying to remove chunks of operators and keeping the
//! removal only if fitness doesn't drop.

use crate::candidate::Candidate;
use crate::fitness::Engine;

pub trait Minimizer {
    fn minimize(&self, candidate: &Candidate, engine: &dyn Engine) -> Candidate;
}

/// Returns the candidate unchanged.
pub struct NoopMinimizer;

impl Minimizer for NoopMinimizer {
    fn minimize(&self, candidate: &Candidate, _engine: &dyn Engine) -> Candidate {
        candidate.clone()
    }
}

/// `ddmin`-style granularity-doubling/halving chunk removal.
///
/// Starts by trying to cut the operator list in half; each time a cut
/// doesn't lose fitness, it's kept and granularity resets to halving the
/// new (smaller) list again; each time a cut does lose fitness,
/// granularity increases (fewer, smaller chunks are tried) until it
/// reaches one-operator-at-a-time, at which point the list can't be
/// shrunk any further without losing the repair.
pub struct DeltaDebugMinimizer;

impl Minimizer for DeltaDebugMinimizer {
    fn minimize(&self, candidate: &Candidate, engine: &dyn Engine) -> Candidate {
        let mut current = candidate.clone();
        if current.is_empty() {
            return current;
        }
        let mut chunk_count = 2usize;
        loop {
            let ops = current.ops().to_vec();
            let len = ops.len();
            if len == 0 {
                break;
            }
            let chunk_size = (len + chunk_count - 1) / chunk_count;
            if chunk_size == 0 {
                break;
            }
            let mut shrank = false;
            let mut start = 0;
            while start < len {
                let end = (start + chunk_size).min(len);
                let mut reduced = ops[..start].to_vec();
                reduced.extend_from_slice(&ops[end..]);
                if reduced.len() == ops.len() {
                    start = end;
                    continue;
                }
                let candidate_reduced = current.offspring(reduced, false);
                engine.evaluate(std::slice::from_ref(&candidate_reduced)).ok();
                if candidate_reduced.fitness() >= current.fitness() {
                    current = candidate_reduced;
                    shrank = true;
                    chunk_count = 2.max(chunk_count.saturating_sub(1));
                    break;
                }
                start = end;
            }
            if !shrank {
                if chunk_count >= current.len().max(1) {
                    break;
                }
                chunk_count = (chunk_count * 2).min(current.len().max(1));
            }
            if current.len() <= 1 {
                break;
            }
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::Candidate;
    use crate::error::Result;
    use crate::operators::Op;
    use crate::stmt::StatementTable;
    use std::path::PathBuf;
    use std::sync::Arc;

    /// Scores every candidate by how many ops it does NOT have relative to
    /// a target "irrelevant" set; used to check minimization converges on
    /// removing those ops while keeping the rest.
    struct KeepOnlyTargetEngine {
        keep: Op,
    }

    impl Engine for KeepOnlyTargetEngine {
        fn evaluate(&self, candidates: &[Candidate]) -> Result<()> {
            for c in candidates {
                let score = if c.ops().contains(&self.keep) { 1.0 } else { 0.0 };
                c.set_fitness(score);
            }
            Ok(())
        }
    }

    #[test]
    fn minimizer_drops_irrelevant_operators_but_keeps_the_fix() {
        let root = Arc::new(PathBuf::from("/tmp/x"));
        let table = Arc::new(StatementTable::default());
        let keep = Op::Delete { target: 7 };
        let candidate = Candidate::initial(root, table)
            .with_op(Op::Delete { target: 1 })
            .with_op(Op::Delete { target: 2 })
            .with_op(keep.clone())
            .with_op(Op::Delete { target: 3 });
        candidate.set_fitness(1.0);

        let engine = KeepOnlyTargetEngine { keep: keep.clone() };
        let minimized = DeltaDebugMinimizer.minimize(&candidate, &engine);
        assert!(minimized.ops().contains(&keep));
        assert!(minimized.len() <= candidate.len());
    }
}

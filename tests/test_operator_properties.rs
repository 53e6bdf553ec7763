use std::io::Write;

use proptest::prelude::*;
use repairkit::apply::Applier;
use repairkit::lang::mini::MiniParser;
use repairkit::operators::Op;
use repairkit::stmt::StatementIndex;

fn index_for(program: &str) -> StatementIndex {
    let mut f = tempfile::Builder::new().suffix(".mini").tempfile().unwrap();
    f.write_all(program.as_bytes()).unwrap();
    StatementIndex::index(f.path(), &MiniParser, &[], false).unwrap()
}

proptest! {
    /// Applying the same operator list twice must produce byte-identical
    /// overlays: the applier is a pure function of (table, ops).
    #[test]
    fn applying_ops_is_deterministic(targets in prop::collection::vec(0u32..4, 0..6)) {
        let idx = index_for("a = 1\nb = 2\nc = 3\nd = 4\n");
        let ops: Vec<Op> = targets.iter().map(|t| Op::Delete { target: *t }).collect();
        let first = Applier::apply(&idx.statements, &ops);
        let second = Applier::apply(&idx.statements, &ops);
        prop_assert_eq!(first.len(), second.len());
        for (sid, value) in &first {
            prop_assert_eq!(second.get(sid), Some(value));
        }
    }

    /// Deleting the same statement any number of times leaves it deleted
    /// exactly once in the overlay: repeating a Delete is idempotent.
    #[test]
    fn repeated_delete_is_idempotent(target in 0u32..4, repeats in 1usize..5) {
        let idx = index_for("a = 1\nb = 2\nc = 3\nd = 4\n");
        let ops: Vec<Op> = std::iter::repeat(Op::Delete { target }).take(repeats).collect();
        let overlay = Applier::apply(&idx.statements, &ops);
        prop_assert_eq!(overlay.get(&target), Some(&None));
        prop_assert_eq!(overlay.len(), 1);
    }

    /// A trailing Replace always wins over anything earlier that touched
    /// the same target, since every write goes into the same overlay
    /// slot and later writes overwrite earlier ones. When the replace
    /// source is the target itself, it reads back the delete it's
    /// replacing and the statement stays deleted.
    #[test]
    fn last_write_to_a_target_wins(target in 0u32..4, other in 0u32..4) {
        let idx = index_for("a = 1\nb = 2\nc = 3\nd = 4\n");
        let ops = vec![Op::Delete { target }, Op::Replace { target, source: other }];
        let overlay = Applier::apply(&idx.statements, &ops);
        let expected = if other == target { None } else { idx.statements.get(other).cloned() };
        prop_assert_eq!(overlay.get(&target).unwrap().clone(), expected);
    }
}

//! Adaptive/AE search (C8): an explicit, resumable enumerator over
//! operator-tuples of bounded depth, equivalence-pruned so that
//! semantically redundant tuples are never handed to the (expensive)
//! streaming test evaluation.
//!
//! This expresses the original generator-of-generators odometer (which
//! relied on Python coroutine semantics) as a plain iterator with
//! explicit, inspectable state, per the crate's "no hidden suspended
//! control flow" design note.

use std::collections::{HashMap, HashSet};

use crate::localization::WeightedSid;
use crate::operators::{Op, OpKind, AE_KINDS};
use crate::oracle::TestId;
use crate::random::RandomGenerator;
use crate::stmt::Sid;

/// A predicate used to decide whether two candidate operator sequences
/// are equivalent enough that only one needs to be tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EquivalenceRule {
    /// Two sequences are equivalent iff they contain exactly the same
    /// operators (as a set, ignoring order).
    Identity,
    /// If the same target is touched more than once, only the last write
    /// to it matters (earlier ones are dead code once overwritten), so
    /// sequences that differ only in their now-overwritten earlier writes
    /// to a target are equivalent.
    DeadCode,
    /// Two operators whose `touches()` sets are disjoint commute: trying
    /// them in either order explores the same edit, so sequences that are
    /// permutations of each other under that commutation rule collapse to
    /// one canonical ordering.
    Order,
}

impl EquivalenceRule {
    fn canonicalize(self, ops: &[Op]) -> Vec<Op> {
        match self {
            EquivalenceRule::Identity => {
                let mut v = ops.to_vec();
                v.sort_by_key(debug_key);
                v
            }
            EquivalenceRule::Order => {
                let mut v = ops.to_vec();
                v.sort_by_key(debug_key);
                v
            }
            EquivalenceRule::DeadCode => dedup_by_last_write(ops),
        }
    }
}

fn debug_key(op: &Op) -> String {
    format!("{op:?}")
}

fn dedup_by_last_write(ops: &[Op]) -> Vec<Op> {
    let mut last_index_for_target: HashMap<Sid, usize> = HashMap::new();
    for (i, op) in ops.iter().enumerate() {
        if let Some(&target) = op.touches().first() {
            last_index_for_target.insert(target, i);
        }
    }
    ops.iter()
        .enumerate()
        .filter(|(i, op)| op.touches().first().map(|t| last_index_for_target[t] == *i).unwrap_or(true))
        .map(|(_, op)| op.clone())
        .collect()
}

/// Canonicalizes an operator sequence under every active rule, in order,
/// producing the key used to dedup the search space.
pub fn canonical_key(ops: &[Op], rules: &[EquivalenceRule]) -> Vec<Op> {
    let mut current = ops.to_vec();
    for rule in rules {
        current = rule.canonicalize(&current);
    }
    current
}

/// Depth-bounded odometer over `(operator kind, suggestion)` tuples.
///
/// Advances by incrementing the rightmost position; when a position wraps
/// around back to zero, the carry increments the position to its left
/// (standard mixed-radix counting). Depths are visited in increasing
/// order, `1..=max_depth`, so shallow repairs are always tried before
/// deeper ones.
pub struct AdaptiveEnumerator {
    suggestions: Vec<WeightedSid>,
    universe: Vec<Sid>,
    kinds: Vec<OpKind>,
    max_depth: usize,
    depth: usize,
    counters: Vec<usize>,
    exhausted: bool,
    seen: HashSet<Vec<Op>>,
    rules: Vec<EquivalenceRule>,
}

impl AdaptiveEnumerator {
    pub fn new(suggestions: Vec<WeightedSid>, universe: Vec<Sid>, max_depth: usize) -> Self {
        // Suggestions are consulted in reverse priority order as depth
        // grows, widening the search outward from the most-suspicious
        // statement only after shallower depths are exhausted.
        let mut suggestions = suggestions;
        suggestions.sort_by(|a, b| a.weight.partial_cmp(&b.weight).unwrap());
        AdaptiveEnumerator {
            suggestions,
            universe,
            kinds: AE_KINDS.to_vec(),
            max_depth: max_depth.max(1),
            depth: 1,
            counters: vec![0],
            exhausted: false,
            seen: HashSet::new(),
            rules: vec![EquivalenceRule::DeadCode, EquivalenceRule::Order],
        }
    }

    /// `suggestions * kinds * universe` — the third factor is the
    /// systematic "for every other sid j in the reverse universe" dimension
    /// (spec §4.8) that `InsertBefore`/`InsertAfter` need a source for.
    /// `Delete` ignores it, so several digits collapse onto the same
    /// candidate; the `seen` set absorbs the resulting duplicates.
    fn radix(&self) -> usize {
        self.suggestions.len() * self.kinds.len() * self.universe.len().max(1)
    }

    fn digit_to_choice(&self, digit: usize) -> (Sid, OpKind, usize) {
        let suggestion = &self.suggestions[digit % self.suggestions.len()];
        let rest = digit / self.suggestions.len();
        let kind = self.kinds[rest % self.kinds.len()];
        let source_idx = rest / self.kinds.len();
        (suggestion.sid, kind, source_idx)
    }

    /// Every sid other than `target`, in reverse universe order — the
    /// enumeration `InsertBefore`/`InsertAfter` walk deterministically
    /// instead of drawing a random source.
    fn reverse_others(&self, target: Sid) -> Vec<Sid> {
        self.universe.iter().copied().rev().filter(|&s| s != target).collect()
    }

    fn advance(&mut self) {
        for i in (0..self.counters.len()).rev() {
            self.counters[i] += 1;
            if self.counters[i] < self.radix() {
                return;
            }
            self.counters[i] = 0;
        }
        // every position carried out: this depth is exhausted
        self.depth += 1;
        if self.depth > self.max_depth {
            self.exhausted = true;
        } else {
            self.counters = vec![0; self.depth];
        }
    }

    /// Builds this tuple's operators by direct construction, not
    /// `Op::build`'s RNG-based `pick_other`: AE's enumeration must visit
    /// every `(suggestion, kind, source)` combination systematically, so
    /// the source sid comes from `reverse_others`, not a random draw.
    fn build_candidate(&self) -> Vec<Op> {
        self.counters
            .iter()
            .map(|&digit| {
                let (sid, kind, source_idx) = self.digit_to_choice(digit);
                match kind {
                    OpKind::Delete => Op::Delete { target: sid },
                    OpKind::InsertBefore => {
                        let others = self.reverse_others(sid);
                        let source = if others.is_empty() { sid } else { others[source_idx % others.len()] };
                        Op::InsertBefore { target: sid, source }
                    }
                    OpKind::InsertAfter => {
                        let others = self.reverse_others(sid);
                        let source = if others.is_empty() { sid } else { others[source_idx % others.len()] };
                        Op::InsertAfter { target: sid, source }
                    }
                    other => unreachable!("AE_KINDS never contains {other:?}"),
                }
            })
            .collect()
    }
}

impl AdaptiveEnumerator {
    /// Returns the next not-yet-seen operator tuple, or `None` once every
    /// depth up to `max_depth` has been exhausted. `rng` is accepted for
    /// symmetry with the rest of the search layer even though this
    /// enumerator's own choices are fully deterministic; it is not
    /// currently consulted.
    pub fn next_candidate(&mut self, _rng: &mut dyn RandomGenerator) -> Option<Vec<Op>> {
        if self.suggestions.is_empty() || self.radix() == 0 {
            return None;
        }
        while !self.exhausted {
            let candidate = self.build_candidate();
            let key = canonical_key(&candidate, &self.rules);
            self.advance();
            if self.seen.insert(key) {
                return Some(candidate);
            }
        }
        None
    }
}

/// Orders `tests` by descending prior-failure count, so the streaming
/// evaluator is most likely to hit a failure (and can bail out) as early
/// as possible.
pub fn order_tests_by_failure_count(tests: &[TestId], fail_counts: &HashMap<TestId, usize>) -> Vec<TestId> {
    let mut ordered = tests.to_vec();
    ordered.sort_by_key(|t| std::cmp::Reverse(fail_counts.get(t).copied().unwrap_or(0)));
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::RepairRandomGenerator;

    #[test]
    fn enumerator_never_repeats_an_equivalent_candidate() {
        let suggestions = vec![WeightedSid { sid: 0, weight: 1.0 }, WeightedSid { sid: 1, weight: 0.5 }];
        let universe = vec![0, 1, 2];
        let mut enumerator = AdaptiveEnumerator::new(suggestions, universe, 2);
        let mut rng = RepairRandomGenerator::new(11);
        let mut seen = HashSet::new();
        let mut count = 0;
        while let Some(candidate) = enumerator.next_candidate(&mut rng) {
            let key = canonical_key(&candidate, &[EquivalenceRule::Order]);
            assert!(seen.insert(key), "produced an equivalent candidate twice");
            count += 1;
            if count > 500 {
                break;
            }
        }
        assert!(count > 0);
    }

    #[test]
    fn order_tests_prioritizes_more_frequently_failing_tests() {
        let tests = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let mut counts = HashMap::new();
        counts.insert("b".to_string(), 5usize);
        counts.insert("c".to_string(), 1usize);
        let ordered = order_tests_by_failure_count(&tests, &counts);
        assert_eq!(ordered[0], "b");
    }
}

//! Pluggable random source.
//!
//! Every stochastic decision in the engine — which suggestion to draw,
//! which operator kind to pick, whether to mutate a given candidate, which
//! crossover cut point to use — goes through a single [`RandomGenerator`]
//! trait object so a whole repair run can be replayed bit-for-bit from a
//! seed. The fitness engine itself never touches this: candidate
//! evaluation is a pure function of the candidate's operator list.

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

/// Abstraction over a source of randomness, threaded through construction,
/// selection, crossover, and mutation.
pub trait RandomGenerator {
    /// Returns a uniform `f64` in `[0, 1)`.
    fn gen_float(&mut self) -> f64;

    /// Returns a uniform integer in `[low, high)`. Panics if `low >= high`.
    fn gen_range(&mut self, low: usize, high: usize) -> usize;

    /// Returns `true` with probability `p` (`p` clamped to `[0, 1]`).
    fn gen_bool(&mut self, p: f64) -> bool {
        self.gen_float() < p.clamp(0.0, 1.0)
    }

    /// Picks a uniformly random element from a non-empty slice.
    fn choose<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        assert!(!items.is_empty(), "choose called on an empty slice");
        let idx = self.gen_range(0, items.len());
        &items[idx]
    }

    /// Picks an element from a non-empty slice weighted by `weight`
    /// (negative weights are clamped to 0). Falls back to a uniform draw
    /// if every candidate scores zero, same as [`crate::templates::ProbabilisticModel::select`].
    fn choose_weighted<'a, T>(&mut self, items: &'a [T], weight: impl Fn(&T) -> f64) -> &'a T {
        assert!(!items.is_empty(), "choose_weighted called on an empty slice");
        let total: f64 = items.iter().map(|item| weight(item).max(0.0)).sum();
        if total <= 0.0 {
            return self.choose(items);
        }
        let mut target = self.gen_float() * total;
        for item in items {
            target -= weight(item).max(0.0);
            if target <= 0.0 {
                return item;
            }
        }
        items.last().unwrap()
    }

    /// Shuffles a slice in place (Fisher-Yates).
    fn shuffle<T>(&mut self, items: &mut [T]) {
        if items.len() < 2 {
            return;
        }
        for i in (1..items.len()).rev() {
            let j = self.gen_range(0, i + 1);
            items.swap(i, j);
        }
    }

    /// Samples `k` distinct indices from `0..len` without replacement.
    /// `k` is clamped to `len`.
    fn sample_indices(&mut self, len: usize, k: usize) -> Vec<usize> {
        let k = k.min(len);
        let mut pool: Vec<usize> = (0..len).collect();
        self.shuffle(&mut pool);
        pool.truncate(k);
        pool
    }
}

/// Default, seedable [`RandomGenerator`] backed by `rand`'s `StdRng`.
#[derive(Debug)]
pub struct RepairRandomGenerator {
    rng: StdRng,
}

impl RepairRandomGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl RandomGenerator for RepairRandomGenerator {
    fn gen_float(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    fn gen_range(&mut self, low: usize, high: usize) -> usize {
        assert!(low < high, "gen_range requires low < high (got {low}, {high})");
        self.rng.gen_range(low..high)
    }
}

/// A generator that always returns the minimal value: `0.0` for floats,
/// `low` for ranges, never mutates, never shuffles. Useful for driving a
/// strategy's deterministic edges in tests.
#[derive(Debug, Default)]
pub struct NoopRandomGenerator;

impl RandomGenerator for NoopRandomGenerator {
    fn gen_float(&mut self) -> f64 {
        0.0
    }

    fn gen_range(&mut self, low: usize, _high: usize) -> usize {
        low
    }

    fn gen_bool(&mut self, _p: f64) -> bool {
        false
    }
}

/// Scripted generator for tests: replays a fixed queue of floats (looping
/// once exhausted) and otherwise behaves like [`RepairRandomGenerator`]
/// for ranges via simple modular arithmetic.
#[derive(Debug)]
pub struct TestDummyRng {
    floats: Vec<f64>,
    cursor: usize,
}

impl TestDummyRng {
    pub fn new(floats: Vec<f64>) -> Self {
        assert!(!floats.is_empty(), "TestDummyRng needs at least one scripted value");
        Self { floats, cursor: 0 }
    }
}

impl RandomGenerator for TestDummyRng {
    fn gen_float(&mut self) -> f64 {
        let value = self.floats[self.cursor % self.floats.len()];
        self.cursor += 1;
        value
    }

    fn gen_range(&mut self, low: usize, high: usize) -> usize {
        assert!(low < high);
        let span = high - low;
        let f = self.gen_float().clamp(0.0, 0.999_999_999);
        low + (f * span as f64) as usize
    }
}

/// Re-exported so call sites that only need *some* seeded source without
/// caring which can take `Box<dyn RngCore>` without pulling in `rand`
/// directly.
pub fn boxed_rng_core(seed: u64) -> Box<dyn RngCore> {
    Box::new(StdRng::seed_from_u64(seed))
}

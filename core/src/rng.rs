//! Deterministic random number generation.
//!
//! RULE: Nothing in the engine may call any platform RNG.
//! Down-sampling flows through a SampleRng seeded from the
//! configured sampling seed, so the same input and seed always
//! keep the same rows.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

/// A named, deterministic RNG for one sampling pass.
pub struct SampleRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl SampleRng {
    /// Create a sampling RNG from the configured seed and a stable
    /// stream index. The index must never change once assigned.
    pub fn new(seed: u64, stream: u64) -> Self {
        let derived_seed = seed ^ (stream.wrapping_mul(0x9e37_79b9_7f4a_7c15));
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    /// Choose `k` distinct indices out of `0..n` and return them in
    /// ascending order. When `k >= n` every index is returned.
    pub fn sample_indices(&mut self, n: usize, k: usize) -> Vec<usize> {
        if k >= n {
            return (0..n).collect();
        }
        // Partial Fisher-Yates: only the first k slots are shuffled.
        let mut pool: Vec<usize> = (0..n).collect();
        for i in 0..k {
            let j = i + self.next_u64_below((n - i) as u64) as usize;
            pool.swap(i, j);
        }
        let mut chosen = pool[..k].to_vec();
        chosen.sort_unstable();
        chosen
    }
}

/// Stable stream assignments.
/// NEVER reorder or remove entries, only append.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum SampleStream {
    ProgramPivot = 0,
}

impl SampleStream {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ProgramPivot => "program_pivot",
        }
    }

    pub fn rng(self, seed: u64) -> SampleRng {
        SampleRng::new(seed, self as u64).with_name(self.name())
    }
}

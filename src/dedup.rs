// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Stable Dedup Filter
 * Probabilistic seen-set with bounded false positives under continuous insertion
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use rand::Rng;
use std::hash::{BuildHasher, RandomState};

/// Default capacity sized for a long-running enumeration.
const DEFAULT_CELLS: usize = 100_000;

/// Default bound on the false-positive rate.
const DEFAULT_FP_RATE: f64 = 0.01;

/// A stable bloom filter: a classical bloom filter saturates under unbounded
/// insertion, so each operation also decays a few cells, trading a bounded
/// false-negative rate for a false-positive rate that stays near the target
/// no matter how long the engine runs.
pub struct StableBloomFilter {
    cells: Vec<u8>,
    k: usize,
    /// Cells decayed per operation.
    p: usize,
    max: u8,
    hash_a: RandomState,
    hash_b: RandomState,
}

impl StableBloomFilter {
    /// Filter over `cells` 1-bit cells targeting the given false-positive
    /// rate.
    pub fn new(cells: usize, fp_rate: f64) -> Self {
        let cells = cells.max(1);
        let k = optimal_k(fp_rate).min(cells);
        let p = optimal_p(cells, k, 1, fp_rate);
        Self {
            cells: vec![0; cells],
            k,
            p,
            max: 1,
            hash_a: RandomState::new(),
            hash_b: RandomState::new(),
        }
    }

    /// Whether the item is (probably) in the set.
    pub fn test(&self, data: &[u8]) -> bool {
        let (h1, h2) = self.hashes(data);
        (0..self.k).all(|i| self.cells[self.index(h1, h2, i)] > 0)
    }

    /// Insert the item, decaying `p` cells first to keep the filter stable.
    pub fn add(&mut self, data: &[u8]) {
        self.decay();
        let (h1, h2) = self.hashes(data);
        for i in 0..self.k {
            let idx = self.index(h1, h2, i);
            self.cells[idx] = self.max;
        }
    }

    /// Atomic membership test plus insert; returns whether the item was
    /// already present.
    pub fn test_and_add(&mut self, data: &[u8]) -> bool {
        let member = self.test(data);
        self.add(data);
        member
    }

    /// Clear every cell.
    pub fn reset(&mut self) {
        self.cells.fill(0);
    }

    fn decay(&mut self) {
        let start = rand::rng().random_range(0..self.cells.len());
        for i in 0..self.p {
            let idx = (start + i) % self.cells.len();
            if self.cells[idx] > 0 {
                self.cells[idx] -= 1;
            }
        }
    }

    fn hashes(&self, data: &[u8]) -> (u64, u64) {
        (self.hash_a.hash_one(data), self.hash_b.hash_one(data))
    }

    fn index(&self, h1: u64, h2: u64, i: usize) -> usize {
        let combined = h1.wrapping_add((i as u64).wrapping_mul(h2 | 1));
        (combined % self.cells.len() as u64) as usize
    }
}

impl Default for StableBloomFilter {
    fn default() -> Self {
        Self::new(DEFAULT_CELLS, DEFAULT_FP_RATE)
    }
}

fn optimal_k(fp_rate: f64) -> usize {
    let k = (1.0 / fp_rate).log2().ceil();
    (k as usize).max(1)
}

/// Decay count that keeps the expected fraction of set cells at the stable
/// point matching the target false-positive rate.
fn optimal_p(cells: usize, k: usize, d: u32, fp_rate: f64) -> usize {
    let max = (2f64).powi(d as i32) - 1.0;
    let sub_denom = (1.0 - fp_rate.powf(1.0 / k as f64)).powf(1.0 / max);
    let denom = (1.0 / sub_denom - 1.0) * (1.0 / k as f64 - 1.0 / cells as f64);
    let p = 1.0 / denom;
    if p.is_finite() && p >= 1.0 {
        p as usize
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_after_add() {
        let mut filter = StableBloomFilter::default();
        assert!(!filter.test(b"www.example.com"));
        filter.add(b"www.example.com");
        assert!(filter.test(b"www.example.com"));
    }

    #[test]
    fn test_test_and_add_reports_prior_observation() {
        let mut filter = StableBloomFilter::default();
        assert!(!filter.test_and_add(b"api.example.com"));
        assert!(filter.test_and_add(b"api.example.com"));
        assert!(filter.test_and_add(b"api.example.com"));
    }

    #[test]
    fn test_reset_clears_members() {
        let mut filter = StableBloomFilter::default();
        filter.add(b"10.0.0.1");
        filter.reset();
        assert!(!filter.test(b"10.0.0.1"));
    }

    #[test]
    fn test_false_positives_stay_bounded_under_load() {
        let mut filter = StableBloomFilter::default();
        for i in 0..50_000u32 {
            filter.add(format!("host-{}.example.com", i).as_bytes());
        }
        // A handful of never-inserted keys cannot all collide unless the
        // filter has saturated.
        let phantom = (0..10).filter(|i| filter.test(format!("absent-{}.example.org", i).as_bytes()));
        assert!(phantom.count() < 10);
    }

    #[test]
    fn test_parameters_positive() {
        let filter = StableBloomFilter::new(100_000, 0.01);
        assert!(filter.k >= 1);
        assert!(filter.p >= 1);
    }
}

//! Bimodal Branch Predictor.
//!
//! A table of 2-bit saturating counters indexed by PC bits. Each static
//! branch trains its own counter; there is no correlation between
//! branches, which makes the predictor cheap and resistant to aliasing at
//! the cost of missing history-dependent patterns.

use super::DirectionPredictor;
use super::predictor::{WEAKLY_NOT_TAKEN, counter_taken, train_counter};

/// Bimodal predictor state.
pub struct Bimodal {
    /// 2-bit saturating counters, one per table entry.
    table: Vec<u8>,
}

impl Bimodal {
    /// Creates a bimodal predictor with `entries` counters.
    ///
    /// `entries` must be a power of two (validated by the configuration).
    pub fn new(entries: usize) -> Self {
        Self {
            table: vec![WEAKLY_NOT_TAKEN; entries],
        }
    }

    /// Index: word-aligned PC bits masked to the table size.
    fn index(&self, pc: u64) -> usize {
        ((pc >> 2) as usize) & (self.table.len() - 1)
    }
}

impl DirectionPredictor for Bimodal {
    fn predict(&self, pc: u64, _history: u64) -> bool {
        counter_taken(self.table[self.index(pc)])
    }

    fn update(&mut self, pc: u64, _history: u64, taken: bool) {
        let idx = self.index(pc);
        train_counter(&mut self.table[idx], taken);
    }
}

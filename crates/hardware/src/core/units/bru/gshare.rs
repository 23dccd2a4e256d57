//! GShare Branch Predictor.
//!
//! GShare correlates global branch history with the program counter using
//! an XOR hash into a table of 2-bit saturating counters. The same static
//! branch can therefore be predicted differently in different execution
//! contexts. The history register itself lives in the engine: it is
//! updated speculatively at predict time and restored from the branch's
//! snapshot on misprediction, so the predictor receives the history it
//! predicted with when it is trained.

use super::DirectionPredictor;
use super::predictor::{WEAKLY_NOT_TAKEN, counter_taken, train_counter};

/// GShare predictor state.
pub struct Gshare {
    /// Pattern history table of 2-bit saturating counters.
    table: Vec<u8>,
}

impl Gshare {
    /// Creates a gshare predictor with `entries` counters.
    ///
    /// `entries` must be a power of two (validated by the configuration).
    pub fn new(entries: usize) -> Self {
        Self {
            table: vec![WEAKLY_NOT_TAKEN; entries],
        }
    }

    /// Index: word-aligned PC bits XOR global history, masked to the table.
    fn index(&self, pc: u64, history: u64) -> usize {
        (((pc >> 2) ^ history) as usize) & (self.table.len() - 1)
    }
}

impl DirectionPredictor for Gshare {
    fn predict(&self, pc: u64, history: u64) -> bool {
        counter_taken(self.table[self.index(pc, history)])
    }

    fn update(&mut self, pc: u64, history: u64, taken: bool) {
        let idx = self.index(pc, history);
        train_counter(&mut self.table[idx], taken);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_disambiguates() {
        let mut bp = Gshare::new(16);
        let pc = 0x40_0000;
        // Same branch, two different histories: train opposite outcomes.
        bp.update(pc, 0b0101, true);
        bp.update(pc, 0b1010, false);
        assert!(bp.predict(pc, 0b0101));
        assert!(!bp.predict(pc, 0b1010));
    }

    #[test]
    fn test_trains_toward_saturation() {
        let mut bp = Gshare::new(16);
        for _ in 0..4 {
            bp.update(0x40_0008, 0xF, true);
        }
        assert!(bp.predict(0x40_0008, 0xF));
    }

    #[test]
    fn test_update_uses_predict_time_history() {
        let mut bp = Gshare::new(16);
        // Training with history A must not disturb the entry for history B
        // unless the XOR indices collide.
        bp.update(0x40_0000, 0x1, true);
        bp.update(0x40_0000, 0x1, true);
        assert!(!bp.predict(0x40_0000, 0x2));
    }
}

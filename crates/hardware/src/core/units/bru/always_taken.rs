//! Always-Taken Branch Predictor.
//!
//! Predicts every conditional branch taken. No state, no training; the
//! variant exists as the baseline against which the table predictors are
//! measured, and it exercises the misprediction recovery path on every
//! not-taken branch.

use super::DirectionPredictor;

/// The always-taken predictor.
pub struct AlwaysTaken;

impl DirectionPredictor for AlwaysTaken {
    fn predict(&self, _pc: u64, _history: u64) -> bool {
        true
    }

    fn update(&mut self, _pc: u64, _history: u64, _taken: bool) {}
}

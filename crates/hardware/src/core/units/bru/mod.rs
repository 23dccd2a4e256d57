//! Branch prediction unit implementations.
//!
//! This module contains the direction predictors (always-taken, bimodal,
//! gshare), the shared branch target buffer, and the static-dispatch
//! wrapper that the fetch stage calls into.

pub use self::predictor::DirectionPredictor;

/// Always-taken direction predictor.
pub mod always_taken;

/// Bimodal (per-PC 2-bit counter) direction predictor.
pub mod bimodal;

/// Branch Target Buffer shared across predictor variants.
pub mod btb;

/// Global-history (gshare) direction predictor.
pub mod gshare;

/// Direction predictor trait and saturating-counter helpers.
pub mod predictor;

use self::always_taken::AlwaysTaken;
use self::bimodal::Bimodal;
use self::gshare::Gshare;
use crate::config::{BranchPredictorConfig, PredictorKind};

/// Enum wrapper for static dispatch of direction predictors.
/// This avoids vtable lookups in the per-fetch prediction path.
pub enum PredictorUnit {
    /// Always-taken variant.
    AlwaysTaken(AlwaysTaken),
    /// Bimodal variant.
    Bimodal(Bimodal),
    /// Gshare variant.
    Gshare(Gshare),
}

impl PredictorUnit {
    /// Creates the configured predictor variant.
    pub fn new(config: &BranchPredictorConfig) -> Self {
        match config.kind {
            PredictorKind::AlwaysTaken => Self::AlwaysTaken(AlwaysTaken),
            PredictorKind::Bimodal => Self::Bimodal(Bimodal::new(config.num_entries)),
            PredictorKind::Gshare => Self::Gshare(Gshare::new(config.num_entries)),
        }
    }
}

impl DirectionPredictor for PredictorUnit {
    #[inline]
    fn predict(&self, pc: u64, history: u64) -> bool {
        match self {
            Self::AlwaysTaken(bp) => bp.predict(pc, history),
            Self::Bimodal(bp) => bp.predict(pc, history),
            Self::Gshare(bp) => bp.predict(pc, history),
        }
    }

    #[inline]
    fn update(&mut self, pc: u64, history: u64, taken: bool) {
        match self {
            Self::AlwaysTaken(bp) => bp.update(pc, history, taken),
            Self::Bimodal(bp) => bp.update(pc, history, taken),
            Self::Gshare(bp) => bp.update(pc, history, taken),
        }
    }
}

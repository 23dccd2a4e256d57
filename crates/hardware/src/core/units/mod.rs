//! Execution units and functional components.
//!
//! This module contains the processor's execution resources:
//! operation evaluation, the functional-unit pools, the branch prediction
//! unit, and the cache timing model.

/// Operation evaluation (arithmetic, branches, address generation, faults).
pub mod alu;

/// Branch prediction unit: direction predictors and the shared BTB.
pub mod bru;

/// Set-associative cache timing model.
pub mod cache;

/// Functional-unit pools with per-class latency and occupancy.
pub mod fu;

//! Simulation utilities and program loading.
//!
//! Provides the two-pass assembler that turns MIPS-like source text into a
//! program image, and the `Simulator` that validates configuration, builds
//! the engine, and drives it to completion.

/// Two-pass assembler for the MIPS-like input syntax.
pub mod loader;

/// Top-level simulator.
pub mod simulator;

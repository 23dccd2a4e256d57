//! MIPS-subset superscalar out-of-order simulator library.
//!
//! This crate implements a cycle-accurate simulator for a superscalar,
//! out-of-order core executing a MIPS-style integer/floating-point subset:
//! 1. **Core:** 6-stage pipeline (Fetch, Decode, Issue, Execute, Memory, Commit)
//!    with register renaming, reservation stations, and a reorder buffer.
//! 2. **Memory:** flat byte memory behind split set-associative I/D caches.
//! 3. **Prediction:** always-taken, bimodal, and gshare direction predictors
//!    with a shared branch target buffer.
//! 4. **ISA:** pre-decoded instruction records produced by the assembly loader.
//! 5. **Simulation:** `Simulator` (validate, build, run), loader, configuration,
//!    and statistics reporting.

/// Common types and constants (registers, faults, memory-map constants).
pub mod common;
/// Simulator configuration (defaults, enums, hierarchical config structures).
pub mod config;
/// CPU core: pipeline stages, arenas, and execution units.
pub mod core;
/// Instruction set (opcode table, instruction records, register naming).
pub mod isa;
/// Flat byte-addressed main memory.
pub mod mem;
/// Simulation: `Simulator`, the assembly loader, and program images.
pub mod sim;
/// Simulation statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Umbrella error type for configuration, program, and runtime failures.
pub use crate::common::error::SimError;
/// Two-pass assembler for the MIPS-like input syntax.
pub use crate::sim::loader::assemble;
/// Top-level simulator; owns the pipeline engine and drives it to completion.
pub use crate::sim::simulator::Simulator;
/// Structured results record emitted at halt or cycle limit.
pub use crate::stats::SimReport;

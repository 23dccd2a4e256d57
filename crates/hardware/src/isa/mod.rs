//! Instruction set definitions.
//!
//! This module contains everything the pipeline needs to know about the
//! simulated MIPS-style subset:
//! 1. **ABI:** Register naming and parsing for the conventional 32-register set.
//! 2. **Instructions:** The pre-decoded instruction record, the opcode table,
//!    and functional-unit routing.

/// Register naming conventions and name/index conversion.
pub mod abi;

/// Opcode table and the pre-decoded instruction record.
pub mod instruction;

pub use instruction::{FuClass, Instruction, Opcode};

//! Fault and error definitions.
//!
//! This module defines the error handling surface for the simulator:
//! 1. **Faults:** Runtime conditions attached to an in-flight instruction and
//!    surfaced when it reaches the head of the reorder buffer.
//! 2. **Configuration errors:** Rejected before any simulation object exists.
//! 3. **Program errors:** Rejected by the assembler before simulation.
//! 4. **`SimError`:** The umbrella type returned by the simulator API.

use thiserror::Error;

/// Runtime fault raised by an executing instruction.
///
/// A fault does not interrupt the pipeline where it occurs: the owning
/// reorder-buffer entry is marked as faulted and the condition is reported
/// only when the instruction would otherwise commit, preserving program
/// order in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Fault {
    /// Load address outside the flat memory bounds.
    #[error("load address {addr:#010x} outside memory bounds")]
    LoadOutOfBounds {
        /// The faulting effective address.
        addr: u64,
    },

    /// Store address outside the flat memory bounds.
    #[error("store address {addr:#010x} outside memory bounds")]
    StoreOutOfBounds {
        /// The faulting effective address.
        addr: u64,
    },

    /// Signed integer overflow in `add`, `addi`, or `sub`.
    #[error("arithmetic overflow")]
    Overflow,

    /// Division by zero in `div`.
    #[error("division by zero")]
    DivideByZero,
}

/// Configuration validation failure (§ "configuration-invalid").
///
/// Produced by [`crate::config::Config::validate`] before simulation starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A geometry parameter that must be a power of two is not.
    #[error("{field} must be a power of two (got {value})")]
    NotPowerOfTwo {
        /// Configuration field name.
        field: &'static str,
        /// Offending value.
        value: usize,
    },

    /// A width, capacity, or latency that must be non-zero is zero.
    #[error("{field} must be non-zero")]
    Zero {
        /// Configuration field name.
        field: &'static str,
    },

    /// A parameter exceeds the bound imposed by another parameter.
    #[error("{field} ({value}) exceeds {limit_name} ({limit})")]
    TooLarge {
        /// Configuration field name.
        field: &'static str,
        /// Offending value.
        value: usize,
        /// Name of the bounding parameter.
        limit_name: &'static str,
        /// Value of the bound.
        limit: usize,
    },
}

/// Assembly-program rejection (§ "program-invalid").
///
/// Produced by the loader; no simulation state exists when these occur.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AsmError {
    /// Mnemonic not in the supported opcode table.
    #[error("line {line}: unknown opcode '{op}'")]
    UnknownOpcode {
        /// 1-based source line.
        line: usize,
        /// The unrecognized mnemonic.
        op: String,
    },

    /// Register name not in the architectural register table.
    #[error("line {line}: unknown register '{name}'")]
    UnknownRegister {
        /// 1-based source line.
        line: usize,
        /// The unrecognized register token.
        name: String,
    },

    /// Operand token that cannot be parsed for the opcode's format.
    #[error("line {line}: malformed operand '{text}'")]
    MalformedOperand {
        /// 1-based source line.
        line: usize,
        /// The offending token.
        text: String,
    },

    /// A label used as a target or address was never defined.
    #[error("line {line}: unresolved label '{label}'")]
    UnresolvedLabel {
        /// 1-based source line of the use site.
        line: usize,
        /// The undefined label.
        label: String,
    },

    /// Any other syntax problem (wrong operand count, bad directive, ...).
    #[error("line {line}: {msg}")]
    Syntax {
        /// 1-based source line.
        line: usize,
        /// Description of the problem.
        msg: String,
    },

    /// The assembled data segment does not fit in the configured memory.
    #[error("data segment needs {need} bytes but memory_size is {have}")]
    DataOverflow {
        /// Bytes required by the data image.
        need: usize,
        /// Configured memory size.
        have: usize,
    },
}

/// Top-level simulator error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// Invalid configuration, rejected before simulation.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Invalid program, rejected by the loader.
    #[error("invalid program: {0}")]
    Program(#[from] AsmError),

    /// A runtime fault reached the commit point.
    #[error("fault at pc={pc:#010x} (seq {seq}): {fault}")]
    Fault {
        /// Program counter of the faulting instruction.
        pc: u64,
        /// Program-order sequence number of the faulting instruction.
        seq: u64,
        /// The fault itself.
        fault: Fault,
    },

    /// Internal invariant violation: the pipeline stopped making progress.
    ///
    /// This is an assertion-class failure, not an expected runtime outcome.
    #[error("pipeline stuck at cycle {cycle}: {detail}")]
    Stuck {
        /// Cycle at which the watchdog fired.
        cycle: u64,
        /// Description of the stuck state (ROB head, occupancy, ...).
        detail: String,
    },
}

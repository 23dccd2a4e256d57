//! MIPS register naming conventions.
//!
//! Maps between the conventional register names accepted by the assembler
//! (`$zero`, `$t0`..`$t9`, `$s0`..`$s7`, `$a0`..`$a3`, `$v0`, `$v1`, `$sp`,
//! `$ra`, ...) and architectural register indices.

/// `$zero` — hardwired zero.
pub const REG_ZERO: usize = 0;
/// `$v0` — syscall selector / first return value.
pub const REG_V0: usize = 2;
/// `$a0` — first argument register.
pub const REG_A0: usize = 4;
/// `$sp` — stack pointer.
pub const REG_SP: usize = 29;
/// `$ra` — return address, written by `jal`.
pub const REG_RA: usize = 31;

/// Conventional names indexed by register number.
const NAMES: [&str; 32] = [
    "$zero", "$at", "$v0", "$v1", "$a0", "$a1", "$a2", "$a3", "$t0", "$t1", "$t2", "$t3", "$t4",
    "$t5", "$t6", "$t7", "$s0", "$s1", "$s2", "$s3", "$s4", "$s5", "$s6", "$s7", "$t8", "$t9",
    "$k0", "$k1", "$gp", "$sp", "$fp", "$ra",
];

/// Returns the conventional name for a register index.
///
/// # Panics
///
/// Panics if `reg >= 32`.
pub fn reg_name(reg: usize) -> &'static str {
    NAMES[reg]
}

/// Parses a register token (with leading `$`) into its index.
///
/// Accepts conventional names (`$t0`, `$sp`) and numeric form (`$8`).
/// Returns `None` for anything else.
pub fn parse_register(token: &str) -> Option<usize> {
    let token = token.trim();
    if let Some(pos) = NAMES.iter().position(|n| *n == token) {
        return Some(pos);
    }
    // Numeric form: $0 .. $31
    let digits = token.strip_prefix('$')?;
    match digits.parse::<usize>() {
        Ok(n) if n < 32 => Some(n),
        _ => None,
    }
}

//! Operation evaluation.
//!
//! Pure evaluation of a reservation-station entry once its operands are
//! ready: integer arithmetic and logic (with MIPS trapping-add overflow
//! semantics), `mul`/`div` for the float-class unit, branch resolution,
//! jump targets, effective-address generation for memory operations, and
//! the syscall exit sentinel. Faults are returned, not raised — the caller
//! records them on the reorder-buffer entry and program order decides
//! whether they are ever observed.

use crate::common::constants::{EXIT_SYSCALL, WORD_BYTES};
use crate::common::error::Fault;
use crate::core::pipeline::station::StationEntry;
use crate::isa::Opcode;

/// Resolved direction and target of a control transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BranchOutcome {
    /// Whether the transfer is taken.
    pub taken: bool,
    /// Next PC: the target when taken, the fall-through otherwise.
    pub target: u64,
}

/// Effective address (and store data) produced by a memory operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemRequest {
    /// Effective address.
    pub addr: u64,
    /// Data to store (`sw` only).
    pub data: u32,
}

/// Result of evaluating one instruction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExecOutcome {
    /// Register result (0 when the instruction has no destination).
    pub value: u32,
    /// Control-transfer resolution, if any.
    pub branch: Option<BranchOutcome>,
    /// Memory request, if any.
    pub mem: Option<MemRequest>,
    /// True when this is the exit-syscall sentinel.
    pub halt: bool,
}

impl Default for BranchOutcome {
    fn default() -> Self {
        Self {
            taken: false,
            target: 0,
        }
    }
}

fn checked_signed(result: Option<i32>) -> Result<u32, Fault> {
    result.map(|v| v as u32).ok_or(Fault::Overflow)
}

/// Evaluates a station entry whose operands are ready.
pub fn execute(entry: &StationEntry) -> Result<ExecOutcome, Fault> {
    let a = entry.a.value;
    let b = entry.b.value;
    let sa = a as i32;
    let sb = b as i32;
    let imm = entry.imm;
    let fall_through = entry.pc + WORD_BYTES;
    let static_target = entry.static_target.unwrap_or(fall_through);

    let mut out = ExecOutcome::default();
    match entry.opcode {
        Opcode::Add => out.value = checked_signed(sa.checked_add(sb))?,
        Opcode::Addi => out.value = checked_signed(sa.checked_add(imm as i32))?,
        Opcode::Sub => out.value = checked_signed(sa.checked_sub(sb))?,
        Opcode::Mul => out.value = sa.wrapping_mul(sb) as u32,
        Opcode::Div => {
            if sb == 0 {
                return Err(Fault::DivideByZero);
            }
            out.value = sa.wrapping_div(sb) as u32;
        }
        Opcode::And => out.value = a & b,
        Opcode::Or => out.value = a | b,
        Opcode::Xor => out.value = a ^ b,
        Opcode::Sll => out.value = a << (imm as u32 & 0x1f),
        Opcode::Srl => out.value = a >> (imm as u32 & 0x1f),
        Opcode::Slt => out.value = u32::from(sa < sb),
        Opcode::Li | Opcode::La => out.value = imm as u32,
        Opcode::Lw => {
            out.mem = Some(MemRequest {
                addr: effective_addr(a, entry.disp),
                data: 0,
            });
        }
        Opcode::Sw => {
            out.mem = Some(MemRequest {
                addr: effective_addr(a, entry.disp),
                data: b,
            });
        }
        Opcode::Beq => out.branch = Some(resolve(sa == sb, static_target, fall_through)),
        Opcode::Bne => out.branch = Some(resolve(sa != sb, static_target, fall_through)),
        Opcode::Bgt => out.branch = Some(resolve(sa > sb, static_target, fall_through)),
        Opcode::Bge => out.branch = Some(resolve(sa >= sb, static_target, fall_through)),
        Opcode::Ble => out.branch = Some(resolve(sa <= sb, static_target, fall_through)),
        Opcode::Blt => out.branch = Some(resolve(sa < sb, static_target, fall_through)),
        Opcode::J => out.branch = Some(resolve(true, static_target, fall_through)),
        Opcode::Jal => {
            out.value = fall_through as u32;
            out.branch = Some(resolve(true, static_target, fall_through));
        }
        Opcode::Jr => out.branch = Some(resolve(true, u64::from(a), fall_through)),
        Opcode::Nop => {}
        Opcode::Syscall => out.halt = a == EXIT_SYSCALL,
    }
    Ok(out)
}

fn resolve(taken: bool, target: u64, fall_through: u64) -> BranchOutcome {
    BranchOutcome {
        taken,
        target: if taken { target } else { fall_through },
    }
}

fn effective_addr(base: u32, disp: i32) -> u64 {
    u64::from(base.wrapping_add(disp as u32))
}

//! Pre-decoded instruction records and the opcode table.
//!
//! The loader hands the core an array of `Instruction` records indexed by
//! `(pc - text_base) / 4`; the pipeline's decode stage performs dependency
//! analysis and renaming on these records rather than bit-field extraction.
//! Dynamic per-instance state (sequence tag, operand readiness, results,
//! status) lives in the pipeline arenas — instruction identity inside the
//! engine is an index plus a tag, never a mutable shared record.

use std::fmt;

use crate::isa::abi;

/// Functional-unit class an operation executes on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FuClass {
    /// Integer ALU: single-cycle arithmetic/logic, branches, jumps, syscall.
    Alu,
    /// Float/long-latency unit: `mul` and `div`.
    Fpu,
    /// Load/store unit: effective-address generation for `lw`/`sw`.
    Lsu,
}

impl FuClass {
    /// All classes, in arena order.
    pub const ALL: [Self; 3] = [Self::Alu, Self::Fpu, Self::Lsu];

    /// Arena index of this class.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Self::Alu => 0,
            Self::Fpu => 1,
            Self::Lsu => 2,
        }
    }

    /// Short lower-case name used in statistics and traces.
    pub fn name(self) -> &'static str {
        match self {
            Self::Alu => "alu",
            Self::Fpu => "fpu",
            Self::Lsu => "lsu",
        }
    }
}

/// Supported operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Opcode {
    /// `add rd, rs, rt` — signed add, overflow faults.
    Add,
    /// `addi rt, rs, imm` — signed add immediate, overflow faults.
    Addi,
    /// `sub rd, rs, rt` — signed subtract, overflow faults.
    Sub,
    /// `mul rd, rs, rt` — low 32 bits of the signed product.
    Mul,
    /// `div rd, rs, rt` — signed quotient, divide-by-zero faults.
    Div,
    /// `and rd, rs, rt`.
    And,
    /// `or rd, rs, rt`.
    Or,
    /// `xor rd, rs, rt`.
    Xor,
    /// `sll rd, rt, shamt`.
    Sll,
    /// `srl rd, rt, shamt`.
    Srl,
    /// `slt rd, rs, rt` — signed set-on-less-than.
    Slt,
    /// `li rd, imm` — load immediate.
    Li,
    /// `la rd, label` — load resolved address.
    La,
    /// `lw rt, disp(rs)` — load word.
    Lw,
    /// `sw rt, disp(rs)` — store word.
    Sw,
    /// `beq rs, rt, label`.
    Beq,
    /// `bne rs, rt, label`.
    Bne,
    /// `bgt rs, rt, label` — signed greater-than.
    Bgt,
    /// `bge rs, rt, label` — signed greater-or-equal.
    Bge,
    /// `ble rs, rt, label` — signed less-or-equal.
    Ble,
    /// `blt rs, rt, label` — signed less-than.
    Blt,
    /// `j label` — unconditional jump.
    J,
    /// `jal label` — jump and link `$ra`.
    Jal,
    /// `jr rs` — register-indirect jump.
    Jr,
    /// `nop`.
    Nop,
    /// `syscall` — exit sentinel when `$v0 == 10`, otherwise a no-op.
    Syscall,
}

impl Opcode {
    /// The functional-unit class this operation executes on.
    pub fn class(self) -> FuClass {
        match self {
            Self::Mul | Self::Div => FuClass::Fpu,
            Self::Lw | Self::Sw => FuClass::Lsu,
            _ => FuClass::Alu,
        }
    }

    /// True for conditional branches.
    pub fn is_cond_branch(self) -> bool {
        matches!(
            self,
            Self::Beq | Self::Bne | Self::Bgt | Self::Bge | Self::Ble | Self::Blt
        )
    }

    /// True for any control transfer resolved in the pipeline
    /// (conditional branches and `jr`; `j`/`jal` targets are static).
    pub fn needs_resolution(self) -> bool {
        self.is_cond_branch() || self == Self::Jr
    }

    /// True for any control transfer, static targets included.
    pub fn is_control(self) -> bool {
        self.needs_resolution() || matches!(self, Self::J | Self::Jal)
    }

    /// Canonical mnemonic.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Addi => "addi",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Div => "div",
            Self::And => "and",
            Self::Or => "or",
            Self::Xor => "xor",
            Self::Sll => "sll",
            Self::Srl => "srl",
            Self::Slt => "slt",
            Self::Li => "li",
            Self::La => "la",
            Self::Lw => "lw",
            Self::Sw => "sw",
            Self::Beq => "beq",
            Self::Bne => "bne",
            Self::Bgt => "bgt",
            Self::Bge => "bge",
            Self::Ble => "ble",
            Self::Blt => "blt",
            Self::J => "j",
            Self::Jal => "jal",
            Self::Jr => "jr",
            Self::Nop => "nop",
            Self::Syscall => "syscall",
        }
    }
}

/// A pre-decoded instruction, as produced by the loader.
///
/// Operand roles by format:
/// - three-register ops: `dst`, `src1`, `src2`
/// - immediate ops: `dst`, `src1`, `imm`
/// - `lw`: `dst`, `src1` = base, `disp`
/// - `sw`: `src1` = base, `src2` = data, `disp`
/// - branches: `src1`, `src2`, `target`
/// - `jr`: `src1`; `syscall`: `src1` = `$v0`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Instruction {
    /// Address of this instruction.
    pub pc: u64,
    /// Operation.
    pub opcode: Opcode,
    /// Destination architectural register, if any.
    pub dst: Option<usize>,
    /// First source architectural register, if any.
    pub src1: Option<usize>,
    /// Second source architectural register, if any.
    pub src2: Option<usize>,
    /// Immediate operand (also holds resolved `la` addresses).
    pub imm: i64,
    /// Memory displacement for `lw`/`sw`.
    pub disp: i32,
    /// Statically resolved branch/jump target.
    pub target: Option<u64>,
}

impl Instruction {
    /// A canonical `nop` at the given address.
    pub fn nop(pc: u64) -> Self {
        Self {
            pc,
            opcode: Opcode::Nop,
            dst: None,
            src1: None,
            src2: None,
            imm: 0,
            disp: 0,
            target: None,
        }
    }

    /// True if this instruction reads or writes memory.
    pub fn is_mem(&self) -> bool {
        matches!(self.opcode, Opcode::Lw | Opcode::Sw)
    }
}

impl fmt::Display for Instruction {
    /// Renders the instruction in canonical assembler syntax.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = self.opcode.mnemonic();
        let r = |reg: Option<usize>| reg.map_or("?", abi::reg_name);
        match self.opcode {
            Opcode::Nop | Opcode::Syscall => write!(f, "{op}"),
            Opcode::Li => write!(f, "{op} {}, {}", r(self.dst), self.imm),
            Opcode::La => write!(f, "{op} {}, {:#x}", r(self.dst), self.imm),
            Opcode::Addi => write!(f, "{op} {}, {}, {}", r(self.dst), r(self.src1), self.imm),
            Opcode::Sll | Opcode::Srl => {
                write!(f, "{op} {}, {}, {}", r(self.dst), r(self.src1), self.imm)
            }
            Opcode::Lw => write!(f, "{op} {}, {}({})", r(self.dst), self.disp, r(self.src1)),
            Opcode::Sw => write!(f, "{op} {}, {}({})", r(self.src2), self.disp, r(self.src1)),
            Opcode::J | Opcode::Jal => write!(f, "{op} {:#x}", self.target.unwrap_or(0)),
            Opcode::Jr => write!(f, "{op} {}", r(self.src1)),
            op_ if op_.is_cond_branch() => write!(
                f,
                "{op} {}, {}, {:#x}",
                r(self.src1),
                r(self.src2),
                self.target.unwrap_or(0)
            ),
            _ => write!(
                f,
                "{op} {}, {}, {}",
                r(self.dst),
                r(self.src1),
                r(self.src2)
            ),
        }
    }
}

//! Pipeline latch structures for inter-stage communication.
//!
//! The front end hands instructions between stages through one-cycle
//! latches: fetch fills a packet of `FetchedInst`, decode turns them into
//! `DecodedInst` (tags allocated, sources renamed), and issue installs
//! those into reservation stations. A stage that cannot drain its latch
//! leaves the remainder in place, which is what back-pressures the stages
//! upstream of it.

use crate::core::pipeline::rob::Tag;
use crate::isa::Opcode;

/// Entry in the fetch → decode latch.
#[derive(Clone, Copy, Debug)]
pub struct FetchedInst {
    /// Index into the program's instruction array.
    pub index: usize,
    /// Program counter.
    pub pc: u64,
    /// Whether fetch redirected after this instruction.
    pub pred_taken: bool,
    /// Predicted next PC when `pred_taken`.
    pub pred_target: u64,
    /// Global history register value at predict time.
    pub history_at_predict: u64,
}

/// Entry in the decode → issue latch.
///
/// Sources carry the producer tags snapshotted from the rename map at
/// decode; values are read at issue, when ready producers can be bypassed
/// from the reorder buffer.
#[derive(Clone, Copy, Debug)]
pub struct DecodedInst {
    /// Program-order tag (ROB slot already allocated).
    pub tag: Tag,
    /// Program counter.
    pub pc: u64,
    /// Operation.
    pub opcode: Opcode,
    /// First source register and its pending producer, if any.
    pub src1: Option<(usize, Option<Tag>)>,
    /// Second source register and its pending producer, if any.
    pub src2: Option<(usize, Option<Tag>)>,
    /// Immediate operand.
    pub imm: i64,
    /// Memory displacement.
    pub disp: i32,
    /// Statically resolved target for direct control transfers.
    pub static_target: Option<u64>,
    /// Predicted direction.
    pub pred_taken: bool,
    /// Predicted next PC.
    pub pred_target: u64,
}

//! Instruction Decode (ID) Stage.
//!
//! Turns fetched instructions into renamed, ROB-resident work, in program
//! order. For each instruction this stage:
//! 1. Allocates the ROB entry (assigning the program-order tag) and, for
//!    memory operations, the LSQ slot.
//! 2. Snapshots source producer tags from the rename map — *before* the
//!    destination is renamed, so an instruction reading its own
//!    destination register sees the previous producer.
//! 3. Renames the destination register to the new tag.
//! 4. Captures the rename-map snapshot that a branch squash restores.
//!
//! A full ROB or LSQ back-pressures: the instruction (and everything
//! behind it in the fetch buffer) stays put and the stall is counted.

use crate::core::pipeline::engine::Engine;
use crate::core::pipeline::latches::DecodedInst;
use crate::core::pipeline::lsq::MemKind;
use crate::core::pipeline::rob::RobEntry;
use crate::isa::Opcode;

/// Executes the decode stage.
pub fn decode_stage(eng: &mut Engine) {
    let mut consumed = 0;

    for i in 0..eng.fetch_buf.len() {
        let fetched = eng.fetch_buf[i];
        let inst = eng.program[fetched.index];

        if eng.rob.is_full() {
            eng.stats.stalls.rob_full += 1;
            break;
        }
        if inst.is_mem() && eng.lsq.is_full() {
            eng.stats.stalls.lsq_full += 1;
            break;
        }

        // Snapshot the rename map for anything a squash may need to revert.
        let snapshot = inst
            .opcode
            .needs_resolution()
            .then(|| eng.rename.snapshot());

        let Some(tag) = eng.rob.allocate(RobEntry {
            pc: fetched.pc,
            opcode: Some(inst.opcode),
            dst: inst.dst,
            is_store: inst.opcode == Opcode::Sw,
            is_branch: inst.opcode.needs_resolution(),
            pred_taken: fetched.pred_taken,
            pred_target: fetched.pred_target,
            history_at_predict: fetched.history_at_predict,
            snapshot,
            ..RobEntry::default()
        }) else {
            eng.stats.stalls.rob_full += 1;
            break;
        };

        // Source tags are read before the destination rename below.
        let src1 = inst.src1.map(|r| (r, eng.rename.producer(r)));
        let src2 = inst.src2.map(|r| (r, eng.rename.producer(r)));

        if let Some(dst) = inst.dst {
            eng.rename.set_producer(dst, tag);
        }

        if inst.is_mem() {
            let kind = if inst.opcode == Opcode::Sw {
                MemKind::Store
            } else {
                MemKind::Load
            };
            let ok = eng.lsq.allocate(tag, kind);
            debug_assert!(ok, "LSQ fullness checked above");
        }

        if eng.trace {
            eprintln!("ID  pc={:#x} seq={} {}", fetched.pc, tag.0, inst);
        }

        eng.issue_q.push_back(DecodedInst {
            tag,
            pc: fetched.pc,
            opcode: inst.opcode,
            src1,
            src2,
            imm: inst.imm,
            disp: inst.disp,
            static_target: inst.target,
            pred_taken: fetched.pred_taken,
            pred_target: fetched.pred_target,
        });
        consumed += 1;
    }

    eng.fetch_buf.drain(..consumed);
}

//! Instruction Issue (IS) Stage.
//!
//! Installs decoded instructions into the reservation station of their
//! functional-unit class, up to the issue width per cycle and strictly in
//! program order: an instruction that cannot be placed blocks everything
//! behind it in the same cycle (in-order issue, out-of-order execution).
//!
//! Operand slots are filled here: a source with no pending producer reads
//! the architectural register file; a source whose producer has already
//! completed bypasses the value from the reorder buffer; otherwise the
//! slot carries the producer tag and waits for the bus.

use crate::common::reg::RegisterFile;
use crate::core::pipeline::engine::Engine;
use crate::core::pipeline::rob::{Rob, RobState, Tag};
use crate::core::pipeline::station::{Operand, StationEntry};

/// Executes the issue stage.
pub fn issue_stage(eng: &mut Engine) {
    for _ in 0..eng.issue_width {
        let Some(dec) = eng.issue_q.front().copied() else {
            break;
        };

        let station = &mut eng.stations[dec.opcode.class().index()];
        if !station.has_free() {
            eng.stats.stalls.rs_full += 1;
            break;
        }

        let a = read_operand(dec.src1, &eng.rob, &eng.regs);
        let b = read_operand(dec.src2, &eng.rob, &eng.regs);

        let entry = StationEntry {
            tag: dec.tag,
            pc: dec.pc,
            opcode: dec.opcode,
            a,
            b,
            imm: dec.imm,
            disp: dec.disp,
            static_target: dec.static_target,
            pred_taken: dec.pred_taken,
            pred_target: dec.pred_target,
            issued_cycle: eng.cycle,
        };
        let installed = eng.stations[dec.opcode.class().index()].insert(entry);
        debug_assert!(installed, "free slot checked above");

        if eng.trace {
            eprintln!(
                "IS  pc={:#x} seq={} ready={}",
                dec.pc,
                dec.tag.0,
                entry.operands_ready()
            );
        }
        let _ = eng.issue_q.pop_front();
    }
}

/// Resolves one operand slot at issue time.
///
/// The tag captured at decode may name a producer that has since
/// completed (bypass its ROB result) or committed (the register file is
/// current again); only a still-executing producer leaves the slot pending.
fn read_operand(src: Option<(usize, Option<Tag>)>, rob: &Rob, regs: &RegisterFile) -> Operand {
    match src {
        None => Operand::ready(0),
        Some((reg, None)) => Operand::ready(regs.read(reg)),
        Some((reg, Some(tag))) => match rob.find_entry(tag) {
            Some(entry) if entry.state == RobState::Completed => Operand::ready(entry.result),
            Some(_) => Operand::pending(tag),
            // Producer already committed: the architectural value is current.
            None => Operand::ready(regs.read(reg)),
        },
    }
}

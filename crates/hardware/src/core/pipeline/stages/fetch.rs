//! Instruction Fetch (IF) Stage.
//!
//! Pulls up to the fetch width of instructions from the I-cache at the
//! current PC, predicting control flow as it goes. A predicted-taken
//! branch (or any jump) ends the packet and redirects the PC; an I-cache
//! miss ends the packet and stalls fetch for the miss penalty. The packet
//! lands in the fetch buffer, which decode drains next cycle — fetch only
//! runs when the buffer is empty, which is the one-deep staging register
//! back-pressure of the front end.

use crate::core::pipeline::engine::Engine;
use crate::core::pipeline::latches::FetchedInst;
use crate::core::units::bru::DirectionPredictor;
use crate::isa::Opcode;

/// Executes the instruction fetch stage of the pipeline.
pub fn fetch_stage(eng: &mut Engine) {
    if eng.halted || !eng.fetch_buf.is_empty() {
        return;
    }
    if eng.fetch_stall > 0 {
        eng.fetch_stall -= 1;
        eng.stats.stalls.icache_miss += 1;
        return;
    }

    let mut pc = eng.pc;
    let mut packet = Vec::with_capacity(eng.fetch_width);

    for _ in 0..eng.fetch_width {
        let Some(index) = eng.instruction_index(pc) else {
            break;
        };

        let access = eng.icache.access(pc, false);
        eng.stats.icache_accesses += 1;
        if access.hit {
            eng.stats.icache_hits += 1;
        } else {
            // The line arrives after the miss penalty; this instruction is
            // refetched then. One stall is charged now, the rest as the
            // stall counter drains.
            eng.stats.stalls.icache_miss += 1;
            eng.fetch_stall = access.latency.saturating_sub(1);
            break;
        }

        let inst = eng.program[index];
        let history_at_predict = eng.ghr;
        let fall_through = pc + 4;
        let mut pred_taken = false;
        let mut pred_target = fall_through;
        let mut redirect = false;

        match inst.opcode {
            op if op.is_cond_branch() => {
                let taken = eng.predictor.predict(pc, eng.ghr);
                // Speculative history update with the prediction; recovered
                // from the branch's snapshot on misprediction.
                eng.ghr = ((eng.ghr << 1) | u64::from(taken)) & eng.history_mask;
                if taken {
                    pred_taken = true;
                    pred_target = inst.target.unwrap_or(fall_through);
                    redirect = true;
                }
            }
            Opcode::J | Opcode::Jal => {
                pred_taken = true;
                pred_target = inst.target.unwrap_or(fall_through);
                redirect = true;
            }
            Opcode::Jr => {
                if let Some(target) = eng.btb.lookup(pc) {
                    pred_taken = true;
                    pred_target = target;
                    redirect = true;
                }
                // BTB miss: no static target exists, so the jump is treated
                // as predicted not-taken and resolution redirects.
            }
            _ => {}
        }

        if eng.trace {
            eprintln!("IF  pc={pc:#x} {inst} pred_taken={pred_taken}");
        }

        packet.push(FetchedInst {
            index,
            pc,
            pred_taken,
            pred_target,
            history_at_predict,
        });

        pc = pred_target;
        if redirect {
            break;
        }
    }

    eng.pc = pc;
    eng.fetch_buf = packet;
}

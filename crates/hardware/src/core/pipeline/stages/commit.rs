//! Commit (WB) Stage.
//!
//! Retires instructions from the ROB head, in program order, up to the
//! commit width per cycle:
//! 1. Results are written to the architectural register file; the rename
//!    map entry is cleared only if it still points at the retiring tag.
//! 2. Stores write the D-cache and flat memory from the LSQ head.
//! 3. A faulted head stops the simulation with a program-order diagnostic.
//! 4. A mispredicted control transfer at the head triggers the squash:
//!    every younger instruction's ROB/RS/LSQ/FU/bus state is reclaimed in
//!    this cycle, the rename map and global history recover from the
//!    branch's snapshot, and the PC is redirected to the actual target.
//! 5. The exit sentinel halts the engine after the current cycle.

use crate::common::error::{Fault, SimError};
use crate::core::pipeline::engine::Engine;
use crate::core::pipeline::rob::RobState;
use crate::core::units::bru::DirectionPredictor;
use crate::isa::Opcode;

/// Executes the commit stage.
pub fn commit_stage(eng: &mut Engine) -> Result<(), SimError> {
    if eng.halted {
        return Ok(());
    }

    for _ in 0..eng.commit_width {
        let Some(head) = eng.rob.peek_head() else {
            break;
        };
        match head.state {
            RobState::Issued => break,
            RobState::Faulted => {
                return Err(SimError::Fault {
                    pc: head.pc,
                    seq: head.tag.0,
                    fault: head.fault.unwrap_or(Fault::Overflow),
                });
            }
            RobState::Completed => {}
        }

        let Some(entry) = eng.rob.commit_head() else {
            break;
        };
        eng.stats.instructions_committed += 1;
        eng.last_commit_cycle = eng.cycle;

        if let Some(dst) = entry.dst {
            eng.regs.write(dst, entry.result);
            eng.rename.clear_if_match(dst, entry.tag);
        }

        if entry.is_store {
            if let Some(store) = eng.lsq.pop_store(entry.tag) {
                let addr = store.addr.unwrap_or(0);
                let access = eng.dcache.access(addr, true);
                eng.stats.dcache_accesses += 1;
                if access.hit {
                    eng.stats.dcache_hits += 1;
                }
                if let Err(fault) = eng.mem.write_u32(addr, store.data) {
                    // Bounds were checked at resolution; a failure here is a
                    // program-order-preserving surfacing of the same fault.
                    return Err(SimError::Fault {
                        pc: entry.pc,
                        seq: entry.tag.0,
                        fault,
                    });
                }
                if eng.trace {
                    eprintln!(
                        "CM  pc={:#x} seq={} store [{addr:#x}] = {:#x}",
                        entry.pc, entry.tag.0, store.data
                    );
                }
            }
        } else if eng.trace {
            if let Some(dst) = entry.dst {
                eprintln!(
                    "CM  pc={:#x} seq={} commit {}={:#x}",
                    entry.pc,
                    entry.tag.0,
                    crate::isa::abi::reg_name(dst),
                    entry.result
                );
            } else {
                eprintln!("CM  pc={:#x} seq={} commit", entry.pc, entry.tag.0);
            }
        }

        if entry.halt {
            if eng.trace {
                eprintln!("CM  pc={:#x} seq={} HALT", entry.pc, entry.tag.0);
            }
            eng.halted = true;
            // Younger speculative work is discarded wholesale.
            eng.squash_younger(entry.tag, None);
            break;
        }

        if entry.is_branch {
            eng.stats.branch_predictions += 1;
            let mispredicted =
                entry.actual_taken != entry.pred_taken || entry.actual_target != entry.pred_target;

            // Train the predictor and BTB with the resolved outcome.
            if entry.opcode == Some(Opcode::Jr) {
                eng.btb.update(entry.pc, entry.actual_target);
            } else {
                eng.predictor
                    .update(entry.pc, entry.history_at_predict, entry.actual_taken);
                if entry.actual_taken {
                    eng.btb.update(entry.pc, entry.actual_target);
                }
            }

            if mispredicted {
                eng.stats.branch_mispredictions += 1;
                if eng.trace {
                    eprintln!(
                        "CM  pc={:#x} seq={} MISPREDICT -> {:#x}",
                        entry.pc, entry.tag.0, entry.actual_target
                    );
                }

                // Recover the speculative global history from the snapshot;
                // conditional branches then shift in the actual outcome
                // (`jr` never shifted history at predict time).
                eng.ghr = if entry.opcode == Some(Opcode::Jr) {
                    entry.history_at_predict
                } else {
                    ((entry.history_at_predict << 1) | u64::from(entry.actual_taken))
                        & eng.history_mask
                };

                eng.squash_younger(entry.tag, entry.snapshot.as_ref());
                eng.pc = entry.actual_target;
                eng.fetch_stall = 0;
                break;
            }
        }
    }

    Ok(())
}

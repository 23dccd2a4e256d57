//! Execute (EX) Stage.
//!
//! Three steps, in order, every cycle:
//! 1. **Countdown & evaluate:** every occupied functional unit counts down;
//!    units reaching zero evaluate their instruction. Register results and
//!    branch resolutions enter the common data bus queue; memory operations
//!    resolve their LSQ entry (stores also complete on the bus — their ROB
//!    entry has nothing more to produce); faults mark the ROB entry directly.
//! 2. **Broadcast:** up to the bus width of queued results broadcast,
//!    lowest tag first. The broadcast is the single write event: waiting
//!    station operands adopt the value and the ROB entry completes.
//! 3. **Dispatch:** for each class, free units bind the oldest ready
//!    station entries. An entry woken by this cycle's broadcast may
//!    dispatch immediately, which is what lets a latency-L dependence
//!    chain sustain one result every L cycles.

use crate::core::pipeline::cdb::CdbResult;
use crate::core::pipeline::engine::Engine;
use crate::core::units::alu;
use crate::isa::{FuClass, Opcode};

/// Executes the execute stage.
pub fn execute_stage(eng: &mut Engine) {
    // Step 1: countdown and harvest completed units.
    let mut finished = Vec::new();
    for pool in &mut eng.pools {
        finished.extend(pool.tick());
    }
    for entry in finished {
        match alu::execute(&entry) {
            Err(fault) => {
                if eng.trace {
                    eprintln!("EX  pc={:#x} seq={} FAULT {fault}", entry.pc, entry.tag.0);
                }
                eng.rob.fault(entry.tag, fault);
            }
            Ok(out) => {
                if let Some(mem) = out.mem {
                    if entry.opcode == Opcode::Sw {
                        if eng.mem.in_bounds(mem.addr, 4) {
                            eng.lsq.resolve(entry.tag, mem.addr, mem.data);
                            eng.cdb.push(CdbResult::value(entry.tag, 0));
                        } else {
                            eng.rob.fault(
                                entry.tag,
                                crate::common::error::Fault::StoreOutOfBounds { addr: mem.addr },
                            );
                        }
                    } else {
                        // Loads: address resolution only; the value (and the
                        // bounds check) comes from the memory stage.
                        eng.lsq.resolve(entry.tag, mem.addr, 0);
                    }
                } else {
                    let mut result = CdbResult::value(entry.tag, out.value);
                    result.branch = out.branch;
                    result.halt = out.halt;
                    eng.cdb.push(result);
                }
            }
        }
    }

    // Step 2: broadcast this cycle's bus slots.
    for result in eng.cdb.drain_cycle() {
        for station in &mut eng.stations {
            station.broadcast(result.tag, result.value);
        }
        if let Some(branch) = result.branch {
            eng.rob.set_branch_outcome(result.tag, branch.taken, branch.target);
        }
        if result.halt {
            eng.rob.set_halt(result.tag);
        }
        eng.rob.complete(result.tag, result.value);
        if eng.trace {
            eprintln!("EX  seq={} CDB value={:#x}", result.tag.0, result.value);
        }
    }

    // Step 3: dispatch oldest-ready entries to free units.
    let mut starved = false;
    for class in FuClass::ALL {
        let idx = class.index();
        while eng.pools[idx].any_free() {
            match eng.stations[idx].take_ready_oldest() {
                Some(entry) => {
                    if eng.trace {
                        eprintln!(
                            "EX  pc={:#x} seq={} -> {}",
                            entry.pc,
                            entry.tag.0,
                            class.name()
                        );
                    }
                    eng.pools[idx].dispatch(entry);
                }
                None => break,
            }
        }
        // Entries waiting on operands with a unit idle: a RAW-hazard cycle.
        if !eng.stations[idx].is_empty() && eng.pools[idx].any_free() {
            starved = true;
        }
    }
    if starved {
        eng.stats.stalls.raw_hazard += 1;
    }
}

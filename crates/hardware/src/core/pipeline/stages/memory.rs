//! Memory Access (MA) Stage.
//!
//! Services one load per cycle through the load/store queue. A resolved
//! load with no older blocking store either forwards from the newest
//! older covering store (one-cycle path, no D-cache traffic) or reads the
//! D-cache: a hit completes immediately, a miss occupies the single read
//! port for the miss penalty. Stores never touch the D-cache here — they
//! write at commit, from the queue head.

use crate::core::pipeline::cdb::CdbResult;
use crate::core::pipeline::engine::{DcacheInFlight, Engine};
use crate::core::pipeline::lsq::LoadPlan;

/// Executes the memory stage.
pub fn memory_stage(eng: &mut Engine) {
    // An in-flight miss owns the port until it completes.
    if let Some(op) = &mut eng.dcache_op {
        eng.stats.stalls.dcache_miss += 1;
        op.remaining -= 1;
        if op.remaining > 0 {
            return;
        }
        let op = match eng.dcache_op.take() {
            Some(op) => op,
            None => return,
        };
        match eng.mem.read_u32(op.addr) {
            Ok(value) => {
                if eng.trace {
                    eprintln!("MA  seq={} load [{:#x}] = {:#x} (miss)", op.tag.0, op.addr, value);
                }
                eng.cdb.push(CdbResult::value(op.tag, value));
            }
            Err(fault) => eng.rob.fault(op.tag, fault),
        }
        eng.lsq.remove(op.tag);
        return;
    }

    let Some((tag, addr)) = eng.lsq.next_load().map(|e| (e.tag, e.addr.unwrap_or(0))) else {
        return;
    };

    match eng.lsq.plan_load(tag) {
        LoadPlan::Blocked => {}
        LoadPlan::Forward(value) => {
            if eng.trace {
                eprintln!("MA  seq={} load [{addr:#x}] = {value:#x} (forwarded)", tag.0);
            }
            eng.cdb.push(CdbResult::value(tag, value));
            eng.lsq.remove(tag);
        }
        LoadPlan::Memory => {
            if !eng.mem.in_bounds(addr, 4) {
                eng.rob
                    .fault(tag, crate::common::error::Fault::LoadOutOfBounds { addr });
                eng.lsq.remove(tag);
                return;
            }
            let access = eng.dcache.access(addr, false);
            eng.stats.dcache_accesses += 1;
            if access.hit {
                eng.stats.dcache_hits += 1;
                match eng.mem.read_u32(addr) {
                    Ok(value) => {
                        if eng.trace {
                            eprintln!("MA  seq={} load [{addr:#x}] = {value:#x} (hit)", tag.0);
                        }
                        eng.cdb.push(CdbResult::value(tag, value));
                    }
                    Err(fault) => eng.rob.fault(tag, fault),
                }
                eng.lsq.remove(tag);
            } else {
                // Port busy for the penalty; value arrives when it drains.
                eng.lsq.mark_completed(tag);
                eng.dcache_op = Some(DcacheInFlight {
                    tag,
                    addr,
                    remaining: access.latency,
                });
            }
        }
    }
}

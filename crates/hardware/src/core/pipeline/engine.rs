//! Pipeline driver.
//!
//! The `Engine` is the arena-plus-index heart of the simulator: it owns
//! every shared structure — program, register file, rename map, ROB,
//! reservation stations, functional-unit pools, LSQ, CDB, caches, flat
//! memory, predictor state — and is their sole mutator. `tick()` runs the
//! six stages in reverse pipeline order (commit, memory, execute, issue,
//! decode, fetch) so each stage observes state latched by the previous
//! cycle; a value produced this cycle becomes architecturally visible the
//! next.

use std::collections::VecDeque;

use crate::common::constants::{COMMIT_WATCHDOG, STACK_SLACK, WORD_BYTES};
use crate::common::error::SimError;
use crate::common::reg::RegisterFile;
use crate::config::Config;
use crate::core::pipeline::cdb::CommonDataBus;
use crate::core::pipeline::latches::{DecodedInst, FetchedInst};
use crate::core::pipeline::lsq::LoadStoreQueue;
use crate::core::pipeline::rename::{RenameMap, RenameSnapshot};
use crate::core::pipeline::rob::{Rob, Tag};
use crate::core::pipeline::stages;
use crate::core::pipeline::station::Station;
use crate::core::units::bru::btb::Btb;
use crate::core::units::bru::PredictorUnit;
use crate::core::units::cache::Cache;
use crate::core::units::fu::FuPool;
use crate::isa::{FuClass, Instruction};
use crate::mem::MainMemory;
use crate::sim::loader::LoadedProgram;
use crate::stats::SimStats;

/// A load miss occupying the D-cache port.
pub(crate) struct DcacheInFlight {
    /// Program-order tag of the load.
    pub tag: Tag,
    /// Effective address being read.
    pub addr: u64,
    /// Cycles until the value is available.
    pub remaining: u64,
}

/// The cycle-driven execution engine.
pub struct Engine {
    // Program image.
    pub(crate) program: Vec<Instruction>,
    pub(crate) text_base: u64,

    // Architectural state.
    /// Architectural register file (committed state only).
    pub regs: RegisterFile,
    /// Flat byte memory (data segment and stack).
    pub mem: MainMemory,
    /// Fetch program counter.
    pub pc: u64,

    // Pipeline arenas.
    pub(crate) rename: RenameMap,
    pub(crate) rob: Rob,
    pub(crate) stations: Vec<Station>,
    pub(crate) pools: Vec<FuPool>,
    pub(crate) lsq: LoadStoreQueue,
    pub(crate) cdb: CommonDataBus,

    // Inter-stage latches.
    pub(crate) fetch_buf: Vec<FetchedInst>,
    pub(crate) issue_q: VecDeque<DecodedInst>,

    // Branch prediction.
    pub(crate) predictor: PredictorUnit,
    pub(crate) btb: Btb,
    pub(crate) ghr: u64,
    pub(crate) history_mask: u64,

    // Memory hierarchy.
    pub(crate) icache: Cache,
    pub(crate) dcache: Cache,
    pub(crate) dcache_op: Option<DcacheInFlight>,
    pub(crate) fetch_stall: u64,

    // Widths.
    pub(crate) fetch_width: usize,
    pub(crate) issue_width: usize,
    pub(crate) commit_width: usize,

    // Bookkeeping.
    /// Event counters.
    pub stats: SimStats,
    /// Stage trace output to stderr.
    pub trace: bool,
    pub(crate) cycle: u64,
    pub(crate) halted: bool,
    pub(crate) last_commit_cycle: u64,
}

impl Engine {
    /// Builds an engine from a loaded program and a validated configuration.
    pub fn new(program: LoadedProgram, config: &Config) -> Self {
        let p = &config.pipeline;
        let u = &config.execute_units;

        let mut mem = MainMemory::new(program.data_base, config.memory_size.memory_size);
        mem.load_image(program.data_base, &program.data);

        let mut regs = RegisterFile::new();
        // The stack grows down from the top of memory.
        let sp = mem.limit() - STACK_SLACK;
        regs.write(crate::isa::abi::REG_SP, sp as u32);

        let history_mask = if config.branch_predictor.history_length == 0 {
            0
        } else {
            (1u64 << config.branch_predictor.history_length) - 1
        };

        Self {
            pc: program.entry,
            text_base: program.text_base,
            program: program.instructions,
            regs,
            mem,
            rename: RenameMap::new(),
            rob: Rob::new(p.rob_capacity),
            stations: FuClass::ALL
                .iter()
                .map(|class| Station::new(*class, p.rs_capacity_per_class))
                .collect(),
            pools: vec![
                FuPool::new(FuClass::Alu, &u.alu),
                FuPool::new(FuClass::Fpu, &u.fpu),
                FuPool::new(FuClass::Lsu, &u.lsu),
            ],
            lsq: LoadStoreQueue::new(p.lsq_capacity),
            cdb: CommonDataBus::new(p.effective_cdb_width()),
            fetch_buf: Vec::new(),
            issue_q: VecDeque::new(),
            predictor: PredictorUnit::new(&config.branch_predictor),
            btb: Btb::new(config.branch_predictor.btb_entries),
            ghr: 0,
            history_mask,
            icache: Cache::new(&config.cache.i),
            dcache: Cache::new(&config.cache.d),
            dcache_op: None,
            fetch_stall: 0,
            fetch_width: p.fetch_width,
            issue_width: p.issue_width,
            commit_width: p.commit_width,
            stats: SimStats::default(),
            trace: false,
            cycle: 0,
            halted: false,
            last_commit_cycle: 0,
        }
    }

    /// Current cycle count.
    #[inline]
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// True once the exit sentinel has committed.
    #[inline]
    pub fn halted(&self) -> bool {
        self.halted
    }

    /// Index into the program array for `pc`, if it addresses an instruction.
    pub(crate) fn instruction_index(&self, pc: u64) -> Option<usize> {
        if pc < self.text_base || (pc - self.text_base) % WORD_BYTES != 0 {
            return None;
        }
        let index = ((pc - self.text_base) / WORD_BYTES) as usize;
        (index < self.program.len()).then_some(index)
    }

    /// Advances the simulation by one clock cycle.
    ///
    /// Stages run in reverse pipeline order; any stage that cannot make
    /// progress holds its latch and the stall propagates upstream by
    /// construction.
    pub fn tick(&mut self) -> Result<(), SimError> {
        self.cycle += 1;
        self.stats.cycles += 1;

        stages::commit_stage(self)?;
        stages::memory_stage(self);
        stages::execute_stage(self);
        stages::issue_stage(self);
        stages::decode_stage(self);
        stages::fetch_stage(self);

        self.check_watchdog()
    }

    /// Runs until the exit sentinel commits, the cycle limit is reached,
    /// or the pipeline empties with no instruction left to fetch.
    pub fn run_until_halt_or_limit(&mut self, max_cycles: u64) -> Result<(), SimError> {
        while !self.halted && self.cycle < max_cycles {
            if self.nothing_in_flight() && self.instruction_index(self.pc).is_none() {
                break;
            }
            self.tick()?;
        }
        Ok(())
    }

    fn nothing_in_flight(&self) -> bool {
        self.rob.is_empty() && self.fetch_buf.is_empty() && self.issue_q.is_empty()
    }

    /// Reclaims everything younger than `tag` in one cycle: ROB entries,
    /// reservation-station and LSQ slots, in-flight unit work, queued bus
    /// results, the fetch and issue latches, and the D-cache port. The
    /// rename map recovers from the branch's decode-time snapshot (or is
    /// cleared outright when there is none to restore).
    pub(crate) fn squash_younger(&mut self, tag: Tag, snapshot: Option<&RenameSnapshot>) {
        self.rob.squash_after(tag);
        for station in &mut self.stations {
            station.squash_after(tag);
        }
        for pool in &mut self.pools {
            pool.squash_after(tag);
        }
        self.lsq.squash_after(tag);
        self.cdb.squash_after(tag);
        self.fetch_buf.clear();
        self.issue_q.clear();
        if self.dcache_op.as_ref().is_some_and(|op| op.tag > tag) {
            self.dcache_op = None;
        }
        match snapshot {
            Some(snap) => self.rename.restore(snap, &self.rob),
            None => self.rename = RenameMap::new(),
        }
    }

    fn check_watchdog(&self) -> Result<(), SimError> {
        if !self.rob.is_empty() && self.cycle - self.last_commit_cycle > COMMIT_WATCHDOG {
            let head = self.rob.peek_head();
            let detail = head.map_or_else(
                || "ROB occupied with no head".to_owned(),
                |h| {
                    format!(
                        "ROB head pc={:#x} seq={} state={:?}, occupancy {}/{}",
                        h.pc,
                        h.tag.0,
                        h.state,
                        self.rob.len(),
                        self.rob.capacity()
                    )
                },
            );
            return Err(SimError::Stuck {
                cycle: self.cycle,
                detail,
            });
        }
        Ok(())
    }

    /// Per-unit busy histogram for the results record.
    pub fn fu_utilization(&self) -> Vec<crate::stats::FuUtilization> {
        self.pools
            .iter()
            .flat_map(|pool| pool.utilization(self.stats.cycles))
            .collect()
    }
}

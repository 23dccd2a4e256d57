//! Test harness.
//!
//! `TestContext` assembles a source program, builds a simulator around it,
//! and exposes the pieces assertions need: architectural registers by
//! name, words of data memory by label or address, and the results record.

use std::collections::HashMap;

use mipsim_core::config::Config;
use mipsim_core::isa::abi;
use mipsim_core::sim::loader;
use mipsim_core::stats::SimReport;
use mipsim_core::Simulator;

/// An assembled program under simulation.
pub struct TestContext {
    /// The simulator under test.
    pub sim: Simulator,
    labels: HashMap<String, u64>,
}

impl TestContext {
    /// Assembles `source` under the default configuration.
    ///
    /// # Panics
    ///
    /// Panics on assembly or configuration errors — tests construct valid
    /// programs.
    pub fn new(source: &str) -> Self {
        Self::with_config(source, &Config::default())
    }

    /// Assembles `source` under `config`.
    pub fn with_config(source: &str, config: &Config) -> Self {
        let program = loader::assemble(source).expect("test program must assemble");
        let labels = program.labels.clone();
        let sim = Simulator::new(program, config).expect("test config must validate");
        Self { sim, labels }
    }

    /// Runs to completion and returns the report.
    ///
    /// # Panics
    ///
    /// Panics on runtime faults; tests that expect faults call
    /// `run_expect_err` instead.
    pub fn run(&mut self) -> SimReport {
        self.sim.run().expect("program must run to completion")
    }

    /// Runs to completion expecting a simulation error.
    pub fn run_expect_err(&mut self) -> mipsim_core::SimError {
        self.sim.run().expect_err("program must fault")
    }

    /// Reads an architectural register by conventional name.
    pub fn reg(&self, name: &str) -> u32 {
        let idx = abi::parse_register(name).expect("valid register name");
        self.sim.engine.regs.read(idx)
    }

    /// Address of a label defined by the program.
    pub fn label(&self, name: &str) -> u64 {
        *self.labels.get(name).expect("label must be defined")
    }

    /// Reads a word of data memory.
    pub fn read_word(&self, addr: u64) -> u32 {
        self.sim.engine.mem.read_u32(addr).expect("in-bounds read")
    }
}

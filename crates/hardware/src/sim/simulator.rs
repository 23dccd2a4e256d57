//! Simulator: validates configuration, builds the engine, runs it.
//!
//! The `Simulator` is the crate's front door: it performs the
//! before-simulation checks (configuration validity, program fit), owns
//! the engine for the duration of the run, and assembles the structured
//! results record at the end.

use crate::common::error::{AsmError, SimError};
use crate::config::Config;
use crate::core::Engine;
use crate::sim::loader::{self, LoadedProgram};
use crate::stats::SimReport;

/// Top-level simulator: validated configuration + engine.
pub struct Simulator {
    /// The cycle-driven engine. Public for state inspection in tests and
    /// tooling; the engine's own API keeps mutation mediated.
    pub engine: Engine,
    max_cycles: u64,
}

impl Simulator {
    /// Creates a simulator from an assembled program and a configuration.
    ///
    /// Fails before any simulation state exists when the configuration is
    /// invalid or the program's data segment does not fit in memory.
    pub fn new(program: LoadedProgram, config: &Config) -> Result<Self, SimError> {
        config.validate()?;
        let have = config.memory_size.memory_size;
        if program.data.len() > have {
            return Err(AsmError::DataOverflow {
                need: program.data.len(),
                have,
            }
            .into());
        }
        Ok(Self {
            engine: Engine::new(program, config),
            max_cycles: config.simulation.max_cycles,
        })
    }

    /// Assembles `source` and creates a simulator in one step.
    pub fn from_source(source: &str, config: &Config) -> Result<Self, SimError> {
        Self::new(loader::assemble(source)?, config)
    }

    /// Enables or disables stage tracing to stderr.
    pub fn set_trace(&mut self, on: bool) {
        self.engine.trace = on;
    }

    /// Runs to the exit sentinel or the cycle limit and reports.
    pub fn run(&mut self) -> Result<SimReport, SimError> {
        self.engine.run_until_halt_or_limit(self.max_cycles)?;
        Ok(self.report())
    }

    /// Advances a single cycle (stepping interface for tools and tests).
    pub fn tick(&mut self) -> Result<(), SimError> {
        self.engine.tick()
    }

    /// The structured results record for the current state.
    pub fn report(&self) -> SimReport {
        self.engine.stats.report(self.engine.fu_utilization())
    }
}

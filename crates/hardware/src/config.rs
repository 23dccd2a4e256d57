//! Configuration system for the simulator.
//!
//! This module defines all configuration structures and enums used to
//! parameterize the simulated core. It provides:
//! 1. **Defaults:** Baseline hardware constants (widths, capacities, caches,
//!    branch predictor).
//! 2. **Structures:** Hierarchical config for pipeline, execution units,
//!    branch prediction, caches, memory, and the simulation itself.
//! 3. **Validation:** Geometry and sizing checks performed before any
//!    simulation object is constructed.
//!
//! Configuration is supplied as JSON (CLI `--config`) or via `Config::default()`.

use serde::Deserialize;

use crate::common::error::ConfigError;

/// Default configuration constants for the simulator.
///
/// These values define the baseline hardware configuration when not
/// explicitly overridden in a configuration file.
mod defaults {
    /// Instructions fetched per cycle.
    pub const FETCH_WIDTH: usize = 2;

    /// Instructions issued (and committed) per cycle.
    pub const ISSUE_WIDTH: usize = 2;

    /// Reorder buffer capacity in entries.
    pub const ROB_CAPACITY: usize = 32;

    /// Reservation-station entries per functional-unit class.
    pub const RS_CAPACITY: usize = 8;

    /// Load/store queue capacity in entries.
    pub const LSQ_CAPACITY: usize = 16;

    /// Integer ALU count and latency.
    pub const ALU_COUNT: usize = 2;
    /// Integer ALU latency in cycles.
    pub const ALU_LATENCY: u64 = 1;

    /// Float/long-latency unit count.
    pub const FPU_COUNT: usize = 1;
    /// Float/long-latency unit latency in cycles.
    pub const FPU_LATENCY: u64 = 4;

    /// Load/store address-generation unit count.
    pub const LSU_COUNT: usize = 1;
    /// Load/store unit latency in cycles.
    pub const LSU_LATENCY: u64 = 1;

    /// Direction-predictor table entries (power of two).
    pub const PREDICTOR_ENTRIES: usize = 1024;

    /// Global history length in bits (gshare).
    pub const HISTORY_LENGTH: usize = 8;

    /// Branch target buffer entries.
    pub const BTB_ENTRIES: usize = 64;

    /// Cache size in bytes (4 KiB).
    pub const CACHE_SIZE: usize = 4096;

    /// Cache block size in bytes.
    pub const CACHE_BLOCK: usize = 64;

    /// Cache associativity (ways).
    pub const CACHE_WAYS: usize = 2;

    /// Cache miss penalty in cycles.
    pub const CACHE_MISS_PENALTY: u64 = 10;

    /// Flat memory size in bytes (1 MiB).
    pub const MEMORY_SIZE: usize = 1024 * 1024;

    /// Simulation wall limit in cycles.
    pub const MAX_CYCLES: u64 = 1_000_000;
}

/// Branch prediction algorithm selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictorKind {
    /// Predict every conditional branch taken.
    AlwaysTaken,
    /// Per-PC table of 2-bit saturating counters.
    Bimodal,
    /// PC XOR global-history indexed table of 2-bit saturating counters.
    #[default]
    Gshare,
}

/// Root configuration structure containing all simulator settings.
///
/// # Examples
///
/// Creating a default configuration:
///
/// ```
/// use mipsim_core::config::Config;
///
/// let config = Config::default();
/// assert_eq!(config.pipeline.issue_width, 2);
/// assert!(config.validate().is_ok());
/// ```
///
/// Deserializing from JSON:
///
/// ```
/// use mipsim_core::config::{Config, PredictorKind};
///
/// let json = r#"{
///     "pipeline": { "fetch_width": 4, "issue_width": 4, "rob_capacity": 64 },
///     "execute_units": { "alu": { "count": 4, "latency": 1 } },
///     "branch_predictor": { "type": "bimodal", "num_entries": 512 },
///     "cache": { "d": { "size": 8192, "associativity": 4 } },
///     "simulation": { "max_cycles": 100000 }
/// }"#;
///
/// let config: Config = serde_json::from_str(json).unwrap();
/// assert_eq!(config.pipeline.fetch_width, 4);
/// assert_eq!(config.branch_predictor.kind, PredictorKind::Bimodal);
/// assert_eq!(config.cache.d.size, 8192);
/// assert_eq!(config.cache.i.size, 4096);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Pipeline widths and structure capacities.
    pub pipeline: PipelineConfig,
    /// Functional unit counts and latencies.
    pub execute_units: ExecuteUnitsConfig,
    /// Branch predictor selection and sizing.
    pub branch_predictor: BranchPredictorConfig,
    /// Split L1 instruction/data cache shapes.
    pub cache: CacheHierarchyConfig,
    /// Flat memory size in bytes.
    pub memory_size: MemorySizeConfig,
    /// Simulation limits.
    pub simulation: SimulationConfig,
}

impl Config {
    /// Validates the configuration, rejecting it before simulation.
    ///
    /// Checks the "configuration-invalid" class of errors: zero widths,
    /// capacities, or latencies; non-power-of-two cache and predictor
    /// geometry; blocks larger than their cache.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn non_zero(field: &'static str, value: usize) -> Result<(), ConfigError> {
            if value == 0 {
                Err(ConfigError::Zero { field })
            } else {
                Ok(())
            }
        }
        fn pow2(field: &'static str, value: usize) -> Result<(), ConfigError> {
            if value.is_power_of_two() {
                Ok(())
            } else {
                Err(ConfigError::NotPowerOfTwo { field, value })
            }
        }

        let p = &self.pipeline;
        non_zero("pipeline.fetch_width", p.fetch_width)?;
        non_zero("pipeline.issue_width", p.issue_width)?;
        non_zero("pipeline.commit_width", p.commit_width)?;
        non_zero("pipeline.rob_capacity", p.rob_capacity)?;
        non_zero("pipeline.rs_capacity_per_class", p.rs_capacity_per_class)?;
        non_zero("pipeline.lsq_capacity", p.lsq_capacity)?;

        for (name, unit) in [
            ("execute_units.alu", &self.execute_units.alu),
            ("execute_units.fpu", &self.execute_units.fpu),
            ("execute_units.lsu", &self.execute_units.lsu),
        ] {
            non_zero(name, unit.count)?;
            if unit.latency == 0 {
                return Err(ConfigError::Zero { field: name });
            }
        }

        let bp = &self.branch_predictor;
        non_zero("branch_predictor.num_entries", bp.num_entries)?;
        pow2("branch_predictor.num_entries", bp.num_entries)?;
        non_zero("branch_predictor.btb_entries", bp.btb_entries)?;
        if bp.history_length > 32 {
            return Err(ConfigError::TooLarge {
                field: "branch_predictor.history_length",
                value: bp.history_length,
                limit_name: "history register width",
                limit: 32,
            });
        }

        for (name, cache) in [("cache.i", &self.cache.i), ("cache.d", &self.cache.d)] {
            non_zero(name, cache.size)?;
            pow2("cache size", cache.size)?;
            pow2("cache block_size", cache.block_size)?;
            pow2("cache associativity", cache.associativity)?;
            non_zero("cache miss_penalty", cache.miss_penalty as usize)?;
            if cache.block_size * cache.associativity > cache.size {
                return Err(ConfigError::TooLarge {
                    field: "cache block_size * associativity",
                    value: cache.block_size * cache.associativity,
                    limit_name: name,
                    limit: cache.size,
                });
            }
        }

        non_zero("memory_size", self.memory_size.memory_size)?;
        if self.simulation.max_cycles == 0 {
            return Err(ConfigError::Zero {
                field: "simulation.max_cycles",
            });
        }
        Ok(())
    }
}

/// Pipeline widths and structure capacities.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Instructions fetched per cycle.
    pub fetch_width: usize,

    /// Instructions issued per cycle (in program order).
    pub issue_width: usize,

    /// Instructions committed per cycle. Defaults to the issue width.
    pub commit_width: usize,

    /// Results broadcast on the common data bus per cycle.
    /// Zero means "same as issue width".
    pub cdb_width: usize,

    /// Reorder buffer capacity.
    pub rob_capacity: usize,

    /// Reservation-station entries per functional-unit class.
    pub rs_capacity_per_class: usize,

    /// Load/store queue capacity.
    pub lsq_capacity: usize,
}

impl PipelineConfig {
    /// Effective CDB width: the configured value, or the issue width when 0.
    pub fn effective_cdb_width(&self) -> usize {
        if self.cdb_width == 0 {
            self.issue_width
        } else {
            self.cdb_width
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fetch_width: defaults::FETCH_WIDTH,
            issue_width: defaults::ISSUE_WIDTH,
            commit_width: defaults::ISSUE_WIDTH,
            cdb_width: 0,
            rob_capacity: defaults::ROB_CAPACITY,
            rs_capacity_per_class: defaults::RS_CAPACITY,
            lsq_capacity: defaults::LSQ_CAPACITY,
        }
    }
}

/// One functional-unit class: how many units, how many cycles each occupies.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct UnitConfig {
    /// Number of identical units of this class.
    pub count: usize,
    /// Occupancy in cycles per operation.
    pub latency: u64,
}

impl Default for UnitConfig {
    fn default() -> Self {
        Self {
            count: defaults::ALU_COUNT,
            latency: defaults::ALU_LATENCY,
        }
    }
}

/// Functional unit configuration for the three classes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExecuteUnitsConfig {
    /// Integer ALUs.
    pub alu: UnitConfig,
    /// Float/long-latency units (`mul`, `div`).
    pub fpu: UnitConfig,
    /// Load/store address-generation units.
    pub lsu: UnitConfig,
}

impl Default for ExecuteUnitsConfig {
    fn default() -> Self {
        Self {
            alu: UnitConfig {
                count: defaults::ALU_COUNT,
                latency: defaults::ALU_LATENCY,
            },
            fpu: UnitConfig {
                count: defaults::FPU_COUNT,
                latency: defaults::FPU_LATENCY,
            },
            lsu: UnitConfig {
                count: defaults::LSU_COUNT,
                latency: defaults::LSU_LATENCY,
            },
        }
    }
}

/// Branch predictor selection and sizing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BranchPredictorConfig {
    /// Prediction algorithm.
    #[serde(rename = "type")]
    pub kind: PredictorKind,

    /// Direction table entries (power of two).
    pub num_entries: usize,

    /// Global history register length in bits (gshare only).
    pub history_length: usize,

    /// Branch target buffer entries (LRU-evicted).
    pub btb_entries: usize,
}

impl Default for BranchPredictorConfig {
    fn default() -> Self {
        Self {
            kind: PredictorKind::default(),
            num_entries: defaults::PREDICTOR_ENTRIES,
            history_length: defaults::HISTORY_LENGTH,
            btb_entries: defaults::BTB_ENTRIES,
        }
    }
}

/// Split L1 cache configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CacheHierarchyConfig {
    /// Instruction cache (read-only to the pipeline).
    pub i: CacheConfig,
    /// Data cache (written only by store commit).
    pub d: CacheConfig,
}

/// Individual cache shape.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Total size in bytes (power of two).
    pub size: usize,

    /// Block (line) size in bytes (power of two).
    pub block_size: usize,

    /// Ways per set (power of two).
    pub associativity: usize,

    /// Miss penalty in cycles; hits cost one cycle.
    pub miss_penalty: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            size: defaults::CACHE_SIZE,
            block_size: defaults::CACHE_BLOCK,
            associativity: defaults::CACHE_WAYS,
            miss_penalty: defaults::CACHE_MISS_PENALTY,
        }
    }
}

/// Flat memory sizing.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct MemorySizeConfig {
    /// Flat memory bytes backing the data segment and stack.
    pub memory_size: usize,
}

impl Default for MemorySizeConfig {
    fn default() -> Self {
        Self {
            memory_size: defaults::MEMORY_SIZE,
        }
    }
}

/// Simulation limits.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Hard wall limit on simulated cycles.
    pub max_cycles: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_cycles: defaults::MAX_CYCLES,
        }
    }
}

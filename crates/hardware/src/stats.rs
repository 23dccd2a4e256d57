//! Simulation statistics collection and reporting.
//!
//! This module tracks performance metrics for the simulated core. It provides:
//! 1. **Raw counters:** Cycles, commits, branch outcomes, cache accesses,
//!    and stall cycles broken down by cause.
//! 2. **`SimReport`:** The structured results record emitted on halt or
//!    cycle limit, with the derived identities (IPC, accuracies) computed
//!    in exactly one place.
//! 3. **Printing:** A fixed-width statistics table for terminal output.

use serde::Serialize;

/// Stall cycles broken down by cause.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StallCounters {
    /// Decode blocked because the reorder buffer was full.
    pub rob_full: u64,
    /// Issue blocked because the target reservation station was full.
    pub rs_full: u64,
    /// Decode blocked because the load/store queue was full.
    pub lsq_full: u64,
    /// Fetch cycles lost to instruction-cache misses.
    pub icache_miss: u64,
    /// Cycles a load miss occupied the data-cache port.
    pub dcache_miss: u64,
    /// Cycles some class had waiting instructions and a free unit but no
    /// ready operands.
    pub raw_hazard: u64,
}

/// Raw event counters accumulated by the pipeline.
#[derive(Clone, Debug, Default)]
pub struct SimStats {
    /// Total simulated cycles.
    pub cycles: u64,
    /// Instructions retired in program order.
    pub instructions_committed: u64,
    /// Committed control transfers that consulted the predictor
    /// (conditional branches and `jr`).
    pub branch_predictions: u64,
    /// Of those, how many were mispredicted.
    pub branch_mispredictions: u64,
    /// Instruction-cache lookups.
    pub icache_accesses: u64,
    /// Instruction-cache hits.
    pub icache_hits: u64,
    /// Data-cache lookups (load reads and commit-time store writes).
    pub dcache_accesses: u64,
    /// Data-cache hits.
    pub dcache_hits: u64,
    /// Stall cycles by cause.
    pub stalls: StallCounters,
}

impl SimStats {
    /// Builds the structured results record.
    ///
    /// `fu_utilization` comes from the functional-unit pools, which own the
    /// per-unit busy counters.
    pub fn report(&self, fu_utilization: Vec<FuUtilization>) -> SimReport {
        let cycles = self.cycles.max(1);
        let predictions = self.branch_predictions;
        // Programs with zero branches are perfectly predicted by convention.
        let branch_accuracy = if predictions == 0 {
            1.0
        } else {
            (predictions - self.branch_mispredictions) as f64 / predictions as f64
        };
        SimReport {
            cycles: self.cycles,
            instructions_committed: self.instructions_committed,
            ipc: self.instructions_committed as f64 / cycles as f64,
            branch_predictions: self.branch_predictions,
            branch_mispredictions: self.branch_mispredictions,
            branch_accuracy,
            icache_accesses: self.icache_accesses,
            icache_hits: self.icache_hits,
            dcache_accesses: self.dcache_accesses,
            dcache_hits: self.dcache_hits,
            stalls_by_cause: self.stalls,
            fu_utilization,
        }
    }
}

/// Busy-cycle accounting for one functional unit.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FuUtilization {
    /// Unit name, e.g. `alu0`, `fpu0`, `lsu0`.
    pub unit: String,
    /// Cycles the unit held an instruction.
    pub busy_cycles: u64,
    /// `busy_cycles / cycles`.
    pub utilization: f64,
}

/// Structured results record emitted on halt or cycle limit.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SimReport {
    /// Total simulated cycles.
    pub cycles: u64,
    /// Instructions retired in program order.
    pub instructions_committed: u64,
    /// `instructions_committed / cycles`.
    pub ipc: f64,
    /// Committed predictor consultations.
    pub branch_predictions: u64,
    /// Committed mispredictions.
    pub branch_mispredictions: u64,
    /// `(predictions - mispredictions) / predictions`; 1.0 with no branches.
    pub branch_accuracy: f64,
    /// Instruction-cache lookups.
    pub icache_accesses: u64,
    /// Instruction-cache hits.
    pub icache_hits: u64,
    /// Data-cache lookups.
    pub dcache_accesses: u64,
    /// Data-cache hits.
    pub dcache_hits: u64,
    /// Stall cycles by cause.
    pub stalls_by_cause: StallCounters,
    /// Per-unit busy histogram.
    pub fu_utilization: Vec<FuUtilization>,
}

impl SimReport {
    /// Prints the statistics table to stdout.
    pub fn print(&self) {
        println!("\n==========================================================");
        println!("SUPERSCALAR PIPELINE SIMULATION STATISTICS");
        println!("==========================================================");
        println!("sim_cycles               {}", self.cycles);
        println!("sim_insts                {}", self.instructions_committed);
        println!("sim_ipc                  {:.4}", self.ipc);
        println!("----------------------------------------------------------");
        println!("BRANCH PREDICTION");
        println!("  bp.lookups             {}", self.branch_predictions);
        println!("  bp.mispredicts         {}", self.branch_mispredictions);
        println!("  bp.accuracy            {:.2}%", self.branch_accuracy * 100.0);
        println!("----------------------------------------------------------");
        let print_cache = |name: &str, accesses: u64, hits: u64| {
            let rate = if accesses > 0 {
                (hits as f64 / accesses as f64) * 100.0
            } else {
                0.0
            };
            println!(
                "  {:<6} accesses: {:<10} | hits: {:<10} | hit_rate: {:.2}%",
                name, accesses, hits, rate
            );
        };
        println!("MEMORY HIERARCHY");
        print_cache("L1-I", self.icache_accesses, self.icache_hits);
        print_cache("L1-D", self.dcache_accesses, self.dcache_hits);
        println!("----------------------------------------------------------");
        let s = &self.stalls_by_cause;
        println!("STALLS");
        println!("  stall.rob_full         {}", s.rob_full);
        println!("  stall.rs_full          {}", s.rs_full);
        println!("  stall.lsq_full         {}", s.lsq_full);
        println!("  stall.icache_miss      {}", s.icache_miss);
        println!("  stall.dcache_miss      {}", s.dcache_miss);
        println!("  stall.raw_hazard       {}", s.raw_hazard);
        println!("----------------------------------------------------------");
        println!("FUNCTIONAL UNITS");
        for fu in &self.fu_utilization {
            println!(
                "  {:<6} busy: {:<10} | utilization: {:.2}%",
                fu.unit,
                fu.busy_cycles,
                fu.utilization * 100.0
            );
        }
        println!("==========================================================");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ipc_identity() {
        let stats = SimStats {
            cycles: 200,
            instructions_committed: 100,
            ..Default::default()
        };
        let report = stats.report(Vec::new());
        assert!((report.ipc - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_no_branches_is_perfect_accuracy() {
        let stats = SimStats {
            cycles: 10,
            ..Default::default()
        };
        assert!((stats.report(Vec::new()).branch_accuracy - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_accuracy_identity() {
        let stats = SimStats {
            cycles: 10,
            branch_predictions: 100,
            branch_mispredictions: 25,
            ..Default::default()
        };
        assert!((stats.report(Vec::new()).branch_accuracy - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_report_serializes() {
        let report = SimStats::default().report(vec![FuUtilization {
            unit: "alu0".into(),
            busy_cycles: 3,
            utilization: 0.3,
        }]);
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"stalls_by_cause\""));
        assert!(json.contains("\"alu0\""));
    }
}

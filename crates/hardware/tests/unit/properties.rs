//! Randomized property tests for the leaf components.

use proptest::prelude::*;

use mipsim_core::config::{CacheConfig, Config};
use mipsim_core::core::units::cache::Cache;

use crate::common::TestContext;

proptest! {
    /// A block is resident immediately after any access to it, and access
    /// latency is either the hit latency or at least the miss penalty.
    #[test]
    fn prop_cache_access_installs_block(
        addrs in prop::collection::vec((0u64..4096, any::<bool>()), 1..64)
    ) {
        let mut cache = Cache::new(&CacheConfig {
            size: 256,
            block_size: 16,
            associativity: 2,
            miss_penalty: 10,
        });
        for (addr, is_write) in addrs {
            let access = cache.access(addr, is_write);
            prop_assert!(cache.contains(addr));
            if access.hit {
                prop_assert_eq!(access.latency, Cache::HIT_LATENCY);
            } else {
                prop_assert!(access.latency >= 10);
            }
        }
    }

    /// Cache statistics identity on a real run: hits never exceed accesses,
    /// and the report's derived numbers match the raw counters.
    #[test]
    fn prop_report_identities(seed in 1u32..40) {
        let mut body = String::from("main:\n  li $t0, 0\n");
        for i in 0..seed {
            body.push_str(&format!("  addi $t0, $t0, {}\n", i % 7));
        }
        body.push_str("  li $v0, 10\n  syscall\n");

        let mut ctx = TestContext::new(&body);
        let report = ctx.run();

        prop_assert!(report.icache_hits <= report.icache_accesses);
        prop_assert!(report.dcache_hits <= report.dcache_accesses);
        prop_assert!(report.branch_mispredictions <= report.branch_predictions.max(1));
        let ipc = report.instructions_committed as f64 / report.cycles.max(1) as f64;
        prop_assert!((report.ipc - ipc).abs() < 1e-12);
        prop_assert_eq!(report.instructions_committed, u64::from(seed) + 3);
    }

    /// Committed sums are independent of machine shape: the same reduction
    /// program gives the same architectural answer for any sensible widths.
    #[test]
    fn prop_widths_do_not_change_results(
        fetch in 1usize..4,
        issue in 1usize..4,
        rob in prop::sample::select(vec![8usize, 16, 32]),
    ) {
        let source = "main:\n  li $t0, 0\n  li $t1, 10\nloop:\n  addi $t0, $t0, 1\n  \
                      bne $t0, $t1, loop\n  li $v0, 10\n  syscall\n";
        let mut config = Config::default();
        config.pipeline.fetch_width = fetch;
        config.pipeline.issue_width = issue;
        config.pipeline.commit_width = issue;
        config.pipeline.rob_capacity = rob;

        let mut ctx = TestContext::with_config(source, &config);
        ctx.run();
        prop_assert_eq!(ctx.reg("$t0"), 10);
    }
}

//! Concrete end-to-end scenarios.
//!
//! Whole programs run through the full pipeline, asserting architectural
//! results and the statistics the run must produce.

use pretty_assertions::assert_eq;
use rstest::rstest;

use mipsim_core::config::{Config, PredictorKind};

use crate::common::TestContext;

const EXIT: &str = "  li $v0, 10\n  syscall\n";

#[test]
fn test_tight_raw_chain() {
    let mut ctx = TestContext::new(&format!(
        "main:\n  li $t0, 1\n  addi $t1, $t0, 1\n  addi $t2, $t1, 1\n  addi $t3, $t2, 1\n{EXIT}"
    ));
    let report = ctx.run();

    assert_eq!(ctx.reg("$t3"), 4);
    assert_eq!(report.instructions_committed, 6);
    assert_eq!(report.branch_mispredictions, 0);
    // No branches at all: perfectly predicted by convention.
    assert!((report.branch_accuracy - 1.0).abs() < f64::EPSILON);
}

#[test]
fn test_warmed_gshare_loop_accuracy() {
    // 200 iterations of a backward bne that is taken 199 times. The
    // predictor mispredicts during history warm-up and on the final exit;
    // everything in between should be correct.
    let mut ctx = TestContext::new(&format!(
        "main:\n  li $t0, 0\n  li $t1, 200\nloop:\n  addi $t0, $t0, 1\n  bne $t0, $t1, loop\n{EXIT}"
    ));
    let report = ctx.run();

    assert_eq!(ctx.reg("$t0"), 200);
    assert_eq!(report.branch_predictions, 200);
    assert!(
        report.branch_accuracy >= 0.93,
        "warmed gshare accuracy was {}",
        report.branch_accuracy
    );
}

#[test]
fn test_store_to_load_forwarding() {
    // The div commits late, holding the store in the LSQ while the load's
    // address resolves — the load must take the forwarding path.
    let mut ctx = TestContext::new(&format!(
        "main:\n  li $t0, 42\n  div $t9, $t0, $t0\n  sw $t0, 0($sp)\n  lw $t1, 0($sp)\n{EXIT}"
    ));
    let report = ctx.run();

    assert_eq!(ctx.reg("$t1"), 42);
    // The forwarded load never touches the D-cache; the only access is
    // the commit-time store write.
    assert_eq!(report.dcache_accesses, 1);
    assert_eq!(report.dcache_hits, 0);
}

#[test]
fn test_always_taken_mispredict_squash() {
    let source = "main:\n  li $t0, 0\n  li $t1, 1\n  beq $t0, $t1, over\n  addi $t2, $zero, 7\n  \
                  li $v0, 10\n  syscall\nover:\n  addi $t2, $zero, 99\n  li $v0, 10\n  syscall\n";
    let mut config = Config::default();
    config.branch_predictor.kind = PredictorKind::AlwaysTaken;
    let mut ctx = TestContext::with_config(source, &config);
    let report = ctx.run();

    // The speculatively fetched taken path must leave no architectural trace.
    assert_eq!(ctx.reg("$t2"), 7);
    assert_eq!(report.branch_predictions, 1);
    assert_eq!(report.branch_mispredictions, 1);
    assert_eq!(report.instructions_committed, 6);
    assert_eq!(report.stalls_by_cause.rob_full, 0);
}

#[test]
fn test_cache_miss_stall() {
    let mut ctx = TestContext::new(&format!(
        ".data\nx: .word 5\n.text\nmain:\n  la $t0, x\n  lw $t1, 0($t0)\n{EXIT}"
    ));
    let report = ctx.run();

    assert_eq!(ctx.reg("$t1"), 5);
    assert_eq!(report.dcache_accesses, 1);
    assert_eq!(report.dcache_hits, 0);
    // The cold load misses and occupies the port for the full penalty.
    assert_eq!(
        report.stalls_by_cause.dcache_miss,
        Config::default().cache.d.miss_penalty
    );
}

/// 4x4 matrix times the identity: the result region must equal the input.
#[test]
fn test_identity_matrix_multiply() {
    let source = "\
.data
a:  .word 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16
b:  .word 1, 0, 0, 0, 0, 1, 0, 0, 0, 0, 1, 0, 0, 0, 0, 1
c:  .space 64
.text
main:
  li $s4, 4
  li $s0, 0            # i
iloop:
  li $s1, 0            # j
jloop:
  li $s2, 0            # k
  li $s3, 0            # acc
kloop:
  sll $t0, $s0, 2      # a[i][k]
  add $t0, $t0, $s2
  sll $t0, $t0, 2
  la $t1, a
  add $t0, $t0, $t1
  lw $t2, 0($t0)
  sll $t3, $s2, 2      # b[k][j]
  add $t3, $t3, $s1
  sll $t3, $t3, 2
  la $t4, b
  add $t4, $t3, $t4
  lw $t5, 0($t4)
  mul $t6, $t2, $t5
  add $s3, $s3, $t6
  addi $s2, $s2, 1
  blt $s2, $s4, kloop
  sll $t7, $s0, 2      # c[i][j]
  add $t7, $t7, $s1
  sll $t7, $t7, 2
  la $t8, c
  add $t8, $t7, $t8
  sw $s3, 0($t8)
  addi $s1, $s1, 1
  blt $s1, $s4, jloop
  addi $s0, $s0, 1
  blt $s0, $s4, iloop
  li $v0, 10
  syscall
";
    let mut ctx = TestContext::new(source);
    let report = ctx.run();

    let a = ctx.label("a");
    let c = ctx.label("c");
    for i in 0..16 {
        assert_eq!(
            ctx.read_word(c + i * 4),
            ctx.read_word(a + i * 4),
            "c[{i}] differs from a[{i}]"
        );
    }
    assert!(report.instructions_committed > 0);
    assert!(report.branch_accuracy > 0.5);
}

#[test]
fn test_independent_alu_throughput() {
    // Independent single-cycle ops on a machine wide enough to not be the
    // bottleneck: steady-state IPC approaches the issue width.
    let mut body = String::from("main:\n");
    for i in 0..60 {
        body.push_str(&format!("  addi $t{}, $zero, {}\n", i % 8, i));
    }
    body.push_str(EXIT);

    let mut config = Config::default();
    config.pipeline.rs_capacity_per_class = 16;
    let mut ctx = TestContext::with_config(&body, &config);
    let report = ctx.run();

    assert_eq!(report.instructions_committed, 62);
    assert!(
        report.ipc >= 1.3,
        "independent ALU ops should approach issue width, ipc={}",
        report.ipc
    );
}

#[test]
fn test_dependent_chain_throughput() {
    // A pure RAW chain of unit-latency ops commits about one per cycle.
    let mut body = String::from("main:\n  li $t0, 0\n");
    for _ in 0..40 {
        body.push_str("  addi $t0, $t0, 1\n");
    }
    body.push_str(EXIT);

    let mut ctx = TestContext::new(&body);
    let report = ctx.run();

    assert_eq!(ctx.reg("$t0"), 40);
    assert!(
        report.ipc > 0.75 && report.ipc <= 1.05,
        "dependent unit-latency chain should run near 1 IPC, ipc={}",
        report.ipc
    );
}

#[rstest]
#[case::always_taken(PredictorKind::AlwaysTaken)]
#[case::bimodal(PredictorKind::Bimodal)]
#[case::gshare(PredictorKind::Gshare)]
fn test_architectural_result_independent_of_predictor(#[case] kind: PredictorKind) {
    // Prediction only moves cycles around; the architectural result of a
    // branchy loop must not depend on the predictor variant.
    let source = "main:\n  li $t0, 0\n  li $t1, 0\nloop:\n  addi $t0, $t0, 1\n  \
                  add $t1, $t1, $t0\n  blt $t0, $t2, loop\n  li $v0, 10\n  syscall\n";
    let mut config = Config::default();
    config.branch_predictor.kind = kind;
    let mut ctx = TestContext::with_config(source, &config);

    // $t2 is zero, so the loop body runs exactly once.
    ctx.run();
    assert_eq!(ctx.reg("$t0"), 1);
    assert_eq!(ctx.reg("$t1"), 1);
}

#[rstest]
#[case::narrow(1, 1)]
#[case::default(2, 2)]
#[case::wide(4, 4)]
fn test_widths_preserve_semantics(#[case] fetch: usize, #[case] issue: usize) {
    let mut config = Config::default();
    config.pipeline.fetch_width = fetch;
    config.pipeline.issue_width = issue;
    config.pipeline.commit_width = issue;

    let mut ctx = TestContext::with_config(
        &format!("main:\n  li $t0, 6\n  li $t1, 7\n  mul $t2, $t0, $t1\n{EXIT}"),
        &config,
    );
    ctx.run();
    assert_eq!(ctx.reg("$t2"), 42);
}

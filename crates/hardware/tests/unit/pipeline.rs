//! Pipeline behavior: fault surfacing, squash completeness, limits,
//! determinism, and calls/returns.

use pretty_assertions::assert_eq;

use mipsim_core::common::error::Fault;
use mipsim_core::config::Config;
use mipsim_core::SimError;

use crate::common::TestContext;

const EXIT: &str = "  li $v0, 10\n  syscall\n";

#[test]
fn test_overflow_surfaces_at_commit() {
    let mut ctx = TestContext::new(&format!(
        "main:\n  li $t0, 0x7fffffff\n  addi $t1, $t0, 1\n{EXIT}"
    ));
    let err = ctx.run_expect_err();

    match err {
        SimError::Fault { pc, seq, fault } => {
            assert_eq!(fault, Fault::Overflow);
            assert_eq!(pc, 0x0040_0004);
            assert_eq!(seq, 2);
        }
        other => panic!("expected overflow fault, got {other}"),
    }
}

#[test]
fn test_divide_by_zero_surfaces_at_commit() {
    let mut ctx = TestContext::new(&format!(
        "main:\n  li $t0, 5\n  li $t1, 0\n  div $t2, $t0, $t1\n{EXIT}"
    ));
    match ctx.run_expect_err() {
        SimError::Fault { fault, .. } => assert_eq!(fault, Fault::DivideByZero),
        other => panic!("expected divide fault, got {other}"),
    }
}

#[test]
fn test_load_out_of_bounds() {
    let mut ctx = TestContext::new(&format!("main:\n  li $t0, 0x100\n  lw $t1, 0($t0)\n{EXIT}"));
    match ctx.run_expect_err() {
        SimError::Fault { fault, .. } => {
            assert_eq!(fault, Fault::LoadOutOfBounds { addr: 0x100 });
        }
        other => panic!("expected load fault, got {other}"),
    }
}

#[test]
fn test_store_out_of_bounds() {
    let mut ctx = TestContext::new(&format!("main:\n  sw $t0, 16($zero)\n{EXIT}"));
    match ctx.run_expect_err() {
        SimError::Fault { fault, .. } => {
            assert_eq!(fault, Fault::StoreOutOfBounds { addr: 16 });
        }
        other => panic!("expected store fault, got {other}"),
    }
}

#[test]
fn test_squashed_fault_never_surfaces() {
    // The default gshare predicts the forward branch not-taken, so the
    // out-of-bounds load executes speculatively — and is squashed when the
    // branch resolves taken. A fault on the wrong path must not be seen.
    let mut ctx = TestContext::new(&format!(
        "main:\n  beq $zero, $zero, skip\n  lw $t1, 16($zero)\nskip:\n{EXIT}"
    ));
    let report = ctx.run();

    assert_eq!(report.branch_mispredictions, 1);
    // Only main's four real instructions commit.
    assert_eq!(report.instructions_committed, 3);
}

#[test]
fn test_cycle_limit_stops_infinite_loop() {
    let mut config = Config::default();
    config.simulation.max_cycles = 500;
    let mut ctx = TestContext::with_config("main:\nloop:\n  j loop\n", &config);
    let report = ctx.run();

    assert_eq!(report.cycles, 500);
    assert!(report.instructions_committed > 0);
}

#[test]
fn test_fall_off_end_terminates() {
    // No exit syscall: once the pipeline drains past the last instruction
    // the run ends instead of idling to the cycle limit.
    let mut ctx = TestContext::new("main:\n  li $t0, 3\n  addi $t0, $t0, 4\n");
    let report = ctx.run();

    assert_eq!(ctx.reg("$t0"), 7);
    assert!(report.cycles < 100);
}

#[test]
fn test_deterministic_replay() {
    let source = "main:\n  li $t0, 0\n  li $t1, 50\nloop:\n  addi $t0, $t0, 1\n  \
                  bne $t0, $t1, loop\n  li $v0, 10\n  syscall\n";
    let first = TestContext::new(source).run();
    let second = TestContext::new(source).run();
    assert_eq!(first, second);
}

#[test]
fn test_call_and_return() {
    let mut ctx = TestContext::new(&format!(
        "main:\n  jal func\n  addi $t1, $t0, 1\n{EXIT}func:\n  li $t0, 55\n  jr $ra\n"
    ));
    let report = ctx.run();

    assert_eq!(ctx.reg("$t0"), 55);
    assert_eq!(ctx.reg("$t1"), 56);
    assert_eq!(ctx.reg("$ra"), 0x0040_0004);
    // The first `jr` misses the BTB and resolves as a misprediction.
    assert!(report.branch_mispredictions >= 1);
}

#[test]
fn test_wrong_path_store_never_writes_memory() {
    // A speculative store on the wrong path must not reach memory.
    let mut ctx = TestContext::new(&format!(
        ".data\nx: .word 1111\n.text\nmain:\n  la $t0, x\n  beq $zero, $zero, skip\n  \
         li $t1, 2222\n  sw $t1, 0($t0)\nskip:\n  lw $t2, 0($t0)\n{EXIT}"
    ));
    ctx.run();

    assert_eq!(ctx.reg("$t2"), 1111);
    let x = ctx.label("x");
    assert_eq!(ctx.read_word(x), 1111);
}

#[test]
fn test_raw_hazard_stalls_counted() {
    // A long-latency producer starves its dependent's class.
    let mut ctx = TestContext::new(&format!(
        "main:\n  li $t0, 9\n  li $t1, 3\n  div $t2, $t0, $t1\n  addi $t3, $t2, 1\n{EXIT}"
    ));
    let report = ctx.run();

    assert_eq!(ctx.reg("$t2"), 3);
    assert_eq!(ctx.reg("$t3"), 4);
    assert!(report.stalls_by_cause.raw_hazard > 0);
}

#[test]
fn test_rob_full_backpressure_counted() {
    // A tiny ROB behind a long D-cache miss forces decode to stall on
    // allocation.
    let mut config = Config::default();
    config.pipeline.rob_capacity = 4;
    config.cache.d.miss_penalty = 40;
    let mut body = String::from(".data\nx: .word 1\n.text\nmain:\n  la $t0, x\n  lw $t1, 0($t0)\n");
    for i in 0..8 {
        body.push_str(&format!("  addi $t2, $zero, {i}\n"));
    }
    body.push_str(EXIT);
    let mut ctx = TestContext::with_config(&body, &config);
    let report = ctx.run();

    assert!(report.stalls_by_cause.rob_full > 0);
    assert_eq!(report.stalls_by_cause.dcache_miss, 40);
}

#[test]
fn test_fu_utilization_reported() {
    let mut ctx = TestContext::new(&format!("main:\n  li $t0, 2\n  mul $t1, $t0, $t0\n{EXIT}"));
    let report = ctx.run();

    let names: Vec<&str> = report
        .fu_utilization
        .iter()
        .map(|f| f.unit.as_str())
        .collect();
    assert!(names.contains(&"alu0"));
    assert!(names.contains(&"fpu0"));
    assert!(names.contains(&"lsu0"));
    let fpu = report
        .fu_utilization
        .iter()
        .find(|f| f.unit == "fpu0")
        .unwrap();
    // One mul at the default FPU latency.
    assert_eq!(fpu.busy_cycles, 4);
}

#[test]
fn test_icache_stats_accumulate() {
    let mut ctx = TestContext::new(&format!("main:\n  li $t0, 1\n{EXIT}"));
    let report = ctx.run();

    assert!(report.icache_accesses >= 3);
    assert!(report.icache_hits <= report.icache_accesses);
    // Identity: every access is a hit or a miss.
    let misses = report.icache_accesses - report.icache_hits;
    assert!(misses >= 1); // at least the cold first line
}

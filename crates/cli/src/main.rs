//! Cycle-accurate superscalar MIPS-subset simulator CLI.
//!
//! Loads an assembly program (and optionally a JSON configuration), runs
//! it to the exit syscall or the cycle limit, and prints the statistics
//! table — or the full structured report as JSON with `--json`.

use clap::Parser;
use std::{fs, process};

use mipsim_core::{Config, Simulator};

#[derive(Parser, Debug)]
#[command(
    name = "mipsim",
    version,
    about = "Cycle-accurate superscalar out-of-order MIPS-subset simulator",
    long_about = "Assembles a MIPS-like program and simulates it cycle by cycle on a \
superscalar out-of-order core.\n\nExamples:\n  mipsim program.s\n  mipsim program.s --config core.json --json\n  mipsim program.s --trace --max-cycles 100000"
)]
struct Cli {
    /// Assembly program to simulate.
    program: String,

    /// JSON configuration file (defaults apply when omitted).
    #[arg(short, long)]
    config: Option<String>,

    /// Emit the report as JSON instead of the statistics table.
    #[arg(long)]
    json: bool,

    /// Print per-stage trace lines to stderr.
    #[arg(long)]
    trace: bool,

    /// Override the configured cycle limit.
    #[arg(long)]
    max_cycles: Option<u64>,
}

fn main() {
    let cli = Cli::parse();

    let mut config = match cli.config {
        Some(path) => match fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<Config>(&text) {
                Ok(config) => config,
                Err(e) => fail(&format!("bad config '{path}': {e}")),
            },
            Err(e) => fail(&format!("could not read config '{path}': {e}")),
        },
        None => Config::default(),
    };
    if let Some(limit) = cli.max_cycles {
        config.simulation.max_cycles = limit;
    }

    let source = match fs::read_to_string(&cli.program) {
        Ok(source) => source,
        Err(e) => fail(&format!("could not read '{}': {e}", cli.program)),
    };

    let mut sim = match Simulator::from_source(&source, &config) {
        Ok(sim) => sim,
        Err(e) => fail(&e.to_string()),
    };
    sim.set_trace(cli.trace);

    match sim.run() {
        Ok(report) => {
            if cli.json {
                match serde_json::to_string_pretty(&report) {
                    Ok(json) => println!("{json}"),
                    Err(e) => fail(&format!("report serialization failed: {e}")),
                }
            } else {
                report.print();
            }
        }
        Err(e) => {
            // Partial statistics still help diagnose the failing run.
            sim.report().print();
            fail(&e.to_string());
        }
    }
}

fn fail(msg: &str) -> ! {
    eprintln!("mipsim: {msg}");
    process::exit(1);
}

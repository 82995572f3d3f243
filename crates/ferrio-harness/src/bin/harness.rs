//! Conformance runner CLI.
//!
//! ```text
//! harness run               # run every scenario, JSONL to stdout
//! harness run -f async      # substring filter
//! harness run --log out.jsonl
//! harness list
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use ferrio_harness::structured_log::LogEmitter;
use ferrio_harness::{Runner, scenarios};

#[derive(Parser)]
#[command(name = "harness", about = "ferrio conformance harness")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Execute conformance scenarios.
    Run {
        /// Substring filter on scenario names.
        #[arg(short, long, default_value = "")]
        filter: String,
        /// Write JSONL log to a file instead of stdout.
        #[arg(long)]
        log: Option<PathBuf>,
        /// Campaign tag recorded in every log entry.
        #[arg(long, default_value = "conformance")]
        campaign: String,
    },
    /// List scenario names and contract areas.
    List,
}

fn main() -> ExitCode {
    match Cli::parse().command {
        Command::List => {
            for s in scenarios() {
                println!("{:<40} {}", s.name, s.contract);
            }
            ExitCode::SUCCESS
        }
        Command::Run {
            filter,
            log,
            campaign,
        } => {
            let mut emitter = match log {
                Some(path) => match LogEmitter::file(&path) {
                    Ok(e) => e,
                    Err(e) => {
                        eprintln!("harness: {e}");
                        return ExitCode::FAILURE;
                    }
                },
                None => LogEmitter::Stdout,
            };
            match Runner::new(campaign).run(&scenarios(), &filter, &mut emitter) {
                Ok(results) => {
                    let failed = results.iter().filter(|r| !r.passed).count();
                    eprintln!(
                        "harness: {} scenarios, {} failed",
                        results.len(),
                        failed
                    );
                    if failed == 0 {
                        ExitCode::SUCCESS
                    } else {
                        ExitCode::FAILURE
                    }
                }
                Err(e) => {
                    eprintln!("harness: {e}");
                    ExitCode::FAILURE
                }
            }
        }
    }
}

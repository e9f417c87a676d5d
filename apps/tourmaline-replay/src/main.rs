//! # Tourmaline Replay
//!
//! Drives a [`DeltaTracker`] from a JSON mutation script (see [`script`]) or
//! an interactive prompt and prints the change blocks an observer would
//! replay.
//!
//! ```text
//! units   _XX+__          _ unchanged  + inserted  U updated  X deleted
//! DELETE    1..3    old=?
//! INSERT    1..2    new="N"
//! ```

mod render;
mod script;

use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use colored::*;
use serde_json::Value;
use tml_delta::{DeltaTracker, TrackerConfig};
use tracing_subscriber::EnvFilter;

use render::{header, section, show_tracker, step, warning};
use script::{Script, ScriptError, ScriptOp};

// ─── CLI ───────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "tourmaline-replay")]
#[command(about = "Replay list mutations through a delta tracker")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a JSON mutation script and print the resulting change blocks
    Run {
        /// Path to the script
        script: PathBuf,
        /// Print the change blocks as JSON instead of a table
        #[arg(long)]
        json: bool,
        /// Print the tracker state after every op
        #[arg(long)]
        trace: bool,
    },
    /// Walk through a delete followed by an insert at the same index
    Demo,
    /// Interactive prompt for manual experimentation
    Interactive {
        /// Let deletes cancel inserts from the same batch
        #[arg(long)]
        allow_contradictions: bool,
        /// Let repeated updates overwrite the reported old value
        #[arg(long)]
        most_recent: bool,
    },
}

// ─── Run ───────────────────────────────────────────────────────────────────

fn run_script(path: PathBuf, json: bool, trace: bool) -> Result<(), ScriptError> {
    let script = Script::load(&path)?;

    let tracker = if trace {
        let mut tracker = script.tracker();
        for (index, op) in script.ops.iter().enumerate() {
            op.apply(&mut tracker).map_err(|source| ScriptError::Op {
                step: index,
                op: op.name(),
                source,
            })?;
            step(&format!("{:>3} {:<14} {}", index, op.name(), render::units(&tracker)));
        }
        tracker
    } else {
        script.run()?
    };

    if json {
        let blocks: Vec<_> = tracker.blocks().collect();
        println!("{}", serde_json::to_string_pretty(&blocks)?);
    } else {
        header(&format!("REPLAY — {}", path.display()));
        show_tracker(&tracker);
    }
    Ok(())
}

// ─── Demo ──────────────────────────────────────────────────────────────────

fn run_demo() -> Result<(), ScriptError> {
    header("DEMO — Delete and Insert at the Same Index");

    section("Phase 1: Start a batch over five elements");
    let mut tracker: DeltaTracker<Value> = DeltaTracker::new();
    tracker.reset(5);
    step("reset(5)");
    show_tracker(&tracker);

    section("Phase 2: Remove two elements, insert one in their place");
    let ops = [
        ScriptOp::TargetDelete { start: 1, end: 3, old_value: None },
        ScriptOp::TargetInsert { start: 1, end: 2, new_value: Some(Value::from("N")) },
    ];
    for (index, op) in ops.iter().enumerate() {
        op.apply(&mut tracker).map_err(|source| ScriptError::Op {
            step: index,
            op: op.name(),
            source,
        })?;
        step(&format!("{:<14} {}", op.name(), render::units(&tracker)));
    }
    show_tracker(&tracker);

    section("Phase 3: Index conversion");
    for index in 0..tracker.target_size() {
        let source = tracker.target_to_source(index)?;
        step(&format!("target {} → source {}", index, source));
    }
    Ok(())
}

// ─── Interactive ───────────────────────────────────────────────────────────

fn print_help() {
    println!();
    println!("  {}", "Commands:".bold().underline());
    let rows = [
        ("reset <n>", "Start a batch over n unchanged elements"),
        ("ins <start> <end> [v]", "Record target insert"),
        ("upd <start> <end> [old] [new]", "Record target update"),
        ("del <start> <end> [old]", "Record target delete"),
        ("src+ <i>", "Source gained an element"),
        ("src- <i>", "Source lost an element"),
        ("revert <i>", "Forget the change at source index i"),
        ("t2s <i> | s2t <i>", "Convert an index"),
        ("show", "Show the tracker"),
        ("json", "Print the change blocks as JSON"),
        ("quit", "Exit"),
    ];
    for (command, description) in rows {
        println!("    {:<32} {}", command.bright_cyan(), description);
    }
    println!();
}

fn parse_value(text: Option<&&str>) -> Option<Value> {
    text.map(|text| serde_json::from_str(text).unwrap_or_else(|_| Value::from(*text)))
}

fn parse_index(parts: &[&str], at: usize) -> Option<usize> {
    parts.get(at).and_then(|s| s.parse().ok())
}

fn run_interactive(config: TrackerConfig) -> Result<(), ScriptError> {
    header("INTERACTIVE — Tourmaline Delta Tracker");
    print_help();

    let mut tracker: DeltaTracker<Value> = DeltaTracker::with_config(config);

    loop {
        print!("{}", "tourmaline> ".bright_cyan().bold());
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let parts: Vec<&str> = input.split_whitespace().collect();
        let Some(&command) = parts.first() else {
            continue;
        };

        let range = (parse_index(&parts, 1), parse_index(&parts, 2));
        let outcome = match (command, range) {
            ("quit" | "exit" | "q", _) => break,
            ("help" | "h", _) => {
                print_help();
                continue;
            }
            ("show" | "s", _) => {
                show_tracker(&tracker);
                continue;
            }
            ("json", _) => {
                let blocks: Vec<_> = tracker.blocks().collect();
                println!("{}", serde_json::to_string_pretty(&blocks)?);
                continue;
            }
            ("reset", (Some(size), _)) => {
                tracker.reset(size);
                Ok(())
            }
            ("ins", (Some(start), Some(end))) => {
                tracker.target_insert(start, end, parse_value(parts.get(3)))
            }
            ("upd", (Some(start), Some(end))) => tracker.target_update(
                start,
                end,
                parse_value(parts.get(3)),
                parse_value(parts.get(4)),
            ),
            ("del", (Some(start), Some(end))) => {
                tracker.target_delete(start, end, parse_value(parts.get(3)))
            }
            ("src+", (Some(index), _)) => tracker.source_insert(index),
            ("src-", (Some(index), _)) => tracker.source_delete(index),
            ("revert", (Some(index), _)) => tracker.source_revert(index),
            ("t2s", (Some(index), _)) => tracker.target_to_source(index).map(|source| {
                step(&format!("target {} → source {}", index, source));
            }),
            ("s2t", (Some(index), _)) => tracker.source_to_target(index).map(|target| {
                step(&format!("source {} → target {}", index, target));
            }),
            (other, _) => {
                warning(&format!("Bad or incomplete command '{}' — type 'help'", other));
                continue;
            }
        };

        match outcome {
            Ok(()) => step(&render::units(&tracker)),
            Err(err) => warning(&err.to_string()),
        }
    }
    Ok(())
}

// ─── Entry point ───────────────────────────────────────────────────────────

fn main() {
    let log_level = std::env::var("TOURMALINE_LOG").unwrap_or_else(|_| "warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level)),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { script, json, trace } => run_script(script, json, trace),
        Commands::Demo => run_demo(),
        Commands::Interactive {
            allow_contradictions,
            most_recent,
        } => run_interactive(
            TrackerConfig::default()
                .with_contradicting_events(allow_contradictions)
                .with_most_recent_value(most_recent),
        ),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        let exit_code = match e {
            ScriptError::Io(_) => 3,
            ScriptError::Parse(_) => 4,
            ScriptError::Op { .. } | ScriptError::Tracker(_) => 5,
        };
        process::exit(exit_code);
    }
}

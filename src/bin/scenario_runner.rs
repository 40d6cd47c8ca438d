//! Headless Scenario Runner
//!
//! Replays a JSON-lines script of bridge commands against a fresh ship and
//! prints every result and the events it produced as JSON lines.

use std::fs;
use std::io::{self, BufRead};
use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;

use starship_bridge::command::{BridgeCommand, CommandResult};
use starship_bridge::core::ShipConfig;
use starship_bridge::ship::{ShipEvent, StarChart, StarshipCore};

/// Headless Scenario Runner - scripted bridge sessions
#[derive(Parser, Debug)]
#[command(name = "scenario_runner")]
#[command(about = "Run a JSON-lines command script and print results as JSON lines")]
struct Args {
    /// Script file, one JSON command (or shorthand line) per line; stdin when omitted
    #[arg(long)]
    script: Option<PathBuf>,

    /// Ship configuration (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seconds of simulated time per tick
    #[arg(long, default_value_t = 0.1)]
    tick: f32,

    /// Ticks to run after each command
    #[arg(long, default_value_t = 10)]
    ticks_between: u32,

    /// Include the full ship status after the script
    #[arg(long)]
    final_status: bool,
}

/// One JSON output line per script line
#[derive(Serialize)]
struct StepOutput<'a> {
    line: usize,
    clock: f64,
    command: &'a str,
    result: CommandResult,
    events: Vec<ShipEvent>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "starship_bridge=warn".into()),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match ShipConfig::load(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to load config {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => ShipConfig::default(),
    };

    let lines: Vec<String> = match &args.script {
        Some(path) => match fs::read_to_string(path) {
            Ok(text) => text.lines().map(str::to_string).collect(),
            Err(e) => {
                eprintln!("Failed to read script {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => io::stdin().lock().lines().map_while(|l| l.ok()).collect(),
    };

    let mut core = match StarshipCore::with_standard_departments(config, StarChart::sol_system()) {
        Ok(core) => core,
        Err(e) => {
            eprintln!("Failed to build ship: {}", e);
            std::process::exit(1);
        }
    };

    for (idx, raw) in lines.iter().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parsed = if line.starts_with('{') {
            BridgeCommand::from_json(line)
        } else {
            BridgeCommand::from_shorthand(line)
        };
        let result = match parsed {
            Ok(cmd) => core.route_command(&cmd),
            Err(e) => CommandResult::from(e),
        };

        for _ in 0..args.ticks_between {
            core.tick(args.tick);
        }

        let output = StepOutput {
            line: idx + 1,
            clock: core.now(),
            command: line,
            result,
            events: core.drain_events(),
        };
        match serde_json::to_string(&output) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Failed to serialize step {}: {}", idx + 1, e),
        }
    }

    if args.final_status {
        match serde_json::to_string(&core.full_status()) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Failed to serialize status: {}", e),
        }
    }
}

//! Starship Bridge - Entry Point
//!
//! Interactive bridge console. Loads a ship configuration, charts the Sol
//! system, and reads commands from stdin: simulation control words, raw
//! JSON bridge commands, or `<department> <intent> key=value` shorthand.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;

use starship_bridge::command::{BridgeCommand, CommandResult};
use starship_bridge::core::error::Result;
use starship_bridge::core::ShipConfig;
use starship_bridge::departments::engineering::preset_names;
use starship_bridge::ship::{StarChart, StarshipCore};

/// Interactive starship bridge console
#[derive(Parser, Debug)]
#[command(name = "starship-bridge")]
#[command(about = "Drive the starship simulation core from the terminal")]
struct Args {
    /// Ship configuration (TOML); defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seconds of simulated time per tick
    #[arg(long, default_value_t = 0.1)]
    tick: f32,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "starship_bridge=info".into()),
        )
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => ShipConfig::load(path)?,
        None => ShipConfig::default(),
    };

    tracing::info!("Starship Bridge starting...");
    let mut core = StarshipCore::with_standard_departments(config, StarChart::sol_system())?;

    println!("\n=== STARSHIP BRIDGE ===");
    println!();
    println!("Commands:");
    println!("  tick / t                 - Advance simulation by one tick ({}s)", args.tick);
    println!("  run <n>                  - Run n ticks");
    println!("  status / s               - Full ship status");
    println!("  events / e               - Show and clear pending events");
    println!("  quit / q                 - Leave the bridge");
    println!("  {{\"department\": ...}}     - Raw JSON bridge command");
    println!("  <dept> <intent> [k=v]    - Shorthand, e.g. 'helm navigate target=jupiter warp=6'");
    println!("  Power presets: {}", preset_names().join(", "));
    println!();

    loop {
        display_status(&core);

        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input == "quit" || input == "q" {
            break;
        }

        if input == "tick" || input == "t" {
            core.tick(args.tick);
            print_events(&mut core);
            continue;
        }

        if input == "status" || input == "s" {
            println!("{}", serde_json::to_string_pretty(&core.full_status())?);
            continue;
        }

        if input == "events" || input == "e" {
            print_events(&mut core);
            continue;
        }

        if let Some(n) = input.strip_prefix("run ") {
            match n.trim().parse::<u32>() {
                Ok(n) => {
                    for _ in 0..n {
                        core.tick(args.tick);
                    }
                    println!("Ran {} ticks. Clock: {:.1}s", n, core.now());
                    print_events(&mut core);
                }
                Err(_) => println!("Usage: run <number>"),
            }
            continue;
        }

        let parsed = if input.starts_with('{') {
            BridgeCommand::from_json(input)
        } else {
            BridgeCommand::from_shorthand(input)
        };

        match parsed {
            Ok(cmd) => {
                let result = core.route_command(&cmd);
                print_result(&result);
                print_events(&mut core);
            }
            Err(e) => println!("Could not parse command: {}", e),
        }
    }

    println!("\nBridge secured at t = {:.1}s.", core.now());
    Ok(())
}

fn display_status(core: &StarshipCore) {
    let warp = core.warp().state();
    let body = core.body();
    let dist = core.distribution();
    println!();
    println!(
        "--- t={:.1}s | Alert: {} | {} (warp {:.2}) | Impulse {:.0}% | Heading {:03.0} ---",
        core.now(),
        core.alert(),
        warp.mode.name(),
        warp.current_factor,
        body.impulse_percent(),
        body.yaw,
    );
    println!("  Power: {}", dist);
    println!(
        "  Position: ({:.0}, {:.0}, {:.0})  Speed: {:.0}",
        body.position.x,
        body.position.y,
        body.position.z,
        body.speed()
    );
}

fn print_result(result: &CommandResult) {
    let mark = if result.success { "OK" } else { "FAILED" };
    println!("[{}] {}", mark, result.message);
    if !result.data.is_empty() {
        if let Ok(json) = serde_json::to_string(&result.data) {
            println!("  {}", json);
        }
    }
}

fn print_events(core: &mut StarshipCore) {
    for event in core.drain_events() {
        match serde_json::to_string(&event) {
            Ok(json) => println!("  * {}", json),
            Err(e) => tracing::warn!("Could not serialize event: {}", e),
        }
    }
}

//! Host driver for the history engine: runs a generation to completion and
//! prints the results. The engine itself has no CLI surface; this binary is
//! the host-side collaborator.

use std::env;

use contracts::RunConfig;
use engine_core::HistoryWorld;

fn print_usage() {
    println!("engine-cli <command>");
    println!("commands:");
    println!("  status");
    println!("  simulate <run_id> <seed> [epochs]");
    println!("    runs a deterministic generation and prints a summary");
    println!("  snapshot <run_id> <seed> [epochs]");
    println!("    runs a deterministic generation and prints the snapshot json");
    println!("  events <run_id> <seed> [epochs]");
    println!("    runs a deterministic generation and prints the event log");
}

fn parse_seed(value: Option<&String>) -> Result<u64, String> {
    let raw = value.ok_or_else(|| "missing seed".to_string())?;
    raw.parse::<u64>()
        .map_err(|_| format!("invalid seed: {raw}"))
}

fn parse_epochs(value: Option<&String>, fallback: u32) -> Result<u32, String> {
    value
        .map(|raw| {
            raw.parse::<u32>()
                .map_err(|_| format!("invalid epochs: {raw}"))
        })
        .transpose()
        .map(|parsed| parsed.unwrap_or(fallback))
}

fn config_from_args(args: &[String]) -> Result<RunConfig, String> {
    let run_id = args.get(2).cloned().ok_or_else(|| "missing run_id".to_string())?;
    let seed = parse_seed(args.get(3))?;
    let mut config = RunConfig::default();
    config.epochs = parse_epochs(args.get(4), config.epochs)?;
    config.run_id = run_id;
    config.seed = seed;
    Ok(config)
}

fn run_world(config: RunConfig) -> Result<(HistoryWorld, contracts::Snapshot), String> {
    let mut world = HistoryWorld::new(config);
    let snapshot = world
        .run()
        .map_err(|err| format!("structural corruption aborted the run: {err}"))?;
    Ok((world, snapshot))
}

fn run_simulate(args: &[String]) -> Result<(), String> {
    let config = config_from_args(args)?;
    let (world, snapshot) = run_world(config)?;
    println!(
        "simulated run_id={} seed={} epochs={} tick={} entities={} relationships={} \
         diagnostics={} state_hash={}",
        world.run_id(),
        world.config().seed,
        snapshot.epoch,
        snapshot.tick,
        snapshot.entities.len(),
        snapshot.relationships.len(),
        world.diagnostics().len(),
        snapshot.state_hash
    );
    Ok(())
}

fn run_snapshot(args: &[String]) -> Result<(), String> {
    let config = config_from_args(args)?;
    let (_world, snapshot) = run_world(config)?;
    let encoded = serde_json::to_string_pretty(&snapshot)
        .map_err(|err| format!("could not encode snapshot: {err}"))?;
    println!("{encoded}");
    Ok(())
}

fn run_events(args: &[String]) -> Result<(), String> {
    let config = config_from_args(args)?;
    let (world, _snapshot) = run_world(config)?;
    for event in world.events() {
        println!(
            "{:>5}.{:<3} {:?}: {}",
            event.tick, event.sequence_in_tick, event.event_type, event.description
        );
    }
    Ok(())
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str);

    let outcome = match command {
        Some("status") => {
            let world = HistoryWorld::new(RunConfig::default());
            println!("{}", world.status());
            Ok(())
        }
        Some("simulate") => run_simulate(&args),
        Some("snapshot") => run_snapshot(&args),
        Some("events") => run_events(&args),
        _ => {
            print_usage();
            Ok(())
        }
    };

    if let Err(err) = outcome {
        eprintln!("error: {err}");
        print_usage();
        std::process::exit(2);
    }
}

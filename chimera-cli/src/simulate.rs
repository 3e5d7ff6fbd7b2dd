//! Simulate command - autoplay one scenario
//!
//! - Level 1: run() - orchestration
//! - Level 2: load_scenario(), play(), report()
//! - Level 3: formatting

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use chimera_core::{Allegiance, MatchConfig, Outcome, Scenario, TurnEngine};

// ============================================================================
// COMMAND ARGUMENTS
// ============================================================================

#[derive(Args)]
pub struct SimulateArgs {
    /// Scenario JSON file (built-in skirmish if omitted)
    #[arg(long, value_name = "FILE")]
    pub scenario: Option<PathBuf>,

    /// Seed for shuffling the turn order (random if omitted)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Give up after this many turns
    #[arg(long, default_value = "500")]
    pub max_turns: u32,

    /// Output a JSON summary
    #[arg(long)]
    pub json: bool,
}

/// What the report shows about a finished (or abandoned) match
#[derive(Serialize)]
struct Summary {
    scenario: String,
    seed: Option<u64>,
    outcome: Option<Outcome>,
    turns: u32,
    survivors: Vec<Survivor>,
    log: Vec<String>,
}

#[derive(Serialize)]
struct Survivor {
    name: String,
    allegiance: Allegiance,
    health: i32,
    col: i32,
    row: i32,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

pub fn run(args: SimulateArgs) -> Result<()> {
    let scenario = load_scenario(&args)?;
    let config = match_config(&args);

    tracing::info!(
        "simulating {} (seed {:?}, max {} turns)",
        scenario.name,
        config.shuffle_seed,
        args.max_turns
    );
    let engine = play(&scenario, &config)?;

    report(&summarize(&scenario, &config, &engine), args.json)
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Turn order is always shuffled; without `--seed` the seed is drawn fresh
fn match_config(args: &SimulateArgs) -> MatchConfig {
    let seed = args.seed.unwrap_or_else(rand::random);
    MatchConfig::default()
        .with_max_turns(args.max_turns)
        .with_seed(seed)
}

fn load_scenario(args: &SimulateArgs) -> Result<Scenario> {
    match &args.scenario {
        Some(path) => Scenario::load(path),
        None => Ok(Scenario::default()),
    }
}

fn play(scenario: &Scenario, config: &MatchConfig) -> Result<TurnEngine> {
    let mut engine = scenario
        .build(config)
        .with_context(|| format!("building scenario {}", scenario.name))?;
    engine.autoplay().context("simulation failed")?;
    Ok(engine)
}

fn report(summary: &Summary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
    } else {
        print_text(summary);
    }
    Ok(())
}

// ============================================================================
// LEVEL 3 - FORMATTING
// ============================================================================

fn summarize(scenario: &Scenario, config: &MatchConfig, engine: &TurnEngine) -> Summary {
    Summary {
        scenario: scenario.name.clone(),
        seed: config.shuffle_seed,
        outcome: engine.outcome(),
        turns: engine.turns(),
        survivors: engine
            .units()
            .map(|u| Survivor {
                name: u.name.clone(),
                allegiance: u.allegiance,
                health: u.current_health(),
                col: u.tile.col,
                row: u.tile.row,
            })
            .collect(),
        log: engine.log().lines().map(str::to_string).collect(),
    }
}

fn print_text(summary: &Summary) {
    println!("\n=== {} ===", summary.scenario);
    match summary.outcome {
        Some(Outcome::Victory) => println!("Result: victory"),
        Some(Outcome::Defeat) => println!("Result: defeat"),
        None => println!("Result: undecided"),
    }
    println!("Turns:  {}", summary.turns);
    if let Some(seed) = summary.seed {
        println!("Seed:   {}", seed);
    }

    println!("\nSurvivors:");
    for s in &summary.survivors {
        println!(
            "  {:<10} {:?} hp={} at ({}, {})",
            s.name, s.allegiance, s.health, s.col, s.row
        );
    }

    println!("\nLog:");
    for line in &summary.log {
        println!("  {}", line);
    }
}

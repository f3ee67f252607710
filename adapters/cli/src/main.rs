#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a Warbound battle over JSON lines.
//!
//! Events are written to stdout, one JSON object per line; intents are read
//! from stdin in the same shape. Cpu players are driven automatically
//! between human intents. Diagnostics go to stderr via `RUST_LOG`.

mod demo;

use std::fs;
use std::io::{self, BufRead, Write as _};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::de::DeserializeOwned;
use tracing_subscriber::EnvFilter;

use warbound_core::{Command, Event, PlayerKind};
use warbound_system_ai::next_command;
use warbound_world::setup::{Preferences, Scenario};
use warbound_world::{apply, query, Battle};

/// Upper bound of commands one cpu turn may issue before the adapter gives
/// up on it.
const CPU_COMMAND_BUDGET: usize = 256;

/// Runs a Warbound battle over stdin/stdout JSON lines.
#[derive(Debug, Parser)]
#[command(name = "warbound", version, about = "Turn-based tactics rules engine")]
struct Args {
    /// Path to a scenario JSON file; the built-in skirmish when omitted.
    #[arg(long)]
    scenario: Option<PathBuf>,
    /// Path to a preferences JSON file; human versus cpu when omitted.
    #[arg(long)]
    preferences: Option<PathBuf>,
    /// Overrides the RNG seed of the preferences.
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();
    let args = Args::parse();

    let scenario: Scenario = match &args.scenario {
        Some(path) => read_json(path)?,
        None => demo::scenario(),
    };
    let mut preferences: Preferences = match &args.preferences {
        Some(path) => read_json(path)?,
        None => demo::preferences(),
    };
    if let Some(seed) = args.seed {
        preferences.seed = seed;
    }

    let (mut battle, events) = Battle::start(&scenario, &preferences)?;
    emit(&events)?;
    pump_cpu(&mut battle)?;

    for line in io::stdin().lock().lines() {
        let line = line.context("reading intent")?;
        if line.trim().is_empty() {
            continue;
        }
        let command: Command = match serde_json::from_str(&line) {
            Ok(command) => command,
            Err(error) => {
                tracing::warn!(%error, "malformed intent line");
                continue;
            }
        };
        let mut events = Vec::new();
        match apply(&mut battle, command, &mut events) {
            Ok(()) => emit(&events)?,
            Err(error) => tracing::warn!(%error, "intent rejected"),
        }
        pump_cpu(&mut battle)?;
        if let Some(team) = query::winner_team(&battle) {
            tracing::info!(team, "battle decided");
            break;
        }
    }
    Ok(())
}

/// Plays cpu turns until a human is active again or the battle is decided.
fn pump_cpu(battle: &mut Battle) -> Result<()> {
    for _ in 0..CPU_COMMAND_BUDGET {
        if query::winner_team(battle).is_some() {
            return Ok(());
        }
        let Some(player) = query::active_player(battle) else {
            return Ok(());
        };
        if player.kind != PlayerKind::Cpu {
            return Ok(());
        }
        let command = next_command(battle).unwrap_or(Command::EndTurn);
        let mut events = Vec::new();
        apply(battle, command, &mut events)
            .map_err(|error| anyhow::anyhow!("cpu command rejected: {error}"))?;
        emit(&events)?;
    }
    bail!("cpu turn exceeded {CPU_COMMAND_BUDGET} commands");
}

fn emit(events: &[Event]) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    for event in events {
        serde_json::to_writer(&mut handle, event).context("writing event")?;
        handle.write_all(b"\n").context("writing event")?;
    }
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

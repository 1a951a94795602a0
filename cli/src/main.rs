//! Command-line driver for virtual-pet link battles
//!
//! Reads encounter files, runs the simulators, and prints the transport
//! envelope of the result on stdout. Logs go to stderr (`RUST_LOG`).

mod encounter;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use vpet_battle::{BattleResult, BattleSimulator, GlobalBattleSimulator, Protocol};

use encounter::{DuelEncounter, TeamEncounter, load_patterns, read_json};

#[derive(Parser)]
#[command(name = "vpet-battle")]
#[command(about = "Simulate virtual-pet link battles", long_about = None)]
#[command(version)]
struct Cli {
    /// Pretty-print the output JSON
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a 1v1 battle over one of the link protocols
    Duel {
        /// Encounter file with `device1` and `device2`
        file: PathBuf,

        /// Link protocol (DMC_BS, DM20_BS, PEN20_BS, DMX_BS); overrides the file
        #[arg(long)]
        protocol: Option<Protocol>,

        /// Seed for a reproducible battle
        #[arg(long)]
        seed: Option<u64>,

        /// Attack pattern table (JSON)
        #[arg(long)]
        patterns: Option<PathBuf>,
    },

    /// Run a team battle
    Team {
        /// Encounter file with `team1`, `team2` and optional `config`
        file: PathBuf,

        #[arg(long)]
        seed: Option<u64>,

        #[arg(long)]
        patterns: Option<PathBuf>,
    },

    /// Relabel a result received from the host so device1 is this device
    Relabel {
        /// Envelope produced by `duel` or `team`
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Duel {
            file,
            protocol,
            seed,
            patterns,
        } => run_duel(file, protocol, seed, patterns)?,
        Command::Team {
            file,
            seed,
            patterns,
        } => run_team(file, seed, patterns)?,
        Command::Relabel { file } => {
            let envelope: serde_json::Value = read_json(&file)?;
            vpet_replay::receive_from_host(&envelope).context("Invalid host result")?
        }
    };

    print_result(&result, cli.pretty)
}

fn run_duel(
    file: PathBuf,
    protocol: Option<Protocol>,
    seed: Option<u64>,
    patterns: Option<PathBuf>,
) -> Result<BattleResult> {
    let encounter: DuelEncounter = read_json(&file)?;
    let protocol = protocol.or(encounter.protocol).unwrap_or(Protocol::DmxBs);
    let seed = seed.unwrap_or_else(rand::random);
    let simulator = BattleSimulator::with_patterns(load_patterns(patterns.as_deref())?);

    tracing::info!(
        %protocol,
        seed,
        device1 = %encounter.device1.name,
        device2 = %encounter.device2.name,
        "Starting duel"
    );

    let result = simulator
        .simulate_seeded(&encounter.device1, &encounter.device2, protocol, seed)
        .context("Battle simulation failed")?;
    tracing::info!(winner = %result.winner, turns = result.turns(), "Duel finished");
    Ok(result)
}

fn run_team(file: PathBuf, seed: Option<u64>, patterns: Option<PathBuf>) -> Result<BattleResult> {
    let encounter: TeamEncounter = read_json(&file)?;
    let seed = seed.unwrap_or_else(rand::random);
    let simulator =
        GlobalBattleSimulator::with_patterns(encounter.config, load_patterns(patterns.as_deref())?);

    tracing::info!(
        seed,
        team1 = encounter.team1.len(),
        team2 = encounter.team2.len(),
        "Starting team battle"
    );

    let result = simulator
        .simulate_seeded(&encounter.team1, &encounter.team2, seed)
        .context("Team battle simulation failed")?;
    tracing::info!(winner = %result.winner, rounds = result.turns(), "Team battle finished");
    Ok(result)
}

fn print_result(result: &BattleResult, pretty: bool) -> Result<()> {
    let envelope = vpet_replay::encode_result(result).context("Failed to encode result")?;
    let json = if pretty {
        serde_json::to_string_pretty(&envelope)?
    } else {
        serde_json::to_string(&envelope)?
    };
    println!("{json}");
    Ok(())
}

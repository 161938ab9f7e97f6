#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays a headless Hive Defence run.

mod layout;
mod settings;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use hive_defence_core::{Command, Event, RunState, Snapshot, DEFAULT_DIFFICULTY, DEFAULT_MISSION};
use hive_defence_world::{query, Session, World};
use tracing_subscriber::EnvFilter;

use crate::{
    layout::{CellArg, Layout},
    settings::Settings,
};

#[derive(Parser, Debug)]
#[command(name = "hive-defence")]
#[command(about = "Plays a headless Hive Defence run at a fixed frame rate")]
struct Args {
    /// Difficulty preset identifier
    #[arg(long, default_value = DEFAULT_DIFFICULTY)]
    difficulty: String,

    /// Mission preset identifier
    #[arg(long, default_value = DEFAULT_MISSION)]
    mission: String,

    /// Seed overriding the configured random source
    #[arg(long)]
    seed: Option<u64>,

    /// Number of frames to simulate
    #[arg(long, default_value_t = 3_600)]
    frames: u32,

    /// Milliseconds between two frames
    #[arg(long, default_value_t = 16)]
    frame_ms: u64,

    /// TOML file with `[game]` and `[presets]` overrides
    #[arg(long)]
    config: Option<PathBuf>,

    /// Wall to build before the first wave, as column,row
    #[arg(long = "wall", value_name = "CELL")]
    walls: Vec<CellArg>,

    /// Turret to build before the first wave, as column,row
    #[arg(long = "turret", value_name = "CELL")]
    turrets: Vec<CellArg>,

    /// Sniper to build before the first wave, as column,row
    #[arg(long = "sniper", value_name = "CELL")]
    snipers: Vec<CellArg>,

    /// Trap to arm before the first wave, as column,row
    #[arg(long = "trap", value_name = "CELL")]
    traps: Vec<CellArg>,

    /// Print every snapshot as a JSON line
    #[arg(long)]
    json: bool,
}

/// Entry point for the Hive Defence command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(seed) = args.seed {
        settings.game.rng_seed = seed;
    }

    let world = World::new(settings.game, settings.presets)
        .context("preset tables must define the default difficulty and mission")?;
    let json = args.json;
    let mut session = Session::new(world, move |snapshot: &Snapshot| {
        if json {
            print_json(snapshot);
        }
    });

    if args.difficulty != DEFAULT_DIFFICULTY {
        session
            .perform(Command::SetDifficulty {
                id: args.difficulty.clone(),
            })
            .context("unknown difficulty")?;
    }
    if args.mission != DEFAULT_MISSION {
        session
            .perform(Command::SetMission {
                id: args.mission.clone(),
            })
            .context("unknown mission")?;
    }

    let layout = Layout {
        walls: args.walls,
        turrets: args.turrets,
        snipers: args.snipers,
        traps: args.traps,
    };
    for (cell, command) in layout.commands(query::grid(session.world())) {
        if let Err(reason) = session.perform(command) {
            tracing::warn!(?cell, %reason, "build order refused");
        }
    }

    session.perform(Command::Start).context("failed to start the run")?;

    let mut now = Duration::ZERO;
    let frame = Duration::from_millis(args.frame_ms);
    for _ in 0..args.frames {
        session.frame(now);
        report(session.events());
        if query::run_state(session.world()) != RunState::Running {
            break;
        }
        now += frame;
    }

    let summary = query::snapshot(session.world());
    if !json {
        println!(
            "{:?} on wave {} with {} scrap, base {}/{}, wave {:.0}% resolved",
            summary.run_state,
            summary.wave,
            summary.scrap,
            summary.base_hp,
            summary.max_base_hp,
            summary.wave_progress * 100.0,
        );
    }
    Ok(())
}

fn print_json(snapshot: &Snapshot) {
    match serde_json::to_string(snapshot) {
        Ok(line) => println!("{line}"),
        Err(error) => tracing::warn!(%error, "failed to encode snapshot"),
    }
}

fn report(events: &[Event]) {
    for event in events {
        match event {
            Event::WaveStarted { wave, quota } => tracing::info!(wave, quota, "wave started"),
            Event::AgentReachedBase { agent, damage } => {
                tracing::info!(agent = agent.get(), damage, "base hit");
            }
            _ => {}
        }
    }
}

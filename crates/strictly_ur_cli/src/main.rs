//! Strictly Ur - command line driver
//!
//! Plays games between agents and inspects lookup table files.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod cli;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use cli::{AgentKind, Cli, Command};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use strictly_lut::{BigEntryStore, LutAgent, StateLUT, StoreHeader};
use strictly_ur::{
    Agent, Game, GameSettings, GreedyAgent, PiecesAdvancedUtility, Player, RandomAgent, RuleSet,
};
use tracing::{debug, info, instrument};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Play {
            preset,
            settings,
            light,
            dark,
            lut,
            games,
            seed,
        } => run_play(&preset, settings.as_deref(), light, dark, lut, games, seed),
        Command::Inspect { file } => run_inspect(&file),
    }
}

fn load_settings(preset: &str, file: Option<&Path>) -> Result<GameSettings> {
    let settings = match file {
        Some(path) => GameSettings::from_file(path)?,
        None => GameSettings::preset(preset)?,
    };
    Ok(settings)
}

/// A loaded table shared by every `lut` agent.
struct Table {
    lut: Arc<StateLUT>,
    store: Arc<BigEntryStore>,
}

fn load_table(settings: GameSettings, path: &Path) -> Result<Table> {
    let lut = StateLUT::new(settings)?;
    let store = lut
        .read_state_store(path)
        .with_context(|| format!("Failed to load lookup table {}", path.display()))?;
    Ok(Table {
        lut: Arc::new(lut),
        store: Arc::new(store),
    })
}

fn build_agent(
    kind: AgentKind,
    player: Player,
    rules: &RuleSet,
    table: Option<&Table>,
    seed: u64,
) -> Result<Box<dyn Agent>> {
    let name = format!("{} ({:?})", player, kind).to_lowercase();
    let agent: Box<dyn Agent> = match kind {
        AgentKind::Random => Box::new(RandomAgent::new(name, StdRng::seed_from_u64(seed))),
        AgentKind::Greedy => Box::new(GreedyAgent::new(name, rules.clone(), PiecesAdvancedUtility)),
        AgentKind::Lut => {
            let table = table.ok_or_else(|| anyhow!("A lut agent needs --lut <FILE>"))?;
            Box::new(LutAgent::new(
                name,
                rules.clone(),
                Arc::clone(&table.lut),
                Arc::clone(&table.store),
            )?)
        }
    };
    Ok(agent)
}

/// Play games between two agents and report the tally.
#[instrument(skip(settings_file, lut_file))]
fn run_play(
    preset: &str,
    settings_file: Option<&Path>,
    light: AgentKind,
    dark: AgentKind,
    lut_file: Option<PathBuf>,
    games: u32,
    seed: u64,
) -> Result<()> {
    let settings = load_settings(preset, settings_file)?;
    let rules = RuleSet::new(settings)?;
    let table = match &lut_file {
        Some(path) => Some(load_table(settings, path)?),
        None => None,
    };

    let mut light_agent = build_agent(light, Player::Light, &rules, table.as_ref(), seed)?;
    let mut dark_agent = build_agent(dark, Player::Dark, &rules, table.as_ref(), seed.wrapping_add(1))?;
    let mut dice = rules.create_dice(StdRng::seed_from_u64(seed.wrapping_add(2)));

    info!(
        board = %settings.board(),
        paths = %settings.paths(),
        light = light_agent.name(),
        dark = dark_agent.name(),
        games,
        "Starting games"
    );

    let mut light_wins = 0u32;
    for index in 0..games {
        let mut game = Game::new(rules.clone());
        let mut narrated = 0;
        let winner = loop {
            for state in &game.history()[narrated..] {
                debug!(game = index, "{}", state.describe());
            }
            narrated = game.history().len();
            if let Some(winner) = game.winner() {
                break winner;
            }
            game.play_turn(light_agent.as_mut(), dark_agent.as_mut(), &mut dice)?;
        };
        info!(game = index, %winner, states = game.history().len(), "Game over");
        if winner == Player::Light {
            light_wins += 1;
        }
    }

    let dark_wins = games - light_wins;
    info!(light_wins, dark_wins, "All games finished");
    println!(
        "{}: {} wins, {}: {} wins",
        light_agent.name(),
        light_wins,
        dark_agent.name(),
        dark_wins
    );
    Ok(())
}

/// Print a store file's header as JSON.
#[instrument]
fn run_inspect(file: &Path) -> Result<()> {
    let header = StoreHeader::read_from_path(file)
        .with_context(|| format!("Failed to read lookup table header from {}", file.display()))?;
    let summary = serde_json::json!({
        "header": header,
        "entries": header.entries(),
        "shards": header.entry_counts.len(),
        "file_bytes": header.expected_file_len(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

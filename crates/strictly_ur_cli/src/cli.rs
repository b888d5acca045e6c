//! Command-line interface for strictly_ur.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Strictly Ur - Royal Game of Ur engine and solved tables
#[derive(Parser, Debug)]
#[command(name = "strictly_ur")]
#[command(about = "Play the Royal Game of Ur and inspect solved lookup tables", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// How a side chooses its moves
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentKind {
    /// Uniformly random among the offered moves
    Random,
    /// Maximises pieces advanced one move ahead
    Greedy,
    /// Follows a solved lookup table (requires --lut)
    Lut,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play games between two agents
    Play {
        /// Rule preset: finkel, masters, murray, blitz or aseb
        #[arg(short, long, default_value = "finkel", conflicts_with = "settings")]
        preset: String,

        /// TOML file describing a custom variant
        #[arg(short, long)]
        settings: Option<PathBuf>,

        /// Agent playing Light
        #[arg(long, value_enum, default_value = "greedy")]
        light: AgentKind,

        /// Agent playing Dark
        #[arg(long, value_enum, default_value = "random")]
        dark: AgentKind,

        /// Lookup table file for `lut` agents
        #[arg(long)]
        lut: Option<PathBuf>,

        /// Number of games to play
        #[arg(short, long, default_value = "1")]
        games: u32,

        /// Seed for dice and random agents
        #[arg(long, default_value = "0")]
        seed: u64,
    },

    /// Print the header of a lookup table file as JSON
    Inspect {
        /// Path to the lookup table file
        file: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_play_defaults() {
        let cli = Cli::try_parse_from(["strictly_ur", "play"]).expect("parses");
        match cli.command {
            Command::Play {
                preset,
                light,
                dark,
                games,
                ..
            } => {
                assert_eq!(preset, "finkel");
                assert_eq!(light, AgentKind::Greedy);
                assert_eq!(dark, AgentKind::Random);
                assert_eq!(games, 1);
            }
            other => panic!("Unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_preset_conflicts_with_settings_file() {
        let result = Cli::try_parse_from([
            "strictly_ur",
            "play",
            "--preset",
            "masters",
            "--settings",
            "variant.toml",
        ]);
        assert!(result.is_err());
    }
}

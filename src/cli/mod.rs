//! CLI module for Pokedex Research
//!
//! Provides command-line interface parsing for the `pokedex` binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// The canonical queries run by `pokedex demo`
pub const DEMO_QUERIES: [&str; 4] = [
    "Build a team of all bug type Pokemon.",
    "What is an easy Pokemon to train in Pokemon Red?",
    "I have a team of 5 Pikachus. What Pokemon should I add next to my party?",
    "I want to find a unique Pokemon that lives by the sea.",
];

/// Words that end an interactive session
pub const QUIT_WORDS: [&str; 3] = ["quit", "exit", "q"];

pub fn is_quit(input: &str) -> bool {
    let input = input.trim().to_lowercase();
    QUIT_WORDS.contains(&input.as_str())
}

/// Pokedex Research - multi-source Pokemon research agent
///
/// Answers Pokemon questions by querying PokeAPI and several fan wikis in
/// parallel, reconciling what they say and reporting how confident it is.
#[derive(Parser, Debug)]
#[command(
    name = "pokedex",
    version,
    about = "Pokedex Research - multi-source Pokemon research agent",
    long_about = "Answers Pokemon questions by querying PokeAPI and several fan wikis in parallel,\n\
                  reconciling conflicting answers and scoring confidence in the result.",
    after_help = "EXAMPLES:\n    \
                  pokedex research \"What type is Scizor?\"\n    \
                  pokedex research \"Build a team of all bug type Pokemon\" --compare\n    \
                  pokedex interactive\n    \
                  pokedex config --validate --config my.toml"
)]
pub struct Cli {
    /// Path to the configuration file (defaults to ./pokedex.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Research a single question
    Research {
        /// Your Pokemon research question
        query: String,

        /// Also show a plain chat-model answer for comparison
        #[arg(short = 'C', long)]
        compare: bool,

        /// Show every fact with its sources and the per-source fetch log
        #[arg(short = 'f', long)]
        verbose_findings: bool,
    },

    /// Ask several questions in a row (type quit, exit or q to leave)
    Interactive,

    /// Run the four showcase queries
    Demo {
        /// Skip the comparison answers
        #[arg(long)]
        no_compare: bool,
    },

    /// Show configuration information
    Config {
        /// Validate the configuration file
        #[arg(long)]
        validate: bool,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

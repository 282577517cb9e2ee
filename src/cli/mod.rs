//! CLI module for Kaachan
//!
//! Provides command-line interface parsing for the kaachan-server binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod init;
pub mod output;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Kaachan - persona-driven conversation server
#[derive(Parser, Debug)]
#[command(
    name = "kaachan-server",
    version,
    about = "Kaachan - persona-driven conversation server",
    long_about = "Keeps a summarized memory of each conversation and answers in the voice\n\
                  of a caring, strict or fun persona using an external text model.\n\n\
                  Run without arguments to start the server, or use 'init' to write a starter config.",
    after_help = "EXAMPLES:\n    \
                  kaachan-server init                     # Write kaachan.toml for Gemini\n    \
                  kaachan-server init --provider ollama   # Write kaachan.toml for Ollama\n    \
                  kaachan-server analyze \"とても嬉しい\"     # Inspect the text heuristics\n    \
                  kaachan-server                          # Start the server"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "kaachan.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProviderChoice {
    Gemini,
    Ollama,
}

impl ProviderChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderChoice::Gemini => "gemini",
            ProviderChoice::Ollama => "ollama",
        }
    }
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a starter kaachan.toml and .env.example
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite existing files
        #[arg(short, long)]
        force: bool,

        /// Generation backend to configure
        #[arg(long, value_enum, default_value_t = ProviderChoice::Gemini)]
        provider: ProviderChoice,

        /// Host address for the server
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port for the server
        #[arg(long, default_value = "3000")]
        port: u16,
    },

    /// Show configuration information
    Config {
        /// Also check that referenced environment variables are set
        #[arg(long)]
        validate: bool,
    },

    /// Print keywords, topics and sentiment for a piece of text
    Analyze {
        /// Text to analyze
        text: String,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

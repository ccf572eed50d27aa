//! Command-line interface definition for Docuchat
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for interactive chat, credential management,
//! and prompt library inspection.

use clap::{Parser, Subcommand};

/// Docuchat - document analysis chat CLI
///
/// Attach documents, send prompts, and stream AI-generated analysis
/// into a running chat transcript.
#[derive(Parser, Debug, Clone)]
#[command(name = "docuchat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Docuchat
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive chat session
    Chat {
        /// Override the model from config
        #[arg(short, long)]
        model: Option<String>,

        /// Activate a prompt prefix by id for the session
        #[arg(short, long)]
        prefix: Option<String>,
    },

    /// Store or clear the API credential
    Auth {
        /// Clear the stored credential instead of entering a new one
        #[arg(long)]
        clear: bool,
    },

    /// List the built-in prompt prefixes
    Prompts,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

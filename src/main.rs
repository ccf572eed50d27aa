//! Docuchat - document analysis chat CLI
//!
#![doc = "Docuchat - document analysis chat CLI"]
#![doc = "Main entry point for the Docuchat application."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use docuchat::cli::{Cli, Commands};
use docuchat::commands;
use docuchat::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config = Config::load(&cli.config)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Chat { model, prefix } => {
            tracing::info!("Starting interactive chat session");
            if let Some(m) = &model {
                tracing::debug!("Using model override: {}", m);
            }
            if let Some(p) = &prefix {
                tracing::debug!("Activating prompt prefix: {}", p);
            }

            commands::chat::run_chat(config, model, prefix).await?;
            Ok(())
        }
        Commands::Auth { clear } => {
            tracing::info!("Starting credential management");
            commands::auth::run_auth(clear)?;
            Ok(())
        }
        Commands::Prompts => {
            commands::prompts::run_prompts();
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "docuchat=debug"
    } else {
        "docuchat=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

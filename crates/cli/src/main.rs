//! FaithLoop CLI — the main entry point.
//!
//! Commands:
//! - `onboard`       — Write a default config file
//! - `chat`          — Interactive chat with the routing pipeline
//! - `ask`           — One-shot question answering
//! - `engine-status` — Probe the numeric engine

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "faithloop",
    about = "FaithLoop — local-first answering agent with verify-then-answer routing",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Onboard,

    /// Chat with the routing pipeline
    Chat {
        /// Attach an image to the first message
        #[arg(short, long)]
        image: Option<String>,

        /// Enable the deep-check critique pass for image answers
        #[arg(long)]
        deep_check: bool,

        /// Rephrase raw logic results as natural sentences
        #[arg(long)]
        beautify: bool,
    },

    /// Ask a single question and print the answer
    Ask {
        /// The question to answer
        question: String,

        /// Attach an image
        #[arg(short, long)]
        image: Option<String>,

        /// Print the phase log after the answer
        #[arg(long)]
        logs: bool,
    },

    /// Probe the numeric engine and report its state
    EngineStatus,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Chat {
            image,
            deep_check,
            beautify,
        } => commands::chat::run(image, deep_check, beautify).await?,
        Commands::Ask {
            question,
            image,
            logs,
        } => commands::ask::run(&question, image, logs).await?,
        Commands::EngineStatus => commands::engine_status::run().await?,
    }

    Ok(())
}

// src/main.rs

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use keystone::config::KeystoneConfig;
use keystone::state;

#[derive(Parser)]
#[command(name = "keystone", about = "Keystone support chat backend")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the support API server
    Serve,
    /// Chunk, embed, and index a knowledge document
    Ingest {
        /// Path to a UTF-8 text or markdown document
        #[arg(long)]
        path: PathBuf,
        /// Source label stored with every chunk; defaults to the file name
        #[arg(long)]
        source: Option<String>,
        /// Knowledge category (faq, onboarding, billing, ...)
        #[arg(long, default_value = "general")]
        category: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    let config = KeystoneConfig::from_env();

    match cli.command {
        Command::Serve => {
            info!("Starting Keystone support backend");
            info!("Model: {}", config.chat_model);
            info!(
                "Retrieval: top-{} above {:.2}",
                config.retrieval_limit, config.retrieval_threshold
            );

            let app_state = state::build_app_state(&config).await?;
            keystone::server::run(&config.host, config.port, app_state).await?;
        }
        Command::Ingest {
            path,
            source,
            category,
        } => {
            let text = std::fs::read_to_string(&path)?;
            let source = source.unwrap_or_else(|| {
                path.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string())
            });

            let ingestor = state::build_ingestor(&config)?;
            let stored = ingestor.ingest_document(&source, &category, &text).await?;
            info!("Ingested {} chunk(s) from {}", stored, source);
        }
    }

    Ok(())
}

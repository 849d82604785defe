//! medinote-agent binary entry point
//!
//! Answers a single question from the command line or validates a configuration file.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use medinote_common::{tracing::init_tracing, SystemConfig};
use medinote_agent_network::{build_service, TurnRequest, VERSION};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "medinote-agent")]
#[command(version = VERSION)]
#[command(about = "Medinote health chatbot agents")]
struct Cli {
    /// Path to configuration file (defaults apply when omitted)
    #[arg(short, long, env = "MEDINOTE_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a single question and exit
    Ask {
        /// The question to answer
        question: String,

        /// User whose records and history may be consulted
        #[arg(long)]
        user_id: Option<String>,

        /// Session to continue
        #[arg(long)]
        session_id: Option<i64>,
    },
    /// Validate configuration
    ValidateConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = cli.log_level.as_deref().unwrap_or("info");
    init_tracing(log_level)?;

    info!("medinote-agent v{} starting", VERSION);

    let config = SystemConfig::load_or_default(cli.config.as_deref()).map_err(|e| {
        error!("Failed to load configuration: {:#}", e);
        e
    })?;

    match cli.command {
        Commands::ValidateConfig => {
            println!("✓ Configuration is valid");
            println!("  Model: {} ({})", config.llm.model, config.llm.base_url);
            println!(
                "  Collections: {}, {}, {}",
                config.retrieval.disease_collection,
                config.retrieval.drug_collection,
                config.retrieval.interaction_collection
            );
            println!(
                "  Web search: {}",
                config.web_search.endpoint.as_deref().unwrap_or("disabled")
            );
            println!(
                "  Chat log: {}",
                if config.history.database_url.is_some() { "postgres" } else { "in-memory" }
            );
            Ok(())
        }
        Commands::Ask {
            question,
            user_id,
            session_id,
        } => ask(&config, question, user_id, session_id).await,
    }
}

/// Answer one question and print the answer with its sources
async fn ask(config: &SystemConfig, question: String, user_id: Option<String>, session_id: Option<i64>) -> Result<()> {
    info!("Answering question");

    let service = build_service(config).await?;
    let response = service
        .handle_turn(TurnRequest {
            session_id,
            user_id,
            query: question,
        })
        .await?;

    println!("{}", response.answer);
    if !response.sources.is_empty() {
        println!();
        println!("Sources:");
        for source in &response.sources {
            let title = source.title.as_deref().unwrap_or(&source.id);
            match &source.url {
                Some(url) => println!("  [{}] {} ({})", source.collection, title, url),
                None => println!("  [{}] {}", source.collection, title),
            }
        }
    }
    println!();
    println!("session: {}", response.session_id);
    Ok(())
}

//! Shivsar Export question answering
//!
//! Run with: cargo run -p shivsar-rag --bin shivsar-ask -- "what is your phone number"

use clap::Parser;
use shivsar_rag::{QaPipeline, RagConfig};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Question asked when none is given on the command line
const DEFAULT_QUESTION: &str = "who is ceo of google";

/// Log filter used when `RUST_LOG` is unset
const DEFAULT_LOG_FILTER: &str = "shivsar_rag=info,shivsar_ask=info";

#[derive(Parser, Debug)]
#[command(name = "shivsar-ask", version, about = "Answer questions about Shivsar Export")]
struct Cli {
    /// Question to answer
    #[arg(default_value = DEFAULT_QUESTION)]
    question: String,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = RagConfig::load(cli.config.as_deref())?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Source: {}", config.source.pdf_path.display());
    tracing::info!("  - Store: {}", config.store.marker_path().display());
    tracing::info!("  - Embedding model: {}", config.openai.embed_model);
    tracing::info!("  - Chat model: {}", config.openai.chat_model);

    let pipeline = QaPipeline::from_config(&config).await?;
    let answer = pipeline.ask(&cli.question).await?;

    tracing::info!(
        "Answered in {}ms from {} chunks",
        answer.response_time_ms,
        answer.sources.len()
    );
    println!("\n Answer: {}", answer.text);

    Ok(())
}

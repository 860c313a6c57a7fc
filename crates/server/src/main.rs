//! Ferrochat server — the main entry point.
//!
//! Wires the provider, tool registry, transcript store, and orchestration
//! engine together, starts the single conversation this process serves, and
//! exposes it over WebSocket.

use anyhow::Context;
use clap::Parser;
use ferrochat_agent::ChatEngine;
use ferrochat_core::interrupt::InterruptSignal;
use ferrochat_core::notify::NotificationBus;
use ferrochat_provider::OpenAiProvider;
use ferrochat_transcript::FileTranscriptStore;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

mod config;
mod routes;

use config::ServerConfig;
use routes::AppState;

#[derive(Parser)]
#[command(
    name = "ferrochat",
    about = "Ferrochat — streaming conversational agent backend",
    version
)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the bind port
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    let mut config = ServerConfig::load(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.port = port;
    }

    let api_key = config.api_key.clone().context(
        "No API key configured; set OPENAI_API_KEY or `api_key` in the config file",
    )?;

    let provider = Arc::new(OpenAiProvider::new(
        &config.base_url,
        api_key,
        &config.model,
    ));
    let tools = Arc::new(ferrochat_tools::default_registry());
    let bus = Arc::new(NotificationBus::default());
    let signal = Arc::new(InterruptSignal::new());
    let store = Arc::new(FileTranscriptStore::new(&config.transcript_dir));

    let engine = ChatEngine::new(
        provider,
        tools,
        Arc::clone(&bus),
        Arc::clone(&signal),
        store,
    );

    let conversation = engine
        .start_conversation(&config.system_prompt(), config.include_project_state)
        .await;
    info!(session = %conversation.id, "Conversation started");

    let state = Arc::new(AppState {
        engine,
        conversation: Mutex::new(conversation),
        signal,
        bus,
    });

    let addr = format!("{}:{}", config.host, config.port);
    info!(addr = %addr, model = %config.model, "Ferrochat server listening");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, routes::build_router(state)).await?;

    Ok(())
}

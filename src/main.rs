// SPDX-License-Identifier: MIT
mod cli;
mod http;
mod runtime;
mod state;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use cli::{Cli, Commands};
use orc_llm::{EchoModel, ModelProvider};
use orc_repo::{InMemoryAgentContextRepository, InMemoryConversationRepository};
use orc_tools::ToolRegistry;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = orc_config::load(cli.config.as_deref())?;

    match cli.command.unwrap_or(Commands::Serve { bind: None }) {
        Commands::ShowConfig => {
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
        Commands::Serve { bind } => serve(config, bind).await,
    }
}

async fn serve(config: orc_config::Config, bind_override: Option<String>) -> anyhow::Result<()> {
    let bind_addr = bind_override.unwrap_or_else(|| config.server.bind_addr.clone());

    // No real model provider driver ships with this service (see orc-llm);
    // EchoModel is the only concrete ModelProvider available to default to.
    let model: Arc<dyn ModelProvider> = Arc::new(EchoModel);
    let tools = Arc::new(ToolRegistry::new());
    let context_repo = Arc::new(InMemoryAgentContextRepository::new());
    let conversation_repo = Arc::new(InMemoryConversationRepository::new());

    let state = Arc::new(AppState::new(config, model, tools, context_repo, conversation_repo));
    let app = http::router(state).layer(tower_http::trace::TraceLayer::new_for_http());

    tracing::info!(%bind_addr, "starting orc server");
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry().with(filter).with(fmt::layer()).init();
}

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use weather_agent::{agent::types::AgentMode, config::Config, server};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Address to bind the service to
    #[arg(long)]
    addr: Option<String>,
    /// Agent strategy: react, tool-calling or weather-only
    #[arg(long)]
    mode: Option<AgentMode>,
    /// Model identifier passed to the provider
    #[arg(long)]
    model: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("weather_agent=info,tower_http=info"));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let args = Args::parse();
    let mut config = Config::load(args.config.as_deref()).context("loading config")?;
    config.apply_env();
    if let Some(addr) = args.addr {
        config.server.addr = addr;
    }
    if let Some(mode) = args.mode {
        config.agent.mode = mode;
    }
    if let Some(model) = args.model {
        config.llm.model = Some(model);
    }
    config.validate()?;

    let app = server::app_from_config(&config)?;
    info!(
        addr = %config.server.addr,
        mode = %config.agent.mode,
        model = config.llm.model(),
        "starting service"
    );

    let listener = tokio::net::TcpListener::bind(&config.server.addr)
        .await
        .with_context(|| format!("binding {}", config.server.addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

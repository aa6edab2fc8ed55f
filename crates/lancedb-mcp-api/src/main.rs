//! LanceDB MCP server entry point.
//!
//! Binary name: `lancedb-mcp`
//!
//! Loads configuration (file, then environment, then flags), sets up
//! logging on stderr, opens the database and embedding model, then either
//! serves MCP over stdio or runs a one-shot command.

mod cli;
mod mcp;
mod state;

use anyhow::Context;
use clap::Parser;
use rmcp::{ServiceExt, transport::stdio};

use cli::{Cli, Commands};
use lancedb_mcp_infra::config::load_with_env;
use lancedb_mcp_observe::tracing_setup::init_tracing;
use mcp::response::{error_body, pretty};
use mcp::server::LanceDbMcpServer;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_with_env(cli.config.as_deref())
        .await
        .context("Failed to load configuration")?;
    cli.apply_overrides(&mut config);

    init_tracing(&config.log_level, config.log_format)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    let state = AppState::init(config).await?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            tracing::info!("Serving MCP over stdio");
            let service = LanceDbMcpServer::new(state)
                .serve(stdio())
                .await
                .context("Failed to start MCP server")?;
            service.waiting().await?;
            tracing::info!("MCP client disconnected, shutting down");
        }

        Commands::Check => {
            let report = state.describe().await?;
            println!("{}", pretty(&report));
        }

        Commands::Call { tool, args } => {
            let args: serde_json::Value =
                serde_json::from_str(&args).context("--args must be a JSON object")?;
            match mcp::tools::dispatch(&state, &tool, args).await {
                Ok(value) => println!("{}", pretty(&value)),
                Err(err) => {
                    println!("{}", pretty(&error_body(&err)));
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

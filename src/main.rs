//! # Query Gateway CLI (`qgw`)
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `qgw serve` | Start the HTTP gateway |
//! | `qgw search "<query>"` | Resolve one query through the fallback chain |
//! | `qgw ask "<prompt>"` | Ask the generative model directly |
//!
//! All commands accept `--config <path>`; without it the built-in defaults
//! are used. Credentials always come from the environment.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

use query_gateway::config;
use query_gateway::models::Query;
use query_gateway::server::{self, SearchResponse};

/// Query Gateway: local index, web search, then a generative answer.
#[derive(Parser)]
#[command(
    name = "qgw",
    about = "Query gateway — resolves queries via a local index, web search, and a generative fallback",
    version
)]
struct Cli {
    /// Path to configuration file (TOML). Optional.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level (RUST_LOG takes precedence).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway.
    ///
    /// Binds to `[server].bind`, or to `$PORT` on the same host when set.
    Serve,

    /// Resolve a query and print the JSON response.
    Search {
        /// The query text.
        query: String,
    },

    /// Send a prompt straight to the generative model.
    Ask {
        /// The prompt text.
        prompt: String,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .compact()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cfg = config::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Search { query } => {
            let Some(query) = Query::parse(&query) else {
                bail!("query must not be empty");
            };
            let orchestrator = server::build_orchestrator(&cfg)?;
            let resolution = orchestrator.resolve(&query).await?;
            let response =
                SearchResponse::from_resolution(resolution, orchestrator.generative_name());
            let json =
                serde_json::to_string_pretty(&response).context("Failed to encode response")?;
            println!("{}", json);
        }
        Commands::Ask { prompt } => {
            let Some(prompt) = Query::parse(&prompt) else {
                bail!("prompt must not be empty");
            };
            let orchestrator = server::build_orchestrator(&cfg)?;
            let reply = orchestrator.ask(&prompt).await?;
            println!("{}", reply);
        }
    }

    Ok(())
}

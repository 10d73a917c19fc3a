use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use stepsim_config::{StepSimConfig, ToolSetName};
use stepsim_core::{JsonFileStore, SharedStore};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "stepsim", version, about = "Step counter simulator with MCP tool gateways")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the step simulation and keep the shared file in sync
    Simulate {
        /// Start with the simulation paused
        #[arg(long)]
        paused: bool,
        /// Seed for a reproducible activity sequence
        #[arg(long)]
        seed: Option<u64>,
        /// Sync endpoint base URL (writes the shared file directly if unset)
        #[arg(long)]
        endpoint: Option<String>,
    },
    /// Serve the local sync endpoint over HTTP
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
    },
    /// Serve the step tools over stdio (MCP)
    Mcp {
        /// Tool set to expose (full, wechat)
        #[arg(short, long)]
        tools: Option<ToolSetName>,
    },
    /// Connect to a remote MCP WebSocket endpoint and serve the step tools
    Ws {
        /// Endpoint URL (overrides MCP_WS_ENDPOINT)
        #[arg(long)]
        endpoint: Option<String>,
        /// Tool set to expose (full, wechat)
        #[arg(short, long)]
        tools: Option<ToolSetName>,
    },
    /// Serve the step tools on a local WebSocket listener
    WsListen {
        /// Address to bind
        #[arg(long)]
        addr: Option<String>,
        /// Tool set to expose (full, wechat)
        #[arg(short, long)]
        tools: Option<ToolSetName>,
    },
    /// Show the stored step state with distance and calories
    Status,
    /// Reset the stored step state to zero
    Reset,
    /// Print the tool definitions as JSON
    Tools {
        /// Tool set to describe (full, wechat)
        #[arg(short, long)]
        tools: Option<ToolSetName>,
        /// Pretty-print output
        #[arg(short, long)]
        pretty: bool,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    let config = StepSimConfig::load(cli.config.as_deref())?;
    let store: SharedStore = Arc::new(JsonFileStore::new(config.store_path()));

    match cli.command {
        Commands::Simulate {
            paused,
            seed,
            endpoint,
        } => {
            commands::simulate::run(&config, store, paused, seed, endpoint).await?;
        }
        Commands::Serve { port, host } => {
            commands::serve::run(&config, store, host, port).await?;
        }
        Commands::Mcp { tools } => {
            commands::mcp::run(&config, store, tools).await?;
        }
        Commands::Ws { endpoint, tools } => {
            commands::ws::run(&config, store, endpoint, tools).await?;
        }
        Commands::WsListen { addr, tools } => {
            commands::ws_listen::run(&config, store, addr, tools).await?;
        }
        Commands::Status => {
            commands::status::run(store).await?;
        }
        Commands::Reset => {
            commands::reset::run(store).await?;
        }
        Commands::Tools { tools, pretty } => {
            commands::tools::run(&config, tools, pretty)?;
        }
    }

    Ok(())
}

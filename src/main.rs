//! Ledger node CLI
//!
//! Starts a node: the peer protocol server plus the HTTP API.

use clap::{Parser, Subcommand};
use pow_ledger::api::{create_router, ApiState};
use pow_ledger::mining::{DEFAULT_DIFFICULTY, MAX_DIFFICULTY};
use pow_ledger::network::{Node, NodeConfig, Server, TcpPeerClient};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "ledger-node")]
#[command(version = "0.1.0")]
#[command(about = "A proof-of-work peer-to-peer ledger node", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a node
    Start {
        /// Port for the HTTP API
        #[arg(long, default_value = "3000")]
        api_port: u16,

        /// Port for the peer protocol
        #[arg(long, default_value = "8333")]
        p2p_port: u16,

        /// Host other nodes use to reach this one
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Comma-separated peer endpoints (host:p2p_port)
        #[arg(long, value_delimiter = ',')]
        peers: Vec<String>,

        /// Leading zero hex characters required of a block hash (0-64)
        #[arg(
            short,
            long,
            default_value_t = DEFAULT_DIFFICULTY,
            value_parser = clap::value_parser!(u32).range(0..=MAX_DIFFICULTY as i64)
        )]
        difficulty: u32,

        /// Address credited with mining rewards (random if omitted)
        #[arg(short, long)]
        address: Option<String>,

        /// Deadline for each outbound peer call, in milliseconds
        #[arg(long, default_value = "5000")]
        peer_timeout_ms: u64,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Start {
            api_port,
            p2p_port,
            host,
            peers,
            difficulty,
            address,
            peer_timeout_ms,
        } => {
            let mut config = NodeConfig {
                api_port,
                p2p_port,
                host,
                peers: peers
                    .into_iter()
                    .map(|p| p.trim().to_string())
                    .filter(|p| !p.is_empty())
                    .collect(),
                difficulty,
                peer_timeout: Duration::from_millis(peer_timeout_ms),
                ..NodeConfig::default()
            };
            if let Some(address) = address {
                config.node_address = address;
            }

            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run_node(config))
        }
    }
}

async fn run_node(config: NodeConfig) -> Result<(), Box<dyn std::error::Error>> {
    let api_port = config.api_port;
    let p2p_port = config.p2p_port;

    println!("🌐 Starting ledger node {}", config.node_address);
    println!("   Difficulty: {}", config.difficulty);
    if !config.peers.is_empty() {
        println!("   Peers: {:?}", config.peers);
    }

    let node = Arc::new(Node::new(config, Arc::new(TcpPeerClient::new())));
    let shutdown = CancellationToken::new();

    let server = Server::bind(p2p_port).await?;
    let p2p_task = tokio::spawn(server.run(node.clone(), shutdown.clone()));

    let app = create_router(ApiState::new(node));
    let addr = format!("0.0.0.0:{}", api_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!("🚀 REST API listening on http://localhost:{}", api_port);
    println!();
    println!("📖 Available endpoints:");
    println!("   GET  /health                 - Health check");
    println!("   GET  /blockchain             - Chain, pending pool, node identity");
    println!("   GET  /validate               - Validate chain");
    println!("   POST /transaction/broadcast  - Create and relay a transaction");
    println!("   GET  /mine                   - Mine a block");
    println!("   GET  /consensus              - Adopt the longest valid peer chain");
    println!("   GET  /block/{{hash}}           - Block by hash");
    println!("   GET  /transaction/{{id}}       - Transaction by id");
    println!("   GET  /address/{{address}}      - Address history and balance");
    println!();

    // Ctrl+C stops both servers
    let signal = shutdown.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        println!("\n📴 Shutting down node...");
        signal.cancel();
    });

    let api_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { api_shutdown.cancelled().await })
        .await?;

    shutdown.cancel();
    p2p_task.await?;

    Ok(())
}

#![forbid(unsafe_code)]
//! Runs the Embercoin HTTP node.

use clap::Parser;
use colored::Colorize;
use embercoin::blockchain::Blockchain;
use embercoin::config::load_config;
use embercoin::node::Node;
use log::warn;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ember-node", about = "Run an Embercoin node")]
struct Args {
    /// Configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Override the API port from the configuration
    #[arg(long)]
    port: Option<u16>,

    /// Peers to register with on startup (repeatable)
    #[arg(long = "peer")]
    peers: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let config = load_config(&args.config)?;
    let port = args.port.unwrap_or(config.node.api_port);
    let data_file = PathBuf::from(&config.node.data_file);

    let blockchain = if data_file.exists() {
        let chain = Blockchain::load_from_file(&data_file)?;
        if !chain.verify_chain() {
            warn!("Loaded ledger failed integrity verification");
        }
        println!(
            "{} Loaded ledger from {} ({} blocks)",
            "⛓".green(),
            data_file.display(),
            chain.chain.len()
        );
        chain
    } else {
        println!(
            "{} No ledger found, mining genesis block at difficulty {}...",
            "⛏".yellow(),
            config.chain.difficulty
        );
        Blockchain::new(config.chain.difficulty, config.chain.mining_reward)
    };

    let node = Node::new(blockchain, Some(data_file))?;

    let own_url = format!("http://localhost:{}", port);
    for peer in args.peers.iter().chain(config.node.bootstrap_peers.iter()) {
        if let Err(e) = node.register_with_peer(peer, &own_url).await {
            warn!("{}", e);
        }
    }

    println!(
        "{} Embercoin node starting on port {}",
        "🔥".red(),
        port
    );
    println!("API available at {}", own_url.bold());

    node.run(port).await?;
    Ok(())
}

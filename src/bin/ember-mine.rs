#![forbid(unsafe_code)]
//! Asks a node to mine the pending pool, crediting the reward address.

use clap::Parser;
use colored::Colorize;
use embercoin::config::load_config;
use embercoin::wallet::Wallet;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ember-mine", about = "Mine pending transactions into a block")]
struct Args {
    /// Address to credit with the mining reward
    #[arg(long)]
    address: Option<String>,

    /// Wallet file whose address receives the reward
    #[arg(long)]
    wallet: Option<PathBuf>,

    /// Configuration file, consulted for [miner] reward_address when
    /// neither --address nor --wallet is given
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Node to mine on
    #[arg(long, default_value = "http://localhost:5000")]
    node: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let miner_address = match (args.address, args.wallet) {
        (Some(address), _) => address,
        (None, Some(path)) => Wallet::load(&path)?.address,
        (None, None) => {
            let config = load_config(&args.config)?;
            match config.miner.reward_address {
                Some(address) => address,
                None => {
                    eprintln!(
                        "{} No reward address: pass --address or --wallet, or set [miner] reward_address in {}",
                        "✗".red(),
                        args.config.display()
                    );
                    std::process::exit(1);
                }
            }
        }
    };

    println!("{} Mining on {}...", "⛏".yellow(), args.node);

    let client = reqwest::Client::new();
    let response = client
        .post(format!("{}/mine", args.node))
        .json(&serde_json::json!({ "miner_address": miner_address }))
        .send()
        .await?;

    let status = response.status();
    let body: serde_json::Value = response.json().await?;

    if status.is_success() {
        let index = body["block"]["index"].as_u64().unwrap_or(0);
        let hash = body["block"]["hash"].as_str().unwrap_or("?");
        let nonce = body["block"]["nonce"].as_u64().unwrap_or(0);
        println!("{} Block {} mined", "✓".green(), index);
        println!("Hash:   {}", hash);
        println!("Nonce:  {}", nonce);
        println!("Reward paid to {}...", &miner_address[..miner_address.len().min(20)]);
    } else {
        println!("{} Mining failed: {}", "✗".red(), body["message"]);
        std::process::exit(1);
    }

    Ok(())
}

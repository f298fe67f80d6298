#![forbid(unsafe_code)]
//! Prints a node's chain, block by block.

use clap::Parser;
use colored::Colorize;
use embercoin::blockchain::Blockchain;

#[derive(Parser)]
#[command(name = "ember-chain", about = "Show the chain held by a node")]
struct Args {
    /// Node to query
    #[arg(long, default_value = "http://localhost:5000")]
    node: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let snapshot: Blockchain = reqwest::get(format!("{}/chain", args.node))
        .await?
        .json()
        .await?;

    println!("\n{}", "=== Embercoin Chain ===".bold());
    println!("Blocks:     {}", snapshot.chain.len());
    println!("Difficulty: {}", snapshot.difficulty);
    println!("Reward:     {} EMBR", snapshot.mining_reward);
    println!("Pending:    {} transaction(s)", snapshot.pending_transactions.len());

    for block in &snapshot.chain {
        println!("\n{}", format!("Block {}", block.index).green().bold());
        println!("  Hash:     {}", block.hash);
        println!("  Previous: {}", block.previous_hash);
        println!("  Nonce:    {}", block.nonce);
        println!("  Transactions:");
        if block.transactions.is_empty() {
            println!("    (none)");
        }
        for tx in &block.transactions {
            let sender = if tx.is_coinbase() {
                "COINBASE".yellow().to_string()
            } else {
                format!("{}...", &tx.sender[..tx.sender.len().min(12)])
            };
            let recipient = format!("{}...", &tx.recipient[..tx.recipient.len().min(12)]);
            println!("    {} -> {}  {} EMBR", sender, recipient, tx.amount);
        }
    }

    Ok(())
}

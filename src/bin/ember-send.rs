#![forbid(unsafe_code)]
//! Signs a transaction and optionally broadcasts it to a node.

use clap::Parser;
use colored::Colorize;
use embercoin::transaction::Transaction;
use embercoin::wallet::Wallet;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ember-send", about = "Create, sign and broadcast a transaction")]
struct Args {
    /// Wallet file of the sender
    #[arg(long, default_value = "wallet.json")]
    wallet: PathBuf,

    /// Recipient address
    recipient: String,

    /// Amount to transfer
    amount: f64,

    /// Node to broadcast to; when omitted the signed transaction is only
    /// printed
    #[arg(long)]
    node: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let wallet = Wallet::load(&args.wallet)?;
    let mut tx = Transaction::new(wallet.address.clone(), args.recipient, args.amount);
    wallet.sign_transaction(&mut tx)?;

    println!("\n{}", "=== Transaction Created ===".bold());
    println!("From:   {}...", &tx.sender[..20]);
    println!("To:     {}...", &tx.recipient[..tx.recipient.len().min(20)]);
    println!("Amount: {} EMBR", tx.amount);
    println!("Hash:   {}", tx.hash_hex());
    println!("{}", "=".repeat(50));

    if let Some(node) = args.node {
        let client = reqwest::Client::new();
        let response = client
            .post(format!("{}/transactions/new", node))
            .json(&tx)
            .send()
            .await?;

        if response.status().is_success() {
            println!("{}", "Transaction broadcast successfully!".green());
        } else {
            let body: serde_json::Value = response.json().await.unwrap_or_default();
            println!("{} {}", "Failed to broadcast:".red(), body);
        }
    }

    Ok(())
}

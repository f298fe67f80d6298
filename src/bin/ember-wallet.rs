#![forbid(unsafe_code)]
//! Creates and inspects Embercoin wallets.

use clap::{Parser, Subcommand};
use colored::Colorize;
use embercoin::wallet::Wallet;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ember-wallet", about = "Manage Embercoin wallets")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a new wallet and save it to a file
    Create {
        /// Output file
        #[arg(long, default_value = "wallet.json")]
        output: PathBuf,
        /// Optional wallet name
        #[arg(long)]
        name: Option<String>,
    },
    /// Show an existing wallet
    Show {
        /// Wallet file
        #[arg(long, default_value = "wallet.json")]
        file: PathBuf,
    },
}

fn display(wallet: &Wallet) {
    println!("\n{}", "=== Wallet Information ===".bold());
    if let Some(name) = &wallet.name {
        println!("Name:    {}", name);
    }
    println!("Address: {}", wallet.address.green());
    println!("Created: {}", wallet.created);
    println!("{}", "=".repeat(50));
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    match args.command {
        Command::Create { output, name } => {
            let wallet = Wallet::new(name);
            wallet.save(&output)?;
            display(&wallet);
            println!("Wallet saved to {}", output.display());
        }
        Command::Show { file } => {
            let wallet = Wallet::load(&file)?;
            display(&wallet);
        }
    }

    Ok(())
}

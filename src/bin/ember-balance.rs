#![forbid(unsafe_code)]
//! Queries an address balance from a node.

use clap::Parser;
use colored::Colorize;

#[derive(Parser)]
#[command(name = "ember-balance", about = "Check the balance of an address")]
struct Args {
    /// Address to query
    address: String,

    /// Node to query
    #[arg(long, default_value = "http://localhost:5000")]
    node: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let response = reqwest::get(format!("{}/balance/{}", args.node, args.address)).await?;
    let body: serde_json::Value = response.json().await?;

    let balance = body["balance"].as_f64().unwrap_or(0.0);
    println!("Address: {}", args.address);
    println!("Balance: {} EMBR", balance.to_string().green());

    Ok(())
}

//! Configuration management for Embercoin

use crate::blockchain::{DEFAULT_DIFFICULTY, DEFAULT_MINING_REWARD};
use crate::error::ChainError;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub node: NodeConfig,
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub miner: MinerConfig,
}

#[derive(Debug, Deserialize)]
pub struct NodeConfig {
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    #[serde(default)]
    pub bootstrap_peers: Vec<String>,
    #[serde(default = "default_data_file")]
    pub data_file: String,
}

#[derive(Debug, Deserialize)]
pub struct ChainConfig {
    #[serde(default = "default_difficulty")]
    pub difficulty: u32,
    #[serde(default = "default_mining_reward")]
    pub mining_reward: f64,
}

#[derive(Debug, Default, Deserialize)]
pub struct MinerConfig {
    /// Address credited with mining rewards when no explicit address or
    /// wallet is given on the command line.
    #[serde(default)]
    pub reward_address: Option<String>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            bootstrap_peers: Vec::new(),
            data_file: default_data_file(),
        }
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            difficulty: default_difficulty(),
            mining_reward: default_mining_reward(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            node: NodeConfig::default(),
            chain: ChainConfig::default(),
            miner: MinerConfig::default(),
        }
    }
}

/// Load configuration from a TOML file, falling back to defaults when the
/// file is absent.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ChainError> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Config::default());
    }

    let config_str = fs::read_to_string(path)?;
    let config: Config = toml::from_str(&config_str)
        .map_err(|e| ChainError::ConfigError(format!("Failed to parse {}: {}", path.display(), e)))?;

    if config.chain.mining_reward < 0.0 {
        return Err(ChainError::ConfigError(
            "chain.mining_reward must be non-negative".to_string(),
        ));
    }

    Ok(config)
}

fn default_api_port() -> u16 {
    5000
}

fn default_data_file() -> String {
    "./ledger.json".to_string()
}

fn default_difficulty() -> u32 {
    DEFAULT_DIFFICULTY
}

fn default_mining_reward() -> f64 {
    DEFAULT_MINING_REWARD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = load_config("does-not-exist.toml").unwrap();
        assert_eq!(config.node.api_port, 5000);
        assert_eq!(config.chain.difficulty, DEFAULT_DIFFICULTY);
        assert_eq!(config.chain.mining_reward, DEFAULT_MINING_REWARD);
        assert!(config.node.bootstrap_peers.is_empty());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[node]\napi_port = 6001\nbootstrap_peers = [\"http://localhost:6002\"]\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.node.api_port, 6001);
        assert_eq!(config.node.bootstrap_peers.len(), 1);
        assert_eq!(config.chain.difficulty, DEFAULT_DIFFICULTY);
        assert!(config.miner.reward_address.is_none());
    }

    #[test]
    fn test_miner_section_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[miner]\nreward_address = \"02abc123\"\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.miner.reward_address.as_deref(), Some("02abc123"));
        assert_eq!(config.node.api_port, 5000);
    }

    #[test]
    fn test_negative_reward_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[chain]\nmining_reward = -5.0\n").unwrap();

        assert!(matches!(
            load_config(&path),
            Err(ChainError::ConfigError(_))
        ));
    }
}

//! HTTP node: REST endpoints, peer registry, and consensus resolution
//!
//! The node wraps a shared ledger behind an RwLock and exposes the core
//! operations over HTTP. Peer interactions (transaction broadcast and
//! candidate-chain fetching) are independent, best-effort, and
//! timeout-bounded; a failed peer is skipped, never fatal.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::blockchain::Blockchain;
use crate::consensus::Consensus;
use crate::error::ChainError;
use crate::transaction::Transaction;

const PEER_REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

/// Shared node state handed to every request handler.
#[derive(Clone)]
pub struct Node {
    pub blockchain: Arc<RwLock<Blockchain>>,
    pub peers: Arc<RwLock<HashSet<String>>>,
    http: reqwest::Client,
    data_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct MineRequest {
    miner_address: String,
}

#[derive(Debug, Deserialize)]
struct PeerRequest {
    peer: String,
}

impl Node {
    pub fn new(blockchain: Blockchain, data_file: Option<PathBuf>) -> Result<Self, ChainError> {
        let http = reqwest::Client::builder()
            .timeout(PEER_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ChainError::NetworkError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            blockchain: Arc::new(RwLock::new(blockchain)),
            peers: Arc::new(RwLock::new(HashSet::new())),
            http,
            data_file,
        })
    }

    /// Register this node with a remote peer and remember it locally.
    pub async fn register_with_peer(&self, peer: &str, own_url: &str) -> Result<(), ChainError> {
        self.http
            .post(format!("{}/peers/register", peer))
            .json(&json!({ "peer": own_url }))
            .send()
            .await
            .map_err(|e| ChainError::NetworkError(format!("Failed to reach peer {}: {}", peer, e)))?;

        self.peers.write().await.insert(peer.to_string());
        info!("Registered with peer {}", peer);
        Ok(())
    }

    /// Broadcast a transaction to every known peer, ignoring failures.
    async fn broadcast_transaction(&self, transaction: &Transaction) {
        let peers: Vec<String> = self.peers.read().await.iter().cloned().collect();
        for peer in peers {
            let result = self
                .http
                .post(format!("{}/transactions/new", peer))
                .json(transaction)
                .send()
                .await;
            if let Err(e) = result {
                debug!("Broadcast to {} failed: {}", peer, e);
            }
        }
    }

    /// Fetch candidate chains from all peers. Each fetch is independent;
    /// unreachable peers and malformed responses are simply excluded.
    async fn fetch_candidate_chains(&self) -> Vec<Vec<crate::block::Block>> {
        let peers: Vec<String> = self.peers.read().await.iter().cloned().collect();
        let mut candidates = Vec::new();

        for peer in peers {
            let response = match self.http.get(format!("{}/chain", peer)).send().await {
                Ok(resp) => resp,
                Err(e) => {
                    warn!("Failed to fetch chain from {}: {}", peer, e);
                    continue;
                }
            };

            match response.json::<Blockchain>().await {
                Ok(snapshot) => candidates.push(snapshot.chain),
                Err(e) => warn!("Malformed chain snapshot from {}: {}", peer, e),
            }
        }

        candidates
    }

    /// Resolve conflicts against all known peers. Returns true when the
    /// local chain was replaced.
    pub async fn resolve_conflicts(&self) -> bool {
        let candidates = self.fetch_candidate_chains().await;
        let replaced = {
            let mut blockchain = self.blockchain.write().await;
            Consensus::resolve(&mut blockchain, candidates)
        };

        if replaced {
            self.persist().await;
        }
        replaced
    }

    /// Best-effort ledger persistence after a state change.
    async fn persist(&self) {
        if let Some(path) = &self.data_file {
            let blockchain = self.blockchain.read().await;
            if let Err(e) = blockchain.save_to_file(path) {
                warn!("Failed to persist ledger to {}: {}", path.display(), e);
            }
        }
    }

    /// Serve the HTTP API until the process is stopped.
    pub async fn run(self, port: u16) -> Result<(), ChainError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let router = build_router(self);

        info!("Embercoin node listening on {}", addr);
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ChainError::NetworkError(format!("Failed to bind {}: {}", addr, e)))?;
        axum::serve(listener, router)
            .await
            .map_err(|e| ChainError::NetworkError(format!("Server error: {}", e)))?;
        Ok(())
    }
}

pub fn build_router(node: Node) -> Router {
    Router::new()
        .route("/chain", get(get_chain))
        .route("/transactions/new", post(new_transaction))
        .route("/mine", post(mine))
        .route("/balance/:address", get(get_balance))
        .route("/validate", get(validate_chain))
        .route("/peers/register", post(register_peer))
        .route("/peers", get(get_peers))
        .route("/consensus", get(consensus))
        .with_state(node)
}

/// GET /chain - full ledger snapshot
async fn get_chain(State(node): State<Node>) -> Json<Blockchain> {
    Json(node.blockchain.read().await.clone())
}

/// POST /transactions/new - submit a transaction to the pending pool
async fn new_transaction(
    State(node): State<Node>,
    Json(transaction): Json<Transaction>,
) -> (StatusCode, Json<Value>) {
    let result = {
        let mut blockchain = node.blockchain.write().await;
        blockchain.submit_transaction(transaction.clone())
    };

    match result {
        Ok(()) => {
            node.broadcast_transaction(&transaction).await;
            (
                StatusCode::CREATED,
                Json(json!({ "message": "Transaction added to pending pool" })),
            )
        }
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": e.to_string() })),
        ),
    }
}

/// POST /mine - mine the pending pool into a new block
async fn mine(
    State(node): State<Node>,
    Json(request): Json<MineRequest>,
) -> (StatusCode, Json<Value>) {
    if request.miner_address.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Miner address required" })),
        );
    }

    // Proof-of-work is the sole CPU-bound blocking operation; keep it off
    // the async reactor threads.
    let result = {
        let mut blockchain = node.blockchain.write().await;
        tokio::task::block_in_place(|| {
            blockchain.mine_pending_transactions(&request.miner_address)
        })
    };

    match result {
        Ok(block) => {
            node.persist().await;
            (
                StatusCode::OK,
                Json(json!({ "message": "Block mined successfully", "block": block })),
            )
        }
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": e.to_string() })),
        ),
    }
}

/// GET /balance/:address - derived balance of an address
async fn get_balance(State(node): State<Node>, Path(address): Path<String>) -> Json<Value> {
    let balance = node.blockchain.read().await.balance_of(&address);
    Json(json!({ "address": address, "balance": balance }))
}

/// GET /validate - chain integrity check
async fn validate_chain(State(node): State<Node>) -> Json<Value> {
    let valid = node.blockchain.read().await.verify_chain();
    Json(json!({ "valid": valid }))
}

/// POST /peers/register - add a peer to the registry
async fn register_peer(
    State(node): State<Node>,
    Json(request): Json<PeerRequest>,
) -> (StatusCode, Json<Value>) {
    if request.peer.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Invalid peer" })),
        );
    }

    node.peers.write().await.insert(request.peer.clone());
    (
        StatusCode::CREATED,
        Json(json!({ "message": format!("Peer {} registered", request.peer) })),
    )
}

/// GET /peers - list registered peers
async fn get_peers(State(node): State<Node>) -> Json<Value> {
    let peers: Vec<String> = node.peers.read().await.iter().cloned().collect();
    Json(json!({ "peers": peers }))
}

/// GET /consensus - run longest-valid-chain resolution against peers
async fn consensus(State(node): State<Node>) -> Json<Value> {
    let replaced = node.resolve_conflicts().await;
    let blockchain = node.blockchain.read().await;

    if replaced {
        Json(json!({ "message": "Chain was replaced", "chain": &*blockchain }))
    } else {
        Json(json!({ "message": "Chain is authoritative", "chain": &*blockchain }))
    }
}

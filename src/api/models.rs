use crate::blockchain::{Block, Evidence, Ledger, Miner};
use crate::config::Config;
use crate::transaction::Record;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Shared application state: the ledger behind one lock, plus the miner
/// wired with the configured collaborators.
pub struct AppState {
    pub ledger: Mutex<Ledger>,
    pub miner: Miner,
}

impl AppState {
    pub fn from_config(config: &Config) -> Self {
        Self {
            ledger: Mutex::new(Ledger::new(config.policy)),
            miner: config.miner(),
        }
    }
}

/* ---------- Chain API Models ---------- */

#[derive(Serialize)]
pub struct ChainResponse<'a> {
    pub length: usize,
    pub chain: &'a [Block],
}

#[derive(Serialize, Deserialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub length: usize,
    pub failed_index: Option<u64>,
    pub reason: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct DifficultyResponse {
    pub base: u32,
    pub reduced: u32,
}

/* ---------- Mining API Models ---------- */

#[derive(Deserialize, Default)]
pub struct MineRequest {
    pub evidence: Option<Evidence>,
}

#[derive(Serialize, Deserialize)]
pub struct MineResponse {
    pub mined_index: u64,
    pub hash: String,
    pub nonce: u64,
    pub difficulty: u32,
    pub records: usize,
}

/* ---------- TX API Models ---------- */

#[derive(Deserialize)]
pub struct NewTxRequest {
    pub sender: String,
    pub recipient: String,
    pub quantity: u64,
}

#[derive(Serialize, Deserialize)]
pub struct NewTxResponse {
    pub pending: usize,
    pub record: Record,
}

#[derive(Serialize)]
pub struct MempoolResponse<'a> {
    pub size: usize,
    pub records: Vec<&'a Record>,
}

/* ---------- Stats ---------- */

#[derive(Serialize, Deserialize)]
pub struct StatsResponse {
    pub height: usize,
    pub base_difficulty: u32,
    pub reduced_difficulty: u32,
    pub last_interval_secs: Option<i64>,
    pub mempool_size: usize,
    pub max_attempts: u64,
}

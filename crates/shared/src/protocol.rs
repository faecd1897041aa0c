use serde::{Deserialize, Serialize};

/// Length of a hex-encoded SHA-256d digest.
pub const HASH_HEX_LEN: usize = 64;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MineRequest {
    pub target_difficulty: i64,
}

/// Full reply of the job endpoint. Clients only keep the [`MiningJobResult`] subset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MineResponse {
    pub block_header: String,
    pub nonce: u64,
    pub hash: String,
    pub iterations: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiningJobResult {
    pub nonce: u64,
    pub hash: String,
    pub iterations: u64,
}

impl MiningJobResult {
    pub fn has_well_formed_hash(&self) -> bool {
        self.hash.len() == HASH_HEX_LEN && self.hash.bytes().all(|b| b.is_ascii_hexdigit())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub hash_rate: f64,
    pub total_hashes: u64,
    pub current_difficulty: u32,
    pub is_mining: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopResponse {
    pub status: String,
}

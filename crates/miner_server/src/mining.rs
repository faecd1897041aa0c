//! SHA-256d nonce search and the shared counters the API and relay read from.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex, MutexGuard, PoisonError,
    },
    time::Instant,
};

use sha2::{Digest, Sha256};
use shared::protocol::{MineResponse, StatsSnapshot};
use tracing::{debug, info};

/// Demonstration header every job hashes against.
pub const BLOCK_HEADER: &str = "00000000000000000000000000000000";

/// A SHA-256 digest has 256 bits; anything above can never be satisfied.
pub const MAX_DIFFICULTY: u32 = 256;

const STATS_BATCH: u64 = 10_000;
const EXHAUSTED_HASH: &str = "No valid hash found";

pub fn sha256d(data: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(data);
    Sha256::digest(first).into()
}

/// True when `hash` starts with at least `bits` zero bits.
pub fn meets_difficulty(hash: &[u8], bits: u32) -> bool {
    let Ok(bits) = usize::try_from(bits) else {
        return false;
    };
    if bits > hash.len() * 8 {
        return false;
    }

    let (full_bytes, remaining_bits) = (bits / 8, bits % 8);
    if hash[..full_bytes].iter().any(|byte| *byte != 0) {
        return false;
    }
    if remaining_bits == 0 {
        return true;
    }
    let mask = 0xFFu8 << (8 - remaining_bits);
    hash[full_bytes] & mask == 0
}

#[derive(Debug, Default)]
pub struct MiningState {
    running: AtomicBool,
    stop_requested: AtomicBool,
    stats: Mutex<StatsSnapshot>,
}

impl MiningState {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_stats(&self) -> MutexGuard<'_, StatsSnapshot> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        self.lock_stats().clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Claims the single job slot. Returns false while another job still runs.
    pub fn try_begin(&self, difficulty: u32) -> bool {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        self.stop_requested.store(false, Ordering::Release);

        let mut stats = self.lock_stats();
        stats.is_mining = true;
        stats.current_difficulty = difficulty;
        stats.total_hashes = 0;
        true
    }

    /// Asks the running job to return at its next nonce. Harmless when idle.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.lock_stats().is_mining = false;
    }

    fn stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    fn record_progress(&self, total_hashes: u64, hash_rate: Option<f64>) {
        let mut stats = self.lock_stats();
        stats.total_hashes = total_hashes;
        if let Some(rate) = hash_rate {
            stats.hash_rate = rate;
        }
    }

    fn finish(&self, total_hashes: u64, hash_rate: Option<f64>) {
        {
            let mut stats = self.lock_stats();
            stats.total_hashes = total_hashes;
            if let Some(rate) = hash_rate {
                stats.hash_rate = rate;
            }
            stats.is_mining = false;
        }
        self.running.store(false, Ordering::Release);
    }
}

/// Searches nonces from zero until one meets `difficulty` or a stop is requested.
///
/// Blocking; callers run it on a blocking thread after [`MiningState::try_begin`] succeeded.
pub fn mine_block(block_header: &str, difficulty: u32, state: &MiningState) -> MineResponse {
    let started = Instant::now();
    let mut window_start = started;
    let mut window_hashes = 0u64;

    for nonce in 0..u64::MAX {
        let hash = sha256d(format!("{block_header}{nonce}").as_bytes());
        let hashed = nonce + 1;
        window_hashes += 1;

        if hashed % STATS_BATCH == 0 {
            let elapsed = window_start.elapsed().as_secs_f64();
            let rate = (elapsed >= 1.0).then(|| window_hashes as f64 / elapsed);
            if rate.is_some() {
                window_start = Instant::now();
                window_hashes = 0;
            }
            state.record_progress(hashed, rate);
        }

        let found = meets_difficulty(&hash, difficulty);
        if found || state.stop_requested() {
            let elapsed = started.elapsed().as_secs_f64();
            let rate = (elapsed > 0.0).then(|| hashed as f64 / elapsed);
            state.finish(hashed, rate);
            if found {
                info!(nonce, difficulty, iterations = hashed, "mining: block found");
            } else {
                info!(nonce, difficulty, iterations = hashed, "mining: stopped");
            }
            return MineResponse {
                block_header: block_header.to_string(),
                nonce,
                hash: hex::encode(hash),
                iterations: hashed,
            };
        }
    }

    debug!(difficulty, "mining: nonce space exhausted");
    state.finish(u64::MAX, None);
    MineResponse {
        block_header: block_header.to_string(),
        nonce: 0,
        hash: EXHAUSTED_HASH.to_string(),
        iterations: u64::MAX,
    }
}

#[cfg(test)]
#[path = "tests/mining_tests.rs"]
mod tests;

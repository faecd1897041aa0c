use super::*;

use std::{sync::Arc, thread, time::Duration};

#[test]
fn sha256d_hashes_twice() {
    let once = Sha256::digest(b"abc");
    let twice: [u8; 32] = Sha256::digest(once).into();
    assert_eq!(sha256d(b"abc"), twice);
    assert_ne!(sha256d(b"abc"), sha256d(b"abd"));
}

#[test]
fn difficulty_counts_leading_zero_bits() {
    let hash = [0x00, 0x0F, 0xFF, 0xFF];
    assert!(meets_difficulty(&hash, 0));
    assert!(meets_difficulty(&hash, 8));
    assert!(meets_difficulty(&hash, 12));
    assert!(!meets_difficulty(&hash, 13));
    assert!(!meets_difficulty(&hash, 16));
}

#[test]
fn difficulty_beyond_digest_width_is_never_met() {
    let zeros = [0u8; 32];
    assert!(meets_difficulty(&zeros, MAX_DIFFICULTY));
    assert!(!meets_difficulty(&zeros, MAX_DIFFICULTY + 1));
    assert!(!meets_difficulty(&zeros, u32::MAX));
}

#[test]
fn mine_block_finds_hash_meeting_difficulty() {
    let state = MiningState::new();
    assert!(state.try_begin(8));

    let result = mine_block(BLOCK_HEADER, 8, &state);
    let digest = hex::decode(&result.hash).expect("hex digest");

    assert_eq!(result.block_header, BLOCK_HEADER);
    assert!(meets_difficulty(&digest, 8));
    assert_eq!(
        digest,
        sha256d(format!("{BLOCK_HEADER}{}", result.nonce).as_bytes())
    );
    assert_eq!(result.iterations, result.nonce + 1);

    let stats = state.snapshot();
    assert!(!stats.is_mining);
    assert_eq!(stats.current_difficulty, 8);
    assert_eq!(stats.total_hashes, result.iterations);
    assert!(!state.is_running());
}

#[test]
fn only_one_job_runs_at_a_time() {
    let state = MiningState::new();
    assert!(state.try_begin(4));
    assert!(!state.try_begin(4));

    mine_block(BLOCK_HEADER, 4, &state);
    assert!(state.try_begin(4));
}

#[test]
fn stop_request_ends_an_unsatisfiable_search() {
    let state = Arc::new(MiningState::new());
    assert!(state.try_begin(MAX_DIFFICULTY));

    let worker = {
        let state = Arc::clone(&state);
        thread::spawn(move || mine_block(BLOCK_HEADER, MAX_DIFFICULTY, &state))
    };
    thread::sleep(Duration::from_millis(50));
    state.request_stop();

    let result = worker.join().expect("miner thread");
    assert_eq!(result.hash.len(), 64);
    assert!(result.iterations > 0);
    assert!(!state.snapshot().is_mining);
    assert!(!state.is_running());
}

// Multi-megabyte pipelines: scattered edits, odd tails, low match rates.

use blockdelta::engine::{self, SignatureOptions};
use rand::{Rng, SeedableRng, rngs::StdRng};

fn roundtrip(basis: &[u8], new: &[u8], block_size: u32) {
    let sig = engine::signature_to_vec(basis, &SignatureOptions { block_size }).unwrap();
    let delta = engine::delta_to_vec(&sig, new).unwrap();
    let reconstructed = engine::patch_to_vec(basis, &delta).unwrap();
    assert_eq!(reconstructed, new);
}

#[test]
fn scattered_edits_keep_delta_small() {
    let mut rng = StdRng::seed_from_u64(42);
    let basis: Vec<u8> = (0..4 * 1024 * 1024).map(|_| rng.random()).collect();

    let mut new = basis.clone();
    for i in (0..new.len()).step_by(512 * 1024) {
        new[i] = new[i].wrapping_add(1);
    }

    let sig = engine::signature_to_vec(&basis, &SignatureOptions { block_size: 32 * 1024 }).unwrap();
    let delta = engine::delta_to_vec(&sig, &new).unwrap();

    // 8 edited blocks out of 128 become literals; the delta must stay well
    // under the full file size.
    assert!(
        delta.len() < new.len() / 2,
        "delta {} bytes vs new {} bytes",
        delta.len(),
        new.len()
    );
    assert_eq!(engine::patch_to_vec(&basis, &delta).unwrap(), new);
}

#[test]
fn odd_tail_survives_growth_and_shrink() {
    let mut rng = StdRng::seed_from_u64(7);
    let basis: Vec<u8> = (0..1_000_003).map(|_| rng.random()).collect();

    let mut grown = basis.clone();
    grown.extend_from_slice(&[0xABu8; 12_345]);
    roundtrip(&basis, &grown, 4096);

    let shrunk = basis[..basis.len() - 54_321].to_vec();
    roundtrip(&basis, &shrunk, 4096);
}

#[test]
fn unrelated_files_still_roundtrip() {
    let mut rng = StdRng::seed_from_u64(99);
    let basis: Vec<u8> = (0..512 * 1024).map(|_| rng.random()).collect();
    let new: Vec<u8> = (0..700_001).map(|_| rng.random()).collect();
    roundtrip(&basis, &new, 8192);
}

#[test]
fn repetitive_content_roundtrips() {
    // Every basis block is identical; the index collapses to one digest.
    let basis = vec![0u8; 256 * 1024];
    let mut new = vec![0u8; 300 * 1024];
    new[123_123] = 1;
    roundtrip(&basis, &new, 4096);
}

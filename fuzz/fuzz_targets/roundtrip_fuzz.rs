#![no_main]

// Full pipeline over fuzzer-chosen basis/new splits and block sizes: the
// reconstruction must always equal the new file exactly.

use blockdelta::engine::{self, SignatureOptions};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let (params, rest) = match data.split_first_chunk::<2>() {
        Some(split) => split,
        None => return,
    };
    let block_size = u32::from(u16::from_le_bytes(*params)).max(1);
    let split = rest.len() / 2;
    let (basis, new) = rest.split_at(split);

    let sig = engine::signature_to_vec(basis, &SignatureOptions { block_size })
        .expect("signature failed");
    let delta = engine::delta_to_vec(&sig, new).expect("delta failed");
    let reconstructed = engine::patch_to_vec(basis, &delta).expect("patch failed");
    assert_eq!(reconstructed, new);
});

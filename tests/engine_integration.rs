// End-to-end properties of the signature -> delta -> patch pipeline.

use blockdelta::engine::{self, SignatureOptions};
use blockdelta::error::DeltaError;
use blockdelta::format::delta::{DeltaReader, Instruction};
use blockdelta::format::signature::Signature;

fn sig(basis: &[u8], block_size: u32) -> Vec<u8> {
    engine::signature_to_vec(basis, &SignatureOptions { block_size }).unwrap()
}

fn instructions(delta: &[u8]) -> Vec<Instruction> {
    DeltaReader::new(delta)
        .unwrap()
        .instructions()
        .map(|i| i.unwrap())
        .collect()
}

fn roundtrip(basis: &[u8], new: &[u8], block_size: u32) -> Vec<u8> {
    let delta = engine::delta_to_vec(&sig(basis, block_size), new).unwrap();
    let reconstructed = engine::patch_to_vec(basis, &delta).unwrap();
    assert_eq!(reconstructed, new);
    delta
}

#[test]
fn roundtrip_identity_matrix() {
    let basis = b"0123456789abcdef0123";
    let new = b"0123456789abcdefXYZ";
    for block_size in [1, 2, 3, 4, 7, 8, 16, 32] {
        roundtrip(basis, new, block_size);
        roundtrip(basis, basis, block_size);
        roundtrip(b"", new, block_size);
        roundtrip(basis, b"", block_size);
        roundtrip(b"", b"", block_size);
    }
}

#[test]
fn empty_basis_degenerates_to_literals() {
    let new = b"nothing here can match anything";
    let delta = engine::delta_to_vec(&sig(b"", 8), new).unwrap();
    let insts = instructions(&delta);
    let mut concatenated = Vec::new();
    for inst in &insts {
        match inst {
            Instruction::Literal { data } => concatenated.extend_from_slice(data),
            Instruction::Copy { .. } => panic!("copy instruction against an empty basis"),
        }
    }
    assert_eq!(concatenated, new);
}

#[test]
fn identical_file_is_pure_ascending_copies() {
    // 2.5 blocks: tail included.
    let basis = b"AAAABBBBCC";
    let delta = engine::delta_to_vec(&sig(basis, 4), basis).unwrap();
    assert_eq!(
        instructions(&delta),
        vec![
            Instruction::Copy { index: 0 },
            Instruction::Copy { index: 1 },
            Instruction::Copy { index: 2 },
        ]
    );
}

#[test]
fn tail_block_descriptor_length() {
    let basis = vec![0x5Au8; 10];
    let signature = Signature::from_bytes(&sig(&basis, 4)).unwrap();
    assert_eq!(signature.total_blocks(), 3);
    assert_eq!(signature.blocks()[2].length, 2); // 10 mod 4

    let evenly = vec![0x5Au8; 8];
    let signature = Signature::from_bytes(&sig(&evenly, 4)).unwrap();
    assert_eq!(signature.total_blocks(), 2);
    assert_eq!(signature.blocks()[1].length, 4); // full-size tail
}

#[test]
fn copy_of_tail_block_reproduces_exact_bytes() {
    let basis = b"AAAABBBBCC";
    let delta = engine::delta_to_vec(&sig(basis, 4), b"CC").unwrap();
    assert_eq!(instructions(&delta), vec![Instruction::Copy { index: 2 }]);
    assert_eq!(engine::patch_to_vec(basis, &delta).unwrap(), b"CC");
}

#[test]
fn position_independence() {
    let delta = roundtrip(b"AAAABBBB", b"BBBBAAAA", 4);
    assert_eq!(
        instructions(&delta),
        vec![Instruction::Copy { index: 1 }, Instruction::Copy { index: 0 }]
    );
}

#[test]
fn consecutive_unmatched_chunks_merge() {
    let delta = engine::delta_to_vec(&sig(b"AAAABBBB", 4), b"XXXXYYYY").unwrap();
    let insts = instructions(&delta);
    assert_eq!(
        insts,
        vec![Instruction::Literal {
            data: b"XXXXYYYY".to_vec()
        }]
    );
}

#[test]
fn truncated_final_literal_is_corrupt_delta() {
    let basis = b"AAAABBBB";
    let mut delta = engine::delta_to_vec(&sig(basis, 4), b"AAAAtail").unwrap();
    // Drop the trailer plus one payload byte so the literal itself is cut.
    delta.truncate(delta.len() - 34);
    let err = engine::patch_to_vec(basis, &delta).unwrap_err();
    assert!(matches!(err, DeltaError::CorruptDelta(_)), "{err}");
}

#[test]
fn truncated_trailer_is_corrupt_delta() {
    let basis = b"AAAABBBB";
    let mut delta = engine::delta_to_vec(&sig(basis, 4), b"AAAAtail").unwrap();
    delta.pop();
    let err = engine::patch_to_vec(basis, &delta).unwrap_err();
    assert!(matches!(err, DeltaError::CorruptDelta(_)), "{err}");
}

#[test]
fn wrong_size_basis_is_basis_mismatch() {
    let basis = b"AAAABBBB";
    let delta = engine::delta_to_vec(&sig(basis, 4), b"AAAABBBB").unwrap();
    let err = engine::patch_to_vec(b"AAAABBBBCC", &delta).unwrap_err();
    assert!(matches!(err, DeltaError::BasisMismatch(_)), "{err}");
}

#[test]
fn tampered_basis_is_checksum_mismatch() {
    let basis = b"AAAABBBB";
    let delta = engine::delta_to_vec(&sig(basis, 4), b"AAAABBBB").unwrap();
    let err = engine::patch_to_vec(b"AAAACBBB", &delta).unwrap_err();
    assert!(matches!(err, DeltaError::ChecksumMismatch { .. }), "{err}");
}

#[test]
fn unknown_tag_is_format_error() {
    let basis = b"AAAABBBB";
    let mut delta = engine::delta_to_vec(&sig(basis, 4), b"AAAABBBB").unwrap();
    delta[16] = 0xFE; // first instruction tag
    let err = engine::patch_to_vec(basis, &delta).unwrap_err();
    assert!(matches!(err, DeltaError::Format(_)), "{err}");
}

#[test]
fn delta_block_size_follows_signature() {
    let basis = vec![1u8; 100];
    let delta = engine::delta_to_vec(&sig(&basis, 16), &basis).unwrap();
    assert_eq!(DeltaReader::new(delta.as_slice()).unwrap().header().block_size, 16);
}

#[test]
fn insertion_shifts_downstream_blocks_to_literals() {
    // One byte inserted at the front misaligns every later chunk; the
    // format gives up on them by design, so the whole new file comes out
    // as one literal run but still round-trips exactly.
    let basis: Vec<u8> = (0..=255u8).cycle().take(64).collect();
    let mut new = vec![0xEEu8];
    new.extend_from_slice(&basis);

    let delta = engine::delta_to_vec(&sig(&basis, 16), &new).unwrap();
    let insts = instructions(&delta);
    assert_eq!(insts.len(), 1);
    assert!(matches!(insts[0], Instruction::Literal { .. }));
    assert_eq!(engine::patch_to_vec(&basis, &delta).unwrap(), new);
}

#[test]
fn shared_zero_blocks_pick_lowest_index() {
    // Blocks 0, 1, 2 all zeros; a zero chunk in the new file must resolve
    // to block 0 every time.
    let basis = vec![0u8; 12];
    let delta = engine::delta_to_vec(&sig(&basis, 4), &vec![0u8; 8]).unwrap();
    assert_eq!(
        instructions(&delta),
        vec![Instruction::Copy { index: 0 }, Instruction::Copy { index: 0 }]
    );
}

// Pins the wire formats byte-for-byte so the codecs cannot drift.
//
// Any failure here means previously written signature/delta files would no
// longer decode; that is a format break, not a refactor.

use blockdelta::engine::{self, SignatureOptions};
use sha2::{Digest, Sha256};

fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

#[test]
fn signature_wire_layout() {
    // basis "AAAABB" with block size 4: blocks "AAAA" and tail "BB".
    let sig = engine::signature_to_vec(b"AAAABB", &SignatureOptions { block_size: 4 }).unwrap();

    let mut expected = Vec::new();
    expected.extend_from_slice(&[0xD3, 0xC9, 0xC7, 0x00]); // magic + version
    expected.extend_from_slice(&4u32.to_le_bytes()); // block size
    expected.extend_from_slice(&sha256(b"AAAA"));
    expected.extend_from_slice(&4u32.to_le_bytes());
    expected.extend_from_slice(&sha256(b"BB"));
    expected.extend_from_slice(&2u32.to_le_bytes());

    assert_eq!(sig, expected);
}

#[test]
fn empty_basis_signature_is_header_only() {
    let sig = engine::signature_to_vec(b"", &SignatureOptions { block_size: 32768 }).unwrap();
    let mut expected = vec![0xD3, 0xC9, 0xC7, 0x00];
    expected.extend_from_slice(&32768u32.to_le_bytes());
    assert_eq!(sig, expected);
}

#[test]
fn delta_wire_layout() {
    // basis "AAAABBBB"; new file "BBBBxxAAAA". Chunking the new file at
    // block boundaries gives "BBBB" | "xxAA" | "AA": one copy of basis
    // block 1, then one merged literal for the misaligned remainder.
    let basis = b"AAAABBBB";
    let new = b"BBBBxxAAAA";
    let sig = engine::signature_to_vec(basis, &SignatureOptions { block_size: 4 }).unwrap();
    let delta = engine::delta_to_vec(&sig, new).unwrap();

    let mut expected = Vec::new();
    expected.extend_from_slice(&[0xC4, 0xCC, 0xD4, 0x00]); // magic + version
    expected.extend_from_slice(&4u32.to_le_bytes()); // block size
    expected.extend_from_slice(&8u64.to_le_bytes()); // basis size
    expected.push(b'C');
    expected.extend_from_slice(&1u32.to_le_bytes());
    expected.push(b'L');
    expected.extend_from_slice(&6u64.to_le_bytes());
    expected.extend_from_slice(b"xxAAAA");
    expected.push(b'H');
    expected.extend_from_slice(&sha256(new));

    assert_eq!(delta, expected);
}

#[test]
fn empty_new_file_delta_is_header_and_trailer() {
    let sig = engine::signature_to_vec(b"basis!", &SignatureOptions { block_size: 4 }).unwrap();
    let delta = engine::delta_to_vec(&sig, b"").unwrap();

    let mut expected = Vec::new();
    expected.extend_from_slice(&[0xC4, 0xCC, 0xD4, 0x00]);
    expected.extend_from_slice(&4u32.to_le_bytes());
    expected.extend_from_slice(&6u64.to_le_bytes());
    expected.push(b'H');
    expected.extend_from_slice(&sha256(b""));

    assert_eq!(delta, expected);
}

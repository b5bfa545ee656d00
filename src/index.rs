// Block index: digest -> basis block positions.
//
// Built fresh from a decoded signature for each delta computation and owned
// exclusively by it. Distinct basis offsets may legitimately share content
// (runs of zeros), so a digest maps to a list of indices.

use std::collections::HashMap;

use crate::block::BlockDigest;
use crate::format::signature::Signature;

/// Lookup structure over a signature's descriptors.
///
/// Indices are inserted in descriptor order, so each per-digest list is
/// ascending and the first length match is the lowest index.
pub struct BlockIndex<'a> {
    signature: &'a Signature,
    by_digest: HashMap<BlockDigest, Vec<u32>>,
}

impl<'a> BlockIndex<'a> {
    /// Build the index from a decoded signature.
    pub fn build(signature: &'a Signature) -> Self {
        let mut by_digest: HashMap<BlockDigest, Vec<u32>> =
            HashMap::with_capacity(signature.total_blocks());
        for (index, block) in signature.blocks().iter().enumerate() {
            by_digest
                .entry(block.digest)
                .or_default()
                .push(index as u32);
        }
        Self {
            signature,
            by_digest,
        }
    }

    /// Find the basis block matching `digest` AND `length` exactly,
    /// returning the lowest matching index.
    ///
    /// The length comparison is what keeps a short tail chunk of new-file
    /// data from matching a full-size basis block whose hash happens to
    /// coincide at a truncation boundary.
    pub fn lookup(&self, digest: &BlockDigest, length: u32) -> Option<u32> {
        self.by_digest
            .get(digest)?
            .iter()
            .copied()
            .find(|&i| self.signature.blocks()[i as usize].length == length)
    }

    /// Number of distinct digests indexed.
    pub fn distinct_digests(&self) -> usize {
        self.by_digest.len()
    }
}

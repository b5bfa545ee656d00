// Signature file codec.
//
// Layout:
//   [magic: 4 bytes, includes version]
//   [block_size: u32 LE]
//   repeated:
//     [digest: 32 bytes]
//     [length: u32 LE]
//
// Descriptor order is significant: a block's position in the sequence is
// its only addressable identity, mapping 1:1 to its byte offset in the
// basis file (`index * block_size`, except the tail block).

use std::io::{self, Read, Write};

use crate::block::{BlockDigest, DIGEST_LEN};
use crate::error::{DeltaError, Result};
use crate::format::{self, SIGNATURE_MAGIC};

// ---------------------------------------------------------------------------
// Block descriptor
// ---------------------------------------------------------------------------

/// One basis block: its digest and exact byte length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockDescriptor {
    pub digest: BlockDigest,
    pub length: u32,
}

// ---------------------------------------------------------------------------
// Decoded signature
// ---------------------------------------------------------------------------

/// A decoded signature: the block size it was produced with and the ordered
/// descriptor sequence.
///
/// The descriptor list is digest+length per block, not block content, so it
/// stays small in memory even for very large basis files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    block_size: u32,
    blocks: Vec<BlockDescriptor>,
}

impl Signature {
    /// Block size used to produce this signature.
    #[inline]
    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    /// Number of basis blocks described.
    #[inline]
    pub fn total_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// The ordered descriptor sequence.
    #[inline]
    pub fn blocks(&self) -> &[BlockDescriptor] {
        &self.blocks
    }

    /// Exact basis file size: the sum of descriptor lengths.
    pub fn basis_size(&self) -> u64 {
        self.blocks.iter().map(|b| u64::from(b.length)).sum()
    }

    /// Parse a signature stream.
    ///
    /// Reads descriptors to EOF. A partial trailing record is
    /// `CorruptSignature`; so is a non-final descriptor shorter than the
    /// block size (blocks are full-size except possibly the last) or any
    /// descriptor of length 0 or beyond the block size.
    pub fn read_from<R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let block_size = read_header(reader)?;

        let mut blocks: Vec<BlockDescriptor> = Vec::new();
        let mut record = [0u8; DIGEST_LEN + 4];
        loop {
            // Records are fixed-width, so distinguish clean EOF (at a record
            // boundary) from truncation (inside a record).
            let n = crate::block::read_block(reader, &mut record)?;
            if n == 0 {
                break;
            }
            if n < record.len() {
                return Err(DeltaError::CorruptSignature(format!(
                    "truncated descriptor at block {}",
                    blocks.len()
                )));
            }

            let mut digest = [0u8; DIGEST_LEN];
            digest.copy_from_slice(&record[..DIGEST_LEN]);
            let mut length_bytes = [0u8; 4];
            length_bytes.copy_from_slice(&record[DIGEST_LEN..]);
            let length = u32::from_le_bytes(length_bytes);

            if length == 0 || length > block_size {
                return Err(DeltaError::CorruptSignature(format!(
                    "block {} has length {length}, valid range is 1..={block_size}",
                    blocks.len()
                )));
            }
            // Copy instructions address blocks with a u32.
            if blocks.len() == u32::MAX as usize {
                return Err(DeltaError::CorruptSignature(
                    "block count exceeds the format limit".to_string(),
                ));
            }
            // Only the tail may be short; seeing a short block mid-sequence
            // means the previous "tail" wasn't final.
            if let Some(prev) = blocks.last()
                && prev.length != block_size
            {
                return Err(DeltaError::CorruptSignature(format!(
                    "short block {} is not the final block",
                    blocks.len() - 1
                )));
            }

            blocks.push(BlockDescriptor { digest, length });
        }

        Ok(Self { block_size, blocks })
    }

    /// Parse a signature held in memory.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::read_from(&mut io::Cursor::new(bytes))
    }
}

fn read_header<R: Read + ?Sized>(reader: &mut R) -> Result<u32> {
    let mut magic = [0u8; 4];
    reader
        .read_exact(&mut magic)
        .map_err(|e| DeltaError::signature_read(e, "header"))?;
    if magic[..3] != SIGNATURE_MAGIC[..3] {
        return Err(DeltaError::Format(format!(
            "not a signature file: bad magic {:02X} {:02X} {:02X}",
            magic[0], magic[1], magic[2]
        )));
    }
    if magic[3] != SIGNATURE_MAGIC[3] {
        return Err(DeltaError::Format(format!(
            "unsupported signature version {:#04X}",
            magic[3]
        )));
    }

    let block_size =
        format::read_u32(reader).map_err(|e| DeltaError::signature_read(e, "header"))?;
    format::check_block_size(block_size).map_err(DeltaError::Format)?;
    Ok(block_size)
}

// ---------------------------------------------------------------------------
// Incremental writer
// ---------------------------------------------------------------------------

/// Writes a signature stream: header once, then one descriptor per block.
///
/// Descriptors go out as they are produced, so the basis file is never
/// buffered in memory.
#[derive(Debug)]
pub struct SignatureWriter<W: Write> {
    writer: W,
    block_size: u32,
    blocks_written: u64,
}

impl<W: Write> SignatureWriter<W> {
    /// Write the header and return the writer. Block size must be nonzero
    /// and at most [`MAX_BLOCK_SIZE`](crate::format::MAX_BLOCK_SIZE).
    pub fn new(mut writer: W, block_size: u32) -> Result<Self> {
        format::check_block_size(block_size).map_err(DeltaError::Format)?;
        writer.write_all(&SIGNATURE_MAGIC)?;
        format::write_u32(&mut writer, block_size)?;
        Ok(Self {
            writer,
            block_size,
            blocks_written: 0,
        })
    }

    /// Append one descriptor.
    pub fn push(&mut self, digest: &BlockDigest, length: u32) -> Result<()> {
        debug_assert!(length >= 1 && length <= self.block_size);
        if self.blocks_written == u64::from(u32::MAX) {
            return Err(DeltaError::Format(
                "basis has more blocks than the format can address".to_string(),
            ));
        }
        self.writer.write_all(digest)?;
        format::write_u32(&mut self.writer, length)?;
        self.blocks_written += 1;
        Ok(())
    }

    /// Number of descriptors written so far.
    pub fn blocks_written(&self) -> u64 {
        self.blocks_written
    }

    /// Flush and return the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::hash_block;

    fn sample_signature() -> Vec<u8> {
        let mut out = Vec::new();
        let mut w = SignatureWriter::new(&mut out, 4).unwrap();
        w.push(&hash_block(b"AAAA"), 4).unwrap();
        w.push(&hash_block(b"BBBB"), 4).unwrap();
        w.push(&hash_block(b"CC"), 2).unwrap();
        w.finish().unwrap();
        out
    }

    #[test]
    fn roundtrip() {
        let bytes = sample_signature();
        let sig = Signature::from_bytes(&bytes).unwrap();
        assert_eq!(sig.block_size(), 4);
        assert_eq!(sig.total_blocks(), 3);
        assert_eq!(sig.basis_size(), 10);
        assert_eq!(sig.blocks()[0].digest, hash_block(b"AAAA"));
        assert_eq!(sig.blocks()[2].length, 2);
    }

    #[test]
    fn empty_basis_has_no_descriptors() {
        let mut out = Vec::new();
        SignatureWriter::new(&mut out, 16).unwrap().finish().unwrap();
        let sig = Signature::from_bytes(&out).unwrap();
        assert_eq!(sig.total_blocks(), 0);
        assert_eq!(sig.basis_size(), 0);
    }

    #[test]
    fn rejects_bad_magic() {
        let err = Signature::from_bytes(b"\x00\x00\x00\x00\x10\x00\x00\x00").unwrap_err();
        assert!(matches!(err, DeltaError::Format(_)));
    }

    #[test]
    fn rejects_unknown_version() {
        let mut bytes = sample_signature();
        bytes[3] = 0x01;
        let err = Signature::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, DeltaError::Format(_)));
    }

    #[test]
    fn rejects_zero_block_size() {
        let mut bytes = SIGNATURE_MAGIC.to_vec();
        bytes.extend_from_slice(&0u32.to_le_bytes());
        let err = Signature::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, DeltaError::Format(_)));
    }

    #[test]
    fn rejects_truncated_header() {
        let err = Signature::from_bytes(&SIGNATURE_MAGIC[..2]).unwrap_err();
        assert!(matches!(err, DeltaError::CorruptSignature(_)));
    }

    #[test]
    fn rejects_partial_descriptor() {
        let mut bytes = sample_signature();
        bytes.pop();
        let err = Signature::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, DeltaError::CorruptSignature(_)));
    }

    #[test]
    fn rejects_short_block_mid_sequence() {
        let mut out = Vec::new();
        let mut w = SignatureWriter::new(&mut out, 4).unwrap();
        w.push(&hash_block(b"AA"), 2).unwrap(); // short, but not final
        w.push(&hash_block(b"BBBB"), 4).unwrap();
        w.finish().unwrap();
        let err = Signature::from_bytes(&out).unwrap_err();
        assert!(matches!(err, DeltaError::CorruptSignature(_)));
    }

    #[test]
    fn rejects_oversized_descriptor_length() {
        let mut bytes = SIGNATURE_MAGIC.to_vec();
        bytes.extend_from_slice(&4u32.to_le_bytes());
        bytes.extend_from_slice(&[0u8; DIGEST_LEN]);
        bytes.extend_from_slice(&5u32.to_le_bytes()); // length > block size
        let err = Signature::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, DeltaError::CorruptSignature(_)));
    }

    #[test]
    fn writer_rejects_zero_block_size() {
        let err = SignatureWriter::new(Vec::new(), 0).unwrap_err();
        assert!(matches!(err, DeltaError::Format(_)));
    }
}

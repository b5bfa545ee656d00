// Delta encoder: matches new-file chunks against the block index.
//
// Push-based: the caller feeds arbitrary byte slices; the encoder
// re-chunks them at the signature's block size, so callers can stream with
// whatever buffer size they like. `finish()` handles the tail chunk,
// flushes any pending literal run and writes the trailer.

use std::io::Write;

use log::debug;

use crate::block::{self, FileHasher};
use crate::error::Result;
use crate::format::delta::{DeltaHeader, DeltaWriter};
use crate::format::signature::Signature;
use crate::index::BlockIndex;

/// Counters describing one delta computation.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeltaStats {
    /// Size of the new file in bytes.
    pub new_size: u64,
    /// Copy instructions emitted.
    pub copies: u64,
    /// Literal instructions emitted (adjacent runs merged).
    pub literal_runs: u64,
    /// Total literal payload bytes.
    pub literal_bytes: u64,
}

/// Streaming delta encoder over one signature.
pub struct DeltaEncoder<'a, W: Write> {
    index: BlockIndex<'a>,
    writer: DeltaWriter<W>,
    block_size: usize,
    /// Partial chunk carried between `write` calls; always < block size.
    chunk: Vec<u8>,
    /// Unmatched bytes awaiting a flush. Adjacent unmatched chunks pile up
    /// here so they leave as a single merged literal instruction.
    pending: Vec<u8>,
    hasher: FileHasher,
    stats: DeltaStats,
}

impl<'a, W: Write> DeltaEncoder<'a, W> {
    /// Start a delta stream against `signature`, writing to `writer`.
    ///
    /// The chunking size is taken from the signature itself, so the delta
    /// can never disagree with the signature about the block size.
    pub fn new(signature: &'a Signature, writer: W) -> Result<Self> {
        let header = DeltaHeader {
            block_size: signature.block_size(),
            basis_size: signature.basis_size(),
        };
        let writer = DeltaWriter::new(writer, &header)?;
        let block_size = signature.block_size() as usize;
        Ok(Self {
            index: BlockIndex::build(signature),
            writer,
            block_size,
            chunk: Vec::with_capacity(block_size),
            pending: Vec::new(),
            hasher: FileHasher::new(),
            stats: DeltaStats::default(),
        })
    }

    /// Feed new-file bytes.
    pub fn write(&mut self, mut bytes: &[u8]) -> Result<()> {
        self.hasher.update(bytes);
        self.stats.new_size += bytes.len() as u64;

        // Top up a partial chunk from a previous call first.
        if !self.chunk.is_empty() {
            let want = self.block_size - self.chunk.len();
            let take = want.min(bytes.len());
            self.chunk.extend_from_slice(&bytes[..take]);
            bytes = &bytes[take..];
            if self.chunk.len() < self.block_size {
                return Ok(());
            }
            let chunk = std::mem::take(&mut self.chunk);
            self.process_chunk(&chunk)?;
            self.chunk = chunk;
            self.chunk.clear();
        }

        // Full blocks straight from the input, no copying.
        while bytes.len() >= self.block_size {
            let (head, rest) = bytes.split_at(self.block_size);
            self.process_chunk(head)?;
            bytes = rest;
        }

        self.chunk.extend_from_slice(bytes);
        Ok(())
    }

    /// Process the tail chunk, flush pending literals, write the trailer.
    /// Returns the underlying writer and the run's counters.
    pub fn finish(mut self) -> Result<(W, DeltaStats)> {
        if !self.chunk.is_empty() {
            let chunk = std::mem::take(&mut self.chunk);
            self.process_chunk(&chunk)?;
        }
        self.flush_pending()?;
        let digest = self.hasher.finalize();
        let writer = self.writer.finish(&digest)?;

        debug!(
            "delta: {} bytes in, {} copies, {} literal runs ({} bytes)",
            self.stats.new_size, self.stats.copies, self.stats.literal_runs, self.stats.literal_bytes
        );
        Ok((writer, self.stats))
    }

    /// One chunk (full-size, or the tail): match it or accumulate it.
    fn process_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        let digest = block::hash_block(chunk);
        match self.index.lookup(&digest, chunk.len() as u32) {
            Some(index) => {
                self.flush_pending()?;
                self.writer.copy(index)?;
                self.stats.copies += 1;
            }
            None => {
                self.pending.extend_from_slice(chunk);
            }
        }
        Ok(())
    }

    fn flush_pending(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        self.writer.literal(&self.pending)?;
        self.stats.literal_runs += 1;
        self.stats.literal_bytes += self.pending.len() as u64;
        self.pending.clear();
        Ok(())
    }
}

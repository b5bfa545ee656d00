// Patch applier: basis file + delta stream -> reconstructed new file.
//
// One forward pass over the instruction stream; the basis is read with
// simple seeks, the output is written sequentially. Every output byte is
// fed to a streaming SHA-256 which must match the delta's trailer.

use std::io::{self, Read, Seek, SeekFrom, Write};

use log::debug;

use crate::block::{self, FileHasher};
use crate::error::{DeltaError, Result};
use crate::format::delta::{DeltaReader, InstructionRecord};

/// Counters describing one patch application.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatchStats {
    /// Bytes written to the output sink.
    pub output_size: u64,
    /// Copy instructions replayed.
    pub copies: u64,
    /// Literal instructions replayed.
    pub literal_runs: u64,
}

/// Replay `delta` against `basis`, writing the reconstructed file to `out`.
///
/// The signature is not needed here: the basis block count and tail length
/// are re-derived from the basis file's actual size and the delta's block
/// size. The actual size must agree with the size echoed in the delta
/// header — a basis of the wrong size can only be the wrong basis, and
/// every copy-length derivation below depends on it.
pub fn apply<B, R, W>(basis: &mut B, mut delta: DeltaReader<R>, out: &mut W) -> Result<PatchStats>
where
    B: Read + Seek + ?Sized,
    R: Read,
    W: Write + ?Sized,
{
    let header = *delta.header();
    let block_size = u64::from(header.block_size);

    let basis_len = basis.seek(SeekFrom::End(0))?;
    if basis_len != header.basis_size {
        return Err(DeltaError::BasisMismatch(format!(
            "basis file is {basis_len} bytes, delta was computed against {} bytes",
            header.basis_size
        )));
    }

    let total_blocks = basis_len.div_ceil(block_size);
    let tail_len = match basis_len % block_size {
        0 => block_size,
        r => r,
    };

    let mut hasher = FileHasher::new();
    let mut stats = PatchStats::default();

    while let Some(record) = delta.next_record()? {
        match record {
            InstructionRecord::Copy { index } => {
                let index = u64::from(index);
                if index >= total_blocks {
                    return Err(DeltaError::BasisMismatch(format!(
                        "copy references block {index}, basis has {total_blocks} blocks"
                    )));
                }
                let expected = if index == total_blocks - 1 {
                    tail_len
                } else {
                    block_size
                };
                basis.seek(SeekFrom::Start(index * block_size))?;
                let mut sink = HashingWriter {
                    inner: out,
                    hasher: &mut hasher,
                };
                let copied = io::copy(&mut ByRef(&mut *basis).take(expected), &mut sink)?;
                if copied < expected {
                    return Err(DeltaError::BasisMismatch(format!(
                        "basis block {index} is short: wanted {expected} bytes, got {copied}"
                    )));
                }
                stats.copies += 1;
                stats.output_size += expected;
            }
            InstructionRecord::Literal { length } => {
                let mut sink = HashingWriter {
                    inner: out,
                    hasher: &mut hasher,
                };
                delta.copy_literal_to(&mut sink)?;
                stats.literal_runs += 1;
                stats.output_size += length;
            }
        }
    }

    let expected = delta
        .trailer()
        .copied()
        .ok_or_else(|| DeltaError::CorruptDelta("stream ended without a trailer".to_string()))?;
    let actual = hasher.finalize();
    if actual != expected {
        return Err(DeltaError::ChecksumMismatch {
            expected: block::hex_digest(&expected),
            actual: block::hex_digest(&actual),
        });
    }

    out.flush()?;
    debug!(
        "patch: wrote {} bytes ({} copies, {} literal runs)",
        stats.output_size, stats.copies, stats.literal_runs
    );
    Ok(stats)
}

// ---------------------------------------------------------------------------
// Adapters
// ---------------------------------------------------------------------------

/// `Read::by_ref` for unsized readers.
struct ByRef<'a, B: ?Sized>(&'a mut B);

impl<B: Read + ?Sized> Read for ByRef<'_, B> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

/// Tees writes into the whole-file hasher.
struct HashingWriter<'a, W: Write + ?Sized> {
    inner: &'a mut W,
    hasher: &'a mut FileHasher,
}

impl<W: Write + ?Sized> Write for HashingWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

// Engine: the three public operations over reader/writer collaborators.
//
// Orchestrates:
//   - signature: basis reader -> block hashing -> signature stream
//   - delta:     signature stream + new-file reader -> delta stream
//   - patch:     seekable basis + delta stream -> reconstructed output
//
// All three are synchronous, single-threaded and independent; nothing is
// shared across invocations.

use std::io::{Cursor, Read, Seek, Write};

use log::debug;

use crate::block::{self, read_block};
use crate::encoder::DeltaEncoder;
use crate::error::Result;
use crate::format::DEFAULT_BLOCK_SIZE;
use crate::format::delta::DeltaReader;
use crate::format::signature::{Signature, SignatureWriter};

pub use crate::encoder::DeltaStats;
pub use crate::patch::PatchStats;

const READ_BUF_SIZE: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// Signature
// ---------------------------------------------------------------------------

/// Configuration for signature generation.
#[derive(Debug, Clone, Copy)]
pub struct SignatureOptions {
    /// Block size in bytes. Larger blocks mean smaller signatures but
    /// coarser matching.
    pub block_size: u32,
}

impl Default for SignatureOptions {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

/// Counters describing one signature generation.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignatureStats {
    /// Size of the basis file in bytes.
    pub basis_size: u64,
    /// Block size used.
    pub block_size: u32,
    /// Number of blocks described (including a possible short tail).
    pub blocks: u64,
}

/// Partition `basis` into fixed-size blocks and write their signature to
/// `sig_out`.
///
/// The basis is read sequentially block-by-block and descriptors are
/// written as they are produced; nothing is buffered beyond one block, so
/// files larger than memory are fine.
pub fn signature<R, W>(
    basis: &mut R,
    sig_out: &mut W,
    options: &SignatureOptions,
) -> Result<SignatureStats>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let mut writer = SignatureWriter::new(sig_out, options.block_size)?;
    let mut buf = vec![0u8; options.block_size as usize];
    let mut basis_size = 0u64;

    loop {
        let n = read_block(basis, &mut buf)?;
        if n == 0 {
            break;
        }
        writer.push(&block::hash_block(&buf[..n]), n as u32)?;
        basis_size += n as u64;
        if n < buf.len() {
            // Tail block: the stream is done.
            break;
        }
    }

    let blocks = writer.blocks_written();
    writer.finish()?;
    debug!(
        "signature: {basis_size} bytes -> {blocks} blocks of {}",
        options.block_size
    );
    Ok(SignatureStats {
        basis_size,
        block_size: options.block_size,
        blocks,
    })
}

// ---------------------------------------------------------------------------
// Delta
// ---------------------------------------------------------------------------

/// Compute a delta: decode the signature from `sig_in`, then stream `new`
/// through the encoder into `delta_out`.
pub fn delta<S, N, W>(sig_in: &mut S, new: &mut N, delta_out: &mut W) -> Result<DeltaStats>
where
    S: Read + ?Sized,
    N: Read + ?Sized,
    W: Write + ?Sized,
{
    let signature = Signature::read_from(sig_in)?;
    debug!(
        "delta: signature covers {} blocks of {}",
        signature.total_blocks(),
        signature.block_size()
    );

    let mut encoder = DeltaEncoder::new(&signature, delta_out)?;
    let mut buf = vec![0u8; READ_BUF_SIZE];
    loop {
        let n = read_block(new, &mut buf)?;
        if n == 0 {
            break;
        }
        encoder.write(&buf[..n])?;
        if n < buf.len() {
            break;
        }
    }
    let (mut writer, stats) = encoder.finish()?;
    writer.flush()?;
    Ok(stats)
}

// ---------------------------------------------------------------------------
// Patch
// ---------------------------------------------------------------------------

/// Apply a delta: decode the stream from `delta_in` and replay it against
/// the seekable `basis`, writing the reconstructed file to `out`.
pub fn patch<B, D, W>(basis: &mut B, delta_in: &mut D, out: &mut W) -> Result<PatchStats>
where
    B: Read + Seek + ?Sized,
    D: Read,
    W: Write + ?Sized,
{
    let reader = DeltaReader::new(delta_in)?;
    crate::patch::apply(basis, reader, out)
}

// ---------------------------------------------------------------------------
// In-memory conveniences
// ---------------------------------------------------------------------------

/// [`signature`] over byte slices.
pub fn signature_to_vec(basis: &[u8], options: &SignatureOptions) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    signature(&mut &basis[..], &mut out, options)?;
    Ok(out)
}

/// [`delta`] over byte slices.
pub fn delta_to_vec(signature_bytes: &[u8], new: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    delta(&mut &signature_bytes[..], &mut &new[..], &mut out)?;
    Ok(out)
}

/// [`patch`] over byte slices.
pub fn patch_to_vec(basis: &[u8], delta_bytes: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    patch(&mut Cursor::new(basis), &mut &delta_bytes[..], &mut out)?;
    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

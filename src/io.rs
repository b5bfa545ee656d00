// File-level helpers for the three operations.
//
// Path-based convenience wrappers around the engine with proper buffered
// I/O. The CLI and most callers go through these; the engine functions
// remain available for custom readers/writers.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::engine::{self, DeltaStats, PatchStats, SignatureOptions, SignatureStats};
use crate::error::Result;

const BUF_SIZE: usize = 64 * 1024; // 64 KiB

/// Generate a signature of `basis_path`, writing it to `sig_path`.
pub fn signature_file(
    basis_path: &Path,
    sig_path: &Path,
    options: &SignatureOptions,
) -> Result<SignatureStats> {
    let mut basis = BufReader::with_capacity(BUF_SIZE, File::open(basis_path)?);
    let mut sig_out = BufWriter::with_capacity(BUF_SIZE, File::create(sig_path)?);
    engine::signature(&mut basis, &mut sig_out, options)
}

/// Compute a delta from the signature at `sig_path` and the new file at
/// `new_path`, writing it to `delta_path`.
pub fn delta_file(sig_path: &Path, new_path: &Path, delta_path: &Path) -> Result<DeltaStats> {
    let mut sig_in = BufReader::with_capacity(BUF_SIZE, File::open(sig_path)?);
    let mut new = BufReader::with_capacity(BUF_SIZE, File::open(new_path)?);
    let mut delta_out = BufWriter::with_capacity(BUF_SIZE, File::create(delta_path)?);
    engine::delta(&mut sig_in, &mut new, &mut delta_out)
}

/// Apply the delta at `delta_path` to the basis at `basis_path`, writing
/// the reconstructed file to `out_path`.
///
/// The basis is opened read-only and must support seeking; the output is
/// written in one forward pass. On error the output file may hold partial
/// bytes, but the operation reports failure rather than success.
pub fn patch_file(basis_path: &Path, delta_path: &Path, out_path: &Path) -> Result<PatchStats> {
    // The basis gets unbuffered random access; reads are whole blocks, so
    // an extra buffering layer would only be re-filled on every seek.
    let mut basis = File::open(basis_path)?;
    let mut delta_in = BufReader::with_capacity(BUF_SIZE, File::open(delta_path)?);
    let mut out = BufWriter::with_capacity(BUF_SIZE, File::create(out_path)?);
    engine::patch(&mut basis, &mut delta_in, &mut out)
}

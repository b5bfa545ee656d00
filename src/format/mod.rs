// On-disk formats for signature and delta files.
//
// Both files open with a four-byte magic: three ASCII letters with the high
// bit set (so the files can never be mistaken for text) followed by a
// format version byte. All multi-byte integers are little-endian and
// fixed-width.
//
// # Modules
//
// - `signature` — block-descriptor sequence: `[magic][block_size][repeated: digest || length]`
// - `delta`     — instruction stream: `[magic][block_size][basis_size][instructions...][trailer]`

pub mod delta;
pub mod signature;

use std::io::{self, Read, Write};

/// Signature file magic: "SIG" with the high bit set, then version 0.
pub const SIGNATURE_MAGIC: [u8; 4] = [0xD3, 0xC9, 0xC7, 0x00];

/// Delta file magic: "DLT" with the high bit set, then version 0.
pub const DELTA_MAGIC: [u8; 4] = [0xC4, 0xCC, 0xD4, 0x00];

/// Default block size: 32 KiB.
pub const DEFAULT_BLOCK_SIZE: u32 = 32 * 1024;

/// Hard upper bound on the block size accepted by the decoders (1 GiB).
/// Anything larger is a malformed header, not a plausible configuration.
pub const MAX_BLOCK_SIZE: u32 = 1 << 30;

/// Instruction tag: copy one basis block.
pub const TAG_COPY: u8 = b'C';

/// Instruction tag: literal run, length-prefixed payload in-stream.
pub const TAG_LITERAL: u8 = b'L';

/// Trailer tag: whole-file SHA-256 of the reconstructed output.
pub const TAG_TRAILER: u8 = b'H';

// ---------------------------------------------------------------------------
// Little-endian integer plumbing shared by both codecs
// ---------------------------------------------------------------------------

pub(crate) fn write_u32<W: Write + ?Sized>(w: &mut W, v: u32) -> io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

pub(crate) fn write_u64<W: Write + ?Sized>(w: &mut W, v: u64) -> io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

pub(crate) fn read_u32<R: Read + ?Sized>(r: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

pub(crate) fn read_u64<R: Read + ?Sized>(r: &mut R) -> io::Result<u64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

/// Validate a block-size header field common to both formats.
pub(crate) fn check_block_size(block_size: u32) -> Result<(), String> {
    if block_size == 0 {
        Err("block size is zero".to_string())
    } else if block_size > MAX_BLOCK_SIZE {
        Err(format!(
            "block size {block_size} exceeds max {MAX_BLOCK_SIZE}"
        ))
    } else {
        Ok(())
    }
}

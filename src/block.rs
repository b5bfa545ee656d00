// Block hashing and block-sized reads.
//
// The block digest is a full SHA-256 over exactly the block's bytes. The
// block's length travels next to the digest everywhere (signature records,
// index lookups) and is never folded into the hash, so two blocks of
// different length can never be conflated by a truncation coincidence.

use std::io::{self, Read};

use sha2::{Digest, Sha256};

/// Width of a block digest in bytes.
pub const DIGEST_LEN: usize = 32;

/// A SHA-256 digest of one block.
pub type BlockDigest = [u8; DIGEST_LEN];

/// Hash one block. Pure function, no side effects.
#[inline]
pub fn hash_block(block: &[u8]) -> BlockDigest {
    Sha256::digest(block).into()
}

/// Fill `buf` from `reader`, looping on short reads until the buffer is
/// full or the stream ends. Returns the number of bytes read; anything less
/// than `buf.len()` means EOF was reached.
///
/// The matching contract relies on consistently sized blocks, so a short
/// read from the OS must not be mistaken for a tail block.
pub fn read_block<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Incremental SHA-256 over a whole file's bytes, fed as they stream
/// through the encoder or the patch applier.
#[derive(Default)]
pub struct FileHasher {
    inner: Sha256,
}

impl FileHasher {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn update(&mut self, bytes: &[u8]) {
        self.inner.update(bytes);
    }

    pub fn finalize(self) -> BlockDigest {
        self.inner.finalize().into()
    }
}

/// Render a digest as lowercase hex for error messages and logs.
pub fn hex_digest(digest: &BlockDigest) -> String {
    let mut s = String::with_capacity(DIGEST_LEN * 2);
    for b in digest {
        s.push_str(&format!("{b:02x}"));
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn digest_is_sha256() {
        // SHA-256 of the empty string, a fixed vector.
        let expected = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
        assert_eq!(hex_digest(&hash_block(b"")), expected);
    }

    #[test]
    fn same_bytes_same_digest() {
        assert_eq!(hash_block(b"abc"), hash_block(b"abc"));
        assert_ne!(hash_block(b"abc"), hash_block(b"abd"));
    }

    #[test]
    fn read_block_fills_across_short_reads() {
        // A reader that returns one byte at a time.
        struct OneByte<R>(R);
        impl<R: Read> Read for OneByte<R> {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                let n = buf.len().min(1);
                self.0.read(&mut buf[..n])
            }
        }

        let mut r = OneByte(Cursor::new(b"hello world".to_vec()));
        let mut buf = [0u8; 8];
        assert_eq!(read_block(&mut r, &mut buf).unwrap(), 8);
        assert_eq!(&buf, b"hello wo");
        let mut buf = [0u8; 8];
        assert_eq!(read_block(&mut r, &mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], b"rld");
    }

    #[test]
    fn read_block_empty_stream() {
        let mut r = Cursor::new(Vec::new());
        let mut buf = [0u8; 4];
        assert_eq!(read_block(&mut r, &mut buf).unwrap(), 0);
    }

    #[test]
    fn file_hasher_matches_one_shot() {
        let mut h = FileHasher::new();
        h.update(b"hello ");
        h.update(b"world");
        assert_eq!(h.finalize(), hash_block(b"hello world"));
    }
}

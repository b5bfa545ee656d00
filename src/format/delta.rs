// Delta file codec.
//
// Layout:
//   [magic: 4 bytes, includes version]
//   [block_size: u32 LE]       echo of the signature's block size
//   [basis_size: u64 LE]       exact basis length the delta was computed against
//   repeated instruction records:
//     'C' [index: u32 LE]                    copy basis block `index`
//     'L' [length: u64 LE] [payload bytes]   literal run, payload in-stream
//   trailer:
//     'H' [digest: 32 bytes]                 SHA-256 of the whole new file
//
// Literal payload travels in-stream (no side channel), so decoding is a
// single forward pass with no seeking. The reader never materializes a
// literal run; payloads are pumped through a bounded buffer straight into
// the caller's sink, bounding memory for arbitrarily large deltas.

use std::io::{Read, Write};

use crate::block::{BlockDigest, DIGEST_LEN};
use crate::error::{DeltaError, Result};
use crate::format::{self, DELTA_MAGIC, TAG_COPY, TAG_LITERAL, TAG_TRAILER};

const COPY_BUF_SIZE: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

/// Parsed delta file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeltaHeader {
    /// Block size shared with the signature the delta was computed from.
    pub block_size: u32,
    /// Exact size of the basis file the delta expects at patch time.
    pub basis_size: u64,
}

// ---------------------------------------------------------------------------
// Instructions
// ---------------------------------------------------------------------------

/// One decoded instruction, payload materialized.
///
/// The streaming path ([`DeltaReader`]) never builds these for literal
/// payloads; they exist for inspection tooling and tests via
/// [`InstructionIterator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Copy the basis block at `index` verbatim. The byte length is implied
    /// by the signature (block size, or the tail length for the final block).
    Copy { index: u32 },
    /// Emit these bytes directly; not derived from the basis file.
    Literal { data: Vec<u8> },
}

/// A not-yet-drained instruction record from the streaming reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionRecord {
    Copy { index: u32 },
    /// A literal of `length` bytes; the payload is still in the stream and
    /// must be drained with [`DeltaReader::copy_literal_to`].
    Literal { length: u64 },
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

/// Writes a delta stream: header, instructions, trailer.
pub struct DeltaWriter<W: Write> {
    writer: W,
}

impl<W: Write> DeltaWriter<W> {
    /// Write the header and return the writer.
    pub fn new(mut writer: W, header: &DeltaHeader) -> Result<Self> {
        format::check_block_size(header.block_size).map_err(DeltaError::Format)?;
        writer.write_all(&DELTA_MAGIC)?;
        format::write_u32(&mut writer, header.block_size)?;
        format::write_u64(&mut writer, header.basis_size)?;
        Ok(Self { writer })
    }

    /// Emit a copy-from-basis instruction.
    pub fn copy(&mut self, index: u32) -> Result<()> {
        self.writer.write_all(&[TAG_COPY])?;
        format::write_u32(&mut self.writer, index)?;
        Ok(())
    }

    /// Emit a literal run.
    pub fn literal(&mut self, data: &[u8]) -> Result<()> {
        debug_assert!(!data.is_empty(), "empty literal run");
        self.writer.write_all(&[TAG_LITERAL])?;
        format::write_u64(&mut self.writer, data.len() as u64)?;
        self.writer.write_all(data)?;
        Ok(())
    }

    /// Write the whole-file digest trailer, flush, and return the writer.
    pub fn finish(mut self, new_file_digest: &BlockDigest) -> Result<W> {
        self.writer.write_all(&[TAG_TRAILER])?;
        self.writer.write_all(new_file_digest)?;
        self.writer.flush()?;
        Ok(self.writer)
    }
}

// ---------------------------------------------------------------------------
// Streaming reader
// ---------------------------------------------------------------------------

/// Forward-only streaming parse of a delta file.
///
/// Call [`next_record`](Self::next_record) until it returns `Ok(None)`
/// (trailer reached), draining each literal with
/// [`copy_literal_to`](Self::copy_literal_to) before advancing. After the
/// stream ends, [`trailer`](Self::trailer) holds the expected output digest.
#[derive(Debug)]
pub struct DeltaReader<R: Read> {
    reader: R,
    header: DeltaHeader,
    /// Undrained payload bytes of the current literal record.
    pending_literal: u64,
    trailer: Option<BlockDigest>,
}

impl<R: Read> DeltaReader<R> {
    /// Parse the header and return the reader.
    pub fn new(mut reader: R) -> Result<Self> {
        let mut magic = [0u8; 4];
        reader
            .read_exact(&mut magic)
            .map_err(|e| DeltaError::delta_read(e, "header"))?;
        if magic[..3] != DELTA_MAGIC[..3] {
            return Err(DeltaError::Format(format!(
                "not a delta file: bad magic {:02X} {:02X} {:02X}",
                magic[0], magic[1], magic[2]
            )));
        }
        if magic[3] != DELTA_MAGIC[3] {
            return Err(DeltaError::Format(format!(
                "unsupported delta version {:#04X}",
                magic[3]
            )));
        }

        let block_size =
            format::read_u32(&mut reader).map_err(|e| DeltaError::delta_read(e, "header"))?;
        format::check_block_size(block_size).map_err(DeltaError::Format)?;
        let basis_size =
            format::read_u64(&mut reader).map_err(|e| DeltaError::delta_read(e, "header"))?;

        Ok(Self {
            reader,
            header: DeltaHeader {
                block_size,
                basis_size,
            },
            pending_literal: 0,
            trailer: None,
        })
    }

    /// The parsed header.
    #[inline]
    pub fn header(&self) -> &DeltaHeader {
        &self.header
    }

    /// Read the next instruction record. Returns `Ok(None)` once the
    /// trailer has been consumed. EOF anywhere before the trailer is
    /// `CorruptDelta`; an unrecognized tag is `Format`.
    pub fn next_record(&mut self) -> Result<Option<InstructionRecord>> {
        debug_assert_eq!(self.pending_literal, 0, "previous literal not drained");
        if self.trailer.is_some() {
            return Ok(None);
        }

        let mut tag = [0u8; 1];
        self.reader
            .read_exact(&mut tag)
            .map_err(|e| DeltaError::delta_read(e, "instruction stream (missing trailer)"))?;

        match tag[0] {
            TAG_COPY => {
                let index = format::read_u32(&mut self.reader)
                    .map_err(|e| DeltaError::delta_read(e, "copy instruction"))?;
                Ok(Some(InstructionRecord::Copy { index }))
            }
            TAG_LITERAL => {
                let length = format::read_u64(&mut self.reader)
                    .map_err(|e| DeltaError::delta_read(e, "literal instruction"))?;
                self.pending_literal = length;
                Ok(Some(InstructionRecord::Literal { length }))
            }
            TAG_TRAILER => {
                let mut digest = [0u8; DIGEST_LEN];
                self.reader
                    .read_exact(&mut digest)
                    .map_err(|e| DeltaError::delta_read(e, "trailer"))?;
                self.trailer = Some(digest);
                Ok(None)
            }
            other => Err(DeltaError::Format(format!(
                "unknown instruction tag {other:#04X}"
            ))),
        }
    }

    /// Stream the current literal's payload into `out` through a bounded
    /// buffer. A payload cut short by EOF is `CorruptDelta`.
    pub fn copy_literal_to<W: Write + ?Sized>(&mut self, out: &mut W) -> Result<u64> {
        let total = self.pending_literal;
        let mut remaining = total;
        let mut buf = [0u8; COPY_BUF_SIZE];
        while remaining > 0 {
            let want = remaining.min(COPY_BUF_SIZE as u64) as usize;
            self.reader
                .read_exact(&mut buf[..want])
                .map_err(|e| DeltaError::delta_read(e, "literal payload"))?;
            out.write_all(&buf[..want])?;
            remaining -= want as u64;
        }
        self.pending_literal = 0;
        Ok(total)
    }

    /// Whole-file digest from the trailer; present once `next_record` has
    /// returned `Ok(None)`.
    pub fn trailer(&self) -> Option<&BlockDigest> {
        self.trailer.as_ref()
    }

    /// Consume the reader, materializing all remaining instructions.
    pub fn instructions(self) -> InstructionIterator<R> {
        InstructionIterator {
            reader: self,
            done: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Materializing iterator
// ---------------------------------------------------------------------------

/// Iterator over fully materialized [`Instruction`] values.
pub struct InstructionIterator<R: Read> {
    reader: DeltaReader<R>,
    done: bool,
}

impl<R: Read> InstructionIterator<R> {
    /// The trailer digest, once the iterator has been exhausted.
    pub fn trailer(&self) -> Option<&BlockDigest> {
        self.reader.trailer()
    }

    /// The delta header.
    pub fn header(&self) -> &DeltaHeader {
        self.reader.header()
    }
}

impl<R: Read> Iterator for InstructionIterator<R> {
    type Item = Result<Instruction>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.next_record() {
            Ok(Some(InstructionRecord::Copy { index })) => Some(Ok(Instruction::Copy { index })),
            Ok(Some(InstructionRecord::Literal { .. })) => {
                let mut data = Vec::new();
                match self.reader.copy_literal_to(&mut data) {
                    Ok(_) => Some(Ok(Instruction::Literal { data })),
                    Err(e) => {
                        self.done = true;
                        Some(Err(e))
                    }
                }
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

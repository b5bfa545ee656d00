//! Blockdelta: fixed-block remote delta encoding.
//!
//! Given an old ("basis") file and a new file, blockdelta produces a
//! compact delta that lets a party holding only the basis file reconstruct
//! the new file. The basis is described by a signature (one SHA-256 digest
//! plus length per fixed-size block); the delta encodes the new file as
//! copy-from-basis and literal instructions. Matching is position
//! independent but block aligned: there is no rolling-window search, so an
//! insertion that shifts block boundaries turns downstream blocks into
//! literal data. That trade keeps the formats and the engine small.
//!
//! The crate provides:
//! - The three core operations (`engine`): signature, delta, patch
//! - The signature and delta wire formats (`format`)
//! - File-oriented helpers (`io`)
//! - An optional CLI (`cli` feature)
//!
//! # Quick Start
//!
//! ```
//! use blockdelta::engine::{self, SignatureOptions};
//!
//! let basis = b"the old contents of the file";
//! let new = b"the new contents of the file";
//!
//! let sig = engine::signature_to_vec(basis, &SignatureOptions { block_size: 8 }).unwrap();
//! let delta = engine::delta_to_vec(&sig, new).unwrap();
//! let reconstructed = engine::patch_to_vec(basis, &delta).unwrap();
//! assert_eq!(reconstructed, new);
//! ```

pub mod block;
pub mod encoder;
pub mod engine;
pub mod error;
pub mod format;
pub mod index;
pub mod io;
pub mod patch;

#[cfg(feature = "cli")]
pub mod cli;

pub use error::{DeltaError, Result};
pub use format::DEFAULT_BLOCK_SIZE;

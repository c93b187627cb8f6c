// Copyright 2024 Karpeles Lab Inc.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! # zstream
//!
//! Incremental Zstandard compression and decompression.
//!
//! zstream provides:
//! - Streaming compressor and decompressor that accept input in chunks of any size
//! - Consumed-byte tracking on decode, for callers that drive their own I/O
//! - Dictionaries prepared once and shared between streams and threads
//! - Skippable frames for carrying metadata in front of compressed data
//!
//! ## Streaming Example
//!
//! ```rust
//! use zstream::{StreamingCompress, StreamingDecompress};
//!
//! let mut compressor = StreamingCompress::with_level(5).expect("compressor");
//! let mut compressed = compressor.compress(b"Hello, ").expect("compress");
//! compressed.extend(compressor.compress(b"World!").expect("compress"));
//! compressed.extend(compressor.finish().expect("finish"));
//!
//! let mut decompressor = StreamingDecompress::new().expect("decompressor");
//! let mut decompressed = Vec::new();
//! for chunk in compressed.chunks(4) {
//!     decompressed.extend(decompressor.decompress(chunk).expect("decompress"));
//! }
//! assert_eq!(decompressed, b"Hello, World!");
//! ```

mod compress;
mod constants;
mod context;
mod decompress;
mod dict;
mod error;
mod options;
mod skippable;

#[cfg(feature = "concurrent")]
mod concurrent;

pub use compress::StreamingCompress;
pub use constants::{DEFAULT_LEVEL, MAX_MAGIC_VARIANT, SKIPPABLE_HEADER_SIZE, SKIPPABLE_MAGIC_BASE};
pub use context::{
    compress, compress_using_dict, decompress, decompress_using_dict, CompressContext,
    DecompressContext,
};
pub use decompress::StreamingDecompress;
pub use dict::{dictionary_id, CompressionDictionary, DecompressionDictionary};
pub use error::{Error, Result};
pub use options::{CompressDict, CompressOptions, DecompressDict, DecompressOptions};
pub use skippable::{
    is_skippable_frame, parse_skippable_frame, read_skippable_frame, write_skippable_frame,
    SkippableFrame,
};

#[cfg(feature = "concurrent")]
pub use concurrent::compress_frames_parallel;

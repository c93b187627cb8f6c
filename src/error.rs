// Copyright 2024 Karpeles Lab Inc.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::io;

use thiserror::Error;

/// Result type for zstream operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for streaming compression/decompression
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The dictionary was rejected by the codec
    #[error("zstream: invalid dictionary: {0}")]
    InvalidDictionary(String),

    /// Compression level outside of the codec's supported range
    #[error("zstream: invalid compression level {0}")]
    InvalidLevel(i32),

    /// The input is not valid compressed data
    #[error("zstream: corrupted frame: {0}")]
    CorruptedFrame(String),

    /// The input ended in the middle of a frame
    #[error("zstream: truncated frame")]
    TruncatedFrame,

    /// Skippable frame magic variant outside of 0..=15
    #[error("zstream: invalid skippable frame magic variant {0}")]
    InvalidMagicVariant(u32),

    /// Skippable frame metadata does not fit the 32-bit length field
    #[error("zstream: skippable frame metadata too large ({0} bytes)")]
    TooLarge(usize),

    /// Any other failure reported by the codec
    #[error("zstream: codec error: {0}")]
    Codec(String),
}

impl Error {
    pub(crate) fn corrupted(err: io::Error) -> Self {
        Error::CorruptedFrame(err.to_string())
    }

    pub(crate) fn codec(err: io::Error) -> Self {
        Error::Codec(err.to_string())
    }

    pub(crate) fn dictionary(err: io::Error) -> Self {
        Error::InvalidDictionary(err.to_string())
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        let kind = match err {
            Error::CorruptedFrame(_) | Error::TruncatedFrame => io::ErrorKind::InvalidData,
            _ => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}

// Copyright 2024 Karpeles Lab Inc.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Construction-time configuration for streams and contexts

use std::sync::Arc;

use crate::dict::{CompressionDictionary, DecompressionDictionary};

/// Dictionary attached to a compressor
#[derive(Debug, Clone)]
pub enum CompressDict {
    /// Raw bytes, loaded into the stream's own context at construction
    Raw(Vec<u8>),
    /// A dictionary prepared once and shared by reference
    Prepared(Arc<CompressionDictionary>),
}

impl From<Vec<u8>> for CompressDict {
    fn from(data: Vec<u8>) -> Self {
        CompressDict::Raw(data)
    }
}

impl From<&[u8]> for CompressDict {
    fn from(data: &[u8]) -> Self {
        CompressDict::Raw(data.to_vec())
    }
}

impl From<Arc<CompressionDictionary>> for CompressDict {
    fn from(dict: Arc<CompressionDictionary>) -> Self {
        CompressDict::Prepared(dict)
    }
}

impl From<CompressionDictionary> for CompressDict {
    fn from(dict: CompressionDictionary) -> Self {
        CompressDict::Prepared(Arc::new(dict))
    }
}

/// Dictionary attached to a decompressor
#[derive(Debug, Clone)]
pub enum DecompressDict {
    /// Raw bytes, loaded into the stream's own context at construction
    Raw(Vec<u8>),
    /// A dictionary prepared once and shared by reference
    Prepared(Arc<DecompressionDictionary>),
}

impl From<Vec<u8>> for DecompressDict {
    fn from(data: Vec<u8>) -> Self {
        DecompressDict::Raw(data)
    }
}

impl From<&[u8]> for DecompressDict {
    fn from(data: &[u8]) -> Self {
        DecompressDict::Raw(data.to_vec())
    }
}

impl From<Arc<DecompressionDictionary>> for DecompressDict {
    fn from(dict: Arc<DecompressionDictionary>) -> Self {
        DecompressDict::Prepared(dict)
    }
}

impl From<DecompressionDictionary> for DecompressDict {
    fn from(dict: DecompressionDictionary) -> Self {
        DecompressDict::Prepared(Arc::new(dict))
    }
}

/// Options for [`StreamingCompress`](crate::StreamingCompress) and
/// [`CompressContext`](crate::CompressContext)
///
/// `None` for any field behaves exactly like leaving it out.
///
/// ```
/// use zstream::CompressOptions;
///
/// let options = CompressOptions::new().level(5).dict(None::<Vec<u8>>);
/// assert_eq!(options.level, Some(5));
/// assert!(options.dict.is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CompressOptions {
    /// Compression level; the codec default when `None`
    ///
    /// Ignored when a prepared dictionary is attached: the level it was
    /// built for wins.
    pub level: Option<i32>,
    /// Dictionary to prime the encoder with
    pub dict: Option<CompressDict>,
    /// Append a content checksum to every frame
    pub checksum: bool,
}

impl CompressOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(mut self, level: impl Into<Option<i32>>) -> Self {
        self.level = level.into();
        self
    }

    pub fn dict<D: Into<CompressDict>>(mut self, dict: Option<D>) -> Self {
        self.dict = dict.map(Into::into);
        self
    }

    pub fn checksum(mut self, checksum: bool) -> Self {
        self.checksum = checksum;
        self
    }
}

/// Options for [`StreamingDecompress`](crate::StreamingDecompress) and
/// [`DecompressContext`](crate::DecompressContext)
#[derive(Debug, Clone, Default)]
pub struct DecompressOptions {
    /// Dictionary the frames were compressed with
    pub dict: Option<DecompressDict>,
}

impl DecompressOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dict<D: Into<DecompressDict>>(mut self, dict: Option<D>) -> Self {
        self.dict = dict.map(Into::into);
        self
    }
}

// Copyright 2024 Karpeles Lab Inc.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Whole-buffer compression on reusable contexts

use std::sync::Arc;

use crate::compress::StreamingCompress;
use crate::decompress::StreamingDecompress;
use crate::dict::{CompressionDictionary, DecompressionDictionary};
use crate::error::{Error, Result};
use crate::options::{CompressOptions, DecompressOptions};

/// Compresses whole buffers, one frame per call, on a single reusable context
pub struct CompressContext {
    stream: StreamingCompress,
}

impl CompressContext {
    pub fn new(options: CompressOptions) -> Result<Self> {
        Ok(CompressContext {
            stream: StreamingCompress::with_options(options)?,
        })
    }

    /// Compress `data` into one complete frame
    pub fn compress(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        self.stream.reset()?;
        self.stream.write([data])?;
        self.stream.finish()
    }
}

/// Decompresses whole buffers on a single reusable context
pub struct DecompressContext {
    stream: StreamingDecompress,
}

impl DecompressContext {
    pub fn new(options: DecompressOptions) -> Result<Self> {
        Ok(DecompressContext {
            stream: StreamingDecompress::with_options(options)?,
        })
    }

    /// Decompress every frame in `data`
    ///
    /// Fails with [`Error::TruncatedFrame`] when the last frame is cut short.
    pub fn decompress(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        self.stream.reset()?;
        let out = self.stream.decompress(data)?;
        if !self.stream.is_frame_complete() {
            return Err(Error::TruncatedFrame);
        }
        Ok(out)
    }
}

/// Compress `data` into a single frame at `level`
pub fn compress(data: &[u8], level: i32) -> Result<Vec<u8>> {
    CompressContext::new(CompressOptions::new().level(level))?.compress(data)
}

/// Compress `data` into a single frame using a prepared dictionary
pub fn compress_using_dict(data: &[u8], dict: &Arc<CompressionDictionary>) -> Result<Vec<u8>> {
    CompressContext::new(CompressOptions::new().dict(Some(Arc::clone(dict))))?.compress(data)
}

/// Decompress every frame in `data`
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    DecompressContext::new(DecompressOptions::default())?.decompress(data)
}

/// Decompress every frame in `data` using a prepared dictionary
pub fn decompress_using_dict(data: &[u8], dict: &Arc<DecompressionDictionary>) -> Result<Vec<u8>> {
    DecompressContext::new(DecompressOptions::new().dict(Some(Arc::clone(dict))))?
        .decompress(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_reuse() {
        let mut cctx = CompressContext::new(CompressOptions::new().level(5)).unwrap();
        let mut dctx = DecompressContext::new(DecompressOptions::default()).unwrap();

        for i in 0..5 {
            let data = format!("data for frame {}", i).repeat(i + 1);
            let frame = cctx.compress(data.as_bytes()).unwrap();
            assert_eq!(dctx.decompress(&frame).unwrap(), data.as_bytes());
        }
    }

    #[test]
    fn test_truncated_input() {
        let frame = compress(b"test data for truncation", 3).unwrap();
        assert_eq!(decompress(&frame[..5]).unwrap_err(), Error::TruncatedFrame);
    }

    #[test]
    fn test_context_recovers_after_error() {
        let mut dctx = DecompressContext::new(DecompressOptions::default()).unwrap();
        let frame = compress(b"after the error", 3).unwrap();

        assert!(dctx.decompress(&frame[..frame.len() - 2]).is_err());
        assert_eq!(dctx.decompress(&frame).unwrap(), b"after the error");
    }

    #[test]
    fn test_dictionary_helpers() {
        let dict_bytes = b"{\"user\":{\"name\":\"\",\"email\":\"\",\"roles\":[]}}".repeat(8);
        let cdict = Arc::new(CompressionDictionary::new(&dict_bytes, 5).unwrap());
        let ddict = Arc::new(DecompressionDictionary::new(&dict_bytes).unwrap());

        let data = b"{\"user\":{\"name\":\"zstream\",\"email\":\"z@example.com\",\"roles\":[]}}";
        let frame = compress_using_dict(data, &cdict).unwrap();
        assert_eq!(decompress_using_dict(&frame, &ddict).unwrap(), data);
    }
}

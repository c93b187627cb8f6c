// Copyright 2024 Karpeles Lab Inc.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Incremental decompressor

use std::sync::Arc;

use zstd::stream::raw::{Decoder, InBuffer, Operation, OutBuffer};

use crate::constants::*;
use crate::dict::DecompressionDictionary;
use crate::error::{Error, Result};
use crate::options::{DecompressDict, DecompressOptions};

/// StreamingDecompress decodes a zstd stream delivered in arbitrary chunks
///
/// Chunks may cut the stream anywhere, down to one byte at a time. Bytes that
/// cannot be decoded yet are kept by the decoding context and completed by
/// later calls, so all chunks of one stream must go through the same instance,
/// in order. A stream may hold several frames back to back; skippable frames
/// are passed over.
///
/// # Example
///
/// ```
/// use zstream::{compress, StreamingDecompress};
///
/// let data = b"foo bar buzz".repeat(100);
/// let frame = compress(&data, 3).unwrap();
///
/// let mut stream = StreamingDecompress::new().unwrap();
/// let mut out = Vec::new();
/// for chunk in frame.chunks(5) {
///     out.extend(stream.decompress(chunk).unwrap());
/// }
/// assert_eq!(out, data);
/// assert!(stream.is_frame_complete());
/// ```
pub struct StreamingDecompress {
    // Declared before `dict`: the context may point into the prepared
    // dictionary and has to be dropped first.
    decoder: Decoder<'static>,
    dict: Option<Arc<DecompressionDictionary>>,
    in_frame: bool,
}

impl StreamingDecompress {
    /// Create a decompressor without dictionary
    pub fn new() -> Result<Self> {
        Self::with_options(DecompressOptions::default())
    }

    /// Create a decompressor primed with raw dictionary bytes
    pub fn with_dictionary(dict: &[u8]) -> Result<Self> {
        Self::with_options(
            DecompressOptions::new().dict(Some(DecompressDict::Raw(dict.to_vec()))),
        )
    }

    /// Create a decompressor referencing a prepared dictionary
    pub fn with_prepared_dictionary(dict: Arc<DecompressionDictionary>) -> Result<Self> {
        Self::with_options(DecompressOptions::new().dict(Some(dict)))
    }

    /// Create a decompressor from a full set of options
    pub fn with_options(options: DecompressOptions) -> Result<Self> {
        let (decoder, dict) = match options.dict {
            None => (Decoder::new().map_err(Error::codec)?, None),
            Some(DecompressDict::Raw(bytes)) => {
                let decoder = Decoder::with_dictionary(&bytes).map_err(Error::dictionary)?;
                log::debug!("decompressor: raw dictionary of {} bytes", bytes.len());
                (decoder, None)
            }
            Some(DecompressDict::Prepared(dict)) => {
                let decoder = Decoder::with_prepared_dictionary(dict.as_decoder_dictionary())
                    .map_err(Error::dictionary)?;
                log::debug!("decompressor: prepared dictionary id {}", dict.dict_id());
                (decoder, Some(dict))
            }
        };

        Ok(StreamingDecompress {
            decoder,
            dict,
            in_frame: false,
        })
    }

    /// Prepared dictionary this stream references, if any
    pub fn dictionary(&self) -> Option<&Arc<DecompressionDictionary>> {
        self.dict.as_ref()
    }

    /// True when no frame is partially decoded
    ///
    /// After the last chunk of a stream, `false` means the input was
    /// truncated.
    pub fn is_frame_complete(&self) -> bool {
        !self.in_frame
    }

    /// Decode as much as possible from `chunk`
    ///
    /// Returns the decoded bytes, possibly empty when the chunk only carries
    /// part of a block. Fails with [`Error::CorruptedFrame`] when the input
    /// is not zstd data, or was compressed with a dictionary this stream
    /// does not have.
    pub fn decompress(&mut self, chunk: &[u8]) -> Result<Vec<u8>> {
        let (out, _) = self.run(chunk, false)?;
        Ok(out)
    }

    /// Decode from `chunk`, stopping at the end of a frame
    ///
    /// Returns the decoded bytes and how many bytes of `chunk` were consumed.
    /// When a frame ends inside the chunk, decoding stops there and the count
    /// is smaller than the chunk: resubmit the remainder, with any new data,
    /// in the next call.
    ///
    /// ```
    /// use zstream::{compress, StreamingDecompress};
    ///
    /// let mut stream_data = compress(b"one", 3).unwrap();
    /// stream_data.extend(compress(b"two", 3).unwrap());
    ///
    /// let mut stream = StreamingDecompress::new().unwrap();
    /// let (first, used) = stream.decompress_with_pos(&stream_data).unwrap();
    /// assert_eq!(first, b"one");
    /// let (second, rest) = stream.decompress_with_pos(&stream_data[used..]).unwrap();
    /// assert_eq!(second, b"two");
    /// assert_eq!(used + rest, stream_data.len());
    /// ```
    pub fn decompress_with_pos(&mut self, chunk: &[u8]) -> Result<(Vec<u8>, usize)> {
        self.run(chunk, true)
    }

    fn run(&mut self, chunk: &[u8], stop_at_frame_end: bool) -> Result<(Vec<u8>, usize)> {
        let mut output = Vec::new();
        let mut input = InBuffer::around(chunk);

        loop {
            ensure_spare(&mut output);
            let in_before = input.pos();
            let out_before = output.len();

            let (hint, out_pos) = {
                let mut out = OutBuffer::around_pos(&mut output, out_before);
                let hint = self.decoder.run(&mut input, &mut out).map_err(|e| {
                    log::warn!("decompressor: {}", e);
                    Error::corrupted(e)
                })?;
                (hint, out.pos())
            };
            let out_cap = output.capacity();

            let consumed = input.pos() - in_before;
            let produced = out_pos - out_before;

            if hint == 0 {
                if self.in_frame || consumed > 0 {
                    log::debug!("decompressor: frame complete at input offset {}", input.pos());
                }
                self.in_frame = false;
                if stop_at_frame_end {
                    break;
                }
            } else if consumed > 0 || produced > 0 {
                self.in_frame = true;
            }

            let input_done = input.pos() == chunk.len();
            let output_full = out_pos == out_cap;
            if input_done && !output_full {
                break;
            }
            if consumed == 0 && produced == 0 {
                break;
            }
        }

        log::trace!(
            "decompressor: consumed {} of {} bytes, produced {}",
            input.pos(),
            chunk.len(),
            output.len()
        );
        Ok((output, input.pos()))
    }

    /// Drop any partially decoded frame; the dictionary is kept
    pub fn reset(&mut self) -> Result<()> {
        self.in_frame = false;
        self.decoder.reinit().map_err(Error::codec)
    }
}

fn ensure_spare(buf: &mut Vec<u8>) {
    if buf.capacity() - buf.len() < MIN_OUTPUT_SPARE {
        buf.reserve(DECOMPRESS_OUT_CHUNK);
    }
}

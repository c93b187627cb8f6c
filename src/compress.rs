// Copyright 2024 Karpeles Lab Inc.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Incremental compressor

use std::io;
use std::sync::Arc;

use zstd::stream::raw::{CParameter, Encoder, InBuffer, Operation, OutBuffer};

use crate::constants::*;
use crate::dict::{check_level, CompressionDictionary};
use crate::error::{Error, Result};
use crate::options::{CompressDict, CompressOptions};

/// Run an empty frame through `encoder` and rewind it
///
/// libzstd digests a loaded dictionary lazily, at the start of the first
/// frame. Forcing that here turns a malformed dictionary into an error at
/// construction time.
pub(crate) fn probe_dictionary(encoder: &mut Encoder<'_>) -> Result<()> {
    let mut scratch = Vec::with_capacity(256);
    loop {
        let remaining = {
            let mut out = OutBuffer::around_pos(&mut scratch, 0);
            encoder.finish(&mut out, true).map_err(Error::dictionary)?
        };
        if remaining == 0 {
            break;
        }
        scratch.reserve(256);
    }
    encoder.reinit().map_err(Error::dictionary)
}

/// Make sure at least `MIN_OUTPUT_SPARE` bytes can be written to `buf`
/// without reallocating.
fn ensure_spare(buf: &mut Vec<u8>, step: usize) {
    if buf.capacity() - buf.len() < MIN_OUTPUT_SPARE {
        buf.reserve(step);
    }
}

/// StreamingCompress turns a sequence of writes into a zstd frame
///
/// Input can be fed in chunks of any size. Compressed bytes accumulate in an
/// internal pending buffer and are handed out by [`compress`](Self::compress),
/// [`flush`](Self::flush) and [`finish`](Self::finish). Concatenating every
/// byte run returned, in call order, gives a valid zstd stream.
///
/// Two usage styles are supported:
/// - chained appends with [`push`](Self::push), collecting the output at
///   `flush`/`finish`;
/// - [`compress`](Self::compress), returning the output of each call.
///
/// # Example
///
/// ```
/// use zstream::{decompress, StreamingCompress};
///
/// let mut stream = StreamingCompress::new().unwrap();
/// stream.push(b"abc").unwrap().push(b"def").unwrap();
/// let frame = stream.finish().unwrap();
///
/// assert_eq!(decompress(&frame).unwrap(), b"abcdef");
/// ```
///
/// Only byte data can be written:
///
/// ```compile_fail
/// let mut stream = zstream::StreamingCompress::new().unwrap();
/// stream.write([123]).unwrap();
/// ```
pub struct StreamingCompress {
    // Declared before `dict`: the context may point into the prepared
    // dictionary and has to be dropped first.
    encoder: Encoder<'static>,
    dict: Option<Arc<CompressionDictionary>>,
    pending: Vec<u8>,
    level: i32,
    finished: bool,
}

impl StreamingCompress {
    /// Create a compressor at the default level, without dictionary
    pub fn new() -> Result<Self> {
        Self::with_options(CompressOptions::default())
    }

    /// Create a compressor at the given level
    pub fn with_level(level: i32) -> Result<Self> {
        Self::with_options(CompressOptions::new().level(level))
    }

    /// Create a compressor primed with raw dictionary bytes
    ///
    /// The dictionary is digested for this stream only. Use
    /// [`with_prepared_dictionary`](Self::with_prepared_dictionary) to share
    /// that work between streams.
    pub fn with_dictionary(level: i32, dict: &[u8]) -> Result<Self> {
        Self::with_options(
            CompressOptions::new()
                .level(level)
                .dict(Some(CompressDict::Raw(dict.to_vec()))),
        )
    }

    /// Create a compressor referencing a prepared dictionary
    ///
    /// The stream uses the level the dictionary was built for.
    pub fn with_prepared_dictionary(dict: Arc<CompressionDictionary>) -> Result<Self> {
        Self::with_options(CompressOptions::new().dict(Some(dict)))
    }

    /// Create a compressor from a full set of options
    pub fn with_options(options: CompressOptions) -> Result<Self> {
        let requested = check_level(options.level.unwrap_or(DEFAULT_LEVEL))?;

        let (mut encoder, dict, level) = match options.dict {
            None => {
                let encoder = Encoder::new(requested).map_err(Error::codec)?;
                (encoder, None, requested)
            }
            Some(CompressDict::Raw(bytes)) => {
                let mut encoder =
                    Encoder::with_dictionary(requested, &bytes).map_err(Error::dictionary)?;
                probe_dictionary(&mut encoder)?;
                log::debug!(
                    "compressor: level {}, raw dictionary of {} bytes",
                    requested,
                    bytes.len()
                );
                (encoder, None, requested)
            }
            Some(CompressDict::Prepared(dict)) => {
                let encoder =
                    Encoder::with_prepared_dictionary(dict.as_encoder_dictionary())
                        .map_err(Error::dictionary)?;
                if options.level.is_some_and(|l| l != dict.level()) {
                    log::debug!(
                        "compressor: requested level {} overridden by dictionary level {}",
                        requested,
                        dict.level()
                    );
                }
                log::debug!(
                    "compressor: level {}, prepared dictionary id {}",
                    dict.level(),
                    dict.dict_id()
                );
                let level = dict.level();
                (encoder, Some(dict), level)
            }
        };

        if options.checksum {
            encoder
                .set_parameter(CParameter::ChecksumFlag(true))
                .map_err(Error::codec)?;
        }

        Ok(StreamingCompress {
            encoder,
            dict,
            pending: Vec::new(),
            level,
            finished: false,
        })
    }

    /// Compression level in use
    pub fn level(&self) -> i32 {
        self.level
    }

    /// Prepared dictionary this stream references, if any
    pub fn dictionary(&self) -> Option<&Arc<CompressionDictionary>> {
        self.dict.as_ref()
    }

    /// True once `finish` has closed the frame and nothing was written since
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Number of compressed bytes produced but not yet handed out
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Feed one chunk to the encoder, appending any output to `pending`
    fn feed(&mut self, chunk: &[u8]) -> Result<()> {
        if chunk.is_empty() {
            return Ok(());
        }

        let mut input = InBuffer::around(chunk);
        while input.pos() < chunk.len() {
            ensure_spare(&mut self.pending, COMPRESS_OUT_CHUNK);
            let start = self.pending.len();
            let mut out = OutBuffer::around_pos(&mut self.pending, start);
            self.encoder.run(&mut input, &mut out).map_err(Error::codec)?;
        }

        self.finished = false;
        log::trace!(
            "compressor: fed {} bytes, {} bytes pending",
            chunk.len(),
            self.pending.len()
        );
        Ok(())
    }

    /// Write one or more byte buffers, returning the number of bytes accepted
    ///
    /// ```
    /// let mut stream = zstream::StreamingCompress::new().unwrap();
    /// assert_eq!(stream.write(["Hello", " ", "World"]).unwrap(), 11);
    /// ```
    pub fn write<I, B>(&mut self, chunks: I) -> Result<usize>
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let mut total = 0;
        for chunk in chunks {
            let chunk = chunk.as_ref();
            self.feed(chunk)?;
            total += chunk.len();
        }
        Ok(total)
    }

    /// Append data, returning `self` for chaining
    pub fn push<B: AsRef<[u8]>>(&mut self, chunk: B) -> Result<&mut Self> {
        self.feed(chunk.as_ref())?;
        Ok(self)
    }

    /// Compress a chunk and return the compressed bytes produced
    ///
    /// Output left pending by earlier `push`/`write` calls is returned first,
    /// so the runs returned by successive calls always concatenate in order.
    /// The result may be empty: the encoder buffers input until it has a
    /// block's worth or is flushed.
    pub fn compress<B: AsRef<[u8]>>(&mut self, chunk: B) -> Result<Vec<u8>> {
        self.feed(chunk.as_ref())?;
        Ok(std::mem::take(&mut self.pending))
    }

    /// Emit everything written so far as a decodable, unterminated unit
    ///
    /// The stream stays open for writing.
    pub fn flush(&mut self) -> Result<Vec<u8>> {
        if !self.finished {
            loop {
                ensure_spare(&mut self.pending, COMPRESS_OUT_CHUNK);
                let start = self.pending.len();
                let mut out = OutBuffer::around_pos(&mut self.pending, start);
                let remaining = self.encoder.flush(&mut out).map_err(Error::codec)?;
                if remaining == 0 {
                    break;
                }
            }
        }

        log::trace!("compressor: flushed {} bytes", self.pending.len());
        Ok(std::mem::take(&mut self.pending))
    }

    /// Close the frame, returning the remaining compressed bytes
    ///
    /// Calling `finish` on an already finished stream returns an empty
    /// vector. Writing after `finish` starts a new frame.
    pub fn finish(&mut self) -> Result<Vec<u8>> {
        if self.finished {
            return Ok(std::mem::take(&mut self.pending));
        }

        loop {
            ensure_spare(&mut self.pending, COMPRESS_OUT_CHUNK);
            let start = self.pending.len();
            let mut out = OutBuffer::around_pos(&mut self.pending, start);
            let remaining = self.encoder.finish(&mut out, true).map_err(Error::codec)?;
            if remaining == 0 {
                break;
            }
        }

        self.finished = true;
        log::debug!("compressor: frame closed, {} bytes out", self.pending.len());
        Ok(std::mem::take(&mut self.pending))
    }

    /// Abandon the current frame and any pending output
    ///
    /// Level, dictionary and checksum settings are kept.
    pub fn reset(&mut self) -> Result<()> {
        self.pending.clear();
        self.finished = false;
        self.encoder.reinit().map_err(Error::codec)
    }
}

impl io::Write for StreamingCompress {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.feed(buf)?;
        Ok(buf.len())
    }

    /// Flushes the encoder into the pending buffer; the bytes are still
    /// collected with [`StreamingCompress::finish`].
    fn flush(&mut self) -> io::Result<()> {
        let flushed = StreamingCompress::flush(self)?;
        self.pending = flushed;
        Ok(())
    }
}

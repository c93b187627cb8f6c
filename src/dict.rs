// Copyright 2024 Karpeles Lab Inc.
// Prepared dictionaries shared between streams

use std::fmt;

use zstd::dict::{DecoderDictionary, EncoderDictionary};
use zstd::stream::raw::{Decoder, Encoder};

use crate::constants::DICTIONARY_MAGIC;
use crate::error::{Error, Result};

/// Check a compression level against the range supported by the codec
pub(crate) fn check_level(level: i32) -> Result<i32> {
    if zstd::compression_level_range().contains(&level) {
        Ok(level)
    } else {
        Err(Error::InvalidLevel(level))
    }
}

/// Dictionary id stored in the header of a zstd-format dictionary
///
/// Raw-content dictionaries (anything not starting with the dictionary magic)
/// have no id and report 0.
pub fn dictionary_id(data: &[u8]) -> u32 {
    if data.len() < 8 {
        return 0;
    }
    let magic = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    if magic != DICTIONARY_MAGIC {
        return 0;
    }
    u32::from_le_bytes([data[4], data[5], data[6], data[7]])
}

/// Compression dictionary digested once for a given level
///
/// Building the dictionary is the expensive part of attaching one to a
/// stream. A `CompressionDictionary` does it once; wrap it in an [`Arc`] and
/// hand clones to as many [`StreamingCompress`] instances as needed, on any
/// thread.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use zstream::{CompressionDictionary, StreamingCompress};
///
/// let dict = Arc::new(CompressionDictionary::new(b"{\"name\":\"\",\"id\":0}", 5).unwrap());
/// let mut stream = StreamingCompress::with_prepared_dictionary(dict.clone()).unwrap();
/// stream.push(b"{\"name\":\"zstream\",\"id\":42}").unwrap();
/// let frame = stream.finish().unwrap();
/// assert!(!frame.is_empty());
/// ```
///
/// [`Arc`]: std::sync::Arc
/// [`StreamingCompress`]: crate::StreamingCompress
pub struct CompressionDictionary {
    inner: EncoderDictionary<'static>,
    level: i32,
    id: u32,
    size: usize,
}

impl CompressionDictionary {
    /// Build a dictionary from raw bytes for the given compression level
    pub fn new(data: &[u8], level: i32) -> Result<Self> {
        let level = check_level(level)?;

        // libzstd only digests a dictionary when a frame starts, so run an
        // empty frame through a scratch context to surface malformed input
        // here instead of as a panic in the prepared-dictionary builder.
        let mut probe = Encoder::with_dictionary(level, data).map_err(Error::dictionary)?;
        crate::compress::probe_dictionary(&mut probe)?;

        let inner = EncoderDictionary::copy(data, level);
        let id = dictionary_id(data);
        log::debug!(
            "built compression dictionary: {} bytes, level {}, id {}",
            data.len(),
            level,
            id
        );

        Ok(CompressionDictionary {
            inner,
            level,
            id,
            size: data.len(),
        })
    }

    /// Compression level the dictionary was digested for
    pub fn level(&self) -> i32 {
        self.level
    }

    /// Dictionary id (0 for raw-content dictionaries)
    pub fn dict_id(&self) -> u32 {
        self.id
    }

    /// Size of the source bytes
    pub fn len(&self) -> usize {
        self.size
    }

    /// True when built from an empty byte string
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub(crate) fn as_encoder_dictionary(&self) -> &EncoderDictionary<'static> {
        &self.inner
    }
}

impl fmt::Debug for CompressionDictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompressionDictionary")
            .field("level", &self.level)
            .field("id", &self.id)
            .field("size", &self.size)
            .finish()
    }
}

/// Decompression dictionary, digested once and shared between streams
pub struct DecompressionDictionary {
    inner: DecoderDictionary<'static>,
    id: u32,
    size: usize,
}

impl DecompressionDictionary {
    /// Build a dictionary from raw bytes
    pub fn new(data: &[u8]) -> Result<Self> {
        // Loading into a context validates the dictionary; the prepared
        // builder below would panic on input the codec refuses.
        Decoder::with_dictionary(data).map_err(Error::dictionary)?;

        let inner = DecoderDictionary::copy(data);
        let id = dictionary_id(data);
        log::debug!(
            "built decompression dictionary: {} bytes, id {}",
            data.len(),
            id
        );

        Ok(DecompressionDictionary {
            inner,
            id,
            size: data.len(),
        })
    }

    /// Dictionary id (0 for raw-content dictionaries)
    pub fn dict_id(&self) -> u32 {
        self.id
    }

    /// Size of the source bytes
    pub fn len(&self) -> usize {
        self.size
    }

    /// True when built from an empty byte string
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub(crate) fn as_decoder_dictionary(&self) -> &DecoderDictionary<'static> {
        &self.inner
    }
}

impl fmt::Debug for DecompressionDictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecompressionDictionary")
            .field("id", &self.id)
            .field("size", &self.size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// Dictionary magic, id 7, then entropy tables that stop after three bytes
    const BROKEN_DICT: &[u8] = &[
        0x37, 0xA4, 0x30, 0xEC, 0x07, 0x00, 0x00, 0x00, 0x01, 0x02, 0x03,
    ];

    #[test]
    fn test_raw_content_dictionary() {
        let dict = CompressionDictionary::new(b"some shared prefix text", 3).unwrap();
        assert_eq!(dict.level(), 3);
        assert_eq!(dict.dict_id(), 0);
        assert_eq!(dict.len(), 23);

        let ddict = DecompressionDictionary::new(b"some shared prefix text").unwrap();
        assert_eq!(ddict.dict_id(), 0);
    }

    #[test]
    fn test_dictionary_id() {
        assert_eq!(dictionary_id(BROKEN_DICT), 7);
        assert_eq!(dictionary_id(b"plain"), 0);
        assert_eq!(dictionary_id(b"plain text that is long enough"), 0);
    }

    #[test]
    fn test_malformed_dictionary() {
        assert!(matches!(
            CompressionDictionary::new(BROKEN_DICT, 3),
            Err(Error::InvalidDictionary(_))
        ));
        assert!(matches!(
            DecompressionDictionary::new(BROKEN_DICT),
            Err(Error::InvalidDictionary(_))
        ));
    }

    #[test]
    fn test_invalid_level() {
        assert_eq!(
            CompressionDictionary::new(b"dict", 1000).unwrap_err(),
            Error::InvalidLevel(1000)
        );
    }

    #[test]
    fn test_dictionaries_are_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CompressionDictionary>();
        assert_send_sync::<DecompressionDictionary>();
        assert_send_sync::<Arc<CompressionDictionary>>();
    }
}

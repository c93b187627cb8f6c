// Copyright 2024 Karpeles Lab Inc.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Skippable frames: metadata carried in front of compressed data
//!
//! A skippable frame is an 8-byte header followed by opaque metadata:
//!
//! ```text
//! offset 0..4  magic = 0x184D2A50 | variant   (u32 little-endian, variant 0..=15)
//! offset 4..8  metadata length                (u32 little-endian)
//! offset 8..   metadata, then the payload
//! ```
//!
//! Decoders skip these frames, so metadata can travel inside a zstd stream
//! without affecting its decompressed content.

use crate::constants::*;
use crate::error::{Error, Result};

/// A skippable frame found at the start of a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkippableFrame<'a> {
    magic_variant: u32,
    metadata: &'a [u8],
}

impl<'a> SkippableFrame<'a> {
    /// Magic variant (0..=15) the frame was written with
    pub fn magic_variant(&self) -> u32 {
        self.magic_variant
    }

    /// Metadata bytes carried by the frame
    pub fn metadata(&self) -> &'a [u8] {
        self.metadata
    }

    /// Size of the whole frame, header included
    ///
    /// The payload that followed the frame starts at this offset.
    pub fn frame_size(&self) -> usize {
        SKIPPABLE_HEADER_SIZE + self.metadata.len()
    }
}

fn read_u32_le(data: &[u8]) -> u32 {
    u32::from_le_bytes([data[0], data[1], data[2], data[3]])
}

/// Report whether `data` starts with a skippable frame magic number
pub fn is_skippable_frame(data: &[u8]) -> bool {
    data.len() >= SKIPPABLE_HEADER_SIZE
        && read_u32_le(data) & SKIPPABLE_MAGIC_MASK == SKIPPABLE_MAGIC_BASE
}

/// Prefix `payload` with a skippable frame carrying `metadata`
///
/// The payload is copied as is and does not need to be compressed data.
///
/// ```
/// use zstream::{read_skippable_frame, write_skippable_frame};
///
/// let framed = write_skippable_frame(b"payload", b"sample data", 0).unwrap();
/// assert_eq!(framed.len(), 8 + 11 + 7);
/// assert_eq!(read_skippable_frame(&framed).unwrap().unwrap(), b"sample data");
/// ```
pub fn write_skippable_frame(payload: &[u8], metadata: &[u8], magic_variant: u32) -> Result<Vec<u8>> {
    if magic_variant > MAX_MAGIC_VARIANT {
        return Err(Error::InvalidMagicVariant(magic_variant));
    }
    let metadata_len =
        u32::try_from(metadata.len()).map_err(|_| Error::TooLarge(metadata.len()))?;

    let mut out = Vec::with_capacity(SKIPPABLE_HEADER_SIZE + metadata.len() + payload.len());
    out.extend_from_slice(&(SKIPPABLE_MAGIC_BASE | magic_variant).to_le_bytes());
    out.extend_from_slice(&metadata_len.to_le_bytes());
    out.extend_from_slice(metadata);
    out.extend_from_slice(payload);

    log::trace!(
        "skippable frame: variant {}, {} bytes metadata, {} bytes payload",
        magic_variant,
        metadata.len(),
        payload.len()
    );
    Ok(out)
}

/// Parse the skippable frame at the start of `data`
///
/// Returns `Ok(None)` when `data` does not start with a skippable frame, and
/// [`Error::TruncatedFrame`] when the header announces more metadata than
/// `data` holds. Bytes after the metadata are never looked at.
pub fn parse_skippable_frame(data: &[u8]) -> Result<Option<SkippableFrame<'_>>> {
    if !is_skippable_frame(data) {
        return Ok(None);
    }

    let magic_variant = read_u32_le(data) & !SKIPPABLE_MAGIC_MASK;
    let metadata_len = read_u32_le(&data[4..]) as usize;
    let end = SKIPPABLE_HEADER_SIZE
        .checked_add(metadata_len)
        .ok_or(Error::TruncatedFrame)?;
    if end > data.len() {
        return Err(Error::TruncatedFrame);
    }

    Ok(Some(SkippableFrame {
        magic_variant,
        metadata: &data[SKIPPABLE_HEADER_SIZE..end],
    }))
}

/// Read the metadata of the skippable frame at the start of `data`
///
/// Returns `Ok(None)` when there is no skippable frame.
pub fn read_skippable_frame(data: &[u8]) -> Result<Option<Vec<u8>>> {
    Ok(parse_skippable_frame(data)?.map(|frame| frame.metadata().to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{compress, decompress};

    #[test]
    fn test_plain_data_not_found() {
        assert_eq!(read_skippable_frame(b"abc").unwrap(), None);
        assert_eq!(read_skippable_frame(b"").unwrap(), None);
        assert_eq!(read_skippable_frame(b"not a skippable frame").unwrap(), None);
    }

    #[test]
    fn test_compressed_data_not_found() {
        let frame = compress(&b"0123456789abcdef".repeat(20), 3).unwrap();
        assert_eq!(read_skippable_frame(&frame).unwrap(), None);
    }

    #[test]
    fn test_all_variants() {
        let payload = compress(b"the payload", 3).unwrap();
        for variant in 0..=MAX_MAGIC_VARIANT {
            let framed = write_skippable_frame(&payload, b"sample data", variant).unwrap();
            let frame = parse_skippable_frame(&framed).unwrap().unwrap();

            assert_eq!(frame.magic_variant(), variant);
            assert_eq!(frame.metadata(), b"sample data");
            assert_eq!(&framed[frame.frame_size()..], &payload[..]);
        }
    }

    #[test]
    fn test_header_layout() {
        let framed = write_skippable_frame(b"", b"meta", 1).unwrap();
        assert_eq!(
            framed,
            [0x51, 0x2A, 0x4D, 0x18, 0x04, 0x00, 0x00, 0x00, b'm', b'e', b't', b'a']
        );
    }

    #[test]
    fn test_large_metadata() {
        let metadata = vec![b'x'; 10000];
        let framed = write_skippable_frame(b"test data", &metadata, 0).unwrap();

        assert_eq!(framed.len(), 8 + metadata.len() + 9);
        assert_eq!(read_skippable_frame(&framed).unwrap().unwrap(), metadata);
    }

    #[test]
    fn test_empty_payload_and_metadata() {
        let framed = write_skippable_frame(b"", b"metadata", 0).unwrap();
        assert_eq!(read_skippable_frame(&framed).unwrap().unwrap(), b"metadata");

        let framed = write_skippable_frame(b"test", b"", 0).unwrap();
        assert_eq!(read_skippable_frame(&framed).unwrap().unwrap(), b"");
    }

    #[test]
    fn test_invalid_variant() {
        assert_eq!(
            write_skippable_frame(b"", b"", 16).unwrap_err(),
            Error::InvalidMagicVariant(16)
        );
    }

    #[test]
    fn test_truncated_metadata() {
        let framed = write_skippable_frame(b"", b"metadata", 0).unwrap();
        assert_eq!(
            read_skippable_frame(&framed[..12]).unwrap_err(),
            Error::TruncatedFrame
        );
    }

    #[test]
    fn test_decoder_skips_frame() {
        let payload = compress(b"decoded content", 3).unwrap();
        let framed = write_skippable_frame(&payload, b"{\"source\":\"test\"}", 3).unwrap();

        assert_eq!(decompress(&framed).unwrap(), b"decoded content");
    }
}

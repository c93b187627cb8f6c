//! Frames written by the streaming compressor must be readable by the
//! reference zstd decoder, and the other way around

use std::io::Cursor;

use zstream::{decompress, write_skippable_frame, StreamingCompress, StreamingDecompress};

const INPUT: &[u8] = b"This is a larger test file with more data to compress. It contains repeated patterns that should compress well. This is a larger test file with more data to compress. It contains repeated patterns that should compress well.\n";

#[test]
fn test_reference_decoder_reads_stream() {
    let mut stream = StreamingCompress::with_level(3).unwrap();
    let mut compressed = Vec::new();
    for chunk in INPUT.chunks(10) {
        compressed.extend(stream.compress(chunk).unwrap());
    }
    compressed.extend(stream.flush().unwrap());
    compressed.extend(stream.finish().unwrap());

    let decoded = zstd::stream::decode_all(Cursor::new(&compressed)).unwrap();
    assert_eq!(decoded, INPUT);
}

#[test]
fn test_stream_reads_reference_encoder() {
    for level in [1, 3, 19] {
        let compressed = zstd::stream::encode_all(Cursor::new(INPUT), level).unwrap();

        let mut stream = StreamingDecompress::new().unwrap();
        let mut decoded = Vec::new();
        for chunk in compressed.chunks(3) {
            decoded.extend(stream.decompress(chunk).unwrap());
        }
        assert_eq!(decoded, INPUT, "level {}", level);
        assert!(stream.is_frame_complete());
    }
}

#[test]
fn test_reference_decoder_skips_metadata() {
    let payload = zstream::compress(INPUT, 3).unwrap();
    let framed = write_skippable_frame(&payload, b"{\"origin\":\"zstream\"}", 7).unwrap();

    let decoded = zstd::stream::decode_all(Cursor::new(&framed)).unwrap();
    assert_eq!(decoded, INPUT);
}

#[test]
fn test_bulk_api_matches_stream() {
    let bulk = zstd::bulk::compress(INPUT, 5).unwrap();
    assert_eq!(decompress(&bulk).unwrap(), INPUT);

    let ours = zstream::compress(INPUT, 5).unwrap();
    let decoded = zstd::bulk::decompress(&ours, INPUT.len()).unwrap();
    assert_eq!(decoded, INPUT);
}

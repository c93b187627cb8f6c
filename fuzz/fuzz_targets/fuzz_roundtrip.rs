#![no_main]

use libfuzzer_sys::fuzz_target;
use zstream::{StreamingCompress, StreamingDecompress};

fuzz_target!(|data: &[u8]| {
    if data.len() > 1_000_000 || data.is_empty() {
        return;
    }

    // First byte picks the chunk size so the split points vary with the input
    let chunk_size = data[0] as usize + 1;
    let payload = &data[1..];

    let mut compressor = StreamingCompress::with_level(1).unwrap();
    let mut compressed = Vec::new();
    for chunk in payload.chunks(chunk_size) {
        compressed.extend(compressor.compress(chunk).unwrap());
        if chunk.len() % 3 == 0 {
            compressed.extend(compressor.flush().unwrap());
        }
    }
    compressed.extend(compressor.finish().unwrap());

    let mut decompressor = StreamingDecompress::new().unwrap();
    let mut decompressed = Vec::new();
    for chunk in compressed.chunks(chunk_size) {
        decompressed.extend(decompressor.decompress(chunk).unwrap());
    }

    assert!(decompressor.is_frame_complete());
    assert_eq!(payload, &decompressed[..], "Chunked roundtrip failed");
});

#![no_main]

use libfuzzer_sys::fuzz_target;
use zstream::{read_skippable_frame, StreamingDecompress};

fuzz_target!(|data: &[u8]| {
    // Arbitrary input either decodes or returns an error, never panics
    if let Ok(mut stream) = StreamingDecompress::new() {
        let _ = stream.decompress(data);
    }
    let _ = read_skippable_frame(data);
});

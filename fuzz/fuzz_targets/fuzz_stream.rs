#![no_main]

use libfuzzer_sys::fuzz_target;
use zstream::StreamingDecompress;

fuzz_target!(|data: &[u8]| {
    if data.len() > 1_000_000 || data.is_empty() {
        return;
    }

    // Drive the decoder the way a caller with its own I/O would
    let step = data[0] as usize % 64 + 1;
    let input = &data[1..];

    let mut stream = match StreamingDecompress::new() {
        Ok(stream) => stream,
        Err(_) => return,
    };
    let mut offset = 0;
    while offset < input.len() {
        let end = (offset + step).min(input.len());
        match stream.decompress_with_pos(&input[offset..end]) {
            Ok((_, consumed)) => {
                assert!(consumed <= end - offset);
                if consumed == 0 {
                    break;
                }
                offset += consumed;
            }
            Err(_) => break,
        }
    }
});

// Copyright 2024 Karpeles Lab Inc.
// Parallel frame compression using Rayon

use rayon::prelude::*;

use crate::compress::StreamingCompress;
use crate::error::Result;
use crate::options::CompressOptions;

/// Compress `data` as a sequence of independent frames, in parallel
///
/// `data` is cut into `frame_size` pieces (the last one may be shorter).
/// Every piece is compressed into its own frame by its own
/// [`StreamingCompress`] on the Rayon pool; a prepared dictionary in
/// `options` is shared by all workers through its `Arc`. Frames are
/// concatenated in input order, so the result decodes like any multi-frame
/// stream.
///
/// # Example
///
/// ```ignore
/// use zstream::{compress_frames_parallel, decompress, CompressOptions};
///
/// let data = vec![7u8; 4 << 20];
/// let compressed = compress_frames_parallel(&data, 1 << 20, &CompressOptions::new()).unwrap();
/// assert_eq!(decompress(&compressed).unwrap(), data);
/// ```
pub fn compress_frames_parallel(
    data: &[u8],
    frame_size: usize,
    options: &CompressOptions,
) -> Result<Vec<u8>> {
    let frame_size = frame_size.max(1);

    let frames: Vec<Vec<u8>> = data
        .par_chunks(frame_size)
        .map(|piece| {
            let mut stream = StreamingCompress::with_options(options.clone())?;
            stream.write([piece])?;
            stream.finish()
        })
        .collect::<Result<_>>()?;

    log::debug!(
        "parallel compression: {} bytes in {} frames",
        data.len(),
        frames.len()
    );
    Ok(frames.concat())
}

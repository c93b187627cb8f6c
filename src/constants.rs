// Copyright 2024 Karpeles Lab Inc.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

/// Default compression level (matches libzstd's default)
pub const DEFAULT_LEVEL: i32 = zstd::DEFAULT_COMPRESSION_LEVEL;

/// First skippable frame magic number (variant 0)
pub const SKIPPABLE_MAGIC_BASE: u32 = 0x184D_2A50;

/// Mask selecting the base of a skippable frame magic number
pub const SKIPPABLE_MAGIC_MASK: u32 = 0xFFFF_FFF0;

/// Highest skippable frame magic variant
pub const MAX_MAGIC_VARIANT: u32 = 15;

/// Skippable frame header size: magic (4 bytes) + metadata length (4 bytes)
pub const SKIPPABLE_HEADER_SIZE: usize = 8;

/// Magic number at the start of a zstd-format dictionary
pub const DICTIONARY_MAGIC: u32 = 0xEC30_A437;

/// Output growth step for the compressor (one compressed block plus headers)
pub const COMPRESS_OUT_CHUNK: usize = 128 << 10;

/// Output growth step for the decompressor (one decoded block)
pub const DECOMPRESS_OUT_CHUNK: usize = 128 << 10;

/// Spare capacity below which output buffers are grown before a codec call
pub const MIN_OUTPUT_SPARE: usize = 4 << 10;

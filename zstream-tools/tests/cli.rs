// Copyright 2024 Karpeles Lab Inc.
// End-to-end tests for the zsc and zsd binaries

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

const ZSC: &str = env!("CARGO_BIN_EXE_zsc");
const ZSD: &str = env!("CARGO_BIN_EXE_zsd");

fn run(bin: &str, args: &[&str]) -> Output {
    Command::new(bin)
        .args(args)
        .output()
        .expect("failed to spawn binary")
}

fn sample_data() -> Vec<u8> {
    b"The quick brown fox jumps over the lazy dog. ".repeat(2000)
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("temp path is not utf-8")
}

#[test]
fn test_compress_decompress_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("sample.txt");
    let compressed = dir.path().join("sample.txt.zst");
    fs::write(&input, sample_data()).unwrap();

    let out = run(ZSC, &["-q", "--verify", path_str(&input)]);
    assert!(out.status.success(), "zsc failed: {:?}", out);
    assert!(compressed.exists());
    assert!(fs::metadata(&compressed).unwrap().len() < sample_data().len() as u64);

    let out = run(ZSD, &["-q", "--rm", path_str(&compressed)]);
    assert!(out.status.success(), "zsd failed: {:?}", out);
    assert!(!compressed.exists());
    assert_eq!(fs::read(&input).unwrap(), sample_data());
}

#[test]
fn test_metadata_frame() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("data.bin");
    let meta = dir.path().join("meta.json");
    let compressed = dir.path().join("data.zst");
    let restored = dir.path().join("restored.bin");
    fs::write(&input, sample_data()).unwrap();
    fs::write(&meta, b"{\"origin\":\"cli test\"}").unwrap();

    let out = run(
        ZSC,
        &[
            "-q",
            "--meta",
            path_str(&meta),
            "--meta-variant",
            "5",
            "-o",
            path_str(&compressed),
            path_str(&input),
        ],
    );
    assert!(out.status.success(), "zsc failed: {:?}", out);

    let bytes = fs::read(&compressed).unwrap();
    let frame = zstream::parse_skippable_frame(&bytes).unwrap().unwrap();
    assert_eq!(frame.magic_variant(), 5);
    assert_eq!(frame.metadata(), b"{\"origin\":\"cli test\"}");

    let out = run(
        ZSD,
        &[
            "-q",
            "--show-meta",
            "-o",
            path_str(&restored),
            path_str(&compressed),
        ],
    );
    assert!(out.status.success(), "zsd failed: {:?}", out);
    assert!(String::from_utf8_lossy(&out.stdout).contains("cli test"));
    assert_eq!(fs::read(&restored).unwrap(), sample_data());
}

#[test]
fn test_dictionary_and_flush() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("records.json");
    let dict = dir.path().join("records.dict");
    let compressed = dir.path().join("records.json.zst");
    let restored = dir.path().join("records.out");
    fs::write(&input, b"{\"id\":1,\"name\":\"first record\"}\n".repeat(500)).unwrap();
    fs::write(&dict, b"{\"id\":0,\"name\":\"\"}\n".repeat(20)).unwrap();

    let out = run(
        ZSC,
        &[
            "-q",
            "--level",
            "7",
            "--dict",
            path_str(&dict),
            "--flush-every",
            "1K",
            "--verify",
            path_str(&input),
        ],
    );
    assert!(out.status.success(), "zsc failed: {:?}", out);

    let out = run(
        ZSD,
        &[
            "-q",
            "--dict",
            path_str(&dict),
            "-o",
            path_str(&restored),
            path_str(&compressed),
        ],
    );
    assert!(out.status.success(), "zsd failed: {:?}", out);
    assert_eq!(fs::read(&restored).unwrap(), fs::read(&input).unwrap());
}

#[test]
fn test_parallel_frames() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("big.bin");
    let compressed = dir.path().join("big.bin.zst");
    let data: Vec<u8> = (0u32..300_000).map(|i| (i % 251) as u8).collect();
    fs::write(&input, &data).unwrap();

    let out = run(ZSC, &["-q", "--frame-size", "64K", "--verify", path_str(&input)]);
    assert!(out.status.success(), "zsc failed: {:?}", out);

    let out = run(ZSD, &["-q", "-c", path_str(&compressed)]);
    assert!(out.status.success(), "zsd failed: {:?}", out);
    assert_eq!(out.stdout, data);
}

#[test]
fn test_truncated_input_reported() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("cut.txt");
    let compressed = dir.path().join("cut.txt.zst");
    fs::write(&input, sample_data()).unwrap();

    let out = run(ZSC, &["-q", path_str(&input)]);
    assert!(out.status.success());

    let bytes = fs::read(&compressed).unwrap();
    fs::write(&compressed, &bytes[..bytes.len() - 3]).unwrap();

    let out = run(ZSD, &["-q", "--verify", path_str(&compressed)]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("truncated"));
}

#[test]
fn test_safe_mode_refuses_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("keep.txt");
    let compressed = dir.path().join("keep.txt.zst");
    fs::write(&input, b"keep me").unwrap();
    fs::write(&compressed, b"existing").unwrap();

    let out = run(ZSC, &["-q", "--safe", path_str(&input)]);
    assert!(!out.status.success());
    assert_eq!(fs::read(&compressed).unwrap(), b"existing");
}

#[test]
fn test_invalid_arguments() {
    let out = run(ZSC, &["--meta-variant", "16", "whatever"]);
    assert!(!out.status.success());

    let out = run(ZSD, &["not-a-zst-file.txt"]);
    assert!(!out.status.success());
}

use std::{fs, path::Path};

use disk_hammer::{
    cksum::cksum, Alignment, AlignmentSource, Config, ConfigError, Hammer, HammerError, OpenMode,
    Seed, WriteLimits,
};
use tempfile::TempDir;

fn config(path: &Path, chunk_size: usize, chunk_count: usize, length: u64, iterations: u64) -> Config {
    let mut config = Config::new(path);
    config.chunk_size = chunk_size;
    config.chunk_count = chunk_count;
    config.length = length;
    config.iterations = iterations;
    config.seed = Seed::Fixed(1);
    config.direct = false;
    config.lock_memory = false;
    config
}

fn aligned(bytes: usize) -> Alignment {
    Alignment {
        bytes,
        source: AlignmentSource::Default,
    }
}

#[test]
fn writes_two_chunk_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("target.bin");
    let hammer = Hammer::with_alignment(config(&path, 4096, 2, 8192, 1), aligned(4096)).unwrap();
    assert_eq!(hammer.plan().buffer_size, 4096 + 4096);

    let summary = hammer.run(|_| {}).unwrap();
    assert_eq!(summary.iterations, 1);
    assert_eq!(summary.bytes, 8192);

    let data = fs::read(&path).unwrap();
    assert_eq!(data.len(), 8192);
    assert_eq!(&data[..4096], hammer.buffer().chunk(0));
    assert_eq!(&data[4096..], hammer.buffer().chunk(1));
    assert_ne!(&data[..4096], &data[4096..]);
}

#[test]
fn rotates_leading_chunk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("target.bin");
    let hammer = Hammer::with_alignment(config(&path, 4096, 2, 8192, 3), aligned(4096)).unwrap();
    let chunk0 = hammer.buffer().chunk(0).to_vec();
    let chunk1 = hammer.buffer().chunk(1).to_vec();

    let mut leading = Vec::new();
    hammer
        .run(|report| {
            let data = fs::read(&path).unwrap();
            assert_eq!(data.len() as u64, report.bytes);
            let first = &data[..4096];
            leading.push(if first == chunk0.as_slice() {
                0
            } else if first == chunk1.as_slice() {
                1
            } else {
                usize::MAX
            });
        })
        .unwrap();
    assert_eq!(leading, vec![0, 1, 0]);
}

#[test]
fn file_chunks_match_reported_checksums() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("target.bin");
    let mut cfg = config(&path, 4096, 3, 5 * 4096, 1);
    cfg.checksums = true;
    let hammer = Hammer::with_alignment(cfg, aligned(512)).unwrap();
    let report = hammer.startup_report();
    assert_eq!(report.checksums.len(), 3);

    hammer.run(|_| {}).unwrap();
    let data = fs::read(&path).unwrap();
    for sum in &report.checksums {
        assert_eq!(sum.offset, sum.index * 512);
        let at = sum.index * sum.len;
        assert_eq!(cksum(&data[at..at + sum.len]), sum.crc, "chunk {}", sum.index);
    }
}

#[test]
fn identical_runs_identical_bytes() {
    let dir = TempDir::new().unwrap();
    let a_path = dir.path().join("a.bin");
    let b_path = dir.path().join("b.bin");
    let a = Hammer::with_alignment(config(&a_path, 4096, 4, 64 * 1024, 1), aligned(512)).unwrap();
    let b = Hammer::with_alignment(config(&b_path, 4096, 4, 64 * 1024, 1), aligned(512)).unwrap();
    assert_eq!(a.buffer().as_bytes(), b.buffer().as_bytes());
    assert_eq!(a.buffer().checksums(), b.buffer().checksums());

    a.run(|_| {}).unwrap();
    b.run(|_| {}).unwrap();
    assert_eq!(fs::read(&a_path).unwrap(), fs::read(&b_path).unwrap());
}

#[test]
fn dry_run_leaves_target_alone() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("target.bin");
    let mut cfg = config(&path, 4096, 2, 8192, 5);
    cfg.dry_run = true;
    cfg.verbose = true;
    let hammer = Hammer::with_alignment(cfg, aligned(4096)).unwrap();
    assert_eq!(hammer.startup_report().checksums.len(), 2);

    let mut calls = 0;
    let summary = hammer.run(|_| calls += 1).unwrap();
    assert_eq!(calls, 0);
    assert_eq!(summary.iterations, 0);
    assert!(!path.exists());
}

#[test]
fn in_place_trims_longer_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("target.bin");
    fs::write(&path, vec![0xaa; 20_000]).unwrap();

    let hammer = Hammer::with_alignment(config(&path, 4096, 2, 8192, 1), aligned(4096)).unwrap();
    hammer.run(|_| {}).unwrap();
    let data = fs::read(&path).unwrap();
    assert_eq!(data.len(), 8192);
    assert_eq!(&data[..4096], hammer.buffer().chunk(0));
    assert_eq!(&data[4096..], hammer.buffer().chunk(1));
}

#[test]
fn in_place_extends_shorter_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("target.bin");
    fs::write(&path, vec![0xaa; 100]).unwrap();

    let hammer = Hammer::with_alignment(config(&path, 4096, 2, 8192, 1), aligned(4096)).unwrap();
    hammer.run(|_| {}).unwrap();
    assert_eq!(fs::metadata(&path).unwrap().len(), 8192);
}

#[test]
fn truncate_mode_replaces_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("target.bin");
    fs::write(&path, vec![0xaa; 20_000]).unwrap();

    let mut cfg = config(&path, 4096, 2, 8192, 2);
    cfg.open_mode = OpenMode::Truncate;
    let hammer = Hammer::with_alignment(cfg, aligned(4096)).unwrap();
    hammer.run(|_| {}).unwrap();
    let data = fs::read(&path).unwrap();
    assert_eq!(data.len(), 8192);
    // Second iteration starts with chunk 1.
    assert_eq!(&data[..4096], hammer.buffer().chunk(1));
}

#[test]
fn small_write_limits_still_produce_whole_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("target.bin");
    let mut cfg = config(&path, 512, 3, 100 * 512, 1);
    cfg.limits = WriteLimits::new(7, 3 * 512);
    let hammer = Hammer::with_alignment(cfg, aligned(512)).unwrap();
    hammer.run(|_| {}).unwrap();

    let data = fs::read(&path).unwrap();
    assert_eq!(data.len(), 100 * 512);
    for (i, chunk) in data.chunks(512).enumerate() {
        assert_eq!(chunk, hammer.buffer().chunk(i % 3), "chunk {i}");
    }
}

#[test]
fn rejects_config_before_touching_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("target.bin");

    let err = Hammer::prepare(config(&path, 4096, 0, 8192, 1)).unwrap_err();
    assert!(matches!(err, HammerError::Config(ConfigError::ZeroChunkCount)));

    let err = Hammer::prepare(config(&path, 4096, 2, 100, 1)).unwrap_err();
    assert!(matches!(err, HammerError::Config(ConfigError::LengthBelowChunk { .. })));

    let err = Hammer::with_alignment(config(&path, 512, 2, 8192, 1), aligned(4096)).unwrap_err();
    assert!(matches!(
        err,
        HammerError::Config(ConfigError::AlignmentExceedsChunk { .. })
    ));
    assert!(!path.exists());
}

#[test]
fn missing_directory_fails_on_open() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("no/such/dir/target.bin");
    let hammer = Hammer::with_alignment(config(&path, 4096, 2, 8192, 1), aligned(4096)).unwrap();
    let err = hammer.run(|_| {}).unwrap_err();
    assert!(matches!(err, HammerError::Open { iteration: 0, .. }));
}

#[test]
fn resolves_alignment_and_requests_direct_io() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("target.bin");
    let mut cfg = config(&path, 64 * 1024, 2, 256 * 1024, 2);
    cfg.direct = true;
    let hammer = Hammer::prepare(cfg).unwrap();
    assert!(hammer.alignment().bytes <= 64 * 1024);

    // Filesystems without direct I/O support fall back to buffered writes.
    let summary = hammer.run(|_| {}).unwrap();
    assert_eq!(summary.iterations, 2);
    let data = fs::read(&path).unwrap();
    assert_eq!(data.len(), 256 * 1024);
    assert_eq!(&data[..64 * 1024], hammer.buffer().chunk(1));
}

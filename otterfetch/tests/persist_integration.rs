//! Integration tests for the persistence layer.
//!
//! These exercise the public persistence surface against a real filesystem:
//! collision policy, chunked appends, and partial-file cleanup.
//!
//! Run with: `cargo test --test persist_integration`

use std::path::{Path, PathBuf};

use otterfetch::{persist, Confirmation, DownloadRequest, Persister};

struct Answer(bool);

impl Confirmation for Answer {
    fn confirm_overwrite(&self, _path: &Path) -> bool {
        self.0
    }
}

fn request(dir: &Path) -> DownloadRequest {
    DownloadRequest {
        object_id: "8c6b14d0-2a4e-4f5b-8a7c-9e0d1f2a3b4c".to_string(),
        developer_id: "74931".to_string(),
        dest_dir: dir.to_path_buf(),
        extension: "bin".to_string(),
        expected_size: None,
        force_overwrite: false,
    }
}

#[test]
fn target_path_is_deterministic() {
    let request = request(Path::new("/srv/downloads"));
    assert_eq!(
        request.target_path(),
        PathBuf::from("/srv/downloads/8c6b14d0-2a4e-4f5b-8a7c-9e0d1f2a3b4c.bin")
    );
}

#[test]
fn chunked_writes_round_trip_unmodified() {
    let dir = tempfile::tempdir().unwrap();
    let target = request(dir.path()).target_path();

    persist::preflight(&target, false, &Answer(false)).unwrap();
    let mut sink = Persister::create(&target).unwrap();
    let chunks: Vec<Vec<u8>> = (0u8..8).map(|i| vec![i; 1024]).collect();
    for chunk in &chunks {
        sink.append(chunk).unwrap();
    }
    let written = sink.finish().unwrap();
    assert_eq!(written, 8 * 1024);

    let on_disk = std::fs::read(&target).unwrap();
    let expected: Vec<u8> = chunks.concat();
    assert_eq!(on_disk, expected);
}

#[test]
fn declined_collision_leaves_original_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let target = request(dir.path()).target_path();
    std::fs::write(&target, b"original payload").unwrap();

    let result = persist::preflight(&target, false, &Answer(false));
    assert!(result.is_err());
    assert_eq!(std::fs::read(&target).unwrap(), b"original payload");
}

#[test]
fn discard_after_partial_append_leaves_nothing_behind() {
    let dir = tempfile::tempdir().unwrap();
    let target = request(dir.path()).target_path();

    let mut sink = Persister::create(&target).unwrap();
    sink.append(&[0u8; 4096]).unwrap();
    assert!(target.exists());
    sink.discard();
    assert!(!target.exists());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

//! Tests for export storage engines
//!
//! Every engine must return exactly the bytes it was given. The file engine
//! must never read or write outside its base directory.

#[path = "testutils/mod.rs"]
mod testutils;

use querycache::export::{
    new_export_id, FileResultStorageEngine, RemoteResultStorageEngine, ResultStorageEngine,
    StorageError,
};
use querycache::remote::{open_backend, BackendType, ListClient, MemoryStore};
use std::fs;
use std::io::Read;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use testutils::player_stats::player_rows;

/// Newline-delimited JSON rows
fn export_bytes(copies: usize) -> Vec<u8> {
    let mut out = Vec::new();
    for _ in 0..copies {
        for row in player_rows() {
            out.extend(serde_json::to_vec(&row).unwrap());
            out.push(b'\n');
        }
    }
    out
}

fn read_back(engine: &dyn ResultStorageEngine, id: &str) -> Vec<u8> {
    let mut out = Vec::new();
    engine.get_results(id).unwrap().read_to_end(&mut out).unwrap();
    out
}

fn check_round_trip(engine: &dyn ResultStorageEngine) {
    let data = export_bytes(20);
    let id = new_export_id();

    let result = engine.store_results(&id, &mut data.as_slice()).unwrap();
    assert_eq!(result.export_id, id);
    assert_eq!(result.record_count, 60);
    assert_eq!(result.byte_count, data.len() as u64);
    assert_eq!(read_back(engine, &id), data);
}

#[test]
fn test_file_engine_round_trip() {
    testutils::init_logging();
    let temp_dir = TempDir::new().unwrap();
    check_round_trip(&FileResultStorageEngine::new(temp_dir.path()).unwrap());
}

#[test]
fn test_memory_remote_engine_round_trip() {
    let engine = RemoteResultStorageEngine::new(
        Arc::new(MemoryStore::new()),
        Duration::from_secs(60),
        100,
        3,
    );
    check_round_trip(&engine);
}

#[cfg(feature = "sled-backend")]
#[test]
fn test_sled_remote_engine_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let location = temp_dir.path().to_string_lossy().to_string();
    let store = open_backend(BackendType::Sled, &location).unwrap();
    let engine = RemoteResultStorageEngine::new(store, Duration::from_secs(60), 64, 5);
    check_round_trip(&engine);
}

#[test]
fn test_multi_batch_reassembly_with_odd_sizes() {
    let store = open_backend(BackendType::Memory, "").unwrap();
    let data = export_bytes(7);
    for (buffer_size, batch_size) in [(1, 1), (7, 2), (13, 64), (data.len(), 1), (data.len() + 1, 4)] {
        let engine =
            RemoteResultStorageEngine::new(Arc::clone(&store), Duration::from_secs(60), buffer_size, batch_size);
        engine.store_results("e1", &mut data.as_slice()).unwrap();
        assert_eq!(
            read_back(&engine, "e1"),
            data,
            "buffer {} batch {}",
            buffer_size,
            batch_size
        );
        assert_eq!(store.len(b"e1").unwrap(), ((data.len() + buffer_size - 1) / buffer_size) as u64);
    }
}

#[test]
fn test_zero_record_export_fails() {
    let engine = RemoteResultStorageEngine::new(
        Arc::new(MemoryStore::new()),
        Duration::from_secs(60),
        100,
        3,
    );
    assert!(matches!(
        engine.get_results("never-stored"),
        Err(StorageError::NoRecords(id)) if id == "never-stored"
    ));
}

#[test]
fn test_remote_export_expires() {
    let engine = RemoteResultStorageEngine::new(
        Arc::new(MemoryStore::new()),
        Duration::from_millis(20),
        100,
        3,
    );
    engine.store_results("e1", &mut &b"row\n"[..]).unwrap();
    std::thread::sleep(Duration::from_millis(60));
    assert!(matches!(
        engine.get_results("e1"),
        Err(StorageError::NoRecords(_))
    ));
}

#[test]
fn test_file_engine_traversal_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let base = temp_dir.path().join("exports");
    let engine = FileResultStorageEngine::new(&base).unwrap();
    fs::write(temp_dir.path().join("outside.csv"), b"secret\n").unwrap();

    for id in ["../outside.csv", "..", ".", "", "/tmp/outside.csv", "nested/file"] {
        match engine.get_results(id) {
            Err(StorageError::NotFound(reported)) => {
                assert_eq!(reported, id);
            }
            Err(other) => panic!("unexpected error for {:?}: {}", id, other),
            Ok(_) => panic!("traversal allowed for {:?}", id),
        }
        let err = engine
            .store_results(id, &mut &b"evil\n"[..])
            .err()
            .unwrap();
        assert!(!err.to_string().contains(&*base.to_string_lossy()));
    }
    assert_eq!(fs::read(temp_dir.path().join("outside.csv")).unwrap(), b"secret\n");
}

#[test]
fn test_file_engine_missing_export() {
    let temp_dir = TempDir::new().unwrap();
    let engine = FileResultStorageEngine::new(temp_dir.path()).unwrap();
    assert!(matches!(
        engine.get_results("missing"),
        Err(StorageError::NotFound(_))
    ));
}

#[test]
fn test_file_engine_extension() {
    let temp_dir = TempDir::new().unwrap();
    let engine = FileResultStorageEngine::new(temp_dir.path())
        .unwrap()
        .with_extension("jsonl");
    let data = export_bytes(1);
    let result = engine.store_results("e1", &mut data.as_slice()).unwrap();
    assert_eq!(result.record_count, 3);
    assert!(engine.base_path().join("e1.jsonl").exists());
    assert_eq!(read_back(&engine, "e1"), data);
}

//! End-to-End Tests
//!
//! Exercise the whole stack through the facade crate: executor commands on
//! a disk-backed runtime, idle reclamation and reopen, and shutdown.

use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tessera::wire::{WireInsertStatement, WireTag, WireTagValue, WireValue};
use tessera::{
    CancelToken, Command, DocValue, EngineConfig, Executor, InsertStatement, Output, Runtime,
    TesseraError,
};

fn disk_config(dir: &TempDir) -> EngineConfig {
    EngineConfig {
        data_dir: dir.path().to_path_buf(),
        idle_timeout_secs: 1,
        reap_interval_secs: 3600,
        ..EngineConfig::default()
    }
}

fn wire_insert(key: &str, value: WireValue) -> WireInsertStatement {
    WireInsertStatement {
        key: key.to_string(),
        value: Some(value),
        content_type: String::new(),
        tags: None,
        with_timestamps: true,
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

/// Test: data written through the executor survives eviction and restart
#[test]
fn test_write_evict_restart_read() {
    let dir = TempDir::new().unwrap();
    let config = disk_config(&dir);

    {
        let runtime = Runtime::start(&config).unwrap();
        let executor = Executor::new(runtime.commands().clone());

        let mut tagged = wire_insert("blob", WireValue::Blob(b"bytes".to_vec()));
        tagged.tags = Some(vec![WireTag::new("rank", WireTagValue::Float(2.5))]);
        let output = executor
            .execute(
                Command::BatchInsert {
                    database: "tenant-1".into(),
                    statements: vec![tagged, wire_insert("text", WireValue::Str("bytes".into()))],
                },
                &CancelToken::new(),
            )
            .unwrap();
        assert!(matches!(output, Output::Exec { rows_affected: 2, .. }));

        // Force idle reclamation, then reopen from disk
        let later = Instant::now() + Duration::from_secs(5);
        assert_eq!(runtime.registry().reap_expired_at(later), 1);
        assert!(!runtime.registry().contains("tenant-1"));

        let docs = runtime
            .commands()
            .multi_get("tenant-1", &["blob".to_string(), "text".to_string()])
            .unwrap();
        // Blob and string with equal bytes stay distinct
        assert_eq!(docs["blob"].value, DocValue::Bytes(b"bytes".to_vec()));
        assert_eq!(docs["text"].value, DocValue::String("bytes".into()));

        runtime.shutdown().unwrap();
    }

    let runtime = Runtime::start(&config).unwrap();
    let executor = Executor::new(runtime.commands().clone());
    let output = executor
        .execute(
            Command::MultiGet {
                database: "tenant-1".into(),
                keys: vec!["blob".into(), "text".into()],
                ignore_missing: false,
            },
            &CancelToken::new(),
        )
        .unwrap();
    match output {
        Output::Query { documents, .. } => {
            assert_eq!(
                documents["blob"].tags,
                vec![WireTag::new("rank", WireTagValue::Float(2.5))]
            );
            assert!(documents["text"].created_at.is_some());
        }
        other => panic!("unexpected: {:?}", other),
    }
    runtime.shutdown().unwrap();
}

/// Test: the reaper thread reclaims idle databases on its own
#[test]
fn test_reaper_thread_reclaims() {
    let dir = TempDir::new().unwrap();
    let config = EngineConfig {
        reap_interval_secs: 1,
        ..disk_config(&dir)
    };
    let runtime = Runtime::start(&config).unwrap();
    runtime
        .commands()
        .batch_insert("idle", &[InsertStatement::new("k", 1i64)], &CancelToken::new())
        .unwrap();
    assert!(runtime.registry().contains("idle"));

    let started = Instant::now();
    while runtime.registry().contains("idle") && started.elapsed() < Duration::from_secs(10) {
        thread::sleep(Duration::from_millis(50));
    }
    assert!(!runtime.registry().contains("idle"));
    runtime.shutdown().unwrap();
}

// ============================================================================
// Concurrency
// ============================================================================

/// Test: many tenants written concurrently, each sees only its own data
#[test]
fn test_concurrent_tenants() {
    let dir = TempDir::new().unwrap();
    let runtime = Arc::new(Runtime::start(&disk_config(&dir)).unwrap());
    let failures = Arc::new(Mutex::new(Vec::new()));

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let runtime = Arc::clone(&runtime);
            let failures = Arc::clone(&failures);
            thread::spawn(move || {
                let name = format!("tenant-{}", t % 4);
                let stmt = InsertStatement::new(format!("from-{}", t), t as i64);
                if let Err(e) =
                    runtime
                        .commands()
                        .batch_insert(&name, &[stmt], &CancelToken::new())
                {
                    failures.lock().push(e.to_string());
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert!(failures.lock().is_empty(), "{:?}", failures.lock());
    assert_eq!(runtime.registry().len(), 4);

    let docs = runtime
        .commands()
        .multi_get("tenant-0", &["from-0".to_string(), "from-4".to_string(), "from-1".to_string()])
        .unwrap();
    assert_eq!(docs.len(), 2);
    runtime.shutdown().unwrap();
}

/// Test: after shutdown every command is refused
#[test]
fn test_commands_refused_after_shutdown() {
    let dir = TempDir::new().unwrap();
    let runtime = Runtime::start(&disk_config(&dir)).unwrap();
    runtime.shutdown().unwrap();

    let err = runtime
        .commands()
        .batch_delete_by_key("any", &["k".to_string()], &CancelToken::new())
        .unwrap_err();
    assert!(matches!(err, TesseraError::ShuttingDown));
}

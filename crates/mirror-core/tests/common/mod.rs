#![allow(dead_code)]
use std::sync::{Arc, Mutex};

use mirror_core::{RepositoryKey, StatusSink};

/// Helper to build a key from `owner/name`.
/// Panics if the key is invalid (intended for tests).
pub fn key(s: &str) -> RepositoryKey {
    RepositoryKey::parse(s).expect("Failed to parse test repository key")
}

/// Returns a sink together with the buffer it records into.
pub fn recording_sink() -> (StatusSink, Arc<Mutex<Vec<String>>>) {
    let lines = Arc::new(Mutex::new(Vec::new()));
    let captured = Arc::clone(&lines);
    let sink = StatusSink::new(move |msg| captured.lock().unwrap().push(msg.to_string()));
    (sink, lines)
}

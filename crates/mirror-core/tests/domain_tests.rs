mod common;

use std::collections::HashSet;

use common::{key, recording_sink};
use mirror_core::{Job, MirrorError, RepositoryKey};

#[test]
fn test_key_serializes_as_string() {
    let k = key("acme/foo");
    let json = serde_json::to_string(&k).unwrap();
    assert_eq!(json, r#""acme/foo""#);

    let back: RepositoryKey = serde_json::from_str(&json).unwrap();
    assert_eq!(back, k);
}

#[test]
fn test_key_deserialization_validates() {
    let result: Result<RepositoryKey, _> = serde_json::from_str(r#""../etc""#);
    assert!(result.is_err());
}

#[test]
fn test_keys_dedup_in_sets() {
    let mut set = HashSet::new();
    set.insert(key("acme/foo"));
    set.insert(key("acme/foo.git"));
    set.insert(key("acme/bar"));
    assert_eq!(set.len(), 2);
}

#[test]
fn test_invalid_key_error_context() {
    match RepositoryKey::new("acme", "") {
        Err(MirrorError::InvalidKey { input, reason }) => {
            assert_eq!(input, "acme/");
            assert!(reason.contains("name"));
        },
        other => panic!("Expected InvalidKey error, got {:?}", other),
    }
}

#[test]
fn test_job_sink_is_shared_across_retries() {
    let (sink, lines) = recording_sink();
    let job = Job::new(key("acme/foo"), sink);
    let retry = job.clone().into_retry();

    job.sink().report("first");
    retry.sink().report("second");

    assert_eq!(*lines.lock().unwrap(), vec!["first", "second"]);
}

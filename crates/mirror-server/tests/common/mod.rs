//! Test helpers for mirror-server.

#![allow(dead_code)]

use std::io::{self, Read};
use std::sync::{Arc, mpsc};

use mirror_git::{RepositoryKey, StatusSink, Submission};
use mirror_server::TriggerTarget;
use parking_lot::Mutex;

/// A target that records submissions and answers with a fixed outcome.
pub struct RecordingTarget {
    pub submitted: Mutex<Vec<String>>,
    pub answer: Submission,
}

impl RecordingTarget {
    pub fn new(answer: Submission) -> Arc<Self> {
        Arc::new(Self {
            submitted: Mutex::new(Vec::new()),
            answer,
        })
    }

    pub fn submitted(&self) -> Vec<String> {
        self.submitted.lock().clone()
    }
}

impl TriggerTarget for RecordingTarget {
    fn submit(&self, key: RepositoryKey, sink: StatusSink) -> Submission {
        sink.report(format!("submitted {}", key));
        self.submitted.lock().push(key.to_string());
        self.answer
    }
}

/// Returns a sink together with the buffer it records into.
pub fn recording_sink() -> (StatusSink, Arc<Mutex<Vec<String>>>) {
    let lines = Arc::new(Mutex::new(Vec::new()));
    let captured = Arc::clone(&lines);
    let sink = StatusSink::new(move |msg| captured.lock().push(msg.to_string()));
    (sink, lines)
}

/// A reader that blocks, like a terminal nobody types into, until the
/// returned sender is dropped; then it reports end of input.
pub struct StalledInput {
    wake: mpsc::Receiver<()>,
}

impl StalledInput {
    pub fn new() -> (mpsc::Sender<()>, Self) {
        let (tx, rx) = mpsc::channel();
        (tx, Self { wake: rx })
    }
}

impl Read for StalledInput {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        let _ = self.wake.recv();
        Ok(0)
    }
}

//! Status sink: the caller-supplied channel for progress text.

use std::fmt;
use std::sync::Arc;

/// A caller-supplied reporting callback for human-readable progress text.
///
/// The sink is invoked from worker threads, possibly for several
/// repositories at once, so the wrapped callback must be `Send + Sync`.
/// Serializing the output (e.g. onto a single channel) is the caller's job.
///
/// # Example
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use mirror_core::StatusSink;
///
/// let lines = Arc::new(Mutex::new(Vec::new()));
/// let captured = Arc::clone(&lines);
/// let sink = StatusSink::new(move |msg| captured.lock().unwrap().push(msg.to_string()));
///
/// sink.report("repository acme/foo successfully fetched");
/// assert_eq!(lines.lock().unwrap().len(), 1);
/// ```
#[derive(Clone)]
pub struct StatusSink {
    inner: Arc<dyn Fn(&str) + Send + Sync>,
}

impl StatusSink {
    /// Wraps a callback.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    /// A sink that discards every message.
    pub fn noop() -> Self {
        Self::new(|_| {})
    }

    /// Sends one message to the sink.
    pub fn report(&self, message: impl AsRef<str>) {
        (self.inner)(message.as_ref());
    }
}

impl Default for StatusSink {
    fn default() -> Self {
        Self::noop()
    }
}

impl fmt::Debug for StatusSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusSink").finish_non_exhaustive()
    }
}

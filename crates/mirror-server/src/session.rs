//! The trigger session: one message per input line.

use std::future::Future;
use std::io::{self, BufRead};
use std::thread;

use mirror_git::StatusSink;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::router::{TriggerRouter, TriggerTarget};
use crate::telemetry::record_trigger;

/// Lines buffered between the reader thread and the session.
const LINE_BUFFER: usize = 64;

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The input was exhausted.
    EndOfInput,
    /// The shutdown future completed first.
    Shutdown,
}

/// Totals of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionReport {
    pub end: SessionEnd,
    pub messages: usize,
    pub submissions: usize,
}

/// Reads `input` line by line on a dedicated OS thread.
///
/// The thread is detached: a read blocked on an open terminal or pipe never
/// holds up runtime shutdown or process exit. It stops at end of input, on
/// a read error, or once the receiver is dropped.
pub fn spawn_line_reader<R>(input: R) -> io::Result<mpsc::Receiver<String>>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel(LINE_BUFFER);
    thread::Builder::new()
        .name("trigger-reader".to_string())
        .spawn(move || {
            for line in input.lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        warn!("Failed to read trigger input: {}", e);
                        break;
                    },
                };
                if tx.blocking_send(line).is_err() {
                    break;
                }
            }
            debug!("Trigger reader exiting");
        })?;
    Ok(rx)
}

/// Routes every received line until the senders are gone or `shutdown`
/// completes.
pub async fn run_session<T, F>(
    mut lines: mpsc::Receiver<String>,
    router: &TriggerRouter,
    target: &T,
    sink: &StatusSink,
    shutdown: F,
) -> SessionReport
where
    T: TriggerTarget + ?Sized,
    F: Future<Output = ()>,
{
    let mut messages = 0;
    let mut submissions = 0;
    tokio::pin!(shutdown);

    let end = loop {
        let line = tokio::select! {
            _ = &mut shutdown => break SessionEnd::Shutdown,
            line = lines.recv() => line,
        };
        let Some(line) = line else {
            break SessionEnd::EndOfInput;
        };

        let routed = router.route(&line, target, sink);
        record_trigger(routed.len());
        messages += 1;
        submissions += routed.iter().filter(|(_, s)| s.is_accepted()).count();
        if routed.is_empty() {
            debug!("No repository in message {:?}", line);
        }
    };

    info!(
        "Trigger session ended ({:?}): {} messages, {} jobs queued",
        end, messages, submissions
    );
    SessionReport {
        end,
        messages,
        submissions,
    }
}

/// Returns a future that completes on Ctrl+C or SIGTERM.
///
/// On unix the handlers are installed by this call, before the future is
/// first polled, so a signal arriving in between is not lost. Must be called
/// within a tokio runtime.
#[cfg(unix)]
pub fn shutdown_signal() -> impl Future<Output = ()> {
    use tokio::signal::unix::{SignalKind, signal};

    let interrupt = signal(SignalKind::interrupt());
    let terminate = signal(SignalKind::terminate());

    async move {
        let (mut interrupt, mut terminate) = match (interrupt, terminate) {
            (Ok(interrupt), Ok(terminate)) => (interrupt, terminate),
            (Err(e), _) | (_, Err(e)) => {
                tracing::error!("Failed to install signal handlers: {}", e);
                std::future::pending::<()>().await;
                return;
            },
        };

        tokio::select! {
            _ = interrupt.recv() => {},
            _ = terminate.recv() => {},
        }

        tracing::info!("Shutdown signal received");
    }
}

/// Returns a future that completes on Ctrl+C.
#[cfg(not(unix))]
pub fn shutdown_signal() -> impl Future<Output = ()> {
    async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("Shutdown signal received");
    }
}

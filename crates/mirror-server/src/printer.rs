//! Status output.
//!
//! Workers report from many threads at once. Their messages go through an
//! unbounded channel to a single task that owns stdout, so lines never
//! interleave.

use std::io;

use mirror_git::StatusSink;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Creates a sink forwarding every message into `tx`.
///
/// Messages sent after the printer stopped are dropped.
pub fn channel_sink(tx: mpsc::UnboundedSender<String>) -> StatusSink {
    StatusSink::new(move |msg| {
        if tx.send(msg.to_string()).is_err() {
            debug!("Status printer gone, dropping: {}", msg);
        }
    })
}

/// Writes every received message as one line to `out` until all senders
/// are dropped.
pub async fn print_lines<W>(mut rx: mpsc::UnboundedReceiver<String>, mut out: W) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = rx.recv().await {
        out.write_all(line.as_bytes()).await?;
        out.write_all(b"\n").await?;
        out.flush().await?;
    }
    Ok(())
}

/// Spawns the stdout printer and returns the sink feeding it.
pub fn spawn_stdout_printer() -> (StatusSink, JoinHandle<io::Result<()>>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(print_lines(rx, tokio::io::stdout()));
    (channel_sink(tx), handle)
}

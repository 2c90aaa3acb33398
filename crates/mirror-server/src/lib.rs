//! Mirror bot process: settings, trigger routing and status output around
//! the `mirror-git` engine.

pub mod printer;
pub mod router;
pub mod session;
pub mod settings;
pub mod telemetry;

pub use printer::{channel_sink, print_lines, spawn_stdout_printer};
pub use router::{TriggerRouter, TriggerTarget};
pub use session::{SessionEnd, SessionReport, run_session, shutdown_signal, spawn_line_reader};
pub use settings::{Settings, SettingsError};
pub use telemetry::init_metrics;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

//! Mirror bot binary.
//!
//! Reads trigger messages from stdin, one per line, and keeps the mentioned
//! repositories mirrored until EOF, Ctrl+C or SIGTERM.

use std::io::BufReader;

use anyhow::Context;
use mirror_git::MirrorService;
use mirror_server::{
    Settings, TriggerRouter, init_metrics, run_session, settings::CONFIG_PATH_VAR,
    shutdown_signal, spawn_line_reader, spawn_stdout_printer,
};
use tokio::runtime::Handle;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let path = Settings::resolve_path(std::env::args().nth(1), std::env::var(CONFIG_PATH_VAR).ok());
    let settings = Settings::load(&path)
        .with_context(|| format!("Failed to load settings (file {:?})", path))?;

    tracing::info!("Starting mirrorbot v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Settings file: {:?}", path);
    tracing::info!("Default owner: {}", settings.owner);
    tracing::info!("Remote base: {}", settings.remote_base);

    if let Some(addr) = settings.metrics_addr {
        init_metrics(addr).context("Failed to start metrics exporter")?;
    }

    let config = settings.to_mirror_config()?;
    let mut service =
        MirrorService::start(config, Handle::current()).context("Failed to start mirror service")?;

    let (sink, printer) = spawn_stdout_printer();
    let router = TriggerRouter::new(&settings.owner);
    let shutdown = shutdown_signal();
    let lines = spawn_line_reader(BufReader::new(std::io::stdin()))
        .context("Failed to start stdin reader")?;
    tracing::info!("Waiting for triggers on stdin");

    run_session(lines, &router, &service, &sink, shutdown).await;

    // workers block on git; join them off the async threads
    let summary = tokio::task::spawn_blocking(move || {
        service.shutdown();
        service.state().summary()
    })
    .await
    .context("Shutdown task failed")?;

    tracing::info!(
        "Mirrors: {} tracked, {} healthy, {} failing, {} given up",
        summary.tracked,
        summary.healthy,
        summary.failing,
        summary.given_up
    );

    drop(sink);
    printer.await.context("Status printer task failed")??;

    Ok(())
}

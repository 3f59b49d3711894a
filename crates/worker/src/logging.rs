use std::fs::OpenOptions;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use crate::settings::WorkerSettings;

fn default_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("studio_worker=debug,studio_bridge=debug,studio_storage=debug")
        } else {
            EnvFilter::new("studio_worker=info,studio_bridge=info")
        }
    })
}

/// Install the global subscriber. Stdout carries bridge frames, so logs go
/// to a file under `log_dir` when one is configured and to stderr otherwise.
pub fn setup_tracing(settings: &WorkerSettings) {
    if let Some(log_dir) = &settings.log_dir
        && std::fs::create_dir_all(log_dir).is_ok()
    {
        let log_path = log_dir.join(format!("studio-worker.{}.log", std::process::id()));
        if let Ok(file) = OpenOptions::new().create(true).append(true).open(&log_path) {
            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(file)
                .with_ansi(false)
                .with_target(true);
            tracing_subscriber::registry()
                .with(default_filter(settings.verbose))
                .with(file_layer)
                .init();
            tracing::info!(path = ?log_path, "worker tracing initialized");
            return;
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(default_filter(settings.verbose))
        .with_writer(std::io::stderr)
        .init();
}

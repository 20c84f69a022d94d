// SPDX-License-Identifier: MIT OR Apache-2.0
//! `OrdoPlay` Animated replay tool.
//!
//! Plays a RON script against a render thread and writes every applied
//! props map and host event to stdout as JSON lines. Logs go to stderr.
//!
//! Usage: `ordoplay_animated <script.ron> [config.ron]`

use ordoplay_animated_host::{HostConfig, JsonLines, ReplayScript, RenderThread, Result};
use std::path::Path;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(script_path) = args.first() else {
        eprintln!("Usage: ordoplay_animated <script.ron> [config.ron]");
        std::process::exit(2);
    };

    let config = match args.get(1) {
        Some(path) => match HostConfig::load(Path::new(path)) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(1);
            }
        },
        None => HostConfig::default(),
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting OrdoPlay Animated v{}", env!("CARGO_PKG_VERSION"));

    match replay(Path::new(script_path), &config) {
        Ok(0) => {}
        Ok(failures) => {
            tracing::error!("{} commands failed", failures);
            std::process::exit(1);
        }
        Err(e) => {
            tracing::error!("Replay failed: {e}");
            std::process::exit(1);
        }
    }
}

/// Play the script and return the number of failed commands
fn replay(script_path: &Path, config: &HostConfig) -> Result<usize> {
    let script = ReplayScript::load(script_path)?;
    tracing::info!(
        "Replaying {:?}: {} steps, {} frames",
        script_path,
        script.steps.len(),
        script.frame_count()
    );

    let render = RenderThread::spawn(
        config,
        JsonLines::new(std::io::stdout()),
        JsonLines::new(std::io::stdout()),
    )?;
    script.play(&render.handle(), 0, config.frame_interval_nanos)?;

    let failures = render.shutdown()?;
    for failure in &failures {
        tracing::warn!("{}: {}", failure.command, failure.error);
    }
    Ok(failures.len())
}

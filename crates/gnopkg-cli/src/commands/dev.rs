//! `gnopkg dev`: keep loaded packages fresh while their files change.
//!
//! 1. Load the patterns and their dependencies
//! 2. Watch every loaded package directory
//! 3. Reload once per debounced batch of changes
//! 4. Track import paths typed on stdin, reloading when one is new
//! 5. Stop on Ctrl+C

use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;

use gnopkg_graph::{Loader, PackageIndex, View};
use tokio::signal;
use tokio::sync::{broadcast, mpsc};
use tracing::debug;

use crate::cli::DevArgs;
use crate::commands::utils::Session;
use crate::dev::{ChangeWatcher, DevEvent, IncrementalCoordinator, LoaderProcess};
use crate::error::{CliError, Result};
use crate::ui;

const QUERY_BUFFER: usize = 16;

pub async fn execute(args: DevArgs, config_path: Option<&Path>) -> Result<()> {
    let session = Session::open(&args.load, config_path, args.debounce_ms)?;
    ui::info(&format!("Working directory: {}", session.cwd.display()));

    let index = Arc::new(PackageIndex::new());
    let options = session.config.load_options(true, View::Build, args.load.allow_empty);
    let loader = Loader::new(session.setup.resolver.clone(), options).with_index(index.clone());
    let process = LoaderProcess::new(loader, session.cwd.clone(), session.setup.cache.clone());

    let (watcher, updates) = ChangeWatcher::new(index, session.config.debounce())?;
    let mut coordinator = IncrementalCoordinator::new(
        process,
        session.setup.resolver.clone(),
        watcher,
        args.patterns.clone(),
    );

    let printer = tokio::spawn(print_events(coordinator.subscribe(), args.json));

    coordinator
        .start()
        .await
        .map_err(|e| CliError::Reload(format!("{e:#}")))?;
    ui::info(&format!(
        "Watching {}",
        ui::plural(coordinator.watcher().watched_dirs().count(), "package")
    ));

    let (query_tx, query_rx) = mpsc::channel(QUERY_BUFFER);
    std::thread::spawn(move || read_queries(query_tx));

    ui::info("Type an import path to load it, press Ctrl+C to stop");
    coordinator
        .run(updates, query_rx, async {
            let _ = signal::ctrl_c().await;
        })
        .await;

    let _ = printer.await;
    ui::success("Stopped");
    Ok(())
}

/// Forward whitespace-separated import paths from stdin, one batch per line.
///
/// Runs on a plain thread: a blocking stdin read cannot be cancelled and
/// must not hold up runtime shutdown.
fn read_queries(tx: mpsc::Sender<Vec<String>>) {
    for line in std::io::stdin().lock().lines() {
        let Ok(line) = line else { break };
        let paths: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        if paths.is_empty() {
            continue;
        }
        if tx.blocking_send(paths).is_err() {
            break;
        }
    }
    debug!("stdin closed");
}

async fn print_events(mut events: broadcast::Receiver<DevEvent>, json: bool) {
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                debug!(missed, "dev event printer lagged");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };

        if json {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{line}"),
                Err(err) => ui::error(&format!("unable to encode event: {err}")),
            }
            continue;
        }

        match event {
            DevEvent::PackagesChanged { packages, files } => ui::info(&format!(
                "{} changed in {}",
                ui::plural(files, "file"),
                packages.join(", ")
            )),
            DevEvent::PackageDiscovered { path } => ui::info(&format!("Tracking {path}")),
            DevEvent::ReloadStarted { .. } => {}
            DevEvent::ReloadCompleted {
                packages,
                duration_ms,
            } => ui::success(&format!(
                "Reloaded {} in {}",
                ui::plural(packages, "package"),
                ui::format_duration(std::time::Duration::from_millis(duration_ms))
            )),
            DevEvent::ReloadFailed { error } => ui::error(&format!("Reload failed: {error}")),
        }
    }
}

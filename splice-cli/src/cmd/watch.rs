use anyhow::Result;
use notify_debouncer_mini::{DebounceEventResult, new_debouncer};
use splice_core::Site;
use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::{debug, error, info};

use super::report;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// Something under the assets directory: copy assets again.
    Assets,
    /// Page or template source: rebuild every page.
    Source,
    Ignored,
}

pub fn classify(
    path: &Path,
    source_dir: &Path,
    assets_dir: &Path,
    output_dir: &Path,
    config_file: &Path,
) -> Change {
    let path = normalize(path);

    if path.starts_with(normalize(output_dir)) {
        Change::Ignored
    } else if path.starts_with(normalize(assets_dir)) {
        Change::Assets
    } else if path.starts_with(normalize(source_dir)) || path == normalize(config_file) {
        Change::Source
    } else {
        Change::Ignored
    }
}

/// Resolve symlinks in the longest existing prefix of `path`.
///
/// Deleted files and directories the build has not created yet still compare
/// equal to their live siblings this way.
fn normalize(path: &Path) -> PathBuf {
    if path.as_os_str().is_empty() {
        return normalize(Path::new("."));
    }
    if let Ok(real) = path.canonicalize() {
        return real;
    }

    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => normalize(parent).join(name),
        _ => std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf()),
    }
}

/// Rebuild `site` whenever its sources change. Runs until the watcher stops.
pub async fn watch_source_files(site: Site, config_file: PathBuf) -> Result<()> {
    let source_dir = site.source_dir().to_path_buf();
    let output_dir = site.output_dir().to_path_buf();
    let assets_dir = site.assets_dir();

    let (tx, mut rx) = tokio::sync::mpsc::channel(100);

    let mut debouncer = new_debouncer(
        Duration::from_millis(500), // Slightly longer delay for rebuilds
        move |res: DebounceEventResult| {
            if let Ok(events) = res {
                for event in events {
                    let _ = tx.blocking_send(event.path);
                }
            }
        },
    )?;

    debouncer
        .watcher()
        .watch(&source_dir, notify::RecursiveMode::Recursive)?;
    info!("Watching source directory: {}", source_dir.display());

    if config_file.exists() {
        debouncer
            .watcher()
            .watch(&config_file, notify::RecursiveMode::NonRecursive)?;
        info!("Watching config file: {}", config_file.display());
    }

    while let Some(path) = rx.recv().await {
        let change = classify(&path, &source_dir, &assets_dir, &output_dir, &config_file);
        debug!("Change detected: {} ({:?})", path.display(), change);

        // Failures are logged, the watcher keeps going
        match change {
            Change::Ignored => continue,
            Change::Assets => match site.copy_assets() {
                Ok(count) => info!("Updated {} asset(s)", count),
                Err(e) => error!("Asset copy failed: {}", e),
            },
            Change::Source => match site.build_pages() {
                Ok(built) => report(&built),
                Err(e) => error!("Build failed: {}", e),
            },
        }
    }

    Ok(())
}

//! Watches the configuration file and triggers a recompile when it
//! changes. Uses `inotify` on Linux via `notify`; editors tend to fire
//! several events per save, so changes are debounced.

use notify::{Config, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{error, info};

const SLEEP_AFTER_CHANGE_SECONDS: u64 = 1;
const SLEEP_DEBOUNCE_DURATION: u64 = 1;

/// Watch `path`, invoking `on_change` after each (debounced) change.
/// Takes over the calling thread; only returns if the watcher breaks.
pub(crate) fn watch_config<F: Fn()>(path: PathBuf, on_change: F) {
    let (tx, rx) = std::sync::mpsc::channel();
    let mut watcher = match RecommendedWatcher::new(tx, Config::default()) {
        Ok(watcher) => watcher,
        Err(e) => {
            error!("Unable to create watcher for {}: {e:?}", path.display());
            return;
        }
    };

    if let Err(e) = watcher.watch(&path, RecursiveMode::NonRecursive) {
        error!("Unable to start watcher for {}: {e:?}", path.display());
        return;
    }
    info!("Watching {} for changes", path.display());

    let mut last_event: Option<Instant> = None;
    for event in rx {
        if event.is_err() {
            error!("Error from watcher thread: {:?}", event);
            continue;
        }

        // Are we taking a short break to avoid duplicates?
        let process = match last_event {
            Some(last) => last.elapsed().as_secs() >= SLEEP_DEBOUNCE_DURATION,
            None => true,
        };
        if process {
            std::thread::sleep(Duration::from_secs(SLEEP_AFTER_CHANGE_SECONDS));
            last_event = Some(Instant::now());
            info!("{} changed", path.display());
            on_change();
        }
    }
}

use crate::commands::bugs::reload_blocking;
use crate::models::snapshot::BugCache;
use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, Debouncer};
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

const DEBOUNCE: Duration = Duration::from_millis(500);

/// Keeps the bug file watched until dropped.
pub struct BugFileWatcher {
    path: PathBuf,
    _debouncer: Debouncer<RecommendedWatcher>,
}

impl BugFileWatcher {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Reloads `cache` whenever the bug file changes on disk. `on_reload` gets the
/// new record count, or the error that left the previous records in place.
pub fn watch_bug_file<F>(
    path: &Path,
    cache: Arc<Mutex<BugCache>>,
    mut on_reload: F,
) -> Result<BugFileWatcher, String>
where
    F: FnMut(Result<usize, String>) + Send + 'static,
{
    let (tx, rx) = mpsc::channel::<DebounceEventResult>();
    let mut debouncer =
        new_debouncer(DEBOUNCE, tx).map_err(|e| format!("Watcher init error: {e}"))?;

    // Editors often replace the file, so watch its directory.
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    debouncer
        .watcher()
        .watch(&dir, RecursiveMode::NonRecursive)
        .map_err(|e| format!("Watch error: {e}"))?;

    let file_name = path.file_name().map(|n| n.to_os_string());
    let data_path = path.to_path_buf();
    log::info!("Watching {} for changes", data_path.display());

    std::thread::spawn(move || {
        // Ends once the debouncer is dropped and the sender goes with it.
        for result in rx {
            match result {
                Ok(events) => {
                    let touched = events
                        .iter()
                        .any(|event| event.path.file_name().map(|n| n.to_os_string()) == file_name);
                    if !touched {
                        continue;
                    }
                    log::debug!("{} changed, reloading", data_path.display());
                    let outcome = reload_blocking(&data_path, &cache).map(|s| s.records.len());
                    on_reload(outcome);
                }
                Err(e) => log::warn!("Watch error on {}: {e:?}", data_path.display()),
            }
        }
        log::debug!("Stopped watching {}", data_path.display());
    });

    Ok(BugFileWatcher {
        path: path.to_path_buf(),
        _debouncer: debouncer,
    })
}

/// Tells the window about a finished load: `bugs_reloaded` with the record
/// count, or `bugs_load_failed` with the error.
#[cfg(feature = "desktop")]
pub fn emit_reload_outcome(app: &tauri::AppHandle, outcome: Result<usize, String>) {
    use tauri::Emitter;

    let emitted = match outcome {
        Ok(count) => app.emit("bugs_reloaded", serde_json::json!({ "count": count })),
        Err(message) => app.emit("bugs_load_failed", serde_json::json!({ "error": message })),
    };
    if let Err(e) = emitted {
        log::warn!("Could not notify window of reload: {e}");
    }
}

#[cfg(feature = "desktop")]
#[tauri::command]
pub async fn start_bug_file_watcher(
    dir: tauri::State<'_, crate::commands::settings::SettingsDir>,
    cache: tauri::State<'_, Arc<Mutex<BugCache>>>,
    active: tauri::State<'_, Mutex<Option<BugFileWatcher>>>,
    app: tauri::AppHandle,
) -> Result<(), String> {
    let settings = crate::commands::settings::load_effective_settings(&dir.0)?;
    let mut active_lock = active.lock().map_err(|_| "Watcher lock error".to_string())?;
    if active_lock
        .as_ref()
        .is_some_and(|w| w.path() == settings.data_path.as_path())
    {
        return Ok(());
    }

    let watcher = watch_bug_file(&settings.data_path, cache.inner().clone(), move |outcome| {
        emit_reload_outcome(&app, outcome)
    })?;
    *active_lock = Some(watcher);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Instant;

    #[test]
    fn rewriting_the_file_replaces_cached_records() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("bugs.json");
        fs::write(
            &path,
            r#"[{"id":1,"type":"crash","app":"Mail","severity":"high","title":"a"}]"#,
        )
        .expect("write bugs");

        let cache = Arc::new(Mutex::new(BugCache::default()));
        reload_blocking(&path, &cache).expect("initial load");

        let (done_tx, done_rx) = mpsc::channel();
        let _watcher = watch_bug_file(&path, cache.clone(), move |outcome| {
            let _ = done_tx.send(outcome);
        })
        .expect("start watcher");

        fs::write(
            &path,
            r#"[{"id":1,"type":"crash","app":"Mail","severity":"high","title":"a"},
                {"id":2,"type":"ui","app":"Maps","severity":"low","title":"b"}]"#,
        )
        .expect("rewrite bugs");

        let deadline = Instant::now() + Duration::from_secs(10);
        let mut last = None;
        while Instant::now() < deadline {
            match done_rx.recv_timeout(Duration::from_millis(250)) {
                Ok(Ok(2)) => {
                    last = Some(2);
                    break;
                }
                Ok(outcome) => last = outcome.ok(),
                Err(_) => continue,
            }
        }

        assert_eq!(last, Some(2));
        assert_eq!(cache.lock().expect("lock").records().len(), 2);
    }
}

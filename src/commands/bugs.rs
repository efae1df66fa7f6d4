use crate::analysis::query;
use crate::analysis::teams;
use crate::error::{BugLoadError, BugLoadResult};
use crate::models::bug::{AppFilter, BugRecord, BugRow, BugSummary, TypeCount};
use crate::models::snapshot::{BugCache, BugSnapshot};
use std::collections::HashSet;
use std::future::Future;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[cfg(feature = "desktop")]
use crate::commands::settings::{load_effective_settings, SettingsDir};

/// Reads and decodes the whole bug file. All or nothing.
pub async fn load_bug_file(path: &Path) -> BugLoadResult<Vec<BugRecord>> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| BugLoadError::NotFound {
            path: path.to_path_buf(),
            source,
        })?;
    decode_bug_records(path, &bytes)
}

pub fn load_bug_file_blocking(path: &Path) -> BugLoadResult<Vec<BugRecord>> {
    let bytes = std::fs::read(path).map_err(|source| BugLoadError::NotFound {
        path: path.to_path_buf(),
        source,
    })?;
    decode_bug_records(path, &bytes)
}

fn decode_bug_records(path: &Path, bytes: &[u8]) -> BugLoadResult<Vec<BugRecord>> {
    let records: Vec<BugRecord> =
        serde_json::from_slice(bytes).map_err(|source| BugLoadError::Decode {
            path: path.to_path_buf(),
            source,
        })?;

    let mut seen = HashSet::with_capacity(records.len());
    for record in &records {
        if !seen.insert(record.id) {
            return Err(BugLoadError::DuplicateId {
                path: path.to_path_buf(),
                id: record.id,
            });
        }
    }

    Ok(records)
}

/// Loads `path` and swaps it into the cache. On failure the previous
/// snapshot stays in place and the error is recorded.
pub async fn reload_internal(
    path: &Path,
    cache: &Arc<Mutex<BugCache>>,
) -> Result<BugSnapshot, String> {
    let ticket = begin_load(cache)?;
    let outcome = load_bug_file(path).await;
    apply_load_outcome(path, cache, ticket, outcome)
}

/// Like [`reload_internal`], but gives up after `timeout` and leaves the
/// cache untouched apart from the recorded error.
pub async fn reload_with_timeout(
    path: &Path,
    cache: &Arc<Mutex<BugCache>>,
    timeout: Duration,
) -> Result<BugSnapshot, String> {
    reload_future_with_timeout(path, cache, timeout, load_bug_file(path)).await
}

async fn reload_future_with_timeout<F>(
    path: &Path,
    cache: &Arc<Mutex<BugCache>>,
    timeout: Duration,
    load: F,
) -> Result<BugSnapshot, String>
where
    F: Future<Output = BugLoadResult<Vec<BugRecord>>>,
{
    let ticket = begin_load(cache)?;
    let outcome = match tokio::time::timeout(timeout, load).await {
        Ok(outcome) => outcome,
        Err(_) => Err(BugLoadError::TimedOut {
            path: path.to_path_buf(),
            timeout_ms: timeout.as_millis() as u64,
        }),
    };
    apply_load_outcome(path, cache, ticket, outcome)
}

pub fn reload_blocking(path: &Path, cache: &Arc<Mutex<BugCache>>) -> Result<BugSnapshot, String> {
    let ticket = begin_load(cache)?;
    let outcome = load_bug_file_blocking(path);
    apply_load_outcome(path, cache, ticket, outcome)
}

fn begin_load(cache: &Arc<Mutex<BugCache>>) -> Result<u64, String> {
    let mut cache_lock = cache.lock().map_err(|_| "Cache lock error".to_string())?;
    Ok(cache_lock.begin_load())
}

fn apply_load_outcome(
    path: &Path,
    cache: &Arc<Mutex<BugCache>>,
    ticket: u64,
    outcome: BugLoadResult<Vec<BugRecord>>,
) -> Result<BugSnapshot, String> {
    let mut cache_lock = cache.lock().map_err(|_| "Cache lock error".to_string())?;

    match outcome {
        Ok(records) => {
            let snapshot = BugSnapshot {
                source_path: path.to_string_lossy().to_string(),
                loaded_at: chrono::Utc::now().timestamp(),
                records,
            };
            if cache_lock.replace(ticket, snapshot.clone()) {
                log::info!("Loaded {} bug reports from {}", snapshot.records.len(), path.display());
                return Ok(snapshot);
            }
            log::debug!("Discarding load {ticket} of {}, a newer load finished first", path.display());
            cache_lock
                .snapshot
                .clone()
                .ok_or_else(|| format!("Load of {} superseded by a newer load", path.display()))
        }
        Err(e) => {
            let message = e.to_string();
            if !cache_lock.record_failure(ticket, message.clone()) {
                log::debug!("Ignoring failed load {ticket}, a newer load finished first: {message}");
            } else if e.is_decode() {
                log::warn!("Keeping previous bug reports, decode failed: {message}");
            } else {
                log::warn!("Keeping previous bug reports, load failed: {message}");
            }
            Err(message)
        }
    }
}

fn with_records<T>(
    cache: &Arc<Mutex<BugCache>>,
    f: impl FnOnce(&[BugRecord]) -> T,
) -> Result<T, String> {
    let cache_lock = cache.lock().map_err(|_| "Cache lock error".to_string())?;
    Ok(f(cache_lock.records()))
}

pub fn get_bug_reports_internal(cache: &Arc<Mutex<BugCache>>) -> Result<Vec<BugRecord>, String> {
    with_records(cache, |records| records.to_vec())
}

pub fn get_type_counts_internal(
    cache: &Arc<Mutex<BugCache>>,
    app_filter: &str,
) -> Result<Vec<TypeCount>, String> {
    let filter = AppFilter::from_label(app_filter);
    with_records(cache, |records| query::counts_by_type(records, &filter))
}

pub fn get_bugs_for_app_internal(
    cache: &Arc<Mutex<BugCache>>,
    app_filter: &str,
) -> Result<Vec<BugRow>, String> {
    let filter = AppFilter::from_label(app_filter);
    with_records(cache, |records| query::bug_rows(records, &filter))
}

pub fn get_app_names_internal(cache: &Arc<Mutex<BugCache>>) -> Result<Vec<String>, String> {
    with_records(cache, query::app_names)
}

pub fn get_summary_internal(
    cache: &Arc<Mutex<BugCache>>,
    app_filter: &str,
) -> Result<BugSummary, String> {
    let filter = AppFilter::from_label(app_filter);
    with_records(cache, |records| query::summarize(records, &filter))
}

#[cfg(feature = "desktop")]
#[tauri::command]
pub async fn load_bug_reports(
    dir: tauri::State<'_, SettingsDir>,
    cache: tauri::State<'_, Arc<Mutex<BugCache>>>,
) -> Result<BugSnapshot, String> {
    let settings = load_effective_settings(&dir.0)?;
    reload_with_timeout(&settings.data_path, cache.inner(), settings.load_timeout).await
}

#[cfg(feature = "desktop")]
#[tauri::command]
pub async fn get_bug_reports(
    cache: tauri::State<'_, Arc<Mutex<BugCache>>>,
) -> Result<Vec<BugRecord>, String> {
    get_bug_reports_internal(cache.inner())
}

#[cfg(feature = "desktop")]
#[tauri::command]
pub async fn get_type_counts(
    app_filter: String,
    cache: tauri::State<'_, Arc<Mutex<BugCache>>>,
) -> Result<Vec<TypeCount>, String> {
    get_type_counts_internal(cache.inner(), &app_filter)
}

#[cfg(feature = "desktop")]
#[tauri::command]
pub async fn get_bugs_for_app(
    app_filter: String,
    cache: tauri::State<'_, Arc<Mutex<BugCache>>>,
) -> Result<Vec<BugRow>, String> {
    get_bugs_for_app_internal(cache.inner(), &app_filter)
}

#[cfg(feature = "desktop")]
#[tauri::command]
pub async fn get_app_names(
    cache: tauri::State<'_, Arc<Mutex<BugCache>>>,
) -> Result<Vec<String>, String> {
    get_app_names_internal(cache.inner())
}

#[cfg(feature = "desktop")]
#[tauri::command]
pub async fn get_summary(
    app_filter: String,
    cache: tauri::State<'_, Arc<Mutex<BugCache>>>,
) -> Result<BugSummary, String> {
    get_summary_internal(cache.inner(), &app_filter)
}

#[cfg_attr(feature = "desktop", tauri::command)]
pub fn assign_team(app: String) -> String {
    teams::team_for_app(&app).to_string()
}

use crate::models::bug::{AppFilter, ALL_APPS};
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const SETTINGS_SCHEMA_VERSION: i64 = 1;
const SETTINGS_FILE: &str = "settings.json";

/// Directory holding `settings.json`; relative data paths resolve against it.
#[derive(Debug, Clone)]
pub struct SettingsDir(pub PathBuf);

#[derive(Debug, Clone)]
pub struct EffectiveSettings {
    pub data_path: PathBuf,
    pub default_filter: AppFilter,
    pub watch_for_changes: bool,
    pub load_timeout: Duration,
}

#[cfg(feature = "desktop")]
#[tauri::command]
pub async fn get_settings(dir: tauri::State<'_, SettingsDir>) -> Result<Value, String> {
    load_settings_from_disk(&dir.0)
}

pub fn load_effective_settings(config_dir: &Path) -> Result<EffectiveSettings, String> {
    let settings = load_settings_from_disk(config_dir)?;

    let raw_path = settings
        .get("dataPath")
        .and_then(Value::as_str)
        .unwrap_or("bugs.json");
    let data_path = resolve_data_path(config_dir, raw_path);

    let default_filter = settings
        .get("defaultAppFilter")
        .and_then(Value::as_str)
        .map(AppFilter::from_label)
        .unwrap_or_default();

    let watch_for_changes = settings
        .get("watchForChanges")
        .and_then(Value::as_bool)
        .unwrap_or(true);

    let timeout_ms = settings
        .get("loadTimeoutMs")
        .and_then(Value::as_u64)
        .unwrap_or(5000);

    Ok(EffectiveSettings {
        data_path,
        default_filter,
        watch_for_changes,
        load_timeout: Duration::from_millis(timeout_ms),
    })
}

/// Reads `settings.json` under `config_dir`, filling in defaults. Never writes.
pub fn load_settings_from_disk(config_dir: &Path) -> Result<Value, String> {
    let path = settings_path(config_dir);

    let original = if path.exists() {
        let raw = fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read settings.json: {e}"))?;
        serde_json::from_str::<Value>(&raw).unwrap_or_else(|e| {
            log::warn!("Ignoring malformed {}: {e}", path.display());
            json!({})
        })
    } else {
        log::debug!("No settings at {}, using defaults", path.display());
        json!({})
    };

    Ok(migrate_settings(original))
}

pub fn settings_path(config_dir: &Path) -> PathBuf {
    config_dir.join(SETTINGS_FILE)
}

fn resolve_data_path(config_dir: &Path, raw: &str) -> PathBuf {
    let path = Path::new(raw);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        config_dir.join(path)
    }
}

fn migrate_settings(input: Value) -> Value {
    let defaults = default_settings();
    let mut out = match input {
        Value::Object(map) => Value::Object(map),
        _ => Value::Object(Map::new()),
    };

    deep_merge_defaults(&mut out, &defaults);
    sanitize_settings(&mut out, &defaults);

    if let Some(obj) = out.as_object_mut() {
        obj.insert("schema_version".to_string(), json!(SETTINGS_SCHEMA_VERSION));
    }

    out
}

fn default_settings() -> Value {
    json!({
        "schema_version": SETTINGS_SCHEMA_VERSION,
        "dataPath": "bugs.json",
        "defaultAppFilter": ALL_APPS,
        "watchForChanges": true,
        "loadTimeoutMs": 5000
    })
}

fn deep_merge_defaults(target: &mut Value, defaults: &Value) {
    let (Some(target_obj), Some(default_obj)) = (target.as_object_mut(), defaults.as_object()) else {
        return;
    };

    for (key, default_value) in default_obj {
        match target_obj.get_mut(key) {
            Some(existing) => {
                if existing.is_object() && default_value.is_object() {
                    deep_merge_defaults(existing, default_value);
                }
            }
            None => {
                target_obj.insert(key.clone(), default_value.clone());
            }
        }
    }
}

fn sanitize_settings(settings: &mut Value, defaults: &Value) {
    let Some(obj) = settings.as_object_mut() else {
        return;
    };

    for key in ["dataPath", "defaultAppFilter"] {
        let valid = obj
            .get(key)
            .and_then(Value::as_str)
            .is_some_and(|s| key != "dataPath" || !s.trim().is_empty());
        if !valid {
            obj.insert(key.to_string(), defaults[key].clone());
        }
    }

    if !obj.get("watchForChanges").is_some_and(Value::is_boolean) {
        obj.insert("watchForChanges".to_string(), defaults["watchForChanges"].clone());
    }

    let timeout = obj
        .get("loadTimeoutMs")
        .and_then(Value::as_u64)
        .unwrap_or(5000)
        .clamp(100, 60_000);
    obj.insert("loadTimeoutMs".to_string(), json!(timeout));
}

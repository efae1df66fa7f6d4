pub mod analysis;
pub mod commands;
pub mod error;
pub mod models;

#[cfg(feature = "desktop")]
use commands::{
    bugs::{
        assign_team, get_app_names, get_bug_reports, get_bugs_for_app, get_summary,
        get_type_counts, load_bug_reports,
    },
    settings::{get_settings, load_effective_settings, SettingsDir},
    watcher::{emit_reload_outcome, start_bug_file_watcher, watch_bug_file, BugFileWatcher},
};
#[cfg(feature = "desktop")]
use models::snapshot::BugCache;
#[cfg(feature = "desktop")]
use std::sync::{Arc, Mutex};

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use tauri::Manager;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    tauri::Builder::default()
        .manage(Arc::new(Mutex::new(BugCache::default())))
        .manage(Mutex::new(None::<BugFileWatcher>))
        .setup(|app| {
            let config_dir = app.path().app_config_dir()?;
            log::info!("Reading settings from {}", config_dir.display());
            let settings = load_effective_settings(&config_dir)?;
            app.manage(SettingsDir(config_dir));

            let cache = app.state::<Arc<Mutex<BugCache>>>().inner().clone();
            let handle = app.handle().clone();
            let data_path = settings.data_path.clone();
            let timeout = settings.load_timeout;
            let initial_cache = cache.clone();
            tauri::async_runtime::spawn(async move {
                let outcome =
                    commands::bugs::reload_with_timeout(&data_path, &initial_cache, timeout)
                        .await
                        .map(|snapshot| snapshot.records.len());
                emit_reload_outcome(&handle, outcome);
            });

            if settings.watch_for_changes {
                let handle = app.handle().clone();
                match watch_bug_file(&settings.data_path, cache, move |outcome| {
                    emit_reload_outcome(&handle, outcome)
                }) {
                    Ok(watcher) => {
                        if let Ok(mut active) = app.state::<Mutex<Option<BugFileWatcher>>>().lock() {
                            *active = Some(watcher);
                        }
                    }
                    Err(e) => log::warn!("File watching disabled: {e}"),
                }
            }

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            load_bug_reports,
            get_bug_reports,
            get_type_counts,
            get_bugs_for_app,
            get_app_names,
            get_summary,
            assign_team,
            get_settings,
            start_bug_file_watcher,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}

pub mod bugs;
pub mod settings;
pub mod watcher;

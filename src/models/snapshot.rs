use crate::models::bug::BugRecord;
use serde::{Deserialize, Serialize};

/// Records from one successful load of the bug file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BugSnapshot {
    pub source_path: String,
    pub loaded_at: i64,
    pub records: Vec<BugRecord>,
}

/// The current-records slot. A successful load replaces `snapshot` whole;
/// a failed one only sets `last_error`.
///
/// Every load takes a ticket from [`BugCache::begin_load`] before reading.
/// Outcomes are applied only if their ticket is newer than the last one
/// applied, so a slow read can never overwrite a load that started later.
#[derive(Debug, Default)]
pub struct BugCache {
    pub snapshot: Option<BugSnapshot>,
    pub last_error: Option<String>,
    issued: u64,
    applied: u64,
}

impl BugCache {
    pub fn begin_load(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    /// Returns false, leaving the slot alone, when `ticket` is stale.
    pub fn replace(&mut self, ticket: u64, snapshot: BugSnapshot) -> bool {
        if ticket <= self.applied {
            return false;
        }
        self.applied = ticket;
        self.snapshot = Some(snapshot);
        self.last_error = None;
        true
    }

    pub fn record_failure(&mut self, ticket: u64, message: String) -> bool {
        if ticket <= self.applied {
            return false;
        }
        self.applied = ticket;
        self.last_error = Some(message);
        true
    }

    pub fn records(&self) -> &[BugRecord] {
        self.snapshot
            .as_ref()
            .map(|s| s.records.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(tag: &str) -> BugSnapshot {
        BugSnapshot {
            source_path: tag.to_string(),
            loaded_at: 0,
            records: Vec::new(),
        }
    }

    #[test]
    fn late_older_load_does_not_overwrite_newer_snapshot() {
        let mut cache = BugCache::default();
        let initial = cache.begin_load();
        let from_watcher = cache.begin_load();

        assert!(cache.replace(from_watcher, snapshot("v2")));
        assert!(!cache.replace(initial, snapshot("v1")));

        assert_eq!(cache.snapshot.as_ref().map(|s| s.source_path.as_str()), Some("v2"));
    }

    #[test]
    fn stale_failure_does_not_mask_newer_success() {
        let mut cache = BugCache::default();
        let older = cache.begin_load();
        let newer = cache.begin_load();

        assert!(cache.replace(newer, snapshot("v2")));
        assert!(!cache.record_failure(older, "read failed".to_string()));
        assert!(cache.last_error.is_none());
    }

    #[test]
    fn newer_failure_keeps_snapshot_and_records_error() {
        let mut cache = BugCache::default();
        let first = cache.begin_load();
        assert!(cache.replace(first, snapshot("v1")));

        let second = cache.begin_load();
        assert!(cache.record_failure(second, "decode failed".to_string()));
        assert_eq!(cache.snapshot.as_ref().map(|s| s.source_path.as_str()), Some("v1"));
        assert_eq!(cache.last_error.as_deref(), Some("decode failed"));

        let third = cache.begin_load();
        assert!(cache.replace(third, snapshot("v3")));
        assert!(cache.last_error.is_none());
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// One entry of the bug report file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BugRecord {
    pub id: i64,
    #[serde(rename = "type")]
    pub bug_type: String, // "crash" | "ui" | "performance" | ...
    pub app: String,
    pub severity: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
}

impl BugRecord {
    pub fn is_resolved(&self) -> bool {
        self.resolution.is_some()
    }
}

/// One bar of the by-type chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeCount {
    #[serde(rename = "type")]
    pub bug_type: String,
    pub count: usize,
}

/// A list view row: the record plus the team it is routed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BugRow {
    #[serde(flatten)]
    pub record: BugRecord,
    pub team: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BugSummary {
    pub app_filter: String,
    pub total: usize,
    pub resolved: usize,
    pub unresolved: usize,
    pub by_type: Vec<TypeCount>,
}

/// Label used for the unscoped filter, both in the picker and over IPC.
pub const ALL_APPS: &str = "All";

/// Which app the counts and list are scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum AppFilter {
    #[default]
    All,
    App(String),
}

impl AppFilter {
    /// Parses a picker label. `"All"` and the empty label mean no scoping;
    /// anything else is an app name, taken verbatim.
    pub fn from_label(label: &str) -> Self {
        if label.is_empty() || label == ALL_APPS {
            AppFilter::All
        } else {
            AppFilter::App(label.to_string())
        }
    }

    pub fn matches(&self, record: &BugRecord) -> bool {
        match self {
            AppFilter::All => true,
            AppFilter::App(app) => record.app == *app,
        }
    }
}

impl fmt::Display for AppFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppFilter::All => f.write_str(ALL_APPS),
            AppFilter::App(app) => f.write_str(app),
        }
    }
}

impl From<&str> for AppFilter {
    fn from(label: &str) -> Self {
        AppFilter::from_label(label)
    }
}

impl Serialize for AppFilter {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AppFilter {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(AppFilter::from_label(&label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_record_with_missing_resolution() {
        let record: BugRecord = serde_json::from_value(json!({
            "id": 7,
            "type": "crash",
            "app": "Messages",
            "severity": "high",
            "title": "Crash on send"
        }))
        .expect("decode record");

        assert_eq!(record.bug_type, "crash");
        assert_eq!(record.resolution, None);
        assert!(!record.is_resolved());
    }

    #[test]
    fn decodes_null_resolution_as_unresolved() {
        let record: BugRecord = serde_json::from_value(json!({
            "id": 8,
            "type": "ui",
            "app": "Safari",
            "severity": "low",
            "title": "Tab bar clipped",
            "resolution": null
        }))
        .expect("decode record");

        assert_eq!(record.resolution, None);
    }

    #[test]
    fn rejects_mistyped_id() {
        let result = serde_json::from_value::<BugRecord>(json!({
            "id": "seven",
            "type": "crash",
            "app": "Messages",
            "severity": "high",
            "title": "Crash on send"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn serializes_type_field_under_its_wire_name() {
        let record = BugRecord {
            id: 1,
            bug_type: "performance".to_string(),
            app: "Maps".to_string(),
            severity: "medium".to_string(),
            title: "Slow route".to_string(),
            resolution: Some("fixed".to_string()),
        };
        let value = serde_json::to_value(&record).expect("encode record");
        assert_eq!(value["type"], json!("performance"));
        assert!(value.get("bug_type").is_none());
    }

    #[test]
    fn empty_and_all_labels_mean_unscoped() {
        assert_eq!(AppFilter::from_label(""), AppFilter::All);
        assert_eq!(AppFilter::from_label("All"), AppFilter::All);
        assert_eq!(
            AppFilter::from_label("Safari"),
            AppFilter::App("Safari".to_string())
        );
        assert_eq!(AppFilter::All.to_string(), "All");
    }

    #[test]
    fn whitespace_in_labels_is_part_of_the_app_name() {
        assert_eq!(AppFilter::from_label("  "), AppFilter::App("  ".to_string()));
        assert_eq!(
            AppFilter::from_label(" Messages"),
            AppFilter::App(" Messages".to_string())
        );
        assert_ne!(AppFilter::from_label("All "), AppFilter::All);
    }

    #[test]
    fn app_filter_round_trips_through_json_label() {
        let value = serde_json::to_value(AppFilter::App("Mail".to_string())).expect("encode");
        assert_eq!(value, json!("Mail"));
        let back: AppFilter = serde_json::from_value(json!("")).expect("decode");
        assert_eq!(back, AppFilter::All);
    }
}

use crate::models::bug::BugRecord;

/// Team for apps with no owner in the table.
pub const UNASSIGNED_TEAM: &str = "Unassigned";

/// Exact-match owner table; anything else goes to [`UNASSIGNED_TEAM`].
pub fn team_for_app(app: &str) -> &'static str {
    match app {
        "Messages" => "Communications",
        "FaceTime" => "Communications",
        "Mail" => "Communications",
        "Safari" => "Web Platform",
        "Photos" => "Media",
        "Music" => "Media",
        "Camera" => "Media",
        "Maps" => "Location Services",
        "Weather" => "Location Services",
        "Settings" => "System Experience",
        "Notes" => "Productivity",
        "Calendar" => "Productivity",
        "Reminders" => "Productivity",
        _ => UNASSIGNED_TEAM,
    }
}

pub fn assign_team(record: &BugRecord) -> &'static str {
    team_for_app(&record.app)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_apps_map_to_owning_team() {
        assert_eq!(team_for_app("Messages"), "Communications");
        assert_eq!(team_for_app("Safari"), "Web Platform");
        assert_eq!(team_for_app("Maps"), "Location Services");
    }

    #[test]
    fn unknown_and_near_miss_apps_fall_back() {
        for app in ["", "safari", "Messages ", "Xcode", "🐛"] {
            assert_eq!(team_for_app(app), UNASSIGNED_TEAM, "app {app:?}");
        }
    }

    #[test]
    fn assignment_is_deterministic() {
        let record = BugRecord {
            id: 1,
            bug_type: "crash".to_string(),
            app: "Photos".to_string(),
            severity: "high".to_string(),
            title: "Import crash".to_string(),
            resolution: None,
        };
        assert_eq!(assign_team(&record), assign_team(&record.clone()));
        assert_eq!(assign_team(&record), "Media");
    }
}

use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use tauri::AppHandle;

use crate::core::{debug_log, preferences_file, unique_time_suffix, unix_now_secs};

pub(crate) const SNOOZE_30_MINS: &str = "30_mins";
pub(crate) const SNOOZE_1_HOUR: &str = "1_hour";
pub(crate) const SNOOZE_3_HOURS: &str = "3_hours";
pub(crate) const SNOOZE_12_HOURS: &str = "12_hours";

pub(crate) fn snooze_duration_secs(tag: &str) -> Option<u64> {
    match tag {
        SNOOZE_30_MINS => Some(30 * 60),
        SNOOZE_1_HOUR => Some(60 * 60),
        SNOOZE_3_HOURS => Some(3 * 60 * 60),
        SNOOZE_12_HOURS => Some(12 * 60 * 60),
        _ => None,
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub(crate) struct StoredPreferences {
    pub(crate) show_notifications: bool,
    pub(crate) notification_sounds: bool,
    pub(crate) notification_sender_previews: bool,
    pub(crate) notification_message_previews: bool,
    pub(crate) minimize_to_tray: bool,
    pub(crate) badge_dock_icon: bool,
    pub(crate) auto_hide_menu_bar: bool,
    /// Which snooze entry was picked. Only meaningful while `snooze_until`
    /// is still in the future.
    pub(crate) snooze_selection: Option<String>,
    pub(crate) snooze_until: Option<u64>,
}

impl Default for StoredPreferences {
    fn default() -> Self {
        Self {
            show_notifications: true,
            notification_sounds: true,
            notification_sender_previews: true,
            notification_message_previews: true,
            minimize_to_tray: true,
            badge_dock_icon: true,
            auto_hide_menu_bar: false,
            snooze_selection: None,
            snooze_until: None,
        }
    }
}

pub(crate) fn read_preferences(app: &AppHandle) -> Result<StoredPreferences, String> {
    let path = preferences_file(app)?;
    Ok(read_preferences_from(&path))
}

/// Missing or unreadable stores fall back to defaults so a damaged file can
/// never keep the app from starting.
pub(crate) fn read_preferences_from(path: &Path) -> StoredPreferences {
    if !path.exists() {
        return StoredPreferences::default();
    }

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(error) => {
            debug_log(&format!("read_preferences: failed to read {path:?}: {error}"));
            return StoredPreferences::default();
        }
    };

    match serde_json::from_str::<StoredPreferences>(&content) {
        Ok(preferences) => preferences,
        Err(error) => {
            debug_log(&format!("read_preferences: failed to parse {path:?}: {error}"));
            StoredPreferences::default()
        }
    }
}

pub(crate) fn persist_preferences_to_path(
    path: &Path,
    preferences: &StoredPreferences,
) -> Result<(), String> {
    let content = serde_json::to_string_pretty(preferences)
        .map_err(|error| format!("Failed to serialize preferences: {error}"))?;

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("preferences.json");
    let tmp_path = path.with_file_name(format!(
        "{file_name}.tmp-{}-{}",
        std::process::id(),
        unique_time_suffix()
    ));

    fs::write(&tmp_path, content)
        .map_err(|error| format!("Failed to write preferences: {error}"))?;
    if let Err(error) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(format!("Failed to replace preferences file: {error}"));
    }
    Ok(())
}

/// Read-modify-write under the mutation closure. A failed write leaves the
/// on-disk store untouched, so the change reverts on the next read.
pub(crate) fn update_preferences(
    app: &AppHandle,
    mutate: impl FnOnce(&mut StoredPreferences),
) -> Result<StoredPreferences, String> {
    let path = preferences_file(app)?;
    let mut preferences = read_preferences_from(&path);
    mutate(&mut preferences);
    persist_preferences_to_path(&path, &preferences)?;
    Ok(preferences)
}

pub(crate) fn is_snooze_active(preferences: &StoredPreferences) -> bool {
    match preferences.snooze_until {
        Some(until) => until > unix_now_secs(),
        None => false,
    }
}

/// Picking the already-active entry cancels the snooze; anything else
/// (re)arms it for that duration.
pub(crate) fn toggle_snooze(app: &AppHandle, tag: &str) -> Result<StoredPreferences, String> {
    let duration = snooze_duration_secs(tag)
        .ok_or_else(|| format!("Unknown snooze duration: {tag}"))?;

    update_preferences(app, |preferences| {
        let currently_active = is_snooze_active(preferences)
            && preferences.snooze_selection.as_deref() == Some(tag);
        if currently_active {
            preferences.snooze_selection = None;
            preferences.snooze_until = None;
        } else {
            preferences.snooze_selection = Some(tag.to_string());
            preferences.snooze_until = Some(unix_now_secs() + duration);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::unix_now_secs;

    fn temp_prefs_path() -> std::path::PathBuf {
        std::env::temp_dir().join(format!(
            "pulse-prefs-test-{}-{}.json",
            std::process::id(),
            unique_time_suffix()
        ))
    }

    #[test]
    fn defaults_enable_notifications_and_tray() {
        let preferences = StoredPreferences::default();
        assert!(preferences.show_notifications);
        assert!(preferences.notification_sounds);
        assert!(preferences.minimize_to_tray);
        assert!(preferences.badge_dock_icon);
        assert!(!preferences.auto_hide_menu_bar);
        assert!(preferences.snooze_selection.is_none());
    }

    #[test]
    fn missing_file_reads_as_defaults() {
        let path = temp_prefs_path();
        assert_eq!(read_preferences_from(&path), StoredPreferences::default());
    }

    #[test]
    fn corrupt_file_reads_as_defaults() {
        let path = temp_prefs_path();
        fs::write(&path, "{not json").unwrap();
        assert_eq!(read_preferences_from(&path), StoredPreferences::default());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn persist_then_read_roundtrips() {
        let path = temp_prefs_path();
        let mut preferences = StoredPreferences::default();
        preferences.show_notifications = false;
        preferences.auto_hide_menu_bar = true;
        preferences.snooze_selection = Some(SNOOZE_1_HOUR.to_string());
        preferences.snooze_until = Some(unix_now_secs() + 3600);

        persist_preferences_to_path(&path, &preferences).unwrap();
        assert_eq!(read_preferences_from(&path), preferences);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn unknown_fields_are_ignored_on_read() {
        let path = temp_prefs_path();
        fs::write(&path, r#"{"show_notifications": false, "legacy_field": 42}"#).unwrap();
        let preferences = read_preferences_from(&path);
        assert!(!preferences.show_notifications);
        assert!(preferences.notification_sounds);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn failed_persist_leaves_store_untouched() {
        let path = temp_prefs_path();
        let original = StoredPreferences::default();
        persist_preferences_to_path(&path, &original).unwrap();

        let missing_dir = path.with_file_name(format!(
            "pulse-prefs-missing-{}",
            unique_time_suffix()
        ));
        let bad_path = missing_dir.join("preferences.json");
        let mut changed = original.clone();
        changed.minimize_to_tray = false;
        assert!(persist_preferences_to_path(&bad_path, &changed).is_err());

        assert_eq!(read_preferences_from(&path), original);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn toggling_twice_restores_the_original_store() {
        let path = temp_prefs_path();
        let original = StoredPreferences::default();
        persist_preferences_to_path(&path, &original).unwrap();

        for _ in 0..2 {
            let mut preferences = read_preferences_from(&path);
            preferences.notification_sounds = !preferences.notification_sounds;
            persist_preferences_to_path(&path, &preferences).unwrap();
        }

        assert_eq!(read_preferences_from(&path), original);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn snooze_expiry_is_compared_against_now() {
        let mut preferences = StoredPreferences::default();
        assert!(!is_snooze_active(&preferences));

        preferences.snooze_selection = Some(SNOOZE_30_MINS.to_string());
        preferences.snooze_until = Some(unix_now_secs() + 600);
        assert!(is_snooze_active(&preferences));

        preferences.snooze_until = Some(unix_now_secs().saturating_sub(1));
        assert!(!is_snooze_active(&preferences));
    }

    #[test]
    fn snooze_durations_match_their_tags() {
        assert_eq!(snooze_duration_secs(SNOOZE_30_MINS), Some(1800));
        assert_eq!(snooze_duration_secs(SNOOZE_1_HOUR), Some(3600));
        assert_eq!(snooze_duration_secs(SNOOZE_3_HOURS), Some(10800));
        assert_eq!(snooze_duration_secs(SNOOZE_12_HOURS), Some(43200));
        assert_eq!(snooze_duration_secs("2_weeks"), None);
    }
}

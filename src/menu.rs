use tauri::{
    menu::{CheckMenuItem, IsMenuItem, Menu, MenuItem, PredefinedMenuItem, Submenu},
    AppHandle, Manager as _,
};

use crate::{
    consts::{HELP_URL, OVERVIEW_URL, PLAY_STORE_URL, ZOOM_STEP},
    core::debug_log,
    prefs::{self, StoredPreferences, SNOOZE_12_HOURS, SNOOZE_1_HOUR, SNOOZE_30_MINS, SNOOZE_3_HOURS},
    tray, ui_shell, window,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Platform {
    MacOs,
    Windows,
    Linux,
}

impl Platform {
    pub(crate) fn current() -> Self {
        if cfg!(target_os = "macos") {
            Self::MacOs
        } else if cfg!(target_os = "windows") {
            Self::Windows
        } else {
            Self::Linux
        }
    }
}

/// Roles the windowing system implements natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NativeRole {
    Undo,
    Redo,
    Cut,
    Copy,
    Paste,
    SelectAll,
    Minimize,
    Maximize,
    CloseWindow,
    Fullscreen,
    Hide,
    HideOthers,
    ShowAll,
    Quit,
}

/// Immutable description of one menu entry. The whole bar is described first
/// and installed in a separate step, so the layout can be inspected without a
/// running windowing system.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum MenuEntry {
    Action {
        id: &'static str,
        label: String,
        accelerator: Option<&'static str>,
    },
    Toggle {
        id: &'static str,
        label: String,
        checked: bool,
    },
    /// Informational, not clickable.
    Label(String),
    Native {
        role: NativeRole,
        label: Option<&'static str>,
    },
    Separator,
    Submenu {
        label: String,
        entries: Vec<MenuEntry>,
    },
}

/// Pure layout function: platform + preferences in, template out. Checkbox
/// state is whatever the preferences say at build time; the bar is rebuilt
/// wholesale after every toggle rather than patched in place.
pub(crate) fn build_menu_template(
    platform: Platform,
    preferences: &StoredPreferences,
    version: &str,
) -> Vec<MenuEntry> {
    let snooze_active = prefs::is_snooze_active(preferences);
    let snooze_toggle = |id: &'static str, tag: &str, label: &str| MenuEntry::Toggle {
        id,
        label: label.to_string(),
        checked: snooze_active && preferences.snooze_selection.as_deref() == Some(tag),
    };

    let mut preferences_entries = vec![
        MenuEntry::Submenu {
            label: "Notification Preferences".to_string(),
            entries: vec![
                MenuEntry::Toggle {
                    id: "toggle_show_notifications",
                    label: "Show Notifications".to_string(),
                    checked: preferences.show_notifications,
                },
                MenuEntry::Toggle {
                    id: "toggle_notification_sounds",
                    label: "Play Notification Sound".to_string(),
                    checked: preferences.notification_sounds,
                },
                MenuEntry::Separator,
                MenuEntry::Toggle {
                    id: "toggle_sender_previews",
                    label: "Display Sender in Notification".to_string(),
                    checked: preferences.notification_sender_previews,
                },
                MenuEntry::Toggle {
                    id: "toggle_message_previews",
                    label: "Display Message Preview in Notification".to_string(),
                    checked: preferences.notification_message_previews,
                },
                MenuEntry::Separator,
                MenuEntry::Submenu {
                    label: "Snooze Desktop Notifications".to_string(),
                    entries: vec![
                        snooze_toggle("snooze_30_mins", SNOOZE_30_MINS, "30 mins"),
                        snooze_toggle("snooze_1_hour", SNOOZE_1_HOUR, "1 hour"),
                        snooze_toggle("snooze_3_hours", SNOOZE_3_HOURS, "3 hours"),
                        snooze_toggle("snooze_12_hours", SNOOZE_12_HOURS, "12 hours"),
                    ],
                },
            ],
        },
        MenuEntry::Separator,
        MenuEntry::Toggle {
            id: "toggle_minimize_to_tray",
            label: if platform == Platform::MacOs {
                "Show in Menu Bar".to_string()
            } else {
                "Show in Tray".to_string()
            },
            checked: preferences.minimize_to_tray,
        },
    ];

    if platform != Platform::Windows {
        preferences_entries.push(MenuEntry::Toggle {
            id: "toggle_badge_dock_icon",
            label: "Show Unread Count on Icon".to_string(),
            checked: preferences.badge_dock_icon,
        });
    }
    if platform != Platform::MacOs {
        preferences_entries.push(MenuEntry::Toggle {
            id: "toggle_auto_hide_menu_bar",
            label: "Auto-hide Menu Bar".to_string(),
            checked: preferences.auto_hide_menu_bar,
        });
    }

    let window_entries = if platform == Platform::MacOs {
        vec![
            MenuEntry::Native {
                role: NativeRole::CloseWindow,
                label: Some("Close"),
            },
            MenuEntry::Native {
                role: NativeRole::Minimize,
                label: Some("Minimize"),
            },
            MenuEntry::Native {
                role: NativeRole::Maximize,
                label: Some("Zoom"),
            },
        ]
    } else {
        vec![
            MenuEntry::Native {
                role: NativeRole::Minimize,
                label: None,
            },
            MenuEntry::Native {
                role: NativeRole::CloseWindow,
                label: None,
            },
        ]
    };

    let mut template = vec![
        MenuEntry::Submenu {
            label: "Preferences".to_string(),
            entries: preferences_entries,
        },
        MenuEntry::Submenu {
            label: "Edit".to_string(),
            entries: vec![
                MenuEntry::Native {
                    role: NativeRole::Undo,
                    label: None,
                },
                MenuEntry::Native {
                    role: NativeRole::Redo,
                    label: None,
                },
                MenuEntry::Separator,
                MenuEntry::Native {
                    role: NativeRole::Cut,
                    label: None,
                },
                MenuEntry::Native {
                    role: NativeRole::Copy,
                    label: None,
                },
                MenuEntry::Native {
                    role: NativeRole::Paste,
                    label: None,
                },
                MenuEntry::Native {
                    role: NativeRole::SelectAll,
                    label: None,
                },
            ],
        },
        MenuEntry::Submenu {
            label: "View".to_string(),
            entries: vec![
                MenuEntry::Action {
                    id: "reload",
                    label: "Reload".to_string(),
                    accelerator: Some("CmdOrCtrl+R"),
                },
                MenuEntry::Action {
                    id: "toggle_devtools",
                    label: "Toggle Developer Tools".to_string(),
                    accelerator: Some("CmdOrCtrl+I"),
                },
                MenuEntry::Separator,
                MenuEntry::Action {
                    id: "zoom_reset",
                    label: "Actual Size".to_string(),
                    accelerator: Some("CmdOrCtrl+0"),
                },
                MenuEntry::Action {
                    id: "zoom_in",
                    label: "Zoom In".to_string(),
                    accelerator: Some("CmdOrCtrl+="),
                },
                MenuEntry::Action {
                    id: "zoom_out",
                    label: "Zoom Out".to_string(),
                    accelerator: Some("CmdOrCtrl+-"),
                },
                MenuEntry::Separator,
                MenuEntry::Native {
                    role: NativeRole::Fullscreen,
                    label: None,
                },
            ],
        },
        MenuEntry::Submenu {
            label: "Window".to_string(),
            entries: window_entries,
        },
        MenuEntry::Submenu {
            label: "Help".to_string(),
            entries: vec![
                MenuEntry::Label(version.to_string()),
                MenuEntry::Action {
                    id: "open_help",
                    label: "Get Help".to_string(),
                    accelerator: None,
                },
                MenuEntry::Action {
                    id: "open_overview",
                    label: "Platform Support".to_string(),
                    accelerator: None,
                },
                MenuEntry::Action {
                    id: "open_play_store",
                    label: "Get it on Google Play".to_string(),
                    accelerator: None,
                },
            ],
        },
    ];

    if platform == Platform::MacOs {
        template.insert(
            0,
            MenuEntry::Submenu {
                label: "Pulse".to_string(),
                entries: vec![
                    MenuEntry::Native {
                        role: NativeRole::Hide,
                        label: Some("Hide Pulse"),
                    },
                    MenuEntry::Native {
                        role: NativeRole::HideOthers,
                        label: None,
                    },
                    MenuEntry::Native {
                        role: NativeRole::ShowAll,
                        label: None,
                    },
                    MenuEntry::Separator,
                    MenuEntry::Native {
                        role: NativeRole::Quit,
                        label: Some("Quit Pulse"),
                    },
                ],
            },
        );
    }

    template
}

/// Build the template for the current platform and hand it to the windowing
/// system. Called at startup and again after every preference toggle.
pub(crate) fn install_menu(app: &AppHandle) -> Result<(), String> {
    let preferences = prefs::read_preferences(app).unwrap_or_default();
    let version = app.package_info().version.to_string();
    let template = build_menu_template(Platform::current(), &preferences, &version);

    let menu = Menu::new(app).map_err(|error| format!("Failed to create menu: {error}"))?;
    for entry in &template {
        let item = build_entry(app, entry)
            .map_err(|error| format!("Failed to build menu entry: {error}"))?;
        menu.append(&*item)
            .map_err(|error| format!("Failed to append menu entry: {error}"))?;
    }
    app.set_menu(menu)
        .map_err(|error| format!("Failed to install menu: {error}"))?;

    #[cfg(not(target_os = "macos"))]
    window::apply_menu_bar_visibility(app, preferences.auto_hide_menu_bar);

    Ok(())
}

fn build_entry(
    app: &AppHandle,
    entry: &MenuEntry,
) -> Result<Box<dyn IsMenuItem<tauri::Wry>>, tauri::Error> {
    match entry {
        MenuEntry::Action {
            id,
            label,
            accelerator,
        } => Ok(Box::new(MenuItem::with_id(
            app,
            *id,
            label,
            true,
            *accelerator,
        )?)),
        MenuEntry::Toggle { id, label, checked } => Ok(Box::new(CheckMenuItem::with_id(
            app,
            *id,
            label,
            true,
            *checked,
            None::<&str>,
        )?)),
        MenuEntry::Label(text) => Ok(Box::new(MenuItem::new(app, text, false, None::<&str>)?)),
        MenuEntry::Separator => Ok(Box::new(PredefinedMenuItem::separator(app)?)),
        MenuEntry::Native { role, label } => Ok(Box::new(native_item(app, *role, *label)?)),
        MenuEntry::Submenu { label, entries } => {
            let submenu = Submenu::new(app, label, true)?;
            for child in entries {
                let item = build_entry(app, child)?;
                submenu.append(&*item)?;
            }
            Ok(Box::new(submenu))
        }
    }
}

fn native_item(
    app: &AppHandle,
    role: NativeRole,
    label: Option<&str>,
) -> Result<PredefinedMenuItem<tauri::Wry>, tauri::Error> {
    match role {
        NativeRole::Undo => PredefinedMenuItem::undo(app, label),
        NativeRole::Redo => PredefinedMenuItem::redo(app, label),
        NativeRole::Cut => PredefinedMenuItem::cut(app, label),
        NativeRole::Copy => PredefinedMenuItem::copy(app, label),
        NativeRole::Paste => PredefinedMenuItem::paste(app, label),
        NativeRole::SelectAll => PredefinedMenuItem::select_all(app, label),
        NativeRole::Minimize => PredefinedMenuItem::minimize(app, label),
        NativeRole::Maximize => PredefinedMenuItem::maximize(app, label),
        NativeRole::CloseWindow => PredefinedMenuItem::close_window(app, label),
        NativeRole::Fullscreen => PredefinedMenuItem::fullscreen(app, label),
        NativeRole::Hide => PredefinedMenuItem::hide(app, label),
        NativeRole::HideOthers => PredefinedMenuItem::hide_others(app, label),
        NativeRole::ShowAll => PredefinedMenuItem::show_all(app, label),
        NativeRole::Quit => PredefinedMenuItem::quit(app, label),
    }
}

pub(crate) fn handle_menu_event(app: &AppHandle, id: &str) {
    let mut rebuild = true;
    match id {
        "toggle_show_notifications" => {
            toggle_preference(app, |p| p.show_notifications = !p.show_notifications);
        }
        "toggle_notification_sounds" => {
            toggle_preference(app, |p| p.notification_sounds = !p.notification_sounds);
        }
        "toggle_sender_previews" => {
            toggle_preference(app, |p| {
                p.notification_sender_previews = !p.notification_sender_previews;
            });
        }
        "toggle_message_previews" => {
            toggle_preference(app, |p| {
                p.notification_message_previews = !p.notification_message_previews;
            });
        }
        "snooze_30_mins" | "snooze_1_hour" | "snooze_3_hours" | "snooze_12_hours" => {
            let tag = id.trim_start_matches("snooze_");
            if let Err(error) = prefs::toggle_snooze(app, tag) {
                debug_log(&format!("snooze failed: {error}"));
            }
        }
        "toggle_minimize_to_tray" => {
            if let Some(preferences) =
                toggle_preference(app, |p| p.minimize_to_tray = !p.minimize_to_tray)
            {
                if preferences.minimize_to_tray {
                    if let Err(error) = tray::build_tray(app) {
                        debug_log(&format!("tray rebuild failed: {error}"));
                    }
                } else {
                    tray::destroy_tray(app);
                }
            }
        }
        "toggle_badge_dock_icon" => {
            if let Some(preferences) =
                toggle_preference(app, |p| p.badge_dock_icon = !p.badge_dock_icon)
            {
                #[cfg(not(target_os = "windows"))]
                if !preferences.badge_dock_icon {
                    window::clear_badge(app);
                }
                #[cfg(target_os = "windows")]
                let _ = preferences;
            }
        }
        "toggle_auto_hide_menu_bar" => {
            if let Some(preferences) =
                toggle_preference(app, |p| p.auto_hide_menu_bar = !p.auto_hide_menu_bar)
            {
                #[cfg(not(target_os = "macos"))]
                window::apply_menu_bar_visibility(app, preferences.auto_hide_menu_bar);
                #[cfg(target_os = "macos")]
                let _ = preferences;
            }
        }
        "reload" => {
            window::reload_host_page(app);
            rebuild = false;
        }
        "toggle_devtools" => {
            window::toggle_devtools(app);
            rebuild = false;
        }
        "zoom_in" => {
            window::adjust_zoom(app, Some(ZOOM_STEP));
            rebuild = false;
        }
        "zoom_out" => {
            window::adjust_zoom(app, Some(-ZOOM_STEP));
            rebuild = false;
        }
        "zoom_reset" => {
            window::adjust_zoom(app, None);
            rebuild = false;
        }
        "open_help" => {
            ui_shell::open_external_url(HELP_URL);
            rebuild = false;
        }
        "open_overview" => {
            ui_shell::open_external_url(OVERVIEW_URL);
            rebuild = false;
        }
        "open_play_store" => {
            ui_shell::open_external_url(PLAY_STORE_URL);
            rebuild = false;
        }
        other => {
            debug_log(&format!("unhandled menu event: {other}"));
            rebuild = false;
        }
    }

    // Checkbox state lives in the preference store; reinstalling the bar is
    // what keeps the visible checkmarks honest (including a revert when the
    // store could not be written).
    if rebuild {
        if let Err(error) = install_menu(app) {
            debug_log(&format!("menu rebuild failed: {error}"));
        }
    }
}

fn toggle_preference(
    app: &AppHandle,
    mutate: impl FnOnce(&mut StoredPreferences),
) -> Option<StoredPreferences> {
    match prefs::update_preferences(app, mutate) {
        Ok(preferences) => Some(preferences),
        Err(error) => {
            debug_log(&format!("preference toggle failed: {error}"));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::unix_now_secs;

    fn flatten(entries: &[MenuEntry]) -> Vec<&MenuEntry> {
        let mut out = Vec::new();
        for entry in entries {
            out.push(entry);
            if let MenuEntry::Submenu { entries, .. } = entry {
                out.extend(flatten(entries));
            }
        }
        out
    }

    fn find_toggle<'a>(entries: &'a [MenuEntry], wanted: &str) -> Option<&'a MenuEntry> {
        flatten(entries).into_iter().find(|entry| {
            matches!(entry, MenuEntry::Toggle { id, .. } if *id == wanted)
        })
    }

    fn toggle_checked(entries: &[MenuEntry], wanted: &str) -> bool {
        match find_toggle(entries, wanted) {
            Some(MenuEntry::Toggle { checked, .. }) => *checked,
            _ => panic!("missing toggle {wanted}"),
        }
    }

    #[test]
    fn app_identity_submenu_only_on_macos() {
        let preferences = StoredPreferences::default();
        let mac = build_menu_template(Platform::MacOs, &preferences, "1.0.0");
        let linux = build_menu_template(Platform::Linux, &preferences, "1.0.0");

        assert!(matches!(&mac[0], MenuEntry::Submenu { label, .. } if label == "Pulse"));
        assert!(matches!(&linux[0], MenuEntry::Submenu { label, .. } if label == "Preferences"));
    }

    #[test]
    fn badge_toggle_absent_on_windows() {
        let preferences = StoredPreferences::default();
        let windows = build_menu_template(Platform::Windows, &preferences, "1.0.0");
        let mac = build_menu_template(Platform::MacOs, &preferences, "1.0.0");
        let linux = build_menu_template(Platform::Linux, &preferences, "1.0.0");

        assert!(find_toggle(&windows, "toggle_badge_dock_icon").is_none());
        assert!(find_toggle(&mac, "toggle_badge_dock_icon").is_some());
        assert!(find_toggle(&linux, "toggle_badge_dock_icon").is_some());
    }

    #[test]
    fn auto_hide_toggle_absent_on_macos() {
        let preferences = StoredPreferences::default();
        let mac = build_menu_template(Platform::MacOs, &preferences, "1.0.0");
        let windows = build_menu_template(Platform::Windows, &preferences, "1.0.0");

        assert!(find_toggle(&mac, "toggle_auto_hide_menu_bar").is_none());
        assert!(find_toggle(&windows, "toggle_auto_hide_menu_bar").is_some());
    }

    #[test]
    fn tray_toggle_label_matches_platform() {
        let preferences = StoredPreferences::default();
        let mac = build_menu_template(Platform::MacOs, &preferences, "1.0.0");
        let linux = build_menu_template(Platform::Linux, &preferences, "1.0.0");

        assert!(matches!(
            find_toggle(&mac, "toggle_minimize_to_tray"),
            Some(MenuEntry::Toggle { label, .. }) if label == "Show in Menu Bar"
        ));
        assert!(matches!(
            find_toggle(&linux, "toggle_minimize_to_tray"),
            Some(MenuEntry::Toggle { label, .. }) if label == "Show in Tray"
        ));
    }

    #[test]
    fn checkboxes_reflect_preference_state() {
        let mut preferences = StoredPreferences::default();
        preferences.show_notifications = false;
        preferences.minimize_to_tray = false;

        let template = build_menu_template(Platform::Linux, &preferences, "1.0.0");
        assert!(!toggle_checked(&template, "toggle_show_notifications"));
        assert!(toggle_checked(&template, "toggle_notification_sounds"));
        assert!(!toggle_checked(&template, "toggle_minimize_to_tray"));
    }

    #[test]
    fn snooze_checkmark_follows_active_selection() {
        let mut preferences = StoredPreferences::default();
        preferences.snooze_selection = Some(SNOOZE_1_HOUR.to_string());
        preferences.snooze_until = Some(unix_now_secs() + 3600);

        let template = build_menu_template(Platform::Linux, &preferences, "1.0.0");
        assert!(!toggle_checked(&template, "snooze_30_mins"));
        assert!(toggle_checked(&template, "snooze_1_hour"));

        // Expired snooze leaves every entry unchecked even with a selection.
        preferences.snooze_until = Some(unix_now_secs().saturating_sub(10));
        let template = build_menu_template(Platform::Linux, &preferences, "1.0.0");
        assert!(!toggle_checked(&template, "snooze_1_hour"));
    }

    #[test]
    fn help_submenu_carries_version_label() {
        let preferences = StoredPreferences::default();
        let template = build_menu_template(Platform::Linux, &preferences, "0.4.0");
        let flat = flatten(&template);
        assert!(flat
            .iter()
            .any(|entry| matches!(entry, MenuEntry::Label(text) if text == "0.4.0")));
    }
}

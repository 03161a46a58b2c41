use tauri::{
    image::Image,
    menu::{Menu, MenuItem},
    tray::{MouseButton, MouseButtonState, TrayIconBuilder, TrayIconEvent},
    AppHandle, Manager as _,
};

use crate::{consts::MAIN_TRAY_ID, core::debug_log, prefs, ui_shell};

/// Create the tray icon, honoring the minimize-to-tray preference: when it is
/// off this is a no-op. At most one icon exists at a time.
pub(crate) fn build_tray(app: &AppHandle) -> Result<(), String> {
    let preferences = prefs::read_preferences(app).unwrap_or_default();
    if !preferences.minimize_to_tray {
        return Ok(());
    }
    if app.tray_by_id(MAIN_TRAY_ID).is_some() {
        return Ok(());
    }

    let show_item = MenuItem::with_id(app, "show_window", "Show Pulse", true, None::<&str>)
        .map_err(|error| format!("Failed to build tray menu item: {error}"))?;
    let quit_item = MenuItem::with_id(app, "quit", "Quit", true, None::<&str>)
        .map_err(|error| format!("Failed to build tray menu item: {error}"))?;
    let menu = Menu::with_items(app, &[&show_item, &quit_item])
        .map_err(|error| format!("Failed to build tray menu: {error}"))?;

    let mut tray_builder = TrayIconBuilder::with_id(MAIN_TRAY_ID)
        .menu(&menu)
        .show_menu_on_left_click(false)
        .tooltip("Pulse SMS")
        .on_tray_icon_event(|tray, event| {
            if let TrayIconEvent::Click {
                button: MouseButton::Left,
                button_state: MouseButtonState::Up,
                ..
            } = event
            {
                ui_shell::show_main_window(tray.app_handle());
            }
        })
        .on_menu_event(move |app, event| match event.id().as_ref() {
            "show_window" => {
                ui_shell::show_main_window(app);
            }
            "quit" => {
                ui_shell::quit(app);
            }
            _ => {}
        });
    if let Some(icon) = platform_tray_icon().or_else(|| app.default_window_icon().cloned()) {
        tray_builder = tray_builder.icon(icon);
    }
    #[cfg(target_os = "macos")]
    {
        tray_builder = tray_builder.icon_as_template(true);
    }

    tray_builder
        .build(app)
        .map_err(|error| format!("Failed to build tray icon: {error}"))?;
    debug_log("tray icon created");
    Ok(())
}

pub(crate) fn destroy_tray(app: &AppHandle) {
    if app.remove_tray_by_id(MAIN_TRAY_ID).is_some() {
        debug_log("tray icon destroyed");
    }
}

fn platform_tray_icon() -> Option<Image<'static>> {
    #[cfg(target_os = "macos")]
    let bytes = include_bytes!("../icons/tray-mac.png").as_slice();
    #[cfg(target_os = "windows")]
    let bytes = include_bytes!("../icons/tray-windows.png").as_slice();
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let bytes = include_bytes!("../icons/tray-linux.png").as_slice();

    Image::from_bytes(bytes).ok().map(|icon| icon.to_owned())
}

use std::{process::Command, sync::atomic::Ordering, time::Duration};

use tauri::{AppHandle, Manager as _};

use crate::{
    consts::{SURFACE_READY_POLL_MS, SURFACE_READY_TIMEOUT_MS},
    core::debug_log,
    menu,
    model::AppState,
    relay, updater, window,
};

/// Show (or recreate) the main window, then refresh the hosted page once the
/// surface is ready again.
pub(crate) fn show_main_window(app: &AppHandle) {
    if let Some(window) = window::get_main_window(app) {
        let _ = window.show();
        let _ = window.unminimize();
        let _ = window.set_focus();
    } else if let Err(error) = window::create_main_window(app) {
        debug_log(&format!("show_main_window: recreate failed: {error}"));
        return;
    }
    refresh_host_page_when_ready(app);
}

/// Wait for the surface's load-finished signal (bounded) and then fire the
/// in-page refresh. Failures are logged and dropped; the refresh is advisory.
pub(crate) fn refresh_host_page_when_ready(app: &AppHandle) {
    let app = app.clone();
    tauri::async_runtime::spawn(async move {
        let mut waited_ms: u64 = 0;
        while waited_ms < SURFACE_READY_TIMEOUT_MS {
            {
                let state = app.state::<AppState>();
                if state.surface_ready.load(Ordering::SeqCst) {
                    break;
                }
            }
            tokio::time::sleep(Duration::from_millis(SURFACE_READY_POLL_MS)).await;
            waited_ms += SURFACE_READY_POLL_MS;
        }

        if window::notify_host_page(&app).is_err() {
            debug_log("refresh_host_page_when_ready: surface not ready, skipped");
        }
    });
}

/// Re-activation path: the window comes back, the menu is rebuilt against the
/// current preferences, and another update check runs. The window and relay
/// are never recreated here.
pub(crate) fn activate(app: &AppHandle) {
    show_main_window(app);
    if let Err(error) = menu::install_menu(app) {
        debug_log(&format!("activate: menu rebuild failed: {error}"));
    }
    updater::check_for_updates(app);
}

/// The only way the process exits: tear the relay down first, then leave.
pub(crate) fn quit(app: &AppHandle) {
    relay::close_web_socket(app);
    app.exit(0);
}

pub(crate) fn open_external_url(url: &str) {
    if let Err(error) = open_external_url_checked(url) {
        debug_log(&format!("open_external_url: {error}"));
    }
}

fn open_external_url_checked(url: &str) -> Result<(), String> {
    let candidate = url.trim();
    if candidate.is_empty() {
        return Err("Missing URL".to_string());
    }
    let parsed = url::Url::parse(candidate).map_err(|error| format!("Invalid URL: {error}"))?;
    let scheme = parsed.scheme().to_ascii_lowercase();
    if scheme != "http" && scheme != "https" && scheme != "mailto" {
        return Err(format!("Unsupported URL scheme: {scheme}"));
    }

    #[cfg(target_os = "macos")]
    let status = Command::new("open").arg(candidate).status();
    #[cfg(target_os = "linux")]
    let status = Command::new("xdg-open").arg(candidate).status();
    #[cfg(target_os = "windows")]
    let status = Command::new("cmd")
        .arg("/C")
        .arg("start")
        .arg("")
        .arg(candidate)
        .status();

    let status = status.map_err(|error| format!("Failed to open URL: {error}"))?;
    if !status.success() {
        return Err(format!(
            "Failed to open URL (exit code {})",
            status.code().unwrap_or(-1)
        ));
    }

    Ok(())
}

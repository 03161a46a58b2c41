use std::{fmt, sync::atomic::Ordering};

use tauri::{AppHandle, Manager as _, Runtime, WebviewUrl, WebviewWindow};

use crate::{
    consts::{APP_URL, MAIN_WINDOW_LABEL, REFRESH_HOST_PAGE_SCRIPT, ZOOM_MAX, ZOOM_MIN},
    core::debug_log,
    model::AppState,
};

/// The browser surface exists but cannot take script yet (or is gone).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SurfaceNotReady;

impl fmt::Display for SurfaceNotReady {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "browser surface is not ready")
    }
}

pub(crate) fn get_main_window<R: Runtime>(app: &AppHandle<R>) -> Option<WebviewWindow<R>> {
    app.get_webview_window(MAIN_WINDOW_LABEL)
}

/// Idempotent: a second call while the window exists is a no-op.
pub(crate) fn create_main_window(app: &AppHandle) -> Result<(), String> {
    if get_main_window(app).is_some() {
        return Ok(());
    }

    let url = url::Url::parse(APP_URL).map_err(|error| format!("Invalid app URL: {error}"))?;
    tauri::WebviewWindowBuilder::new(
        app,
        MAIN_WINDOW_LABEL,
        WebviewUrl::External(url),
    )
    .title("Pulse SMS")
    .inner_size(1000.0, 750.0)
    .min_inner_size(300.0, 300.0)
    .on_page_load(move |window, payload| {
        if matches!(payload.event(), tauri::webview::PageLoadEvent::Finished) {
            let state = window.app_handle().state::<AppState>();
            state.surface_ready.store(true, Ordering::SeqCst);
            debug_log("main window: page load finished, surface ready");
        }
    })
    .build()
    .map_err(|error| format!("Failed to create main window: {error}"))?;

    Ok(())
}

/// Inject the in-page refresh hook. The expression itself is try/catch
/// wrapped, so the only failures surfaced here are a missing or not yet
/// loaded surface.
pub(crate) fn notify_host_page<R: Runtime>(app: &AppHandle<R>) -> Result<(), SurfaceNotReady> {
    let state = app.state::<AppState>();
    if !state.surface_ready.load(Ordering::SeqCst) {
        return Err(SurfaceNotReady);
    }
    let window = get_main_window(app).ok_or(SurfaceNotReady)?;
    window
        .eval(REFRESH_HOST_PAGE_SCRIPT)
        .map_err(|_| SurfaceNotReady)
}

pub(crate) fn reload_host_page(app: &AppHandle) {
    let Some(mut window) = get_main_window(app) else {
        return;
    };
    let url = match url::Url::parse(APP_URL) {
        Ok(url) => url,
        Err(error) => {
            debug_log(&format!("reload_host_page: invalid app URL: {error}"));
            return;
        }
    };
    let state = app.state::<AppState>();
    state.surface_ready.store(false, Ordering::SeqCst);
    if let Err(error) = window.navigate(url) {
        debug_log(&format!("reload_host_page: navigation failed: {error}"));
    }
}

pub(crate) fn toggle_devtools<R: Runtime>(app: &AppHandle<R>) {
    if let Some(window) = get_main_window(app) {
        if window.is_devtools_open() {
            window.close_devtools();
        } else {
            window.open_devtools();
        }
    }
}

/// `Some(step)` nudges the zoom, `None` resets to 100%.
pub(crate) fn adjust_zoom(app: &AppHandle, step: Option<f64>) {
    let Some(window) = get_main_window(app) else {
        return;
    };
    let state = app.state::<AppState>();
    let Ok(mut level) = state.zoom_level.lock() else {
        return;
    };
    let next = match step {
        Some(step) => (*level + step).clamp(ZOOM_MIN, ZOOM_MAX),
        None => 1.0,
    };
    match window.set_zoom(next) {
        Ok(()) => *level = next,
        Err(error) => debug_log(&format!("adjust_zoom: set_zoom failed: {error}")),
    }
}

#[cfg(not(target_os = "macos"))]
pub(crate) fn apply_menu_bar_visibility(app: &AppHandle, auto_hide: bool) {
    if let Some(window) = app.get_webview_window(MAIN_WINDOW_LABEL) {
        let result = if auto_hide {
            window.hide_menu()
        } else {
            window.show_menu()
        };
        if let Err(error) = result {
            debug_log(&format!("apply_menu_bar_visibility: {error}"));
        }
    }
}

#[cfg(not(target_os = "windows"))]
pub(crate) fn clear_badge(app: &AppHandle) {
    if let Some(window) = app.get_webview_window(MAIN_WINDOW_LABEL) {
        if let Err(error) = window.set_badge_count(None) {
            debug_log(&format!("clear_badge: {error}"));
        }
    }
}

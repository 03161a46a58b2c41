// Prevents additional console window on Windows in release, DO NOT REMOVE!!
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod consts;
mod core;
mod menu;
mod model;
mod prefs;
mod relay;
mod tray;
mod ui_shell;
mod updater;
mod window;

use std::sync::atomic::AtomicU64;

use tauri::WindowEvent;

use crate::{consts::MAIN_WINDOW_LABEL, core::debug_log, model::AppState};

static FILE_SUFFIX_COUNTER: AtomicU64 = AtomicU64::new(0);

fn main() {
    debug_log("═══════════════════════════════════════");
    debug_log(&format!(
        "pulse-desktop starting (pid={})",
        std::process::id()
    ));
    debug_log("Logs also written to: /tmp/pulse-desktop.log");
    debug_log("═══════════════════════════════════════");
    core::init_crash_reporting();

    let app = tauri::Builder::default()
        .plugin(tauri_plugin_single_instance::init(|app, argv, cwd| {
            // A second launch lands here; the new process has already exited.
            debug_log(&format!("second launch forwarded: argv={argv:?} cwd={cwd:?}"));
            ui_shell::show_main_window(app);
        }))
        .plugin(tauri_plugin_dialog::init())
        .manage(AppState::new())
        .setup(|app| {
            debug_log("setup: starting");
            let handle = app.handle();

            if let Err(error) = handle.plugin(tauri_plugin_updater::Builder::new().build()) {
                debug_log(&format!("setup: updater plugin unavailable: {error}"));
            }

            let preferences_path = core::preferences_file(handle)?;
            debug_log(&format!(
                "setup: preferences file path = {preferences_path:?}"
            ));

            window::create_main_window(handle)?;
            menu::install_menu(handle)?;
            if let Err(error) = tray::build_tray(handle) {
                debug_log(&format!("setup: tray creation failed: {error}"));
            }
            // A failed relay start must never take the window down with it.
            if let Err(error) = relay::open_web_socket(handle) {
                debug_log(&format!("setup: relay failed to start: {error}"));
            }
            updater::check_for_updates(handle);

            debug_log("setup: complete");
            Ok(())
        })
        .on_menu_event(|app, event| {
            menu::handle_menu_event(app, event.id().as_ref());
        })
        .on_window_event(|window, event| {
            if window.label() == MAIN_WINDOW_LABEL {
                if let WindowEvent::CloseRequested { api, .. } = event {
                    // Closing hides; only an explicit Quit ends the process.
                    api.prevent_close();
                    let _ = window.hide();
                }
            }
        })
        .build(tauri::generate_context!())
        .expect("error while building tauri application");

    app.run(|app_handle, event| match event {
        #[cfg(target_os = "macos")]
        tauri::RunEvent::Reopen { .. } => {
            ui_shell::activate(app_handle);
        }
        tauri::RunEvent::ExitRequested { .. } => {
            // Covers the predefined Quit role, which bypasses ui_shell::quit.
            relay::close_web_socket(app_handle);
        }
        _ => {}
    });
}

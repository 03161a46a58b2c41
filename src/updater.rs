use tauri::AppHandle;
use tauri_plugin_dialog::{DialogExt as _, MessageDialogButtons};
use tauri_plugin_updater::UpdaterExt as _;

use crate::{core::debug_log, relay};

/// Fire-and-forget update check. Runs at startup and on re-activation; every
/// failure is logged and swallowed so the app keeps working on the current
/// version.
pub(crate) fn check_for_updates(app: &AppHandle) {
    let app = app.clone();
    tauri::async_runtime::spawn(async move {
        if let Err(error) = check_and_prompt(&app).await {
            debug_log(&format!("update check failed: {error}"));
        }
    });
}

async fn check_and_prompt(app: &AppHandle) -> Result<(), String> {
    let updater = app
        .updater()
        .map_err(|error| format!("Updater unavailable: {error}"))?;
    let Some(update) = updater
        .check()
        .await
        .map_err(|error| format!("Update check failed: {error}"))?
    else {
        debug_log("update check: already on the latest version");
        return Ok(());
    };

    debug_log(&format!("update available: {}", update.version));
    let bytes = update
        .download(|_, _| {}, || {})
        .await
        .map_err(|error| format!("Update download failed: {error}"))?;

    let message = format!(
        "Pulse {} has been downloaded and is ready to install.",
        update.version
    );
    let app_for_install = app.clone();
    app.dialog()
        .message(message)
        .title("Pulse Update")
        .buttons(MessageDialogButtons::OkCancelCustom(
            "Install".to_string(),
            "Later".to_string(),
        ))
        .show(move |install| {
            if !install {
                debug_log("update deferred by user");
                return;
            }
            relay::close_web_socket(&app_for_install);
            match update.install(bytes) {
                Ok(()) => app_for_install.exit(0),
                Err(error) => debug_log(&format!("update install failed: {error}")),
            }
        });

    Ok(())
}

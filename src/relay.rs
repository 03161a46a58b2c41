use std::time::{Duration, SystemTime, UNIX_EPOCH};

use futures_util::{SinkExt as _, StreamExt as _};
use tauri::{AppHandle, Manager as _, Runtime};
use tokio::sync::watch;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};

use crate::{
    consts::{
        EVENT_STREAM_URL, RELAY_BACKOFF_CAP_SECS, RELAY_BACKOFF_INITIAL_SECS,
        RELAY_CONNECT_TIMEOUT_SECS,
    },
    core::{debug_log, truncate_message, unix_now_secs},
    model::AppState,
    window,
};

/// Idempotent: while a relay task is alive the call is a no-op.
pub(crate) fn open_web_socket<R: Runtime>(app: &AppHandle<R>) -> Result<(), String> {
    let state = app.state::<AppState>();
    let mut runtime = state
        .relay
        .lock()
        .map_err(|_| "Relay lock poisoned".to_string())?;

    if runtime.stop_tx.is_some() {
        return Ok(());
    }

    let (tx, rx) = watch::channel(false);
    runtime.stop_tx = Some(tx);
    runtime.relay_epoch = runtime.relay_epoch.wrapping_add(1);
    let task_epoch = runtime.relay_epoch;
    runtime.should_run = true;
    runtime.last_error = None;
    runtime.backoff_seconds = 0;
    runtime.reconnect_attempts = 0;
    drop(runtime);

    set_connection_state(app, "Connecting");
    let app_for_task = app.clone();
    debug_log("spawning relay task");
    tauri::async_runtime::spawn(async move {
        run_relay_loop(app_for_task, rx, task_epoch).await;
    });

    Ok(())
}

/// Safe to call at any time, including before the first open.
pub(crate) fn close_web_socket<R: Runtime>(app: &AppHandle<R>) {
    let Some(state) = app.try_state::<AppState>() else {
        return;
    };
    if let Ok(mut runtime) = state.relay.lock() {
        if let Some(stop_tx) = runtime.stop_tx.take() {
            let _ = stop_tx.send(true);
        }
        runtime.should_run = false;
        runtime.backoff_seconds = 0;
    }
    set_connection_state(app, "Disconnected");
}

async fn run_relay_loop<R: Runtime>(
    app: AppHandle<R>,
    mut stop_rx: watch::Receiver<bool>,
    task_epoch: u64,
) {
    let mut backoff_secs: u64 = RELAY_BACKOFF_INITIAL_SECS;
    debug_log("relay task started");

    loop {
        if *stop_rx.borrow() {
            break;
        }

        set_connection_state(&app, "Connecting");
        debug_log("attempting relay connection");
        match relay_once(&app, &mut stop_rx).await {
            Ok(()) => {
                if *stop_rx.borrow() {
                    break;
                }
                debug_log("relay session ended without error");
                set_connection_state(&app, "Disconnected");
            }
            Err(err) => {
                if *stop_rx.borrow() {
                    break;
                }

                debug_log(&format!("relay loop error: {err}"));
                set_connection_state(&app, "Backoff");
                if let Some(state) = app.try_state::<AppState>() {
                    if let Ok(mut runtime) = state.relay.lock() {
                        runtime.last_error = Some(truncate_message(&err, 300));
                        runtime.backoff_seconds = backoff_secs;
                        runtime.reconnect_attempts = runtime.reconnect_attempts.saturating_add(1);
                    }
                }

                let jitter_ms = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| (d.subsec_millis() % 500) as u64)
                    .unwrap_or(0);

                tokio::time::sleep(
                    Duration::from_secs(backoff_secs) + Duration::from_millis(jitter_ms),
                )
                .await;
                backoff_secs = next_backoff_secs(backoff_secs);
            }
        }
    }

    finish_relay_task(&app, task_epoch);
}

/// Task epilogue. Only the task that still owns the current epoch may clear
/// the shared state; a superseded task must not touch its replacement's
/// diagnostics on the way out.
fn finish_relay_task<R: Runtime>(app: &AppHandle<R>, task_epoch: u64) {
    let state = app.state::<AppState>();
    if let Ok(mut runtime) = state.relay.lock() {
        if runtime.relay_epoch == task_epoch {
            runtime.stop_tx = None;
            runtime.should_run = false;
            runtime.backoff_seconds = 0;
            runtime.connection_state = "Disconnected".to_string();
            debug_log("relay state: Disconnected");
        }
    };
}

async fn relay_once<R: Runtime>(
    app: &AppHandle<R>,
    stop_rx: &mut watch::Receiver<bool>,
) -> Result<(), String> {
    let ws_url = build_relay_ws_url(EVENT_STREAM_URL)?;
    debug_log(&format!("ws connect {ws_url}"));
    let (mut ws_stream, _) = tokio::time::timeout(
        Duration::from_secs(RELAY_CONNECT_TIMEOUT_SECS),
        connect_async(ws_url.as_str()),
    )
    .await
    .map_err(|_| {
        format!(
            "Relay connection timed out after {} seconds",
            RELAY_CONNECT_TIMEOUT_SECS
        )
    })?
    .map_err(|error| format!("Relay connection failed: {error}"))?;

    debug_log("ws connected");
    if let Some(state) = app.try_state::<AppState>() {
        if let Ok(mut runtime) = state.relay.lock() {
            runtime.last_connected_at = Some(unix_now_secs());
            runtime.last_error = None;
            runtime.backoff_seconds = 0;
        }
    }
    set_connection_state(app, "Connected");

    loop {
        tokio::select! {
            _ = stop_rx.changed() => {
                if *stop_rx.borrow() {
                    let _ = ws_stream.close(None).await;
                    return Ok(());
                }
            }
            incoming = ws_stream.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        debug_log(&format!("ws text frame bytes={}", text.len()));
                        // The frame content does not matter; any pushed event
                        // means the hosted page has something to re-fetch.
                        if window::notify_host_page(app).is_err() {
                            debug_log("relay: surface not ready, refresh skipped");
                        }
                    }
                    Some(Ok(Message::Ping(payload))) => {
                        ws_stream.send(Message::Pong(payload)).await
                            .map_err(|error| format!("Failed to send pong: {error}"))?;
                    }
                    Some(Ok(Message::Close(_))) => {
                        return Err("Relay closed by server".to_string());
                    }
                    Some(Ok(_)) => {}
                    Some(Err(error)) => return Err(format!("Relay read error: {error}")),
                    None => return Err("Relay ended unexpectedly".to_string()),
                }
            }
        }
    }
}

fn set_connection_state<R: Runtime>(app: &AppHandle<R>, status: &str) {
    if let Some(state) = app.try_state::<AppState>() {
        if let Ok(mut runtime) = state.relay.lock() {
            if runtime.connection_state != status {
                debug_log(&format!("relay state: {status}"));
            }
            runtime.connection_state = status.to_string();
        }
    }
}

pub(crate) fn build_relay_ws_url(base_url: &str) -> Result<String, String> {
    let mut ws_url =
        url::Url::parse(base_url).map_err(|error| format!("Invalid stream URL: {error}"))?;

    match ws_url.scheme() {
        "http" => {
            ws_url
                .set_scheme("ws")
                .map_err(|_| "Unable to convert URL scheme to ws".to_string())?;
        }
        "https" => {
            ws_url
                .set_scheme("wss")
                .map_err(|_| "Unable to convert URL scheme to wss".to_string())?;
        }
        "ws" | "wss" => {}
        _ => return Err("Stream URL must start with http:// or https://".to_string()),
    }

    Ok(ws_url.to_string())
}

fn next_backoff_secs(current: u64) -> u64 {
    std::cmp::min(current.saturating_mul(2), RELAY_BACKOFF_CAP_SECS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tauri::Manager as _;

    fn mock_app() -> tauri::App<tauri::test::MockRuntime> {
        let app = tauri::test::mock_app();
        app.manage(AppState::new());
        app
    }

    #[test]
    fn open_web_socket_is_idempotent() {
        let app = mock_app();
        let handle = app.handle();

        open_web_socket(handle).unwrap();
        open_web_socket(handle).unwrap();

        {
            let state = handle.state::<AppState>();
            let runtime = state.relay.lock().unwrap();
            assert_eq!(runtime.relay_epoch, 1);
            assert!(runtime.stop_tx.is_some());
            assert!(runtime.should_run);
        }

        close_web_socket(handle);
        let state = handle.state::<AppState>();
        let runtime = state.relay.lock().unwrap();
        assert!(runtime.stop_tx.is_none());
        assert!(!runtime.should_run);
    }

    #[test]
    fn close_web_socket_is_safe_when_never_opened() {
        let app = mock_app();
        let handle = app.handle();

        close_web_socket(handle);

        let state = handle.state::<AppState>();
        let runtime = state.relay.lock().unwrap();
        assert!(runtime.stop_tx.is_none());
        assert!(!runtime.should_run);
        assert_eq!(runtime.connection_state, "Disconnected");
    }

    #[test]
    fn stale_task_epilogue_leaves_replacement_state_alone() {
        let app = mock_app();
        let handle = app.handle();
        {
            let state = handle.state::<AppState>();
            let mut runtime = state.relay.lock().unwrap();
            let (tx, _rx) = watch::channel(false);
            runtime.stop_tx = Some(tx);
            runtime.relay_epoch = 2;
            runtime.should_run = true;
            runtime.connection_state = "Connected".to_string();
        }

        // A wound-down task from a previous epoch must not clobber anything.
        finish_relay_task(handle, 1);
        {
            let state = handle.state::<AppState>();
            let runtime = state.relay.lock().unwrap();
            assert!(runtime.stop_tx.is_some());
            assert!(runtime.should_run);
            assert_eq!(runtime.connection_state, "Connected");
        }

        finish_relay_task(handle, 2);
        let state = handle.state::<AppState>();
        let runtime = state.relay.lock().unwrap();
        assert!(runtime.stop_tx.is_none());
        assert!(!runtime.should_run);
        assert_eq!(runtime.connection_state, "Disconnected");
    }

    #[test]
    fn ws_url_swaps_scheme() {
        assert_eq!(
            build_relay_ws_url("https://api.messenger.klinkerapps.com/api/v1/stream").unwrap(),
            "wss://api.messenger.klinkerapps.com/api/v1/stream"
        );
        assert_eq!(
            build_relay_ws_url("http://localhost:5000/stream").unwrap(),
            "ws://localhost:5000/stream"
        );
        assert_eq!(
            build_relay_ws_url("wss://example.com/stream").unwrap(),
            "wss://example.com/stream"
        );
    }

    #[test]
    fn ws_url_rejects_other_schemes() {
        assert!(build_relay_ws_url("ftp://example.com/stream").is_err());
        assert!(build_relay_ws_url("not a url").is_err());
    }

    #[test]
    fn backoff_doubles_up_to_cap() {
        let mut secs = RELAY_BACKOFF_INITIAL_SECS;
        let mut seen = Vec::new();
        for _ in 0..7 {
            seen.push(secs);
            secs = next_backoff_secs(secs);
        }
        assert_eq!(seen, vec![1, 2, 4, 8, 16, 30, 30]);
    }
}

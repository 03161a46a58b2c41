use std::sync::{atomic::AtomicBool, Mutex};

use tokio::sync::watch;

/// Process-wide state, managed by Tauri and reachable from every callback.
/// The tray icon itself is looked up through the tray registry by id.
pub(crate) struct AppState {
    pub(crate) relay: Mutex<RelayRuntime>,
    /// Set once the browser surface reports its first finished page load,
    /// cleared again on explicit reloads.
    pub(crate) surface_ready: AtomicBool,
    pub(crate) zoom_level: Mutex<f64>,
}

impl AppState {
    pub(crate) fn new() -> Self {
        Self {
            relay: Mutex::new(RelayRuntime::default()),
            surface_ready: AtomicBool::new(false),
            zoom_level: Mutex::new(1.0),
        }
    }
}

pub(crate) struct RelayRuntime {
    /// Present while a relay task owns the connection. Doubles as the
    /// "already running" marker for idempotent opens.
    pub(crate) stop_tx: Option<watch::Sender<bool>>,
    /// Incremented on every open; a loop whose epoch no longer matches has
    /// been superseded and must exit without touching shared state.
    pub(crate) relay_epoch: u64,
    pub(crate) should_run: bool,
    pub(crate) connection_state: String,
    pub(crate) backoff_seconds: u64,
    pub(crate) reconnect_attempts: u64,
    pub(crate) last_connected_at: Option<u64>,
    pub(crate) last_error: Option<String>,
}

impl Default for RelayRuntime {
    fn default() -> Self {
        Self {
            stop_tx: None,
            relay_epoch: 0,
            should_run: false,
            connection_state: "Disconnected".to_string(),
            backoff_seconds: 0,
            reconnect_attempts: 0,
            last_connected_at: None,
            last_error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relay_runtime_starts_disconnected() {
        let runtime = RelayRuntime::default();
        assert!(runtime.stop_tx.is_none());
        assert!(!runtime.should_run);
        assert_eq!(runtime.connection_state, "Disconnected");
        assert_eq!(runtime.reconnect_attempts, 0);
    }
}

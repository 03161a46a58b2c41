#[cfg(debug_assertions)]
use std::io::Write as _;
use std::{
    fs,
    path::PathBuf,
    sync::atomic::Ordering,
    time::{SystemTime, UNIX_EPOCH},
};
use tauri::{AppHandle, Manager as _};

use crate::{
    consts::{CRASH_COMPANY_NAME, CRASH_PRODUCT_NAME, CRASH_SUBMIT_URL},
    FILE_SUFFIX_COUNTER,
};

pub(crate) fn preferences_file(app: &AppHandle) -> Result<PathBuf, String> {
    let config_dir = app
        .path()
        .app_config_dir()
        .map_err(|error| format!("Failed to resolve app config dir: {error}"))?;

    fs::create_dir_all(&config_dir)
        .map_err(|error| format!("Failed to create config directory: {error}"))?;

    Ok(config_dir.join("preferences.json"))
}

pub(crate) fn truncate_message(input: &str, max_chars: usize) -> String {
    if input.chars().count() <= max_chars {
        return input.to_string();
    }

    let truncated: String = input.chars().take(max_chars).collect();
    format!("{truncated}...")
}

pub(crate) fn unix_now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

pub(crate) fn unique_time_suffix() -> u64 {
    FILE_SUFFIX_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Crash collection happens out of process; all we own is the identity the
/// reports carry.
pub(crate) fn init_crash_reporting() {
    debug_log(&format!(
        "crash reporting configured: product={CRASH_PRODUCT_NAME} company={CRASH_COMPANY_NAME} submit_url={CRASH_SUBMIT_URL}"
    ));
}

pub(crate) fn debug_log(message: &str) {
    #[cfg(not(debug_assertions))]
    let _ = message;
    #[cfg(debug_assertions)]
    {
        let ts = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let line = format!("[pulse-desktop][{ts}] {message}\n");
        eprint!("{line}");
        if let Ok(mut file) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open("/tmp/pulse-desktop.log")
        {
            let _ = file.write_all(line.as_bytes());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_message_short_input_unchanged() {
        assert_eq!(truncate_message("hello", 10), "hello");
        assert_eq!(truncate_message("hello", 5), "hello");
    }

    #[test]
    fn truncate_message_long_input_gets_ellipsis() {
        assert_eq!(truncate_message("hello world", 5), "hello...");
    }

    #[test]
    fn truncate_message_counts_chars_not_bytes() {
        assert_eq!(truncate_message("héllo", 5), "héllo");
        assert_eq!(truncate_message("héllöwörld", 4), "héll...");
    }

    #[test]
    fn unique_time_suffix_is_monotonic() {
        let a = unique_time_suffix();
        let b = unique_time_suffix();
        assert!(b > a);
    }
}

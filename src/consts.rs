pub(crate) const MAIN_WINDOW_LABEL: &str = "main";
pub(crate) const MAIN_TRAY_ID: &str = "main-tray";

/// Hosted web application loaded into the browser surface.
pub(crate) const APP_URL: &str = "https://messenger.klinkerapps.com/";
pub(crate) const HELP_URL: &str = "https://messenger.klinkerapps.com/help";
pub(crate) const OVERVIEW_URL: &str = "https://messenger.klinkerapps.com/overview";
pub(crate) const PLAY_STORE_URL: &str =
    "https://play.google.com/store/apps/details?id=xyz.klinker.messenger";

/// Event stream the relay subscribes to. Inbound frames only wake the hosted
/// page; the page itself fetches whatever changed.
pub(crate) const EVENT_STREAM_URL: &str = "https://api.messenger.klinkerapps.com/api/v1/stream";

/// Fire-and-forget expression injected into the hosted page. The page defines
/// the hook; a page that has not wired it up yet swallows the call.
pub(crate) const REFRESH_HOST_PAGE_SCRIPT: &str =
    "try { reloadUpdatedConversations() } catch (err) { }";

pub(crate) const RELAY_CONNECT_TIMEOUT_SECS: u64 = 10;
pub(crate) const RELAY_BACKOFF_INITIAL_SECS: u64 = 1;
pub(crate) const RELAY_BACKOFF_CAP_SECS: u64 = 30;

/// How long to wait for the surface's load-finished signal before giving up
/// on a deferred refresh. Bounded fallback, not a correctness mechanism.
pub(crate) const SURFACE_READY_TIMEOUT_MS: u64 = 1_000;
pub(crate) const SURFACE_READY_POLL_MS: u64 = 50;

pub(crate) const ZOOM_STEP: f64 = 0.1;
pub(crate) const ZOOM_MIN: f64 = 0.25;
pub(crate) const ZOOM_MAX: f64 = 3.0;

/// Crash reporting identity, configured once at startup.
pub(crate) const CRASH_PRODUCT_NAME: &str = "messenger";
pub(crate) const CRASH_COMPANY_NAME: &str = "messenger-desktop";
pub(crate) const CRASH_SUBMIT_URL: &str = "https://messenger-desktop.sp.backtrace.io:6098/post";

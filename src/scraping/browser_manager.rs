//! Browser discovery, launch configuration and page-settle heuristics on top
//! of `chromiumoxide`.
//!
//! Process-level stealth (user agent, automation flags, viewport) lives here;
//! the JS-level part is injected by the session (see `stealth.rs`).

use crate::core::config::BrowserSettings;
use anyhow::{anyhow, Result};
use chromiumoxide::browser::BrowserConfig;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::Page;
use rand::seq::IndexedRandom;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

// ── User agents ──────────────────────────────────────────────────────────────

/// Chromium-engine desktop user agents only: the stealth script reports
/// Chromium client hints, so a Firefox or Safari UA would contradict it.
const DESKTOP_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.0.0 Safari/537.36 Edg/132.0.0.0",
];

pub fn random_user_agent() -> &'static str {
    let mut rng = rand::rng();
    DESKTOP_USER_AGENTS
        .choose(&mut rng)
        .copied()
        .unwrap_or(DESKTOP_USER_AGENTS[0])
}

// ── Executable discovery ─────────────────────────────────────────────────────

const PATH_CANDIDATES: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
    "brave-browser",
    "brave",
    "chrome",
];

#[cfg(target_os = "macos")]
const WELL_KNOWN_PATHS: &[&str] = &[
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    "/Applications/Brave Browser.app/Contents/MacOS/Brave Browser",
];

#[cfg(target_os = "linux")]
const WELL_KNOWN_PATHS: &[&str] = &[
    "/usr/bin/google-chrome",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/usr/local/bin/chromium",
    "/snap/bin/chromium",
    "/usr/bin/brave-browser",
];

#[cfg(target_os = "windows")]
const WELL_KNOWN_PATHS: &[&str] = &[
    r"C:\Program Files\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe",
    r"C:\Program Files\BraveSoftware\Brave-Browser\Application\brave.exe",
];

#[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
const WELL_KNOWN_PATHS: &[&str] = &[];

/// Find a Chromium-family executable.
///
/// Resolution order:
/// 1. configured path / `CHROME_EXECUTABLE`
/// 2. PATH scan
/// 3. OS-specific install locations
pub fn find_chrome_executable(settings: &BrowserSettings) -> Option<String> {
    if let Some(explicit) = settings.resolve_executable() {
        return Some(explicit);
    }
    for name in PATH_CANDIDATES {
        if let Ok(path) = which::which(name) {
            return Some(path.to_string_lossy().to_string());
        }
    }
    WELL_KNOWN_PATHS
        .iter()
        .find(|p| Path::new(p).exists())
        .map(|p| p.to_string())
}

// ── Launch config ────────────────────────────────────────────────────────────

/// Per-session profile directory under the configured root. Each session gets
/// its own so two engines never share browser state.
pub fn session_profile_dir(settings: &BrowserSettings) -> PathBuf {
    settings
        .resolve_profile_root()
        .join(format!("fanta-scout-profile-{}", uuid::Uuid::new_v4()))
}

/// Launch config with the session fingerprint: fixed viewport, random
/// desktop UA and the automation-controlled blink feature disabled.
pub fn build_session_config(
    exe: &str,
    settings: &BrowserSettings,
    profile_dir: &Path,
    request_timeout: Duration,
) -> Result<BrowserConfig> {
    let (width, height) = settings.resolve_viewport();
    let ua = random_user_agent();
    debug!("browser: user agent {}", ua);

    let mut builder = BrowserConfig::builder()
        .chrome_executable(exe)
        .user_data_dir(profile_dir)
        .request_timeout(request_timeout)
        .viewport(Viewport {
            width,
            height,
            device_scale_factor: Some(1.0),
            emulating_mobile: false,
            is_landscape: true,
            has_touch: false,
        })
        .window_size(width, height)
        .arg("--disable-gpu")
        .arg("--no-sandbox")
        .arg("--disable-setuid-sandbox")
        .arg("--disable-dev-shm-usage")
        .arg("--disable-extensions")
        .arg("--disable-sync")
        .arg("--disable-translate")
        .arg("--no-first-run")
        .arg("--no-default-browser-check")
        .arg("--mute-audio")
        .arg("--lang=it-IT")
        .arg("--disable-blink-features=AutomationControlled")
        .arg(format!("--user-agent={}", ua));

    if !settings.resolve_headless() {
        builder = builder.with_head();
    }

    builder
        .build()
        .map_err(|e| anyhow!("failed to build browser config: {}", e))
}

// ── Settle wait ──────────────────────────────────────────────────────────────

async fn eval_json(page: &Page, js: &str) -> Option<serde_json::Value> {
    page.evaluate(js)
        .await
        .ok()
        .and_then(|v| v.into_value::<serde_json::Value>().ok())
}

/// Wait until `document.readyState` is complete and no new resource entries
/// appeared for `quiet`, or until `timeout` elapses. Never fails: a page that
/// keeps loading is simply captured as-is.
pub async fn wait_until_stable(page: &Page, quiet: Duration, timeout: Duration) {
    let poll = Duration::from_millis(250);
    let start = Instant::now();
    let mut last_count: u64 = 0;
    let mut stable_since = Instant::now();

    loop {
        if start.elapsed() >= timeout {
            debug!("settle: timeout after {}ms", timeout.as_millis());
            return;
        }

        let count = eval_json(page, "performance.getEntriesByType('resource').length")
            .await
            .and_then(|j| j.as_u64())
            .unwrap_or(0);
        let complete = eval_json(page, "document.readyState")
            .await
            .and_then(|j| j.as_str().map(|s| s == "complete"))
            .unwrap_or(false);

        if !complete || count != last_count {
            last_count = count;
            stable_since = Instant::now();
        } else if stable_since.elapsed() >= quiet {
            info!(
                "settle: idle after {}ms ({} resources)",
                start.elapsed().as_millis(),
                count
            );
            return;
        }

        tokio::time::sleep(poll).await;
    }
}

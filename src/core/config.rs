use crate::core::types::LeagueVariant;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ---------------------------------------------------------------------------
// ScoutConfig: file-based config loader (fanta-scout.json) with env-var fallback
// ---------------------------------------------------------------------------

pub const ENV_CONFIG_PATH: &str = "FANTA_SCOUT_CONFIG";
pub const ENV_CHROME_EXECUTABLE: &str = "CHROME_EXECUTABLE";
pub const ENV_HEADLESS: &str = "FANTA_SCOUT_HEADLESS";
pub const ENV_NAV_TIMEOUT_SECS: &str = "FANTA_SCOUT_NAV_TIMEOUT_SECS";
pub const ENV_LOGIN_TIMEOUT_SECS: &str = "FANTA_SCOUT_LOGIN_TIMEOUT_SECS";
pub const ENV_DATABASE: &str = "FANTA_SCOUT_DB";
pub const ENV_SCREENSHOT_DIR: &str = "FANTA_SCOUT_SCREENSHOT_DIR";
pub const ENV_ALLOW_EMPTY: &str = "FANTA_SCOUT_ALLOW_EMPTY";

const DEFAULT_CLASSIC_LOGIN_URL: &str = "https://leghe.fantacalcio.it/login";
const DEFAULT_MANTRA_LOGIN_URL: &str = "https://www.fantacalcio.it/login";
const DEFAULT_ACCEPT_LANGUAGE: &str = "it-IT,it;q=0.9,en-US;q=0.8,en;q=0.7";

fn env_trimmed(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_flag(key: &str) -> Option<bool> {
    env_trimmed(key).map(|v| !matches!(v.to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off"))
}

/// Browser launch settings (`browser` key).
#[derive(serde::Deserialize, Default, Clone, Debug)]
pub struct BrowserSettings {
    /// Explicit Chromium-family executable. Auto-discovered when absent.
    pub chrome_executable: Option<String>,
    /// Run without a visible window. Defaults to `true`.
    pub headless: Option<bool>,
    pub viewport_width: Option<u32>,
    pub viewport_height: Option<u32>,
    /// Value sent as `Accept-Language` on every request.
    pub accept_language: Option<String>,
    /// Parent directory for per-session browser profiles. Defaults to the OS temp dir.
    pub profile_root: Option<String>,
}

impl BrowserSettings {
    /// Executable: JSON field → `CHROME_EXECUTABLE` env var → `None` (auto-discovery).
    /// Paths that do not exist are ignored.
    pub fn resolve_executable(&self) -> Option<String> {
        self.chrome_executable
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .or_else(|| env_trimmed(ENV_CHROME_EXECUTABLE))
            .filter(|p| Path::new(p).exists())
    }

    pub fn resolve_headless(&self) -> bool {
        self.headless.or_else(|| env_flag(ENV_HEADLESS)).unwrap_or(true)
    }

    pub fn resolve_viewport(&self) -> (u32, u32) {
        (
            self.viewport_width.unwrap_or(1366),
            self.viewport_height.unwrap_or(768),
        )
    }

    pub fn resolve_accept_language(&self) -> String {
        self.accept_language
            .clone()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ACCEPT_LANGUAGE.to_string())
    }

    pub fn resolve_profile_root(&self) -> PathBuf {
        self.profile_root
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir)
    }
}

/// Per-step timeouts (`timeouts` key). Navigation timeouts are the only
/// cancellation mechanism a run has.
#[derive(serde::Deserialize, Default, Clone, Debug)]
pub struct TimeoutSettings {
    /// Plain page navigation. Default: 30 s.
    pub navigation_secs: Option<u64>,
    /// Login page navigation and form submission. Default: 60 s.
    pub login_secs: Option<u64>,
    /// Quick navigations such as the tournament list. Default: 15 s.
    pub short_navigation_secs: Option<u64>,
    /// Settle window after a navigation. Default: 1500 ms.
    pub settle_ms: Option<u64>,
    /// Fixed wait after submitting credentials. Default: 4000 ms.
    pub login_settle_ms: Option<u64>,
}

impl TimeoutSettings {
    pub fn navigation(&self) -> Duration {
        let secs = self
            .navigation_secs
            .or_else(|| env_trimmed(ENV_NAV_TIMEOUT_SECS).and_then(|v| v.parse().ok()))
            .unwrap_or(30);
        Duration::from_secs(secs.clamp(15, 60))
    }

    pub fn login(&self) -> Duration {
        let secs = self
            .login_secs
            .or_else(|| env_trimmed(ENV_LOGIN_TIMEOUT_SECS).and_then(|v| v.parse().ok()))
            .unwrap_or(60);
        Duration::from_secs(secs.clamp(15, 60))
    }

    pub fn short_navigation(&self) -> Duration {
        Duration::from_secs(self.short_navigation_secs.unwrap_or(15).clamp(15, 60))
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms.unwrap_or(1500))
    }

    pub fn login_settle(&self) -> Duration {
        Duration::from_millis(self.login_settle_ms.unwrap_or(4000))
    }
}

/// External-site endpoints (`site` key).
#[derive(serde::Deserialize, Default, Clone, Debug)]
pub struct SiteSettings {
    pub classic_login_url: Option<String>,
    pub mantra_login_url: Option<String>,
    /// Substrings of a league URL that identify the Mantra flavour.
    pub mantra_url_markers: Option<Vec<String>>,
}

impl SiteSettings {
    pub fn login_url(&self, variant: LeagueVariant) -> String {
        let (configured, default) = match variant {
            LeagueVariant::Classic => (&self.classic_login_url, DEFAULT_CLASSIC_LOGIN_URL),
            LeagueVariant::Mantra => (&self.mantra_login_url, DEFAULT_MANTRA_LOGIN_URL),
        };
        configured
            .clone()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| default.to_string())
    }

    pub fn mantra_markers(&self) -> Vec<String> {
        self.mantra_url_markers
            .clone()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| vec!["mantra".to_string(), "www.fantacalcio.it".to_string()])
    }
}

/// Snapshot storage (`storage` key).
#[derive(serde::Deserialize, Default, Clone, Debug)]
pub struct StorageSettings {
    pub database_path: Option<String>,
    pub screenshot_dir: Option<String>,
    /// Forward empty extraction results to the store, wiping the previous
    /// snapshot. Default: `true`; set `false` to keep the last snapshot when
    /// a page comes back empty.
    pub allow_empty_snapshot: Option<bool>,
}

impl StorageSettings {
    /// Database path: JSON field → `FANTA_SCOUT_DB` → `~/.fanta-scout/snapshots.sqlite3`.
    pub fn resolve_database_path(&self) -> PathBuf {
        if let Some(p) = self.database_path.as_deref().filter(|p| !p.trim().is_empty()) {
            return PathBuf::from(p);
        }
        if let Some(p) = env_trimmed(ENV_DATABASE) {
            return PathBuf::from(p);
        }
        data_dir().join("snapshots.sqlite3")
    }

    pub fn resolve_screenshot_dir(&self) -> PathBuf {
        if let Some(p) = self.screenshot_dir.as_deref().filter(|p| !p.trim().is_empty()) {
            return PathBuf::from(p);
        }
        if let Some(p) = env_trimmed(ENV_SCREENSHOT_DIR) {
            return PathBuf::from(p);
        }
        data_dir().join("screenshots")
    }

    pub fn resolve_allow_empty_snapshot(&self) -> bool {
        self.allow_empty_snapshot
            .or_else(|| env_flag(ENV_ALLOW_EMPTY))
            .unwrap_or(true)
    }
}

fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".fanta-scout")
}

/// Top-level config loaded from `fanta-scout.json`.
#[derive(serde::Deserialize, Default, Clone, Debug)]
pub struct ScoutConfig {
    #[serde(default)]
    pub browser: BrowserSettings,
    #[serde(default)]
    pub timeouts: TimeoutSettings,
    #[serde(default)]
    pub site: SiteSettings,
    #[serde(default)]
    pub storage: StorageSettings,
}

impl ScoutConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

/// Load `fanta-scout.json` from standard locations.
///
/// Search order (first found wins):
/// 1. `FANTA_SCOUT_CONFIG` env var path
/// 2. `./fanta-scout.json`
/// 3. `../fanta-scout.json`
///
/// Missing file → `ScoutConfig::default()`. Parse error → warning + default.
pub fn load_scout_config() -> ScoutConfig {
    let mut candidates = vec![
        PathBuf::from("fanta-scout.json"),
        PathBuf::from("../fanta-scout.json"),
    ];
    if let Some(env_path) = env_trimmed(ENV_CONFIG_PATH) {
        candidates.insert(0, PathBuf::from(env_path));
    }

    for path in &candidates {
        let Ok(contents) = std::fs::read_to_string(path) else {
            continue;
        };
        return match ScoutConfig::from_json_str(&contents) {
            Ok(cfg) => {
                tracing::info!("fanta-scout.json loaded from {}", path.display());
                cfg
            }
            Err(e) => {
                tracing::warn!(
                    "fanta-scout.json parse error at {}: {}; using defaults",
                    path.display(),
                    e
                );
                ScoutConfig::default()
            }
        };
    }

    ScoutConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults_for_missing_sections() {
        let cfg = ScoutConfig::from_json_str(
            r#"{ "timeouts": { "navigation_secs": 20 }, "site": { "classic_login_url": "https://a.test/login" } }"#,
        )
        .unwrap();
        assert_eq!(cfg.timeouts.navigation(), Duration::from_secs(20));
        assert_eq!(cfg.timeouts.settle(), Duration::from_millis(1500));
        assert_eq!(cfg.site.login_url(LeagueVariant::Classic), "https://a.test/login");
        assert_eq!(
            cfg.site.login_url(LeagueVariant::Mantra),
            DEFAULT_MANTRA_LOGIN_URL
        );
        assert_eq!(cfg.browser.resolve_viewport(), (1366, 768));
    }

    #[test]
    fn timeouts_are_clamped_to_supported_window() {
        let cfg = ScoutConfig::from_json_str(
            r#"{ "timeouts": { "navigation_secs": 2, "login_secs": 600 } }"#,
        )
        .unwrap();
        assert_eq!(cfg.timeouts.navigation(), Duration::from_secs(15));
        assert_eq!(cfg.timeouts.login(), Duration::from_secs(60));
    }

    #[test]
    fn explicit_storage_fields_win() {
        let cfg = ScoutConfig::from_json_str(
            r#"{ "storage": { "database_path": "/tmp/x.sqlite3", "allow_empty_snapshot": true } }"#,
        )
        .unwrap();
        assert_eq!(
            cfg.storage.resolve_database_path(),
            PathBuf::from("/tmp/x.sqlite3")
        );
        assert!(cfg.storage.resolve_allow_empty_snapshot());
    }

    #[test]
    fn empty_snapshots_replace_unless_disabled() {
        let cfg = ScoutConfig::from_json_str(r#"{ "storage": {} }"#).unwrap();
        if std::env::var(ENV_ALLOW_EMPTY).is_err() {
            assert!(cfg.storage.resolve_allow_empty_snapshot());
        }
        let cfg = ScoutConfig::from_json_str(r#"{ "storage": { "allow_empty_snapshot": false } }"#)
            .unwrap();
        assert!(!cfg.storage.resolve_allow_empty_snapshot());
    }

    #[test]
    fn blank_accept_language_falls_back() {
        let settings = BrowserSettings {
            accept_language: Some("  ".into()),
            ..Default::default()
        };
        assert!(settings.resolve_accept_language().starts_with("it-IT"));
    }
}

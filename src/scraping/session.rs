//! The browser session: one Chromium process, one page, one profile directory.
//!
//! League-specific state (variant, base URL, chosen tournament) is kept apart
//! in [`SessionContext`] and handed to each step explicitly, so a session
//! carries nothing but the browser.

use super::browser_manager::{
    build_session_config, find_chrome_executable, session_profile_dir, wait_until_stable,
};
use super::stealth::stealth_script;
use super::tournament::ScrapeUrls;
use crate::core::config::ScoutConfig;
use crate::core::error::{ScoutError, ScoutResult};
use crate::core::types::LeagueVariant;
use anyhow::anyhow;
use chromiumoxide::cdp::browser_protocol::network::{Headers, SetExtraHttpHeadersParams};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Settle window used after every navigation.
const SETTLE_QUIET: Duration = Duration::from_millis(500);

pub struct ScoutSession {
    config: ScoutConfig,
    browser: Option<Browser>,
    page: Option<Page>,
    handler_task: Option<JoinHandle<()>>,
    profile_dir: Option<PathBuf>,
}

impl ScoutSession {
    pub fn new(config: ScoutConfig) -> Self {
        Self {
            config,
            browser: None,
            page: None,
            handler_task: None,
            profile_dir: None,
        }
    }

    pub fn config(&self) -> &ScoutConfig {
        &self.config
    }

    /// Launch the browser and prepare the page. Launch errors are logged and
    /// reported as `false`; whatever was half-created is torn down.
    pub async fn init(&mut self) -> bool {
        match self.try_init().await {
            Ok(()) => true,
            Err(e) => {
                warn!("session: init failed: {}", e);
                self.close().await;
                false
            }
        }
    }

    pub async fn try_init(&mut self) -> ScoutResult<()> {
        if self.page.is_some() {
            return Ok(());
        }
        let settings = &self.config.browser;
        let exe = find_chrome_executable(settings).ok_or_else(|| {
            ScoutError::Initialization(
                "no Chromium-family browser found; set CHROME_EXECUTABLE".to_string(),
            )
        })?;

        let profile_dir = session_profile_dir(settings);
        std::fs::create_dir_all(&profile_dir)
            .map_err(|e| ScoutError::Initialization(format!("profile dir: {}", e)))?;
        self.profile_dir = Some(profile_dir.clone());

        let screenshot_dir = self.config.storage.resolve_screenshot_dir();
        if let Err(e) = std::fs::create_dir_all(&screenshot_dir) {
            warn!("session: cannot create {}: {}", screenshot_dir.display(), e);
        }

        let browser_config =
            build_session_config(&exe, settings, &profile_dir, self.config.timeouts.navigation())
                .map_err(|e| ScoutError::Initialization(e.to_string()))?;

        info!("session: launching {} (profile {})", exe, profile_dir.display());
        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| ScoutError::Initialization(format!("launch {}: {}", exe, e)))?;
        self.handler_task = Some(tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("session: CDP handler error: {}", e);
                }
            }
        }));

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| ScoutError::Initialization(format!("open page: {}", e)))?;
        self.browser = Some(browser);

        prepare_page(&page, &self.config.browser.resolve_accept_language())
            .await
            .map_err(|e| ScoutError::Initialization(e.to_string()))?;
        self.page = Some(page);
        info!("session: ready");
        Ok(())
    }

    pub fn page(&self) -> ScoutResult<&Page> {
        self.page.as_ref().ok_or(ScoutError::NotInitialized)
    }

    /// Cheap round-trip to the page; `false` when uninitialized or crashed.
    pub async fn is_alive(&self) -> bool {
        let Some(page) = self.page.as_ref() else {
            return false;
        };
        match page.evaluate("1 + 1").await {
            Ok(v) => v.into_value::<i64>().map(|n| n == 2).unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Navigate with a hard timeout, then wait for the page to settle.
    pub async fn navigate(&self, url: &str, timeout: Duration) -> ScoutResult<()> {
        let page = self.page()?;
        debug!("session: goto {} ({}s)", url, timeout.as_secs());
        match tokio::time::timeout(timeout, page.goto(url)).await {
            Err(_) => {
                return Err(ScoutError::NavigationTimeout {
                    url: url.to_string(),
                    timeout,
                })
            }
            Ok(Err(e)) => {
                return Err(ScoutError::Navigation {
                    url: url.to_string(),
                    reason: e.to_string(),
                })
            }
            Ok(Ok(_)) => {}
        }
        self.settle().await;
        Ok(())
    }

    pub async fn settle(&self) {
        if let Some(page) = self.page.as_ref() {
            wait_until_stable(page, SETTLE_QUIET, self.config.timeouts.settle().max(SETTLE_QUIET))
                .await;
        }
    }

    /// Full HTML of the current document.
    pub async fn snapshot_html(&self) -> ScoutResult<String> {
        self.page()?
            .content()
            .await
            .map_err(|e| ScoutError::Browser(format!("content: {}", e)))
    }

    pub async fn current_url(&self) -> Option<String> {
        self.page.as_ref()?.url().await.ok().flatten()
    }

    /// Extension point for debugging captures. Only guarantees the screenshot
    /// directory exists.
    pub async fn capture_screenshot(&self, label: &str) {
        let dir = self.config.storage.resolve_screenshot_dir();
        if let Err(e) = std::fs::create_dir_all(&dir) {
            warn!("session: cannot create {}: {}", dir.display(), e);
            return;
        }
        debug!("session: screenshot '{}' skipped (dir {})", label, dir.display());
    }

    /// Tear down browser and profile directory. Safe to call repeatedly and
    /// after a failed init.
    pub async fn close(&mut self) {
        self.page = None;
        teardown(
            self.browser.take(),
            self.handler_task.take(),
            self.profile_dir.take(),
        )
        .await;
    }
}

/// Stop the browser first, then remove its profile directory, so Chromium
/// never writes into a directory that is being deleted.
async fn teardown(
    browser: Option<Browser>,
    handler_task: Option<JoinHandle<()>>,
    profile_dir: Option<PathBuf>,
) {
    if let Some(mut browser) = browser {
        if let Err(e) = browser.close().await {
            debug!("session: browser close: {}", e);
        }
        let _ = browser.wait().await;
    }
    if let Some(task) = handler_task {
        task.abort();
    }
    if let Some(dir) = profile_dir {
        remove_profile(&dir);
    }
}

fn remove_profile(dir: &Path) {
    match std::fs::remove_dir_all(dir) {
        Ok(()) => debug!("session: removed profile {}", dir.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("session: cannot remove profile {}: {}", dir.display(), e),
    }
}

impl Drop for ScoutSession {
    fn drop(&mut self) {
        self.page = None;
        let browser = self.browser.take();
        let handler_task = self.handler_task.take();
        let profile_dir = self.profile_dir.take();
        if browser.is_some() {
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                handle.spawn(teardown(browser, handler_task, profile_dir));
                return;
            }
        }
        // Dropping the browser kills its process before the profile goes.
        drop(browser);
        if let Some(task) = handler_task {
            task.abort();
        }
        if let Some(dir) = profile_dir {
            remove_profile(&dir);
        }
    }
}

async fn prepare_page(page: &Page, accept_language: &str) -> anyhow::Result<()> {
    page.execute(AddScriptToEvaluateOnNewDocumentParams::new(stealth_script(
        accept_language,
    )))
    .await
    .map_err(|e| anyhow!("failed to inject stealth script: {}", e))?;

    page.execute(SetExtraHttpHeadersParams::new(Headers::new(
        serde_json::json!({ "Accept-Language": accept_language }),
    )))
    .await
    .map_err(|e| anyhow!("failed to set extra headers: {}", e))?;
    Ok(())
}

// ── Session context ──────────────────────────────────────────────────────────

/// Per-league state threaded through login, tournament selection and
/// extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub league_url_base: String,
    pub variant: LeagueVariant,
    pub selected_tournament: Option<String>,
}

impl SessionContext {
    pub fn new(league_url: &str, variant: LeagueVariant) -> Self {
        Self {
            league_url_base: league_url.trim().trim_end_matches('/').to_string(),
            variant,
            selected_tournament: None,
        }
    }

    /// Context whose variant is derived from the URL.
    pub fn detected(league_url: &str, mantra_markers: &[String]) -> Self {
        let mut ctx = Self::new(league_url, LeagueVariant::Classic);
        ctx.detect_league_type(mantra_markers);
        ctx
    }

    pub fn set_league_type(&mut self, variant: LeagueVariant) {
        if self.variant != variant {
            info!("session: league type {} → {}", self.variant.as_str(), variant.as_str());
        }
        self.variant = variant;
    }

    /// Mantra when the league URL contains any of `mantra_markers`.
    pub fn detect_league_type(&mut self, mantra_markers: &[String]) -> LeagueVariant {
        let lower = self.league_url_base.to_lowercase();
        let variant = if mantra_markers
            .iter()
            .any(|m| !m.is_empty() && lower.contains(&m.to_lowercase()))
        {
            LeagueVariant::Mantra
        } else {
            LeagueVariant::Classic
        };
        self.set_league_type(variant);
        variant
    }

    /// Scraping URLs for the current tournament selection.
    pub fn urls(&self) -> ScoutResult<ScrapeUrls> {
        ScrapeUrls::build(&self.league_url_base, self.selected_tournament.as_deref())
    }

    pub fn try_select_tournament(&mut self, id: &str) -> ScoutResult<ScrapeUrls> {
        let urls = ScrapeUrls::build(&self.league_url_base, Some(id))?;
        self.selected_tournament = Some(id.trim().to_string());
        info!("session: tournament {} selected", id.trim());
        Ok(urls)
    }

    /// Rewrite the scraping URLs for tournament `id`. No network I/O;
    /// `false` when `id` or the base URL is malformed.
    pub fn select_tournament(&mut self, id: &str) -> bool {
        match self.try_select_tournament(id) {
            Ok(_) => true,
            Err(e) => {
                warn!("session: cannot select tournament '{}': {}", id, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markers() -> Vec<String> {
        vec!["mantra".into(), "www.fantacalcio.it".into()]
    }

    #[test]
    fn variant_is_detected_from_url_markers() {
        let ctx = SessionContext::detected("https://leghe.fantacalcio.it/lega-amici/", &markers());
        assert_eq!(ctx.variant, LeagueVariant::Classic);
        assert_eq!(ctx.league_url_base, "https://leghe.fantacalcio.it/lega-amici");

        let ctx = SessionContext::detected("https://www.fantacalcio.it/leghe/xyz", &markers());
        assert_eq!(ctx.variant, LeagueVariant::Mantra);
    }

    #[test]
    fn explicit_league_type_overrides_detection() {
        let mut ctx = SessionContext::detected("https://leghe.fantacalcio.it/a", &markers());
        ctx.set_league_type(LeagueVariant::Mantra);
        assert_eq!(ctx.variant, LeagueVariant::Mantra);
    }

    #[test]
    fn select_tournament_rejects_non_numeric_ids() {
        let mut ctx = SessionContext::new("https://leghe.fantacalcio.it/a", LeagueVariant::Classic);
        assert!(!ctx.select_tournament("abc"));
        assert_eq!(ctx.selected_tournament, None);
        assert!(ctx.select_tournament("123"));
        assert_eq!(ctx.selected_tournament.as_deref(), Some("123"));
        assert!(ctx.urls().unwrap().standings.ends_with("/classifica?id=123"));
    }

    #[tokio::test]
    async fn close_is_idempotent_without_init() {
        let mut session = ScoutSession::new(ScoutConfig::default());
        assert!(!session.is_alive().await);
        session.close().await;
        session.close().await;
        assert!(matches!(session.page(), Err(ScoutError::NotInitialized)));
    }

    #[tokio::test]
    async fn teardown_removes_profile_and_tolerates_repeats() {
        let root = tempfile::tempdir().unwrap();
        let profile = root.path().join("profile");
        std::fs::create_dir_all(profile.join("Default")).unwrap();
        teardown(None, None, Some(profile.clone())).await;
        assert!(!profile.exists());
        teardown(None, None, Some(profile.clone())).await;
    }

    #[tokio::test]
    async fn dropping_a_session_inside_a_runtime_cleans_the_profile() {
        let root = tempfile::tempdir().unwrap();
        let profile = root.path().join("profile");
        std::fs::create_dir_all(&profile).unwrap();
        let mut session = ScoutSession::new(ScoutConfig::default());
        session.profile_dir = Some(profile.clone());
        drop(session);
        assert!(!profile.exists());
    }
}

//! Login state machine.
//!
//! `NotAuthenticated → CredentialsSubmitted → Authenticated | Failed`. One
//! attempt per call; retry policy belongs to the caller.
//!
//! Form discovery runs against an HTML snapshot of the login page so the
//! candidate order is testable offline. The resulting [`Locator`]s are then
//! resolved against the live page for typing and clicking.

use super::consent::resolve_popups;
use super::session::{ScoutSession, SessionContext};
use crate::core::error::ScoutResult;
use crate::core::types::Credentials;
use crate::extract::table::{element_text, select_doc, TokenSet};
use anyhow::{anyhow, Result};
use chromiumoxide::element::Element;
use chromiumoxide::Page;
use scraper::Html;
use std::sync::OnceLock;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    NotAuthenticated,
    CredentialsSubmitted,
    Authenticated,
    /// Diagnostic taken from an error banner, or a generic reason.
    Failed(String),
}

/// How to find one control on the live page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locator {
    /// First element matching the selector.
    Css(&'static str),
    /// `index`-th element (document order) matching the selector.
    Nth { css: &'static str, index: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitAction {
    Click(Locator),
    PressEnter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginForm {
    pub username: Option<Locator>,
    pub password: Option<Locator>,
    pub submit: SubmitAction,
}

const USERNAME_CANDIDATES: &[&str] = &[
    "input[name='username']",
    "input[name='email']",
    "input[type='email']",
    "input[placeholder*='mail']",
    "input[placeholder*='Mail']",
    "input[placeholder*='username']",
    "input[placeholder*='Username']",
    "input[placeholder*='utente']",
    "input[placeholder*='Utente']",
    "input[type='text']",
    "input:not([type])",
];

const PASSWORD_CANDIDATES: &[&str] = &["input[type='password']", "input[name='password']"];

const SUBMIT_CANDIDATES: &[&str] = &["button[type='submit']", "input[type='submit']"];

const BUTTON_CSS: &str = "button, [role='button']";

const ERROR_BANNER_CSS: &[&str] = &[
    ".alert-danger",
    ".alert-error",
    ".login-error",
    ".error-message",
    ".invalid-feedback",
    ".text-danger",
    "[role='alert']",
];

fn submit_words() -> &'static TokenSet {
    static WORDS: OnceLock<TokenSet> = OnceLock::new();
    WORDS.get_or_init(|| TokenSet::new(&["accedi", "login", "log in", "entra", "sign in", "signin"]))
}

fn first_present(doc: &Html, candidates: &[&'static str]) -> Option<Locator> {
    candidates
        .iter()
        .find(|css| !select_doc(doc, css).is_empty())
        .map(|css| Locator::Css(*css))
}

/// Pick username, password and submit controls from a login page snapshot.
/// Candidates are tried in order and the first present one wins.
pub fn locate_login_form(doc: &Html) -> LoginForm {
    let username = first_present(doc, USERNAME_CANDIDATES);
    let password = first_present(doc, PASSWORD_CANDIDATES);

    let submit = first_present(doc, SUBMIT_CANDIDATES)
        .or_else(|| {
            select_doc(doc, BUTTON_CSS)
                .into_iter()
                .position(|b| submit_words().is_match(&element_text(b)))
                .map(|index| Locator::Nth {
                    css: BUTTON_CSS,
                    index,
                })
        })
        .map(SubmitAction::Click)
        .unwrap_or(SubmitAction::PressEnter);

    LoginForm {
        username,
        password,
        submit,
    }
}

/// A post-submit URL that no longer mentions a login page means success.
pub fn is_past_login(url: &str) -> bool {
    let lower = url.to_lowercase();
    !(lower.contains("login") || lower.contains("signin"))
}

/// Text of the first non-empty known error banner.
pub fn error_banner(doc: &Html) -> Option<String> {
    ERROR_BANNER_CSS.iter().find_map(|css| {
        select_doc(doc, css)
            .into_iter()
            .map(element_text)
            .find(|t| !t.is_empty())
    })
}

async fn resolve(page: &Page, locator: Locator) -> Result<Element> {
    match locator {
        Locator::Css(css) => page
            .find_element(css)
            .await
            .map_err(|e| anyhow!("{} not found: {}", css, e)),
        Locator::Nth { css, index } => {
            let mut found = page
                .find_elements(css)
                .await
                .map_err(|e| anyhow!("{} not found: {}", css, e))?;
            if index < found.len() {
                Ok(found.swap_remove(index))
            } else {
                Err(anyhow!("{} has no element #{}", css, index))
            }
        }
    }
}

async fn fill(page: &Page, locator: Locator, value: &str) -> Result<Element> {
    let el = resolve(page, locator).await?;
    el.click()
        .await
        .map_err(|e| anyhow!("focus {:?}: {}", locator, e))?;
    el.type_str(value)
        .await
        .map_err(|e| anyhow!("type into {:?}: {}", locator, e))?;
    Ok(el)
}

async fn submit_and_fill(page: &Page, form: LoginForm, creds: &Credentials) -> Result<()> {
    let (Some(user_loc), Some(pass_loc)) = (form.username, form.password) else {
        return Err(anyhow!("login form not found"));
    };
    fill(page, user_loc, &creds.username).await?;
    let password_field = fill(page, pass_loc, &creds.password).await?;

    match form.submit {
        SubmitAction::Click(loc) => {
            resolve(page, loc)
                .await?
                .click()
                .await
                .map_err(|e| anyhow!("click submit: {}", e))?;
        }
        SubmitAction::PressEnter => {
            password_field
                .press_key("Enter")
                .await
                .map_err(|e| anyhow!("press Enter: {}", e))?;
        }
    }
    Ok(())
}

/// Run the login flow once.
///
/// Navigation timeouts and a missing session surface as errors; anything
/// that happens on the form itself ends in [`AuthState::Failed`].
pub async fn try_login(
    session: &ScoutSession,
    ctx: &SessionContext,
    creds: &Credentials,
    target_url: Option<&str>,
) -> ScoutResult<AuthState> {
    if creds.username.trim().is_empty() || creds.password.is_empty() {
        return Ok(AuthState::Failed("missing credentials".to_string()));
    }
    let config = session.config();
    let login_url = config.site.login_url(ctx.variant);
    info!("auth: {} login at {}", ctx.variant.as_str(), login_url);

    session.navigate(&login_url, config.timeouts.login()).await?;
    resolve_popups(session.page()?).await;

    let form = {
        let html = session.snapshot_html().await?;
        locate_login_form(&Html::parse_document(&html))
    };
    debug!("auth: form {:?}", form);

    let mut state = AuthState::NotAuthenticated;
    if let Err(e) = submit_and_fill(session.page()?, form, creds).await {
        warn!("auth: could not submit credentials: {}", e);
        return Ok(AuthState::Failed(e.to_string()));
    }
    state = transition(state, AuthState::CredentialsSubmitted);

    tokio::time::sleep(config.timeouts.login_settle()).await;
    session.settle().await;

    let landed = session.current_url().await.unwrap_or_default();
    if landed.is_empty() || !is_past_login(&landed) {
        let reason = match session.snapshot_html().await {
            Ok(html) => error_banner(&Html::parse_document(&html)),
            Err(_) => None,
        }
        .unwrap_or_else(|| format!("still on login page ({})", landed));
        return Ok(transition(state, AuthState::Failed(reason)));
    }
    state = transition(state, AuthState::Authenticated);

    if let Some(target) = target_url.filter(|t| !t.trim().is_empty()) {
        match session.navigate(target, config.timeouts.navigation()).await {
            Ok(()) => {
                resolve_popups(session.page()?).await;
            }
            Err(e) => warn!("auth: logged in but could not open {}: {}", target, e),
        }
    }
    Ok(state)
}

fn transition(from: AuthState, to: AuthState) -> AuthState {
    debug!("auth: {:?} -> {:?}", from, to);
    to
}

/// Boolean wrapper over [`try_login`]. Reasons are logged, never the password.
pub async fn login(
    session: &ScoutSession,
    ctx: &SessionContext,
    creds: &Credentials,
    target_url: Option<&str>,
) -> bool {
    match try_login(session, ctx, creds, target_url).await {
        Ok(AuthState::Authenticated) => {
            info!("auth: logged in as {}", creds.username);
            true
        }
        Ok(state) => {
            warn!("auth: login for {} ended in {:?}", creds.username, state);
            false
        }
        Err(e) => {
            warn!("auth: login for {} aborted: {}", creds.username, e);
            false
        }
    }
}

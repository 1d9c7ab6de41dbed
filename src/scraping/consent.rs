//! Cookie/consent overlay resolution.
//!
//! Each attempt first clicks a keyword-matched control; when there is none it
//! removes known consent-manager containers instead. An attempt that does
//! neither means the page is clean.

use crate::core::retry::{retry, RetryOutcome};
use crate::extract::table::TokenSet;
use chromiumoxide::Page;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;
use tracing::{debug, info};

const MAX_ATTEMPTS: u32 = 5;
const CLICKABLE_CSS: &str =
    "button, [role='button'], a[role='button'], input[type='button'], input[type='submit']";
/// Longer labels belong to content, not to consent controls.
const MAX_LABEL_CHARS: usize = 40;

/// Keyword groups in click preference order: accepting is tried before
/// closing, rejecting and managing.
const KEYWORD_GROUPS: &[&[&str]] = &[
    &[
        "accetta", "accetto", "acconsento", "accept", "agree", "consent", "akzeptieren",
        "accepter", "aceptar",
    ],
    &["continua", "continue", "conferma", "confirm", "got it", "ho capito"],
    &["chiudi", "close", "dismiss", "×"],
    &["rifiuta", "reject", "decline", "nega"],
    &["gestisci", "manage", "preferenze", "preferences", "personalizza"],
];

/// Consent-manager roots seen on the target site and its ad partners.
const CMP_CONTAINERS: &[&str] = &[
    "#onetrust-consent-sdk",
    "#qc-cmp2-container",
    ".qc-cmp2-container",
    "#didomi-host",
    "#CybotCookiebotDialog",
    "#iubenda-cs-banner",
    "#usercentrics-root",
    ".fc-consent-root",
    "[id^='sp_message_container']",
    "#cmpbox",
    "#cmpwrapper",
    ".cookie-banner",
    "#cookie-banner",
];

fn keyword_sets() -> &'static Vec<TokenSet> {
    static SETS: OnceLock<Vec<TokenSet>> = OnceLock::new();
    SETS.get_or_init(|| KEYWORD_GROUPS.iter().map(|g| TokenSet::new(g)).collect())
}

/// Preference rank of a control label; `None` when it is not a consent control.
pub fn consent_rank(label: &str) -> Option<usize> {
    let label = label.trim();
    if label.is_empty() || label.chars().count() > MAX_LABEL_CHARS {
        return None;
    }
    // "ok" only as the whole label; as a substring it hits "Facebook" and friends.
    if label.eq_ignore_ascii_case("ok") {
        return Some(1);
    }
    keyword_sets().iter().position(|set| set.is_match(label))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsentReport {
    pub attempts: u32,
    pub clicked: u32,
    pub removed: u32,
    /// The last attempt found nothing left to do.
    pub clean: bool,
}

/// Click the best-ranked visible consent control. Interaction errors
/// (stale node, navigation in flight) just mean "nothing clicked".
async fn click_phase(page: &Page) -> bool {
    let Ok(controls) = page.find_elements(CLICKABLE_CSS).await else {
        return false;
    };
    let mut best: Option<(usize, usize)> = None;
    for (idx, control) in controls.iter().enumerate() {
        let Ok(Some(text)) = control.inner_text().await else {
            continue;
        };
        if let Some(rank) = consent_rank(&text) {
            if best.map_or(true, |(r, _)| rank < r) {
                best = Some((rank, idx));
            }
        }
    }
    let Some((_, idx)) = best else {
        return false;
    };
    match controls[idx].click().await {
        Ok(_) => {
            debug!("consent: clicked control #{}", idx);
            true
        }
        Err(e) => {
            debug!("consent: click failed: {}", e);
            false
        }
    }
}

fn removal_script() -> String {
    let selectors = serde_json::to_string(CMP_CONTAINERS).unwrap_or_else(|_| "[]".to_string());
    format!(
        r#"(() => {{
            let removed = 0;
            for (const sel of {selectors}) {{
                for (const el of document.querySelectorAll(sel)) {{
                    const style = window.getComputedStyle(el);
                    if (!style || style.display === 'none' || style.visibility === 'hidden') continue;
                    try {{ el.remove(); removed++; }} catch (_) {{}}
                }}
            }}
            if (removed > 0) {{
                document.body?.style?.setProperty('overflow', 'visible', 'important');
                document.documentElement?.style?.setProperty('overflow', 'visible', 'important');
            }}
            return removed;
        }})()"#
    )
}

async fn removal_phase(page: &Page) -> u32 {
    match page.evaluate(removal_script()).await {
        Ok(v) => v.into_value::<u32>().unwrap_or(0),
        Err(e) => {
            debug!("consent: removal script failed: {}", e);
            0
        }
    }
}

/// Dismiss consent overlays on the current page. Never fails.
pub async fn resolve_popups(page: &Page) -> ConsentReport {
    let clicked = AtomicU32::new(0);
    let removed = AtomicU32::new(0);

    let outcome = retry(MAX_ATTEMPTS, |_| {
        let (clicked, removed) = (&clicked, &removed);
        async move {
            if click_phase(page).await {
                clicked.fetch_add(1, Ordering::Relaxed);
                return None;
            }
            let n = removal_phase(page).await;
            if n > 0 {
                removed.fetch_add(n, Ordering::Relaxed);
                return None;
            }
            Some(())
        }
    })
    .await;

    let report = ConsentReport {
        attempts: outcome.attempts(),
        clicked: clicked.load(Ordering::Relaxed),
        removed: removed.load(Ordering::Relaxed),
        clean: matches!(outcome, RetryOutcome::Success { .. }),
    };
    if report.clicked > 0 || report.removed > 0 {
        info!(
            "consent: clicked={} removed={} in {} attempts",
            report.clicked, report.removed, report.attempts
        );
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accept_outranks_close_and_manage() {
        let accept = consent_rank("Accetta tutti").unwrap();
        let close = consent_rank("Chiudi").unwrap();
        let manage = consent_rank("Gestisci opzioni").unwrap();
        assert!(accept < close);
        assert!(close < manage);
        assert_eq!(consent_rank("OK"), Some(1));
        assert_eq!(consent_rank("Facebook"), None);
    }

    #[test]
    fn unrelated_or_long_labels_are_ignored() {
        assert_eq!(consent_rank("Classifica"), None);
        assert_eq!(consent_rank(""), None);
        assert_eq!(
            consent_rank("Accetta le condizioni del regolamento della lega prima di iniziare"),
            None
        );
    }

    #[test]
    fn removal_script_lists_every_container() {
        let script = removal_script();
        for sel in CMP_CONTAINERS {
            assert!(script.contains(&sel.replace('"', "\\\"")), "missing {sel}");
        }
    }
}

//! Tournament discovery and scraping-URL construction.
//!
//! Classic leagues list their competitions on a dedicated sub-page; Mantra
//! leagues expose them in a dropdown on the league home page. Both parsers
//! are pure functions over a DOM snapshot, wrapped in a bounded retry because
//! the lists are often rendered after the first paint.

use super::consent::resolve_popups;
use super::session::{ScoutSession, SessionContext};
use crate::core::error::{ScoutError, ScoutResult};
use crate::core::retry::{retry, RetryOutcome};
use crate::core::types::{DiscoverySource, LeagueVariant, TournamentDescriptor};
use crate::extract::table::{element_text, select_doc};
use scraper::{ElementRef, Html};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

const COMPETITION_LIST_PATH: &str = "lista-competizioni";
const COMPETITION_ANCHOR_CSS: &str = "a.competition-name";
const DETAIL_PATH_MARKER: &str = "competizione";
const DROPDOWN_CSS: &[&str] = &[
    "#competition-dropdown",
    ".competition-dropdown",
    ".competitions-dropdown",
    "ul.competitions",
    ".dropdown-menu",
];

/// Links that live next to competitions but are not competitions.
const EXCLUDED_LINK_WORDS: &[&str] = &[
    "impostazioni", "settings", "modifica", "edit", "elimina", "delete", "crea", "create", "nuova",
    "regolamento", "calendario", "gestisci",
];
const EXCLUDED_DROPDOWN_LABELS: &[&str] = &[
    "tutte", "tutte le competizioni", "gestisci competizioni", "crea competizione",
    "nuova competizione", "all",
];

const DISCOVERY_ATTEMPTS: u32 = 3;
const DISCOVERY_PAUSE: Duration = Duration::from_millis(1000);

// ── Scraping URLs ────────────────────────────────────────────────────────────

/// The three data pages of a league, optionally pinned to a tournament.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeUrls {
    pub roster: String,
    pub standings: String,
    pub lineups: String,
    tournament_id: Option<String>,
    base: Url,
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

fn league_page(base: &Url, sub_path: &str, tournament_id: Option<&str>) -> String {
    let mut url = base.clone();
    let path = format!("{}/{}", base.path().trim_end_matches('/'), sub_path);
    url.set_path(&path);
    if let Some(id) = tournament_id {
        url.query_pairs_mut().append_pair("id", id);
    }
    url.to_string()
}

impl ScrapeUrls {
    /// Deterministic rewrite of `<base>/rose`, `<base>/classifica` and
    /// `<base>/formazioni`, each suffixed `?id=<tournament>` when one is set.
    pub fn build(league_url: &str, tournament_id: Option<&str>) -> ScoutResult<Self> {
        let mut base = Url::parse(league_url.trim())
            .map_err(|e| ScoutError::Config(format!("league url '{}': {}", league_url, e)))?;
        base.set_query(None);
        base.set_fragment(None);
        let tournament_id = match tournament_id.map(str::trim) {
            Some(id) if is_digits(id) => Some(id.to_string()),
            Some(id) => {
                return Err(ScoutError::Config(format!(
                    "tournament id '{}' is not numeric",
                    id
                )))
            }
            None => None,
        };
        let id = tournament_id.as_deref();
        Ok(Self {
            roster: league_page(&base, "rose", id),
            standings: league_page(&base, "classifica", id),
            lineups: league_page(&base, "formazioni", id),
            tournament_id,
            base,
        })
    }

    /// Lineups page for a given matchday (`formazioni/<n>`), keeping the
    /// tournament suffix.
    pub fn lineups_for(&self, matchday: Option<u32>) -> String {
        match matchday {
            Some(n) => league_page(
                &self.base,
                &format!("formazioni/{}", n),
                self.tournament_id.as_deref(),
            ),
            None => self.lineups.clone(),
        }
    }

    pub fn competition_list(&self) -> String {
        league_page(&self.base, COMPETITION_LIST_PATH, None)
    }
}

// ── Parsing ──────────────────────────────────────────────────────────────────

/// Numeric id of a competition link: an `id` query parameter or the last
/// all-digit path segment.
pub fn id_from_href(href: &str) -> Option<String> {
    let anchor_base = Url::parse("https://league.invalid/").ok()?;
    let url = anchor_base.join(href.trim()).ok()?;
    if let Some((_, v)) = url.query_pairs().find(|(k, _)| k == "id") {
        if is_digits(&v) {
            return Some(v.into_owned());
        }
    }
    url.path_segments()?
        .rev()
        .find(|seg| is_digits(seg))
        .map(str::to_string)
}

fn display_name(el: ElementRef<'_>, id: &str) -> String {
    let text = element_text(el);
    if text.is_empty() {
        format!("Competizione {}", id)
    } else {
        text
    }
}

fn has_excluded_word(text: &str) -> bool {
    let lower = text.to_lowercase();
    EXCLUDED_LINK_WORDS.iter().any(|w| lower.contains(w))
}

/// First-seen order, one entry per id.
pub fn dedupe_by_id(found: Vec<TournamentDescriptor>) -> Vec<TournamentDescriptor> {
    let mut seen = HashSet::new();
    found
        .into_iter()
        .filter(|t| seen.insert(t.id.clone()))
        .collect()
}

/// Classic layout: `a.competition-name` anchors, falling back to any link
/// into a competition detail page.
pub fn parse_competition_list(doc: &Html) -> Vec<TournamentDescriptor> {
    let primary: Vec<TournamentDescriptor> = select_doc(doc, COMPETITION_ANCHOR_CSS)
        .into_iter()
        .filter_map(|a| {
            let id = id_from_href(a.value().attr("href")?)?;
            Some(TournamentDescriptor {
                display_name: display_name(a, &id),
                id,
                source: DiscoverySource::CompetitionAnchor,
            })
        })
        .collect();
    if !primary.is_empty() {
        return dedupe_by_id(primary);
    }

    let fallback = select_doc(doc, "a[href]")
        .into_iter()
        .filter_map(|a| {
            let href = a.value().attr("href")?;
            if !href.to_lowercase().contains(DETAIL_PATH_MARKER) || has_excluded_word(href) {
                return None;
            }
            let text = element_text(a);
            if has_excluded_word(&text) {
                return None;
            }
            let id = id_from_href(href)?;
            Some(TournamentDescriptor {
                display_name: display_name(a, &id),
                id,
                source: DiscoverySource::DetailLinkScan,
            })
        })
        .collect();
    dedupe_by_id(fallback)
}

/// Mantra layout: the direct `li > a` children of the competition dropdown,
/// with `href="#"` and a numeric `data-id`.
pub fn parse_home_dropdown(doc: &Html) -> Vec<TournamentDescriptor> {
    let Some(container) = DROPDOWN_CSS
        .iter()
        .find_map(|css| select_doc(doc, css).into_iter().next())
    else {
        return Vec::new();
    };
    let anchors = container
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|li| li.value().name() == "li")
        .flat_map(|li| {
            li.children()
                .filter_map(ElementRef::wrap)
                .filter(|a| a.value().name() == "a")
                .collect::<Vec<_>>()
        });
    let found = anchors
        .filter_map(|a| {
            if a.value().attr("href").map(str::trim) != Some("#") {
                return None;
            }
            let id = a.value().attr("data-id").map(str::trim)?;
            if !is_digits(id) {
                return None;
            }
            let label = element_text(a);
            if EXCLUDED_DROPDOWN_LABELS.contains(&label.to_lowercase().as_str()) {
                return None;
            }
            Some(TournamentDescriptor {
                display_name: display_name(a, id),
                id: id.to_string(),
                source: DiscoverySource::HomeDropdown,
            })
        })
        .collect();
    dedupe_by_id(found)
}

pub fn parse_tournaments(html: &str, variant: LeagueVariant) -> Vec<TournamentDescriptor> {
    let doc = Html::parse_document(html);
    match variant {
        LeagueVariant::Classic => parse_competition_list(&doc),
        LeagueVariant::Mantra => parse_home_dropdown(&doc),
    }
}

// ── Discovery ────────────────────────────────────────────────────────────────

/// Tournaments available to the current league, in page order. An empty list
/// means none could be found within the attempt budget.
pub async fn discover_tournaments(
    session: &ScoutSession,
    ctx: &SessionContext,
) -> ScoutResult<Vec<TournamentDescriptor>> {
    let timeouts = &session.config().timeouts;
    let target = match ctx.variant {
        LeagueVariant::Classic => ScrapeUrls::build(&ctx.league_url_base, None)?.competition_list(),
        LeagueVariant::Mantra => ctx.league_url_base.clone(),
    };
    session.navigate(&target, timeouts.short_navigation()).await?;
    resolve_popups(session.page()?).await;

    let outcome = retry(DISCOVERY_ATTEMPTS, |attempt| async move {
        if attempt > 1 {
            tokio::time::sleep(DISCOVERY_PAUSE).await;
        }
        let html = session.snapshot_html().await.ok()?;
        let found = parse_tournaments(&html, ctx.variant);
        (!found.is_empty()).then_some(found)
    })
    .await;

    match outcome {
        RetryOutcome::Success { value, attempts } => {
            info!(
                "tournament: {} found ({} layout, attempt {})",
                value.len(),
                ctx.variant.as_str(),
                attempts
            );
            Ok(value)
        }
        RetryOutcome::ExhaustedRetries { attempts } => {
            warn!("tournament: none found after {} attempts", attempts);
            Ok(Vec::new())
        }
    }
}

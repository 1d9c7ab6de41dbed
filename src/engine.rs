//! The run pipeline: `init → login → [select tournament] → scrape → save → close`.

use crate::core::config::ScoutConfig;
use crate::core::error::{ScoutError, ScoutResult};
use crate::core::types::{KindOutcome, RunReport, ScrapeRequest};
use crate::extract::{extract_lineups, extract_rosters, extract_standings, PageSnapshot};
use crate::persistence::{PersistenceOrchestrator, SnapshotKind, SnapshotStore};
use crate::scraping::auth::{try_login, AuthState};
use crate::scraping::consent::resolve_popups;
use crate::scraping::session::{ScoutSession, SessionContext};
use crate::scraping::tournament::discover_tournaments;
use std::time::Instant;
use tracing::{info, warn};

/// League context for a request: an explicit variant wins over URL detection.
pub fn context_for(request: &ScrapeRequest, mantra_markers: &[String]) -> SessionContext {
    match request.league_variant {
        Some(variant) => SessionContext::new(&request.league_url, variant),
        None => SessionContext::detected(&request.league_url, mantra_markers),
    }
}

pub struct ScoutEngine<S> {
    config: ScoutConfig,
    persistence: PersistenceOrchestrator<S>,
}

impl<S: SnapshotStore> ScoutEngine<S> {
    pub fn new(config: ScoutConfig, store: S) -> Self {
        Self {
            config,
            persistence: PersistenceOrchestrator::new(store),
        }
    }

    pub fn persistence(&self) -> &PersistenceOrchestrator<S> {
        &self.persistence
    }

    /// One complete extraction run with its own browser session. The session
    /// is closed whatever the outcome.
    pub async fn run(&self, request: &ScrapeRequest) -> ScoutResult<RunReport> {
        let started = Instant::now();
        info!(
            "engine: run for league {} ({})",
            request.league_id, request.league_url
        );
        let mut session = ScoutSession::new(self.config.clone());
        let result = match session.try_init().await {
            Ok(()) => self.run_in(&session, request, started).await,
            Err(e) => Err(e),
        };
        session.close().await;

        match &result {
            Ok(report) => info!("engine: league {} done in {}ms", report.league_id, report.elapsed_ms),
            Err(e) => warn!("engine: league {} failed: {}", request.league_id, e),
        }
        result
    }

    async fn run_in(
        &self,
        session: &ScoutSession,
        request: &ScrapeRequest,
        started: Instant,
    ) -> ScoutResult<RunReport> {
        let mut ctx = context_for(request, &self.config.site.mantra_markers());
        let league_home = ctx.league_url_base.clone();

        match try_login(session, &ctx, &request.credentials, Some(&league_home)).await? {
            AuthState::Authenticated => {}
            AuthState::Failed(reason) => {
                session.capture_screenshot("login-failed").await;
                return Err(ScoutError::Authentication(reason));
            }
            other => return Err(ScoutError::Authentication(format!("ended in {:?}", other))),
        }

        let tournament = match request
            .tournament_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
        {
            Some(id) => Some(id.to_string()),
            None => match discover_tournaments(session, &ctx).await {
                Ok(found) => found.into_iter().next().map(|t| t.id),
                Err(e) => {
                    warn!("engine: tournament discovery failed: {}", e);
                    None
                }
            },
        };
        let urls = match tournament.as_deref() {
            Some(id) => ctx.try_select_tournament(id)?,
            None => ctx.urls()?,
        };

        let allow_empty = self.config.storage.resolve_allow_empty_snapshot();
        let variant = ctx.variant;
        let league_id = request.league_id;

        let html = self.fetch_page(session, &urls.roster).await?;
        let teams = extract_rosters(&PageSnapshot::parse(&html, variant));
        let roster = if skip_save(SnapshotKind::Roster, teams.len(), allow_empty) {
            KindOutcome::SkippedEmpty
        } else {
            self.persistence.save_roster(league_id, &teams).await?.into()
        };

        let html = self.fetch_page(session, &urls.standings).await?;
        let rows = extract_standings(&PageSnapshot::parse(&html, variant));
        let standings = if skip_save(SnapshotKind::Standings, rows.len(), allow_empty) {
            KindOutcome::SkippedEmpty
        } else {
            self.persistence.save_standings(league_id, &rows).await?.into()
        };

        let html = self
            .fetch_page(session, &urls.lineups_for(request.matchday))
            .await?;
        let sides =
            extract_lineups(&PageSnapshot::parse(&html, variant).with_matchday(request.matchday));
        let lineups = if skip_save(SnapshotKind::Lineups, sides.len(), allow_empty) {
            KindOutcome::SkippedEmpty
        } else {
            self.persistence.save_lineups(league_id, &sides).await?.into()
        };

        Ok(RunReport {
            league_id,
            variant,
            tournament_id: ctx.selected_tournament.clone(),
            roster,
            standings,
            lineups,
            elapsed_ms: started.elapsed().as_millis(),
        })
    }

    async fn fetch_page(&self, session: &ScoutSession, url: &str) -> ScoutResult<String> {
        session.navigate(url, self.config.timeouts.navigation()).await?;
        resolve_popups(session.page()?).await;
        session.snapshot_html().await
    }
}

/// An empty extraction wipes the stored snapshot unless the caller opted
/// out through `storage.allow_empty_snapshot = false`.
fn skip_save(kind: SnapshotKind, extracted: usize, allow_empty: bool) -> bool {
    if extracted > 0 || allow_empty {
        return false;
    }
    warn!(
        "engine: {} extraction came back empty; keeping the previous snapshot",
        kind.as_str()
    );
    true
}

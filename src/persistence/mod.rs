//! Snapshot persistence.
//!
//! Every save is a full replace scoped to one league and one data kind:
//! delete all previous rows, then insert the incoming records. The statements
//! are not wrapped in a transaction, so a failure halfway leaves a partial
//! snapshot behind and the error goes to the caller.

pub mod sqlite;

use crate::core::error::ScoutResult;
use crate::core::types::{KindOutcome, MatchSideSnapshot, RosterEntry, StandingsRow, TeamSnapshot};
use async_trait::async_trait;
use tracing::info;

pub use sqlite::SqliteStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotKind {
    Roster,
    Standings,
    Lineups,
}

impl SnapshotKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotKind::Roster => "roster",
            SnapshotKind::Standings => "standings",
            SnapshotKind::Lineups => "lineups",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveCounts {
    pub deleted: usize,
    pub inserted: usize,
}

impl From<SaveCounts> for KindOutcome {
    fn from(counts: SaveCounts) -> Self {
        KindOutcome::Saved {
            deleted: counts.deleted,
            inserted: counts.inserted,
        }
    }
}

/// Row-level primitives of a snapshot store. The replace algorithm lives in
/// [`PersistenceOrchestrator`], so stores only need to know their tables.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Remove every `kind` row of `league_id`, returning how many went away.
    /// Squad records survive a roster wipe; they are upserted instead.
    async fn delete_snapshot(&self, league_id: i64, kind: SnapshotKind) -> ScoutResult<usize>;

    /// Drop squads of `league_id` that no stored player refers to.
    async fn prune_squads(&self, league_id: i64) -> ScoutResult<usize>;

    /// Insert or refresh the squad keyed by `(league_id, name)` and return its id.
    async fn upsert_squad(&self, league_id: i64, name: &str) -> ScoutResult<i64>;

    async fn insert_player(
        &self,
        league_id: i64,
        squad_id: i64,
        order: usize,
        entry: &RosterEntry,
    ) -> ScoutResult<()>;

    async fn insert_standing(&self, league_id: i64, row: &StandingsRow) -> ScoutResult<()>;

    async fn insert_lineup(&self, league_id: i64, side: &MatchSideSnapshot) -> ScoutResult<()>;

    async fn count_rows(&self, league_id: i64, kind: SnapshotKind) -> ScoutResult<usize>;
}

/// Sole writer of the snapshot tables.
pub struct PersistenceOrchestrator<S> {
    store: S,
}

impl<S: SnapshotStore> PersistenceOrchestrator<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Replace the roster snapshot. Squads are upserted before their players
    /// so repeated runs never duplicate them; squads left without players
    /// afterwards are removed.
    pub async fn save_roster(&self, league_id: i64, teams: &[TeamSnapshot]) -> ScoutResult<SaveCounts> {
        let deleted = self.store.delete_snapshot(league_id, SnapshotKind::Roster).await?;
        let mut inserted = 0;
        for team in teams {
            let squad_id = self.store.upsert_squad(league_id, &team.team_name).await?;
            for (order, entry) in team.entries.iter().enumerate() {
                self.store.insert_player(league_id, squad_id, order, entry).await?;
                inserted += 1;
            }
        }
        let pruned = self.store.prune_squads(league_id).await?;
        if pruned > 0 {
            info!("persistence: league {} dropped {} stale squads", league_id, pruned);
        }
        Ok(self.report(league_id, SnapshotKind::Roster, deleted, inserted))
    }

    /// Replace the standings snapshot. An empty `rows` still wipes.
    pub async fn save_standings(&self, league_id: i64, rows: &[StandingsRow]) -> ScoutResult<SaveCounts> {
        let deleted = self.store.delete_snapshot(league_id, SnapshotKind::Standings).await?;
        for row in rows {
            self.store.insert_standing(league_id, row).await?;
        }
        Ok(self.report(league_id, SnapshotKind::Standings, deleted, rows.len()))
    }

    pub async fn save_lineups(&self, league_id: i64, sides: &[MatchSideSnapshot]) -> ScoutResult<SaveCounts> {
        let deleted = self.store.delete_snapshot(league_id, SnapshotKind::Lineups).await?;
        for side in sides {
            self.store.insert_lineup(league_id, side).await?;
        }
        Ok(self.report(league_id, SnapshotKind::Lineups, deleted, sides.len()))
    }

    fn report(&self, league_id: i64, kind: SnapshotKind, deleted: usize, inserted: usize) -> SaveCounts {
        info!(
            "persistence: league {} {} replaced ({} deleted, {} inserted)",
            league_id,
            kind.as_str(),
            deleted,
            inserted
        );
        SaveCounts { deleted, inserted }
    }
}

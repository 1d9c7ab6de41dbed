use super::{SnapshotKind, SnapshotStore};
use crate::core::error::{ScoutError, ScoutResult};
use crate::core::types::{MatchSideSnapshot, RosterEntry, StandingsRow};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection};
use serde::Serialize;
use std::path::Path;
use tokio::sync::Mutex;
use tracing::debug;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS squadre_scraping (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    lega_id INTEGER NOT NULL,
    nome TEXT NOT NULL,
    aggiornato_il TEXT NOT NULL,
    UNIQUE (lega_id, nome)
);

CREATE TABLE IF NOT EXISTS giocatori_scraping (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    lega_id INTEGER NOT NULL,
    squadra_id INTEGER NOT NULL REFERENCES squadre_scraping(id),
    nome TEXT NOT NULL,
    ruolo TEXT NOT NULL,
    squadra_reale TEXT NOT NULL,
    quotazione REAL NOT NULL,
    qi REAL NOT NULL,
    fv_mp TEXT NOT NULL,
    ordine INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_giocatori_lega ON giocatori_scraping(lega_id);

CREATE TABLE IF NOT EXISTS classifica_scraping (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    lega_id INTEGER NOT NULL,
    posizione INTEGER NOT NULL,
    squadra TEXT NOT NULL,
    punti INTEGER NOT NULL,
    partite INTEGER NOT NULL,
    vittorie INTEGER NOT NULL,
    pareggi INTEGER NOT NULL,
    sconfitte INTEGER NOT NULL,
    gol_fatti INTEGER NOT NULL,
    gol_subiti INTEGER NOT NULL,
    differenza_reti INTEGER NOT NULL,
    punti_totali REAL NOT NULL,
    extra_json TEXT
);
CREATE INDEX IF NOT EXISTS idx_classifica_lega ON classifica_scraping(lega_id);

CREATE TABLE IF NOT EXISTS formazioni_scraping (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    lega_id INTEGER NOT NULL,
    giornata INTEGER,
    squadra TEXT NOT NULL,
    lato TEXT NOT NULL,
    modulo TEXT NOT NULL,
    titolari_json TEXT NOT NULL,
    panchina_json TEXT NOT NULL,
    altri_punteggi_json TEXT NOT NULL,
    totale_label TEXT,
    totale_valore TEXT
);
CREATE INDEX IF NOT EXISTS idx_formazioni_lega ON formazioni_scraping(lega_id);
"#;

fn table_for(kind: SnapshotKind) -> &'static str {
    match kind {
        SnapshotKind::Roster => "giocatori_scraping",
        SnapshotKind::Standings => "classifica_scraping",
        SnapshotKind::Lineups => "formazioni_scraping",
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> rusqlite::Result<String> {
    serde_json::to_string(value).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

/// SQLite-backed snapshot store. One connection, serialised by a mutex.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database file, creating parent directories.
    pub fn open(path: &Path) -> ScoutResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                ScoutError::Config(format!("database directory {}: {}", parent.display(), e))
            })?;
        }
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL").ok();
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> ScoutResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> ScoutResult<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Number of squad records kept for `league_id`.
    pub async fn squad_count(&self, league_id: i64) -> ScoutResult<usize> {
        let conn = self.conn.lock().await;
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM squadre_scraping WHERE lega_id = ?1",
            params![league_id],
            |row| row.get(0),
        )?;
        Ok(n as usize)
    }

    /// Player names of `league_id` in stored order, grouped by squad name.
    pub async fn players(&self, league_id: i64) -> ScoutResult<Vec<(String, String, String)>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT s.nome, g.nome, g.ruolo
             FROM giocatori_scraping g JOIN squadre_scraping s ON s.id = g.squadra_id
             WHERE g.lega_id = ?1
             ORDER BY s.nome, g.ordine",
        )?;
        let rows = stmt
            .query_map(params![league_id], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

#[async_trait]
impl SnapshotStore for SqliteStore {
    async fn delete_snapshot(&self, league_id: i64, kind: SnapshotKind) -> ScoutResult<usize> {
        let conn = self.conn.lock().await;
        let sql = format!("DELETE FROM {} WHERE lega_id = ?1", table_for(kind));
        let deleted = conn.execute(&sql, params![league_id])?;
        debug!("sqlite: {} {} rows deleted", deleted, table_for(kind));
        Ok(deleted)
    }

    async fn prune_squads(&self, league_id: i64) -> ScoutResult<usize> {
        let conn = self.conn.lock().await;
        let pruned = conn.execute(
            "DELETE FROM squadre_scraping WHERE lega_id = ?1 AND id NOT IN
             (SELECT squadra_id FROM giocatori_scraping WHERE lega_id = ?1)",
            params![league_id],
        )?;
        debug!("sqlite: {} squadre_scraping rows pruned", pruned);
        Ok(pruned)
    }

    async fn upsert_squad(&self, league_id: i64, name: &str) -> ScoutResult<i64> {
        let conn = self.conn.lock().await;
        let id = conn.query_row(
            "INSERT INTO squadre_scraping (lega_id, nome, aggiornato_il) VALUES (?1, ?2, ?3)
             ON CONFLICT(lega_id, nome) DO UPDATE SET aggiornato_il = excluded.aggiornato_il
             RETURNING id",
            params![league_id, name, Utc::now().to_rfc3339()],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    async fn insert_player(
        &self,
        league_id: i64,
        squad_id: i64,
        order: usize,
        entry: &RosterEntry,
    ) -> ScoutResult<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO giocatori_scraping
             (lega_id, squadra_id, nome, ruolo, squadra_reale, quotazione, qi, fv_mp, ordine)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                league_id,
                squad_id,
                entry.player_name,
                entry.role_code,
                entry.real_club,
                entry.auction_value,
                entry.quality_index,
                entry.form_value,
                order as i64,
            ],
        )?;
        Ok(())
    }

    async fn insert_standing(&self, league_id: i64, row: &StandingsRow) -> ScoutResult<()> {
        let extras = if row.extras.is_empty() {
            None
        } else {
            Some(to_json(&row.extras)?)
        };
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO classifica_scraping
             (lega_id, posizione, squadra, punti, partite, vittorie, pareggi, sconfitte,
              gol_fatti, gol_subiti, differenza_reti, punti_totali, extra_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                league_id,
                row.position,
                row.team_name,
                row.points,
                row.played,
                row.wins,
                row.draws,
                row.losses,
                row.goals_for,
                row.goals_against,
                row.goal_difference,
                row.total_points,
                extras,
            ],
        )?;
        Ok(())
    }

    async fn insert_lineup(&self, league_id: i64, side: &MatchSideSnapshot) -> ScoutResult<()> {
        let starters = to_json(&side.starters)?;
        let bench = to_json(&side.bench)?;
        let others = to_json(&side.other_scores)?;
        let (total_label, total_value) = match &side.total {
            Some(t) => (Some(t.label.as_str()), Some(t.value.as_str())),
            None => (None, None),
        };
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO formazioni_scraping
             (lega_id, giornata, squadra, lato, modulo, titolari_json, panchina_json,
              altri_punteggi_json, totale_label, totale_valore)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                league_id,
                side.matchday,
                side.team_name,
                side.side.as_str(),
                side.formation,
                starters,
                bench,
                others,
                total_label,
                total_value,
            ],
        )?;
        Ok(())
    }

    async fn count_rows(&self, league_id: i64, kind: SnapshotKind) -> ScoutResult<usize> {
        let conn = self.conn.lock().await;
        let sql = format!("SELECT COUNT(*) FROM {} WHERE lega_id = ?1", table_for(kind));
        let n: i64 = conn.query_row(&sql, params![league_id], |row| row.get(0))?;
        Ok(n as usize)
    }
}

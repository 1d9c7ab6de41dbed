use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ── League variant ───────────────────────────────────────────────────────────

/// The two supported flavours of the external site.
///
/// They differ in login endpoint, tournament-discovery layout and role
/// vocabulary: `Classic` uses the four-letter P/D/C/A scheme, `Mantra` a richer
/// set of tactical roles (`Por`, `Dc`, `Ds`, `W`, `Pc`, …).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LeagueVariant {
    #[default]
    #[serde(alias = "a", alias = "A")]
    Classic,
    #[serde(alias = "b", alias = "B")]
    Mantra,
}

impl LeagueVariant {
    pub fn parse_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "a" | "classic" | "classica" => Some(LeagueVariant::Classic),
            "b" | "mantra" => Some(LeagueVariant::Mantra),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LeagueVariant::Classic => "classic",
            LeagueVariant::Mantra => "mantra",
        }
    }
}

// ── Credentials ──────────────────────────────────────────────────────────────

/// Login credentials. Only ever forwarded to the login form.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

// ── Tournaments ──────────────────────────────────────────────────────────────

/// Which discovery strategy found a tournament.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoverySource {
    CompetitionAnchor,
    DetailLinkScan,
    HomeDropdown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentDescriptor {
    /// Digits only.
    pub id: String,
    pub display_name: String,
    pub source: DiscoverySource,
}

// ── Rosters ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    #[serde(rename = "nome")]
    pub player_name: String,
    #[serde(rename = "ruolo")]
    pub role_code: String,
    #[serde(rename = "squadra")]
    pub real_club: String,
    #[serde(rename = "quotazione")]
    pub auction_value: f64,
    #[serde(rename = "qi")]
    pub quality_index: f64,
    #[serde(rename = "fvMp")]
    pub form_value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSnapshot {
    pub team_name: String,
    /// Ordered goalkeepers → defenders → midfielders → attackers.
    pub entries: Vec<RosterEntry>,
}

// ── Standings ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StandingsRow {
    /// 1-based, positive.
    pub position: u32,
    #[serde(rename = "squadra")]
    pub team_name: String,
    #[serde(rename = "punti")]
    pub points: i64,
    #[serde(rename = "partite")]
    pub played: i64,
    #[serde(rename = "vittorie")]
    pub wins: i64,
    #[serde(rename = "pareggi")]
    pub draws: i64,
    #[serde(rename = "sconfitte")]
    pub losses: i64,
    #[serde(rename = "golFatti")]
    pub goals_for: i64,
    #[serde(rename = "golSubiti")]
    pub goals_against: i64,
    #[serde(rename = "differenzaReti")]
    pub goal_difference: i64,
    #[serde(rename = "puntiTotali")]
    pub total_points: f64,
    /// Cells the header-label strategy could not map, keyed `extra_1`, `extra_2`, …
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extras: BTreeMap<String, String>,
}

// ── Lineups ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Home,
    Away,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Home => "home",
            Side::Away => "away",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineupEntry {
    pub role_code: String,
    pub player_name: String,
    /// Three-letter bonus/malus tags, one per icon.
    pub bonus_codes: Vec<String>,
    pub raw_score: Option<f64>,
    pub fantasy_score: Option<f64>,
    pub was_on_pitch: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreLine {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSideSnapshot {
    pub team_name: String,
    /// e.g. "4-3-3"; empty when no formation was printed.
    pub formation: String,
    pub matchday: Option<u32>,
    pub side: Side,
    pub starters: Vec<LineupEntry>,
    pub bench: Vec<LineupEntry>,
    pub other_scores: Vec<ScoreLine>,
    pub total: Option<ScoreLine>,
}

// ── Run inputs / outputs ─────────────────────────────────────────────────────

/// What the application layer hands the engine for one run.
#[derive(Debug, Clone, Deserialize)]
pub struct ScrapeRequest {
    pub league_id: i64,
    pub league_url: String,
    #[serde(default)]
    pub league_variant: Option<LeagueVariant>,
    pub credentials: Credentials,
    #[serde(default)]
    pub tournament_id: Option<String>,
    #[serde(default)]
    pub matchday: Option<u32>,
}

/// Outcome for one data kind within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum KindOutcome {
    Saved { deleted: usize, inserted: usize },
    SkippedEmpty,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub league_id: i64,
    pub variant: LeagueVariant,
    pub tournament_id: Option<String>,
    pub roster: KindOutcome,
    pub standings: KindOutcome,
    pub lineups: KindOutcome,
    pub elapsed_ms: u128,
}

//! Roster extraction: every team's squad on the league's `rose` page.
//!
//! Tables are classified by their header vocabulary instead of by id/class,
//! and the owning team is resolved from the nearest preceding heading.

use super::table::{
    all_tables, element_ancestors, element_text, has_class_hint, read_table, select_doc, selector,
    Row, TableView, TokenSet,
};
use super::PageSnapshot;
use crate::core::retry::StrategyChain;
use crate::core::types::{RosterEntry, TeamSnapshot};
use crate::normalize::{
    clean_text, decimal_or, decimal_text_or, is_numeric, normalize_name, normalize_role, role_rank,
};
use scraper::ElementRef;
use std::collections::HashSet;
use std::sync::OnceLock;
use tracing::{debug, info};

const HEADING_CSS: &str =
    "h1, h2, h3, h4, h5, h6, caption, .team-name, .media-heading, .card-title, .panel-title";

/// Headings that label page sections rather than teams.
const NON_TEAM_LABELS: &[&str] = &[
    "rose", "rosa", "rose squadre", "classifica", "formazioni", "calendario", "mercato", "lega",
    "menu", "home", "giocatori", "statistiche", "squadre", "impostazioni", "news", "competizioni",
    "login", "accedi", "partecipanti",
];

/// Header cell texts that mark the header row of a roster table.
const HEADER_CELL_LABELS: &[&str] = &[
    "r", "r.", "ruolo", "role", "calciatore", "giocatore", "nome", "player", "squadra", "club",
    "qt", "qt.", "qi", "fvm", "fvmp", "fv", "quotazione", "costo",
];

const MIN_ROW_CELLS: usize = 5;
const DEFAULT_AUCTION_VALUE: f64 = 1.0;
const DEFAULT_QUALITY_INDEX: f64 = 0.0;
const DEFAULT_FORM_VALUE: &str = "0";
const HEADING_SEARCH_DEPTH: usize = 5;

fn roster_vocabulary() -> &'static TokenSet {
    static SET: OnceLock<TokenSet> = OnceLock::new();
    SET.get_or_init(|| {
        TokenSet::new(&[
            "ruolo", "calciatore", "giocatore", "nome", "quotaz", "costo", "prezzo", "fvm",
            "fantamedia", "club", "role", "player",
        ])
    })
}

fn standings_vocabulary() -> &'static TokenSet {
    static SET: OnceLock<TokenSet> = OnceLock::new();
    SET.get_or_init(|| {
        TokenSet::new(&[
            "classifica", "punti", "vittorie", "pareggi", "sconfitte", "posizione", "gol fatti",
        ])
    })
}

const ROSTER_SHORT_TOKENS: &[&str] = &["r", "r.", "qt", "qt.", "qi", "fvmp", "fv", "fvm/mp"];
const STANDINGS_SHORT_TOKENS: &[&str] =
    &["pos", "pos.", "g", "v", "n", "g+", "g-", "dr", "pt", "pt.", "pt tot", "pti"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Roster,
    Standings,
    Other,
}

fn short_token_hits(row: Option<&Row>, tokens: &[&str]) -> usize {
    row.map(|r| {
        r.cells
            .iter()
            .filter(|c| tokens.contains(&c.text.to_lowercase().as_str()))
            .count()
    })
    .unwrap_or(0)
}

/// Rows that may carry the column labels: a `<th>`/`<thead>` row, plus the
/// first few rows of tables that open with a caption row or use `<td>` labels.
const HEADER_SCAN_ROWS: usize = 3;

/// `(roster, standings)` vocabulary hits of one candidate header row.
fn vocabulary_hits(row: &Row) -> (usize, usize) {
    let text = row.texts().join(" ").to_lowercase();
    let roster =
        roster_vocabulary().distinct_hits(&text) + short_token_hits(Some(row), ROSTER_SHORT_TOKENS);
    let standings = standings_vocabulary().distinct_hits(&text)
        + short_token_hits(Some(row), STANDINGS_SHORT_TOKENS);
    (roster, standings)
}

/// Roster-like when the header speaks of roles/names/clubs/valuations,
/// standings-like when it speaks of positions/points. The best scoring of
/// the header row and the first rows decides.
pub fn classify_table(view: &TableView<'_>) -> TableKind {
    let (roster, standings) = if view.rows.is_empty() {
        let text = view.aggregate_text();
        (
            roster_vocabulary().distinct_hits(&text),
            standings_vocabulary().distinct_hits(&text),
        )
    } else {
        view.rows
            .iter()
            .filter(|r| r.is_header)
            .take(1)
            .chain(view.rows.iter().take(HEADER_SCAN_ROWS))
            .map(vocabulary_hits)
            .max_by_key(|(r, s)| (*r.max(s), *r))
            .unwrap_or((0, 0))
    };
    if roster >= 2 && roster > standings {
        TableKind::Roster
    } else if standings >= 2 {
        TableKind::Standings
    } else {
        TableKind::Other
    }
}

// ── Team-name resolution ─────────────────────────────────────────────────────

fn plausible_team_label(text: &str) -> bool {
    let lower = text.to_lowercase();
    !text.is_empty()
        && text.chars().count() <= 60
        && !NON_TEAM_LABELS.contains(&lower.as_str())
        && !is_numeric(text)
}

/// Nearest heading that precedes `table` in document order, searching up to
/// five ancestor levels.
fn heading_before(table: ElementRef<'_>) -> Option<String> {
    let heading = selector(HEADING_CSS)?;
    for ancestor in element_ancestors(table).take(HEADING_SEARCH_DEPTH) {
        let mut best = None;
        for node in ancestor.descendants() {
            if node.id() == table.id() {
                break;
            }
            let Some(el) = ElementRef::wrap(node) else { continue };
            if heading.matches(&el) {
                let text = element_text(el);
                if plausible_team_label(&text) {
                    best = Some(text);
                }
            }
        }
        if best.is_some() {
            return best;
        }
    }
    None
}

/// Caption-style first rows ("FC Example" spanning the table) name the team.
fn name_from_first_row(view: &TableView<'_>) -> Option<String> {
    let first = view.rows.first()?;
    first
        .cells
        .iter()
        .map(|c| c.text.as_str())
        .find(|t| {
            let len = t.chars().count();
            (2..=40).contains(&len)
                && plausible_team_label(t)
                && !HEADER_CELL_LABELS.contains(&t.to_lowercase().as_str())
        })
        .map(str::to_string)
}

fn resolve_team_name(view: &TableView<'_>) -> Option<String> {
    heading_before(view.element).or_else(|| name_from_first_row(view))
}

// ── Row parsing ──────────────────────────────────────────────────────────────

fn is_header_like(row: &Row) -> bool {
    row.is_header
        || HEADER_CELL_LABELS.contains(&row.cell_text(0).to_lowercase().as_str())
        || HEADER_CELL_LABELS.contains(&row.cell_text(1).to_lowercase().as_str())
}

/// Columns: role, name, form value, real club, quality index, auction value.
/// Missing numeric cells fall back to 1.0 / 0 / "0".
pub fn parse_roster_row(row: &Row, snapshot: &PageSnapshot) -> Option<RosterEntry> {
    if row.cells.len() < MIN_ROW_CELLS || is_header_like(row) {
        return None;
    }
    let role_code = normalize_role(row.cell_text(0), snapshot.variant);
    let player_name = normalize_name(row.cell_text(1));
    if role_code.is_empty() || player_name.is_empty() {
        return None;
    }
    Some(RosterEntry {
        player_name,
        role_code,
        form_value: decimal_text_or(row.cell_text(2), DEFAULT_FORM_VALUE),
        real_club: clean_text(row.cell_text(3)),
        quality_index: decimal_or(row.cell_text(4), DEFAULT_QUALITY_INDEX),
        auction_value: decimal_or(row.cell_text(5), DEFAULT_AUCTION_VALUE),
    })
}

fn parse_entries(view: &TableView<'_>, snapshot: &PageSnapshot) -> Vec<RosterEntry> {
    let mut entries: Vec<RosterEntry> = view
        .rows
        .iter()
        .filter_map(|row| parse_roster_row(row, snapshot))
        .collect();
    sort_by_role(&mut entries);
    entries
}

/// Stable sort goalkeepers → defenders → midfielders → attackers.
pub fn sort_by_role(entries: &mut [RosterEntry]) {
    entries.sort_by_key(|e| role_rank(&e.role_code));
}

/// Appends `entries` to the team called `name`, keeping first-seen team order.
fn push_team(teams: &mut Vec<TeamSnapshot>, name: String, entries: Vec<RosterEntry>) {
    if entries.is_empty() {
        return;
    }
    match teams.iter_mut().find(|t| t.team_name == name) {
        Some(team) => {
            team.entries.extend(entries);
            sort_by_role(&mut team.entries);
        }
        None => teams.push(TeamSnapshot {
            team_name: name,
            entries,
        }),
    }
}

// ── Strategies ───────────────────────────────────────────────────────────────

fn classified_tables(snapshot: &PageSnapshot) -> Option<Vec<TeamSnapshot>> {
    let mut teams = Vec::new();
    for (idx, view) in all_tables(&snapshot.doc).iter().enumerate() {
        if classify_table(view) != TableKind::Roster {
            continue;
        }
        let name = resolve_team_name(view).unwrap_or_else(|| format!("Squadra {}", idx + 1));
        let entries = parse_entries(view, snapshot);
        debug!("roster: table {} → '{}' ({} players)", idx, name, entries.len());
        push_team(&mut teams, name, entries);
    }
    Some(teams)
}

fn team_containers(snapshot: &PageSnapshot) -> Option<Vec<TeamSnapshot>> {
    let mut teams = Vec::new();
    let mut seen = HashSet::new();
    let containers = select_doc(&snapshot.doc, "div, section, article, li")
        .into_iter()
        .filter(|el| has_class_hint(*el, &["squadra", "team", "rosa"]));
    for container in containers {
        let Some(table) = super::table::select_in(container, "table").into_iter().next() else {
            continue;
        };
        if !seen.insert(table.id()) {
            continue;
        }
        let view = read_table(table);
        let name = super::table::select_in(container, HEADING_CSS)
            .into_iter()
            .map(element_text)
            .find(|t| plausible_team_label(t))
            .or_else(|| resolve_team_name(&view))
            .unwrap_or_else(|| format!("Squadra {}", teams.len() + 1));
        push_team(&mut teams, name, parse_entries(&view, snapshot));
    }
    Some(teams)
}

pub fn roster_chain() -> StrategyChain<PageSnapshot, TeamSnapshot> {
    StrategyChain::new("roster")
        .then("classified_tables", classified_tables)
        .then("team_containers", team_containers)
}

/// Extract every team's roster from a captured `rose` page.
pub fn extract_rosters(snapshot: &PageSnapshot) -> Vec<TeamSnapshot> {
    let teams = roster_chain().run_or_empty(snapshot);
    info!(
        "roster: {} teams, {} players",
        teams.len(),
        teams.iter().map(|t| t.entries.len()).sum::<usize>()
    );
    teams
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::LeagueVariant;

    fn snapshot(html: &str) -> PageSnapshot {
        PageSnapshot::parse(html, LeagueVariant::Classic)
    }

    const TWO_TEAMS: &str = r#"
        <div class="rose">
          <h4>Rose squadre</h4>
          <div class="wrap"><h3>Atletico Ma Non Troppo</h3>
            <table>
              <thead><tr><th>R</th><th>Calciatore</th><th>FVM/MP</th><th>Squadra</th><th>QI</th><th>Qt.</th></tr></thead>
              <tbody>
                <tr><td>C</td><td>nicolo barella</td><td>6,8</td><td>Inter</td><td>7</td><td>24</td></tr>
                <tr><td>P</td><td>mario rossi</td><td>6.5</td><td>AS Roma</td><td></td><td>8.0</td></tr>
                <tr><td>A</td><td>Lautaro Martinez</td><td>8,1</td><td>Inter</td><td>9</td><td>40</td></tr>
                <tr><td>D</td><td>alessandro bastoni</td><td>6,2</td><td>Inter</td><td>6</td><td>15</td></tr>
                <tr><td colspan="6">Totale crediti spesi: 87</td></tr>
              </tbody>
            </table>
          </div>
          <div class="wrap"><h3>Real Mediocre</h3>
            <table>
              <thead><tr><th>R</th><th>Calciatore</th><th>FVM/MP</th><th>Squadra</th><th>QI</th><th>Qt.</th></tr></thead>
              <tbody>
                <tr><td>Attaccante</td><td>ciro immobile</td><td>-</td><td>Lazio</td><td>5</td></tr>
              </tbody>
            </table>
          </div>
          <table><thead><tr><th>Pos</th><th>Squadra</th><th>Pt</th></tr></thead>
            <tbody><tr><td>1</td><td>X</td><td>3</td></tr></tbody></table>
        </div>"#;

    #[test]
    fn classifies_and_names_each_team_table() {
        let teams = extract_rosters(&snapshot(TWO_TEAMS));
        assert_eq!(teams.len(), 2);
        assert_eq!(teams[0].team_name, "Atletico Ma Non Troppo");
        assert_eq!(teams[1].team_name, "Real Mediocre");
    }

    #[test]
    fn entries_are_sorted_keeper_defender_midfielder_attacker() {
        let teams = extract_rosters(&snapshot(TWO_TEAMS));
        let roles: Vec<&str> = teams[0].entries.iter().map(|e| e.role_code.as_str()).collect();
        assert_eq!(roles, vec!["P", "D", "C", "A"]);
    }

    #[test]
    fn data_row_is_normalized_with_defaults() {
        let teams = extract_rosters(&snapshot(TWO_TEAMS));
        let keeper = &teams[0].entries[0];
        assert_eq!(keeper.player_name, "Mario Rossi");
        assert_eq!(keeper.role_code, "P");
        assert_eq!(keeper.real_club, "AS Roma");
        assert_eq!(keeper.form_value, "6.5");
        assert_eq!(keeper.quality_index, 0.0);
        assert_eq!(keeper.auction_value, 8.0);

        let striker = &teams[1].entries[0];
        assert_eq!(striker.role_code, "A");
        assert_eq!(striker.form_value, "0");
        assert_eq!(striker.auction_value, 1.0);
    }

    #[test]
    fn header_like_body_rows_are_skipped() {
        let html = r#"<h2>Dinamo Fanta</h2><table>
            <tr><td>Ruolo</td><td>Calciatore</td><td>FVM</td><td>Squadra</td><td>QI</td><td>Qt</td></tr>
            <tr><td>D</td><td>Bremer</td><td>6</td><td>Juventus</td><td>6</td><td>14</td></tr>
          </table>"#;
        let teams = extract_rosters(&snapshot(html));
        assert_eq!(teams.len(), 1);
        assert_eq!(teams[0].team_name, "Dinamo Fanta");
        assert_eq!(teams[0].entries.len(), 1);
    }

    #[test]
    fn container_fallback_handles_unlabelled_tables() {
        let html = r#"
          <div class="panel team-box"><div class="panel-heading"><span class="panel-title">Sporting Lisbona Est</span></div>
            <table>
              <tr><td>P</td><td>Sommer</td><td>6</td><td>Inter</td><td>5</td><td>12</td></tr>
              <tr><td>A</td><td>Kean</td><td>7</td><td>Fiorentina</td><td>6</td><td>30</td></tr>
            </table>
          </div>"#;
        let snap = snapshot(html);
        assert!(classified_tables(&snap).unwrap().is_empty());
        let teams = extract_rosters(&snap);
        assert_eq!(teams.len(), 1);
        assert_eq!(teams[0].team_name, "Sporting Lisbona Est");
        assert_eq!(teams[0].entries.len(), 2);
    }

    #[test]
    fn mantra_roles_are_kept() {
        let html = r#"<h3>Mantra FC</h3><table>
            <thead><tr><th>R</th><th>Calciatore</th><th>FVM</th><th>Squadra</th><th>QI</th><th>Qt</th></tr></thead>
            <tr><td>W;A</td><td>Leão</td><td>7</td><td>Milan</td><td>8</td><td>35</td></tr>
            <tr><td>Dc</td><td>Gatti</td><td>6</td><td>Juventus</td><td>5</td><td>10</td></tr>
          </table>"#;
        let snap = PageSnapshot::parse(html, LeagueVariant::Mantra);
        let teams = extract_rosters(&snap);
        let roles: Vec<&str> = teams[0].entries.iter().map(|e| e.role_code.as_str()).collect();
        assert_eq!(roles, vec!["DC", "W;A"]);
    }

    #[test]
    fn caption_row_above_td_labels_still_reads_as_roster() {
        let html = r#"<table>
            <tr><td colspan="6">FC Example</td></tr>
            <tr><td>Ruolo</td><td>Calciatore</td><td>FVM</td><td>Squadra</td><td>QI</td><td>Qt</td></tr>
            <tr><td>P</td><td>mario rossi</td><td>6.5</td><td>AS Roma</td><td></td><td>8.0</td></tr>
          </table>"#;
        let snap = snapshot(html);
        assert_eq!(classify_table(&all_tables(&snap.doc)[0]), TableKind::Roster);
        let teams = extract_rosters(&snap);
        assert_eq!(teams.len(), 1);
        assert_eq!(teams[0].team_name, "FC Example");
        assert_eq!(teams[0].entries.len(), 1);
        assert_eq!(teams[0].entries[0].player_name, "Mario Rossi");
    }

    #[test]
    fn standings_table_is_not_a_roster() {
        let doc = scraper::Html::parse_document(
            r#"<table><thead><tr><th>Pos</th><th>Squadra</th><th>G</th><th>V</th><th>Pt</th></tr></thead></table>"#,
        );
        let view = &all_tables(&doc)[0];
        assert_eq!(classify_table(view), TableKind::Standings);
    }
}

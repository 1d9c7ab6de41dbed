//! Standings extraction from the league's `classifica` page.

use super::table::{all_tables, Row, TableView, TokenSet};
use super::PageSnapshot;
use crate::core::retry::StrategyChain;
use crate::core::types::StandingsRow;
use crate::normalize::{clean_text, decimal_or, int_or, is_numeric, parse_decimal, parse_int};
use std::collections::{BTreeMap, HashSet};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Column letters a fully-formed standings header carries.
const LETTER_COLUMNS: [&str; 8] = ["g", "v", "n", "p", "g+", "g-", "dr", "pt"];
const MIN_NUMBERED_ROWS: usize = 3;

fn standings_keywords() -> &'static TokenSet {
    static SET: OnceLock<TokenSet> = OnceLock::new();
    SET.get_or_init(|| {
        TokenSet::new(&[
            "classifica", "punti", "pt.", "pti", "vittorie", "pareggi", "sconfitte", "posizione",
            "gol fatti", "gol subiti",
        ])
    })
}

/// Drops non-positive positions and keeps every other row. A position that
/// was already taken (a printed tie) moves to the row's ordinal, or past the
/// highest position when that is taken too.
fn finalize(rows: Vec<StandingsRow>) -> Vec<StandingsRow> {
    let mut taken = HashSet::new();
    let mut kept: Vec<StandingsRow> = rows.into_iter().filter(|r| r.position > 0).collect();
    for (idx, row) in kept.iter_mut().enumerate() {
        if taken.insert(row.position) {
            continue;
        }
        let ordinal = idx as u32 + 1;
        let moved = if taken.contains(&ordinal) {
            taken.iter().max().copied().unwrap_or(0) + 1
        } else {
            ordinal
        };
        warn!(
            "standings: '{}' shares position {}; stored as {}",
            row.team_name, row.position, moved
        );
        row.position = moved;
        taken.insert(moved);
    }
    kept
}

fn positive_position(raw: &str) -> Option<u32> {
    parse_int(raw)
        .filter(|p| *p > 0)
        .and_then(|p| u32::try_from(p).ok())
}

// ── Strategy 1: letter header ────────────────────────────────────────────────

struct LetterLayout {
    header_idx: usize,
    /// Column index of each entry of `LETTER_COLUMNS`.
    columns: [usize; 8],
}

fn letter_layout(view: &TableView<'_>) -> Option<LetterLayout> {
    for (header_idx, row) in view.rows.iter().enumerate().take(3) {
        let labels: Vec<String> = row.cells.iter().map(|c| c.text.to_lowercase()).collect();
        let mut columns = [0usize; 8];
        let mut complete = true;
        for (slot, letter) in LETTER_COLUMNS.iter().enumerate() {
            match labels.iter().position(|l| l == letter) {
                Some(idx) => columns[slot] = idx,
                None => {
                    complete = false;
                    break;
                }
            }
        }
        if complete {
            return Some(LetterLayout { header_idx, columns });
        }
    }
    None
}

fn parse_letter_row(row: &Row, layout: &LetterLayout) -> Option<StandingsRow> {
    let position = positive_position(row.cell_text(0))?;
    let [played, wins, draws, losses, gf, ga, dr, pt] = layout.columns;
    // The team sits just left of the first stat column.
    let team_name = clean_text(row.cell_text(played.saturating_sub(1).max(1)));
    if team_name.is_empty() || is_numeric(&team_name) {
        return None;
    }
    let points = int_or(row.cell_text(pt), 0);
    Some(StandingsRow {
        position,
        team_name,
        points,
        played: int_or(row.cell_text(played), 0),
        wins: int_or(row.cell_text(wins), 0),
        draws: int_or(row.cell_text(draws), 0),
        losses: int_or(row.cell_text(losses), 0),
        goals_for: int_or(row.cell_text(gf), 0),
        goals_against: int_or(row.cell_text(ga), 0),
        goal_difference: int_or(row.cell_text(dr), 0),
        total_points: decimal_or(row.cell_text(pt + 1), points as f64),
        extras: BTreeMap::new(),
    })
}

fn letter_header(snapshot: &PageSnapshot) -> Option<Vec<StandingsRow>> {
    for view in all_tables(&snapshot.doc) {
        let Some(layout) = letter_layout(&view) else {
            continue;
        };
        let rows: Vec<StandingsRow> = view
            .rows
            .iter()
            .skip(layout.header_idx + 1)
            .filter_map(|row| parse_letter_row(row, &layout))
            .collect();
        if !rows.is_empty() {
            return Some(finalize(rows));
        }
    }
    None
}

// ── Strategy 2: numbered rows ────────────────────────────────────────────────

fn is_numbered_row(row: &Row) -> bool {
    row.cells.len() >= 3
        && positive_position(row.cell_text(0)).is_some()
        && !row.cell_text(1).is_empty()
        && !is_numeric(row.cell_text(1))
}

/// Numeric cells after the team name, in page order: played, wins, draws,
/// losses, goals for, goals against, difference, points, total.
fn parse_numbered_row(row: &Row) -> Option<StandingsRow> {
    if !is_numbered_row(row) {
        return None;
    }
    let numbers: Vec<f64> = row.cells[2..]
        .iter()
        .filter_map(|c| parse_decimal(&c.text))
        .collect();
    let int_at = |idx: usize| numbers.get(idx).map(|v| *v as i64).unwrap_or(0);
    let points = int_at(7);
    Some(StandingsRow {
        position: positive_position(row.cell_text(0))?,
        team_name: clean_text(row.cell_text(1)),
        points,
        played: int_at(0),
        wins: int_at(1),
        draws: int_at(2),
        losses: int_at(3),
        goals_for: int_at(4),
        goals_against: int_at(5),
        goal_difference: int_at(6),
        total_points: numbers.get(8).copied().unwrap_or(points as f64),
        extras: BTreeMap::new(),
    })
}

fn numbered_rows(snapshot: &PageSnapshot) -> Option<Vec<StandingsRow>> {
    for view in all_tables(&snapshot.doc) {
        let numbered = view.rows.iter().filter(|r| is_numbered_row(r)).count();
        if numbered < MIN_NUMBERED_ROWS {
            continue;
        }
        let rows: Vec<StandingsRow> = view.rows.iter().filter_map(parse_numbered_row).collect();
        return Some(finalize(rows));
    }
    None
}

// ── Strategy 3: header labels ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Field {
    Position,
    Team,
    Points,
    Played,
    Wins,
    Draws,
    Losses,
    GoalsFor,
    GoalsAgainst,
    GoalDifference,
    Total,
}

/// Label → field. Checked in order, so "pt tot" resolves before "pt".
const LABEL_FIELDS: &[(&[&str], Field)] = &[
    (&["pos", "#"], Field::Position),
    (&["squadra", "team", "club"], Field::Team),
    (&["tot", "fantapunti"], Field::Total),
    (&["gol fatti", "g+", "gf"], Field::GoalsFor),
    (&["gol subiti", "g-", "gs"], Field::GoalsAgainst),
    (&["diff", "dr"], Field::GoalDifference),
    (&["punti", "pt"], Field::Points),
    (&["giocate", "partite", "pg"], Field::Played),
    (&["vitt", "vinte"], Field::Wins),
    (&["pareg", "nulle"], Field::Draws),
    (&["sconf", "perse"], Field::Losses),
];

/// Single-letter headers only count as an exact match.
const LETTER_FIELDS: &[(&str, Field)] = &[
    ("g", Field::Played),
    ("v", Field::Wins),
    ("n", Field::Draws),
    ("p", Field::Losses),
];

fn field_for_label(label: &str) -> Option<Field> {
    let lower = label.trim().to_lowercase();
    if lower.is_empty() {
        return None;
    }
    if let Some((_, field)) = LETTER_FIELDS.iter().find(|(l, _)| *l == lower) {
        return Some(*field);
    }
    LABEL_FIELDS
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| lower.contains(n)))
        .map(|(_, field)| *field)
}

fn parse_labelled_row(row: &Row, fields: &[Option<Field>], ordinal: usize) -> Option<StandingsRow> {
    let mut out = StandingsRow::default();
    let mut mapped = HashSet::new();
    let mut extra_idx = 0;
    for (idx, cell) in row.cells.iter().enumerate() {
        let field = fields.get(idx).copied().flatten().filter(|f| mapped.insert(*f));
        let text = cell.text.as_str();
        match field {
            Some(Field::Position) => out.position = positive_position(text).unwrap_or(0),
            Some(Field::Team) => out.team_name = clean_text(text),
            Some(Field::Points) => out.points = int_or(text, 0),
            Some(Field::Played) => out.played = int_or(text, 0),
            Some(Field::Wins) => out.wins = int_or(text, 0),
            Some(Field::Draws) => out.draws = int_or(text, 0),
            Some(Field::Losses) => out.losses = int_or(text, 0),
            Some(Field::GoalsFor) => out.goals_for = int_or(text, 0),
            Some(Field::GoalsAgainst) => out.goals_against = int_or(text, 0),
            Some(Field::GoalDifference) => out.goal_difference = int_or(text, 0),
            Some(Field::Total) => out.total_points = decimal_or(text, 0.0),
            None => {
                if text.is_empty() {
                    continue;
                }
                extra_idx += 1;
                out.extras.insert(format!("extra_{}", extra_idx), text.to_string());
            }
        }
    }
    if out.team_name.is_empty() {
        let first_text = row
            .cells
            .iter()
            .map(|c| c.text.as_str())
            .find(|t| !t.is_empty() && !is_numeric(t))?;
        out.team_name = first_text.to_string();
        out.extras.retain(|_, v| *v != first_text);
    }
    if out.position == 0 {
        out.position = u32::try_from(ordinal).ok()?;
    }
    Some(out)
}

fn header_labels(snapshot: &PageSnapshot) -> Option<Vec<StandingsRow>> {
    for view in all_tables(&snapshot.doc) {
        if !standings_keywords().is_match(&view.aggregate_text()) {
            continue;
        }
        let Some(header) = view.header() else {
            continue;
        };
        let fields: Vec<Option<Field>> = header.cells.iter().map(|c| field_for_label(&c.text)).collect();
        let rows: Vec<StandingsRow> = view
            .data_rows()
            .filter(|r| r.cells.len() >= 2)
            .enumerate()
            .filter_map(|(i, row)| parse_labelled_row(row, &fields, i + 1))
            .collect();
        if !rows.is_empty() {
            return Some(finalize(rows));
        }
    }
    None
}

pub fn standings_chain() -> StrategyChain<PageSnapshot, StandingsRow> {
    StrategyChain::new("standings")
        .then("letter_header", letter_header)
        .then("numbered_rows", numbered_rows)
        .then("header_labels", header_labels)
}

/// Extract the standings table from a captured `classifica` page.
pub fn extract_standings(snapshot: &PageSnapshot) -> Vec<StandingsRow> {
    match standings_chain().run(snapshot) {
        Some((strategy, rows)) => {
            info!("standings: {} rows via '{}'", rows.len(), strategy);
            rows
        }
        None => {
            info!("standings: no table recognised");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::LeagueVariant;

    fn snapshot(html: &str) -> PageSnapshot {
        PageSnapshot::parse(html, LeagueVariant::Classic)
    }

    #[test]
    fn letter_header_maps_fixed_columns() {
        let html = r#"<table>
            <thead><tr><th>Pos</th><th>Squadra</th><th>G</th><th>V</th><th>N</th><th>P</th>
              <th>G+</th><th>G-</th><th>DR</th><th>PT</th><th>PT Tot</th></tr></thead>
            <tbody>
              <tr><td>1</td><td>Rome FC</td><td>10</td><td>7</td><td>2</td><td>1</td><td>20</td><td>8</td><td>12</td><td>23</td><td>23.5</td></tr>
              <tr><td>2</td><td>Milano United</td><td>10</td><td>6</td><td>2</td><td>2</td><td>18</td><td>10</td><td>+8</td><td>20</td><td>812,5</td></tr>
            </tbody></table>"#;
        let snap = snapshot(html);
        assert_eq!(standings_chain().run(&snap).map(|(n, _)| n), Some("letter_header"));
        let rows = extract_standings(&snap);
        assert_eq!(rows.len(), 2);
        let first = &rows[0];
        assert_eq!(first.position, 1);
        assert_eq!(first.team_name, "Rome FC");
        assert_eq!(first.played, 10);
        assert_eq!(first.wins, 7);
        assert_eq!(first.draws, 2);
        assert_eq!(first.losses, 1);
        assert_eq!(first.goals_for, 20);
        assert_eq!(first.goals_against, 8);
        assert_eq!(first.goal_difference, 12);
        assert_eq!(first.points, 23);
        assert_eq!(first.total_points, 23.5);
        assert_eq!(rows[1].goal_difference, 8);
        assert_eq!(rows[1].total_points, 812.5);
    }

    #[test]
    fn numbered_rows_map_numbers_positionally() {
        let html = r#"<table>
            <tr><td>1</td><td>Alpha</td><td>5</td><td>4</td><td>1</td><td>0</td><td>9</td><td>2</td><td>7</td><td>13</td></tr>
            <tr><td>2</td><td>Beta</td><td>5</td><td>3</td><td>1</td><td>1</td><td>7</td><td>4</td><td>3</td><td>10</td></tr>
            <tr><td>3</td><td>Gamma</td><td>5</td><td>0</td><td>0</td><td>5</td><td>1</td><td>12</td><td>-11</td><td>0</td></tr>
            <tr><td>0</td><td>Ghost</td><td>0</td></tr>
          </table>"#;
        let rows = extract_standings(&snapshot(html));
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].team_name, "Gamma");
        assert_eq!(rows[2].goal_difference, -11);
        assert_eq!(rows[0].points, 13);
        assert_eq!(rows[0].total_points, 13.0);
    }

    #[test]
    fn header_labels_collect_unmapped_cells_as_extras() {
        let html = r#"<h2>Classifica</h2><table>
            <tr><th>Squadra</th><th>Punti</th><th>Vittorie</th><th>Forma</th></tr>
            <tr><td>Alpha</td><td>30</td><td>9</td><td>VVNPV</td></tr>
            <tr><td>Beta</td><td>28</td><td>8</td><td>VPVVN</td></tr>
          </table>"#;
        let rows = extract_standings(&snapshot(html));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].position, 1);
        assert_eq!(rows[1].position, 2);
        assert_eq!(rows[0].team_name, "Alpha");
        assert_eq!(rows[0].points, 30);
        assert_eq!(rows[0].wins, 9);
        assert_eq!(rows[0].extras.get("extra_1").map(String::as_str), Some("VVNPV"));
    }

    #[test]
    fn tied_positions_keep_every_row() {
        let html = r#"<table>
            <thead><tr><th>Pos</th><th>Squadra</th><th>G</th><th>V</th><th>N</th><th>P</th>
              <th>G+</th><th>G-</th><th>DR</th><th>PT</th></tr></thead>
            <tbody>
              <tr><td>1</td><td>A</td><td>3</td><td>2</td><td>1</td><td>0</td><td>6</td><td>2</td><td>4</td><td>7</td></tr>
              <tr><td>1</td><td>B</td><td>3</td><td>2</td><td>1</td><td>0</td><td>5</td><td>1</td><td>4</td><td>7</td></tr>
              <tr><td>3</td><td>C</td><td>3</td><td>0</td><td>0</td><td>3</td><td>1</td><td>9</td><td>-8</td><td>0</td></tr>
            </tbody></table>"#;
        let rows = extract_standings(&snapshot(html));
        let teams: Vec<&str> = rows.iter().map(|r| r.team_name.as_str()).collect();
        assert_eq!(teams, vec!["A", "B", "C"]);
        let positions: Vec<u32> = rows.iter().map(|r| r.position).collect();
        assert_eq!(positions, vec![1, 2, 3]);
    }

    #[test]
    fn conflicting_position_moves_past_the_highest() {
        let row = |position: u32, team: &str| StandingsRow {
            position,
            team_name: team.into(),
            ..Default::default()
        };
        let rows = finalize(vec![row(2, "A"), row(3, "B"), row(0, "D"), row(3, "C")]);
        let positions: Vec<u32> = rows.iter().map(|r| r.position).collect();
        assert_eq!(positions, vec![2, 3, 4]);
        assert_eq!(rows[2].team_name, "C");
    }

    #[test]
    fn unrelated_page_yields_nothing() {
        let rows = extract_standings(&snapshot("<p>Nessuna classifica disponibile</p>"));
        assert!(rows.is_empty());
    }
}

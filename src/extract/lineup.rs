//! Lineup extraction from the league's `formazioni` page.
//!
//! The page lists one block per match. Team names are read from each match
//! header up front, keyed by `(match index, side)`, because the per-side
//! lineup containers are nested deeply enough that proximity-based name
//! lookup picks the wrong team.

use super::table::{
    element_ancestors, element_text, has_class_hint, read_table, select_doc, select_in, Cell, Row,
};
use super::PageSnapshot;
use crate::core::retry::StrategyChain;
use crate::core::types::{LineupEntry, MatchSideSnapshot, ScoreLine, Side};
use crate::normalize::{clean_text, is_numeric, normalize_name, normalize_role, parse_decimal};
use regex::Regex;
use scraper::ElementRef;
use std::collections::{BTreeMap, HashSet};
use std::sync::OnceLock;
use tracing::{debug, info};

const CONTAINER_CSS: &[&str] = &["#formazioni", ".formazioni", "#lineups", ".lineups", "main"];
const MATCH_CSS: &str = ".match, .match-frame, .incontro";
const MATCH_HEADER_CSS: &str = ".match-header, .match-info, .match-teams";
const TEAM_LABEL_CSS: &str = ".team-name, .nome-squadra, .team-title";
const SIDE_HEADING_CSS: &str =
    "h1, h2, h3, h4, h5, h6, .formation-header, .modulo, .module, .team-header";

const SIDE_HINTS: &[&str] = &["formation", "formazione", "lineup", "schieramento"];
const HOME_HINTS: &[&str] = &["home", "casa"];
const AWAY_HINTS: &[&str] = &["away", "trasferta", "ospite"];
const BENCH_HINTS: &[&str] = &["panchina", "bench", "riserve"];
const SCORE_TABLE_HINTS: &[&str] = &["punteggi", "scores", "summary", "riepilogo"];
const TOTAL_HINTS: &[&str] = &["totale", "total"];

/// Score cells meaning "played too little to be rated".
const NOT_EVALUATED: &[&str] = &["-", "s.v.", "s.v", "sv", "n.e.", "n.e", "ne", "n.g."];
const PLAYER_HEADER_LABELS: &[&str] = &["giocatore", "calciatore", "nome", "player"];

/// Icon filename fragment → bonus tag. Specific names come before the generic
/// ones they contain ("golsubito" before "gol").
const BONUS_ICONS: &[(&str, &str)] = &[
    ("golsubito", "GSU"),
    ("goalconceded", "GSU"),
    ("autogol", "AUT"),
    ("owngoal", "AUT"),
    ("rigoresbagliato", "RSB"),
    ("penaltymissed", "RSB"),
    ("rigoreparato", "RPA"),
    ("penaltysaved", "RPA"),
    ("rigoresegnato", "RSE"),
    ("penaltyscored", "RSE"),
    ("golvittoria", "GDV"),
    ("golpareggio", "GDP"),
    ("portainviolata", "PIN"),
    ("cleansheet", "PIN"),
    ("assist", "ASS"),
    ("ammon", "AMM"),
    ("giallo", "AMM"),
    ("yellowcard", "AMM"),
    ("espul", "ESP"),
    ("rosso", "ESP"),
    ("redcard", "ESP"),
    ("entrato", "ENT"),
    ("subin", "ENT"),
    ("uscito", "USC"),
    ("subout", "USC"),
    ("gol", "GOL"),
    ("goal", "GOL"),
];

fn formation_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\d+-\d+-\d+(?:-\d+)?\b").expect("valid formation pattern"))
}

fn matchday_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)giornata\s*(?:n\.?\s*)?(\d{1,2})\b").expect("valid matchday pattern")
    })
}

fn total_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(totale[^\d+-]*?)[:\s]*([+-]?\d+(?:[.,]\d+)?)").expect("valid total pattern")
    })
}

// ── Small classifiers ────────────────────────────────────────────────────────

/// `P`, `Dc`, `W;A`, `Por/Dc`: short alphabetic tokens joined by separators.
pub fn is_role_token(raw: &str) -> bool {
    let s = raw.trim();
    !s.is_empty()
        && s.split([';', '/', ','])
            .all(|t| (1..=3).contains(&t.len()) && t.chars().all(|c| c.is_ascii_alphabetic()))
}

fn is_not_evaluated(raw: &str) -> bool {
    NOT_EVALUATED.contains(&raw.trim().to_lowercase().as_str())
}

fn is_score_text(raw: &str) -> bool {
    !raw.trim().is_empty() && (is_numeric(raw) || is_not_evaluated(raw))
}

/// Bonus tag for an icon URL, matched on the filename without extension or
/// separators.
pub fn bonus_code(src: &str) -> Option<&'static str> {
    let file = src
        .split(['?', '#'])
        .next()
        .unwrap_or("")
        .rsplit('/')
        .next()
        .unwrap_or("");
    let stem = file.rsplit_once('.').map(|(s, _)| s).unwrap_or(file);
    let key: String = stem
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    if key.is_empty() {
        return None;
    }
    BONUS_ICONS
        .iter()
        .find(|(needle, _)| key.contains(needle))
        .map(|(_, code)| *code)
}

fn side_from_hints(el: ElementRef<'_>) -> Option<Side> {
    if has_class_hint(el, HOME_HINTS) {
        Some(Side::Home)
    } else if has_class_hint(el, AWAY_HINTS) {
        Some(Side::Away)
    } else {
        None
    }
}

/// Side declared on `el` or on any ancestor below `scope`.
fn side_hint(el: ElementRef<'_>, scope: ElementRef<'_>) -> Option<Side> {
    std::iter::once(el)
        .chain(element_ancestors(el).take_while(|a| a.id() != scope.id()))
        .find_map(side_from_hints)
}

fn side_by_order(pos: usize) -> Side {
    if pos % 2 == 0 {
        Side::Home
    } else {
        Side::Away
    }
}

// ── Page structure ───────────────────────────────────────────────────────────

fn lineup_root(snapshot: &PageSnapshot) -> ElementRef<'_> {
    CONTAINER_CSS
        .iter()
        .find_map(|css| select_doc(&snapshot.doc, css).into_iter().next())
        .unwrap_or_else(|| snapshot.doc.root_element())
}

type SideNames = BTreeMap<(usize, Side), String>;

/// Team names from every match header, collected before any side is parsed.
fn header_names(matches: &[ElementRef<'_>]) -> SideNames {
    let mut names = SideNames::new();
    for (idx, block) in matches.iter().enumerate() {
        let Some(header) = select_in(*block, MATCH_HEADER_CSS).into_iter().next() else {
            continue;
        };
        let labels = select_in(header, TEAM_LABEL_CSS)
            .into_iter()
            .map(|el| (el, element_text(el)))
            .filter(|(_, text)| !text.is_empty());
        for (pos, (label, text)) in labels.enumerate() {
            let side = side_hint(label, header).unwrap_or_else(|| side_by_order(pos));
            names.entry((idx, side)).or_insert(text);
        }
    }
    names
}

/// Outermost elements hinting at a single team's lineup that hold a table.
fn side_containers<'a>(scope: ElementRef<'a>) -> Vec<ElementRef<'a>> {
    let candidates: Vec<ElementRef<'a>> = select_in(scope, "div, section, article, td, li")
        .into_iter()
        .filter(|el| has_class_hint(*el, SIDE_HINTS) && !select_in(*el, "table").is_empty())
        .collect();
    let ids: HashSet<_> = candidates.iter().map(|c| c.id()).collect();
    candidates
        .into_iter()
        .filter(|c| !element_ancestors(*c).any(|a| ids.contains(&a.id())))
        .collect()
}

/// Tables of `container` that are not nested in another of its tables.
fn own_tables<'a>(container: ElementRef<'a>) -> Vec<ElementRef<'a>> {
    select_in(container, "table")
        .into_iter()
        .filter(|t| {
            element_ancestors(*t)
                .take_while(|a| a.id() != container.id())
                .all(|a| a.value().name() != "table")
        })
        .collect()
}

fn outside_tables(el: ElementRef<'_>, container: ElementRef<'_>) -> bool {
    element_ancestors(el)
        .take_while(|a| a.id() != container.id())
        .all(|a| a.value().name() != "table")
}

/// Text of the side's headings, where the formation is printed.
fn heading_blob(container: ElementRef<'_>) -> String {
    select_in(container, SIDE_HEADING_CSS)
        .into_iter()
        .filter(|el| outside_tables(*el, container))
        .map(element_text)
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn find_formation(text: &str) -> Option<String> {
    formation_pattern().find(text).map(|m| m.as_str().to_string())
}

pub fn find_matchday(text: &str) -> Option<u32> {
    matchday_pattern()
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .filter(|n| *n > 0)
}

fn container_team_name(container: ElementRef<'_>) -> Option<String> {
    if let Some(label) = select_in(container, TEAM_LABEL_CSS)
        .into_iter()
        .map(element_text)
        .find(|t| !t.is_empty())
    {
        return Some(label);
    }
    select_in(container, "h1, h2, h3, h4, h5, h6")
        .into_iter()
        .filter(|el| outside_tables(*el, container))
        .map(|el| clean_text(&formation_pattern().replace_all(&element_text(el), "")))
        .find(|t| !t.is_empty() && !is_numeric(t))
}

// ── Rows ─────────────────────────────────────────────────────────────────────

/// Role and name either share one cell on separate lines, or sit in two
/// cells. Returns the index of the first cell after the name.
fn split_role_name(row: &Row) -> Option<(String, String, usize)> {
    let first = row.cells.first()?;
    if first.lines.len() >= 2 && is_role_token(&first.lines[0]) {
        return Some((first.lines[0].clone(), first.lines[1].clone(), 1));
    }
    let second = row.cells.get(1)?;
    let name = second.lines.first().cloned().unwrap_or_default();
    if is_role_token(&first.text) && !name.is_empty() && !is_score_text(&name) {
        return Some((first.text.clone(), name, 2));
    }
    None
}

pub fn parse_lineup_row(row: &Row, snapshot: &PageSnapshot) -> Option<LineupEntry> {
    if row.is_header {
        return None;
    }
    let (role, name, next) = split_role_name(row)?;
    if PLAYER_HEADER_LABELS.contains(&name.to_lowercase().as_str()) {
        return None;
    }
    let score_cells: Vec<&Cell> = row.cells[next.min(row.cells.len())..]
        .iter()
        .filter(|c| is_score_text(&c.text))
        .collect();
    let raw_cell = score_cells.first();
    let bonus_codes = row
        .cells
        .iter()
        .flat_map(|c| c.images.iter())
        .filter_map(|src| bonus_code(src))
        .map(str::to_string)
        .collect();
    Some(LineupEntry {
        role_code: normalize_role(&role, snapshot.variant),
        player_name: normalize_name(&name),
        bonus_codes,
        raw_score: raw_cell.and_then(|c| parse_decimal(&c.text)),
        fantasy_score: score_cells.get(1).and_then(|c| parse_decimal(&c.text)),
        was_on_pitch: raw_cell
            .map(|c| parse_decimal(&c.text).is_some() && !c.malus)
            .unwrap_or(false),
    })
}

/// `label … value` rows such as "Modificatore difesa | +1" or "Totale | 74,5".
fn parse_score_row(row: &Row) -> Option<ScoreLine> {
    let texts: Vec<&str> = row.texts().into_iter().filter(|t| !t.is_empty()).collect();
    let label = *texts.first()?;
    let value = *texts.last()?;
    if texts.len() < 2 || is_numeric(label) || !is_numeric(value) {
        return None;
    }
    Some(ScoreLine {
        label: label.to_string(),
        value: value.to_string(),
    })
}

fn is_total_label(label: &str) -> bool {
    let lower = label.to_lowercase();
    TOTAL_HINTS.iter().any(|h| lower.contains(h))
}

// ── Side parsing ─────────────────────────────────────────────────────────────

#[derive(Default)]
struct SideTables<'a> {
    starters: Option<ElementRef<'a>>,
    bench: Option<ElementRef<'a>>,
    scores: Vec<ElementRef<'a>>,
}

fn assign_tables(container: ElementRef<'_>) -> SideTables<'_> {
    let mut out = SideTables::default();
    for table in own_tables(container) {
        if has_class_hint(table, SCORE_TABLE_HINTS) {
            out.scores.push(table);
        } else if has_class_hint(table, BENCH_HINTS) && out.bench.is_none() {
            out.bench = Some(table);
        } else if out.starters.is_none() {
            out.starters = Some(table);
        } else if out.bench.is_none() {
            out.bench = Some(table);
        } else {
            out.scores.push(table);
        }
    }
    out
}

/// Player rows of `table`; anything else that reads as a score line is
/// pushed to `score_lines`.
fn player_rows(
    table: Option<ElementRef<'_>>,
    snapshot: &PageSnapshot,
    score_lines: &mut Vec<ScoreLine>,
) -> Vec<LineupEntry> {
    let Some(table) = table else {
        return Vec::new();
    };
    let mut entries = Vec::new();
    for row in read_table(table).rows {
        match parse_lineup_row(&row, snapshot) {
            Some(entry) => entries.push(entry),
            None => score_lines.extend(parse_score_row(&row)),
        }
    }
    entries
}

struct SideContext {
    team_name: String,
    side: Side,
    matchday: Option<u32>,
}

fn parse_side(
    container: ElementRef<'_>,
    ctx: SideContext,
    snapshot: &PageSnapshot,
) -> Option<MatchSideSnapshot> {
    let tables = assign_tables(container);
    let mut score_lines = Vec::new();
    let starters = player_rows(tables.starters, snapshot, &mut score_lines);
    let bench = player_rows(tables.bench, snapshot, &mut score_lines);
    if starters.is_empty() && bench.is_empty() {
        return None;
    }
    for table in tables.scores {
        score_lines.extend(read_table(table).rows.iter().filter_map(parse_score_row));
    }

    let mut total = None;
    let mut other_scores = Vec::new();
    for line in score_lines {
        if total.is_none() && is_total_label(&line.label) {
            total = Some(line);
        } else {
            other_scores.push(line);
        }
    }
    if total.is_none() {
        total = loose_total(container);
    }

    let blob = heading_blob(container);
    let formation = find_formation(&blob)
        .or_else(|| find_formation(&element_text(container)))
        .unwrap_or_default();

    Some(MatchSideSnapshot {
        team_name: ctx.team_name,
        formation,
        matchday: ctx.matchday,
        side: ctx.side,
        starters,
        bench,
        other_scores,
        total,
    })
}

/// "Totale: 74,5" printed outside any table.
fn loose_total(container: ElementRef<'_>) -> Option<ScoreLine> {
    select_in(container, "div, span, p, strong")
        .into_iter()
        .filter(|el| has_class_hint(*el, TOTAL_HINTS) && outside_tables(*el, container))
        .find_map(|el| {
            let text = element_text(el);
            let caps = total_pattern().captures(&text)?;
            Some(ScoreLine {
                label: clean_text(caps.get(1)?.as_str()),
                value: caps.get(2)?.as_str().to_string(),
            })
        })
}

fn page_matchday(snapshot: &PageSnapshot, root: ElementRef<'_>) -> Option<u32> {
    snapshot
        .matchday_hint
        .or_else(|| find_matchday(&element_text(root)))
}

// ── Strategies ───────────────────────────────────────────────────────────────

fn match_blocks(snapshot: &PageSnapshot) -> Option<Vec<MatchSideSnapshot>> {
    let root = lineup_root(snapshot);
    let matches = select_in(root, MATCH_CSS);
    if matches.is_empty() {
        return None;
    }
    let names = header_names(&matches);
    let matchday = page_matchday(snapshot, root);
    let mut sides = Vec::new();
    for (idx, block) in matches.iter().enumerate() {
        for (pos, container) in side_containers(*block).into_iter().enumerate() {
            let side = side_hint(container, *block).unwrap_or_else(|| side_by_order(pos));
            let team_name = names
                .get(&(idx, side))
                .cloned()
                .or_else(|| container_team_name(container))
                .unwrap_or_else(|| format!("Squadra {}-{}", idx + 1, side.as_str()));
            debug!("lineup: match {} {} → '{}'", idx, side.as_str(), team_name);
            let ctx = SideContext {
                team_name,
                side,
                matchday,
            };
            sides.extend(parse_side(container, ctx, snapshot));
        }
    }
    Some(sides)
}

/// No match blocks: pair consecutive lineup containers as home/away.
fn loose_sides(snapshot: &PageSnapshot) -> Option<Vec<MatchSideSnapshot>> {
    let root = lineup_root(snapshot);
    let matchday = page_matchday(snapshot, root);
    let mut sides = Vec::new();
    for (pos, container) in side_containers(root).into_iter().enumerate() {
        let side = side_from_hints(container).unwrap_or_else(|| side_by_order(pos));
        let team_name = container_team_name(container)
            .unwrap_or_else(|| format!("Squadra {}-{}", pos / 2 + 1, side.as_str()));
        let ctx = SideContext {
            team_name,
            side,
            matchday,
        };
        sides.extend(parse_side(container, ctx, snapshot));
    }
    Some(sides)
}

pub fn lineup_chain() -> StrategyChain<PageSnapshot, MatchSideSnapshot> {
    StrategyChain::new("lineup")
        .then("match_blocks", match_blocks)
        .then("loose_sides", loose_sides)
}

/// Extract every team's lineup from a captured `formazioni` page.
pub fn extract_lineups(snapshot: &PageSnapshot) -> Vec<MatchSideSnapshot> {
    let sides = lineup_chain().run_or_empty(snapshot);
    info!(
        "lineup: {} sides, {} players",
        sides.len(),
        sides
            .iter()
            .map(|s| s.starters.len() + s.bench.len())
            .sum::<usize>()
    );
    sides
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::LeagueVariant;

    const MATCH_PAGE: &str = r#"
      <div id="formazioni">
        <h2>Formazioni - Giornata 12</h2>
        <div class="match">
          <div class="match-header">
            <div class="team home"><span class="team-name">Rome FC</span></div>
            <div class="team away"><span class="team-name">Milano United</span></div>
          </div>
          <div class="match-body">
            <div class="formation home">
              <div class="formation-header"><span class="team-name">Wrong Label</span> 3-4-3</div>
              <table class="titolari">
                <tr><th>Ruolo</th><th>Giocatore</th><th>V</th><th>FV</th></tr>
                <tr><td>P</td><td>mario rossi<br>Roma</td><td>6,5</td><td>5,5</td></tr>
                <tr><td>A</td><td>Lautaro Martinez <img src="/img/bonus/gol.png"><img src="/img/bonus/gol.png"><img src="/img/bonus/assist.png"></td><td>7</td><td>12</td></tr>
                <tr><td>C</td><td>Barella</td><td>s.v.</td><td>-</td></tr>
                <tr><td>D</td><td>Bastoni</td><td data-malus="1">6*</td><td>6</td></tr>
              </table>
              <table class="panchina">
                <tr><td>D</td><td>Darmian <img src="/icons/entrato.svg"></td><td>6</td><td>6</td></tr>
                <tr><td>A</td><td>Arnautovic</td><td></td><td></td></tr>
              </table>
              <table class="punteggi">
                <tr><td>Modificatore difesa</td><td>+1</td></tr>
                <tr><td>Totale</td><td>74,5</td></tr>
              </table>
            </div>
            <div class="formation away">
              <h4>Milano United 4-3-3</h4>
              <table>
                <tr><td><span>Por</span>
Maignan</td><td>6</td><td>5</td></tr>
                <tr><td><span>Dc;Ds</span>
Gabbia</td><td>6,5</td><td>6,5</td></tr>
              </table>
              <div class="totale">Totale: 68</div>
            </div>
          </div>
        </div>
      </div>"#;

    fn sides(variant: LeagueVariant) -> Vec<MatchSideSnapshot> {
        extract_lineups(&PageSnapshot::parse(MATCH_PAGE, variant))
    }

    #[test]
    fn names_come_from_match_header_not_from_nested_labels() {
        let sides = sides(LeagueVariant::Classic);
        assert_eq!(sides.len(), 2);
        assert_eq!(sides[0].side, Side::Home);
        assert_eq!(sides[0].team_name, "Rome FC");
        assert_eq!(sides[1].side, Side::Away);
        assert_eq!(sides[1].team_name, "Milano United");
    }

    #[test]
    fn formation_matchday_and_totals_are_read() {
        let sides = sides(LeagueVariant::Classic);
        assert_eq!(sides[0].formation, "3-4-3");
        assert_eq!(sides[1].formation, "4-3-3");
        assert_eq!(sides[0].matchday, Some(12));
        let total = sides[0].total.as_ref().unwrap();
        assert_eq!(total.label, "Totale");
        assert_eq!(total.value, "74,5");
        assert_eq!(sides[0].other_scores.len(), 1);
        assert_eq!(sides[0].other_scores[0].label, "Modificatore difesa");
        assert_eq!(sides[1].total.as_ref().unwrap().value, "68");
    }

    #[test]
    fn starters_and_bench_are_split_by_table() {
        let home = &sides(LeagueVariant::Classic)[0];
        let names: Vec<&str> = home.starters.iter().map(|e| e.player_name.as_str()).collect();
        assert_eq!(names, vec!["Mario Rossi", "Lautaro Martinez", "Barella", "Bastoni"]);
        assert_eq!(home.bench.len(), 2);
        assert_eq!(home.bench[0].bonus_codes, vec!["ENT"]);
    }

    #[test]
    fn scores_bonuses_and_pitch_presence() {
        let home = &sides(LeagueVariant::Classic)[0];
        let keeper = &home.starters[0];
        assert_eq!(keeper.raw_score, Some(6.5));
        assert_eq!(keeper.fantasy_score, Some(5.5));
        assert!(keeper.was_on_pitch);

        let striker = &home.starters[1];
        assert_eq!(striker.bonus_codes, vec!["GOL", "GOL", "ASS"]);
        assert_eq!(striker.fantasy_score, Some(12.0));

        let unrated = &home.starters[2];
        assert_eq!(unrated.raw_score, None);
        assert!(!unrated.was_on_pitch);

        let office = &home.starters[3];
        assert_eq!(office.raw_score, Some(6.0));
        assert!(!office.was_on_pitch);

        let unused = &home.bench[1];
        assert!(!unused.was_on_pitch);
        assert_eq!(unused.raw_score, None);
    }

    #[test]
    fn newline_delimited_role_and_name_share_a_cell() {
        let away = &sides(LeagueVariant::Mantra)[1];
        let roles: Vec<&str> = away.starters.iter().map(|e| e.role_code.as_str()).collect();
        assert_eq!(roles, vec!["POR", "DC;DS"]);
        assert_eq!(away.starters[0].player_name, "Maignan");
        assert_eq!(away.starters[0].raw_score, Some(6.0));
        assert!(away.bench.is_empty());
    }

    #[test]
    fn matchday_hint_wins_over_page_text() {
        let snap = PageSnapshot::parse(MATCH_PAGE, LeagueVariant::Classic).with_matchday(Some(3));
        assert!(extract_lineups(&snap).iter().all(|s| s.matchday == Some(3)));
    }

    #[test]
    fn loose_containers_pair_up_without_match_blocks() {
        let html = r#"<main>
            <section class="lineup"><h3>Alpha 4-4-2</h3>
              <table><tr><td>P</td><td>Uno</td><td>6</td><td>6</td></tr></table></section>
            <section class="lineup"><h3>Beta 3-5-2</h3>
              <table><tr><td>P</td><td>Due</td><td>5</td><td>4</td></tr></table></section>
          </main>"#;
        let snap = PageSnapshot::parse(html, LeagueVariant::Classic);
        assert_eq!(lineup_chain().run(&snap).map(|(n, _)| n), Some("loose_sides"));
        let sides = extract_lineups(&snap);
        assert_eq!(sides.len(), 2);
        assert_eq!(sides[0].team_name, "Alpha");
        assert_eq!(sides[1].side, Side::Away);
        assert_eq!(sides[1].formation, "3-5-2");
    }

    #[test]
    fn bonus_icons_map_to_three_letter_codes() {
        assert_eq!(bonus_code("/img/gol-subito.png?v=2"), Some("GSU"));
        assert_eq!(bonus_code("https://cdn.test/icons/rigore_parato.svg"), Some("RPA"));
        assert_eq!(bonus_code("ammonizione.png"), Some("AMM"));
        assert_eq!(bonus_code("/img/flag.png"), None);
    }

    #[test]
    fn role_tokens_are_short_alphabetic() {
        assert!(is_role_token("P"));
        assert!(is_role_token("Dc;Ds"));
        assert!(is_role_token("W/A"));
        assert!(!is_role_token("Totale"));
        assert!(!is_role_token("6,5"));
    }
}

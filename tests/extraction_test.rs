//! Extractors over captured page fixtures.
use fanta_scout::extract::{extract_rosters, extract_standings, PageSnapshot};
use fanta_scout::LeagueVariant;

fn init_logger() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

const STANDINGS_PAGE: &str = r#"
<html><body>
  <nav><a href="/rose">Rose</a></nav>
  <table class="table">
    <thead><tr>
      <th>Pos</th><th>Squadra</th><th>G</th><th>V</th><th>N</th><th>P</th>
      <th>G+</th><th>G-</th><th>DR</th><th>PT</th><th>PT Tot</th>
    </tr></thead>
    <tbody>
      <tr><td>1</td><td>Rome FC</td><td>10</td><td>7</td><td>2</td><td>1</td><td>20</td><td>8</td><td>12</td><td>23</td><td>23.5</td></tr>
      <tr><td>2</td><td>Milano Bassa</td><td>10</td><td>6</td><td>2</td><td>2</td><td>18</td><td>10</td><td>8</td><td>20</td><td>812,5</td></tr>
      <tr><td>3</td><td>Napule</td><td>10</td><td>1</td><td>1</td><td>8</td><td>7</td><td>22</td><td>-15</td><td>4</td><td>640</td></tr>
    </tbody>
  </table>
</body></html>"#;

#[test]
fn standings_page_yields_one_row_per_data_row() {
    init_logger();
    let rows = extract_standings(&PageSnapshot::parse(STANDINGS_PAGE, LeagueVariant::Classic));
    assert_eq!(rows.len(), 3);
    for (idx, row) in rows.iter().enumerate() {
        assert_eq!(row.position as usize, idx + 1);
    }

    let first = &rows[0];
    assert_eq!(first.team_name, "Rome FC");
    assert_eq!(
        (first.played, first.wins, first.draws, first.losses),
        (10, 7, 2, 1)
    );
    assert_eq!(
        (first.goals_for, first.goals_against, first.goal_difference),
        (20, 8, 12)
    );
    assert_eq!(first.points, 23);
    assert_eq!(first.total_points, 23.5);
    assert_eq!(rows[1].total_points, 812.5);
}

#[test]
fn standings_row_serializes_with_persisted_field_names() {
    let rows = extract_standings(&PageSnapshot::parse(STANDINGS_PAGE, LeagueVariant::Classic));
    let json = serde_json::to_value(&rows[0]).unwrap();
    assert_eq!(json["squadra"], "Rome FC");
    assert_eq!(json["differenzaReti"], 12);
    assert_eq!(json["puntiTotali"], 23.5);
}

#[test]
fn roster_row_is_normalized_and_header_skipped() {
    init_logger();
    let html = r#"
      <h3>Dinamo Fanta</h3>
      <table>
        <tr><th>R</th><th>Calciatore</th><th>FVM/MP</th><th>Squadra</th><th>QI</th><th>Qt.</th></tr>
        <tr><td>A</td><td>dusan vlahovic</td><td>7,4</td><td>Juventus</td><td>8</td><td>33</td></tr>
        <tr><td>P</td><td>mario rossi</td><td>6.5</td><td>AS Roma</td><td></td><td>8.0</td></tr>
      </table>"#;
    let teams = extract_rosters(&PageSnapshot::parse(html, LeagueVariant::Classic));
    assert_eq!(teams.len(), 1);
    let entries = &teams[0].entries;
    assert_eq!(entries.len(), 2);

    let keeper = &entries[0];
    assert_eq!(keeper.player_name, "Mario Rossi");
    assert_eq!(keeper.role_code, "P");
    assert_eq!(keeper.real_club, "AS Roma");
    assert_eq!(keeper.form_value, "6.5");
    assert_eq!(keeper.quality_index, 0.0);
    assert_eq!(keeper.auction_value, 8.0);
    assert_eq!(entries[1].player_name, "Dusan Vlahovic");
}

#[test]
fn unrecognised_page_extracts_nothing() {
    let snap = PageSnapshot::parse(
        "<html><body><p>Sessione scaduta</p></body></html>",
        LeagueVariant::Classic,
    );
    assert!(extract_rosters(&snap).is_empty());
    assert!(extract_standings(&snap).is_empty());
}

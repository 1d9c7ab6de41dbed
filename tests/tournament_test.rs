//! Tournament discovery over competition-list and dropdown layouts.
use fanta_scout::scraping::tournament::{parse_tournaments, ScrapeUrls};
use fanta_scout::{DiscoverySource, LeagueVariant};

#[test]
fn anchors_with_the_same_id_produce_one_tournament() {
    let html = r#"
      <ul>
        <li><a class="competition-name" href="/lega/dettaglio-competizione/501">Campionato</a></li>
        <li><a class="competition-name" href="/lega/dettaglio-competizione/501?tab=calendario">Campionato</a></li>
        <li><a class="competition-name" href="/lega/dettaglio-competizione/502">Coppa</a></li>
      </ul>"#;
    let found = parse_tournaments(html, LeagueVariant::Classic);
    let ids: Vec<&str> = found.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["501", "502"]);
    assert_eq!(found[0].display_name, "Campionato");
    assert_eq!(found[0].source, DiscoverySource::CompetitionAnchor);
}

#[test]
fn selected_tournament_rewrites_every_scraping_url() {
    let urls = ScrapeUrls::build("https://leghe.fantacalcio.it/lega-amici", Some("502")).unwrap();
    assert!(urls.roster.ends_with("/lega-amici/rose?id=502"));
    assert!(urls.standings.ends_with("/lega-amici/classifica?id=502"));
    assert!(urls.lineups.ends_with("/lega-amici/formazioni?id=502"));
    assert!(urls.lineups_for(Some(7)).ends_with("/lega-amici/formazioni/7?id=502"));
}

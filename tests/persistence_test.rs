//! Snapshot replace semantics against the SQLite store.
use fanta_scout::persistence::{PersistenceOrchestrator, SnapshotKind, SnapshotStore, SqliteStore};
use fanta_scout::{
    KindOutcome, LineupEntry, MatchSideSnapshot, RosterEntry, ScoreLine, Side, StandingsRow,
    TeamSnapshot,
};

fn player(name: &str, role: &str) -> RosterEntry {
    RosterEntry {
        player_name: name.into(),
        role_code: role.into(),
        real_club: "Inter".into(),
        auction_value: 12.0,
        quality_index: 5.0,
        form_value: "6.5".into(),
    }
}

fn teams() -> Vec<TeamSnapshot> {
    vec![
        TeamSnapshot {
            team_name: "Atletico Ma Non Troppo".into(),
            entries: vec![player("Yann Sommer", "P"), player("Nicolo Barella", "C")],
        },
        TeamSnapshot {
            team_name: "Real Mediocre".into(),
            entries: vec![player("Ciro Immobile", "A")],
        },
    ]
}

fn standing(position: u32, team: &str) -> StandingsRow {
    StandingsRow {
        position,
        team_name: team.into(),
        points: 10,
        ..Default::default()
    }
}

#[tokio::test]
async fn empty_standings_save_wipes_the_league() {
    let orchestrator = PersistenceOrchestrator::new(SqliteStore::open_in_memory().unwrap());
    orchestrator
        .save_standings(1, &[standing(1, "Rome FC"), standing(2, "Napule")])
        .await
        .unwrap();
    orchestrator.save_standings(2, &[standing(1, "Altra Lega")]).await.unwrap();

    let counts = orchestrator.save_standings(1, &[]).await.unwrap();
    assert_eq!(counts.deleted, 2);
    assert_eq!(counts.inserted, 0);

    let store = orchestrator.store();
    assert_eq!(store.count_rows(1, SnapshotKind::Standings).await.unwrap(), 0);
    assert_eq!(store.count_rows(2, SnapshotKind::Standings).await.unwrap(), 1);
}

#[tokio::test]
async fn repeated_roster_saves_replace_players_and_keep_squads_unique() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open(&dir.path().join("snapshots.sqlite3")).unwrap();
    let orchestrator = PersistenceOrchestrator::new(store);

    let first = orchestrator.save_roster(9, &teams()).await.unwrap();
    assert_eq!(first.deleted, 0);
    assert_eq!(first.inserted, 3);

    let second = orchestrator.save_roster(9, &teams()).await.unwrap();
    assert_eq!(second.deleted, 3);
    assert_eq!(second.inserted, 3);

    let store = orchestrator.store();
    assert_eq!(store.squad_count(9).await.unwrap(), 2);
    assert_eq!(store.count_rows(9, SnapshotKind::Roster).await.unwrap(), 3);

    let players = store.players(9).await.unwrap();
    assert_eq!(
        players[0],
        (
            "Atletico Ma Non Troppo".to_string(),
            "Yann Sommer".to_string(),
            "P".to_string()
        )
    );
    assert_eq!(players[1].1, "Nicolo Barella");
}

#[tokio::test]
async fn squads_missing_from_a_new_roster_are_dropped() {
    let orchestrator = PersistenceOrchestrator::new(SqliteStore::open_in_memory().unwrap());
    orchestrator.save_roster(4, &teams()).await.unwrap();
    orchestrator.save_roster(5, &teams()).await.unwrap();

    let renamed = vec![TeamSnapshot {
        team_name: "Real Mediocre".into(),
        entries: vec![player("Ciro Immobile", "A"), player("Mario Rui", "D")],
    }];
    let counts = orchestrator.save_roster(4, &renamed).await.unwrap();
    assert_eq!(counts.deleted, 3);
    assert_eq!(counts.inserted, 2);

    let store = orchestrator.store();
    assert_eq!(store.squad_count(4).await.unwrap(), 1);
    assert_eq!(store.squad_count(5).await.unwrap(), 2);
    let players = store.players(4).await.unwrap();
    assert!(players.iter().all(|(squad, _, _)| squad == "Real Mediocre"));
}

#[tokio::test]
async fn lineups_are_replaced_per_league() {
    let orchestrator = PersistenceOrchestrator::new(SqliteStore::open_in_memory().unwrap());
    let side = MatchSideSnapshot {
        team_name: "Rome FC".into(),
        formation: "3-4-3".into(),
        matchday: Some(12),
        side: Side::Home,
        starters: vec![LineupEntry {
            role_code: "P".into(),
            player_name: "Sommer".into(),
            bonus_codes: vec!["PIN".into()],
            raw_score: Some(6.5),
            fantasy_score: Some(7.5),
            was_on_pitch: true,
        }],
        bench: Vec::new(),
        other_scores: vec![ScoreLine {
            label: "Modificatore difesa".into(),
            value: "1".into(),
        }],
        total: Some(ScoreLine {
            label: "Totale".into(),
            value: "74,5".into(),
        }),
    };

    let counts = orchestrator.save_lineups(4, &[side.clone(), side]).await.unwrap();
    assert_eq!(KindOutcome::from(counts), KindOutcome::Saved { deleted: 0, inserted: 2 });

    let counts = orchestrator.save_lineups(4, &[]).await.unwrap();
    assert_eq!(counts.deleted, 2);
    assert_eq!(
        orchestrator.store().count_rows(4, SnapshotKind::Lineups).await.unwrap(),
        0
    );
}

use std::path::Path;

use rusqlite::Connection;

use referee_stats::db;
use referee_stats::export::StatsReport;
use referee_stats::import::Importer;
use referee_stats::reference_data;
use referee_stats::stats::{self, CardColour, NamedCount, Page, ResultTally};

fn loaded_db() -> Connection {
    let mut conn = db::open_in_memory().expect("in-memory db");
    reference_data::seed_all(&conn).expect("seed reference data");
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures");
    for name in ["matches.json", "participants.json", "events.json", "results.json"] {
        Importer::new(&mut conn)
            .import_file(&dir.join(name), None)
            .expect("import fixture");
    }
    conn
}

fn named(id: i64, name: &str, count: i64) -> NamedCount {
    NamedCount {
        id,
        name: name.to_string(),
        count,
    }
}

#[test]
fn referee_totals_and_cards() {
    let conn = loaded_db();
    let s = stats::referee_stats(&conn, 6600, Page::default())
        .unwrap()
        .expect("referee exists");
    assert_eq!(s.name, "Test Referee");
    assert_eq!(s.total_matches, 2);
    assert_eq!(s.yellow_cards, 3);
    assert_eq!(s.red_cards, 1);
    assert_eq!(s.goals, 5);
    assert_eq!(
        s.co_officials,
        vec![
            named(6601, "Anna Assistent", 2),
            named(6602, "Erik Linjedomare", 1),
            named(6603, "Karin Fjärde", 1),
        ]
    );
    assert_eq!(
        s.carded_players,
        vec![
            named(3001, "Carl Carlsson", 3),
            named(2001, "Anders Andersson", 1),
        ]
    );
}

#[test]
fn co_officials_paginate() {
    let conn = loaded_db();
    let page = stats::most_common_co_officials(&conn, 6600, Page::new(1, 1)).unwrap();
    assert_eq!(page, vec![named(6602, "Erik Linjedomare", 1)]);
    let past_end = stats::most_common_co_officials(&conn, 6600, Page::new(5, 10)).unwrap();
    assert!(past_end.is_empty());
}

#[test]
fn missing_subjects_are_none() {
    let conn = loaded_db();
    assert!(stats::referee_stats(&conn, 1, Page::default()).unwrap().is_none());
    assert!(stats::player_stats(&conn, 1).unwrap().is_none());
    assert!(stats::team_stats(&conn, 1, Page::default()).unwrap().is_none());
    assert!(stats::match_stats(&conn, 999).unwrap().is_none());
}

#[test]
fn player_goals_exclude_own_goals() {
    let conn = loaded_db();
    let s = stats::player_stats(&conn, 2001).unwrap().expect("player exists");
    assert_eq!(s.name, "Anders Andersson");
    assert_eq!(s.total_matches, 3);
    assert_eq!(s.goals, 3);
    assert_eq!((s.yellow_cards, s.red_cards), (1, 0));
    assert_eq!(s.teams.len(), 1);
    assert_eq!(s.teams[0].name, "Hestrafors IF");
    assert_eq!(s.teams[0].matches, 3);

    let own_goal_scorer = stats::player_stats(&conn, 2002).unwrap().unwrap();
    assert_eq!(own_goal_scorer.goals, 0);
}

#[test]
fn team_results_use_final_scores_only() {
    let conn = loaded_db();
    let s = stats::team_stats(&conn, 61174, Page::default())
        .unwrap()
        .expect("team exists");
    assert_eq!(s.total_matches, 3);
    assert_eq!(
        s.results,
        ResultTally {
            wins: 1,
            draws: 1,
            losses: 0,
            goals_for: 3,
            goals_against: 2,
        }
    );
    let opponents = s
        .common_opponents
        .iter()
        .map(|o| (o.id, o.matches))
        .collect::<Vec<_>>();
    assert_eq!(opponents, vec![(30415, 2), (40000, 1)]);
    assert_eq!(s.top_scorers.len(), 1);
    assert_eq!((s.top_scorers[0].id, s.top_scorers[0].goals), (2001, 3));

    let away = stats::team_stats(&conn, 30415, Page::default()).unwrap().unwrap();
    assert_eq!((away.results.wins, away.results.draws, away.results.losses), (0, 1, 1));
}

#[test]
fn match_summary_lists_officials_cards_and_goals() {
    let conn = loaded_db();
    let s = stats::match_stats(&conn, 1).unwrap().expect("match exists");
    assert_eq!(s.fogis_id.as_deref(), Some("6169913"));
    assert_eq!(s.home_team.as_ref().map(|t| t.id), Some(61174));
    assert_eq!(s.away_team.as_ref().map(|t| t.name.as_str()), Some("IF Böljan Falkenberg"));
    assert_eq!(s.score, "2-1");

    let roles = s.officials.iter().map(|o| o.role.as_str()).collect::<Vec<_>>();
    assert_eq!(roles, vec!["Huvuddomare", "Assisterande 1", "Assisterande 2"]);

    let cards = s
        .cards
        .iter()
        .map(|c| (c.minute, c.card))
        .collect::<Vec<_>>();
    assert_eq!(
        cards,
        vec![(Some(30), CardColour::Yellow), (Some(85), CardColour::Red)]
    );

    let goals = s
        .goals
        .iter()
        .map(|g| (g.minute, g.is_penalty, g.is_own_goal))
        .collect::<Vec<_>>();
    assert_eq!(
        goals,
        vec![
            (Some(12), false, false),
            (Some(55), true, false),
            (Some(80), false, true),
        ]
    );

    let no_result = stats::match_stats(&conn, 3).unwrap().unwrap();
    assert_eq!(no_result.score, "-");
}

#[test]
fn reports_serialize_with_subject_tag() {
    let conn = loaded_db();
    let report = StatsReport::Team(stats::team_stats(&conn, 61174, Page::default()).unwrap().unwrap());
    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["subject"], "team");
    assert_eq!(value["wins"], 1);
    assert_eq!(value["common_opponents"][0]["name"], "IF Böljan Falkenberg");
}

#[test]
fn upper_case_own_goal_names_agree_across_reports() {
    let conn = loaded_db();
    conn.execute("UPDATE event_types SET name = 'SJÄLVMÅL' WHERE id = 15", [])
        .unwrap();

    let scorer = stats::player_stats(&conn, 2002).unwrap().unwrap();
    assert_eq!(scorer.goals, 0);
    let team = stats::team_stats(&conn, 61174, Page::default()).unwrap().unwrap();
    assert_eq!(team.top_scorers.len(), 1);
    assert_eq!(team.top_scorers[0].id, 2001);

    let summary = stats::match_stats(&conn, 1).unwrap().unwrap();
    assert!(summary.goals.iter().any(|g| g.scorer_id == 2002 && g.is_own_goal));
}

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Params, params};
use serde::Serialize;

use crate::import::fields::contains_any;
use crate::reference_data::FINAL_RESULT_TYPE_ID;

const YELLOW_NAMES: &[&str] = &["yellow", "gul", "varning"];
const OWN_GOAL_NAMES: &[&str] = &["own", "självmål"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Page {
    pub limit: usize,
    pub offset: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self { limit: 5, offset: 0 }
    }
}

impl Page {
    pub fn new(limit: usize, offset: usize) -> Self {
        Self { limit, offset }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CardColour {
    Yellow,
    Red,
}

pub fn card_colour(type_name: &str) -> CardColour {
    if contains_any(type_name, YELLOW_NAMES) {
        CardColour::Yellow
    } else {
        CardColour::Red
    }
}

pub fn is_own_goal(type_name: &str) -> bool {
    contains_any(type_name, OWN_GOAL_NAMES)
}

fn is_yellow(type_name: &str) -> bool {
    card_colour(type_name) == CardColour::Yellow
}

/// Comma-separated ids of the event types whose names pass `rule`, for use
/// inside `IN (...)`. SQL `LIKE` only folds ASCII case, so names are
/// classified in Rust.
fn event_type_ids(conn: &Connection, rule: fn(&str) -> bool) -> Result<String> {
    let mut stmt = conn
        .prepare("SELECT id, name FROM event_types")
        .context("prepare event types query")?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))
        .context("query event types")?;
    let mut ids = Vec::new();
    for row in rows {
        let (id, name) = row.context("read event type")?;
        if rule(&name) {
            ids.push(id.to_string());
        }
    }
    Ok(ids.join(", "))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedCount {
    pub id: i64,
    pub name: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefereeStats {
    pub referee_id: i64,
    pub name: String,
    pub total_matches: i64,
    pub yellow_cards: i64,
    pub red_cards: i64,
    pub goals: i64,
    pub co_officials: Vec<NamedCount>,
    pub carded_players: Vec<NamedCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamAppearances {
    pub id: i64,
    pub name: String,
    pub matches: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerStats {
    pub player_id: i64,
    pub name: String,
    pub total_matches: i64,
    pub goals: i64,
    pub yellow_cards: i64,
    pub red_cards: i64,
    pub teams: Vec<TeamAppearances>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scorer {
    pub id: i64,
    pub name: String,
    pub goals: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResultTally {
    pub wins: i64,
    pub draws: i64,
    pub losses: i64,
    pub goals_for: i64,
    pub goals_against: i64,
}

/// Tally of `(own goals, opponent goals)` per match.
pub fn tally_results(scores: &[(i64, i64)]) -> ResultTally {
    let mut tally = ResultTally::default();
    for &(own, other) in scores {
        tally.goals_for += own;
        tally.goals_against += other;
        match own.cmp(&other) {
            std::cmp::Ordering::Greater => tally.wins += 1,
            std::cmp::Ordering::Equal => tally.draws += 1,
            std::cmp::Ordering::Less => tally.losses += 1,
        }
    }
    tally
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamStats {
    pub team_id: i64,
    pub name: String,
    pub total_matches: i64,
    #[serde(flatten)]
    pub results: ResultTally,
    pub common_opponents: Vec<TeamAppearances>,
    pub top_scorers: Vec<Scorer>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Official {
    pub id: i64,
    pub name: String,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardEntry {
    pub player_id: i64,
    pub player: String,
    pub team: String,
    pub card: CardColour,
    pub minute: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GoalEntry {
    pub scorer_id: i64,
    pub scorer: String,
    pub team: String,
    pub minute: Option<i64>,
    pub is_penalty: bool,
    pub is_own_goal: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchStats {
    pub match_id: i64,
    pub fogis_id: Option<String>,
    pub date: String,
    pub time: String,
    pub competition: String,
    pub home_team: Option<TeamRef>,
    pub away_team: Option<TeamRef>,
    pub score: String,
    pub officials: Vec<Official>,
    pub cards: Vec<CardEntry>,
    pub goals: Vec<GoalEntry>,
}

fn full_name(first: &str, last: &str) -> String {
    format!("{first} {last}").trim().to_string()
}

fn count(conn: &Connection, sql: &str, id: i64) -> Result<i64> {
    conn.query_row(sql, params![id], |row| row.get(0))
        .context("run count query")
}

fn named_counts<P: Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<NamedCount>> {
    let mut stmt = conn.prepare(sql).context("prepare stats query")?;
    let rows = stmt
        .query_map(params, |row| {
            let first: String = row.get(1)?;
            let last: String = row.get(2)?;
            Ok(NamedCount {
                id: row.get(0)?,
                name: full_name(&first, &last),
                count: row.get(3)?,
            })
        })
        .context("run stats query")?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("read stats row")?);
    }
    Ok(out)
}

fn team_appearances<P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Vec<TeamAppearances>> {
    let mut stmt = conn.prepare(sql).context("prepare team query")?;
    let rows = stmt
        .query_map(params, |row| {
            Ok(TeamAppearances {
                id: row.get(0)?,
                name: row.get(1)?,
                matches: row.get(2)?,
            })
        })
        .context("run team query")?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("read team row")?);
    }
    Ok(out)
}

/// (yellow, red) card counts for events selected by `filter`, which binds ?1.
fn card_counts(conn: &Connection, filter: &str, id: i64) -> Result<(i64, i64)> {
    let yellow = event_type_ids(conn, is_yellow)?;
    let sql = format!(
        "SELECT
            COALESCE(SUM(CASE WHEN e.event_type_id IN ({yellow}) THEN 1 ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN e.event_type_id IN ({yellow}) THEN 0 ELSE 1 END), 0)
         FROM match_events e
         JOIN event_types et ON et.id = e.event_type_id
         WHERE et.is_card = 1 AND {filter}"
    );
    conn.query_row(&sql, params![id], |row| Ok((row.get(0)?, row.get(1)?)))
        .context("count cards")
}

const REFEREE_MATCHES: &str =
    "e.match_id IN (SELECT match_id FROM referee_assignments WHERE referee_id = ?1)";

pub fn referee_stats(conn: &Connection, referee_id: i64, page: Page) -> Result<Option<RefereeStats>> {
    let name = conn
        .query_row(
            "SELECT p.first_name, p.last_name
             FROM referees r JOIN persons p ON p.id = r.person_id
             WHERE r.id = ?1",
            params![referee_id],
            |row| Ok(full_name(&row.get::<_, String>(0)?, &row.get::<_, String>(1)?)),
        )
        .optional()
        .context("lookup referee")?;
    let Some(name) = name else {
        return Ok(None);
    };

    let total_matches = count(
        conn,
        "SELECT COUNT(DISTINCT match_id) FROM referee_assignments WHERE referee_id = ?1",
        referee_id,
    )?;
    let (yellow_cards, red_cards) = card_counts(conn, REFEREE_MATCHES, referee_id)?;
    let goals = count(
        conn,
        &format!(
            "SELECT COUNT(*) FROM match_events e
             JOIN event_types et ON et.id = e.event_type_id
             WHERE et.is_goal = 1 AND {REFEREE_MATCHES}"
        ),
        referee_id,
    )?;

    Ok(Some(RefereeStats {
        referee_id,
        name,
        total_matches,
        yellow_cards,
        red_cards,
        goals,
        co_officials: most_common_co_officials(conn, referee_id, page)?,
        carded_players: most_carded_players(conn, referee_id, page)?,
    }))
}

pub fn most_common_co_officials(
    conn: &Connection,
    referee_id: i64,
    page: Page,
) -> Result<Vec<NamedCount>> {
    named_counts(
        conn,
        "SELECT r.id, p.first_name, p.last_name, COUNT(DISTINCT ra.match_id) AS shared
         FROM referee_assignments ra
         JOIN referees r ON r.id = ra.referee_id
         JOIN persons p ON p.id = r.person_id
         WHERE ra.referee_id <> ?1
           AND ra.match_id IN (SELECT match_id FROM referee_assignments WHERE referee_id = ?1)
         GROUP BY r.id
         ORDER BY shared DESC, r.id
         LIMIT ?2 OFFSET ?3",
        params![referee_id, page.limit as i64, page.offset as i64],
    )
}

pub fn most_carded_players(
    conn: &Connection,
    referee_id: i64,
    page: Page,
) -> Result<Vec<NamedCount>> {
    named_counts(
        conn,
        &format!(
            "SELECT p.id, p.first_name, p.last_name, COUNT(*) AS cards
             FROM match_events e
             JOIN event_types et ON et.id = e.event_type_id
             JOIN match_participants mp ON mp.id = e.participant_id
             JOIN persons p ON p.id = mp.player_id
             WHERE et.is_card = 1 AND {REFEREE_MATCHES}
             GROUP BY p.id
             ORDER BY cards DESC, p.id
             LIMIT ?2 OFFSET ?3"
        ),
        params![referee_id, page.limit as i64, page.offset as i64],
    )
}

const PLAYER_EVENTS: &str =
    "e.participant_id IN (SELECT id FROM match_participants WHERE player_id = ?1)";

pub fn player_stats(conn: &Connection, player_id: i64) -> Result<Option<PlayerStats>> {
    let name = conn
        .query_row(
            "SELECT first_name, last_name FROM persons WHERE id = ?1",
            params![player_id],
            |row| Ok(full_name(&row.get::<_, String>(0)?, &row.get::<_, String>(1)?)),
        )
        .optional()
        .context("lookup player")?;
    let Some(name) = name else {
        return Ok(None);
    };

    let total_matches = count(
        conn,
        "SELECT COUNT(DISTINCT match_id) FROM match_participants WHERE player_id = ?1",
        player_id,
    )?;
    let own_goals = event_type_ids(conn, is_own_goal)?;
    let goals = count(
        conn,
        &format!(
            "SELECT COUNT(*) FROM match_events e
             JOIN event_types et ON et.id = e.event_type_id
             WHERE et.is_goal = 1 AND e.event_type_id NOT IN ({own_goals}) AND {PLAYER_EVENTS}"
        ),
        player_id,
    )?;
    let (yellow_cards, red_cards) = card_counts(conn, PLAYER_EVENTS, player_id)?;
    let teams = team_appearances(
        conn,
        "SELECT t.id, t.name, COUNT(DISTINCT mp.match_id) AS matches
         FROM match_participants mp
         JOIN match_teams mt ON mt.id = mp.match_team_id
         JOIN teams t ON t.id = mt.team_id
         WHERE mp.player_id = ?1
         GROUP BY t.id
         ORDER BY matches DESC, t.id",
        params![player_id],
    )?;

    Ok(Some(PlayerStats {
        player_id,
        name,
        total_matches,
        goals,
        yellow_cards,
        red_cards,
        teams,
    }))
}

pub fn team_stats(conn: &Connection, team_id: i64, page: Page) -> Result<Option<TeamStats>> {
    let name = conn
        .query_row(
            "SELECT name FROM teams WHERE id = ?1",
            params![team_id],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .context("lookup team")?;
    let Some(name) = name else {
        return Ok(None);
    };

    let total_matches = count(
        conn,
        "SELECT COUNT(DISTINCT match_id) FROM match_teams WHERE team_id = ?1",
        team_id,
    )?;

    let mut stmt = conn
        .prepare(
            "SELECT mt.is_home_team, mr.home_goals, mr.away_goals
             FROM match_teams mt
             JOIN match_results mr
               ON mr.match_id = mt.match_id AND mr.result_type_id = ?2
             WHERE mt.team_id = ?1",
        )
        .context("prepare team results query")?;
    let rows = stmt
        .query_map(params![team_id, FINAL_RESULT_TYPE_ID], |row| {
            let is_home: bool = row.get(0)?;
            let home: i64 = row.get(1)?;
            let away: i64 = row.get(2)?;
            Ok(if is_home { (home, away) } else { (away, home) })
        })
        .context("query team results")?;
    let mut scores = Vec::new();
    for row in rows {
        scores.push(row.context("read team result")?);
    }

    let common_opponents = team_appearances(
        conn,
        "SELECT t.id, t.name, COUNT(DISTINCT o.match_id) AS matches
         FROM match_teams mt
         JOIN match_teams o ON o.match_id = mt.match_id AND o.team_id <> mt.team_id
         JOIN teams t ON t.id = o.team_id
         WHERE mt.team_id = ?1
         GROUP BY t.id
         ORDER BY matches DESC, t.id
         LIMIT ?2 OFFSET ?3",
        params![team_id, page.limit as i64, page.offset as i64],
    )?;

    let own_goals = event_type_ids(conn, is_own_goal)?;
    let top_scorers = named_counts(
        conn,
        &format!(
            "SELECT p.id, p.first_name, p.last_name, COUNT(*) AS goals
             FROM match_events e
             JOIN event_types et ON et.id = e.event_type_id
             JOIN match_participants mp ON mp.id = e.participant_id
             JOIN match_teams mt ON mt.id = mp.match_team_id
             JOIN persons p ON p.id = mp.player_id
             WHERE et.is_goal = 1 AND e.event_type_id NOT IN ({own_goals}) AND mt.team_id = ?1
             GROUP BY p.id
             ORDER BY goals DESC, p.id
             LIMIT ?2 OFFSET ?3"
        ),
        params![team_id, page.limit as i64, page.offset as i64],
    )?
    .into_iter()
    .map(|n| Scorer {
        id: n.id,
        name: n.name,
        goals: n.count,
    })
    .collect();

    Ok(Some(TeamStats {
        team_id,
        name,
        total_matches,
        results: tally_results(&scores),
        common_opponents,
        top_scorers,
    }))
}

pub fn match_stats(conn: &Connection, match_id: i64) -> Result<Option<MatchStats>> {
    let header = conn
        .query_row(
            "SELECT m.fogis_id, m.date, m.time, c.name
             FROM matches m JOIN competitions c ON c.id = m.competition_id
             WHERE m.id = ?1",
            params![match_id],
            |row| {
                Ok((
                    row.get::<_, Option<String>>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        )
        .optional()
        .context("lookup match")?;
    let Some((fogis_id, date, time, competition)) = header else {
        return Ok(None);
    };

    let mut home_team = None;
    let mut away_team = None;
    {
        let mut stmt = conn
            .prepare(
                "SELECT t.id, t.name, mt.is_home_team
                 FROM match_teams mt JOIN teams t ON t.id = mt.team_id
                 WHERE mt.match_id = ?1",
            )
            .context("prepare match teams query")?;
        let mut rows = stmt.query(params![match_id]).context("query match teams")?;
        while let Some(row) = rows.next().context("read match team")? {
            let team = TeamRef {
                id: row.get(0)?,
                name: row.get(1)?,
            };
            if row.get::<_, bool>(2)? {
                home_team = Some(team);
            } else {
                away_team = Some(team);
            }
        }
    }

    let score = conn
        .query_row(
            "SELECT home_goals, away_goals FROM match_results
             WHERE match_id = ?1 AND result_type_id = ?2
             ORDER BY id LIMIT 1",
            params![match_id, FINAL_RESULT_TYPE_ID],
            |row| Ok(format!("{}-{}", row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
        )
        .optional()
        .context("lookup final result")?
        .unwrap_or_else(|| "-".to_string());

    let mut officials = Vec::new();
    {
        let mut stmt = conn
            .prepare(
                "SELECT r.id, p.first_name, p.last_name, rr.name
                 FROM referee_assignments ra
                 JOIN referees r ON r.id = ra.referee_id
                 JOIN persons p ON p.id = r.person_id
                 JOIN referee_roles rr ON rr.id = ra.role_id
                 WHERE ra.match_id = ?1
                 ORDER BY ra.role_id, r.id",
            )
            .context("prepare officials query")?;
        let mut rows = stmt.query(params![match_id]).context("query officials")?;
        while let Some(row) = rows.next().context("read official")? {
            officials.push(Official {
                id: row.get(0)?,
                name: full_name(&row.get::<_, String>(1)?, &row.get::<_, String>(2)?),
                role: row.get(3)?,
            });
        }
    }

    let mut cards = Vec::new();
    let mut goals = Vec::new();
    {
        let mut stmt = conn
            .prepare(
                "SELECT p.id, p.first_name, p.last_name, t.name, et.name, e.minute,
                        et.is_card, et.is_goal, et.is_penalty
                 FROM match_events e
                 JOIN event_types et ON et.id = e.event_type_id
                 JOIN match_participants mp ON mp.id = e.participant_id
                 JOIN persons p ON p.id = mp.player_id
                 JOIN match_teams mt ON mt.id = e.match_team_id
                 JOIN teams t ON t.id = mt.team_id
                 WHERE e.match_id = ?1 AND (et.is_card = 1 OR et.is_goal = 1)
                 ORDER BY e.minute IS NULL, e.minute, e.id",
            )
            .context("prepare match events query")?;
        let mut rows = stmt.query(params![match_id]).context("query match events")?;
        while let Some(row) = rows.next().context("read match event")? {
            let player_id: i64 = row.get(0)?;
            let player = full_name(&row.get::<_, String>(1)?, &row.get::<_, String>(2)?);
            let team: String = row.get(3)?;
            let type_name: String = row.get(4)?;
            let minute: Option<i64> = row.get(5)?;
            if row.get::<_, bool>(6)? {
                cards.push(CardEntry {
                    player_id,
                    player,
                    team,
                    card: card_colour(&type_name),
                    minute,
                });
            } else if row.get::<_, bool>(7)? {
                goals.push(GoalEntry {
                    scorer_id: player_id,
                    scorer: player,
                    team,
                    minute,
                    is_penalty: row.get(8)?,
                    is_own_goal: is_own_goal(&type_name),
                });
            }
        }
    }

    Ok(Some(MatchStats {
        match_id,
        fogis_id,
        date,
        time,
        competition,
        home_team,
        away_team,
        score,
        officials,
        cards,
        goals,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tally_counts_results_from_own_perspective() {
        let tally = tally_results(&[(2, 0), (1, 1), (2, 1), (0, 0), (0, 3)]);
        assert_eq!(
            tally,
            ResultTally {
                wins: 2,
                draws: 2,
                losses: 1,
                goals_for: 5,
                goals_against: 5,
            }
        );
        assert_eq!(tally_results(&[]), ResultTally::default());
    }

    #[test]
    fn card_names_map_to_colours() {
        assert_eq!(card_colour("Yellow Card"), CardColour::Yellow);
        assert_eq!(card_colour("Gult kort"), CardColour::Yellow);
        assert_eq!(card_colour("Varning"), CardColour::Yellow);
        assert_eq!(card_colour("Red Card (Other Reasons)"), CardColour::Red);
        assert_eq!(card_colour("Utvisning"), CardColour::Red);
    }

    #[test]
    fn own_goals_are_recognised() {
        assert!(is_own_goal("Own Goal"));
        assert!(is_own_goal("Självmål"));
        assert!(!is_own_goal("Penalty Goal"));
    }

    #[test]
    fn default_page_is_first_five() {
        assert_eq!(Page::default(), Page::new(5, 0));
    }
}

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Savepoint, params};

use super::mapper::{
    AssignmentRecord, CompetitionRecord, EventRecord, EventTypeRecord, MappedRecord, MatchRecord,
    ParticipantRecord, PersonRecord, ResultRecord, TeamContactRecord, TeamRecord, VenueRecord,
};
use crate::db::bool_to_i64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Imported,
    Skipped(String),
}

pub fn apply(sp: &mut Savepoint<'_>, record: &MappedRecord) -> Result<Outcome> {
    match record {
        MappedRecord::Match(m) => import_match(sp, m),
        MappedRecord::Result(r) => import_result(sp, r),
        MappedRecord::Event(e) => import_event(sp, e),
        MappedRecord::Participant(p) => import_participant(sp, p),
        MappedRecord::Player(p) => {
            upsert_person(sp, p)?;
            Ok(Outcome::Imported)
        }
        MappedRecord::TeamStaff(c) => import_team_contact(sp, c),
    }
}

fn import_match(sp: &mut Savepoint<'_>, m: &MatchRecord) -> Result<Outcome> {
    if let Some(venue) = &m.venue {
        upsert_venue(sp, venue)?;
    }
    upsert_competition(sp, &m.competition)?;
    let match_id = upsert_match(sp, m)?;

    for (team, is_home) in [(&m.home, true), (&m.away, false)] {
        if let Some(team) = team {
            upsert_team(sp, team)?;
            upsert_match_team(sp, match_id, team, is_home)?;
        }
    }

    for assignment in &m.assignments {
        let assignment = match assignment {
            Ok(a) => a,
            Err(err) => {
                log::error!("skipping referee assignment in match {}: {err}", m.fogis_id);
                continue;
            }
        };
        let nested = sp.savepoint().context("open assignment savepoint")?;
        match upsert_assignment(&nested, match_id, assignment) {
            Ok(()) => nested.commit().context("release assignment savepoint")?,
            Err(err) => log::error!(
                "failed to import referee {} for match {}: {err:#}",
                assignment.referee_id,
                m.fogis_id
            ),
        }
    }

    Ok(Outcome::Imported)
}

fn import_result(conn: &Connection, r: &ResultRecord) -> Result<Outcome> {
    let Some(match_id) = find_match(conn, r.match_fogis_id)? else {
        return Ok(Outcome::Skipped(format!(
            "match {} not found for result",
            r.match_fogis_id
        )));
    };
    ensure_result_type(conn, r.result_type_id, &r.result_type_name)?;

    let mut existing = None;
    if let Some(fogis_id) = r.fogis_id {
        existing = conn
            .query_row(
                "SELECT id FROM match_results WHERE fogis_id = ?1",
                params![fogis_id.to_string()],
                |row| row.get::<_, i64>(0),
            )
            .optional()
            .context("lookup match result by fogis id")?;
    }
    if existing.is_none() {
        existing = conn
            .query_row(
                "SELECT id FROM match_results WHERE match_id = ?1 AND result_type_id = ?2",
                params![match_id, r.result_type_id],
                |row| row.get::<_, i64>(0),
            )
            .optional()
            .context("lookup match result by type")?;
    }

    let fogis_id = r.fogis_id.map(|id| id.to_string());
    match existing {
        Some(id) => {
            conn.execute(
                "UPDATE match_results
                 SET home_goals = ?2, away_goals = ?3, result_type_id = ?4,
                     fogis_id = COALESCE(?5, fogis_id)
                 WHERE id = ?1",
                params![id, r.home_goals, r.away_goals, r.result_type_id, fogis_id],
            )
            .context("update match result")?;
        }
        None => {
            let id = match r.fogis_id {
                Some(id) => id,
                None => local_id(conn, "match_results")?,
            };
            conn.execute(
                "INSERT INTO match_results (id, match_id, result_type_id, home_goals, away_goals, fogis_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    id,
                    match_id,
                    r.result_type_id,
                    r.home_goals,
                    r.away_goals,
                    fogis_id
                ],
            )
            .context("insert match result")?;
        }
    }
    Ok(Outcome::Imported)
}

fn import_participant(conn: &Connection, p: &ParticipantRecord) -> Result<Outcome> {
    let Some(match_id) = find_match(conn, p.match_fogis_id)? else {
        return Ok(Outcome::Skipped(format!(
            "match {} not found for participant {}",
            p.match_fogis_id, p.id
        )));
    };
    let Some(match_team_id) = resolve_match_team(conn, match_id, p.match_team_fogis_id, p.team_id)?
    else {
        return Ok(Outcome::Skipped(format!(
            "match team {} not found for participant {}",
            p.match_team_fogis_id, p.id
        )));
    };

    upsert_person(conn, &p.person)?;
    conn.execute(
        r#"
        INSERT INTO match_participants (
            id, match_id, match_team_id, player_id, jersey_number, is_captain, is_substitute,
            substitution_in_minute, substitution_out_minute, is_playing_leader, is_responsible,
            accumulated_warnings, suspension_description, fogis_id
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
        ON CONFLICT(id) DO UPDATE SET
            match_id = excluded.match_id,
            match_team_id = excluded.match_team_id,
            player_id = excluded.player_id,
            jersey_number = excluded.jersey_number,
            is_captain = excluded.is_captain,
            is_substitute = excluded.is_substitute,
            substitution_in_minute = excluded.substitution_in_minute,
            substitution_out_minute = excluded.substitution_out_minute,
            is_playing_leader = excluded.is_playing_leader,
            is_responsible = excluded.is_responsible,
            accumulated_warnings = excluded.accumulated_warnings,
            suspension_description = excluded.suspension_description
        "#,
        params![
            p.id,
            match_id,
            match_team_id,
            p.person.id,
            p.jersey_number,
            bool_to_i64(p.is_captain),
            bool_to_i64(p.is_substitute),
            p.substitution_in_minute,
            p.substitution_out_minute,
            bool_to_i64(p.is_playing_leader),
            bool_to_i64(p.is_responsible),
            p.accumulated_warnings,
            p.suspension_description,
            p.id.to_string(),
        ],
    )
    .with_context(|| format!("upsert participant {}", p.id))?;
    Ok(Outcome::Imported)
}

fn import_event(conn: &Connection, e: &EventRecord) -> Result<Outcome> {
    let Some(match_id) = find_match(conn, e.match_fogis_id)? else {
        return Ok(Outcome::Skipped(format!(
            "match {} not found for event",
            e.match_fogis_id
        )));
    };
    let participant_team = conn
        .query_row(
            "SELECT match_team_id FROM match_participants WHERE id = ?1 AND match_id = ?2",
            params![e.participant_id, match_id],
            |row| row.get::<_, i64>(0),
        )
        .optional()
        .context("lookup event participant")?;
    let Some(participant_team) = participant_team else {
        return Ok(Outcome::Skipped(format!(
            "participant {} not found in match {} for event",
            e.participant_id, e.match_fogis_id
        )));
    };
    let match_team_id = find_match_team_by_fogis(conn, match_id, e.match_team_fogis_id)?
        .unwrap_or(participant_team);

    ensure_event_type(conn, &e.event_type)?;

    let related_event_id = match e.related_event_id {
        Some(id) if event_exists(conn, id)? => Some(id),
        Some(id) => {
            log::debug!("related event {id} not imported yet, storing none");
            None
        }
        None => None,
    };

    let existing = match e.fogis_id {
        Some(id) => Some(id),
        None => conn
            .query_row(
                "SELECT id FROM match_events
                 WHERE match_id = ?1 AND participant_id = ?2 AND event_type_id = ?3
                   AND minute IS ?4 AND fogis_id IS NULL",
                params![match_id, e.participant_id, e.event_type.id, e.minute],
                |row| row.get::<_, i64>(0),
            )
            .optional()
            .context("lookup event without id")?,
    };
    let id = match existing {
        Some(id) => id,
        None => local_id(conn, "match_events")?,
    };

    conn.execute(
        r#"
        INSERT INTO match_events (
            id, match_id, participant_id, event_type_id, match_team_id, minute, period, comment,
            home_score, away_score, position_x, position_y, related_event_id, fogis_id
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
        ON CONFLICT(id) DO UPDATE SET
            match_id = excluded.match_id,
            participant_id = excluded.participant_id,
            event_type_id = excluded.event_type_id,
            match_team_id = excluded.match_team_id,
            minute = excluded.minute,
            period = excluded.period,
            comment = excluded.comment,
            home_score = excluded.home_score,
            away_score = excluded.away_score,
            position_x = excluded.position_x,
            position_y = excluded.position_y,
            related_event_id = excluded.related_event_id
        "#,
        params![
            id,
            match_id,
            e.participant_id,
            e.event_type.id,
            match_team_id,
            e.minute,
            e.period,
            e.comment,
            e.home_score,
            e.away_score,
            e.position_x,
            e.position_y,
            related_event_id,
            e.fogis_id.map(|id| id.to_string()),
        ],
    )
    .context("upsert match event")?;
    Ok(Outcome::Imported)
}

fn import_team_contact(conn: &Connection, c: &TeamContactRecord) -> Result<Outcome> {
    let team_exists = conn
        .query_row("SELECT 1 FROM teams WHERE id = ?1", params![c.team_id], |_| Ok(()))
        .optional()
        .context("lookup team")?
        .is_some();
    if !team_exists {
        return Ok(Outcome::Skipped(format!(
            "team {} not found for staff member {}",
            c.team_id, c.person.id
        )));
    }
    upsert_person(conn, &c.person)?;
    conn.execute(
        "INSERT INTO team_contacts (team_id, person_id, is_reserve) VALUES (?1, ?2, ?3)
         ON CONFLICT(team_id, person_id) DO UPDATE SET is_reserve = excluded.is_reserve",
        params![c.team_id, c.person.id, bool_to_i64(c.is_reserve)],
    )
    .context("upsert team contact")?;
    Ok(Outcome::Imported)
}

pub fn find_match(conn: &Connection, fogis_id: i64) -> Result<Option<i64>> {
    conn.query_row(
        "SELECT id FROM matches WHERE fogis_id = ?1",
        params![fogis_id.to_string()],
        |row| row.get(0),
    )
    .optional()
    .context("lookup match by fogis id")
}

fn find_match_team_by_fogis(conn: &Connection, match_id: i64, fogis_id: i64) -> Result<Option<i64>> {
    conn.query_row(
        "SELECT id FROM match_teams WHERE match_id = ?1 AND fogis_id = ?2",
        params![match_id, fogis_id.to_string()],
        |row| row.get(0),
    )
    .optional()
    .context("lookup match team by fogis id")
}

/// Match team for a `matchlagid`; falls back to the team id and stamps the
/// FOGIS id on the row it finds.
fn resolve_match_team(
    conn: &Connection,
    match_id: i64,
    fogis_id: i64,
    team_id: Option<i64>,
) -> Result<Option<i64>> {
    if let Some(id) = find_match_team_by_fogis(conn, match_id, fogis_id)? {
        return Ok(Some(id));
    }
    let Some(team_id) = team_id else {
        return Ok(None);
    };
    let found = conn
        .query_row(
            "SELECT id FROM match_teams WHERE match_id = ?1 AND team_id = ?2",
            params![match_id, team_id],
            |row| row.get::<_, i64>(0),
        )
        .optional()
        .context("lookup match team by team id")?;
    if let Some(id) = found {
        conn.execute(
            "UPDATE match_teams SET fogis_id = ?2 WHERE id = ?1",
            params![id, fogis_id.to_string()],
        )
        .context("stamp match team fogis id")?;
    }
    Ok(found)
}

/// Next id for a row FOGIS gave no id. These count down from -1 so they
/// never take a positive FOGIS id a later record may carry.
fn local_id(conn: &Connection, table: &str) -> Result<i64> {
    conn.query_row(
        &format!("SELECT MIN(COALESCE(MIN(id), 0), 0) - 1 FROM {table}"),
        [],
        |row| row.get(0),
    )
    .with_context(|| format!("allocate local id in {table}"))
}

fn event_exists(conn: &Connection, id: i64) -> Result<bool> {
    Ok(conn
        .query_row("SELECT 1 FROM match_events WHERE id = ?1", params![id], |_| Ok(()))
        .optional()
        .context("lookup related event")?
        .is_some())
}

pub fn upsert_venue(conn: &Connection, v: &VenueRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO venues (id, name, latitude, longitude) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            latitude = COALESCE(excluded.latitude, venues.latitude),
            longitude = COALESCE(excluded.longitude, venues.longitude)",
        params![v.id, v.name, v.latitude, v.longitude],
    )
    .with_context(|| format!("upsert venue {}", v.id))?;
    Ok(())
}

pub fn upsert_competition(conn: &Connection, c: &CompetitionRecord) -> Result<()> {
    if let Some(category) = &c.category {
        conn.execute(
            "INSERT INTO competition_categories (id, name) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name",
            params![category.id, category.name],
        )
        .with_context(|| format!("upsert competition category {}", category.id))?;
    }
    conn.execute(
        r#"
        INSERT INTO competitions (id, name, season, category_id, gender_id, age_category_id, fogis_id)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            season = excluded.season,
            category_id = COALESCE(excluded.category_id, competitions.category_id),
            gender_id = COALESCE(excluded.gender_id, competitions.gender_id),
            age_category_id = COALESCE(excluded.age_category_id, competitions.age_category_id),
            fogis_id = COALESCE(excluded.fogis_id, competitions.fogis_id)
        "#,
        params![
            c.id,
            c.name,
            c.season,
            c.category.as_ref().map(|cat| cat.id),
            c.gender_id,
            c.age_category_id,
            c.fogis_id,
        ],
    )
    .with_context(|| format!("upsert competition {}", c.id))?;
    Ok(())
}

pub fn upsert_team(conn: &Connection, t: &TeamRecord) -> Result<()> {
    // Existing clubs keep their name; the derived one is a placeholder.
    conn.execute(
        "INSERT INTO clubs (id, name, fogis_id) VALUES (?1, ?2, ?3)
         ON CONFLICT(id) DO NOTHING",
        params![t.club_id, t.club_name, t.club_id.to_string()],
    )
    .with_context(|| format!("ensure club {}", t.club_id))?;
    conn.execute(
        "INSERT INTO teams (id, name, club_id, fogis_id) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(id) DO UPDATE SET name = excluded.name, club_id = excluded.club_id",
        params![t.id, t.name, t.club_id, t.id.to_string()],
    )
    .with_context(|| format!("upsert team {}", t.id))?;
    Ok(())
}

fn upsert_match(conn: &Connection, m: &MatchRecord) -> Result<i64> {
    let existing = conn
        .query_row(
            "SELECT id FROM matches WHERE fogis_id = ?1",
            params![m.fogis_id],
            |row| row.get::<_, i64>(0),
        )
        .optional()
        .context("lookup match")?;
    let date = m.date.format("%Y-%m-%d").to_string();
    let venue_id = m.venue.as_ref().map(|v| v.id);

    match existing {
        Some(id) => {
            conn.execute(
                r#"
                UPDATE matches SET
                    match_nr = ?2, date = ?3, time = ?4, venue_id = ?5, competition_id = ?6,
                    football_type_id = ?7, spectators = ?8, status = ?9, is_walkover = ?10
                WHERE id = ?1
                "#,
                params![
                    id,
                    m.match_nr,
                    date,
                    m.time,
                    venue_id,
                    m.competition.id,
                    m.football_type_id,
                    m.spectators,
                    m.status,
                    bool_to_i64(m.is_walkover),
                ],
            )
            .with_context(|| format!("update match {}", m.fogis_id))?;
            Ok(id)
        }
        None => {
            conn.execute(
                r#"
                INSERT INTO matches (
                    match_nr, date, time, venue_id, competition_id, football_type_id,
                    spectators, status, is_walkover, fogis_id
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
                params![
                    m.match_nr,
                    date,
                    m.time,
                    venue_id,
                    m.competition.id,
                    m.football_type_id,
                    m.spectators,
                    m.status,
                    bool_to_i64(m.is_walkover),
                    m.fogis_id,
                ],
            )
            .with_context(|| format!("insert match {}", m.fogis_id))?;
            Ok(conn.last_insert_rowid())
        }
    }
}

fn upsert_match_team(conn: &Connection, match_id: i64, t: &TeamRecord, is_home: bool) -> Result<()> {
    conn.execute(
        "INSERT INTO match_teams (match_id, team_id, is_home_team, fogis_id) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(match_id, team_id) DO UPDATE SET
            is_home_team = excluded.is_home_team,
            fogis_id = COALESCE(excluded.fogis_id, match_teams.fogis_id)",
        params![match_id, t.id, bool_to_i64(is_home), t.match_team_fogis_id],
    )
    .with_context(|| format!("upsert match team {} for match {match_id}", t.id))?;
    Ok(())
}

pub fn upsert_person(conn: &Connection, p: &PersonRecord) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO persons (
            id, first_name, last_name, personal_number, email, phone, address,
            postal_code, city, country, fogis_id
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, COALESCE(?10, 'Sweden'), ?11)
        ON CONFLICT(id) DO UPDATE SET
            first_name = CASE WHEN excluded.first_name <> '' THEN excluded.first_name ELSE persons.first_name END,
            last_name = CASE WHEN excluded.last_name <> '' THEN excluded.last_name ELSE persons.last_name END,
            personal_number = COALESCE(excluded.personal_number, persons.personal_number),
            email = COALESCE(excluded.email, persons.email),
            phone = COALESCE(excluded.phone, persons.phone),
            address = COALESCE(excluded.address, persons.address),
            postal_code = COALESCE(excluded.postal_code, persons.postal_code),
            city = COALESCE(excluded.city, persons.city),
            country = COALESCE(?10, persons.country)
        "#,
        params![
            p.id,
            p.first_name,
            p.last_name,
            p.personal_number,
            p.email,
            p.phone,
            p.address,
            p.postal_code,
            p.city,
            p.country,
            p.id.to_string(),
        ],
    )
    .with_context(|| format!("upsert person {}", p.id))?;
    Ok(())
}

fn upsert_assignment(conn: &Connection, match_id: i64, a: &AssignmentRecord) -> Result<()> {
    upsert_person(conn, &a.person)?;
    conn.execute(
        "INSERT INTO referees (id, person_id, fogis_id) VALUES (?1, ?2, ?3)
         ON CONFLICT(id) DO UPDATE SET person_id = excluded.person_id",
        params![a.referee_id, a.person.id, a.referee_id.to_string()],
    )
    .with_context(|| format!("upsert referee {}", a.referee_id))?;
    conn.execute(
        "INSERT INTO referee_roles (id, name, short_name) VALUES (?1, ?2, ?3)
         ON CONFLICT(id) DO NOTHING",
        params![a.role_id, a.role_name, a.role_short_name],
    )
    .with_context(|| format!("ensure referee role {}", a.role_id))?;
    conn.execute(
        "INSERT INTO referee_assignments (match_id, referee_id, role_id, status, fogis_id)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(match_id, referee_id, role_id) DO UPDATE SET
            status = excluded.status,
            fogis_id = COALESCE(excluded.fogis_id, referee_assignments.fogis_id)",
        params![match_id, a.referee_id, a.role_id, a.status, a.fogis_id],
    )
    .context("upsert referee assignment")?;
    Ok(())
}

fn ensure_result_type(conn: &Connection, id: i64, name: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO result_types (id, name) VALUES (?1, ?2) ON CONFLICT(id) DO NOTHING",
        params![id, name],
    )
    .with_context(|| format!("ensure result type {id}"))?;
    Ok(())
}

fn ensure_event_type(conn: &Connection, t: &EventTypeRecord) -> Result<()> {
    let f = t.flags;
    let created = conn
        .execute(
            "INSERT INTO event_types
                (id, name, is_goal, is_penalty, is_card, is_substitution, is_control_event, affects_score)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(id) DO NOTHING",
            params![
                t.id,
                t.name,
                bool_to_i64(f.is_goal),
                bool_to_i64(f.is_penalty),
                bool_to_i64(f.is_card),
                bool_to_i64(f.is_substitution),
                bool_to_i64(f.is_control_event),
                bool_to_i64(f.affects_score),
            ],
        )
        .with_context(|| format!("ensure event type {}", t.id))?;
    if created > 0 {
        log::info!("created event type {} ({})", t.id, t.name);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::import::mapper::CategoryRecord;

    fn person(id: i64, first: &str, last: &str) -> PersonRecord {
        PersonRecord {
            id,
            first_name: first.into(),
            last_name: last.into(),
            personal_number: None,
            email: None,
            phone: None,
            address: None,
            postal_code: None,
            city: None,
            country: None,
        }
    }

    #[test]
    fn person_upsert_keeps_names_and_contacts() {
        let conn = db::open_in_memory().unwrap();
        let mut p = person(7, "Anna", "Berg");
        p.email = Some("anna@example.com".into());
        upsert_person(&conn, &p).unwrap();
        upsert_person(&conn, &person(7, "", "")).unwrap();

        let (first, last, email, country): (String, String, Option<String>, String) = conn
            .query_row(
                "SELECT first_name, last_name, email, country FROM persons WHERE id = 7",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
            )
            .unwrap();
        assert_eq!((first.as_str(), last.as_str()), ("Anna", "Berg"));
        assert_eq!(email.as_deref(), Some("anna@example.com"));
        assert_eq!(country, "Sweden");
    }

    #[test]
    fn existing_club_keeps_its_name() {
        let conn = db::open_in_memory().unwrap();
        conn.execute("INSERT INTO clubs (id, name) VALUES (5, 'Hestrafors Idrottsförening')", [])
            .unwrap();
        let team = TeamRecord {
            id: 50,
            name: "Hestrafors IF".into(),
            club_id: 5,
            club_name: "Hestrafors".into(),
            match_team_fogis_id: None,
        };
        upsert_team(&conn, &team).unwrap();
        let name: String = conn
            .query_row("SELECT name FROM clubs WHERE id = 5", [], |r| r.get(0))
            .unwrap();
        assert_eq!(name, "Hestrafors Idrottsförening");
    }

    #[test]
    fn local_ids_count_down_below_fogis_ids() {
        let conn = db::open_in_memory().unwrap();
        assert_eq!(local_id(&conn, "match_results").unwrap(), -1);
        conn.execute_batch(
            "INSERT INTO result_types (id, name) VALUES (1, 'Slutresultat');
             INSERT INTO venues (id, name) VALUES (1, 'Vallen');
             INSERT INTO competitions (id, name) VALUES (1, 'Div 2');
             INSERT INTO matches (id, match_nr, date, time, competition_id, football_type_id)
                 VALUES (1, '1', '2025-04-11', '19:00', 1, 1);
             INSERT INTO match_results (id, match_id, result_type_id, home_goals, away_goals)
                 VALUES (4660867, 1, 1, 2, 1), (-1, 1, 1, 0, 0);",
        )
        .unwrap();
        assert_eq!(local_id(&conn, "match_results").unwrap(), -2);
    }

    #[test]
    fn competition_keeps_category_when_absent() {
        let conn = db::open_in_memory().unwrap();
        let mut comp = CompetitionRecord {
            id: 1,
            name: "Div 2 2025".into(),
            season: "2025".into(),
            category: Some(CategoryRecord { id: 9, name: "Division 2".into() }),
            gender_id: None,
            age_category_id: None,
            fogis_id: None,
        };
        upsert_competition(&conn, &comp).unwrap();
        comp.category = None;
        upsert_competition(&conn, &comp).unwrap();
        let category: Option<i64> = conn
            .query_row("SELECT category_id FROM competitions WHERE id = 1", [], |r| r.get(0))
            .unwrap();
        assert_eq!(category, Some(9));
    }
}

use anyhow::{Context, Result};
use rusqlite::{Connection, params};

use crate::db::bool_to_i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventClass {
    Goal,
    PenaltyGoal,
    Penalty,
    Card,
    Substitution,
    Control,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventFlags {
    pub is_goal: bool,
    pub is_penalty: bool,
    pub is_card: bool,
    pub is_substitution: bool,
    pub is_control_event: bool,
    pub affects_score: bool,
}

impl EventClass {
    pub fn flags(self) -> EventFlags {
        let mut flags = EventFlags::default();
        match self {
            EventClass::Goal => {
                flags.is_goal = true;
                flags.affects_score = true;
            }
            EventClass::PenaltyGoal => {
                flags.is_goal = true;
                flags.is_penalty = true;
                flags.affects_score = true;
            }
            EventClass::Penalty => flags.is_penalty = true,
            EventClass::Card => flags.is_card = true,
            EventClass::Substitution => flags.is_substitution = true,
            EventClass::Control => flags.is_control_event = true,
        }
        flags
    }
}

pub const EVENT_TYPES: &[(i64, &str, EventClass)] = &[
    (6, "Regular Goal", EventClass::Goal),
    (39, "Header Goal", EventClass::Goal),
    (28, "Corner Goal", EventClass::Goal),
    (29, "Free Kick Goal", EventClass::Goal),
    (15, "Own Goal", EventClass::Goal),
    (14, "Penalty Goal", EventClass::PenaltyGoal),
    (18, "Penalty Missing Goal", EventClass::Penalty),
    (19, "Penalty Save", EventClass::Penalty),
    (26, "Penalty Hitting the Frame", EventClass::Penalty),
    (20, "Yellow Card", EventClass::Card),
    (8, "Red Card (Denying Goal Opportunity)", EventClass::Card),
    (9, "Red Card (Other Reasons)", EventClass::Card),
    (16, "Substitution Out", EventClass::Substitution),
    (17, "Substitution In", EventClass::Substitution),
    (31, "Period Start", EventClass::Control),
    (32, "Period End", EventClass::Control),
    (23, "Match End", EventClass::Control),
];

pub const RESULT_TYPES: &[(i64, &str)] = &[
    (1, "Final Result"),
    (2, "Half-time Result"),
    (3, "Extra Time Result"),
    (4, "Penalty Shootout Result"),
];

pub const FINAL_RESULT_TYPE_ID: i64 = 1;

pub const REFEREE_ROLES: &[(i64, &str, &str)] = &[
    (1, "Huvuddomare", "Dom"),
    (2, "Assisterande 1", "AD1"),
    (3, "Assisterande 2", "AD2"),
    (4, "Fjärdedomare", "4th"),
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub event_types: usize,
    pub result_types: usize,
    pub referee_roles: usize,
}

pub fn seed_all(conn: &Connection) -> Result<SeedReport> {
    let report = SeedReport {
        event_types: seed_event_types(conn)?,
        result_types: seed_result_types(conn)?,
        referee_roles: seed_referee_roles(conn)?,
    };
    log::info!(
        "reference data seeded: {} event types, {} result types, {} referee roles",
        report.event_types,
        report.result_types,
        report.referee_roles
    );
    Ok(report)
}

fn table_has_rows(conn: &Connection, table: &str) -> Result<bool> {
    let count = conn
        .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
            row.get::<_, i64>(0)
        })
        .with_context(|| format!("count {table}"))?;
    Ok(count > 0)
}

pub fn seed_event_types(conn: &Connection) -> Result<usize> {
    if table_has_rows(conn, "event_types")? {
        log::info!("event types already initialized, skipping");
        return Ok(0);
    }
    let mut stmt = conn
        .prepare(
            "INSERT INTO event_types
                (id, name, is_goal, is_penalty, is_card, is_substitution, is_control_event, affects_score)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .context("prepare event type insert")?;
    for (id, name, class) in EVENT_TYPES {
        let f = class.flags();
        stmt.execute(params![
            id,
            name,
            bool_to_i64(f.is_goal),
            bool_to_i64(f.is_penalty),
            bool_to_i64(f.is_card),
            bool_to_i64(f.is_substitution),
            bool_to_i64(f.is_control_event),
            bool_to_i64(f.affects_score),
        ])
        .with_context(|| format!("insert event type {id}"))?;
    }
    Ok(EVENT_TYPES.len())
}

pub fn seed_result_types(conn: &Connection) -> Result<usize> {
    if table_has_rows(conn, "result_types")? {
        log::info!("result types already initialized, skipping");
        return Ok(0);
    }
    for (id, name) in RESULT_TYPES {
        conn.execute(
            "INSERT INTO result_types (id, name) VALUES (?1, ?2)",
            params![id, name],
        )
        .with_context(|| format!("insert result type {id}"))?;
    }
    Ok(RESULT_TYPES.len())
}

pub fn seed_referee_roles(conn: &Connection) -> Result<usize> {
    if table_has_rows(conn, "referee_roles")? {
        log::info!("referee roles already initialized, skipping");
        return Ok(0);
    }
    for (id, name, short_name) in REFEREE_ROLES {
        conn.execute(
            "INSERT INTO referee_roles (id, name, short_name) VALUES (?1, ?2, ?3)",
            params![id, name, short_name],
        )
        .with_context(|| format!("insert referee role {id}"))?;
    }
    Ok(REFEREE_ROLES.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    #[test]
    fn seeding_twice_is_a_no_op() {
        let conn = db::open_in_memory().unwrap();
        let first = seed_all(&conn).unwrap();
        assert_eq!(first.event_types, EVENT_TYPES.len());
        assert_eq!(first.result_types, 4);
        assert_eq!(first.referee_roles, 4);

        let second = seed_all(&conn).unwrap();
        assert_eq!(second, SeedReport::default());
    }

    #[test]
    fn penalty_goal_counts_as_goal_and_penalty() {
        let f = EventClass::PenaltyGoal.flags();
        assert!(f.is_goal && f.is_penalty && f.affects_score);
        assert!(!f.is_card);
    }
}

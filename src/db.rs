use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;

pub const SCHEMA_VERSION: i64 = 2;

// Parents before children; `reset` drops in reverse.
pub const TABLES: &[&str] = &[
    "persons",
    "clubs",
    "teams",
    "team_contacts",
    "venues",
    "competition_categories",
    "competitions",
    "matches",
    "match_teams",
    "result_types",
    "match_results",
    "referees",
    "referee_roles",
    "referee_assignments",
    "match_participants",
    "event_types",
    "match_events",
    "import_runs",
];

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create database directory {}", parent.display()))?;
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    conn.execute_batch("PRAGMA journal_mode = WAL;")
        .context("enable wal journal")?;
    configure(&conn)?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("open in-memory sqlite db")?;
    configure(&conn)?;
    init_schema(&conn)?;
    Ok(conn)
}

fn configure(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")
        .context("enable foreign keys")?;
    Ok(())
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS persons (
            id INTEGER PRIMARY KEY,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            personal_number TEXT NULL,
            email TEXT NULL,
            phone TEXT NULL,
            address TEXT NULL,
            postal_code TEXT NULL,
            city TEXT NULL,
            country TEXT NULL DEFAULT 'Sweden',
            fogis_id TEXT NULL
        );

        CREATE TABLE IF NOT EXISTS clubs (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            fogis_id TEXT NULL
        );

        CREATE TABLE IF NOT EXISTS teams (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            club_id INTEGER NOT NULL REFERENCES clubs(id),
            fogis_id TEXT NULL
        );

        CREATE TABLE IF NOT EXISTS team_contacts (
            team_id INTEGER NOT NULL REFERENCES teams(id),
            person_id INTEGER NOT NULL REFERENCES persons(id),
            is_reserve INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (team_id, person_id)
        );

        CREATE TABLE IF NOT EXISTS venues (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            latitude REAL NULL,
            longitude REAL NULL
        );

        CREATE TABLE IF NOT EXISTS competition_categories (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS competitions (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            season TEXT NULL,
            category_id INTEGER NULL REFERENCES competition_categories(id),
            gender_id INTEGER NULL,
            age_category_id INTEGER NULL,
            fogis_id TEXT NULL
        );

        CREATE TABLE IF NOT EXISTS matches (
            id INTEGER PRIMARY KEY,
            match_nr TEXT NOT NULL,
            date TEXT NOT NULL,
            time TEXT NOT NULL,
            venue_id INTEGER NULL REFERENCES venues(id),
            competition_id INTEGER NOT NULL REFERENCES competitions(id),
            football_type_id INTEGER NOT NULL,
            spectators INTEGER NULL,
            status TEXT NOT NULL DEFAULT 'normal',
            is_walkover INTEGER NOT NULL DEFAULT 0,
            fogis_id TEXT NULL UNIQUE
        );
        CREATE INDEX IF NOT EXISTS idx_matches_date ON matches(date);
        CREATE INDEX IF NOT EXISTS idx_matches_competition ON matches(competition_id);

        CREATE TABLE IF NOT EXISTS match_teams (
            id INTEGER PRIMARY KEY,
            match_id INTEGER NOT NULL REFERENCES matches(id),
            team_id INTEGER NOT NULL REFERENCES teams(id),
            is_home_team INTEGER NOT NULL,
            fogis_id TEXT NULL,
            UNIQUE (match_id, team_id)
        );
        CREATE INDEX IF NOT EXISTS idx_match_teams_fogis ON match_teams(fogis_id);
        CREATE INDEX IF NOT EXISTS idx_match_teams_team ON match_teams(team_id);

        CREATE TABLE IF NOT EXISTS result_types (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS match_results (
            id INTEGER PRIMARY KEY,
            match_id INTEGER NOT NULL REFERENCES matches(id),
            result_type_id INTEGER NOT NULL REFERENCES result_types(id),
            home_goals INTEGER NOT NULL,
            away_goals INTEGER NOT NULL,
            fogis_id TEXT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_match_results_match
            ON match_results(match_id, result_type_id);

        CREATE TABLE IF NOT EXISTS referees (
            id INTEGER PRIMARY KEY,
            person_id INTEGER NOT NULL REFERENCES persons(id),
            referee_number TEXT NULL,
            fogis_id TEXT NULL
        );

        CREATE TABLE IF NOT EXISTS referee_roles (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            short_name TEXT NULL
        );

        CREATE TABLE IF NOT EXISTS referee_assignments (
            id INTEGER PRIMARY KEY,
            match_id INTEGER NOT NULL REFERENCES matches(id),
            referee_id INTEGER NOT NULL REFERENCES referees(id),
            role_id INTEGER NOT NULL REFERENCES referee_roles(id),
            status TEXT NULL,
            fogis_id TEXT NULL,
            UNIQUE (match_id, referee_id, role_id)
        );
        CREATE INDEX IF NOT EXISTS idx_referee_assignments_referee
            ON referee_assignments(referee_id);

        CREATE TABLE IF NOT EXISTS match_participants (
            id INTEGER PRIMARY KEY,
            match_id INTEGER NOT NULL REFERENCES matches(id),
            match_team_id INTEGER NOT NULL REFERENCES match_teams(id),
            player_id INTEGER NOT NULL REFERENCES persons(id),
            jersey_number INTEGER NULL,
            is_captain INTEGER NOT NULL DEFAULT 0,
            is_substitute INTEGER NOT NULL DEFAULT 0,
            substitution_in_minute INTEGER NULL,
            substitution_out_minute INTEGER NULL,
            team_section_id INTEGER NOT NULL DEFAULT 0,
            position_number INTEGER NOT NULL DEFAULT 0,
            ejection_info TEXT NULL,
            is_playing_leader INTEGER NOT NULL DEFAULT 0,
            is_responsible INTEGER NOT NULL DEFAULT 0,
            accumulated_warnings INTEGER NOT NULL DEFAULT 0,
            suspension_description TEXT NULL,
            fogis_id TEXT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_match_participants_player
            ON match_participants(player_id);
        CREATE INDEX IF NOT EXISTS idx_match_participants_match
            ON match_participants(match_id);

        CREATE TABLE IF NOT EXISTS event_types (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            is_goal INTEGER NOT NULL DEFAULT 0,
            is_penalty INTEGER NOT NULL DEFAULT 0,
            is_card INTEGER NOT NULL DEFAULT 0,
            is_substitution INTEGER NOT NULL DEFAULT 0,
            is_control_event INTEGER NOT NULL DEFAULT 0,
            affects_score INTEGER NOT NULL DEFAULT 0,
            description TEXT NULL
        );

        CREATE TABLE IF NOT EXISTS match_events (
            id INTEGER PRIMARY KEY,
            match_id INTEGER NOT NULL REFERENCES matches(id),
            participant_id INTEGER NOT NULL REFERENCES match_participants(id),
            event_type_id INTEGER NOT NULL REFERENCES event_types(id),
            match_team_id INTEGER NOT NULL REFERENCES match_teams(id),
            minute INTEGER NULL,
            period INTEGER NULL,
            comment TEXT NULL,
            home_score INTEGER NOT NULL,
            away_score INTEGER NOT NULL,
            position_x INTEGER NULL,
            position_y INTEGER NULL,
            related_event_id INTEGER NULL REFERENCES match_events(id),
            fogis_id TEXT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_match_events_match ON match_events(match_id);
        CREATE INDEX IF NOT EXISTS idx_match_events_participant
            ON match_events(participant_id);

        CREATE TABLE IF NOT EXISTS import_runs (
            run_id INTEGER PRIMARY KEY AUTOINCREMENT,
            source TEXT NOT NULL,
            format TEXT NOT NULL,
            kind TEXT NULL,
            started_at TEXT NOT NULL,
            finished_at TEXT NOT NULL,
            records_read INTEGER NOT NULL,
            records_imported INTEGER NOT NULL,
            records_skipped INTEGER NOT NULL,
            records_ignored INTEGER NOT NULL DEFAULT 0,
            errors_json TEXT NOT NULL
        );
        "#,
    )
    .context("create sqlite schema")?;
    migrate(conn)?;
    conn.pragma_update(None, "user_version", SCHEMA_VERSION)
        .context("stamp schema version")?;
    Ok(())
}

// Version 1 databases predate `import_runs.records_ignored`.
fn migrate(conn: &Connection) -> Result<()> {
    let has_ignored: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM pragma_table_info('import_runs') WHERE name = 'records_ignored'",
            [],
            |row| row.get(0),
        )
        .context("inspect import_runs columns")?;
    if has_ignored == 0 {
        conn.execute_batch(
            "ALTER TABLE import_runs ADD COLUMN records_ignored INTEGER NOT NULL DEFAULT 0;",
        )
        .context("add import_runs.records_ignored")?;
    }
    Ok(())
}

pub fn schema_version(conn: &Connection) -> Result<i64> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
        .context("read schema version")
}

pub fn reset(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = OFF;")
        .context("disable foreign keys for reset")?;
    for table in TABLES.iter().rev() {
        conn.execute_batch(&format!("DROP TABLE IF EXISTS {table};"))
            .with_context(|| format!("drop table {table}"))?;
    }
    configure(conn)?;
    init_schema(conn)
}

pub fn table_counts(conn: &Connection) -> Result<Vec<(&'static str, i64)>> {
    let mut out = Vec::with_capacity(TABLES.len());
    for table in TABLES {
        let count = conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                row.get::<_, i64>(0)
            })
            .with_context(|| format!("count rows in {table}"))?;
        out.push((*table, count));
    }
    Ok(out)
}

pub fn bool_to_i64(v: bool) -> i64 {
    if v { 1 } else { 0 }
}

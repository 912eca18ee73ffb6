use chrono::{Local, NaiveDate};
use thiserror::Error;

use super::fields::{
    club_name_from_team, contains_any, extract_season, get_bool, get_f64, get_i64, get_id,
    get_str, parse_date, split_full_name,
};
use super::record::{Record, RecordKind};
use crate::reference_data::EventFlags;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("{kind} record missing required field `{field}`")]
    MissingField {
        kind: RecordKind,
        field: &'static str,
    },
    #[error("match {match_id} has no competition (tavlingid/tavlingnamn)")]
    MissingCompetition { match_id: i64 },
}

fn require_id(rec: &Record, kind: RecordKind, field: &'static str) -> Result<i64, MappingError> {
    get_id(rec, field).ok_or(MappingError::MissingField { kind, field })
}

#[derive(Debug, Clone, PartialEq)]
pub struct VenueRecord {
    pub id: i64,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRecord {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompetitionRecord {
    pub id: i64,
    pub name: String,
    pub season: String,
    pub category: Option<CategoryRecord>,
    pub gender_id: Option<i64>,
    pub age_category_id: Option<i64>,
    pub fogis_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamRecord {
    pub id: i64,
    pub name: String,
    pub club_id: i64,
    pub club_name: String,
    pub match_team_fogis_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonRecord {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub personal_number: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentRecord {
    pub fogis_id: Option<String>,
    pub referee_id: i64,
    pub person: PersonRecord,
    pub role_id: i64,
    pub role_name: String,
    pub role_short_name: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchRecord {
    pub fogis_id: String,
    pub match_nr: String,
    pub date: NaiveDate,
    pub time: String,
    pub football_type_id: i64,
    pub spectators: Option<i64>,
    pub status: String,
    pub is_walkover: bool,
    pub venue: Option<VenueRecord>,
    pub competition: CompetitionRecord,
    pub home: Option<TeamRecord>,
    pub away: Option<TeamRecord>,
    pub assignments: Vec<Result<AssignmentRecord, MappingError>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRecord {
    pub fogis_id: Option<i64>,
    pub match_fogis_id: i64,
    pub result_type_id: i64,
    pub result_type_name: String,
    pub home_goals: i64,
    pub away_goals: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventTypeRecord {
    pub id: i64,
    pub name: String,
    pub flags: EventFlags,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub fogis_id: Option<i64>,
    pub match_fogis_id: i64,
    pub participant_id: i64,
    pub match_team_fogis_id: i64,
    pub event_type: EventTypeRecord,
    pub minute: Option<i64>,
    pub period: Option<i64>,
    pub comment: String,
    pub home_score: i64,
    pub away_score: i64,
    pub position_x: i64,
    pub position_y: i64,
    pub related_event_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantRecord {
    pub id: i64,
    pub match_fogis_id: i64,
    pub match_team_fogis_id: i64,
    pub team_id: Option<i64>,
    pub person: PersonRecord,
    pub jersey_number: Option<i64>,
    pub is_captain: bool,
    pub is_substitute: bool,
    pub substitution_in_minute: Option<i64>,
    pub substitution_out_minute: Option<i64>,
    pub is_playing_leader: bool,
    pub is_responsible: bool,
    pub accumulated_warnings: i64,
    pub suspension_description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamContactRecord {
    pub team_id: i64,
    pub person: PersonRecord,
    pub is_reserve: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MappedRecord {
    Match(Box<MatchRecord>),
    Result(ResultRecord),
    Event(EventRecord),
    Participant(Box<ParticipantRecord>),
    Player(PersonRecord),
    TeamStaff(TeamContactRecord),
}

impl MappedRecord {
    /// Short external reference used in log lines.
    pub fn describe(&self) -> String {
        match self {
            MappedRecord::Match(m) => format!("matchid {}", m.fogis_id),
            MappedRecord::Result(r) => format!("result for matchid {}", r.match_fogis_id),
            MappedRecord::Event(e) => match e.fogis_id {
                Some(id) => format!("matchhandelseid {id}"),
                None => format!("event in matchid {}", e.match_fogis_id),
            },
            MappedRecord::Participant(p) => format!("matchdeltagareid {}", p.id),
            MappedRecord::Player(p) => format!("personid {}", p.id),
            MappedRecord::TeamStaff(c) => format!("personid {} in lagid {}", c.person.id, c.team_id),
        }
    }
}

pub fn map_record(kind: RecordKind, rec: &Record) -> Result<MappedRecord, MappingError> {
    Ok(match kind {
        RecordKind::Match => MappedRecord::Match(Box::new(map_match(rec)?)),
        RecordKind::Result => MappedRecord::Result(map_result(rec)?),
        RecordKind::Event => MappedRecord::Event(map_event(rec)?),
        RecordKind::Participant => MappedRecord::Participant(Box::new(map_participant(rec)?)),
        RecordKind::Player => MappedRecord::Player(map_person(rec, RecordKind::Player, "personid")?),
        RecordKind::TeamStaff => MappedRecord::TeamStaff(map_team_contact(rec)?),
    })
}

pub fn map_match(rec: &Record) -> Result<MatchRecord, MappingError> {
    let match_id = require_id(rec, RecordKind::Match, "matchid")?;
    let competition =
        map_competition(rec).ok_or(MappingError::MissingCompetition { match_id })?;

    let raw_date = get_str(rec, "speldatum").unwrap_or_default();
    let date = parse_date(&raw_date).unwrap_or_else(|| {
        log::warn!("failed to parse date {raw_date:?} for match {match_id}, using current date");
        Local::now().date_naive()
    });

    let assignments = rec
        .get("domaruppdraglista")
        .and_then(|v| v.as_array())
        .map(|list| {
            list.iter()
                .filter_map(|v| v.as_object())
                .map(map_assignment)
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    Ok(MatchRecord {
        fogis_id: match_id.to_string(),
        match_nr: get_str(rec, "matchnr").unwrap_or_default(),
        date,
        time: get_str(rec, "avsparkstid").unwrap_or_default(),
        football_type_id: get_id(rec, "fotbollstypid").unwrap_or(1),
        spectators: get_i64(rec, "antalaskadare"),
        status: "normal".to_string(),
        is_walkover: get_bool(rec, "wo").unwrap_or(false),
        venue: map_venue(rec),
        competition,
        home: map_team(rec, "lag1", "matchlag1id"),
        away: map_team(rec, "lag2", "matchlag2id"),
        assignments,
    })
}

fn map_venue(rec: &Record) -> Option<VenueRecord> {
    let id = get_id(rec, "anlaggningid")?;
    let name = get_str(rec, "anlaggningnamn")?;
    Some(VenueRecord {
        id,
        name,
        latitude: get_f64(rec, "anlaggningLatitud"),
        longitude: get_f64(rec, "anlaggningLongitud"),
    })
}

fn map_competition(rec: &Record) -> Option<CompetitionRecord> {
    let id = get_id(rec, "tavlingid")?;
    let name = get_str(rec, "tavlingnamn")?;
    let category = match (
        get_id(rec, "tavlingskategoriid"),
        get_str(rec, "tavlingskategorinamn"),
    ) {
        (Some(id), Some(name)) => Some(CategoryRecord { id, name }),
        _ => None,
    };
    Some(CompetitionRecord {
        id,
        season: extract_season(&name),
        name,
        category,
        gender_id: get_i64(rec, "tavlingKonId"),
        age_category_id: get_i64(rec, "tavlingAlderskategori"),
        fogis_id: get_str(rec, "tavlingnr"),
    })
}

fn map_team(rec: &Record, prefix: &str, match_team_key: &str) -> Option<TeamRecord> {
    let id = get_id(rec, &format!("{prefix}lagid"))?;
    let name = get_str(rec, &format!("{prefix}namn"))?;
    let club_id = get_id(rec, &format!("{prefix}foreningid"))?;
    Some(TeamRecord {
        id,
        club_name: club_name_from_team(&name),
        name,
        club_id,
        match_team_fogis_id: get_id(rec, match_team_key).map(|id| id.to_string()),
    })
}

fn map_assignment(rec: &Record) -> Result<AssignmentRecord, MappingError> {
    let kind = RecordKind::Match;
    let referee_id = require_id(rec, kind, "domareid")?;
    let role_id = require_id(rec, kind, "domarrollid")?;
    let person = map_person(rec, kind, "personid")?;
    Ok(AssignmentRecord {
        fogis_id: get_id(rec, "domaruppdragid").map(|id| id.to_string()),
        referee_id,
        person,
        role_id,
        role_name: get_str(rec, "domarrollnamn").unwrap_or_else(|| "Unknown".to_string()),
        role_short_name: get_str(rec, "domarrollkortnamn").unwrap_or_default(),
        status: get_str(rec, "domaruppdragstatusnamn").unwrap_or_default(),
    })
}

/// Person fields shared by referee, participant, player and staff records.
fn map_person(
    rec: &Record,
    kind: RecordKind,
    id_field: &'static str,
) -> Result<PersonRecord, MappingError> {
    let id = require_id(rec, kind, id_field)?;
    Ok(person_with_id(rec, id))
}

fn person_with_id(rec: &Record, id: i64) -> PersonRecord {
    let mut first_name = get_str(rec, "fornamn").unwrap_or_default();
    let mut last_name = get_str(rec, "efternamn").unwrap_or_default();
    if first_name.is_empty()
        && last_name.is_empty()
        && let Some(full) = get_str(rec, "personnamn").or_else(|| get_str(rec, "namn"))
    {
        (first_name, last_name) = split_full_name(&full);
    }
    PersonRecord {
        id,
        first_name,
        last_name,
        personal_number: get_str(rec, "personnr"),
        email: get_str(rec, "epostadress"),
        phone: get_str(rec, "mobiltelefon"),
        address: get_str(rec, "adress"),
        postal_code: get_str(rec, "postnr"),
        city: get_str(rec, "postort"),
        country: get_str(rec, "land"),
    }
}

pub fn map_result(rec: &Record) -> Result<ResultRecord, MappingError> {
    let kind = RecordKind::Result;
    let match_fogis_id = require_id(rec, kind, "matchid")?;
    let result_type_id = require_id(rec, kind, "matchresultattypid")?;
    Ok(ResultRecord {
        fogis_id: get_id(rec, "matchresultatid"),
        match_fogis_id,
        result_type_id,
        result_type_name: get_str(rec, "matchresultattypnamn")
            .unwrap_or_else(|| "Unknown".to_string()),
        home_goals: get_i64(rec, "matchlag1mal").unwrap_or(0),
        away_goals: get_i64(rec, "matchlag2mal").unwrap_or(0),
    })
}

pub fn map_event(rec: &Record) -> Result<EventRecord, MappingError> {
    let kind = RecordKind::Event;
    let match_fogis_id = require_id(rec, kind, "matchid")?;
    let event_type_id = require_id(rec, kind, "matchhandelsetypid")?;
    let participant_id = require_id(rec, kind, "matchdeltagareid")?;
    let match_team_fogis_id = require_id(rec, kind, "matchlagid")?;

    let type_name = get_str(rec, "matchhandelsetypnamn").unwrap_or_else(|| "Unknown".to_string());
    let affects_score = get_bool(rec, "matchhandelsetypmedforstallningsandring").unwrap_or(false);

    Ok(EventRecord {
        fogis_id: get_id(rec, "matchhandelseid"),
        match_fogis_id,
        participant_id,
        match_team_fogis_id,
        event_type: EventTypeRecord {
            id: event_type_id,
            flags: flags_from_type_name(&type_name, affects_score),
            name: type_name,
        },
        minute: get_i64(rec, "matchminut"),
        period: get_i64(rec, "period"),
        comment: get_str(rec, "kommentar").unwrap_or_default(),
        home_score: get_i64(rec, "hemmamal").unwrap_or(0),
        away_score: get_i64(rec, "bortamal").unwrap_or(0),
        position_x: get_i64(rec, "planpositionx").unwrap_or(-1),
        position_y: get_i64(rec, "planpositiony").unwrap_or(-1),
        related_event_id: get_id(rec, "relateradTillMatchhandelseID"),
    })
}

/// Flags for an event type seen for the first time, guessed from its
/// (Swedish or English) name.
pub fn flags_from_type_name(name: &str, affects_score: bool) -> EventFlags {
    EventFlags {
        is_goal: contains_any(name, &["mål", "goal"]),
        is_penalty: contains_any(name, &["straff", "penalty"]),
        is_card: contains_any(name, &["kort", "card"]),
        is_substitution: contains_any(name, &["byte", "substitution"]),
        is_control_event: false,
        affects_score,
    }
}

pub fn map_participant(rec: &Record) -> Result<ParticipantRecord, MappingError> {
    let kind = RecordKind::Participant;
    let match_fogis_id = require_id(rec, kind, "matchid")?;
    let match_team_fogis_id = require_id(rec, kind, "matchlagid")?;
    let player_id = require_id(rec, kind, "spelareid")?;
    let id = require_id(rec, kind, "matchdeltagareid")?;
    let person = person_with_id(rec, get_id(rec, "personid").unwrap_or(player_id));

    Ok(ParticipantRecord {
        id,
        match_fogis_id,
        match_team_fogis_id,
        team_id: get_id(rec, "lagid"),
        person,
        jersey_number: get_i64(rec, "trojnummer"),
        is_captain: get_bool(rec, "lagkapten").unwrap_or(false),
        is_substitute: get_bool(rec, "ersattare").unwrap_or(false),
        substitution_in_minute: get_id(rec, "byte1"),
        substitution_out_minute: get_id(rec, "byte2"),
        is_playing_leader: get_bool(rec, "arSpelandeLedare").unwrap_or(false),
        is_responsible: get_bool(rec, "ansvarig").unwrap_or(false),
        accumulated_warnings: get_i64(rec, "spelareAntalAckumuleradeVarningar").unwrap_or(0),
        suspension_description: get_str(rec, "spelareAvstangningBeskrivning").unwrap_or_default(),
    })
}

pub fn map_team_contact(rec: &Record) -> Result<TeamContactRecord, MappingError> {
    let kind = RecordKind::TeamStaff;
    let team_id = require_id(rec, kind, "lagid")?;
    let person = map_person(rec, kind, "personid")?;
    Ok(TeamContactRecord {
        team_id,
        person,
        is_reserve: get_bool(rec, "reserv").unwrap_or(false),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn rec(v: Value) -> Record {
        v.as_object().cloned().unwrap()
    }

    fn sample_match() -> Record {
        rec(json!({
            "__type": "Svenskfotboll.Fogis.Web.FogisMobilDomarKlient.MatchJSON",
            "matchid": 6169913,
            "matchnr": "000026015",
            "fotbollstypid": 1,
            "lag1lagid": 61174,
            "lag1foreningid": 11145,
            "lag1namn": "Hestrafors IF",
            "lag2lagid": 30415,
            "lag2foreningid": 9528,
            "lag2namn": "IF Böljan Falkenberg",
            "anlaggningid": 29424,
            "anlaggningnamn": "Bollevi Konstgräs",
            "anlaggningLatitud": 57.71484,
            "anlaggningLongitud": 12.58732,
            "speldatum": "2025-04-11",
            "avsparkstid": "19:00",
            "tavlingid": 123399,
            "tavlingnamn": "Div 2 Västra Götaland, herr 2025",
            "tavlingskategoriid": 728,
            "tavlingskategorinamn": "Division 2, herrar",
            "antalaskadare": 246,
            "domaruppdraglista": [
                {
                    "domaruppdragid": 6850301,
                    "domarrollid": 1,
                    "domarrollnamn": "Huvuddomare",
                    "domarrollkortnamn": "Dom",
                    "domareid": 6600,
                    "personid": 1082017,
                    "personnamn": "Test Referee"
                },
                {"domareid": 6601, "domarrollid": 2}
            ]
        }))
    }

    #[test]
    fn match_maps_parents_and_assignments() {
        let m = map_match(&sample_match()).unwrap();
        assert_eq!(m.fogis_id, "6169913");
        assert_eq!(m.date, NaiveDate::from_ymd_opt(2025, 4, 11).unwrap());
        assert_eq!(m.competition.season, "2025");
        assert_eq!(m.competition.category.as_ref().map(|c| c.id), Some(728));
        assert_eq!(m.venue.as_ref().map(|v| v.id), Some(29424));
        let home = m.home.unwrap();
        assert_eq!((home.id, home.club_id), (61174, 11145));
        assert_eq!(home.club_name, "Hestrafors");
        assert_eq!(m.away.unwrap().name, "IF Böljan Falkenberg");
        assert_eq!(m.spectators, Some(246));
        assert!(!m.is_walkover);

        assert_eq!(m.assignments.len(), 2);
        let first = m.assignments[0].as_ref().unwrap();
        assert_eq!(first.person.first_name, "Test");
        assert_eq!(first.person.last_name, "Referee");
        assert_eq!(first.fogis_id.as_deref(), Some("6850301"));
        assert_eq!(
            m.assignments[1],
            Err(MappingError::MissingField {
                kind: RecordKind::Match,
                field: "personid"
            })
        );
    }

    #[test]
    fn match_without_id_or_competition_is_rejected() {
        let mut r = sample_match();
        r.remove("matchid");
        assert!(matches!(
            map_match(&r),
            Err(MappingError::MissingField { field: "matchid", .. })
        ));

        let mut r = sample_match();
        r.remove("tavlingid");
        assert_eq!(
            map_match(&r),
            Err(MappingError::MissingCompetition { match_id: 6169913 })
        );
    }

    #[test]
    fn team_needs_club_id() {
        let mut r = sample_match();
        r.remove("lag2foreningid");
        let m = map_match(&r).unwrap();
        assert!(m.home.is_some());
        assert!(m.away.is_none());
    }

    #[test]
    fn bad_date_falls_back_to_today() {
        let mut r = sample_match();
        r.insert("speldatum".into(), json!("invalid-date"));
        let m = map_match(&r).unwrap();
        assert_eq!(m.date, Local::now().date_naive());
    }

    #[test]
    fn result_requires_match_and_type() {
        let r = rec(json!({
            "matchresultatid": 4660867,
            "matchid": 6169913,
            "matchresultattypid": 1,
            "matchresultattypnamn": "Slutresultat",
            "matchlag1mal": 2,
            "matchlag2mal": 2
        }));
        let result = map_result(&r).unwrap();
        assert_eq!(result.match_fogis_id, 6169913);
        assert_eq!(result.result_type_id, 1);
        assert_eq!((result.home_goals, result.away_goals), (2, 2));

        let mut missing = r.clone();
        missing.remove("matchresultattypid");
        assert!(map_result(&missing).is_err());
    }

    #[test]
    fn event_details_and_defaults() {
        let r = rec(json!({
            "matchhandelseid": 12345,
            "matchid": 6169913,
            "matchhandelsetypid": 1,
            "matchhandelsetypnamn": "Mål",
            "matchhandelsetypmedforstallningsandring": true,
            "matchdeltagareid": 67890,
            "matchlagid": 54321,
            "matchminut": 45,
            "period": 1,
            "kommentar": "Test comment",
            "hemmamal": 1,
            "bortamal": 0,
            "relateradTillMatchhandelseID": 0
        }));
        let e = map_event(&r).unwrap();
        assert_eq!(e.minute, Some(45));
        assert_eq!(e.comment, "Test comment");
        assert_eq!((e.home_score, e.away_score), (1, 0));
        assert_eq!((e.position_x, e.position_y), (-1, -1));
        assert_eq!(e.related_event_id, None);
        assert!(e.event_type.flags.is_goal);
        assert!(e.event_type.flags.affects_score);

        let mut related = r.clone();
        related.insert("relateradTillMatchhandelseID".into(), json!(123));
        assert_eq!(map_event(&related).unwrap().related_event_id, Some(123));

        let mut missing = r.clone();
        missing.remove("matchlagid");
        assert!(map_event(&missing).is_err());
    }

    #[test]
    fn type_name_flags() {
        let f = flags_from_type_name("Gult kort", false);
        assert!(f.is_card && !f.is_goal);
        let f = flags_from_type_name("Straffmål", true);
        assert!(f.is_goal && f.is_penalty);
        let f = flags_from_type_name("Byte in", false);
        assert!(f.is_substitution);
    }

    #[test]
    fn participant_zero_substitution_minutes_are_none() {
        let r = rec(json!({
            "matchdeltagareid": 67890,
            "matchid": 6169913,
            "matchlagid": 54321,
            "spelareid": 12345,
            "personid": 12345,
            "fornamn": "Test",
            "efternamn": "Player",
            "trojnummer": 10,
            "lagkapten": true,
            "byte1": 0,
            "byte2": 75,
            "spelareAntalAckumuleradeVarningar": 1
        }));
        let p = map_participant(&r).unwrap();
        assert_eq!(p.person.id, 12345);
        assert_eq!(p.jersey_number, Some(10));
        assert!(p.is_captain);
        assert_eq!(p.substitution_in_minute, None);
        assert_eq!(p.substitution_out_minute, Some(75));
        assert_eq!(p.accumulated_warnings, 1);
        assert_eq!(p.suspension_description, "");
    }

    #[test]
    fn participant_person_falls_back_to_player_id() {
        let r = rec(json!({
            "matchdeltagareid": 1, "matchid": 2, "matchlagid": 3, "spelareid": 44,
            "personnamn": "Anna Svensson"
        }));
        let p = map_participant(&r).unwrap();
        assert_eq!(p.person.id, 44);
        assert_eq!(p.person.last_name, "Svensson");
    }
}

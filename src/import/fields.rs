use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::record::Record;

static SEASON_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(20\d{2})\b").expect("season pattern is valid"));

fn present<'a>(rec: &'a Record, key: &str) -> Option<&'a Value> {
    match rec.get(key)? {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        v => Some(v),
    }
}

pub fn as_i64_any(v: &Value) -> Option<i64> {
    if let Some(n) = v.as_i64() {
        return Some(n);
    }
    if let Some(f) = v.as_f64()
        && f.fract() == 0.0
    {
        return Some(f as i64);
    }
    v.as_str()?.trim().parse::<i64>().ok()
}

pub fn as_f64_any(v: &Value) -> Option<f64> {
    if let Some(n) = v.as_f64() {
        return Some(n);
    }
    v.as_str()?.trim().replace(',', ".").parse::<f64>().ok()
}

pub fn as_bool_any(v: &Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(*b),
        Value::Number(_) => as_i64_any(v).map(|n| n != 0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "ja" | "yes" | "y" | "x" => Some(true),
            "false" | "0" | "nej" | "no" | "n" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

pub fn get_i64(rec: &Record, key: &str) -> Option<i64> {
    present(rec, key).and_then(as_i64_any)
}

/// FOGIS uses 0 for "no reference"; treat it like a missing id.
pub fn get_id(rec: &Record, key: &str) -> Option<i64> {
    get_i64(rec, key).filter(|id| *id != 0)
}

pub fn get_f64(rec: &Record, key: &str) -> Option<f64> {
    present(rec, key).and_then(as_f64_any)
}

pub fn get_bool(rec: &Record, key: &str) -> Option<bool> {
    present(rec, key).and_then(as_bool_any)
}

pub fn get_str(rec: &Record, key: &str) -> Option<String> {
    match present(rec, key)? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    // Some exports append a time part ("2025-04-11T00:00:00").
    let day = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

pub fn extract_season(competition_name: &str) -> String {
    SEASON_YEAR
        .captures(competition_name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

pub fn split_full_name(full_name: &str) -> (String, String) {
    let mut parts = full_name.split_whitespace();
    let Some(first) = parts.next() else {
        return (String::new(), String::new());
    };
    let rest = parts.collect::<Vec<_>>().join(" ");
    (first.to_string(), rest)
}

/// Derived club name: the first word of the team name.
pub fn club_name_from_team(team_name: &str) -> String {
    team_name
        .split_whitespace()
        .next()
        .unwrap_or(team_name)
        .to_string()
}

pub fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    let lower = haystack.to_lowercase();
    needles.iter().any(|n| lower.contains(n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rec(v: Value) -> Record {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn numbers_parse_from_strings_and_floats() {
        let r = rec(json!({"a": "42", "b": 7.0, "c": " ", "d": null, "e": "x"}));
        assert_eq!(get_i64(&r, "a"), Some(42));
        assert_eq!(get_i64(&r, "b"), Some(7));
        assert_eq!(get_i64(&r, "c"), None);
        assert_eq!(get_i64(&r, "d"), None);
        assert_eq!(get_i64(&r, "e"), None);
    }

    #[test]
    fn zero_id_is_missing() {
        let r = rec(json!({"relateradTillMatchhandelseID": 0, "matchid": 6169913}));
        assert_eq!(get_id(&r, "relateradTillMatchhandelseID"), None);
        assert_eq!(get_id(&r, "matchid"), Some(6169913));
    }

    #[test]
    fn booleans_accept_swedish_and_numeric() {
        let r = rec(json!({"a": "ja", "b": 0, "c": "Nej", "d": true, "e": "kanske"}));
        assert_eq!(get_bool(&r, "a"), Some(true));
        assert_eq!(get_bool(&r, "b"), Some(false));
        assert_eq!(get_bool(&r, "c"), Some(false));
        assert_eq!(get_bool(&r, "d"), Some(true));
        assert_eq!(get_bool(&r, "e"), None);
    }

    #[test]
    fn decimal_comma_coordinates() {
        let r = rec(json!({"lat": "57,71484"}));
        assert_eq!(get_f64(&r, "lat"), Some(57.71484));
    }

    #[test]
    fn parse_date_handles_time_suffix_and_garbage() {
        assert_eq!(
            parse_date("2025-04-11"),
            NaiveDate::from_ymd_opt(2025, 4, 11)
        );
        assert_eq!(
            parse_date("2025-04-11T00:00:00"),
            NaiveDate::from_ymd_opt(2025, 4, 11)
        );
        assert_eq!(parse_date("invalid-date"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn season_is_first_twenty_first_century_year() {
        assert_eq!(extract_season("Div 2 Västra Götaland, herr 2025"), "2025");
        assert_eq!(extract_season("Div 2 Västra Götaland, herr"), "");
        assert_eq!(extract_season("P16 1999"), "");
    }

    #[test]
    fn full_name_splits_on_first_space() {
        assert_eq!(
            split_full_name("Test Referee"),
            ("Test".to_string(), "Referee".to_string())
        );
        assert_eq!(
            split_full_name("Anna Maria  Svensson"),
            ("Anna".to_string(), "Maria Svensson".to_string())
        );
        assert_eq!(split_full_name("Zlatan"), ("Zlatan".to_string(), String::new()));
        assert_eq!(split_full_name(""), (String::new(), String::new()));
    }

    #[test]
    fn club_name_is_first_word() {
        assert_eq!(club_name_from_team("Hestrafors IF"), "Hestrafors");
        assert_eq!(club_name_from_team("Böljan"), "Böljan");
    }
}

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result, bail};
use rust_xlsxwriter::{Workbook, Worksheet};
use serde::Serialize;

use crate::files;
use crate::stats::{MatchStats, NamedCount, PlayerStats, RefereeStats, TeamStats};

pub type Table = (&'static str, Vec<Vec<String>>);

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "subject", rename_all = "lowercase")]
pub enum StatsReport {
    Referee(RefereeStats),
    Player(PlayerStats),
    Team(TeamStats),
    Match(MatchStats),
}

pub struct ExportReport {
    pub sheets: usize,
    pub rows: usize,
}

impl StatsReport {
    /// Named tables, each starting with a header row.
    pub fn tables(&self) -> Vec<Table> {
        match self {
            StatsReport::Referee(s) => vec![
                (
                    "Referee",
                    vec![
                        header(&["Id", "Name", "Matches", "Yellow", "Red", "Goals"]),
                        vec![
                            s.referee_id.to_string(),
                            s.name.clone(),
                            s.total_matches.to_string(),
                            s.yellow_cards.to_string(),
                            s.red_cards.to_string(),
                            s.goals.to_string(),
                        ],
                    ],
                ),
                ("CoOfficials", named_rows("Shared matches", &s.co_officials)),
                ("CardedPlayers", named_rows("Cards", &s.carded_players)),
            ],
            StatsReport::Player(s) => {
                let mut teams = vec![header(&["Team id", "Team", "Matches"])];
                teams.extend(
                    s.teams
                        .iter()
                        .map(|t| vec![t.id.to_string(), t.name.clone(), t.matches.to_string()]),
                );
                vec![
                    (
                        "Player",
                        vec![
                            header(&["Id", "Name", "Matches", "Goals", "Yellow", "Red"]),
                            vec![
                                s.player_id.to_string(),
                                s.name.clone(),
                                s.total_matches.to_string(),
                                s.goals.to_string(),
                                s.yellow_cards.to_string(),
                                s.red_cards.to_string(),
                            ],
                        ],
                    ),
                    ("Teams", teams),
                ]
            }
            StatsReport::Team(s) => {
                let r = &s.results;
                let mut opponents = vec![header(&["Team id", "Opponent", "Matches"])];
                opponents.extend(
                    s.common_opponents
                        .iter()
                        .map(|t| vec![t.id.to_string(), t.name.clone(), t.matches.to_string()]),
                );
                let mut scorers = vec![header(&["Player id", "Player", "Goals"])];
                scorers.extend(
                    s.top_scorers
                        .iter()
                        .map(|p| vec![p.id.to_string(), p.name.clone(), p.goals.to_string()]),
                );
                vec![
                    (
                        "Team",
                        vec![
                            header(&["Id", "Name", "Matches", "W", "D", "L", "GF", "GA"]),
                            vec![
                                s.team_id.to_string(),
                                s.name.clone(),
                                s.total_matches.to_string(),
                                r.wins.to_string(),
                                r.draws.to_string(),
                                r.losses.to_string(),
                                r.goals_for.to_string(),
                                r.goals_against.to_string(),
                            ],
                        ],
                    ),
                    ("Opponents", opponents),
                    ("TopScorers", scorers),
                ]
            }
            StatsReport::Match(s) => {
                let team_name = |t: &Option<crate::stats::TeamRef>| {
                    t.as_ref().map(|t| t.name.clone()).unwrap_or_default()
                };
                let mut officials = vec![header(&["Referee id", "Name", "Role"])];
                officials.extend(
                    s.officials
                        .iter()
                        .map(|o| vec![o.id.to_string(), o.name.clone(), o.role.clone()]),
                );
                let mut cards = vec![header(&["Minute", "Player", "Team", "Card"])];
                cards.extend(s.cards.iter().map(|c| {
                    vec![
                        opt_to_string(c.minute),
                        c.player.clone(),
                        c.team.clone(),
                        format!("{:?}", c.card),
                    ]
                }));
                let mut goals = vec![header(&["Minute", "Scorer", "Team", "Penalty", "Own goal"])];
                goals.extend(s.goals.iter().map(|g| {
                    vec![
                        opt_to_string(g.minute),
                        g.scorer.clone(),
                        g.team.clone(),
                        yes_no(g.is_penalty),
                        yes_no(g.is_own_goal),
                    ]
                }));
                vec![
                    (
                        "Match",
                        vec![
                            header(&["Id", "Date", "Time", "Competition", "Home", "Away", "Score"]),
                            vec![
                                s.match_id.to_string(),
                                s.date.clone(),
                                s.time.clone(),
                                s.competition.clone(),
                                team_name(&s.home_team),
                                team_name(&s.away_team),
                                s.score.clone(),
                            ],
                        ],
                    ),
                    ("Officials", officials),
                    ("Cards", cards),
                    ("Goals", goals),
                ]
            }
        }
    }

    /// Writes the report as a workbook (`.xlsx`, one sheet per table) or a
    /// single CSV with the tables stacked under their titles.
    pub fn export(&self, path: &Path) -> Result<ExportReport> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        let tables = self.tables();
        let rows = tables
            .iter()
            .map(|(_, rows)| rows.len().saturating_sub(1))
            .sum();
        match ext.as_str() {
            "xlsx" => export_workbook(path, &tables)?,
            "csv" => export_csv(path, &tables)?,
            _ => bail!("unsupported export format: {}", path.display()),
        }
        log::info!("exported {rows} rows to {}", path.display());
        Ok(ExportReport {
            sheets: tables.len(),
            rows,
        })
    }
}

impl fmt::Display for StatsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, (title, rows)) in self.tables().iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            writeln!(f, "{title}")?;
            if rows.len() <= 1 {
                writeln!(f, "  (none)")?;
                continue;
            }
            let cols = rows.iter().map(|r| r.len()).max().unwrap_or(0);
            let widths = (0..cols)
                .map(|c| {
                    rows.iter()
                        .filter_map(|r| r.get(c))
                        .map(|v| v.chars().count())
                        .max()
                        .unwrap_or(0)
                })
                .collect::<Vec<_>>();
            for row in rows {
                let line = row
                    .iter()
                    .zip(&widths)
                    .map(|(v, &w)| format!("{v:<w$}"))
                    .collect::<Vec<_>>()
                    .join("  ");
                writeln!(f, "  {}", line.trim_end())?;
            }
        }
        Ok(())
    }
}

fn export_workbook(path: &Path, tables: &[Table]) -> Result<()> {
    let mut workbook = Workbook::new();
    for (title, rows) in tables {
        let sheet = workbook.add_worksheet();
        sheet.set_name(*title)?;
        write_rows(sheet, rows)?;
    }
    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;
    Ok(())
}

fn export_csv(path: &Path, tables: &[Table]) -> Result<()> {
    let mut out = Vec::new();
    for (idx, (title, rows)) in tables.iter().enumerate() {
        if idx > 0 {
            out.push(vec![String::new()]);
        }
        out.push(vec![title.to_string()]);
        out.extend(rows.iter().cloned());
    }
    files::write_csv(path, &out)
}

fn header(cols: &[&str]) -> Vec<String> {
    cols.iter().map(|c| c.to_string()).collect()
}

fn named_rows(count_label: &'static str, items: &[NamedCount]) -> Vec<Vec<String>> {
    let mut rows = vec![vec!["Id".to_string(), "Name".to_string(), count_label.to_string()]];
    rows.extend(
        items
            .iter()
            .map(|n| vec![n.id.to_string(), n.name.clone(), n.count.to_string()]),
    );
    rows
}

fn yes_no(v: bool) -> String {
    if v { "yes" } else { "no" }.to_string()
}

fn opt_to_string<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{ResultTally, TeamAppearances, TeamStats};

    fn team_report() -> StatsReport {
        StatsReport::Team(TeamStats {
            team_id: 61174,
            name: "Hestrafors IF".into(),
            total_matches: 2,
            results: ResultTally {
                wins: 1,
                draws: 1,
                losses: 0,
                goals_for: 3,
                goals_against: 1,
            },
            common_opponents: vec![TeamAppearances {
                id: 30415,
                name: "IF Böljan Falkenberg".into(),
                matches: 2,
            }],
            top_scorers: Vec::new(),
        })
    }

    #[test]
    fn team_tables_have_headers() {
        let tables = team_report().tables();
        let names = tables.iter().map(|(n, _)| *n).collect::<Vec<_>>();
        assert_eq!(names, vec!["Team", "Opponents", "TopScorers"]);
        assert_eq!(tables[0].1[1][3], "1");
        assert_eq!(tables[2].1.len(), 1);
    }

    #[test]
    fn text_rendering_marks_empty_tables() {
        let text = team_report().to_string();
        assert!(text.contains("IF Böljan Falkenberg"));
        assert!(text.contains("TopScorers\n  (none)"));
    }

    #[test]
    fn export_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        assert!(team_report().export(&dir.path().join("out.pdf")).is_err());
    }

    #[test]
    fn csv_export_stacks_tables() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("team.csv");
        let report = team_report().export(&path).unwrap();
        assert_eq!(report.sheets, 3);
        assert_eq!(report.rows, 2);
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("Team\n"));
        assert!(text.contains("Opponents\n"));
    }

    #[test]
    fn workbook_export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("team.xlsx");
        team_report().export(&path).unwrap();
        assert!(path.exists());
    }
}

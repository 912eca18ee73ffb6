use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Map<String, Value>>,
}

pub fn read_json(path: &Path) -> Result<Value> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("read json file {}", path.display()))?;
    // Exports saved from Windows tools sometimes carry a BOM.
    let trimmed = raw.trim_start_matches('\u{feff}').trim();
    if trimmed.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(trimmed).with_context(|| format!("invalid json in {}", path.display()))
}

pub fn read_csv(path: &Path) -> Result<CsvTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("open csv file {}", path.display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("read csv header of {}", path.display()))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect::<Vec<_>>();

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("read csv row {}", idx + 2))?;
        let mut row = Map::new();
        for (header, cell) in headers.iter().zip(record.iter()) {
            if header.is_empty() || cell.is_empty() {
                continue;
            }
            row.insert(header.clone(), Value::String(cell.to_string()));
        }
        rows.push(row);
    }
    Ok(CsvTable { headers, rows })
}

pub fn write_csv(path: &Path, rows: &[Vec<String>]) -> Result<()> {
    if rows.is_empty() {
        return Ok(());
    }
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create export directory {}", parent.display()))?;
    }
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("create csv file {}", path.display()))?;
    for row in rows {
        writer.write_record(row).context("write csv row")?;
    }
    writer.flush().context("flush csv file")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn read_csv_skips_empty_cells_and_bom() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write!(file, "\u{feff}personid,fornamn,efternamn\n1001, Anna ,\n1002,Erik,Berg\n").unwrap();
        let table = read_csv(file.path()).unwrap();
        assert_eq!(table.headers, vec!["personid", "fornamn", "efternamn"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].get("fornamn"), Some(&Value::from("Anna")));
        assert!(table.rows[0].get("efternamn").is_none());
    }

    #[test]
    fn empty_json_file_is_null() {
        let file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        assert_eq!(read_json(file.path()).unwrap(), Value::Null);
    }

    #[test]
    fn write_csv_reports_unusable_directory() {
        let blocker = tempfile::NamedTempFile::new().unwrap();
        let path = blocker.path().join("reports").join("out.csv");
        let rows = vec![vec!["Team".to_string()]];
        let err = write_csv(&path, &rows).unwrap_err();
        assert!(err.to_string().contains("create export directory"));
    }

    #[test]
    fn write_csv_round_trips_through_reader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let rows = vec![
            vec!["Team".to_string(), "Matches".to_string()],
            vec!["Hestrafors IF".to_string(), "3".to_string()],
        ];
        write_csv(&path, &rows).unwrap();
        let table = read_csv(&path).unwrap();
        assert_eq!(table.rows[0].get("Matches"), Some(&Value::from("3")));
    }
}

pub mod fields;
pub mod mapper;
pub mod reconcile;
pub mod record;

use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use rusqlite::{Connection, Transaction, params};
use serde::Serialize;
use serde_json::Value;

use crate::files;
pub use mapper::{MappedRecord, MappingError, map_record};
pub use reconcile::Outcome;
pub use record::{Record, RecordBatch, RecordKind, TYPE_KEY, determine_record_kind};

const SAMPLE_FIELDS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Json,
    Csv,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "json" => Ok(SourceFormat::Json),
            "csv" => Ok(SourceFormat::Csv),
            _ => bail!("unsupported file type: {}", path.display()),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SourceFormat::Json => "json",
            SourceFormat::Csv => "csv",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub source: String,
    pub format: SourceFormat,
    pub type_tag: String,
    pub kind: Option<RecordKind>,
    /// Entries in the source, including ones that were not objects.
    pub records_read: usize,
    pub imported: usize,
    pub skipped: usize,
    pub failed: usize,
    pub ignored: usize,
    pub errors: Vec<String>,
}

impl ImportReport {
    fn new(source: &str, format: SourceFormat, type_tag: &str, kind: Option<RecordKind>) -> Self {
        Self {
            source: source.to_string(),
            format,
            type_tag: type_tag.to_string(),
            kind,
            records_read: 0,
            imported: 0,
            skipped: 0,
            failed: 0,
            ignored: 0,
            errors: Vec::new(),
        }
    }
}

/// What a dry run learns about a file without touching the database.
#[derive(Debug, Clone, Serialize)]
pub struct FileSummary {
    pub source: String,
    pub format: SourceFormat,
    pub type_tag: String,
    pub kind: Option<RecordKind>,
    pub records: usize,
    pub sample_fields: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportRun {
    pub run_id: i64,
    pub source: String,
    pub format: String,
    pub kind: Option<String>,
    pub finished_at: String,
    pub records_read: i64,
    pub records_imported: i64,
    pub records_skipped: i64,
    pub records_ignored: i64,
}

pub struct Importer<'c> {
    conn: &'c mut Connection,
}

impl<'c> Importer<'c> {
    pub fn new(conn: &'c mut Connection) -> Self {
        Self { conn }
    }

    pub fn import_file(&mut self, path: &Path, kind: Option<RecordKind>) -> Result<ImportReport> {
        match SourceFormat::from_path(path)? {
            SourceFormat::Json => self.import_from_json(path, kind),
            SourceFormat::Csv => self.import_from_csv(path, kind),
        }
    }

    pub fn import_from_json(&mut self, path: &Path, kind: Option<RecordKind>) -> Result<ImportReport> {
        let data = files::read_json(path)?;
        self.import_value(&path.display().to_string(), data, kind)
    }

    pub fn import_value(
        &mut self,
        source: &str,
        data: Value,
        kind: Option<RecordKind>,
    ) -> Result<ImportReport> {
        let batch = determine_record_kind(data);
        let kind = kind.or_else(|| RecordKind::from_type_tag(&batch.type_tag));
        self.import_records(
            source,
            SourceFormat::Json,
            &batch.type_tag,
            kind,
            &batch.records,
            batch.ignored,
        )
    }

    pub fn import_from_csv(&mut self, path: &Path, kind: Option<RecordKind>) -> Result<ImportReport> {
        let table = files::read_csv(path)?;
        let type_tag = csv_type_tag(&table.rows);
        let kind = kind
            .or_else(|| RecordKind::from_type_tag(&type_tag))
            .or_else(|| RecordKind::from_csv_headers(&table.headers));
        self.import_records(
            &path.display().to_string(),
            SourceFormat::Csv,
            &type_tag,
            kind,
            &table.rows,
            0,
        )
    }

    /// Imports a batch in one transaction, each record in its own savepoint.
    /// `ignored` counts source entries that never became records.
    pub fn import_records(
        &mut self,
        source: &str,
        format: SourceFormat,
        type_tag: &str,
        kind: Option<RecordKind>,
        records: &[Record],
        ignored: usize,
    ) -> Result<ImportReport> {
        let started_at = Utc::now().to_rfc3339();
        let mut report = ImportReport::new(source, format, type_tag, kind);
        report.records_read = records.len() + ignored;
        report.ignored = ignored;
        if ignored > 0 {
            report.errors.push(format!("{ignored} entries are not records"));
        }

        let mut tx = self
            .conn
            .transaction()
            .context("begin import transaction")?;

        match kind {
            Some(kind) => {
                log::info!("importing {} {kind} records from {source}", records.len());
                for (idx, rec) in records.iter().enumerate() {
                    import_one(&mut tx, kind, idx, rec, &mut report)?;
                }
            }
            None => {
                log::warn!("unknown data type {type_tag:?} in {source}, nothing imported");
            }
        }

        record_run(&tx, &report, &started_at)?;
        tx.commit().context("commit import transaction")?;

        log::info!(
            "import of {source} done: {} imported, {} skipped, {} failed, {} ignored",
            report.imported,
            report.skipped,
            report.failed,
            report.ignored
        );
        Ok(report)
    }
}

fn import_one(
    tx: &mut Transaction<'_>,
    kind: RecordKind,
    idx: usize,
    rec: &Record,
    report: &mut ImportReport,
) -> Result<()> {
    let mapped = match map_record(kind, rec) {
        Ok(mapped) => mapped,
        Err(err) => {
            log::warn!("skipping record {}: {err}", idx + 1);
            report.skipped += 1;
            report.errors.push(format!("record {}: {err}", idx + 1));
            return Ok(());
        }
    };

    let mut sp = tx.savepoint().context("open record savepoint")?;
    match reconcile::apply(&mut sp, &mapped) {
        Ok(Outcome::Imported) => {
            sp.commit().context("release record savepoint")?;
            report.imported += 1;
        }
        Ok(Outcome::Skipped(reason)) => {
            log::warn!("skipping {}: {reason}", mapped.describe());
            report.skipped += 1;
            report.errors.push(reason);
        }
        Err(err) => {
            log::error!("failed to import {}: {err:#}", mapped.describe());
            report.failed += 1;
            report.errors.push(format!("{}: {err:#}", mapped.describe()));
        }
    }
    Ok(())
}

fn csv_type_tag(rows: &[Record]) -> String {
    rows.first()
        .and_then(|r| r.get(TYPE_KEY))
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

fn record_run(conn: &Connection, report: &ImportReport, started_at: &str) -> Result<()> {
    let errors_json = serde_json::to_string(&report.errors).context("encode import errors")?;
    conn.execute(
        r#"
        INSERT INTO import_runs (
            source, format, kind, started_at, finished_at,
            records_read, records_imported, records_skipped, records_ignored, errors_json
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
        params![
            report.source,
            report.format.as_str(),
            report.kind.map(|k| k.cli_name()),
            started_at,
            Utc::now().to_rfc3339(),
            report.records_read as i64,
            report.imported as i64,
            (report.skipped + report.failed) as i64,
            report.ignored as i64,
            errors_json,
        ],
    )
    .context("insert import run")?;
    Ok(())
}

pub fn recent_runs(conn: &Connection, limit: usize) -> Result<Vec<ImportRun>> {
    let mut stmt = conn
        .prepare(
            "SELECT run_id, source, format, kind, finished_at,
                    records_read, records_imported, records_skipped, records_ignored
             FROM import_runs ORDER BY run_id DESC LIMIT ?1",
        )
        .context("prepare import runs query")?;
    let rows = stmt
        .query_map(params![limit as i64], |row| {
            Ok(ImportRun {
                run_id: row.get(0)?,
                source: row.get(1)?,
                format: row.get(2)?,
                kind: row.get(3)?,
                finished_at: row.get(4)?,
                records_read: row.get(5)?,
                records_imported: row.get(6)?,
                records_skipped: row.get(7)?,
                records_ignored: row.get(8)?,
            })
        })
        .context("query import runs")?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("read import run")?);
    }
    Ok(out)
}

pub fn inspect_file(path: &Path) -> Result<FileSummary> {
    let format = SourceFormat::from_path(path)?;
    let (type_tag, kind, records) = match format {
        SourceFormat::Json => {
            let batch = determine_record_kind(files::read_json(path)?);
            let kind = RecordKind::from_type_tag(&batch.type_tag);
            (batch.type_tag, kind, batch.records)
        }
        SourceFormat::Csv => {
            let table = files::read_csv(path)?;
            let type_tag = csv_type_tag(&table.rows);
            let kind = RecordKind::from_type_tag(&type_tag)
                .or_else(|| RecordKind::from_csv_headers(&table.headers));
            (type_tag, kind, table.rows)
        }
    };
    let sample_fields = records
        .first()
        .map(|r| r.keys().take(SAMPLE_FIELDS).cloned().collect())
        .unwrap_or_default();
    Ok(FileSummary {
        source: path.display().to_string(),
        format,
        type_tag,
        kind,
        records: records.len(),
        sample_fields,
    })
}

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};

use referee_stats::config::{Config, Overrides};
use referee_stats::export::StatsReport;
use referee_stats::import::{self, Importer, RecordKind};
use referee_stats::stats::{self, Page};
use referee_stats::{db, logging, reference_data};

#[derive(Parser)]
#[command(name = "referee-stats")]
#[command(about = "Import FOGIS exports and report referee statistics", long_about = None)]
struct Cli {
    /// TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database path
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a FOGIS JSON or CSV export
    Import {
        file: PathBuf,

        /// Record type, overrides detection (match, results, events, participants, players, team-staff)
        #[arg(long = "type", value_parser = parse_kind)]
        kind: Option<RecordKind>,

        /// Parse and summarize the file without touching the database
        #[arg(long)]
        dry_run: bool,
    },

    /// Show statistics for a referee, player, team or match
    Stats {
        #[arg(value_enum)]
        subject: Subject,

        /// Internal id of the subject
        id: i64,

        #[arg(long)]
        limit: Option<usize>,

        #[arg(long, default_value_t = 0)]
        offset: usize,

        /// Print JSON instead of tables
        #[arg(long)]
        json: bool,

        /// Also write the report to FILE.xlsx or FILE.csv
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Database maintenance
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Subject {
    Referee,
    Player,
    Team,
    Match,
}

impl Subject {
    fn label(self) -> &'static str {
        match self {
            Subject::Referee => "referee",
            Subject::Player => "player",
            Subject::Team => "team",
            Subject::Match => "match",
        }
    }
}

#[derive(Subcommand)]
enum DbAction {
    /// Create the schema and seed reference data
    Init,
    /// Drop and recreate every table
    Reset {
        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
    },
    /// Show schema version, row counts and recent imports
    Status,
}

fn parse_kind(raw: &str) -> Result<RecordKind, String> {
    RecordKind::from_cli_name(raw).ok_or_else(|| {
        let names = RecordKind::ALL
            .iter()
            .map(|k| k.cli_name())
            .collect::<Vec<_>>()
            .join(", ");
        format!("unknown type '{raw}', expected one of: {names}")
    })
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let cli = Cli::parse();
    let config = Config::load(&Overrides {
        config_file: cli.config.clone(),
        database_path: cli.db.clone(),
        log_level: None,
    })?;
    let level = logging::level_for_verbosity(&config.log_level, cli.verbose);
    logging::init(&level, config.log_file.as_deref())?;
    log::debug!("configuration: {config:?}");

    match cli.command {
        Commands::Import {
            file,
            kind,
            dry_run,
        } => run_import(&config, &file, kind, dry_run),
        Commands::Stats {
            subject,
            id,
            limit,
            offset,
            json,
            export,
        } => {
            let page = Page::new(limit.unwrap_or(config.stats_limit), offset);
            run_stats(&config, subject, id, page, json, export.as_deref())
        }
        Commands::Db { action } => run_db(&config, action),
    }
}

fn run_import(config: &Config, file: &Path, kind: Option<RecordKind>, dry_run: bool) -> Result<()> {
    if !file.exists() {
        bail!("file not found: {}", file.display());
    }

    if dry_run {
        let summary = import::inspect_file(file)?;
        println!("Dry run: {}", summary.source);
        println!("Records: {}", summary.records);
        let detected = kind.or(summary.kind);
        match detected {
            Some(kind) => println!("Type: {kind} ({})", kind.cli_name()),
            None => println!("Type: unknown ({:?})", summary.type_tag),
        }
        if !summary.sample_fields.is_empty() {
            println!("Sample fields: {}", summary.sample_fields.join(", "));
        }
        return Ok(());
    }

    let mut conn = db::open_db(&config.database_path)?;
    reference_data::seed_all(&conn)?;
    let report = Importer::new(&mut conn).import_file(file, kind)?;

    println!("Successfully imported {} records", report.imported);
    if report.skipped > 0 || report.failed > 0 || report.ignored > 0 {
        println!(
            "Skipped {}, failed {} and ignored {} of {} records",
            report.skipped, report.failed, report.ignored, report.records_read
        );
        for err in report.errors.iter().take(10) {
            println!("  - {err}");
        }
    }
    Ok(())
}

fn run_stats(
    config: &Config,
    subject: Subject,
    id: i64,
    page: Page,
    json: bool,
    export: Option<&Path>,
) -> Result<()> {
    let conn = db::open_db(&config.database_path)?;
    let report = match subject {
        Subject::Referee => stats::referee_stats(&conn, id, page)?.map(StatsReport::Referee),
        Subject::Player => stats::player_stats(&conn, id)?.map(StatsReport::Player),
        Subject::Team => stats::team_stats(&conn, id, page)?.map(StatsReport::Team),
        Subject::Match => stats::match_stats(&conn, id)?.map(StatsReport::Match),
    };
    let Some(report) = report else {
        bail!("{} {id} not found", subject.label());
    };

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("encode stats as json")?
        );
    } else {
        print!("{report}");
    }

    if let Some(path) = export {
        let written = report.export(path)?;
        println!(
            "Exported {} rows in {} tables to {}",
            written.rows,
            written.sheets,
            path.display()
        );
    }
    Ok(())
}

fn run_db(config: &Config, action: DbAction) -> Result<()> {
    let path = &config.database_path;
    match action {
        DbAction::Init => {
            let conn = db::open_db(path)?;
            let seeded = reference_data::seed_all(&conn)?;
            println!("Database initialized at {}", path.display());
            println!(
                "Seeded {} event types, {} result types, {} referee roles",
                seeded.event_types, seeded.result_types, seeded.referee_roles
            );
        }
        DbAction::Reset { force } => {
            if !force && !confirm(&format!("Delete all data in {}?", path.display()))? {
                println!("Aborted");
                return Ok(());
            }
            let conn = db::open_db(path)?;
            db::reset(&conn)?;
            reference_data::seed_all(&conn)?;
            println!("Database reset at {}", path.display());
        }
        DbAction::Status => {
            if !path.exists() {
                bail!("database {} does not exist, run `db init`", path.display());
            }
            let conn = db::open_db(path)?;
            println!("Database: {}", path.display());
            match &config.source {
                Some(source) => println!("Config: {}", source.display()),
                None => println!("Config: defaults"),
            }
            println!("Schema version: {}", db::schema_version(&conn)?);
            for (table, count) in db::table_counts(&conn)? {
                println!("  {table:<24} {count}");
            }
            let runs = import::recent_runs(&conn, 5)?;
            if !runs.is_empty() {
                println!("Recent imports:");
                for run in runs {
                    println!(
                        "  #{} {} [{}] {}: read {}, imported {}, skipped {}, ignored {}",
                        run.run_id,
                        run.finished_at,
                        run.kind.as_deref().unwrap_or("unknown"),
                        run.source,
                        run.records_read,
                        run.records_imported,
                        run.records_skipped,
                        run.records_ignored
                    );
                }
            }
        }
    }
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush().context("flush prompt")?;
    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("read confirmation")?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

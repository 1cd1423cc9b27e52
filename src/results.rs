use crate::app_dirs::AppDirs;
use crate::race::ParticipantFinish;
use crate::workout::TimerSettings;
use chrono::{DateTime, Local};
use rusqlite::{params, Connection, Result};
use std::path::{Path, PathBuf};

/// A completed clock run as persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutResult {
    pub mode: String,
    pub rounds: u32,
    pub work_secs: u32,
    pub rest_secs: u32,
    pub elapsed_secs: f64,
    pub finished_at: DateTime<Local>,
}

impl WorkoutResult {
    pub fn from_run(settings: &TimerSettings, elapsed_secs: f64) -> Self {
        Self {
            mode: settings.mode.to_string(),
            rounds: settings.rounds,
            work_secs: settings.work_secs,
            rest_secs: settings.rest_secs,
            elapsed_secs,
            finished_at: Local::now(),
        }
    }
}

/// A persisted race finish row.
#[derive(Debug, Clone, PartialEq)]
pub struct RaceFinishRecord {
    pub participant: String,
    pub group_name: String,
    pub finish_secs: f64,
    pub placement: u32,
    pub finished_at: DateTime<Local>,
}

/// Database manager for workout and race results
#[derive(Debug)]
pub struct ResultsDb {
    conn: Connection,
}

impl ResultsDb {
    /// Initialize the database connection and create tables if needed
    pub fn new() -> Result<Self> {
        let db_path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("rondo_results.db"));

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("Failed to create directory: {}", e)),
                )
            })?;
        }

        let conn = Connection::open(&db_path)?;
        Self::with_connection(conn)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_connection(Connection::open(path)?)
    }

    /// In-memory database, for tests and ephemeral runs.
    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS workout_results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                mode TEXT NOT NULL,
                rounds INTEGER NOT NULL,
                work_secs INTEGER NOT NULL,
                rest_secs INTEGER NOT NULL,
                elapsed_secs REAL NOT NULL,
                finished_at TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS race_finishes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                participant TEXT NOT NULL,
                group_name TEXT NOT NULL,
                finish_secs REAL NOT NULL,
                placement INTEGER NOT NULL,
                finished_at TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_workout_results_finished_at ON workout_results(finished_at)",
            [],
        )?;

        Ok(ResultsDb { conn })
    }

    /// Record a completed clock run
    pub fn record_workout(&self, result: &WorkoutResult) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO workout_results
            (mode, rounds, work_secs, rest_secs, elapsed_secs, finished_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                result.mode,
                result.rounds,
                result.work_secs,
                result.rest_secs,
                result.elapsed_secs,
                result.finished_at.to_rfc3339(),
            ],
        )?;

        Ok(())
    }

    /// Record all finishes of a completed race in one transaction
    pub fn record_race(&mut self, group_names: &[String], finishes: &[ParticipantFinish]) -> Result<()> {
        let now = Local::now().to_rfc3339();
        let tx = self.conn.transaction()?;

        for finish in finishes {
            let group_name = group_names
                .get(finish.group_id)
                .map(String::as_str)
                .unwrap_or("");
            tx.execute(
                r#"
                INSERT INTO race_finishes
                (participant, group_name, finish_secs, placement, finished_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    finish.name,
                    group_name,
                    finish.finish_secs,
                    finish.placement,
                    now,
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Most recent workout results, newest first. A negative limit in SQLite
    /// means "no limit", which the CSV export relies on.
    fn workouts_limited(&self, limit: i64) -> Result<Vec<WorkoutResult>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT mode, rounds, work_secs, rest_secs, elapsed_secs, finished_at
            FROM workout_results
            ORDER BY finished_at DESC
            LIMIT ?1
            "#,
        )?;

        let rows = stmt.query_map(params![limit], |row| {
            let finished_at: String = row.get(5)?;
            Ok(WorkoutResult {
                mode: row.get(0)?,
                rounds: row.get(1)?,
                work_secs: row.get(2)?,
                rest_secs: row.get(3)?,
                elapsed_secs: row.get(4)?,
                finished_at: DateTime::parse_from_rfc3339(&finished_at)
                    .map(|dt| dt.with_timezone(&Local))
                    .unwrap_or_else(|_| Local::now()),
            })
        })?;

        rows.collect()
    }

    /// Most recent workout results, newest first
    pub fn recent_workouts(&self, limit: usize) -> Result<Vec<WorkoutResult>> {
        self.workouts_limited(i64::try_from(limit).unwrap_or(i64::MAX))
    }

    /// All stored race finishes, newest first
    pub fn race_history(&self) -> Result<Vec<RaceFinishRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT participant, group_name, finish_secs, placement, finished_at
            FROM race_finishes
            ORDER BY finished_at DESC, placement ASC
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            let finished_at: String = row.get(4)?;
            Ok(RaceFinishRecord {
                participant: row.get(0)?,
                group_name: row.get(1)?,
                finish_secs: row.get(2)?,
                placement: row.get(3)?,
                finished_at: DateTime::parse_from_rfc3339(&finished_at)
                    .map(|dt| dt.with_timezone(&Local))
                    .unwrap_or_else(|_| Local::now()),
            })
        })?;

        rows.collect()
    }

    /// Export every stored workout result as CSV
    pub fn export_workouts_csv<W: std::io::Write>(&self, writer: W) -> Result<()> {
        let results = self.workouts_limited(-1)?;
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record([
            "finished_at",
            "mode",
            "rounds",
            "work_secs",
            "rest_secs",
            "elapsed_secs",
        ])
        .map_err(csv_err)?;
        for r in results {
            csv.write_record([
                r.finished_at.to_rfc3339(),
                r.mode.clone(),
                r.rounds.to_string(),
                r.work_secs.to_string(),
                r.rest_secs.to_string(),
                format!("{:.1}", r.elapsed_secs),
            ])
            .map_err(csv_err)?;
        }
        csv.flush()
            .map_err(|e| csv_err(csv::Error::from(e)))?;
        Ok(())
    }
}

fn csv_err(e: csv::Error) -> rusqlite::Error {
    rusqlite::Error::SqliteFailure(
        rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_IOERR),
        Some(format!("csv export failed: {}", e)),
    )
}

//! Append-only durable log of trial results.
//!
//! One CSV row per timed scenario invocation, flushed as it is written
//! so a crashed run still leaves usable partial data. Rows are never
//! updated or deleted.

use crate::BenchResult;
use chrono::{SecondsFormat, Utc};
use std::fs::{self, File, OpenOptions};
use std::path::Path;

/// Fixed column order of the results log.
pub const RESULT_COLUMNS: [&str; 7] = [
    "ts",
    "db",
    "dataset",
    "scenario",
    "repeat",
    "elapsed_ms",
    "notes",
];

/// One logged measurement of a single scenario repeat.
#[derive(Debug, Clone)]
pub struct TrialRecord {
    pub ts: String,
    pub db: String,
    pub dataset: String,
    pub scenario: String,
    pub repeat: u32,
    pub elapsed_ms: f64,
    pub notes: String,
}

impl TrialRecord {
    /// Stamp a new trial with the current UTC time.
    pub fn new(
        db: &str,
        dataset: &str,
        scenario: &str,
        repeat: u32,
        elapsed_ms: f64,
        notes: String,
    ) -> Self {
        Self {
            ts: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            db: db.to_string(),
            dataset: dataset.to_string(),
            scenario: scenario.to_string(),
            repeat,
            elapsed_ms,
            notes,
        }
    }
}

/// Durable append-only writer over the results CSV.
pub struct ResultsSink {
    writer: csv::Writer<File>,
}

impl ResultsSink {
    /// Open the log for appending, creating it with the fixed header when
    /// it is absent or empty.
    pub fn open(path: &Path) -> BenchResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let needs_header = fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if needs_header {
            writer.write_record(RESULT_COLUMNS)?;
            writer.flush()?;
        }
        Ok(Self { writer })
    }

    /// Append one trial row and flush it to disk immediately.
    pub fn append(&mut self, trial: &TrialRecord) -> BenchResult<()> {
        self.writer.write_record([
            trial.ts.as_str(),
            trial.db.as_str(),
            trial.dataset.as_str(),
            trial.scenario.as_str(),
            &trial.repeat.to_string(),
            &format!("{:.2}", trial.elapsed_ms),
            trial.notes.as_str(),
        ])?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn read_lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| l.to_string())
            .collect()
    }

    #[test]
    fn creates_header_once_across_reopens() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results").join("results.csv");

        {
            let mut sink = ResultsSink::open(&path).unwrap();
            sink.append(&TrialRecord::new("sqlite", "10k", "add_flight", 1, 1.234, "flight_id=1".into()))
                .unwrap();
        }
        {
            let mut sink = ResultsSink::open(&path).unwrap();
            sink.append(&TrialRecord::new("sqlite", "10k", "add_flight", 2, 0.997, "flight_id=2".into()))
                .unwrap();
        }

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "ts,db,dataset,scenario,repeat,elapsed_ms,notes");
        assert!(lines[1].contains(",sqlite,10k,add_flight,1,1.23,"));
        assert!(lines[2].contains(",sqlite,10k,add_flight,2,1.00,"));
    }

    #[test]
    fn elapsed_is_rounded_to_two_decimals() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.csv");

        let mut sink = ResultsSink::open(&path).unwrap();
        sink.append(&TrialRecord::new("sqlite", "d", "s", 1, 12.3456, "n".into()))
            .unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(row.get(5), Some("12.35"));
    }

    #[test]
    fn timestamp_is_iso8601_utc() {
        let trial = TrialRecord::new("db", "d", "s", 1, 0.0, String::new());
        assert!(trial.ts.ends_with('Z'));
        assert!(trial.ts.contains('T'));
    }
}

//! # Local CSV Event Log
//!
//! Appends switch events to one CSV file per UTC day and deletes files
//! older than the configured retention period.

use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::Result;
use crate::events::SwitchEvent;

const CSV_HEADER: &str = "timestamp,timestampIsoFormat,originatorId,buttonPressed,count\n";

/// Per-day CSV event logger with retention
#[derive(Debug)]
pub struct LocalFileLogger {
    directory: PathBuf,
    retention_days: i64,
}

impl LocalFileLogger {
    pub fn new<P: Into<PathBuf>>(directory: P, retention_days: i64) -> Self {
        Self {
            directory: directory.into(),
            retention_days,
        }
    }

    /// Delete log files older than the retention period
    ///
    /// Only files named `YYYY-MM-DD.csv` are considered; anything else
    /// (say, a manual `2022-01-01_copy.csv`) is left alone. A missing log
    /// directory is fine, nothing to sweep.
    pub fn remove_old_logs(&self) -> Result<()> {
        let entries = match fs::read_dir(&self.directory) {
            Ok(entries) => entries,
            Err(_) => return Ok(()),
        };

        let today = Utc::now().date_naive();
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            let Some(date) = file_date(&path) else {
                continue;
            };

            if (today - date).num_days() > self.retention_days {
                fs::remove_file(&path)?;
                info!("deleted {}", path.display());
            }
        }
        Ok(())
    }

    /// Append a batch of events, one CSV row each, grouped by day file
    ///
    /// Creates the log directory and the day file (with header) on first
    /// use. Events carry their own timestamps, so a batch spanning
    /// midnight lands in two files.
    pub fn write_log(&self, events: &[SwitchEvent]) -> Result<()> {
        if events.is_empty() {
            return Ok(());
        }
        if !self.directory.exists() {
            info!("log directory does not exist, creating");
            fs::create_dir_all(&self.directory)?;
        }

        let mut rows_by_file: BTreeMap<String, String> = BTreeMap::new();
        for event in events {
            let Some(when) = DateTime::<Utc>::from_timestamp_millis(event.timestamp) else {
                warn!(timestamp = event.timestamp, "event timestamp out of range");
                continue;
            };
            let file_name = format!("{}.csv", when.format("%Y-%m-%d"));
            let row = format!(
                "{},{},{},{},{}\n",
                event.timestamp,
                when.format("%Y-%m-%dT%H:%M:%S%.3f%z"),
                event.originator_id,
                event.button_pressed,
                event.count,
            );
            rows_by_file.entry(file_name).or_default().push_str(&row);
        }

        for (file_name, rows) in rows_by_file {
            let path = self.directory.join(file_name);
            info!("writing to {}", path.display());

            let is_new = !path.exists();
            let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
            if is_new {
                file.write_all(CSV_HEADER.as_bytes())?;
            }
            file.write_all(rows.as_bytes())?;
        }
        Ok(())
    }
}

/// Date encoded in a retention-managed log file name, if any
fn file_date(path: &Path) -> Option<NaiveDate> {
    if path.extension()?.to_str()? != "csv" {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    NaiveDate::parse_from_str(stem, "%Y-%m-%d").ok()
}

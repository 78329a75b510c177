//! On-disk state - credentials and the delivery schedule
//!
//! Both files live under the bridge directory and are read once at
//! startup. The schedule is written back after every delivery attempt so
//! a restart never repeats work; writes go through a temp file in the
//! same directory and an atomic rename.

use crate::config::Config;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Username and password the HTTP surface checks Basic auth against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Read credentials from `path`.
///
/// The file is normally a JSON object with `username` and `password`
/// fields; a single `username:password` line is accepted too, for files
/// written by hand. Content that looks like JSON must parse as the
/// object form; it never falls back to the line form. The running
/// bridge never writes this file.
pub fn load_credentials(path: &Path) -> Result<Credentials> {
    if !path.exists() {
        return Err(Error::MissingFile(path.to_path_buf()));
    }

    let raw = fs::read_to_string(path)?;
    let trimmed = raw.trim();

    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return serde_json::from_str(trimmed).map_err(|e| Error::MalformedFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        });
    }

    // Legacy form: one line, colon-separated
    if trimmed.lines().count() == 1 {
        if let Some((username, password)) = trimmed.split_once(':') {
            if !username.is_empty() {
                return Ok(Credentials {
                    username: username.to_string(),
                    password: password.to_string(),
                });
            }
        }
    }

    Err(Error::MalformedFile {
        path: path.to_path_buf(),
        reason: "expected a JSON object or username:password".to_string(),
    })
}

/// Lifecycle of one scheduled entry. `Pending` entries are eligible for
/// delivery; the other two are terminal and survive restarts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    #[default]
    Pending,
    Delivered,
    Failed,
}

impl DeliveryStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, DeliveryStatus::Pending)
    }
}

/// One pre-recorded message awaiting its due time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledMessage {
    pub number: String,
    pub message: String,
    pub scheduled_at: DateTime<Utc>,
    #[serde(default)]
    pub status: DeliveryStatus,
}

/// The schedule file and its in-memory copy
#[derive(Debug)]
pub struct ScheduleStore {
    schedule_path: PathBuf,
    entries: Vec<ScheduledMessage>,
}

impl ScheduleStore {
    pub fn new(config: &Config) -> Self {
        Self {
            schedule_path: config.schedule_file.clone(),
            entries: Vec::new(),
        }
    }

    /// Read the schedule file, replacing any in-memory entries.
    /// Returns how many entries were loaded. The file is required;
    /// a missing or unparseable file is an error.
    pub fn load(&mut self) -> Result<usize> {
        if !self.schedule_path.exists() {
            return Err(Error::MissingFile(self.schedule_path.clone()));
        }

        let raw = fs::read_to_string(&self.schedule_path)?;
        self.entries = serde_json::from_str(&raw).map_err(|e| Error::MalformedFile {
            path: self.schedule_path.clone(),
            reason: e.to_string(),
        })?;
        Ok(self.entries.len())
    }

    /// Write all entries back to disk atomically
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.schedule_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(&self.entries)?;
        let parent = self.schedule_path.parent().unwrap_or(Path::new("."));
        let mut temp = NamedTempFile::new_in(parent)?;
        temp.write_all(json.as_bytes())?;
        temp.as_file().sync_all()?;
        temp.persist(&self.schedule_path)
            .map_err(|e| Error::Io(e.error))?;
        Ok(())
    }

    /// Record the outcome of a delivery attempt and persist it
    pub fn mark(&mut self, index: usize, status: DeliveryStatus) -> Result<()> {
        if let Some(entry) = self.entries.get_mut(index) {
            entry.status = status;
            self.save()?;
        }
        Ok(())
    }

    pub fn entries(&self) -> &[ScheduledMessage] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries still eligible for delivery
    pub fn pending(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.status == DeliveryStatus::Pending)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn sample_entry(number: &str) -> ScheduledMessage {
        ScheduledMessage {
            number: number.to_string(),
            message: "hello".to_string(),
            scheduled_at: Utc.with_ymd_and_hms(2026, 1, 15, 9, 30, 0).unwrap(),
            status: DeliveryStatus::Pending,
        }
    }

    #[test]
    fn test_load_credentials_json() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("credentials.json");
        fs::write(&path, r#"{"username": "bridge", "password": "secret"}"#).unwrap();

        let creds = load_credentials(&path).unwrap();
        assert_eq!(creds.username, "bridge");
        assert_eq!(creds.password, "secret");
    }

    #[test]
    fn test_load_credentials_legacy_line() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("credentials.json");
        fs::write(&path, "bridge:sec:ret\n").unwrap();

        // Only the first colon splits; the password may contain colons
        let creds = load_credentials(&path).unwrap();
        assert_eq!(creds.username, "bridge");
        assert_eq!(creds.password, "sec:ret");
    }

    #[test]
    fn test_load_credentials_missing_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("credentials.json");

        let err = load_credentials(&path).unwrap_err();
        assert!(matches!(err, Error::MissingFile(_)));
    }

    #[test]
    fn test_load_credentials_malformed() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("credentials.json");
        fs::write(&path, "no separator here").unwrap();

        let err = load_credentials(&path).unwrap_err();
        assert!(matches!(err, Error::MalformedFile { .. }));
    }

    #[test]
    fn test_load_credentials_malformed_json() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("credentials.json");
        fs::write(&path, r#"{"username": "bridge"}"#).unwrap();

        let err = load_credentials(&path).unwrap_err();
        assert!(matches!(err, Error::MalformedFile { .. }));
    }

    #[test]
    fn test_load_credentials_rejects_json_array() {
        // A one-line array contains a colon but is not the legacy form
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("credentials.json");
        fs::write(&path, r#"["bridge:secret"]"#).unwrap();

        let err = load_credentials(&path).unwrap_err();
        assert!(matches!(err, Error::MalformedFile { .. }));
    }

    #[test]
    fn test_schedule_load_missing_file() {
        let temp = TempDir::new().unwrap();
        let config = Config::for_test(temp.path());

        let mut store = ScheduleStore::new(&config);
        let err = store.load().unwrap_err();
        assert!(matches!(err, Error::MissingFile(_)));
    }

    #[test]
    fn test_schedule_load_malformed() {
        let temp = TempDir::new().unwrap();
        let config = Config::for_test(temp.path());
        fs::write(&config.schedule_file, "{ not a list").unwrap();

        let mut store = ScheduleStore::new(&config);
        let err = store.load().unwrap_err();
        assert!(matches!(err, Error::MalformedFile { .. }));
    }

    #[test]
    fn test_schedule_save_and_reload() {
        let temp = TempDir::new().unwrap();
        let config = Config::for_test(temp.path());

        let mut store = ScheduleStore::new(&config);
        store.entries = vec![sample_entry("15551234567"), sample_entry("34600111222")];
        store.save().unwrap();

        let mut reloaded = ScheduleStore::new(&config);
        assert_eq!(reloaded.load().unwrap(), 2);
        assert_eq!(reloaded.entries()[0].number, "15551234567");
        assert_eq!(reloaded.entries()[1].status, DeliveryStatus::Pending);
    }

    #[test]
    fn test_mark_persists_across_reload() {
        let temp = TempDir::new().unwrap();
        let config = Config::for_test(temp.path());

        let mut store = ScheduleStore::new(&config);
        store.entries = vec![sample_entry("111"), sample_entry("222")];
        store.save().unwrap();

        store.mark(0, DeliveryStatus::Delivered).unwrap();
        store.mark(1, DeliveryStatus::Failed).unwrap();

        let mut reloaded = ScheduleStore::new(&config);
        reloaded.load().unwrap();
        assert_eq!(reloaded.entries()[0].status, DeliveryStatus::Delivered);
        assert_eq!(reloaded.entries()[1].status, DeliveryStatus::Failed);
        assert_eq!(reloaded.pending(), 0);
    }

    #[test]
    fn test_mark_out_of_range_is_noop() {
        let temp = TempDir::new().unwrap();
        let config = Config::for_test(temp.path());

        let mut store = ScheduleStore::new(&config);
        store.mark(7, DeliveryStatus::Delivered).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_entries_without_status_load_as_pending() {
        let temp = TempDir::new().unwrap();
        let config = Config::for_test(temp.path());
        fs::write(
            &config.schedule_file,
            r#"[{"number": "15551234567", "message": "hi", "scheduled_at": "2026-01-15T09:30:00Z"}]"#,
        )
        .unwrap();

        let mut store = ScheduleStore::new(&config);
        assert_eq!(store.load().unwrap(), 1);
        assert_eq!(store.entries()[0].status, DeliveryStatus::Pending);
        assert_eq!(store.pending(), 1);
    }
}

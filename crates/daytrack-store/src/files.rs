//! Data directory layout and document I/O.
//!
//! ```text
//! <data_dir>/2026-10-15.md        day documents
//! <data_dir>/weekly/2026-W42.md   weekly plans
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::markdown::{skeleton, weekly_skeleton};

const DAY_FORMAT: &str = "%Y-%m-%d";

/// `YYYY-MM-DD` key of a day document.
pub fn day_key(date: NaiveDate) -> String {
    date.format(DAY_FORMAT).to_string()
}

/// ISO `YYYY-Www` key of the week containing `date`.
pub fn week_key(date: NaiveDate) -> String {
    let week = date.iso_week();
    format!("{}-W{:02}", week.year(), week.week())
}

/// Parse a strict `YYYY-MM-DD` key.
pub fn parse_day_key(key: &str) -> Option<NaiveDate> {
    if key.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(key, DAY_FORMAT).ok()
}

/// Handle on the directory holding all documents.
#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(config.data_dir.clone())
    }

    /// Directory holding the weekly plans.
    pub fn weekly_dir(&self) -> PathBuf {
        self.root.join("weekly")
    }

    pub fn day_path(&self, date: NaiveDate) -> PathBuf {
        self.root.join(format!("{}.md", day_key(date)))
    }

    pub fn week_path(&self, date: NaiveDate) -> PathBuf {
        self.weekly_dir().join(format!("{}.md", week_key(date)))
    }

    pub async fn day_exists(&self, date: NaiveDate) -> Result<bool, StoreError> {
        let path = self.day_path(date);
        tokio::fs::try_exists(&path)
            .await
            .map_err(|source| StoreError::Read { path, source })
    }

    /// Create the day document with an empty skeleton unless it exists.
    ///
    /// Returns the document path. Calling this on an existing document
    /// never touches its contents.
    pub async fn ensure_day(&self, date: NaiveDate) -> Result<PathBuf, StoreError> {
        let path = self.day_path(date);
        let title = format!("{} 任务追踪", day_key(date));
        self.create_if_missing(&path, &skeleton(&title)).await?;
        Ok(path)
    }

    /// Create the weekly plan for the week containing `date` unless it exists.
    pub async fn ensure_week(&self, date: NaiveDate) -> Result<PathBuf, StoreError> {
        let path = self.week_path(date);
        self.create_if_missing(&path, &weekly_skeleton(&week_key(date)))
            .await?;
        Ok(path)
    }

    async fn create_if_missing(&self, path: &Path, contents: &str) -> Result<(), StoreError> {
        let write_err = |source| StoreError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }

        let file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await;
        let mut file = match file {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(()),
            Err(e) => return Err(write_err(e)),
        };

        file.write_all(contents.as_bytes())
            .await
            .map_err(write_err)?;
        file.flush().await.map_err(write_err)?;
        info!(path = %path.display(), "initialized document");
        Ok(())
    }

    pub async fn read(&self, path: &Path) -> Result<String, StoreError> {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|source| StoreError::Read {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Replace a document's contents.
    ///
    /// The new text is written to a sibling `.tmp` file and renamed over the
    /// document, so a concurrent reader sees either the old or the new text.
    pub async fn write(&self, path: &Path, contents: &str) -> Result<(), StoreError> {
        let tmp = path.with_extension("md.tmp");
        tokio::fs::write(&tmp, contents)
            .await
            .map_err(|source| StoreError::Write {
                path: tmp.clone(),
                source,
            })?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|source| StoreError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(path = %path.display(), bytes = contents.len(), "document written");
        Ok(())
    }

    /// Dates of every day document, newest first.
    pub async fn list_days(&self) -> Result<Vec<NaiveDate>, StoreError> {
        let list_err = |source| StoreError::List {
            path: self.root.clone(),
            source,
        };

        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(list_err(e)),
        };

        let mut days = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(list_err)? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(date) = name.strip_suffix(".md").and_then(parse_day_key) {
                days.push(date);
            }
        }
        days.sort_unstable_by(|a, b| b.cmp(a));
        Ok(days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn keys() {
        assert_eq!(day_key(date(2026, 1, 5)), "2026-01-05");
        assert_eq!(week_key(date(2026, 10, 15)), "2026-W42");
        // 2027-01-01 is a Friday and belongs to the last ISO week of 2026.
        assert_eq!(week_key(date(2027, 1, 1)), "2026-W53");
    }

    #[test]
    fn parse_day_key_is_strict() {
        assert_eq!(parse_day_key("2026-10-15"), Some(date(2026, 10, 15)));
        assert_eq!(parse_day_key("2026-2-01"), None);
        assert_eq!(parse_day_key("2026-02-30"), None);
        assert_eq!(parse_day_key("../etc/pwd"), None);
    }

    #[test]
    fn paths() {
        let dir = DataDir::new("/data");
        assert_eq!(
            dir.day_path(date(2026, 10, 15)),
            PathBuf::from("/data/2026-10-15.md")
        );
        assert_eq!(dir.weekly_dir(), PathBuf::from("/data/weekly"));
        assert_eq!(
            dir.week_path(date(2026, 10, 15)),
            PathBuf::from("/data/weekly/2026-W42.md")
        );
    }
}

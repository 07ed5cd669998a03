//! Shared test utilities for daytrack integration tests.
//!
//! Each test gets its own temporary data directory and a [`TaskService`]
//! whose clock is pinned to [`TEST_DATE`], so "today" is deterministic.
//! The directory is removed when the [`TestWorkspace`] is dropped.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use tempfile::TempDir;

use daytrack_core::{FixedClock, TaskService};
use daytrack_store::DataDir;

/// Millisecond timestamp the fixed clock starts at.
pub const TEST_MILLIS: i64 = 1_760_500_000_000;

/// The date every test workspace treats as today (2026-10-15).
pub fn test_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 15).expect("valid test date")
}

/// A temp data directory plus a service wired to it.
pub struct TestWorkspace {
    pub clock: Arc<FixedClock>,
    pub service: Arc<TaskService>,
    dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self::on(test_date())
    }

    /// Workspace whose clock reports `date` as today.
    pub fn on(date: NaiveDate) -> Self {
        let dir = TempDir::new().expect("failed to create temp data dir");
        let clock = Arc::new(FixedClock::new(date, TEST_MILLIS));
        let service = Arc::new(TaskService::new(
            DataDir::new(dir.path()),
            clock.clone(),
        ));
        Self {
            clock,
            service,
            dir,
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn data_dir(&self) -> DataDir {
        DataDir::new(self.dir.path())
    }

    /// Path of the day document for `date`.
    pub fn day_path(&self, date: NaiveDate) -> PathBuf {
        self.data_dir().day_path(date)
    }

    /// Seed a day document with raw Markdown.
    pub fn write_day(&self, date: NaiveDate, contents: &str) {
        std::fs::write(self.day_path(date), contents).expect("failed to seed day document");
    }

    /// Raw Markdown of a day document.
    pub fn read_day(&self, date: NaiveDate) -> String {
        std::fs::read_to_string(self.day_path(date)).expect("failed to read day document")
    }
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

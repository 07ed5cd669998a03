//! Task service layer.
//!
//! Resolves which document an operation targets (today's day document,
//! this week's plan, or an archived day) and runs each mutation as one
//! read-modify-write cycle under that document's write lock:
//!
//! 1. initialize the document if it does not exist yet,
//! 2. read and parse it,
//! 3. mutate the parsed tasks in memory,
//! 4. render in place and write it back.
//!
//! A mutation that fails (unknown id, invalid text) returns before step 4
//! and leaves the document untouched.

mod board;
mod history;
mod weekly;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use daytrack_store::markdown::{self, ParseWarning, parse_document, parse_weekly, render_weekly};
use daytrack_store::{Board, DataDir, Task};
use tracing::warn;

use crate::clock::Clock;
use crate::error::ServiceError;
use crate::lock::DocumentLocks;

pub use board::{TaskUpdate, TodayView};
pub use history::HistoryDay;
pub use weekly::WeeklyPlan;

pub struct TaskService {
    files: DataDir,
    clock: Arc<dyn Clock>,
    locks: DocumentLocks,
}

impl TaskService {
    pub fn new(files: DataDir, clock: Arc<dyn Clock>) -> Self {
        Self {
            files,
            clock,
            locks: DocumentLocks::new(),
        }
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    // -----------------------------------------------------------------------
    // Day documents
    // -----------------------------------------------------------------------

    async fn read_board(&self, path: &Path) -> Result<(String, Board), ServiceError> {
        let content = self.files.read(path).await?;
        let doc = parse_document(&content);
        log_warnings(path, &doc.warnings);
        Ok((content, doc.board))
    }

    /// Run `f` against today's board and persist the result.
    async fn mutate_today<T>(
        &self,
        f: impl FnOnce(&mut Board) -> Result<T, ServiceError>,
    ) -> Result<T, ServiceError> {
        let path = self.files.ensure_day(self.clock.today()).await?;
        let _guard = self.locks.acquire(&path).await;

        let (content, mut board) = self.read_board(&path).await?;
        let out = f(&mut board)?;
        let rendered = markdown::render(&board, Some(&content));
        self.files.write(&path, &rendered).await?;
        Ok(out)
    }

    // -----------------------------------------------------------------------
    // Weekly plans
    // -----------------------------------------------------------------------

    async fn weekly_path(&self) -> Result<PathBuf, ServiceError> {
        Ok(self.files.ensure_week(self.clock.today()).await?)
    }

    async fn read_weekly(&self, path: &Path) -> Result<(String, Vec<Task>), ServiceError> {
        let content = self.files.read(path).await?;
        let (tasks, warnings) = parse_weekly(&content);
        log_warnings(path, &warnings);
        Ok((content, tasks))
    }

    async fn mutate_weekly<T>(
        &self,
        f: impl FnOnce(&mut Vec<Task>) -> Result<T, ServiceError>,
    ) -> Result<T, ServiceError> {
        let path = self.weekly_path().await?;
        let _guard = self.locks.acquire(&path).await;

        let (content, mut tasks) = self.read_weekly(&path).await?;
        let out = f(&mut tasks)?;
        let rendered = render_weekly(&tasks, &content);
        self.files.write(&path, &rendered).await?;
        Ok(out)
    }
}

fn log_warnings(path: &Path, warnings: &[ParseWarning]) {
    for w in warnings {
        warn!(path = %path.display(), "{w}");
    }
}

/// Normalize task text, rejecting anything that cannot be written back
/// faithfully.
fn validate_text(text: &str) -> Result<String, ServiceError> {
    let text = daytrack_store::models::normalize_text(text).ok_or(ServiceError::InvalidText)?;
    if markdown::text_conflicts_with_markup(&text) {
        return Err(ServiceError::InvalidText);
    }
    Ok(text)
}

/// Mint an id from the clock, bumping it until no existing task uses it.
fn mint_id(now_millis: i64, taken: impl Fn(&str) -> bool) -> String {
    let mut candidate = now_millis;
    loop {
        let id = candidate.to_string();
        if !taken(&id) {
            return id;
        }
        candidate += 1;
    }
}

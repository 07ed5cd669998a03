//! Read-only access to earlier day documents.

use daytrack_store::{Board, day_key, parse_day_key};
use serde::Serialize;

use super::TaskService;
use crate::error::ServiceError;

#[derive(Debug, Clone, Serialize)]
pub struct HistoryDay {
    pub date: String,
    pub tasks: Board,
}

impl TaskService {
    /// Keys of every day document except today's, newest first.
    pub async fn history_dates(&self) -> Result<Vec<String>, ServiceError> {
        let today = self.clock.today();
        let days = self.files.list_days().await?;
        Ok(days
            .into_iter()
            .filter(|d| *d != today)
            .map(day_key)
            .collect())
    }

    /// The board recorded for `date`. Never creates a document.
    pub async fn history_day(&self, date: &str) -> Result<HistoryDay, ServiceError> {
        let day = parse_day_key(date).ok_or_else(|| ServiceError::InvalidDate(date.to_owned()))?;
        if !self.files.day_exists(day).await? {
            return Err(ServiceError::DayNotFound(date.to_owned()));
        }
        let (_, tasks) = self.read_board(&self.files.day_path(day)).await?;
        Ok(HistoryDay {
            date: day_key(day),
            tasks,
        })
    }
}

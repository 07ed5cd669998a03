//! This week's plan.

use daytrack_store::{Task, week_key};
use serde::Serialize;

use super::{TaskService, mint_id, validate_text};
use crate::error::ServiceError;

#[derive(Debug, Clone, Serialize)]
pub struct WeeklyPlan {
    pub week: String,
    pub tasks: Vec<Task>,
}

impl TaskService {
    pub async fn weekly(&self) -> Result<WeeklyPlan, ServiceError> {
        let week = week_key(self.clock.today());
        let path = self.weekly_path().await?;
        let (_, tasks) = self.read_weekly(&path).await?;
        Ok(WeeklyPlan { week, tasks })
    }

    pub async fn add_weekly(&self, text: &str) -> Result<Task, ServiceError> {
        let text = validate_text(text)?;
        let now = self.clock.now_millis();
        self.mutate_weekly(|tasks| {
            let id = mint_id(now, |id| tasks.iter().any(|t| t.id == id));
            let task = Task::new(id, text);
            tasks.push(task.clone());
            Ok(task)
        })
        .await
    }

    /// Flip the done state of a weekly task.
    pub async fn toggle_weekly(&self, id: &str) -> Result<Task, ServiceError> {
        self.mutate_weekly(|tasks| {
            let task = tasks
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or_else(|| ServiceError::TaskNotFound(id.to_owned()))?;
            task.done = !task.done;
            Ok(task.clone())
        })
        .await
    }

    pub async fn delete_weekly(&self, id: &str) -> Result<Task, ServiceError> {
        self.mutate_weekly(|tasks| {
            let idx = tasks
                .iter()
                .position(|t| t.id == id)
                .ok_or_else(|| ServiceError::TaskNotFound(id.to_owned()))?;
            Ok(tasks.remove(idx))
        })
        .await
    }
}

//! Today's kanban board.

use daytrack_store::{Board, Section, Task, day_key};
use serde::Serialize;

use super::{TaskService, mint_id, validate_text};
use crate::error::ServiceError;

/// Changes applied to one task by [`TaskService::update`]. Unset fields
/// are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskUpdate {
    /// Move the task to this section. Entering a different section sets
    /// `done` to whether that section is Done.
    pub status: Option<Section>,
    /// Position in the target section, clamped to its length. Without it a
    /// moved task is appended and an unmoved task keeps its place.
    pub new_index: Option<usize>,
    pub text: Option<String>,
    pub flagged: Option<bool>,
    pub done: Option<bool>,
}

/// Payload of the today view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayView {
    pub date: String,
    pub tasks: Board,
    pub bot_tasks: Vec<Task>,
}

impl TaskService {
    /// Today's board, creating the day document if needed.
    pub async fn list(&self) -> Result<Board, ServiceError> {
        let path = self.files.ensure_day(self.clock.today()).await?;
        let (_, board) = self.read_board(&path).await?;
        Ok(board)
    }

    pub async fn today(&self) -> Result<TodayView, ServiceError> {
        let date = day_key(self.clock.today());
        let tasks = self.list().await?;
        let bot_tasks = tasks.sleep.clone();
        Ok(TodayView {
            date,
            tasks,
            bot_tasks,
        })
    }

    /// Append a new open task to `section`.
    pub async fn add(&self, text: &str, section: Section) -> Result<Task, ServiceError> {
        let text = validate_text(text)?;
        let now = self.clock.now_millis();
        self.mutate_today(|board| {
            let task = Task::new(mint_id(now, |id| board.contains_id(id)), text);
            board.section_mut(section).push(task.clone());
            Ok(task)
        })
        .await
    }

    /// Move a task to the end of `section`.
    pub async fn move_task(&self, id: &str, section: Section) -> Result<Task, ServiceError> {
        self.update(
            id,
            TaskUpdate {
                status: Some(section),
                ..TaskUpdate::default()
            },
        )
        .await
    }

    /// Apply `update` to the task with `id` and return the updated task.
    pub async fn update(&self, id: &str, update: TaskUpdate) -> Result<Task, ServiceError> {
        let text = update.text.as_deref().map(validate_text).transpose()?;
        self.mutate_today(|board| apply_update(board, id, update, text))
            .await
    }

    /// Remove the task with `id` and return it.
    pub async fn delete(&self, id: &str) -> Result<Task, ServiceError> {
        self.mutate_today(|board| {
            board
                .remove(id)
                .map(|(_, task)| task)
                .ok_or_else(|| ServiceError::TaskNotFound(id.to_owned()))
        })
        .await
    }
}

fn apply_update(
    board: &mut Board,
    id: &str,
    update: TaskUpdate,
    text: Option<String>,
) -> Result<Task, ServiceError> {
    let (from, idx) = board
        .find(id)
        .ok_or_else(|| ServiceError::TaskNotFound(id.to_owned()))?;
    let mut task = board.section_mut(from).remove(idx);

    if let Some(text) = text {
        task.text = text;
    }
    if let Some(flagged) = update.flagged {
        task.flagged = flagged;
    }
    let target = update.status.unwrap_or(from);
    if target != from {
        task.done = target == Section::Done;
    }
    if let Some(done) = update.done {
        task.done = done;
    }

    let list = board.section_mut(target);
    let pos = match (update.new_index, update.status) {
        (Some(index), _) => index.min(list.len()),
        (None, Some(_)) => list.len(),
        (None, None) => idx,
    };
    list.insert(pos, task.clone());
    Ok(task)
}

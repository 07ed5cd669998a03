use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Section
// ---------------------------------------------------------------------------

/// One of the fixed task buckets of a day document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Section {
    Backlog,
    #[serde(alias = "in_progress", alias = "in-progress")]
    InProgress,
    Done,
    /// Background jobs left running overnight.
    #[serde(alias = "botTasks")]
    Sleep,
}

impl Section {
    /// Canonical order: document layout and id lookup both follow it.
    pub const ALL: [Section; 4] = [
        Section::Backlog,
        Section::InProgress,
        Section::Done,
        Section::Sleep,
    ];

    /// Header line that opens this section in a day document.
    ///
    /// The UI and any hand-edited files depend on these strings verbatim.
    pub fn header(self) -> &'static str {
        match self {
            Self::Backlog => "## 📋 Backlog",
            Self::InProgress => "## 🚀 In Progress",
            Self::Done => "## ✅ Done",
            Self::Sleep => "## 💤 睡眠后台任务",
        }
    }

    /// Match a line against the section header prefixes.
    pub fn from_header(line: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| line.starts_with(s.header()))
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Backlog => "backlog",
            Self::InProgress => "inProgress",
            Self::Done => "done",
            Self::Sleep => "sleep",
        };
        f.write_str(s)
    }
}

impl FromStr for Section {
    type Err = SectionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "backlog" => Ok(Self::Backlog),
            "inProgress" | "in_progress" | "in-progress" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            "sleep" | "botTasks" => Ok(Self::Sleep),
            other => Err(SectionParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`Section`] string.
#[derive(Debug, Clone)]
pub struct SectionParseError(pub String);

impl fmt::Display for SectionParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid section: {:?} (expected backlog, inProgress, done, or sleep)",
            self.0
        )
    }
}

impl std::error::Error for SectionParseError {}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

/// A single checkbox item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub text: String,
    pub done: bool,
    #[serde(default)]
    pub flagged: bool,
}

impl Task {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            done: false,
            flagged: false,
        }
    }
}

/// Whether `id` can be embedded in a `[#id]` marker and read back.
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Normalize user-supplied task text to a single trimmed line.
///
/// Returns `None` when nothing but whitespace remains.
pub fn normalize_text(text: &str) -> Option<String> {
    let joined = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if joined.is_empty() { None } else { Some(joined) }
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// The task lists of one day document, in display order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    #[serde(default)]
    pub backlog: Vec<Task>,
    #[serde(default)]
    pub in_progress: Vec<Task>,
    #[serde(default)]
    pub done: Vec<Task>,
    #[serde(default, rename = "botTasks")]
    pub sleep: Vec<Task>,
}

impl Board {
    pub fn section(&self, section: Section) -> &[Task] {
        match section {
            Section::Backlog => &self.backlog,
            Section::InProgress => &self.in_progress,
            Section::Done => &self.done,
            Section::Sleep => &self.sleep,
        }
    }

    pub fn section_mut(&mut self, section: Section) -> &mut Vec<Task> {
        match section {
            Section::Backlog => &mut self.backlog,
            Section::InProgress => &mut self.in_progress,
            Section::Done => &mut self.done,
            Section::Sleep => &mut self.sleep,
        }
    }

    /// Find a task by id, scanning sections in canonical order.
    pub fn find(&self, id: &str) -> Option<(Section, usize)> {
        Section::ALL.into_iter().find_map(|section| {
            self.section(section)
                .iter()
                .position(|t| t.id == id)
                .map(|idx| (section, idx))
        })
    }

    /// Remove a task by id, returning it with the section it came from.
    pub fn remove(&mut self, id: &str) -> Option<(Section, Task)> {
        let (section, idx) = self.find(id)?;
        Some((section, self.section_mut(section).remove(idx)))
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    pub fn len(&self) -> usize {
        Section::ALL.iter().map(|s| self.section(*s).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

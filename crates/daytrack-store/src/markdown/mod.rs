//! Markdown day documents: line grammar, parsing, and in-place rendering.
//!
//! A day document is a title, one `##` header per [`Section`], and a
//! checkbox list under each header:
//!
//! ```text
//! # 2026-10-15 任务追踪
//!
//! ## 📋 Backlog
//!
//! - [ ] [#1760500000000] Buy milk
//! - [ ] [#1760500000001] [!] Call the bank
//!
//! ## 🚀 In Progress
//!
//! ## ✅ Done
//!
//! - [x] [#1760400000000] Book flights
//!
//! ## 💤 睡眠后台任务
//! ```
//!
//! Anything else in the file (notes, extra headings, blank lines) is
//! furniture and survives a rewrite.
//!
//! [`Section`]: crate::models::Section

pub mod parser;
pub mod render;
pub mod weekly;

use sha2::{Digest, Sha256};

use crate::models::Section;

pub use parser::{ParseWarning, ParsedDocument, parse, parse_document};
pub use render::{render, skeleton};
pub use weekly::{parse_weekly, render_weekly, weekly_skeleton};

const FLAG_MARKER: &str = "[!]";

/// A checkbox line, before id resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskLine {
    pub done: bool,
    pub id: Option<String>,
    pub flagged: bool,
    pub text: String,
}

/// Classification of a single document line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line<'a> {
    Header(Section),
    Task(TaskLine),
    Other(&'a str),
}

/// Classify one line without any knowledge of the surrounding document.
pub fn classify(line: &str) -> Line<'_> {
    if let Some(section) = Section::from_header(line) {
        return Line::Header(section);
    }
    match parse_task_line(line) {
        Some(task) => Line::Task(task),
        None => Line::Other(line),
    }
}

/// Parse `- [ ] [#id] [!] text`. The id and flag tokens are optional.
pub fn parse_task_line(line: &str) -> Option<TaskLine> {
    let (done, rest) = if let Some(rest) = line.strip_prefix("- [ ]") {
        (false, rest)
    } else if let Some(rest) = line
        .strip_prefix("- [x]")
        .or_else(|| line.strip_prefix("- [X]"))
    {
        (true, rest)
    } else {
        return None;
    };

    let mut rest = rest.trim_start();
    let mut id = None;
    let marker = rest
        .strip_prefix("[#")
        .and_then(|after| after.find(']').map(|end| (after, end)));
    if let Some((after, end)) = marker {
        if crate::models::is_valid_id(&after[..end]) {
            id = Some(after[..end].to_owned());
            rest = after[end + 1..].trim_start();
        }
    }

    let flagged = match rest.strip_prefix(FLAG_MARKER) {
        Some(after) => {
            rest = after;
            true
        }
        None => false,
    };

    Some(TaskLine {
        done,
        id,
        flagged,
        text: rest.trim().to_owned(),
    })
}

/// Render one task as a checkbox line.
pub fn render_task_line(task: &crate::models::Task) -> String {
    let check = if task.done { 'x' } else { ' ' };
    let flag = if task.flagged { "[!] " } else { "" };
    format!("- [{check}] [#{}] {flag}{}", task.id, task.text)
        .trim_end()
        .to_owned()
}

/// Whether user text would be misread as markup when written back.
pub fn text_conflicts_with_markup(text: &str) -> bool {
    text.starts_with(FLAG_MARKER)
}

/// Stable id for a task line that carries no usable `[#id]` marker.
///
/// The same (scope, text, occurrence) always yields the same id, so
/// repeated reads of a hand-edited file agree until the next write
/// embeds it.
pub(crate) fn derive_id(scope: &str, text: &str, occurrence: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(scope.as_bytes());
    hasher.update(b"\n");
    hasher.update(text.as_bytes());
    hasher.update(b"\n");
    hasher.update(occurrence.to_string().as_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("h{}", &digest[..10])
}

/// Join rendered lines, dropping trailing blank lines and ending with a
/// single newline.
pub(crate) fn finish(mut out: Vec<String>) -> String {
    while out.last().is_some_and(|l| l.trim().is_empty()) {
        out.pop();
    }
    let mut text = out.join("\n");
    text.push('\n');
    text
}

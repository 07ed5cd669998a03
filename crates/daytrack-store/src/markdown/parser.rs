//! Day document parser.
//!
//! Lines are classified independently (see [`classify`]) and folded into a
//! [`Board`]. Task lines count only once a section header has been seen.
//!
//! Ids are never minted from the clock here. A task line without a usable
//! `[#id]` marker, or one repeating an id already used earlier in the
//! document, gets a content-derived id and a [`ParseWarning`].

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::models::{Board, Section, Task};

use super::{Line, TaskLine, classify, derive_id};

/// Data-integrity issue found while parsing. Parsing still succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseWarning {
    /// The task line carried no `[#id]` marker.
    MissingId { line: usize, assigned: String },
    /// The id was already used by an earlier task line.
    DuplicateId {
        line: usize,
        id: String,
        assigned: String,
    },
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingId { line, assigned } => {
                write!(f, "line {line}: task has no id, assigned {assigned}")
            }
            Self::DuplicateId { line, id, assigned } => {
                write!(f, "line {line}: duplicate id {id}, reassigned {assigned}")
            }
        }
    }
}

/// Result of [`parse_document`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedDocument {
    pub board: Board,
    pub warnings: Vec<ParseWarning>,
}

/// Parse a day document into its board, discarding warnings.
pub fn parse(content: &str) -> Board {
    parse_document(content).board
}

/// Parse a day document into its board and any data-integrity warnings.
pub fn parse_document(content: &str) -> ParsedDocument {
    let (_, entries) = content.lines().enumerate().fold(
        (None::<Section>, Vec::new()),
        |(current, mut entries), (idx, line)| match classify(line) {
            Line::Header(section) => (Some(section), entries),
            Line::Task(task) => {
                if let Some(section) = current {
                    entries.push((section, idx + 1, task));
                }
                (current, entries)
            }
            Line::Other(_) => (current, entries),
        },
    );

    let mut ids = IdAssigner::new(&entries);
    let mut doc = ParsedDocument::default();
    for (section, line, task_line) in entries {
        let scope = section.to_string();
        let (id, warning) = ids.assign(&scope, line, &task_line);
        if let Some(w) = warning {
            doc.warnings.push(w);
        }
        doc.board.section_mut(section).push(Task {
            id,
            text: task_line.text,
            done: task_line.done,
            flagged: task_line.flagged,
        });
    }
    doc
}

/// Hands out unique ids in document order.
///
/// Explicit ids are reserved up front so a derived id can never collide
/// with an explicit one that appears later in the file.
pub(crate) struct IdAssigner {
    used: HashSet<String>,
    reserved: HashSet<String>,
    occurrences: HashMap<(String, String), usize>,
}

impl IdAssigner {
    pub(crate) fn new<S>(entries: &[(S, usize, TaskLine)]) -> Self {
        let reserved = entries
            .iter()
            .filter_map(|(_, _, t)| t.id.clone())
            .collect();
        Self {
            used: HashSet::new(),
            reserved,
            occurrences: HashMap::new(),
        }
    }

    pub(crate) fn assign(
        &mut self,
        scope: &str,
        line: usize,
        task: &TaskLine,
    ) -> (String, Option<ParseWarning>) {
        match &task.id {
            Some(id) if self.used.insert(id.clone()) => (id.clone(), None),
            Some(id) => {
                let assigned = self.derive(scope, &task.text);
                let warning = ParseWarning::DuplicateId {
                    line,
                    id: id.clone(),
                    assigned: assigned.clone(),
                };
                (assigned, Some(warning))
            }
            None => {
                let assigned = self.derive(scope, &task.text);
                let warning = ParseWarning::MissingId {
                    line,
                    assigned: assigned.clone(),
                };
                (assigned, Some(warning))
            }
        }
    }

    fn derive(&mut self, scope: &str, text: &str) -> String {
        let counter = self
            .occurrences
            .entry((scope.to_owned(), text.to_owned()))
            .or_insert(0);
        loop {
            let candidate = derive_id(scope, text, *counter);
            *counter += 1;
            if !self.reserved.contains(&candidate) && self.used.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

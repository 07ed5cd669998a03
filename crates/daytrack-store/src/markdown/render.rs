//! Day document rendering.

use std::collections::HashSet;

use crate::models::{Board, Section, Task};

use super::{Line, classify, finish, render_task_line};

/// Fresh day document with every section header and no tasks.
pub fn skeleton(title: &str) -> String {
    format!("# {title}\n\n{}", canonical_layout())
}

fn canonical_layout() -> String {
    let headers: Vec<&str> = Section::ALL.iter().map(|s| s.header()).collect();
    let mut layout = headers.join("\n\n");
    layout.push('\n');
    layout
}

/// Render `board` as a day document.
///
/// With `original`, the document is rewritten in place: each section's
/// task list is regenerated directly under the first occurrence of its
/// header and every other line is kept. Without it, the canonical layout
/// is rebuilt from scratch.
pub fn render(board: &Board, original: Option<&str>) -> String {
    match original {
        Some(original) => rewrite(board, original),
        None => rewrite(board, &canonical_layout()),
    }
}

fn rewrite(board: &Board, original: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut emitted: HashSet<Section> = HashSet::new();
    let mut current: Option<Section> = None;
    // True while skipping the blank/task run that follows a header.
    let mut in_block = false;

    for line in original.lines() {
        match classify(line) {
            Line::Header(section) => {
                current = Some(section);
                out.push(line.to_owned());
                let tasks: &[Task] = if emitted.insert(section) {
                    board.section(section)
                } else {
                    &[]
                };
                push_block(&mut out, tasks);
                in_block = true;
            }
            Line::Task(_) if current.is_some() => {}
            Line::Task(_) | Line::Other(_) => {
                if in_block && line.trim().is_empty() {
                    continue;
                }
                in_block = false;
                out.push(line.to_owned());
            }
        }
    }

    for section in Section::ALL {
        let tasks = board.section(section);
        if emitted.contains(&section) || tasks.is_empty() {
            continue;
        }
        if out.last().is_some_and(|l| !l.trim().is_empty()) {
            out.push(String::new());
        }
        out.push(section.header().to_owned());
        push_block(&mut out, tasks);
    }

    finish(out)
}

fn push_block(out: &mut Vec<String>, tasks: &[Task]) {
    out.push(String::new());
    if tasks.is_empty() {
        return;
    }
    out.extend(tasks.iter().map(render_task_line));
    out.push(String::new());
}

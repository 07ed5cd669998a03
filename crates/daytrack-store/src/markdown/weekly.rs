//! Weekly plan documents: a title and one flat checkbox list.

use crate::models::Task;

use super::parser::{IdAssigner, ParseWarning};
use super::{finish, parse_task_line, render_task_line};

const SCOPE: &str = "weekly";

/// Fresh weekly plan document.
pub fn weekly_skeleton(week_key: &str) -> String {
    format!("# {week_key} 本周计划\n")
}

/// Collect every checkbox line of a weekly plan, in document order.
pub fn parse_weekly(content: &str) -> (Vec<Task>, Vec<ParseWarning>) {
    let entries: Vec<((), usize, _)> = content
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| parse_task_line(line).map(|t| ((), idx + 1, t)))
        .collect();

    let mut ids = IdAssigner::new(&entries);
    let mut warnings = Vec::new();
    let tasks = entries
        .into_iter()
        .map(|(_, line, task_line)| {
            let (id, warning) = ids.assign(SCOPE, line, &task_line);
            warnings.extend(warning);
            Task {
                id,
                text: task_line.text,
                done: task_line.done,
                flagged: task_line.flagged,
            }
        })
        .collect();
    (tasks, warnings)
}

/// Rewrite a weekly plan with `tasks`, keeping non-task lines.
///
/// The list is emitted where the first task line used to be. A plan with no
/// task lines gets its list right under the title, or at the end when there
/// is no title.
pub fn render_weekly(tasks: &[Task], original: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut placed = false;
    // True after an emptied list, until the blank run it leaves is collapsed.
    let mut collapsing = false;

    for line in original.lines() {
        if parse_task_line(line).is_some() {
            if !placed {
                out.extend(tasks.iter().map(render_task_line));
                placed = true;
                collapsing = tasks.is_empty();
            }
            continue;
        }
        if collapsing && line.trim().is_empty() && out.last().is_some_and(|l| l.trim().is_empty())
        {
            continue;
        }
        collapsing = false;
        out.push(line.to_owned());
    }

    if !placed && !tasks.is_empty() {
        out = insert_list(out, tasks);
    }

    finish(out)
}

fn insert_list(mut lines: Vec<String>, tasks: &[Task]) -> Vec<String> {
    let Some(title) = lines.iter().position(|l| l.starts_with("# ")) else {
        while lines.last().is_some_and(|l| l.trim().is_empty()) {
            lines.pop();
        }
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.extend(tasks.iter().map(render_task_line));
        return lines;
    };

    let rest: Vec<String> = lines
        .split_off(title + 1)
        .into_iter()
        .skip_while(|l| l.trim().is_empty())
        .collect();
    lines.push(String::new());
    lines.extend(tasks.iter().map(render_task_line));
    if !rest.is_empty() {
        lines.push(String::new());
        lines.extend(rest);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_collects_all_checkboxes() {
        let (tasks, warnings) =
            parse_weekly("# 2026-W42 本周计划\n\n- [ ] [#a] gym x3\nprose\n- [x] [#b] taxes\n");
        assert!(warnings.is_empty());
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].text, "gym x3");
        assert!(tasks[1].done);
    }

    #[test]
    fn render_appends_to_fresh_plan() {
        let out = render_weekly(&[Task::new("a", "gym")], &weekly_skeleton("2026-W42"));
        assert_eq!(out, "# 2026-W42 本周计划\n\n- [ ] [#a] gym\n");
    }

    #[test]
    fn render_replaces_list_in_place() {
        let original = "# W\n\n- [ ] [#a] one\n- [ ] [#b] two\n\nRetro notes\n";
        let mut two = Task::new("b", "two");
        two.done = true;
        let out = render_weekly(&[two], original);
        assert_eq!(out, "# W\n\n- [x] [#b] two\n\nRetro notes\n");
    }

    #[test]
    fn render_with_no_tasks_left() {
        let out = render_weekly(&[], "# W\n\n- [ ] [#a] one\n");
        assert_eq!(out, "# W\n");
    }

    #[test]
    fn emptied_list_leaves_a_single_blank() {
        let out = render_weekly(&[], "# W\n\n- [ ] [#a] one\n\nRetro notes\n");
        assert_eq!(out, "# W\n\nRetro notes\n");
    }

    #[test]
    fn refilled_list_returns_under_the_title() {
        let emptied = render_weekly(&[], "# W\n\n- [ ] [#a] one\n\nRetro notes\n");
        let out = render_weekly(&[Task::new("b", "two")], &emptied);
        assert_eq!(out, "# W\n\n- [ ] [#b] two\n\nRetro notes\n");
    }

    #[test]
    fn untitled_plan_appends_list() {
        let out = render_weekly(&[Task::new("a", "gym")], "notes\n\n");
        assert_eq!(out, "notes\n\n- [ ] [#a] gym\n");
    }

    #[test]
    fn missing_ids_are_derived() {
        let (tasks, warnings) = parse_weekly("- [ ] stretch\n");
        assert_eq!(warnings.len(), 1);
        assert!(tasks[0].id.starts_with('h'));
    }
}

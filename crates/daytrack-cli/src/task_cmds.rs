//! CLI handlers for the task subcommands.
//!
//! Implements:
//! - `daytrack list`                      -- print today's board
//! - `daytrack add|move|edit|flag|done|delete` -- mutate today's board
//! - `daytrack weekly <subcommand>`       -- this week's plan
//! - `daytrack history [date]`            -- list past days or print one

use std::fmt::Write as _;

use anyhow::Result;

use daytrack_core::{TaskService, TaskUpdate};
use daytrack_store::{Board, Section, Task};

use crate::{Commands, WeeklyCommands};

// -----------------------------------------------------------------------
// Public entry point
// -----------------------------------------------------------------------

/// Dispatch a board, weekly or history command to its handler.
pub async fn run_task_command(command: Commands, service: &TaskService) -> Result<()> {
    match command {
        Commands::List => {
            let board = service.list().await?;
            print!("{}", format_board(service.clock().today().to_string(), &board));
        }
        Commands::Add { text, section } => {
            let task = service.add(&text, section).await?;
            println!("Added {} to {section}.", task.id);
        }
        Commands::Move {
            task_id,
            section,
            index,
        } => {
            let update = TaskUpdate {
                status: Some(section),
                new_index: index,
                ..TaskUpdate::default()
            };
            service.update(&task_id, update).await?;
            println!("Moved {task_id} to {section}.");
        }
        Commands::Edit { task_id, text } => {
            let update = TaskUpdate {
                text: Some(text),
                ..TaskUpdate::default()
            };
            let task = service.update(&task_id, update).await?;
            println!("{}", format_task(&task));
        }
        Commands::Flag { task_id, clear } => {
            let update = TaskUpdate {
                flagged: Some(!clear),
                ..TaskUpdate::default()
            };
            let task = service.update(&task_id, update).await?;
            println!("{}", format_task(&task));
        }
        Commands::Done { task_id, undo } => {
            let update = TaskUpdate {
                done: Some(!undo),
                ..TaskUpdate::default()
            };
            let task = service.update(&task_id, update).await?;
            println!("{}", format_task(&task));
        }
        Commands::Delete { task_id } => {
            let task = service.delete(&task_id).await?;
            println!("Deleted {}: {}", task.id, task.text);
        }
        Commands::Weekly { command } => run_weekly(command, service).await?,
        Commands::History { date } => match date {
            Some(date) => {
                let day = service.history_day(&date).await?;
                print!("{}", format_board(day.date, &day.tasks));
            }
            None => {
                let dates = service.history_dates().await?;
                if dates.is_empty() {
                    println!("No earlier days found.");
                }
                for date in dates {
                    println!("{date}");
                }
            }
        },
        Commands::Init { .. } | Commands::Serve { .. } | Commands::Completions { .. } => {
            anyhow::bail!("command is not a task command")
        }
    }
    Ok(())
}

// -----------------------------------------------------------------------
// daytrack weekly
// -----------------------------------------------------------------------

async fn run_weekly(command: WeeklyCommands, service: &TaskService) -> Result<()> {
    match command {
        WeeklyCommands::List => {
            let plan = service.weekly().await?;
            println!("Week {}", plan.week);
            if plan.tasks.is_empty() {
                println!("  (empty)");
            }
            for task in &plan.tasks {
                println!("  {}", format_task(task));
            }
        }
        WeeklyCommands::Add { text } => {
            let task = service.add_weekly(&text).await?;
            println!("Added {} to this week's plan.", task.id);
        }
        WeeklyCommands::Toggle { task_id } => {
            let task = service.toggle_weekly(&task_id).await?;
            println!("{}", format_task(&task));
        }
        WeeklyCommands::Delete { task_id } => {
            let task = service.delete_weekly(&task_id).await?;
            println!("Deleted {}: {}", task.id, task.text);
        }
    }
    Ok(())
}

// -----------------------------------------------------------------------
// Formatting
// -----------------------------------------------------------------------

fn format_task(task: &Task) -> String {
    let check = if task.done { "x" } else { " " };
    let flag = if task.flagged { " !" } else { "" };
    format!("[{check}] {:<14}{flag} {}", task.id, task.text)
}

/// Render a board as a plain-text listing, one block per section.
fn format_board(title: String, board: &Board) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{title}");
    for section in Section::ALL {
        let tasks = board.section(section);
        let _ = writeln!(out);
        let _ = writeln!(out, "{} ({})", section, tasks.len());
        for task in tasks {
            let _ = writeln!(out, "  {}", format_task(task));
        }
    }
    out
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

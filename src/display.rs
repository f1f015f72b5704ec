//! Task display formatting
//!
//! Colored task lines, detail views and the pet status card.

use chrono::NaiveDate;
use colored::*;

use duepet_core::date::format_date_human;
use duepet_core::pet::MAX_STAT;
use duepet_core::{Mood, PetState, Priority, Task};

/// Characters in the id shown in list views
pub const SHORT_ID_LEN: usize = 8;

/// Display mode for task lists
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DisplayMode {
    /// One line per task
    Compact,
    /// Every field
    Detailed,
    /// One line with status and reminder (default)
    Default,
}

/// Check if terminal supports colors
pub fn supports_color() -> bool {
    atty::is(atty::Stream::Stdout)
}

pub fn short_id(id: &str) -> &str {
    id.get(..SHORT_ID_LEN).unwrap_or(id)
}

fn paint(text: String, use_color: bool, style: impl FnOnce(String) -> ColoredString) -> String {
    if use_color {
        style(text).to_string()
    } else {
        text
    }
}

fn due_label(task: &Task, today: NaiveDate, use_color: bool) -> String {
    let label = format!("({})", format_date_human(task.due_date, today));
    let days = task.due_date.signed_duration_since(today).num_days();

    paint(label, use_color, |s| {
        if task.completed {
            s.green()
        } else if days < 0 {
            s.red().bold()
        } else if days <= 1 {
            s.yellow()
        } else {
            s.normal()
        }
    })
}

fn priority_marker(priority: Priority, use_color: bool) -> String {
    match priority {
        Priority::High => paint("!!".to_string(), use_color, |s| s.red()),
        Priority::Medium => paint("!".to_string(), use_color, |s| s.yellow()),
        Priority::Low => String::new(),
    }
}

fn time_span(task: &Task) -> Option<String> {
    match (&task.start_time, &task.end_time) {
        (Some(start), Some(end)) => Some(format!("{start}-{end}")),
        (Some(start), None) => Some(start.clone()),
        (None, Some(end)) => Some(format!("until {end}")),
        (None, None) => None,
    }
}

/// Format a task for display
pub fn format_task(task: &Task, mode: DisplayMode, today: NaiveDate, use_color: bool) -> String {
    let checkbox = if task.completed { "[✓]" } else { "[ ]" };
    let title = if task.completed {
        paint(task.title.clone(), use_color, |s| s.green())
    } else {
        task.title.clone()
    };
    let category = paint(format!("@{}", task.category), use_color, |s| s.magenta());

    match mode {
        DisplayMode::Compact => {
            format!("{} {} {}", checkbox, short_id(&task.id), title)
        }
        DisplayMode::Detailed => {
            let mut parts = vec![
                format!("{} [ID: {}]", checkbox, task.id),
                format!("Title: {}", title),
            ];

            if !task.description.is_empty() {
                parts.push(format!("Description: {}", task.description));
            }
            parts.push(format!("Category: {}", task.category));
            parts.push(format!("Priority: {}", task.priority));
            parts.push(format!(
                "Due: {} {}",
                task.due_date,
                due_label(task, today, use_color)
            ));
            if let Some(span) = time_span(task) {
                parts.push(format!("Time: {}", span));
            }
            if let Some(repeat) = task.repeat {
                parts.push(format!("Repeats: {}", repeat));
            }
            match task.reminder_time {
                Some(minutes) => parts.push(format!("Reminder: {} min before", minutes)),
                None => parts.push("Reminder: (none)".to_string()),
            }
            parts.push(format!(
                "Status: {}",
                if task.completed { "Complete" } else { "Incomplete" }
            ));
            parts.push(format!("Created: {}", task.created_at.format("%Y-%m-%d %H:%M")));
            parts.join("\n  ")
        }
        DisplayMode::Default => {
            let id_str = paint(format!("[{}]", short_id(&task.id)), use_color, |s| s.cyan());
            let mut line = format!("{} {} {} {}", checkbox, id_str, title, category);

            let marker = priority_marker(task.priority, use_color);
            if !marker.is_empty() {
                line.push(' ');
                line.push_str(&marker);
            }
            line.push(' ');
            line.push_str(&due_label(task, today, use_color));
            if let Some(span) = time_span(task) {
                line.push_str(&format!(" {span}"));
            }
            if let Some(minutes) = task.reminder_time {
                line.push_str(&format!(" ⏰{minutes}m"));
            }
            line
        }
    }
}

/// Format a summary line for task list
pub fn format_summary(total: usize, completed: usize, overdue: usize, use_color: bool) -> String {
    let mut parts = vec![
        format!("{} total", total),
        paint(format!("{} done", completed), use_color, |s| s.green()),
    ];
    if overdue > 0 {
        parts.push(paint(format!("{} overdue", overdue), use_color, |s| s.red()));
    }

    format!("[{}]", parts.join(" | "))
}

fn bar(value: u8) -> String {
    let filled = usize::from(value.min(MAX_STAT) / 10);
    format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled))
}

/// Pet status card
pub fn format_pet(pet: &PetState, use_color: bool) -> String {
    let (face, mood) = match pet.mood {
        Mood::Happy => ("(^ᴗ^)", "happy"),
        Mood::Normal => ("(•ᴗ•)", "normal"),
        Mood::Grumpy => ("(ಠ_ಠ)", "grumpy"),
        Mood::Angry => ("(╬ಠ益ಠ)", "angry"),
    };

    let hp_bar = paint(bar(pet.hp), use_color, |s| match pet.mood {
        Mood::Happy => s.green(),
        Mood::Normal => s.normal(),
        Mood::Grumpy | Mood::Angry => s.red(),
    });

    [
        format!("{face}  feeling {mood}"),
        format!("HP   {} {:>3}", hp_bar, pet.hp),
        format!("Food {} {:>3}", bar(pet.food), pet.food),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use duepet_core::NewTask;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, 16).unwrap()
    }

    fn task(title: &str, due: &str) -> Task {
        NewTask::new(title, due)
            .into_task(
                "0123456789abcdef".to_string(),
                today().and_hms_opt(8, 0, 0).unwrap(),
            )
            .unwrap()
    }

    #[test]
    fn test_format_task_compact() {
        let output = format_task(&task("Test task", "2025-04-16"), DisplayMode::Compact, today(), false);
        assert_eq!(output, "[ ] 01234567 Test task");
    }

    #[test]
    fn test_format_task_default() {
        let mut task = task("Standup", "2025-04-17");
        task.start_time = Some("09:00".to_string());
        task.reminder_time = Some(15);

        let output = format_task(&task, DisplayMode::Default, today(), false);
        assert!(output.starts_with("[ ] [01234567] Standup @other !"));
        assert!(output.contains("(Tomorrow)"));
        assert!(output.contains("09:00"));
        assert!(output.contains("⏰15m"));
    }

    #[test]
    fn test_format_task_completed() {
        let mut task = task("Done task", "2025-04-10");
        task.completed = true;

        let output = format_task(&task, DisplayMode::Default, today(), false);
        assert!(output.contains("[✓]"));
    }

    #[test]
    fn test_format_task_detailed() {
        let output = format_task(&task("Report", "2025-04-14"), DisplayMode::Detailed, today(), false);
        assert!(output.contains("Due: 2025-04-14 (Overdue (2 days ago))"));
        assert!(output.contains("Reminder: (none)"));
        assert!(output.contains("Priority: medium"));
    }

    #[test]
    fn test_format_summary() {
        let summary = format_summary(10, 5, 2, false);
        assert_eq!(summary, "[10 total | 5 done | 2 overdue]");
        assert_eq!(format_summary(3, 0, 0, false), "[3 total | 0 done]");
    }

    #[test]
    fn test_format_pet() {
        let mut pet = PetState::default();
        pet.set_hp(40);
        let card = format_pet(&pet, false);
        assert!(card.contains("grumpy"));
        assert!(card.contains("████░░░░░░  40"));

        pet.reopen(&duepet_core::PetRules::default());
        let card = format_pet(&pet, false);
        assert!(card.contains("feeling angry"));
        assert!(card.contains("Food"));
    }
}

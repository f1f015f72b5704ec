use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use duepet::config::Config;
use duepet::error::{DuepetError, Result};
use duepet::notify;
use duepet::{
    JsonStorage, PetMorale, ReminderEvent, ReminderScheduler, SchedulerSettings, TaskStore,
};
use duepet_core::date::{DATE_FORMAT, parse_date};
use duepet_core::reminder::{parse_time_of_day, reminder_instant};
use duepet_core::{NewTask, RawAssignment, Repeat, Task, TaskPatch, TaskQuery};

use crate::cli::{Cli, Commands, ViewArgs};
use crate::display::{
    DisplayMode, format_pet, format_summary, format_task, short_id, supports_color,
};

mod cli;
mod display;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, matches!(cli.command, Commands::Watch));

    let cfg = Config::load()?;
    let today = Local::now().date_naive();
    let use_color = !cli.no_color && supports_color();

    let pet = Arc::new(PetMorale::load(
        JsonStorage::new(cfg.pet_path()).without_backup(),
        cfg.pet.rules(),
    ));
    let store = Arc::new(
        TaskStore::open(JsonStorage::new(cfg.tasks_path()))?
            .with_observer(pet.clone())
            .with_week_start(cfg.week_start()?),
    );

    let newly_overdue = store.sweep_overdue(Local::now().naive_local());
    if newly_overdue > 0 && !matches!(cli.command, Commands::Sweep) {
        eprintln!(
            "{} task(s) went overdue, pet hp is now {}",
            newly_overdue,
            pet.snapshot().hp
        );
    }

    match cli.command {
        Commands::Add {
            title,
            due,
            desc,
            category,
            priority,
            start,
            end,
            repeat,
            remind,
        } => {
            let title_str = title.join(" ");
            let due = parse_date(&due, today)?;

            let mut fields = NewTask::new(&title_str, due.format(DATE_FORMAT).to_string())
                .with_start_time(checked_time(start)?)
                .with_end_time(checked_time(end)?)
                .with_repeat(repeat)
                .with_reminder(remind);
            if let Some(desc) = desc {
                fields = fields.with_description(desc);
            }
            if let Some(category) = category {
                fields = fields.with_category(category);
            }
            if let Some(priority) = priority {
                fields = fields.with_priority(priority);
            }

            let id = store.add(fields)?;
            println!("Task added: [{}] {} (due {})", short_id(&id), title_str, due);
        }

        Commands::List {
            category,
            priority,
            from,
            to,
            done,
            open,
            view,
        } => {
            let completed = match (done, open) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };

            let mut query = TaskQuery::new()
                .with_category(category)
                .with_priority(priority)
                .with_completed(completed);
            if let Some(from) = from {
                query = match parse_date(&from, today) {
                    Ok(date) => query.due_from(date),
                    Err(_) => query.due_from_text(&from),
                };
            }
            if let Some(to) = to {
                query = match parse_date(&to, today) {
                    Ok(date) => query.due_to(date),
                    Err(_) => query.due_to_text(&to),
                };
            }

            print_tasks(&store.query(&query), view, today, use_color);
        }

        Commands::Today { view } => print_tasks(&store.today_at(today), view, today, use_color),
        Commands::Week { view } => print_tasks(&store.this_week_at(today), view, today, use_color),
        Commands::Month { view } => {
            print_tasks(&store.this_month_at(today), view, today, use_color)
        }

        Commands::Show { id } => {
            let task = find(&store, &id)?;
            println!("{}", format_task(&task, DisplayMode::Detailed, today, use_color));
        }

        Commands::Edit {
            id,
            title,
            desc,
            category,
            priority,
            due,
            start,
            end,
            repeat,
        } => {
            let task = find(&store, &id)?;

            let mut patch = TaskPatch::new();
            if let Some(title) = title {
                patch = patch.title(title);
            }
            if let Some(desc) = desc {
                patch = patch.description(desc);
            }
            if let Some(category) = category {
                patch = patch.category(category);
            }
            if let Some(priority) = priority {
                patch = patch.priority(priority);
            }
            if let Some(due) = due {
                patch = patch.due_date(parse_date(&due, today)?);
            }
            if let Some(start) = start {
                patch = patch.start_time(clearable_time(&start)?);
            }
            if let Some(end) = end {
                patch = patch.end_time(clearable_time(&end)?);
            }
            if let Some(repeat) = repeat {
                let repeat = match repeat.trim().to_lowercase().as_str() {
                    "none" | "" => None,
                    other => Some(other.parse::<Repeat>()?),
                };
                patch = patch.repeat(repeat);
            }

            if patch.is_empty() {
                println!("Nothing to change.");
                return Ok(());
            }

            if store.update(&task.id, &patch) {
                let updated = find(&store, &task.id)?;
                println!("Updated task [{}]: {}", short_id(&updated.id), updated.title);
            }
        }

        Commands::Done { id } => {
            let task = find(&store, &id)?;
            if task.completed {
                println!("Task [{}] is already done.", short_id(&task.id));
                return Ok(());
            }
            store.mark_completed(&task.id, true);
            println!("Marked task [{}] as done: {}", short_id(&task.id), task.title);
            println!("Pet hp: {}", pet.snapshot().hp);
        }

        Commands::Undo { id } => {
            let task = find(&store, &id)?;
            store.mark_completed(&task.id, false);
            println!("Marked task [{}] as open: {}", short_id(&task.id), task.title);
        }

        Commands::Remove { id, force } => {
            let task = find(&store, &id)?;
            if !force && !confirm(&format!("Remove '{}'?", task.title))? {
                println!("Cancelled.");
                return Ok(());
            }
            store.delete(&task.id);
            println!("Removed: {}", task.title);
        }

        Commands::Remind { id, minutes } => {
            let task = find(&store, &id)?;
            store.set_reminder(&task.id, minutes);
            println!("Reminder set {} min before '{}'", minutes, task.title);
        }

        Commands::Unremind { id } => {
            let task = find(&store, &id)?;
            if store.clear_reminder(&task.id) {
                println!("Reminder cleared for '{}'", task.title);
            } else {
                println!("'{}' has no reminder.", task.title);
            }
        }

        Commands::Upcoming { window } => {
            let window = window.unwrap_or(cfg.reminder.lookahead_minutes);
            let tasks = store.upcoming_reminders(window);

            if tasks.is_empty() {
                println!("No reminders in the next {} minutes.", window);
            }
            for task in &tasks {
                let at = reminder_instant(task)
                    .ok()
                    .flatten()
                    .map(|instant| instant.format("%H:%M").to_string())
                    .unwrap_or_default();
                println!(
                    "{} {}",
                    at,
                    format_task(task, DisplayMode::Default, today, use_color)
                );
            }
        }

        Commands::Import { file } => {
            let records = read_assignments(&file)?;
            let report = store.import_batch(&records);
            println!(
                "Imported {} task(s), skipped {} past due, {} failed.",
                report.added.len(),
                report.skipped_past,
                report.failed
            );
        }

        Commands::Sweep => {
            if newly_overdue == 0 {
                println!("No tasks went overdue.");
            } else {
                println!(
                    "{} task(s) went overdue, pet hp is now {}.",
                    newly_overdue,
                    pet.snapshot().hp
                );
            }
        }

        Commands::Pet => println!("{}", format_pet(&pet.snapshot(), use_color)),

        Commands::Watch => watch(&cfg, store, pet, use_color).await?,

        Commands::Recover { force } => {
            if !store.storage().backup_exists() {
                return Err(DuepetError::storage("No backup file found"));
            }

            if !force && !confirm("Restore tasks from backup? Current tasks will be replaced.")? {
                println!("Cancelled.");
                return Ok(());
            }

            let tasks: Vec<Task> = store.storage().recover()?;
            let count = tasks.len();
            store.replace_all(tasks);
            println!("Recovered {} tasks from backup.", count);
        }
    }

    Ok(())
}

/// Install the global subscriber. `RUST_LOG` overrides the defaults.
fn init_logging(verbose: bool, watching: bool) {
    let level = match (verbose, watching) {
        (true, _) => "debug",
        (false, true) => "info",
        (false, false) => "warn",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("duepet={level},duepet_core={level}"))
        }))
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn find(store: &TaskStore, id: &str) -> Result<Task> {
    store
        .resolve_id(id)
        .and_then(|full| store.get(&full))
        .ok_or_else(|| DuepetError::TaskNotFound(id.to_string()))
}

fn checked_time(input: Option<String>) -> Result<Option<String>> {
    match input {
        Some(raw) => Ok(Some(parse_time_of_day(&raw)?.format("%H:%M").to_string())),
        None => Ok(None),
    }
}

/// "none" clears the time
fn clearable_time(input: &str) -> Result<Option<String>> {
    if input.trim().eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    checked_time(Some(input.to_string()))
}

fn read_assignments(path: &Path) -> Result<Vec<RawAssignment>> {
    let raw = fs::read_to_string(path)
        .map_err(|e| DuepetError::io(format!("reading {}", path.display()), e))?;
    serde_json::from_str(&raw).map_err(|e| {
        DuepetError::parse_with_source(format!("{} is not a list of assignments", path.display()), e)
    })
}

fn print_tasks(tasks: &[Task], view: ViewArgs, today: NaiveDate, use_color: bool) {
    if tasks.is_empty() {
        println!("No tasks found.");
        return;
    }

    let mode = if view.compact {
        DisplayMode::Compact
    } else if view.detailed {
        DisplayMode::Detailed
    } else {
        DisplayMode::Default
    };

    for task in tasks {
        println!("{}", format_task(task, mode, today, use_color));
    }

    println!();
    println!(
        "{}",
        format_summary(
            tasks.len(),
            tasks.iter().filter(|t| t.completed).count(),
            tasks.iter().filter(|t| t.is_overdue_on(today)).count(),
            use_color,
        )
    );
}

/// Run the reminder loop in the foreground until Ctrl+C
async fn watch(
    cfg: &Config,
    store: Arc<TaskStore>,
    pet: Arc<PetMorale>,
    use_color: bool,
) -> Result<()> {
    let settings = SchedulerSettings::from_config(&cfg.reminder)?;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut scheduler = ReminderScheduler::new(store, settings, tx);
    if !scheduler.start() {
        return Err(DuepetError::config("could not start the reminder scheduler"));
    }

    let mut decay = tokio::time::interval(cfg.pet.decay_interval());
    // The first tick completes immediately
    decay.tick().await;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    println!("Watching reminders, press Ctrl+C to stop.");
    loop {
        tokio::select! {
            Some(event) = rx.recv() => {
                match &event {
                    ReminderEvent::Due(task) => println!(
                        "⏰ {}",
                        format_task(task, DisplayMode::Default, Local::now().date_naive(), use_color)
                    ),
                    ReminderEvent::DailyDigest { date, due_today, newly_overdue } => println!(
                        "{}: {} task(s) due today, {} newly overdue",
                        date, due_today, newly_overdue
                    ),
                }
                if cfg.reminder.notify_desktop {
                    notify::show(&event);
                }
            }
            _ = decay.tick() => {
                match pet.decay() {
                    Some(hp) => info!("pet hp decayed to {}", hp),
                    None => debug!("pet at floor, no decay"),
                }
            }
            _ = &mut ctrl_c => break,
        }
    }

    scheduler.stop();
    println!("Stopped.");
    Ok(())
}

/// Ask user for confirmation
fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(input.trim().to_lowercase() == "y")
}

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use duepet_core::{Category, Priority, Repeat};

#[derive(Parser)]
#[command(name = "duepet")]
#[command(about = concat!(
    "  /\\_/\\   duepet\n",
    " ( o.o )  tasks, reminders and a pet\n",
    "  > ^ <   that sulks when you miss a deadline"
))]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_version = concat!(
    "v",
    env!("CARGO_PKG_VERSION"),
    "\nCodeName: ",
    env!("CODENAME")
))]
pub struct Cli {
    /// Log debug output to stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Disable colors
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output layout for task lists
#[derive(Args, Clone, Copy, Debug, Default)]
pub struct ViewArgs {
    /// Use compact one-line format
    #[arg(long, short = 'c', conflicts_with = "detailed")]
    pub compact: bool,
    /// Use detailed format with full info
    #[arg(long)]
    pub detailed: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Adds a task
    Add {
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,
        /// Due date: 2025-04-16, today, tomorrow, friday, "in 3 days", "Jan 25"
        #[arg(long, short = 'd', value_name = "DATE", default_value = "today")]
        due: String,
        #[arg(long, value_name = "TEXT")]
        desc: Option<String>,
        /// work, study, life or other
        #[arg(long, short = 'C')]
        category: Option<Category>,
        /// high, medium or low
        #[arg(long, short = 'p')]
        priority: Option<Priority>,
        /// Start time, HH:MM
        #[arg(long, value_name = "HH:MM")]
        start: Option<String>,
        /// End time, HH:MM
        #[arg(long, value_name = "HH:MM")]
        end: Option<String>,
        /// none, daily, weekly or monthly
        #[arg(long)]
        repeat: Option<Repeat>,
        /// Remind this many minutes before the start
        #[arg(long, value_name = "MINUTES")]
        remind: Option<u32>,
    },

    /// Lists tasks with filters
    List {
        #[arg(long, short = 'C')]
        category: Option<Category>,
        #[arg(long, short = 'p')]
        priority: Option<Priority>,
        /// Only tasks due on or after this date
        #[arg(long, value_name = "DATE")]
        from: Option<String>,
        /// Only tasks due on or before this date
        #[arg(long, value_name = "DATE")]
        to: Option<String>,
        /// Show only completed tasks
        #[arg(long, conflicts_with = "open")]
        done: bool,
        /// Show only incomplete tasks
        #[arg(long)]
        open: bool,
        #[command(flatten)]
        view: ViewArgs,
    },

    /// Tasks due today
    Today {
        #[command(flatten)]
        view: ViewArgs,
    },

    /// Tasks due this week
    Week {
        #[command(flatten)]
        view: ViewArgs,
    },

    /// Tasks due this month
    Month {
        #[command(flatten)]
        view: ViewArgs,
    },

    /// Shows every field of a task
    Show {
        /// Task id or unique id prefix
        id: String,
    },

    /// Edits a task
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, value_name = "TEXT")]
        desc: Option<String>,
        #[arg(long, short = 'C')]
        category: Option<Category>,
        #[arg(long, short = 'p')]
        priority: Option<Priority>,
        #[arg(long, short = 'd', value_name = "DATE")]
        due: Option<String>,
        /// Start time, HH:MM (use 'none' to clear)
        #[arg(long, value_name = "HH:MM")]
        start: Option<String>,
        /// End time, HH:MM (use 'none' to clear)
        #[arg(long, value_name = "HH:MM")]
        end: Option<String>,
        /// Repeat rule (use 'none' to clear)
        #[arg(long)]
        repeat: Option<String>,
    },

    /// Marks a task as done
    Done { id: String },

    /// Marks a task as not done
    Undo { id: String },

    /// Removes a task
    Remove {
        id: String,
        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Sets a reminder some minutes before a task starts
    Remind { id: String, minutes: u32 },

    /// Clears a task's reminder
    Unremind { id: String },

    /// Lists reminders coming up soon
    Upcoming {
        /// Lookahead in minutes (defaults to the configured value)
        #[arg(long, short = 'w', value_name = "MINUTES")]
        window: Option<u32>,
    },

    /// Imports assignments from a JSON file
    Import {
        /// JSON array of {title, due_date, link, course_name}
        file: PathBuf,
    },

    /// Penalizes overdue tasks now
    Sweep,

    /// Shows how the pet is doing
    Pet,

    /// Runs reminders in the foreground with desktop notifications
    Watch,

    /// Recover tasks from backup file
    Recover {
        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
    },
}

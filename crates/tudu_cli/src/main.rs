//! Command-line front end for `tudu_core`.
//!
//! # Responsibility
//! - Sign a user in through the local auth gate and run one action.
//! - Print the resulting snapshot the way the list view renders it.

use clap::{Parser, Subcommand};
use log::info;
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use tudu_core::{
    format_due_date, init_logging, parse_due_date, CoreConfig, DocumentStore, LocalAuthGate,
    MemoryDocumentStore, NewTask, Priority, Snapshot, SqliteDocumentStore, TaskFields,
    TodoSession, User,
};

/// Personal to-do lists backed by a local document store.
#[derive(Parser, Debug)]
#[command(name = "tudu", author, version, about, long_about = None)]
struct Cli {
    /// User id that owns the lists
    #[arg(short = 'u', long, env = "TUDU_USER", default_value = "local")]
    user: String,

    /// Email recorded as the list creator
    #[arg(long, env = "TUDU_EMAIL", default_value = "local@localhost")]
    email: String,

    /// SQLite document store file (in-memory when omitted)
    #[arg(long, env = "TUDU_DB_PATH", value_name = "FILE")]
    db: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, env = "TUDU_LOG_LEVEL")]
    log_level: Option<String>,

    /// Absolute directory for log files (logging disabled when omitted)
    #[arg(long, env = "TUDU_LOG_DIR", value_name = "DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show every list with its tasks
    Lists,
    /// Create a list
    AddList { name: String },
    /// Delete a list and all of its tasks
    RmList { list_id: String },
    /// Add a task to a list
    AddTask {
        list_id: String,
        title: String,
        #[arg(short, long, default_value = "")]
        description: String,
        /// Due date as YYYY-MM-DD
        #[arg(long, default_value = "")]
        due: String,
        #[arg(short, long)]
        priority: Option<Priority>,
    },
    /// Replace every editable field of a task
    EditTask {
        list_id: String,
        task_id: String,
        title: String,
        #[arg(short, long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        due: String,
        #[arg(short, long, default_value = "low")]
        priority: Priority,
    },
    /// Delete one task
    RmTask { list_id: String, task_id: String },
    /// Finish list deletions that were left incomplete
    Reconcile,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::Lists => "lists",
            Self::AddList { .. } => "add-list",
            Self::RmList { .. } => "rm-list",
            Self::AddTask { .. } => "add-task",
            Self::EditTask { .. } => "edit-task",
            Self::RmTask { .. } => "rm-task",
            Self::Reconcile => "reconcile",
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, &log_dir.to_string_lossy())?;
    }

    let store: Arc<dyn DocumentStore> = match &config.db_path {
        Some(path) => Arc::new(SqliteDocumentStore::open(path)?),
        None => Arc::new(MemoryDocumentStore::new()),
    };

    let gate = LocalAuthGate::new();
    let mut session = TodoSession::new(Arc::new(gate.clone()), store);
    gate.sign_in(User::new(cli.user.clone(), cli.email.clone()));
    session.sync_session().await;
    info!(
        "event=cli_run module=cli status=start command={} store={}",
        cli.command.name(),
        if config.db_path.is_some() { "sqlite" } else { "memory" }
    );

    run(&mut session, cli.command).await?;
    print_snapshot(session.snapshot());
    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<CoreConfig, Box<dyn Error>> {
    let mut config = CoreConfig::from_env()?;
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if cli.log_dir.is_some() {
        config.log_dir = cli.log_dir.clone();
    }
    if cli.db.is_some() {
        config.db_path = cli.db.clone();
    }
    Ok(config)
}

async fn run(session: &mut TodoSession, command: Command) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Lists => {}
        Command::AddList { name } => {
            let list_id = session.create_list(&name).await?;
            println!("created list {list_id}");
        }
        Command::RmList { list_id } => {
            session.delete_list(&list_id).await?;
            println!("deleted list {list_id}");
        }
        Command::AddTask {
            list_id,
            title,
            description,
            due,
            priority,
        } => {
            let input = NewTask {
                title,
                description,
                due_date: parse_due_date(&due)?,
                priority,
            };
            let task_id = session.create_task(&list_id, input).await?;
            println!("created task {task_id}");
        }
        Command::EditTask {
            list_id,
            task_id,
            title,
            description,
            due,
            priority,
        } => {
            session.begin_edit(&list_id, &task_id)?;
            if let Some(draft) = session.edit_draft_mut() {
                *draft = TaskFields {
                    title,
                    description,
                    due_date: parse_due_date(&due)?,
                    priority,
                };
            }
            session.save_edit().await?;
            println!("updated task {task_id}");
        }
        Command::RmTask { list_id, task_id } => {
            session.delete_task(&list_id, &task_id).await?;
            println!("deleted task {task_id}");
        }
        Command::Reconcile => {
            let report = session.reconcile().await?;
            println!(
                "reconciled: {} list(s) finished, {} pending, {} task(s) removed",
                report.lists_finished, report.lists_pending, report.tasks_removed
            );
        }
    }
    Ok(())
}

fn print_snapshot(snapshot: &Snapshot) {
    if snapshot.is_empty() {
        println!("(no lists)");
        return;
    }
    for entry in snapshot.lists() {
        println!("{} [{}]", entry.list.name, entry.list.id);
        for task in &entry.tasks {
            println!("  - {} [{}]", task.title, task.id);
            if !task.description.is_empty() {
                println!("    {}", task.description);
            }
            println!(
                "    due: {}  priority: {}",
                format_due_date(task.due_date),
                task.priority
            );
        }
    }
}

pub mod cards;
pub mod progress;
pub mod sessions;
pub mod tasks;
pub mod timer;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;

use crate::{
    store::{summary_cache::SummaryCache, task_store::JsonTaskStore},
    utils::{
        clock::DefaultClock,
        dir::create_application_default_path,
        logging::{enable_logging, CLI_PREFIX},
    },
};

#[derive(Parser, Debug)]
#[command(name = "Pomolog", version, long_about = None)]
#[command(about = "Track study tasks and focused-work sessions from the terminal", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, help = "Enable logging")]
    log: bool,
    #[arg(
        long,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Manage study tasks", subcommand)]
    Task(tasks::TaskCommands),
    #[command(about = "Manage checklist cards on a task", subcommand)]
    Card(cards::CardCommands),
    #[command(about = "Record focus sessions by hand", subcommand)]
    Session(sessions::SessionCommands),
    #[command(about = "Show aggregated study progress")]
    Progress {
        #[command(flatten)]
        command: progress::ProgressCommand,
    },
    #[command(about = "Run a Pomodoro timer and record the finished session")]
    Timer {
        #[command(flatten)]
        command: timer::TimerCommand,
    },
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let state_dir = match args.dir {
        Some(dir) => dir,
        None => create_application_default_path()?,
    };

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(CLI_PREFIX, &state_dir, logging_level, args.log)?;

    let store = JsonTaskStore::new(&state_dir)?;
    let cache = SummaryCache::new(&state_dir);

    match args.commands {
        Commands::Task(command) => tasks::process_task_command(command, &store).await,
        Commands::Card(command) => cards::process_card_command(command, &store).await,
        Commands::Session(command) => {
            sessions::process_session_command(command, &store, &DefaultClock).await
        }
        Commands::Progress { command } => {
            progress::process_progress_command(command, &store, &cache, &DefaultClock).await
        }
        Commands::Timer { command } => {
            timer::process_timer_command(command, &store, &DefaultClock).await
        }
    }
}

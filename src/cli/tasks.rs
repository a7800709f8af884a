use anyhow::Result;
use clap::Subcommand;

use crate::{
    store::task_store::{JsonTaskStore, TaskStore},
    utils::time::format_minutes,
};

#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    #[command(about = "Register a new study task")]
    Add { name: String },
    #[command(about = "List tasks with their checklist and time totals")]
    List,
    #[command(about = "Mark a task as completed")]
    Done {
        id: u64,
        #[arg(long, help = "Mark the task as pending again")]
        undo: bool,
    },
    #[command(about = "Delete a task together with its cards and sessions")]
    Rm { id: u64 },
}

pub async fn process_task_command(command: TaskCommands, store: &JsonTaskStore) -> Result<()> {
    match command {
        TaskCommands::Add { name } => {
            let task = store.add_task(&name).await?;
            println!("{}\t{}", task.id, task.name);
        }
        TaskCommands::List => {
            let tasks = store.load().await?;
            if tasks.is_empty() {
                println!("No tasks yet. Create one with `pomolog task add <name>`");
                return Ok(());
            }
            for task in tasks {
                let marker = if task.completed { "x" } else { " " };
                println!(
                    "{}\t[{marker}]\t{}\t{}\tcards {}/{}",
                    task.id,
                    task.name,
                    format_minutes(task.total_minutes()),
                    task.cards_done(),
                    task.cards.len(),
                );
            }
        }
        TaskCommands::Done { id, undo } => {
            let task = store.set_completed(id, !undo).await?;
            if task.completed {
                println!("Completed {}\t{}", task.id, task.name);
            } else {
                println!("Reopened {}\t{}", task.id, task.name);
            }
        }
        TaskCommands::Rm { id } => {
            store.remove_task(id).await?;
            println!("Removed task {id}");
        }
    }
    Ok(())
}

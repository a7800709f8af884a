use anyhow::Result;
use clap::Subcommand;

use crate::store::{entities::TaskEntity, task_store::JsonTaskStore};

#[derive(Subcommand, Debug)]
pub enum CardCommands {
    #[command(about = "Add a checklist card to a task")]
    Add { task: u64, title: String },
    #[command(about = "Check off a card by its position in the list")]
    Done {
        task: u64,
        index: usize,
        #[arg(long, help = "Mark the card as pending again")]
        undo: bool,
    },
    #[command(about = "Delete a card by its position in the list")]
    Rm { task: u64, index: usize },
}

pub async fn process_card_command(command: CardCommands, store: &JsonTaskStore) -> Result<()> {
    let task = match command {
        CardCommands::Add { task, title } => store.add_card(task, &title).await?,
        CardCommands::Done { task, index, undo } => {
            store.set_card_done(task, index, !undo).await?
        }
        CardCommands::Rm { task, index } => store.remove_card(task, index).await?,
    };
    print_cards(&task);
    Ok(())
}

fn print_cards(task: &TaskEntity) {
    println!("{}\t{}", task.id, task.name);
    for (index, card) in task.cards.iter().enumerate() {
        let marker = if card.done { "x" } else { " " };
        println!("  {index}\t[{marker}]\t{}", card.title);
    }
}

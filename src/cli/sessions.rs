use std::fmt::Display;

use anyhow::Result;
use chrono::{Local, Utc};
use chrono_english::parse_date_string;
use clap::{CommandFactory, Subcommand, ValueEnum};

use crate::{store::task_store::JsonTaskStore, utils::clock::Clock};

use super::Args;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum SessionCommands {
    #[command(about = "Record a finished focus session on a task")]
    Add {
        task: u64,
        #[arg(help = "Session length in minutes")]
        minutes: i64,
        #[arg(
            long,
            help = "When the session happened. Examples are \"yesterday\", \"1 hour ago\", \"15/03/2025\". Defaults to now"
        )]
        date: Option<String>,
        #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
        date_style: DateStyle,
    },
}

pub async fn process_session_command(
    command: SessionCommands,
    store: &JsonTaskStore,
    clock: &impl Clock,
) -> Result<()> {
    match command {
        SessionCommands::Add {
            task,
            minutes,
            date,
            date_style,
        } => {
            let moment = match date.map(|s| parse_date_string(&s, Local::now(), date_style.into()))
            {
                Some(Ok(v)) => v.with_timezone(&Utc),
                Some(Err(e)) => {
                    return Err(Args::command()
                        .error(
                            clap::error::ErrorKind::ValueValidation,
                            format!("Failed to validate session date {e}"),
                        )
                        .into());
                }
                None => clock.time(),
            };
            store.append_session(task, minutes, moment).await?;
            println!("Recorded {minutes}m on task {task}");
        }
    }
    Ok(())
}

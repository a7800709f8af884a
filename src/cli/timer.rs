use std::{fmt::Display, time::Duration};

use anyhow::Result;
use clap::{CommandFactory, Parser, ValueEnum};
use tokio::select;
use tracing::debug;

use crate::{
    store::task_store::JsonTaskStore,
    utils::{clock::Clock, time::format_minutes},
};

use super::Args;

/// The classic Pomodoro cadence: 25 minute focus runs with 5 minute
/// breaks, and a 15 minute break after every fourth run.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum TimerMode {
    Work,
    ShortBreak,
    LongBreak,
}

impl TimerMode {
    fn default_minutes(&self) -> u32 {
        match self {
            TimerMode::Work => 25,
            TimerMode::ShortBreak => 5,
            TimerMode::LongBreak => 15,
        }
    }
}

impl Display for TimerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimerMode::Work => write!(f, "work"),
            TimerMode::ShortBreak => write!(f, "short-break"),
            TimerMode::LongBreak => write!(f, "long-break"),
        }
    }
}

#[derive(Debug, Parser)]
pub struct TimerCommand {
    #[arg(long, help = "Task to record the finished run on. Breaks don't need one")]
    task: Option<u64>,
    #[arg(long, default_value_t = TimerMode::Work, help = "Kind of run")]
    mode: TimerMode,
    #[arg(long, help = "Override the run length in minutes")]
    minutes: Option<u32>,
}

/// Command to process `timer`. Waits out the run and then records it as a
/// session on the chosen task. A run interrupted with Ctrl-C still records
/// the elapsed whole minutes, so partially finished focus time isn't lost.
pub async fn process_timer_command(
    TimerCommand {
        task,
        mode,
        minutes,
    }: TimerCommand,
    store: &JsonTaskStore,
    clock: &impl Clock,
) -> Result<()> {
    let minutes = match minutes {
        Some(0) => {
            return Err(Args::command()
                .error(
                    clap::error::ErrorKind::ValueValidation,
                    "Run length must be at least one minute",
                )
                .into());
        }
        Some(v) => v,
        None => mode.default_minutes(),
    };
    let started = clock.time();

    println!("{mode} run started, {}", format_minutes(minutes as i64));

    let completed = run_timer(clock, minutes).await;
    debug!("Timer finished, completed: {completed}");

    if mode != TimerMode::Work {
        println!("{mode} over");
        return Ok(());
    }

    let Some(task) = task else {
        println!("No task selected, nothing recorded");
        return Ok(());
    };

    let recorded = if completed {
        minutes as i64
    } else {
        (clock.time() - started).num_minutes().min(minutes as i64)
    };

    if recorded < 1 {
        println!("Less than a minute elapsed, nothing recorded");
        return Ok(());
    }

    store.append_session(task, recorded, clock.time()).await?;
    println!("Recorded {} on task {task}", format_minutes(recorded));
    Ok(())
}

/// Returns whether the run finished on its own rather than through Ctrl-C.
async fn run_timer(clock: &impl Clock, minutes: u32) -> bool {
    select! {
        _ = clock.sleep(Duration::from_secs(minutes as u64 * 60)) => true,
        _ = tokio::signal::ctrl_c() => false,
    }
}

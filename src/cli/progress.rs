use anyhow::{bail, Result};
use clap::Parser;
use tracing::warn;

use crate::{
    progress::aggregate::{compute_summary, ProgressSummary},
    store::{
        summary_cache::SummaryCache,
        task_store::{JsonTaskStore, TaskStore},
    },
    utils::{clock::Clock, time::format_minutes},
};

#[derive(Debug, Parser)]
pub struct ProgressCommand {
    #[arg(long, help = "Print the last persisted summary instead of recomputing")]
    cached: bool,
    #[arg(long, help = "Print the summary as JSON")]
    json: bool,
}

/// Command to process `progress`. Computes the summary from the current
/// task snapshot, refreshes the cache, and renders the result. With
/// `--cached` it serves whatever the previous run persisted.
pub async fn process_progress_command(
    ProgressCommand { cached, json }: ProgressCommand,
    store: &JsonTaskStore,
    cache: &SummaryCache,
    clock: &impl Clock,
) -> Result<()> {
    if cached {
        let Some(entry) = cache.load().await? else {
            bail!("no cached summary yet, run `pomolog progress` first");
        };
        if json {
            println!("{}", serde_json::to_string_pretty(&entry)?);
        } else {
            println!("Cached at {}", entry.updated_at.format("%Y-%m-%d %H:%M UTC"));
            println!();
            print_summary(&entry.summary);
        }
        return Ok(());
    }

    let tasks = store.load().await?;
    let now = clock.time();
    let summary = compute_summary(&tasks, now);

    // The cache is derived data, failing to refresh it shouldn't hide the
    // summary we just computed.
    if let Err(e) = cache.persist(&summary, now).await {
        warn!("Failed to persist progress summary: {e:?}");
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(summary: &ProgressSummary) {
    println!("Per task:");
    for entry in &summary.per_task {
        println!(
            "  {}\t{}\t{}",
            entry.task_id,
            entry.name,
            format_minutes(entry.total_minutes)
        );
    }

    if !summary.daily.is_empty() {
        println!();
        println!("Daily:");
        for point in &summary.daily {
            println!("  {}\t{}", point.date, format_minutes(point.minutes));
        }
    }

    if !summary.weekly.is_empty() {
        println!();
        println!("Weekly (week starting):");
        for point in &summary.weekly {
            println!("  {}\t{}", point.week_start, format_minutes(point.minutes));
        }
    }

    if !summary.monthly.is_empty() {
        println!();
        println!("Monthly:");
        for point in &summary.monthly {
            println!("  {}\t{}", point.month, format_minutes(point.minutes));
        }
    }

    println!();
    println!(
        "Today {}\tthis week {}\tthis month {}\tall time {}",
        format_minutes(summary.totals.today_minutes),
        format_minutes(summary.totals.this_week_minutes),
        format_minutes(summary.totals.this_month_minutes),
        format_minutes(summary.totals.all_time_minutes),
    );
}

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use fs4::tokio::AsyncFileExt;
use serde::Deserialize;
use serde::Serialize;
use tokio::{fs::File, io::{AsyncReadExt, AsyncWriteExt}};

use crate::progress::aggregate::ProgressSummary;

/// What `progress.json` holds: the last computed summary stamped with when
/// it was computed. Purely derived data, overwritten on every recompute;
/// the sessions themselves stay the source of truth.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CachedSummary {
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub summary: ProgressSummary,
}

pub struct SummaryCache {
    path: PathBuf,
}

impl SummaryCache {
    pub fn new(state_dir: &Path) -> Self {
        Self {
            path: state_dir.join("progress.json"),
        }
    }

    pub async fn persist(&self, summary: &ProgressSummary, computed_at: DateTime<Utc>) -> Result<()> {
        let entry = CachedSummary {
            updated_at: computed_at,
            summary: summary.clone(),
        };
        let mut buffer = serde_json::to_vec_pretty(&entry)?;
        buffer.push(b'\n');

        let mut file = File::options()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .await
            .context("opening summary cache")?;
        // Truncation waits until the exclusive lock is held, so a reader
        // holding the shared lock never observes a half-written file.
        file.lock_exclusive()?;
        let written = async {
            file.set_len(0).await?;
            file.write_all(&buffer).await?;
            file.flush().await
        }
        .await;
        file.unlock_async().await?;
        written.context("writing summary cache")?;
        Ok(())
    }

    pub async fn load(&self) -> Result<Option<CachedSummary>> {
        let mut file = match File::open(&self.path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).context("opening summary cache"),
        };
        file.lock_shared()?;
        let mut raw = String::new();
        let read = file.read_to_string(&mut raw).await;
        file.unlock_async().await?;
        read.context("reading summary cache")?;

        let entry = serde_json::from_str(&raw).context("summary cache is corrupted")?;
        Ok(Some(entry))
    }
}

use std::{
    future::Future,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use fs4::tokio::AsyncFileExt;
use serde::Deserialize;
use serde::Serialize;
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt},
};
use tracing::debug;

use super::entities::{CardEntity, SessionEntity, TaskEntity};

/// Interface for reading and replacing the task snapshot. Progress
/// computation only ever consumes this seam, so it works the same over any
/// backing store.
pub trait TaskStore {
    /// Loads a consistent snapshot of every task with its sessions.
    fn load(&self) -> impl Future<Output = Result<Vec<TaskEntity>>> + Send;

    /// Replaces the stored task list with the given snapshot.
    fn save(&self, tasks: Vec<TaskEntity>) -> impl Future<Output = Result<()>> + Send;
}

/// On-disk shape of `tasks.json`. Task ids come from a persisted counter so
/// deleting a task never recycles its id.
#[derive(Debug, Serialize, Deserialize)]
struct TasksFile {
    next_id: u64,
    tasks: Vec<TaskEntity>,
}

impl Default for TasksFile {
    fn default() -> Self {
        Self {
            next_id: 1,
            tasks: vec![],
        }
    }
}

/// The main realization of [TaskStore]: a single JSON file in the
/// application state directory, guarded by advisory file locks so that
/// concurrent invocations don't interleave their read-modify-write cycles.
pub struct JsonTaskStore {
    path: PathBuf,
}

impl JsonTaskStore {
    pub fn new(state_dir: &Path) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(state_dir)?;

        Ok(Self {
            path: state_dir.join("tasks.json"),
        })
    }

    pub async fn add_task(&self, name: &str) -> Result<TaskEntity> {
        let name = name.trim();
        if name.is_empty() {
            bail!("task name is required");
        }
        let name = name.to_string();
        self.update(move |data| {
            let task = TaskEntity::new(data.next_id, name);
            data.next_id += 1;
            data.tasks.push(task.clone());
            Ok(task)
        })
        .await
    }

    pub async fn remove_task(&self, id: u64) -> Result<()> {
        self.update(move |data| {
            let before = data.tasks.len();
            data.tasks.retain(|t| t.id != id);
            if data.tasks.len() == before {
                bail!("task {id} not found");
            }
            Ok(())
        })
        .await
    }

    pub async fn set_completed(&self, id: u64, completed: bool) -> Result<TaskEntity> {
        self.update(move |data| {
            let task = find_task(&mut data.tasks, id)?;
            task.completed = completed;
            Ok(task.clone())
        })
        .await
    }

    pub async fn add_card(&self, id: u64, title: &str) -> Result<TaskEntity> {
        let title = title.trim();
        if title.is_empty() {
            bail!("card title is required");
        }
        let title = title.to_string();
        self.update(move |data| {
            let task = find_task(&mut data.tasks, id)?;
            task.cards.push(CardEntity { title, done: false });
            Ok(task.clone())
        })
        .await
    }

    pub async fn set_card_done(&self, id: u64, index: usize, done: bool) -> Result<TaskEntity> {
        self.update(move |data| {
            let task = find_task(&mut data.tasks, id)?;
            let Some(card) = task.cards.get_mut(index) else {
                bail!("card {index} not found on task {id}");
            };
            card.done = done;
            Ok(task.clone())
        })
        .await
    }

    pub async fn remove_card(&self, id: u64, index: usize) -> Result<TaskEntity> {
        self.update(move |data| {
            let task = find_task(&mut data.tasks, id)?;
            if index >= task.cards.len() {
                bail!("card {index} not found on task {id}");
            }
            task.cards.remove(index);
            Ok(task.clone())
        })
        .await
    }

    /// Appends one finished focus session. The store insists on whole
    /// positive minutes here; leniency towards bad data only applies when
    /// reading what is already on disk.
    pub async fn append_session(&self, id: u64, minutes: i64, date: DateTime<Utc>) -> Result<()> {
        if minutes < 1 {
            bail!("session duration must be at least one minute");
        }
        self.update(move |data| {
            let task = find_task(&mut data.tasks, id)?;
            task.sessions.push(SessionEntity {
                date: Some(date),
                duration: minutes,
            });
            Ok(())
        })
        .await
    }

    async fn read_file(&self) -> Result<TasksFile> {
        debug!("Reading task store at {:?}", self.path);
        let mut file = match File::open(&self.path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(TasksFile::default()),
            Err(e) => return Err(e).context("opening task store"),
        };
        file.lock_shared()?;
        let mut raw = String::new();
        let read = file.read_to_string(&mut raw).await;
        file.unlock_async().await?;
        read.context("reading task store")?;
        parse_tasks_file(&raw)
    }

    async fn update<T>(&self, apply: impl FnOnce(&mut TasksFile) -> Result<T>) -> Result<T> {
        let mut file = File::options()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .await
            .context("opening task store")?;

        // Semi-safe acquire-release for a file
        file.lock_exclusive()?;
        let result = Self::update_with_file(&mut file, apply).await;
        file.unlock_async().await?;
        result
    }

    async fn update_with_file<T>(
        file: &mut File,
        apply: impl FnOnce(&mut TasksFile) -> Result<T>,
    ) -> Result<T> {
        let mut raw = String::new();
        file.read_to_string(&mut raw).await?;
        let mut data = parse_tasks_file(&raw)?;

        let value = apply(&mut data)?;

        let mut buffer = serde_json::to_vec_pretty(&data)?;
        buffer.push(b'\n');

        file.set_len(0).await?;
        file.rewind().await?;
        file.write_all(&buffer).await?;
        file.flush().await?;
        Ok(value)
    }
}

impl TaskStore for JsonTaskStore {
    fn load(&self) -> impl Future<Output = Result<Vec<TaskEntity>>> + Send {
        async move { Ok(self.read_file().await?.tasks) }
    }

    fn save(&self, tasks: Vec<TaskEntity>) -> impl Future<Output = Result<()>> + Send {
        self.update(move |data| {
            data.tasks = tasks;
            Ok(())
        })
    }
}

fn parse_tasks_file(raw: &str) -> Result<TasksFile> {
    if raw.trim().is_empty() {
        return Ok(TasksFile::default());
    }
    serde_json::from_str(raw).context("task store file is corrupted")
}

fn find_task(tasks: &mut [TaskEntity], id: u64) -> Result<&mut TaskEntity> {
    tasks
        .iter_mut()
        .find(|t| t.id == id)
        .ok_or_else(|| anyhow!("task {id} not found"))
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    use crate::store::task_store::{JsonTaskStore, TaskStore};

    fn test_date() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty_store() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonTaskStore::new(dir.path())?;

        assert!(store.load().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn created_tasks_survive_a_reload() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonTaskStore::new(dir.path())?;

        let a = store.add_task("Matemática").await?;
        let b = store.add_task("  História ").await?;

        let store = JsonTaskStore::new(dir.path())?;
        let tasks = store.load().await?;

        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0], a);
        assert_eq!(tasks[1].id, b.id);
        // Whitespace around the name gets dropped on the way in.
        assert_eq!(tasks[1].name, "História");
        Ok(())
    }

    #[tokio::test]
    async fn empty_task_name_is_rejected() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonTaskStore::new(dir.path())?;

        assert!(store.add_task("   ").await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn removing_a_task_does_not_recycle_its_id() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonTaskStore::new(dir.path())?;

        let first = store.add_task("a").await?;
        let second = store.add_task("b").await?;
        store.remove_task(second.id).await?;
        let third = store.add_task("c").await?;

        assert!(third.id > second.id);
        assert!(store.remove_task(second.id).await.is_err());

        let tasks = store.load().await?;
        assert_eq!(
            tasks.iter().map(|t| t.id).collect::<Vec<_>>(),
            vec![first.id, third.id]
        );
        Ok(())
    }

    #[tokio::test]
    async fn completion_toggles_and_unknown_ids_error() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonTaskStore::new(dir.path())?;

        let task = store.add_task("a").await?;
        let updated = store.set_completed(task.id, true).await?;
        assert!(updated.completed);

        let reverted = store.set_completed(task.id, false).await?;
        assert!(!reverted.completed);

        assert!(store.set_completed(999, true).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn card_operations_check_bounds() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonTaskStore::new(dir.path())?;

        let task = store.add_task("a").await?;
        let task = store.add_card(task.id, "read chapter 1").await?;
        assert_eq!(task.cards.len(), 1);

        let task = store.set_card_done(task.id, 0, true).await?;
        assert!(task.cards[0].done);

        assert!(store.set_card_done(task.id, 1, true).await.is_err());
        assert!(store.remove_card(task.id, 1).await.is_err());

        let task = store.remove_card(task.id, 0).await?;
        assert!(task.cards.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn sessions_append_with_their_date() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonTaskStore::new(dir.path())?;

        let task = store.add_task("a").await?;
        store.append_session(task.id, 25, test_date()).await?;
        store.append_session(task.id, 5, test_date()).await?;

        let tasks = store.load().await?;
        assert_eq!(tasks[0].sessions.len(), 2);
        assert_eq!(tasks[0].sessions[0].duration, 25);
        assert_eq!(tasks[0].sessions[0].date, Some(test_date()));
        assert_eq!(tasks[0].total_minutes(), 30);
        Ok(())
    }

    #[tokio::test]
    async fn non_positive_session_durations_are_rejected() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonTaskStore::new(dir.path())?;

        let task = store.add_task("a").await?;
        assert!(store.append_session(task.id, 0, test_date()).await.is_err());
        assert!(store.append_session(task.id, -5, test_date()).await.is_err());
        assert!(store.append_session(999, 10, test_date()).await.is_err());

        assert_eq!(store.load().await?[0].sessions.len(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn hand_written_store_with_bad_sessions_still_loads() -> Result<()> {
        let dir = tempdir()?;
        std::fs::write(
            dir.path().join("tasks.json"),
            r#"{
                "next_id": 2,
                "tasks": [{
                    "id": 1,
                    "name": "Algebra",
                    "sessions": [
                        {"duration": 30},
                        {"duration": "abc"},
                        {"duration": null},
                        {"date": "abc", "duration": 30},
                        {"date": "2024-03-04T10:00:00Z", "duration": 10}
                    ]
                }]
            }"#,
        )?;

        let store = JsonTaskStore::new(dir.path())?;
        let tasks = store.load().await?;

        assert_eq!(tasks[0].sessions.len(), 5);
        // The unreadable date falls back to None, its minutes still count.
        assert_eq!(tasks[0].sessions[3].date, None);
        assert_eq!(tasks[0].sessions[4].date, Some(test_date()));
        assert_eq!(tasks[0].total_minutes(), 70);
        Ok(())
    }

    #[tokio::test]
    async fn corrupted_store_file_surfaces_an_error() -> Result<()> {
        let dir = tempdir()?;
        std::fs::write(dir.path().join("tasks.json"), "not json at all")?;

        let store = JsonTaskStore::new(dir.path())?;
        assert!(store.load().await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn save_replaces_the_snapshot() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonTaskStore::new(dir.path())?;

        store.add_task("a").await?;
        let mut tasks = store.load().await?;
        tasks[0].name = "renamed".to_string();
        store.save(tasks).await?;

        assert_eq!(store.load().await?[0].name, "renamed");
        Ok(())
    }
}

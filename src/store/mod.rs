pub mod entities;
pub mod summary_cache;
pub mod task_store;

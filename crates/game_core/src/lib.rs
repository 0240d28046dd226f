use std::collections::BTreeSet;

use anyhow::Result;
use async_trait::async_trait;
use shared::domain::{LevelId, MenuEntry};
use tokio::sync::RwLock;

pub mod catalog;
pub mod controller;
pub mod error;
pub mod machine;

pub use catalog::LevelCatalog;
pub use controller::{SessionConfig, SessionController, SessionHandle, DEFAULT_CELEBRATION_DELAY};
pub use error::{CatalogError, SessionError};
pub use machine::{Advance, Discovery, SessionMachine, Ticket};

/// Durable "level completed" flags, keyed by level id.
#[async_trait]
pub trait CompletionStore: Send + Sync {
    async fn is_complete(&self, level_id: LevelId) -> Result<bool>;
    async fn mark_complete(&self, level_id: LevelId) -> Result<()>;
}

/// Completion flags that live only as long as the process.
#[derive(Default)]
pub struct MemoryCompletionStore {
    completed: RwLock<BTreeSet<LevelId>>,
}

impl MemoryCompletionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn completed_levels(&self) -> Vec<LevelId> {
        self.completed.read().await.iter().copied().collect()
    }
}

#[async_trait]
impl CompletionStore for MemoryCompletionStore {
    async fn is_complete(&self, level_id: LevelId) -> Result<bool> {
        Ok(self.completed.read().await.contains(&level_id))
    }

    async fn mark_complete(&self, level_id: LevelId) -> Result<()> {
        self.completed.write().await.insert(level_id);
        Ok(())
    }
}

/// Joins the catalog listing with saved completion flags, in catalog order.
pub async fn menu(catalog: &LevelCatalog, store: &dyn CompletionStore) -> Result<Vec<MenuEntry>> {
    let mut entries = Vec::with_capacity(catalog.len());
    for summary in catalog.list() {
        let completed = store.is_complete(summary.id).await?;
        entries.push(MenuEntry { summary, completed });
    }
    Ok(entries)
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

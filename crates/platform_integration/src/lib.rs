//! Platform-owned collaborators: the full-screen interlude (advertisement)
//! shown between levels and the sound player used by the level screen.

use std::{
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use shared::domain::AssetRef;
use tracing::{debug, info, warn};

/// How a presented interlude ended. The session core treats both variants
/// the same way: progression continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterludeOutcome {
    Dismissed,
    Failed(String),
}

impl InterludeOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

#[async_trait]
pub trait InterludeProvider: Send + Sync {
    /// Whether an interlude is loaded and can be shown right now.
    async fn prepare(&self) -> bool;
    /// Shows the interlude and resolves once it is dismissed or fails.
    async fn present(&self) -> InterludeOutcome;
}

pub struct NoInterlude;

#[async_trait]
impl InterludeProvider for NoInterlude {
    async fn prepare(&self) -> bool {
        false
    }

    async fn present(&self) -> InterludeOutcome {
        InterludeOutcome::Failed("no interlude configured".into())
    }
}

/// Stand-in for an ad network: always ready, stays on screen for a fixed
/// duration and optionally reports a presentation failure.
pub struct SimulatedInterlude {
    display_for: Duration,
    fail_with: Option<String>,
    ready: AtomicBool,
    presented: AtomicUsize,
}

impl SimulatedInterlude {
    pub fn new(display_for: Duration) -> Self {
        Self {
            display_for,
            fail_with: None,
            ready: AtomicBool::new(true),
            presented: AtomicUsize::new(0),
        }
    }

    pub fn failing(display_for: Duration, reason: impl Into<String>) -> Self {
        Self {
            fail_with: Some(reason.into()),
            ..Self::new(display_for)
        }
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    pub fn presented_count(&self) -> usize {
        self.presented.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InterludeProvider for SimulatedInterlude {
    async fn prepare(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn present(&self) -> InterludeOutcome {
        let shown = self.presented.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(shown, display_ms = self.display_for.as_millis() as u64, "presenting interlude");
        tokio::time::sleep(self.display_for).await;
        match &self.fail_with {
            Some(reason) => {
                warn!(%reason, "interlude failed to show");
                InterludeOutcome::Failed(reason.clone())
            }
            None => InterludeOutcome::Dismissed,
        }
    }
}

#[async_trait]
pub trait SoundPlayer: Send + Sync {
    /// Plays `sound` to completion.
    async fn play(&self, sound: &AssetRef) -> anyhow::Result<()>;
}

/// Logs every sound instead of producing audio. Used by headless front-ends.
pub struct TracingSoundPlayer;

#[async_trait]
impl SoundPlayer for TracingSoundPlayer {
    async fn play(&self, sound: &AssetRef) -> anyhow::Result<()> {
        info!(sound = %sound, "playing sound");
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

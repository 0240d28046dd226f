use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{
    domain::{AssetRef, LevelId},
    error::ErrorReport,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    Initial,
    Celebrating,
    Completed,
    ShowingInterlude {
        next_level_id: LevelId,
    },
    GameFinished,
}

/// Everything an observer needs to render the level screen.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub level_id: Option<LevelId>,
    pub item_count: usize,
    pub discovered: BTreeSet<usize>,
    pub phase: SessionPhase,
}

impl SessionSnapshot {
    pub fn is_level_complete(&self) -> bool {
        self.level_id.is_some() && self.discovered.len() == self.item_count
    }

    pub fn is_discovered(&self, index: usize) -> bool {
        self.discovered.contains(&index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum SessionEvent {
    LevelSelected {
        level_id: LevelId,
        item_count: usize,
    },
    ItemDiscovered {
        level_id: LevelId,
        index: usize,
        sound: AssetRef,
    },
    CelebrationStarted {
        level_id: LevelId,
    },
    LevelCompleted {
        level_id: LevelId,
    },
    InterludeStarted {
        next_level_id: LevelId,
    },
    InterludeFinished {
        next_level_id: LevelId,
        failed: bool,
    },
    GameFinished {
        last_level_id: LevelId,
    },
    LevelLeft {
        level_id: LevelId,
    },
    PersistenceFailed {
        level_id: LevelId,
        error: ErrorReport,
    },
}

//! Level/session progression state machine.
//!
//! The machine is synchronous and performs no I/O. Work that has to happen
//! later (the celebration timer, the interlude round trip) is handed out as a
//! [`Ticket`] and must be presented back before the machine moves on. Tickets
//! carry the selection epoch so that a firing which outlived its level
//! selection is recognised and discarded.

use std::{collections::BTreeSet, sync::Arc};

use shared::{
    domain::{Level, LevelId},
    protocol::{SessionPhase, SessionSnapshot},
};
use tracing::debug;

use crate::{catalog::LevelCatalog, error::SessionError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub level_id: LevelId,
    epoch: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discovery {
    /// Stale, out of range or already discovered.
    Ignored,
    Recorded,
    /// The last item was found; the celebration timer must be scheduled.
    Celebrate(Ticket),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Level(LevelId),
    GameFinished,
}

pub struct SessionMachine {
    catalog: Arc<LevelCatalog>,
    level_id: Option<LevelId>,
    item_count: usize,
    discovered: BTreeSet<usize>,
    phase: SessionPhase,
    epoch: u64,
    celebration: Option<Ticket>,
    interlude: Option<Ticket>,
}

impl SessionMachine {
    pub fn new(catalog: Arc<LevelCatalog>) -> Self {
        Self {
            catalog,
            level_id: None,
            item_count: 0,
            discovered: BTreeSet::new(),
            phase: SessionPhase::Initial,
            epoch: 0,
            celebration: None,
            interlude: None,
        }
    }

    pub fn catalog(&self) -> &Arc<LevelCatalog> {
        &self.catalog
    }

    pub fn level_id(&self) -> Option<LevelId> {
        self.level_id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn discovered(&self) -> &BTreeSet<usize> {
        &self.discovered
    }

    pub fn current_level(&self) -> Option<&Level> {
        self.level_id.and_then(|id| self.catalog.get(id))
    }

    pub fn select_level(&mut self, level_id: LevelId) -> Result<(), SessionError> {
        let item_count = self
            .catalog
            .get(level_id)
            .map(Level::item_count)
            .ok_or(SessionError::LevelNotFound(level_id))?;

        self.reset(Some(level_id), item_count);
        Ok(())
    }

    /// Returns the level that was active, if any.
    pub fn leave_level(&mut self) -> Option<LevelId> {
        let left = self.level_id;
        self.reset(None, 0);
        left
    }

    pub fn mark_discovered(&mut self, index: usize) -> Discovery {
        let Some(level_id) = self.level_id else {
            return Discovery::Ignored;
        };
        if index >= self.item_count || !self.discovered.insert(index) {
            debug!(level_id = level_id.0, index, "ignoring discovery");
            return Discovery::Ignored;
        }

        if self.discovered.len() < self.item_count {
            return Discovery::Recorded;
        }

        let ticket = Ticket {
            level_id,
            epoch: self.epoch,
        };
        self.phase = SessionPhase::Celebrating;
        self.celebration = Some(ticket);
        Discovery::Celebrate(ticket)
    }

    /// The level whose completion must be persisted, or `None` when the
    /// ticket is stale.
    pub fn celebration_due(&self, ticket: Ticket) -> Option<LevelId> {
        (self.celebration == Some(ticket) && self.phase == SessionPhase::Celebrating)
            .then_some(ticket.level_id)
    }

    pub fn finish_celebration(&mut self, ticket: Ticket) -> bool {
        if self.celebration_due(ticket).is_none() {
            return false;
        }
        self.celebration = None;
        self.phase = SessionPhase::Completed;
        true
    }

    /// The candidate next level when advancing is allowed right now.
    pub fn begin_advance(&self) -> Option<LevelId> {
        if self.phase != SessionPhase::Completed {
            return None;
        }
        self.level_id?.next()
    }

    pub fn enter_interlude(&mut self, next_level_id: LevelId) -> Ticket {
        let ticket = Ticket {
            level_id: next_level_id,
            epoch: self.epoch,
        };
        self.phase = SessionPhase::ShowingInterlude { next_level_id };
        self.interlude = Some(ticket);
        ticket
    }

    /// Consumes the interlude ticket. A ticket is honoured at most once.
    pub fn finish_interlude(&mut self, ticket: Ticket) -> Option<Advance> {
        if self.interlude != Some(ticket) {
            return None;
        }
        self.interlude = None;
        Some(self.resolve_advance(ticket.level_id))
    }

    pub fn resolve_advance(&mut self, next_level_id: LevelId) -> Advance {
        match self.select_level(next_level_id) {
            Ok(()) => Advance::Level(next_level_id),
            Err(_) => {
                self.celebration = None;
                self.interlude = None;
                self.phase = SessionPhase::GameFinished;
                Advance::GameFinished
            }
        }
    }

    pub fn is_current_level_complete(&self) -> bool {
        self.level_id.is_some() && self.discovered.len() == self.item_count
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            level_id: self.level_id,
            item_count: self.item_count,
            discovered: self.discovered.clone(),
            phase: self.phase,
        }
    }

    fn reset(&mut self, level_id: Option<LevelId>, item_count: usize) {
        self.epoch += 1;
        self.level_id = level_id;
        self.item_count = item_count;
        self.discovered.clear();
        self.phase = SessionPhase::Initial;
        self.celebration = None;
        self.interlude = None;
    }
}

#[cfg(test)]
#[path = "tests/machine_tests.rs"]
mod tests;

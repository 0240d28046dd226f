//! Single-owner runtime around [`SessionMachine`].
//!
//! One tokio task owns the machine. Commands from the presentation layer,
//! celebration timer firings and interlude outcomes all arrive on the same
//! queue, so observers only ever see whole snapshots published between
//! commands.

use std::{sync::Arc, time::Duration};

use platform_integration::{InterludeOutcome, InterludeProvider};
use shared::{
    domain::{LevelId, MenuEntry},
    error::{ErrorCode, ErrorReport},
    protocol::{SessionEvent, SessionSnapshot},
};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, error, info, warn};

use crate::{
    catalog::LevelCatalog,
    error::SessionError,
    machine::{Advance, Discovery, SessionMachine, Ticket},
    menu, CompletionStore,
};

pub const DEFAULT_CELEBRATION_DELAY: Duration = Duration::from_secs(3);

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub celebration_delay: Duration,
    pub command_buffer: usize,
    pub event_buffer: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            celebration_delay: DEFAULT_CELEBRATION_DELAY,
            command_buffer: 64,
            event_buffer: 256,
        }
    }
}

enum Command {
    SelectLevel {
        level_id: LevelId,
        reply: oneshot::Sender<Result<SessionSnapshot, SessionError>>,
    },
    MarkDiscovered {
        index: usize,
        reply: oneshot::Sender<SessionSnapshot>,
    },
    RequestAdvance {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    LeaveLevel {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    CelebrationElapsed(Ticket),
    InterludeFinished {
        ticket: Ticket,
        outcome: InterludeOutcome,
    },
    Shutdown,
}

pub struct SessionController {
    machine: SessionMachine,
    store: Arc<dyn CompletionStore>,
    interlude: Arc<dyn InterludeProvider>,
    config: SessionConfig,
    loopback: mpsc::WeakSender<Command>,
    state: watch::Sender<SessionSnapshot>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionController {
    /// Starts the owner task on the current tokio runtime.
    pub fn spawn(
        catalog: Arc<LevelCatalog>,
        store: Arc<dyn CompletionStore>,
        interlude: Arc<dyn InterludeProvider>,
        config: SessionConfig,
    ) -> SessionHandle {
        let (commands, inbox) = mpsc::channel(config.command_buffer.max(1));
        let (events, _) = broadcast::channel(config.event_buffer.max(1));
        let machine = SessionMachine::new(catalog.clone());
        let (state, state_rx) = watch::channel(machine.snapshot());

        let controller = Self {
            machine,
            store: store.clone(),
            interlude,
            config,
            loopback: commands.downgrade(),
            state,
            events: events.clone(),
        };
        tokio::spawn(controller.run(inbox));

        SessionHandle {
            commands,
            state: state_rx,
            events,
            catalog,
            store,
        }
    }

    async fn run(mut self, mut inbox: mpsc::Receiver<Command>) {
        while let Some(command) = inbox.recv().await {
            match command {
                Command::SelectLevel { level_id, reply } => {
                    let result = self.select_level(level_id).map(|()| self.machine.snapshot());
                    let _ = reply.send(result);
                }
                Command::MarkDiscovered { index, reply } => {
                    self.mark_discovered(index);
                    let _ = reply.send(self.machine.snapshot());
                }
                Command::RequestAdvance { reply } => {
                    self.request_advance().await;
                    let _ = reply.send(self.machine.snapshot());
                }
                Command::LeaveLevel { reply } => {
                    if let Some(level_id) = self.machine.leave_level() {
                        info!(level_id = level_id.0, "left level");
                        self.emit(SessionEvent::LevelLeft { level_id });
                    }
                    self.publish();
                    let _ = reply.send(self.machine.snapshot());
                }
                Command::CelebrationElapsed(ticket) => self.celebration_elapsed(ticket).await,
                Command::InterludeFinished { ticket, outcome } => {
                    self.interlude_finished(ticket, outcome)
                }
                Command::Shutdown => break,
            }
        }
        debug!("session controller stopped");
    }

    fn select_level(&mut self, level_id: LevelId) -> Result<(), SessionError> {
        if let Err(err) = self.machine.select_level(level_id) {
            warn!(level_id = level_id.0, error = %err, "rejected level selection");
            return Err(err);
        }
        self.level_selected(level_id);
        Ok(())
    }

    fn level_selected(&mut self, level_id: LevelId) {
        let item_count = self.machine.snapshot().item_count;
        info!(level_id = level_id.0, item_count, "level selected");
        self.emit(SessionEvent::LevelSelected {
            level_id,
            item_count,
        });
        self.publish();
    }

    fn mark_discovered(&mut self, index: usize) {
        let discovery = self.machine.mark_discovered(index);
        if discovery == Discovery::Ignored {
            return;
        }

        if let Some(level) = self.machine.current_level() {
            let event = SessionEvent::ItemDiscovered {
                level_id: level.id,
                index,
                sound: level.items[index].sound.clone(),
            };
            self.emit(event);
        }

        if let Discovery::Celebrate(ticket) = discovery {
            info!(level_id = ticket.level_id.0, "all items found, celebrating");
            self.emit(SessionEvent::CelebrationStarted {
                level_id: ticket.level_id,
            });
            self.schedule_celebration(ticket);
        }
        self.publish();
    }

    fn schedule_celebration(&self, ticket: Ticket) {
        let loopback = self.loopback.clone();
        let delay = self.config.celebration_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(commands) = loopback.upgrade() {
                let _ = commands.send(Command::CelebrationElapsed(ticket)).await;
            }
        });
    }

    async fn celebration_elapsed(&mut self, ticket: Ticket) {
        let Some(level_id) = self.machine.celebration_due(ticket) else {
            debug!(level_id = ticket.level_id.0, "discarding stale celebration timer");
            return;
        };

        if let Err(err) = self.store.mark_complete(level_id).await {
            let message = format!("{err:#}");
            error!(level_id = level_id.0, error = %message, "failed to persist level completion");
            self.emit(SessionEvent::PersistenceFailed {
                level_id,
                error: ErrorReport::new(ErrorCode::Storage, message),
            });
        }

        if self.machine.finish_celebration(ticket) {
            info!(level_id = level_id.0, "level completed");
            self.emit(SessionEvent::LevelCompleted { level_id });
            self.publish();
        }
    }

    async fn request_advance(&mut self) {
        let Some(next_level_id) = self.machine.begin_advance() else {
            debug!(phase = ?self.machine.phase(), "advance requested outside completed phase");
            return;
        };

        if !self.interlude.prepare().await {
            debug!(next_level_id = next_level_id.0, "no interlude ready");
            let advance = self.machine.resolve_advance(next_level_id);
            self.advanced(advance);
            return;
        }

        let ticket = self.machine.enter_interlude(next_level_id);
        info!(next_level_id = next_level_id.0, "showing interlude");
        self.emit(SessionEvent::InterludeStarted { next_level_id });
        self.publish();

        let interlude = self.interlude.clone();
        let loopback = self.loopback.clone();
        tokio::spawn(async move {
            let outcome = interlude.present().await;
            if let Some(commands) = loopback.upgrade() {
                let _ = commands
                    .send(Command::InterludeFinished { ticket, outcome })
                    .await;
            }
        });
    }

    fn interlude_finished(&mut self, ticket: Ticket, outcome: InterludeOutcome) {
        if let InterludeOutcome::Failed(reason) = &outcome {
            warn!(%reason, "interlude failed, continuing");
        }
        let Some(advance) = self.machine.finish_interlude(ticket) else {
            debug!(next_level_id = ticket.level_id.0, "discarding stale interlude outcome");
            return;
        };
        self.emit(SessionEvent::InterludeFinished {
            next_level_id: ticket.level_id,
            failed: outcome.is_failure(),
        });
        self.advanced(advance);
    }

    fn advanced(&mut self, advance: Advance) {
        match advance {
            Advance::Level(level_id) => self.level_selected(level_id),
            Advance::GameFinished => {
                let last_level_id = self.machine.level_id().unwrap_or(LevelId(0));
                info!(last_level_id = last_level_id.0, "game finished");
                self.emit(SessionEvent::GameFinished { last_level_id });
                self.publish();
            }
        }
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }

    fn publish(&self) {
        self.state.send_replace(self.machine.snapshot());
    }
}

/// Cloneable front door to a running [`SessionController`].
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<SessionSnapshot>,
    events: broadcast::Sender<SessionEvent>,
    catalog: Arc<LevelCatalog>,
    store: Arc<dyn CompletionStore>,
}

impl SessionHandle {
    pub async fn select_level(&self, level_id: LevelId) -> Result<SessionSnapshot, SessionError> {
        self.request(|reply| Command::SelectLevel { level_id, reply })
            .await?
    }

    pub async fn mark_discovered(&self, index: usize) -> Result<SessionSnapshot, SessionError> {
        self.request(|reply| Command::MarkDiscovered { index, reply })
            .await
    }

    pub async fn request_advance(&self) -> Result<SessionSnapshot, SessionError> {
        self.request(|reply| Command::RequestAdvance { reply }).await
    }

    pub async fn leave_level(&self) -> Result<SessionSnapshot, SessionError> {
        self.request(|reply| Command::LeaveLevel { reply }).await
    }

    pub fn is_current_level_complete(&self) -> bool {
        self.state.borrow().is_level_complete()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.clone()
    }

    pub fn state_stream(&self) -> WatchStream<SessionSnapshot> {
        WatchStream::new(self.state.clone())
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn catalog(&self) -> &Arc<LevelCatalog> {
        &self.catalog
    }

    pub async fn menu(&self) -> anyhow::Result<Vec<MenuEntry>> {
        menu(&self.catalog, self.store.as_ref()).await
    }

    /// Waits until the published snapshot satisfies `predicate`.
    pub async fn wait_for(
        &self,
        predicate: impl FnMut(&SessionSnapshot) -> bool,
    ) -> Result<SessionSnapshot, SessionError> {
        let mut state = self.state.clone();
        let snapshot = state
            .wait_for(predicate)
            .await
            .map_err(|_| SessionError::ControllerClosed)?;
        Ok(snapshot.clone())
    }

    pub async fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown).await;
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, SessionError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| SessionError::ControllerClosed)?;
        response.await.map_err(|_| SessionError::ControllerClosed)
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;

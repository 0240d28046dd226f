//! Terminal presentation layer: prints session events, plays sounds and
//! turns typed commands into session operations.

use std::sync::Arc;

use anyhow::{Context, Result};
use game_core::{SessionError, SessionHandle};
use platform_integration::SoundPlayer;
use shared::{
    domain::{AssetRef, LevelId},
    error::ErrorReport,
    protocol::{SessionEvent, SessionPhase, SessionSnapshot},
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::{self, error::RecvError},
    task::JoinHandle,
};
use tracing::{debug, warn};

pub const CELEBRATION_SOUND: &str = "raw/win";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptCommand {
    Menu,
    Play(LevelId),
    Tap(usize),
    Next,
    Back,
    State,
    Help,
    Quit,
}

impl PromptCommand {
    pub fn parse(line: &str) -> Result<Self, String> {
        let mut parts = line.split_whitespace();
        let Some(verb) = parts.next() else {
            return Err("empty command".into());
        };
        let argument = parts.next();
        if parts.next().is_some() {
            return Err(format!("too many arguments for '{verb}'"));
        }

        let command = match (verb.to_ascii_lowercase().as_str(), argument) {
            ("menu", None) => Self::Menu,
            ("play", Some(id)) => Self::Play(LevelId(
                id.parse()
                    .map_err(|_| format!("'{id}' is not a level number"))?,
            )),
            ("tap", Some(index)) => Self::Tap(
                index
                    .parse()
                    .map_err(|_| format!("'{index}' is not an item number"))?,
            ),
            ("next", None) => Self::Next,
            ("back", None) => Self::Back,
            ("state", None) => Self::State,
            ("help", None) | ("?", None) => Self::Help,
            ("quit", None) | ("exit", None) => Self::Quit,
            ("play", None) | ("tap", None) => {
                return Err(format!("'{verb}' needs a number"));
            }
            _ => return Err(format!("unrecognized command '{}'", line.trim())),
        };
        Ok(command)
    }
}

/// Prints every event as a JSON line and plays the sounds they call for.
pub fn spawn_presenter(
    mut events: broadcast::Receiver<SessionEvent>,
    sounds: Arc<dyn SoundPlayer>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "presenter fell behind session events");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            match serde_json::to_string(&event) {
                Ok(line) => println!("{line}"),
                Err(err) => warn!(error = %err, "failed to encode session event"),
            }

            let sound = match &event {
                SessionEvent::ItemDiscovered { sound, .. } => Some(sound.clone()),
                SessionEvent::LevelCompleted { .. } => Some(AssetRef::new(CELEBRATION_SOUND)),
                _ => None,
            };
            if let Some(sound) = sound {
                if let Err(err) = sounds.play(&sound).await {
                    warn!(sound = %sound, error = %err, "sound playback failed");
                }
            }
        }
        debug!("presenter stopped");
    })
}

/// Stops the session and lets the presenter drain every event it was sent.
pub async fn close(handle: SessionHandle, presenter: JoinHandle<()>) -> Result<()> {
    handle.shutdown().await;
    drop(handle);
    presenter.await.context("presenter task failed")?;
    Ok(())
}

/// Requests the next level and waits out any interlude shown on the way.
pub async fn advance(handle: &SessionHandle) -> Result<SessionSnapshot, SessionError> {
    let snapshot = handle.request_advance().await?;
    if !matches!(snapshot.phase, SessionPhase::ShowingInterlude { .. }) {
        return Ok(snapshot);
    }
    handle
        .wait_for(|s| !matches!(s.phase, SessionPhase::ShowingInterlude { .. }))
        .await
}

/// Plays every level in catalog order until the game is finished.
pub async fn autoplay(handle: &SessionHandle) -> Result<SessionSnapshot> {
    handle.select_level(handle.catalog().first_id()).await?;

    loop {
        let snapshot = handle.snapshot();
        for index in 0..snapshot.item_count {
            handle.mark_discovered(index).await?;
        }
        handle
            .wait_for(|s| s.phase == SessionPhase::Completed)
            .await?;

        let advanced = advance(handle).await?;
        if advanced.phase == SessionPhase::GameFinished {
            return Ok(advanced);
        }
    }
}

pub async fn interactive(handle: &SessionHandle) -> Result<()> {
    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let command = match PromptCommand::parse(&line) {
            Ok(command) => command,
            Err(err) => {
                println!("{err}");
                continue;
            }
        };
        if command == PromptCommand::Quit {
            break;
        }
        if let Err(err) = run_command(handle, command).await {
            println!("{}", error_line(&err));
        }
    }
    Ok(())
}

/// Session errors are printed as JSON reports, anything else as plain text.
fn error_line(err: &anyhow::Error) -> String {
    match err.downcast_ref::<SessionError>() {
        Some(session_err) => serde_json::to_string(&ErrorReport::from(session_err))
            .unwrap_or_else(|_| format!("error: {session_err}")),
        None => format!("error: {err:#}"),
    }
}

const HELP: &str = "commands: menu | play <level> | tap <item> | next | back | state | quit";

async fn run_command(handle: &SessionHandle, command: PromptCommand) -> Result<()> {
    match command {
        PromptCommand::Menu => {
            for entry in handle.menu().await? {
                let mark = if entry.completed { "x" } else { " " };
                println!(
                    "[{mark}] {} {} ({})",
                    entry.summary.id,
                    entry.summary.title,
                    entry.display_thumbnail()
                );
            }
        }
        PromptCommand::Play(level_id) => {
            let snapshot = handle.select_level(level_id).await?;
            print_level(handle, &snapshot);
        }
        PromptCommand::Tap(index) => {
            handle.mark_discovered(index).await?;
        }
        PromptCommand::Next => {
            let before = handle.snapshot().level_id;
            let snapshot = advance(handle).await?;
            if snapshot.phase == SessionPhase::GameFinished {
                println!("every level is done");
            } else if snapshot.level_id != before {
                print_level(handle, &snapshot);
            }
        }
        PromptCommand::Back => {
            handle.leave_level().await?;
        }
        PromptCommand::State => {
            println!("{}", serde_json::to_string_pretty(&handle.snapshot())?);
        }
        PromptCommand::Help => println!("{HELP}"),
        PromptCommand::Quit => {}
    }
    Ok(())
}

fn print_level(handle: &SessionHandle, snapshot: &SessionSnapshot) {
    let Some(level) = snapshot.level_id.and_then(|id| handle.catalog().get(id)) else {
        return;
    };
    println!("{} ({})", level.title, level.background);
    for (index, item) in level.items.iter().enumerate() {
        println!("  {index}: {}", item.appearance(snapshot.is_discovered(index)));
    }
}

#[cfg(test)]
#[path = "tests/play_tests.rs"]
mod tests;

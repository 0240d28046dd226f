use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use game_core::{LevelCatalog, MemoryCompletionStore, SessionConfig, SessionController};
use platform_integration::{NoInterlude, SimulatedInterlude, TracingSoundPlayer};
use shared::error::ErrorCode;

use super::*;

#[test]
fn parses_prompt_commands() {
    assert_eq!(PromptCommand::parse("menu"), Ok(PromptCommand::Menu));
    assert_eq!(
        PromptCommand::parse("  play 3 "),
        Ok(PromptCommand::Play(LevelId(3)))
    );
    assert_eq!(PromptCommand::parse("TAP 0"), Ok(PromptCommand::Tap(0)));
    assert_eq!(PromptCommand::parse("next"), Ok(PromptCommand::Next));
    assert_eq!(PromptCommand::parse("back"), Ok(PromptCommand::Back));
    assert_eq!(PromptCommand::parse("exit"), Ok(PromptCommand::Quit));
    assert_eq!(PromptCommand::parse("?"), Ok(PromptCommand::Help));
}

#[test]
fn rejects_malformed_prompt_commands() {
    assert!(PromptCommand::parse("").is_err());
    assert!(PromptCommand::parse("play").is_err());
    assert!(PromptCommand::parse("play forest").is_err());
    assert!(PromptCommand::parse("tap -1").is_err());
    assert!(PromptCommand::parse("tap 1 2").is_err());
    assert!(PromptCommand::parse("menu 2").is_err());
    assert!(PromptCommand::parse("dance").is_err());
}

#[tokio::test(start_paused = true)]
async fn autoplay_finishes_the_builtin_game() {
    let store = Arc::new(MemoryCompletionStore::new());
    let handle = SessionController::spawn(
        Arc::new(LevelCatalog::builtin()),
        store.clone(),
        Arc::new(SimulatedInterlude::new(Duration::from_secs(2))),
        SessionConfig::default(),
    );
    let presenter = spawn_presenter(handle.subscribe_events(), Arc::new(TracingSoundPlayer));

    let finished = autoplay(&handle).await.expect("autoplay");
    assert_eq!(finished.phase, SessionPhase::GameFinished);
    assert_eq!(store.completed_levels().await.len(), 6);

    close(handle, presenter).await.expect("close");
}

/// Takes a second per sound, like a player that waits for playback to end.
#[derive(Default)]
struct SlowSoundPlayer {
    played: AtomicUsize,
    celebrations: AtomicUsize,
}

#[async_trait]
impl SoundPlayer for SlowSoundPlayer {
    async fn play(&self, sound: &AssetRef) -> anyhow::Result<()> {
        tokio::time::sleep(Duration::from_secs(1)).await;
        self.played.fetch_add(1, Ordering::SeqCst);
        if sound.as_str() == CELEBRATION_SOUND {
            self.celebrations.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn closing_plays_every_pending_sound() {
    let handle = SessionController::spawn(
        Arc::new(LevelCatalog::builtin()),
        Arc::new(MemoryCompletionStore::new()),
        Arc::new(NoInterlude),
        SessionConfig::default(),
    );
    let sounds = Arc::new(SlowSoundPlayer::default());
    let presenter = spawn_presenter(handle.subscribe_events(), sounds.clone());

    autoplay(&handle).await.expect("autoplay");
    close(handle, presenter).await.expect("close");

    // six animals per level plus one win sound per level
    assert_eq!(sounds.played.load(Ordering::SeqCst), 42);
    assert_eq!(sounds.celebrations.load(Ordering::SeqCst), 6);
}

#[tokio::test(start_paused = true)]
async fn win_sound_waits_for_the_celebration_delay() {
    let handle = SessionController::spawn(
        Arc::new(LevelCatalog::builtin()),
        Arc::new(MemoryCompletionStore::new()),
        Arc::new(NoInterlude),
        SessionConfig::default(),
    );
    let sounds = Arc::new(SlowSoundPlayer::default());
    let presenter = spawn_presenter(handle.subscribe_events(), sounds.clone());

    handle.select_level(LevelId(1)).await.expect("select");
    for index in 0..6 {
        handle.mark_discovered(index).await.expect("discover");
    }
    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert_eq!(sounds.celebrations.load(Ordering::SeqCst), 0);

    handle
        .wait_for(|s| s.phase == SessionPhase::Completed)
        .await
        .expect("completed");
    close(handle, presenter).await.expect("close");
    assert_eq!(sounds.celebrations.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn next_waits_for_the_interlude_to_finish() {
    let handle = SessionController::spawn(
        Arc::new(LevelCatalog::builtin()),
        Arc::new(MemoryCompletionStore::new()),
        Arc::new(SimulatedInterlude::new(Duration::from_secs(2))),
        SessionConfig::default(),
    );
    handle.select_level(LevelId(1)).await.expect("select");
    for index in 0..6 {
        handle.mark_discovered(index).await.expect("discover");
    }
    handle
        .wait_for(|s| s.phase == SessionPhase::Completed)
        .await
        .expect("completed");

    run_command(&handle, PromptCommand::Next)
        .await
        .expect("next");

    let snapshot = handle.snapshot();
    assert_eq!(snapshot.level_id, Some(LevelId(2)));
    assert_eq!(snapshot.phase, SessionPhase::Initial);
    handle.shutdown().await;
}

#[tokio::test]
async fn session_errors_are_printed_as_reports() {
    let handle = SessionController::spawn(
        Arc::new(LevelCatalog::builtin()),
        Arc::new(MemoryCompletionStore::new()),
        Arc::new(NoInterlude),
        SessionConfig::default(),
    );

    let err = run_command(&handle, PromptCommand::Play(LevelId(99)))
        .await
        .unwrap_err();
    let report: ErrorReport = serde_json::from_str(&error_line(&err)).expect("json report");
    assert_eq!(report.code, ErrorCode::NotFound);
    assert!(report.message.contains("99"));

    handle.shutdown().await;
    let err = run_command(&handle, PromptCommand::Tap(0)).await.unwrap_err();
    let report: ErrorReport = serde_json::from_str(&error_line(&err)).expect("json report");
    assert_eq!(report.code, ErrorCode::Unavailable);

    let other = anyhow::anyhow!("stdin closed");
    assert_eq!(error_line(&other), "error: stdin closed");
}

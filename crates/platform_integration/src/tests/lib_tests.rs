use super::*;

#[tokio::test]
async fn no_interlude_is_never_ready() {
    assert!(!NoInterlude.prepare().await);
    assert!(NoInterlude.present().await.is_failure());
}

#[tokio::test(start_paused = true)]
async fn simulated_interlude_waits_for_display_duration() {
    let interlude = SimulatedInterlude::new(Duration::from_secs(5));
    assert!(interlude.prepare().await);

    let started = tokio::time::Instant::now();
    let outcome = interlude.present().await;

    assert_eq!(outcome, InterludeOutcome::Dismissed);
    assert!(started.elapsed() >= Duration::from_secs(5));
    assert_eq!(interlude.presented_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn failing_interlude_reports_reason() {
    let interlude = SimulatedInterlude::failing(Duration::from_millis(10), "no fill");
    assert_eq!(
        interlude.present().await,
        InterludeOutcome::Failed("no fill".into())
    );
}

#[tokio::test]
async fn readiness_can_be_toggled() {
    let interlude = SimulatedInterlude::new(Duration::ZERO);
    interlude.set_ready(false);
    assert!(!interlude.prepare().await);
    interlude.set_ready(true);
    assert!(interlude.prepare().await);
}

#[tokio::test]
async fn tracing_sound_player_accepts_any_asset() {
    TracingSoundPlayer
        .play(&AssetRef::new("raw/win"))
        .await
        .expect("play");
}

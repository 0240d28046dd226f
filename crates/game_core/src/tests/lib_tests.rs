use super::*;

#[tokio::test]
async fn memory_store_tracks_completed_levels() {
    let store = MemoryCompletionStore::new();
    assert!(!store.is_complete(LevelId(2)).await.expect("lookup"));

    store.mark_complete(LevelId(2)).await.expect("mark");
    store.mark_complete(LevelId(2)).await.expect("mark again");

    assert!(store.is_complete(LevelId(2)).await.expect("lookup"));
    assert_eq!(store.completed_levels().await, vec![LevelId(2)]);
}

#[tokio::test]
async fn menu_reflects_completion_flags() {
    let catalog = LevelCatalog::builtin();
    let store = MemoryCompletionStore::new();
    store.mark_complete(LevelId(3)).await.expect("mark");

    let entries = menu(&catalog, &store).await.expect("menu");
    assert_eq!(entries.len(), 6);
    let completed: Vec<u32> = entries
        .iter()
        .filter(|entry| entry.completed)
        .map(|entry| entry.summary.id.0)
        .collect();
    assert_eq!(completed, vec![3]);
    assert_eq!(
        entries[2].display_thumbnail().as_str(),
        "drawable/level_room_done"
    );
    assert_eq!(entries[0].display_thumbnail().as_str(), "drawable/level_farm");
}

struct BrokenStore;

#[async_trait]
impl CompletionStore for BrokenStore {
    async fn is_complete(&self, _level_id: LevelId) -> Result<bool> {
        Err(anyhow::anyhow!("storage offline"))
    }

    async fn mark_complete(&self, _level_id: LevelId) -> Result<()> {
        Err(anyhow::anyhow!("storage offline"))
    }
}

#[tokio::test]
async fn menu_surfaces_store_errors() {
    let err = menu(&LevelCatalog::builtin(), &BrokenStore)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("storage offline"));
}

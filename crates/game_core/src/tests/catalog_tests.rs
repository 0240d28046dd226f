use std::io::Write;

use super::*;

fn level(id: u32, items: usize) -> Level {
    Level {
        id: LevelId(id),
        title: format!("Level {id}"),
        background: AssetRef::new("bg"),
        thumbnail: AssetRef::new("thumb"),
        locked_thumbnail: AssetRef::new("thumb_locked"),
        items: (0..items)
            .map(|i| Item::new(format!("a{i}"), format!("a{i}_done"), format!("s{i}")))
            .collect(),
    }
}

#[test]
fn builtin_catalog_has_six_levels_of_six_animals() {
    let catalog = LevelCatalog::builtin();
    assert_eq!(catalog.len(), 6);
    assert_eq!(catalog.first_id(), LevelId(1));
    for (expected_id, level) in (1..=6).zip(catalog.levels()) {
        assert_eq!(level.id, LevelId(expected_id));
        assert_eq!(level.item_count(), 6);
    }
    let farm = catalog.get(LevelId(1)).expect("farm");
    assert_eq!(farm.items[0].default_appearance.as_str(), "drawable/pig");
    assert_eq!(farm.items[0].found_appearance.as_str(), "drawable/pig_done");
}

#[test]
fn builtin_catalog_passes_validation() {
    let builtin = LevelCatalog::builtin();
    LevelCatalog::new(builtin.levels().to_vec()).expect("builtin levels are valid");
}

#[test]
fn lookup_misses_are_none() {
    let catalog = LevelCatalog::builtin();
    assert!(catalog.get(LevelId(7)).is_none());
    assert!(catalog.get(LevelId(0)).is_none());
    assert!(!catalog.contains(LevelId(42)));
}

#[test]
fn list_is_ordered_by_id() {
    let catalog = LevelCatalog::new(vec![level(3, 1), level(1, 2), level(2, 1)]).expect("catalog");
    let ids: Vec<u32> = catalog.list().iter().map(|summary| summary.id.0).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(catalog.get(LevelId(1)).expect("level 1").item_count(), 2);
}

#[test]
fn rejects_duplicate_ids() {
    let err = LevelCatalog::new(vec![level(1, 1), level(1, 2)]).unwrap_err();
    assert!(matches!(err, CatalogError::DuplicateLevel(LevelId(1))));
}

#[test]
fn rejects_levels_without_items() {
    let err = LevelCatalog::new(vec![level(1, 0)]).unwrap_err();
    assert!(matches!(err, CatalogError::EmptyLevel(LevelId(1))));
}

#[test]
fn rejects_out_of_range_ids() {
    assert!(matches!(
        LevelCatalog::new(vec![level(0, 1)]).unwrap_err(),
        CatalogError::InvalidLevelId(LevelId(0))
    ));
    assert!(matches!(
        LevelCatalog::new(vec![level(u32::MAX, 1)]).unwrap_err(),
        CatalogError::InvalidLevelId(_)
    ));
    assert!(matches!(
        LevelCatalog::new(Vec::new()).unwrap_err(),
        CatalogError::Empty
    ));
}

const TWO_LEVEL_DOCUMENT: &str = r#"
[[levels]]
id = 2
title = "Pond"
background = "drawable/pond_background"
thumbnail = "drawable/level_pond_done"
locked_thumbnail = "drawable/level_pond"

[[levels.items]]
default_appearance = "drawable/frog"
found_appearance = "drawable/frog_done"
sound = "raw/frog"

[[levels]]
id = 1
title = "Yard"
background = "drawable/yard_background"
thumbnail = "drawable/level_yard_done"
locked_thumbnail = "drawable/level_yard"

[[levels.items]]
default_appearance = "drawable/dog"
found_appearance = "drawable/dog_done"
sound = "raw/dog"

[[levels.items]]
default_appearance = "drawable/cat"
found_appearance = "drawable/cat_done"
sound = "raw/cat"
"#;

#[test]
fn parses_toml_document() {
    let catalog = LevelCatalog::from_toml_str(TWO_LEVEL_DOCUMENT).expect("catalog");
    assert_eq!(catalog.first_id(), LevelId(1));
    let yard = catalog.get(LevelId(1)).expect("yard");
    assert_eq!(yard.title, "Yard");
    assert_eq!(yard.item(1).expect("cat").sound.as_str(), "raw/cat");
}

#[test]
fn malformed_document_is_a_parse_error() {
    let err = LevelCatalog::from_toml_str("levels = 3").unwrap_err();
    assert!(matches!(err, CatalogError::Parse(_)));
}

#[test]
fn loads_catalog_from_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(TWO_LEVEL_DOCUMENT.as_bytes()).expect("write");

    let catalog = LevelCatalog::from_path(file.path()).expect("catalog");
    assert_eq!(catalog.len(), 2);
}

#[test]
fn missing_file_reports_path() {
    let err = LevelCatalog::from_path(Path::new("/definitely/not/here.toml")).unwrap_err();
    assert!(err.to_string().contains("/definitely/not/here.toml"));
}

//! Immutable registry of the playable levels.

use std::{collections::HashSet, fs, path::Path};

use serde::Deserialize;
use shared::domain::{AssetRef, Item, Level, LevelId, LevelSummary};

use crate::error::CatalogError;

#[derive(Debug, Clone)]
pub struct LevelCatalog {
    levels: Vec<Level>,
}

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    levels: Vec<Level>,
}

impl LevelCatalog {
    /// Validates and sorts `levels` by id.
    pub fn new(mut levels: Vec<Level>) -> Result<Self, CatalogError> {
        if levels.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::with_capacity(levels.len());
        for level in &levels {
            if level.id.0 == 0 || level.id.next().is_none() {
                return Err(CatalogError::InvalidLevelId(level.id));
            }
            if !seen.insert(level.id) {
                return Err(CatalogError::DuplicateLevel(level.id));
            }
            if level.items.is_empty() {
                return Err(CatalogError::EmptyLevel(level.id));
            }
        }

        levels.sort_by_key(|level| level.id);
        Ok(Self { levels })
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, CatalogError> {
        let document: CatalogDocument = toml::from_str(raw)?;
        Self::new(document.levels)
    }

    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// The six themed levels shipped with the game.
    pub fn builtin() -> Self {
        let levels = vec![
            themed_level(
                1,
                "Farm",
                "farm",
                &[
                    ("pig", "pig_voice"),
                    ("duck", "duck_voice"),
                    ("lamb", "sheep_voice"),
                    ("horse", "horse_voice"),
                    ("cow", "cow_voice"),
                    ("chicken", "chicken_voice"),
                ],
            ),
            themed_level(
                2,
                "Forest",
                "forest",
                &[
                    ("wolf", "wolf"),
                    ("owl", "owl"),
                    ("bear", "bear"),
                    ("boar", "boar"),
                    ("fox", "fox"),
                    ("squirrel", "squirrel"),
                ],
            ),
            themed_level(
                3,
                "Room",
                "room",
                &[
                    ("cat", "cat"),
                    ("dog", "dog"),
                    ("rabbit", "rabbit"),
                    ("fish", "fish"),
                    ("parrot", "parrot"),
                    ("hamster", "hamster"),
                ],
            ),
            themed_level(
                4,
                "Jungle",
                "jungle",
                &[
                    ("lion", "lion"),
                    ("elephant", "elephant"),
                    ("snake", "snake"),
                    ("monkey", "monkey"),
                    ("frog", "frog"),
                    ("tiger", "tiger"),
                ],
            ),
            themed_level(
                5,
                "Desert",
                "desert",
                &[
                    ("camel", "camel"),
                    ("lizard", "monitor_lizard"),
                    ("scorpion", "scorpion"),
                    ("gopher", "marmot"),
                    ("ostrich", "ostrich"),
                    ("hyena", "hyena"),
                ],
            ),
            themed_level(
                6,
                "Insects",
                "insects",
                &[
                    ("bee", "bee"),
                    ("mosquito", "mosquito"),
                    ("fly", "fly"),
                    ("cricket", "cricket"),
                    ("grasshopper", "grasshopper"),
                    ("bug", "bug"),
                ],
            ),
        ];

        Self { levels }
    }

    pub fn get(&self, id: LevelId) -> Option<&Level> {
        self.levels
            .binary_search_by_key(&id, |level| level.id)
            .ok()
            .map(|pos| &self.levels[pos])
    }

    pub fn contains(&self, id: LevelId) -> bool {
        self.get(id).is_some()
    }

    pub fn list(&self) -> Vec<LevelSummary> {
        self.levels.iter().map(Level::summary).collect()
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn first_id(&self) -> LevelId {
        self.levels[0].id
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

fn themed_level(id: u32, title: &str, theme: &str, animals: &[(&str, &str)]) -> Level {
    Level {
        id: LevelId(id),
        title: title.to_string(),
        background: AssetRef::new(format!("drawable/{theme}_background")),
        thumbnail: AssetRef::new(format!("drawable/level_{theme}_done")),
        locked_thumbnail: AssetRef::new(format!("drawable/level_{theme}")),
        items: animals
            .iter()
            .map(|(animal, sound)| {
                Item::new(
                    format!("drawable/{animal}"),
                    format!("drawable/{animal}_done"),
                    format!("raw/{sound}"),
                )
            })
            .collect(),
    }
}

#[cfg(test)]
#[path = "tests/catalog_tests.rs"]
mod tests;

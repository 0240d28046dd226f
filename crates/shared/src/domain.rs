use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(LevelId);

impl LevelId {
    /// The id that follows this one in catalog order, if representable.
    pub fn next(self) -> Option<LevelId> {
        self.0.checked_add(1).map(LevelId)
    }
}

/// Opaque handle to an image or sound resource owned by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetRef(pub String);

impl AssetRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A discoverable item. Its id is its index inside the owning level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub default_appearance: AssetRef,
    pub found_appearance: AssetRef,
    pub sound: AssetRef,
}

impl Item {
    pub fn new(
        default_appearance: impl Into<String>,
        found_appearance: impl Into<String>,
        sound: impl Into<String>,
    ) -> Self {
        Self {
            default_appearance: AssetRef::new(default_appearance),
            found_appearance: AssetRef::new(found_appearance),
            sound: AssetRef::new(sound),
        }
    }

    pub fn appearance(&self, found: bool) -> &AssetRef {
        if found {
            &self.found_appearance
        } else {
            &self.default_appearance
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub id: LevelId,
    pub title: String,
    pub background: AssetRef,
    pub thumbnail: AssetRef,
    pub locked_thumbnail: AssetRef,
    pub items: Vec<Item>,
}

impl Level {
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn item(&self, index: usize) -> Option<&Item> {
        self.items.get(index)
    }

    pub fn summary(&self) -> LevelSummary {
        LevelSummary {
            id: self.id,
            title: self.title.clone(),
            thumbnail: self.thumbnail.clone(),
            locked_thumbnail: self.locked_thumbnail.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSummary {
    pub id: LevelId,
    pub title: String,
    pub thumbnail: AssetRef,
    pub locked_thumbnail: AssetRef,
}

/// A level as shown on the menu, joined with its saved completion flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuEntry {
    pub summary: LevelSummary,
    pub completed: bool,
}

impl MenuEntry {
    pub fn display_thumbnail(&self) -> &AssetRef {
        if self.completed {
            &self.summary.thumbnail
        } else {
            &self.summary.locked_thumbnail
        }
    }
}

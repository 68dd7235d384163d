use serde::{Deserialize, Serialize};
use std::fmt;

/// Records the dashboard reads from the catalog.
/// These are plain immutable value objects, created once at startup.

/// Experience genre
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Genre {
    Adventure,
    Roleplay,
    Combat,
    Simulation,
    Obby,
    Racing,
}

impl Genre {
    pub const ALL: [Genre; 6] = [
        Genre::Adventure,
        Genre::Roleplay,
        Genre::Combat,
        Genre::Simulation,
        Genre::Obby,
        Genre::Racing,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Genre::Adventure => "Adventure",
            Genre::Roleplay => "Roleplay",
            Genre::Combat => "Combat",
            Genre::Simulation => "Simulation",
            Genre::Obby => "Obby",
            Genre::Racing => "Racing",
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A playable experience listed on the platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    pub id: String,
    pub title: String,
    pub creator: String,
    pub creator_avatar_url: String,
    pub thumbnail_url: String,
    pub player_count: u64,
    pub genre: Genre,
    pub description: String,
}

impl Experience {
    /// Numeric form of the id, used for "Newest" ordering.
    pub fn numeric_id(&self) -> Option<u64> {
        self.id.parse().ok()
    }
}

/// Player review shown on the detail page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub author: String,
    pub author_avatar_url: String,
    pub rating: u8,
    pub comment: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendStatus {
    Online,
    Offline,
}

/// Reference from a friend to the experience they are currently in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRef {
    pub name: String,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Friend {
    pub name: String,
    pub avatar_url: String,
    pub status: FriendStatus,
    #[serde(default)]
    pub current_game: Option<GameRef>,
}

impl Friend {
    pub fn is_online(&self) -> bool {
        self.status == FriendStatus::Online
    }

    /// The game a friend can be joined in. Offline friends are never joinable.
    pub fn joinable_game(&self) -> Option<&GameRef> {
        if self.is_online() {
            self.current_game.as_ref()
        } else {
            None
        }
    }
}

/// "Friend is playing X" entry on the home feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FriendActivity {
    pub friend_name: String,
    pub friend_avatar_url: String,
    pub experience_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NewsCategory {
    Event,
    Update,
    Community,
    #[serde(other)]
    News,
}

impl NewsCategory {
    pub fn label(&self) -> &'static str {
        match self {
            NewsCategory::Event => "Event",
            NewsCategory::Update => "Update",
            NewsCategory::Community => "Community",
            NewsCategory::News => "News",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub id: String,
    pub title: String,
    pub category: NewsCategory,
    pub summary: String,
    pub image_url: String,
}

/// Wardrobe slot an avatar item occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AvatarCategory {
    Hats,
    Shirts,
    Pants,
    Accessories,
}

impl AvatarCategory {
    pub const ALL: [AvatarCategory; 4] = [
        AvatarCategory::Hats,
        AvatarCategory::Shirts,
        AvatarCategory::Pants,
        AvatarCategory::Accessories,
    ];

    /// Accessories stack; every other category holds a single item.
    pub fn allows_multiple(&self) -> bool {
        matches!(self, AvatarCategory::Accessories)
    }

    pub fn label(&self) -> &'static str {
        match self {
            AvatarCategory::Hats => "Hats",
            AvatarCategory::Shirts => "Shirts",
            AvatarCategory::Pants => "Pants",
            AvatarCategory::Accessories => "Accessories",
        }
    }
}

impl fmt::Display for AvatarCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Wearable item. `model_url` is opaque; models are never loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvatarItem {
    pub id: String,
    pub name: String,
    pub model_url: String,
    pub category: AvatarCategory,
}

impl AvatarItem {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        model_url: impl Into<String>,
        category: AvatarCategory,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            model_url: model_url.into(),
            category,
        }
    }
}

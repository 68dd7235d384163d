//! Static catalog
//!
//! The read-only dataset every view draws from. The built-in catalog is
//! embedded in the binary and parsed once at startup; an alternate file can
//! be supplied through `AppSettings::catalog_path`.

pub mod types;

pub use types::*;

use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

const BUILTIN_CATALOG: &str = include_str!("builtin.toml");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Duplicate {kind} id: {id}")]
    DuplicateId { kind: &'static str, id: String },

    #[error("{owner} references unknown experience {id}")]
    DanglingReference { owner: String, id: String },

    #[error("Review {id} has rating {rating}, expected 1-5")]
    InvalidRating { id: String, rating: u8 },
}

pub type CatalogResult<T> = Result<T, CatalogError>;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Catalog {
    experiences: Vec<Experience>,
    reviews: Vec<Review>,
    friends: Vec<Friend>,
    friend_activity: Vec<FriendActivity>,
    news: Vec<NewsArticle>,
    avatar_items: Vec<AvatarItem>,
}

impl Catalog {
    /// The catalog compiled into the binary
    pub fn builtin() -> CatalogResult<Self> {
        Self::from_toml_str(BUILTIN_CATALOG)
    }

    /// Load from an explicit path, falling back to the built-in data when
    /// no path is configured.
    pub fn load_or_builtin(path: Option<&Path>) -> CatalogResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Self::builtin(),
        }
    }

    pub fn load(path: &Path) -> CatalogResult<Self> {
        info!("Loading catalog from {:?}", path);
        let data = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&data)
    }

    pub fn from_toml_str(data: &str) -> CatalogResult<Self> {
        let catalog: Catalog = toml::from_str(data)?;
        catalog.validate()?;
        debug!(
            "Catalog ready: {} experiences, {} reviews, {} friends, {} news, {} avatar items",
            catalog.experiences.len(),
            catalog.reviews.len(),
            catalog.friends.len(),
            catalog.news.len(),
            catalog.avatar_items.len()
        );
        Ok(catalog)
    }

    fn validate(&self) -> CatalogResult<()> {
        check_unique("experience", self.experiences.iter().map(|e| e.id.as_str()))?;
        check_unique("review", self.reviews.iter().map(|r| r.id.as_str()))?;
        check_unique("news", self.news.iter().map(|n| n.id.as_str()))?;
        check_unique("avatar item", self.avatar_items.iter().map(|i| i.id.as_str()))?;

        for review in &self.reviews {
            if !(1..=5).contains(&review.rating) {
                return Err(CatalogError::InvalidRating {
                    id: review.id.clone(),
                    rating: review.rating,
                });
            }
        }

        for activity in &self.friend_activity {
            if self.experience(&activity.experience_id).is_none() {
                return Err(CatalogError::DanglingReference {
                    owner: format!("Activity of {}", activity.friend_name),
                    id: activity.experience_id.clone(),
                });
            }
        }

        for friend in &self.friends {
            if let Some(game) = &friend.current_game {
                if self.experience(&game.id).is_none() {
                    return Err(CatalogError::DanglingReference {
                        owner: format!("Friend {}", friend.name),
                        id: game.id.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    pub fn experiences(&self) -> &[Experience] {
        &self.experiences
    }

    pub fn experience(&self, id: &str) -> Option<&Experience> {
        self.experiences.iter().find(|e| e.id == id)
    }

    pub fn reviews(&self) -> &[Review] {
        &self.reviews
    }

    /// Mean review rating, `None` when there are no reviews
    pub fn average_rating(&self) -> Option<f32> {
        if self.reviews.is_empty() {
            return None;
        }
        let total: u32 = self.reviews.iter().map(|r| r.rating as u32).sum();
        Some(total as f32 / self.reviews.len() as f32)
    }

    pub fn friends(&self) -> &[Friend] {
        &self.friends
    }

    /// Friend activity joined with the experience it points at
    pub fn friend_activity(&self) -> impl Iterator<Item = (&FriendActivity, &Experience)> + '_ {
        self.friend_activity
            .iter()
            .filter_map(move |a| self.experience(&a.experience_id).map(|e| (a, e)))
    }

    pub fn news(&self) -> &[NewsArticle] {
        &self.news
    }

    pub fn avatar_items(&self) -> &[AvatarItem] {
        &self.avatar_items
    }
}

fn check_unique<'a>(kind: &'static str, ids: impl Iterator<Item = &'a str>) -> CatalogResult<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(CatalogError::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_loads() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(catalog.experiences().len(), 24);
        assert_eq!(catalog.reviews().len(), 3);
        assert_eq!(catalog.friends().len(), 5);
        assert_eq!(catalog.news().len(), 3);
        assert_eq!(catalog.avatar_items().len(), 16);
        assert_eq!(catalog.friend_activity().count(), 3);
    }

    #[test]
    fn test_lookup_and_rating() {
        let catalog = Catalog::builtin().unwrap();
        let featured = catalog.experience("10").unwrap();
        assert_eq!(featured.title, "Downtown Life");
        assert_eq!(featured.genre, Genre::Roleplay);
        assert!(catalog.experience("missing").is_none());

        let avg = catalog.average_rating().unwrap();
        assert!((avg - 4.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_unknown_news_category_maps_to_news() {
        let data = r#"
[[news]]
id = "n9"
title = "Patch notes"
category = "Patchnotes"
summary = "Fixes"
image_url = "x"
"#;
        let catalog = Catalog::from_toml_str(data).unwrap();
        assert_eq!(catalog.news()[0].category, NewsCategory::News);
    }

    #[test]
    fn test_dangling_activity_rejected() {
        let data = r#"
[[friend_activity]]
friend_name = "Ghost"
friend_avatar_url = "x"
experience_id = "404"
"#;
        let err = Catalog::from_toml_str(data).unwrap_err();
        assert!(matches!(err, CatalogError::DanglingReference { .. }));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let data = r#"
[[avatar_items]]
id = "a"
name = "One"
model_url = "x"
category = "Hats"

[[avatar_items]]
id = "a"
name = "Two"
model_url = "y"
category = "Pants"
"#;
        let err = Catalog::from_toml_str(data).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateId { kind: "avatar item", .. }));
    }

    #[test]
    fn test_offline_friend_not_joinable() {
        let catalog = Catalog::builtin().unwrap();
        let starlight = catalog.friends().iter().find(|f| f.name == "Starlight").unwrap();
        assert_eq!(starlight.joinable_game().map(|g| g.id.as_str()), Some("1"));
        let raptor = catalog.friends().iter().find(|f| f.name == "Raptor").unwrap();
        assert!(raptor.joinable_game().is_none());
    }
}

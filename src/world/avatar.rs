use tracing::debug;

use crate::catalog::{AvatarCategory, AvatarItem};

/// Items currently worn, in the order they were put on.
///
/// Every category holds at most one item except `Accessories`, which
/// stacks. Toggling an equipped item takes it off.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outfit {
    items: Vec<AvatarItem>,
}

impl Outfit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Equip `item`, or unequip it if it is already worn.
    /// Returns true when the item ends up equipped.
    pub fn toggle(&mut self, item: &AvatarItem) -> bool {
        if self.is_equipped(&item.id) {
            self.items.retain(|i| i.id != item.id);
            debug!("Unequipped {} ({})", item.name, item.category);
            return false;
        }

        if !item.category.allows_multiple() {
            self.items.retain(|i| i.category != item.category);
        }
        self.items.push(item.clone());
        debug!("Equipped {} ({})", item.name, item.category);
        true
    }

    pub fn reset(&mut self) {
        self.items.clear();
    }

    pub fn is_equipped(&self, id: &str) -> bool {
        self.items.iter().any(|i| i.id == id)
    }

    pub fn items(&self) -> &[AvatarItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn in_category(&self, category: AvatarCategory) -> impl Iterator<Item = &AvatarItem> {
        self.items.iter().filter(move |i| i.category == category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, category: AvatarCategory) -> AvatarItem {
        AvatarItem::new(id, id, format!("/models/{}.glb", id), category)
    }

    #[test]
    fn test_same_category_replaces() {
        let mut outfit = Outfit::new();
        outfit.toggle(&item("cap", AvatarCategory::Hats));
        outfit.toggle(&item("tee", AvatarCategory::Shirts));
        outfit.toggle(&item("crown", AvatarCategory::Hats));

        let ids: Vec<_> = outfit.items().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["tee", "crown"]);
    }

    #[test]
    fn test_accessories_stack() {
        let mut outfit = Outfit::new();
        outfit.toggle(&item("watch", AvatarCategory::Accessories));
        outfit.toggle(&item("scarf", AvatarCategory::Accessories));
        assert_eq!(outfit.in_category(AvatarCategory::Accessories).count(), 2);
    }

    #[test]
    fn test_toggle_twice_unequips() {
        let mut outfit = Outfit::new();
        let jeans = item("jeans", AvatarCategory::Pants);
        assert!(outfit.toggle(&jeans));
        assert!(!outfit.toggle(&jeans));
        assert!(outfit.is_empty());
    }

    #[test]
    fn test_reset_clears() {
        let mut outfit = Outfit::new();
        outfit.toggle(&item("cap", AvatarCategory::Hats));
        outfit.reset();
        assert_eq!(outfit.len(), 0);
        assert!(!outfit.is_equipped("cap"));
    }
}

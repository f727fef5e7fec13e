/// The noun phrases used to mention an item in a description
use crate::context::{InventoryItem, Prefab, RoomItem};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Item {
    pub name: String,
    pub plural_name: String,
    pub quantity: u32,
    /// Phrase for exactly one unit, e.g. "a bottle of LAXATIVES"
    pub single_containing_phrase: String,
    /// Phrase for several units without the count, e.g. "bottles of LAXATIVES"
    pub plural_containing_phrase: String,
}

impl Item {
    pub fn new(
        name: impl Into<String>,
        single_containing_phrase: impl Into<String>,
        plural_containing_phrase: impl Into<String>,
    ) -> Self {
        let plural_containing_phrase = plural_containing_phrase.into();
        Item {
            name: name.into(),
            plural_name: plural_containing_phrase.clone(),
            quantity: 1,
            single_containing_phrase: single_containing_phrase.into(),
            plural_containing_phrase,
        }
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    /// Phrase describing `quantity` units of this item
    pub fn phrase_for(&self, quantity: u32) -> String {
        if quantity == 1 {
            self.single_containing_phrase.clone()
        } else {
            format!("{} {}", quantity, self.plural_containing_phrase)
        }
    }

    /// Whether a clause mentions this item: it is the single phrase,
    /// or it contains the plural phrase (ignoring case)
    pub fn matches(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        if text == self.single_containing_phrase.to_lowercase() {
            return true;
        }
        !self.plural_containing_phrase.is_empty()
            && text.contains(&self.plural_containing_phrase.to_lowercase())
    }
}

impl From<&RoomItem> for Item {
    fn from(item: &RoomItem) -> Self {
        Item {
            name: item.name.clone(),
            plural_name: item.plural_name.clone(),
            quantity: item.quantity,
            single_containing_phrase: item.single_containing_phrase.clone(),
            plural_containing_phrase: item.plural_containing_phrase.clone(),
        }
    }
}

impl From<&InventoryItem> for Item {
    fn from(item: &InventoryItem) -> Self {
        Item {
            name: item.name.clone(),
            plural_name: item.plural_name.clone(),
            quantity: item.quantity,
            single_containing_phrase: item.single_containing_phrase.clone(),
            plural_containing_phrase: item.plural_containing_phrase.clone(),
        }
    }
}

impl From<&Prefab> for Item {
    fn from(prefab: &Prefab) -> Self {
        Item {
            name: prefab.name.clone(),
            plural_name: prefab.plural_name.clone(),
            quantity: 1,
            single_containing_phrase: prefab.single_containing_phrase.clone(),
            plural_containing_phrase: prefab.plural_containing_phrase.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn laxatives() -> Item {
        Item::new("LAXATIVES", "a bottle of LAXATIVES", "bottles of LAXATIVES")
    }

    #[test]
    fn test_phrase_for() {
        assert_eq!(laxatives().phrase_for(1), "a bottle of LAXATIVES");
        assert_eq!(laxatives().phrase_for(3), "3 bottles of LAXATIVES");
    }

    #[test]
    fn test_matches() {
        let item = laxatives();
        assert!(item.matches("A bottle of laxatives"));
        assert!(item.matches("4 bottles of LAXATIVES"));
        assert!(!item.matches("a bottle of PAINKILLERS"));

        let no_plural = Item::new("KEY", "a KEY", "");
        assert!(no_plural.matches("a key"));
        assert!(!no_plural.matches("a keyboard"));
    }

    #[test]
    fn test_from_prefab() {
        let prefab = Prefab {
            id: "LAXATIVES".to_string(),
            name: "LAXATIVES".to_string(),
            single_containing_phrase: "a bottle of LAXATIVES".to_string(),
            plural_containing_phrase: "bottles of LAXATIVES".to_string(),
            ..Default::default()
        };
        let item = Item::from(&prefab);
        assert_eq!(item.quantity, 1);
        assert_eq!(item.phrase_for(2), "2 bottles of LAXATIVES");
    }
}

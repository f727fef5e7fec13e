//! Read-only game state that description expressions are evaluated against
//!
//! The engine never mutates any of this. Everything deserializes from camelCase
//! JSON so a snapshot can be handed over by whatever owns the game.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Room {
    pub name: String,
    pub accessible: bool,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Object {
    pub name: String,
    pub location: String,
    pub accessible: bool,
    pub preposition: String,
    pub description: String,
}

/// What a room item is sitting in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "name", rename_all = "camelCase")]
pub enum Container {
    Object(String),
    Puzzle(String),
    Item(String),
    HidingSpot(String),
}

impl Container {
    pub fn name(&self) -> &str {
        match self {
            Container::Object(name)
            | Container::Puzzle(name)
            | Container::Item(name)
            | Container::HidingSpot(name) => name,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoomItem {
    pub name: String,
    pub plural_name: String,
    pub location: String,
    pub accessible: bool,
    pub container: Option<Container>,
    /// Item list inside the container's description this item is listed in
    pub slot: String,
    pub quantity: u32,
    pub single_containing_phrase: String,
    pub plural_containing_phrase: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Puzzle {
    pub name: String,
    pub location: String,
    pub solved: bool,
    pub accessible: bool,
    pub outcome: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Player {
    pub name: String,
    pub display_name: String,
    pub talent: String,
    pub clue_level: u32,
    pub alive: bool,
    pub location: String,
    pub hiding_spot: String,
    /// Names of the status effects currently inflicted
    pub status: Vec<String>,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InventoryItem {
    pub player: String,
    pub name: String,
    pub plural_name: String,
    pub equipment_slot: String,
    pub container_name: String,
    pub quantity: u32,
    pub single_containing_phrase: String,
    pub plural_containing_phrase: String,
    pub description: String,
}

/// Template that room and inventory items are instantiated from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Prefab {
    pub id: String,
    pub name: String,
    pub plural_name: String,
    pub single_containing_phrase: String,
    pub plural_containing_phrase: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatusEffect {
    pub name: String,
    pub attributes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Event {
    pub name: String,
    pub ongoing: bool,
}

/// Snapshot of the game world
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameContext {
    pub rooms: Vec<Room>,
    pub objects: Vec<Object>,
    pub items: Vec<RoomItem>,
    pub prefabs: Vec<Prefab>,
    pub puzzles: Vec<Puzzle>,
    pub players: Vec<Player>,
    pub inventory_items: Vec<InventoryItem>,
    pub status_effects: Vec<StatusEffect>,
    pub events: Vec<Event>,
}

fn same(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

fn optional_matches(filter: Option<&str>, value: &str) -> bool {
    filter.map_or(true, |wanted| same(wanted, value))
}

impl GameContext {
    pub fn find_prefab(&self, id: &str) -> Option<&Prefab> {
        self.prefabs.iter().find(|prefab| same(&prefab.id, id))
    }

    pub fn find_room(&self, name: &str) -> Option<&Room> {
        self.rooms.iter().find(|room| same(&room.name, name))
    }

    pub fn find_object(&self, name: &str, location: Option<&str>) -> Option<&Object> {
        self.objects
            .iter()
            .find(|object| same(&object.name, name) && optional_matches(location, &object.location))
    }

    pub fn find_item(
        &self,
        name: &str,
        location: Option<&str>,
        container_name: Option<&str>,
    ) -> Option<&RoomItem> {
        self.items.iter().find(|item| {
            same(&item.name, name)
                && optional_matches(location, &item.location)
                && container_name.map_or(true, |wanted| {
                    item.container
                        .as_ref()
                        .is_some_and(|container| same(container.name(), wanted))
                })
        })
    }

    pub fn find_puzzle(&self, name: &str, location: Option<&str>) -> Option<&Puzzle> {
        self.puzzles
            .iter()
            .find(|puzzle| same(&puzzle.name, name) && optional_matches(location, &puzzle.location))
    }

    pub fn find_event(&self, name: &str) -> Option<&Event> {
        self.events.iter().find(|event| same(&event.name, name))
    }

    pub fn find_status_effect(&self, name: &str) -> Option<&StatusEffect> {
        self.status_effects
            .iter()
            .find(|status| same(&status.name, name))
    }

    pub fn find_player(&self, name: &str) -> Option<&Player> {
        self.players.iter().find(|player| same(&player.name, name))
    }

    pub fn find_living_player(&self, name: &str) -> Option<&Player> {
        self.find_player(name).filter(|player| player.alive)
    }

    pub fn find_dead_player(&self, name: &str) -> Option<&Player> {
        self.find_player(name).filter(|player| !player.alive)
    }

    pub fn find_inventory_item(
        &self,
        name: &str,
        player: Option<&str>,
        container_name: Option<&str>,
        equipment_slot: Option<&str>,
    ) -> Option<&InventoryItem> {
        self.inventory_items.iter().find(|item| {
            same(&item.name, name)
                && optional_matches(player, &item.player)
                && optional_matches(container_name, &item.container_name)
                && optional_matches(equipment_slot, &item.equipment_slot)
        })
    }

    pub fn inventory_of<'a>(&'a self, player: &'a Player) -> impl Iterator<Item = &'a InventoryItem> {
        self.inventory_items
            .iter()
            .filter(move |item| same(&item.player, &player.name))
    }
}

/// A borrowed handle to anything an expression can refer to
#[derive(Debug, Clone, Copy)]
pub enum Entity<'a> {
    Room(&'a Room),
    Object(&'a Object),
    Item(&'a RoomItem),
    Prefab(&'a Prefab),
    Puzzle(&'a Puzzle),
    Player(&'a Player),
    InventoryItem(&'a InventoryItem),
    StatusEffect(&'a StatusEffect),
    Event(&'a Event),
    Game(&'a GameContext),
}

impl<'a> Entity<'a> {
    pub fn kind(&self) -> &'static str {
        match self {
            Entity::Room(_) => "Room",
            Entity::Object(_) => "Object",
            Entity::Item(_) => "Item",
            Entity::Prefab(_) => "Prefab",
            Entity::Puzzle(_) => "Puzzle",
            Entity::Player(_) => "Player",
            Entity::InventoryItem(_) => "InventoryItem",
            Entity::StatusEffect(_) => "Status",
            Entity::Event(_) => "Event",
            Entity::Game(_) => "Game",
        }
    }

    pub fn name(&self) -> &'a str {
        match *self {
            Entity::Room(room) => &room.name,
            Entity::Object(object) => &object.name,
            Entity::Item(item) => &item.name,
            Entity::Prefab(prefab) => &prefab.name,
            Entity::Puzzle(puzzle) => &puzzle.name,
            Entity::Player(player) => &player.name,
            Entity::InventoryItem(item) => &item.name,
            Entity::StatusEffect(status) => &status.name,
            Entity::Event(event) => &event.name,
            Entity::Game(_) => "game",
        }
    }

    /// Identity comparison: the same record in the same snapshot
    pub fn same_as(&self, other: &Entity<'_>) -> bool {
        use std::ptr;
        match (self, other) {
            (Entity::Room(a), Entity::Room(b)) => ptr::eq(*a, *b),
            (Entity::Object(a), Entity::Object(b)) => ptr::eq(*a, *b),
            (Entity::Item(a), Entity::Item(b)) => ptr::eq(*a, *b),
            (Entity::Prefab(a), Entity::Prefab(b)) => ptr::eq(*a, *b),
            (Entity::Puzzle(a), Entity::Puzzle(b)) => ptr::eq(*a, *b),
            (Entity::Player(a), Entity::Player(b)) => ptr::eq(*a, *b),
            (Entity::InventoryItem(a), Entity::InventoryItem(b)) => ptr::eq(*a, *b),
            (Entity::StatusEffect(a), Entity::StatusEffect(b)) => ptr::eq(*a, *b),
            (Entity::Event(a), Entity::Event(b)) => ptr::eq(*a, *b),
            (Entity::Game(a), Entity::Game(b)) => ptr::eq(*a, *b),
            _ => false,
        }
    }
}

/// Bindings visible to one description: the game snapshot, the entity the
/// description belongs to (`this` / `container`) and the acting player
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    pub context: &'a GameContext,
    pub receiver: Option<Entity<'a>>,
    pub player: Option<&'a Player>,
}

impl<'a> Scope<'a> {
    pub fn new(context: &'a GameContext) -> Self {
        Scope {
            context,
            receiver: None,
            player: None,
        }
    }

    pub fn with_receiver(mut self, receiver: Entity<'a>) -> Self {
        self.receiver = Some(receiver);
        self
    }

    pub fn with_player(mut self, player: &'a Player) -> Self {
        self.player = Some(player);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> GameContext {
        serde_json::from_str(
            r#"{
                "rooms": [{"name": "kitchen", "accessible": true}],
                "objects": [{"name": "SHELVES", "location": "kitchen", "accessible": true}],
                "items": [{
                    "name": "LAXATIVES",
                    "location": "kitchen",
                    "container": {"type": "object", "name": "SHELVES"},
                    "quantity": 2,
                    "singleContainingPhrase": "a bottle of LAXATIVES",
                    "pluralContainingPhrase": "bottles of LAXATIVES"
                }],
                "players": [
                    {"name": "Kyra", "alive": true, "location": "kitchen"},
                    {"name": "Vivian", "alive": false}
                ],
                "inventoryItems": [{"player": "Kyra", "name": "KNIFE", "equipmentSlot": "RIGHT HAND"}]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_deserialize_and_find() {
        let game = context();
        assert!(game.find_room("KITCHEN").is_some());
        assert!(game.find_object("shelves", Some("kitchen")).is_some());
        assert!(game.find_object("shelves", Some("bathroom")).is_none());

        let item = game.find_item("laxatives", None, Some("shelves")).unwrap();
        assert_eq!(item.container, Some(Container::Object("SHELVES".to_string())));
        assert_eq!(item.quantity, 2);

        assert!(game.find_living_player("kyra").is_some());
        assert!(game.find_living_player("vivian").is_none());
        assert!(game.find_dead_player("vivian").is_some());
        assert!(game
            .find_inventory_item("knife", Some("Kyra"), None, Some("right hand"))
            .is_some());
    }

    #[test]
    fn test_entity_identity() {
        let game = context();
        let a = Entity::Room(&game.rooms[0]);
        let b = Entity::Room(game.find_room("kitchen").unwrap());
        assert!(a.same_as(&b));
        assert!(!a.same_as(&Entity::Game(&game)));
        assert_eq!(a.name(), "kitchen");
    }
}

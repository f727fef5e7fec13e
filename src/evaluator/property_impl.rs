//! Property and index access on values
//!
//! Unknown properties read as null, like missing fields on a plain object.
//! Reading any property of null is an error.

use crate::context::{Container, Entity, GameContext, RoomItem};

use super::{EvalError, Evaluator, Value};

impl<'a> Evaluator<'a> {
    pub(super) fn get_property(&self, base: &Value<'a>, name: &str) -> Result<Value<'a>, EvalError> {
        match base {
            Value::Null => Err(EvalError::NullProperty {
                property: name.to_string(),
            }),
            Value::Text(text) => Ok(match name {
                "length" => Value::Number(text.chars().count() as f64),
                _ => Value::Null,
            }),
            Value::List(items) => Ok(match name {
                "length" => Value::Number(items.len() as f64),
                _ => Value::Null,
            }),
            Value::Bool(_) | Value::Number(_) => Ok(Value::Null),
            Value::Entity(entity) => Ok(self.entity_property(*entity, name)),
        }
    }

    pub(super) fn get_index(&self, base: &Value<'a>, index: &Value<'a>) -> Result<Value<'a>, EvalError> {
        match (base, index) {
            (Value::Null, _) => Err(EvalError::NullProperty {
                property: self.display(index),
            }),
            (Value::List(items), Value::Number(n)) => Ok(usize_index(*n)
                .and_then(|i| items.get(i).cloned())
                .unwrap_or(Value::Null)),
            (Value::Text(text), Value::Number(n)) => Ok(usize_index(*n)
                .and_then(|i| text.chars().nth(i))
                .map(|c| Value::Text(c.to_string()))
                .unwrap_or(Value::Null)),
            (_, Value::Text(key)) => self.get_property(base, key),
            _ => Ok(Value::Null),
        }
    }

    fn entity_property(&self, entity: Entity<'a>, name: &str) -> Value<'a> {
        let game = self.scope.context;
        match entity {
            Entity::Room(room) => match name {
                "name" => room.name.as_str().into(),
                "accessible" => room.accessible.into(),
                "description" => room.description.as_str().into(),
                "objects" => Value::List(
                    game.objects
                        .iter()
                        .filter(|object| object.location.eq_ignore_ascii_case(&room.name))
                        .map(|object| Value::Entity(Entity::Object(object)))
                        .collect(),
                ),
                "occupants" => Value::List(
                    game.players
                        .iter()
                        .filter(|player| player.alive && player.location.eq_ignore_ascii_case(&room.name))
                        .map(|player| Value::Entity(Entity::Player(player)))
                        .collect(),
                ),
                _ => Value::Null,
            },
            Entity::Object(object) => match name {
                "name" => object.name.as_str().into(),
                "location" => location(game, &object.location),
                "accessible" => object.accessible.into(),
                "preposition" => object.preposition.as_str().into(),
                "description" => object.description.as_str().into(),
                _ => Value::Null,
            },
            Entity::Item(item) => match name {
                "name" => item.name.as_str().into(),
                "pluralName" => item.plural_name.as_str().into(),
                "location" => location(game, &item.location),
                "accessible" => item.accessible.into(),
                "container" => item_container(game, item),
                "containerName" => item
                    .container
                    .as_ref()
                    .map_or(Value::Null, |container| container.name().into()),
                "slot" => item.slot.as_str().into(),
                "quantity" => item.quantity.into(),
                "singleContainingPhrase" => item.single_containing_phrase.as_str().into(),
                "pluralContainingPhrase" => item.plural_containing_phrase.as_str().into(),
                "description" => item.description.as_str().into(),
                _ => Value::Null,
            },
            Entity::Prefab(prefab) => match name {
                "id" => prefab.id.as_str().into(),
                "name" => prefab.name.as_str().into(),
                "pluralName" => prefab.plural_name.as_str().into(),
                "singleContainingPhrase" => prefab.single_containing_phrase.as_str().into(),
                "pluralContainingPhrase" => prefab.plural_containing_phrase.as_str().into(),
                "description" => prefab.description.as_str().into(),
                _ => Value::Null,
            },
            Entity::Puzzle(puzzle) => match name {
                "name" => puzzle.name.as_str().into(),
                "location" => location(game, &puzzle.location),
                "solved" => puzzle.solved.into(),
                "accessible" => puzzle.accessible.into(),
                "outcome" => puzzle.outcome.as_str().into(),
                _ => Value::Null,
            },
            Entity::Player(player) => match name {
                "name" => player.name.as_str().into(),
                "displayName" => player.display_name.as_str().into(),
                "talent" => player.talent.as_str().into(),
                "clueLevel" => player.clue_level.into(),
                "alive" => player.alive.into(),
                "location" => location(game, &player.location),
                "hidingSpot" => player.hiding_spot.as_str().into(),
                "status" => Value::List(
                    player
                        .status
                        .iter()
                        .map(|status| status.as_str().into())
                        .collect(),
                ),
                "inventory" => Value::List(
                    game.inventory_of(player)
                        .map(|item| Value::Entity(Entity::InventoryItem(item)))
                        .collect(),
                ),
                "description" => player.description.as_str().into(),
                _ => Value::Null,
            },
            Entity::InventoryItem(item) => match name {
                "name" => item.name.as_str().into(),
                "pluralName" => item.plural_name.as_str().into(),
                "player" => game.find_player(&item.player).map(Entity::Player).into(),
                "equipmentSlot" => item.equipment_slot.as_str().into(),
                "containerName" => item.container_name.as_str().into(),
                "quantity" => item.quantity.into(),
                "singleContainingPhrase" => item.single_containing_phrase.as_str().into(),
                "pluralContainingPhrase" => item.plural_containing_phrase.as_str().into(),
                "description" => item.description.as_str().into(),
                _ => Value::Null,
            },
            Entity::StatusEffect(status) => match name {
                "name" => status.name.as_str().into(),
                "attributes" => Value::List(
                    status
                        .attributes
                        .iter()
                        .map(|attr| attr.as_str().into())
                        .collect(),
                ),
                _ => Value::Null,
            },
            Entity::Event(event) => match name {
                "name" => event.name.as_str().into(),
                "ongoing" => event.ongoing.into(),
                _ => Value::Null,
            },
            Entity::Game(game) => match name {
                "rooms" => entity_list(game.rooms.iter().map(Entity::Room)),
                "objects" => entity_list(game.objects.iter().map(Entity::Object)),
                "items" => entity_list(game.items.iter().map(Entity::Item)),
                "prefabs" => entity_list(game.prefabs.iter().map(Entity::Prefab)),
                "puzzles" => entity_list(game.puzzles.iter().map(Entity::Puzzle)),
                "players" => entity_list(game.players.iter().map(Entity::Player)),
                "inventoryItems" => entity_list(game.inventory_items.iter().map(Entity::InventoryItem)),
                "statusEffects" => entity_list(game.status_effects.iter().map(Entity::StatusEffect)),
                "events" => entity_list(game.events.iter().map(Entity::Event)),
                _ => Value::Null,
            },
        }
    }
}

/// A location resolves to its room when the room exists, otherwise to its name
fn location<'a>(game: &'a GameContext, name: &str) -> Value<'a> {
    match game.find_room(name) {
        Some(room) => Value::Entity(Entity::Room(room)),
        None if name.is_empty() => Value::Null,
        None => name.into(),
    }
}

fn item_container<'a>(game: &'a GameContext, item: &'a RoomItem) -> Value<'a> {
    let location = Some(item.location.as_str()).filter(|l| !l.is_empty());
    match &item.container {
        None => Value::Null,
        Some(Container::Object(name)) => game.find_object(name, location).map(Entity::Object).into(),
        Some(Container::Puzzle(name)) => game.find_puzzle(name, location).map(Entity::Puzzle).into(),
        Some(Container::Item(name)) => game.find_item(name, location, None).map(Entity::Item).into(),
        Some(Container::HidingSpot(name)) => name.as_str().into(),
    }
}

fn entity_list<'a>(entities: impl Iterator<Item = Entity<'a>>) -> Value<'a> {
    Value::List(entities.map(Value::Entity).collect())
}

fn usize_index(n: f64) -> Option<usize> {
    (n >= 0.0 && n.fract() == 0.0).then_some(n as usize)
}

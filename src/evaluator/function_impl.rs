//! Whitelisted lookup functions and value methods
//!
//! This is the only call surface an expression has. Every function here is a
//! read-only lookup against the game snapshot.

use crate::context::Entity;

use super::{EvalError, Evaluator, Value};

impl<'a> Evaluator<'a> {
    pub(super) fn call_function(&self, name: &str, args: &[Value<'a>]) -> Result<Value<'a>, EvalError> {
        let game = self.scope.context;
        let text = |i: usize| -> Option<String> {
            args.get(i)
                .filter(|value| !value.is_null())
                .map(|value| self.display(value))
        };
        let required = text(0).unwrap_or_default();

        let found: Option<Entity<'a>> = match name {
            "findRoom" => game.find_room(&required).map(Entity::Room),
            "findObject" => game
                .find_object(&required, text(1).as_deref())
                .map(Entity::Object),
            "findPrefab" => game.find_prefab(&required).map(Entity::Prefab),
            "findItem" => game
                .find_item(&required, text(1).as_deref(), text(2).as_deref())
                .map(Entity::Item),
            "findPuzzle" => game
                .find_puzzle(&required, text(1).as_deref())
                .map(Entity::Puzzle),
            "findEvent" => game.find_event(&required).map(Entity::Event),
            "findStatusEffect" => game
                .find_status_effect(&required)
                .map(Entity::StatusEffect),
            "findPlayer" => game.find_player(&required).map(Entity::Player),
            "findLivingPlayer" => game.find_living_player(&required).map(Entity::Player),
            "findDeadPlayer" => game.find_dead_player(&required).map(Entity::Player),
            "findInventoryItem" => game
                .find_inventory_item(
                    &required,
                    text(1).as_deref(),
                    text(2).as_deref(),
                    text(3).as_deref(),
                )
                .map(Entity::InventoryItem),
            _ => {
                return Err(EvalError::UnknownFunction {
                    name: name.to_string(),
                })
            }
        };
        Ok(found.into())
    }

    pub(super) fn call_method(
        &self,
        base: &Value<'a>,
        method: &str,
        args: &[Value<'a>],
    ) -> Result<Value<'a>, EvalError> {
        let arg = |i: usize| args.get(i).cloned().unwrap_or(Value::Null);

        match (base, method) {
            (Value::Null, _) => Err(EvalError::NullProperty {
                property: method.to_string(),
            }),
            (Value::Text(text), "includes") => {
                Ok(Value::Bool(text.contains(self.display(&arg(0)).as_str())))
            }
            (Value::Text(text), "startsWith") => {
                Ok(Value::Bool(text.starts_with(self.display(&arg(0)).as_str())))
            }
            (Value::Text(text), "endsWith") => {
                Ok(Value::Bool(text.ends_with(self.display(&arg(0)).as_str())))
            }
            (Value::Text(text), "toLowerCase") => Ok(Value::Text(text.to_lowercase())),
            (Value::Text(text), "toUpperCase") => Ok(Value::Text(text.to_uppercase())),
            (Value::Text(text), "trim") => Ok(Value::Text(text.trim().to_string())),
            (Value::List(items), "includes") => {
                let needle = arg(0);
                Ok(Value::Bool(
                    items.iter().any(|item| self.strict_equals(item, &needle)),
                ))
            }
            (Value::List(items), "join") => {
                let separator = match arg(0) {
                    Value::Null => ",".to_string(),
                    other => self.display(&other),
                };
                Ok(Value::Text(
                    items
                        .iter()
                        .map(|item| self.display(item))
                        .collect::<Vec<_>>()
                        .join(&separator),
                ))
            }
            (Value::Entity(Entity::Player(player)), "hasAttribute") => {
                let wanted = self.display(&arg(0));
                let game = self.scope.context;
                let has = player.status.iter().any(|status| {
                    game.find_status_effect(status).is_some_and(|effect| {
                        effect
                            .attributes
                            .iter()
                            .any(|attr| attr.eq_ignore_ascii_case(&wanted))
                    })
                });
                Ok(Value::Bool(has))
            }
            (Value::Entity(Entity::Player(player)), "hasItem") => {
                let wanted = self.display(&arg(0));
                let has = self
                    .scope
                    .context
                    .inventory_of(player)
                    .any(|item| item.name.eq_ignore_ascii_case(&wanted));
                Ok(Value::Bool(has))
            }
            (Value::Entity(Entity::StatusEffect(status)), "hasAttribute") => {
                let wanted = self.display(&arg(0));
                Ok(Value::Bool(
                    status
                        .attributes
                        .iter()
                        .any(|attr| attr.eq_ignore_ascii_case(&wanted)),
                ))
            }
            _ => Err(EvalError::UnknownMethod {
                receiver: base.type_name().to_string(),
                method: method.to_string(),
            }),
        }
    }
}

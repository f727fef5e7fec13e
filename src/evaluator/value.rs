use crate::context::Entity;

/// Result of evaluating an expression. Entities are borrowed from the game
/// snapshot, so values never outlive it.
#[derive(Debug, Clone)]
pub enum Value<'a> {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Entity(Entity<'a>),
    List(Vec<Value<'a>>),
}

impl<'a> Value<'a> {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Text(_) => "string",
            Value::Entity(entity) => entity.kind(),
            Value::List(_) => "array",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl<'a> From<bool> for Value<'a> {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl<'a> From<&str> for Value<'a> {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl<'a> From<u32> for Value<'a> {
    fn from(value: u32) -> Self {
        Value::Number(f64::from(value))
    }
}

impl<'a> From<Option<Entity<'a>>> for Value<'a> {
    fn from(value: Option<Entity<'a>>) -> Self {
        value.map_or(Value::Null, Value::Entity)
    }
}

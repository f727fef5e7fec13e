/// Evaluator module - sandboxed evaluation of `cond` and `v` expressions
///
/// Expressions can read the game snapshot and call a fixed set of lookup
/// functions. Nothing reachable from an expression can mutate state.
// Sub-modules
mod error;
mod value;

// Implementation modules
mod expression_impl;
mod function_impl;
mod helpers_impl;
mod property_impl;

// Public exports
pub use error::EvalError;
pub use helpers_impl::format_number;
pub use value::Value;

use crate::ast::Expression;
use crate::context::Scope;
use crate::parser::parse_expression;

/// Evaluates expressions against one description's bindings
pub struct Evaluator<'a> {
    pub(super) scope: Scope<'a>,
}

impl<'a> Evaluator<'a> {
    pub fn new(scope: Scope<'a>) -> Self {
        Evaluator { scope }
    }

    /// Parse and evaluate expression source
    pub fn evaluate_source(&self, source: &str) -> Result<Value<'a>, EvalError> {
        let expression = parse_expression(source)?;
        self.evaluate(&expression)
    }

    /// Evaluate a condition with JavaScript-like truthiness
    pub fn evaluate_condition(&self, source: &str) -> Result<bool, EvalError> {
        let value = self.evaluate_source(source)?;
        Ok(self.is_truthy(&value))
    }

    pub fn evaluate(&self, expression: &Expression) -> Result<Value<'a>, EvalError> {
        self.evaluate_expression(expression)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Entity, GameContext, Object, Player, Puzzle, Room, StatusEffect};

    fn game() -> GameContext {
        GameContext {
            rooms: vec![Room {
                name: "kitchen".to_string(),
                accessible: true,
                ..Default::default()
            }],
            objects: vec![Object {
                name: "FRIDGE".to_string(),
                location: "kitchen".to_string(),
                accessible: false,
                ..Default::default()
            }],
            puzzles: vec![Puzzle {
                name: "SAFE".to_string(),
                location: "kitchen".to_string(),
                solved: true,
                outcome: "open".to_string(),
                ..Default::default()
            }],
            players: vec![Player {
                name: "Kyra".to_string(),
                alive: true,
                location: "kitchen".to_string(),
                status: vec!["concealed".to_string()],
                ..Default::default()
            }],
            status_effects: vec![StatusEffect {
                name: "concealed".to_string(),
                attributes: vec!["hidden".to_string()],
            }],
            ..Default::default()
        }
    }

    fn display(evaluator: &Evaluator, source: &str) -> String {
        let value = evaluator.evaluate_source(source).unwrap();
        evaluator.display(&value)
    }

    #[test]
    fn test_receiver_properties() {
        let game = game();
        let scope = Scope::new(&game).with_receiver(Entity::Object(&game.objects[0]));
        let evaluator = Evaluator::new(scope);
        assert!(!evaluator.evaluate_condition("this.accessible").unwrap());
        assert!(evaluator.evaluate_condition("!container.accessible").unwrap());
        assert_eq!(display(&evaluator, "this.location.name"), "kitchen");
    }

    #[test]
    fn test_finders_and_comparisons() {
        let game = game();
        let evaluator = Evaluator::new(Scope::new(&game));
        assert!(evaluator
            .evaluate_condition("findPuzzle('safe').solved && findPuzzle('SAFE').outcome === 'open'")
            .unwrap());
        assert!(evaluator
            .evaluate_condition("findPlayer('nobody') === null")
            .unwrap());
        assert!(evaluator.evaluate_condition("1 + 2 == '3'").unwrap());
        assert!(!evaluator.evaluate_condition("1 + 2 === '3'").unwrap());
        assert_eq!(display(&evaluator, "'Room: ' + findRoom('kitchen').name"), "Room: kitchen");
        assert_eq!(display(&evaluator, "10 / 4"), "2.5");
    }

    #[test]
    fn test_player_binding() {
        let game = game();
        let scope = Scope::new(&game).with_player(&game.players[0]);
        let evaluator = Evaluator::new(scope);
        assert!(evaluator.evaluate_condition("player.hasAttribute('hidden')").unwrap());
        assert!(evaluator.evaluate_condition("player.status.includes('concealed')").unwrap());
        assert_eq!(display(&evaluator, "player.alive ? 'alive' : 'dead'"), "alive");
    }

    #[test]
    fn test_errors() {
        let game = game();
        let evaluator = Evaluator::new(Scope::new(&game));
        assert_eq!(
            evaluator.evaluate_source("missing.name").unwrap_err().to_string(),
            "ReferenceError: missing is not defined"
        );
        assert_eq!(
            evaluator
                .evaluate_source("findRoom('attic').name")
                .unwrap_err()
                .to_string(),
            "TypeError: Cannot read properties of null (reading 'name')"
        );
        assert!(matches!(
            evaluator.evaluate_source("eval('1')"),
            Err(EvalError::UnknownFunction { .. })
        ));
        assert!(matches!(
            evaluator.evaluate_source("this.name = 'x'"),
            Err(EvalError::Syntax(_))
        ));
    }
}

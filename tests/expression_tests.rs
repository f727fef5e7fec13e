use description_engine::ast::Expression;
use description_engine::evaluator::Evaluator;
use description_engine::parser::parse_expression;
use description_engine::{Entity, EvalError, GameContext, Scope};

fn game() -> GameContext {
    serde_json::from_value(serde_json::json!({
        "rooms": [
            { "name": "cellar", "accessible": false }
        ],
        "objects": [
            { "name": "SHELF", "location": "cellar", "accessible": true, "preposition": "on" }
        ],
        "items": [
            { "name": "JAR", "pluralName": "JARS", "location": "cellar", "accessible": true,
              "quantity": 3, "singleContainingPhrase": "a JAR", "pluralContainingPhrase": "JARS" }
        ],
        "prefabs": [
            { "id": "MASON JAR", "name": "JAR", "pluralName": "JARS",
              "singleContainingPhrase": "a mason JAR", "pluralContainingPhrase": "mason JARS" }
        ],
        "players": [
            { "name": "Oren", "alive": false, "location": "cellar" }
        ],
        "inventoryItems": [
            { "player": "Oren", "name": "LANTERN", "equipmentSlot": "LEFT HAND" }
        ],
        "events": [
            { "name": "FLOOD", "ongoing": true }
        ]
    }))
    .unwrap()
}

#[test]
fn test_parse_shapes() {
    assert!(matches!(
        parse_expression("this.location.name").unwrap(),
        Expression::Property(_, name) if name == "name"
    ));
    assert!(matches!(
        parse_expression("findRoom('cellar')").unwrap(),
        Expression::Call(name, args) if name == "findRoom" && args.len() == 1
    ));
    assert!(matches!(
        parse_expression("a ? b : c").unwrap(),
        Expression::Conditional(..)
    ));
}

#[test]
fn test_parse_errors() {
    assert!(parse_expression("").is_err());
    assert!(parse_expression("'open").is_err());
    assert!(parse_expression("this.").is_err());
    assert!(parse_expression("(1 + 2").is_err());
}

#[test]
fn test_lookups_are_case_insensitive() {
    let game = game();
    let evaluator = Evaluator::new(Scope::new(&game));
    assert!(!evaluator.evaluate_condition("findRoom('CELLAR').accessible").unwrap());
    assert!(evaluator.evaluate_condition("findObject('shelf', 'cellar').accessible").unwrap());
    assert!(evaluator.evaluate_condition("findEvent('flood').ongoing").unwrap());
    assert!(evaluator.evaluate_condition("findDeadPlayer('oren') !== null").unwrap());
    assert!(evaluator.evaluate_condition("findLivingPlayer('oren') === null").unwrap());
}

#[test]
fn test_item_properties() {
    let game = game();
    let evaluator = Evaluator::new(Scope::new(&game));
    let value = evaluator
        .evaluate_source("findItem('JAR').quantity * 2 + ' ' + findItem('JAR').pluralName")
        .unwrap();
    assert_eq!(evaluator.display(&value), "6 JARS");
}

#[test]
fn test_inventory_lookup() {
    let game = game();
    let scope = Scope::new(&game).with_player(&game.players[0]);
    let evaluator = Evaluator::new(scope);
    assert!(evaluator.evaluate_condition("player.hasItem('lantern')").unwrap());
    assert!(evaluator
        .evaluate_condition("findInventoryItem('LANTERN', 'Oren').equipmentSlot === 'LEFT HAND'")
        .unwrap());
    assert!(!evaluator.evaluate_condition("player.alive").unwrap());
}

#[test]
fn test_receiver_is_this_and_container() {
    let game = game();
    let scope = Scope::new(&game).with_receiver(Entity::Object(&game.objects[0]));
    let evaluator = Evaluator::new(scope);
    assert!(evaluator.evaluate_condition("this === container").unwrap());
    let value = evaluator.evaluate_source("this.preposition + ' the ' + this.name").unwrap();
    assert_eq!(evaluator.display(&value), "on the SHELF");
}

#[test]
fn test_short_circuit_skips_errors() {
    let game = game();
    let evaluator = Evaluator::new(Scope::new(&game));
    assert!(!evaluator.evaluate_condition("false && missing.name").unwrap());
    assert!(evaluator.evaluate_condition("true || missing.name").unwrap());
    assert!(matches!(
        evaluator.evaluate_source("true && missing.name"),
        Err(EvalError::UndefinedIdentifier { name }) if name == "missing"
    ));
}

#[test]
fn test_no_receiver_is_null() {
    let game = game();
    let evaluator = Evaluator::new(Scope::new(&game));
    assert!(evaluator.evaluate_condition("this === null").unwrap());
    assert_eq!(
        evaluator.evaluate_source("this.name").unwrap_err().to_string(),
        "TypeError: Cannot read properties of null (reading 'name')"
    );
}

#[test]
fn test_prefab_lookup_by_id() {
    let game = game();
    let evaluator = Evaluator::new(Scope::new(&game));
    let value = evaluator
        .evaluate_source("findPrefab('mason jar').singleContainingPhrase")
        .unwrap();
    assert_eq!(evaluator.display(&value), "a mason JAR");
    assert!(evaluator.evaluate_condition("findPrefab('JAR') === null").unwrap());
    assert!(evaluator.evaluate_condition("findItem('JAR') !== null").unwrap());
}

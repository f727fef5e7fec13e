use description_engine::{render_text, render_with_seed, Entity, GameContext, Rendered, Scope};

fn game() -> GameContext {
    serde_json::from_value(serde_json::json!({
        "rooms": [
            { "name": "kitchen", "accessible": true, "description": "<desc><s>It smells of bread.</s></desc>" }
        ],
        "objects": [
            { "name": "FRIDGE", "location": "kitchen", "accessible": false, "preposition": "in" }
        ],
        "players": [
            { "name": "Kyra", "alive": true, "location": "kitchen", "status": ["concealed"] }
        ],
        "statusEffects": [
            { "name": "concealed", "attributes": ["hidden"] }
        ]
    }))
    .unwrap()
}

fn render_fridge(markup: &str) -> Rendered {
    let game = game();
    let scope = Scope::new(&game).with_receiver(Entity::Object(&game.objects[0]));
    render_with_seed(markup, &scope, 42)
}

#[test]
fn test_conditionals_on_receiver() {
    let rendered = render_fridge(
        r#"<desc><s>The fridge is <if cond="this.accessible">open</if><if cond="!this.accessible">locked</if>.</s></desc>"#,
    );
    assert_eq!(rendered.text, "The fridge is locked.");
    assert!(rendered.errors.is_empty());
}

#[test]
fn test_container_alias() {
    let rendered = render_fridge(
        r#"<desc><s>You look <var v="container.preposition"/> the <var v="this.name"/>.</s></desc>"#,
    );
    assert_eq!(rendered.text, "You look in the FRIDGE.");
}

#[test]
fn test_false_conditional_item_rebalances_list() {
    let rendered = render_fridge(
        r#"<desc><s>Inside are <il><if cond="this.accessible"><item>a CAKE</item></if>, <item>a JUG of milk</item>, and <item>some EGGS</item></il>.</s></desc>"#,
    );
    assert_eq!(rendered.text, "Inside are a JUG of milk and some EGGS.");
}

#[test]
fn test_false_conditional_empties_sentence() {
    let rendered = render_fridge(
        r#"<desc><s>The fridge hums.</s> <s>Inside is <il><if cond="this.accessible"><item>a CAKE</item></if></il>.</s></desc>"#,
    );
    assert_eq!(rendered.text, "The fridge hums.");
}

#[test]
fn test_empty_list_sentence_is_dropped() {
    let rendered = render_fridge("<desc><s>The fridge hums.</s> <s>Inside is <il></il>.</s></desc>");
    assert_eq!(rendered.text, "The fridge hums.");
}

#[test]
fn test_failing_variable_does_not_abort_render() {
    let rendered = render_fridge(
        r#"<desc><s>The <var v="nothing.name"/> hums.</s> <s>It is cold.</s></desc>"#,
    );
    assert_eq!(rendered.text, "The hums. It is cold.");
    assert_eq!(rendered.errors.len(), 1);
    assert!(rendered.errors[0].contains("nothing is not defined"));
}

#[test]
fn test_undefined_variable_is_reported() {
    let rendered = render_fridge(r#"<desc><s>It is <var v="this.missing"/>.</s></desc>"#);
    assert_eq!(rendered.text, "It is .");
    assert_eq!(rendered.errors, vec![r#""this.missing" is undefined."#.to_string()]);
}

#[test]
fn test_failing_condition_counts_as_false() {
    let rendered = render_fridge(
        r#"<desc><s>The fridge is cold<if cond="this.">, and broken</if>.</s></desc>"#,
    );
    assert_eq!(rendered.text, "The fridge is cold.");
    assert_eq!(rendered.errors.len(), 1);
}

#[test]
fn test_nested_description_is_rendered() {
    let rendered = render_fridge(
        r#"<desc><s>You are in the kitchen.</s> <var v="findRoom('kitchen').description"/></desc>"#,
    );
    assert_eq!(rendered.text, "You are in the kitchen. It smells of bread.");
}

#[test]
fn test_player_binding() {
    let game = game();
    let scope = Scope::new(&game).with_player(&game.players[0]);
    let markup = r#"<desc><s>The room is dark.</s><if cond="player.hasAttribute('hidden')"> <s>Nobody can see you.</s></if></desc>"#;
    assert_eq!(render_text(markup, &scope), "The room is dark. Nobody can see you.");

    let visible = Scope::new(&game);
    let rendered = render_with_seed(markup, &visible, 1);
    assert_eq!(rendered.text, "The room is dark.");
    // `player` is not bound here
    assert_eq!(rendered.errors.len(), 1);
}

#[test]
fn test_line_breaks_and_entities() {
    let rendered = render_fridge("<desc><s>Salt &amp; pepper.</s><br/><s>Fish &lt;3 chips.</s></desc>");
    assert_eq!(rendered.text, "Salt & pepper.\nFish <3 chips.");
}

#[test]
fn test_markup_problems_become_warnings() {
    let rendered = render_fridge("<desc><s>A&nbsp;cat.</s></desc>");
    assert_eq!(rendered.text, "A&nbsp;cat.");
    assert_eq!(rendered.warnings.len(), 1);
}

#[test]
fn test_procedural_blocks_resolve_during_render() {
    let rendered = render_fridge(
        r#"<desc><s>The fridge <procedural chance="100"><poss chance="100">rattles</poss></procedural><procedural chance="0"> and sparks</procedural>.</s></desc>"#,
    );
    assert_eq!(rendered.text, "The fridge rattles.");
}

#[test]
fn test_deeply_nested_expression_is_an_error() {
    let nested = format!("{}1{}", "(".repeat(20_000), ")".repeat(20_000));
    let markup = format!(r#"<desc><s>It is cold.</s> <s>x <var v="{}"/></s></desc>"#, nested);
    let rendered = render_fridge(&markup);
    assert_eq!(rendered.text, "It is cold. x");
    assert_eq!(rendered.errors.len(), 1);
    assert!(rendered.errors[0].contains("too deeply nested"));
}

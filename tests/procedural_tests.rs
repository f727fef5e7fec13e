use description_engine::{resolve_procedural, resolve_procedural_with_seed};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[test]
fn test_zero_chance_block_never_survives() {
    let markup = r#"<desc><s>The hall is quiet<procedural chance="0">, until a door slams</procedural>.</s></desc>"#;
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..1000 {
        assert_eq!(
            resolve_procedural(markup, &mut rng),
            "<desc><s>The hall is quiet.</s></desc>"
        );
    }
}

#[test]
fn test_full_chance_block_always_survives() {
    let markup = r#"<desc><s>The hall is quiet<procedural chance="100">, until a door slams</procedural>.</s></desc>"#;
    let mut rng = StdRng::seed_from_u64(12);
    for _ in 0..1000 {
        assert_eq!(
            resolve_procedural(markup, &mut rng),
            "<desc><s>The hall is quiet, until a door slams.</s></desc>"
        );
    }
}

#[test]
fn test_possibility_weights() {
    let markup = r#"<desc><s>The wind is <procedural><poss chance="30">calm</poss><poss chance="70">howling</poss></procedural>.</s></desc>"#;
    let mut rng = StdRng::seed_from_u64(2024);
    let mut howling = 0;
    for _ in 0..10_000 {
        let resolved = resolve_procedural(markup, &mut rng);
        if resolved.contains("howling") {
            howling += 1;
        } else {
            assert!(resolved.contains("calm"));
        }
    }
    assert!(
        (6500..=7500).contains(&howling),
        "howling picked {} times",
        howling
    );
}

#[test]
fn test_same_seed_same_result() {
    let markup = r#"<desc><s>You hear <procedural><poss>a bell</poss><poss>a dog</poss><poss>rain</poss></procedural>.</s></desc>"#;
    assert_eq!(
        resolve_procedural_with_seed(markup, 7),
        resolve_procedural_with_seed(markup, 7)
    );
}

#[test]
fn test_non_procedural_markup_untouched() {
    let markup = r#"<desc><s>On the table is <il><item>a CUP</item></il>.</s> <if cond="this.accessible"><s>It is open.</s></if></desc>"#;
    assert_eq!(resolve_procedural_with_seed(markup, 3), markup);
}

/// Description Engine - dynamic descriptions and natural-language item lists
///
/// Descriptions are written in a small markup dialect (`<desc>`, `<s>`, `<il>`,
/// `<item>`, `<if>`, `<var>`, `<procedural>`, ...). This library renders them
/// to display text against a snapshot of the game, and keeps their item lists
/// grammatical as items are added and taken away.
///
/// # Example
///
/// ```
/// use description_engine::{insert_item, Item};
///
/// let markup = "<desc><s>On these shelves is <il><item>a bottle of ISOPROPYL ALCOHOL</item></il>.</s></desc>";
/// let item = Item::new("PAINKILLERS", "a bottle of PAINKILLERS", "bottles of PAINKILLERS");
/// let updated = insert_item(markup, &item, "", 1);
/// assert_eq!(
///     updated,
///     "<desc><s>On these shelves are <il><item>a bottle of PAINKILLERS</item> and <item>a bottle of ISOPROPYL ALCOHOL</item></il>.</s></desc>"
/// );
/// ```
pub mod ast;
pub mod clause;
pub mod context;
pub mod diagnostic;
pub mod document;
pub mod editor;
pub mod evaluator;
pub mod item;
pub mod parser;
pub mod procedural;
pub mod renderer;
pub mod span;

mod pipeline;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

/// Re-export main types for convenience
pub use context::{Container, Entity, GameContext, Scope};
pub use diagnostic::{Diagnostics, MarkupDiagnostic, MarkupIssue, Severity};
pub use editor::{EditOutcome, EditStatus};
pub use evaluator::EvalError;
pub use item::Item;
pub use parser::ExpressionError;
pub use renderer::strip_markup;

use document::normalize_markup;
use pipeline::RenderPipeline;

/// Default bound on descriptions nested through `<var>` values
pub const DEFAULT_MAX_DEPTH: usize = 8;

/// Options for rendering a description
pub struct RenderOptions<R: Rng> {
    /// Random number generator used by procedural blocks
    pub rng: R,
    /// How deep descriptions returned by variables may nest
    pub max_depth: usize,
}

impl<R: Rng> RenderOptions<R> {
    /// Create new options with provided RNG
    pub fn new(rng: R) -> Self {
        RenderOptions {
            rng,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Set the nesting limit
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Display text plus everything that went wrong producing it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rendered {
    pub text: String,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

/// Render a description to display text
///
/// Markup problems and expression failures never abort a render; they come
/// back as warnings and errors next to the text.
///
/// # Example
/// ```
/// use description_engine::{render, GameContext, RenderOptions, Scope};
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
///
/// let game = GameContext::default();
/// let options = RenderOptions::new(StdRng::seed_from_u64(42));
/// let rendered = render("<desc><s>It is <if cond=\"false\">not </if>quiet.</s></desc>", &Scope::new(&game), options);
/// assert_eq!(rendered.text, "It is quiet.");
/// ```
pub fn render<R: Rng>(markup: &str, scope: &Scope<'_>, mut options: RenderOptions<R>) -> Rendered {
    let (text, diagnostics) =
        RenderPipeline::new(*scope, &mut options.rng, options.max_depth).render(markup);
    Rendered {
        text,
        warnings: diagnostics.warnings,
        errors: diagnostics.errors,
    }
}

/// Render with a specific seed (convenience function)
pub fn render_with_seed(markup: &str, scope: &Scope<'_>, seed: u64) -> Rendered {
    render(markup, scope, RenderOptions::new(StdRng::seed_from_u64(seed)))
}

/// Render and keep only the text
pub fn render_text(markup: &str, scope: &Scope<'_>) -> String {
    render(markup, scope, RenderOptions::new(StdRng::from_entropy())).text
}

/// Add `added_quantity` units of an item to a description's item list
///
/// Returns the updated markup, or the input unchanged when the list cannot
/// be found.
pub fn insert_item(markup: &str, item: &Item, list_name: &str, added_quantity: u32) -> String {
    insert_item_detailed(markup, item, list_name, added_quantity).markup
}

pub fn insert_item_detailed(
    markup: &str,
    item: &Item,
    list_name: &str,
    added_quantity: u32,
) -> EditOutcome {
    edit(markup, |document| {
        editor::insert(document, item, list_name, added_quantity)
    })
}

/// Take units of an item out of a description's item list
///
/// `None` removes the item's clause whatever quantity it states.
pub fn remove_item(
    markup: &str,
    item: &Item,
    list_name: &str,
    removed_quantity: Option<u32>,
) -> String {
    remove_item_detailed(markup, item, list_name, removed_quantity).markup
}

pub fn remove_item_detailed(
    markup: &str,
    item: &Item,
    list_name: &str,
    removed_quantity: Option<u32>,
) -> EditOutcome {
    edit(markup, |document| {
        editor::remove(document, item, list_name, removed_quantity)
    })
}

fn edit(
    markup: &str,
    apply: impl FnOnce(&mut document::Document) -> (EditStatus, Diagnostics),
) -> EditOutcome {
    let parsed = parser::parse(markup);
    let mut diagnostics = Diagnostics::new();
    for diagnostic in &parsed.diagnostics {
        diagnostics.push_markup(diagnostic);
    }

    let mut document = parsed.document;
    let (status, edit_diagnostics) = apply(&mut document);
    diagnostics.extend(edit_diagnostics);

    let markup = if status.changed() {
        normalize_markup(&document.serialize())
    } else {
        markup.to_string()
    };
    EditOutcome {
        markup,
        status,
        diagnostics,
    }
}

/// Settle every procedural block, keeping the rest of the markup
///
/// The result is still a description: only the `<procedural>` and `<poss>`
/// wrappers are gone.
pub fn resolve_procedural<R: Rng>(markup: &str, rng: &mut R) -> String {
    let mut document = parser::parse(markup).document;
    procedural::resolve_procedurals(&mut document, rng);
    normalize_markup(&document.serialize())
}

/// Resolve procedural blocks with a specific seed (convenience function)
pub fn resolve_procedural_with_seed(markup: &str, seed: u64) -> String {
    let mut rng = StdRng::seed_from_u64(seed);
    resolve_procedural(markup, &mut rng)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHELVES: &str = "<desc><s>On these shelves are <il><item>3 bottles of ZZZQUIL</item></il>.</s></desc>";

    fn zzzquil() -> Item {
        Item::new("ZZZQUIL", "a bottle of ZZZQUIL", "bottles of ZZZQUIL")
    }

    #[test]
    fn test_missing_list_is_noop() {
        let outcome = insert_item_detailed(SHELVES, &zzzquil(), "FLOOR", 1);
        // The only list is unnamed, so a named lookup still finds it
        assert_eq!(outcome.status, EditStatus::Merged);

        let markup = r#"<desc><s>On the table is <il name="TABLE"><item>a CUP</item></il>.</s></desc>"#;
        let outcome = insert_item_detailed(markup, &zzzquil(), "FLOOR", 1);
        assert_eq!(outcome.status, EditStatus::ListNotFound);
        assert_eq!(outcome.markup, markup);
        assert_eq!(outcome.diagnostics.warnings.len(), 1);
    }

    #[test]
    fn test_merge_and_decrement() {
        let merged = insert_item(SHELVES, &zzzquil(), "", 2);
        assert_eq!(
            merged,
            "<desc><s>On these shelves are <il><item>5 bottles of ZZZQUIL</item></il>.</s></desc>"
        );

        let outcome = remove_item_detailed(SHELVES, &zzzquil(), "", Some(2));
        assert_eq!(outcome.status, EditStatus::Decremented);
        assert_eq!(
            outcome.markup,
            "<desc><s>On these shelves is <il><item>a bottle of ZZZQUIL</item></il>.</s></desc>"
        );
    }

    #[test]
    fn test_resolve_procedural_keeps_markup() {
        let markup = r#"<desc><s>The sky is <procedural chance="100"><poss chance="100">red &amp; gold</poss></procedural>.</s></desc>"#;
        assert_eq!(
            resolve_procedural_with_seed(markup, 5),
            "<desc><s>The sky is red &amp; gold.</s></desc>"
        );
    }

    #[test]
    fn test_render_options() {
        let options = RenderOptions::new(StdRng::seed_from_u64(1)).with_max_depth(2);
        assert_eq!(options.max_depth, 2);
        assert_eq!(
            RenderOptions::new(StdRng::seed_from_u64(1)).max_depth,
            DEFAULT_MAX_DEPTH
        );
    }
}

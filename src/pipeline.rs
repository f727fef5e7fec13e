//! Render pipeline
//!
//! Every render parses the markup fresh and resolves it in a fixed order:
//! procedural blocks, conditionals, item lists left empty, then variables.
//! The resolved tree is flattened to display text by the renderer.

use rand::Rng;
use tracing::{debug, warn};

use crate::context::Scope;
use crate::diagnostic::Diagnostics;
use crate::document::{Document, NodeData, Tag};
use crate::editor::remove_list_entry;
use crate::evaluator::{Evaluator, Value};
use crate::parser::{parse, ParsedDocument};
use crate::procedural::resolve_procedurals;
use crate::renderer::display_text;

pub(crate) struct RenderPipeline<'a, 'r, R: Rng> {
    scope: Scope<'a>,
    rng: &'r mut R,
    max_depth: usize,
}

impl<'a, 'r, R: Rng> RenderPipeline<'a, 'r, R> {
    pub fn new(scope: Scope<'a>, rng: &'r mut R, max_depth: usize) -> Self {
        RenderPipeline {
            scope,
            rng,
            max_depth,
        }
    }

    pub fn render(&mut self, markup: &str) -> (String, Diagnostics) {
        self.render_at(markup, 0)
    }

    fn render_at(&mut self, markup: &str, depth: usize) -> (String, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let ParsedDocument {
            mut document,
            diagnostics: markup_diagnostics,
        } = parse(markup);
        for diagnostic in &markup_diagnostics {
            diagnostics.push_markup(diagnostic);
        }

        resolve_procedurals(&mut document, &mut *self.rng);
        self.resolve_conditionals(&mut document, &mut diagnostics);
        prune_empty_lists(&mut document);
        self.substitute_variables(&mut document, &mut diagnostics, depth);

        (display_text(&mut document), diagnostics)
    }

    /// Remove every `<if>` whose condition is false or fails to evaluate
    fn resolve_conditionals(&self, document: &mut Document, diagnostics: &mut Diagnostics) {
        let evaluator = Evaluator::new(self.scope);
        let mut rejected = Vec::new();
        for conditional in document.elements_by_tag(&Tag::If) {
            let Some(source) = document.attribute(conditional, "cond") else {
                continue;
            };
            match evaluator.evaluate_condition(source) {
                Ok(true) => {}
                Ok(false) => rejected.push(conditional),
                Err(err) => {
                    warn!(cond = source, error = %err, "condition failed to evaluate");
                    diagnostics.error(err.to_string());
                    rejected.push(conditional);
                }
            }
        }

        for conditional in rejected {
            if !document.is_alive(conditional) || document.parent(conditional).is_none() {
                continue;
            }
            // A conditional item inside a list goes through the editor so the
            // connectors around it stay right
            match remove_list_entry(document, conditional) {
                Some((status, edit_diagnostics)) => {
                    debug!(?status, "removed conditional list entry");
                    diagnostics.extend(edit_diagnostics);
                }
                None => document.remove(conditional),
            }
        }
    }

    fn substitute_variables(
        &mut self,
        document: &mut Document,
        diagnostics: &mut Diagnostics,
        depth: usize,
    ) {
        let evaluator = Evaluator::new(self.scope);
        for variable in document.elements_by_tag(&Tag::Var) {
            if !document.is_alive(variable) {
                continue;
            }
            let Some(source) = document.attribute(variable, "v").map(str::to_string) else {
                document.remove(variable);
                continue;
            };

            let replacement = match evaluator.evaluate_source(&source) {
                Ok(Value::Null) => {
                    diagnostics.error(format!("\"{}\" is undefined.", source));
                    None
                }
                Ok(Value::Text(text)) if text.contains("<desc>") => {
                    self.render_nested(&text, depth, diagnostics)
                }
                Ok(value) => Some(evaluator.display(&value)),
                Err(err) => {
                    warn!(v = %source, error = %err, "variable failed to evaluate");
                    diagnostics.error(err.to_string());
                    None
                }
            };

            match replacement {
                Some(text) => {
                    document.replace_with_text(variable, text);
                }
                None => document.remove(variable),
            }
        }
    }

    fn render_nested(
        &mut self,
        markup: &str,
        depth: usize,
        diagnostics: &mut Diagnostics,
    ) -> Option<String> {
        if depth >= self.max_depth {
            warn!(max_depth = self.max_depth, "nested description too deep");
            diagnostics.error(format!(
                "nested description exceeds the maximum depth of {}",
                self.max_depth
            ));
            return None;
        }
        let (text, nested) = self.render_at(markup, depth + 1);
        diagnostics.extend(nested);
        Some(text)
    }
}

/// Drop sentences whose item list has nothing left to list
fn prune_empty_lists(document: &mut Document) {
    for list in document.elements_by_tag(&Tag::ItemList) {
        if !document.is_alive(list) {
            continue;
        }
        let empty = document
            .children(list)
            .iter()
            .all(|child| match &document.node(*child).data {
                NodeData::Text(text) => text.trim().is_empty(),
                NodeData::Element(element) => element.tag == Tag::Null,
                NodeData::Root => true,
            });
        if !empty {
            continue;
        }
        if let Some(sentence) = document.ancestor_with_tag(list, &Tag::Sentence) {
            document.remove(sentence);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::GameContext;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn run(markup: &str, max_depth: usize) -> (String, Diagnostics) {
        let game = GameContext::default();
        let mut rng = StdRng::seed_from_u64(1);
        RenderPipeline::new(Scope::new(&game), &mut rng, max_depth).render(markup)
    }

    #[test]
    fn test_empty_list_sentence_pruned() {
        let (text, diagnostics) = run(
            "<desc><s>The room is bare.</s> <s>On the floor is <il></il>.</s></desc>",
            8,
        );
        assert_eq!(text, "The room is bare.");
        assert!(diagnostics.errors.is_empty());
    }

    #[test]
    fn test_nested_description_depth_limit() {
        let markup = r#"<desc><s>Outer <var v="'<desc><s>inner</s></desc>'"/>.</s></desc>"#;
        let (text, _) = run(markup, 8);
        assert_eq!(text, "Outer inner.");

        let (text, diagnostics) = run(markup, 0);
        assert_eq!(text, "Outer .");
        assert_eq!(diagnostics.errors.len(), 1);
    }
}

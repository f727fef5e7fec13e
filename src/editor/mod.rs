/// Editor module - keeps item lists in descriptions grammatical while items move
///
/// An item list (`<il>`) is read as a sequence of entries, edited, and written
/// back with regenerated connectors. Nothing here ever fails hard: unresolved
/// lists and unmatched items are no-ops, and list shapes that cannot be
/// regenerated fall back to a verbatim edit.
// Sub-modules
mod grammar;
mod segments;

// Implementation modules
mod insert_impl;
mod remove_impl;

use serde::Serialize;
use std::ops::Range;
use tracing::warn;

use crate::clause::{leading_quantity, Clause};
use crate::diagnostic::Diagnostics;
use crate::document::{Document, NodeId, Tag};
use crate::item::Item;
use crate::parser::is_blank;

use grammar::{conjugate, leading_verb, trailing_verb};
use segments::{read_layout, tracked_item, Entry, ListLayout, Piece};

/// What an edit did to the description
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EditStatus {
    /// A new item clause was added to the list
    Inserted,
    /// An existing clause for the item had its quantity raised
    Merged,
    /// An existing clause for the item had its quantity lowered
    Decremented,
    /// The item clause was removed from the list
    Removed,
    /// The last clause was removed, taking its sentence with it
    SentenceRemoved,
    /// The list had an unrecognized shape and was edited verbatim
    FellBack,
    ListNotFound,
    AmbiguousList,
    ItemNotFound,
}

impl EditStatus {
    /// Whether the description was modified
    pub fn changed(&self) -> bool {
        !matches!(
            self,
            EditStatus::ListNotFound | EditStatus::AmbiguousList | EditStatus::ItemNotFound
        )
    }
}

/// Result of `insert_item_detailed`/`remove_item_detailed`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditOutcome {
    pub markup: String,
    pub status: EditStatus,
    pub diagnostics: Diagnostics,
}

/// A resolved list and the sentence it belongs to
#[derive(Debug, Clone, Copy)]
pub(crate) struct ListTarget {
    pub list: NodeId,
    pub sentence: Option<NodeId>,
}

pub struct ListEditor<'d> {
    pub(super) document: &'d mut Document,
    pub(super) diagnostics: Diagnostics,
}

impl<'d> ListEditor<'d> {
    pub fn new(document: &'d mut Document) -> Self {
        ListEditor {
            document,
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }

    /// Find the list an edit applies to
    pub(crate) fn locate(&mut self, list_name: &str) -> Result<ListTarget, EditStatus> {
        let lists = self.document.elements_by_tag(&Tag::ItemList);
        let unnamed: Vec<NodeId> = lists
            .iter()
            .copied()
            .filter(|list| list_name_of(self.document, *list).is_empty())
            .collect();

        let found = if !list_name.is_empty() {
            lists
                .iter()
                .copied()
                .find(|list| list_name_of(self.document, *list) == list_name)
                .or_else(|| {
                    lists
                        .first()
                        .copied()
                        .filter(|_| lists.len() == 1 && unnamed.len() == 1)
                })
        } else if lists.len() == 1 {
            lists.first().copied()
        } else if unnamed.len() > 1 {
            warn!(lists = unnamed.len(), "several unnamed item lists and no list name");
            self.diagnostics.warn(format!(
                "{} unnamed item lists found; a list name is needed to pick one",
                unnamed.len()
            ));
            return Err(EditStatus::AmbiguousList);
        } else {
            unnamed.first().copied()
        };

        match found {
            Some(list) => Ok(self.target_for(list)),
            None => {
                warn!(list = list_name, "item list not found");
                self.diagnostics
                    .warn(format!("no item list named \"{}\"", list_name));
                Err(EditStatus::ListNotFound)
            }
        }
    }

    pub(crate) fn target_for(&self, list: NodeId) -> ListTarget {
        ListTarget {
            list,
            sentence: self.document.ancestor_with_tag(list, &Tag::Sentence),
        }
    }

    /// First tracked item clause in the list that mentions `item`
    pub(super) fn matching_clause(&self, list: NodeId, item: &Item) -> Option<Clause> {
        Clause::collect(self.document, list).into_iter().find(|clause| {
            clause.is_item
                && item.matches(&clause.text)
                && self.entry_node(list, clause.node).is_some_and(|entry| {
                    tracked_item(self.document, entry).is_some()
                })
        })
    }

    /// The direct child of `list` that holds `node`
    pub(super) fn entry_node(&self, list: NodeId, node: NodeId) -> Option<NodeId> {
        let mut current = node;
        loop {
            let parent = self.document.parent(current)?;
            if parent == list {
                return Some(current);
            }
            current = parent;
        }
    }

    /// Only whitespace comes before the list inside its sentence
    pub(super) fn opens_sentence(&self, target: &ListTarget) -> bool {
        let Some(sentence) = target.sentence else {
            return false;
        };
        for id in self.document.descendants(sentence) {
            if id == target.list {
                return true;
            }
            if self.document.is_ancestor(id, target.list) {
                continue;
            }
            if !is_blank(self.document, id) {
                return false;
            }
        }
        false
    }

    /// Apply a case rule to the first word of an entry
    pub(super) fn recase_entry(&mut self, entry: &mut Entry, rule: fn(&str) -> String) {
        match entry.pieces.first_mut() {
            Some(Piece::Text(text)) => *text = rule(text),
            Some(Piece::Node { id, .. }) => {
                if let Some(text_node) = self.document.first_text_descendant(*id) {
                    let recased = rule(self.document.text(text_node).unwrap_or_default());
                    self.document.set_text(text_node, recased);
                }
            }
            None => {}
        }
    }

    /// Quantity stated by a tracked entry's clause
    fn entry_quantity(&self, node: NodeId) -> u32 {
        tracked_item(self.document, node)
            .and_then(|item| self.document.first_text_descendant(item))
            .and_then(|text| self.document.text(text))
            .map_or(1, leading_quantity)
    }

    /// Make the governing verb agree with the list as it now stands
    pub(super) fn agree_verb(&mut self, target: &ListTarget) {
        let Some(layout) = read_layout(self.document, target.list) else {
            return;
        };
        if let Some(plural) = self.plural_for(&layout) {
            self.set_verb(target, plural);
        }
    }

    fn plural_for(&self, layout: &ListLayout) -> Option<bool> {
        match layout.entries.as_slice() {
            [] => None,
            [single] => single
                .tracked_node()
                .map(|node| self.entry_quantity(node) > 1),
            _ => Some(true),
        }
    }

    pub(super) fn set_verb(&mut self, target: &ListTarget, plural: bool) {
        let Some((node, range)) = self.verb_site(target) else {
            return;
        };
        let Some(text) = self.document.text(node) else {
            return;
        };
        let verb = &text[range.clone()];
        let replacement = conjugate(verb, plural);
        if replacement != verb {
            let updated = format!("{}{}{}", &text[..range.start], replacement, &text[range.end..]);
            self.document.set_text(node, updated);
        }
    }

    /// Text node and byte range of the verb governing the list
    fn verb_site(&self, target: &ListTarget) -> Option<(NodeId, Range<usize>)> {
        let scope = target
            .sentence
            .or_else(|| self.document.parent(target.list))?;
        let mut before = None;
        let mut after = None;
        let mut passed = false;
        for id in self.document.descendants(scope) {
            if id == target.list {
                passed = true;
                continue;
            }
            if self.document.is_ancestor(target.list, id) {
                continue;
            }
            let Some(text) = self.document.text(id) else {
                continue;
            };
            if text.trim().is_empty() {
                continue;
            }
            if !passed {
                before = Some(id);
            } else if after.is_none() {
                after = Some(id);
            }
        }

        let before = before.and_then(|id| {
            let range = trailing_verb(self.document.text(id)?)?;
            Some((id, range))
        });
        before.or_else(|| {
            let id = after?;
            let range = leading_verb(self.document.text(id)?)?;
            Some((id, range))
        })
    }
}

fn list_name_of(document: &Document, list: NodeId) -> &str {
    document.attribute(list, "name").unwrap_or_default()
}

/// Add `added_quantity` units of `item` to a list
pub fn insert(
    document: &mut Document,
    item: &Item,
    list_name: &str,
    added_quantity: u32,
) -> (EditStatus, Diagnostics) {
    let mut editor = ListEditor::new(document);
    let status = editor.insert(item, list_name, added_quantity);
    (status, editor.into_diagnostics())
}

/// Take units of `item` out of a list; `None` removes the clause whatever its quantity
pub fn remove(
    document: &mut Document,
    item: &Item,
    list_name: &str,
    removed_quantity: Option<u32>,
) -> (EditStatus, Diagnostics) {
    let mut editor = ListEditor::new(document);
    let status = editor.remove(item, list_name, removed_quantity);
    (status, editor.into_diagnostics())
}

/// Remove a list entry that is a tracked item, rebalancing the list around it.
/// Returns `None` when `node` is not such an entry.
pub(crate) fn remove_list_entry(
    document: &mut Document,
    node: NodeId,
) -> Option<(EditStatus, Diagnostics)> {
    let list = document.parent(node)?;
    if !document.is_tag(list, &Tag::ItemList) || tracked_item(document, node).is_none() {
        return None;
    }
    let mut editor = ListEditor::new(document);
    let target = editor.target_for(list);
    let status = editor.remove_entry(&target, node);
    Some((status, editor.into_diagnostics()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn test_locate_by_name_and_default() {
        let mut parsed = parse(
            r#"<desc><s>A <il name="TABLE"></il>.</s><s>B <il></il>.</s></desc>"#,
        );
        let mut editor = ListEditor::new(&mut parsed.document);
        let table = editor.locate("TABLE").unwrap();
        assert_eq!(editor.document.attribute(table.list, "name"), Some("TABLE"));
        let default = editor.locate("").unwrap();
        assert_eq!(editor.document.attribute(default.list, "name"), None);
        assert_eq!(editor.locate("FLOOR").unwrap_err(), EditStatus::ListNotFound);
    }

    #[test]
    fn test_locate_ambiguous_unnamed_lists() {
        let mut parsed = parse("<desc><s>A <il></il>.</s><s>B <il></il>.</s></desc>");
        let mut editor = ListEditor::new(&mut parsed.document);
        assert_eq!(editor.locate("").unwrap_err(), EditStatus::AmbiguousList);
        assert_eq!(editor.into_diagnostics().warnings.len(), 1);
    }

    #[test]
    fn test_named_lookup_falls_back_to_sole_unnamed_list() {
        let mut parsed = parse("<desc><s>A <il></il>.</s></desc>");
        let mut editor = ListEditor::new(&mut parsed.document);
        assert!(editor.locate("SHELF").is_ok());
    }

    #[test]
    fn test_opens_sentence() {
        let mut parsed = parse(
            "<desc><s> <il><item>A PEN</item></il> is here.</s><s>There is <il name=\"B\"></il>.</s></desc>",
        );
        let editor = ListEditor::new(&mut parsed.document);
        let lists = editor.document.elements_by_tag(&Tag::ItemList);
        let opening = editor.target_for(lists[0]);
        let inner = editor.target_for(lists[1]);
        assert!(editor.opens_sentence(&opening));
        assert!(!editor.opens_sentence(&inner));
    }

    #[test]
    fn test_status_changed() {
        assert!(EditStatus::Inserted.changed());
        assert!(EditStatus::FellBack.changed());
        assert!(!EditStatus::ItemNotFound.changed());
    }
}

//! Insertion of item clauses
//!
//! A new clause always goes to the head of the list. When the list already
//! mentions the item, the quantities are merged into the existing clause.

use tracing::{debug, warn};

use crate::clause::{first_number, Clause};
use crate::document::{NodeId, Tag};
use crate::item::Item;

use super::grammar::{capitalize, decapitalize, starts_uppercase};
use super::segments::{read_layout, write_layout, Entry};
use super::{EditStatus, ListEditor, ListTarget};

impl<'d> ListEditor<'d> {
    pub fn insert(&mut self, item: &Item, list_name: &str, added_quantity: u32) -> EditStatus {
        let added_quantity = added_quantity.max(1);
        let target = match self.locate(list_name) {
            Ok(target) => target,
            Err(status) => return status,
        };

        if let Some(clause) = self.matching_clause(target.list, item) {
            self.merge(&target, &clause, item, added_quantity);
            debug!(list = list_name, quantity = added_quantity, "merged item clause");
            return EditStatus::Merged;
        }

        let item_node = self.document.create_element(Tag::Item);
        let phrase = self.document.create_text(item.phrase_for(added_quantity));
        self.document.append_child(item_node, phrase);

        let Some(mut layout) = read_layout(self.document, target.list) else {
            self.prepend_verbatim(&target, item_node);
            return EditStatus::FellBack;
        };

        let mut entry = Entry::tracked(item_node);
        if self.opens_sentence(&target) {
            self.recase_entry(&mut entry, capitalize);
            if let Some(previous_head) = layout.entries.first_mut() {
                self.recase_entry(previous_head, decapitalize);
            }
        }
        layout.entries.insert(0, entry);
        write_layout(self.document, target.list, &layout);
        self.agree_verb(&target);

        debug!(
            list = list_name,
            entries = layout.entries.len(),
            "inserted item clause"
        );
        EditStatus::Inserted
    }

    /// Raise the quantity stated by an existing clause
    fn merge(&mut self, target: &ListTarget, clause: &Clause, item: &Item, added_quantity: u32) {
        let updated = if clause.item_quantity == 1 {
            format!(
                "{} {}",
                added_quantity.saturating_add(1),
                item.plural_containing_phrase
            )
        } else {
            match first_number(&clause.text) {
                Some((range, existing)) => format!(
                    "{}{}{}",
                    &clause.text[..range.start],
                    existing.saturating_add(added_quantity),
                    &clause.text[range.end..]
                ),
                None => return,
            }
        };
        let updated = if starts_uppercase(&clause.text) {
            capitalize(&updated)
        } else {
            updated
        };
        self.document.set_text(clause.node, updated);
        self.agree_verb(target);
    }

    /// Put the clause in front of whatever the list holds, joined with the
    /// connector its text already uses
    fn prepend_verbatim(&mut self, target: &ListTarget, item_node: NodeId) {
        let content = self.document.text_content(target.list);
        let has_elements = self
            .document
            .children(target.list)
            .iter()
            .any(|child| {
                self.document.element(*child).is_some() && !self.document.is_tag(*child, &Tag::Null)
            });

        let connector = if content.contains(',') {
            ", "
        } else if !content.trim().is_empty() || has_elements {
            " and "
        } else {
            ""
        };

        for child in self.document.children(target.list).to_vec() {
            if self.document.is_tag(child, &Tag::Null) {
                self.document.remove(child);
            }
        }
        self.document.insert_child(target.list, 0, item_node);
        if !connector.is_empty() {
            let separator = self.document.create_text(connector);
            self.document.insert_child(target.list, 1, separator);
            self.set_verb(target, true);
        }

        warn!(list = ?target.list, "item list has an unrecognized shape, clause prepended verbatim");
        self.diagnostics.warn(
            "item list has an unrecognized shape; the new clause was prepended without rebalancing",
        );
    }
}

//! Removal of item clauses
//!
//! A counted removal rewrites the clause's quantity when units remain. Anything
//! else takes the whole entry out and regenerates the list around the gap.

use tracing::{debug, warn};

use crate::clause::{first_number, Clause};
use crate::document::{NodeId, Tag};
use crate::item::Item;
use crate::parser::is_blank;

use super::grammar::capitalize;
use super::segments::{read_layout, write_layout};
use super::{EditStatus, ListEditor, ListTarget};

const LEADING_CONNECTORS: [&str; 3] = [", and ", ", ", " and "];
const TRAILING_CONNECTORS: [&str; 3] = [", and ", " and ", ", "];

impl<'d> ListEditor<'d> {
    pub fn remove(
        &mut self,
        item: &Item,
        list_name: &str,
        removed_quantity: Option<u32>,
    ) -> EditStatus {
        let target = match self.locate(list_name) {
            Ok(target) => target,
            Err(status) => return status,
        };

        let found = self
            .matching_clause(target.list, item)
            .and_then(|clause| Some((self.entry_node(target.list, clause.node)?, clause)));
        let Some((entry, clause)) = found else {
            warn!(list = list_name, item = %item.name, "item clause not found");
            self.diagnostics.warn(format!(
                "no clause for \"{}\" in the item list",
                item.single_containing_phrase
            ));
            return EditStatus::ItemNotFound;
        };

        if let Some(removed) = removed_quantity {
            if self.decrement(&target, &clause, item, removed) {
                debug!(list = list_name, quantity = removed, "decremented item clause");
                return EditStatus::Decremented;
            }
        }

        let status = self.remove_entry(&target, entry);
        debug!(list = list_name, ?status, "removed item clause");
        status
    }

    /// Lower the quantity stated by a clause. False when the clause has to go
    /// entirely: no stated count, or nothing would remain.
    fn decrement(&mut self, target: &ListTarget, clause: &Clause, item: &Item, removed: u32) -> bool {
        let Some((range, quantity)) = first_number(&clause.text) else {
            return false;
        };
        let plural = item.plural_containing_phrase.to_lowercase();
        if plural.is_empty() || !clause.text[range.end..].to_lowercase().contains(&plural) {
            return false;
        }

        let remaining = i64::from(quantity) - i64::from(removed);
        let updated = match remaining {
            1 => item.single_containing_phrase.clone(),
            n if n > 1 => format!(
                "{}{}{}",
                &clause.text[..range.start],
                n,
                &clause.text[range.end..]
            ),
            _ => return false,
        };

        let is_head = Clause::collect(self.document, target.list)
            .first()
            .is_some_and(|first| first.node == clause.node);
        let updated = if is_head && self.opens_sentence(target) {
            capitalize(&updated)
        } else {
            updated
        };
        self.document.set_text(clause.node, updated);
        self.agree_verb(target);
        true
    }

    /// Take one entry out of a list and rebalance what is left
    pub(super) fn remove_entry(&mut self, target: &ListTarget, entry: NodeId) -> EditStatus {
        let layout = read_layout(self.document, target.list).and_then(|layout| {
            let index = layout
                .entries
                .iter()
                .position(|candidate| candidate.contains_node(entry))?;
            Some((layout, index))
        });
        let Some((mut layout, index)) = layout else {
            return self.remove_verbatim(target, entry);
        };

        layout.entries.remove(index);
        if layout.entries.is_empty() {
            write_layout(self.document, target.list, &layout);
            return self.remove_emptied_sentence(target);
        }

        if index == 0 && self.opens_sentence(target) {
            if let Some(head) = layout.entries.first_mut() {
                self.recase_entry(head, capitalize);
            }
        }
        write_layout(self.document, target.list, &layout);
        self.agree_verb(target);
        EditStatus::Removed
    }

    fn remove_emptied_sentence(&mut self, target: &ListTarget) -> EditStatus {
        match target.sentence {
            Some(sentence) => {
                self.document.remove(sentence);
                EditStatus::SentenceRemoved
            }
            None => EditStatus::Removed,
        }
    }

    /// Delete the entry and one connector next to it, leaving the rest as written
    fn remove_verbatim(&mut self, target: &ListTarget, entry: NodeId) -> EditStatus {
        let siblings = self.document.children(target.list).to_vec();
        let Some(index) = siblings.iter().position(|child| *child == entry) else {
            return EditStatus::ItemNotFound;
        };

        let stripped_next = siblings
            .get(index + 1)
            .is_some_and(|next| self.strip_connector(*next, true));
        if !stripped_next {
            if let Some(previous) = index.checked_sub(1).and_then(|i| siblings.get(i)) {
                self.strip_connector(*previous, false);
            }
        }
        self.document.remove(entry);

        warn!(list = ?target.list, "item list has an unrecognized shape, clause removed verbatim");
        self.diagnostics.warn(
            "item list has an unrecognized shape; the clause was removed without rebalancing",
        );

        let emptied = self
            .document
            .children(target.list)
            .iter()
            .all(|child| self.document.is_tag(*child, &Tag::Null) || is_blank(self.document, *child));
        if emptied {
            return self.remove_emptied_sentence(target);
        }
        EditStatus::FellBack
    }

    fn strip_connector(&mut self, node: NodeId, leading: bool) -> bool {
        let Some(text) = self.document.text(node) else {
            return false;
        };
        let stripped = if leading {
            LEADING_CONNECTORS
                .iter()
                .find_map(|connector| text.strip_prefix(connector))
        } else {
            TRAILING_CONNECTORS
                .iter()
                .find_map(|connector| text.strip_suffix(connector))
        };
        match stripped.map(str::to_string) {
            Some(rest) => {
                self.document.set_text(node, rest);
                true
            }
            None => false,
        }
    }
}

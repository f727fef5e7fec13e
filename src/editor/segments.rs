//! Reading an item list as a sequence of entries and writing it back
//!
//! The children of an `<il>` are flattened into one string in which every
//! element child is replaced by a placeholder character. That string is split
//! into entries at the list's connectors (commas and "and"), and each entry
//! keeps its text pieces and element nodes in order. Writing regenerates the
//! connectors from the entry count alone.

use std::collections::HashSet;
use std::mem;

use crate::document::{Document, NodeData, NodeId, Tag};

/// Stands in for an element child while the list text is split
const PLACEHOLDER: char = '\u{E000}';

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Piece {
    Text(String),
    Node { id: NodeId, tracked: bool },
}

/// One list entry: a tracked item, or a prose phrase (possibly with markup)
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Entry {
    pub pieces: Vec<Piece>,
}

impl Entry {
    pub fn tracked(id: NodeId) -> Self {
        Entry {
            pieces: vec![Piece::Node { id, tracked: true }],
        }
    }

    /// The node of an entry that is exactly one tracked item
    pub fn tracked_node(&self) -> Option<NodeId> {
        match self.pieces.as_slice() {
            [Piece::Node { id, tracked: true }] => Some(*id),
            _ => None,
        }
    }

    pub fn contains_node(&self, node: NodeId) -> bool {
        self.pieces
            .iter()
            .any(|piece| matches!(piece, Piece::Node { id, .. } if *id == node))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ListLayout {
    /// Whitespace before the first entry
    pub leading: String,
    pub entries: Vec<Entry>,
    /// Whitespace after the last entry
    pub trailing: String,
}

/// The `<item>` behind a list child: the item itself, or an `<if>` wrapping
/// nothing but one item
pub(crate) fn tracked_item(document: &Document, id: NodeId) -> Option<NodeId> {
    match document.tag(id)? {
        Tag::Item => Some(id),
        Tag::If => {
            let mut content = document.children(id).iter().copied().filter(|child| {
                document
                    .text(*child)
                    .map_or(!document.is_tag(*child, &Tag::Null), |text| {
                        !text.trim().is_empty()
                    })
            });
            match (content.next(), content.next()) {
                (Some(only), None) if document.is_tag(only, &Tag::Item) => Some(only),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Connector written before entry `index` of `count`
pub(crate) fn connector(index: usize, count: usize) -> &'static str {
    match (index, count) {
        (0, _) => "",
        (_, 2) => " and ",
        (i, n) if i + 1 == n => ", and ",
        _ => ", ",
    }
}

/// Read the entries of a list. `None` when the list does not have a shape
/// the connectors can be regenerated for.
pub(crate) fn read_layout(document: &Document, list: NodeId) -> Option<ListLayout> {
    let mut joined = String::new();
    let mut nodes = Vec::new();
    for &child in document.children(list) {
        match &document.node(child).data {
            NodeData::Text(text) => {
                if text.contains(PLACEHOLDER) {
                    return None;
                }
                joined.push_str(text);
            }
            NodeData::Element(element) if element.tag == Tag::Null => {}
            NodeData::Element(_) => {
                joined.push(PLACEHOLDER);
                nodes.push((child, tracked_item(document, child).is_some()));
            }
            NodeData::Root => {}
        }
    }

    let body_start = joined.len() - joined.trim_start().len();
    let leading = joined[..body_start].to_string();
    let rest = &joined[body_start..];
    let body = rest.trim_end();
    let trailing = rest[body.len()..].to_string();

    let mut queue = nodes.into_iter();
    let has_nodes = queue.len() > 0;
    let mut entries = Vec::new();
    for part in split_entries(body, has_nodes) {
        let mut pieces = Vec::new();
        let mut text = String::new();
        for ch in part.chars() {
            if ch == PLACEHOLDER {
                if !text.is_empty() {
                    pieces.push(Piece::Text(mem::take(&mut text)));
                }
                let (id, tracked) = queue.next()?;
                pieces.push(Piece::Node { id, tracked });
            } else {
                text.push(ch);
            }
        }
        if !text.is_empty() {
            pieces.push(Piece::Text(text));
        }

        // A tracked item has to stand alone in its entry
        let has_tracked = pieces
            .iter()
            .any(|piece| matches!(piece, Piece::Node { tracked: true, .. }));
        if has_tracked && pieces.len() > 1 {
            return None;
        }
        entries.push(Entry { pieces });
    }
    if queue.next().is_some() {
        return None;
    }

    Some(ListLayout {
        leading,
        entries,
        trailing,
    })
}

fn split_entries(body: &str, has_nodes: bool) -> Vec<String> {
    if body.is_empty() {
        return Vec::new();
    }

    let mut parts: Vec<String> = if body.contains(',') {
        let mut parts: Vec<String> = body.split(',').map(|part| part.trim().to_string()).collect();
        if parts.len() > 1 {
            if let Some(last) = parts.pop() {
                match last.strip_prefix("and ") {
                    Some(rest) => parts.push(rest.trim_start().to_string()),
                    None => match last.split_once(" and ") {
                        Some((head, tail)) => {
                            parts.push(head.trim().to_string());
                            parts.push(tail.trim().to_string());
                        }
                        None => parts.push(last),
                    },
                }
            }
        }
        parts
    } else if has_nodes {
        split_at_node_conjunctions(body)
    } else {
        body.split(" and ").map(|part| part.trim().to_string()).collect()
    };

    parts.retain(|part| !part.is_empty());
    parts
}

/// Split at " and " only where it touches an element placeholder
fn split_at_node_conjunctions(body: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut rest = body;
    while let Some(position) = rest.find(" and ") {
        let before = &rest[..position];
        let after = &rest[position + " and ".len()..];
        current.push_str(before);
        if before.ends_with(PLACEHOLDER) || after.starts_with(PLACEHOLDER) {
            parts.push(mem::take(&mut current).trim().to_string());
        } else {
            current.push_str(" and ");
        }
        rest = after;
    }
    current.push_str(rest);
    parts.push(current.trim().to_string());
    parts
}

/// Rebuild the children of `list` from a layout
///
/// Element nodes named by the layout are moved into place; any other child
/// of the list is removed from the document.
pub(crate) fn write_layout(document: &mut Document, list: NodeId, layout: &ListLayout) {
    let count = layout.entries.len();
    let mut sequence: Vec<Piece> = Vec::new();
    if count > 0 {
        push_text(&mut sequence, &layout.leading);
        for (index, entry) in layout.entries.iter().enumerate() {
            push_text(&mut sequence, connector(index, count));
            for piece in &entry.pieces {
                match piece {
                    Piece::Text(text) => push_text(&mut sequence, text),
                    Piece::Node { .. } => sequence.push(piece.clone()),
                }
            }
        }
        push_text(&mut sequence, &layout.trailing);
    }

    let kept: HashSet<NodeId> = sequence
        .iter()
        .filter_map(|piece| match piece {
            Piece::Node { id, .. } => Some(*id),
            Piece::Text(_) => None,
        })
        .collect();
    for child in document.children(list).to_vec() {
        if kept.contains(&child) {
            document.detach(child);
        } else {
            document.remove(child);
        }
    }

    for piece in sequence {
        match piece {
            Piece::Text(text) => {
                let id = document.create_text(text);
                document.append_child(list, id);
            }
            Piece::Node { id, .. } => document.append_child(list, id),
        }
    }
    if count == 0 {
        let placeholder = document.create_element(Tag::Null);
        document.append_child(list, placeholder);
    }
}

fn push_text(sequence: &mut Vec<Piece>, text: &str) {
    if text.is_empty() {
        return;
    }
    match sequence.last_mut() {
        Some(Piece::Text(existing)) => existing.push_str(text),
        _ => sequence.push(Piece::Text(text.to_string())),
    }
}

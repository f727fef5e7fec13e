//! Arena-backed description tree
//!
//! Nodes live in a single `Vec` and refer to each other by [`NodeId`]. Removing a
//! node detaches it from its parent and marks its whole subtree dead, so handles
//! collected before an edit stay valid and can be checked with [`Document::is_alive`].

use crate::span::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Element types of the description dialect
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    Desc,
    Sentence,
    ItemList,
    Item,
    If,
    Var,
    Br,
    Procedural,
    Possibility,
    Null,
    Other(String),
}

impl Tag {
    pub fn from_name(name: &str) -> Tag {
        match name {
            "desc" => Tag::Desc,
            "s" => Tag::Sentence,
            "il" => Tag::ItemList,
            "item" => Tag::Item,
            "if" => Tag::If,
            "var" => Tag::Var,
            "br" => Tag::Br,
            "procedural" => Tag::Procedural,
            "poss" => Tag::Possibility,
            "null" => Tag::Null,
            other => Tag::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Tag::Desc => "desc",
            Tag::Sentence => "s",
            Tag::ItemList => "il",
            Tag::Item => "item",
            Tag::If => "if",
            Tag::Var => "var",
            Tag::Br => "br",
            Tag::Procedural => "procedural",
            Tag::Possibility => "poss",
            Tag::Null => "null",
            Tag::Other(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
    pub quote: char,
    /// Location of the value, used to place expression errors
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: Tag,
    pub attributes: Vec<Attribute>,
    pub self_closing: bool,
}

impl Element {
    pub fn new(tag: Tag) -> Self {
        Element {
            tag,
            attributes: Vec::new(),
            self_closing: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Root,
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub data: NodeData,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub alive: bool,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Document {
            nodes: vec![Node {
                data: NodeData::Root,
                parent: None,
                children: Vec::new(),
                alive: true,
                span: Span::dummy(),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn push(&mut self, data: NodeData, span: Span) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
            alive: true,
            span,
        });
        id
    }

    pub fn create_element(&mut self, tag: Tag) -> NodeId {
        self.push(NodeData::Element(Element::new(tag)), Span::dummy())
    }

    pub(crate) fn create_parsed_element(&mut self, element: Element, span: Span) -> NodeId {
        self.push(NodeData::Element(element), span)
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData::Text(text.into()), Span::dummy())
    }

    pub(crate) fn create_parsed_text(&mut self, text: String, span: Span) -> NodeId {
        self.push(NodeData::Text(text), span)
    }

    pub(crate) fn set_span(&mut self, id: NodeId, span: Span) {
        self.nodes[id.0].span = span;
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.detach(child);
        let children = &mut self.nodes[parent.0].children;
        let index = index.min(children.len());
        children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Take a node out of its parent without killing it
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|child| *child != id);
        }
    }

    /// Detach a node and mark it and all of its descendants dead
    pub fn remove(&mut self, id: NodeId) {
        if id == self.root() {
            return;
        }
        self.detach(id);
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            let node = &mut self.nodes[next.0];
            node.alive = false;
            stack.extend(node.children.iter().copied());
        }
    }

    /// Replace an element with its children
    pub fn unwrap(&mut self, id: NodeId) {
        let Some(parent) = self.nodes[id.0].parent else {
            return;
        };
        let Some(index) = self.index_in_parent(id) else {
            return;
        };
        let children = std::mem::take(&mut self.nodes[id.0].children);
        for child in &children {
            self.nodes[child.0].parent = Some(parent);
        }
        let siblings = &mut self.nodes[parent.0].children;
        siblings.remove(index);
        for (offset, child) in children.into_iter().enumerate() {
            siblings.insert(index + offset, child);
        }
        let node = &mut self.nodes[id.0];
        node.parent = None;
        node.alive = false;
    }

    /// Swap a node for a fresh text node in the same position
    pub fn replace_with_text(&mut self, id: NodeId, text: impl Into<String>) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        let replacement = self.create_text(text);
        self.insert_child(parent, index, replacement);
        self.remove(id);
        Some(replacement)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn is_alive(&self, id: NodeId) -> bool {
        self.nodes[id.0].alive
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|child| *child == id)
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.0].data {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn tag(&self, id: NodeId) -> Option<&Tag> {
        self.element(id).map(|element| &element.tag)
    }

    pub fn is_tag(&self, id: NodeId, tag: &Tag) -> bool {
        self.tag(id) == Some(tag)
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attribute_entry(id, name).map(|attr| attr.value.as_str())
    }

    pub fn attribute_entry(&self, id: NodeId, name: &str) -> Option<&Attribute> {
        self.element(id)?
            .attributes
            .iter()
            .find(|attr| attr.name == name)
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].data {
            NodeData::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        if let NodeData::Text(existing) = &mut self.nodes[id.0].data {
            *existing = text.into();
        }
    }

    /// Pre-order descendants of `id`, not including `id` itself
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            result.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        result
    }

    pub fn elements_by_tag(&self, tag: &Tag) -> Vec<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .filter(|id| self.is_tag(*id, tag))
            .collect()
    }

    pub fn ancestor_with_tag(&self, id: NodeId, tag: &Tag) -> Option<NodeId> {
        let mut current = self.parent(id);
        while let Some(candidate) = current {
            if self.is_tag(candidate, tag) {
                return Some(candidate);
            }
            current = self.parent(candidate);
        }
        None
    }

    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = self.parent(id);
        while let Some(candidate) = current {
            if candidate == ancestor {
                return true;
            }
            current = self.parent(candidate);
        }
        false
    }

    /// The node itself if it is text, otherwise its first non-empty text descendant
    pub fn first_text_descendant(&self, id: NodeId) -> Option<NodeId> {
        if self.text(id).is_some() {
            return Some(id);
        }
        self.descendants(id)
            .into_iter()
            .find(|node| self.text(*node).is_some_and(|text| !text.is_empty()))
    }

    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(text) = self.text(id) {
            return text.to_string();
        }
        self.descendants(id)
            .into_iter()
            .filter_map(|node| self.text(node))
            .collect()
    }

    /// Serialize the whole tree back to markup
    pub fn serialize(&self) -> String {
        enum Step<'d> {
            Open(NodeId),
            Close(&'d str),
        }

        let mut out = String::new();
        let mut steps: Vec<Step> = self
            .children(self.root())
            .iter()
            .rev()
            .map(|id| Step::Open(*id))
            .collect();
        while let Some(step) = steps.pop() {
            let id = match step {
                Step::Open(id) => id,
                Step::Close(name) => {
                    out.push_str("</");
                    out.push_str(name);
                    out.push('>');
                    continue;
                }
            };
            if self.write_open(id, &mut out) {
                if let Some(element) = self.element(id) {
                    steps.push(Step::Close(element.tag.name()));
                }
                steps.extend(self.children(id).iter().rev().map(|child| Step::Open(*child)));
            }
        }
        out
    }

    /// Write a node's opening tag, or the whole node when it has no content.
    /// True when its children and closing tag still have to follow.
    fn write_open(&self, id: NodeId, out: &mut String) -> bool {
        let node = self.node(id);
        let element = match &node.data {
            NodeData::Root => return false,
            NodeData::Text(text) => {
                escape_text(text, out);
                return false;
            }
            NodeData::Element(element) => element,
        };

        match element.tag {
            Tag::Null => return false,
            Tag::Sentence if node.children.is_empty() => return false,
            _ => {}
        }

        out.push('<');
        out.push_str(element.tag.name());
        for attr in &element.attributes {
            out.push(' ');
            out.push_str(&attr.name);
            out.push('=');
            out.push(attr.quote);
            escape_attribute(&attr.value, attr.quote, out);
            out.push(attr.quote);
        }

        // Lists are always written as explicit pairs so an empty list survives
        if node.children.is_empty() && element.self_closing && element.tag != Tag::ItemList {
            out.push_str("/>");
            return false;
        }
        out.push('>');
        true
    }
}

fn escape_text(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

fn escape_attribute(value: &str, quote: char, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' if quote == '"' => out.push_str("&quot;"),
            '\'' if quote == '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
}

/// Tidy serialized markup after an edit: collapse repeated spaces,
/// drop the gap between the last sentence and `</desc>`, and trim
pub fn normalize_markup(markup: &str) -> String {
    let mut collapsed = String::with_capacity(markup.len());
    let mut previous_space = false;
    for ch in markup.chars() {
        if ch == ' ' {
            if previous_space {
                continue;
            }
            previous_space = true;
        } else {
            previous_space = false;
        }
        collapsed.push(ch);
    }
    collapsed.replace("</s> </desc>", "</s></desc>").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Document, NodeId, NodeId) {
        let mut doc = Document::new();
        let desc = doc.create_element(Tag::Desc);
        let root = doc.root();
        doc.append_child(root, desc);
        let sentence = doc.create_element(Tag::Sentence);
        doc.append_child(desc, sentence);
        let text = doc.create_text("A lamp & a desk.");
        doc.append_child(sentence, text);
        (doc, desc, sentence)
    }

    #[test]
    fn test_serialize_escapes_text() {
        let (doc, _, _) = sample();
        assert_eq!(doc.serialize(), "<desc><s>A lamp &amp; a desk.</s></desc>");
    }

    #[test]
    fn test_empty_sentence_dropped_and_list_kept() {
        let (mut doc, desc, sentence) = sample();
        doc.remove(sentence);
        let second = doc.create_element(Tag::Sentence);
        doc.append_child(desc, second);
        let list = doc.create_element(Tag::ItemList);
        doc.append_child(second, list);
        let placeholder = doc.create_element(Tag::Null);
        doc.append_child(list, placeholder);
        assert_eq!(doc.serialize(), "<desc><s><il></il></s></desc>");
    }

    #[test]
    fn test_serialize_deeply_nested_tree() {
        let (mut doc, _, sentence) = sample();
        let mut parent = sentence;
        for _ in 0..50_000 {
            let conditional = doc.create_element(Tag::If);
            doc.append_child(parent, conditional);
            parent = conditional;
        }
        let text = doc.create_text("x");
        doc.append_child(parent, text);

        let markup = doc.serialize();
        assert!(markup.ends_with(&format!("x{}</s></desc>", "</if>".repeat(50_000))));
    }

    #[test]
    fn test_remove_marks_subtree_dead() {
        let (mut doc, desc, sentence) = sample();
        let text = doc.children(sentence)[0];
        doc.remove(desc);
        assert!(!doc.is_alive(desc));
        assert!(!doc.is_alive(sentence));
        assert!(!doc.is_alive(text));
        assert_eq!(doc.serialize(), "");
    }

    #[test]
    fn test_unwrap_keeps_children_in_place() {
        let mut doc = Document::new();
        let root = doc.root();
        let outer = doc.create_element(Tag::Procedural);
        doc.append_child(root, outer);
        let before = doc.create_text("a ");
        doc.append_child(outer, before);
        let after = doc.create_text("b");
        doc.append_child(outer, after);
        doc.unwrap(outer);
        assert_eq!(doc.children(root), &[before, after]);
        assert_eq!(doc.serialize(), "a b");
    }

    #[test]
    fn test_normalize_markup() {
        assert_eq!(
            normalize_markup(" <desc><s>Two  spaces.</s> </desc> "),
            "<desc><s>Two spaces.</s></desc>"
        );
    }
}

/// Parser for description markup
///
/// The parser never fails: structural problems are collected as diagnostics
/// and the tree is built as far as the input allows.
pub mod expression;

pub use expression::{parse_expression, ExpressionError};

use crate::diagnostic::{MarkupDiagnostic, MarkupIssue};
use crate::document::{Attribute, Document, Element, NodeData, NodeId, Tag};
use crate::span::Span;

/// A parsed tree together with everything that looked wrong in the markup
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub document: Document,
    pub diagnostics: Vec<MarkupDiagnostic>,
}

pub fn parse(markup: &str) -> ParsedDocument {
    Parser::new(markup).parse()
}

struct OpenElement {
    id: NodeId,
    name: String,
    start: usize,
}

pub struct Parser {
    input: Vec<char>,
    pos: usize,
    document: Document,
    open: Vec<OpenElement>,
    diagnostics: Vec<MarkupDiagnostic>,
}

impl Parser {
    pub fn new(input: &str) -> Self {
        Parser {
            input: input.chars().collect(),
            pos: 0,
            document: Document::new(),
            open: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn parse(mut self) -> ParsedDocument {
        while let Some(ch) = self.peek_char() {
            if ch == '<' {
                self.parse_markup();
            } else {
                self.parse_text();
            }
        }

        // Anything still open at the end is closed implicitly
        while let Some(open) = self.open.pop() {
            let span = Span::new(open.start, open.start + open.name.chars().count() + 1);
            self.report(MarkupIssue::UnclosedElement(open.name), span);
            self.document.set_span(open.id, Span::new(open.start, self.pos));
        }

        self.validate();

        ParsedDocument {
            document: self.document,
            diagnostics: self.diagnostics,
        }
    }

    fn report(&mut self, issue: MarkupIssue, span: Span) {
        self.diagnostics.push(MarkupDiagnostic::new(issue, span));
    }

    fn current_parent(&self) -> NodeId {
        self.open
            .last()
            .map(|open| open.id)
            .unwrap_or_else(|| self.document.root())
    }

    fn parse_markup(&mut self) {
        let start = self.pos;
        match self.peek_ahead(1) {
            Some('/') => self.parse_closing_tag(start),
            Some('!') if self.starts_with("<!--") => self.skip_comment(start),
            Some('?') => self.skip_declaration(),
            Some(c) if is_name_start(c) => self.parse_opening_tag(start),
            _ => {
                self.advance();
                self.push_text("<".to_string(), Span::new(start, self.pos));
                self.report(MarkupIssue::StrayAngleBracket, Span::new(start, self.pos));
            }
        }
    }

    fn parse_opening_tag(&mut self, start: usize) {
        self.consume_char('<');
        let name = self.parse_name();
        let mut attributes: Vec<Attribute> = Vec::new();

        let self_closing = loop {
            self.skip_whitespace();
            match self.peek_char() {
                None => {
                    self.report(
                        MarkupIssue::UnterminatedTag(name),
                        Span::new(start, self.pos),
                    );
                    return;
                }
                Some('>') => {
                    self.advance();
                    break false;
                }
                Some('/') if self.peek_ahead(1) == Some('>') => {
                    self.advance();
                    self.advance();
                    break true;
                }
                Some(c) if is_name_start(c) => {
                    let attr_start = self.pos;
                    let attribute = self.parse_attribute();
                    if attributes.iter().any(|existing| existing.name == attribute.name) {
                        self.report(
                            MarkupIssue::DuplicateAttribute(attribute.name),
                            Span::new(attr_start, self.pos),
                        );
                    } else {
                        attributes.push(attribute);
                    }
                }
                Some(c) => {
                    self.report(
                        MarkupIssue::UnexpectedCharacter(c),
                        Span::new(self.pos, self.pos + 1),
                    );
                    self.advance();
                }
            }
        };

        let element = Element {
            tag: Tag::from_name(&name),
            attributes,
            self_closing,
        };
        let id = self
            .document
            .create_parsed_element(element, Span::new(start, self.pos));
        let parent = self.current_parent();
        self.document.append_child(parent, id);

        if !self_closing {
            self.open.push(OpenElement { id, name, start });
        }
    }

    fn parse_attribute(&mut self) -> Attribute {
        let name_start = self.pos;
        let name = self.parse_name();
        self.skip_whitespace();

        if self.peek_char() != Some('=') {
            self.report(
                MarkupIssue::MissingAttributeValue(name.clone()),
                Span::new(name_start, self.pos),
            );
            return Attribute {
                name,
                value: String::new(),
                quote: '"',
                span: Span::new(self.pos, self.pos),
            };
        }
        self.consume_char('=');
        self.skip_whitespace();

        match self.peek_char() {
            Some(quote @ ('"' | '\'')) => {
                self.advance();
                let value_start = self.pos;
                let mut value = String::new();
                while let Some(ch) = self.peek_char() {
                    if ch == quote {
                        break;
                    }
                    if ch == '&' {
                        let entity = self.parse_entity();
                        value.push_str(&entity);
                    } else {
                        value.push(ch);
                        self.advance();
                    }
                }
                let value_end = self.pos;
                self.consume_char(quote);
                Attribute {
                    name,
                    value,
                    quote,
                    span: Span::new(value_start, value_end),
                }
            }
            _ => {
                let value_start = self.pos;
                let mut value = String::new();
                while let Some(ch) = self.peek_char() {
                    if ch.is_whitespace()
                        || ch == '>'
                        || (ch == '/' && self.peek_ahead(1) == Some('>'))
                    {
                        break;
                    }
                    value.push(ch);
                    self.advance();
                }
                self.report(
                    MarkupIssue::UnquotedAttribute(name.clone()),
                    Span::new(name_start, self.pos),
                );
                Attribute {
                    name,
                    value,
                    quote: '"',
                    span: Span::new(value_start, self.pos),
                }
            }
        }
    }

    fn parse_closing_tag(&mut self, start: usize) {
        self.consume_char('<');
        self.consume_char('/');
        let name = self.parse_name();
        self.skip_whitespace();
        if !self.consume_char('>') {
            self.report(
                MarkupIssue::UnterminatedTag(name.clone()),
                Span::new(start, self.pos),
            );
        }

        let Some(depth) = self.open.iter().rposition(|open| open.name == name) else {
            self.report(
                MarkupIssue::UnexpectedClosingTag(name),
                Span::new(start, self.pos),
            );
            return;
        };

        while self.open.len() > depth + 1 {
            if let Some(unclosed) = self.open.pop() {
                let span = Span::new(
                    unclosed.start,
                    unclosed.start + unclosed.name.chars().count() + 1,
                );
                self.report(MarkupIssue::UnclosedElement(unclosed.name), span);
                self.document
                    .set_span(unclosed.id, Span::new(unclosed.start, start));
            }
        }
        if let Some(closed) = self.open.pop() {
            self.document
                .set_span(closed.id, Span::new(closed.start, self.pos));
        }
    }

    fn skip_comment(&mut self, start: usize) {
        self.pos += 4;
        while !self.is_eof() {
            if self.starts_with("-->") {
                self.pos += 3;
                return;
            }
            self.advance();
        }
        self.report(MarkupIssue::UnterminatedComment, Span::new(start, self.pos));
    }

    fn skip_declaration(&mut self) {
        while let Some(ch) = self.peek_char() {
            self.advance();
            if ch == '>' {
                break;
            }
        }
    }

    fn parse_text(&mut self) {
        let start = self.pos;
        let mut text = String::new();
        while let Some(ch) = self.peek_char() {
            if ch == '<' {
                break;
            }
            if ch == '&' {
                let entity = self.parse_entity();
                text.push_str(&entity);
            } else {
                text.push(ch);
                self.advance();
            }
        }
        self.push_text(text, Span::new(start, self.pos));
    }

    /// Append text to the current element, merging with a preceding text node
    fn push_text(&mut self, text: String, span: Span) {
        if text.is_empty() {
            return;
        }
        let parent = self.current_parent();
        if let Some(&last) = self.document.children(parent).last() {
            if let Some(existing) = self.document.text(last) {
                let merged = format!("{}{}", existing, text);
                let merged_span = Span::merge(self.document.node(last).span, span);
                self.document.set_text(last, merged);
                self.document.set_span(last, merged_span);
                return;
            }
        }
        let id = self.document.create_parsed_text(text, span);
        self.document.append_child(parent, id);
    }

    /// Decode an entity starting at '&'. A bare '&' is kept as written.
    fn parse_entity(&mut self) -> String {
        let start = self.pos;
        self.consume_char('&');

        let mut name = String::new();
        let mut lookahead = self.pos;
        while let Some(&ch) = self.input.get(lookahead) {
            if ch == ';' || name.len() > 10 || !(ch.is_ascii_alphanumeric() || ch == '#') {
                break;
            }
            name.push(ch);
            lookahead += 1;
        }
        if name.is_empty() || self.input.get(lookahead) != Some(&';') {
            return "&".to_string();
        }
        self.pos = lookahead + 1;

        match decode_entity(&name) {
            Some(ch) => ch.to_string(),
            None => {
                self.report(
                    MarkupIssue::UnknownEntity(name.clone()),
                    Span::new(start, self.pos),
                );
                format!("&{};", name)
            }
        }
    }

    /// Document-level checks that need the finished tree
    fn validate(&mut self) {
        let root = self.document.root();
        let top_level: Vec<NodeId> = self
            .document
            .children(root)
            .iter()
            .copied()
            .filter(|id| {
                self.document
                    .text(*id)
                    .map_or(true, |text| !text.trim().is_empty())
            })
            .collect();
        let has_desc_root =
            top_level.len() == 1 && self.document.is_tag(top_level[0], &Tag::Desc);
        if !has_desc_root {
            self.report(
                MarkupIssue::MissingDescRoot,
                Span::new(0, self.input.len()),
            );
        }

        for sentence in self.document.elements_by_tag(&Tag::Sentence) {
            let lists = self
                .document
                .descendants(sentence)
                .into_iter()
                .filter(|id| self.document.is_tag(*id, &Tag::ItemList))
                .count();
            if lists > 1 {
                let span = self.document.node(sentence).span;
                self.report(MarkupIssue::MultipleItemLists, span);
            }
        }

        for item in self.document.elements_by_tag(&Tag::Item) {
            if self
                .document
                .ancestor_with_tag(item, &Tag::ItemList)
                .is_none()
            {
                let span = self.document.node(item).span;
                self.report(MarkupIssue::ItemOutsideList, span);
            }
        }

        // An explicitly empty list gets a placeholder so it is never mistaken
        // for a self-closing element
        for list in self.document.elements_by_tag(&Tag::ItemList) {
            if self.document.children(list).is_empty() {
                let mut element = Element::new(Tag::Null);
                element.self_closing = true;
                let span = self.document.node(list).span;
                let placeholder = self.document.create_parsed_element(element, span);
                self.document.append_child(list, placeholder);
            }
        }
    }

    fn parse_name(&mut self) -> String {
        let mut name = String::new();
        while let Some(ch) = self.peek_char() {
            if ch.is_alphanumeric() || matches!(ch, '-' | '_' | ':' | '.') {
                name.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        name
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn starts_with(&self, pattern: &str) -> bool {
        pattern
            .chars()
            .enumerate()
            .all(|(offset, ch)| self.input.get(self.pos + offset) == Some(&ch))
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn peek_ahead(&self, offset: usize) -> Option<char> {
        self.input.get(self.pos + offset).copied()
    }

    fn advance(&mut self) {
        if self.pos < self.input.len() {
            self.pos += 1;
        }
    }

    fn consume_char(&mut self, expected: char) -> bool {
        if self.peek_char() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }
}

fn is_name_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}

/// Decode the body of an entity reference (the part between '&' and ';')
pub fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = name.strip_prefix('#')?;
            let value = match code.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse::<u32>().ok()?,
            };
            char::from_u32(value)
        }
    }
}

/// Check whether a node is whitespace-only text
pub(crate) fn is_blank(document: &Document, id: NodeId) -> bool {
    matches!(&document.node(id).data, NodeData::Text(text) if text.trim().is_empty())
}

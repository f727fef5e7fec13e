//! Sentence and clause views over a parsed description
//!
//! A clause is one non-empty text node. Clauses whose parent is an `<item>`
//! are item clauses: they are numbered within their sentence and carry the
//! quantity parsed from their leading digits.

use crate::document::{Document, NodeId, Tag};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub node: NodeId,
    pub text: String,
    pub is_item: bool,
    /// 1-based position among the item clauses of the sentence
    pub item_index: Option<usize>,
    /// Leading quantity of an item clause (1 when the text has none), 0 for prose
    pub item_quantity: u32,
}

impl Clause {
    /// Collect the clauses under `scope` in document order
    pub fn collect(document: &Document, scope: NodeId) -> Vec<Clause> {
        let mut clauses = Vec::new();
        let mut item_count = 0;
        for id in document.descendants(scope) {
            let Some(text) = document.text(id) else {
                continue;
            };
            if text.is_empty() {
                continue;
            }
            let is_item = document
                .parent(id)
                .is_some_and(|parent| document.is_tag(parent, &Tag::Item));
            let (item_index, item_quantity) = if is_item {
                item_count += 1;
                (Some(item_count), leading_quantity(text))
            } else {
                (None, 0)
            };
            clauses.push(Clause {
                node: id,
                text: text.to_string(),
                is_item,
                item_index,
                item_quantity,
            });
        }
        clauses
    }
}

/// One `<s>` element with its clauses and (first) item list
#[derive(Debug, Clone)]
pub struct Sentence {
    pub node: NodeId,
    pub clauses: Vec<Clause>,
    pub item_count: usize,
    pub item_list: Option<NodeId>,
    /// Name of the item list, empty for the default list
    pub list_name: String,
}

impl Sentence {
    pub fn extract(document: &Document, node: NodeId) -> Sentence {
        let clauses = Clause::collect(document, node);
        let item_count = clauses.iter().filter(|clause| clause.is_item).count();
        let item_list = document
            .descendants(node)
            .into_iter()
            .find(|id| document.is_tag(*id, &Tag::ItemList));
        let list_name = item_list
            .and_then(|list| document.attribute(list, "name"))
            .unwrap_or_default()
            .to_string();
        Sentence {
            node,
            clauses,
            item_count,
            item_list,
            list_name,
        }
    }

    /// Every sentence in the document, in document order
    pub fn all(document: &Document) -> Vec<Sentence> {
        document
            .elements_by_tag(&Tag::Sentence)
            .into_iter()
            .map(|node| Sentence::extract(document, node))
            .collect()
    }

    pub fn item_clauses(&self) -> impl Iterator<Item = &Clause> {
        self.clauses.iter().filter(|clause| clause.is_item)
    }
}

/// Quantity stated by leading digits, 1 when the text does not start with a number
pub fn leading_quantity(text: &str) -> u32 {
    let digits: String = text.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return 1;
    }
    digits.parse().unwrap_or(u32::MAX)
}

/// Byte range of the first run of ASCII digits in `text`
pub fn first_number(text: &str) -> Option<(std::ops::Range<usize>, u32)> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let len = text[start..]
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len() - start);
    let range = start..start + len;
    let value = text[range.clone()].parse().ok()?;
    Some((range, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn test_sentence_clauses() {
        let parsed = parse(
            r#"<desc><s>On these shelves are <il name="SHELF"><item>3 bottles of ZZZQUIL</item>, a jar, and <item>a bottle of LAXATIVES</item></il>.</s></desc>"#,
        );
        let sentences = Sentence::all(&parsed.document);
        assert_eq!(sentences.len(), 1);
        let sentence = &sentences[0];
        assert_eq!(sentence.item_count, 2);
        assert_eq!(sentence.list_name, "SHELF");
        assert!(sentence.item_list.is_some());

        let texts: Vec<&str> = sentence.clauses.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "On these shelves are ",
                "3 bottles of ZZZQUIL",
                ", a jar, and ",
                "a bottle of LAXATIVES",
                "."
            ]
        );

        let items: Vec<(Option<usize>, u32)> = sentence
            .item_clauses()
            .map(|c| (c.item_index, c.item_quantity))
            .collect();
        assert_eq!(items, vec![(Some(1), 3), (Some(2), 1)]);
    }

    #[test]
    fn test_sentence_without_list() {
        let parsed = parse("<desc><s>A plain room.</s></desc>");
        let sentence = &Sentence::all(&parsed.document)[0];
        assert_eq!(sentence.item_list, None);
        assert_eq!(sentence.list_name, "");
        assert_eq!(sentence.clauses[0].item_quantity, 0);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(leading_quantity("12 eggs"), 12);
        assert_eq!(leading_quantity("a dozen eggs"), 1);
        assert_eq!(first_number("a pack of 24 eggs"), Some((10..12, 24)));
        assert_eq!(first_number("no digits"), None);
    }
}

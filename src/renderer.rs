//! Turning a resolved description into display text
use crate::document::{Document, Tag};
use crate::parser::decode_entity;

/// Longest entity body `strip_markup` will look at
const MAX_ENTITY_LEN: usize = 32;

/// Render a fully resolved document as plain text
///
/// Line breaks become newlines; every other tag is dropped.
pub fn display_text(document: &mut Document) -> String {
    for line_break in document.elements_by_tag(&Tag::Br) {
        if document.is_alive(line_break) {
            document.replace_with_text(line_break, "\n");
        }
    }
    strip_markup(&document.serialize())
}

/// Remove tags, decode entities and collapse whitespace
///
/// Works on any markup string. A `<` that does not start a tag is kept as text.
pub fn strip_markup(markup: &str) -> String {
    let chars: Vec<char> = markup.chars().collect();
    let mut out = String::with_capacity(markup.len());
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '<' => {
                if let Some(end) = tag_end(&chars, i) {
                    i = end + 1;
                    continue;
                }
            }
            '&' => {
                if let Some((decoded, next)) = entity_at(&chars, i) {
                    out.push(decoded);
                    i = next;
                    continue;
                }
            }
            _ => {}
        }
        out.push(chars[i]);
        i += 1;
    }
    collapse_whitespace(&out)
}

/// Index of the `>` closing a tag that starts at `start`
fn tag_end(chars: &[char], start: usize) -> Option<usize> {
    let mut i = start + 1;
    if chars.get(i) == Some(&'/') {
        i += 1;
    }
    if !chars.get(i).is_some_and(|c| c.is_alphabetic() || *c == '_') {
        return None;
    }
    let mut quote = None;
    while let Some(&c) = chars.get(i) {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '"' | '\'' => quote = Some(c),
                '>' => return Some(i),
                '<' => return None,
                _ => {}
            },
        }
        i += 1;
    }
    None
}

fn entity_at(chars: &[char], start: usize) -> Option<(char, usize)> {
    let body_start = start + 1;
    let length = chars
        .get(body_start..)?
        .iter()
        .take(MAX_ENTITY_LEN)
        .position(|c| *c == ';')?;
    let name: String = chars[body_start..body_start + length].iter().collect();
    let decoded = decode_entity(&name)?;
    Some((decoded, body_start + length + 1))
}

/// Collapse runs of spaces and tabs, drop spaces around newlines, and trim
fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    for ch in text.chars() {
        match ch {
            ' ' | '\t' => pending_space = true,
            '\n' => {
                pending_space = false;
                while out.ends_with(' ') {
                    out.pop();
                }
                out.push('\n');
            }
            _ => {
                if pending_space && !out.is_empty() && !out.ends_with('\n') {
                    out.push(' ');
                }
                pending_space = false;
                out.push(ch);
            }
        }
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn test_strip_markup() {
        assert_eq!(
            strip_markup(r#"<desc><s>A <il name="T"><item>cup</item></il>.</s></desc>"#),
            "A cup."
        );
        assert_eq!(strip_markup("fish &amp; chips &lt;3"), "fish & chips <3");
        assert_eq!(strip_markup("1 < 2 and  3 > 2"), "1 < 2 and 3 > 2");
        assert_eq!(strip_markup("&amp;lt;"), "&lt;");
        assert_eq!(strip_markup("  spaced\t\tout  "), "spaced out");
    }

    #[test]
    fn test_quoted_angle_bracket_inside_tag() {
        assert_eq!(strip_markup(r#"<var v="a > b"/>done"#), "done");
    }

    #[test]
    fn test_line_breaks() {
        let mut parsed = parse("<desc><s>The door creaks.</s> <br/> <s>Something moves.</s></desc>");
        assert_eq!(
            display_text(&mut parsed.document),
            "The door creaks.\nSomething moves."
        );
    }
}

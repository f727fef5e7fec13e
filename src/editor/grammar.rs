/// Small English helpers used when rewriting item lists
use std::ops::Range;

/// Words allowed between a governing verb and the list: "There are also ..."
const ADVERBS: [&str; 5] = ["also", "still", "only", "just", "now"];

pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
    }
}

/// Lower-case the first letter unless the word looks like an acronym or a
/// single capital ("ROSE OF SHARON" and "I" stay as they are)
pub fn decapitalize(s: &str) -> String {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(first), Some(second)) if first.is_uppercase() && !second.is_uppercase() => {
            first.to_lowercase().collect::<String>() + &s[first.len_utf8()..]
        }
        _ => s.to_string(),
    }
}

pub fn starts_uppercase(s: &str) -> bool {
    s.chars().next().is_some_and(char::is_uppercase)
}

fn words(text: &str) -> Vec<(Range<usize>, &str)> {
    let mut words = Vec::new();
    let mut start = None;
    for (i, ch) in text.char_indices() {
        match (ch.is_whitespace(), start) {
            (true, Some(s)) => {
                words.push((s..i, &text[s..i]));
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        words.push((s..text.len(), &text[s..]));
    }
    words
}

fn is_verb(word: &str) -> bool {
    word.eq_ignore_ascii_case("is") || word.eq_ignore_ascii_case("are")
}

/// "is"/"are" ending the text, optionally followed by adverbs only
pub fn trailing_verb(text: &str) -> Option<Range<usize>> {
    let words = words(text);
    let (range, word) = words
        .into_iter()
        .rev()
        .find(|(_, word)| !ADVERBS.contains(&word.to_lowercase().as_str()))?;
    is_verb(word).then_some(range)
}

/// "is"/"are" as the very first word of the text
pub fn leading_verb(text: &str) -> Option<Range<usize>> {
    let (range, word) = words(text).into_iter().next()?;
    is_verb(word).then_some(range)
}

/// Conjugate a verb found by `trailing_verb`/`leading_verb`, keeping its case
pub fn conjugate(verb: &str, plural: bool) -> String {
    let base = if plural { "are" } else { "is" };
    if verb.len() > 1 && verb.chars().all(char::is_uppercase) {
        base.to_uppercase()
    } else if starts_uppercase(verb) {
        capitalize(base)
    } else {
        base.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_helpers() {
        assert_eq!(capitalize("a bottle of RUM"), "A bottle of RUM");
        assert_eq!(decapitalize("A bottle of RUM"), "a bottle of RUM");
        assert_eq!(decapitalize("ROSE OF SHARON"), "ROSE OF SHARON");
        assert_eq!(decapitalize("I"), "I");
        assert_eq!(decapitalize(""), "");
    }

    #[test]
    fn test_trailing_verb() {
        let text = "On these shelves is ";
        assert_eq!(trailing_verb(text).map(|r| &text[r]), Some("is"));
        let text = "There are also ";
        assert_eq!(trailing_verb(text).map(|r| &text[r]), Some("are"));
        assert_eq!(trailing_verb("The shelves are lined with "), None);
        assert_eq!(trailing_verb("Here, among others, is, "), None);
        assert_eq!(trailing_verb("you find "), None);
    }

    #[test]
    fn test_leading_verb() {
        let text = " are on these shelves.";
        assert_eq!(leading_verb(text), Some(1..4));
        assert_eq!(leading_verb(", which are here."), None);
        assert_eq!(leading_verb("."), None);
    }

    #[test]
    fn test_conjugate_keeps_case() {
        assert_eq!(conjugate("is", true), "are");
        assert_eq!(conjugate("Are", false), "Is");
        assert_eq!(conjugate("IS", true), "ARE");
    }
}

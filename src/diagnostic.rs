/// Diagnostics collected while parsing, editing and rendering descriptions
use crate::span::Span;
use ariadne::{Color, Label, Report, ReportKind, Source};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Structural problems found in description markup. None of them are fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MarkupIssue {
    #[error("element <{0}> is never closed")]
    UnclosedElement(String),
    #[error("closing tag </{0}> has no matching opening tag")]
    UnexpectedClosingTag(String),
    #[error("tag <{0}> is not terminated")]
    UnterminatedTag(String),
    #[error("comment is not terminated")]
    UnterminatedComment,
    #[error("attribute '{0}' has no value")]
    MissingAttributeValue(String),
    #[error("value of attribute '{0}' is not quoted")]
    UnquotedAttribute(String),
    #[error("attribute '{0}' is repeated")]
    DuplicateAttribute(String),
    #[error("unexpected character '{0}' inside a tag")]
    UnexpectedCharacter(char),
    #[error("unknown entity '&{0};'")]
    UnknownEntity(String),
    #[error("stray '<' treated as text")]
    StrayAngleBracket,
    #[error("description is not wrapped in a single <desc> element")]
    MissingDescRoot,
    #[error("sentence contains more than one item list")]
    MultipleItemLists,
    #[error("<item> appears outside of an item list")]
    ItemOutsideList,
}

impl MarkupIssue {
    pub fn severity(&self) -> Severity {
        match self {
            MarkupIssue::UnclosedElement(_)
            | MarkupIssue::UnexpectedClosingTag(_)
            | MarkupIssue::UnterminatedTag(_)
            | MarkupIssue::UnterminatedComment => Severity::Error,
            _ => Severity::Warning,
        }
    }
}

/// A markup issue with its location in the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupDiagnostic {
    pub severity: Severity,
    pub issue: MarkupIssue,
    pub span: Span,
}

impl MarkupDiagnostic {
    pub fn new(issue: MarkupIssue, span: Span) -> Self {
        MarkupDiagnostic {
            severity: issue.severity(),
            issue,
            span,
        }
    }
}

impl fmt::Display for MarkupDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.issue, self.span.start)
    }
}

/// Warning and error messages handed back to callers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn push_markup(&mut self, diagnostic: &MarkupDiagnostic) {
        match diagnostic.severity {
            Severity::Warning => self.warn(diagnostic.to_string()),
            Severity::Error => self.error(diagnostic.to_string()),
        }
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.warnings.extend(other.warnings);
        self.errors.extend(other.errors);
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty() && self.errors.is_empty()
    }
}

fn help_for(issue: &MarkupIssue) -> Option<&'static str> {
    match issue {
        MarkupIssue::UnclosedElement(_) => Some("Add the matching closing tag"),
        MarkupIssue::UnquotedAttribute(_) => Some("Wrap attribute values in quotes"),
        MarkupIssue::UnknownEntity(_) => {
            Some("Known entities are &amp;, &lt;, &gt;, &quot;, &apos; and numeric references")
        }
        MarkupIssue::MissingDescRoot => Some("Wrap the description in <desc>...</desc>"),
        MarkupIssue::MultipleItemLists => {
            Some("Split the sentence so each <s> holds at most one <il>")
        }
        MarkupIssue::ItemOutsideList => Some("Move the <item> inside an <il> element"),
        _ => None,
    }
}

/// Render a markup diagnostic as an ariadne report
pub fn report_markup_diagnostic(
    source_name: &str,
    source: &str,
    diagnostic: &MarkupDiagnostic,
) -> String {
    let (kind, color) = match diagnostic.severity {
        Severity::Warning => (ReportKind::Warning, Color::Yellow),
        Severity::Error => (ReportKind::Error, Color::Red),
    };

    let source_len = source.chars().count();
    let start = diagnostic.span.start.min(source_len);
    let end = diagnostic.span.end.clamp(start, source_len);

    let mut report = Report::build(kind, source_name, start)
        .with_message(diagnostic.issue.to_string())
        .with_label(
            Label::new((source_name, start..end))
                .with_message(diagnostic.issue.to_string())
                .with_color(color),
        );
    if let Some(help) = help_for(&diagnostic.issue) {
        report = report.with_help(help);
    }

    let mut output = Vec::new();
    if let Err(e) = report
        .finish()
        .write((source_name, Source::from(source)), &mut output)
    {
        return format!("{}: {} ({})", diagnostic.severity, diagnostic, e);
    }

    String::from_utf8_lossy(&output).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unclosed_element_report() {
        let source = "<desc><s>A lamp.</desc>";
        let diagnostic = MarkupDiagnostic::new(
            MarkupIssue::UnclosedElement("s".to_string()),
            Span::new(6, 9),
        );
        let report = report_markup_diagnostic("lamp.desc", source, &diagnostic);
        assert!(report.contains("element <s> is never closed"));
        assert!(!report.is_empty());
    }

    #[test]
    fn test_severity_routing() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push_markup(&MarkupDiagnostic::new(
            MarkupIssue::UnknownEntity("nbsp".to_string()),
            Span::new(0, 6),
        ));
        diagnostics.push_markup(&MarkupDiagnostic::new(
            MarkupIssue::UnterminatedTag("il".to_string()),
            Span::new(0, 3),
        ));
        assert_eq!(diagnostics.warnings, vec!["unknown entity '&nbsp;' at offset 0"]);
        assert_eq!(diagnostics.errors.len(), 1);
    }
}

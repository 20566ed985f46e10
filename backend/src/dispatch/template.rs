//! Message templates
//!
//! A template is free text with `{santee}` (required) and `{santa}`
//! placeholders. `{{` and `}}` produce literal braces. Templates are parsed
//! up front so a bad template fails the run before any assignment is drawn.

use std::str::FromStr;
use thiserror::Error;

/// Placeholder replaced with the santee's identity
pub const SANTEE_PLACEHOLDER: &str = "santee";

/// Placeholder replaced with the recipient's own identity
pub const SANTA_PLACEHOLDER: &str = "santa";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template never mentions {{santee}}; recipients would not learn who they give to")]
    MissingSanteePlaceholder,

    #[error("unknown placeholder {{{name}}} at byte {offset}")]
    UnknownPlaceholder { name: String, offset: usize },

    #[error("unclosed '{{' at byte {offset}")]
    UnclosedBrace { offset: usize },

    #[error("unmatched '}}' at byte {offset}; use '}}}}' for a literal brace")]
    StrayClosingBrace { offset: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Santa,
    Santee,
}

/// Parsed message template
///
/// # Example
/// ```
/// use secret_santa_core::Template;
///
/// let template: Template = "Hi {santa}, you give to {santee}. {{no peeking}}".parse().unwrap();
/// assert_eq!(
///     template.render("Alice", "Bob"),
///     "Hi Alice, you give to Bob. {no peeking}"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut text = String::new();
        let mut chars = source.char_indices().peekable();

        while let Some((offset, c)) = chars.next() {
            match c {
                '{' if matches!(chars.peek(), Some((_, '{'))) => {
                    chars.next();
                    text.push('{');
                }
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for (_, c) in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        name.push(c);
                    }
                    if !closed {
                        return Err(TemplateError::UnclosedBrace { offset });
                    }

                    let segment = if name == SANTEE_PLACEHOLDER {
                        Segment::Santee
                    } else if name == SANTA_PLACEHOLDER {
                        Segment::Santa
                    } else {
                        return Err(TemplateError::UnknownPlaceholder { name, offset });
                    };
                    if !text.is_empty() {
                        segments.push(Segment::Text(std::mem::take(&mut text)));
                    }
                    segments.push(segment);
                }
                '}' if matches!(chars.peek(), Some((_, '}'))) => {
                    chars.next();
                    text.push('}');
                }
                '}' => return Err(TemplateError::StrayClosingBrace { offset }),
                c => text.push(c),
            }
        }
        if !text.is_empty() {
            segments.push(Segment::Text(text));
        }

        if !segments.contains(&Segment::Santee) {
            return Err(TemplateError::MissingSanteePlaceholder);
        }
        Ok(Self { segments })
    }

    /// Substitute both placeholders for one recipient
    pub fn render(&self, santa: &str, santee: &str) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Santa => out.push_str(santa),
                Segment::Santee => out.push_str(santee),
            }
        }
        out
    }
}

impl FromStr for Template {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

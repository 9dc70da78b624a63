//! Prompt templates with named `{slot}` placeholders.
//!
//! Templates are parsed once into literal and slot segments. Rendering walks
//! the segments a single time, so a substituted value that itself contains
//! `{something}` is inserted literally and never re-expanded.
//!
//! Literal braces are written `{{` and `}}`.
//!
//! ```rust
//! use ragline_core::PromptTemplate;
//!
//! let template = PromptTemplate::new("Q: {question}\nA:").unwrap();
//! let prompt = template.format(&[("question", "What is {x}?")]).unwrap();
//! assert_eq!(prompt, "Q: What is {x}?\nA:");
//! ```

use crate::error::{CoreError, Result};

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Slot(String),
}

/// A parsed prompt template.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl PromptTemplate {
    /// Parse `template`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Template`] on an unclosed `{`, a stray `}`, or a
    /// slot name that is empty or not an identifier.
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let source = template.into();
        let segments = parse(&source)?;
        Ok(Self { source, segments })
    }

    /// The raw template text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Slot names in order of first appearance, without duplicates.
    pub fn variables(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for segment in &self.segments {
            if let Segment::Slot(name) = segment {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Render the template, looking each slot up in `vars`.
    ///
    /// Variables not referenced by the template are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Template`] if a slot has no value in `vars`.
    pub fn format(&self, vars: &[(&str, &str)]) -> Result<String> {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Slot(name) => {
                    let value = vars
                        .iter()
                        .find(|(key, _)| key == name)
                        .map(|(_, value)| *value)
                        .ok_or_else(|| {
                            CoreError::Template(format!("missing value for variable '{name}'"))
                        })?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn parse(source: &str) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = source.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            '{' if matches!(chars.peek(), Some((_, '{'))) => {
                chars.next();
                literal.push('{');
            }
            '}' if matches!(chars.peek(), Some((_, '}'))) => {
                chars.next();
                literal.push('}');
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
                    return Err(CoreError::Template(format!("unclosed '{{' at offset {pos}")));
                }
                let name = name.trim();
                if !is_identifier(name) {
                    return Err(CoreError::Template(format!(
                        "invalid variable name '{name}' at offset {pos}"
                    )));
                }
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Slot(name.to_string()));
            }
            '}' => {
                return Err(CoreError::Template(format!("unmatched '}}' at offset {pos}")));
            }
            other => literal.push(other),
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

//! Snippet templates with a single `<%= node %>` slot

use std::borrow::Cow;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

/// Name of the only slot a template may use
pub const SLOT_NAME: &str = "node";

/// Errors that can occur when compiling a template
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("Unknown template slot `{name}`, only `node` is available")]
    UnknownSlot { name: String },

    #[error("Unclosed template slot at offset {offset}")]
    UnclosedSlot { offset: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Text(String),
    Slot,
}

/// A compiled template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    parts: Vec<Part>,
}

impl Template {
    pub fn compile(source: &str) -> Result<Self, TemplateError> {
        static SLOT_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = SLOT_REGEX.get_or_init(|| {
            Regex::new(r"<%=\s*([A-Za-z_$][\w$]*)\s*%>").expect("slot pattern is valid")
        });

        let mut parts = Vec::new();
        let mut last = 0;
        for caps in regex.captures_iter(source) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if name.as_str() != SLOT_NAME {
                return Err(TemplateError::UnknownSlot {
                    name: name.as_str().to_string(),
                });
            }
            push_text(&mut parts, &source[last..whole.start()], last)?;
            parts.push(Part::Slot);
            last = whole.end();
        }
        push_text(&mut parts, &source[last..], last)?;

        Ok(Self {
            source: source.to_string(),
            parts,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Number of slot occurrences
    pub fn slot_count(&self) -> usize {
        self.parts.iter().filter(|part| **part == Part::Slot).count()
    }

    /// Substitute `node` into every slot
    pub fn render(&self, node: &str) -> String {
        let mut result = String::with_capacity(self.source.len() + node.len());
        for part in &self.parts {
            match part {
                Part::Text(text) => result.push_str(text),
                Part::Slot => result.push_str(node),
            }
        }
        result
    }
}

/// Text between slots must not open a slot of its own
fn push_text(parts: &mut Vec<Part>, text: &str, offset: usize) -> Result<(), TemplateError> {
    if let Some(position) = text.find("<%") {
        return Err(TemplateError::UnclosedSlot {
            offset: offset + position,
        });
    }
    if !text.is_empty() {
        parts.push(Part::Text(text.to_string()));
    }
    Ok(())
}

/// Template accepted by `wrap`: source text, compiled on demand, or a compiled template
#[derive(Debug, Clone)]
pub enum TemplateArg<'t> {
    Source(Cow<'t, str>),
    Compiled(&'t Template),
}

impl<'t> From<&'t str> for TemplateArg<'t> {
    fn from(source: &'t str) -> Self {
        TemplateArg::Source(Cow::Borrowed(source))
    }
}

impl From<String> for TemplateArg<'_> {
    fn from(source: String) -> Self {
        TemplateArg::Source(Cow::Owned(source))
    }
}

impl<'t> From<&'t Template> for TemplateArg<'t> {
    fn from(template: &'t Template) -> Self {
        TemplateArg::Compiled(template)
    }
}

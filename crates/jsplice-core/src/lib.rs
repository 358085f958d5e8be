//! jsplice-core: Editing JavaScript syntax trees through source snippets
//!
//! This crate provides:
//! - `Ast`: an arena of parent-aware nodes built from source text or a raw tree
//! - `Node` / `NodeMut`: read accessors and editing operations on one node
//! - `replace`, `prefix`, `suffix`, `wrap`: edits expressed as snippets that are
//!   re-parsed and spliced into the node's slot
//! - `Visitor`: depth-first traversal that tolerates edits made while walking
//! - `ClassificationTable`: the node kind to capability mapping behind all of the above

pub mod classification;
mod error;
pub mod extract;
mod node;
mod splice;
pub mod template;
mod tree;
pub mod visitor;

pub use classification::{Capability, ClassificationTable};
pub use error::SpliceError;
pub use extract::{extract, Extracted, Extraction};
pub use node::{Node, NodeMut, Placement};
pub use template::{Template, TemplateArg, TemplateError};
pub use tree::{Ast, NodeId, TreeBuilder, Value};
pub use visitor::{Flow, Visitor};

pub use jsplice_syntax::{FormatOptions, Quotes, RegexLiteral, Scalar};

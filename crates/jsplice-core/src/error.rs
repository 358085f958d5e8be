//! Errors raised by tree construction and splicing

use jsplice_syntax::{CodegenError, JsonError, ParseError};
use thiserror::Error;

use crate::template::TemplateError;
use crate::tree::NodeId;

/// Errors that can occur while building or editing a tree
///
/// Every mutating call either completes or returns one of these with the
/// tree exactly as it was before the call.
#[derive(Error, Debug)]
pub enum SpliceError {
    #[error("Parse error in snippet: {0}")]
    Parse(#[from] ParseError),

    #[error("Invalid ESTree JSON: {0}")]
    Json(#[from] JsonError),

    #[error("Snippet contains no statement")]
    EmptySnippet,

    #[error("Snippet contains {found} statements, expected exactly one")]
    MultipleStatements { found: usize },

    #[error("Snippet is a {found}, expected an expression statement")]
    NotAnExpression { found: String },

    #[error("Block bodies can only be extracted under a function, not under {parent}")]
    UnsupportedParent { parent: String },

    #[error("Cannot insert relative to a {kind} that is not part of a sequence")]
    NotInSequence { kind: String },

    #[error("Cannot replace the root node")]
    CannotReplaceRoot,

    #[error("Reached root while affixing from {kind}")]
    ReachedRoot { kind: String },

    #[error("{kind} does not support {operation}")]
    MissingCapability {
        kind: String,
        operation: &'static str,
    },

    #[error("Node {id} has been replaced and is no longer part of the tree")]
    Detached { id: NodeId },

    #[error("Failed to print tree: {0}")]
    Codegen(#[from] CodegenError),

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),
}

impl SpliceError {
    /// Snippet parsed to the wrong number or shape of statements
    pub fn is_arity_error(&self) -> bool {
        matches!(
            self,
            SpliceError::EmptySnippet
                | SpliceError::MultipleStatements { .. }
                | SpliceError::NotAnExpression { .. }
        )
    }

    /// The receiver's position in the tree does not permit the operation
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            SpliceError::NotInSequence { .. }
                | SpliceError::CannotReplaceRoot
                | SpliceError::ReachedRoot { .. }
                | SpliceError::UnsupportedParent { .. }
                | SpliceError::Detached { .. }
        )
    }
}

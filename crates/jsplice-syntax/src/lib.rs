//! jsplice-syntax: JavaScript syntax trees in, JavaScript text out
//!
//! This crate provides:
//! - `RawNode`: an ESTree node as produced by the parser, with JSON interchange
//! - `parse_program()`: source text to a `Program` tree (ES5 plus `let`/`const`)
//! - `generate()`: a tree back to source text, laid out like escodegen
//! - `FormatOptions`: printer configuration, deserializable from config files

pub mod codegen;
pub mod lexer;
pub mod parser;
pub mod raw;

pub use codegen::{generate, CodegenError, FormatOptions, Quotes};
pub use parser::{parse_program, ParseError};
pub use raw::{JsonError, RawNode, RawValue, RegexLiteral, Scalar};

//! Abstract Syntax Tree (AST) definitions for GSC/CSC function and class bodies.
//!
//! The parser (an external collaborator) produces these nodes; the semantic
//! analyzer consumes them read-only. Only the subtree that can appear inside a
//! function or class body is defined here — file-level constructs (usings,
//! namespace directives, function headers) live with the parser.
//!
//! # Design Decisions
//!
//! - **Owned nodes**: AST nodes own their children (no lifetimes). The CFG
//!   builder clones statement lists into graph nodes, so nodes must be
//!   self-contained.
//! - **Span on every node**: Every node tracks its source byte range so
//!   diagnostics and sense tokens can be anchored precisely.
//! - **Separated expression/statement types**: GSC distinguishes expressions
//!   (produce values) from statements (perform actions); the AST mirrors that.

mod expr;
mod stmt;

pub use expr::*;
pub use stmt::*;

/// A span representing a range in the source text.
///
/// Spans are byte offsets from the start of the source, matching the lexer's
/// spans. Used for diagnostics and sense-token anchoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Byte offset of the start of the span (inclusive).
    pub start: usize,
    /// Byte offset of the end of the span (exclusive).
    pub end: usize,
}

impl Span {
    /// Creates a new span from start to end byte offsets.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Creates a span that covers both `self` and `other`.
    pub fn merge(&self, other: &Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl From<std::ops::Range<usize>> for Span {
    fn from(range: std::ops::Range<usize>) -> Self {
        Span::new(range.start, range.end)
    }
}

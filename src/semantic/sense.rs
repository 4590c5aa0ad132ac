//! Sense tokens: IDE-facing semantic annotations.
//!
//! A sense token binds a source range to the symbol kind and inferred type
//! value at that range. The LSP layer consumes them for hover, go-to-
//! definition, document highlight, and semantic coloring. One token is
//! emitted for every identifier the analyzer touches, during the diagnostic
//! pass only — intermediate fixed-point states would produce duplicates
//! with stale types.

use crate::ast::Span;
use crate::semantic::value::ScrData;

/// What kind of symbol a sense token annotates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenseKind {
    /// A variable's first (binding) occurrence.
    Declaration,
    /// A later read or write of an existing binding.
    Usage,
    /// A dot-field access.
    Field,
    /// A method callee.
    Method,
    /// A class member accessed implicitly inside a method.
    ClassProperty,
    /// A namespace qualifier.
    Namespace,
    /// A plain function callee or function reference.
    FunctionCall,
    /// An engine builtin (function, method, or reserved global).
    LanguageBuiltin,
}

/// One semantic annotation: range, symbol kind, and the inferred value.
#[derive(Debug, Clone, PartialEq)]
pub struct SenseToken {
    pub span: Span,
    pub kind: SenseKind,
    pub data: ScrData,
}

impl SenseToken {
    pub fn new(span: Span, kind: SenseKind, data: ScrData) -> Self {
        Self { span, kind, data }
    }
}

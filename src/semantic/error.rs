//! Diagnostic types for semantic analysis.
//!
//! Every diagnostic is advisory: analysis always runs a function or class
//! body to completion, collecting diagnostics for batch reporting rather
//! than stopping at the first problem. Each variant carries the source
//! span(s) it anchors to and exposes a stable `code()` string for the LSP
//! host's client-side mapping.

use crate::ast::Span;
use thiserror::Error;

/// A semantic diagnostic with location and description.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Diagnostic {
    // === Symbol Errors ===
    /// Reference to a name with no reaching binding.
    #[error("undefined symbol `{name}`")]
    UndefinedSymbol { name: String, span: Span },

    /// Call or reference to a function that resolves nowhere.
    #[error("undefined function `{name}`")]
    UndefinedFunction {
        name: String,
        namespace: Option<String>,
        span: Span,
    },

    /// Attempt to declare over a reserved engine global.
    #[error("cannot declare over reserved symbol `{name}`")]
    ReservedSymbol { name: String, span: Span },

    // === Operator/Type Errors ===
    /// Binary operator applied to incompatible operand types.
    #[error("operator `{op}` cannot be applied to types {left_type} and {right_type}")]
    InvalidBinaryOperands {
        op: &'static str,
        left_type: String,
        right_type: String,
        span: Span,
    },

    /// Unary operator applied to an incompatible operand type.
    #[error("operator `{op}` cannot be applied to type {operand_type}")]
    InvalidUnaryOperand {
        op: &'static str,
        operand_type: String,
        span: Span,
    },

    /// Division where the divisor is a known zero.
    #[error("division by zero")]
    DivisionByZero { span: Span },

    /// A conditional position holds a value that can never be tested.
    #[error("condition of type {found} cannot be evaluated as a boolean")]
    NonBooleanCondition { found: String, span: Span },

    // === Assignment Errors ===
    /// Assignment target is not an identifier, field, or index expression.
    #[error("invalid assignment target")]
    InvalidAssignmentTarget { span: Span },

    /// Assignment to a `const` binding.
    #[error("cannot assign to constant `{name}`")]
    CannotAssignToConstant { name: String, span: Span },

    /// Assignment to a read-only field of a built-in entity type.
    #[error("cannot assign to read-only field `{field}` of {type_name}")]
    ReadOnlyField {
        field: String,
        type_name: String,
        span: Span,
    },

    // === Access Errors ===
    /// Dot access on a value that carries no fields.
    #[error("type {found} has no fields")]
    FieldAccessOnNonComposite { found: String, span: Span },

    /// Index access on a value that cannot be indexed.
    #[error("type {found} cannot be indexed")]
    NotIndexable { found: String, span: Span },

    /// Index key of an invalid type.
    #[error("array index must be int or string, found {found}")]
    InvalidIndexType { found: String, span: Span },

    /// Vector constructor component that is not numeric.
    #[error("vector component must be numeric, found {found}")]
    VectorComponentNotNumeric { found: String, span: Span },

    // === Call Errors ===
    /// Method call receiver is not an entity/struct/object.
    #[error("type {found} cannot receive method calls")]
    InvalidCallTarget { found: String, span: Span },

    /// Dereference (`[[expr]]`) of something that is not a function pointer.
    #[error("type {found} is not a function pointer")]
    NotAFunctionPointer { found: String, span: Span },

    /// Wrong number of call arguments.
    #[error("function `{name}` called with {found} arguments, expected {expected}")]
    ArgumentCountMismatch {
        name: String,
        expected: String,
        found: usize,
        span: Span,
    },

    // === Switch Errors ===
    /// A case label value already used by an earlier label of the same switch.
    #[error("duplicate case label `{label}`")]
    DuplicateCaseLabel { label: String, span: Span },

    /// More than one `default` label in one switch.
    #[error("duplicate default label")]
    DuplicateDefaultLabel { span: Span },

    /// Case label type incompatible with the switch subject's type.
    #[error("case label of type {found} is incompatible with switch subject of type {expected}")]
    CaseTypeMismatch {
        expected: String,
        found: String,
        span: Span,
    },

    // === Statement Errors ===
    /// `wait` with a non-numeric duration.
    #[error("wait duration must be numeric, found {found}")]
    WaitDurationNotNumeric { found: String, span: Span },

    /// `foreach` over a value that is not an array.
    #[error("foreach collection must be an array, found {found}")]
    CollectionNotIterable { found: String, span: Span },
}

impl Diagnostic {
    /// Returns the primary span of this diagnostic.
    pub fn span(&self) -> Span {
        match self {
            Diagnostic::UndefinedSymbol { span, .. } => *span,
            Diagnostic::UndefinedFunction { span, .. } => *span,
            Diagnostic::ReservedSymbol { span, .. } => *span,
            Diagnostic::InvalidBinaryOperands { span, .. } => *span,
            Diagnostic::InvalidUnaryOperand { span, .. } => *span,
            Diagnostic::DivisionByZero { span } => *span,
            Diagnostic::NonBooleanCondition { span, .. } => *span,
            Diagnostic::InvalidAssignmentTarget { span } => *span,
            Diagnostic::CannotAssignToConstant { span, .. } => *span,
            Diagnostic::ReadOnlyField { span, .. } => *span,
            Diagnostic::FieldAccessOnNonComposite { span, .. } => *span,
            Diagnostic::NotIndexable { span, .. } => *span,
            Diagnostic::InvalidIndexType { span, .. } => *span,
            Diagnostic::VectorComponentNotNumeric { span, .. } => *span,
            Diagnostic::InvalidCallTarget { span, .. } => *span,
            Diagnostic::NotAFunctionPointer { span, .. } => *span,
            Diagnostic::ArgumentCountMismatch { span, .. } => *span,
            Diagnostic::DuplicateCaseLabel { span, .. } => *span,
            Diagnostic::DuplicateDefaultLabel { span } => *span,
            Diagnostic::CaseTypeMismatch { span, .. } => *span,
            Diagnostic::WaitDurationNotNumeric { span, .. } => *span,
            Diagnostic::CollectionNotIterable { span, .. } => *span,
        }
    }

    /// Returns the stable diagnostic code for this variant.
    pub fn code(&self) -> &'static str {
        match self {
            Diagnostic::UndefinedSymbol { .. } => "undefined-symbol",
            Diagnostic::UndefinedFunction { .. } => "undefined-function",
            Diagnostic::ReservedSymbol { .. } => "reserved-symbol",
            Diagnostic::InvalidBinaryOperands { .. } => "operator-type-mismatch",
            Diagnostic::InvalidUnaryOperand { .. } => "operator-type-mismatch",
            Diagnostic::DivisionByZero { .. } => "division-by-zero",
            Diagnostic::NonBooleanCondition { .. } => "non-boolean-condition",
            Diagnostic::InvalidAssignmentTarget { .. } => "invalid-assignment-target",
            Diagnostic::CannotAssignToConstant { .. } => "cannot-assign-to-constant",
            Diagnostic::ReadOnlyField { .. } => "read-only-field",
            Diagnostic::FieldAccessOnNonComposite { .. } => "no-fields",
            Diagnostic::NotIndexable { .. } => "not-indexable",
            Diagnostic::InvalidIndexType { .. } => "invalid-index-type",
            Diagnostic::VectorComponentNotNumeric { .. } => "vector-component-not-numeric",
            Diagnostic::InvalidCallTarget { .. } => "invalid-call-target",
            Diagnostic::NotAFunctionPointer { .. } => "not-a-function-pointer",
            Diagnostic::ArgumentCountMismatch { .. } => "argument-count-mismatch",
            Diagnostic::DuplicateCaseLabel { .. } => "duplicate-case-label",
            Diagnostic::DuplicateDefaultLabel { .. } => "duplicate-default-label",
            Diagnostic::CaseTypeMismatch { .. } => "case-type-mismatch",
            Diagnostic::WaitDurationNotNumeric { .. } => "wait-duration-not-numeric",
            Diagnostic::CollectionNotIterable { .. } => "collection-not-iterable",
        }
    }
}

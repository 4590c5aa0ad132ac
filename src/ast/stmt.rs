//! Statement AST nodes.
//!
//! Statements are the units a basic block iterates over. Control-flow
//! statements (`if`, `for`, `foreach`, `switch`, `while`) do not appear here:
//! the CFG builder lowers them into graph structure, leaving only their
//! condition/init/increment expressions attached to the corresponding CFG
//! nodes.

use super::{Expr, Span};

/// A statement with its source location.
#[derive(Debug, Clone)]
pub struct Statement {
    /// The kind of statement.
    pub kind: StatementKind,
    /// Source location of this statement.
    pub span: Span,
}

impl Statement {
    /// Creates a new statement with the given kind and span.
    pub fn new(kind: StatementKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// The different kinds of statements that survive CFG lowering.
#[derive(Debug, Clone)]
pub enum StatementKind {
    /// An expression evaluated for its side effects (assignment, call, ...).
    Expression(Expr),

    /// Constant declaration: `const x = 1;`
    Const {
        name: String,
        name_span: Span,
        value: Expr,
    },

    /// `return;` or `return expr;`
    Return { value: Option<Expr> },

    /// `wait expr;` — suspends the thread for a numeric duration.
    Wait { duration: Expr },

    /// `waittillframeend;`
    WaitTillFrameEnd,

    /// `break;` — edges are handled by the CFG builder; type analysis is a no-op.
    Break,

    /// `continue;` — same as `break`, the statement itself carries no typing.
    Continue,

    /// A bare `;`.
    Empty,
}

/// A formal parameter of a function or method.
#[derive(Debug, Clone)]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// Source location of the name.
    pub span: Span,
    /// Default value expression, if declared (`function f(x = 1)`).
    pub default: Option<Expr>,
    /// Whether the parameter is declared by-reference (`&x`).
    pub by_ref: bool,
}

/// A class member declaration (`var name;` or `var name = expr;`).
#[derive(Debug, Clone)]
pub struct ClassMember {
    /// Member name.
    pub name: String,
    /// Source location of the name.
    pub span: Span,
    /// Optional initializer expression.
    pub initializer: Option<Expr>,
}

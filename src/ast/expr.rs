//! Expression AST nodes.
//!
//! Expressions are constructs that evaluate to a value. GSC expressions cover
//! literals (including engine-specific ones: interned strings, hashes, anim
//! references), vector constructors, the usual arithmetic/comparison/logical
//! operators, ternaries, assignments (expressions in GSC), field and index
//! access, and the language's four call shapes:
//!
//! - plain calls: `foo(1)`, `ns::foo(1)`
//! - method calls: `ent foo(1)` (receiver to the left of the callee)
//! - threaded calls: `thread foo()`, `ent thread foo()` (fire-and-forget)
//! - pointer calls: `[[ptr]](1)` (dereference a function pointer)

use super::Span;

/// An expression with its source location.
#[derive(Debug, Clone)]
pub struct Expr {
    /// The kind of expression.
    pub kind: ExprKind,
    /// Source location of this expression.
    pub span: Span,
}

impl Expr {
    /// Creates a new expression with the given kind and span.
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// A namespace qualifier with its own span (`ns` in `ns::foo()`).
#[derive(Debug, Clone)]
pub struct Namespace {
    pub name: String,
    pub span: Span,
}

/// The callee of a call expression.
#[derive(Debug, Clone)]
pub enum CallTarget {
    /// A named callee, optionally namespace-qualified: `foo(...)`, `ns::foo(...)`.
    Named {
        namespace: Option<Namespace>,
        name: String,
        name_span: Span,
    },
    /// A dereferenced function pointer: `[[expr]](...)`.
    Pointer(Box<Expr>),
}

/// A call with its arguments and thread flag.
///
/// Shared by plain calls and method calls (which wrap a `Call` with a
/// receiver expression).
#[derive(Debug, Clone)]
pub struct Call {
    pub target: CallTarget,
    pub args: Vec<Expr>,
    /// `thread` calls run detached and never produce a value.
    pub threaded: bool,
    pub span: Span,
}

/// The different kinds of GSC expressions.
#[derive(Debug, Clone)]
pub enum ExprKind {
    /// Integer literal: `42`, `0x1F`
    IntLiteral(i64),

    /// Floating-point literal: `3.14`, `.5`
    FloatLiteral(f64),

    /// Boolean literal: `true`, `false`
    BoolLiteral(bool),

    /// String literal: `"mp_shipment"`
    StringLiteral(String),

    /// Interned (localized) string literal: `&"MENU_TITLE"`
    IStringLiteral(String),

    /// Hash literal: `#"hash_key"`
    HashLiteral(String),

    /// Anim reference: `%combat_idle`
    AnimLiteral(String),

    /// Anim tree reference: `#animtree`
    AnimTreeLiteral,

    /// The `undefined` keyword.
    UndefinedLiteral,

    /// Empty array constructor: `[]`
    EmptyArray,

    /// Vector constructor: `(x, y, z)`
    Vector {
        x: Box<Expr>,
        y: Box<Expr>,
        z: Box<Expr>,
    },

    /// Variable, constant, or class-member reference: `x`, `level`
    Identifier(String),

    /// Parenthesized expression: `(expr)`
    Grouped(Box<Expr>),

    /// Unary operation: `-x`, `!flag`, `~mask`
    Unary { op: UnaryOp, operand: Box<Expr> },

    /// Binary operation: `left op right`
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },

    /// Ternary conditional: `cond ? a : b`
    Ternary {
        condition: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },

    /// Assignment (an expression in GSC): `x = v`, `x += v`, `obj.f = v`
    Assignment {
        target: Box<Expr>,
        op: AssignOp,
        value: Box<Expr>,
    },

    /// Postfix increment/decrement: `x++`, `x--`
    IncrementDecrement { target: Box<Expr>, increment: bool },

    /// Dot-field access: `ent.origin`
    FieldAccess {
        object: Box<Expr>,
        field: String,
        field_span: Span,
    },

    /// Index access: `arr[key]`
    Index { array: Box<Expr>, index: Box<Expr> },

    /// Plain or pointer call: `foo(1)`, `ns::foo(1)`, `[[ptr]](1)`
    Call(Call),

    /// Method call with a receiver: `ent foo(1)`, `ent thread foo()`
    MethodCall { receiver: Box<Expr>, call: Call },

    /// Function reference: `&foo`, `&ns::foo`
    FunctionRef {
        namespace: Option<Namespace>,
        name: String,
        name_span: Span,
    },
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+` - addition (also string concatenation)
    Add,
    /// `-` - subtraction
    Subtract,
    /// `*` - multiplication
    Multiply,
    /// `/` - division
    Divide,
    /// `%` - modulo
    Modulo,

    /// `==` - equality
    Equal,
    /// `!=` - inequality
    NotEqual,
    /// `<` - less than
    LessThan,
    /// `<=` - less than or equal
    LessEqual,
    /// `>` - greater than
    GreaterThan,
    /// `>=` - greater than or equal
    GreaterEqual,

    /// `&&` - logical AND
    And,
    /// `||` - logical OR
    Or,

    /// `&` - bitwise AND
    BitAnd,
    /// `|` - bitwise OR
    BitOr,
    /// `^` - bitwise XOR
    BitXor,
    /// `<<` - left shift
    ShiftLeft,
    /// `>>` - right shift
    ShiftRight,
}

impl BinaryOp {
    /// Returns a string representation of the operator for diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::LessThan => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::GreaterThan => ">",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::ShiftLeft => "<<",
            BinaryOp::ShiftRight => ">>",
        }
    }

    /// Returns true for `==`/`!=`, which accept any pair of value types.
    pub fn is_equality(&self) -> bool {
        matches!(self, BinaryOp::Equal | BinaryOp::NotEqual)
    }

    /// Returns true for the ordered comparisons (`<`, `<=`, `>`, `>=`).
    pub fn is_ordering(&self) -> bool {
        matches!(
            self,
            BinaryOp::LessThan
                | BinaryOp::LessEqual
                | BinaryOp::GreaterThan
                | BinaryOp::GreaterEqual
        )
    }

    /// Returns true for the integer bitwise/shift operators.
    pub fn is_bitwise(&self) -> bool {
        matches!(
            self,
            BinaryOp::BitAnd
                | BinaryOp::BitOr
                | BinaryOp::BitXor
                | BinaryOp::ShiftLeft
                | BinaryOp::ShiftRight
        )
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `-` - arithmetic negation
    Negate,
    /// `!` - logical NOT
    Not,
    /// `~` - bitwise complement
    BitNot,
}

impl UnaryOp {
    /// Returns a string representation of the operator for diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::Negate => "-",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
        }
    }
}

/// Assignment operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    /// `=`
    Assign,
    /// `+=`
    Add,
    /// `-=`
    Subtract,
    /// `*=`
    Multiply,
    /// `/=`
    Divide,
    /// `%=`
    Modulo,
    /// `&=`
    BitAnd,
    /// `|=`
    BitOr,
    /// `^=`
    BitXor,
}

impl AssignOp {
    /// Returns a string representation of the operator for diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::Add => "+=",
            AssignOp::Subtract => "-=",
            AssignOp::Multiply => "*=",
            AssignOp::Divide => "/=",
            AssignOp::Modulo => "%=",
            AssignOp::BitAnd => "&=",
            AssignOp::BitOr => "|=",
            AssignOp::BitXor => "^=",
        }
    }

    /// Returns the binary operator a compound assignment desugars to,
    /// or `None` for plain `=`.
    pub fn binary_op(&self) -> Option<BinaryOp> {
        match self {
            AssignOp::Assign => None,
            AssignOp::Add => Some(BinaryOp::Add),
            AssignOp::Subtract => Some(BinaryOp::Subtract),
            AssignOp::Multiply => Some(BinaryOp::Multiply),
            AssignOp::Divide => Some(BinaryOp::Divide),
            AssignOp::Modulo => Some(BinaryOp::Modulo),
            AssignOp::BitAnd => Some(BinaryOp::BitAnd),
            AssignOp::BitOr => Some(BinaryOp::BitOr),
            AssignOp::BitXor => Some(BinaryOp::BitXor),
        }
    }
}

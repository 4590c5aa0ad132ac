//! Semantic analysis for GSC/CSC.
//!
//! The pipeline sits between an external parser/CFG builder and an LSP
//! host: given a function or class body as a [`crate::cfg::ControlFlowGraph`]
//! plus the workspace's exported symbols, it runs a flow-sensitive
//! reaching-definitions analysis ([`engine`]) that drives the statement and
//! expression analyzers over every node until variable state stabilizes,
//! then re-walks the stabilized graph once to collect [`error::Diagnostic`]s
//! and [`sense::SenseToken`]s.
//!
//! State is layered bottom-up:
//!
//! - [`types`]: the [`types::TypeTag`] bitset lattice
//! - [`value`]: [`value::ScrData`] values, aggregates, and the merge join
//! - [`symbols`] / [`builtins`]: symbol resolution surfaces
//! - [`expressions`] / [`statements`]: the per-node analyzers
//! - [`switch`]: cross-node switch bookkeeping
//!
//! Everything a run mutates is owned by that run; the crate shares nothing
//! and takes no locks.

pub mod builtins;
pub mod engine;
pub mod error;
pub mod expressions;
pub mod sense;
pub mod statements;
pub mod switch;
pub mod symbols;
pub mod types;
pub mod value;

pub use engine::{AnalysisResult, analyze_class, analyze_function};
pub use error::Diagnostic;
pub use sense::{SenseKind, SenseToken};
pub use types::TypeTag;
pub use value::{ScrData, ScrValue, ScrVariable, StructArena, VarMap};

use crate::ast::Span;

/// Collector for analyzer output.
///
/// During the fixed-point phase the sink is disabled: intermediate variable
/// states would produce duplicate and stale diagnostics. The diagnostic
/// re-walk enables it, so everything is collected exactly once against
/// stabilized state.
#[derive(Debug, Default)]
pub struct Sink {
    enabled: bool,
    pub diagnostics: Vec<Diagnostic>,
    pub sense_tokens: Vec<SenseToken>,
}

impl Sink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Records a diagnostic, if collection is enabled.
    pub fn report(&mut self, diagnostic: Diagnostic) {
        if self.enabled {
            self.diagnostics.push(diagnostic);
        }
    }

    /// Records a sense token, if collection is enabled.
    pub fn sense(&mut self, span: Span, kind: SenseKind, data: ScrData) {
        if self.enabled {
            self.sense_tokens.push(SenseToken::new(span, kind, data));
        }
    }
}

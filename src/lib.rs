//! Flow-sensitive semantic analysis for the GSC/CSC scripting language.
//!
//! This crate is the semantic core of a GSC language server. Given a parsed
//! function or class body lowered to a control-flow graph, plus the
//! workspace's exported symbols, it infers the type state of every variable
//! at every program point and produces:
//!
//! - **diagnostics** — advisory findings (undefined symbols, operator type
//!   mismatches, division by zero, duplicate case labels, ...), never hard
//!   failures;
//! - **sense tokens** — per-identifier semantic annotations (symbol kind +
//!   inferred type value) for hover, highlighting, and navigation.
//!
//! GSC is weakly typed, so types are tracked as bitsets ([`TypeTag`]) that
//! widen at control-flow joins, and concrete values are carried for constant
//! folding wherever they are statically known.
//!
//! The parser, CFG builder, workspace symbol registry, and LSP transport are
//! external collaborators; this crate only defines the AST/CFG surfaces it
//! consumes ([`ast`], [`cfg`]) and the analysis itself ([`semantic`]).
//!
//! # Example
//!
//! ```
//! use gsc_analyzer::ast::Span;
//! use gsc_analyzer::cfg::{CfgNodeKind, ControlFlowGraph};
//! use gsc_analyzer::semantic::builtins::BuiltinApi;
//! use gsc_analyzer::semantic::symbols::ExportedSymbols;
//! use gsc_analyzer::semantic::analyze_function;
//!
//! let mut cfg = ControlFlowGraph::new();
//! let entry = cfg.add_node(
//!     CfgNodeKind::FunctionEntry {
//!         name: "main".to_string(),
//!         name_span: Span::new(0, 4),
//!         params: vec![],
//!         vararg: false,
//!     },
//!     0,
//! );
//! let exit = cfg.add_node(CfgNodeKind::FunctionExit, 0);
//! cfg.add_edge(entry, exit);
//!
//! let result = analyze_function(&cfg, &ExportedSymbols::new(), &BuiltinApi::new());
//! assert!(result.converged);
//! assert!(result.diagnostics.is_empty());
//! ```

pub mod ast;
pub mod cfg;
pub mod semantic;

pub use semantic::{AnalysisResult, Diagnostic, ScrData, SenseKind, SenseToken, TypeTag};

//! The reaching-definitions analyser: the fixed-point driver over a CFG.
//!
//! Analysis runs in two phases:
//!
//! 1. **Fixed point.** A LIFO worklist starts at the entry node. Popping a
//!    node computes its IN-set (the merge of its predecessors' OUT-sets,
//!    filtered by lexical scope), runs the node analyzer over it, and
//!    compares the produced OUT-set *structurally* against the previous one.
//!    Only a changed OUT-set re-queues the successors, so the loop terminates
//!    once variable state stops widening. A pop cap of
//!    `max(100, 5 × node_count)` bounds pathological graphs: hitting it logs
//!    a warning and continues with whatever state was reached.
//! 2. **Diagnostic re-walk.** Every node visited in phase one is re-analyzed
//!    exactly once, in ascending node order, against its stabilized IN-set,
//!    with the output sink enabled. All diagnostics and sense tokens come
//!    from this pass, so intermediate widening states never leak into them.
//!
//! One [`Analysis`] owns all scratch state for a run; nothing is shared
//! between runs and re-running the same inputs yields identical output.

use crate::cfg::{CfgNode, ControlFlowGraph, NodeId};
use crate::semantic::Sink;
use crate::semantic::builtins::BuiltinApi;
use crate::semantic::error::Diagnostic;
use crate::semantic::sense::SenseToken;
use crate::semantic::statements::NodeAnalyzer;
use crate::semantic::switch::SwitchAnalysis;
use crate::semantic::symbols::{ClassSignature, ExportedSymbols, SymbolTable};
use crate::semantic::value::{ScrData, ScrVariable, StructArena, VarMap};
use log::{debug, warn};
use rustc_hash::{FxHashMap, FxHashSet};

/// Everything one analysis run produced.
#[derive(Debug)]
pub struct AnalysisResult {
    pub diagnostics: Vec<Diagnostic>,
    pub sense_tokens: Vec<SenseToken>,
    /// Final stabilized OUT-set per visited node.
    pub out_sets: FxHashMap<NodeId, VarMap>,
    /// Worklist pops performed before stabilizing (or hitting the cap).
    pub worklist_pops: usize,
    /// False when the pop cap cut the fixed point short.
    pub converged: bool,
}

/// Analyzes a function body graph.
pub fn analyze_function(
    cfg: &ControlFlowGraph,
    globals: &ExportedSymbols,
    builtins: &BuiltinApi,
) -> AnalysisResult {
    Analysis::new(cfg, globals, builtins, None).run()
}

/// Analyzes a class body graph. Every node reachable from the class entry is
/// analyzed with the class in scope, so method bodies resolve implicit
/// member references.
pub fn analyze_class(
    cfg: &ControlFlowGraph,
    class: &ClassSignature,
    globals: &ExportedSymbols,
    builtins: &BuiltinApi,
) -> AnalysisResult {
    Analysis::new(cfg, globals, builtins, Some(class)).run()
}

struct Analysis<'a> {
    cfg: &'a ControlFlowGraph,
    globals: &'a ExportedSymbols,
    builtins: &'a BuiltinApi,
    class: Option<&'a ClassSignature>,
    structs: StructArena,
    sink: Sink,
    switches: SwitchAnalysis,
    out_sets: FxHashMap<NodeId, VarMap>,
    visited: FxHashSet<NodeId>,
    worklist_pops: usize,
    converged: bool,
}

impl<'a> Analysis<'a> {
    fn new(
        cfg: &'a ControlFlowGraph,
        globals: &'a ExportedSymbols,
        builtins: &'a BuiltinApi,
        class: Option<&'a ClassSignature>,
    ) -> Self {
        Self {
            cfg,
            globals,
            builtins,
            class,
            structs: StructArena::new(),
            sink: Sink::new(),
            switches: SwitchAnalysis::new(),
            out_sets: FxHashMap::default(),
            visited: FxHashSet::default(),
            worklist_pops: 0,
            converged: true,
        }
    }

    fn run(mut self) -> AnalysisResult {
        debug!("analysis start, {} nodes", self.cfg.len());
        if let Some(entry) = self.cfg.entry() {
            let cap = 100.max(self.cfg.len() * 5);
            self.fixed_point(entry, cap);
            self.diagnostic_pass();
        }
        debug!(
            "analysis done after {} pops, converged: {}",
            self.worklist_pops, self.converged
        );
        AnalysisResult {
            diagnostics: self.sink.diagnostics,
            sense_tokens: self.sink.sense_tokens,
            out_sets: self.out_sets,
            worklist_pops: self.worklist_pops,
            converged: self.converged,
        }
    }

    fn fixed_point(&mut self, entry: NodeId, cap: usize) {
        let mut worklist = vec![entry];
        while let Some(id) = worklist.pop() {
            if self.worklist_pops >= cap {
                warn!(
                    "worklist cap of {} pops hit before stabilizing, continuing with partial state",
                    cap
                );
                self.converged = false;
                break;
            }
            self.worklist_pops += 1;
            self.visited.insert(id);

            let out = self.visit(id);
            let changed = match self.out_sets.get(&id) {
                Some(previous) => !self.structs.vars_eq(previous, &out),
                None => true,
            };
            if changed {
                self.out_sets.insert(id, out);
                let cfg = self.cfg;
                worklist.extend(cfg.node(id).outgoing.iter().copied());
            }
        }
    }

    /// Re-analyzes every visited node once, against stabilized IN-sets, with
    /// output collection on.
    fn diagnostic_pass(&mut self) {
        self.sink.set_enabled(true);
        self.switches.reset_labels();
        let mut order: Vec<NodeId> = self.visited.iter().copied().collect();
        order.sort_unstable();
        for id in order {
            let out = self.visit(id);
            self.out_sets.insert(id, out);
        }
    }

    fn visit(&mut self, id: NodeId) -> VarMap {
        let cfg = self.cfg;
        let node = cfg.node(id);
        let in_set = self.in_set(node);
        let mut table = SymbolTable::new(
            self.globals,
            self.builtins,
            self.class.cloned(),
            node.scope,
            in_set,
        );
        NodeAnalyzer::new(&mut table, &mut self.structs, &mut self.sink, &mut self.switches)
            .analyze_node(id, &node.kind);
        table.into_vars()
    }

    /// Merges the predecessors' OUT-sets into this node's IN-set.
    ///
    /// A binding survives into the merge only if its lexical scope is no
    /// deeper than the receiving node's (globals always survive). A binding
    /// absent from some predecessors is merged over the defining ones only.
    /// Names are merged in sorted order so arena allocation is deterministic.
    fn in_set(&mut self, node: &CfgNode) -> VarMap {
        let mut in_set = VarMap::default();
        let predecessors: Vec<&VarMap> = node
            .incoming
            .iter()
            .filter_map(|p| self.out_sets.get(p))
            .collect();
        if predecessors.is_empty() {
            return in_set;
        }

        let mut keys: Vec<&String> = predecessors
            .iter()
            .flat_map(|vars| vars.keys())
            .collect();
        keys.sort_unstable();
        keys.dedup();

        for key in keys {
            let contributors: Vec<&ScrVariable> = predecessors
                .iter()
                .filter_map(|vars| vars.get(key))
                .filter(|var| var.is_global || var.lexical_scope <= node.scope)
                .collect();
            let Some(first) = contributors.first() else {
                continue;
            };
            let name = first.name.clone();
            let lexical_scope = contributors.iter().map(|v| v.lexical_scope).min().unwrap_or(0);
            let is_global = contributors.iter().any(|v| v.is_global);
            let data: Vec<ScrData> = contributors.iter().map(|v| v.data.clone()).collect();
            let merged = self.structs.merge(&data);
            in_set.insert(
                key.clone(),
                ScrVariable {
                    name,
                    data: merged,
                    lexical_scope,
                    is_global,
                },
            );
        }
        in_set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{
        AssignOp, BinaryOp, Expr, ExprKind, Parameter, Span, Statement, StatementKind,
    };
    use crate::cfg::{CaseLabel, CfgNodeKind};
    use crate::semantic::types::TypeTag;

    fn expr(kind: ExprKind) -> Expr {
        Expr::new(kind, Span::new(0, 0))
    }

    fn ident(name: &str) -> Expr {
        expr(ExprKind::Identifier(name.to_string()))
    }

    fn int_lit(v: i64) -> Expr {
        expr(ExprKind::IntLiteral(v))
    }

    fn assign_stmt(name: &str, value: Expr) -> Statement {
        Statement::new(
            StatementKind::Expression(expr(ExprKind::Assignment {
                target: Box::new(ident(name)),
                op: AssignOp::Assign,
                value: Box::new(value),
            })),
            Span::new(0, 0),
        )
    }

    fn block(statements: Vec<Statement>) -> CfgNodeKind {
        CfgNodeKind::BasicBlock { statements }
    }

    fn entry_node(params: &[&str]) -> CfgNodeKind {
        CfgNodeKind::FunctionEntry {
            name: "test_fn".to_string(),
            name_span: Span::new(0, 7),
            params: params
                .iter()
                .map(|p| Parameter {
                    name: p.to_string(),
                    span: Span::new(0, 0),
                    default: None,
                    by_ref: false,
                })
                .collect(),
            vararg: false,
        }
    }

    fn analyze(cfg: &ControlFlowGraph) -> AnalysisResult {
        let globals = ExportedSymbols::new();
        let builtins = BuiltinApi::new();
        analyze_function(cfg, &globals, &builtins)
    }

    /// entry -> decision -> {then, else} -> join -> exit
    fn diamond(then_value: Expr, else_value: Expr) -> (ControlFlowGraph, NodeId) {
        let mut cfg = ControlFlowGraph::new();
        let entry = cfg.add_node(entry_node(&["flag"]), 0);
        let decision = cfg.add_node(
            CfgNodeKind::Decision {
                condition: ident("flag"),
            },
            0,
        );
        let then_block = cfg.add_node(block(vec![assign_stmt("x", then_value)]), 0);
        let else_block = cfg.add_node(block(vec![assign_stmt("x", else_value)]), 0);
        let join = cfg.add_node(block(vec![]), 0);
        let exit = cfg.add_node(CfgNodeKind::FunctionExit, 0);
        cfg.add_edge(entry, decision);
        cfg.add_edge(decision, then_block);
        cfg.add_edge(decision, else_block);
        cfg.add_edge(then_block, join);
        cfg.add_edge(else_block, join);
        cfg.add_edge(join, exit);
        (cfg, join)
    }

    #[test]
    fn test_if_else_join_widens_to_union() {
        let (cfg, join) = diamond(int_lit(1), expr(ExprKind::StringLiteral("s".to_string())));
        let result = analyze(&cfg);

        assert!(result.converged);
        assert!(result.diagnostics.is_empty());
        let x = result.out_sets[&join].get("x").unwrap();
        assert_eq!(x.data.tag, TypeTag::INT | TypeTag::STRING);
        assert!(x.data.value.is_none());
    }

    #[test]
    fn test_agreeing_branches_keep_value() {
        let (cfg, join) = diamond(int_lit(3), int_lit(3));
        let result = analyze(&cfg);
        let x = result.out_sets[&join].get("x").unwrap();
        assert_eq!(x.data.tag, TypeTag::INT);
        assert!(x.data.value.is_some());
    }

    #[test]
    fn test_deep_scope_bindings_do_not_escape() {
        let mut cfg = ControlFlowGraph::new();
        let entry = cfg.add_node(entry_node(&[]), 0);
        let inner = cfg.add_node(block(vec![assign_stmt("tmp", int_lit(1))]), 1);
        let after = cfg.add_node(block(vec![]), 0);
        let exit = cfg.add_node(CfgNodeKind::FunctionExit, 0);
        cfg.add_edge(entry, inner);
        cfg.add_edge(inner, after);
        cfg.add_edge(after, exit);

        let result = analyze(&cfg);
        assert!(result.out_sets[&inner].get("tmp").is_some());
        assert!(result.out_sets[&after].get("tmp").is_none());
        // reserved globals always survive
        assert!(result.out_sets[&after].get("level").is_some());
    }

    #[test]
    fn test_const_reassignment_reported_once_at_second_write() {
        let mut cfg = ControlFlowGraph::new();
        let entry = cfg.add_node(entry_node(&[]), 0);
        let declare = cfg.add_node(
            block(vec![Statement::new(
                StatementKind::Const {
                    name: "max_hp".to_string(),
                    name_span: Span::new(6, 12),
                    value: int_lit(100),
                },
                Span::new(0, 18),
            )]),
            0,
        );
        let reassign = cfg.add_node(
            block(vec![Statement::new(
                StatementKind::Expression(Expr::new(
                    ExprKind::Assignment {
                        target: Box::new(Expr::new(
                            ExprKind::Identifier("max_hp".to_string()),
                            Span::new(20, 26),
                        )),
                        op: AssignOp::Assign,
                        value: Box::new(int_lit(5)),
                    },
                    Span::new(20, 30),
                )),
                Span::new(20, 31),
            )]),
            0,
        );
        let exit = cfg.add_node(CfgNodeKind::FunctionExit, 0);
        cfg.add_edge(entry, declare);
        cfg.add_edge(declare, reassign);
        cfg.add_edge(reassign, exit);

        let result = analyze(&cfg);
        let consts: Vec<_> = result
            .diagnostics
            .iter()
            .filter(|d| d.code() == "cannot-assign-to-constant")
            .collect();
        assert_eq!(consts.len(), 1);
        assert_eq!(consts[0].span(), Span::new(20, 26));
    }

    #[test]
    fn test_division_by_zero_reported_once() {
        let mut cfg = ControlFlowGraph::new();
        let entry = cfg.add_node(entry_node(&[]), 0);
        let body = cfg.add_node(
            block(vec![assign_stmt(
                "x",
                expr(ExprKind::Binary {
                    left: Box::new(int_lit(5)),
                    op: BinaryOp::Divide,
                    right: Box::new(int_lit(0)),
                }),
            )]),
            0,
        );
        let exit = cfg.add_node(CfgNodeKind::FunctionExit, 0);
        cfg.add_edge(entry, body);
        cfg.add_edge(body, exit);

        let result = analyze(&cfg);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].code(), "division-by-zero");
        assert!(result.out_sets[&body].get("x").unwrap().data.is_any());
    }

    #[test]
    fn test_duplicate_case_label_reported_once() {
        let mut cfg = ControlFlowGraph::new();
        let entry = cfg.add_node(entry_node(&[]), 0);
        let switch = cfg.add_node(
            CfgNodeKind::Switch {
                subject: int_lit(1),
            },
            0,
        );
        let case_a = cfg.add_node(
            CfgNodeKind::SwitchCaseDecision {
                switch,
                labels: vec![CaseLabel {
                    value: Some(int_lit(1)),
                    span: Span::new(10, 11),
                }],
            },
            0,
        );
        let case_b = cfg.add_node(
            CfgNodeKind::SwitchCaseDecision {
                switch,
                labels: vec![CaseLabel {
                    value: Some(int_lit(1)),
                    span: Span::new(20, 21),
                }],
            },
            0,
        );
        let exit = cfg.add_node(CfgNodeKind::FunctionExit, 0);
        cfg.add_edge(entry, switch);
        cfg.add_edge(switch, case_a);
        cfg.add_edge(case_a, case_b);
        cfg.add_edge(case_b, exit);

        let result = analyze(&cfg);
        let dups: Vec<_> = result
            .diagnostics
            .iter()
            .filter(|d| d.code() == "duplicate-case-label")
            .collect();
        assert_eq!(dups.len(), 1);
        assert_eq!(dups[0].span(), Span::new(20, 21));
    }

    // entry -> init -> head -> body -> head (back edge), head -> exit
    fn counting_loop() -> (ControlFlowGraph, NodeId) {
        let mut cfg = ControlFlowGraph::new();
        let entry = cfg.add_node(entry_node(&[]), 0);
        let init = cfg.add_node(block(vec![assign_stmt("i", int_lit(0))]), 0);
        let head = cfg.add_node(
            CfgNodeKind::Decision {
                condition: expr(ExprKind::Binary {
                    left: Box::new(ident("i")),
                    op: BinaryOp::LessThan,
                    right: Box::new(int_lit(10)),
                }),
            },
            0,
        );
        let body = cfg.add_node(
            block(vec![assign_stmt(
                "i",
                expr(ExprKind::Binary {
                    left: Box::new(ident("i")),
                    op: BinaryOp::Add,
                    right: Box::new(int_lit(1)),
                }),
            )]),
            0,
        );
        let exit = cfg.add_node(CfgNodeKind::FunctionExit, 0);
        cfg.add_edge(entry, init);
        cfg.add_edge(init, head);
        cfg.add_edge(head, body);
        cfg.add_edge(body, head);
        cfg.add_edge(head, exit);
        (cfg, head)
    }

    #[test]
    fn test_loop_stabilizes_within_pop_cap() {
        let (cfg, head) = counting_loop();
        let result = analyze(&cfg);
        assert!(result.converged);
        assert!(result.worklist_pops <= 100.max(cfg.len() * 5));
        assert!(result.diagnostics.is_empty());
        let i = result.out_sets[&head].get("i").unwrap();
        assert_eq!(i.data.tag, TypeTag::INT);
    }

    #[test]
    fn test_cap_hit_reports_non_convergence() {
        let (cfg, _) = counting_loop();
        let globals = ExportedSymbols::new();
        let builtins = BuiltinApi::new();
        let mut analysis = Analysis::new(&cfg, &globals, &builtins, None);

        // A cap too small for even one pass over the loop: the driver
        // stops, flags the run, and keeps whatever state it reached.
        analysis.fixed_point(cfg.entry().unwrap(), 2);
        assert!(!analysis.converged);
        assert_eq!(analysis.worklist_pops, 2);
        assert!(!analysis.out_sets.is_empty());
    }

    #[test]
    fn test_determinism_across_runs() {
        let (cfg, _) = diamond(int_lit(1), expr(ExprKind::StringLiteral("s".to_string())));
        let first = analyze(&cfg);
        let second = analyze(&cfg);

        assert_eq!(first.diagnostics, second.diagnostics);
        assert_eq!(first.sense_tokens, second.sense_tokens);
        assert_eq!(first.worklist_pops, second.worklist_pops);
        assert_eq!(
            first.out_sets.keys().collect::<std::collections::BTreeSet<_>>(),
            second.out_sets.keys().collect::<std::collections::BTreeSet<_>>()
        );
    }

    #[test]
    fn test_class_member_resolves_in_method_body() {
        let mut cfg = ControlFlowGraph::new();
        let entry = cfg.add_node(entry_node(&[]), 0);
        let body = cfg.add_node(block(vec![assign_stmt("h", ident("heat"))]), 0);
        let exit = cfg.add_node(CfgNodeKind::FunctionExit, 0);
        cfg.add_edge(entry, body);
        cfg.add_edge(body, exit);

        let globals = ExportedSymbols::new();
        let builtins = BuiltinApi::new();
        let mut class = ClassSignature {
            name: "turret".to_string(),
            ..Default::default()
        };
        class.members.insert("heat".to_string(), TypeTag::FLOAT);

        let result = analyze_class(&cfg, &class, &globals, &builtins);
        assert!(result.diagnostics.is_empty());
        assert_eq!(
            result.out_sets[&body].get("h").unwrap().data.tag,
            TypeTag::FLOAT
        );
    }

    #[test]
    fn test_empty_graph_is_a_no_op() {
        let cfg = ControlFlowGraph::new();
        let result = analyze(&cfg);
        assert!(result.converged);
        assert_eq!(result.worklist_pops, 0);
        assert!(result.diagnostics.is_empty());
        assert!(result.out_sets.is_empty());
    }

    #[test]
    fn test_unreachable_nodes_are_never_analyzed() {
        let mut cfg = ControlFlowGraph::new();
        let entry = cfg.add_node(entry_node(&[]), 0);
        let exit = cfg.add_node(CfgNodeKind::FunctionExit, 0);
        // an orphan block with a would-be diagnostic
        let orphan = cfg.add_node(block(vec![assign_stmt("x", ident("ghost"))]), 0);
        cfg.add_edge(entry, exit);

        let result = analyze(&cfg);
        assert!(result.diagnostics.is_empty());
        assert!(result.out_sets.get(&orphan).is_none());
    }
}

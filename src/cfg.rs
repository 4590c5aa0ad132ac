//! Control-flow-graph input surface.
//!
//! The CFG builder (an external collaborator) lowers a parsed function or
//! class body into this node graph; the reaching-definitions analyser walks
//! it read-only. Nodes live in a per-graph arena and are addressed by
//! [`NodeId`] index — node identity is never exposed as a shared mutable
//! handle across analysis runs.
//!
//! Edge invariant: the graph is reducible enough for the worklist to
//! converge; nodes may be visited many times before their in-sets stabilize.

use crate::ast::{ClassMember, Expr, Parameter, Span, Statement};

/// Index of a node within one [`ControlFlowGraph`]'s arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// A single case label: `case <expr>:` or `default:` (no value).
#[derive(Debug, Clone)]
pub struct CaseLabel {
    /// The label expression; `None` for `default`.
    pub value: Option<Expr>,
    /// Source location of the label.
    pub span: Span,
}

/// The kind of a CFG node, with the AST it retained from lowering.
#[derive(Debug, Clone)]
pub enum CfgNodeKind {
    /// Entry of a function or method body. Seeds parameters and the vararg.
    FunctionEntry {
        name: String,
        name_span: Span,
        params: Vec<Parameter>,
        vararg: bool,
    },

    /// Entry of a class body.
    ClassEntry { name: String, name_span: Span },

    /// The class's member declaration block.
    ClassMembersBlock { members: Vec<ClassMember> },

    /// A straight-line statement sequence.
    BasicBlock { statements: Vec<Statement> },

    /// `foreach (value in collection)` / `foreach (key, value in collection)`.
    Enumeration {
        key: Option<(String, Span)>,
        value: (String, Span),
        collection: Expr,
    },

    /// `for (init; condition; increment)` — any part may be absent.
    Iteration {
        init: Option<Statement>,
        condition: Option<Expr>,
        increment: Option<Expr>,
    },

    /// An `if`/`else if` condition.
    Decision { condition: Expr },

    /// A `switch (subject)` head.
    Switch { subject: Expr },

    /// One `case`/`default` label group. `switch` points back at the
    /// governing [`CfgNodeKind::Switch`] node so repeated visits share one
    /// analysis context.
    SwitchCaseDecision {
        switch: NodeId,
        labels: Vec<CaseLabel>,
    },

    /// Exit of a function or class body.
    FunctionExit,
}

/// A CFG node: kind plus edges and lexical nesting depth.
#[derive(Debug, Clone)]
pub struct CfgNode {
    pub kind: CfgNodeKind,
    /// Predecessor node indices.
    pub incoming: Vec<NodeId>,
    /// Successor node indices.
    pub outgoing: Vec<NodeId>,
    /// Lexical nesting depth; bindings from deeper scopes do not survive a
    /// merge into a shallower node.
    pub scope: u32,
}

/// An arena of CFG nodes for one function or class body.
#[derive(Debug, Clone, Default)]
pub struct ControlFlowGraph {
    nodes: Vec<CfgNode>,
}

impl ControlFlowGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a node with no edges and returns its index.
    pub fn add_node(&mut self, kind: CfgNodeKind, scope: u32) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(CfgNode {
            kind,
            incoming: Vec::new(),
            outgoing: Vec::new(),
            scope,
        });
        id
    }

    /// Adds a directed edge `from -> to`, updating both adjacency lists.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId) {
        self.nodes[from.0].outgoing.push(to);
        self.nodes[to.0].incoming.push(from);
    }

    /// Returns the node at `id`.
    pub fn node(&self, id: NodeId) -> &CfgNode {
        &self.nodes[id.0]
    }

    /// Number of nodes in the graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates node ids in arena (source) order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Finds the graph's entry node: the first `FunctionEntry` or
    /// `ClassEntry` in arena order.
    pub fn entry(&self) -> Option<NodeId> {
        self.node_ids().find(|id| {
            matches!(
                self.node(*id).kind,
                CfgNodeKind::FunctionEntry { .. } | CfgNodeKind::ClassEntry { .. }
            )
        })
    }
}

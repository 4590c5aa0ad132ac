//! Per-node statement analysis.
//!
//! The reaching-definitions engine hands [`NodeAnalyzer`] one CFG node at a
//! time, with a symbol table already seeded from the node's IN-set. The
//! analyzer dispatches on the node kind, drives the expression analyzer over
//! every contained expression, and mutates the table — the engine then takes
//! the table's variable set back as the node's OUT-set.
//!
//! Entry nodes are where a function's initial state comes from: parameters
//! (typed `ANY` — the analyzer cannot see call sites), the vararg array, and
//! the reserved engine globals.

use crate::ast::{Expr, Parameter, Span, Statement, StatementKind};
use crate::cfg::{CaseLabel, CfgNodeKind, NodeId};
use crate::semantic::Sink;
use crate::semantic::builtins::RESERVED_GLOBALS;
use crate::semantic::error::Diagnostic;
use crate::semantic::expressions::ExpressionAnalyzer;
use crate::semantic::sense::SenseKind;
use crate::semantic::switch::{SwitchAnalysis, case_key, label_compatible};
use crate::semantic::symbols::{SetOutcome, SymbolTable};
use crate::semantic::types::TypeTag;
use crate::semantic::value::{ScrData, ScrValue, ScrVariable, StructArena};

/// Analyzes one CFG node against one symbol-table state.
pub struct NodeAnalyzer<'a, 'run> {
    pub table: &'run mut SymbolTable<'a>,
    pub structs: &'run mut StructArena,
    pub sink: &'run mut Sink,
    pub switches: &'run mut SwitchAnalysis,
}

impl<'a, 'run> NodeAnalyzer<'a, 'run> {
    pub fn new(
        table: &'run mut SymbolTable<'a>,
        structs: &'run mut StructArena,
        sink: &'run mut Sink,
        switches: &'run mut SwitchAnalysis,
    ) -> Self {
        Self {
            table,
            structs,
            sink,
            switches,
        }
    }

    fn exprs<'s>(&'s mut self) -> ExpressionAnalyzer<'a, 's> {
        ExpressionAnalyzer::new(self.table, self.structs, self.sink)
    }

    /// Analyzes the node `id` of kind `kind`, updating the symbol table.
    pub fn analyze_node(&mut self, id: NodeId, kind: &CfgNodeKind) {
        match kind {
            CfgNodeKind::FunctionEntry {
                name_span, params, vararg, ..
            } => self.analyze_function_entry(*name_span, params, *vararg),
            CfgNodeKind::ClassEntry { name_span, .. } => {
                self.sink
                    .sense(*name_span, SenseKind::Declaration, ScrData::of(TypeTag::OBJECT));
            }
            CfgNodeKind::ClassMembersBlock { members } => {
                for member in members {
                    let data = match &member.initializer {
                        Some(init) => self.exprs().analyze(init),
                        None => ScrData::undefined(),
                    };
                    self.sink.sense(member.span, SenseKind::ClassProperty, data);
                }
            }
            CfgNodeKind::BasicBlock { statements } => {
                for statement in statements {
                    self.analyze_statement(statement);
                }
            }
            CfgNodeKind::Enumeration {
                key,
                value,
                collection,
            } => self.analyze_enumeration(key.as_ref(), value, collection),
            CfgNodeKind::Iteration {
                init,
                condition,
                increment,
            } => {
                if let Some(init) = init {
                    self.analyze_statement(init);
                }
                if let Some(condition) = condition {
                    self.check_condition(condition);
                }
                if let Some(increment) = increment {
                    self.exprs().analyze(increment);
                }
            }
            CfgNodeKind::Decision { condition } => self.check_condition(condition),
            CfgNodeKind::Switch { subject } => {
                // The subject is evaluated on the first visit and cached;
                // fixed-point revisits reuse the cache. The diagnostic
                // re-walk analyzes it once more so its diagnostics and
                // sense tokens are collected.
                let first_visit = self.switches.context_mut(id).subject_tag().is_none();
                if first_visit || self.sink.is_enabled() {
                    let data = self.exprs().analyze(subject);
                    if data.is_void() {
                        self.sink.report(Diagnostic::NonBooleanCondition {
                            found: data.tag.to_string(),
                            span: subject.span,
                        });
                    }
                    self.switches.context_mut(id).cache_subject(data.tag);
                }
            }
            CfgNodeKind::SwitchCaseDecision { switch, labels } => {
                self.analyze_case_labels(id, *switch, labels);
            }
            CfgNodeKind::FunctionExit => {}
        }
    }

    fn analyze_function_entry(&mut self, name_span: Span, params: &[Parameter], vararg: bool) {
        // The engine injects these into every thread.
        for (name, tag) in RESERVED_GLOBALS {
            let data = if tag.intersects(TypeTag::COMPOSITE) {
                let id = self.structs.alloc(None);
                ScrData::aggregate(id, *tag)
            } else {
                ScrData::of(*tag)
            };
            self.table.seed_builtin_global(ScrVariable {
                name: (*name).to_string(),
                data,
                lexical_scope: 0,
                is_global: true,
            });
        }
        self.sink.sense(
            name_span,
            SenseKind::Declaration,
            ScrData::of(TypeTag::FUNCTION),
        );

        for param in params {
            // Call sites are invisible here, so a parameter can hold anything.
            if let Some(default) = &param.default {
                self.exprs().analyze(default);
            }
            let scope = self.table.scope();
            self.table.add_or_set_variable_symbol(ScrVariable {
                name: param.name.clone(),
                data: ScrData::any(),
                lexical_scope: scope,
                is_global: false,
            });
            self.sink
                .sense(param.span, SenseKind::Declaration, ScrData::any());
        }
        if vararg {
            let scope = self.table.scope();
            self.table.add_or_set_variable_symbol(ScrVariable {
                name: "vararg".to_string(),
                data: ScrData::of(TypeTag::ARRAY),
                lexical_scope: scope,
                is_global: false,
            });
        }
    }

    fn analyze_statement(&mut self, statement: &Statement) {
        match &statement.kind {
            StatementKind::Expression(expr) => {
                self.exprs().analyze(expr);
            }
            StatementKind::Const {
                name,
                name_span,
                value,
            } => {
                let data = self.exprs().analyze(value).into_read_only();
                // A second `const` is as much a constant write as `=` is.
                if let Some(var) = self.table.try_get_local_variable(name)
                    && var.data.read_only
                {
                    self.sink.report(Diagnostic::CannotAssignToConstant {
                        name: var.name.clone(),
                        span: *name_span,
                    });
                    return;
                }
                let scope = self.table.scope();
                let outcome = self.table.add_or_set_variable_symbol(ScrVariable {
                    name: name.clone(),
                    data: data.clone(),
                    lexical_scope: scope,
                    is_global: false,
                });
                match outcome {
                    SetOutcome::FailedReserved => {
                        self.sink.report(Diagnostic::ReservedSymbol {
                            name: name.clone(),
                            span: *name_span,
                        });
                    }
                    _ => self.sink.sense(*name_span, SenseKind::Declaration, data),
                }
            }
            StatementKind::Return { value } => {
                if let Some(value) = value {
                    self.exprs().analyze(value);
                }
            }
            StatementKind::Wait { duration } => {
                let data = self.exprs().analyze(duration);
                if !data.is_any() && !data.tag.intersects(TypeTag::NUMERIC) {
                    self.sink.report(Diagnostic::WaitDurationNotNumeric {
                        found: data.tag.to_string(),
                        span: duration.span,
                    });
                }
            }
            StatementKind::WaitTillFrameEnd
            | StatementKind::Break
            | StatementKind::Continue
            | StatementKind::Empty => {}
        }
    }

    fn check_condition(&mut self, condition: &Expr) {
        let data = self.exprs().analyze(condition);
        if !data.tag.can_evaluate_to_boolean() {
            self.sink.report(Diagnostic::NonBooleanCondition {
                found: data.tag.to_string(),
                span: condition.span,
            });
        }
    }

    fn analyze_enumeration(
        &mut self,
        key: Option<&(String, Span)>,
        value: &(String, Span),
        collection: &Expr,
    ) {
        let coll = self.exprs().analyze(collection);
        if !coll.is_any() && !coll.tag.intersects(TypeTag::ARRAY) {
            self.sink.report(Diagnostic::CollectionNotIterable {
                found: coll.tag.to_string(),
                span: collection.span,
            });
        }
        let scope = self.table.scope();
        if let Some((name, span)) = key {
            // Array keys are ints or strings.
            let data = ScrData::of(TypeTag::INT | TypeTag::STRING);
            self.table.add_or_set_variable_symbol(ScrVariable {
                name: name.clone(),
                data: data.clone(),
                lexical_scope: scope,
                is_global: false,
            });
            self.sink.sense(*span, SenseKind::Declaration, data);
        }
        let (name, span) = value;
        self.table.add_or_set_variable_symbol(ScrVariable {
            name: name.clone(),
            data: ScrData::any(),
            lexical_scope: scope,
            is_global: false,
        });
        self.sink
            .sense(*span, SenseKind::Declaration, ScrData::any());
    }

    fn analyze_case_labels(&mut self, id: NodeId, switch: NodeId, labels: &[CaseLabel]) {
        // Analyze label expressions before touching the shared context.
        let analyzed: Vec<(Option<ScrData>, Span)> = labels
            .iter()
            .map(|label| {
                let data = label.value.as_ref().map(|expr| self.exprs().analyze(expr));
                (data, label.span)
            })
            .collect();

        let context = self.switches.context_mut(switch);
        let subject = context.subject_tag();
        let first_visit = context.begin_case(id);

        for (data, span) in &analyzed {
            let Some(data) = data else {
                if first_visit
                    && let Some(_earlier) = self.switches.context_mut(switch).record_default(*span)
                {
                    self.sink
                        .report(Diagnostic::DuplicateDefaultLabel { span: *span });
                }
                continue;
            };
            // Compatibility is re-checked on every visit; the subject may
            // only be known after the switch head has been reached.
            if let Some(subject) = subject
                && !data.is_any()
                && !label_compatible(subject, data.tag)
            {
                self.sink.report(Diagnostic::CaseTypeMismatch {
                    expected: subject.to_string(),
                    found: data.tag.to_string(),
                    span: *span,
                });
            }
            if first_visit
                && let Some(key) = case_key(data)
                && self
                    .switches
                    .context_mut(switch)
                    .record_label(key, *span)
                    .is_some()
            {
                self.sink.report(Diagnostic::DuplicateCaseLabel {
                    label: label_text(data),
                    span: *span,
                });
            }
        }
    }
}

fn label_text(data: &ScrData) -> String {
    match &data.value {
        Some(ScrValue::Int(i)) => i.to_string(),
        Some(ScrValue::Float(f)) => f.to_string(),
        Some(ScrValue::Bool(b)) => b.to_string(),
        Some(ScrValue::String(s)) => s.clone(),
        _ => data.tag.to_string(),
    }
}

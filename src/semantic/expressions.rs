//! Expression analysis: type inference, constant folding, and expression
//! diagnostics.
//!
//! [`ExpressionAnalyzer::analyze`] walks an expression bottom-up and returns
//! the [`ScrData`] the expression evaluates to. When every operand carries a
//! statically-known value the result is folded (`5 / 2` is `Int 2`, integer
//! division truncates; `5.0 / 2` is `Float 2.5`); otherwise the result keeps
//! the most precise tag the operand tags allow.
//!
//! Diagnostics never abort a walk. An invalid operand is reported and the
//! subexpression degrades to `ANY`, so one mistake does not cascade into a
//! wall of follow-on errors. Arguments of a call are analyzed even when the
//! callee does not resolve, so they still get their own checks and tokens.
//!
//! Assignments are expressions in GSC. The analyzer writes the assigned
//! value through to the target — a variable binding, an aggregate field, or
//! an array slot — and reports read-only violations (constants, schema
//! fields) without ever mutating a static entity schema.

use crate::ast::{
    AssignOp, BinaryOp, Call, CallTarget, Expr, ExprKind, Namespace, Span, UnaryOp,
};
use crate::semantic::Sink;
use crate::semantic::error::Diagnostic;
use crate::semantic::sense::SenseKind;
use crate::semantic::symbols::{SetOutcome, SymbolTable};
use crate::semantic::types::TypeTag;
use crate::semantic::value::{
    FieldRef, FunctionHandle, ScrData, ScrValue, ScrVariable, StructArena,
};

/// Per-node expression analyzer.
///
/// Borrows the node's symbol table, the run's aggregate arena, and the run's
/// output sink; one instance lives for one node visit.
pub struct ExpressionAnalyzer<'a, 'run> {
    pub table: &'run mut SymbolTable<'a>,
    pub structs: &'run mut StructArena,
    pub sink: &'run mut Sink,
}

impl<'a, 'run> ExpressionAnalyzer<'a, 'run> {
    pub fn new(
        table: &'run mut SymbolTable<'a>,
        structs: &'run mut StructArena,
        sink: &'run mut Sink,
    ) -> Self {
        Self {
            table,
            structs,
            sink,
        }
    }

    /// Analyzes an expression, returning its inferred value.
    pub fn analyze(&mut self, expr: &Expr) -> ScrData {
        match &expr.kind {
            ExprKind::IntLiteral(v) => ScrData::int(*v),
            ExprKind::FloatLiteral(v) => ScrData::float(*v),
            ExprKind::BoolLiteral(v) => ScrData::boolean(*v),
            ExprKind::StringLiteral(s) => ScrData::string(s.clone()),
            ExprKind::IStringLiteral(s) => ScrData::istring(s.clone()),
            ExprKind::HashLiteral(s) => ScrData {
                value: Some(ScrValue::String(s.to_lowercase())),
                ..ScrData::of(TypeTag::HASH)
            },
            ExprKind::AnimLiteral(_) => ScrData::of(TypeTag::ANIM),
            ExprKind::AnimTreeLiteral => ScrData::of(TypeTag::ANIMTREE),
            ExprKind::UndefinedLiteral => ScrData::undefined(),
            ExprKind::EmptyArray => ScrData::of(TypeTag::ARRAY),
            ExprKind::Vector { x, y, z } => self.analyze_vector(x, y, z),
            ExprKind::Identifier(name) => self.analyze_identifier(name, expr.span),
            ExprKind::Grouped(inner) => self.analyze(inner),
            ExprKind::Unary { op, operand } => self.analyze_unary(*op, operand, expr.span),
            ExprKind::Binary { left, op, right } => self.analyze_binary(left, *op, right, expr.span),
            ExprKind::Ternary {
                condition,
                then_expr,
                else_expr,
            } => self.analyze_ternary(condition, then_expr, else_expr),
            ExprKind::Assignment { target, op, value } => {
                self.analyze_assignment(target, *op, value)
            }
            ExprKind::IncrementDecrement { target, increment } => {
                self.analyze_increment_decrement(target, *increment, expr.span)
            }
            ExprKind::FieldAccess {
                object,
                field,
                field_span,
            } => self.analyze_field_read(object, field, *field_span),
            ExprKind::Index { array, index } => self.analyze_index_read(array, index),
            ExprKind::Call(call) => self.analyze_call(None, call),
            ExprKind::MethodCall { receiver, call } => self.analyze_method_call(receiver, call),
            ExprKind::FunctionRef {
                namespace,
                name,
                name_span,
            } => self.analyze_function_ref(namespace.as_ref(), name, *name_span),
        }
    }

    // === Names ===

    /// Resolution order for a bare identifier: reaching variable binding
    /// (reserved globals are pre-seeded bindings), then implicit class
    /// member, then undefined-symbol diagnostic with `ANY` fallback.
    fn analyze_identifier(&mut self, name: &str, span: Span) -> ScrData {
        if let Some(var) = self.table.try_get_local_variable(name) {
            let data = var.data.clone();
            let kind = if self.table.builtins().is_reserved(name) {
                SenseKind::LanguageBuiltin
            } else {
                SenseKind::Usage
            };
            self.sink.sense(span, kind, data.clone());
            return data;
        }
        if let Some(tag) = self.table.class_member(name) {
            let data = ScrData::of(tag);
            self.sink.sense(span, SenseKind::ClassProperty, data.clone());
            return data;
        }
        self.sink.report(Diagnostic::UndefinedSymbol {
            name: name.to_string(),
            span,
        });
        ScrData::any()
    }

    // === Constructors ===

    fn analyze_vector(&mut self, x: &Expr, y: &Expr, z: &Expr) -> ScrData {
        let mut components = [0.0f64; 3];
        let mut all_known = true;
        for (slot, expr) in components.iter_mut().zip([x, y, z]) {
            let data = self.analyze(expr);
            if !data.is_any() && !data.tag.intersects(TypeTag::NUMERIC | TypeTag::BOOL) {
                self.sink.report(Diagnostic::VectorComponentNotNumeric {
                    found: data.tag.to_string(),
                    span: expr.span,
                });
                all_known = false;
                continue;
            }
            match data.value.as_ref().and_then(float_value) {
                Some(v) => *slot = v,
                None => all_known = false,
            }
        }
        if all_known {
            ScrData::vector(components[0], components[1], components[2])
        } else {
            ScrData::of(TypeTag::VECTOR3)
        }
    }

    // === Operators ===

    fn analyze_unary(&mut self, op: UnaryOp, operand: &Expr, span: Span) -> ScrData {
        let data = self.analyze(operand);
        match op {
            UnaryOp::Negate => {
                if !data.is_any() && !data.tag.intersects(TypeTag::NUMERIC | TypeTag::VECTOR3) {
                    self.sink.report(Diagnostic::InvalidUnaryOperand {
                        op: op.as_str(),
                        operand_type: data.tag.to_string(),
                        span,
                    });
                    return ScrData::any();
                }
                match data.value {
                    Some(ScrValue::Int(i)) => ScrData::int(i.wrapping_neg()),
                    Some(ScrValue::Float(f)) => ScrData::float(-f),
                    Some(ScrValue::Vector(x, y, z)) => ScrData::vector(-x, -y, -z),
                    _ if data.is_any() => ScrData::of(TypeTag::NUMERIC | TypeTag::VECTOR3),
                    _ => ScrData::of(data.tag.intersection(TypeTag::NUMERIC | TypeTag::VECTOR3)),
                }
            }
            UnaryOp::Not => {
                if data.is_void() {
                    self.sink.report(Diagnostic::InvalidUnaryOperand {
                        op: op.as_str(),
                        operand_type: data.tag.to_string(),
                        span,
                    });
                    return ScrData::of(TypeTag::BOOL);
                }
                match data.truthiness() {
                    Some(t) => ScrData::boolean(!t),
                    None => ScrData::of(TypeTag::BOOL),
                }
            }
            UnaryOp::BitNot => {
                if !data.is_any() && !data.tag.intersects(TypeTag::INT) {
                    self.sink.report(Diagnostic::InvalidUnaryOperand {
                        op: op.as_str(),
                        operand_type: data.tag.to_string(),
                        span,
                    });
                    return ScrData::any();
                }
                match data.value.as_ref().and_then(int_value) {
                    Some(i) => ScrData::int(!i),
                    None => ScrData::of(TypeTag::INT),
                }
            }
        }
    }

    fn analyze_binary(&mut self, left: &Expr, op: BinaryOp, right: &Expr, span: Span) -> ScrData {
        let left_data = self.analyze(left);
        let right_data = self.analyze(right);
        self.binary_result(op, &left_data, &right_data, span)
    }

    /// The binary-operator rule table, shared with compound assignments.
    pub(crate) fn binary_result(
        &mut self,
        op: BinaryOp,
        left: &ScrData,
        right: &ScrData,
        span: Span,
    ) -> ScrData {
        if op.is_equality() {
            return self.equality(left, right);
        }
        if op.is_ordering() {
            return self.ordering(op, left, right, span);
        }
        if op.is_bitwise() {
            return self.bitwise(op, left, right, span);
        }
        if matches!(op, BinaryOp::And | BinaryOp::Or) {
            return self.logical(op, left, right, span);
        }
        self.arithmetic(op, left, right, span)
    }

    fn arithmetic(&mut self, op: BinaryOp, left: &ScrData, right: &ScrData, span: Span) -> ScrData {
        // `+` with a string side concatenates.
        if op == BinaryOp::Add
            && (left.tag.is_definitely(TypeTag::ISTRING)
                || right.tag.is_definitely(TypeTag::ISTRING))
        {
            if let (Some(l), Some(r)) = (&left.value, &right.value)
                && let (Some(ls), Some(rs)) = (concat_text(l), concat_text(r))
            {
                return ScrData::string(format!("{ls}{rs}"));
            }
            return ScrData::of(TypeTag::STRING);
        }

        // Vector arithmetic: vector +/- vector, vector scaled by a number.
        let left_vec = left.tag.is_definitely(TypeTag::VECTOR3);
        let right_vec = right.tag.is_definitely(TypeTag::VECTOR3);
        if left_vec || right_vec {
            return self.vector_arithmetic(op, left, right, left_vec, right_vec, span);
        }

        let arith_ok =
            |d: &ScrData| d.is_any() || d.tag.intersects(TypeTag::NUMERIC | TypeTag::BOOL);
        if !arith_ok(left) || !arith_ok(right) {
            self.sink.report(Diagnostic::InvalidBinaryOperands {
                op: op.as_str(),
                left_type: left.tag.to_string(),
                right_type: right.tag.to_string(),
                span,
            });
            return ScrData::any();
        }

        if let (Some(lv), Some(rv)) = (&left.value, &right.value) {
            if let (Some(li), Some(ri)) = (int_value(lv), int_value(rv)) {
                return match op {
                    BinaryOp::Add => ScrData::int(li.wrapping_add(ri)),
                    BinaryOp::Subtract => ScrData::int(li.wrapping_sub(ri)),
                    BinaryOp::Multiply => ScrData::int(li.wrapping_mul(ri)),
                    BinaryOp::Divide | BinaryOp::Modulo => {
                        if ri == 0 {
                            self.sink.report(Diagnostic::DivisionByZero { span });
                            return ScrData::any();
                        }
                        if op == BinaryOp::Divide {
                            // GSC integer division truncates toward zero.
                            ScrData::int(li.wrapping_div(ri))
                        } else {
                            ScrData::int(li.wrapping_rem(ri))
                        }
                    }
                    _ => ScrData::of(TypeTag::INT),
                };
            }
            if let (Some(lf), Some(rf)) = (float_value(lv), float_value(rv)) {
                return match op {
                    BinaryOp::Add => ScrData::float(lf + rf),
                    BinaryOp::Subtract => ScrData::float(lf - rf),
                    BinaryOp::Multiply => ScrData::float(lf * rf),
                    BinaryOp::Divide | BinaryOp::Modulo => {
                        if rf == 0.0 {
                            self.sink.report(Diagnostic::DivisionByZero { span });
                            return ScrData::any();
                        }
                        if op == BinaryOp::Divide {
                            ScrData::float(lf / rf)
                        } else {
                            ScrData::float(lf % rf)
                        }
                    }
                    _ => ScrData::of(TypeTag::FLOAT),
                };
            }
        }

        // Unknown dividend, statically-zero divisor.
        if matches!(op, BinaryOp::Divide | BinaryOp::Modulo)
            && right.value.as_ref().and_then(float_value) == Some(0.0)
        {
            self.sink.report(Diagnostic::DivisionByZero { span });
            return ScrData::any();
        }

        let tag = if left.tag.is_definitely(TypeTag::INT | TypeTag::BOOL)
            && right.tag.is_definitely(TypeTag::INT | TypeTag::BOOL)
        {
            TypeTag::INT
        } else if left.tag.is_definitely(TypeTag::FLOAT) || right.tag.is_definitely(TypeTag::FLOAT)
        {
            TypeTag::FLOAT
        } else {
            TypeTag::NUMERIC
        };
        ScrData::of(tag)
    }

    fn vector_arithmetic(
        &mut self,
        op: BinaryOp,
        left: &ScrData,
        right: &ScrData,
        left_vec: bool,
        right_vec: bool,
        span: Span,
    ) -> ScrData {
        let valid = match op {
            BinaryOp::Add | BinaryOp::Subtract => left_vec && right_vec,
            BinaryOp::Multiply | BinaryOp::Divide => {
                let scalar_ok = |d: &ScrData, is_vec: bool| {
                    is_vec || d.is_any() || d.tag.intersects(TypeTag::NUMERIC)
                };
                scalar_ok(left, left_vec) && scalar_ok(right, right_vec) && !(left_vec && right_vec)
                    || (left_vec && right_vec && op == BinaryOp::Multiply)
            }
            _ => false,
        };
        if !valid {
            self.sink.report(Diagnostic::InvalidBinaryOperands {
                op: op.as_str(),
                left_type: left.tag.to_string(),
                right_type: right.tag.to_string(),
                span,
            });
            return ScrData::any();
        }
        if let (Some(ScrValue::Vector(lx, ly, lz)), Some(ScrValue::Vector(rx, ry, rz))) =
            (&left.value, &right.value)
        {
            return match op {
                BinaryOp::Add => ScrData::vector(lx + rx, ly + ry, lz + rz),
                BinaryOp::Subtract => ScrData::vector(lx - rx, ly - ry, lz - rz),
                // component-wise product
                BinaryOp::Multiply => ScrData::vector(lx * rx, ly * ry, lz * rz),
                _ => ScrData::of(TypeTag::VECTOR3),
            };
        }
        ScrData::of(TypeTag::VECTOR3)
    }

    fn equality(&mut self, left: &ScrData, right: &ScrData) -> ScrData {
        if let (Some(lv), Some(rv)) = (&left.value, &right.value) {
            let equal = match (float_value(lv), float_value(rv)) {
                (Some(lf), Some(rf)) => lf == rf,
                _ => lv == rv,
            };
            return ScrData::boolean(equal);
        }
        ScrData::of(TypeTag::BOOL)
    }

    fn ordering(&mut self, op: BinaryOp, left: &ScrData, right: &ScrData, span: Span) -> ScrData {
        let ord_ok = |d: &ScrData| d.is_any() || d.tag.intersects(TypeTag::NUMERIC | TypeTag::BOOL);
        if !ord_ok(left) || !ord_ok(right) {
            self.sink.report(Diagnostic::InvalidBinaryOperands {
                op: op.as_str(),
                left_type: left.tag.to_string(),
                right_type: right.tag.to_string(),
                span,
            });
            return ScrData::of(TypeTag::BOOL);
        }
        if let (Some(lf), Some(rf)) = (
            left.value.as_ref().and_then(float_value),
            right.value.as_ref().and_then(float_value),
        ) {
            let result = match op {
                BinaryOp::LessThan => lf < rf,
                BinaryOp::LessEqual => lf <= rf,
                BinaryOp::GreaterThan => lf > rf,
                _ => lf >= rf,
            };
            return ScrData::boolean(result);
        }
        ScrData::of(TypeTag::BOOL)
    }

    fn logical(&mut self, op: BinaryOp, left: &ScrData, right: &ScrData, span: Span) -> ScrData {
        for side in [left, right] {
            if side.is_void() {
                self.sink.report(Diagnostic::NonBooleanCondition {
                    found: side.tag.to_string(),
                    span,
                });
            }
        }
        match op {
            BinaryOp::And => match (left.truthiness(), right.truthiness()) {
                (Some(false), _) => ScrData::boolean(false),
                (Some(true), Some(r)) => ScrData::boolean(r),
                _ => ScrData::of(TypeTag::BOOL),
            },
            _ => match (left.truthiness(), right.truthiness()) {
                (Some(true), _) => ScrData::boolean(true),
                (Some(false), Some(r)) => ScrData::boolean(r),
                _ => ScrData::of(TypeTag::BOOL),
            },
        }
    }

    fn bitwise(&mut self, op: BinaryOp, left: &ScrData, right: &ScrData, span: Span) -> ScrData {
        let bit_ok = |d: &ScrData| d.is_any() || d.tag.intersects(TypeTag::INT | TypeTag::BOOL);
        if !bit_ok(left) || !bit_ok(right) {
            self.sink.report(Diagnostic::InvalidBinaryOperands {
                op: op.as_str(),
                left_type: left.tag.to_string(),
                right_type: right.tag.to_string(),
                span,
            });
            return ScrData::any();
        }
        if let (Some(li), Some(ri)) = (
            left.value.as_ref().and_then(int_value),
            right.value.as_ref().and_then(int_value),
        ) {
            let result = match op {
                BinaryOp::BitAnd => li & ri,
                BinaryOp::BitOr => li | ri,
                BinaryOp::BitXor => li ^ ri,
                BinaryOp::ShiftLeft => li.wrapping_shl(ri as u32),
                _ => li.wrapping_shr(ri as u32),
            };
            return ScrData::int(result);
        }
        ScrData::of(TypeTag::INT)
    }

    fn analyze_ternary(&mut self, condition: &Expr, then_expr: &Expr, else_expr: &Expr) -> ScrData {
        let cond = self.analyze(condition);
        if cond.is_void() {
            self.sink.report(Diagnostic::NonBooleanCondition {
                found: cond.tag.to_string(),
                span: condition.span,
            });
        }
        // Both branches are analyzed for their own diagnostics even when
        // only one is taken.
        let then_data = self.analyze(then_expr);
        let else_data = self.analyze(else_expr);
        match cond.truthiness() {
            Some(true) => then_data,
            Some(false) => else_data,
            None => self.structs.merge(&[then_data, else_data]),
        }
    }

    // === Assignment ===

    fn analyze_assignment(&mut self, target: &Expr, op: AssignOp, value: &Expr) -> ScrData {
        let value_data = self.analyze(value);
        let assigned = match op.binary_op() {
            Some(bin) => {
                let current = self.analyze(target);
                let span = target.span.merge(&value.span);
                self.binary_result(bin, &current, &value_data, span)
            }
            None => value_data,
        };
        self.write_target(target, assigned)
    }

    fn write_target(&mut self, target: &Expr, data: ScrData) -> ScrData {
        match &target.kind {
            ExprKind::Identifier(name) => self.assign_identifier(name, target.span, data),
            ExprKind::FieldAccess {
                object,
                field,
                field_span,
            } => self.assign_field(object, field, *field_span, data),
            ExprKind::Index { array, index } => self.assign_index(array, index, data),
            ExprKind::Grouped(inner) => self.write_target(inner, data),
            _ => {
                self.sink.report(Diagnostic::InvalidAssignmentTarget {
                    span: target.span,
                });
                data
            }
        }
    }

    fn assign_identifier(&mut self, name: &str, span: Span, data: ScrData) -> ScrData {
        if let Some(var) = self.table.try_get_local_variable(name)
            && var.data.read_only
        {
            self.sink.report(Diagnostic::CannotAssignToConstant {
                name: var.name.clone(),
                span,
            });
            return data;
        }
        let mut stored = data.clone();
        stored.owner = None;
        let scope = self.table.scope();
        let outcome = self.table.add_or_set_variable_symbol(ScrVariable {
            name: name.to_string(),
            data: stored,
            lexical_scope: scope,
            is_global: false,
        });
        match outcome {
            SetOutcome::New => self.sink.sense(span, SenseKind::Declaration, data.clone()),
            SetOutcome::Mutated => self.sink.sense(span, SenseKind::Usage, data.clone()),
            SetOutcome::FailedReserved => self.sink.report(Diagnostic::ReservedSymbol {
                name: name.to_string(),
                span,
            }),
        }
        data
    }

    fn assign_field(&mut self, object: &Expr, field: &str, field_span: Span, data: ScrData) -> ScrData {
        let obj = self.analyze(object);
        if !obj.is_any() && !obj.tag.intersects(TypeTag::COMPOSITE) {
            self.sink.report(Diagnostic::FieldAccessOnNonComposite {
                found: obj.tag.to_string(),
                span: field_span,
            });
            return data;
        }
        let field_key = field.to_lowercase();
        if let Some(ScrValue::Struct(id)) = obj.value {
            if self.structs.field_is_read_only(id, &field_key) {
                let type_name = self
                    .structs
                    .get(id)
                    .and_then(|s| s.schema)
                    .map(|s| s.name.to_string())
                    .unwrap_or_else(|| obj.tag.to_string());
                self.sink.report(Diagnostic::ReadOnlyField {
                    field: field.to_string(),
                    type_name,
                    span: field_span,
                });
                return data;
            }
            let mut stored = data.clone();
            stored.owner = None;
            self.structs.set_field(id, &field_key, stored);
        }
        self.sink.sense(field_span, SenseKind::Field, data.clone());
        data
    }

    fn assign_index(&mut self, array: &Expr, index: &Expr, data: ScrData) -> ScrData {
        let idx = self.analyze(index);
        if !idx.is_any()
            && !idx
                .tag
                .intersects(TypeTag::INT | TypeTag::ISTRING | TypeTag::HASH)
        {
            self.sink.report(Diagnostic::InvalidIndexType {
                found: idx.tag.to_string(),
                span: index.span,
            });
        }
        // Writing into an undefined local auto-vivifies an array.
        if let ExprKind::Identifier(name) = &array.kind {
            let needs_vivify = match self.table.try_get_local_variable(name) {
                Some(var) => var.data.tag == TypeTag::UNDEFINED && !var.data.read_only,
                None => true,
            };
            if needs_vivify {
                let scope = self.table.scope();
                self.table.add_or_set_variable_symbol(ScrVariable {
                    name: name.clone(),
                    data: ScrData::of(TypeTag::ARRAY),
                    lexical_scope: scope,
                    is_global: false,
                });
            }
        }
        let arr = self.analyze(array);
        if !arr.is_any() && !arr.tag.intersects(TypeTag::INDEXABLE) {
            self.sink.report(Diagnostic::NotIndexable {
                found: arr.tag.to_string(),
                span: array.span,
            });
        }
        data
    }

    fn analyze_increment_decrement(
        &mut self,
        target: &Expr,
        increment: bool,
        span: Span,
    ) -> ScrData {
        let op = if increment { "++" } else { "--" };
        let current = self.analyze(target);
        if !current.is_any() && !current.tag.intersects(TypeTag::NUMERIC) {
            self.sink.report(Diagnostic::InvalidUnaryOperand {
                op,
                operand_type: current.tag.to_string(),
                span,
            });
            return ScrData::any();
        }
        let delta = if increment { 1 } else { -1 };
        let next = match current.value {
            Some(ScrValue::Int(i)) => ScrData::int(i.wrapping_add(delta)),
            Some(ScrValue::Float(f)) => ScrData::float(f + delta as f64),
            _ if current.is_any() => ScrData::of(TypeTag::NUMERIC),
            _ => ScrData::of(current.tag.intersection(TypeTag::NUMERIC)),
        };
        match &target.kind {
            ExprKind::Identifier(name) => self.assign_identifier(name, target.span, next),
            ExprKind::FieldAccess {
                object,
                field,
                field_span,
            } => self.assign_field(object, field, *field_span, next),
            _ => next,
        }
    }

    // === Access ===

    fn analyze_field_read(&mut self, object: &Expr, field: &str, field_span: Span) -> ScrData {
        let obj = self.analyze(object);
        let field_key = field.to_lowercase();

        // Arrays and strings expose a synthetic read-only `size`.
        if field_key == "size"
            && !obj.is_any()
            && obj.tag.intersects(TypeTag::ARRAY | TypeTag::ISTRING)
        {
            let data = ScrData::of(TypeTag::INT).into_read_only();
            self.sink.sense(field_span, SenseKind::Field, data.clone());
            return data;
        }

        if obj.is_any() {
            self.sink.sense(field_span, SenseKind::Field, ScrData::any());
            return ScrData::any();
        }
        if !obj.tag.intersects(TypeTag::COMPOSITE) {
            self.sink.report(Diagnostic::FieldAccessOnNonComposite {
                found: obj.tag.to_string(),
                span: field_span,
            });
            return ScrData::any();
        }
        let data = match obj.value {
            Some(ScrValue::Struct(id)) => {
                self.structs.field(id, &field_key).unwrap_or_else(|| {
                    // Reading an unset field yields undefined; record
                    // where it was read from for the sense token.
                    ScrData::undefined().with_owner(FieldRef {
                        owner: id,
                        field: field_key.clone(),
                    })
                })
            }
            _ => ScrData::any(),
        };
        self.sink.sense(field_span, SenseKind::Field, data.clone());
        data
    }

    fn analyze_index_read(&mut self, array: &Expr, index: &Expr) -> ScrData {
        let arr = self.analyze(array);
        let idx = self.analyze(index);
        if !idx.is_any()
            && !idx
                .tag
                .intersects(TypeTag::INT | TypeTag::ISTRING | TypeTag::HASH)
        {
            self.sink.report(Diagnostic::InvalidIndexType {
                found: idx.tag.to_string(),
                span: index.span,
            });
        }
        if !arr.is_any() && !arr.tag.intersects(TypeTag::INDEXABLE) {
            self.sink.report(Diagnostic::NotIndexable {
                found: arr.tag.to_string(),
                span: array.span,
            });
            return ScrData::any();
        }
        // Element types are not tracked.
        ScrData::any()
    }

    // === Calls ===

    fn analyze_method_call(&mut self, receiver: &Expr, call: &Call) -> ScrData {
        let recv = self.analyze(receiver);
        if !recv.is_any() && !recv.tag.intersects(TypeTag::COMPOSITE) {
            self.sink.report(Diagnostic::InvalidCallTarget {
                found: recv.tag.to_string(),
                span: receiver.span,
            });
        }
        self.analyze_call(Some(&recv), call)
    }

    fn analyze_call(&mut self, receiver: Option<&ScrData>, call: &Call) -> ScrData {
        // Arguments always get analyzed, even when the callee is bogus.
        for arg in &call.args {
            self.analyze(arg);
        }
        let found = call.args.len();

        match &call.target {
            CallTarget::Named {
                namespace,
                name,
                name_span,
            } => {
                if let Some(ns) = namespace {
                    self.sink
                        .sense(ns.span, SenseKind::Namespace, ScrData::void());
                }
                let resolved = match (namespace, receiver.is_some()) {
                    (Some(ns), _) => self.table.try_get_namespaced_function_symbol(&ns.name, name),
                    (None, true) => self.table.try_get_method(name),
                    (None, false) => self.table.try_get_function(name),
                };
                let Some((sig, is_builtin)) = resolved else {
                    self.sink.report(Diagnostic::UndefinedFunction {
                        name: name.clone(),
                        namespace: namespace.as_ref().map(|n| n.name.clone()),
                        span: *name_span,
                    });
                    return if call.threaded {
                        ScrData::void()
                    } else {
                        ScrData::any()
                    };
                };
                let min = sig.min_args();
                let max = sig.max_args();
                let expected = sig.expected_args_label();
                let return_tag = sig.return_tag;
                if found < min || max.is_some_and(|m| found > m) {
                    self.sink.report(Diagnostic::ArgumentCountMismatch {
                        name: name.clone(),
                        expected,
                        found,
                        span: call.span,
                    });
                }
                let result = self.call_result(name, return_tag, is_builtin, call.threaded);
                let kind = if is_builtin {
                    SenseKind::LanguageBuiltin
                } else if receiver.is_some() {
                    SenseKind::Method
                } else {
                    SenseKind::FunctionCall
                };
                self.sink.sense(*name_span, kind, result.clone());
                result
            }
            CallTarget::Pointer(pointer) => self.analyze_pointer_call(pointer, call, found),
        }
    }

    fn analyze_pointer_call(&mut self, pointer: &Expr, call: &Call, found: usize) -> ScrData {
        let ptr = self.analyze(pointer);
        // Only a pointer dereferences; a bare function body does not.
        if !ptr.is_any() && !ptr.tag.intersects(TypeTag::FUNCTION_POINTER) {
            self.sink.report(Diagnostic::NotAFunctionPointer {
                found: ptr.tag.to_string(),
                span: pointer.span,
            });
            return if call.threaded {
                ScrData::void()
            } else {
                ScrData::any()
            };
        }
        // A pointer with a resolved handle still gets its signature checked.
        if let Some(ScrValue::Function(handle)) = &ptr.value {
            let name = handle.name.clone();
            let resolved = match &handle.namespace {
                Some(ns) => self.table.try_get_namespaced_function_symbol(ns, &name),
                None => self.table.try_get_function(&name),
            };
            if let Some((sig, is_builtin)) = resolved {
                let min = sig.min_args();
                let max = sig.max_args();
                let expected = sig.expected_args_label();
                let return_tag = sig.return_tag;
                if found < min || max.is_some_and(|m| found > m) {
                    self.sink.report(Diagnostic::ArgumentCountMismatch {
                        name,
                        expected,
                        found,
                        span: call.span,
                    });
                }
                return self.call_result(&handle.name.clone(), return_tag, is_builtin, call.threaded);
            }
        }
        if call.threaded {
            ScrData::void()
        } else {
            ScrData::any()
        }
    }

    /// The value a resolved call produces. Threaded calls never produce one.
    /// A builtin returning exactly `ENTITY` or `STRUCT` yields a fresh
    /// aggregate, schema-backed when the API declares one.
    fn call_result(
        &mut self,
        name: &str,
        return_tag: TypeTag,
        is_builtin: bool,
        threaded: bool,
    ) -> ScrData {
        if threaded {
            return ScrData::void();
        }
        if is_builtin && (return_tag == TypeTag::ENTITY || return_tag == TypeTag::STRUCT) {
            let schema = self.table.builtins().return_schema(name);
            let id = self.structs.alloc(schema);
            return ScrData::aggregate(id, return_tag);
        }
        ScrData::of(return_tag)
    }

    fn analyze_function_ref(
        &mut self,
        namespace: Option<&Namespace>,
        name: &str,
        name_span: Span,
    ) -> ScrData {
        if let Some(ns) = namespace {
            self.sink
                .sense(ns.span, SenseKind::Namespace, ScrData::void());
        }
        let resolved = match namespace {
            Some(ns) => self.table.try_get_namespaced_function_symbol(&ns.name, name),
            None => self.table.try_get_function(name),
        };
        let Some((_, is_builtin)) = resolved else {
            self.sink.report(Diagnostic::UndefinedFunction {
                name: name.to_string(),
                namespace: namespace.map(|n| n.name.clone()),
                span: name_span,
            });
            return ScrData::of(TypeTag::FUNCTION_POINTER);
        };
        let handle = FunctionHandle {
            namespace: namespace.map(|n| n.name.to_lowercase()),
            name: name.to_lowercase(),
        };
        let data = ScrData::function(handle, TypeTag::FUNCTION_POINTER);
        let kind = if is_builtin {
            SenseKind::LanguageBuiltin
        } else {
            SenseKind::FunctionCall
        };
        self.sink.sense(name_span, kind, data.clone());
        data
    }
}

fn int_value(value: &ScrValue) -> Option<i64> {
    match value {
        ScrValue::Int(i) => Some(*i),
        ScrValue::Bool(b) => Some(*b as i64),
        _ => None,
    }
}

fn float_value(value: &ScrValue) -> Option<f64> {
    match value {
        ScrValue::Int(i) => Some(*i as f64),
        ScrValue::Float(f) => Some(*f),
        ScrValue::Bool(b) => Some(*b as i64 as f64),
        _ => None,
    }
}

/// Text a known value contributes to string concatenation.
fn concat_text(value: &ScrValue) -> Option<String> {
    match value {
        ScrValue::String(s) => Some(s.clone()),
        ScrValue::Int(i) => Some(i.to_string()),
        ScrValue::Float(f) => Some(f.to_string()),
        ScrValue::Bool(b) => Some((*b as i64).to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::builtins::{BuiltinApi, WEAPON_SCHEMA};
    use crate::semantic::symbols::ExportedSymbols;
    use crate::semantic::value::VarMap;

    fn expr(kind: ExprKind) -> Expr {
        Expr::new(kind, Span::new(0, 0))
    }

    fn int_lit(v: i64) -> Expr {
        expr(ExprKind::IntLiteral(v))
    }

    fn float_lit(v: f64) -> Expr {
        expr(ExprKind::FloatLiteral(v))
    }

    fn ident(name: &str) -> Expr {
        expr(ExprKind::Identifier(name.to_string()))
    }

    fn binary(left: Expr, op: BinaryOp, right: Expr) -> Expr {
        expr(ExprKind::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        })
    }

    fn assign(target: Expr, value: Expr) -> Expr {
        expr(ExprKind::Assignment {
            target: Box::new(target),
            op: AssignOp::Assign,
            value: Box::new(value),
        })
    }

    struct Fixture {
        globals: ExportedSymbols,
        builtins: BuiltinApi,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                globals: ExportedSymbols::new(),
                builtins: BuiltinApi::new(),
            }
        }

        fn analyze_in(
            &self,
            vars: VarMap,
            structs: &mut StructArena,
            target: &Expr,
        ) -> (ScrData, Sink, VarMap) {
            let mut table = SymbolTable::new(&self.globals, &self.builtins, None, 0, vars);
            let mut sink = Sink::new();
            sink.set_enabled(true);
            let data =
                ExpressionAnalyzer::new(&mut table, structs, &mut sink).analyze(target);
            (data, sink, table.into_vars())
        }

        fn analyze(&self, target: &Expr) -> (ScrData, Sink, VarMap) {
            let mut structs = StructArena::new();
            self.analyze_in(VarMap::default(), &mut structs, target)
        }
    }

    fn var(name: &str, data: ScrData) -> (String, ScrVariable) {
        (
            name.to_string(),
            ScrVariable {
                name: name.to_string(),
                data,
                lexical_scope: 0,
                is_global: false,
            },
        )
    }

    #[test]
    fn test_int_division_truncates() {
        let fx = Fixture::new();
        let (data, sink, _) = fx.analyze(&binary(int_lit(5), BinaryOp::Divide, int_lit(2)));
        assert_eq!(data.value, Some(ScrValue::Int(2)));
        assert!(sink.diagnostics.is_empty());
    }

    #[test]
    fn test_mixed_division_is_float() {
        let fx = Fixture::new();
        let (data, _, _) = fx.analyze(&binary(float_lit(5.0), BinaryOp::Divide, int_lit(2)));
        assert_eq!(data.value, Some(ScrValue::Float(2.5)));
    }

    #[test]
    fn test_division_by_zero() {
        let fx = Fixture::new();
        let (data, sink, _) = fx.analyze(&binary(int_lit(5), BinaryOp::Divide, int_lit(0)));
        assert!(data.is_any());
        assert_eq!(sink.diagnostics.len(), 1);
        assert_eq!(sink.diagnostics[0].code(), "division-by-zero");
    }

    #[test]
    fn test_string_concatenation_folds() {
        let fx = Fixture::new();
        let left = expr(ExprKind::StringLiteral("kills: ".to_string()));
        let (data, _, _) = fx.analyze(&binary(left, BinaryOp::Add, int_lit(3)));
        assert_eq!(data.value, Some(ScrValue::String("kills: 3".to_string())));
    }

    #[test]
    fn test_arithmetic_on_unknown_keeps_tag() {
        let fx = Fixture::new();
        let vars = VarMap::from_iter([var("n", ScrData::of(TypeTag::INT))]);
        let mut structs = StructArena::new();
        let (data, sink, _) = fx.analyze_in(
            vars,
            &mut structs,
            &binary(ident("n"), BinaryOp::Add, int_lit(1)),
        );
        assert_eq!(data.tag, TypeTag::INT);
        assert!(data.value.is_none());
        assert!(sink.diagnostics.is_empty());
    }

    #[test]
    fn test_operator_type_mismatch() {
        let fx = Fixture::new();
        let vars = VarMap::from_iter([var("ent", ScrData::of(TypeTag::ENTITY))]);
        let mut structs = StructArena::new();
        let (data, sink, _) = fx.analyze_in(
            vars,
            &mut structs,
            &binary(int_lit(1), BinaryOp::Subtract, ident("ent")),
        );
        assert!(data.is_any());
        assert_eq!(sink.diagnostics.len(), 1);
        assert_eq!(sink.diagnostics[0].code(), "operator-type-mismatch");
    }

    #[test]
    fn test_undefined_identifier() {
        let fx = Fixture::new();
        let (data, sink, _) = fx.analyze(&ident("ghost"));
        assert!(data.is_any());
        assert_eq!(sink.diagnostics.len(), 1);
        assert_eq!(sink.diagnostics[0].code(), "undefined-symbol");
    }

    #[test]
    fn test_assignment_creates_binding() {
        let fx = Fixture::new();
        let (data, sink, vars) = fx.analyze(&assign(ident("x"), int_lit(7)));
        assert_eq!(data.value, Some(ScrValue::Int(7)));
        assert_eq!(vars.get("x").unwrap().data.value, Some(ScrValue::Int(7)));
        assert!(sink
            .sense_tokens
            .iter()
            .any(|t| t.kind == SenseKind::Declaration));
    }

    #[test]
    fn test_constant_reassignment() {
        let fx = Fixture::new();
        let vars = VarMap::from_iter([var("max_hp", ScrData::int(100).into_read_only())]);
        let mut structs = StructArena::new();
        let (_, sink, vars) =
            fx.analyze_in(vars, &mut structs, &assign(ident("max_hp"), int_lit(5)));
        assert_eq!(sink.diagnostics.len(), 1);
        assert_eq!(sink.diagnostics[0].code(), "cannot-assign-to-constant");
        // binding is untouched
        assert_eq!(
            vars.get("max_hp").unwrap().data.value,
            Some(ScrValue::Int(100))
        );
    }

    #[test]
    fn test_reserved_assignment() {
        let fx = Fixture::new();
        let (_, sink, vars) = fx.analyze(&assign(ident("level"), int_lit(1)));
        assert_eq!(sink.diagnostics.len(), 1);
        assert_eq!(sink.diagnostics[0].code(), "reserved-symbol");
        assert!(vars.get("level").is_none());
    }

    #[test]
    fn test_ternary_known_condition_picks_branch() {
        let fx = Fixture::new();
        let ternary = expr(ExprKind::Ternary {
            condition: Box::new(expr(ExprKind::BoolLiteral(true))),
            then_expr: Box::new(int_lit(1)),
            else_expr: Box::new(expr(ExprKind::StringLiteral("no".to_string()))),
        });
        let (data, _, _) = fx.analyze(&ternary);
        assert_eq!(data.value, Some(ScrValue::Int(1)));
    }

    #[test]
    fn test_ternary_unknown_condition_merges() {
        let fx = Fixture::new();
        let vars = VarMap::from_iter([var("flag", ScrData::of(TypeTag::BOOL))]);
        let ternary = expr(ExprKind::Ternary {
            condition: Box::new(ident("flag")),
            then_expr: Box::new(int_lit(1)),
            else_expr: Box::new(expr(ExprKind::StringLiteral("no".to_string()))),
        });
        let mut structs = StructArena::new();
        let (data, _, _) = fx.analyze_in(vars, &mut structs, &ternary);
        assert_eq!(data.tag, TypeTag::INT | TypeTag::STRING);
        assert!(data.value.is_none());
    }

    #[test]
    fn test_read_only_schema_field_write() {
        let fx = Fixture::new();
        let mut structs = StructArena::new();
        let weapon = structs.alloc(Some(&WEAPON_SCHEMA));
        let vars = VarMap::from_iter([var(
            "wpn",
            ScrData::aggregate(weapon, TypeTag::ENTITY),
        )]);
        let target = expr(ExprKind::FieldAccess {
            object: Box::new(ident("wpn")),
            field: "name".to_string(),
            field_span: Span::new(4, 8),
        });
        let (_, sink, _) = fx.analyze_in(vars, &mut structs, &assign(target, int_lit(1)));
        assert_eq!(sink.diagnostics.len(), 1);
        assert_eq!(sink.diagnostics[0].code(), "read-only-field");
        // the write never lands on the aggregate
        assert!(structs.get(weapon).unwrap().fields.is_empty());
    }

    #[test]
    fn test_schema_field_read_materializes_declared_type() {
        let fx = Fixture::new();
        let mut structs = StructArena::new();
        let weapon = structs.alloc(Some(&WEAPON_SCHEMA));
        let vars = VarMap::from_iter([var(
            "wpn",
            ScrData::aggregate(weapon, TypeTag::ENTITY),
        )]);
        let read = expr(ExprKind::FieldAccess {
            object: Box::new(ident("wpn")),
            field: "clipsize".to_string(),
            field_span: Span::new(4, 12),
        });
        let (data, sink, _) = fx.analyze_in(vars, &mut structs, &read);
        assert_eq!(data.tag, TypeTag::INT);
        assert!(data.read_only);
        let origin = data.owner.expect("field read records its origin");
        assert_eq!(origin.owner, weapon);
        assert_eq!(origin.field, "clipsize");
        assert!(sink.diagnostics.is_empty());
    }

    #[test]
    fn test_array_size_field() {
        let fx = Fixture::new();
        let vars = VarMap::from_iter([var("arr", ScrData::of(TypeTag::ARRAY))]);
        let read = expr(ExprKind::FieldAccess {
            object: Box::new(ident("arr")),
            field: "size".to_string(),
            field_span: Span::new(4, 8),
        });
        let mut structs = StructArena::new();
        let (data, sink, _) = fx.analyze_in(vars, &mut structs, &read);
        assert_eq!(data.tag, TypeTag::INT);
        assert!(sink.diagnostics.is_empty());
    }

    #[test]
    fn test_index_write_auto_vivifies_array() {
        let fx = Fixture::new();
        let target = expr(ExprKind::Index {
            array: Box::new(ident("drops")),
            index: Box::new(int_lit(0)),
        });
        let (_, sink, vars) = fx.analyze(&assign(target, int_lit(1)));
        assert!(sink.diagnostics.is_empty());
        assert_eq!(vars.get("drops").unwrap().data.tag, TypeTag::ARRAY);
    }

    #[test]
    fn test_index_read_on_non_indexable() {
        let fx = Fixture::new();
        let vars = VarMap::from_iter([var("n", ScrData::int(3))]);
        let read = expr(ExprKind::Index {
            array: Box::new(ident("n")),
            index: Box::new(int_lit(0)),
        });
        let mut structs = StructArena::new();
        let (data, sink, _) = fx.analyze_in(vars, &mut structs, &read);
        assert!(data.is_any());
        assert_eq!(sink.diagnostics.len(), 1);
        assert_eq!(sink.diagnostics[0].code(), "not-indexable");
    }

    #[test]
    fn test_builtin_call_returns_declared_tag() {
        let fx = Fixture::new();
        let call = expr(ExprKind::Call(Call {
            target: CallTarget::Named {
                namespace: None,
                name: "gettime".to_string(),
                name_span: Span::new(0, 7),
            },
            args: vec![],
            threaded: false,
            span: Span::new(0, 9),
        }));
        let (data, sink, _) = fx.analyze(&call);
        assert_eq!(data.tag, TypeTag::INT);
        assert!(sink.diagnostics.is_empty());
        assert!(sink
            .sense_tokens
            .iter()
            .any(|t| t.kind == SenseKind::LanguageBuiltin));
    }

    #[test]
    fn test_threaded_call_is_void() {
        let fx = Fixture::new();
        let call = expr(ExprKind::Call(Call {
            target: CallTarget::Named {
                namespace: None,
                name: "gettime".to_string(),
                name_span: Span::new(0, 7),
            },
            args: vec![],
            threaded: true,
            span: Span::new(0, 9),
        }));
        let (data, _, _) = fx.analyze(&call);
        assert!(data.is_void());
    }

    #[test]
    fn test_argument_count_mismatch() {
        let fx = Fixture::new();
        let call = expr(ExprKind::Call(Call {
            target: CallTarget::Named {
                namespace: None,
                name: "getdvar".to_string(),
                name_span: Span::new(0, 7),
            },
            args: vec![],
            threaded: false,
            span: Span::new(0, 9),
        }));
        let (_, sink, _) = fx.analyze(&call);
        assert_eq!(sink.diagnostics.len(), 1);
        assert_eq!(sink.diagnostics[0].code(), "argument-count-mismatch");
    }

    #[test]
    fn test_undefined_callee_still_analyzes_args() {
        let fx = Fixture::new();
        let call = expr(ExprKind::Call(Call {
            target: CallTarget::Named {
                namespace: None,
                name: "no_such_fn".to_string(),
                name_span: Span::new(0, 10),
            },
            args: vec![ident("ghost")],
            threaded: false,
            span: Span::new(0, 17),
        }));
        let (data, sink, _) = fx.analyze(&call);
        assert!(data.is_any());
        let codes: Vec<_> = sink.diagnostics.iter().map(|d| d.code()).collect();
        assert!(codes.contains(&"undefined-symbol"));
        assert!(codes.contains(&"undefined-function"));
    }

    #[test]
    fn test_builtin_entity_return_carries_schema() {
        let fx = Fixture::new();
        let call = expr(ExprKind::Call(Call {
            target: CallTarget::Named {
                namespace: None,
                name: "getweapon".to_string(),
                name_span: Span::new(0, 9),
            },
            args: vec![expr(ExprKind::StringLiteral("ar_rifle".to_string()))],
            threaded: false,
            span: Span::new(0, 20),
        }));
        let mut structs = StructArena::new();
        let (data, _, _) = fx.analyze_in(VarMap::default(), &mut structs, &call);
        let Some(ScrValue::Struct(id)) = data.value else {
            panic!("expected aggregate result");
        };
        assert_eq!(structs.get(id).unwrap().schema.unwrap().name, "weapon");
    }

    #[test]
    fn test_function_ref_resolves_to_pointer() {
        let fx = Fixture::new();
        let reference = expr(ExprKind::FunctionRef {
            namespace: None,
            name: "gettime".to_string(),
            name_span: Span::new(1, 8),
        });
        let (data, sink, _) = fx.analyze(&reference);
        assert_eq!(data.tag, TypeTag::FUNCTION_POINTER);
        assert!(matches!(data.value, Some(ScrValue::Function(_))));
        assert!(sink.diagnostics.is_empty());
    }

    #[test]
    fn test_pointer_call_through_known_handle() {
        let fx = Fixture::new();
        let vars = VarMap::from_iter([var(
            "fn",
            ScrData::function(
                FunctionHandle {
                    namespace: None,
                    name: "gettime".to_string(),
                },
                TypeTag::FUNCTION_POINTER,
            ),
        )]);
        let call = expr(ExprKind::Call(Call {
            target: CallTarget::Pointer(Box::new(ident("fn"))),
            args: vec![],
            threaded: false,
            span: Span::new(0, 9),
        }));
        let mut structs = StructArena::new();
        let (data, sink, _) = fx.analyze_in(vars, &mut structs, &call);
        assert_eq!(data.tag, TypeTag::INT);
        assert!(sink.diagnostics.is_empty());
    }

    #[test]
    fn test_pointer_call_on_non_pointer() {
        let fx = Fixture::new();
        let call = expr(ExprKind::Call(Call {
            target: CallTarget::Pointer(Box::new(int_lit(3))),
            args: vec![],
            threaded: false,
            span: Span::new(0, 9),
        }));
        let (data, sink, _) = fx.analyze(&call);
        assert!(data.is_any());
        assert_eq!(sink.diagnostics.len(), 1);
        assert_eq!(sink.diagnostics[0].code(), "not-a-function-pointer");
    }

    #[test]
    fn test_pointer_call_rejects_bare_function_value() {
        let fx = Fixture::new();
        let vars = VarMap::from_iter([var("fn", ScrData::of(TypeTag::FUNCTION))]);
        let call = expr(ExprKind::Call(Call {
            target: CallTarget::Pointer(Box::new(ident("fn"))),
            args: vec![],
            threaded: false,
            span: Span::new(0, 9),
        }));
        let mut structs = StructArena::new();
        let (data, sink, _) = fx.analyze_in(vars, &mut structs, &call);
        assert!(data.is_any());
        assert_eq!(sink.diagnostics.len(), 1);
        assert_eq!(sink.diagnostics[0].code(), "not-a-function-pointer");
    }

    #[test]
    fn test_compound_assignment_desugars() {
        let fx = Fixture::new();
        let vars = VarMap::from_iter([var("n", ScrData::int(10))]);
        let target = expr(ExprKind::Assignment {
            target: Box::new(ident("n")),
            op: AssignOp::Divide,
            value: Box::new(int_lit(4)),
        });
        let mut structs = StructArena::new();
        let (data, _, vars) = fx.analyze_in(vars, &mut structs, &target);
        assert_eq!(data.value, Some(ScrValue::Int(2)));
        assert_eq!(vars.get("n").unwrap().data.value, Some(ScrValue::Int(2)));
    }

    #[test]
    fn test_increment_folds_known_int() {
        let fx = Fixture::new();
        let vars = VarMap::from_iter([var("n", ScrData::int(1))]);
        let target = expr(ExprKind::IncrementDecrement {
            target: Box::new(ident("n")),
            increment: true,
        });
        let mut structs = StructArena::new();
        let (data, _, vars) = fx.analyze_in(vars, &mut structs, &target);
        assert_eq!(data.value, Some(ScrValue::Int(2)));
        assert_eq!(vars.get("n").unwrap().data.value, Some(ScrValue::Int(2)));
    }

    #[test]
    fn test_logical_short_circuit_folds() {
        let fx = Fixture::new();
        let vars = VarMap::from_iter([var("flag", ScrData::of(TypeTag::BOOL))]);
        let mut structs = StructArena::new();
        let (data, _, _) = fx.analyze_in(
            vars.clone(),
            &mut structs,
            &binary(expr(ExprKind::BoolLiteral(false)), BinaryOp::And, ident("flag")),
        );
        assert_eq!(data.value, Some(ScrValue::Bool(false)));

        let (data, _, _) = fx.analyze_in(
            vars,
            &mut structs,
            &binary(expr(ExprKind::BoolLiteral(true)), BinaryOp::Or, ident("flag")),
        );
        assert_eq!(data.value, Some(ScrValue::Bool(true)));
    }

    #[test]
    fn test_vector_constructor_folds() {
        let fx = Fixture::new();
        let vector = expr(ExprKind::Vector {
            x: Box::new(int_lit(1)),
            y: Box::new(float_lit(2.5)),
            z: Box::new(int_lit(0)),
        });
        let (data, sink, _) = fx.analyze(&vector);
        assert_eq!(data.value, Some(ScrValue::Vector(1.0, 2.5, 0.0)));
        assert!(sink.diagnostics.is_empty());
    }

    #[test]
    fn test_vector_component_not_numeric() {
        let fx = Fixture::new();
        let vector = expr(ExprKind::Vector {
            x: Box::new(expr(ExprKind::StringLiteral("x".to_string()))),
            y: Box::new(int_lit(0)),
            z: Box::new(int_lit(0)),
        });
        let (data, sink, _) = fx.analyze(&vector);
        assert_eq!(data.tag, TypeTag::VECTOR3);
        assert!(data.value.is_none());
        assert_eq!(sink.diagnostics.len(), 1);
        assert_eq!(sink.diagnostics[0].code(), "vector-component-not-numeric");
    }
}

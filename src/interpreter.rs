//! The tree-walking evaluator (spec §4.H).
//!
//! Grounded on the teacher's `run.rs` recursive-descent dispatch over
//! `expressions.rs` nodes, adapted from bytecode execution to direct
//! recursion over a checked AST (spec §9 design notes: no compile step, no
//! bytecode, since the checked tree is already the executable form).

use std::{collections::HashMap, rc::Rc};

use crate::{
    ast::{Call, Comprehension, Constant, Entry, Expr, ExprKind, IdentKind, SpecialCall},
    attribute::Qualifier,
    dispatcher::Dispatcher,
    error::EvalError,
    frame::Frame,
    resolver::Resolved,
    type_provider::TypeProvider,
    unknown::UnknownSet,
    value::{MapKey, OrderedMap, Value},
};

enum LogicalOp {
    And,
    Or,
}

/// If any of `values` is an error or an unknown-set, returns the value that
/// should short-circuit the enclosing call: the first error (left wins),
/// else the merge of every unknown-set present (spec §4.D strictness).
fn propagate_if_abnormal(values: &[Value]) -> Option<Value> {
    if let Some(err) = values.iter().find_map(|v| match v {
        Value::Error(e) => Some(e.clone()),
        _ => None,
    }) {
        return Some(Value::Error(err));
    }
    let mut merged: Option<UnknownSet> = None;
    for v in values {
        if let Value::Unknown(u) = v {
            merged = Some(match merged {
                Some(m) => m.merge(u.clone()),
                None => u.clone(),
            });
        }
    }
    merged.map(Value::Unknown)
}

fn map_key_to_value(key: &MapKey) -> Value {
    match key {
        MapKey::Bool(b) => Value::Bool(*b),
        MapKey::Int(i) => Value::Int(*i),
        MapKey::Uint(u) => Value::Uint(*u),
        MapKey::String(s) => Value::String(s.clone()),
    }
}

/// A checked AST is a literal `false`, an `iter_var` named `#unused`, and an
/// empty-list `iter_range` — the shape the checker emits for `cel.bind`
/// (spec §4.H "Lazy expressions").
fn is_lazy_bind_shape(c: &Comprehension) -> bool {
    matches!(c.loop_condition.kind, ExprKind::Const(Constant::Bool(false)))
        && &*c.iter_var == "#unused"
        && matches!(&c.iter_range.kind, ExprKind::List(items) if items.is_empty())
}

pub struct Interpreter<'a> {
    dispatcher: &'a Dispatcher,
    type_provider: &'a dyn TypeProvider,
}

impl<'a> Interpreter<'a> {
    pub fn new(dispatcher: &'a Dispatcher, type_provider: &'a dyn TypeProvider) -> Self {
        Self { dispatcher, type_provider }
    }

    pub fn eval_expr(&self, expr: &Expr, frame: &mut Frame) -> Resolved {
        let resolved = self.eval_kind(expr, frame);
        frame.notify(expr, &resolved.value);
        resolved
    }

    fn eval_kind(&self, expr: &Expr, frame: &mut Frame) -> Resolved {
        match &expr.kind {
            ExprKind::Const(c) => Resolved::bare(c.clone().into_value()),
            ExprKind::Ident { name, kind } => self.eval_ident(expr, name, kind, frame),
            ExprKind::Select { operand, field, test_only } => self.eval_select(expr, operand, field, *test_only, frame),
            ExprKind::Special(special) => self.eval_special(expr, special, frame),
            ExprKind::Call(call) => self.eval_call(expr, call, frame),
            ExprKind::List(items) => self.eval_list(items, frame),
            ExprKind::Map(entries) => self.eval_map(entries, frame),
            ExprKind::Struct { type_name, fields } => self.eval_struct(type_name, fields, frame),
            ExprKind::Comprehension(c) => self.eval_comprehension(expr, c, frame),
        }
    }

    fn eval_ident(&self, expr: &Expr, name: &Rc<str>, kind: &IdentKind, frame: &mut Frame) -> Resolved {
        if let IdentKind::Type(_) = kind {
            return match self.type_provider.adapt_type(name) {
                Ok(v) => Resolved::bare(v),
                Err(e) => Resolved::bare(Value::Error(Rc::new(e.at(expr.id)))),
            };
        }
        if let Some(thunk) = frame.pending_thunk(name) {
            let inner = self.eval_expr(&thunk, frame);
            frame.force_thunk(name, inner.value.clone());
            return inner;
        }
        if let Some(value) = frame.forced_thunk(name) {
            return Resolved::bare(value);
        }
        frame.resolver.resolve_simple(name, expr.id)
    }

    fn eval_select(&self, expr: &Expr, operand: &Expr, field: &Rc<str>, test_only: bool, frame: &mut Frame) -> Resolved {
        let operand_r = self.eval_expr(operand, frame);
        if matches!(operand_r.value, Value::Error(_)) {
            return operand_r;
        }
        let new_attr = operand_r.attribute.as_ref().map(|a| a.qualify(Qualifier::String(field.clone())));
        if let Some(attr) = &new_attr {
            if let Some(value) = frame.resolver.resolve_attribute(attr) {
                return Resolved::new(Some(attr.clone()), value);
            }
            // A deeper qualifier can match a declared unknown pattern even
            // when the shallower attribute didn't (e.g. `request.*` doesn't
            // match bare `request`, but does match `request.user`), so this
            // check must run before the generic abnormal-operand early-out.
            if matches!(operand_r.value, Value::Unknown(_)) {
                if let Some(unknown) = frame.resolver.maybe_partial_unknown(attr) {
                    return Resolved::new(Some(attr.clone()), Value::Unknown(unknown));
                }
            }
        }
        if matches!(operand_r.value, Value::Unknown(_)) {
            return operand_r;
        }
        let result = match &operand_r.value {
            Value::Map(map) => {
                if test_only {
                    Ok(Value::Bool(map.contains_key(&MapKey::String(field.clone()))))
                } else {
                    crate::listmap::map_index(map, &Value::String(field.clone()))
                }
            }
            other => {
                if test_only {
                    self.type_provider.has_field(other, field).map(Value::Bool)
                } else {
                    self.type_provider.select_field(other, field)
                }
            }
        };
        match result {
            Ok(v) => Resolved::new(new_attr, v),
            Err(e) => Resolved::bare(Value::Error(Rc::new(e.at(expr.id)))),
        }
    }

    fn eval_special(&self, expr: &Expr, special: &SpecialCall, frame: &mut Frame) -> Resolved {
        match special {
            SpecialCall::Identity(inner) => self.eval_expr(inner, frame),
            SpecialCall::Conditional { cond, then, otherwise } => self.eval_conditional(expr, cond, then, otherwise, frame),
            SpecialCall::LogicalAnd(a, b) => self.eval_logical(LogicalOp::And, a, b, frame),
            SpecialCall::LogicalOr(a, b) => self.eval_logical(LogicalOp::Or, a, b, frame),
            SpecialCall::NotStrictlyFalse(inner) => {
                let r = self.eval_expr(inner, frame);
                Resolved::bare(Value::Bool(not_strictly_false(&r.value)))
            }
            SpecialCall::Type(inner) => self.eval_type_of(expr, inner, frame),
            SpecialCall::OptionalOr(a, b) => self.eval_optional_or(a, b, frame),
            SpecialCall::OptionalOrValue(a, b) => self.eval_optional_or_value(a, b, frame),
            SpecialCall::SelectOptionalField { operand, field } => self.eval_select_optional_field(operand, field, frame),
            SpecialCall::CelBlockList { bindings, body } => self.eval_cel_block_list(bindings, body, frame),
        }
    }

    fn eval_conditional(&self, expr: &Expr, cond: &Expr, then: &Expr, otherwise: &Expr, frame: &mut Frame) -> Resolved {
        let cond_r = self.eval_expr(cond, frame);
        match cond_r.value {
            Value::Error(_) | Value::Unknown(_) => cond_r,
            Value::Bool(b) => {
                if frame.options.enable_short_circuiting {
                    if b { self.eval_expr(then, frame) } else { self.eval_expr(otherwise, frame) }
                } else {
                    let then_r = self.eval_expr(then, frame);
                    let otherwise_r = self.eval_expr(otherwise, frame);
                    if b { then_r } else { otherwise_r }
                }
            }
            _ => Resolved::bare(Value::Error(Rc::new(
                EvalError::invalid_argument("conditional expects a bool condition").at(expr.id),
            ))),
        }
    }

    fn eval_logical(&self, op: LogicalOp, a: &Expr, b: &Expr, frame: &mut Frame) -> Resolved {
        let absorbing = matches!(op, LogicalOp::Or);
        let a_r = self.eval_expr(a, frame);
        if let Value::Bool(x) = a_r.value {
            if x == absorbing {
                if !frame.options.enable_short_circuiting {
                    let _ = self.eval_expr(b, frame);
                }
                return Resolved::bare(Value::Bool(absorbing));
            }
        }
        let b_r = self.eval_expr(b, frame);
        combine_logical(absorbing, a_r.value, b_r.value)
    }

    fn eval_type_of(&self, expr: &Expr, inner: &Expr, frame: &mut Frame) -> Resolved {
        let r = self.eval_expr(inner, frame);
        if matches!(r.value, Value::Error(_) | Value::Unknown(_)) {
            return r;
        }
        if matches!(r.value, Value::Message(_)) {
            return match self.type_provider.resolve_object_type(&r.value, &Value::Null) {
                Ok(v) => Resolved::bare(v),
                Err(e) => Resolved::bare(Value::Error(Rc::new(e.at(expr.id)))),
            };
        }
        Resolved::bare(Value::Type(r.value.type_value()))
    }

    fn eval_optional_or(&self, a: &Expr, b: &Expr, frame: &mut Frame) -> Resolved {
        let a_r = self.eval_expr(a, frame);
        match a_r.value {
            Value::Optional(Some(_)) => a_r,
            Value::Optional(None) => self.eval_expr(b, frame),
            Value::Error(_) | Value::Unknown(_) => a_r,
            other => Resolved::bare(other),
        }
    }

    fn eval_optional_or_value(&self, a: &Expr, b: &Expr, frame: &mut Frame) -> Resolved {
        let a_r = self.eval_expr(a, frame);
        match a_r.value {
            Value::Optional(Some(inner)) => Resolved::bare(*inner),
            Value::Optional(None) => self.eval_expr(b, frame),
            Value::Error(_) | Value::Unknown(_) => a_r,
            other => Resolved::bare(other),
        }
    }

    fn eval_select_optional_field(&self, operand: &Expr, field: &Rc<str>, frame: &mut Frame) -> Resolved {
        let operand_r = self.eval_expr(operand, frame);
        let target = match operand_r.value {
            Value::Error(_) | Value::Unknown(_) => return operand_r,
            Value::Optional(None) => return Resolved::bare(Value::Optional(None)),
            Value::Optional(Some(inner)) => *inner,
            other => other,
        };
        let result = match &target {
            Value::Map(map) => map.get(&MapKey::String(field.clone())).cloned(),
            other => self.type_provider.select_field(other, field).ok(),
        };
        Resolved::bare(Value::Optional(result.map(Box::new)))
    }

    fn eval_cel_block_list(&self, bindings: &[Expr], body: &Expr, frame: &mut Frame) -> Resolved {
        frame.push_scope(HashMap::new());
        let names: Vec<Rc<str>> = (0..bindings.len()).map(|i| Rc::from(format!("@index{i}"))).collect();
        for (name, binding) in names.iter().zip(bindings) {
            frame.declare_lazy_thunk(name.clone(), Rc::new(binding.clone()));
        }
        let result = self.eval_expr(body, frame);
        for name in &names {
            frame.remove_lazy_thunk(name);
        }
        frame.pop_scope();
        result
    }

    fn eval_call(&self, expr: &Expr, call: &Call, frame: &mut Frame) -> Resolved {
        let arg_results: Vec<Resolved> = call.args.iter().map(|a| self.eval_expr(a, frame)).collect();
        let arg_values: Vec<Value> = arg_results.iter().map(|r| r.value.clone()).collect();

        if call.is_index {
            return self.eval_index_call(expr, call, &arg_results, &arg_values, frame);
        }

        if let Some(abnormal) = propagate_if_abnormal(&arg_values) {
            return Resolved::bare(abnormal);
        }
        match self.dispatcher.dispatch(&call.function, &call.overload_ids, &arg_values) {
            Ok(v) => Resolved::bare(self.maybe_unwrap_well_known(v, frame)),
            Err(dispatch_err) => {
                if let Some(resolver) = frame.function_resolver() {
                    if let Some(v) = resolver.find_overload(&call.function, &call.overload_ids, &arg_values) {
                        return Resolved::bare(self.maybe_unwrap_well_known(v, frame));
                    }
                }
                Resolved::bare(Value::Error(Rc::new(dispatch_err.at(expr.id))))
            }
        }
    }

    fn eval_index_call(
        &self,
        expr: &Expr,
        call: &Call,
        arg_results: &[Resolved],
        arg_values: &[Value],
        frame: &mut Frame,
    ) -> Resolved {
        let operand = &arg_results[0];
        let key = &arg_results[1];
        if let Value::Error(_) = operand.value {
            return operand.clone();
        }
        let attr = operand.attribute.as_ref().zip(key.value.as_qualifier()).map(|(a, q)| a.qualify(q));
        if let Some(attr) = &attr {
            if let Some(value) = frame.resolver.resolve_attribute(attr) {
                return Resolved::new(Some(attr.clone()), value);
            }
            if matches!(operand.value, Value::Unknown(_)) {
                if let Some(unknown) = frame.resolver.maybe_partial_unknown(attr) {
                    return Resolved::new(Some(attr.clone()), Value::Unknown(unknown));
                }
            }
        }
        if let Some(abnormal) = propagate_if_abnormal(arg_values) {
            return Resolved::bare(abnormal);
        }
        match self.dispatcher.dispatch(&call.function, &call.overload_ids, arg_values) {
            Ok(v) => Resolved::new(attr, self.maybe_unwrap_well_known(v, frame)),
            Err(e) => Resolved::bare(Value::Error(Rc::new(e.at(expr.id)))),
        }
    }

    fn maybe_unwrap_well_known(&self, value: Value, frame: &Frame) -> Value {
        if frame.options.unwrap_well_known_types_on_dispatch { self.type_provider.adapt(value) } else { value }
    }

    fn eval_list(&self, items: &[Expr], frame: &mut Frame) -> Resolved {
        let values: Vec<Value> = items.iter().map(|e| self.eval_expr(e, frame).value).collect();
        if let Some(abnormal) = propagate_if_abnormal(&values) {
            return Resolved::bare(abnormal);
        }
        Resolved::bare(Value::list(values))
    }

    fn eval_map(&self, entries: &[Entry], frame: &mut Frame) -> Resolved {
        let mut pairs = Vec::with_capacity(entries.len());
        let mut abnormal_inputs = Vec::new();
        for entry in entries {
            let key_r = self.eval_expr(&entry.key, frame);
            let value_r = self.eval_expr(&entry.value, frame);
            abnormal_inputs.push(key_r.value.clone());
            abnormal_inputs.push(value_r.value.clone());
            pairs.push((key_r.value, value_r.value, entry.optional));
        }
        if let Some(abnormal) = propagate_if_abnormal(&abnormal_inputs) {
            return Resolved::bare(abnormal);
        }
        let mut map = OrderedMap::new();
        for (key_value, value_value, optional) in pairs {
            let value_value = if optional {
                match value_value {
                    Value::Optional(None) => continue,
                    Value::Optional(Some(inner)) => *inner,
                    other => other,
                }
            } else {
                value_value
            };
            let key = match crate::listmap::value_to_map_key(&key_value) {
                Ok(k) => k,
                Err(e) => return Resolved::bare(Value::Error(Rc::new(e))),
            };
            let replaced = map.insert(key, value_value);
            if replaced.is_some() && frame.options.error_on_duplicate_map_keys {
                return Resolved::bare(Value::Error(Rc::new(EvalError::duplicate_attribute(format!(
                    "duplicate map key: {key_value}"
                )))));
            }
        }
        Resolved::bare(Value::Map(Rc::new(map)))
    }

    fn eval_struct(&self, type_name: &Rc<str>, fields: &[Entry], frame: &mut Frame) -> Resolved {
        let mut values = Vec::with_capacity(fields.len());
        let mut abnormal_inputs = Vec::new();
        for entry in fields {
            let key_r = self.eval_expr(&entry.key, frame);
            let value_r = self.eval_expr(&entry.value, frame);
            let field_name = match &key_r.value {
                Value::String(s) => s.to_string(),
                other => other.to_string(),
            };
            abnormal_inputs.push(key_r.value.clone());
            abnormal_inputs.push(value_r.value.clone());
            values.push((field_name, value_r.value, entry.optional));
        }
        if let Some(abnormal) = propagate_if_abnormal(&abnormal_inputs) {
            return Resolved::bare(abnormal);
        }
        let mut fields_out = Vec::with_capacity(values.len());
        for (name, value, optional) in values {
            let value = if optional {
                match value {
                    Value::Optional(None) => continue,
                    Value::Optional(Some(inner)) => *inner,
                    other => other,
                }
            } else {
                value
            };
            fields_out.push((name, value));
        }
        match self.type_provider.create_message(type_name, fields_out) {
            Ok(v) => Resolved::bare(v),
            Err(e) => Resolved::bare(Value::Error(Rc::new(e))),
        }
    }

    fn eval_comprehension(&self, expr: &Expr, c: &Comprehension, frame: &mut Frame) -> Resolved {
        if is_lazy_bind_shape(c) {
            return self.eval_lazy_bind(c, frame);
        }

        let range_r = self.eval_expr(&c.iter_range, frame);
        if matches!(range_r.value, Value::Error(_) | Value::Unknown(_)) {
            return range_r;
        }

        let mut accu_value = self.eval_expr(&c.accu_init, frame).value;

        match &range_r.value {
            Value::List(items) => {
                for (idx, item) in items.iter().enumerate() {
                    if frame.tick_iteration() {
                        return Resolved::bare(Value::Error(Rc::new(EvalError::iteration_budget_exceeded().at(expr.id))));
                    }
                    let iter_attr = range_r.attribute.as_ref().map(|a| a.qualify(Qualifier::Int(idx as i64)));
                    let mut bindings = HashMap::new();
                    bindings.insert(c.iter_var.clone(), Resolved::new(iter_attr, item.clone()));
                    bindings.insert(c.accu_var.clone(), Resolved::bare(accu_value.clone()));
                    frame.push_scope(bindings);
                    let cond_r = self.eval_expr(&c.loop_condition, frame);
                    if matches!(cond_r.value, Value::Bool(false)) {
                        frame.pop_scope();
                        break;
                    }
                    if matches!(cond_r.value, Value::Unknown(_)) {
                        frame.pop_scope();
                        continue;
                    }
                    accu_value = self.eval_expr(&c.loop_step, frame).value;
                    frame.pop_scope();
                }
            }
            Value::Map(map) => {
                for key in map.keys() {
                    if frame.tick_iteration() {
                        return Resolved::bare(Value::Error(Rc::new(EvalError::iteration_budget_exceeded().at(expr.id))));
                    }
                    let mut bindings = HashMap::new();
                    bindings.insert(c.iter_var.clone(), Resolved::bare(map_key_to_value(key)));
                    bindings.insert(c.accu_var.clone(), Resolved::bare(accu_value.clone()));
                    frame.push_scope(bindings);
                    let cond_r = self.eval_expr(&c.loop_condition, frame);
                    if matches!(cond_r.value, Value::Bool(false)) {
                        frame.pop_scope();
                        break;
                    }
                    if matches!(cond_r.value, Value::Unknown(_)) {
                        frame.pop_scope();
                        continue;
                    }
                    accu_value = self.eval_expr(&c.loop_step, frame).value;
                    frame.pop_scope();
                }
            }
            _ => {
                return Resolved::bare(Value::Error(Rc::new(
                    EvalError::invalid_argument("comprehension range must be a list or map").at(expr.id),
                )));
            }
        }

        let mut bindings = HashMap::new();
        bindings.insert(c.accu_var.clone(), Resolved::bare(accu_value));
        frame.push_scope(bindings);
        let result = self.eval_expr(&c.result, frame);
        frame.pop_scope();
        result
    }

    fn eval_lazy_bind(&self, c: &Comprehension, frame: &mut Frame) -> Resolved {
        frame.push_scope(HashMap::new());
        frame.declare_lazy_thunk(c.accu_var.clone(), Rc::new((*c.accu_init).clone()));
        let result = self.eval_expr(&c.result, frame);
        frame.remove_lazy_thunk(&c.accu_var);
        frame.pop_scope();
        result
    }
}

fn not_strictly_false(v: &Value) -> bool {
    !matches!(v, Value::Bool(false))
}

/// Combines two already-evaluated logical operands once neither reached the
/// absorbing boolean on its own (spec §4.G "Short-circuit semantics" and
/// §4.F "Failure semantics"): a concrete boolean on either side wins over
/// the other side's error or unknown; between an error and an unknown,
/// error dominates; between two errors, the left one wins.
fn combine_logical(absorbing: bool, a: Value, b: Value) -> Resolved {
    if let Value::Bool(x) = b {
        if x == absorbing {
            return Resolved::bare(Value::Bool(absorbing));
        }
    }
    if let Value::Error(e) = a {
        return Resolved::bare(Value::Error(e));
    }
    if let Value::Error(e) = b {
        return Resolved::bare(Value::Error(e));
    }
    if let Value::Unknown(u) = a {
        if let Value::Unknown(u2) = b {
            return Resolved::bare(Value::Unknown(u.merge(u2)));
        }
        return Resolved::bare(Value::Unknown(u));
    }
    if let Value::Unknown(u) = b {
        return Resolved::bare(Value::Unknown(u));
    }
    Resolved::bare(Value::Bool(!absorbing))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ast::{Constant, ExprId},
        dispatcher::Dispatcher,
        frame::{Frame, NoopListener},
        options::EvalOptions,
        resolver::{EmptyVariableResolver, ResolverStack},
        type_provider::EmptyTypeProvider,
    };

    fn const_expr(id: u64, c: Constant) -> Expr {
        Expr::new(ExprId::new(id), ExprKind::Const(c))
    }

    fn eval_bare(expr: &Expr) -> Value {
        let dispatcher = Dispatcher::new();
        let provider = EmptyTypeProvider;
        let interp = Interpreter::new(&dispatcher, &provider);
        let base = EmptyVariableResolver;
        let patterns = [];
        let resolver = ResolverStack::new(&base, &patterns, true);
        let listener = NoopListener;
        let mut frame = Frame::new(resolver, EvalOptions::default(), &listener, None);
        interp.eval_expr(expr, &mut frame).value
    }

    #[test]
    fn logical_or_short_circuits_on_true() {
        let a = const_expr(1, Constant::Bool(true));
        let b = Expr::new(
            ExprId::new(2),
            ExprKind::Call(Call {
                function: Rc::from("oops"),
                overload_ids: vec![],
                args: vec![],
                is_index: false,
            }),
        );
        let expr = Expr::new(ExprId::new(3), ExprKind::Special(SpecialCall::LogicalOr(Box::new(a), Box::new(b))));
        assert!(matches!(eval_bare(&expr), Value::Bool(true)));
    }

    #[test]
    fn logical_and_propagates_error_when_other_side_is_non_absorbing() {
        let a = const_expr(1, Constant::Bool(true));
        let b = Expr::new(
            ExprId::new(2),
            ExprKind::Call(Call { function: Rc::from("missing"), overload_ids: vec![], args: vec![], is_index: false }),
        );
        let expr = Expr::new(ExprId::new(3), ExprKind::Special(SpecialCall::LogicalAnd(Box::new(a), Box::new(b))));
        assert!(matches!(eval_bare(&expr), Value::Error(_)));
    }

    #[test]
    fn not_strictly_false_treats_error_as_continue() {
        assert!(not_strictly_false(&Value::Error(Rc::new(EvalError::divide_by_zero()))));
        assert!(!not_strictly_false(&Value::Bool(false)));
        assert!(not_strictly_false(&Value::Bool(true)));
    }

    #[test]
    fn list_literal_propagates_first_error() {
        let good = const_expr(1, Constant::Int(1));
        let bad = Expr::new(
            ExprId::new(2),
            ExprKind::Call(Call { function: Rc::from("nope"), overload_ids: vec![], args: vec![], is_index: false }),
        );
        let expr = Expr::new(ExprId::new(3), ExprKind::List(vec![good, bad]));
        assert!(matches!(eval_bare(&expr), Value::Error(_)));
    }
}

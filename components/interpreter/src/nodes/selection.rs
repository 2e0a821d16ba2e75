//! Collection selection (`?[..]`, `^[..]`, `$[..]`) and projection (`![..]`)
//!
//! The inner expression is evaluated once per element with the element as
//! the active context object and bound to `#this` in a fresh scope. Map
//! entries are presented as maps with `key` and `value` entries.

use crate::node::{Node, NodeBase};
use crate::state::ExpressionState;
use core_types::{EvalResult, MessageCode, SourceSpan, TypedValue, Value};
use std::collections::HashMap;

fn entry_value(key: &str, value: &Value) -> Value {
    Value::map([("key", Value::from(key)), ("value", value.clone())])
}

fn evaluate_for(
    node: &dyn Node,
    state: &mut ExpressionState<'_>,
    element: &Value,
) -> EvalResult<Value> {
    let element = TypedValue::new(element.clone());
    let mut active = state.scoped_active_context_object(element.clone());
    let mut scope = active.scoped(HashMap::from([("this".to_string(), element)]));
    node.get_value(&mut scope)
}

/// Which elements a selection keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionKind {
    /// `?[..]`: every match
    All,
    /// `^[..]`: the first match
    First,
    /// `$[..]`: the last match
    Last,
}

/// Filters the active collection by a boolean criterion
#[derive(Debug)]
pub struct Selection {
    base: NodeBase,
    kind: SelectionKind,
    null_safe: bool,
}

impl Selection {
    /// Selection with its criterion
    pub fn new(kind: SelectionKind, null_safe: bool, criterion: Box<dyn Node>, span: SourceSpan) -> Self {
        Self {
            base: NodeBase::new(span, vec![criterion]),
            kind,
            null_safe,
        }
    }

    fn selects(&self, state: &mut ExpressionState<'_>, element: &Value) -> EvalResult<bool> {
        match evaluate_for(self.children()[0].as_ref(), state, element)? {
            Value::Boolean(b) => Ok(b),
            _ => Err(self.base.error(
                MessageCode::ResultOfSelectionCriteriaIsNotBoolean,
                Vec::<String>::new(),
            )),
        }
    }

    fn pick<T>(&self, mut matches: Vec<T>) -> Vec<T> {
        match self.kind {
            SelectionKind::All => matches,
            SelectionKind::First => {
                matches.truncate(1);
                matches
            }
            SelectionKind::Last => matches.pop().into_iter().collect(),
        }
    }
}

impl Node for Selection {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn get_value_internal(&self, state: &mut ExpressionState<'_>) -> EvalResult<TypedValue> {
        let target = state.active_context_object();
        let result = match target.value() {
            Value::List(list) => {
                let items = list.read().clone();
                let mut matches = Vec::new();
                for item in items {
                    if self.selects(state, &item)? {
                        matches.push(item);
                    }
                }
                let matches = self.pick(matches);
                match self.kind {
                    SelectionKind::All => Value::list(matches),
                    _ => matches.into_iter().next().unwrap_or(Value::Null),
                }
            }
            Value::Map(map) => {
                let entries = map.read().clone();
                let mut matches = Vec::new();
                for (key, value) in entries {
                    if self.selects(state, &entry_value(&key, &value))? {
                        matches.push((key, value));
                    }
                }
                let matches = self.pick(matches);
                if matches.is_empty() && self.kind != SelectionKind::All {
                    Value::Null
                } else {
                    Value::map(matches)
                }
            }
            Value::Null if self.null_safe => Value::Null,
            other => {
                return Err(self
                    .base
                    .error(MessageCode::InvalidTypeForSelection, [other.type_name()]))
            }
        };
        Ok(TypedValue::new(result))
    }

    fn to_expression_string(&self) -> String {
        let open = match self.kind {
            SelectionKind::All => "?[",
            SelectionKind::First => "^[",
            SelectionKind::Last => "$[",
        };
        let prefix = if self.null_safe { "?." } else { "" };
        format!("{}{}{}]", prefix, open, self.children()[0].to_expression_string())
    }
}

/// Maps each element of the active collection through an expression
#[derive(Debug)]
pub struct Projection {
    base: NodeBase,
    null_safe: bool,
}

impl Projection {
    /// Projection with its expression
    pub fn new(null_safe: bool, expression: Box<dyn Node>, span: SourceSpan) -> Self {
        Self {
            base: NodeBase::new(span, vec![expression]),
            null_safe,
        }
    }
}

impl Node for Projection {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn get_value_internal(&self, state: &mut ExpressionState<'_>) -> EvalResult<TypedValue> {
        let target = state.active_context_object();
        let elements: Vec<Value> = match target.value() {
            Value::List(list) => list.read().clone(),
            Value::Map(map) => map
                .read()
                .iter()
                .map(|(key, value)| entry_value(key, value))
                .collect(),
            Value::Null if self.null_safe => return Ok(TypedValue::null()),
            other => {
                return Err(self
                    .base
                    .error(MessageCode::ProjectionNotSupportedOnType, [other.type_name()]))
            }
        };
        let expression = self.children()[0].as_ref();
        let projected = elements
            .iter()
            .map(|element| evaluate_for(expression, state, element))
            .collect::<EvalResult<Vec<_>>>()?;
        Ok(TypedValue::new(Value::list(projected)))
    }

    fn to_expression_string(&self) -> String {
        let prefix = if self.null_safe { "?." } else { "" };
        format!("{}![{}]", prefix, self.children()[0].to_expression_string())
    }
}

//! Indexing: `list[0]`, `map['key']`, `text[2]`, `object['property']`

use crate::node::{generate_operand, load_receiver, ExitDescriptor, Node, NodeBase};
use crate::state::ExpressionState;
use bytecode_system::{CodeFlow, CompileError, Descriptor, Opcode, PrimitiveKind};
use core_types::{
    EvalResult, EvaluationError, ListRef, MapRef, MessageCode, SourceSpan, TypeDescriptor,
    TypedValue, Value,
};
use std::sync::atomic::{AtomicBool, Ordering};

/// Element of a list, or `CollectionIndexOutOfBounds`
pub fn index_list(list: &ListRef, index: i64) -> EvalResult<Value> {
    let items = list.read();
    usize::try_from(index)
        .ok()
        .and_then(|i| items.get(i).cloned())
        .ok_or_else(|| {
            EvaluationError::new(
                MessageCode::CollectionIndexOutOfBounds,
                [items.len().to_string(), index.to_string()],
            )
        })
}

/// Entry of a map keyed by the key's string form; null when absent
pub fn index_map(map: &MapRef, key: &Value) -> Value {
    if key.is_null() {
        return Value::Null;
    }
    map.read().get(&key.to_string()).cloned().unwrap_or(Value::Null)
}

/// One-character string at a character index, or `StringIndexOutOfBounds`
pub fn index_string(text: &str, index: i64) -> EvalResult<Value> {
    usize::try_from(index)
        .ok()
        .and_then(|i| text.chars().nth(i))
        .map(|c| Value::from(c.to_string()))
        .ok_or_else(|| {
            EvaluationError::new(
                MessageCode::StringIndexOutOfBounds,
                [text.chars().count().to_string(), index.to_string()],
            )
        })
}

/// `[index]` applied to the active context object
#[derive(Debug)]
pub struct Indexer {
    base: NodeBase,
    target_exit: ExitDescriptor,
    uncompilable: AtomicBool,
}

impl Indexer {
    /// Indexer with its index expression
    pub fn new(index: Box<dyn Node>, span: SourceSpan) -> Self {
        Self {
            base: NodeBase::new(span, vec![index]),
            target_exit: ExitDescriptor::new(),
            uncompilable: AtomicBool::new(false),
        }
    }

    fn index_node(&self) -> &dyn Node {
        self.children()[0].as_ref()
    }

    fn evaluate_index(&self, state: &mut ExpressionState<'_>) -> EvalResult<TypedValue> {
        let root = state.scope_root_context_object();
        let mut guard = state.scoped_active_context_object(root);
        self.index_node().get_value_internal(&mut guard)
    }

    fn int_index(&self, state: &ExpressionState<'_>, index: &TypedValue) -> EvalResult<i64> {
        let converted = state.convert_value(index, &TypeDescriptor::Int)?;
        converted.as_i64().ok_or_else(|| {
            self.base.error(
                MessageCode::TypeConversionError,
                [index.value().type_name().as_str(), "Int"],
            )
        })
    }

    fn string_key(&self, state: &ExpressionState<'_>, index: &TypedValue) -> EvalResult<Value> {
        state.convert_value(index, &TypeDescriptor::String)
    }

    /// Pad a list with nulls so `index` is valid, within the configured limit
    fn grow_list(
        &self,
        state: &ExpressionState<'_>,
        list: &ListRef,
        index: i64,
    ) -> EvalResult<bool> {
        let config = state.configuration();
        if !config.auto_grow_collections {
            return Ok(false);
        }
        self.uncompilable.store(true, Ordering::Relaxed);
        let Ok(wanted) = usize::try_from(index) else {
            return Ok(false);
        };
        if wanted >= config.maximum_auto_grow_size {
            return Err(self.base.error(
                MessageCode::UnableToGrowCollection,
                [format!(
                    "index {} exceeds the maximum size of {}",
                    wanted, config.maximum_auto_grow_size
                )],
            ));
        }
        let mut items = list.write();
        if items.len() <= wanted {
            items.resize(wanted + 1, Value::Null);
        }
        Ok(true)
    }

    fn unsupported(&self, target: &Value) -> EvaluationError {
        if target.is_null() {
            self.base.error(MessageCode::CannotIndexIntoNullValue, Vec::<String>::new())
        } else {
            self.base
                .error(MessageCode::IndexingNotSupportedForType, [target.type_name()])
        }
    }
}

impl Node for Indexer {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn get_value_internal(&self, state: &mut ExpressionState<'_>) -> EvalResult<TypedValue> {
        let target = state.active_context_object();
        let index = self.evaluate_index(state)?;
        let result = match target.value() {
            Value::List(list) => {
                if state.configuration().auto_grow_collections {
                    self.uncompilable.store(true, Ordering::Relaxed);
                }
                let i = self.int_index(state, &index)?;
                match index_list(list, i) {
                    Ok(value) => value,
                    Err(_) if self.grow_list(state, list, i)? => Value::Null,
                    Err(e) => return Err(e.at(self.span())),
                }
            }
            Value::Map(map) => index_map(map, &self.string_key(state, &index)?),
            Value::String(text) => {
                let i = self.int_index(state, &index)?;
                self.base.locate(index_string(text, i))?
            }
            Value::Object(object) => {
                self.uncompilable.store(true, Ordering::Relaxed);
                let name = self.string_key(state, &index)?.to_string();
                object.read_property(&name).ok_or_else(|| {
                    self.base.error(
                        MessageCode::PropertyOrFieldNotReadable,
                        [name.clone(), object.type_name().to_string()],
                    )
                })?
            }
            other => return Err(self.unsupported(other)),
        };
        self.target_exit.observe_value(target.value());
        self.base.exit.observe_value(&result);
        Ok(TypedValue::new(result))
    }

    fn to_expression_string(&self) -> String {
        format!("[{}]", self.index_node().to_expression_string())
    }

    fn is_writable(&self, state: &mut ExpressionState<'_>) -> EvalResult<bool> {
        Ok(matches!(
            state.active_context_object().value(),
            Value::List(_) | Value::Map(_) | Value::Object(_)
        ))
    }

    fn set_value(&self, state: &mut ExpressionState<'_>, value: TypedValue) -> EvalResult<()> {
        let target = state.active_context_object();
        let index = self.evaluate_index(state)?;
        match target.value() {
            Value::List(list) => {
                let i = self.int_index(state, &index)?;
                let len = list.read().len();
                let in_range = usize::try_from(i).is_ok_and(|slot| slot < len);
                if !in_range && !self.grow_list(state, list, i)? {
                    return Err(self.base.error(
                        MessageCode::CollectionIndexOutOfBounds,
                        [len.to_string(), i.to_string()],
                    ));
                }
                if let Ok(slot) = usize::try_from(i) {
                    if let Some(item) = list.write().get_mut(slot) {
                        *item = value.into_value();
                    }
                }
                Ok(())
            }
            Value::Map(map) => {
                let key = self.string_key(state, &index)?.to_string();
                map.write().insert(key, value.into_value());
                Ok(())
            }
            Value::Object(object) => {
                let name = self.string_key(state, &index)?.to_string();
                if object.write_property(&name, value.into_value()) {
                    Ok(())
                } else {
                    Err(self.base.error(
                        MessageCode::PropertyOrFieldNotWritable,
                        [name, object.type_name().to_string()],
                    ))
                }
            }
            other => Err(self.unsupported(other)),
        }
    }

    fn is_compilable(&self) -> bool {
        if self.uncompilable.load(Ordering::Relaxed) || self.exit_descriptor().is_none() {
            return false;
        }
        matches!(
            self.target_exit.get(),
            Some(Descriptor::List | Descriptor::Map | Descriptor::String)
        ) && self.children_compilable()
    }

    fn generate_code(&self, cf: &mut CodeFlow) -> Result<(), CompileError> {
        let not_compilable = || CompileError::NotCompilable(self.to_expression_string());
        let target = self.target_exit.get().ok_or_else(not_compilable)?;
        let exit = self.exit_descriptor().ok_or_else(not_compilable)?;
        load_receiver(cf, &target)?;
        let index = generate_operand(self.index_node(), cf)?;
        let access = match target {
            Descriptor::List => {
                cf.insert_numeric_unboxing_or_primitive_type_coercion(&index, PrimitiveKind::Int)?;
                Opcode::IndexList
            }
            Descriptor::String => {
                cf.insert_numeric_unboxing_or_primitive_type_coercion(&index, PrimitiveKind::Int)?;
                Opcode::IndexString
            }
            Descriptor::Map => {
                cf.insert_boxing_if_necessary(&index);
                Opcode::IndexMap
            }
            _ => return Err(not_compilable()),
        };
        cf.emit_at(access, self.span());
        cf.insert_check_cast(&exit, Some(&Descriptor::Object))?;
        cf.push_descriptor(exit);
        Ok(())
    }
}

//! Method resolution and invocation
//!
//! Method references resolve an executor through the context's resolvers and
//! cache it per receiver type. The reflective resolver covers host objects
//! and a fixed set of string, list and map methods.

use crate::context::EvaluationContext;
use bytecode_system::{CodeFlow, CompileError, Opcode};
use core_types::{
    EvalResult, EvaluationError, MessageCode, SourceSpan, TypeDescriptor, TypedValue, Value,
};
use std::fmt;
use std::sync::Arc;

/// Finds an executor for a method call
pub trait MethodResolver: Send + Sync + fmt::Debug {
    /// Resolve `name` on `target` for the given argument types (`None` = null)
    fn resolve(
        &self,
        context: &dyn EvaluationContext,
        target: &Value,
        name: &str,
        arg_types: &[Option<TypeDescriptor>],
    ) -> EvalResult<Option<Arc<dyn MethodExecutor>>>;
}

/// Invokes a resolved method
pub trait MethodExecutor: Send + Sync + fmt::Debug {
    /// Invoke on `target`
    fn execute(
        &self,
        context: &dyn EvaluationContext,
        target: &Value,
        args: &[Value],
    ) -> EvalResult<TypedValue>;

    /// Whether calls through this executor can be compiled
    fn is_compilable(&self) -> bool {
        false
    }

    /// Emit the call; receiver and boxed arguments are on the stack
    fn generate_code(
        &self,
        _argc: usize,
        _span: SourceSpan,
        _cf: &mut CodeFlow,
    ) -> Result<(), CompileError> {
        Err(CompileError::NotCompilable(format!("{:?}", self)))
    }
}

/// Render `name(T1, T2)` for diagnostics
pub fn format_signature(name: &str, arg_types: &[Option<TypeDescriptor>]) -> String {
    let params: Vec<&str> = arg_types
        .iter()
        .map(|t| t.as_ref().map_or("null", TypeDescriptor::name))
        .collect();
    format!("{}({})", name, params.join(", "))
}

#[derive(Debug, Clone, Copy)]
enum Param {
    Int,
    Text,
    Any,
}

const STRING_METHODS: &[(&str, &[Param])] = &[
    ("length", &[]),
    ("toUpperCase", &[]),
    ("toLowerCase", &[]),
    ("trim", &[]),
    ("isEmpty", &[]),
    ("charAt", &[Param::Int]),
    ("substring", &[Param::Int]),
    ("substring", &[Param::Int, Param::Int]),
    ("indexOf", &[Param::Text]),
    ("contains", &[Param::Text]),
    ("startsWith", &[Param::Text]),
    ("endsWith", &[Param::Text]),
    ("concat", &[Param::Text]),
    ("replace", &[Param::Text, Param::Text]),
    ("split", &[Param::Text]),
    ("equals", &[Param::Any]),
];

const LIST_METHODS: &[(&str, &[Param])] = &[
    ("size", &[]),
    ("isEmpty", &[]),
    ("get", &[Param::Int]),
    ("contains", &[Param::Any]),
    ("indexOf", &[Param::Any]),
];

const MAP_METHODS: &[(&str, &[Param])] = &[
    ("size", &[]),
    ("isEmpty", &[]),
    ("get", &[Param::Any]),
    ("containsKey", &[Param::Any]),
    ("keySet", &[]),
];

fn param_accepts(param: Param, arg: &Option<TypeDescriptor>) -> bool {
    match param {
        Param::Any => true,
        Param::Int => matches!(
            arg,
            Some(TypeDescriptor::Byte | TypeDescriptor::Short | TypeDescriptor::Int)
        ),
        Param::Text => matches!(arg, Some(TypeDescriptor::String)),
    }
}

fn builtin_table(target: &Value) -> Option<&'static [(&'static str, &'static [Param])]> {
    match target {
        Value::String(_) => Some(STRING_METHODS),
        Value::List(_) => Some(LIST_METHODS),
        Value::Map(_) => Some(MAP_METHODS),
        _ => None,
    }
}

/// Whether a built-in method matches the call shape
pub fn has_builtin(target: &Value, name: &str, arg_types: &[Option<TypeDescriptor>]) -> bool {
    builtin_table(target).is_some_and(|table| {
        table.iter().any(|(n, params)| {
            *n == name
                && params.len() == arg_types.len()
                && params.iter().zip(arg_types).all(|(p, a)| param_accepts(*p, a))
        })
    })
}

/// Invoke a method the way compiled code does.
///
/// Host objects are invoked directly; other receivers go through the
/// built-in method table.
pub fn invoke_method(target: &Value, name: &str, args: &[Value]) -> EvalResult<Value> {
    let arg_types: Vec<Option<TypeDescriptor>> = args.iter().map(TypeDescriptor::of).collect();
    match target {
        Value::Null => Err(EvaluationError::new(
            MessageCode::MethodCallOnNullObjectNotAllowed,
            [format_signature(name, &arg_types)],
        )),
        Value::Object(object) => object.invoke(name, args).map_err(|reason| {
            EvaluationError::new(
                MessageCode::ExceptionDuringMethodInvocation,
                [name.to_string(), object.type_name().to_string(), reason],
            )
        }),
        _ if has_builtin(target, name, &arg_types) => invoke_builtin(target, name, args),
        _ => Err(EvaluationError::new(
            MessageCode::MethodNotFound,
            [format_signature(name, &arg_types), target.type_name()],
        )),
    }
}

fn invocation_failure(target: &Value, name: &str, reason: impl Into<String>) -> EvaluationError {
    EvaluationError::new(
        MessageCode::ExceptionDuringMethodInvocation,
        [name.to_string(), target.type_name(), reason.into()],
    )
}

fn int_arg(args: &[Value], i: usize) -> i64 {
    args.get(i).and_then(Value::as_i64).unwrap_or_default()
}

fn text_arg(args: &[Value], i: usize) -> &str {
    args.get(i).and_then(Value::as_str).unwrap_or_default()
}

fn char_index(len: usize, index: i64) -> Option<usize> {
    usize::try_from(index).ok().filter(|i| *i <= len)
}

fn invoke_builtin(target: &Value, name: &str, args: &[Value]) -> EvalResult<Value> {
    match target {
        Value::String(s) => invoke_string(target, s, name, args),
        Value::List(list) => {
            let items = list.read();
            Ok(match name {
                "size" => Value::Int(items.len() as i32),
                "isEmpty" => Value::Boolean(items.is_empty()),
                "get" => {
                    let index = int_arg(args, 0);
                    usize::try_from(index)
                        .ok()
                        .and_then(|i| items.get(i).cloned())
                        .ok_or_else(|| {
                            invocation_failure(
                                target,
                                name,
                                format!("index {} out of bounds for length {}", index, items.len()),
                            )
                        })?
                }
                "contains" => Value::Boolean(args.first().is_some_and(|a| items.contains(a))),
                "indexOf" => Value::Int(
                    args.first()
                        .and_then(|a| items.iter().position(|v| v == a))
                        .map_or(-1, |i| i as i32),
                ),
                _ => return Err(invocation_failure(target, name, "unsupported")),
            })
        }
        Value::Map(map) => {
            let entries = map.read();
            let key = args.first().map(Value::to_string).unwrap_or_default();
            Ok(match name {
                "size" => Value::Int(entries.len() as i32),
                "isEmpty" => Value::Boolean(entries.is_empty()),
                "get" => entries.get(&key).cloned().unwrap_or(Value::Null),
                "containsKey" => Value::Boolean(entries.contains_key(&key)),
                "keySet" => Value::list(entries.keys().map(|k| Value::from(k.as_str())).collect()),
                _ => return Err(invocation_failure(target, name, "unsupported")),
            })
        }
        _ => Err(invocation_failure(target, name, "unsupported")),
    }
}

fn invoke_string(target: &Value, s: &str, name: &str, args: &[Value]) -> EvalResult<Value> {
    let chars: Vec<char> = s.chars().collect();
    let out_of_range = |index: i64| {
        invocation_failure(
            target,
            name,
            format!("index {} out of bounds for length {}", index, chars.len()),
        )
    };
    Ok(match name {
        "length" => Value::Int(chars.len() as i32),
        "toUpperCase" => Value::from(s.to_uppercase()),
        "toLowerCase" => Value::from(s.to_lowercase()),
        "trim" => Value::from(s.trim()),
        "isEmpty" => Value::Boolean(s.is_empty()),
        "charAt" => {
            let index = int_arg(args, 0);
            usize::try_from(index)
                .ok()
                .and_then(|i| chars.get(i).copied())
                .map(Value::Char)
                .ok_or_else(|| out_of_range(index))?
        }
        "substring" => {
            let begin = int_arg(args, 0);
            let end = if args.len() > 1 {
                int_arg(args, 1)
            } else {
                chars.len() as i64
            };
            let b = char_index(chars.len(), begin).ok_or_else(|| out_of_range(begin))?;
            let e = char_index(chars.len(), end)
                .filter(|e| *e >= b)
                .ok_or_else(|| out_of_range(end))?;
            Value::from(chars[b..e].iter().collect::<String>())
        }
        "indexOf" => Value::Int(
            s.find(text_arg(args, 0))
                .map_or(-1, |byte| s[..byte].chars().count() as i32),
        ),
        "contains" => Value::Boolean(s.contains(text_arg(args, 0))),
        "startsWith" => Value::Boolean(s.starts_with(text_arg(args, 0))),
        "endsWith" => Value::Boolean(s.ends_with(text_arg(args, 0))),
        "concat" => Value::from(format!("{}{}", s, text_arg(args, 0))),
        "replace" => Value::from(s.replace(text_arg(args, 0), text_arg(args, 1))),
        "split" => Value::list(
            s.split(text_arg(args, 0))
                .map(Value::from)
                .collect::<Vec<_>>(),
        ),
        "equals" => Value::Boolean(args.first() == Some(target)),
        _ => return Err(invocation_failure(target, name, "unsupported")),
    })
}

/// Executor dispatching through [`invoke_method`]
#[derive(Debug, Clone)]
pub struct ReflectiveMethodExecutor {
    name: String,
}

impl ReflectiveMethodExecutor {
    /// Executor for the named method
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl MethodExecutor for ReflectiveMethodExecutor {
    fn execute(
        &self,
        _context: &dyn EvaluationContext,
        target: &Value,
        args: &[Value],
    ) -> EvalResult<TypedValue> {
        invoke_method(target, &self.name, args).map(TypedValue::new)
    }

    fn is_compilable(&self) -> bool {
        true
    }

    fn generate_code(
        &self,
        argc: usize,
        span: SourceSpan,
        cf: &mut CodeFlow,
    ) -> Result<(), CompileError> {
        cf.emit_at(
            Opcode::InvokeMethod {
                name: self.name.clone(),
                argc,
            },
            span,
        );
        Ok(())
    }
}

/// Resolver for host object methods and built-in methods
#[derive(Debug, Clone, Copy, Default)]
pub struct ReflectiveMethodResolver;

impl MethodResolver for ReflectiveMethodResolver {
    fn resolve(
        &self,
        _context: &dyn EvaluationContext,
        target: &Value,
        name: &str,
        arg_types: &[Option<TypeDescriptor>],
    ) -> EvalResult<Option<Arc<dyn MethodExecutor>>> {
        let found = match target {
            Value::Object(object) => object.responds_to(name, arg_types.len()),
            _ => has_builtin(target, name, arg_types),
        };
        Ok(found.then(|| Arc::new(ReflectiveMethodExecutor::new(name)) as Arc<dyn MethodExecutor>))
    }
}

//! Type, constructor and bean references: `T(Name)`, `new Name(..)`, `@name`

use crate::method::format_signature;
use crate::node::{Node, NodeBase};
use crate::state::ExpressionState;
use core_types::{EvalResult, MessageCode, SourceSpan, TypedValue, Value};

/// `T(Name)`, resolved through the context's type locator
#[derive(Debug)]
pub struct TypeReference {
    base: NodeBase,
    type_name: String,
}

impl TypeReference {
    /// Reference to a type by name
    pub fn new(type_name: impl Into<String>, span: SourceSpan) -> Self {
        Self {
            base: NodeBase::new(span, Vec::new()),
            type_name: type_name.into(),
        }
    }
}

impl Node for TypeReference {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn get_value_internal(&self, state: &mut ExpressionState<'_>) -> EvalResult<TypedValue> {
        let locator = state.evaluation_context().type_locator();
        let td = self.base.locate(locator.find_type(&self.type_name))?;
        Ok(TypedValue::new(Value::Type(td)))
    }

    fn to_expression_string(&self) -> String {
        format!("T({})", self.type_name)
    }
}

/// `new Name(args)`, resolved through the context's constructor resolvers
#[derive(Debug)]
pub struct ConstructorReference {
    base: NodeBase,
    type_name: String,
}

impl ConstructorReference {
    /// Constructor call with argument expressions
    pub fn new(type_name: impl Into<String>, arguments: Vec<Box<dyn Node>>, span: SourceSpan) -> Self {
        Self {
            base: NodeBase::new(span, arguments),
            type_name: type_name.into(),
        }
    }
}

impl Node for ConstructorReference {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn get_value_internal(&self, state: &mut ExpressionState<'_>) -> EvalResult<TypedValue> {
        let args = self
            .children()
            .iter()
            .map(|arg| arg.get_value(state))
            .collect::<EvalResult<Vec<_>>>()?;
        let arg_types: Vec<_> = args.iter().map(Value::type_descriptor).collect();
        let context = state.evaluation_context();
        for resolver in context.constructor_resolvers() {
            if let Some(executor) = resolver.resolve(context, &self.type_name, &arg_types)? {
                return self.base.locate(executor.execute(context, &args));
            }
        }
        Err(self.base.error(
            MessageCode::ConstructorNotFound,
            [self.type_name.clone(), format_signature("", &arg_types)],
        ))
    }

    fn to_expression_string(&self) -> String {
        let args: Vec<String> = self
            .children()
            .iter()
            .map(|arg| arg.to_expression_string())
            .collect();
        format!("new {}({})", self.type_name, args.join(","))
    }
}

/// `@name`, resolved through the context's bean resolver
#[derive(Debug)]
pub struct BeanReference {
    base: NodeBase,
    name: String,
}

impl BeanReference {
    /// Reference to a named bean
    pub fn new(name: impl Into<String>, span: SourceSpan) -> Self {
        Self {
            base: NodeBase::new(span, Vec::new()),
            name: name.into(),
        }
    }
}

impl Node for BeanReference {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn get_value_internal(&self, state: &mut ExpressionState<'_>) -> EvalResult<TypedValue> {
        let context = state.evaluation_context();
        let resolver = context.bean_resolver().ok_or_else(|| {
            self.base
                .error(MessageCode::NoBeanResolverRegistered, [&self.name])
        })?;
        let bean = self.base.locate(resolver.resolve(context, &self.name))?;
        Ok(TypedValue::new(bean))
    }

    fn to_expression_string(&self) -> String {
        format!("@{}", self.name)
    }
}

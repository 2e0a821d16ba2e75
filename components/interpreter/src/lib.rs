//! Tree-walking evaluation of expressions
//!
//! This crate provides everything an expression tree needs to evaluate
//! itself against a host object graph:
//! - [`EvaluationContext`] and the capability contracts it aggregates
//!   (property accessors, method and constructor resolvers, conversion,
//!   comparison, operator overloading, beans and types)
//! - [`ExpressionState`], the per-call cursor with active-object and scope
//!   stacks
//! - The [`Node`] contract and the concrete node kinds in [`nodes`]
//! - [`CompilerConfiguration`], which also controls auto-growing
//!
//! Nodes record what they observe while being interpreted (resolved
//! strategies, exit descriptors) so that a compiler can later generate
//! equivalent code through [`bytecode_system::CodeFlow`].
//!
//! # Example
//!
//! ```
//! use bytecode_system::CompareOp;
//! use core_types::{Record, SourceSpan, Value};
//! use interpreter::nodes::{Literal, OpRelational, PropertyOrFieldReference};
//! use interpreter::{CompilerConfiguration, ExpressionState, Node, StandardEvaluationContext};
//!
//! let root = Record::new("Inventor").with("born", 1856).into_value();
//! let ctx = StandardEvaluationContext::with_root(root);
//! let config = CompilerConfiguration::default();
//! let span = SourceSpan::new(0, 11);
//!
//! let node = OpRelational::new(
//!     CompareOp::Lt,
//!     Box::new(PropertyOrFieldReference::new("born", false, span)),
//!     Box::new(Literal::int(1900, span)),
//!     span,
//! );
//! let mut state = ExpressionState::new(&ctx, &config);
//! assert_eq!(node.get_value(&mut state).unwrap(), Value::Boolean(true));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod accessor;
pub mod bean;
pub mod comparator;
pub mod config;
pub mod constructor;
pub mod context;
pub mod conversion;
pub mod inline_cache;
pub mod method;
pub mod node;
pub mod nodes;
pub mod operators;
pub mod overloader;
pub mod state;
pub mod type_locator;

// Re-export main types at crate root
pub use accessor::{read_property, MapAccessor, PropertyAccessor, ReflectivePropertyAccessor};
pub use bean::{BeanResolver, MapBeanResolver};
pub use comparator::{StandardTypeComparator, TypeComparator};
pub use config::{CompilerConfiguration, CompilerMode, ConfigError};
pub use constructor::{
    ConstructorExecutor, ConstructorResolver, FactoryExecutor, RegisteredConstructorResolver,
};
pub use context::{EvaluationContext, StandardEvaluationContext};
pub use conversion::{StandardTypeConverter, TypeConverter};
pub use inline_cache::{InlineCache, ReceiverKey};
pub use method::{
    invoke_method, MethodExecutor, MethodResolver, ReflectiveMethodExecutor,
    ReflectiveMethodResolver,
};
pub use node::{ExitDescriptor, ExitState, Node, NodeBase, NodeId};
pub use nodes::indexer::{index_list, index_map, index_string};
pub use nodes::matches::compile_pattern;
pub use overloader::{OperatorOverloader, Operation, StandardOperatorOverloader};
pub use state::{ContextObjectGuard, ExpressionState, ScopeGuard};
pub use type_locator::{StandardTypeLocator, TypeLocator};

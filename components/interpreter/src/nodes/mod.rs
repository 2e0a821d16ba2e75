//! Concrete AST node kinds

mod arithmetic;
mod assign;
mod compound;
pub mod indexer;
mod inline_list;
mod literal;
mod logical;
pub mod matches;
mod method;
mod property;
mod reference;
mod relational;
mod selection;
mod ternary;
mod variable;

pub use arithmetic::{ArithmeticKind, OpArithmetic};
pub use assign::Assign;
pub use compound::CompoundExpression;
pub use indexer::Indexer;
pub use inline_list::InlineList;
pub use literal::{CompositeString, Literal};
pub use logical::{LogicalKind, OpLogical, OpNot};
pub use matches::OpMatches;
pub use method::MethodReference;
pub use property::PropertyOrFieldReference;
pub use reference::{BeanReference, ConstructorReference, TypeReference};
pub use relational::OpRelational;
pub use selection::{Projection, Selection, SelectionKind};
pub use ternary::{Elvis, Ternary};
pub use variable::VariableReference;

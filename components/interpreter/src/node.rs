//! AST node contract
//!
//! Every node evaluates itself against an [`ExpressionState`] and may also
//! generate equivalent code through a [`CodeFlow`]. A tree is compilable
//! only if every node in it is.
//!
//! Nodes are immutable once built. What they learn while being interpreted
//! (resolved accessors, the type of value they produce) lives in node-owned
//! caches behind locks, so one tree can be evaluated from many threads.

use crate::state::ExpressionState;
use bytecode_system::{CodeFlow, CompileError, Descriptor, Opcode, PrimitiveKind};
use core_types::{EvalResult, EvaluationError, MessageCode, SourceSpan, TypedValue, Value};
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique node identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl NodeId {
    fn next() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node-{}", self.0)
    }
}

/// What a node has observed about the values it produces
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExitState {
    /// Not evaluated yet
    #[default]
    Unknown,
    /// Always produced values of this descriptor
    Known(Descriptor),
    /// Produced values of different descriptors
    Unstable,
}

/// Thread-safe cell holding a node's exit descriptor.
///
/// Observing two different non-null descriptors makes the cell permanently
/// unstable. A null observation ([`Descriptor::Object`]) never conflicts:
/// it only fills an unknown cell and is refined by the next typed value.
#[derive(Debug, Default)]
pub struct ExitDescriptor {
    state: RwLock<ExitState>,
}

impl ExitDescriptor {
    /// Empty cell
    pub fn new() -> Self {
        Self::default()
    }

    /// Cell fixed at construction
    pub fn fixed(descriptor: Descriptor) -> Self {
        Self {
            state: RwLock::new(ExitState::Known(descriptor)),
        }
    }

    /// Record the descriptor of a produced value
    pub fn observe(&self, descriptor: Descriptor) {
        {
            let state = self.state.read();
            match &*state {
                ExitState::Known(known) if *known == descriptor => return,
                ExitState::Known(_) if descriptor == Descriptor::Object => return,
                ExitState::Unstable => return,
                _ => {}
            }
        }
        let mut state = self.state.write();
        let next = match &*state {
            ExitState::Unknown => ExitState::Known(descriptor),
            ExitState::Known(Descriptor::Object) => ExitState::Known(descriptor),
            ExitState::Known(known) if *known == descriptor || descriptor == Descriptor::Object => {
                return
            }
            ExitState::Known(_) | ExitState::Unstable => ExitState::Unstable,
        };
        *state = next;
    }

    /// Record the reference descriptor of a produced value
    pub fn observe_value(&self, value: &Value) {
        self.observe(Descriptor::of_value(value));
    }

    /// Make the cell permanently unstable
    pub fn mark_unstable(&self) {
        *self.state.write() = ExitState::Unstable;
    }

    /// The known descriptor
    pub fn get(&self) -> Option<Descriptor> {
        match &*self.state.read() {
            ExitState::Known(d) => Some(d.clone()),
            _ => None,
        }
    }

    /// Snapshot of the cell
    pub fn state(&self) -> ExitState {
        self.state.read().clone()
    }
}

/// State shared by every node kind
#[derive(Debug)]
pub struct NodeBase {
    id: NodeId,
    span: SourceSpan,
    children: Vec<Box<dyn Node>>,
    /// Descriptor of the values this node produces
    pub exit: ExitDescriptor,
    navigation_step: AtomicBool,
}

impl NodeBase {
    /// Base with an unknown exit descriptor
    pub fn new(span: SourceSpan, children: Vec<Box<dyn Node>>) -> Self {
        Self::with_exit(span, children, ExitDescriptor::new())
    }

    /// Base with the given exit cell
    pub fn with_exit(span: SourceSpan, children: Vec<Box<dyn Node>>, exit: ExitDescriptor) -> Self {
        Self {
            id: NodeId::next(),
            span,
            children,
            exit,
            navigation_step: AtomicBool::new(false),
        }
    }

    /// Node identity
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Source range
    pub fn span(&self) -> SourceSpan {
        self.span
    }

    /// Child nodes
    pub fn children(&self) -> &[Box<dyn Node>] {
        &self.children
    }

    /// Mark this node as followed by further navigation in a compound
    pub fn mark_navigation_step(&self) {
        self.navigation_step.store(true, Ordering::Relaxed);
    }

    /// Whether further navigation follows this node
    pub fn is_navigation_step(&self) -> bool {
        self.navigation_step.load(Ordering::Relaxed)
    }

    /// Error located at this node
    pub fn error<I, S>(&self, code: MessageCode, inserts: I) -> EvaluationError
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        EvaluationError::new(code, inserts).at(self.span)
    }

    /// Locate an error raised below this node, unless already located
    pub fn locate<T>(&self, result: EvalResult<T>) -> EvalResult<T> {
        result.map_err(|e| e.at(self.span))
    }
}

/// An AST node
pub trait Node: Send + Sync + fmt::Debug {
    /// Shared node state
    fn base(&self) -> &NodeBase;

    /// Evaluate against the state
    fn get_value_internal(&self, state: &mut ExpressionState<'_>) -> EvalResult<TypedValue>;

    /// Source form of the subtree
    fn to_expression_string(&self) -> String;

    /// Whether [`Node::set_value`] would succeed in principle
    fn is_writable(&self, _state: &mut ExpressionState<'_>) -> EvalResult<bool> {
        Ok(false)
    }

    /// Assign through this node
    fn set_value(&self, _state: &mut ExpressionState<'_>, _value: TypedValue) -> EvalResult<()> {
        Err(self
            .base()
            .error(MessageCode::NotAssignable, [self.to_expression_string()]))
    }

    /// Whether this node and all its children can generate code
    fn is_compilable(&self) -> bool {
        false
    }

    /// Emit code leaving this node's value on the stack and push its
    /// descriptor
    fn generate_code(&self, _cf: &mut CodeFlow) -> Result<(), CompileError> {
        Err(CompileError::NotCompilable(self.to_expression_string()))
    }

    /// Constant value of a literal node
    fn literal_value(&self) -> Option<&Value> {
        None
    }

    /// Evaluate and drop the type tag
    fn get_value(&self, state: &mut ExpressionState<'_>) -> EvalResult<Value> {
        self.get_value_internal(state).map(TypedValue::into_value)
    }

    /// Node identity
    fn id(&self) -> NodeId {
        self.base().id()
    }

    /// Source range
    fn span(&self) -> SourceSpan {
        self.base().span()
    }

    /// Start offset in the source
    fn start_position(&self) -> usize {
        self.span().start
    }

    /// End offset in the source
    fn end_position(&self) -> usize {
        self.span().end
    }

    /// Child nodes
    fn children(&self) -> &[Box<dyn Node>] {
        self.base().children()
    }

    /// Known exit descriptor
    fn exit_descriptor(&self) -> Option<Descriptor> {
        self.base().exit.get()
    }

    /// Whether every child is compilable
    fn children_compilable(&self) -> bool {
        self.children().iter().all(|child| child.is_compilable())
    }
}

/// Descriptor of a value as generated code carries it.
///
/// Booleans, chars and the four arithmetic kinds produced by operators
/// travel as unboxed slots; everything else is a reference.
pub fn value_descriptor(value: &Value) -> Descriptor {
    match value {
        Value::Boolean(_) => Descriptor::Primitive(PrimitiveKind::Boolean),
        Value::Char(_) => Descriptor::Primitive(PrimitiveKind::Char),
        Value::Byte(_) => Descriptor::Primitive(PrimitiveKind::Byte),
        Value::Short(_) => Descriptor::Primitive(PrimitiveKind::Short),
        Value::Int(_) => Descriptor::Primitive(PrimitiveKind::Int),
        Value::Long(_) => Descriptor::Primitive(PrimitiveKind::Long),
        Value::Float(_) => Descriptor::Primitive(PrimitiveKind::Float),
        Value::Double(_) => Descriptor::Primitive(PrimitiveKind::Double),
        other => Descriptor::of_value(other),
    }
}

/// Generate a child in its own compilation scope.
///
/// Returns the descriptor the child left on the stack.
pub fn generate_operand(child: &dyn Node, cf: &mut CodeFlow) -> Result<Descriptor, CompileError> {
    cf.enter_compilation_scope();
    let result = child.generate_code(cf).and_then(|()| {
        cf.last_descriptor().cloned().ok_or_else(|| {
            CompileError::InvalidCode(format!(
                "'{}' left no value",
                child.to_expression_string()
            ))
        })
    });
    cf.exit_compilation_scope();
    result
}

/// Make a receiver available on the stack and check it against `expected`.
///
/// Uses the value the previous sibling left, or the target argument when
/// this is the first step of a navigation.
pub fn load_receiver(cf: &mut CodeFlow, expected: &Descriptor) -> Result<(), CompileError> {
    let known = match cf.last_descriptor().cloned() {
        Some(Descriptor::Primitive(kind)) => {
            cf.insert_boxing(kind);
            Descriptor::Boxed(kind)
        }
        Some(descriptor) => descriptor,
        None => {
            cf.emit(Opcode::LoadTarget);
            Descriptor::Object
        }
    };
    cf.insert_check_cast(expected, Some(&known))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_descriptor_stability() {
        let exit = ExitDescriptor::new();
        assert_eq!(exit.state(), ExitState::Unknown);
        exit.observe(Descriptor::Primitive(PrimitiveKind::Int));
        exit.observe(Descriptor::Primitive(PrimitiveKind::Int));
        assert_eq!(exit.get(), Some(Descriptor::Primitive(PrimitiveKind::Int)));
        exit.observe(Descriptor::Primitive(PrimitiveKind::Long));
        assert_eq!(exit.state(), ExitState::Unstable);
        exit.observe(Descriptor::Primitive(PrimitiveKind::Int));
        assert_eq!(exit.get(), None);
    }

    #[test]
    fn test_null_observation_does_not_conflict() {
        let exit = ExitDescriptor::new();
        exit.observe_value(&Value::Null);
        assert_eq!(exit.get(), Some(Descriptor::Object));
        exit.observe_value(&Value::from("a"));
        assert_eq!(exit.get(), Some(Descriptor::String));
        exit.observe_value(&Value::Null);
        assert_eq!(exit.get(), Some(Descriptor::String));
        exit.observe_value(&Value::Int(1));
        assert_eq!(exit.state(), ExitState::Unstable);
    }

    #[test]
    fn test_node_ids_are_unique() {
        let a = NodeBase::new(SourceSpan::new(0, 1), Vec::new());
        let b = NodeBase::new(SourceSpan::new(0, 1), Vec::new());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_load_receiver_uses_target_first() {
        let mut cf = CodeFlow::for_chunk("unit");
        load_receiver(&mut cf, &Descriptor::String).unwrap();
        let ops: Vec<_> = cf.finish(None).opcodes().cloned().collect();
        assert_eq!(ops, vec![Opcode::LoadTarget, Opcode::CheckCast(Descriptor::String)]);
    }
}

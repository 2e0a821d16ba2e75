//! Compile-time bookkeeping for expression code generation
//!
//! [`CodeFlow`] tracks, per compilation scope, the descriptors of the values
//! generated code has left on the operand stack. A node generating code for
//! `a + b` generates `a`, asks for the last descriptor, inserts the coercion
//! it needs, then does the same for `b`.
//!
//! Synthetic fields and their static initializers are registered while code
//! is generated and declared once, in registration order, by
//! [`CodeFlow::finish`].

use crate::chunk::{CodeChunk, FieldDecl, FieldInit};
use crate::descriptor::{Descriptor, PrimitiveKind};
use crate::emitter::{ChunkEmitter, CodeEmitter};
use crate::error::CompileError;
use crate::opcode::{FieldId, LocalSlot, Opcode};
use core_types::{SourceSpan, Value};
use std::collections::HashMap;

/// Compilation state for one expression tree
pub struct CodeFlow {
    emitter: Box<dyn CodeEmitter>,
    compilation_scopes: Vec<Vec<Descriptor>>,
    pending_fields: Vec<FieldDecl>,
    field_keys: HashMap<String, FieldId>,
    pending_clinits: Vec<(FieldId, FieldInit)>,
    next_field_id: u32,
    next_local: u16,
}

impl CodeFlow {
    /// Create a code flow driving the given emitter
    pub fn new(emitter: Box<dyn CodeEmitter>) -> Self {
        Self {
            emitter,
            compilation_scopes: vec![Vec::new()],
            pending_fields: Vec::new(),
            field_keys: HashMap::new(),
            pending_clinits: Vec::new(),
            next_field_id: 0,
            next_local: 0,
        }
    }

    /// Create a code flow producing a [`CodeChunk`]
    pub fn for_chunk(name: impl Into<String>) -> Self {
        Self::new(Box::new(ChunkEmitter::new(name)))
    }

    // ---------------------------------------------------------------------
    // Descriptor bookkeeping
    // ---------------------------------------------------------------------

    /// Record the descriptor of the value just left on the stack
    pub fn push_descriptor(&mut self, descriptor: Descriptor) {
        if let Some(scope) = self.compilation_scopes.last_mut() {
            scope.push(descriptor);
        }
    }

    /// Descriptor of the most recent value in the current scope
    pub fn last_descriptor(&self) -> Option<&Descriptor> {
        self.compilation_scopes.last().and_then(|scope| scope.last())
    }

    /// Start a nested scope, e.g. for method arguments
    pub fn enter_compilation_scope(&mut self) {
        self.compilation_scopes.push(Vec::new());
    }

    /// Leave the current scope
    pub fn exit_compilation_scope(&mut self) {
        if self.compilation_scopes.len() > 1 {
            self.compilation_scopes.pop();
        }
    }

    /// Number of open compilation scopes
    pub fn scope_depth(&self) -> usize {
        self.compilation_scopes.len()
    }

    /// Unbox a boxed boolean left by the last descriptor
    pub fn unbox_boolean_if_necessary(&mut self, descriptor: &Descriptor) {
        if *descriptor == Descriptor::Boxed(PrimitiveKind::Boolean) {
            self.emit(Opcode::Unbox(PrimitiveKind::Boolean));
        }
    }

    // ---------------------------------------------------------------------
    // Emission
    // ---------------------------------------------------------------------

    /// Emit an instruction
    pub fn emit(&mut self, opcode: Opcode) {
        self.emitter.emit(opcode, None);
    }

    /// Emit an instruction attributed to a node
    pub fn emit_at(&mut self, opcode: Opcode, span: SourceSpan) {
        self.emitter.emit(opcode, Some(span));
    }

    /// Intern a reference constant
    pub fn add_constant(&mut self, value: Value) -> usize {
        self.emitter.add_constant(value)
    }

    /// Index of the next instruction
    pub fn offset(&self) -> usize {
        self.emitter.offset()
    }

    /// Emit a jump whose target is patched later; returns its index
    pub fn emit_jump(&mut self, jump: Opcode) -> usize {
        let at = self.offset();
        self.emit(jump);
        at
    }

    /// Point a previously emitted jump at the next instruction
    pub fn patch_jump_here(&mut self, at: usize) -> Result<(), CompileError> {
        let target = self.offset();
        self.emitter.patch_jump(at, target)
    }

    // ---------------------------------------------------------------------
    // Synthetic fields and locals
    // ---------------------------------------------------------------------

    /// Allocate a fresh field id
    pub fn next_field_id(&mut self) -> FieldId {
        let id = FieldId(self.next_field_id);
        self.next_field_id += 1;
        id
    }

    /// Allocate a fresh scope-local slot
    pub fn next_free_local(&mut self) -> LocalSlot {
        let slot = LocalSlot(self.next_local);
        self.next_local += 1;
        slot
    }

    /// Register a field, once per key.
    ///
    /// Registering the same key again returns the existing field, so a node
    /// whose code is generated more than once still gets a single field.
    pub fn register_new_field(&mut self, key: &str, name: &str) -> FieldId {
        if let Some(id) = self.field_keys.get(key) {
            return *id;
        }
        let id = self.next_field_id();
        self.field_keys.insert(key.to_string(), id);
        self.pending_fields.push(FieldDecl {
            id,
            name: name.to_string(),
            init: None,
        });
        id
    }

    /// Register the static initializer of a field. The first one wins.
    pub fn register_new_clinit(&mut self, field: FieldId, init: FieldInit) {
        if self.pending_clinits.iter().any(|(id, _)| *id == field) {
            return;
        }
        self.pending_clinits.push((field, init));
    }

    /// Register a field together with its initializer
    pub fn register_static_field(&mut self, key: &str, name: &str, init: FieldInit) -> FieldId {
        let id = self.register_new_field(key, name);
        self.register_new_clinit(id, init);
        id
    }

    /// Declare all registered fields and take the generated code
    pub fn finish(mut self, result: Option<Descriptor>) -> CodeChunk {
        let mut clinits: HashMap<FieldId, FieldInit> = self.pending_clinits.drain(..).collect();
        for mut decl in std::mem::take(&mut self.pending_fields) {
            decl.init = clinits.remove(&decl.id);
            self.emitter.declare_field(decl);
        }
        self.emitter.finish(self.next_local, result)
    }

    // ---------------------------------------------------------------------
    // Coercions
    // ---------------------------------------------------------------------

    /// Box a primitive slot
    pub fn insert_boxing(&mut self, kind: PrimitiveKind) {
        self.emit(Opcode::Box(kind));
    }

    /// Unbox a reference of exactly this boxed kind
    pub fn insert_unboxing(&mut self, kind: PrimitiveKind) {
        self.emit(Opcode::Unbox(kind));
    }

    /// Box if the descriptor is primitive
    pub fn insert_boxing_if_necessary(&mut self, descriptor: &Descriptor) {
        if let Descriptor::Primitive(kind) = descriptor {
            self.insert_boxing(*kind);
        }
    }

    /// Unbox if the descriptor is a boxed primitive
    pub fn insert_unboxing_if_necessary(&mut self, descriptor: &Descriptor) {
        if let Descriptor::Boxed(kind) = descriptor {
            self.insert_unboxing(*kind);
        }
    }

    /// Convert between primitive slots.
    ///
    /// Widening and narrowing between int, long, float and double use a
    /// single conversion; byte, short and char targets narrow through int.
    pub fn insert_primitive_conversion(
        &mut self,
        from: PrimitiveKind,
        to: PrimitiveKind,
    ) -> Result<(), CompileError> {
        use PrimitiveKind::*;
        if from == to {
            return Ok(());
        }
        if from == Boolean || to == Boolean {
            return Err(invalid_conversion(
                &Descriptor::Primitive(from),
                &Descriptor::Primitive(to),
            ));
        }
        let to_int_family = |cf: &mut CodeFlow| match to {
            Byte => cf.emit(Opcode::I2B),
            Short => cf.emit(Opcode::I2S),
            Char => cf.emit(Opcode::I2C),
            _ => {}
        };
        match (from.stack_kind(), to.stack_kind()) {
            (Int, Int) => {
                // byte/short/char share the int slot; narrow only when needed
                if !widens_within_int(from, to) {
                    to_int_family(self);
                }
            }
            (Int, Long) => self.emit(Opcode::I2L),
            (Int, Float) => self.emit(Opcode::I2F),
            (Int, Double) => self.emit(Opcode::I2D),
            (Long, Int) => {
                self.emit(Opcode::L2I);
                to_int_family(self);
            }
            (Long, Float) => self.emit(Opcode::L2F),
            (Long, Double) => self.emit(Opcode::L2D),
            (Float, Int) => {
                self.emit(Opcode::F2I);
                to_int_family(self);
            }
            (Float, Long) => self.emit(Opcode::F2L),
            (Float, Double) => self.emit(Opcode::F2D),
            (Double, Int) => {
                self.emit(Opcode::D2I);
                to_int_family(self);
            }
            (Double, Long) => self.emit(Opcode::D2L),
            (Double, Float) => self.emit(Opcode::D2F),
            (a, b) => {
                return Err(invalid_conversion(
                    &Descriptor::Primitive(a),
                    &Descriptor::Primitive(b),
                ))
            }
        }
        Ok(())
    }

    /// Produce a primitive of `target` from whatever is on the stack.
    ///
    /// Primitive slots are converted, boxed primitives are unboxed and then
    /// converted, and references of unknown type go through the boxed-number
    /// path that narrows at runtime.
    pub fn insert_numeric_unboxing_or_primitive_type_coercion(
        &mut self,
        stack: &Descriptor,
        target: PrimitiveKind,
    ) -> Result<(), CompileError> {
        match stack {
            Descriptor::Primitive(kind) => self.insert_primitive_conversion(*kind, target),
            Descriptor::Boxed(kind) => {
                self.insert_unboxing(*kind);
                self.insert_primitive_conversion(*kind, target)
            }
            Descriptor::Object if target == PrimitiveKind::Boolean => {
                self.insert_unboxing(PrimitiveKind::Boolean);
                Ok(())
            }
            Descriptor::Object => {
                self.emit(Opcode::UnboxNumber(target));
                Ok(())
            }
            other => Err(invalid_conversion(other, &Descriptor::Primitive(target))),
        }
    }

    /// Make the stack value satisfy `target`
    pub fn insert_any_necessary_type_conversions(
        &mut self,
        target: &Descriptor,
        stack: &Descriptor,
    ) -> Result<(), CompileError> {
        match (target, stack) {
            (Descriptor::Primitive(kind), _) => {
                self.insert_numeric_unboxing_or_primitive_type_coercion(stack, *kind)
            }
            (Descriptor::Boxed(to), Descriptor::Primitive(from)) => {
                self.insert_primitive_conversion(*from, *to)?;
                self.insert_boxing(*to);
                Ok(())
            }
            (Descriptor::Boxed(to), Descriptor::Boxed(from)) if to != from => {
                self.insert_unboxing(*from);
                self.insert_primitive_conversion(*from, *to)?;
                self.insert_boxing(*to);
                Ok(())
            }
            (_, Descriptor::Primitive(from)) => {
                self.insert_boxing(*from);
                self.insert_check_cast(target, Some(&Descriptor::Boxed(*from)))
            }
            _ => self.insert_check_cast(target, Some(stack)),
        }
    }

    /// Check the reference on the stack against `target`.
    ///
    /// Nothing is emitted when `known` already guarantees the target or the
    /// target is `Object`. Primitive targets are rejected; they need unboxing.
    pub fn insert_check_cast(
        &mut self,
        target: &Descriptor,
        known: Option<&Descriptor>,
    ) -> Result<(), CompileError> {
        match target {
            Descriptor::Object => Ok(()),
            Descriptor::Primitive(_) => Err(CompileError::IllegalCast(target.to_string())),
            _ if known == Some(target) => Ok(()),
            _ => {
                self.emit(Opcode::CheckCast(target.clone()));
                Ok(())
            }
        }
    }

    /// Numeric primitive or boxed number
    pub fn is_primitive_or_unboxable_supported_number(descriptor: Option<&Descriptor>) -> bool {
        descriptor.is_some_and(Descriptor::is_numeric)
    }

    /// Boolean primitive or boxed boolean
    pub fn is_boolean_compatible(descriptor: Option<&Descriptor>) -> bool {
        descriptor.is_some_and(Descriptor::is_boolean)
    }

    /// Same primitive kind up to boxing
    pub fn are_boxing_compatible(a: &Descriptor, b: &Descriptor) -> bool {
        a == b || (a.primitive_kind().is_some() && a.primitive_kind() == b.primitive_kind())
    }

    /// Primitive kind for a descriptor, boxed or not
    pub fn to_primitive_target(descriptor: &Descriptor) -> Option<PrimitiveKind> {
        descriptor.primitive_kind()
    }

    /// Result kind of a binary numeric operation.
    ///
    /// Double wins over float, float over long, long over int; byte and
    /// short operate as int.
    pub fn binary_numeric_promotion(
        left: &Descriptor,
        right: &Descriptor,
    ) -> Option<PrimitiveKind> {
        use PrimitiveKind::*;
        let l = left.primitive_kind().filter(|k| k.is_numeric())?;
        let r = right.primitive_kind().filter(|k| k.is_numeric())?;
        Some(if l == Double || r == Double {
            Double
        } else if l == Float || r == Float {
            Float
        } else if l == Long || r == Long {
            Long
        } else {
            Int
        })
    }
}

fn widens_within_int(from: PrimitiveKind, to: PrimitiveKind) -> bool {
    use PrimitiveKind::*;
    matches!((from, to), (_, Int) | (Byte, Short))
}

fn invalid_conversion(from: &Descriptor, to: &Descriptor) -> CompileError {
    CompileError::InvalidConversion {
        from: from.to_string(),
        to: to.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcode::NumericOp;

    fn opcodes(cf: CodeFlow) -> Vec<Opcode> {
        cf.finish(None).opcodes().cloned().collect()
    }

    #[test]
    fn test_descriptor_scopes() {
        let mut cf = CodeFlow::for_chunk("unit");
        assert_eq!(cf.last_descriptor(), None);
        cf.push_descriptor(Descriptor::String);
        cf.enter_compilation_scope();
        assert_eq!(cf.last_descriptor(), None);
        cf.push_descriptor(Descriptor::Primitive(PrimitiveKind::Int));
        assert_eq!(
            cf.last_descriptor(),
            Some(&Descriptor::Primitive(PrimitiveKind::Int))
        );
        cf.exit_compilation_scope();
        assert_eq!(cf.last_descriptor(), Some(&Descriptor::String));
        cf.exit_compilation_scope();
        assert_eq!(cf.scope_depth(), 1);
    }

    #[test]
    fn test_int_plus_long_widens_left() {
        let mut cf = CodeFlow::for_chunk("unit");
        cf.emit(Opcode::IConst(1));
        cf.insert_primitive_conversion(PrimitiveKind::Int, PrimitiveKind::Long)
            .unwrap();
        cf.emit(Opcode::LConst(2));
        cf.emit(Opcode::LArith(NumericOp::Add));
        assert_eq!(
            opcodes(cf),
            vec![
                Opcode::IConst(1),
                Opcode::I2L,
                Opcode::LConst(2),
                Opcode::LArith(NumericOp::Add)
            ]
        );
    }

    #[test]
    fn test_boolean_conversion_rejected() {
        let mut cf = CodeFlow::for_chunk("unit");
        assert!(cf
            .insert_primitive_conversion(PrimitiveKind::Boolean, PrimitiveKind::Int)
            .is_err());
    }

    #[test]
    fn test_narrowing_to_byte_goes_through_int() {
        let mut cf = CodeFlow::for_chunk("unit");
        cf.insert_primitive_conversion(PrimitiveKind::Double, PrimitiveKind::Byte)
            .unwrap();
        assert_eq!(opcodes(cf), vec![Opcode::D2I, Opcode::I2B]);
    }

    #[test]
    fn test_byte_to_int_is_free() {
        let mut cf = CodeFlow::for_chunk("unit");
        cf.insert_primitive_conversion(PrimitiveKind::Byte, PrimitiveKind::Int)
            .unwrap();
        assert!(opcodes(cf).is_empty());
    }

    #[test]
    fn test_unknown_reference_uses_number_path() {
        let mut cf = CodeFlow::for_chunk("unit");
        cf.insert_numeric_unboxing_or_primitive_type_coercion(
            &Descriptor::Object,
            PrimitiveKind::Long,
        )
        .unwrap();
        assert_eq!(opcodes(cf), vec![Opcode::UnboxNumber(PrimitiveKind::Long)]);
    }

    #[test]
    fn test_boxed_int_to_double() {
        let mut cf = CodeFlow::for_chunk("unit");
        cf.insert_numeric_unboxing_or_primitive_type_coercion(
            &Descriptor::Boxed(PrimitiveKind::Int),
            PrimitiveKind::Double,
        )
        .unwrap();
        assert_eq!(
            opcodes(cf),
            vec![Opcode::Unbox(PrimitiveKind::Int), Opcode::I2D]
        );
    }

    #[test]
    fn test_string_cannot_become_number() {
        let mut cf = CodeFlow::for_chunk("unit");
        assert!(cf
            .insert_numeric_unboxing_or_primitive_type_coercion(
                &Descriptor::String,
                PrimitiveKind::Int
            )
            .is_err());
    }

    #[test]
    fn test_check_cast_skipped_when_known() {
        let mut cf = CodeFlow::for_chunk("unit");
        cf.insert_check_cast(&Descriptor::String, Some(&Descriptor::String))
            .unwrap();
        cf.insert_check_cast(&Descriptor::Object, None).unwrap();
        assert!(cf
            .insert_check_cast(&Descriptor::Primitive(PrimitiveKind::Int), None)
            .is_err());
        cf.insert_check_cast(&Descriptor::List, Some(&Descriptor::Object))
            .unwrap();
        assert_eq!(opcodes(cf), vec![Opcode::CheckCast(Descriptor::List)]);
    }

    #[test]
    fn test_any_conversion_boxes_primitive_for_reference_target() {
        let mut cf = CodeFlow::for_chunk("unit");
        cf.insert_any_necessary_type_conversions(
            &Descriptor::Object,
            &Descriptor::Primitive(PrimitiveKind::Float),
        )
        .unwrap();
        assert_eq!(opcodes(cf), vec![Opcode::Box(PrimitiveKind::Float)]);
    }

    #[test]
    fn test_fields_are_registered_once() {
        let mut cf = CodeFlow::for_chunk("unit");
        let a = cf.register_static_field("node-7", "pattern", FieldInit::Pattern("a+".into()));
        let b = cf.register_static_field("node-7", "pattern", FieldInit::Pattern("b+".into()));
        let c = cf.register_new_field("node-8", "list");
        assert_eq!(a, b);
        assert_ne!(a, c);
        let chunk = cf.finish(None);
        assert_eq!(chunk.fields.len(), 2);
        assert_eq!(chunk.fields[0].init, Some(FieldInit::Pattern("a+".into())));
        assert_eq!(chunk.fields[1].init, None);
    }

    #[test]
    fn test_locals_are_monotonic() {
        let mut cf = CodeFlow::for_chunk("unit");
        assert_eq!(cf.next_free_local(), LocalSlot(0));
        assert_eq!(cf.next_free_local(), LocalSlot(1));
        assert_eq!(cf.finish(None).local_count, 2);
    }

    #[test]
    fn test_binary_numeric_promotion() {
        use PrimitiveKind::*;
        let p = |k| Descriptor::Primitive(k);
        assert_eq!(
            CodeFlow::binary_numeric_promotion(&p(Int), &Descriptor::Boxed(Long)),
            Some(Long)
        );
        assert_eq!(
            CodeFlow::binary_numeric_promotion(&p(Float), &p(Long)),
            Some(Float)
        );
        assert_eq!(CodeFlow::binary_numeric_promotion(&p(Short), &p(Byte)), Some(Int));
        assert_eq!(
            CodeFlow::binary_numeric_promotion(&p(Int), &Descriptor::String),
            None
        );
        assert_eq!(
            CodeFlow::binary_numeric_promotion(&p(Boolean), &p(Int)),
            None
        );
    }
}

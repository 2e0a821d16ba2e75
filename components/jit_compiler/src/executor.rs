//! Stack machine running compiled expression code
//!
//! Operand slots are either unboxed primitives or references. A reference
//! of the wrong shape where generated code assumed a type is a coercion
//! failure, which disqualifies the unit; failures of the operations
//! themselves are evaluation errors and carry the instruction's span.

use crate::compiled_unit::{FieldSlot, UnitFailure};
use bytecode_system::{CodeChunk, CompareOp, Descriptor, FieldId, LocalSlot, Opcode, PrimitiveKind};
use core_types::{EvaluationError, SourceSpan, Value};
use interpreter::operators::{
    compare_values, concat_text, double_arith, equality_check, float_arith, int_arith,
    is_present, long_arith,
};
use interpreter::{
    index_list, index_map, index_string, invoke_method, read_property, EvaluationContext,
};
use std::collections::HashMap;

/// An operand stack slot
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    /// Int slot; also booleans, chars, bytes and shorts
    Int(i32),
    /// Long slot
    Long(i64),
    /// Float slot
    Float(f32),
    /// Double slot
    Double(f64),
    /// Reference slot
    Ref(Value),
}

impl Slot {
    fn kind_name(&self) -> String {
        match self {
            Slot::Int(_) => "int".into(),
            Slot::Long(_) => "long".into(),
            Slot::Float(_) => "float".into(),
            Slot::Double(_) => "double".into(),
            Slot::Ref(value) => value.type_name(),
        }
    }
}

fn compare_ordered<T: PartialOrd>(op: CompareOp, a: T, b: T) -> bool {
    match a.partial_cmp(&b) {
        Some(ordering) => op.test(ordering),
        None => op == CompareOp::Ne,
    }
}

fn boolean(b: bool) -> Slot {
    Slot::Int(i32::from(b))
}

/// Box a primitive slot as a value of `kind`
pub fn box_slot(kind: PrimitiveKind, slot: Slot) -> Option<Value> {
    Some(match (kind, slot) {
        (PrimitiveKind::Boolean, Slot::Int(i)) => Value::Boolean(i != 0),
        (PrimitiveKind::Char, Slot::Int(i)) => Value::Char(char::from_u32(i as u32)?),
        (PrimitiveKind::Byte, Slot::Int(i)) => Value::Byte(i as i8),
        (PrimitiveKind::Short, Slot::Int(i)) => Value::Short(i as i16),
        (PrimitiveKind::Int, Slot::Int(i)) => Value::Int(i),
        (PrimitiveKind::Long, Slot::Long(n)) => Value::Long(n),
        (PrimitiveKind::Float, Slot::Float(n)) => Value::Float(n),
        (PrimitiveKind::Double, Slot::Double(n)) => Value::Double(n),
        _ => return None,
    })
}

/// Unbox a value holding exactly the boxed form of `kind`
pub fn unbox_exact(kind: PrimitiveKind, value: &Value) -> Option<Slot> {
    Some(match (kind, value) {
        (PrimitiveKind::Boolean, Value::Boolean(b)) => boolean(*b),
        (PrimitiveKind::Char, Value::Char(c)) => Slot::Int(*c as i32),
        (PrimitiveKind::Byte, Value::Byte(n)) => Slot::Int(i32::from(*n)),
        (PrimitiveKind::Short, Value::Short(n)) => Slot::Int(i32::from(*n)),
        (PrimitiveKind::Int, Value::Int(n)) => Slot::Int(*n),
        (PrimitiveKind::Long, Value::Long(n)) => Slot::Long(*n),
        (PrimitiveKind::Float, Value::Float(n)) => Slot::Float(*n),
        (PrimitiveKind::Double, Value::Double(n)) => Slot::Double(*n),
        _ => return None,
    })
}

fn narrow_int(kind: PrimitiveKind, n: i32) -> i32 {
    match kind {
        PrimitiveKind::Byte => i32::from(n as i8),
        PrimitiveKind::Short => i32::from(n as i16),
        PrimitiveKind::Char => i32::from(n as u16),
        _ => n,
    }
}

/// Unbox any number, converting it to the slot of `kind`
pub fn unbox_number(kind: PrimitiveKind, value: &Value) -> Option<Slot> {
    let integral = match value {
        Value::Byte(n) => Some(i64::from(*n)),
        Value::Short(n) => Some(i64::from(*n)),
        Value::Int(n) => Some(i64::from(*n)),
        Value::Long(n) => Some(*n),
        Value::Float(_) | Value::Double(_) => None,
        _ => return None,
    };
    let real = value.as_f64()?;
    Some(match kind.stack_kind() {
        PrimitiveKind::Int => {
            let n = integral.map_or(real as i32, |n| n as i32);
            Slot::Int(narrow_int(kind, n))
        }
        PrimitiveKind::Long => Slot::Long(integral.unwrap_or(real as i64)),
        PrimitiveKind::Float => Slot::Float(integral.map_or(real as f32, |n| n as f32)),
        _ => Slot::Double(integral.map_or(real, |n| n as f64)),
    })
}

/// Runtime state of one execution of a chunk
pub struct Executor<'a> {
    chunk: &'a CodeChunk,
    fields: &'a HashMap<FieldId, FieldSlot>,
    context: &'a dyn EvaluationContext,
    target: &'a Value,
    stack: Vec<Slot>,
    locals: Vec<Slot>,
    pc: usize,
}

impl<'a> Executor<'a> {
    /// Prepare to run `chunk` with its linked fields
    pub fn new(
        chunk: &'a CodeChunk,
        fields: &'a HashMap<FieldId, FieldSlot>,
        target: &'a Value,
        context: &'a dyn EvaluationContext,
    ) -> Self {
        Self {
            chunk,
            fields,
            context,
            target,
            stack: Vec::with_capacity(16),
            locals: vec![Slot::Ref(Value::Null); usize::from(chunk.local_count)],
            pc: 0,
        }
    }

    fn invalid(&self, reason: impl Into<String>) -> UnitFailure {
        UnitFailure::InvalidState {
            offset: self.pc,
            reason: reason.into(),
        }
    }

    fn coercion(&self, expected: impl ToString, found: &Slot) -> UnitFailure {
        UnitFailure::Coercion {
            offset: self.pc,
            expected: expected.to_string(),
            found: found.kind_name(),
        }
    }

    fn pop(&mut self) -> Result<Slot, UnitFailure> {
        self.stack
            .pop()
            .ok_or_else(|| self.invalid("operand stack underflow"))
    }

    fn push(&mut self, slot: Slot) {
        self.stack.push(slot);
    }

    fn pop_int(&mut self) -> Result<i32, UnitFailure> {
        match self.pop()? {
            Slot::Int(n) => Ok(n),
            other => Err(self.invalid(format!("expected int slot, found {}", other.kind_name()))),
        }
    }

    fn pop_long(&mut self) -> Result<i64, UnitFailure> {
        match self.pop()? {
            Slot::Long(n) => Ok(n),
            other => Err(self.invalid(format!("expected long slot, found {}", other.kind_name()))),
        }
    }

    fn pop_float(&mut self) -> Result<f32, UnitFailure> {
        match self.pop()? {
            Slot::Float(n) => Ok(n),
            other => Err(self.invalid(format!("expected float slot, found {}", other.kind_name()))),
        }
    }

    fn pop_double(&mut self) -> Result<f64, UnitFailure> {
        match self.pop()? {
            Slot::Double(n) => Ok(n),
            other => Err(self.invalid(format!("expected double slot, found {}", other.kind_name()))),
        }
    }

    fn pop_ref(&mut self) -> Result<Value, UnitFailure> {
        match self.pop()? {
            Slot::Ref(value) => Ok(value),
            other => Err(self.invalid(format!("expected reference, found {}", other.kind_name()))),
        }
    }

    fn span(&self) -> Option<SourceSpan> {
        self.chunk.instructions.get(self.pc).and_then(|i| i.span)
    }

    fn located(&self, err: EvaluationError) -> UnitFailure {
        match self.span() {
            Some(span) => UnitFailure::Evaluation(err.at(span)),
            None => UnitFailure::Evaluation(err),
        }
    }

    fn field(&self, id: FieldId) -> Result<&'a FieldSlot, UnitFailure> {
        self.fields
            .get(&id)
            .ok_or_else(|| self.invalid(format!("field {} is not linked", id.0)))
    }

    fn local_index(&self, slot: LocalSlot) -> Result<usize, UnitFailure> {
        let index = usize::from(slot.0);
        if index < self.locals.len() {
            Ok(index)
        } else {
            Err(self.invalid(format!("local slot {} out of range", index)))
        }
    }

    /// Run to the `Return` instruction
    pub fn run(mut self) -> Result<Value, UnitFailure> {
        let chunk = self.chunk;
        loop {
            let Some(instruction) = chunk.instructions.get(self.pc) else {
                return Err(self.invalid("ran past the end of the code"));
            };
            let mut next = self.pc + 1;
            match &instruction.opcode {
                Opcode::PushConst(index) => {
                    let value = chunk
                        .constants
                        .get(*index)
                        .cloned()
                        .ok_or_else(|| self.invalid(format!("constant {} missing", index)))?;
                    self.push(Slot::Ref(value));
                }
                Opcode::PushNull => self.push(Slot::Ref(Value::Null)),
                Opcode::IConst(n) => self.push(Slot::Int(*n)),
                Opcode::LConst(n) => self.push(Slot::Long(*n)),
                Opcode::FConst(n) => self.push(Slot::Float(*n)),
                Opcode::DConst(n) => self.push(Slot::Double(*n)),

                Opcode::LoadTarget => self.push(Slot::Ref(self.target.clone())),
                Opcode::LoadVariable(name) => {
                    let value = self.context.lookup_variable(name).unwrap_or(Value::Null);
                    self.push(Slot::Ref(value));
                }
                Opcode::LoadLocal(slot) => {
                    let index = self.local_index(*slot)?;
                    let value = self.locals[index].clone();
                    self.push(value);
                }
                Opcode::StoreLocal(slot) => {
                    let index = self.local_index(*slot)?;
                    self.locals[index] = self.pop()?;
                }
                Opcode::GetField(id) => {
                    let value = match self.field(*id)? {
                        FieldSlot::Value(value) => value.clone(),
                        FieldSlot::List(items) => Value::list(items.clone()),
                        FieldSlot::Pattern(_) => {
                            return Err(self.invalid("pattern fields cannot be loaded"))
                        }
                    };
                    self.push(Slot::Ref(value));
                }

                Opcode::Pop => {
                    self.pop()?;
                }
                Opcode::Dup => {
                    let top = self.pop()?;
                    self.push(top.clone());
                    self.push(top);
                }
                Opcode::Swap => {
                    let b = self.pop()?;
                    let a = self.pop()?;
                    self.push(b);
                    self.push(a);
                }

                Opcode::IArith(op) => {
                    let b = self.pop_int()?;
                    let a = self.pop_int()?;
                    let result = int_arith(*op, a, b).map_err(|e| self.located(e))?;
                    self.push(Slot::Int(result));
                }
                Opcode::LArith(op) => {
                    let b = self.pop_long()?;
                    let a = self.pop_long()?;
                    let result = long_arith(*op, a, b).map_err(|e| self.located(e))?;
                    self.push(Slot::Long(result));
                }
                Opcode::FArith(op) => {
                    let b = self.pop_float()?;
                    let a = self.pop_float()?;
                    self.push(Slot::Float(float_arith(*op, a, b)));
                }
                Opcode::DArith(op) => {
                    let b = self.pop_double()?;
                    let a = self.pop_double()?;
                    self.push(Slot::Double(double_arith(*op, a, b)));
                }
                Opcode::INeg => {
                    let a = self.pop_int()?;
                    self.push(Slot::Int(a.wrapping_neg()));
                }
                Opcode::LNeg => {
                    let a = self.pop_long()?;
                    self.push(Slot::Long(a.wrapping_neg()));
                }
                Opcode::FNeg => {
                    let a = self.pop_float()?;
                    self.push(Slot::Float(-a));
                }
                Opcode::DNeg => {
                    let a = self.pop_double()?;
                    self.push(Slot::Double(-a));
                }
                Opcode::INot => {
                    let a = self.pop_int()?;
                    self.push(boolean(a == 0));
                }

                Opcode::ICmp(op) => {
                    let b = self.pop_int()?;
                    let a = self.pop_int()?;
                    self.push(boolean(op.test(a.cmp(&b))));
                }
                Opcode::LCmp(op) => {
                    let b = self.pop_long()?;
                    let a = self.pop_long()?;
                    self.push(boolean(op.test(a.cmp(&b))));
                }
                Opcode::FCmp(op) => {
                    let b = self.pop_float()?;
                    let a = self.pop_float()?;
                    self.push(boolean(compare_ordered(*op, a, b)));
                }
                Opcode::DCmp(op) => {
                    let b = self.pop_double()?;
                    let a = self.pop_double()?;
                    self.push(boolean(compare_ordered(*op, a, b)));
                }

                Opcode::I2L => {
                    let a = self.pop_int()?;
                    self.push(Slot::Long(i64::from(a)));
                }
                Opcode::I2F => {
                    let a = self.pop_int()?;
                    self.push(Slot::Float(a as f32));
                }
                Opcode::I2D => {
                    let a = self.pop_int()?;
                    self.push(Slot::Double(f64::from(a)));
                }
                Opcode::L2I => {
                    let a = self.pop_long()?;
                    self.push(Slot::Int(a as i32));
                }
                Opcode::L2F => {
                    let a = self.pop_long()?;
                    self.push(Slot::Float(a as f32));
                }
                Opcode::L2D => {
                    let a = self.pop_long()?;
                    self.push(Slot::Double(a as f64));
                }
                Opcode::F2I => {
                    let a = self.pop_float()?;
                    self.push(Slot::Int(a as i32));
                }
                Opcode::F2L => {
                    let a = self.pop_float()?;
                    self.push(Slot::Long(a as i64));
                }
                Opcode::F2D => {
                    let a = self.pop_float()?;
                    self.push(Slot::Double(f64::from(a)));
                }
                Opcode::D2I => {
                    let a = self.pop_double()?;
                    self.push(Slot::Int(a as i32));
                }
                Opcode::D2L => {
                    let a = self.pop_double()?;
                    self.push(Slot::Long(a as i64));
                }
                Opcode::D2F => {
                    let a = self.pop_double()?;
                    self.push(Slot::Float(a as f32));
                }
                Opcode::I2B => {
                    let a = self.pop_int()?;
                    self.push(Slot::Int(narrow_int(PrimitiveKind::Byte, a)));
                }
                Opcode::I2C => {
                    let a = self.pop_int()?;
                    self.push(Slot::Int(narrow_int(PrimitiveKind::Char, a)));
                }
                Opcode::I2S => {
                    let a = self.pop_int()?;
                    self.push(Slot::Int(narrow_int(PrimitiveKind::Short, a)));
                }

                Opcode::Box(kind) => {
                    let slot = self.pop()?;
                    let found = slot.kind_name();
                    let value = box_slot(*kind, slot).ok_or_else(|| {
                        self.invalid(format!("cannot box {} as {}", found, kind.boxed_type()))
                    })?;
                    self.push(Slot::Ref(value));
                }
                Opcode::Unbox(kind) => {
                    let slot = self.pop()?;
                    let unboxed = match &slot {
                        Slot::Ref(value) => unbox_exact(*kind, value),
                        _ => None,
                    };
                    let unboxed = unboxed.ok_or_else(|| self.coercion(kind.boxed_type(), &slot))?;
                    self.push(unboxed);
                }
                Opcode::UnboxNumber(kind) => {
                    let slot = self.pop()?;
                    let unboxed = match &slot {
                        Slot::Ref(value) => unbox_number(*kind, value),
                        _ => None,
                    };
                    let unboxed = unboxed.ok_or_else(|| self.coercion("Number", &slot))?;
                    self.push(unboxed);
                }
                Opcode::CheckCast(descriptor) => {
                    let admitted = match self.stack.last() {
                        Some(Slot::Ref(value)) => descriptor.admits(value),
                        Some(_) => false,
                        None => return Err(self.invalid("operand stack underflow")),
                    };
                    if !admitted {
                        let slot = self.pop()?;
                        return Err(self.coercion(descriptor, &slot));
                    }
                }

                Opcode::RefEquals => {
                    let b = self.pop_ref()?;
                    let a = self.pop_ref()?;
                    let eq = equality_check(self.context, &a, &b).map_err(|e| self.located(e))?;
                    self.push(boolean(eq));
                }
                Opcode::RefCompare(op) => {
                    let b = self.pop_ref()?;
                    let a = self.pop_ref()?;
                    let result =
                        compare_values(self.context, *op, &a, &b).map_err(|e| self.located(e))?;
                    self.push(boolean(result));
                }
                Opcode::GetProperty(name) => {
                    let target = self.pop_ref()?;
                    let value = read_property(&target, name).map_err(|e| self.located(e))?;
                    self.push(Slot::Ref(value));
                }
                Opcode::IndexList => {
                    let index = self.pop_int()?;
                    let target = self.pop()?;
                    let Slot::Ref(Value::List(list)) = &target else {
                        return Err(self.coercion(Descriptor::List, &target));
                    };
                    let value = index_list(list, i64::from(index)).map_err(|e| self.located(e))?;
                    self.push(Slot::Ref(value));
                }
                Opcode::IndexMap => {
                    let key = self.pop_ref()?;
                    let target = self.pop()?;
                    let Slot::Ref(Value::Map(map)) = &target else {
                        return Err(self.coercion(Descriptor::Map, &target));
                    };
                    let value = index_map(map, &key);
                    self.push(Slot::Ref(value));
                }
                Opcode::IndexString => {
                    let index = self.pop_int()?;
                    let target = self.pop()?;
                    let Slot::Ref(Value::String(text)) = &target else {
                        return Err(self.coercion(Descriptor::String, &target));
                    };
                    let value =
                        index_string(text, i64::from(index)).map_err(|e| self.located(e))?;
                    self.push(Slot::Ref(value));
                }
                Opcode::InvokeMethod { name, argc } => {
                    let mut args = Vec::with_capacity(*argc);
                    for _ in 0..*argc {
                        args.push(self.pop_ref()?);
                    }
                    args.reverse();
                    let receiver = self.pop_ref()?;
                    let value =
                        invoke_method(&receiver, name, &args).map_err(|e| self.located(e))?;
                    self.push(Slot::Ref(value));
                }
                Opcode::Matches(id) => {
                    let FieldSlot::Pattern(regex) = self.field(*id)? else {
                        return Err(self.invalid(format!("field {} is not a pattern", id.0)));
                    };
                    let text = self.pop()?;
                    let Slot::Ref(Value::String(s)) = &text else {
                        return Err(self.coercion(Descriptor::String, &text));
                    };
                    let matched = regex.is_match(s);
                    self.push(boolean(matched));
                }
                Opcode::Concat(n) | Opcode::Interpolate(n) => {
                    let skip_nulls = matches!(instruction.opcode, Opcode::Interpolate(_));
                    let mut parts = Vec::with_capacity(*n);
                    for _ in 0..*n {
                        parts.push(self.pop_ref()?);
                    }
                    let text: String = parts
                        .iter()
                        .rev()
                        .filter(|v| !(skip_nulls && v.is_null()))
                        .map(concat_text)
                        .collect();
                    self.push(Slot::Ref(Value::from(text)));
                }

                Opcode::Jump(target) => next = *target,
                Opcode::JumpIfFalse(target) => {
                    if self.pop_int()? == 0 {
                        next = *target;
                    }
                }
                Opcode::JumpIfTrue(target) => {
                    if self.pop_int()? != 0 {
                        next = *target;
                    }
                }
                Opcode::JumpIfPresent(target) => {
                    if is_present(&self.pop_ref()?) {
                        next = *target;
                    }
                }
                Opcode::Nop => {}
                Opcode::Return => return self.pop_ref(),
            }
            self.pc = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytecode_system::{NumericOp, Optimizer};
    use core_types::MessageCode;
    use interpreter::StandardEvaluationContext;

    fn run(chunk: &CodeChunk, target: &Value) -> Result<Value, UnitFailure> {
        let ctx = StandardEvaluationContext::new();
        let fields = HashMap::new();
        Executor::new(chunk, &fields, target, &ctx).run()
    }

    fn chunk(ops: Vec<Opcode>) -> CodeChunk {
        let mut chunk = CodeChunk::new("test");
        for op in ops {
            chunk.emit(op);
        }
        chunk
    }

    #[test]
    fn test_int_arithmetic_boxes_result() {
        let code = chunk(vec![
            Opcode::IConst(40),
            Opcode::IConst(2),
            Opcode::IArith(NumericOp::Add),
            Opcode::Box(PrimitiveKind::Int),
            Opcode::Return,
        ]);
        assert_eq!(run(&code, &Value::Null), Ok(Value::Int(42)));
    }

    #[test]
    fn test_division_by_zero_is_evaluation_error() {
        let mut code = CodeChunk::new("div");
        code.emit(Opcode::IConst(1));
        code.emit(Opcode::IConst(0));
        code.emit_with_span(Opcode::IArith(NumericOp::Div), SourceSpan::new(0, 5));
        code.emit(Opcode::Box(PrimitiveKind::Int));
        code.emit(Opcode::Return);
        match run(&code, &Value::Null) {
            Err(UnitFailure::Evaluation(err)) => {
                assert_eq!(err.code, MessageCode::DivisionByZero);
                assert_eq!(err.span, Some(SourceSpan::new(0, 5)));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unbox_of_wrong_type_is_coercion_failure() {
        let code = chunk(vec![
            Opcode::LoadTarget,
            Opcode::Unbox(PrimitiveKind::Int),
            Opcode::Box(PrimitiveKind::Int),
            Opcode::Return,
        ]);
        assert_eq!(run(&code, &Value::Int(7)), Ok(Value::Int(7)));
        let failure = run(&code, &Value::from("seven")).unwrap_err();
        assert!(failure.is_disqualifying());
        assert!(matches!(failure, UnitFailure::Coercion { offset: 1, .. }));
    }

    #[test]
    fn test_check_cast_admits_null() {
        let code = chunk(vec![
            Opcode::LoadTarget,
            Opcode::CheckCast(Descriptor::String),
            Opcode::Return,
        ]);
        assert_eq!(run(&code, &Value::Null), Ok(Value::Null));
        assert_eq!(run(&code, &Value::from("s")), Ok(Value::from("s")));
        assert!(run(&code, &Value::Int(1)).unwrap_err().is_disqualifying());
    }

    #[test]
    fn test_unbox_number_narrows() {
        assert_eq!(unbox_number(PrimitiveKind::Int, &Value::Double(3.9)), Some(Slot::Int(3)));
        assert_eq!(unbox_number(PrimitiveKind::Byte, &Value::Int(300)), Some(Slot::Int(44)));
        assert_eq!(unbox_number(PrimitiveKind::Double, &Value::Long(2)), Some(Slot::Double(2.0)));
        assert_eq!(unbox_number(PrimitiveKind::Int, &Value::from("1")), None);
    }

    #[test]
    fn test_boxing_round_trips_every_primitive() {
        let samples = [
            Value::Boolean(true),
            Value::Char('x'),
            Value::Byte(-3),
            Value::Short(300),
            Value::Int(-70_000),
            Value::Long(1 << 40),
            Value::Float(1.5),
            Value::Double(-2.25),
        ];
        for (kind, value) in PrimitiveKind::ALL.into_iter().zip(samples) {
            let slot = unbox_exact(kind, &value).unwrap();
            assert_eq!(box_slot(kind, slot), Some(value));
        }
    }

    #[test]
    fn test_jumps_and_presence() {
        // target ?: 'fallback'
        let mut code = CodeChunk::new("elvis");
        code.emit(Opcode::LoadTarget);
        code.emit(Opcode::Dup);
        code.emit(Opcode::JumpIfPresent(5));
        code.emit(Opcode::Pop);
        let idx = code.add_constant(Value::from("fallback"));
        code.emit(Opcode::PushConst(idx));
        code.emit(Opcode::Return);
        assert_eq!(run(&code, &Value::from("")), Ok(Value::from("fallback")));
        assert_eq!(run(&code, &Value::from("x")), Ok(Value::from("x")));
    }

    #[test]
    fn test_interpolate_skips_nulls() {
        let code = chunk(vec![
            Opcode::LoadTarget,
            Opcode::PushNull,
            Opcode::LoadTarget,
            Opcode::Interpolate(3),
            Opcode::Return,
        ]);
        assert_eq!(run(&code, &Value::from("ab")), Ok(Value::from("abab")));
    }

    #[test]
    fn test_float_comparisons_with_nan() {
        let code = chunk(vec![
            Opcode::DConst(f64::NAN),
            Opcode::DConst(1.0),
            Opcode::DCmp(CompareOp::Ne),
            Opcode::Box(PrimitiveKind::Boolean),
            Opcode::Return,
        ]);
        assert_eq!(run(&code, &Value::Null), Ok(Value::Boolean(true)));
        let mut optimized = code.clone();
        Optimizer::new().optimize(&mut optimized);
        assert_eq!(run(&optimized, &Value::Null), Ok(Value::Boolean(true)));
    }
}

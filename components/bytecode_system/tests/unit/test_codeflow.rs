//! Tests for CodeFlow code generation bookkeeping

use bytecode_system::{
    CodeFlow, CompareOp, Descriptor, FieldInit, NumericOp, Opcode, PrimitiveKind,
};
use core_types::Value;
use pretty_assertions::assert_eq;

fn ops(cf: CodeFlow) -> Vec<Opcode> {
    cf.finish(None).opcodes().cloned().collect()
}

#[test]
fn test_every_primitive_boxes_and_unboxes_symmetrically() {
    for kind in PrimitiveKind::ALL {
        let mut cf = CodeFlow::for_chunk("unit");
        cf.insert_boxing(kind);
        cf.insert_unboxing_if_necessary(&Descriptor::Boxed(kind));
        assert_eq!(ops(cf), vec![Opcode::Box(kind), Opcode::Unbox(kind)]);
    }
}

#[test]
fn test_widening_matrix_is_single_hop() {
    use PrimitiveKind::*;
    let cases = [
        (Int, Long, vec![Opcode::I2L]),
        (Int, Float, vec![Opcode::I2F]),
        (Int, Double, vec![Opcode::I2D]),
        (Long, Float, vec![Opcode::L2F]),
        (Long, Double, vec![Opcode::L2D]),
        (Float, Double, vec![Opcode::F2D]),
        (Long, Int, vec![Opcode::L2I]),
        (Double, Float, vec![Opcode::D2F]),
        (Short, Char, vec![Opcode::I2C]),
        (Int, Short, vec![Opcode::I2S]),
    ];
    for (from, to, expected) in cases {
        let mut cf = CodeFlow::for_chunk("unit");
        cf.insert_primitive_conversion(from, to).unwrap();
        assert_eq!(ops(cf), expected, "{:?} -> {:?}", from, to);
    }
}

#[test]
fn test_boxed_long_target_from_primitive_int() {
    let mut cf = CodeFlow::for_chunk("unit");
    cf.insert_any_necessary_type_conversions(
        &Descriptor::Boxed(PrimitiveKind::Long),
        &Descriptor::Primitive(PrimitiveKind::Int),
    )
    .unwrap();
    assert_eq!(ops(cf), vec![Opcode::I2L, Opcode::Box(PrimitiveKind::Long)]);
}

#[test]
fn test_reference_target_inserts_cast_only_when_needed() {
    let mut cf = CodeFlow::for_chunk("unit");
    cf.insert_any_necessary_type_conversions(&Descriptor::String, &Descriptor::Object)
        .unwrap();
    cf.insert_any_necessary_type_conversions(&Descriptor::String, &Descriptor::String)
        .unwrap();
    assert_eq!(ops(cf), vec![Opcode::CheckCast(Descriptor::String)]);
}

#[test]
fn test_numeric_operand_classification() {
    let boxed_long = Descriptor::Boxed(PrimitiveKind::Long);
    assert!(CodeFlow::is_primitive_or_unboxable_supported_number(Some(&boxed_long)));
    assert_eq!(CodeFlow::to_primitive_target(&boxed_long), Some(PrimitiveKind::Long));
    let boolean = Descriptor::Primitive(PrimitiveKind::Boolean);
    assert!(!CodeFlow::is_primitive_or_unboxable_supported_number(Some(&boolean)));
    assert_eq!(CodeFlow::to_primitive_target(&boolean), Some(PrimitiveKind::Boolean));
    assert!(!CodeFlow::is_primitive_or_unboxable_supported_number(Some(&Descriptor::String)));
    assert!(!CodeFlow::is_primitive_or_unboxable_supported_number(None));
    assert_eq!(CodeFlow::to_primitive_target(&Descriptor::Object), None);
}

#[test]
fn test_unbox_boolean_if_necessary() {
    let mut cf = CodeFlow::for_chunk("unit");
    cf.unbox_boolean_if_necessary(&Descriptor::Boxed(PrimitiveKind::Boolean));
    cf.unbox_boolean_if_necessary(&Descriptor::Primitive(PrimitiveKind::Boolean));
    assert_eq!(ops(cf), vec![Opcode::Unbox(PrimitiveKind::Boolean)]);
}

#[test]
fn test_jump_patching_through_codeflow() {
    let mut cf = CodeFlow::for_chunk("unit");
    cf.emit(Opcode::IConst(1));
    cf.emit(Opcode::IConst(2));
    cf.emit(Opcode::ICmp(CompareOp::Lt));
    let else_jump = cf.emit_jump(Opcode::JumpIfFalse(0));
    cf.emit(Opcode::IConst(3));
    let end_jump = cf.emit_jump(Opcode::Jump(0));
    cf.patch_jump_here(else_jump).unwrap();
    cf.emit(Opcode::IConst(4));
    cf.patch_jump_here(end_jump).unwrap();
    cf.emit(Opcode::IArith(NumericOp::Add));
    let ops = ops(cf);
    assert_eq!(ops[3], Opcode::JumpIfFalse(6));
    assert_eq!(ops[5], Opcode::Jump(7));
}

#[test]
fn test_static_fields_emitted_once_in_registration_order() {
    let mut cf = CodeFlow::for_chunk("unit");
    let list = cf.register_static_field(
        "node-1",
        "inlineList",
        FieldInit::List(vec![Value::Int(1), Value::Int(2)]),
    );
    let pattern = cf.register_static_field("node-2", "pattern", FieldInit::Pattern("[a-z]+".into()));
    // same node generating code a second time
    let again = cf.register_static_field(
        "node-1",
        "inlineList",
        FieldInit::List(vec![Value::Int(9)]),
    );
    cf.emit(Opcode::GetField(list));
    cf.emit(Opcode::GetField(again));
    let chunk = cf.finish(None);
    assert_eq!(list, again);
    assert_eq!(chunk.fields.len(), 2);
    assert_eq!(chunk.fields[0].id, list);
    assert_eq!(chunk.fields[1].id, pattern);
    assert_eq!(
        chunk.field(list).and_then(|f| f.init.clone()),
        Some(FieldInit::List(vec![Value::Int(1), Value::Int(2)]))
    );
}

//! Tests for the peephole optimizer

use bytecode_system::{CodeChunk, Opcode, Optimizer, PrimitiveKind};

#[test]
fn test_optimizer_respects_max_passes() {
    let mut chunk = CodeChunk::new("unit");
    chunk.emit(Opcode::IConst(1));
    chunk.emit(Opcode::Box(PrimitiveKind::Int));
    chunk.emit(Opcode::Unbox(PrimitiveKind::Int));
    chunk.emit(Opcode::Box(PrimitiveKind::Int));
    chunk.emit(Opcode::Return);
    Optimizer::new().with_max_passes(0).optimize(&mut chunk);
    assert_eq!(chunk.instruction_count(), 5);
    Optimizer::new().optimize(&mut chunk);
    assert_eq!(chunk.instruction_count(), 3);
}

#[test]
fn test_optimizer_keeps_straight_line_code() {
    let mut chunk = CodeChunk::new("unit");
    chunk.emit(Opcode::LoadTarget);
    chunk.emit(Opcode::GetProperty("name".into()));
    chunk.emit(Opcode::Return);
    let before = chunk.clone();
    Optimizer::new().optimize(&mut chunk);
    assert_eq!(chunk, before);
}

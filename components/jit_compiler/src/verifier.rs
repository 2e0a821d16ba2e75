//! Static verification of generated code
//!
//! Simulates operand stack depth along every path before a chunk is linked,
//! so structural mistakes in code generation surface as compile errors
//! instead of runtime failures.

use bytecode_system::{CodeChunk, CompileError, Opcode};

fn invalid(offset: usize, reason: impl std::fmt::Display) -> CompileError {
    CompileError::InvalidCode(format!("instruction {}: {}", offset, reason))
}

/// Check a chunk's structure.
///
/// Every reachable instruction must see the same stack depth on all paths,
/// never underflow, reference only declared constants, fields and locals,
/// and every path must end in a `Return` with exactly one value.
pub fn verify(chunk: &CodeChunk) -> Result<(), CompileError> {
    let len = chunk.instructions.len();
    if len == 0 {
        return Err(CompileError::InvalidCode("empty code".to_string()));
    }

    let mut depth_at: Vec<Option<usize>> = vec![None; len];
    let mut worklist = vec![(0usize, 0usize)];

    while let Some((offset, depth)) = worklist.pop() {
        if offset >= len {
            return Err(invalid(offset, "control falls off the end of the code"));
        }
        match depth_at[offset] {
            Some(seen) if seen == depth => continue,
            Some(seen) => {
                return Err(invalid(
                    offset,
                    format!("stack depth {} disagrees with {}", depth, seen),
                ))
            }
            None => depth_at[offset] = Some(depth),
        }

        let opcode = &chunk.instructions[offset].opcode;
        check_operands(chunk, offset, opcode)?;

        let (pops, pushes) = opcode.stack_effect();
        if depth < pops {
            return Err(invalid(
                offset,
                format!("{:?} needs {} operands, stack holds {}", opcode, pops, depth),
            ));
        }
        let after = depth - pops + pushes;

        if matches!(opcode, Opcode::Return) {
            if depth != 1 {
                return Err(invalid(
                    offset,
                    format!("return with {} values on the stack", depth),
                ));
            }
            continue;
        }
        if let Some(target) = opcode.jump_target() {
            if target >= len {
                return Err(CompileError::InvalidJump(offset));
            }
            worklist.push((target, after));
        }
        if !opcode.is_unconditional_terminator() {
            worklist.push((offset + 1, after));
        }
    }
    Ok(())
}

fn check_operands(chunk: &CodeChunk, offset: usize, opcode: &Opcode) -> Result<(), CompileError> {
    match opcode {
        Opcode::PushConst(index) if *index >= chunk.constants.len() => {
            Err(invalid(offset, format!("constant {} is not in the pool", index)))
        }
        Opcode::GetField(id) | Opcode::Matches(id) if chunk.field(*id).is_none() => {
            Err(invalid(offset, format!("field {} is not declared", id.0)))
        }
        Opcode::LoadLocal(slot) | Opcode::StoreLocal(slot) if slot.0 >= chunk.local_count => {
            Err(invalid(offset, format!("local {} is out of range", slot.0)))
        }
        _ => Ok(()),
    }
}

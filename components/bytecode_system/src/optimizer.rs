//! Peephole passes over generated code
//!
//! Implements dead code elimination, box/unbox pair elimination, and
//! compaction of no-ops with jump retargeting.

use crate::chunk::CodeChunk;
use crate::opcode::Opcode;
use std::collections::HashSet;

/// Optimizer that applies peephole passes until nothing changes
#[derive(Debug, Clone)]
pub struct Optimizer {
    /// Maximum number of optimization passes to run
    max_passes: usize,
}

impl Default for Optimizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Optimizer {
    /// Create a new optimizer with default settings
    pub fn new() -> Self {
        Self { max_passes: 10 }
    }

    /// Set maximum number of optimization passes
    pub fn with_max_passes(mut self, max: usize) -> Self {
        self.max_passes = max;
        self
    }

    /// Run all optimization passes on the chunk
    pub fn optimize(&self, chunk: &mut CodeChunk) {
        for _ in 0..self.max_passes {
            let changed = self.run_single_pass(chunk);
            if !changed {
                break;
            }
        }
    }

    /// Run a single optimization pass, returns true if any changes were made
    fn run_single_pass(&self, chunk: &mut CodeChunk) -> bool {
        let mut changed = false;

        if self.eliminate_dead_code(chunk) {
            changed = true;
        }

        if self.eliminate_redundant_pairs(chunk) {
            changed = true;
        }

        if self.compact(chunk) {
            changed = true;
        }

        changed
    }

    /// Replace unreachable code after unconditional terminators with no-ops
    fn eliminate_dead_code(&self, chunk: &mut CodeChunk) -> bool {
        let targets = jump_targets(chunk);
        let mut dead = false;
        let mut changed = false;

        for (pc, inst) in chunk.instructions.iter_mut().enumerate() {
            if targets.contains(&pc) {
                dead = false;
            }
            if dead {
                if inst.opcode != Opcode::Nop {
                    inst.opcode = Opcode::Nop;
                    changed = true;
                }
                continue;
            }
            if inst.opcode.is_unconditional_terminator() {
                dead = true;
            }
        }

        changed
    }

    /// Remove `Box(k); Unbox(k)` and `Dup; Pop` pairs
    fn eliminate_redundant_pairs(&self, chunk: &mut CodeChunk) -> bool {
        let targets = jump_targets(chunk);
        let mut changed = false;
        let mut i = 0;

        while i + 1 < chunk.instructions.len() {
            let redundant = !targets.contains(&(i + 1))
                && match (
                    &chunk.instructions[i].opcode,
                    &chunk.instructions[i + 1].opcode,
                ) {
                    (Opcode::Box(a), Opcode::Unbox(b)) => a == b,
                    (Opcode::Dup, Opcode::Pop) => true,
                    _ => false,
                };
            if redundant {
                chunk.instructions[i].opcode = Opcode::Nop;
                chunk.instructions[i + 1].opcode = Opcode::Nop;
                changed = true;
                i += 2;
            } else {
                i += 1;
            }
        }

        changed
    }

    /// Drop no-ops and retarget jumps
    fn compact(&self, chunk: &mut CodeChunk) -> bool {
        if !chunk.instructions.iter().any(|i| i.opcode == Opcode::Nop) {
            return false;
        }

        // new_index[pc] = index of the first surviving instruction at or after pc
        let len = chunk.instructions.len();
        let mut new_index = vec![0usize; len + 1];
        let mut next = 0;
        for (pc, inst) in chunk.instructions.iter().enumerate() {
            new_index[pc] = next;
            if inst.opcode != Opcode::Nop {
                next += 1;
            }
        }
        new_index[len] = next;

        let mut compacted = Vec::with_capacity(next);
        for mut inst in chunk.instructions.drain(..) {
            if inst.opcode == Opcode::Nop {
                continue;
            }
            if let Some(target) = inst.opcode.jump_target() {
                inst.opcode.set_jump_target(new_index[target.min(len)]);
            }
            compacted.push(inst);
        }
        chunk.instructions = compacted;
        true
    }
}

fn jump_targets(chunk: &CodeChunk) -> HashSet<usize> {
    chunk
        .instructions
        .iter()
        .filter_map(|i| i.opcode.jump_target())
        .collect()
}

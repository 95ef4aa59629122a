//! The linear, register-allocated shader IR program (spec §3) plus the
//! supplemental constant pool and uniform layout (SPEC_FULL §3).

use crate::opcode::Opcode;
use crate::reg::{RegisterRef, Swizzle, WriteMask};
use smallvec::SmallVec;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Predicate {
    None,
    /// Guard the instruction's effect on the current predicate register
    /// (set by a prior `Cmp`), inverted if `negate`.
    Register { negate: bool },
}

/// A single shader IR instruction. Up to four source operands, each with
/// an independent swizzle; `write_mask` applies to the destination only.
#[derive(Debug, Clone)]
pub struct Instruction {
    pub opcode: Opcode,
    pub dst: Option<RegisterRef>,
    pub write_mask: WriteMask,
    pub src: SmallVec<[(RegisterRef, Swizzle); 4]>,
    pub predicate: Predicate,
    /// Present on `Loop`/`EndLoop`/`Break`/`Continue`/label-referencing
    /// opcodes; otherwise 0.
    pub loop_id: u32,
    pub label_id: u32,
    /// Set on `Loop` when the loop index is used as a sampler-array index
    /// or another integer index the target ISA requires to be unrolled
    /// (spec §3, boundary scenario 2).
    pub unroll: bool,
    pub source_line: u32,
}

impl Instruction {
    pub fn new(opcode: Opcode, source_line: u32) -> Instruction {
        Instruction {
            opcode,
            dst: None,
            write_mask: WriteMask::XYZW,
            src: SmallVec::new(),
            predicate: Predicate::None,
            loop_id: 0,
            label_id: 0,
            unroll: false,
            source_line,
        }
    }

    pub fn with_dst(mut self, dst: RegisterRef, mask: WriteMask) -> Instruction {
        self.dst = Some(dst);
        self.write_mask = mask;
        self
    }

    pub fn with_src(mut self, src: RegisterRef, swizzle: Swizzle) -> Instruction {
        self.src.push((src, swizzle));
        self
    }
}

/// Deduplicated pool of immediate `[f32; 4]` constant rows, addressed by
/// the `Constant` bank (bank id 0 per §6). Literal folding during lowering
/// interns rows here instead of emitting a fresh register per literal.
#[derive(Debug, Default, Clone)]
pub struct ConstantPool {
    rows: Vec<[f32; 4]>,
    index: HashMap<[u32; 4], u32>,
}

impl ConstantPool {
    pub fn intern(&mut self, row: [f32; 4]) -> u32 {
        let key = [
            row[0].to_bits(),
            row[1].to_bits(),
            row[2].to_bits(),
            row[3].to_bits(),
        ];
        if let Some(&idx) = self.index.get(&key) {
            return idx;
        }
        let idx = self.rows.len() as u32;
        self.rows.push(row);
        self.index.insert(key, idx);
        idx
    }

    pub fn rows(&self) -> &[[f32; 4]] {
        &self.rows
    }
}

/// Per-varying linkage metadata the pipeline specializer needs to wire
/// vertex outputs to pixel inputs (spec §4.3 "per-varying linkage
/// metadata").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    Smooth,
    Flat,
    Centroid,
    /// `noperspective`-equivalent: screen-space linear rather than
    /// perspective-correct.
    NoPerspective,
}

#[derive(Debug, Clone)]
pub struct VaryingSlot {
    pub name: String,
    pub location: u32,
    pub components: u8,
    pub interpolation: Interpolation,
}

/// Flattened uniform entry: nested structs/arrays-of-structs (SPEC_FULL §3)
/// are resolved to a linear list with a dotted/indexed name and a register
/// offset into the Uniform bank.
#[derive(Debug, Clone)]
pub struct UniformEntry {
    pub name: String,
    pub register_offset: u32,
    pub register_count: u32,
    /// Set to `false` by the unused-uniform pruning pass (spec §4.3); the
    /// specializer skips fetching pruned uniforms.
    pub used: bool,
}

#[derive(Debug, Default, Clone)]
pub struct UniformLayout {
    pub entries: Vec<UniformEntry>,
}

impl UniformLayout {
    pub fn total_registers(&self) -> u32 {
        self.entries.iter().map(|e| e.register_count).sum()
    }

    pub fn find(&self, name: &str) -> Option<&UniformEntry> {
        self.entries.iter().find(|e| e.name == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderKind {
    Vertex,
    Fragment,
}

/// A complete, self-contained shader IR program: it does not reference the
/// AST it was lowered from (spec §4.3).
#[derive(Debug, Clone)]
pub struct Program {
    pub kind: ShaderKind,
    pub instructions: Vec<Instruction>,
    pub constants: ConstantPool,
    pub uniforms: UniformLayout,
    pub varyings: Vec<VaryingSlot>,
    pub temp_count: u32,
    pub input_count: u32,
    pub output_count: u32,
    pub sampler_count: u32,
}

impl Program {
    pub fn new(kind: ShaderKind) -> Program {
        Program {
            kind,
            instructions: Vec::new(),
            constants: ConstantPool::default(),
            uniforms: UniformLayout::default(),
            varyings: Vec::new(),
            temp_count: 0,
            input_count: 0,
            output_count: 0,
            sampler_count: 0,
        }
    }
}

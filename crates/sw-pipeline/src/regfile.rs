//! Per-routine register storage backing the shader IR's register banks
//! (spec §3) while a `sw_shader_ir::Program` is interpreted into Reactor
//! IR. Every slot holds a `Float4` SSA value; scalar/vector shader
//! registers are always stored as a 4-wide lane group, matching the
//! source ISA's uniform register width.
//!
//! Temp and output registers are backed by an entry in the file's own
//! `NamedLocals` table, so the control-flow builders in `reactor::control`
//! can correctly materialize them at `If`/`Loop` block joins. The table is
//! owned here rather than threaded in from the caller, since every read or
//! write already goes through `RegisterFile` anyway and a borrowed-in table
//! would just be this one passed back out.

use reactor::builder::Builder;
use reactor::composite;
use reactor::ir::Type;
use reactor::lvalue::{LValueId, NamedLocals};
use reactor::value::{constant_float, Float4, RValue};
use sw_shader_ir::reg::{RegisterBank, RegisterRef, Swizzle, WriteMask};

pub struct RegisterFile {
    locals: NamedLocals,
    temp_ids: Vec<Option<LValueId>>,
    output_ids: Vec<Option<LValueId>>,
    input: Vec<RValue<Float4>>,
    uniform: Vec<RValue<Float4>>,
    constants: Vec<RValue<Float4>>,
}

impl RegisterFile {
    pub fn new(temp_count: u32, input: Vec<RValue<Float4>>, output_count: u32, uniform: Vec<RValue<Float4>>, constants: Vec<RValue<Float4>>) -> RegisterFile {
        RegisterFile {
            locals: NamedLocals::default(),
            temp_ids: vec![None; temp_count as usize],
            output_ids: vec![None; output_count as usize],
            input,
            uniform,
            constants,
        }
    }

    /// The backing `LValueTable` (wrapped in `NamedLocals`) for the
    /// interpreter's own locals, such as the `discard` flag, that live
    /// alongside the shader's temp/output registers and must materialize
    /// at the same block boundaries.
    pub fn named_locals(&mut self) -> &mut NamedLocals {
        &mut self.locals
    }

    fn zero(b: &mut Builder) -> RValue<Float4> {
        let z = constant_float(b, 0.0);
        composite::splat_float4(b, z)
    }

    /// Every currently-declared temp/output local, for the control-flow
    /// builders' `live` parameter (they must materialize every one of
    /// these at an `If`/`Loop` boundary, not just the ones the branch
    /// itself touches, since a sibling branch may have written one).
    pub fn live(&self) -> Vec<LValueId> {
        self.temp_ids.iter().chain(self.output_ids.iter()).filter_map(|id| *id).collect()
    }

    fn read_temp(&mut self, b: &mut Builder, index: u32) -> RValue<Float4> {
        if let Some(id) = self.temp_ids[index as usize] {
            return RValue::from_id(self.locals.table().read(b, id));
        }
        let zero = Self::zero(b);
        let id = self.locals.table().declare(b, Type::Float4, zero.id);
        self.temp_ids[index as usize] = Some(id);
        zero
    }

    fn read_output(&mut self, b: &mut Builder, index: u32) -> RValue<Float4> {
        if let Some(id) = self.output_ids[index as usize] {
            return RValue::from_id(self.locals.table().read(b, id));
        }
        let zero = Self::zero(b);
        let id = self.locals.table().declare(b, Type::Float4, zero.id);
        self.output_ids[index as usize] = Some(id);
        zero
    }

    pub fn read(&mut self, b: &mut Builder, r: RegisterRef, swizzle: Swizzle) -> RValue<Float4> {
        let lanes = [swizzle.lane(0), swizzle.lane(1), swizzle.lane(2), swizzle.lane(3)];
        let base = match r.bank {
            RegisterBank::Temp => self.read_temp(b, r.index),
            RegisterBank::Output => self.read_output(b, r.index),
            RegisterBank::Input => self.input[r.index as usize],
            RegisterBank::Uniform => self.uniform[r.index as usize],
            RegisterBank::Constant => self.constants[r.index as usize],
            RegisterBank::Sampler | RegisterBank::Address => {
                unreachable!("sampler/address registers are not read through RegisterFile::read")
            }
        };
        composite::swizzle(b, base, lanes[0], lanes[1], lanes[2], lanes[3])
    }

    pub fn write(&mut self, b: &mut Builder, r: RegisterRef, mask: WriteMask, value: RValue<Float4>) {
        let existing = match r.bank {
            RegisterBank::Temp => self.temp_ids[r.index as usize],
            RegisterBank::Output => self.output_ids[r.index as usize],
            _ => unreachable!("shader IR never writes the {:?} bank", r.bank),
        };

        let merged = match existing {
            Some(id) if mask != WriteMask::XYZW => {
                let current = RValue::<Float4>::from_id(self.locals.table().read(b, id));
                composite::masked_write(b, current, value, mask.bits())
            }
            _ => value,
        };

        let id = match existing {
            Some(id) => {
                self.locals.table().write(b, id, merged.id);
                id
            }
            None => self.locals.table().declare(b, Type::Float4, merged.id),
        };

        match r.bank {
            RegisterBank::Temp => self.temp_ids[r.index as usize] = Some(id),
            RegisterBank::Output => self.output_ids[r.index as usize] = Some(id),
            _ => unreachable!(),
        }
    }

    /// Snapshot of the output bank for the caller (vertex position/varyings,
    /// or the pixel shader's `gl_FragColor`), zero-filled for any output
    /// register the shader never wrote.
    pub fn outputs(&mut self, b: &mut Builder) -> Vec<RValue<Float4>> {
        (0..self.output_ids.len() as u32).map(|i| self.read_output(b, i)).collect()
    }
}

//! The shader IR binary wire format (spec §6): a little-endian sequence of
//! 32-bit words, six per instruction — a header word, a destination
//! reference word, and four source reference words (each carrying its
//! swizzle in the top byte). This format is in-memory only; nothing
//! persists it to disk, but it is what `sw-pipeline` consumes so that the
//! specializer does not need to hold a reference to `sw-glsl`'s AST types.

use crate::inst::{Instruction, Predicate};
use crate::opcode::Opcode;
use crate::reg::{RegisterRef, Swizzle, WriteMask};

const OPCODE_TABLE: &[Opcode] = &[
    Opcode::Mov,
    Opcode::Add,
    Opcode::Sub,
    Opcode::Mul,
    Opcode::Div,
    Opcode::Mad,
    Opcode::Dp2,
    Opcode::Dp3,
    Opcode::Dp4,
    Opcode::Min,
    Opcode::Max,
    Opcode::Sat,
    Opcode::Rcp,
    Opcode::Rsq,
    Opcode::Sqrt,
    Opcode::Sin,
    Opcode::Cos,
    Opcode::Exp,
    Opcode::Exp2,
    Opcode::Log,
    Opcode::Log2,
    Opcode::Floor,
    Opcode::Ceil,
    Opcode::Frac,
    Opcode::Sign,
    Opcode::Abs,
    Opcode::Neg,
    Opcode::Cmp,
    Opcode::And,
    Opcode::Or,
    Opcode::Not,
    Opcode::Xor,
    Opcode::TexldSample2D,
    Opcode::TexldSampleCube,
    Opcode::TexldSample3D,
    Opcode::TexldSampleArray,
    Opcode::If,
    Opcode::Else,
    Opcode::EndIf,
    Opcode::Loop,
    Opcode::EndLoop,
    Opcode::Break,
    Opcode::BreakC,
    Opcode::Continue,
    Opcode::ContinueC,
    Opcode::Discard,
    Opcode::Ret,
    Opcode::Label,
    Opcode::Call,
];

fn opcode_to_wire(op: Opcode) -> u8 {
    OPCODE_TABLE.iter().position(|&o| o == op).expect("opcode in table") as u8
}

fn opcode_from_wire(v: u8) -> Option<Opcode> {
    OPCODE_TABLE.get(v as usize).copied()
}

const NULL_REF: u32 = 0xFFFF_FFFF;

/// Source words carry a swizzle alongside the register reference, so they
/// can't reuse `RegisterRef::to_wire`'s full 28-bit index — the bank
/// nibble stays at bits 28..32, same position as `to_wire`, with the index
/// narrowed to 20 bits (28..8) to leave room for the swizzle in the low
/// byte.
fn src_to_wire(src: Option<&(RegisterRef, Swizzle)>) -> u32 {
    match src {
        None => NULL_REF,
        Some((r, sw)) => (((r.bank as u32) & 0xF) << 28) | ((r.index & 0x000F_FFFF) << 8) | (sw.0 as u32),
    }
}

fn src_from_wire(word: u32) -> Option<(RegisterRef, Swizzle)> {
    if word == NULL_REF {
        return None;
    }
    let swizzle = Swizzle(word as u8);
    let bank = crate::reg::RegisterBank::from_wire(((word >> 28) & 0xF) as u8)?;
    let index = (word >> 8) & 0x000F_FFFF;
    Some((RegisterRef { bank, index, rel_addr: None }, swizzle))
}

/// Destination words carry no swizzle, so they use the same `(bank:4,
/// index:28)` layout as `RegisterRef::to_wire`/`from_wire` directly.
fn dst_to_wire(dst: Option<RegisterRef>) -> u32 {
    match dst {
        None => NULL_REF,
        Some(r) => r.to_wire(),
    }
}

fn dst_from_wire(word: u32) -> Option<RegisterRef> {
    if word == NULL_REF {
        return None;
    }
    RegisterRef::from_wire(word)
}

pub fn encode(instructions: &[Instruction]) -> Vec<u32> {
    let mut words = Vec::with_capacity(instructions.len() * 6);
    for inst in instructions {
        let predicate_bits: u32 = match inst.predicate {
            Predicate::None => 0,
            Predicate::Register { negate: false } => 1,
            Predicate::Register { negate: true } => 2,
        };
        let header = (opcode_to_wire(inst.opcode) as u32)
            | ((inst.write_mask.bits() as u32) << 8)
            | (predicate_bits << 12)
            | ((inst.unroll as u32) << 16)
            | (inst.loop_id.min(0x7FF) << 17);
        words.push(header);
        words.push(dst_to_wire(inst.dst));
        for i in 0..4 {
            words.push(src_to_wire(inst.src.get(i)));
        }
    }
    words
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("truncated shader IR word stream at instruction {0}")]
    Truncated(usize),
    #[error("unknown opcode byte {0}")]
    UnknownOpcode(u8),
}

pub fn decode(words: &[u32]) -> Result<Vec<Instruction>, DecodeError> {
    let mut out = Vec::with_capacity(words.len() / 6);
    let mut i = 0usize;
    let mut idx = 0usize;
    while i < words.len() {
        if i + 6 > words.len() {
            return Err(DecodeError::Truncated(idx));
        }
        let header = words[i];
        let opcode_byte = (header & 0xFF) as u8;
        let opcode = opcode_from_wire(opcode_byte).ok_or(DecodeError::UnknownOpcode(opcode_byte))?;
        let write_mask = WriteMask::from_bits_truncate(((header >> 8) & 0xF) as u8);
        let predicate = match (header >> 12) & 0xF {
            1 => Predicate::Register { negate: false },
            2 => Predicate::Register { negate: true },
            _ => Predicate::None,
        };
        let unroll = ((header >> 16) & 1) != 0;
        let loop_id = (header >> 17) & 0x7FF;
        let dst = dst_from_wire(words[i + 1]);
        let mut src = smallvec::SmallVec::new();
        for k in 0..4 {
            if let Some(s) = src_from_wire(words[i + 2 + k]) {
                src.push(s);
            }
        }
        out.push(Instruction {
            opcode,
            dst,
            write_mask,
            src,
            predicate,
            loop_id,
            label_id: 0,
            unroll,
            source_line: 0,
        });
        i += 6;
        idx += 1;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reg::RegisterBank;

    #[test]
    fn round_trips_a_mad_instruction() {
        let inst = Instruction::new(Opcode::Mad, 12)
            .with_dst(RegisterRef::new(RegisterBank::Temp, 0), WriteMask::XYZW)
            .with_src(RegisterRef::new(RegisterBank::Input, 1), Swizzle::IDENTITY)
            .with_src(RegisterRef::new(RegisterBank::Uniform, 2), Swizzle::splat(0))
            .with_src(RegisterRef::new(RegisterBank::Temp, 3), Swizzle::IDENTITY);
        let words = encode(std::slice::from_ref(&inst));
        assert_eq!(words.len(), 6);
        let decoded = decode(&words).unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].opcode, Opcode::Mad);
        assert_eq!(decoded[0].dst, inst.dst);
        assert_eq!(decoded[0].src.len(), 3);
    }

    #[test]
    fn unroll_flag_survives_round_trip() {
        let mut inst = Instruction::new(Opcode::Loop, 0);
        inst.unroll = true;
        inst.loop_id = 5;
        let words = encode(&[inst]);
        let decoded = decode(&words).unwrap();
        assert!(decoded[0].unroll);
        assert_eq!(decoded[0].loop_id, 5);
    }

    #[test]
    fn truncated_stream_is_an_error() {
        let err = decode(&[0, 0, 0]).unwrap_err();
        assert_eq!(err, DecodeError::Truncated(0));
    }
}

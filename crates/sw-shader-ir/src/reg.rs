//! Register references and the per-source swizzle/write-mask encoding used
//! by shader IR instructions (spec §3, §6).

use bitflags::bitflags;

/// The register banks addressable by a shader IR instruction. The numeric
/// values are part of the binary wire format (§6): constant bank is 0,
/// uniform is 1, temp is 2, input 3, output 4, sampler 5, address 6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RegisterBank {
    Constant = 0,
    Uniform = 1,
    Temp = 2,
    Input = 3,
    Output = 4,
    Sampler = 5,
    Address = 6,
}

impl RegisterBank {
    pub fn from_wire(v: u8) -> Option<RegisterBank> {
        Some(match v {
            0 => RegisterBank::Constant,
            1 => RegisterBank::Uniform,
            2 => RegisterBank::Temp,
            3 => RegisterBank::Input,
            4 => RegisterBank::Output,
            5 => RegisterBank::Sampler,
            6 => RegisterBank::Address,
            _ => return None,
        })
    }
}

bitflags! {
    /// Four-bit write mask / component presence flags, one bit per lane.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct WriteMask: u8 {
        const X = 0b0001;
        const Y = 0b0010;
        const Z = 0b0100;
        const W = 0b1000;
        const XYZW = 0b1111;
    }
}

impl WriteMask {
    pub fn from_component_count(n: u8) -> WriteMask {
        WriteMask::from_bits_truncate((1u8 << n) - 1)
    }
}

/// A 2-bits-per-lane swizzle pattern packed into a byte (spec's 16-bit
/// constant is for the Reactor side, §4.4; shader IR sources only need four
/// lanes so a `u8` suffices, lane 0 in the low two bits to match the
/// instruction word layout in §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Swizzle(pub u8);

impl Swizzle {
    pub const IDENTITY: Swizzle = Swizzle(0b11_10_01_00);

    pub fn new(x: u8, y: u8, z: u8, w: u8) -> Swizzle {
        Swizzle(x | (y << 2) | (z << 4) | (w << 6))
    }

    pub fn lane(self, i: u8) -> u8 {
        (self.0 >> (i * 2)) & 0b11
    }

    pub fn splat(lane: u8) -> Swizzle {
        Swizzle::new(lane, lane, lane, lane)
    }
}

/// A reference to a single register slot within a bank, with an optional
/// relative-addressing offset register (used for dynamically-indexed
/// uniform arrays).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegisterRef {
    pub bank: RegisterBank,
    pub index: u32,
    /// Index into the Address bank providing a dynamic offset, or `None`
    /// for a statically-resolved reference.
    pub rel_addr: Option<u32>,
}

impl RegisterRef {
    pub fn new(bank: RegisterBank, index: u32) -> RegisterRef {
        RegisterRef { bank, index, rel_addr: None }
    }

    pub fn to_wire(self) -> u32 {
        let bank = (self.bank as u32) & 0xF;
        (bank << 28) | (self.index & 0x0FFF_FFFF)
    }

    pub fn from_wire(word: u32) -> Option<RegisterRef> {
        let bank = RegisterBank::from_wire(((word >> 28) & 0xF) as u8)?;
        let index = word & 0x0FFF_FFFF;
        Some(RegisterRef { bank, index, rel_addr: None })
    }
}

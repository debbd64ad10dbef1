//! ISA (instruction set architecture) implementation for the
//! [Sharp LR35902](https://en.wikipedia.org/wiki/Game_Boy) CPU.
//!
//! The primary opcode page is described by a table of 256
//! instruction descriptors; the CB page is decoded algorithmically
//! from the second opcode byte. Execution goes through a single
//! exhaustive match on the operation kind, so decoding completeness
//! is statically checked.

use std::fmt::{self, Display, Formatter};

use monoboy_common::error::Error;

use crate::{cpu::Cpu, errorln};

/// Register operands referenced by the instruction descriptors.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Reg {
    None,
    A,
    F,
    B,
    C,
    D,
    E,
    H,
    L,
    Af,
    Bc,
    De,
    Hl,
    Sp,
    Pc,
}

/// Addressing modes, controlling how the operand data and the
/// memory destination of an instruction are fetched.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AddrMode {
    Imp,
    R,
    RR,
    RD8,
    RD16,
    D8,
    D16,
    MrR,
    RMr,
    RHli,
    RHld,
    HliR,
    HldR,
    RA8,
    A8R,
    HlSpr,
    D16R,
    MrD8,
    Mr,
    A16R,
    RA16,
}

/// Operation kinds of the primary opcode page. The CB page
/// operations are selected by the second opcode byte instead.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Kind {
    Nop,
    Ld,
    Ldh,
    Inc,
    Dec,
    Add,
    Adc,
    Sub,
    Sbc,
    And,
    Xor,
    Or,
    Cp,
    Rlca,
    Rrca,
    Rla,
    Rra,
    Daa,
    Cpl,
    Scf,
    Ccf,
    Jp,
    Jr,
    Call,
    Ret,
    Reti,
    Rst,
    Push,
    Pop,
    Cb,
    Di,
    Ei,
    Halt,
    Stop,
    Err,
}

impl Kind {
    pub fn name(&self) -> &'static str {
        match self {
            Kind::Nop => "NOP",
            Kind::Ld => "LD",
            Kind::Ldh => "LDH",
            Kind::Inc => "INC",
            Kind::Dec => "DEC",
            Kind::Add => "ADD",
            Kind::Adc => "ADC",
            Kind::Sub => "SUB",
            Kind::Sbc => "SBC",
            Kind::And => "AND",
            Kind::Xor => "XOR",
            Kind::Or => "OR",
            Kind::Cp => "CP",
            Kind::Rlca => "RLCA",
            Kind::Rrca => "RRCA",
            Kind::Rla => "RLA",
            Kind::Rra => "RRA",
            Kind::Daa => "DAA",
            Kind::Cpl => "CPL",
            Kind::Scf => "SCF",
            Kind::Ccf => "CCF",
            Kind::Jp => "JP",
            Kind::Jr => "JR",
            Kind::Call => "CALL",
            Kind::Ret => "RET",
            Kind::Reti => "RETI",
            Kind::Rst => "RST",
            Kind::Push => "PUSH",
            Kind::Pop => "POP",
            Kind::Cb => "CB",
            Kind::Di => "DI",
            Kind::Ei => "EI",
            Kind::Halt => "HALT",
            Kind::Stop => "STOP",
            Kind::Err => "ERR",
        }
    }
}

/// Jump/call/return condition encoded in the opcode.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Cond {
    None,
    Nz,
    Z,
    Nc,
    C,
}

/// Descriptor of a primary page instruction: what it does, how
/// its operands are fetched and an auxiliary parameter (the RST
/// target address).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub kind: Kind,
    pub mode: AddrMode,
    pub reg1: Reg,
    pub reg2: Reg,
    pub cond: Cond,
    pub param: u8,
}

impl Instruction {
    pub const fn new(kind: Kind, mode: AddrMode, reg1: Reg, reg2: Reg, cond: Cond, param: u8) -> Self {
        Self {
            kind,
            mode,
            reg1,
            reg2,
            cond,
            param,
        }
    }

    const fn imp(kind: Kind) -> Self {
        Self::new(kind, AddrMode::Imp, Reg::None, Reg::None, Cond::None, 0)
    }

    const fn r(kind: Kind, reg1: Reg) -> Self {
        Self::new(kind, AddrMode::R, reg1, Reg::None, Cond::None, 0)
    }

    const fn rr(kind: Kind, reg1: Reg, reg2: Reg) -> Self {
        Self::new(kind, AddrMode::RR, reg1, reg2, Cond::None, 0)
    }

    const fn r_d8(kind: Kind, reg1: Reg) -> Self {
        Self::new(kind, AddrMode::RD8, reg1, Reg::None, Cond::None, 0)
    }

    const fn r_d16(kind: Kind, reg1: Reg) -> Self {
        Self::new(kind, AddrMode::RD16, reg1, Reg::None, Cond::None, 0)
    }

    const fn mr_r(kind: Kind, reg1: Reg, reg2: Reg) -> Self {
        Self::new(kind, AddrMode::MrR, reg1, reg2, Cond::None, 0)
    }

    const fn r_mr(kind: Kind, reg1: Reg, reg2: Reg) -> Self {
        Self::new(kind, AddrMode::RMr, reg1, reg2, Cond::None, 0)
    }

    const fn mr(kind: Kind, reg1: Reg) -> Self {
        Self::new(kind, AddrMode::Mr, reg1, Reg::None, Cond::None, 0)
    }

    const fn mr_d8(kind: Kind, reg1: Reg) -> Self {
        Self::new(kind, AddrMode::MrD8, reg1, Reg::None, Cond::None, 0)
    }

    const fn d8(kind: Kind, cond: Cond) -> Self {
        Self::new(kind, AddrMode::D8, Reg::None, Reg::None, cond, 0)
    }

    const fn d16(kind: Kind, cond: Cond) -> Self {
        Self::new(kind, AddrMode::D16, Reg::None, Reg::None, cond, 0)
    }

    const fn a8_r(kind: Kind, reg2: Reg) -> Self {
        Self::new(kind, AddrMode::A8R, Reg::None, reg2, Cond::None, 0)
    }

    const fn r_a8(kind: Kind, reg1: Reg) -> Self {
        Self::new(kind, AddrMode::RA8, reg1, Reg::None, Cond::None, 0)
    }

    const fn a16_r(kind: Kind, reg2: Reg) -> Self {
        Self::new(kind, AddrMode::A16R, Reg::None, reg2, Cond::None, 0)
    }

    const fn r_a16(kind: Kind, reg1: Reg) -> Self {
        Self::new(kind, AddrMode::RA16, reg1, Reg::None, Cond::None, 0)
    }

    const fn cond_imp(kind: Kind, cond: Cond) -> Self {
        Self::new(kind, AddrMode::Imp, Reg::None, Reg::None, cond, 0)
    }

    const fn push(reg1: Reg) -> Self {
        Self::new(Kind::Push, AddrMode::Imp, reg1, Reg::None, Cond::None, 0)
    }

    const fn pop(reg1: Reg) -> Self {
        Self::new(Kind::Pop, AddrMode::Imp, reg1, Reg::None, Cond::None, 0)
    }

    const fn rst(param: u8) -> Self {
        Self::new(Kind::Rst, AddrMode::Imp, Reg::None, Reg::None, Cond::None, param)
    }

    const fn err() -> Self {
        Self::imp(Kind::Err)
    }
}

impl Display for Instruction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.mode {
            AddrMode::Imp => match self.kind {
                Kind::Push | Kind::Pop => write!(f, "{} {:?}", self.kind.name(), self.reg1),
                Kind::Rst => write!(f, "{} {:02x}h", self.kind.name(), self.param),
                Kind::Ret if self.cond != Cond::None => {
                    write!(f, "{} {:?}", self.kind.name(), self.cond)
                }
                _ => write!(f, "{}", self.kind.name()),
            },
            AddrMode::R | AddrMode::RD8 | AddrMode::RD16 | AddrMode::RA8 | AddrMode::RA16 => {
                write!(f, "{} {:?}", self.kind.name(), self.reg1)
            }
            AddrMode::RR | AddrMode::HlSpr => {
                write!(f, "{} {:?}, {:?}", self.kind.name(), self.reg1, self.reg2)
            }
            AddrMode::MrR => write!(f, "{} [{:?}], {:?}", self.kind.name(), self.reg1, self.reg2),
            AddrMode::RMr => write!(f, "{} {:?}, [{:?}]", self.kind.name(), self.reg1, self.reg2),
            AddrMode::RHli => write!(f, "{} {:?}, [HL+]", self.kind.name(), self.reg1),
            AddrMode::RHld => write!(f, "{} {:?}, [HL-]", self.kind.name(), self.reg1),
            AddrMode::HliR => write!(f, "{} [HL+], {:?}", self.kind.name(), self.reg2),
            AddrMode::HldR => write!(f, "{} [HL-], {:?}", self.kind.name(), self.reg2),
            AddrMode::A8R | AddrMode::A16R | AddrMode::D16R => {
                write!(f, "{} [a], {:?}", self.kind.name(), self.reg2)
            }
            AddrMode::Mr | AddrMode::MrD8 => write!(f, "{} [{:?}]", self.kind.name(), self.reg1),
            AddrMode::D8 | AddrMode::D16 => {
                if self.cond == Cond::None {
                    write!(f, "{}", self.kind.name())
                } else {
                    write!(f, "{} {:?}", self.kind.name(), self.cond)
                }
            }
        }
    }
}

/// The primary instruction table, mapping each of the 256 opcode
/// bytes to its descriptor.
pub static INSTRUCTIONS: [Instruction; 256] = [
    // 0x0 opcodes
    Instruction::imp(Kind::Nop),
    Instruction::r_d16(Kind::Ld, Reg::Bc),
    Instruction::mr_r(Kind::Ld, Reg::Bc, Reg::A),
    Instruction::r(Kind::Inc, Reg::Bc),
    Instruction::r(Kind::Inc, Reg::B),
    Instruction::r(Kind::Dec, Reg::B),
    Instruction::r_d8(Kind::Ld, Reg::B),
    Instruction::imp(Kind::Rlca),
    Instruction::a16_r(Kind::Ld, Reg::Sp),
    Instruction::rr(Kind::Add, Reg::Hl, Reg::Bc),
    Instruction::r_mr(Kind::Ld, Reg::A, Reg::Bc),
    Instruction::r(Kind::Dec, Reg::Bc),
    Instruction::r(Kind::Inc, Reg::C),
    Instruction::r(Kind::Dec, Reg::C),
    Instruction::r_d8(Kind::Ld, Reg::C),
    Instruction::imp(Kind::Rrca),
    // 0x1 opcodes
    Instruction::imp(Kind::Stop),
    Instruction::r_d16(Kind::Ld, Reg::De),
    Instruction::mr_r(Kind::Ld, Reg::De, Reg::A),
    Instruction::r(Kind::Inc, Reg::De),
    Instruction::r(Kind::Inc, Reg::D),
    Instruction::r(Kind::Dec, Reg::D),
    Instruction::r_d8(Kind::Ld, Reg::D),
    Instruction::imp(Kind::Rla),
    Instruction::d8(Kind::Jr, Cond::None),
    Instruction::rr(Kind::Add, Reg::Hl, Reg::De),
    Instruction::r_mr(Kind::Ld, Reg::A, Reg::De),
    Instruction::r(Kind::Dec, Reg::De),
    Instruction::r(Kind::Inc, Reg::E),
    Instruction::r(Kind::Dec, Reg::E),
    Instruction::r_d8(Kind::Ld, Reg::E),
    Instruction::imp(Kind::Rra),
    // 0x2 opcodes
    Instruction::d8(Kind::Jr, Cond::Nz),
    Instruction::r_d16(Kind::Ld, Reg::Hl),
    Instruction::new(Kind::Ld, AddrMode::HliR, Reg::Hl, Reg::A, Cond::None, 0),
    Instruction::r(Kind::Inc, Reg::Hl),
    Instruction::r(Kind::Inc, Reg::H),
    Instruction::r(Kind::Dec, Reg::H),
    Instruction::r_d8(Kind::Ld, Reg::H),
    Instruction::imp(Kind::Daa),
    Instruction::d8(Kind::Jr, Cond::Z),
    Instruction::rr(Kind::Add, Reg::Hl, Reg::Hl),
    Instruction::new(Kind::Ld, AddrMode::RHli, Reg::A, Reg::Hl, Cond::None, 0),
    Instruction::r(Kind::Dec, Reg::Hl),
    Instruction::r(Kind::Inc, Reg::L),
    Instruction::r(Kind::Dec, Reg::L),
    Instruction::r_d8(Kind::Ld, Reg::L),
    Instruction::imp(Kind::Cpl),
    // 0x3 opcodes
    Instruction::d8(Kind::Jr, Cond::Nc),
    Instruction::r_d16(Kind::Ld, Reg::Sp),
    Instruction::new(Kind::Ld, AddrMode::HldR, Reg::Hl, Reg::A, Cond::None, 0),
    Instruction::r(Kind::Inc, Reg::Sp),
    Instruction::mr(Kind::Inc, Reg::Hl),
    Instruction::mr(Kind::Dec, Reg::Hl),
    Instruction::mr_d8(Kind::Ld, Reg::Hl),
    Instruction::imp(Kind::Scf),
    Instruction::d8(Kind::Jr, Cond::C),
    Instruction::rr(Kind::Add, Reg::Hl, Reg::Sp),
    Instruction::new(Kind::Ld, AddrMode::RHld, Reg::A, Reg::Hl, Cond::None, 0),
    Instruction::r(Kind::Dec, Reg::Sp),
    Instruction::r(Kind::Inc, Reg::A),
    Instruction::r(Kind::Dec, Reg::A),
    Instruction::r_d8(Kind::Ld, Reg::A),
    Instruction::imp(Kind::Ccf),
    // 0x4 opcodes
    Instruction::rr(Kind::Ld, Reg::B, Reg::B),
    Instruction::rr(Kind::Ld, Reg::B, Reg::C),
    Instruction::rr(Kind::Ld, Reg::B, Reg::D),
    Instruction::rr(Kind::Ld, Reg::B, Reg::E),
    Instruction::rr(Kind::Ld, Reg::B, Reg::H),
    Instruction::rr(Kind::Ld, Reg::B, Reg::L),
    Instruction::r_mr(Kind::Ld, Reg::B, Reg::Hl),
    Instruction::rr(Kind::Ld, Reg::B, Reg::A),
    Instruction::rr(Kind::Ld, Reg::C, Reg::B),
    Instruction::rr(Kind::Ld, Reg::C, Reg::C),
    Instruction::rr(Kind::Ld, Reg::C, Reg::D),
    Instruction::rr(Kind::Ld, Reg::C, Reg::E),
    Instruction::rr(Kind::Ld, Reg::C, Reg::H),
    Instruction::rr(Kind::Ld, Reg::C, Reg::L),
    Instruction::r_mr(Kind::Ld, Reg::C, Reg::Hl),
    Instruction::rr(Kind::Ld, Reg::C, Reg::A),
    // 0x5 opcodes
    Instruction::rr(Kind::Ld, Reg::D, Reg::B),
    Instruction::rr(Kind::Ld, Reg::D, Reg::C),
    Instruction::rr(Kind::Ld, Reg::D, Reg::D),
    Instruction::rr(Kind::Ld, Reg::D, Reg::E),
    Instruction::rr(Kind::Ld, Reg::D, Reg::H),
    Instruction::rr(Kind::Ld, Reg::D, Reg::L),
    Instruction::r_mr(Kind::Ld, Reg::D, Reg::Hl),
    Instruction::rr(Kind::Ld, Reg::D, Reg::A),
    Instruction::rr(Kind::Ld, Reg::E, Reg::B),
    Instruction::rr(Kind::Ld, Reg::E, Reg::C),
    Instruction::rr(Kind::Ld, Reg::E, Reg::D),
    Instruction::rr(Kind::Ld, Reg::E, Reg::E),
    Instruction::rr(Kind::Ld, Reg::E, Reg::H),
    Instruction::rr(Kind::Ld, Reg::E, Reg::L),
    Instruction::r_mr(Kind::Ld, Reg::E, Reg::Hl),
    Instruction::rr(Kind::Ld, Reg::E, Reg::A),
    // 0x6 opcodes
    Instruction::rr(Kind::Ld, Reg::H, Reg::B),
    Instruction::rr(Kind::Ld, Reg::H, Reg::C),
    Instruction::rr(Kind::Ld, Reg::H, Reg::D),
    Instruction::rr(Kind::Ld, Reg::H, Reg::E),
    Instruction::rr(Kind::Ld, Reg::H, Reg::H),
    Instruction::rr(Kind::Ld, Reg::H, Reg::L),
    Instruction::r_mr(Kind::Ld, Reg::H, Reg::Hl),
    Instruction::rr(Kind::Ld, Reg::H, Reg::A),
    Instruction::rr(Kind::Ld, Reg::L, Reg::B),
    Instruction::rr(Kind::Ld, Reg::L, Reg::C),
    Instruction::rr(Kind::Ld, Reg::L, Reg::D),
    Instruction::rr(Kind::Ld, Reg::L, Reg::E),
    Instruction::rr(Kind::Ld, Reg::L, Reg::H),
    Instruction::rr(Kind::Ld, Reg::L, Reg::L),
    Instruction::r_mr(Kind::Ld, Reg::L, Reg::Hl),
    Instruction::rr(Kind::Ld, Reg::L, Reg::A),
    // 0x7 opcodes
    Instruction::mr_r(Kind::Ld, Reg::Hl, Reg::B),
    Instruction::mr_r(Kind::Ld, Reg::Hl, Reg::C),
    Instruction::mr_r(Kind::Ld, Reg::Hl, Reg::D),
    Instruction::mr_r(Kind::Ld, Reg::Hl, Reg::E),
    Instruction::mr_r(Kind::Ld, Reg::Hl, Reg::H),
    Instruction::mr_r(Kind::Ld, Reg::Hl, Reg::L),
    Instruction::imp(Kind::Halt),
    Instruction::mr_r(Kind::Ld, Reg::Hl, Reg::A),
    Instruction::rr(Kind::Ld, Reg::A, Reg::B),
    Instruction::rr(Kind::Ld, Reg::A, Reg::C),
    Instruction::rr(Kind::Ld, Reg::A, Reg::D),
    Instruction::rr(Kind::Ld, Reg::A, Reg::E),
    Instruction::rr(Kind::Ld, Reg::A, Reg::H),
    Instruction::rr(Kind::Ld, Reg::A, Reg::L),
    Instruction::r_mr(Kind::Ld, Reg::A, Reg::Hl),
    Instruction::rr(Kind::Ld, Reg::A, Reg::A),
    // 0x8 opcodes
    Instruction::rr(Kind::Add, Reg::A, Reg::B),
    Instruction::rr(Kind::Add, Reg::A, Reg::C),
    Instruction::rr(Kind::Add, Reg::A, Reg::D),
    Instruction::rr(Kind::Add, Reg::A, Reg::E),
    Instruction::rr(Kind::Add, Reg::A, Reg::H),
    Instruction::rr(Kind::Add, Reg::A, Reg::L),
    Instruction::r_mr(Kind::Add, Reg::A, Reg::Hl),
    Instruction::rr(Kind::Add, Reg::A, Reg::A),
    Instruction::rr(Kind::Adc, Reg::A, Reg::B),
    Instruction::rr(Kind::Adc, Reg::A, Reg::C),
    Instruction::rr(Kind::Adc, Reg::A, Reg::D),
    Instruction::rr(Kind::Adc, Reg::A, Reg::E),
    Instruction::rr(Kind::Adc, Reg::A, Reg::H),
    Instruction::rr(Kind::Adc, Reg::A, Reg::L),
    Instruction::r_mr(Kind::Adc, Reg::A, Reg::Hl),
    Instruction::rr(Kind::Adc, Reg::A, Reg::A),
    // 0x9 opcodes
    Instruction::rr(Kind::Sub, Reg::A, Reg::B),
    Instruction::rr(Kind::Sub, Reg::A, Reg::C),
    Instruction::rr(Kind::Sub, Reg::A, Reg::D),
    Instruction::rr(Kind::Sub, Reg::A, Reg::E),
    Instruction::rr(Kind::Sub, Reg::A, Reg::H),
    Instruction::rr(Kind::Sub, Reg::A, Reg::L),
    Instruction::r_mr(Kind::Sub, Reg::A, Reg::Hl),
    Instruction::rr(Kind::Sub, Reg::A, Reg::A),
    Instruction::rr(Kind::Sbc, Reg::A, Reg::B),
    Instruction::rr(Kind::Sbc, Reg::A, Reg::C),
    Instruction::rr(Kind::Sbc, Reg::A, Reg::D),
    Instruction::rr(Kind::Sbc, Reg::A, Reg::E),
    Instruction::rr(Kind::Sbc, Reg::A, Reg::H),
    Instruction::rr(Kind::Sbc, Reg::A, Reg::L),
    Instruction::r_mr(Kind::Sbc, Reg::A, Reg::Hl),
    Instruction::rr(Kind::Sbc, Reg::A, Reg::A),
    // 0xA opcodes
    Instruction::rr(Kind::And, Reg::A, Reg::B),
    Instruction::rr(Kind::And, Reg::A, Reg::C),
    Instruction::rr(Kind::And, Reg::A, Reg::D),
    Instruction::rr(Kind::And, Reg::A, Reg::E),
    Instruction::rr(Kind::And, Reg::A, Reg::H),
    Instruction::rr(Kind::And, Reg::A, Reg::L),
    Instruction::r_mr(Kind::And, Reg::A, Reg::Hl),
    Instruction::rr(Kind::And, Reg::A, Reg::A),
    Instruction::rr(Kind::Xor, Reg::A, Reg::B),
    Instruction::rr(Kind::Xor, Reg::A, Reg::C),
    Instruction::rr(Kind::Xor, Reg::A, Reg::D),
    Instruction::rr(Kind::Xor, Reg::A, Reg::E),
    Instruction::rr(Kind::Xor, Reg::A, Reg::H),
    Instruction::rr(Kind::Xor, Reg::A, Reg::L),
    Instruction::r_mr(Kind::Xor, Reg::A, Reg::Hl),
    Instruction::rr(Kind::Xor, Reg::A, Reg::A),
    // 0xB opcodes
    Instruction::rr(Kind::Or, Reg::A, Reg::B),
    Instruction::rr(Kind::Or, Reg::A, Reg::C),
    Instruction::rr(Kind::Or, Reg::A, Reg::D),
    Instruction::rr(Kind::Or, Reg::A, Reg::E),
    Instruction::rr(Kind::Or, Reg::A, Reg::H),
    Instruction::rr(Kind::Or, Reg::A, Reg::L),
    Instruction::r_mr(Kind::Or, Reg::A, Reg::Hl),
    Instruction::rr(Kind::Or, Reg::A, Reg::A),
    Instruction::rr(Kind::Cp, Reg::A, Reg::B),
    Instruction::rr(Kind::Cp, Reg::A, Reg::C),
    Instruction::rr(Kind::Cp, Reg::A, Reg::D),
    Instruction::rr(Kind::Cp, Reg::A, Reg::E),
    Instruction::rr(Kind::Cp, Reg::A, Reg::H),
    Instruction::rr(Kind::Cp, Reg::A, Reg::L),
    Instruction::r_mr(Kind::Cp, Reg::A, Reg::Hl),
    Instruction::rr(Kind::Cp, Reg::A, Reg::A),
    // 0xC opcodes
    Instruction::cond_imp(Kind::Ret, Cond::Nz),
    Instruction::pop(Reg::Bc),
    Instruction::d16(Kind::Jp, Cond::Nz),
    Instruction::d16(Kind::Jp, Cond::None),
    Instruction::d16(Kind::Call, Cond::Nz),
    Instruction::push(Reg::Bc),
    Instruction::r_d8(Kind::Add, Reg::A),
    Instruction::rst(0x00),
    Instruction::cond_imp(Kind::Ret, Cond::Z),
    Instruction::imp(Kind::Ret),
    Instruction::d16(Kind::Jp, Cond::Z),
    Instruction::d8(Kind::Cb, Cond::None),
    Instruction::d16(Kind::Call, Cond::Z),
    Instruction::d16(Kind::Call, Cond::None),
    Instruction::r_d8(Kind::Adc, Reg::A),
    Instruction::rst(0x08),
    // 0xD opcodes
    Instruction::cond_imp(Kind::Ret, Cond::Nc),
    Instruction::pop(Reg::De),
    Instruction::d16(Kind::Jp, Cond::Nc),
    Instruction::err(),
    Instruction::d16(Kind::Call, Cond::Nc),
    Instruction::push(Reg::De),
    Instruction::r_d8(Kind::Sub, Reg::A),
    Instruction::rst(0x10),
    Instruction::cond_imp(Kind::Ret, Cond::C),
    Instruction::imp(Kind::Reti),
    Instruction::d16(Kind::Jp, Cond::C),
    Instruction::err(),
    Instruction::d16(Kind::Call, Cond::C),
    Instruction::err(),
    Instruction::r_d8(Kind::Sbc, Reg::A),
    Instruction::rst(0x18),
    // 0xE opcodes
    Instruction::a8_r(Kind::Ldh, Reg::A),
    Instruction::pop(Reg::Hl),
    Instruction::mr_r(Kind::Ld, Reg::C, Reg::A),
    Instruction::err(),
    Instruction::err(),
    Instruction::push(Reg::Hl),
    Instruction::r_d8(Kind::And, Reg::A),
    Instruction::rst(0x20),
    Instruction::r_d8(Kind::Add, Reg::Sp),
    Instruction::r(Kind::Jp, Reg::Hl),
    Instruction::a16_r(Kind::Ld, Reg::A),
    Instruction::err(),
    Instruction::err(),
    Instruction::err(),
    Instruction::r_d8(Kind::Xor, Reg::A),
    Instruction::rst(0x28),
    // 0xF opcodes
    Instruction::r_a8(Kind::Ldh, Reg::A),
    Instruction::pop(Reg::Af),
    Instruction::r_mr(Kind::Ld, Reg::A, Reg::C),
    Instruction::imp(Kind::Di),
    Instruction::err(),
    Instruction::push(Reg::Af),
    Instruction::r_d8(Kind::Or, Reg::A),
    Instruction::rst(0x30),
    Instruction::new(Kind::Ld, AddrMode::HlSpr, Reg::Hl, Reg::Sp, Cond::None, 0),
    Instruction::rr(Kind::Ld, Reg::Sp, Reg::Hl),
    Instruction::r_a16(Kind::Ld, Reg::A),
    Instruction::imp(Kind::Ei),
    Instruction::err(),
    Instruction::err(),
    Instruction::r_d8(Kind::Cp, Reg::A),
    Instruction::rst(0x38),
];

pub fn is_16bit(reg: Reg) -> bool {
    matches!(
        reg,
        Reg::Af | Reg::Bc | Reg::De | Reg::Hl | Reg::Sp | Reg::Pc
    )
}

/// Executes the instruction currently latched in the CPU, with
/// one exhaustive match over the complete set of operation kinds.
pub fn execute(cpu: &mut Cpu) -> Result<(), Error> {
    match cpu.inst().kind {
        Kind::Nop => (),
        Kind::Ld => ld(cpu),
        Kind::Ldh => ldh(cpu),
        Kind::Inc => inc(cpu),
        Kind::Dec => dec(cpu),
        Kind::Add => add(cpu),
        Kind::Adc => adc(cpu),
        Kind::Sub => sub(cpu),
        Kind::Sbc => sbc(cpu),
        Kind::And => and(cpu),
        Kind::Xor => xor(cpu),
        Kind::Or => or(cpu),
        Kind::Cp => cp(cpu),
        Kind::Rlca => rlca(cpu),
        Kind::Rrca => rrca(cpu),
        Kind::Rla => rla(cpu),
        Kind::Rra => rra(cpu),
        Kind::Daa => daa(cpu),
        Kind::Cpl => cpl(cpu),
        Kind::Scf => scf(cpu),
        Kind::Ccf => ccf(cpu),
        Kind::Jp => jp(cpu),
        Kind::Jr => jr(cpu),
        Kind::Call => call(cpu),
        Kind::Ret => ret(cpu),
        Kind::Reti => reti(cpu),
        Kind::Rst => rst(cpu),
        Kind::Push => push(cpu),
        Kind::Pop => pop(cpu),
        Kind::Cb => cb(cpu),
        Kind::Di => di(cpu),
        Kind::Ei => ei(cpu),
        Kind::Halt => halt(cpu),
        Kind::Stop => (),
        Kind::Err => {
            errorln!(
                "Invalid opcode 0x{:02x} at 0x{:04x}",
                cpu.opcode(),
                cpu.ppc
            );
            return Err(Error::InvalidOpcode(cpu.ppc, cpu.opcode()));
        }
    }
    Ok(())
}

fn ld(cpu: &mut Cpu) {
    let inst = cpu.inst();

    // LD HL, SP + e8 computes a signed addition with the flags
    // of the low byte addition
    if inst.mode == AddrMode::HlSpr {
        let sp = cpu.sp;
        let offset = cpu.fetched_data() as u8;
        cpu.set_zero(false);
        cpu.set_sub(false);
        cpu.set_half_carry((sp & 0x0f) + (offset as u16 & 0x0f) > 0x0f);
        cpu.set_carry((sp & 0xff) + (offset as u16) > 0xff);
        cpu.set_hl(sp.wrapping_add(offset as i8 as u16));
        cpu.tick_m(1);
        return;
    }

    if cpu.dest_is_mem() {
        let dest = cpu.mem_dest();
        let data = cpu.fetched_data();
        if is_16bit(inst.reg2) {
            // LD [a16], SP writes both bytes
            cpu.write_cycle(dest, data as u8);
            cpu.write_cycle(dest.wrapping_add(1), (data >> 8) as u8);
        } else {
            cpu.write_cycle(dest, data as u8);
        }
        return;
    }

    let data = cpu.fetched_data();
    cpu.set_reg(inst.reg1, data);

    // LD SP, HL takes an extra internal machine cycle
    if inst.mode == AddrMode::RR && is_16bit(inst.reg1) {
        cpu.tick_m(1);
    }
}

fn ldh(cpu: &mut Cpu) {
    if cpu.dest_is_mem() {
        let dest = cpu.mem_dest();
        let data = cpu.a;
        cpu.write_cycle(dest, data);
    } else {
        let addr = 0xff00 | cpu.fetched_data();
        let byte = cpu.read_cycle(addr);
        cpu.a = byte;
    }
}

fn inc(cpu: &mut Cpu) {
    let inst = cpu.inst();

    if inst.mode == AddrMode::Mr {
        let addr = cpu.hl();
        let value = cpu.fetched_data() as u8;
        let result = value.wrapping_add(1);
        cpu.write_cycle(addr, result);
        cpu.set_zero(result == 0);
        cpu.set_sub(false);
        cpu.set_half_carry(value & 0x0f == 0x0f);
        return;
    }

    if is_16bit(inst.reg1) {
        let value = cpu.read_reg(inst.reg1);
        cpu.set_reg(inst.reg1, value.wrapping_add(1));
        cpu.tick_m(1);
        return;
    }

    let value = cpu.read_reg(inst.reg1) as u8;
    let result = value.wrapping_add(1);
    cpu.set_reg(inst.reg1, result as u16);
    cpu.set_zero(result == 0);
    cpu.set_sub(false);
    cpu.set_half_carry(value & 0x0f == 0x0f);
}

fn dec(cpu: &mut Cpu) {
    let inst = cpu.inst();

    if inst.mode == AddrMode::Mr {
        let addr = cpu.hl();
        let value = cpu.fetched_data() as u8;
        let result = value.wrapping_sub(1);
        cpu.write_cycle(addr, result);
        cpu.set_zero(result == 0);
        cpu.set_sub(true);
        cpu.set_half_carry(value & 0x0f == 0x00);
        return;
    }

    if is_16bit(inst.reg1) {
        let value = cpu.read_reg(inst.reg1);
        cpu.set_reg(inst.reg1, value.wrapping_sub(1));
        cpu.tick_m(1);
        return;
    }

    let value = cpu.read_reg(inst.reg1) as u8;
    let result = value.wrapping_sub(1);
    cpu.set_reg(inst.reg1, result as u16);
    cpu.set_zero(result == 0);
    cpu.set_sub(true);
    cpu.set_half_carry(value & 0x0f == 0x00);
}

fn add(cpu: &mut Cpu) {
    let inst = cpu.inst();

    // ADD SP, e8: signed addition, flags from the low byte
    if inst.reg1 == Reg::Sp {
        let sp = cpu.sp;
        let offset = cpu.fetched_data() as u8;
        cpu.set_zero(false);
        cpu.set_sub(false);
        cpu.set_half_carry((sp & 0x0f) + (offset as u16 & 0x0f) > 0x0f);
        cpu.set_carry((sp & 0xff) + (offset as u16) > 0xff);
        cpu.sp = sp.wrapping_add(offset as i8 as u16);
        cpu.tick_m(2);
        return;
    }

    // ADD HL, rr: 16 bit addition, zero flag preserved
    if is_16bit(inst.reg1) {
        let hl = cpu.hl();
        let value = cpu.fetched_data();
        let result = hl as u32 + value as u32;
        cpu.set_sub(false);
        cpu.set_half_carry((hl & 0x0fff) + (value & 0x0fff) > 0x0fff);
        cpu.set_carry(result > 0xffff);
        cpu.set_hl(result as u16);
        cpu.tick_m(1);
        return;
    }

    let a = cpu.a;
    let value = cpu.fetched_data() as u8;
    let result = a as u16 + value as u16;
    cpu.a = result as u8;
    cpu.set_zero(result as u8 == 0);
    cpu.set_sub(false);
    cpu.set_half_carry((a & 0x0f) + (value & 0x0f) > 0x0f);
    cpu.set_carry(result > 0xff);
}

fn adc(cpu: &mut Cpu) {
    let a = cpu.a;
    let value = cpu.fetched_data() as u8;
    let carry = cpu.carry() as u8;
    let result = a as u16 + value as u16 + carry as u16;
    cpu.a = result as u8;
    cpu.set_zero(result as u8 == 0);
    cpu.set_sub(false);
    cpu.set_half_carry((a & 0x0f) + (value & 0x0f) + carry > 0x0f);
    cpu.set_carry(result > 0xff);
}

fn sub(cpu: &mut Cpu) {
    let a = cpu.a;
    let value = cpu.fetched_data() as u8;
    let result = a.wrapping_sub(value);
    cpu.a = result;
    cpu.set_zero(result == 0);
    cpu.set_sub(true);
    cpu.set_half_carry(a & 0x0f < value & 0x0f);
    cpu.set_carry(a < value);
}

fn sbc(cpu: &mut Cpu) {
    let a = cpu.a;
    let value = cpu.fetched_data() as u8;
    let carry = cpu.carry() as u8;
    let result = a.wrapping_sub(value).wrapping_sub(carry);
    cpu.a = result;
    cpu.set_zero(result == 0);
    cpu.set_sub(true);
    cpu.set_half_carry((a & 0x0f) < (value & 0x0f) + carry);
    cpu.set_carry((a as u16) < value as u16 + carry as u16);
}

fn and(cpu: &mut Cpu) {
    cpu.a &= cpu.fetched_data() as u8;
    let result = cpu.a;
    cpu.set_zero(result == 0);
    cpu.set_sub(false);
    cpu.set_half_carry(true);
    cpu.set_carry(false);
}

fn xor(cpu: &mut Cpu) {
    cpu.a ^= cpu.fetched_data() as u8;
    let result = cpu.a;
    cpu.set_zero(result == 0);
    cpu.set_sub(false);
    cpu.set_half_carry(false);
    cpu.set_carry(false);
}

fn or(cpu: &mut Cpu) {
    cpu.a |= cpu.fetched_data() as u8;
    let result = cpu.a;
    cpu.set_zero(result == 0);
    cpu.set_sub(false);
    cpu.set_half_carry(false);
    cpu.set_carry(false);
}

fn cp(cpu: &mut Cpu) {
    let a = cpu.a;
    let value = cpu.fetched_data() as u8;
    cpu.set_zero(a == value);
    cpu.set_sub(true);
    cpu.set_half_carry(a & 0x0f < value & 0x0f);
    cpu.set_carry(a < value);
}

fn rlca(cpu: &mut Cpu) {
    let carry = cpu.a >> 7;
    cpu.a = (cpu.a << 1) | carry;
    cpu.set_zero(false);
    cpu.set_sub(false);
    cpu.set_half_carry(false);
    cpu.set_carry(carry == 1);
}

fn rrca(cpu: &mut Cpu) {
    let carry = cpu.a & 0x01;
    cpu.a = (cpu.a >> 1) | (carry << 7);
    cpu.set_zero(false);
    cpu.set_sub(false);
    cpu.set_half_carry(false);
    cpu.set_carry(carry == 1);
}

fn rla(cpu: &mut Cpu) {
    let carry = cpu.a >> 7;
    cpu.a = (cpu.a << 1) | cpu.carry() as u8;
    cpu.set_zero(false);
    cpu.set_sub(false);
    cpu.set_half_carry(false);
    cpu.set_carry(carry == 1);
}

fn rra(cpu: &mut Cpu) {
    let carry = cpu.a & 0x01;
    cpu.a = (cpu.a >> 1) | ((cpu.carry() as u8) << 7);
    cpu.set_zero(false);
    cpu.set_sub(false);
    cpu.set_half_carry(false);
    cpu.set_carry(carry == 1);
}

/// Decimal adjusts the accumulator after a BCD addition or
/// subtraction, driven by the N, H and C flags.
fn daa(cpu: &mut Cpu) {
    let mut a = cpu.a;

    if !cpu.sub() {
        if cpu.carry() || a > 0x99 {
            a = a.wrapping_add(0x60);
            cpu.set_carry(true);
        }
        if cpu.half_carry() || a & 0x0f > 0x09 {
            a = a.wrapping_add(0x06);
        }
    } else {
        if cpu.carry() {
            a = a.wrapping_sub(0x60);
        }
        if cpu.half_carry() {
            a = a.wrapping_sub(0x06);
        }
    }

    cpu.a = a;
    cpu.set_zero(a == 0);
    cpu.set_half_carry(false);
}

fn cpl(cpu: &mut Cpu) {
    cpu.a = !cpu.a;
    cpu.set_sub(true);
    cpu.set_half_carry(true);
}

fn scf(cpu: &mut Cpu) {
    cpu.set_sub(false);
    cpu.set_half_carry(false);
    cpu.set_carry(true);
}

fn ccf(cpu: &mut Cpu) {
    let carry = cpu.carry();
    cpu.set_sub(false);
    cpu.set_half_carry(false);
    cpu.set_carry(!carry);
}

/// Moves the PC to the provided address in case the instruction's
/// condition holds, optionally pushing the return address.
fn goto_addr(cpu: &mut Cpu, addr: u16, push_pc: bool) {
    if !cpu.check_cond(cpu.inst().cond) {
        return;
    }
    if push_pc {
        cpu.tick_m(1);
        let pc = cpu.pc;
        cpu.push_word(pc);
        cpu.pc = addr;
    } else {
        cpu.pc = addr;
        cpu.tick_m(1);
    }
}

fn jp(cpu: &mut Cpu) {
    let addr = cpu.fetched_data();
    // JP HL loads the PC directly, without the internal delay
    if cpu.inst().mode == AddrMode::R {
        cpu.pc = addr;
        return;
    }
    goto_addr(cpu, addr, false);
}

fn jr(cpu: &mut Cpu) {
    let offset = cpu.fetched_data() as u8 as i8;
    let addr = cpu.pc.wrapping_add(offset as u16);
    goto_addr(cpu, addr, false);
}

fn call(cpu: &mut Cpu) {
    let addr = cpu.fetched_data();
    goto_addr(cpu, addr, true);
}

fn rst(cpu: &mut Cpu) {
    let addr = cpu.inst().param as u16;
    cpu.tick_m(1);
    let pc = cpu.pc;
    cpu.push_word(pc);
    cpu.pc = addr;
}

fn ret(cpu: &mut Cpu) {
    // conditional returns spend an extra machine cycle checking
    // the condition
    if cpu.inst().cond != Cond::None {
        cpu.tick_m(1);
    }
    if !cpu.check_cond(cpu.inst().cond) {
        return;
    }
    let addr = cpu.pop_word();
    cpu.pc = addr;
    cpu.tick_m(1);
}

fn reti(cpu: &mut Cpu) {
    ret(cpu);
    cpu.set_ime(true);
}

fn push(cpu: &mut Cpu) {
    cpu.tick_m(1);
    let value = cpu.read_reg(cpu.inst().reg1);
    cpu.push_word(value);
}

fn pop(cpu: &mut Cpu) {
    let value = cpu.pop_word();
    // the POP AF path masks the low nibble of F in set_reg
    cpu.set_reg(cpu.inst().reg1, value);
}

fn di(cpu: &mut Cpu) {
    cpu.set_ime(false);
    cpu.set_enabling_ime(false);
}

fn ei(cpu: &mut Cpu) {
    cpu.set_enabling_ime(true);
}

fn halt(cpu: &mut Cpu) {
    cpu.halt();
}

/// Executes a CB-prefixed instruction, decoded from the second
/// opcode byte as op (bits 7-6), bit (bits 5-3) and reg (bits 2-0).
fn cb(cpu: &mut Cpu) {
    let opcode = cpu.fetched_data() as u8;
    let bit = (opcode >> 3) & 0x07;
    let op = (opcode >> 6) & 0x03;
    let reg = cb_reg(opcode & 0x07);

    let is_memory = reg == Reg::Hl;
    let value = if is_memory {
        let addr = cpu.hl();
        cpu.read_cycle(addr)
    } else {
        cpu.read_reg(reg) as u8
    };

    let result = match op {
        0x00 => {
            // rotations and shifts, selected by the bit field
            let (result, carry) = match bit {
                0x00 => (value.rotate_left(1), value & 0x80 != 0),
                0x01 => (value.rotate_right(1), value & 0x01 != 0),
                0x02 => ((value << 1) | cpu.carry() as u8, value & 0x80 != 0),
                0x03 => ((value >> 1) | ((cpu.carry() as u8) << 7), value & 0x01 != 0),
                0x04 => (value << 1, value & 0x80 != 0),
                0x05 => ((value >> 1) | (value & 0x80), value & 0x01 != 0),
                0x06 => (value.rotate_left(4), false),
                _ => (value >> 1, value & 0x01 != 0),
            };
            cpu.set_zero(result == 0);
            cpu.set_sub(false);
            cpu.set_half_carry(false);
            cpu.set_carry(carry);
            result
        }
        0x01 => {
            // BIT only tests, carry is preserved and there's
            // no write-back
            cpu.set_zero(value & (1 << bit) == 0);
            cpu.set_sub(false);
            cpu.set_half_carry(true);
            return;
        }
        0x02 => value & !(1 << bit),
        _ => value | (1 << bit),
    };

    if is_memory {
        let addr = cpu.hl();
        cpu.write_cycle(addr, result);
    } else {
        cpu.set_reg(reg, result as u16);
    }
}

fn cb_reg(value: u8) -> Reg {
    match value {
        0x00 => Reg::B,
        0x01 => Reg::C,
        0x02 => Reg::D,
        0x03 => Reg::E,
        0x04 => Reg::H,
        0x05 => Reg::L,
        0x06 => Reg::Hl,
        _ => Reg::A,
    }
}

#[cfg(test)]
mod tests {
    use super::{AddrMode, Cond, Kind, Reg, INSTRUCTIONS};

    #[test]
    fn test_table_consistency() {
        // the table must cover the complete opcode page
        assert_eq!(INSTRUCTIONS.len(), 256);

        // spot check some of the well-known opcodes
        assert_eq!(INSTRUCTIONS[0x00].kind, Kind::Nop);
        assert_eq!(INSTRUCTIONS[0x31].kind, Kind::Ld);
        assert_eq!(INSTRUCTIONS[0x31].mode, AddrMode::RD16);
        assert_eq!(INSTRUCTIONS[0x31].reg1, Reg::Sp);
        assert_eq!(INSTRUCTIONS[0x76].kind, Kind::Halt);
        assert_eq!(INSTRUCTIONS[0xaf].kind, Kind::Xor);
        assert_eq!(INSTRUCTIONS[0xaf].reg2, Reg::A);
        assert_eq!(INSTRUCTIONS[0xcb].kind, Kind::Cb);
        assert_eq!(INSTRUCTIONS[0xe2].mode, AddrMode::MrR);
        assert_eq!(INSTRUCTIONS[0xe2].reg1, Reg::C);
        assert_eq!(INSTRUCTIONS[0xff].kind, Kind::Rst);
        assert_eq!(INSTRUCTIONS[0xff].param, 0x38);
    }

    #[test]
    fn test_illegal_opcodes() {
        for opcode in [0xd3, 0xdb, 0xdd, 0xe3, 0xe4, 0xeb, 0xec, 0xed, 0xf4, 0xfc, 0xfd] {
            assert_eq!(INSTRUCTIONS[opcode].kind, Kind::Err);
        }
    }

    #[test]
    fn test_conditions() {
        assert_eq!(INSTRUCTIONS[0x20].cond, Cond::Nz);
        assert_eq!(INSTRUCTIONS[0x28].cond, Cond::Z);
        assert_eq!(INSTRUCTIONS[0x30].cond, Cond::Nc);
        assert_eq!(INSTRUCTIONS[0x38].cond, Cond::C);
        assert_eq!(INSTRUCTIONS[0xc2].cond, Cond::Nz);
        assert_eq!(INSTRUCTIONS[0xd8].cond, Cond::C);
    }

    #[test]
    fn test_display() {
        assert_eq!(INSTRUCTIONS[0x00].to_string(), "NOP");
        assert_eq!(INSTRUCTIONS[0x41].to_string(), "LD B, C");
        assert_eq!(INSTRUCTIONS[0x7e].to_string(), "LD A, [Hl]");
        assert_eq!(INSTRUCTIONS[0xc5].to_string(), "PUSH Bc");
        assert_eq!(INSTRUCTIONS[0xc7].to_string(), "RST 00h");
    }
}

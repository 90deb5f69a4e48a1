// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use mos6502::cpu::EmulationError;
use num::FromPrimitive;

enum_from_primitive! {
    /// Every documented opcode of the NMOS 6502. The variant name is the
    /// instruction mnemonic followed by its addressing mode, and the variant
    /// value is the opcode byte fetched from the instruction stream. Implied
    /// and accumulator-only instructions carry no suffix as they have only
    /// one form.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Opcode {
        ADCImm   = 0x69,
        ADCZero  = 0x65,
        ADCZeroX = 0x75,
        ADCAbs   = 0x6D,
        ADCAbsX  = 0x7D,
        ADCAbsY  = 0x79,
        ADCIndX  = 0x61,
        ADCIndY  = 0x71,

        ANDImm   = 0x29,
        ANDZero  = 0x25,
        ANDZeroX = 0x35,
        ANDAbs   = 0x2D,
        ANDAbsX  = 0x3D,
        ANDAbsY  = 0x39,
        ANDIndX  = 0x21,
        ANDIndY  = 0x31,

        ASLAcc   = 0x0A,
        ASLZero  = 0x06,
        ASLZeroX = 0x16,
        ASLAbs   = 0x0E,
        ASLAbsX  = 0x1E,

        BCCRel   = 0x90,
        BCSRel   = 0xB0,
        BEQRel   = 0xF0,
        BMIRel   = 0x30,
        BNERel   = 0xD0,
        BPLRel   = 0x10,
        BVCRel   = 0x50,
        BVSRel   = 0x70,

        BITZero  = 0x24,
        BITAbs   = 0x2C,

        BRK      = 0x00,

        CLC      = 0x18,
        CLD      = 0xD8,
        CLI      = 0x58,
        CLV      = 0xB8,

        CMPImm   = 0xC9,
        CMPZero  = 0xC5,
        CMPZeroX = 0xD5,
        CMPAbs   = 0xCD,
        CMPAbsX  = 0xDD,
        CMPAbsY  = 0xD9,
        CMPIndX  = 0xC1,
        CMPIndY  = 0xD1,

        CPXImm   = 0xE0,
        CPXZero  = 0xE4,
        CPXAbs   = 0xEC,

        CPYImm   = 0xC0,
        CPYZero  = 0xC4,
        CPYAbs   = 0xCC,

        DECZero  = 0xC6,
        DECZeroX = 0xD6,
        DECAbs   = 0xCE,
        DECAbsX  = 0xDE,

        DEX      = 0xCA,
        DEY      = 0x88,

        EORImm   = 0x49,
        EORZero  = 0x45,
        EORZeroX = 0x55,
        EORAbs   = 0x4D,
        EORAbsX  = 0x5D,
        EORAbsY  = 0x59,
        EORIndX  = 0x41,
        EORIndY  = 0x51,

        INCZero  = 0xE6,
        INCZeroX = 0xF6,
        INCAbs   = 0xEE,
        INCAbsX  = 0xFE,

        INX      = 0xE8,
        INY      = 0xC8,

        JMPAbs   = 0x4C,
        JMPInd   = 0x6C,

        JSRAbs   = 0x20,

        LDAImm   = 0xA9,
        LDAZero  = 0xA5,
        LDAZeroX = 0xB5,
        LDAAbs   = 0xAD,
        LDAAbsX  = 0xBD,
        LDAAbsY  = 0xB9,
        LDAIndX  = 0xA1,
        LDAIndY  = 0xB1,

        LDXImm   = 0xA2,
        LDXZero  = 0xA6,
        LDXZeroY = 0xB6,
        LDXAbs   = 0xAE,
        LDXAbsY  = 0xBE,

        LDYImm   = 0xA0,
        LDYZero  = 0xA4,
        LDYZeroX = 0xB4,
        LDYAbs   = 0xAC,
        LDYAbsX  = 0xBC,

        LSRAcc   = 0x4A,
        LSRZero  = 0x46,
        LSRZeroX = 0x56,
        LSRAbs   = 0x4E,
        LSRAbsX  = 0x5E,

        NOP      = 0xEA,

        ORAImm   = 0x09,
        ORAZero  = 0x05,
        ORAZeroX = 0x15,
        ORAAbs   = 0x0D,
        ORAAbsX  = 0x1D,
        ORAAbsY  = 0x19,
        ORAIndX  = 0x01,
        ORAIndY  = 0x11,

        PHA      = 0x48,
        PHP      = 0x08,
        PLA      = 0x68,
        PLP      = 0x28,

        ROLAcc   = 0x2A,
        ROLZero  = 0x26,
        ROLZeroX = 0x36,
        ROLAbs   = 0x2E,
        ROLAbsX  = 0x3E,

        RORAcc   = 0x6A,
        RORZero  = 0x66,
        RORZeroX = 0x76,
        RORAbs   = 0x6E,
        RORAbsX  = 0x7E,

        RTI      = 0x40,
        RTS      = 0x60,

        SBCImm   = 0xE9,
        SBCZero  = 0xE5,
        SBCZeroX = 0xF5,
        SBCAbs   = 0xED,
        SBCAbsX  = 0xFD,
        SBCAbsY  = 0xF9,
        SBCIndX  = 0xE1,
        SBCIndY  = 0xF1,

        SEC      = 0x38,
        SED      = 0xF8,
        SEI      = 0x78,

        STAZero  = 0x85,
        STAZeroX = 0x95,
        STAAbs   = 0x8D,
        STAAbsX  = 0x9D,
        STAAbsY  = 0x99,
        STAIndX  = 0x81,
        STAIndY  = 0x91,

        STXZero  = 0x86,
        STXZeroY = 0x96,
        STXAbs   = 0x8E,

        STYZero  = 0x84,
        STYZeroX = 0x94,
        STYAbs   = 0x8C,

        TAX      = 0xAA,
        TAY      = 0xA8,
        TSX      = 0xBA,
        TXA      = 0x8A,
        TXS      = 0x9A,
        TYA      = 0x98,
    }
}

/// Instruction mnemonics stripped of their addressing mode. Instruction
/// semantics are implemented once per mnemonic; the addressing mode decides
/// where the operand comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mnemonic {
    ADC, AND, ASL, BCC, BCS, BEQ, BIT, BMI, BNE, BPL, BRK, BVC, BVS, CLC,
    CLD, CLI, CLV, CMP, CPX, CPY, DEC, DEX, DEY, EOR, INC, INX, INY, JMP,
    JSR, LDA, LDX, LDY, LSR, NOP, ORA, PHA, PHP, PLA, PLP, ROL, ROR, RTI,
    RTS, SBC, SEC, SED, SEI, STA, STX, STY, TAX, TAY, TSX, TXA, TXS, TYA,
}

/// The strategies the 6502 uses to locate an instruction operand. Each mode
/// knows how many bytes of the instruction stream it consumes and whether it
/// can incur a page cross penalty; that logic lives in addressing.rs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    Implied,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    Indirect,
    IndirectX,
    IndirectY,
    Relative,
}

/// Decodes an opcode by converting an opcode number to an enum value. Opcode
/// bytes with no documented 6502 behavior have no enum value and surface as
/// an illegal opcode error that the caller must not swallow; executing
/// garbage would corrupt the emulated machine in unpredictable ways.
pub fn decode_opcode(opcode: u8, pc: u16) -> Result<Opcode, EmulationError> {
    match Opcode::from_u8(opcode) {
        Some(opcode) => Ok(opcode),
        None => Err(EmulationError::IllegalOpcode { opcode: opcode, pc: pc }),
    }
}

/// Returns the mnemonic, addressing mode and base cycle count of an opcode.
/// Base cycle counts assume no page crossing; addressing modes report page
/// cross penalties separately and instructions that are susceptible add them
/// on top of the base count.
pub fn attributes(opcode: &Opcode) -> (Mnemonic, AddressingMode, u8) {
    use self::AddressingMode::*;
    use self::Opcode::*;

    match *opcode {
        ADCImm   => (Mnemonic::ADC, Immediate, 2),
        ADCZero  => (Mnemonic::ADC, ZeroPage, 3),
        ADCZeroX => (Mnemonic::ADC, ZeroPageX, 4),
        ADCAbs   => (Mnemonic::ADC, Absolute, 4),
        ADCAbsX  => (Mnemonic::ADC, AbsoluteX, 4),
        ADCAbsY  => (Mnemonic::ADC, AbsoluteY, 4),
        ADCIndX  => (Mnemonic::ADC, IndirectX, 6),
        ADCIndY  => (Mnemonic::ADC, IndirectY, 5),

        ANDImm   => (Mnemonic::AND, Immediate, 2),
        ANDZero  => (Mnemonic::AND, ZeroPage, 3),
        ANDZeroX => (Mnemonic::AND, ZeroPageX, 4),
        ANDAbs   => (Mnemonic::AND, Absolute, 4),
        ANDAbsX  => (Mnemonic::AND, AbsoluteX, 4),
        ANDAbsY  => (Mnemonic::AND, AbsoluteY, 4),
        ANDIndX  => (Mnemonic::AND, IndirectX, 6),
        ANDIndY  => (Mnemonic::AND, IndirectY, 5),

        ASLAcc   => (Mnemonic::ASL, Accumulator, 2),
        ASLZero  => (Mnemonic::ASL, ZeroPage, 5),
        ASLZeroX => (Mnemonic::ASL, ZeroPageX, 6),
        ASLAbs   => (Mnemonic::ASL, Absolute, 6),
        ASLAbsX  => (Mnemonic::ASL, AbsoluteX, 7),

        BCCRel   => (Mnemonic::BCC, Relative, 2),
        BCSRel   => (Mnemonic::BCS, Relative, 2),
        BEQRel   => (Mnemonic::BEQ, Relative, 2),
        BMIRel   => (Mnemonic::BMI, Relative, 2),
        BNERel   => (Mnemonic::BNE, Relative, 2),
        BPLRel   => (Mnemonic::BPL, Relative, 2),
        BVCRel   => (Mnemonic::BVC, Relative, 2),
        BVSRel   => (Mnemonic::BVS, Relative, 2),

        BITZero  => (Mnemonic::BIT, ZeroPage, 3),
        BITAbs   => (Mnemonic::BIT, Absolute, 4),

        BRK      => (Mnemonic::BRK, Implied, 7),

        CLC      => (Mnemonic::CLC, Implied, 2),
        CLD      => (Mnemonic::CLD, Implied, 2),
        CLI      => (Mnemonic::CLI, Implied, 2),
        CLV      => (Mnemonic::CLV, Implied, 2),

        CMPImm   => (Mnemonic::CMP, Immediate, 2),
        CMPZero  => (Mnemonic::CMP, ZeroPage, 3),
        CMPZeroX => (Mnemonic::CMP, ZeroPageX, 4),
        CMPAbs   => (Mnemonic::CMP, Absolute, 4),
        CMPAbsX  => (Mnemonic::CMP, AbsoluteX, 4),
        CMPAbsY  => (Mnemonic::CMP, AbsoluteY, 4),
        CMPIndX  => (Mnemonic::CMP, IndirectX, 6),
        CMPIndY  => (Mnemonic::CMP, IndirectY, 5),

        CPXImm   => (Mnemonic::CPX, Immediate, 2),
        CPXZero  => (Mnemonic::CPX, ZeroPage, 3),
        CPXAbs   => (Mnemonic::CPX, Absolute, 4),

        CPYImm   => (Mnemonic::CPY, Immediate, 2),
        CPYZero  => (Mnemonic::CPY, ZeroPage, 3),
        CPYAbs   => (Mnemonic::CPY, Absolute, 4),

        DECZero  => (Mnemonic::DEC, ZeroPage, 5),
        DECZeroX => (Mnemonic::DEC, ZeroPageX, 6),
        DECAbs   => (Mnemonic::DEC, Absolute, 6),
        DECAbsX  => (Mnemonic::DEC, AbsoluteX, 7),

        DEX      => (Mnemonic::DEX, Implied, 2),
        DEY      => (Mnemonic::DEY, Implied, 2),

        EORImm   => (Mnemonic::EOR, Immediate, 2),
        EORZero  => (Mnemonic::EOR, ZeroPage, 3),
        EORZeroX => (Mnemonic::EOR, ZeroPageX, 4),
        EORAbs   => (Mnemonic::EOR, Absolute, 4),
        EORAbsX  => (Mnemonic::EOR, AbsoluteX, 4),
        EORAbsY  => (Mnemonic::EOR, AbsoluteY, 4),
        EORIndX  => (Mnemonic::EOR, IndirectX, 6),
        EORIndY  => (Mnemonic::EOR, IndirectY, 5),

        INCZero  => (Mnemonic::INC, ZeroPage, 5),
        INCZeroX => (Mnemonic::INC, ZeroPageX, 6),
        INCAbs   => (Mnemonic::INC, Absolute, 6),
        INCAbsX  => (Mnemonic::INC, AbsoluteX, 7),

        INX      => (Mnemonic::INX, Implied, 2),
        INY      => (Mnemonic::INY, Implied, 2),

        JMPAbs   => (Mnemonic::JMP, Absolute, 3),
        JMPInd   => (Mnemonic::JMP, Indirect, 5),

        JSRAbs   => (Mnemonic::JSR, Absolute, 6),

        LDAImm   => (Mnemonic::LDA, Immediate, 2),
        LDAZero  => (Mnemonic::LDA, ZeroPage, 3),
        LDAZeroX => (Mnemonic::LDA, ZeroPageX, 4),
        LDAAbs   => (Mnemonic::LDA, Absolute, 4),
        LDAAbsX  => (Mnemonic::LDA, AbsoluteX, 4),
        LDAAbsY  => (Mnemonic::LDA, AbsoluteY, 4),
        LDAIndX  => (Mnemonic::LDA, IndirectX, 6),
        LDAIndY  => (Mnemonic::LDA, IndirectY, 5),

        LDXImm   => (Mnemonic::LDX, Immediate, 2),
        LDXZero  => (Mnemonic::LDX, ZeroPage, 3),
        LDXZeroY => (Mnemonic::LDX, ZeroPageY, 4),
        LDXAbs   => (Mnemonic::LDX, Absolute, 4),
        LDXAbsY  => (Mnemonic::LDX, AbsoluteY, 4),

        LDYImm   => (Mnemonic::LDY, Immediate, 2),
        LDYZero  => (Mnemonic::LDY, ZeroPage, 3),
        LDYZeroX => (Mnemonic::LDY, ZeroPageX, 4),
        LDYAbs   => (Mnemonic::LDY, Absolute, 4),
        LDYAbsX  => (Mnemonic::LDY, AbsoluteX, 4),

        LSRAcc   => (Mnemonic::LSR, Accumulator, 2),
        LSRZero  => (Mnemonic::LSR, ZeroPage, 5),
        LSRZeroX => (Mnemonic::LSR, ZeroPageX, 6),
        LSRAbs   => (Mnemonic::LSR, Absolute, 6),
        LSRAbsX  => (Mnemonic::LSR, AbsoluteX, 7),

        NOP      => (Mnemonic::NOP, Implied, 2),

        ORAImm   => (Mnemonic::ORA, Immediate, 2),
        ORAZero  => (Mnemonic::ORA, ZeroPage, 3),
        ORAZeroX => (Mnemonic::ORA, ZeroPageX, 4),
        ORAAbs   => (Mnemonic::ORA, Absolute, 4),
        ORAAbsX  => (Mnemonic::ORA, AbsoluteX, 4),
        ORAAbsY  => (Mnemonic::ORA, AbsoluteY, 4),
        ORAIndX  => (Mnemonic::ORA, IndirectX, 6),
        ORAIndY  => (Mnemonic::ORA, IndirectY, 5),

        PHA      => (Mnemonic::PHA, Implied, 3),
        PHP      => (Mnemonic::PHP, Implied, 3),
        PLA      => (Mnemonic::PLA, Implied, 4),
        PLP      => (Mnemonic::PLP, Implied, 4),

        ROLAcc   => (Mnemonic::ROL, Accumulator, 2),
        ROLZero  => (Mnemonic::ROL, ZeroPage, 5),
        ROLZeroX => (Mnemonic::ROL, ZeroPageX, 6),
        ROLAbs   => (Mnemonic::ROL, Absolute, 6),
        ROLAbsX  => (Mnemonic::ROL, AbsoluteX, 7),

        RORAcc   => (Mnemonic::ROR, Accumulator, 2),
        RORZero  => (Mnemonic::ROR, ZeroPage, 5),
        RORZeroX => (Mnemonic::ROR, ZeroPageX, 6),
        RORAbs   => (Mnemonic::ROR, Absolute, 6),
        RORAbsX  => (Mnemonic::ROR, AbsoluteX, 7),

        RTI      => (Mnemonic::RTI, Implied, 6),
        RTS      => (Mnemonic::RTS, Implied, 6),

        SBCImm   => (Mnemonic::SBC, Immediate, 2),
        SBCZero  => (Mnemonic::SBC, ZeroPage, 3),
        SBCZeroX => (Mnemonic::SBC, ZeroPageX, 4),
        SBCAbs   => (Mnemonic::SBC, Absolute, 4),
        SBCAbsX  => (Mnemonic::SBC, AbsoluteX, 4),
        SBCAbsY  => (Mnemonic::SBC, AbsoluteY, 4),
        SBCIndX  => (Mnemonic::SBC, IndirectX, 6),
        SBCIndY  => (Mnemonic::SBC, IndirectY, 5),

        SEC      => (Mnemonic::SEC, Implied, 2),
        SED      => (Mnemonic::SED, Implied, 2),
        SEI      => (Mnemonic::SEI, Implied, 2),

        STAZero  => (Mnemonic::STA, ZeroPage, 3),
        STAZeroX => (Mnemonic::STA, ZeroPageX, 4),
        STAAbs   => (Mnemonic::STA, Absolute, 4),
        STAAbsX  => (Mnemonic::STA, AbsoluteX, 5),
        STAAbsY  => (Mnemonic::STA, AbsoluteY, 5),
        STAIndX  => (Mnemonic::STA, IndirectX, 6),
        STAIndY  => (Mnemonic::STA, IndirectY, 6),

        STXZero  => (Mnemonic::STX, ZeroPage, 3),
        STXZeroY => (Mnemonic::STX, ZeroPageY, 4),
        STXAbs   => (Mnemonic::STX, Absolute, 4),

        STYZero  => (Mnemonic::STY, ZeroPage, 3),
        STYZeroX => (Mnemonic::STY, ZeroPageX, 4),
        STYAbs   => (Mnemonic::STY, Absolute, 4),

        TAX      => (Mnemonic::TAX, Implied, 2),
        TAY      => (Mnemonic::TAY, Implied, 2),
        TSX      => (Mnemonic::TSX, Implied, 2),
        TXA      => (Mnemonic::TXA, Implied, 2),
        TXS      => (Mnemonic::TXS, Implied, 2),
        TYA      => (Mnemonic::TYA, Implied, 2),
    }
}

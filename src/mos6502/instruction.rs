// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use mos6502::cpu::{CPU, EmulationError};
use mos6502::cpu::{BREAK_COMMAND, UNUSED_FLAG, IRQ_VECTOR};
use mos6502::memory::Memory;
use mos6502::opcode::{self, AddressingMode, Mnemonic, Opcode};
use utils::arithmetic;
use utils::paging::{self, PageCross};

/// A decoded instruction ready for execution: the raw opcode, the mnemonic
/// that selects its semantics, the addressing mode that locates its operand
/// and the cycle cost it pays when no page boundary gets in the way.
#[derive(Debug, Clone, Copy)]
pub struct Instruction {
    pub opcode: Opcode,
    pub mnemonic: Mnemonic,
    pub mode: AddressingMode,
    pub cycles: u8,
}

impl Instruction {
    /// Decodes an opcode byte into an instruction descriptor. Bytes that
    /// don't map to a documented instruction produce an illegal opcode
    /// error; the program counter of the offending fetch is kept for the
    /// error message.
    pub fn decode(byte: u8, pc: u16) -> Result<Instruction, EmulationError> {
        let opcode = try!(opcode::decode_opcode(byte, pc));
        let (mnemonic, mode, cycles) = opcode::attributes(&opcode);

        Ok(Instruction {
            opcode: opcode,
            mnemonic: mnemonic,
            mode: mode,
            cycles: cycles,
        })
    }

    /// Executes the instruction against the passed CPU and memory and
    /// returns the total amount of cycles spent, including any page cross
    /// penalties reported by the addressing mode.
    pub fn execute(&self, cpu: &mut CPU, memory: &mut Memory) -> u8 {
        let mode = self.mode;
        let base = self.cycles;

        match self.mnemonic {
            Mnemonic::ADC => adc(cpu, memory, mode, base),
            Mnemonic::AND => and(cpu, memory, mode, base),
            Mnemonic::ASL => asl(cpu, memory, mode, base),
            Mnemonic::BCC => bcc(cpu, memory, mode, base),
            Mnemonic::BCS => bcs(cpu, memory, mode, base),
            Mnemonic::BEQ => beq(cpu, memory, mode, base),
            Mnemonic::BIT => bit(cpu, memory, mode, base),
            Mnemonic::BMI => bmi(cpu, memory, mode, base),
            Mnemonic::BNE => bne(cpu, memory, mode, base),
            Mnemonic::BPL => bpl(cpu, memory, mode, base),
            Mnemonic::BRK => brk(cpu, memory, mode, base),
            Mnemonic::BVC => bvc(cpu, memory, mode, base),
            Mnemonic::BVS => bvs(cpu, memory, mode, base),
            Mnemonic::CLC => clc(cpu, base),
            Mnemonic::CLD => cld(cpu, base),
            Mnemonic::CLI => cli(cpu, base),
            Mnemonic::CLV => clv(cpu, base),
            Mnemonic::CMP => cmp(cpu, memory, mode, base),
            Mnemonic::CPX => cpx(cpu, memory, mode, base),
            Mnemonic::CPY => cpy(cpu, memory, mode, base),
            Mnemonic::DEC => dec(cpu, memory, mode, base),
            Mnemonic::DEX => dex(cpu, base),
            Mnemonic::DEY => dey(cpu, base),
            Mnemonic::EOR => eor(cpu, memory, mode, base),
            Mnemonic::INC => inc(cpu, memory, mode, base),
            Mnemonic::INX => inx(cpu, base),
            Mnemonic::INY => iny(cpu, base),
            Mnemonic::JMP => jmp(cpu, memory, mode, base),
            Mnemonic::JSR => jsr(cpu, memory, mode, base),
            Mnemonic::LDA => lda(cpu, memory, mode, base),
            Mnemonic::LDX => ldx(cpu, memory, mode, base),
            Mnemonic::LDY => ldy(cpu, memory, mode, base),
            Mnemonic::LSR => lsr(cpu, memory, mode, base),
            Mnemonic::NOP => nop(cpu, memory, mode, base),
            Mnemonic::ORA => ora(cpu, memory, mode, base),
            Mnemonic::PHA => pha(cpu, memory, base),
            Mnemonic::PHP => php(cpu, memory, base),
            Mnemonic::PLA => pla(cpu, memory, base),
            Mnemonic::PLP => plp(cpu, memory, base),
            Mnemonic::ROL => rol(cpu, memory, mode, base),
            Mnemonic::ROR => ror(cpu, memory, mode, base),
            Mnemonic::RTI => rti(cpu, memory, base),
            Mnemonic::RTS => rts(cpu, memory, base),
            Mnemonic::SBC => sbc(cpu, memory, mode, base),
            Mnemonic::SEC => sec(cpu, base),
            Mnemonic::SED => sed(cpu, base),
            Mnemonic::SEI => sei(cpu, base),
            Mnemonic::STA => sta(cpu, memory, mode, base),
            Mnemonic::STX => stx(cpu, memory, mode, base),
            Mnemonic::STY => sty(cpu, memory, mode, base),
            Mnemonic::TAX => tax(cpu, base),
            Mnemonic::TAY => tay(cpu, base),
            Mnemonic::TSX => tsx(cpu, base),
            Mnemonic::TXA => txa(cpu, base),
            Mnemonic::TXS => txs(cpu, base),
            Mnemonic::TYA => tya(cpu, base),
        }
    }
}

// Shared helpers. The operand plumbing is the same for most instructions:
// resolve the addressing mode, read the byte it points at and remember the
// page cross penalty so the instruction can decide whether it pays it.

/// Resolves the addressing mode and reads the operand byte it points at.
fn read_operand(cpu: &mut CPU, memory: &mut Memory, mode: AddressingMode) -> (u8, u8) {
    let (addr, extra_cycles) = mode.resolve(cpu, memory);
    (memory.read_u8(addr as usize), extra_cycles)
}

/// Applies a read-modify-write transformation through the addressing mode.
/// Accumulator mode instructions operate on the accumulator directly; every
/// other mode resolves an effective address and writes the transformed value
/// back to it. Read-modify-write instructions have a fixed cost, so the page
/// cross penalty of the mode is discarded.
fn modify<F>(cpu: &mut CPU, memory: &mut Memory, mode: AddressingMode, transform: F) -> u8
    where F: Fn(&mut CPU, u8) -> u8
{
    match mode {
        AddressingMode::Accumulator => {
            let value = cpu.a;
            let result = transform(cpu, value);
            cpu.a = result;
            result
        },
        _ => {
            let (addr, _) = mode.resolve(cpu, memory);
            let value = memory.read_u8(addr as usize);
            let result = transform(cpu, value);
            memory.write_u8(addr as usize, result);
            result
        },
    }
}

/// Adds the operand and the carry flag to the accumulator, leaving the
/// carry, overflow, zero and negative flags in the state the sum implies.
/// Subtraction runs through here as well by handing in the one's complement
/// of the operand.
fn binary_add(cpu: &mut CPU, value: u8) {
    let a = cpu.a as u16;
    let m = value as u16;
    let carry = if cpu.carry_flag_set() { 1 } else { 0 };

    let sum = a + m + carry;
    let result = sum as u8;

    cpu.toggle_carry_flag(sum > 0xFF);
    cpu.toggle_overflow_flag(!(a ^ m) & (a ^ sum) & 0x80 != 0);
    cpu.toggle_zero_flag(result);
    cpu.toggle_negative_flag(result);
    cpu.a = result;
}

/// Binary-coded decimal addition as the NMOS 6502 performs it. The zero
/// flag reflects the plain binary sum, negative and overflow are derived
/// before the high nibble correction is applied and carry reports a decimal
/// overflow past 99. Real hardware leaves some of these flags undefined in
/// decimal mode; the derivations here match the common reference behavior.
fn decimal_add(cpu: &mut CPU, value: u8) {
    let a = cpu.a as u16;
    let m = value as u16;
    let carry = if cpu.carry_flag_set() { 1 } else { 0 };

    let binary = a + m + carry;
    cpu.toggle_zero_flag(binary as u8);

    // Correct the low nibble first; a digit carry out of it lands in the
    // high nibble before that gets corrected in turn.
    let mut low = (a & 0x0F) + (m & 0x0F) + carry;
    if low > 0x09 {
        low += 0x06;
    }

    let mut sum = (a & 0xF0) + (m & 0xF0) + (low & 0x0F)
        + if low > 0x0F { 0x10 } else { 0x00 };

    cpu.toggle_negative_flag(sum as u8);
    cpu.toggle_overflow_flag(!(a ^ m) & (a ^ sum) & 0x80 != 0);

    if sum >= 0xA0 {
        sum += 0x60;
    }

    cpu.toggle_carry_flag(sum > 0xFF);
    cpu.a = sum as u8;
}

/// Binary-coded decimal subtraction as the NMOS 6502 performs it. The same
/// flag rules as decimal addition apply, with the carry flag reporting the
/// absence of a decimal borrow.
fn decimal_subtract(cpu: &mut CPU, value: u8) {
    let a = cpu.a as i16;
    let m = value as i16;
    let borrow = if cpu.carry_flag_set() { 0 } else { 1 };

    let binary = a - m - borrow;
    cpu.toggle_zero_flag(binary as u8);

    let mut low = (a & 0x0F) - (m & 0x0F) - borrow;
    let mut high_borrow = 0x00;
    if low < 0 {
        low -= 0x06;
        high_borrow = 0x10;
    }

    let mut result = (a & 0xF0) - (m & 0xF0) - high_borrow + (low & 0x0F);

    cpu.toggle_negative_flag(result as u8);
    cpu.toggle_overflow_flag((a ^ m) & (a ^ result) & 0x80 != 0);

    if result < 0 {
        result -= 0x60;
    }

    cpu.toggle_carry_flag(result >= 0);
    cpu.a = result as u8;
}

/// Compares a register against an operand by subtracting without storing the
/// result. Carry reports an unsigned greater-or-equal relation while zero
/// and negative are set from the 8-bit difference.
fn compare(cpu: &mut CPU, register: u8, value: u8) {
    let result = register.wrapping_sub(value);

    cpu.toggle_carry_flag(register >= value);
    cpu.toggle_zero_flag(result);
    cpu.toggle_negative_flag(result);
}

/// Common implementation of the branch instructions. The displacement byte
/// is always consumed; a branch that isn't taken costs only its base cycles,
/// while a taken branch pays one extra cycle and a second one if the target
/// lies in a different page than the instruction after the branch.
fn branch(cpu: &mut CPU, memory: &mut Memory, mode: AddressingMode, base: u8, taken: bool) -> u8 {
    let (value, _) = mode.resolve(cpu, memory);
    if !taken {
        return base;
    }

    let displacement = value as u8 as i8;
    let origin = cpu.pc;
    let target = arithmetic::add_relative(origin, displacement);
    cpu.pc = target;

    let mut cycles = base + 1;
    if paging::page_cross(origin as usize, target as usize) != PageCross::Same {
        cycles += 1;
    }
    cycles
}

// Load, store and transfer operations.

/// LDA - Load Accumulator
fn lda(cpu: &mut CPU, memory: &mut Memory, mode: AddressingMode, base: u8) -> u8 {
    let (value, extra_cycles) = read_operand(cpu, memory, mode);
    cpu.a = value;
    cpu.toggle_zero_flag(value);
    cpu.toggle_negative_flag(value);
    base + extra_cycles
}

/// LDX - Load X Register
fn ldx(cpu: &mut CPU, memory: &mut Memory, mode: AddressingMode, base: u8) -> u8 {
    let (value, extra_cycles) = read_operand(cpu, memory, mode);
    cpu.x = value;
    cpu.toggle_zero_flag(value);
    cpu.toggle_negative_flag(value);
    base + extra_cycles
}

/// LDY - Load Y Register
fn ldy(cpu: &mut CPU, memory: &mut Memory, mode: AddressingMode, base: u8) -> u8 {
    let (value, extra_cycles) = read_operand(cpu, memory, mode);
    cpu.y = value;
    cpu.toggle_zero_flag(value);
    cpu.toggle_negative_flag(value);
    base + extra_cycles
}

/// STA - Store Accumulator
///
/// Stores never pay the page cross penalty; the hardware always spends the
/// fixed write cycle whether or not the index carried into the high byte.
fn sta(cpu: &mut CPU, memory: &mut Memory, mode: AddressingMode, base: u8) -> u8 {
    let (addr, _) = mode.resolve(cpu, memory);
    let a = cpu.a;
    memory.write_u8(addr as usize, a);
    base
}

/// STX - Store X Register
fn stx(cpu: &mut CPU, memory: &mut Memory, mode: AddressingMode, base: u8) -> u8 {
    let (addr, _) = mode.resolve(cpu, memory);
    let x = cpu.x;
    memory.write_u8(addr as usize, x);
    base
}

/// STY - Store Y Register
fn sty(cpu: &mut CPU, memory: &mut Memory, mode: AddressingMode, base: u8) -> u8 {
    let (addr, _) = mode.resolve(cpu, memory);
    let y = cpu.y;
    memory.write_u8(addr as usize, y);
    base
}

/// TAX - Transfer Accumulator to X
fn tax(cpu: &mut CPU, base: u8) -> u8 {
    cpu.x = cpu.a;
    let x = cpu.x;
    cpu.toggle_zero_flag(x);
    cpu.toggle_negative_flag(x);
    base
}

/// TAY - Transfer Accumulator to Y
fn tay(cpu: &mut CPU, base: u8) -> u8 {
    cpu.y = cpu.a;
    let y = cpu.y;
    cpu.toggle_zero_flag(y);
    cpu.toggle_negative_flag(y);
    base
}

/// TSX - Transfer Stack Pointer to X
fn tsx(cpu: &mut CPU, base: u8) -> u8 {
    cpu.x = cpu.sp;
    let x = cpu.x;
    cpu.toggle_zero_flag(x);
    cpu.toggle_negative_flag(x);
    base
}

/// TXA - Transfer X to Accumulator
fn txa(cpu: &mut CPU, base: u8) -> u8 {
    cpu.a = cpu.x;
    let a = cpu.a;
    cpu.toggle_zero_flag(a);
    cpu.toggle_negative_flag(a);
    base
}

/// TXS - Transfer X to Stack Pointer. Sets no flags.
fn txs(cpu: &mut CPU, base: u8) -> u8 {
    cpu.sp = cpu.x;
    base
}

/// TYA - Transfer Y to Accumulator
fn tya(cpu: &mut CPU, base: u8) -> u8 {
    cpu.a = cpu.y;
    let a = cpu.a;
    cpu.toggle_zero_flag(a);
    cpu.toggle_negative_flag(a);
    base
}

// Stack operations.

/// PHA - Push Accumulator
fn pha(cpu: &mut CPU, memory: &mut Memory, base: u8) -> u8 {
    let a = cpu.a;
    memory.stack_push_u8(cpu, a);
    base
}

/// PHP - Push Processor Status
///
/// The pushed byte always carries the break and unused bits set, no matter
/// what the live register holds.
fn php(cpu: &mut CPU, memory: &mut Memory, base: u8) -> u8 {
    let flags = cpu.p | BREAK_COMMAND | UNUSED_FLAG;
    memory.stack_push_u8(cpu, flags);
    base
}

/// PLA - Pull Accumulator
fn pla(cpu: &mut CPU, memory: &mut Memory, base: u8) -> u8 {
    let value = memory.stack_pop_u8(cpu);
    cpu.a = value;
    cpu.toggle_zero_flag(value);
    cpu.toggle_negative_flag(value);
    base
}

/// PLP - Pull Processor Status
///
/// Restores every meaningful flag from the pulled byte. Bits 4 and 5 have no
/// backing storage in the processor, so whatever the pulled byte holds there
/// is ignored and the live bits are left alone.
fn plp(cpu: &mut CPU, memory: &mut Memory, base: u8) -> u8 {
    let value = memory.stack_pop_u8(cpu);
    cpu.p = (cpu.p & (BREAK_COMMAND | UNUSED_FLAG))
        | (value & !(BREAK_COMMAND | UNUSED_FLAG));
    base
}

// Increment and decrement operations.

/// INC - Increment Memory
fn inc(cpu: &mut CPU, memory: &mut Memory, mode: AddressingMode, base: u8) -> u8 {
    let result = modify(cpu, memory, mode, |_, value| value.wrapping_add(1));
    cpu.toggle_zero_flag(result);
    cpu.toggle_negative_flag(result);
    base
}

/// DEC - Decrement Memory
fn dec(cpu: &mut CPU, memory: &mut Memory, mode: AddressingMode, base: u8) -> u8 {
    let result = modify(cpu, memory, mode, |_, value| value.wrapping_sub(1));
    cpu.toggle_zero_flag(result);
    cpu.toggle_negative_flag(result);
    base
}

/// INX - Increment X Register
fn inx(cpu: &mut CPU, base: u8) -> u8 {
    cpu.x = cpu.x.wrapping_add(1);
    let x = cpu.x;
    cpu.toggle_zero_flag(x);
    cpu.toggle_negative_flag(x);
    base
}

/// INY - Increment Y Register
fn iny(cpu: &mut CPU, base: u8) -> u8 {
    cpu.y = cpu.y.wrapping_add(1);
    let y = cpu.y;
    cpu.toggle_zero_flag(y);
    cpu.toggle_negative_flag(y);
    base
}

/// DEX - Decrement X Register
fn dex(cpu: &mut CPU, base: u8) -> u8 {
    cpu.x = cpu.x.wrapping_sub(1);
    let x = cpu.x;
    cpu.toggle_zero_flag(x);
    cpu.toggle_negative_flag(x);
    base
}

/// DEY - Decrement Y Register
fn dey(cpu: &mut CPU, base: u8) -> u8 {
    cpu.y = cpu.y.wrapping_sub(1);
    let y = cpu.y;
    cpu.toggle_zero_flag(y);
    cpu.toggle_negative_flag(y);
    base
}

// Arithmetic operations.

/// ADC - Add with Carry
fn adc(cpu: &mut CPU, memory: &mut Memory, mode: AddressingMode, base: u8) -> u8 {
    let (value, extra_cycles) = read_operand(cpu, memory, mode);
    if cpu.decimal_mode_set() {
        decimal_add(cpu, value);
    } else {
        binary_add(cpu, value);
    }
    base + extra_cycles
}

/// SBC - Subtract with Carry
///
/// Binary subtraction reuses the addition core with the operand inverted;
/// a set carry flag means "no borrow" which falls out of the one's
/// complement identity A - M - (1 - C) == A + !M + C.
fn sbc(cpu: &mut CPU, memory: &mut Memory, mode: AddressingMode, base: u8) -> u8 {
    let (value, extra_cycles) = read_operand(cpu, memory, mode);
    if cpu.decimal_mode_set() {
        decimal_subtract(cpu, value);
    } else {
        binary_add(cpu, !value);
    }
    base + extra_cycles
}

// Logical operations.

/// AND - Logical AND
fn and(cpu: &mut CPU, memory: &mut Memory, mode: AddressingMode, base: u8) -> u8 {
    let (value, extra_cycles) = read_operand(cpu, memory, mode);
    cpu.a &= value;
    let a = cpu.a;
    cpu.toggle_zero_flag(a);
    cpu.toggle_negative_flag(a);
    base + extra_cycles
}

/// EOR - Exclusive OR
fn eor(cpu: &mut CPU, memory: &mut Memory, mode: AddressingMode, base: u8) -> u8 {
    let (value, extra_cycles) = read_operand(cpu, memory, mode);
    cpu.a ^= value;
    let a = cpu.a;
    cpu.toggle_zero_flag(a);
    cpu.toggle_negative_flag(a);
    base + extra_cycles
}

/// ORA - Logical Inclusive OR
fn ora(cpu: &mut CPU, memory: &mut Memory, mode: AddressingMode, base: u8) -> u8 {
    let (value, extra_cycles) = read_operand(cpu, memory, mode);
    cpu.a |= value;
    let a = cpu.a;
    cpu.toggle_zero_flag(a);
    cpu.toggle_negative_flag(a);
    base + extra_cycles
}

/// BIT - Bit Test
///
/// Negative and overflow come straight from bits 7 and 6 of the operand,
/// not from the AND result; only the zero flag looks at the conjunction.
fn bit(cpu: &mut CPU, memory: &mut Memory, mode: AddressingMode, base: u8) -> u8 {
    let (value, extra_cycles) = read_operand(cpu, memory, mode);
    let masked = cpu.a & value;
    cpu.toggle_zero_flag(masked);
    cpu.toggle_negative_flag(value);
    cpu.toggle_overflow_flag(value & 0x40 != 0);
    base + extra_cycles
}

// Shift and rotate operations.

/// ASL - Arithmetic Shift Left
fn asl(cpu: &mut CPU, memory: &mut Memory, mode: AddressingMode, base: u8) -> u8 {
    let result = modify(cpu, memory, mode, |cpu, value| {
        cpu.toggle_carry_flag(arithmetic::is_negative(value));
        value << 1
    });
    cpu.toggle_zero_flag(result);
    cpu.toggle_negative_flag(result);
    base
}

/// LSR - Logical Shift Right
fn lsr(cpu: &mut CPU, memory: &mut Memory, mode: AddressingMode, base: u8) -> u8 {
    let result = modify(cpu, memory, mode, |cpu, value| {
        cpu.toggle_carry_flag(value & 0x01 != 0);
        value >> 1
    });
    cpu.toggle_zero_flag(result);
    cpu.toggle_negative_flag(result);
    base
}

/// ROL - Rotate Left
fn rol(cpu: &mut CPU, memory: &mut Memory, mode: AddressingMode, base: u8) -> u8 {
    let result = modify(cpu, memory, mode, |cpu, value| {
        let carry_in = if cpu.carry_flag_set() { 0x01 } else { 0x00 };
        cpu.toggle_carry_flag(arithmetic::is_negative(value));
        value << 1 | carry_in
    });
    cpu.toggle_zero_flag(result);
    cpu.toggle_negative_flag(result);
    base
}

/// ROR - Rotate Right
fn ror(cpu: &mut CPU, memory: &mut Memory, mode: AddressingMode, base: u8) -> u8 {
    let result = modify(cpu, memory, mode, |cpu, value| {
        let carry_in = if cpu.carry_flag_set() { 0x80 } else { 0x00 };
        cpu.toggle_carry_flag(value & 0x01 != 0);
        value >> 1 | carry_in
    });
    cpu.toggle_zero_flag(result);
    cpu.toggle_negative_flag(result);
    base
}

// Flag operations.

/// CLC - Clear Carry Flag
fn clc(cpu: &mut CPU, base: u8) -> u8 {
    cpu.unset_carry_flag();
    base
}

/// CLD - Clear Decimal Mode
fn cld(cpu: &mut CPU, base: u8) -> u8 {
    cpu.unset_decimal_mode();
    base
}

/// CLI - Clear Interrupt Disable
fn cli(cpu: &mut CPU, base: u8) -> u8 {
    cpu.unset_interrupt_disable();
    base
}

/// CLV - Clear Overflow Flag
fn clv(cpu: &mut CPU, base: u8) -> u8 {
    cpu.unset_overflow_flag();
    base
}

/// SEC - Set Carry Flag
fn sec(cpu: &mut CPU, base: u8) -> u8 {
    cpu.set_carry_flag();
    base
}

/// SED - Set Decimal Flag
fn sed(cpu: &mut CPU, base: u8) -> u8 {
    cpu.set_decimal_mode();
    base
}

/// SEI - Set Interrupt Disable
fn sei(cpu: &mut CPU, base: u8) -> u8 {
    cpu.set_interrupt_disable();
    base
}

// Comparison operations.

/// CMP - Compare Accumulator
fn cmp(cpu: &mut CPU, memory: &mut Memory, mode: AddressingMode, base: u8) -> u8 {
    let (value, extra_cycles) = read_operand(cpu, memory, mode);
    let a = cpu.a;
    compare(cpu, a, value);
    base + extra_cycles
}

/// CPX - Compare X Register
fn cpx(cpu: &mut CPU, memory: &mut Memory, mode: AddressingMode, base: u8) -> u8 {
    let (value, extra_cycles) = read_operand(cpu, memory, mode);
    let x = cpu.x;
    compare(cpu, x, value);
    base + extra_cycles
}

/// CPY - Compare Y Register
fn cpy(cpu: &mut CPU, memory: &mut Memory, mode: AddressingMode, base: u8) -> u8 {
    let (value, extra_cycles) = read_operand(cpu, memory, mode);
    let y = cpu.y;
    compare(cpu, y, value);
    base + extra_cycles
}

// Branch operations.

/// BCC - Branch if Carry Clear
fn bcc(cpu: &mut CPU, memory: &mut Memory, mode: AddressingMode, base: u8) -> u8 {
    let taken = !cpu.carry_flag_set();
    branch(cpu, memory, mode, base, taken)
}

/// BCS - Branch if Carry Set
fn bcs(cpu: &mut CPU, memory: &mut Memory, mode: AddressingMode, base: u8) -> u8 {
    let taken = cpu.carry_flag_set();
    branch(cpu, memory, mode, base, taken)
}

/// BEQ - Branch if Equal
fn beq(cpu: &mut CPU, memory: &mut Memory, mode: AddressingMode, base: u8) -> u8 {
    let taken = cpu.zero_flag_set();
    branch(cpu, memory, mode, base, taken)
}

/// BMI - Branch if Minus
fn bmi(cpu: &mut CPU, memory: &mut Memory, mode: AddressingMode, base: u8) -> u8 {
    let taken = cpu.negative_flag_set();
    branch(cpu, memory, mode, base, taken)
}

/// BNE - Branch if Not Equal
fn bne(cpu: &mut CPU, memory: &mut Memory, mode: AddressingMode, base: u8) -> u8 {
    let taken = !cpu.zero_flag_set();
    branch(cpu, memory, mode, base, taken)
}

/// BPL - Branch if Positive
fn bpl(cpu: &mut CPU, memory: &mut Memory, mode: AddressingMode, base: u8) -> u8 {
    let taken = !cpu.negative_flag_set();
    branch(cpu, memory, mode, base, taken)
}

/// BVC - Branch if Overflow Clear
fn bvc(cpu: &mut CPU, memory: &mut Memory, mode: AddressingMode, base: u8) -> u8 {
    let taken = !cpu.overflow_flag_set();
    branch(cpu, memory, mode, base, taken)
}

/// BVS - Branch if Overflow Set
fn bvs(cpu: &mut CPU, memory: &mut Memory, mode: AddressingMode, base: u8) -> u8 {
    let taken = cpu.overflow_flag_set();
    branch(cpu, memory, mode, base, taken)
}

// Jump and call operations.

/// JMP - Jump
fn jmp(cpu: &mut CPU, memory: &mut Memory, mode: AddressingMode, base: u8) -> u8 {
    let (addr, _) = mode.resolve(cpu, memory);
    cpu.pc = addr;
    base
}

/// JSR - Jump to Subroutine
///
/// The pushed return address is one byte short of the next instruction; RTS
/// compensates by incrementing the popped address.
fn jsr(cpu: &mut CPU, memory: &mut Memory, mode: AddressingMode, base: u8) -> u8 {
    let (addr, _) = mode.resolve(cpu, memory);
    let return_addr = cpu.pc.wrapping_sub(1);
    memory.stack_push_u16(cpu, return_addr);
    cpu.pc = addr;
    base
}

/// RTS - Return from Subroutine
fn rts(cpu: &mut CPU, memory: &mut Memory, base: u8) -> u8 {
    let return_addr = memory.stack_pop_u16(cpu);
    cpu.pc = return_addr.wrapping_add(1);
    base
}

// Interrupt operations.

/// BRK - Force Interrupt
///
/// Pushes the program counter past the padding byte that follows the opcode
/// and the flags with the break and unused bits set, then enters the IRQ
/// handler. Unlike a hardware IRQ, BRK goes through even when the interrupt
/// disable flag is already set.
fn brk(cpu: &mut CPU, memory: &mut Memory, mode: AddressingMode, base: u8) -> u8 {
    mode.resolve(cpu, memory);

    let return_addr = cpu.pc.wrapping_add(1);
    let flags = cpu.p | BREAK_COMMAND | UNUSED_FLAG;
    memory.stack_push_u16(cpu, return_addr);
    memory.stack_push_u8(cpu, flags);
    cpu.set_interrupt_disable();
    cpu.pc = memory.read_u16(IRQ_VECTOR);
    base
}

/// RTI - Return from Interrupt
///
/// The popped program counter is used as-is, without the +1 adjustment RTS
/// performs. Bits 4 and 5 of the restored flags read as set no matter what
/// the stack holds.
fn rti(cpu: &mut CPU, memory: &mut Memory, base: u8) -> u8 {
    let flags = memory.stack_pop_u8(cpu);
    cpu.p = flags | BREAK_COMMAND | UNUSED_FLAG;
    cpu.pc = memory.stack_pop_u16(cpu);
    base
}

// Everything else.

/// NOP - No Operation
fn nop(cpu: &mut CPU, memory: &mut Memory, mode: AddressingMode, base: u8) -> u8 {
    mode.resolve(cpu, memory);
    base
}

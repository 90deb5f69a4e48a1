// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use io::log;
use mos6502::instruction::Instruction;
use mos6502::memory::Memory;
use mos6502::mos6502::RuntimeOptions;
use mos6502::opcode::{AddressingMode, Mnemonic};
use std::error::Error;
use std::fmt;
use utils::arithmetic;

// Flag constants that allow easy bitwise getting and setting of flag values.
pub const CARRY_FLAG       : u8 = 0x1;
pub const ZERO_FLAG        : u8 = 0x2;
pub const INTERRUPT_DISABLE: u8 = 0x4;
pub const DECIMAL_MODE     : u8 = 0x8;
pub const BREAK_COMMAND    : u8 = 0x10;
pub const UNUSED_FLAG      : u8 = 0x20;
pub const OVERFLOW_FLAG    : u8 = 0x40;
pub const NEGATIVE_FLAG    : u8 = 0x80;

// Fixed locations of the interrupt and reset vectors. Each vector is a
// 16-bit little-endian address near the top of the address space that the
// CPU loads into the program counter when the corresponding event fires.
pub const NMI_VECTOR  : usize = 0xFFFA;
pub const RESET_VECTOR: usize = 0xFFFC;
pub const IRQ_VECTOR  : usize = 0xFFFE;

// Cycle costs of the hardware sequences that are not ordinary instructions.
const RESET_CYCLES    : u8 = 8;
const INTERRUPT_CYCLES: u8 = 7;

/// Errors that stop emulation dead in its tracks. A CPU has no concept of
/// retrying, so every variant here is fatal to the current run and must be
/// reported to whatever is driving the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmulationError {
    /// The fetched opcode byte has no documented instruction mapped to it.
    /// This means the program counter wandered into data or the program
    /// relies on undocumented opcodes, which are not implemented.
    IllegalOpcode { opcode: u8, pc: u16 },
}

impl fmt::Display for EmulationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            EmulationError::IllegalOpcode { opcode, pc } => {
                write!(f, "Illegal opcode {:#04X} fetched at {:#06X}", opcode, pc)
            },
        }
    }
}

impl Error for EmulationError {
    fn description(&self) -> &str {
        match *self {
            EmulationError::IllegalOpcode { .. } => "illegal opcode",
        }
    }
}

/// This is an implementation of the NMOS 6502 processor. Unlike the 2A03
/// derivative used in game consoles, the original part has a working decimal
/// mode, so ADC and SBC here honor binary-coded decimal arithmetic whenever
/// the decimal flag is set.
///
/// Much of the information and comments are due credit to www.obelisk.me.uk,
/// which has really good information about the 6502 processor. If you're
/// interested in diving further, I recommend you give that site a visit.
///
/// The CPU is clocked externally: the embedding application calls step once
/// per clock cycle and the CPU spreads every instruction over its real cycle
/// cost by counting spent cycles down between fetches.
pub struct CPU {
    // The program counter is a 16-bit register which points to the next
    // instruction to be executed. The value of program counter is modified
    // automatically as instructions are executed.
    //
    // The value of the program counter can be modified by executing a jump, a
    // relative branch, a subroutine call to another memory address, by
    // returning from a subroutine, or by an interrupt.
    pub pc: u16,

    // The processor supports a 256 byte stack located between $0100 and $01FF.
    // The stack pointer is an 8-bit register and holds the next free location
    // on the stack. The location of the stack is fixed and cannot be moved and
    // grows downwards.
    pub sp: u8,

    // The 8-bit accumulator is used all arithmetic and logical operations (with
    // the exception of increments and decrements). The contents of the
    // accumulator can be stored and retrieved either from memory or the stack.
    pub a: u8,

    // The 8-bit X register can be used to control information, compare values
    // in memory, and be incremented or decremented. The X register is special
    // as it can be used to get a copy of the stack pointer or change its value.
    pub x: u8,

    // The 8-bit Y register like X, can be used to manage information and be
    // incremented or decremented; however it doesn't have any special functions
    // like the X register does.
    pub y: u8,

    // The Processor Status register contains a list of flags that are set and
    // cleared by instructions to record the results of operations. Each flag
    // has a special bit within the register (8 bits). Instructions exist to
    // set, clear, and read the various flags. One even allows pushing or
    // pulling the flags to the stack.
    //
    // Carry Flag:
    //
    // The carry flag is set if the last operation caused an overflow from bit 7
    // of the result or an underflow from bit 0. This condition is set during
    // arithmetic, comparison and during logical shifts. It can be explicitly
    // set using the 'Set Carry Flag' (SEC) instruction and cleared with 'Clear
    // Carry Flag' (CLC).
    //
    // Zero Flag:
    //
    // The zero flag is set if the result of the last operation as was zero.
    //
    // Interrupt Disable:
    //
    // The interrupt disable flag is set if the program has executed a 'Set
    // Interrupt Disable' (SEI) instruction. While this flag is set the
    // processor will not respond to IRQ interrupts from devices until it is
    // cleared by a 'Clear Interrupt Disable' (CLI) instruction. Non-maskable
    // interrupts ignore this flag.
    //
    // Decimal Mode:
    //
    // While the decimal mode flag is set the processor will obey the rules of
    // Binary Coded Decimal (BCD) arithmetic during addition and subtraction.
    // The flag can be explicitly set using 'Set Decimal Flag' (SED) and cleared
    // with 'Clear Decimal Flag' (CLD).
    //
    // Break Command:
    //
    // The break command bit is set in the copy of the flags pushed to the
    // stack when a BRK instruction or PHP pushes them, and cleared in the
    // copy pushed by hardware interrupt servicing. The live register bit is
    // never trusted on pulls.
    //
    // Unused Flag:
    //
    // Bit 5 has no meaning in the processor. It is forced to one in every
    // flags byte pushed to the stack and ignored when flags are pulled.
    //
    // Overflow Flag:
    //
    // The overflow flag is set during arithmetic operations if the result has
    // yielded an invalid 2's complement result (e.g. adding to positive numbers
    // and ending up with a negative result: 64 + 64 => -128). It is determined
    // by looking at the carry between bits 6 and 7 and between bit 7 and the
    // carry flag.
    //
    // Negative Flag:
    //
    // The negative flag is set if the result of the last operation had bit 7
    // set to a one.
    pub p: u8,

    // The amount of cycles the currently executing operation still has to
    // pay for. Instructions take a different amount of cycles to complete
    // depending on their complexity, and the CPU only fetches again once the
    // previous instruction's cycles have all been spent.
    pub cycles: u8,

    // Interrupt lines. Peripherals raise these at any time and the CPU
    // samples them at the next instruction boundary; raising a line twice
    // before it is serviced is indistinguishable from raising it once.
    irq_pending: bool,
    nmi_pending: bool,

    // Descriptor of the most recently dispatched instruction, kept around so
    // tooling layered on top of the emulator can see what is executing.
    current: Option<Instruction>,

    // Options passed from the command-line that may influence how the CPU
    // behaves.
    runtime_options: RuntimeOptions,
}

impl CPU {
    pub fn new(runtime_options: RuntimeOptions) -> CPU {
        CPU {
            pc: 0,
            sp: 0xFD,
            a: 0,
            x: 0,
            y: 0,
            p: 0,
            cycles: 0,
            irq_pending: false,
            nmi_pending: false,
            current: None,
            runtime_options: runtime_options,
        }
    }

    /// Sets the carry flag in the status register.
    #[inline(always)]
    pub fn set_carry_flag(&mut self) {
        self.p |= CARRY_FLAG;
    }

    /// Sets the zero flag in the status register.
    #[inline(always)]
    pub fn set_zero_flag(&mut self) {
        self.p |= ZERO_FLAG;
    }

    /// Sets the interrupt disable flag in the status register.
    #[inline(always)]
    pub fn set_interrupt_disable(&mut self) {
        self.p |= INTERRUPT_DISABLE;
    }

    /// Sets the decimal mode flag in the status register.
    #[inline(always)]
    pub fn set_decimal_mode(&mut self) {
        self.p |= DECIMAL_MODE;
    }

    /// Sets the break command flag in the status register.
    #[inline(always)]
    pub fn set_break_command(&mut self) {
        self.p |= BREAK_COMMAND;
    }

    /// Sets the unused flag in the status register.
    #[inline(always)]
    pub fn set_unused_flag(&mut self) {
        self.p |= UNUSED_FLAG;
    }

    /// Sets the overflow flag in the status register.
    #[inline(always)]
    pub fn set_overflow_flag(&mut self) {
        self.p |= OVERFLOW_FLAG;
    }

    /// Sets the negative flag in the status register.
    #[inline(always)]
    pub fn set_negative_flag(&mut self) {
        self.p |= NEGATIVE_FLAG;
    }

    /// Unsets the carry flag in the status register.
    #[inline(always)]
    pub fn unset_carry_flag(&mut self) {
        self.p &= !CARRY_FLAG;
    }

    /// Unsets the zero flag in the status register.
    #[inline(always)]
    pub fn unset_zero_flag(&mut self) {
        self.p &= !ZERO_FLAG;
    }

    /// Unsets the interrupt disable flag in the status register.
    #[inline(always)]
    pub fn unset_interrupt_disable(&mut self) {
        self.p &= !INTERRUPT_DISABLE;
    }

    /// Unsets the decimal mode flag in the status register.
    #[inline(always)]
    pub fn unset_decimal_mode(&mut self) {
        self.p &= !DECIMAL_MODE;
    }

    /// Unsets the break command flag in the status register.
    #[inline(always)]
    pub fn unset_break_command(&mut self) {
        self.p &= !BREAK_COMMAND;
    }

    /// Unsets the unused flag in the status register.
    #[inline(always)]
    pub fn unset_unused_flag(&mut self) {
        self.p &= !UNUSED_FLAG;
    }

    /// Unsets the overflow flag in the status register.
    #[inline(always)]
    pub fn unset_overflow_flag(&mut self) {
        self.p &= !OVERFLOW_FLAG;
    }

    /// Unsets the negative flag in the status register.
    #[inline(always)]
    pub fn unset_negative_flag(&mut self) {
        self.p &= !NEGATIVE_FLAG;
    }

    /// Checks if the carry flag is set in the status register.
    #[inline(always)]
    pub fn carry_flag_set(&self) -> bool {
        self.p & CARRY_FLAG == CARRY_FLAG
    }

    /// Checks if the zero flag is set in the status register.
    #[inline(always)]
    pub fn zero_flag_set(&self) -> bool {
        self.p & ZERO_FLAG == ZERO_FLAG
    }

    /// Checks if the interrupt disable flag is set in the status register.
    #[inline(always)]
    pub fn interrupt_disable_set(&self) -> bool {
        self.p & INTERRUPT_DISABLE == INTERRUPT_DISABLE
    }

    /// Checks if the decimal mode flag is set in the status register.
    #[inline(always)]
    pub fn decimal_mode_set(&self) -> bool {
        self.p & DECIMAL_MODE == DECIMAL_MODE
    }

    /// Checks if the break command flag is set in the status register.
    #[inline(always)]
    pub fn break_command_set(&self) -> bool {
        self.p & BREAK_COMMAND == BREAK_COMMAND
    }

    /// Checks if the unused flag is set in the status register.
    #[inline(always)]
    pub fn unused_flag_set(&self) -> bool {
        self.p & UNUSED_FLAG == UNUSED_FLAG
    }

    /// Checks if the overflow flag is set in the status register.
    #[inline(always)]
    pub fn overflow_flag_set(&self) -> bool {
        self.p & OVERFLOW_FLAG == OVERFLOW_FLAG
    }

    /// Checks if the negative flag is set in the status register.
    #[inline(always)]
    pub fn negative_flag_set(&self) -> bool {
        self.p & NEGATIVE_FLAG == NEGATIVE_FLAG
    }

    /// Sets the carry flag if the passed condition is true, otherwise the
    /// flag is unset.
    #[inline(always)]
    pub fn toggle_carry_flag(&mut self, condition: bool) {
        if condition {
            self.set_carry_flag();
        } else {
            self.unset_carry_flag();
        }
    }

    /// Sets the zero flag if the value passed (typically a reference to a
    /// register) is zero, otherwise it's unset.
    #[inline(always)]
    pub fn toggle_zero_flag(&mut self, value: u8) {
        if value == 0 {
            self.set_zero_flag();
        } else {
            self.unset_zero_flag();
        }
    }

    /// Sets the overflow flag if the passed condition is true, otherwise the
    /// flag is unset.
    #[inline(always)]
    pub fn toggle_overflow_flag(&mut self, condition: bool) {
        if condition {
            self.set_overflow_flag();
        } else {
            self.unset_overflow_flag();
        }
    }

    /// Sets the negative flag if the value passed (typically a reference to a
    /// register) would be negative as a signed number, otherwise it's unset.
    #[inline(always)]
    pub fn toggle_negative_flag(&mut self, value: u8) {
        if arithmetic::is_negative(value) {
            self.set_negative_flag();
        } else {
            self.unset_negative_flag();
        }
    }

    /// Returns the mnemonic of the most recently dispatched instruction, if
    /// any instruction has been dispatched since the last reset.
    pub fn current_mnemonic(&self) -> Option<Mnemonic> {
        match self.current {
            Some(ref instruction) => Some(instruction.mnemonic),
            None => None,
        }
    }

    /// Returns the addressing mode of the most recently dispatched
    /// instruction, if any instruction has been dispatched since the last
    /// reset.
    pub fn current_addressing_mode(&self) -> Option<AddressingMode> {
        match self.current {
            Some(ref instruction) => Some(instruction.mode),
            None => None,
        }
    }

    /// Raises the IRQ line. The request is remembered until the CPU samples
    /// it at an instruction boundary, where it is serviced only if the
    /// interrupt disable flag is clear; a masked request stays pending.
    pub fn raise_irq(&mut self) {
        self.irq_pending = true;
    }

    /// Raises the NMI line. Non-maskable interrupts are always serviced at
    /// the next instruction boundary regardless of the interrupt disable
    /// flag.
    pub fn raise_nmi(&mut self) {
        self.nmi_pending = true;
    }

    /// Puts the CPU into the documented post-reset state: registers zeroed,
    /// all flags cleared, the stack pointer at 0xFD and the program counter
    /// loaded from the reset vector. The reset sequence occupies the CPU for
    /// 8 cycles before the first instruction is fetched.
    pub fn reset(&mut self, memory: &mut Memory) {
        self.a = 0;
        self.x = 0;
        self.y = 0;
        self.p = 0;
        self.sp = 0xFD;
        self.pc = memory.read_u16(RESET_VECTOR);
        self.cycles = RESET_CYCLES;
        self.irq_pending = false;
        self.nmi_pending = false;
        self.current = None;

        log::log("cpu", format!("Reset, execution starts at {:#06X}", self.pc),
                 &self.runtime_options);
    }

    /// Advances the CPU by a single clock cycle. Most cycles only count down
    /// the cost of the operation already in flight; at an instruction
    /// boundary (no cycles left to pay) the CPU either services a pending
    /// interrupt or fetches, decodes and executes the next instruction in a
    /// single step and then spreads its cost over the following ticks.
    ///
    /// Interrupt servicing quirk: the NMI line is sampled right after an IRQ
    /// request was considered, so an NMI that arrives together with an IRQ
    /// is serviced back-to-back after it (or alone, when the IRQ is masked).
    /// Real hardware latches NMI on signal edges independently of IRQ; this
    /// simplification matches the behavior of the original design.
    pub fn step(&mut self, memory: &mut Memory) -> Result<(), EmulationError> {
        if self.cycles == 0 {
            let mut serviced = false;

            if self.irq_pending {
                serviced = self.interrupt(memory);
            }
            if self.nmi_pending {
                self.non_maskable_interrupt(memory);
                serviced = true;
            }

            // A masked IRQ with no NMI behind it leaves the boundary free,
            // so the CPU carries on fetching like nothing happened.
            if !serviced {
                try!(self.execute(memory));
            }
        }

        self.cycles -= 1;
        Ok(())
    }

    /// Parses the instruction at the address the program counter currently
    /// points to and executes it, leaving its total cycle cost in the cycle
    /// counter. All instruction logic is in instruction.rs.
    fn execute(&mut self, memory: &mut Memory) -> Result<(), EmulationError> {
        let pc = self.pc;
        let opcode = memory.read_u8(pc as usize);
        self.pc = self.pc.wrapping_add(1);

        let instruction = try!(Instruction::decode(opcode, pc));
        if self.runtime_options.verbose {
            // Log fragments are formatted to be easy to diff against the
            // trace output of other emulators.
            log::log("cpu", format!(
                "{:04X}  {:02X}  {:?} {:<11}  A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X}",
                pc, opcode, instruction.mnemonic,
                format!("{:?}", instruction.mode), self.a, self.x, self.y,
                self.p, self.sp), &self.runtime_options);
        }

        self.current = Some(instruction);
        self.cycles = instruction.execute(self, memory);
        Ok(())
    }

    /// Services a pending IRQ request if the interrupt disable flag allows
    /// it. Returns true if the interrupt sequence actually ran. The flags
    /// byte pushed by hardware interrupts carries the break bit cleared and
    /// the unused bit set; the live status register is not modified beyond
    /// setting interrupt disable.
    fn interrupt(&mut self, memory: &mut Memory) -> bool {
        if self.interrupt_disable_set() {
            return false;
        }

        let pc = self.pc;
        let flags = (self.p | UNUSED_FLAG) & !BREAK_COMMAND;
        memory.stack_push_u16(self, pc);
        memory.stack_push_u8(self, flags);
        self.set_interrupt_disable();
        self.pc = memory.read_u16(IRQ_VECTOR);
        self.cycles = INTERRUPT_CYCLES;
        self.irq_pending = false;

        log::log("cpu", format!("IRQ serviced, handler at {:#06X}", self.pc),
                 &self.runtime_options);
        true
    }

    /// Services a pending NMI request. Identical to IRQ servicing except
    /// that the interrupt disable flag is ignored and the handler address
    /// comes from the NMI vector.
    fn non_maskable_interrupt(&mut self, memory: &mut Memory) {
        let pc = self.pc;
        let flags = (self.p | UNUSED_FLAG) & !BREAK_COMMAND;
        memory.stack_push_u16(self, pc);
        memory.stack_push_u8(self, flags);
        self.set_interrupt_disable();
        self.pc = memory.read_u16(NMI_VECTOR);
        self.cycles = INTERRUPT_CYCLES;
        self.nmi_pending = false;

        log::log("cpu", format!("NMI serviced, handler at {:#06X}", self.pc),
                 &self.runtime_options);
    }

    /// Returns "SET" if the passed boolean is true, otherwise "UNSET". This
    /// function is used to display flags when the CPU crashes.
    fn fmt_flag(flag: bool) -> &'static str {
        if flag { "SET" } else { "UNSET" }
    }
}

impl fmt::Display for CPU {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "\nCPU State:").unwrap();
        writeln!(f, "    Program Counter: {:#X}", self.pc).unwrap();
        writeln!(f, "    Stack Pointer:   {:#X}", self.sp).unwrap();
        writeln!(f, "    Accumulator:     {:#X}", self.a).unwrap();
        writeln!(f, "    X Register:      {:#X}", self.x).unwrap();
        writeln!(f, "    Y Register:      {:#X}", self.y).unwrap();
        writeln!(f, "").unwrap();
        writeln!(f, "Status Register: {:#X}", self.p).unwrap();
        writeln!(f, "    Carry Flag:        {}", CPU::fmt_flag(self.carry_flag_set())).unwrap();
        writeln!(f, "    Zero Flag:         {}", CPU::fmt_flag(self.zero_flag_set())).unwrap();
        writeln!(f, "    Interrupt Disable: {}", CPU::fmt_flag(self.interrupt_disable_set())).unwrap();
        writeln!(f, "    Decimal Mode:      {}", CPU::fmt_flag(self.decimal_mode_set())).unwrap();
        writeln!(f, "    Break Command:     {}", CPU::fmt_flag(self.break_command_set())).unwrap();
        writeln!(f, "    Overflow Flag:     {}", CPU::fmt_flag(self.overflow_flag_set())).unwrap();
        writeln!(f, "    Negative Flag:     {}", CPU::fmt_flag(self.negative_flag_set()))
    }
}

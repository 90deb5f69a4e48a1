// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use io::log;
use mos6502::cpu::{CPU, EmulationError, RESET_VECTOR};
use mos6502::memory::Memory;

/// Options passed from the command-line that alter how the emulator runs.
/// A copy travels with the CPU so the internals can consult them without
/// threading them through every call.
#[derive(Debug, Clone, Default)]
pub struct RuntimeOptions {
    // Prints emulator internals (retired instructions, serviced interrupts)
    // to stdout while running.
    pub verbose: bool,

    // Starts the emulator with the interactive debugger attached instead of
    // free-running.
    pub debug: bool,

    // Address the program image is copied to before execution starts.
    pub origin: u16,

    // Optional override written to the reset vector before the CPU is
    // reset. Program images that cover the vectors themselves don't need it.
    pub entry: Option<u16>,

    // Stops the run loop once this many clock cycles have been spent.
    pub cycle_limit: Option<u64>,
}

/// The whole emulated machine: a 6502 wired up to 64kB of flat memory. This
/// is the layer embedding applications talk to; it loads program images,
/// owns the clock loop and forwards interrupt lines to the CPU.
pub struct MOS6502 {
    pub cpu: CPU,
    pub memory: Memory,
    pub runtime_options: RuntimeOptions,
}

impl MOS6502 {
    /// Builds a machine with the passed program image copied into memory at
    /// the configured origin. The CPU comes out of this reset and ready to
    /// fetch its first instruction from wherever the reset vector points.
    pub fn new(program: &[u8], runtime_options: RuntimeOptions) -> MOS6502 {
        let mut memory = Memory::new();
        memory.memdump(runtime_options.origin as usize, program);

        // Programs that don't cover the vector table get their entry point
        // poked into the reset vector directly.
        if let Some(entry) = runtime_options.entry {
            memory.write_u16(RESET_VECTOR, entry);
        }

        let mut cpu = CPU::new(runtime_options.clone());
        cpu.reset(&mut memory);

        log::log("mos6502", format!("Loaded {} byte program at {:#06X}",
                 program.len(), runtime_options.origin), &runtime_options);

        MOS6502 {
            cpu: cpu,
            memory: memory,
            runtime_options: runtime_options,
        }
    }

    /// Advances the machine by a single clock cycle.
    pub fn step(&mut self) -> Result<(), EmulationError> {
        self.cpu.step(&mut self.memory)
    }

    /// Advances the machine through one fetch and returns the amount of
    /// cycles that took. Cycles still owed by a previous operation (the
    /// reset delay, most notably) are paid off first; the boundary step then
    /// either dispatches an instruction or services a pending interrupt, and
    /// its cost is paid down to the next boundary.
    pub fn step_instruction(&mut self) -> Result<u64, EmulationError> {
        let mut cycles: u64 = 0;

        while self.cpu.cycles > 0 {
            try!(self.cpu.step(&mut self.memory));
            cycles += 1;
        }

        try!(self.cpu.step(&mut self.memory));
        cycles += 1;
        while self.cpu.cycles > 0 {
            try!(self.cpu.step(&mut self.memory));
            cycles += 1;
        }

        Ok(cycles)
    }

    /// Raises the IRQ line of the CPU.
    pub fn raise_irq(&mut self) {
        self.cpu.raise_irq();
    }

    /// Raises the NMI line of the CPU.
    pub fn raise_nmi(&mut self) {
        self.cpu.raise_nmi();
    }

    /// Re-runs the reset sequence. Memory contents are left alone.
    pub fn reset(&mut self) {
        self.cpu.reset(&mut self.memory);
    }

    /// Runs the machine until the program parks itself or the configured
    /// cycle limit runs out, whichever comes first, and returns the total
    /// amount of cycles spent.
    ///
    /// 6502 test programs conventionally signal completion by jumping to
    /// their own address in an infinite loop, so an instruction that leaves
    /// the program counter where it started is treated as the end of the
    /// program.
    pub fn run(&mut self) -> Result<u64, EmulationError> {
        let mut total: u64 = 0;

        loop {
            let boundary_pc = self.cpu.pc;
            total += try!(self.step_instruction());

            if self.cpu.pc == boundary_pc {
                log::log("mos6502", format!(
                    "Program parked at {:#06X} after {} cycles",
                    boundary_pc, total), &self.runtime_options);
                return Ok(total);
            }

            if let Some(limit) = self.runtime_options.cycle_limit {
                if total >= limit {
                    log::log("mos6502", format!(
                        "Cycle limit of {} reached", limit),
                        &self.runtime_options);
                    return Ok(total);
                }
            }
        }
    }
}

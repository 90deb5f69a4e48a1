// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use debugger::parser;
use io::log;
use mos6502::mos6502::MOS6502;
use std::io::{self, Write};
use std::sync::mpsc::Receiver;
use std::thread;
use std::time::Duration;

// Amount of memory bytes shown by the dump command when no length argument
// is given.
const DEFAULT_DUMP_LENGTH: usize = 16;

#[derive(Debug)]
enum Command {
    Stop,
    Continue,
    Step,
    Dump,
    Irq,
    Nmi,
    Reset,
    Quit,
}

struct CommandWithArguments {
    command: Command,
    args: Vec<String>,
}

/// Interactive monitor wrapped around the machine. Input arrives over a
/// channel from a thread reading stdin so the emulator can keep running
/// while the prompt sits idle.
pub struct Debugger {
    receiver: Receiver<String>,
    stepping: bool,
}

impl Debugger {
    pub fn new(receiver: Receiver<String>) -> Self {
        Debugger {
            receiver: receiver,
            stepping: true,
        }
    }

    /// Polls for debugger input and steps the machine forward a single
    /// instruction if execution isn't stopped. Returns false once the user
    /// asked to quit, signalling the driving loop to wind down.
    pub fn step(&mut self, machine: &mut MOS6502) -> bool {
        // Input is received from another thread so the emulator can run
        // without the debugger prompt blocking it.
        match self.receiver.try_recv() {
            Ok(input) => {
                match self.interpret(input) {
                    Some(command) => {
                        if !self.execute_command(command, machine) {
                            return false;
                        }
                    },
                    None => {
                        let mut stderr = io::stderr();
                        writeln!(stderr, "mos6502-rs: unknown command specified").unwrap();
                    },
                };
            },
            Err(_) => {}, // Ignore empty and disconnect errors.
        };

        // If the debugger is in stepping mode, continue execution like
        // normal, otherwise the CPU should not update. In the meantime,
        // sleep the host CPU while we wait for input.
        if self.stepping {
            self.advance(machine);
        } else {
            thread::sleep(Duration::from_millis(16));
        }
        true
    }

    /// Runs a single instruction, stopping execution with a state dump if
    /// the CPU ran into something fatal like an illegal opcode.
    fn advance(&mut self, machine: &mut MOS6502) {
        match machine.step_instruction() {
            Ok(_) => {},
            Err(e) => {
                let mut stderr = io::stderr();
                writeln!(stderr, "mos6502-rs: {}", e).unwrap();
                writeln!(stderr, "{}", machine.cpu).unwrap();
                self.stepping = false;
            },
        }
    }

    /// Parse a raw input string into a list of arguments and a command. This
    /// function also maps command names to their respective enums.
    fn interpret(&self, input: String) -> Option<CommandWithArguments> {
        let mut stderr = io::stderr();
        let args = match parser::input_to_arguments(input) {
            Ok(args) => args,
            Err(e) => {
                writeln!(stderr, "mos6502-rs: {}", e).unwrap();
                return None;
            },
        };

        let command = {
            let raw_command = if args.len() > 0 {
                &args[0]
            } else {
                writeln!(stderr, "mos6502-rs: no command specified").unwrap();
                return None;
            };

            // Map command strings to the command enum type.
            match raw_command.to_lowercase().as_str() {
                // Full commands.
                "stop"     => Command::Stop,
                "continue" => Command::Continue,
                "step"     => Command::Step,
                "dump"     => Command::Dump,
                "irq"      => Command::Irq,
                "nmi"      => Command::Nmi,
                "reset"    => Command::Reset,
                "quit"     => Command::Quit,
                // Aliases.
                "s" => Command::Stop,
                "c" => Command::Continue,
                "t" => Command::Step,
                "d" => Command::Dump,
                "q" => Command::Quit,
                // Unknown command.
                _ => {
                    return None;
                },
            }
        };

        Some({
            CommandWithArguments {
                command: command,
                args: args,
            }
        })
    }

    /// Executes the correct debugger command based on the enum passed.
    /// Returns false if the command asks the driving loop to terminate.
    fn execute_command(&mut self, command: CommandWithArguments, machine: &mut MOS6502) -> bool {
        match command.command {
            Command::Stop => self.execute_stop(machine),
            Command::Continue => self.execute_continue(machine),
            Command::Step => self.execute_step(machine),
            Command::Dump => self.execute_dump(machine, &command.args),
            Command::Irq => self.execute_irq(machine),
            Command::Nmi => self.execute_nmi(machine),
            Command::Reset => self.execute_reset(machine),
            Command::Quit => return false,
        };
        true
    }

    /// Stops execution of the CPU to allow the human some time to debug a
    /// problem or stare at hex codes all day to look like a l33t haxor.
    fn execute_stop(&mut self, machine: &mut MOS6502) {
        log::log("debugger", "Stopping execution now...", &machine.runtime_options);
        self.stepping = false;
    }

    /// Starts execution if it's stopped.
    fn execute_continue(&mut self, machine: &mut MOS6502) {
        log::log("debugger", "Starting execution now...", &machine.runtime_options);
        self.stepping = true;
    }

    /// Runs a single instruction while execution is stopped. Does nothing
    /// when the machine is free-running already.
    fn execute_step(&mut self, machine: &mut MOS6502) {
        if self.stepping {
            log::log("debugger", "Already running, stop execution first",
                     &machine.runtime_options);
            return;
        }
        self.advance(machine);
        println!("{}", machine.cpu);
    }

    /// Dumps the CPU state, and when given an address argument, a window of
    /// memory starting there.
    fn execute_dump(&mut self, machine: &mut MOS6502, args: &Vec<String>) {
        println!("{}", machine.cpu);

        if args.len() < 2 {
            return;
        }
        let addr = match parse_address(&args[1]) {
            Some(addr) => addr,
            None => {
                let mut stderr = io::stderr();
                writeln!(stderr, "mos6502-rs: invalid dump address").unwrap();
                return;
            },
        };
        let length = if args.len() > 2 {
            match args[2].parse::<usize>() {
                Ok(length) => length,
                Err(_) => DEFAULT_DUMP_LENGTH,
            }
        } else {
            DEFAULT_DUMP_LENGTH
        };

        for offset in 0..length {
            if offset % 8 == 0 {
                if offset > 0 {
                    println!("");
                }
                print!("{:04X}: ", addr as usize + offset);
            }
            print!("{:02X} ", machine.memory.read_u8(addr as usize + offset));
        }
        println!("");
    }

    /// Raises the IRQ line, as a peripheral would.
    fn execute_irq(&mut self, machine: &mut MOS6502) {
        log::log("debugger", "Raising IRQ line", &machine.runtime_options);
        machine.raise_irq();
    }

    /// Raises the NMI line, as a peripheral would.
    fn execute_nmi(&mut self, machine: &mut MOS6502) {
        log::log("debugger", "Raising NMI line", &machine.runtime_options);
        machine.raise_nmi();
    }

    /// Re-runs the reset sequence.
    fn execute_reset(&mut self, machine: &mut MOS6502) {
        log::log("debugger", "Resetting the CPU", &machine.runtime_options);
        machine.reset();
    }
}

/// Parses a memory address in hexadecimal (with an optional 0x prefix) or
/// decimal notation.
fn parse_address(arg: &str) -> Option<u16> {
    let parsed = if arg.starts_with("0x") || arg.starts_with("0X") {
        u16::from_str_radix(&arg[2..], 16)
    } else {
        arg.parse::<u16>()
    };

    match parsed {
        Ok(addr) => Some(addr),
        Err(_) => None,
    }
}

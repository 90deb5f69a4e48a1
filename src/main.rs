extern crate getopts;
extern crate mos6502_rs;

use getopts::Options;
use mos6502_rs::debugger::debugger::Debugger;
use mos6502_rs::io::binutils;
use mos6502_rs::io::errors::*;
use mos6502_rs::mos6502::memory::MEMORY_SIZE;
use mos6502_rs::mos6502::mos6502::{MOS6502, RuntimeOptions};
use std::env;
use std::io::{self, BufRead, Write};
use std::sync::mpsc;
use std::thread;

/// Prints usage information for the emulator binary.
fn print_usage(program: &str, opts: &Options) {
    let brief = format!("Usage: {} [options] PROGRAM", program);
    print!("{}", opts.usage(&brief));
}

/// Parses a 16-bit address in hexadecimal (with an optional 0x prefix) or
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

/// Runs the machine under the interactive debugger. A helper thread feeds
/// lines typed on stdin to the debugger over a channel so the emulation
/// loop never blocks on input.
fn debug_loop(machine: &mut MOS6502) {
    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if sender.send(line).is_err() {
                        break;
                    }
                },
                Err(_) => break,
            }
        }
    });

    let mut debugger = Debugger::new(receiver);
    while debugger.step(machine) {}
}

/// Initializes and starts the emulator. Returns an exit code after which the
/// program unwinds and stops executing. Once the emulator starts executing,
/// the application should only stop because the program ended, the cycle
/// limit ran out, or the CPU hit an illegal opcode.
fn init() -> i32 {
    let args: Vec<String> = env::args().collect();
    let program_name = args[0].clone();
    let mut stderr = io::stderr();

    let mut opts = Options::new();
    opts.optflag("h", "help", "print this help menu");
    opts.optflag("v", "verbose", "log emulator internals to stdout");
    opts.optflag("d", "debug", "start with the interactive debugger attached");
    opts.optopt("o", "origin", "address the program image is loaded at (default 0)", "ADDR");
    opts.optopt("e", "entry", "override the reset vector with this address", "ADDR");
    opts.optopt("l", "limit", "stop after this many clock cycles", "CYCLES");

    let matches = match opts.parse(&args[1..]) {
        Ok(matches) => matches,
        Err(e) => {
            writeln!(stderr, "{}: {}", program_name, e).unwrap();
            return EXIT_FAILURE;
        },
    };
    if matches.opt_present("h") {
        print_usage(&program_name, &opts);
        return EXIT_SUCCESS;
    }
    if matches.free.is_empty() {
        print_usage(&program_name, &opts);
        return EXIT_FAILURE;
    }

    let origin = match matches.opt_str("o") {
        Some(ref arg) => match parse_address(arg) {
            Some(addr) => addr,
            None => {
                writeln!(stderr, "{}: invalid origin address", program_name).unwrap();
                return EXIT_FAILURE;
            },
        },
        None => 0,
    };
    let entry = match matches.opt_str("e") {
        Some(ref arg) => match parse_address(arg) {
            Some(addr) => Some(addr),
            None => {
                writeln!(stderr, "{}: invalid entry address", program_name).unwrap();
                return EXIT_FAILURE;
            },
        },
        None => None,
    };
    let cycle_limit = match matches.opt_str("l") {
        Some(ref arg) => match arg.parse::<u64>() {
            Ok(limit) => Some(limit),
            Err(_) => {
                writeln!(stderr, "{}: invalid cycle limit", program_name).unwrap();
                return EXIT_FAILURE;
            },
        },
        None => None,
    };

    // Read the program image into memory. Images that don't fit in the
    // address space past their origin are rejected here; the CPU itself has
    // no concept of an invalid address.
    let program_path = &matches.free[0];
    let program = match binutils::read_bin(program_path) {
        Ok(program) => program,
        Err(e) => {
            writeln!(stderr, "{}: {}: {}", program_name, program_path, e).unwrap();
            return EXIT_INVALID_PROGRAM;
        },
    };
    if origin as usize + program.len() > MEMORY_SIZE {
        writeln!(stderr, "{}: {}: program does not fit in memory at {:#06X}",
                 program_name, program_path, origin).unwrap();
        return EXIT_INVALID_PROGRAM;
    }

    let runtime_options = RuntimeOptions {
        verbose: matches.opt_present("v"),
        debug: matches.opt_present("d"),
        origin: origin,
        entry: entry,
        cycle_limit: cycle_limit,
    };
    let mut machine = MOS6502::new(&program, runtime_options);

    if machine.runtime_options.debug {
        debug_loop(&mut machine);
        EXIT_SUCCESS
    } else {
        match machine.run() {
            Ok(cycles) => {
                println!("Program stopped after {} cycles at {:#06X}",
                         cycles, machine.cpu.pc);
                EXIT_SUCCESS
            },
            Err(e) => {
                writeln!(stderr, "{}: {}", program_name, e).unwrap();
                writeln!(stderr, "{}", machine.cpu).unwrap();
                EXIT_RUNTIME_FAILURE
            },
        }
    }
}

/// Entry point of the program and wrapper of init. Takes the exit code
/// returned from init and exits with it.
fn main() {
    let exit_code = init();
    std::process::exit(exit_code); // Unwinding done, safe to exit.
}

extern crate mos6502_rs;

use mos6502_rs::mos6502::cpu::CPU;
use mos6502_rs::mos6502::memory::Memory;
use mos6502_rs::mos6502::mos6502::RuntimeOptions;

/// Builds a CPU and memory with the given program placed at 0x8000 and the
/// reset vector pointing at it. The reset delay is drained so the first step
/// fetches the first instruction of the program.
fn setup(program: &[u8]) -> (CPU, Memory) {
    let mut memory = Memory::new();
    memory.memdump(0x8000, program);
    memory.write_u16(0xFFFC, 0x8000);

    let mut cpu = CPU::new(RuntimeOptions::default());
    cpu.reset(&mut memory);
    while cpu.cycles > 0 {
        cpu.step(&mut memory).unwrap();
    }
    (cpu, memory)
}

/// Runs one complete instruction and returns its total cycle cost.
fn step_instruction(cpu: &mut CPU, memory: &mut Memory) -> u32 {
    cpu.step(memory).unwrap();
    let mut cycles = 1;
    while cpu.cycles > 0 {
        cpu.step(memory).unwrap();
        cycles += 1;
    }
    cycles
}

#[test]
fn reset_sequence_costs_eight_cycles() {
    let mut memory = Memory::new();
    memory.write_u16(0xFFFC, 0x8000);

    let mut cpu = CPU::new(RuntimeOptions::default());
    cpu.reset(&mut memory);

    assert_eq!(cpu.cycles, 8);
}

#[test]
fn implied_and_immediate_instructions_cost_two() {
    let (mut cpu, mut memory) = setup(&[0xEA, 0xE8, 0xA9, 0x01]); // NOP; INX; LDA #$01
    assert_eq!(step_instruction(&mut cpu, &mut memory), 2);
    assert_eq!(step_instruction(&mut cpu, &mut memory), 2);
    assert_eq!(step_instruction(&mut cpu, &mut memory), 2);
}

#[test]
fn stack_push_and_pull_costs() {
    let (mut cpu, mut memory) = setup(&[0x48, 0x68]); // PHA; PLA
    assert_eq!(step_instruction(&mut cpu, &mut memory), 3);
    assert_eq!(step_instruction(&mut cpu, &mut memory), 4);
}

#[test]
fn lda_absolute_x_pays_for_page_cross() {
    // LDX #$01; LDA $20FF,X crosses into 0x2100 and pays an extra cycle.
    let (mut cpu, mut memory) = setup(&[0xA2, 0x01, 0xBD, 0xFF, 0x20]);
    step_instruction(&mut cpu, &mut memory);

    assert_eq!(step_instruction(&mut cpu, &mut memory), 5);
}

#[test]
fn lda_absolute_x_without_page_cross() {
    // LDX #$01; LDA $2000,X stays in the page and costs the base 4 cycles.
    let (mut cpu, mut memory) = setup(&[0xA2, 0x01, 0xBD, 0x00, 0x20]);
    step_instruction(&mut cpu, &mut memory);

    assert_eq!(step_instruction(&mut cpu, &mut memory), 4);
}

#[test]
fn lda_indirect_indexed_pays_for_page_cross() {
    // LDY #$01; LDA ($20),Y with a pointer to 0x20FF crosses a page.
    let (mut cpu, mut memory) = setup(&[0xA0, 0x01, 0xB1, 0x20]);
    memory.write_u8(0x0020, 0xFF);
    memory.write_u8(0x0021, 0x20);
    step_instruction(&mut cpu, &mut memory);

    assert_eq!(step_instruction(&mut cpu, &mut memory), 6);
}

#[test]
fn sta_absolute_x_never_pays_for_page_cross() {
    // LDX #$01; STA $20FF,X crosses a page but the store cost is fixed.
    let (mut cpu, mut memory) = setup(&[0xA2, 0x01, 0x9D, 0xFF, 0x20]);
    step_instruction(&mut cpu, &mut memory);

    assert_eq!(step_instruction(&mut cpu, &mut memory), 5);
}

#[test]
fn inc_absolute_x_cost_is_fixed() {
    // LDX #$01; INC $20FF,X: read-modify-write cost doesn't move with the
    // page cross.
    let (mut cpu, mut memory) = setup(&[0xA2, 0x01, 0xFE, 0xFF, 0x20]);
    step_instruction(&mut cpu, &mut memory);

    assert_eq!(step_instruction(&mut cpu, &mut memory), 7);
}

#[test]
fn branch_not_taken_costs_base_cycles() {
    // LDA #$01 clears the zero flag, so BEQ falls through.
    let (mut cpu, mut memory) = setup(&[0xA9, 0x01, 0xF0, 0x02]);
    step_instruction(&mut cpu, &mut memory);

    assert_eq!(step_instruction(&mut cpu, &mut memory), 2);
    assert_eq!(cpu.pc, 0x8004);
}

#[test]
fn branch_taken_costs_one_extra() {
    let (mut cpu, mut memory) = setup(&[0xA9, 0x01, 0xD0, 0x02]); // BNE +2
    step_instruction(&mut cpu, &mut memory);

    assert_eq!(step_instruction(&mut cpu, &mut memory), 3);
    assert_eq!(cpu.pc, 0x8006);
}

#[test]
fn branch_crossing_a_page_costs_two_extra() {
    // BNE -128 from 0x8004 lands in 0x7F84, crossing a page relative to the
    // instruction after the branch.
    let (mut cpu, mut memory) = setup(&[0xA9, 0x01, 0xD0, 0x80]);
    step_instruction(&mut cpu, &mut memory);

    assert_eq!(step_instruction(&mut cpu, &mut memory), 4);
    assert_eq!(cpu.pc, 0x7F84);
}

#[test]
fn jump_and_subroutine_costs() {
    // JMP $8003; JSR $8010; RTS.
    let (mut cpu, mut memory) = setup(&[0x4C, 0x03, 0x80, 0x20, 0x10, 0x80]);
    memory.write_u8(0x8010, 0x60);

    assert_eq!(step_instruction(&mut cpu, &mut memory), 3);
    assert_eq!(step_instruction(&mut cpu, &mut memory), 6);
    assert_eq!(step_instruction(&mut cpu, &mut memory), 6);
}

#[test]
fn jmp_indirect_costs_five() {
    let (mut cpu, mut memory) = setup(&[0x6C, 0x00, 0x02]); // JMP ($0200)
    memory.write_u16(0x0200, 0x9000);

    assert_eq!(step_instruction(&mut cpu, &mut memory), 5);
    assert_eq!(cpu.pc, 0x9000);
}

#[test]
fn read_modify_write_zero_page_costs() {
    let (mut cpu, mut memory) = setup(&[0xE6, 0x10, 0x06, 0x10]); // INC $10; ASL $10
    assert_eq!(step_instruction(&mut cpu, &mut memory), 5);
    assert_eq!(step_instruction(&mut cpu, &mut memory), 5);
}

#[test]
fn mid_instruction_ticks_have_no_observable_effect() {
    // LDA $2000 takes four cycles; the register write happens on the fetch
    // tick and the rest only count down.
    let (mut cpu, mut memory) = setup(&[0xAD, 0x00, 0x20, 0xEA]);
    memory.write_u8(0x2000, 0x42);

    cpu.step(&mut memory).unwrap();
    assert_eq!(cpu.a, 0x42);
    assert_eq!(cpu.cycles, 3);
    let pc = cpu.pc;

    cpu.step(&mut memory).unwrap();
    assert_eq!(cpu.pc, pc);
    assert_eq!(cpu.cycles, 2);
}

extern crate mos6502_rs;

use mos6502_rs::mos6502::cpu::{CPU, EmulationError};
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
fn lda_immediate_sets_zero_flag() {
    let (mut cpu, mut memory) = setup(&[0xA9, 0x00]); // LDA #$00
    step_instruction(&mut cpu, &mut memory);

    assert_eq!(cpu.a, 0x00);
    assert!(cpu.zero_flag_set());
    assert!(!cpu.negative_flag_set());
}

#[test]
fn lda_immediate_sets_negative_flag() {
    let (mut cpu, mut memory) = setup(&[0xA9, 0x80]); // LDA #$80
    step_instruction(&mut cpu, &mut memory);

    assert_eq!(cpu.a, 0x80);
    assert!(!cpu.zero_flag_set());
    assert!(cpu.negative_flag_set());
}

#[test]
fn inc_wraps_at_memory_limits() {
    // INC $10 twice: 0xFF wraps to 0x00, then increments to 0x01.
    let (mut cpu, mut memory) = setup(&[0xE6, 0x10, 0xE6, 0x10]);
    memory.write_u8(0x0010, 0xFF);

    step_instruction(&mut cpu, &mut memory);
    assert_eq!(memory.read_u8(0x0010), 0x00);
    assert!(cpu.zero_flag_set());
    assert!(!cpu.negative_flag_set());

    step_instruction(&mut cpu, &mut memory);
    assert_eq!(memory.read_u8(0x0010), 0x01);
    assert!(!cpu.zero_flag_set());
}

#[test]
fn dex_wraps_below_zero() {
    let (mut cpu, mut memory) = setup(&[0xCA]); // DEX with X = 0
    step_instruction(&mut cpu, &mut memory);

    assert_eq!(cpu.x, 0xFF);
    assert!(cpu.negative_flag_set());
    assert!(!cpu.zero_flag_set());
}

#[test]
fn jsr_rts_round_trip() {
    // JSR $8010 at 0x8000, RTS at the subroutine address.
    let (mut cpu, mut memory) = setup(&[0x20, 0x10, 0x80]);
    memory.write_u8(0x8010, 0x60);

    step_instruction(&mut cpu, &mut memory);
    assert_eq!(cpu.pc, 0x8010);
    assert_eq!(cpu.sp, 0xFB);
    // The pushed return address is one short of the next instruction.
    assert_eq!(memory.read_u8(0x01FD), 0x80);
    assert_eq!(memory.read_u8(0x01FC), 0x02);

    step_instruction(&mut cpu, &mut memory);
    assert_eq!(cpu.pc, 0x8003, "RTS should land on the instruction after the JSR");
    assert_eq!(cpu.sp, 0xFD);
}

#[test]
fn adc_binary_signed_overflow() {
    // LDA #$50; ADC #$50. 80 + 80 overflows the signed range.
    let (mut cpu, mut memory) = setup(&[0xA9, 0x50, 0x69, 0x50]);
    step_instruction(&mut cpu, &mut memory);
    step_instruction(&mut cpu, &mut memory);

    assert_eq!(cpu.a, 0xA0);
    assert!(cpu.overflow_flag_set());
    assert!(!cpu.carry_flag_set());
    assert!(cpu.negative_flag_set());
    assert!(!cpu.zero_flag_set());
}

#[test]
fn adc_adds_carry_in() {
    // SEC; LDA #$01; ADC #$01 = 3 with the carry spent.
    let (mut cpu, mut memory) = setup(&[0x38, 0xA9, 0x01, 0x69, 0x01]);
    for _ in 0..3 {
        step_instruction(&mut cpu, &mut memory);
    }

    assert_eq!(cpu.a, 0x03);
    assert!(!cpu.carry_flag_set());
}

#[test]
fn sbc_binary_with_and_without_borrow() {
    // SEC; LDA #$10; SBC #$01 leaves 0x0F with no borrow taken.
    let (mut cpu, mut memory) = setup(&[0x38, 0xA9, 0x10, 0xE9, 0x01]);
    for _ in 0..3 {
        step_instruction(&mut cpu, &mut memory);
    }
    assert_eq!(cpu.a, 0x0F);
    assert!(cpu.carry_flag_set());

    // CLC; LDA #$00; SBC #$00 borrows through and clears carry.
    let (mut cpu, mut memory) = setup(&[0x18, 0xA9, 0x00, 0xE9, 0x00]);
    for _ in 0..3 {
        step_instruction(&mut cpu, &mut memory);
    }
    assert_eq!(cpu.a, 0xFF);
    assert!(!cpu.carry_flag_set());
    assert!(cpu.negative_flag_set());
}

#[test]
fn asl_accumulator_shifts_into_carry() {
    let (mut cpu, mut memory) = setup(&[0xA9, 0x80, 0x0A]); // LDA #$80; ASL A
    step_instruction(&mut cpu, &mut memory);
    step_instruction(&mut cpu, &mut memory);

    assert_eq!(cpu.a, 0x00);
    assert!(cpu.carry_flag_set());
    assert!(cpu.zero_flag_set());
}

#[test]
fn lsr_memory_operand() {
    let (mut cpu, mut memory) = setup(&[0x46, 0x10]); // LSR $10
    memory.write_u8(0x0010, 0x03);
    step_instruction(&mut cpu, &mut memory);

    assert_eq!(memory.read_u8(0x0010), 0x01);
    assert!(cpu.carry_flag_set());
}

#[test]
fn rotates_fold_carry_into_vacated_bit() {
    // SEC; LDA #$01; ROR A rotates the carry into bit 7.
    let (mut cpu, mut memory) = setup(&[0x38, 0xA9, 0x01, 0x6A]);
    for _ in 0..3 {
        step_instruction(&mut cpu, &mut memory);
    }
    assert_eq!(cpu.a, 0x80);
    assert!(cpu.carry_flag_set());
    assert!(cpu.negative_flag_set());

    // SEC; LDA #$80; ROL A rotates the carry into bit 0.
    let (mut cpu, mut memory) = setup(&[0x38, 0xA9, 0x80, 0x2A]);
    for _ in 0..3 {
        step_instruction(&mut cpu, &mut memory);
    }
    assert_eq!(cpu.a, 0x01);
    assert!(cpu.carry_flag_set());
}

#[test]
fn cmp_carry_reports_unsigned_ordering() {
    let (mut cpu, mut memory) = setup(&[0xA9, 0x40, 0xC9, 0x41, 0xC9, 0x40, 0xC9, 0x3F]);
    step_instruction(&mut cpu, &mut memory);

    // A < operand: borrow taken, negative difference.
    step_instruction(&mut cpu, &mut memory);
    assert!(!cpu.carry_flag_set());
    assert!(cpu.negative_flag_set());

    // A == operand.
    step_instruction(&mut cpu, &mut memory);
    assert!(cpu.carry_flag_set());
    assert!(cpu.zero_flag_set());

    // A > operand.
    step_instruction(&mut cpu, &mut memory);
    assert!(cpu.carry_flag_set());
    assert!(!cpu.zero_flag_set());
}

#[test]
fn bit_reads_flags_from_operand_not_result() {
    // LDA #$0F; BIT $10 with 0xC0 in memory: the AND result is zero but
    // negative and overflow mirror bits 7 and 6 of the operand.
    let (mut cpu, mut memory) = setup(&[0xA9, 0x0F, 0x24, 0x10]);
    memory.write_u8(0x0010, 0xC0);
    step_instruction(&mut cpu, &mut memory);
    step_instruction(&mut cpu, &mut memory);

    assert!(cpu.zero_flag_set());
    assert!(cpu.negative_flag_set());
    assert!(cpu.overflow_flag_set());
    assert_eq!(cpu.a, 0x0F, "BIT must not modify the accumulator");
}

#[test]
fn logic_ops_set_zero_and_negative() {
    // LDA #$F0; AND #$0F leaves zero, ORA #$80 leaves a negative value,
    // EOR #$80 clears it back to zero.
    let (mut cpu, mut memory) = setup(&[0xA9, 0xF0, 0x29, 0x0F, 0x09, 0x80, 0x49, 0x80]);
    step_instruction(&mut cpu, &mut memory);

    step_instruction(&mut cpu, &mut memory);
    assert_eq!(cpu.a, 0x00);
    assert!(cpu.zero_flag_set());

    step_instruction(&mut cpu, &mut memory);
    assert_eq!(cpu.a, 0x80);
    assert!(cpu.negative_flag_set());

    step_instruction(&mut cpu, &mut memory);
    assert_eq!(cpu.a, 0x00);
    assert!(cpu.zero_flag_set());
}

#[test]
fn stores_write_registers_to_memory() {
    // LDA #$42; STA $10; LDX #$43; STX $11; LDY #$44; STY $12
    let (mut cpu, mut memory) = setup(&[
        0xA9, 0x42, 0x85, 0x10,
        0xA2, 0x43, 0x86, 0x11,
        0xA0, 0x44, 0x84, 0x12,
    ]);
    for _ in 0..6 {
        step_instruction(&mut cpu, &mut memory);
    }

    assert_eq!(memory.read_u8(0x0010), 0x42);
    assert_eq!(memory.read_u8(0x0011), 0x43);
    assert_eq!(memory.read_u8(0x0012), 0x44);
}

#[test]
fn txs_sets_no_flags() {
    // LDX #$00 raises the zero flag; TXS must leave it untouched.
    let (mut cpu, mut memory) = setup(&[0xA2, 0x00, 0x9A]);
    step_instruction(&mut cpu, &mut memory);
    step_instruction(&mut cpu, &mut memory);

    assert_eq!(cpu.sp, 0x00);
    assert!(cpu.zero_flag_set());
}

#[test]
fn tsx_sets_flags_from_stack_pointer() {
    let (mut cpu, mut memory) = setup(&[0xBA]); // TSX with SP = 0xFD
    step_instruction(&mut cpu, &mut memory);

    assert_eq!(cpu.x, 0xFD);
    assert!(cpu.negative_flag_set());
}

#[test]
fn php_forces_break_and_unused_bits() {
    let (mut cpu, mut memory) = setup(&[0x08]); // PHP with all flags clear
    step_instruction(&mut cpu, &mut memory);

    assert_eq!(cpu.sp, 0xFC);
    assert_eq!(memory.read_u8(0x01FD), 0x30);
}

#[test]
fn plp_ignores_break_and_unused_bits() {
    // LDA #$FF; PHA; PLP restores every flag except bits 4 and 5.
    let (mut cpu, mut memory) = setup(&[0xA9, 0xFF, 0x48, 0x28]);
    for _ in 0..3 {
        step_instruction(&mut cpu, &mut memory);
    }

    assert_eq!(cpu.p, 0xCF);
    assert!(!cpu.break_command_set());
    assert!(!cpu.unused_flag_set());
}

#[test]
fn pla_sets_zero_and_negative() {
    // LDA #$00; PHA; LDA #$01; PLA
    let (mut cpu, mut memory) = setup(&[0xA9, 0x00, 0x48, 0xA9, 0x01, 0x68]);
    for _ in 0..4 {
        step_instruction(&mut cpu, &mut memory);
    }

    assert_eq!(cpu.a, 0x00);
    assert!(cpu.zero_flag_set());
}

#[test]
fn lda_indexed_indirect() {
    // LDX #$06; LDA ($0A,X): the pointer lives at 0x10 and targets 0x2000.
    let (mut cpu, mut memory) = setup(&[0xA2, 0x06, 0xA1, 0x0A]);
    memory.write_u8(0x0010, 0x00);
    memory.write_u8(0x0011, 0x20);
    memory.write_u8(0x2000, 0xAB);

    step_instruction(&mut cpu, &mut memory);
    let cycles = step_instruction(&mut cpu, &mut memory);

    assert_eq!(cpu.a, 0xAB);
    assert_eq!(cycles, 6);
}

#[test]
fn lda_indirect_indexed() {
    // LDY #$01; LDA ($20),Y: the pointer at 0x20 targets 0x2000, Y lands
    // the read on 0x2001.
    let (mut cpu, mut memory) = setup(&[0xA0, 0x01, 0xB1, 0x20]);
    memory.write_u8(0x0020, 0x00);
    memory.write_u8(0x0021, 0x20);
    memory.write_u8(0x2001, 0xCD);

    step_instruction(&mut cpu, &mut memory);
    let cycles = step_instruction(&mut cpu, &mut memory);

    assert_eq!(cpu.a, 0xCD);
    assert_eq!(cycles, 5);
}

#[test]
fn indexed_indirect_pointer_wraps_in_zero_page() {
    // LDX #$01; LDA ($FF,X): 0xFF + 1 wraps to a pointer at 0x00.
    let (mut cpu, mut memory) = setup(&[0xA2, 0x01, 0xA1, 0xFF]);
    memory.write_u8(0x0000, 0x34);
    memory.write_u8(0x0001, 0x12);
    memory.write_u8(0x1234, 0x5A);

    step_instruction(&mut cpu, &mut memory);
    step_instruction(&mut cpu, &mut memory);

    assert_eq!(cpu.a, 0x5A);
}

#[test]
fn zero_page_x_wraps_within_zero_page() {
    // LDX #$FF; LDA $80,X resolves to 0x7F, never 0x017F.
    let (mut cpu, mut memory) = setup(&[0xA2, 0xFF, 0xB5, 0x80]);
    memory.write_u8(0x007F, 0x77);
    memory.write_u8(0x017F, 0x99);

    step_instruction(&mut cpu, &mut memory);
    step_instruction(&mut cpu, &mut memory);

    assert_eq!(cpu.a, 0x77);
}

#[test]
fn jmp_indirect_reproduces_page_wrap_bug() {
    // JMP ($02FF): the low byte comes from 0x02FF but the high byte comes
    // from 0x0200 instead of 0x0300, faithful to the NMOS part.
    let (mut cpu, mut memory) = setup(&[0x6C, 0xFF, 0x02]);
    memory.write_u8(0x02FF, 0x00);
    memory.write_u8(0x0200, 0x40);
    memory.write_u8(0x0300, 0x99);

    step_instruction(&mut cpu, &mut memory);

    assert_eq!(cpu.pc, 0x4000);
}

#[test]
fn illegal_opcode_surfaces_as_error() {
    let (mut cpu, mut memory) = setup(&[0xFF]);

    match cpu.step(&mut memory) {
        Err(EmulationError::IllegalOpcode { opcode, pc }) => {
            assert_eq!(opcode, 0xFF);
            assert_eq!(pc, 0x8000);
        },
        other => panic!("expected an illegal opcode error, got {:?}", other),
    }
}

//! Tests for hazard classification against hand-built pipeline states.

use pipesim::core::hazards::{pending_writes, DependencyModel, HazardCheck, HazardModel};
use pipesim::core::instruction::{Instruction, Stage};
use pipesim::core::registers::PipelineRegisters;
use pipesim::program::{InstructionTemplate, Reg};

/// Places an instruction built from `template` into `stage`.
fn place(regs: &mut PipelineRegisters, id: u64, template: InstructionTemplate, stage: Stage) {
    let mut instr = Instruction::fetched(id, id as usize, template, 0, false);
    instr.stage = stage;
    regs.set_slot(stage, Some(instr));
}

fn candidate(template: InstructionTemplate) -> Instruction {
    let mut instr = Instruction::fetched(99, 99, template, 0, false);
    instr.stage = Stage::Execute;
    instr
}

/// A pending write ahead of a reader stalls when forwarding is off.
#[test]
fn test_data_hazard_without_forwarding() {
    let mut regs = PipelineRegisters::new();
    place(
        &mut regs,
        0,
        InstructionTemplate::alu_imm("ADDI", Reg(1), Reg::ZERO, 10),
        Stage::Writeback,
    );
    let reader = candidate(InstructionTemplate::alu("ADD", Reg(3), Reg(1), Reg(2)));

    let mut model = DependencyModel;
    assert_eq!(
        model.check_execute(&reader, &regs, false),
        HazardCheck::DataHazard
    );
}

/// The same dependency is hazard-free with forwarding enabled.
#[test]
fn test_forwarding_resolves_data_hazard() {
    let mut regs = PipelineRegisters::new();
    place(
        &mut regs,
        0,
        InstructionTemplate::alu_imm("ADDI", Reg(1), Reg::ZERO, 10),
        Stage::Writeback,
    );
    let reader = candidate(InstructionTemplate::alu("ADD", Reg(3), Reg(1), Reg(2)));

    let mut model = DependencyModel;
    assert_eq!(
        model.check_execute(&reader, &regs, true),
        HazardCheck::NoHazard
    );
}

/// Writes to x0 are never pending, so they cannot cause hazards.
#[test]
fn test_x0_never_hazards() {
    let mut regs = PipelineRegisters::new();
    place(
        &mut regs,
        0,
        InstructionTemplate::alu_imm("ADDI", Reg::ZERO, Reg(1), 0),
        Stage::Writeback,
    );
    let reader = candidate(InstructionTemplate::alu("ADD", Reg(3), Reg::ZERO, Reg(2)));

    let mut model = DependencyModel;
    assert_eq!(
        model.check_execute(&reader, &regs, false),
        HazardCheck::NoHazard
    );
}

/// Independent instructions never report a data hazard.
#[test]
fn test_no_dependency_no_hazard() {
    let mut regs = PipelineRegisters::new();
    place(
        &mut regs,
        0,
        InstructionTemplate::alu_imm("ADDI", Reg(7), Reg::ZERO, 1),
        Stage::Memory,
    );
    let reader = candidate(InstructionTemplate::alu("ADD", Reg(3), Reg(1), Reg(2)));

    let mut model = DependencyModel;
    assert_eq!(
        model.check_execute(&reader, &regs, false),
        HazardCheck::NoHazard
    );
}

/// A multiply in decode stalls while the multiplier is occupied ahead.
#[test]
fn test_multiplier_structural_hazard() {
    let mut regs = PipelineRegisters::new();
    place(
        &mut regs,
        0,
        InstructionTemplate::mul(Reg(1), Reg(2), Reg(3)),
        Stage::Memory,
    );
    let mut second_mul = Instruction::fetched(
        1,
        1,
        InstructionTemplate::mul(Reg(4), Reg(5), Reg(6)),
        0,
        false,
    );
    second_mul.stage = Stage::Decode;

    let mut model = DependencyModel;
    assert_eq!(
        model.check_decode(&second_mul, &regs),
        HazardCheck::StructuralHazard
    );

    // A plain ALU instruction does not contend for the multiplier.
    let alu = candidate(InstructionTemplate::alu("ADD", Reg(7), Reg(8), Reg(9)));
    assert_eq!(model.check_decode(&alu, &regs), HazardCheck::NoHazard);
}

/// The default model never injects memory-port stalls.
#[test]
fn test_default_memory_stall_is_off() {
    let mut model = DependencyModel;
    let mut instr = Instruction::fetched(
        0,
        0,
        InstructionTemplate::load(Reg(1), Reg(2), 0),
        0,
        false,
    );
    instr.stage = Stage::Memory;
    assert!(!model.memory_stall(&instr, 1));
}

/// `pending_writes` reports destinations in the requested stages only.
#[test]
fn test_pending_writes_scope() {
    let mut regs = PipelineRegisters::new();
    place(
        &mut regs,
        0,
        InstructionTemplate::alu_imm("ADDI", Reg(1), Reg::ZERO, 1),
        Stage::Memory,
    );
    place(
        &mut regs,
        1,
        InstructionTemplate::alu_imm("ADDI", Reg(2), Reg::ZERO, 2),
        Stage::Writeback,
    );
    place(
        &mut regs,
        2,
        InstructionTemplate::alu_imm("ADDI", Reg(3), Reg::ZERO, 3),
        Stage::Execute,
    );

    let pending: Vec<Reg> = pending_writes(&regs, &[Stage::Memory, Stage::Writeback]).collect();
    assert!(pending.contains(&Reg(1)));
    assert!(pending.contains(&Reg(2)));
    assert!(!pending.contains(&Reg(3)));
}

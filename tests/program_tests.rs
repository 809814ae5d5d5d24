//! Tests for the program store and the assembly parser.

use pipesim::program::{FunctionalUnit, Opcode, Program, ProgramError, Reg};

/// The built-in sample program has the documented shape.
#[test]
fn test_sample_program_shape() {
    let program = Program::sample();
    assert_eq!(program.len(), 10);

    let branches: Vec<_> = (0..program.len())
        .filter_map(|i| program.instruction_at(i))
        .filter(|t| t.is_branch())
        .collect();
    assert_eq!(branches.len(), 2);

    // One backward loop branch, one forward exit branch.
    assert!(branches.iter().any(|t| t.branch_target == Some(2)));
    assert!(branches.iter().any(|t| t.branch_target == Some(10)));

    let first = program.instruction_at(0).unwrap();
    assert_eq!(first.mnemonic, "ADDI");
    assert_eq!(first.dest, Some(Reg(1)));
}

/// Reading past the end of the program yields `None`, not an error.
#[test]
fn test_instruction_at_past_end() {
    let program = Program::sample();
    assert!(program.instruction_at(10).is_none());
    assert!(program.instruction_at(usize::MAX).is_none());
}

/// Basic assembly text parses into the expected templates.
#[test]
fn test_parse_basic() {
    let program = Program::parse(
        "ADDI x1, x0, 10\n\
         ADD x3, x1, x2\n\
         MUL x4, x1, x3\n\
         NOP\n",
    )
    .unwrap();
    assert_eq!(program.len(), 4);
    assert_eq!(program.instruction_at(0).unwrap().opcode, Opcode::AluImm);
    assert_eq!(program.instruction_at(1).unwrap().sources, vec![Reg(1), Reg(2)]);
    assert_eq!(program.instruction_at(2).unwrap().opcode, Opcode::Mul);
    assert_eq!(program.instruction_at(3).unwrap().opcode, Opcode::Nop);
}

/// Labels resolve to instruction indices, including forward references.
#[test]
fn test_parse_labels() {
    let program = Program::parse(
        "start:\n\
         ADDI x1, x0, 3\n\
         BEQ x1, x0, end\n\
         BNE x1, x0, start\n\
         end:\n\
         NOP\n",
    )
    .unwrap();
    assert_eq!(program.len(), 4);
    assert_eq!(program.instruction_at(1).unwrap().branch_target, Some(3));
    assert_eq!(program.instruction_at(2).unwrap().branch_target, Some(0));
}

/// Load/store operands use the `offset(base)` form.
#[test]
fn test_parse_memory_operands() {
    let program = Program::parse("LW x5, 8(x2)\nSW x5, -4(x2)\n").unwrap();

    let load = program.instruction_at(0).unwrap();
    assert_eq!(load.opcode, Opcode::Load);
    assert_eq!(load.dest, Some(Reg(5)));
    assert_eq!(load.sources, vec![Reg(2)]);

    let store = program.instruction_at(1).unwrap();
    assert_eq!(store.opcode, Opcode::Store);
    assert_eq!(store.dest, None);
    assert_eq!(store.sources, vec![Reg(5), Reg(2)]);
}

/// Comments and blank lines are ignored; mnemonics are case-insensitive.
#[test]
fn test_parse_comments_and_case() {
    let program = Program::parse(
        "; leading comment\n\
         \n\
         addi x1, x0, 1  # trailing comment\n",
    )
    .unwrap();
    assert_eq!(program.len(), 1);
    assert_eq!(program.instruction_at(0).unwrap().mnemonic, "ADDI");
}

/// Unknown mnemonics are reported with their line number.
#[test]
fn test_parse_unknown_mnemonic() {
    let err = Program::parse("FROB x1, x2, x3\n").unwrap_err();
    assert!(matches!(
        err,
        ProgramError::UnknownMnemonic { line: 1, .. }
    ));
}

/// Registers outside x0..x31 are rejected.
#[test]
fn test_parse_bad_register() {
    let err = Program::parse("ADDI x32, x0, 1\n").unwrap_err();
    assert!(matches!(err, ProgramError::BadRegister { .. }));

    let err = Program::parse("ADDI y1, x0, 1\n").unwrap_err();
    assert!(matches!(err, ProgramError::BadRegister { .. }));
}

/// Branches to undefined labels are rejected.
#[test]
fn test_parse_unknown_label() {
    let err = Program::parse("BEQ x1, x0, nowhere\n").unwrap_err();
    assert!(matches!(err, ProgramError::UnknownLabel { .. }));
}

/// Wrong operand counts are rejected.
#[test]
fn test_parse_malformed_operands() {
    assert!(matches!(
        Program::parse("ADD x1, x2\n").unwrap_err(),
        ProgramError::BadOperands { .. }
    ));
    assert!(matches!(
        Program::parse("LW x5, x2\n").unwrap_err(),
        ProgramError::BadOperands { .. }
    ));
}

/// Opcodes map onto the expected functional units.
#[test]
fn test_functional_units() {
    assert_eq!(Opcode::Alu.unit(), FunctionalUnit::Alu);
    assert_eq!(Opcode::Mul.unit(), FunctionalUnit::Multiplier);
    assert_eq!(Opcode::Load.unit(), FunctionalUnit::MemoryPort);
    assert_eq!(Opcode::Store.unit(), FunctionalUnit::MemoryPort);
    assert_eq!(Opcode::Branch.unit(), FunctionalUnit::BranchUnit);
}

//! Instruction templates and the immutable program store.
//!
//! A [`Program`] is an ordered, read-only sequence of decoded
//! [`InstructionTemplate`]s produced once at reset. The pipeline fetches
//! templates by program index; fetching past the end yields `None` and the
//! pipeline drains naturally.
//!
//! Programs come from one of two places: the built-in demo program
//! ([`Program::sample`]) or assembly text parsed by [`Program::parse`].

use std::collections::HashMap;
use std::fmt;

use regex::Regex;
use thiserror::Error;

/// An architectural register name (`x0`..`x31`).
///
/// `x0` is the conventional always-zero register: writes to it are never
/// pending, so it can never be the source of a data hazard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reg(pub u8);

impl Reg {
    /// The always-zero register.
    pub const ZERO: Self = Self(0);
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

/// Functional unit classes used for structural hazard classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionalUnit {
    /// Single-cycle integer ALU.
    Alu,
    /// Non-pipelined multiplier; only one multiply may be in flight past
    /// decode at a time.
    Multiplier,
    /// Load/store memory port.
    MemoryPort,
    /// Branch comparison unit.
    BranchUnit,
}

/// Closed instruction classification.
///
/// The simulator does not model real ALU results; the opcode exists to
/// drive hazard classification and the visualization, not arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    /// Register-register arithmetic (ADD, SUB, AND, OR, XOR, SLT).
    Alu,
    /// Register-immediate arithmetic (ADDI, ANDI, ORI, SLTI).
    AluImm,
    /// Multiply (MUL).
    Mul,
    /// Memory load (LW).
    Load,
    /// Memory store (SW).
    Store,
    /// Conditional branch (BEQ, BNE, BLT, BGE).
    Branch,
    /// No-operation.
    Nop,
}

impl Opcode {
    /// The functional unit this opcode occupies.
    pub fn unit(self) -> FunctionalUnit {
        match self {
            Self::Alu | Self::AluImm | Self::Nop => FunctionalUnit::Alu,
            Self::Mul => FunctionalUnit::Multiplier,
            Self::Load | Self::Store => FunctionalUnit::MemoryPort,
            Self::Branch => FunctionalUnit::BranchUnit,
        }
    }
}

/// Immutable decoded form of one program instruction.
///
/// Templates are display/classification data only; none of these fields
/// are mutated after creation. Runtime state (current stage, stall flags)
/// lives on the in-flight `Instruction` created at fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionTemplate {
    /// Upper-case mnemonic, e.g. `ADDI`.
    pub mnemonic: String,
    /// Classification driving hazard checks.
    pub opcode: Opcode,
    /// Destination register with a pending write, if any.
    pub dest: Option<Reg>,
    /// Source registers read by this instruction (at most two).
    pub sources: Vec<Reg>,
    /// Rendered operand text, e.g. `x1, x0, 10`.
    pub operands: String,
    /// Program index targeted when a branch is taken.
    pub branch_target: Option<usize>,
}

impl InstructionTemplate {
    /// Register-register ALU instruction.
    pub fn alu(mnemonic: &str, rd: Reg, rs1: Reg, rs2: Reg) -> Self {
        Self {
            mnemonic: mnemonic.to_uppercase(),
            opcode: Opcode::Alu,
            dest: Some(rd),
            sources: vec![rs1, rs2],
            operands: format!("{rd}, {rs1}, {rs2}"),
            branch_target: None,
        }
    }

    /// Register-immediate ALU instruction.
    pub fn alu_imm(mnemonic: &str, rd: Reg, rs1: Reg, imm: i64) -> Self {
        Self {
            mnemonic: mnemonic.to_uppercase(),
            opcode: Opcode::AluImm,
            dest: Some(rd),
            sources: vec![rs1],
            operands: format!("{rd}, {rs1}, {imm}"),
            branch_target: None,
        }
    }

    /// Multiply instruction (occupies the multiplier unit).
    pub fn mul(rd: Reg, rs1: Reg, rs2: Reg) -> Self {
        Self {
            mnemonic: "MUL".to_string(),
            opcode: Opcode::Mul,
            dest: Some(rd),
            sources: vec![rs1, rs2],
            operands: format!("{rd}, {rs1}, {rs2}"),
            branch_target: None,
        }
    }

    /// Memory load: `rd <- offset(base)`.
    pub fn load(rd: Reg, base: Reg, offset: i64) -> Self {
        Self {
            mnemonic: "LW".to_string(),
            opcode: Opcode::Load,
            dest: Some(rd),
            sources: vec![base],
            operands: format!("{rd}, {offset}({base})"),
            branch_target: None,
        }
    }

    /// Memory store: `offset(base) <- src`.
    pub fn store(src: Reg, base: Reg, offset: i64) -> Self {
        Self {
            mnemonic: "SW".to_string(),
            opcode: Opcode::Store,
            dest: None,
            sources: vec![src, base],
            operands: format!("{src}, {offset}({base})"),
            branch_target: None,
        }
    }

    /// Conditional branch to the program index `target`.
    pub fn branch(mnemonic: &str, rs1: Reg, rs2: Reg, target: usize) -> Self {
        Self {
            mnemonic: mnemonic.to_uppercase(),
            opcode: Opcode::Branch,
            dest: None,
            sources: vec![rs1, rs2],
            operands: format!("{rs1}, {rs2}, {target}"),
            branch_target: Some(target),
        }
    }

    /// No-operation.
    pub fn nop() -> Self {
        Self {
            mnemonic: "NOP".to_string(),
            opcode: Opcode::Nop,
            dest: None,
            sources: Vec::new(),
            operands: String::new(),
            branch_target: None,
        }
    }

    /// True for conditional branches.
    pub fn is_branch(&self) -> bool {
        self.opcode == Opcode::Branch
    }
}

/// Error produced while parsing assembly text.
#[derive(Debug, Error)]
pub enum ProgramError {
    /// The mnemonic is not in the supported set.
    #[error("line {line}: unknown mnemonic `{mnemonic}`")]
    UnknownMnemonic { line: usize, mnemonic: String },

    /// Operand count or shape does not match the mnemonic.
    #[error("line {line}: malformed operands `{text}`")]
    BadOperands { line: usize, text: String },

    /// An operand names a register outside `x0`..`x31`.
    #[error("line {line}: invalid register `{text}`")]
    BadRegister { line: usize, text: String },

    /// A branch targets a label that is never defined.
    #[error("line {line}: unknown label `{label}`")]
    UnknownLabel { line: usize, label: String },
}

/// Immutable ordered sequence of decoded instructions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    templates: Vec<InstructionTemplate>,
}

impl Program {
    /// Wraps an already-decoded instruction list.
    pub fn new(templates: Vec<InstructionTemplate>) -> Self {
        Self { templates }
    }

    /// Returns the template at program index `pc`, or `None` past the end
    /// of the program. Never an error: an exhausted program simply stops
    /// feeding the fetch stage.
    pub fn instruction_at(&self, pc: usize) -> Option<&InstructionTemplate> {
        self.templates.get(pc)
    }

    /// Number of instructions in the program.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// True when the program contains no instructions.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// The built-in demo program: arithmetic, a multiply, load/store, a
    /// backward loop branch, and a forward exit branch.
    pub fn sample() -> Self {
        Self::new(vec![
            InstructionTemplate::alu_imm("ADDI", Reg(1), Reg::ZERO, 8),
            InstructionTemplate::alu_imm("ADDI", Reg(2), Reg::ZERO, 0),
            InstructionTemplate::alu("ADD", Reg(2), Reg(2), Reg(1)),
            InstructionTemplate::mul(Reg(4), Reg(1), Reg(2)),
            InstructionTemplate::load(Reg(5), Reg(2), 0),
            InstructionTemplate::alu_imm("ADDI", Reg(1), Reg(1), -1),
            InstructionTemplate::store(Reg(4), Reg(2), 4),
            InstructionTemplate::branch("BNE", Reg(1), Reg::ZERO, 2),
            InstructionTemplate::alu("ADD", Reg(6), Reg(2), Reg(5)),
            InstructionTemplate::branch("BEQ", Reg(6), Reg::ZERO, 10),
        ])
    }

    /// Parses assembly text into a program.
    ///
    /// Supported forms, one instruction per line:
    ///
    /// ```text
    /// loop:               ; label
    /// ADDI x1, x0, 10     ; register-immediate
    /// ADD  x3, x1, x2     ; register-register
    /// MUL  x4, x1, x3
    /// LW   x5, 8(x2)      ; load/store use offset(base)
    /// SW   x5, 8(x2)
    /// BNE  x1, x0, loop   ; branch to a label or absolute index
    /// NOP
    /// ```
    ///
    /// Comments start with `;` or `#`. Labels are resolved in a second
    /// pass, so forward references are fine.
    pub fn parse(src: &str) -> Result<Self, ProgramError> {
        let label_re = Regex::new(r"^([A-Za-z_]\w*):$").expect("label pattern");
        let mem_re = Regex::new(r"^(-?\d+)\((x\d+)\)$").expect("memory operand pattern");

        // Pass 1: strip comments, collect labels against instruction indices.
        let mut labels: HashMap<String, usize> = HashMap::new();
        let mut lines: Vec<(usize, String)> = Vec::new();
        let mut index = 0;
        for (lineno, raw) in src.lines().enumerate() {
            let text = raw
                .split(|c| c == ';' || c == '#')
                .next()
                .unwrap_or("")
                .trim()
                .to_string();
            if text.is_empty() {
                continue;
            }
            if let Some(caps) = label_re.captures(&text) {
                labels.insert(caps[1].to_string(), index);
            } else {
                lines.push((lineno + 1, text));
                index += 1;
            }
        }

        // Pass 2: decode each instruction line.
        let mut templates = Vec::with_capacity(lines.len());
        for (line, text) in &lines {
            templates.push(parse_line(*line, text, &labels, &mem_re)?);
        }
        Ok(Self::new(templates))
    }
}

fn parse_line(
    line: usize,
    text: &str,
    labels: &HashMap<String, usize>,
    mem_re: &Regex,
) -> Result<InstructionTemplate, ProgramError> {
    let mut parts = text.split_whitespace();
    let mnemonic = parts.next().unwrap_or("").to_uppercase();
    let rest: String = parts.collect::<Vec<_>>().join(" ");
    let args: Vec<&str> = rest
        .split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .collect();

    let bad = || ProgramError::BadOperands {
        line,
        text: text.to_string(),
    };

    match mnemonic.as_str() {
        "ADD" | "SUB" | "AND" | "OR" | "XOR" | "SLT" => {
            if args.len() != 3 {
                return Err(bad());
            }
            Ok(InstructionTemplate::alu(
                &mnemonic,
                parse_reg(line, args[0])?,
                parse_reg(line, args[1])?,
                parse_reg(line, args[2])?,
            ))
        }
        "MUL" => {
            if args.len() != 3 {
                return Err(bad());
            }
            Ok(InstructionTemplate::mul(
                parse_reg(line, args[0])?,
                parse_reg(line, args[1])?,
                parse_reg(line, args[2])?,
            ))
        }
        "ADDI" | "ANDI" | "ORI" | "SLTI" => {
            if args.len() != 3 {
                return Err(bad());
            }
            let imm: i64 = args[2].parse().map_err(|_| bad())?;
            Ok(InstructionTemplate::alu_imm(
                &mnemonic,
                parse_reg(line, args[0])?,
                parse_reg(line, args[1])?,
                imm,
            ))
        }
        "LW" | "SW" => {
            if args.len() != 2 {
                return Err(bad());
            }
            let caps = mem_re.captures(args[1]).ok_or_else(|| bad())?;
            let offset: i64 = caps[1].parse().map_err(|_| bad())?;
            let base = parse_reg(line, &caps[2])?;
            let reg = parse_reg(line, args[0])?;
            if mnemonic == "LW" {
                Ok(InstructionTemplate::load(reg, base, offset))
            } else {
                Ok(InstructionTemplate::store(reg, base, offset))
            }
        }
        "BEQ" | "BNE" | "BLT" | "BGE" => {
            if args.len() != 3 {
                return Err(bad());
            }
            let target = match args[2].parse::<usize>() {
                Ok(index) => index,
                Err(_) => *labels
                    .get(args[2])
                    .ok_or_else(|| ProgramError::UnknownLabel {
                        line,
                        label: args[2].to_string(),
                    })?,
            };
            Ok(InstructionTemplate::branch(
                &mnemonic,
                parse_reg(line, args[0])?,
                parse_reg(line, args[1])?,
                target,
            ))
        }
        "NOP" => {
            if !args.is_empty() {
                return Err(bad());
            }
            Ok(InstructionTemplate::nop())
        }
        _ => Err(ProgramError::UnknownMnemonic { line, mnemonic }),
    }
}

fn parse_reg(line: usize, text: &str) -> Result<Reg, ProgramError> {
    let err = || ProgramError::BadRegister {
        line,
        text: text.to_string(),
    };
    let number = text.strip_prefix('x').ok_or_else(|| err())?;
    let n: u8 = number.parse().map_err(|_| err())?;
    if n > 31 {
        return Err(err());
    }
    Ok(Reg(n))
}

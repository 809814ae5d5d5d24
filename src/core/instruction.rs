//! In-flight instruction state.
//!
//! An [`Instruction`] is created once when its template is fetched from
//! the program store and lives exactly as long as it occupies a pipeline
//! slot or sits in the completed history. Its stage advances monotonically
//! through the pipeline; the only way it ever leaves early is a front-end
//! flush, which removes it from the pipeline entirely rather than moving
//! it backwards.

use std::fmt;

use serde::Serialize;

use crate::program::InstructionTemplate;

/// Upper bound on consecutive stall cycles before the debug diagnostic
/// fires. A hazard rule that holds an instruction this long never clears.
pub const STALL_SANITY_BOUND: u32 = 64;

/// The six instruction lifecycle stages, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Stage {
    /// Instruction fetch.
    Fetch,
    /// Instruction decode.
    Decode,
    /// Execution / branch resolution.
    Execute,
    /// Memory access.
    Memory,
    /// Register writeback.
    Writeback,
    /// Retired; no longer occupies a pipeline slot.
    Completed,
}

impl Stage {
    /// The five stages that own a pipeline register slot, in order.
    pub const PIPELINE: [Self; 5] = [
        Self::Fetch,
        Self::Decode,
        Self::Execute,
        Self::Memory,
        Self::Writeback,
    ];

    /// The stage an instruction advances into from this one.
    pub fn next(self) -> Self {
        match self {
            Self::Fetch => Self::Decode,
            Self::Decode => Self::Execute,
            Self::Execute => Self::Memory,
            Self::Memory => Self::Writeback,
            Self::Writeback | Self::Completed => Self::Completed,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fetch => "IF",
            Self::Decode => "ID",
            Self::Execute => "EX",
            Self::Memory => "MEM",
            Self::Writeback => "WB",
            Self::Completed => "DONE",
        };
        f.pad(name)
    }
}

/// Why an instruction is currently held in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HazardKind {
    /// Source operand pending a write from an instruction ahead.
    Data,
    /// Wrong-path work discarded after a branch misprediction.
    Control,
    /// A required functional unit is occupied this cycle.
    Structural,
}

/// A fetched instruction flowing through the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    /// Unique sequence number, assigned at fetch, monotonically increasing.
    pub id: u64,
    /// Program index this instruction was fetched from.
    pub pc_index: usize,
    /// Immutable decoded template.
    pub template: InstructionTemplate,
    /// Current lifecycle stage.
    pub stage: Stage,
    /// Clock cycle at which the instruction entered fetch. Immutable.
    pub issued_cycle: u64,
    /// Predicted branch direction recorded at fetch time.
    pub predicted_taken: bool,
    /// True only while the instruction is held in place by a hazard.
    pub stalled: bool,
    /// Hazard classification, present exactly while `stalled` is true.
    pub hazard: Option<HazardKind>,
    /// Consecutive cycles spent stalled in the current stage.
    pub stall_run: u32,
}

impl Instruction {
    /// Creates a fresh in-flight instruction entering the fetch stage.
    pub fn fetched(
        id: u64,
        pc_index: usize,
        template: InstructionTemplate,
        issued_cycle: u64,
        predicted_taken: bool,
    ) -> Self {
        Self {
            id,
            pc_index,
            template,
            stage: Stage::Fetch,
            issued_cycle,
            predicted_taken,
            stalled: false,
            hazard: None,
            stall_run: 0,
        }
    }

    /// Moves the instruction into `next`, clearing any stall markers.
    ///
    /// Stages never skip and never regress; the debug assertion enforces
    /// the single-step walk through the stage order.
    pub fn advance_to(&mut self, next: Stage) {
        debug_assert_eq!(next, self.stage.next(), "stage advance must not skip");
        self.stage = next;
        self.stalled = false;
        self.hazard = None;
        self.stall_run = 0;
    }

    /// Marks the instruction as held in place by `kind` for this cycle.
    pub fn hold(&mut self, kind: HazardKind) {
        self.stalled = true;
        self.hazard = Some(kind);
        self.stall_run += 1;
        debug_assert!(
            self.stall_run < STALL_SANITY_BOUND,
            "instruction {} stalled {} cycles in {}; hazard rule never clears",
            self.id,
            self.stall_run,
            self.stage
        );
    }

    /// True exactly when the instruction has retired.
    pub fn completed(&self) -> bool {
        self.stage == Stage::Completed
    }
}

//! Read-only value snapshots for the presentation layer.
//!
//! A [`Snapshot`] is a value copy of everything a renderer needs: the
//! five pipeline slots, the statistics counters, and the program counter.
//! It holds no references into the simulator, so the host may keep it
//! across later `advance` calls or serialize it for a remote view.

use serde::Serialize;

use crate::core::instruction::{HazardKind, Instruction, Stage};
use crate::core::SimState;
use crate::stats::SimStats;

/// Value copy of one in-flight instruction, for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstructionView {
    /// Fetch-order sequence number.
    pub id: u64,
    /// Program index the instruction was fetched from.
    pub pc_index: usize,
    /// Display mnemonic.
    pub mnemonic: String,
    /// Display operand text.
    pub operands: String,
    /// Current stage.
    pub stage: Stage,
    /// Cycle the instruction entered fetch.
    pub issued_cycle: u64,
    /// Held in place by a hazard this cycle.
    pub stalled: bool,
    /// Hazard classification while stalled.
    pub hazard: Option<HazardKind>,
}

impl From<&Instruction> for InstructionView {
    fn from(instr: &Instruction) -> Self {
        Self {
            id: instr.id,
            pc_index: instr.pc_index,
            mnemonic: instr.template.mnemonic.clone(),
            operands: instr.template.operands.clone(),
            stage: instr.stage,
            issued_cycle: instr.issued_cycle,
            stalled: instr.stalled,
            hazard: instr.hazard,
        }
    }
}

/// Read-only copy of simulator state at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    /// Clock edges processed so far.
    pub cycle: u64,
    /// Next program index to fetch.
    pub pc: usize,
    /// Running or drained.
    pub state: SimState,
    /// Occupants of IF, ID, EX, MEM, WB, in that order.
    pub slots: [Option<InstructionView>; 5],
    /// Statistics counters at this instant.
    pub stats: SimStats,
    /// Total program length, for progress display.
    pub program_len: usize,
}

impl Snapshot {
    /// Serializes the snapshot as JSON for an out-of-process renderer.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

//! Pipeline register file: one optional instruction slot per stage.
//!
//! Pure storage. Hazard logic and advancement policy live in the
//! scheduler; this type only guarantees the structural invariant that
//! each stage holds at most one instruction and that moving an
//! instruction between stages is an ownership transfer, never a copy.

use crate::core::instruction::{Instruction, Stage};

/// The five pipeline register slots, named by stage.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PipelineRegisters {
    fetch: Option<Instruction>,
    decode: Option<Instruction>,
    execute: Option<Instruction>,
    memory: Option<Instruction>,
    writeback: Option<Instruction>,
}

impl PipelineRegisters {
    /// Creates an empty register file.
    pub fn new() -> Self {
        Self::default()
    }

    fn field(&self, stage: Stage) -> &Option<Instruction> {
        match stage {
            Stage::Fetch => &self.fetch,
            Stage::Decode => &self.decode,
            Stage::Execute => &self.execute,
            Stage::Memory => &self.memory,
            Stage::Writeback => &self.writeback,
            Stage::Completed => unreachable!("Completed has no pipeline slot"),
        }
    }

    fn field_mut(&mut self, stage: Stage) -> &mut Option<Instruction> {
        match stage {
            Stage::Fetch => &mut self.fetch,
            Stage::Decode => &mut self.decode,
            Stage::Execute => &mut self.execute,
            Stage::Memory => &mut self.memory,
            Stage::Writeback => &mut self.writeback,
            Stage::Completed => unreachable!("Completed has no pipeline slot"),
        }
    }

    /// Inspects the occupant of `stage`.
    pub fn slot(&self, stage: Stage) -> Option<&Instruction> {
        self.field(stage).as_ref()
    }

    /// Mutable access to the occupant of `stage`. Scheduler use only.
    pub fn slot_mut(&mut self, stage: Stage) -> Option<&mut Instruction> {
        self.field_mut(stage).as_mut()
    }

    /// Removes and returns the occupant of `stage`.
    pub fn take_slot(&mut self, stage: Stage) -> Option<Instruction> {
        self.field_mut(stage).take()
    }

    /// Places `instr` into `stage`, replacing any previous occupant.
    pub fn set_slot(&mut self, stage: Stage, instr: Option<Instruction>) {
        *self.field_mut(stage) = instr;
    }

    /// Number of occupied slots.
    pub fn occupied(&self) -> usize {
        Stage::PIPELINE
            .iter()
            .filter(|s| self.slot(**s).is_some())
            .count()
    }

    /// True when no stage holds an instruction.
    pub fn is_empty(&self) -> bool {
        self.occupied() == 0
    }

    /// Iterates the slots in pipeline order, paired with their stage.
    pub fn iter(&self) -> impl Iterator<Item = (Stage, Option<&Instruction>)> + '_ {
        Stage::PIPELINE.into_iter().map(move |s| (s, self.slot(s)))
    }

    /// Clears every slot.
    pub fn clear(&mut self) {
        for stage in Stage::PIPELINE {
            self.set_slot(stage, None);
        }
    }
}

//! Hazard detection.
//!
//! Classification is pure: given a candidate instruction and read-only
//! views of the instructions ahead of it, a [`HazardModel`] reports
//! whether the candidate may advance. Turning a detected hazard into an
//! actual stall is the scheduler's job.
//!
//! The model is an injectable strategy so tests can script hazards
//! deterministically. The default [`DependencyModel`] does real register
//! dependency analysis against the pending writes ahead of the
//! candidate.

use crate::core::instruction::Instruction;
use crate::core::registers::PipelineRegisters;
use crate::core::Stage;
use crate::program::{FunctionalUnit, Reg};

/// Result of a hazard check on a candidate instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HazardCheck {
    /// The candidate may advance.
    NoHazard,
    /// A source operand is pending a write from an instruction ahead and
    /// forwarding is disabled.
    DataHazard,
    /// A required functional unit is occupied this cycle.
    StructuralHazard,
}

/// Strategy interface for hazard classification.
///
/// `forwarding_enabled` is an explicit input: a data hazard that would
/// stall without forwarding is resolved silently with it, and the model
/// must not consult any global to learn the setting.
pub trait HazardModel {
    /// Classifies the instruction in Execute against the stages ahead of
    /// it, before the scheduler moves it into Memory.
    fn check_execute(
        &mut self,
        candidate: &Instruction,
        ahead: &PipelineRegisters,
        forwarding_enabled: bool,
    ) -> HazardCheck;

    /// Decode-time structural check, before the scheduler moves the
    /// instruction into Execute.
    fn check_decode(&mut self, candidate: &Instruction, ahead: &PipelineRegisters) -> HazardCheck;

    /// Modeled memory-port re-check for the instruction in Memory. A
    /// `true` holds the whole pipeline upstream for this cycle.
    fn memory_stall(&mut self, instr: &Instruction, cycle: u64) -> bool;
}

/// Destination registers with writes still pending in the given stages.
///
/// An instruction sitting in Memory or Writeback has not yet performed
/// its register write; its destination is pending until it retires.
/// Writes to `x0` are never pending.
pub fn pending_writes<'a>(
    regs: &'a PipelineRegisters,
    stages: &'a [Stage],
) -> impl Iterator<Item = Reg> + 'a {
    stages
        .iter()
        .filter_map(|s| regs.slot(*s))
        .filter_map(|i| i.template.dest)
        .filter(|r| *r != Reg::ZERO)
}

/// Default hazard model: register dependency analysis plus a single
/// non-pipelined multiplier.
#[derive(Debug, Default, Clone)]
pub struct DependencyModel;

impl HazardModel for DependencyModel {
    fn check_execute(
        &mut self,
        candidate: &Instruction,
        ahead: &PipelineRegisters,
        forwarding_enabled: bool,
    ) -> HazardCheck {
        // The multiplier is busy while a multiply occupies Memory.
        if candidate.template.opcode.unit() == FunctionalUnit::Multiplier {
            let mul_ahead = ahead
                .slot(Stage::Memory)
                .is_some_and(|i| i.template.opcode.unit() == FunctionalUnit::Multiplier);
            if mul_ahead {
                return HazardCheck::StructuralHazard;
            }
        }

        if !forwarding_enabled {
            let pending: Vec<Reg> =
                pending_writes(ahead, &[Stage::Memory, Stage::Writeback]).collect();
            let blocked = candidate
                .template
                .sources
                .iter()
                .any(|src| pending.contains(src));
            if blocked {
                return HazardCheck::DataHazard;
            }
        }

        HazardCheck::NoHazard
    }

    fn check_decode(&mut self, candidate: &Instruction, ahead: &PipelineRegisters) -> HazardCheck {
        // Back-to-back multiplies contend for the single multiplier. By
        // the time decode is checked the leading multiply has already
        // advanced this cycle, so Memory is checked as well as Execute.
        if candidate.template.opcode.unit() == FunctionalUnit::Multiplier {
            let mul_ahead = [Stage::Execute, Stage::Memory].into_iter().any(|s| {
                ahead
                    .slot(s)
                    .is_some_and(|i| i.template.opcode.unit() == FunctionalUnit::Multiplier)
            });
            if mul_ahead {
                return HazardCheck::StructuralHazard;
            }
        }
        HazardCheck::NoHazard
    }

    fn memory_stall(&mut self, _instr: &Instruction, _cycle: u64) -> bool {
        false
    }
}

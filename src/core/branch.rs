//! Branch prediction and resolution.
//!
//! Branch direction is predicted at fetch and resolved in Execute. The
//! actual outcome stands in for unknown runtime data, so it is an
//! injectable strategy: the default [`SeededOutcome`] is a reproducible
//! pseudo-random model, and [`ScriptedOutcome`] lets tests force exact
//! outcomes.

use std::collections::VecDeque;

use crate::core::instruction::Instruction;

/// Resolved direction of a branch against its prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchOutcome {
    /// Direction the branch actually took.
    pub actual_taken: bool,
    /// Direction recorded by the predictor at fetch time.
    pub predicted_taken: bool,
}

impl BranchOutcome {
    /// True when prediction and outcome disagree, requiring a flush.
    pub fn mispredicted(&self) -> bool {
        self.actual_taken != self.predicted_taken
    }
}

/// Strategy producing the actual direction of a resolved branch.
pub trait OutcomeModel {
    /// Decides whether `instr` is actually taken.
    fn actual_taken(&mut self, instr: &Instruction) -> bool;
}

/// Deterministic pseudo-random outcome model (xorshift64).
///
/// Stands in for unknown runtime operand data while staying
/// reproducible for a given seed.
#[derive(Debug, Clone)]
pub struct SeededOutcome {
    state: u64,
}

impl SeededOutcome {
    /// Creates a model from a non-zero seed (zero is remapped).
    pub fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed },
        }
    }
}

impl Default for SeededOutcome {
    fn default() -> Self {
        Self::new(0x2545_F491_4F6C_DD1D)
    }
}

impl OutcomeModel for SeededOutcome {
    fn actual_taken(&mut self, _instr: &Instruction) -> bool {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x & 1 == 1
    }
}

/// Scripted outcome model for tests: pops queued directions in order and
/// answers not-taken once the script is exhausted.
#[derive(Debug, Default, Clone)]
pub struct ScriptedOutcome {
    script: VecDeque<bool>,
}

impl ScriptedOutcome {
    /// Queues the given outcomes, first branch first.
    pub fn new(outcomes: impl IntoIterator<Item = bool>) -> Self {
        Self {
            script: outcomes.into_iter().collect(),
        }
    }
}

impl OutcomeModel for ScriptedOutcome {
    fn actual_taken(&mut self, _instr: &Instruction) -> bool {
        self.script.pop_front().unwrap_or(false)
    }
}

/// Fetch-time direction prediction.
///
/// With prediction disabled the resolver never predicts taken. Enabled,
/// it uses the static backward-taken/forward-not-taken heuristic: a
/// branch whose target is at or before its own index is assumed to be a
/// loop and predicted taken.
pub fn predict(target: usize, own_index: usize, prediction_enabled: bool) -> bool {
    prediction_enabled && target <= own_index
}

/// Resolves a branch in Execute against its recorded prediction.
pub fn resolve(instr: &Instruction, model: &mut dyn OutcomeModel) -> BranchOutcome {
    BranchOutcome {
        actual_taken: model.actual_taken(instr),
        predicted_taken: instr.predicted_taken,
    }
}

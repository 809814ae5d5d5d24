//! Pipeline core.
//!
//! The five-stage state machine and the strategies it consults: pipeline
//! register storage, hazard classification, branch outcome modeling, and
//! the clocked scheduler that ties them together.

/// Branch prediction, outcome strategies, and resolution.
pub mod branch;

/// Pure hazard classification and the injectable hazard model.
pub mod hazards;

/// In-flight instruction state and the stage lifecycle.
pub mod instruction;

/// Pipeline register file: one optional instruction slot per stage.
pub mod registers;

/// The clocked scheduler and public simulator API.
pub mod simulator;

pub use instruction::{HazardKind, Instruction, Stage};
pub use registers::PipelineRegisters;
pub use simulator::{PipelineSimulator, SimState, HISTORY_CAP};

//! The clocked pipeline scheduler.
//!
//! [`PipelineSimulator`] owns every piece of mutable state: the program,
//! the pipeline registers, the program counter, the statistics, and the
//! hazard/branch strategy objects. One [`PipelineSimulator::clock_edge`]
//! call is one atomic cycle: stages advance in reverse pipeline order
//! (WB, MEM, EX, ID, IF) so an instruction can never vacate a stage and
//! have its successor cross the same boundary in the same cycle.

use serde::Serialize;

use crate::clock::ClockDriver;
use crate::config::SimConfig;
use crate::core::branch::{self, OutcomeModel, SeededOutcome};
use crate::core::hazards::{DependencyModel, HazardCheck, HazardModel};
use crate::core::instruction::{HazardKind, Instruction, Stage};
use crate::core::registers::PipelineRegisters;
use crate::program::Program;
use crate::snapshot::{InstructionView, Snapshot};
use crate::stats::SimStats;

/// Maximum retained completed-history entries; older entries are dropped.
pub const HISTORY_CAP: usize = 256;

/// Observable scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SimState {
    /// Instructions remain in flight or unfetched.
    Running,
    /// The program is exhausted and every slot is empty. Clock edges are
    /// no-ops in this state; counters stay frozen.
    Drained,
}

/// The pipeline simulator instance.
///
/// All state is owned here: no globals, so a host may run several
/// independent instances side by side to compare configurations.
pub struct PipelineSimulator {
    config: SimConfig,
    program: Program,
    regs: PipelineRegisters,
    pc: usize,
    clock: ClockDriver,
    stats: SimStats,
    history: Vec<Instruction>,
    next_id: u64,
    state: SimState,
    hazard_model: Box<dyn HazardModel + Send>,
    outcome_model: Box<dyn OutcomeModel + Send>,
}

impl PipelineSimulator {
    /// Creates a simulator running the built-in sample program with the
    /// default hazard and branch-outcome models.
    pub fn new(config: SimConfig) -> Self {
        Self::with_program(config, Program::sample())
    }

    /// Creates a simulator for a caller-supplied program.
    pub fn with_program(config: SimConfig, program: Program) -> Self {
        Self::with_models(
            config,
            program,
            Box::new(DependencyModel),
            Box::<SeededOutcome>::default(),
        )
    }

    /// Creates a simulator with injected hazard and branch-outcome
    /// strategies. Tests use this to script deterministic behavior.
    pub fn with_models(
        config: SimConfig,
        program: Program,
        hazard_model: Box<dyn HazardModel + Send>,
        outcome_model: Box<dyn OutcomeModel + Send>,
    ) -> Self {
        let mut sim = Self {
            config: config.sanitized(),
            program,
            regs: PipelineRegisters::new(),
            pc: 0,
            clock: ClockDriver::new(),
            stats: SimStats::default(),
            history: Vec::new(),
            next_id: 0,
            state: SimState::Running,
            hazard_model,
            outcome_model,
        };
        sim.reset(None);
        sim
    }

    /// Reinitializes the program counter, pipeline, statistics, clock,
    /// and history. With `program_override`, also reseeds the program
    /// store; otherwise the current program is kept. Calling reset twice
    /// in a row yields identical snapshots.
    pub fn reset(&mut self, program_override: Option<Program>) {
        if let Some(program) = program_override {
            self.program = program;
        }
        self.regs.clear();
        self.pc = 0;
        self.stats = SimStats::default();
        self.clock.reset();
        self.history.clear();
        self.next_id = 0;
        self.state = if self.program.is_empty() {
            SimState::Drained
        } else {
            SimState::Running
        };
    }

    /// Applies a new configuration, clamped into valid ranges.
    pub fn configure(&mut self, config: SimConfig) {
        self.config = config.sanitized();
    }

    /// Feeds elapsed host time to the clock driver and processes the
    /// resulting clock edges.
    pub fn advance(&mut self, elapsed_seconds: f64) {
        let edges = self.clock.tick(
            elapsed_seconds,
            self.config.clock_hz,
            self.config.max_edges_per_tick,
        );
        for _ in 0..edges {
            self.clock_edge();
        }
    }

    /// Processes one clock edge.
    ///
    /// Once begun, the edge always runs to its defined stopping point: a
    /// stall or misprediction ends the edge early for the stages upstream
    /// of it, but work already done downstream in the same edge stands.
    /// In the [`SimState::Drained`] state this is a no-op.
    pub fn clock_edge(&mut self) {
        if self.state == SimState::Drained {
            return;
        }
        self.stats.total_cycles += 1;
        let cycle = self.stats.total_cycles;

        // 1. Writeback retires.
        if let Some(mut instr) = self.regs.take_slot(Stage::Writeback) {
            instr.advance_to(Stage::Completed);
            if self.config.trace {
                eprintln!("WB  retire id={} {}", instr.id, instr.template.mnemonic);
            }
            self.stats.completed_count += 1;
            self.push_history(instr);
        }

        self.advance_upstream(cycle);

        if self.pc >= self.program.len() && self.regs.is_empty() {
            self.state = SimState::Drained;
            if self.config.trace {
                eprintln!("--  pipeline drained at cycle {cycle}");
            }
        }
    }

    /// Steps 2-6 of the per-edge algorithm. An early return is a stall or
    /// control bubble holding everything upstream of it for this edge.
    fn advance_upstream(&mut self, cycle: u64) {
        // 2. Memory: modeled memory-port re-check.
        let mem_stall = match self.regs.slot(Stage::Memory) {
            Some(instr) => self.hazard_model.memory_stall(instr, cycle),
            None => false,
        };
        if mem_stall {
            self.stall(Stage::Memory, HazardKind::Structural);
            return;
        }
        self.move_up(Stage::Memory);

        // 3. Execute: branch resolution or hazard check.
        if let Some(instr) = self.regs.slot(Stage::Execute) {
            if instr.template.is_branch() {
                let fallthrough = instr.pc_index + 1;
                let target = instr.template.branch_target.unwrap_or(fallthrough);
                let outcome = branch::resolve(instr, self.outcome_model.as_mut());
                let redirect = if outcome.actual_taken { target } else { fallthrough };
                self.stats.branches_resolved += 1;
                if self.config.trace {
                    eprintln!(
                        "EX  branch id={} actual={} predicted={}",
                        instr.id, outcome.actual_taken, outcome.predicted_taken
                    );
                }
                self.move_up(Stage::Execute);
                if outcome.mispredicted() {
                    self.stats.branch_mispredictions += 1;
                    self.flush_frontend();
                    self.pc = redirect;
                    if self.config.trace {
                        eprintln!("EX  mispredict: redirect pc -> {}", self.pc);
                    }
                    return;
                }
            } else {
                let check = self.hazard_model.check_execute(
                    instr,
                    &self.regs,
                    self.config.forwarding_enabled,
                );
                match check {
                    HazardCheck::NoHazard => self.move_up(Stage::Execute),
                    HazardCheck::DataHazard => {
                        self.stall(Stage::Execute, HazardKind::Data);
                        return;
                    }
                    HazardCheck::StructuralHazard => {
                        self.stall(Stage::Execute, HazardKind::Structural);
                        return;
                    }
                }
            }
        }

        // 4. Decode: decode-time resource allocation.
        if let Some(instr) = self.regs.slot(Stage::Decode) {
            match self.hazard_model.check_decode(instr, &self.regs) {
                HazardCheck::NoHazard => self.move_up(Stage::Decode),
                HazardCheck::DataHazard => {
                    self.stall(Stage::Decode, HazardKind::Data);
                    return;
                }
                HazardCheck::StructuralHazard => {
                    self.stall(Stage::Decode, HazardKind::Structural);
                    return;
                }
            }
        }

        // 5. Fetch advances into the now-free decode slot.
        self.move_up(Stage::Fetch);

        // 6. Fetch a new instruction at the current program counter.
        self.fetch_new(cycle);
    }

    /// Transfers the occupant of `from` one stage forward.
    fn move_up(&mut self, from: Stage) {
        if let Some(mut instr) = self.regs.take_slot(from) {
            let to = from.next();
            instr.advance_to(to);
            if self.config.trace {
                eprintln!("{to:<3} enter id={} {}", instr.id, instr.template.mnemonic);
            }
            debug_assert!(self.regs.slot(to).is_none(), "stage {to} double-occupied");
            self.regs.set_slot(to, Some(instr));
        }
    }

    /// Holds the occupant of `stage` in place and accounts the stall.
    fn stall(&mut self, stage: Stage, kind: HazardKind) {
        if let Some(instr) = self.regs.slot_mut(stage) {
            instr.hold(kind);
            if self.config.trace {
                eprintln!("{stage:<3} stall id={} ({kind:?})", instr.id);
            }
        }
        self.stats.stall_cycles += 1;
        match kind {
            HazardKind::Data => self.stats.data_stalls += 1,
            HazardKind::Structural => self.stats.structural_stalls += 1,
            HazardKind::Control => {}
        }
    }

    /// Discards the speculative front end (IF and ID) after a
    /// misprediction. Discarded work is counted, never silently lost.
    fn flush_frontend(&mut self) {
        for stage in [Stage::Fetch, Stage::Decode] {
            if let Some(instr) = self.regs.take_slot(stage) {
                self.stats.flushed_count += 1;
                if self.config.trace {
                    eprintln!("{stage:<3} flush id={} {}", instr.id, instr.template.mnemonic);
                }
            }
        }
    }

    /// Pulls the next instruction from the program store into IF and
    /// advances the program counter along the predicted path.
    fn fetch_new(&mut self, cycle: u64) {
        if self.regs.slot(Stage::Fetch).is_some() {
            return;
        }
        let Some(template) = self.program.instruction_at(self.pc) else {
            return;
        };
        let template = template.clone();
        let predicted = match template.branch_target {
            Some(target) => branch::predict(target, self.pc, self.config.branch_prediction_enabled),
            None => false,
        };
        let next_pc = match (predicted, template.branch_target) {
            (true, Some(target)) => target,
            _ => self.pc + 1,
        };

        let instr = Instruction::fetched(self.next_id, self.pc, template, cycle, predicted);
        self.next_id += 1;
        if self.config.trace {
            eprintln!(
                "IF  fetch id={} {} {} (pc={})",
                instr.id, instr.template.mnemonic, instr.template.operands, instr.pc_index
            );
        }
        self.regs.set_slot(Stage::Fetch, Some(instr));
        self.pc = next_pc;
    }

    fn push_history(&mut self, instr: Instruction) {
        if self.history.len() == HISTORY_CAP {
            let _ = self.history.remove(0);
        }
        self.history.push(instr);
    }

    /// Read-only value snapshot for the presentation layer.
    pub fn snapshot(&self) -> Snapshot {
        let slots = std::array::from_fn(|i| {
            self.regs.slot(Stage::PIPELINE[i]).map(InstructionView::from)
        });
        Snapshot {
            cycle: self.stats.total_cycles,
            pc: self.pc,
            state: self.state,
            slots,
            stats: self.stats.clone(),
            program_len: self.program.len(),
        }
    }

    /// One-paragraph human-readable summary of the current state.
    pub fn describe_state(&self) -> String {
        let occupancy: Vec<String> = self
            .regs
            .iter()
            .map(|(stage, slot)| match slot {
                Some(instr) => format!("{stage}:{}", instr.template.mnemonic),
                None => format!("{stage}:-"),
            })
            .collect();
        format!(
            "cycle {}: {} of {} instructions retired ({:?}), CPI {:.2}, IPC {:.2}, \
             stall rate {:.1}%, {} branch mispredictions, {} flushed; \
             pipeline [{}], next fetch index {}",
            self.stats.total_cycles,
            self.stats.completed_count,
            self.program.len(),
            self.state,
            self.stats.cpi(),
            self.stats.ipc(),
            self.stats.stall_rate() * 100.0,
            self.stats.branch_mispredictions,
            self.stats.flushed_count,
            occupancy.join(" "),
            self.pc
        )
    }

    /// Statistics counters.
    pub fn stats(&self) -> &SimStats {
        &self.stats
    }

    /// Running or drained.
    pub fn state(&self) -> SimState {
        self.state
    }

    /// True once the program is exhausted and the pipeline is empty.
    pub fn is_drained(&self) -> bool {
        self.state == SimState::Drained
    }

    /// Next program index to fetch.
    pub fn pc(&self) -> usize {
        self.pc
    }

    /// The loaded program.
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// The pipeline register file.
    pub fn registers(&self) -> &PipelineRegisters {
        &self.regs
    }

    /// Retired instructions, oldest first, capped at [`HISTORY_CAP`].
    pub fn history(&self) -> &[Instruction] {
        &self.history
    }

    /// The active (sanitized) configuration.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }
}

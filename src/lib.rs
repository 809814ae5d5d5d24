//! Instruction-Pipeline Simulator Core.
//!
//! This crate implements the simulation core behind the "CPU Pipeline"
//! teaching visualization: a simplified 5-stage in-order pipeline
//! (Fetch, Decode, Execute, Memory, Writeback) with hazard detection,
//! optional forwarding, branch prediction with misprediction flush,
//! stall accounting, and throughput statistics (CPI/IPC).
//!
//! # Architecture
//!
//! * **Core**: 5-stage in-order pipeline advanced one clock edge at a time,
//!   in reverse stage order so that each per-cycle transition is atomic.
//! * **Hazards**: pure, injectable classification of data and structural
//!   hazards; forwarding resolves data hazards without stalling.
//! * **Branches**: predicted at fetch, resolved in Execute; a misprediction
//!   flushes the front end and redirects the program counter.
//!
//! The presentation layer (canvas rendering, layout, color) is an external
//! consumer. It only ever reads value snapshots produced by
//! [`core::PipelineSimulator::snapshot`]; it never mutates simulator state.
//!
//! # Modules
//!
//! * `clock`: Wall-clock to discrete clock-edge conversion.
//! * `config`: Configuration loading, defaults, and clamping.
//! * `core`: Pipeline state machine, hazard and branch models.
//! * `program`: Instruction templates, program store, and assembly parsing.
//! * `snapshot`: Read-only value snapshots for rendering.
//! * `stats`: Throughput statistics collection.

/// Clock driver converting elapsed wall time into discrete clock edges.
pub mod clock;

/// Configuration system for clock rate, prediction, and forwarding settings.
///
/// Parses TOML configuration text and clamps out-of-range values to safe
/// minimums before they reach the clock driver.
pub mod config;

/// Pipeline core: registers, hazard detection, branch resolution, and the
/// clocked scheduler.
///
/// Implements the 5-stage in-order pipeline (Fetch, Decode, Execute,
/// Memory, Writeback) and the per-edge advancement algorithm.
pub mod core;

/// Instruction templates, the immutable program store, and the assembly
/// text parser.
pub mod program;

/// Read-only value snapshots of simulator state for the presentation layer.
pub mod snapshot;

/// Throughput statistics collection and derived metrics (CPI, IPC,
/// stall rate, branch accuracy).
pub mod stats;

pub use crate::config::SimConfig;
pub use crate::core::PipelineSimulator;
pub use crate::program::Program;
pub use crate::snapshot::Snapshot;
pub use crate::stats::SimStats;

//! Simulation statistics collection and reporting.
//!
//! Tracks cycle, stall, retirement, and branch counters. The counters are
//! monotonically non-decreasing and are mutated only by the pipeline
//! scheduler; everything else (CPI, IPC, stall rate, branch accuracy) is
//! derived on demand and never stored.

/// Simulation statistics counters.
///
/// Reset only by an explicit simulator reset. Derived metrics guard their
/// divisions and return `0.0` rather than NaN when no work has happened.
#[derive(Debug, Default, Clone, PartialEq, serde::Serialize)]
pub struct SimStats {
    /// Clock edges processed while the pipeline was live.
    pub total_cycles: u64,
    /// Cycles in which some instruction was held in place by a hazard.
    pub stall_cycles: u64,
    /// Stall cycles attributed to data hazards.
    pub data_stalls: u64,
    /// Stall cycles attributed to structural hazards.
    pub structural_stalls: u64,
    /// Branches resolved in the execute stage.
    pub branches_resolved: u64,
    /// Branches whose predicted direction disagreed with the actual one.
    pub branch_mispredictions: u64,
    /// Instructions that completed writeback.
    pub completed_count: u64,
    /// Speculative instructions discarded by misprediction flushes.
    pub flushed_count: u64,
}

impl SimStats {
    /// Cycles per completed instruction; `0.0` before anything completes.
    pub fn cpi(&self) -> f64 {
        if self.completed_count == 0 {
            return 0.0;
        }
        self.total_cycles as f64 / self.completed_count as f64
    }

    /// Completed instructions per cycle; `0.0` before the first cycle.
    pub fn ipc(&self) -> f64 {
        if self.total_cycles == 0 {
            return 0.0;
        }
        self.completed_count as f64 / self.total_cycles as f64
    }

    /// Fraction of cycles lost to stalls, in `[0.0, 1.0]`.
    pub fn stall_rate(&self) -> f64 {
        if self.total_cycles == 0 {
            return 0.0;
        }
        self.stall_cycles as f64 / self.total_cycles as f64
    }

    /// Fraction of resolved branches that were predicted correctly;
    /// `0.0` when no branch has resolved yet.
    pub fn branch_accuracy(&self) -> f64 {
        if self.branches_resolved == 0 {
            return 0.0;
        }
        1.0 - self.branch_mispredictions as f64 / self.branches_resolved as f64
    }

    /// Prints a formatted summary of the counters and derived metrics.
    pub fn print(&self) {
        println!("\n-----------------------------");
        println!("Cycles:               {}", self.total_cycles);
        println!("Instructions Retired: {}", self.completed_count);
        println!("IPC:                  {:.4}", self.ipc());
        println!("CPI:                  {:.4}", self.cpi());
        println!(
            "Stalls:               {} ({:.2}% of cycles, {} data / {} structural)",
            self.stall_cycles,
            self.stall_rate() * 100.0,
            self.data_stalls,
            self.structural_stalls
        );
        if self.branches_resolved > 0 {
            println!(
                "Branch Prediction:    {:.2}% accuracy ({} / {})",
                self.branch_accuracy() * 100.0,
                self.branches_resolved - self.branch_mispredictions,
                self.branches_resolved
            );
        } else {
            println!("Branch Prediction:    N/A");
        }
        println!("Flushed:              {}", self.flushed_count);
        println!("-----------------------------");
    }
}

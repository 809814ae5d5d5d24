use serde::Deserialize;
use thiserror::Error;

/// Lowest clock rate the driver will ever be asked to divide by.
pub const MIN_CLOCK_HZ: f64 = 0.25;

/// Highest clock rate accepted from configuration.
pub const MAX_CLOCK_HZ: f64 = 1_000_000.0;

const DEFAULT_CLOCK_HZ: f64 = 4.0;
const DEFAULT_MAX_EDGES: u32 = 64;

/// Error produced when configuration text cannot be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML text failed to parse.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Simulator configuration.
///
/// All fields have serde defaults so a partial TOML document is valid.
/// Out-of-range values are clamped by [`SimConfig::sanitized`] before they
/// reach the clock driver; the raw deserialized values are never used
/// directly by the simulator.
#[derive(Debug, Clone, Deserialize)]
pub struct SimConfig {
    /// Simulated clock rate in Hz. Clamped to `[MIN_CLOCK_HZ, MAX_CLOCK_HZ]`.
    #[serde(default = "default_clock_hz")]
    pub clock_hz: f64,

    /// When false, the branch resolver always predicts not-taken, which
    /// maximizes observable mispredictions for teaching purposes.
    #[serde(default = "default_true")]
    pub branch_prediction_enabled: bool,

    /// When false, detected data hazards stall the pipeline instead of
    /// being resolved by value forwarding.
    #[serde(default = "default_true")]
    pub forwarding_enabled: bool,

    /// Upper bound on clock edges processed per `advance` call. Guards
    /// against unbounded catch-up loops after a long host pause.
    #[serde(default = "default_max_edges")]
    pub max_edges_per_tick: u32,

    /// Emit stage-transition trace lines on stderr.
    #[serde(default)]
    pub trace: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            clock_hz: DEFAULT_CLOCK_HZ,
            branch_prediction_enabled: true,
            forwarding_enabled: true,
            max_edges_per_tick: DEFAULT_MAX_EDGES,
            trace: false,
        }
    }
}

impl SimConfig {
    /// Loads a configuration from TOML text. Missing fields take their
    /// defaults; the result is already sanitized.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        Ok(config.sanitized())
    }

    /// Returns a copy with every field clamped into its valid range.
    ///
    /// A non-finite or non-positive `clock_hz` becomes [`MIN_CLOCK_HZ`]
    /// rather than propagating into the clock driver's division.
    pub fn sanitized(&self) -> Self {
        let clock_hz = if self.clock_hz.is_finite() {
            self.clock_hz.clamp(MIN_CLOCK_HZ, MAX_CLOCK_HZ)
        } else {
            MIN_CLOCK_HZ
        };
        Self {
            clock_hz,
            branch_prediction_enabled: self.branch_prediction_enabled,
            forwarding_enabled: self.forwarding_enabled,
            max_edges_per_tick: self.max_edges_per_tick.max(1),
            trace: self.trace,
        }
    }
}

fn default_clock_hz() -> f64 {
    DEFAULT_CLOCK_HZ
}

fn default_true() -> bool {
    true
}

fn default_max_edges() -> u32 {
    DEFAULT_MAX_EDGES
}

//! Solver configuration and run-time process settings.

use std::fmt;

use crate::error::{CircuitError, Result};
use crate::solver::{CONVERGENCE_TOLERANCE, MAX_ITERATIONS};
use crate::DEFAULT_SAMPLE_RATE;

/// Configuration for the simulator.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatorConfig {
    /// Maximum Newton-Raphson iterations per sample.
    pub max_iterations: usize,
    /// Convergence tolerance for Newton-Raphson: the Euclidean norm of the
    /// update of every non-ground unknown.
    pub tolerance: f64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            max_iterations: MAX_ITERATIONS,
            tolerance: CONVERGENCE_TOLERANCE,
        }
    }
}

impl SimulatorConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum Newton-Raphson iterations.
    ///
    /// This bounds the worst-case cost of one sample.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the convergence tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(CircuitError::invalid_param("max_iterations must be at least 1"));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(CircuitError::invalid_param(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

/// Oversampling factor applied by the host before the circuit runs.
///
/// The engine only needs the factor to size its time step; resampling
/// itself happens outside.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Oversampling {
    #[default]
    X1,
    X2,
    X4,
    X8,
}

impl Oversampling {
    pub fn factor(self) -> u32 {
        match self {
            Oversampling::X1 => 1,
            Oversampling::X2 => 2,
            Oversampling::X4 => 4,
            Oversampling::X8 => 8,
        }
    }
}

impl TryFrom<u32> for Oversampling {
    type Error = CircuitError;

    fn try_from(factor: u32) -> Result<Self> {
        match factor {
            1 => Ok(Oversampling::X1),
            2 => Ok(Oversampling::X2),
            4 => Ok(Oversampling::X4),
            8 => Ok(Oversampling::X8),
            other => Err(CircuitError::invalid_param(format!(
                "oversampling factor must be 1, 2, 4 or 8, got {}",
                other
            ))),
        }
    }
}

impl fmt::Display for Oversampling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x", self.factor())
    }
}

/// Settings the host hands to the processor.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessSettings {
    /// Host sample rate in Hz
    pub sample_rate: f64,
    /// Maximum samples per block
    pub block_size: usize,
    /// Number of independently processed channels
    pub channels: usize,
    pub oversampling: Oversampling,
    /// Gain from input sample to circuit voltage, in dB
    pub input_gain_db: f64,
    /// Gain from probe voltage to output sample, in dB
    pub output_gain_db: f64,
    /// Dry/wet mix, 0 (dry) to 100 (wet)
    pub mix_percent: f64,
}

impl Default for ProcessSettings {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            block_size: 512,
            channels: 1,
            oversampling: Oversampling::X1,
            input_gain_db: 0.0,
            output_gain_db: 0.0,
            mix_percent: 100.0,
        }
    }
}

impl ProcessSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sample_rate(mut self, sample_rate: f64) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn with_channels(mut self, channels: usize) -> Self {
        self.channels = channels;
        self
    }

    pub fn with_oversampling(mut self, oversampling: Oversampling) -> Self {
        self.oversampling = oversampling;
        self
    }

    pub fn with_input_gain_db(mut self, db: f64) -> Self {
        self.input_gain_db = db;
        self
    }

    pub fn with_output_gain_db(mut self, db: f64) -> Self {
        self.output_gain_db = db;
        self
    }

    pub fn with_mix_percent(mut self, percent: f64) -> Self {
        self.mix_percent = percent;
        self
    }

    /// Rate the circuit is stepped at: host rate times the oversampling factor.
    pub fn effective_sample_rate(&self) -> f64 {
        self.sample_rate * f64::from(self.oversampling.factor())
    }

    /// Check the settings a host passed in.
    pub fn validate(&self) -> Result<()> {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(CircuitError::invalid_param(format!(
                "sample rate must be positive, got {}",
                self.sample_rate
            )));
        }
        if self.block_size == 0 {
            return Err(CircuitError::invalid_param("block size must be at least 1"));
        }
        if self.channels == 0 {
            return Err(CircuitError::invalid_param("channel count must be at least 1"));
        }
        if !self.input_gain_db.is_finite() || !self.output_gain_db.is_finite() {
            return Err(CircuitError::invalid_param("gains must be finite"));
        }
        if !(0.0..=100.0).contains(&self.mix_percent) {
            return Err(CircuitError::invalid_param(format!(
                "mix must be between 0 and 100 %, got {}",
                self.mix_percent
            )));
        }
        Ok(())
    }
}

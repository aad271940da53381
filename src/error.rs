//! Error types for the CircuitLive engine.
//!
//! This module provides a unified error type [`CircuitError`] that covers
//! netlist loading and parsing, topology validation, and run-time settings.
//! Nothing on the audio path returns an error: numerical trouble inside the
//! solver (non-convergence, singular systems) is not reported through here.

use thiserror::Error;

/// Result type alias using [`CircuitError`].
pub type Result<T> = std::result::Result<T, CircuitError>;

/// Unified error type for all CircuitLive operations.
#[derive(Error, Debug)]
pub enum CircuitError {
    // ============ Netlist Parsing Errors ============
    /// Line does not start with a known component symbol
    #[error("Unknown component symbol '{symbol}' at line {line}")]
    UnknownComponentType { symbol: String, line: usize },

    /// A required field is missing from a netlist line
    #[error("Missing {field} at line {line}")]
    MissingField { field: &'static str, line: usize },

    /// A node or value field could not be parsed
    #[error("Invalid {field} '{token}' at line {line}")]
    InvalidNumber {
        field: &'static str,
        token: String,
        line: usize,
    },

    /// More fields than the line format allows
    #[error("Unexpected token '{token}' at line {line}")]
    UnexpectedToken { token: String, line: usize },

    // ============ Topology Errors ============
    /// The netlist contains no components
    #[error("Netlist has no components")]
    EmptyNetlist,

    /// The netlist has no voltage probe to read the output from
    #[error("Netlist has no voltage probe (add a 'Vo' line)")]
    MissingProbe,

    /// A node index does not fit the dense node numbering
    #[error("Node {node} at line {line} is out of range (netlist has {num_nodes} nodes, numbered from 0)")]
    NodeOutOfRange {
        node: usize,
        num_nodes: usize,
        line: usize,
    },

    // ============ Simulation Errors ============
    /// Invalid simulation parameter
    #[error("Invalid simulation parameter: {message}")]
    InvalidSimulationParam { message: String },

    // ============ I/O Errors ============
    /// Error reading the netlist file
    #[error("Failed to read netlist file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Error reading audio input
    #[error("Audio input error: {message}")]
    AudioInputError { message: String },

    /// Error writing audio output
    #[error("Audio output error: {message}")]
    AudioOutputError { message: String },
}

impl CircuitError {
    /// Create an invalid number error
    pub fn invalid_number(field: &'static str, token: impl Into<String>, line: usize) -> Self {
        Self::InvalidNumber {
            field,
            token: token.into(),
            line,
        }
    }

    /// Create an invalid simulation parameter error
    pub fn invalid_param(message: impl Into<String>) -> Self {
        Self::InvalidSimulationParam {
            message: message.into(),
        }
    }

    /// True when the netlist source could not be read at all.
    ///
    /// Such a load is abandoned and whatever netlist was running keeps running.
    /// Every other load error replaces the running netlist with an
    /// uninitialized one.
    pub fn is_load_failure(&self) -> bool {
        matches!(self, Self::FileReadError { .. })
    }
}

//! MNA (Modified Nodal Analysis) solver.
//!
//! This module provides the numerical engine for circuit simulation.
//!
//! ## Modified Nodal Analysis
//!
//! MNA assembles a system of equations Ax = b where:
//! - x contains node voltages and auxiliary unknowns (branch currents)
//! - A is the conductance/coefficient matrix
//! - b is the source vector
//!
//! The matrix structure is:
//! ```text
//! [ G   B ] [ v ]   [ i ]
//! [ C   D ] [ j ] = [ e ]
//! ```
//!
//! where:
//! - G is the conductance matrix (node equations)
//! - B, C connect voltage sources, reactive branches and op-amps to nodes
//! - D holds the companion resistances of reactive branches
//! - v is the vector of node voltages, ground included
//! - j is the vector of auxiliary currents
//! - i is the sum of current sources into each node
//! - e is the vector of source and companion voltages
//!
//! Node 0 is ground. Its row and column exist in `A` but are excluded from
//! the LU factorization, so `x[0]` is always zero.

mod assembly;
mod channel;
mod mna;
mod newton;
mod simulator;

pub use assembly::{
    drive_sources, linearize_diodes, read_probes, restamp, set_time_step, stamp_all,
    stamp_dynamic_rows, update_companions,
};
pub use channel::ChannelState;
pub use mna::MnaMatrix;
pub use newton::{NewtonOutcome, NewtonRaphson};
pub use simulator::{ProcessMode, Simulator};

/// Convergence tolerance for Newton-Raphson iteration.
pub const CONVERGENCE_TOLERANCE: f64 = 1e-6;

/// Maximum Newton-Raphson iterations per time step.
pub const MAX_ITERATIONS: usize = 16;

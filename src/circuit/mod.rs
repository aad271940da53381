//! Circuit topology and validation.
//!
//! This module turns a parsed netlist into the representation the solver
//! works on. The [`Circuit`] struct owns every component in file order and
//! keeps per-kind index lists into that arena, plus the node and auxiliary
//! unknown counts that size the MNA system.

mod graph;
mod types;
mod validate;

pub use graph::{Circuit, Roles};
pub use types::*;
pub use validate::validate_circuit;

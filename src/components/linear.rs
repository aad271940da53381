//! Linear passive components: Resistor, Capacitor, Inductor.

use crate::circuit::{AuxIndex, NodeId};
use crate::solver::MnaMatrix;

/// A resistor component.
#[derive(Debug, Clone)]
pub struct Resistor {
    pub nodes: [NodeId; 2],
    pub resistance: f64,
    /// Cached 1/R
    pub admittance: f64,
}

impl Resistor {
    /// Create a new resistor.
    pub fn new(nodes: [NodeId; 2], resistance: f64) -> Self {
        Self {
            nodes,
            resistance,
            admittance: 1.0 / resistance,
        }
    }

    /// Get the conductance (1/R).
    pub fn conductance(&self) -> f64 {
        self.admittance
    }

    pub fn stamp(&self, matrix: &mut MnaMatrix) {
        matrix.stamp_conductance(self.nodes[0], self.nodes[1], self.admittance);
    }
}

/// Trapezoidal companion model shared by capacitors and inductors.
///
/// The element is replaced for one time step by a resistance `Req` in series
/// with a voltage source. Its branch current is an auxiliary unknown, so the
/// stamp is a constraint row:
///
/// ```text
///   V(start) - V(end) - Req * I = v_comp
/// ```
#[derive(Debug, Clone)]
pub struct Companion {
    pub aux: AuxIndex,
    /// Equivalent resistance for the current time step
    pub resistance: f64,
    /// History voltage source value
    pub voltage: f64,
}

impl Companion {
    fn new(aux: AuxIndex) -> Self {
        Self {
            aux,
            resistance: 0.0,
            voltage: 0.0,
        }
    }

    fn stamp(&self, nodes: [NodeId; 2], matrix: &mut MnaMatrix) {
        let row = matrix.aux_row(self.aux);
        matrix.stamp_branch(nodes[0], nodes[1], row);
        matrix.set(row, row, -self.resistance);
        matrix.set_rhs(row, self.voltage);
    }

    /// `(V_start - V_end) + Req * I_aux` evaluated on the last solution.
    fn history(&self, nodes: [NodeId; 2], matrix: &MnaMatrix) -> f64 {
        matrix.voltage_across(nodes[0], nodes[1]) + self.resistance * matrix.aux_value(self.aux)
    }
}

/// A capacitor component.
///
/// With the trapezoidal rule, `i(n) = (2C/Ts)(v(n) - v(n-1)) - i(n-1)`, which
/// rearranges to `v(n) - Req*i(n) = v(n-1) + Req*i(n-1)` with `Req = Ts/(2C)`.
#[derive(Debug, Clone)]
pub struct Capacitor {
    pub nodes: [NodeId; 2],
    pub capacitance: f64,
    pub companion: Companion,
}

impl Capacitor {
    /// Create a new capacitor.
    pub fn new(nodes: [NodeId; 2], capacitance: f64, aux: AuxIndex) -> Self {
        Self {
            nodes,
            capacitance,
            companion: Companion::new(aux),
        }
    }

    /// Recompute the companion resistance for time step `ts`.
    pub fn set_time_step(&mut self, ts: f64) {
        self.companion.resistance = ts / (2.0 * self.capacitance);
    }

    /// Refresh the history source from the previous solution.
    pub fn update_voltage(&mut self, matrix: &MnaMatrix) {
        self.companion.voltage = self.companion.history(self.nodes, matrix);
    }

    pub fn stamp(&self, matrix: &mut MnaMatrix) {
        self.companion.stamp(self.nodes, matrix);
    }
}

/// An inductor component.
///
/// With the trapezoidal rule, `v(n) + v(n-1) = (2L/Ts)(i(n) - i(n-1))`, so
/// `v(n) - Req*i(n) = -(v(n-1) + Req*i(n-1))` with `Req = 2L/Ts`.
#[derive(Debug, Clone)]
pub struct Inductor {
    pub nodes: [NodeId; 2],
    pub inductance: f64,
    pub companion: Companion,
}

impl Inductor {
    /// Create a new inductor.
    pub fn new(nodes: [NodeId; 2], inductance: f64, aux: AuxIndex) -> Self {
        Self {
            nodes,
            inductance,
            companion: Companion::new(aux),
        }
    }

    /// Recompute the companion resistance for time step `ts`.
    pub fn set_time_step(&mut self, ts: f64) {
        self.companion.resistance = 2.0 * self.inductance / ts;
    }

    /// Refresh the history source from the previous solution.
    pub fn update_voltage(&mut self, matrix: &MnaMatrix) {
        self.companion.voltage = -self.companion.history(self.nodes, matrix);
    }

    pub fn stamp(&self, matrix: &mut MnaMatrix) {
        self.companion.stamp(self.nodes, matrix);
    }
}

//! Voltage and current sources.

use crate::circuit::{AuxIndex, NodeId};
use crate::solver::MnaMatrix;

/// A voltage source component.
///
/// Voltage sources require an extra row/column in the MNA matrix for the
/// branch current. The source enforces: V+ - V- = V_source
#[derive(Debug, Clone)]
pub struct VoltageSource {
    pub nodes: [NodeId; 2], // [positive, negative]
    pub aux: AuxIndex,
    /// If true, the value is overwritten by the audio input every sample
    pub external: bool,
    /// Current value
    pub voltage: f64,
}

impl VoltageSource {
    /// Create a new voltage source.
    pub fn new(nodes: [NodeId; 2], voltage: f64, aux: AuxIndex, external: bool) -> Self {
        Self {
            nodes,
            aux,
            external,
            voltage,
        }
    }

    /// Set the source value (used for audio input).
    pub fn set_voltage(&mut self, voltage: f64) {
        self.voltage = voltage;
    }

    pub fn stamp(&self, matrix: &mut MnaMatrix) {
        let row = matrix.aux_row(self.aux);
        matrix.stamp_branch(self.nodes[0], self.nodes[1], row);
        matrix.set_rhs(row, self.voltage);
    }
}

/// A current source component.
///
/// Current sources add directly to the RHS vector of the MNA equations.
#[derive(Debug, Clone)]
pub struct CurrentSource {
    pub nodes: [NodeId; 2], // current flows from start to end through the source
    pub current: f64,
}

impl CurrentSource {
    /// Create a new current source.
    pub fn new(nodes: [NodeId; 2], current: f64) -> Self {
        Self { nodes, current }
    }

    pub fn stamp(&self, matrix: &mut MnaMatrix) {
        matrix.stamp_current_source(self.nodes[0], self.nodes[1], self.current);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voltage_source_stamp() {
        let mut m = MnaMatrix::new(3, 1);
        let mut v = VoltageSource::new([NodeId(2), NodeId(1)], 1.5, AuxIndex(0), true);
        v.set_voltage(0.25);
        v.stamp(&mut m);

        assert_eq!(m.get(2, 3), 1.0);
        assert_eq!(m.get(1, 3), -1.0);
        assert_eq!(m.get(3, 2), 1.0);
        assert_eq!(m.get(3, 1), -1.0);
        assert_eq!(m.b[3], 0.25);
    }

    #[test]
    fn test_current_source_stamp() {
        let mut m = MnaMatrix::new(3, 0);
        let i = CurrentSource::new([NodeId(1), NodeId(2)], 2e-3);
        i.stamp(&mut m);
        assert_eq!(m.b[1], -2e-3);
        assert_eq!(m.b[2], 2e-3);
    }
}

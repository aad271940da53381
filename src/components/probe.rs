//! Voltage probe: the output tap of a netlist.

use crate::circuit::NodeId;
use crate::solver::MnaMatrix;

/// Measures the voltage between two nodes. Contributes nothing to the system.
#[derive(Debug, Clone)]
pub struct VoltageProbe {
    pub nodes: [NodeId; 2],
    /// Last reading
    pub voltage: f64,
}

impl VoltageProbe {
    pub fn new(nodes: [NodeId; 2]) -> Self {
        Self {
            nodes,
            voltage: 0.0,
        }
    }

    /// Read `V(start) - V(end)` from the last solution and keep it.
    pub fn read(&mut self, matrix: &MnaMatrix) -> f64 {
        self.voltage = matrix.voltage_across(self.nodes[0], self.nodes[1]);
        self.voltage
    }
}

//! Circuit validation.

use crate::components::Component;
use crate::error::{CircuitError, Result};

use super::Circuit;

/// Validate a circuit for simulation.
///
/// Checks:
/// - The netlist has at least one component
/// - There is a voltage probe to read the output from
/// - Every node index (op-amp outputs included) has a row in the system
pub fn validate_circuit(circuit: &Circuit) -> Result<()> {
    if circuit.components.is_empty() {
        return Err(CircuitError::EmptyNetlist);
    }

    if circuit.roles.probes.is_empty() {
        return Err(CircuitError::MissingProbe);
    }

    for (idx, component) in circuit.components.iter().enumerate() {
        let mut nodes = component.nodes().to_vec();
        if let Component::IdealOpAmp(op) = component {
            nodes.push(op.output);
        }

        if let Some(node) = nodes.into_iter().find(|n| n.index() >= circuit.num_nodes) {
            return Err(CircuitError::NodeOutOfRange {
                node: node.index(),
                num_nodes: circuit.num_nodes,
                line: circuit.lines.get(idx).copied().unwrap_or(0),
            });
        }
    }

    // TODO: detect floating subcircuits (no path to ground) before the first
    // factorization instead of letting them surface as NaN output.

    Ok(())
}

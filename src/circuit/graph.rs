//! Circuit topology: component arena, node/aux counts and per-kind views.

use std::collections::BTreeSet;

use super::types::ComponentId;
use crate::components::Component;
use crate::dsl::NetlistAst;
use crate::error::Result;

/// Per-kind index lists into [`Circuit::components`].
///
/// Each list is in file order.
#[derive(Debug, Clone, Default)]
pub struct Roles {
    /// Every voltage source, audio-driven or fixed
    pub voltage_sources: Vec<usize>,
    /// Audio-driven voltage sources only
    pub external_sources: Vec<usize>,
    pub resistors: Vec<usize>,
    /// Capacitors and inductors
    pub reactive: Vec<usize>,
    pub opamps: Vec<usize>,
    pub current_sources: Vec<usize>,
    pub diodes: Vec<usize>,
    /// Voltage probes; the first one is the output tap
    pub probes: Vec<usize>,
}

impl Roles {
    fn classify(components: &[Component]) -> Self {
        let mut roles = Self::default();
        for (idx, component) in components.iter().enumerate() {
            let list = match component {
                Component::VoltageSource(v) => {
                    if v.external {
                        roles.external_sources.push(idx);
                    }
                    &mut roles.voltage_sources
                }
                Component::Resistor(_) => &mut roles.resistors,
                Component::Capacitor(_) | Component::Inductor(_) => &mut roles.reactive,
                Component::IdealOpAmp(_) => &mut roles.opamps,
                Component::CurrentSource(_) => &mut roles.current_sources,
                Component::Diode(_) => &mut roles.diodes,
                Component::VoltageProbe(_) => &mut roles.probes,
            };
            list.push(idx);
        }
        roles
    }
}

/// A complete circuit ready for simulation.
#[derive(Debug, Clone)]
pub struct Circuit {
    /// All components in file order
    pub components: Vec<Component>,

    /// Index lists by component kind
    pub roles: Roles,

    /// Number of distinct nodes (including ground)
    pub num_nodes: usize,

    /// Number of auxiliary unknowns (voltage sources, reactive components, op-amps)
    pub num_aux: usize,

    /// Source line of each component, for diagnostics
    pub lines: Vec<usize>,
}

impl Circuit {
    /// Build a circuit from a parsed netlist.
    ///
    /// Components keep their file order; auxiliary indices are handed out in
    /// that same order. The result is validated before it is returned.
    pub fn from_ast(ast: &NetlistAst) -> Result<Self> {
        let mut aux_counter = 0usize;
        let components: Vec<Component> = ast
            .components
            .iter()
            .map(|def| Component::from_def(def, &mut aux_counter))
            .collect();
        let lines = ast.components.iter().map(|def| def.line).collect();

        let num_nodes = count_nodes(&components);
        let roles = Roles::classify(&components);
        let num_aux = roles.voltage_sources.len() + roles.reactive.len() + roles.opamps.len();
        debug_assert_eq!(num_aux, aux_counter);

        let circuit = Circuit {
            components,
            roles,
            num_nodes,
            num_aux,
            lines,
        };
        super::validate_circuit(&circuit)?;
        Ok(circuit)
    }

    /// Get the total size of the MNA system (ground row included).
    pub fn matrix_size(&self) -> usize {
        self.num_nodes + self.num_aux
    }

    /// Check if any component needs Newton-Raphson iteration.
    pub fn is_nonlinear(&self) -> bool {
        !self.roles.diodes.is_empty()
    }

    /// Get a component by ID.
    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(id.0)
    }

    /// Source line a component was declared on.
    pub fn line_of(&self, id: ComponentId) -> usize {
        self.lines.get(id.0).copied().unwrap_or(0)
    }

    /// Component acting as the audio output tap.
    pub fn output_probe(&self) -> Option<ComponentId> {
        self.roles.probes.first().copied().map(ComponentId)
    }
}

/// Number of distinct start/end nodes.
fn count_nodes(components: &[Component]) -> usize {
    components
        .iter()
        .flat_map(|c| c.nodes())
        .collect::<BTreeSet<_>>()
        .len()
}

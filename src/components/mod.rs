//! Component models for circuit simulation.
//!
//! This module provides models for all supported circuit components:
//! - Linear: Resistor, Capacitor, Inductor
//! - Sources: Voltage Source (fixed or audio-driven), Current Source
//! - Active: Ideal Op-Amp
//! - Nonlinear: Diode
//! - Measurement: Voltage Probe
//!
//! Each component knows how to stamp itself into the MNA matrix. Conductance
//! stamps accumulate; constraint rows owned by an auxiliary unknown are
//! assigned, so stamping those twice is harmless.

mod diode;
mod linear;
mod opamp;
mod probe;
mod sources;

pub use diode::{Diode, DiodeParams};
pub use linear::{Capacitor, Companion, Inductor, Resistor};
pub use opamp::IdealOpAmp;
pub use probe::VoltageProbe;
pub use sources::{CurrentSource, VoltageSource};

use crate::circuit::{AuxIndex, NodeId};
use crate::dsl::{ComponentDef, ComponentKind};
use crate::solver::MnaMatrix;

/// A circuit component.
#[derive(Debug, Clone)]
pub enum Component {
    Resistor(Resistor),
    Capacitor(Capacitor),
    Inductor(Inductor),
    VoltageSource(VoltageSource),
    CurrentSource(CurrentSource),
    IdealOpAmp(IdealOpAmp),
    Diode(Diode),
    VoltageProbe(VoltageProbe),
}

impl Component {
    /// Create a component from a parsed netlist line.
    ///
    /// Kinds that own an auxiliary unknown take the next value of
    /// `aux_counter` and advance it.
    pub fn from_def(def: &ComponentDef, aux_counter: &mut usize) -> Self {
        let nodes = [NodeId(def.start), NodeId(def.end)];
        let mut next_aux = || {
            let aux = AuxIndex(*aux_counter);
            *aux_counter += 1;
            aux
        };

        match def.kind {
            ComponentKind::Resistor => Component::Resistor(Resistor::new(nodes, def.value)),
            ComponentKind::Capacitor => {
                Component::Capacitor(Capacitor::new(nodes, def.value, next_aux()))
            }
            ComponentKind::Inductor => {
                Component::Inductor(Inductor::new(nodes, def.value, next_aux()))
            }
            ComponentKind::ExternalVoltageSource => {
                Component::VoltageSource(VoltageSource::new(nodes, def.value, next_aux(), true))
            }
            ComponentKind::VoltageSource => {
                Component::VoltageSource(VoltageSource::new(nodes, def.value, next_aux(), false))
            }
            ComponentKind::CurrentSource => {
                Component::CurrentSource(CurrentSource::new(nodes, def.value))
            }
            ComponentKind::IdealOpAmp => {
                // The parser guarantees an integral, non-negative output node.
                let output = NodeId(def.value as usize);
                Component::IdealOpAmp(IdealOpAmp::new(nodes, output, next_aux()))
            }
            ComponentKind::Diode => Component::Diode(Diode::new(nodes, DiodeParams::default())),
            ComponentKind::VoltageProbe => Component::VoltageProbe(VoltageProbe::new(nodes)),
        }
    }

    /// Add (or assign) this component's contribution to the system.
    #[inline]
    pub fn stamp(&self, matrix: &mut MnaMatrix) {
        match self {
            Component::Resistor(r) => r.stamp(matrix),
            Component::Capacitor(c) => c.stamp(matrix),
            Component::Inductor(l) => l.stamp(matrix),
            Component::VoltageSource(v) => v.stamp(matrix),
            Component::CurrentSource(i) => i.stamp(matrix),
            Component::IdealOpAmp(op) => op.stamp(matrix),
            Component::Diode(d) => d.stamp(matrix),
            Component::VoltageProbe(_) => {}
        }
    }

    /// The two terminals every component has.
    pub fn nodes(&self) -> [NodeId; 2] {
        match self {
            Component::Resistor(r) => r.nodes,
            Component::Capacitor(c) => c.nodes,
            Component::Inductor(l) => l.nodes,
            Component::VoltageSource(v) => v.nodes,
            Component::CurrentSource(i) => i.nodes,
            Component::IdealOpAmp(op) => op.nodes,
            Component::Diode(d) => d.nodes,
            Component::VoltageProbe(p) => p.nodes,
        }
    }

    /// Auxiliary unknown owned by this component, if any.
    pub fn aux(&self) -> Option<AuxIndex> {
        match self {
            Component::Capacitor(c) => Some(c.companion.aux),
            Component::Inductor(l) => Some(l.companion.aux),
            Component::VoltageSource(v) => Some(v.aux),
            Component::IdealOpAmp(op) => Some(op.aux),
            Component::Resistor(_)
            | Component::CurrentSource(_)
            | Component::Diode(_)
            | Component::VoltageProbe(_) => None,
        }
    }

    /// Capacitor or inductor.
    pub fn is_reactive(&self) -> bool {
        matches!(self, Component::Capacitor(_) | Component::Inductor(_))
    }

    /// Voltage source whose value follows the audio input.
    pub fn is_external_source(&self) -> bool {
        matches!(self, Component::VoltageSource(v) if v.external)
    }

    /// Check if this component is nonlinear (requires Newton-Raphson iteration).
    pub fn is_nonlinear(&self) -> bool {
        matches!(self, Component::Diode(_))
    }

    /// Recompute the companion resistance of a reactive component.
    pub fn set_time_step(&mut self, ts: f64) {
        match self {
            Component::Capacitor(c) => c.set_time_step(ts),
            Component::Inductor(l) => l.set_time_step(ts),
            _ => {}
        }
    }

    /// Refresh the companion voltage of a reactive component.
    pub fn update_companion(&mut self, matrix: &MnaMatrix) {
        match self {
            Component::Capacitor(c) => c.update_voltage(matrix),
            Component::Inductor(l) => l.update_voltage(matrix),
            _ => {}
        }
    }
}

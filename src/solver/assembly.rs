//! Matrix assembly: applying component stamps to the MNA system.
//!
//! Conductance stamps accumulate, so any change to one of them (a diode
//! re-linearization) needs a zeroed system and a full pass. Source and
//! reactive rows are assignments and can be refreshed in place.

use crate::circuit::Circuit;
use crate::components::Component;

use super::mna::MnaMatrix;

/// Stamp every component once into the system.
pub fn stamp_all(circuit: &Circuit, matrix: &mut MnaMatrix) {
    for component in &circuit.components {
        component.stamp(matrix);
    }
}

/// Zero the matrix and RHS, then stamp every component.
pub fn restamp(circuit: &Circuit, matrix: &mut MnaMatrix) {
    matrix.clear();
    stamp_all(circuit, matrix);
}

/// Set every audio-driven voltage source to `voltage`.
pub fn drive_sources(circuit: &mut Circuit, voltage: f64) {
    for &idx in &circuit.roles.external_sources {
        if let Component::VoltageSource(v) = &mut circuit.components[idx] {
            v.set_voltage(voltage);
        }
    }
}

/// Refresh reactive companion voltages from the last solution.
pub fn update_companions(circuit: &mut Circuit, matrix: &MnaMatrix) {
    for &idx in &circuit.roles.reactive {
        circuit.components[idx].update_companion(matrix);
    }
}

/// Re-assign the rows that change from sample to sample on a linear circuit.
///
/// Only the external source and reactive rows are written. Their matrix
/// coefficients are unchanged, so the cached factorization stays valid.
pub fn stamp_dynamic_rows(circuit: &Circuit, matrix: &mut MnaMatrix) {
    let roles = &circuit.roles;
    for &idx in roles.external_sources.iter().chain(&roles.reactive) {
        circuit.components[idx].stamp(matrix);
    }
}

/// Recompute companion resistances for time step `ts`.
pub fn set_time_step(circuit: &mut Circuit, ts: f64) {
    for &idx in &circuit.roles.reactive {
        circuit.components[idx].set_time_step(ts);
    }
}

/// Re-linearize every diode around the voltage in the current solution.
pub fn linearize_diodes(circuit: &mut Circuit, matrix: &MnaMatrix) {
    for &idx in &circuit.roles.diodes {
        if let Component::Diode(d) = &mut circuit.components[idx] {
            d.update(matrix);
        }
    }
}

/// Update every probe reading and return the output tap (first probe).
pub fn read_probes(circuit: &mut Circuit, matrix: &MnaMatrix) -> f64 {
    let mut output = None;
    for &idx in &circuit.roles.probes {
        if let Component::VoltageProbe(p) = &mut circuit.components[idx] {
            let v = p.read(matrix);
            if output.is_none() {
                output = Some(v);
            }
        }
    }
    output.unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::parse;
    use approx::assert_relative_eq;

    fn circuit(src: &str) -> Circuit {
        Circuit::from_ast(&parse(src).unwrap()).unwrap()
    }

    fn system(circuit: &Circuit) -> MnaMatrix {
        MnaMatrix::new(circuit.num_nodes, circuit.num_aux)
    }

    #[test]
    fn test_restamp_is_idempotent() {
        let c = circuit("Vi 1 0 0\nR 1 2 1k\nR 2 0 1k\nI 0 2 1m\nVo 2 0 0");
        let mut m = system(&c);
        restamp(&c, &mut m);
        let (a, b) = (m.a.clone(), m.b.clone());

        // A second pass without zeroing doubles the additive entries
        stamp_all(&c, &mut m);
        assert_relative_eq!(m.get(2, 2), 2.0 * a[2 * m.size + 2]);

        restamp(&c, &mut m);
        assert_eq!(m.a, a);
        assert_eq!(m.b, b);
    }

    #[test]
    fn test_dynamic_rows_leave_matrix_unchanged() {
        let mut c = circuit("Vi 1 0 0\nR 1 2 1k\nC 2 0 1u\nV 3 0 9\nR 3 2 10k\nVo 2 0 0");
        set_time_step(&mut c, 1.0 / 48000.0);
        let mut m = system(&c);
        restamp(&c, &mut m);
        let a = m.a.clone();

        drive_sources(&mut c, 0.5);
        m.x[2] = 0.1;
        update_companions(&mut c, &m);
        stamp_dynamic_rows(&c, &mut m);

        assert_eq!(m.a, a);
        // Vi owns aux 0, C aux 1, V aux 2
        assert_eq!(m.b[m.num_nodes], 0.5);
        assert_relative_eq!(m.b[m.num_nodes + 1], 0.1);
        assert_eq!(m.b[m.num_nodes + 2], 9.0);
    }

    #[test]
    fn test_only_external_sources_are_driven() {
        let mut c = circuit("Vi 1 0 0\nV 2 0 9\nR 1 2 1k\nVo 2 0 0");
        drive_sources(&mut c, -0.25);
        let voltages: Vec<f64> = c
            .roles
            .voltage_sources
            .iter()
            .filter_map(|&idx| match &c.components[idx] {
                Component::VoltageSource(v) => Some(v.voltage),
                _ => None,
            })
            .collect();
        assert_eq!(voltages, vec![-0.25, 9.0]);
    }

    #[test]
    fn test_first_probe_is_output() {
        let mut c = circuit("Vi 1 0 0\nR 1 2 1k\nR 2 0 1k\nVo 2 0 0\nVo 1 0 0");
        let mut m = system(&c);
        m.x[1] = 1.0;
        m.x[2] = 0.5;
        assert_eq!(read_probes(&mut c, &m), 0.5);
        match &c.components[4] {
            Component::VoltageProbe(p) => assert_eq!(p.voltage, 1.0),
            other => panic!("expected probe, got {:?}", other),
        }
    }
}

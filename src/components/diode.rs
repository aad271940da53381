//! Diode model.
//!
//! Uses the Shockley diode equation:
//!   I = Is * (exp(V / (n * Vt)) - 1)
//!
//! For Newton-Raphson iteration, we linearize around the current operating point:
//!   I ≈ Geq * V + Ieq
//!
//! where Geq = dI/dV = Is/(n*Vt) * exp(V0/(n*Vt)) and Ieq = I(V0) - Geq * V0.

use crate::circuit::NodeId;
use crate::solver::MnaMatrix;
use crate::THERMAL_VOLTAGE;

/// Parameters for a diode model.
#[derive(Debug, Clone)]
pub struct DiodeParams {
    /// Saturation current (Is)
    pub is: f64,
    /// Ideality factor (n)
    pub n: f64,
    /// Thermal voltage (Vt)
    pub vt: f64,
}

impl Default for DiodeParams {
    /// The reference diode every `D` line uses.
    fn default() -> Self {
        Self {
            is: 2.6e-6,
            n: 1.6,
            vt: THERMAL_VOLTAGE,
        }
    }
}

impl DiodeParams {
    /// Thermal voltage times ideality factor.
    pub fn n_vt(&self) -> f64 {
        self.n * self.vt
    }
}

/// A diode component.
#[derive(Debug, Clone)]
pub struct Diode {
    pub nodes: [NodeId; 2], // [anode, cathode]
    pub params: DiodeParams,
    /// Voltage the model is linearized around
    pub voltage: f64,
    /// Diode current at `voltage`
    pub current: f64,
    /// Equivalent (small-signal) conductance
    pub geq: f64,
    /// Equivalent Norton current
    pub ieq: f64,
}

impl Diode {
    /// Create a new diode, linearized at zero bias.
    pub fn new(nodes: [NodeId; 2], params: DiodeParams) -> Self {
        let mut diode = Self {
            nodes,
            params,
            voltage: 0.0,
            current: 0.0,
            geq: 0.0,
            ieq: 0.0,
        };
        diode.linearize(0.0);
        diode
    }

    /// Calculate the diode current at a given voltage.
    ///
    /// `exp_m1` keeps precision for |V| much smaller than n*Vt.
    pub fn current_at(&self, v: f64) -> f64 {
        self.params.is * (v / self.params.n_vt()).exp_m1()
    }

    /// Calculate the conductance (dI/dV) at a given voltage.
    pub fn conductance_at(&self, v: f64) -> f64 {
        let n_vt = self.params.n_vt();
        self.params.is / n_vt * (v / n_vt).exp()
    }

    /// Recompute the Norton equivalent around `v`.
    pub fn linearize(&mut self, v: f64) {
        self.voltage = v;
        self.current = self.current_at(v);
        self.geq = self.conductance_at(v);
        self.ieq = self.current - self.geq * v;
    }

    /// Re-linearize around the voltage in the last solution.
    pub fn update(&mut self, matrix: &MnaMatrix) {
        self.linearize(matrix.voltage_across(self.nodes[0], self.nodes[1]));
    }

    pub fn stamp(&self, matrix: &mut MnaMatrix) {
        matrix.stamp_conductance(self.nodes[0], self.nodes[1], self.geq);
        matrix.stamp_current_source(self.nodes[0], self.nodes[1], self.ieq);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn diode() -> Diode {
        Diode::new([NodeId(1), NodeId(0)], DiodeParams::default())
    }

    #[test]
    fn test_diode_forward_bias() {
        let d = diode();

        // At 0V, current should be exactly 0
        assert_eq!(d.current_at(0.0), 0.0);

        // At forward bias, current should increase exponentially
        let i_small = d.current_at(0.2);
        let i_large = d.current_at(0.4);
        assert!(i_large > i_small * 100.0);
    }

    #[test]
    fn test_diode_reverse_bias() {
        let d = diode();

        // In reverse bias, current should approach -Is
        let i_rev = d.current_at(-1.0);
        assert!(i_rev < 0.0);
        assert_relative_eq!(i_rev, -d.params.is, max_relative = 1e-6);
    }

    #[test]
    fn test_small_signal_precision() {
        let d = diode();
        let v = 1e-12;
        // I ≈ Is * V / (n Vt) for tiny V
        assert_relative_eq!(
            d.current_at(v),
            d.params.is * v / d.params.n_vt(),
            max_relative = 1e-9
        );
    }

    #[test]
    fn test_linearization_at_zero_bias() {
        let d = diode();
        assert_relative_eq!(d.geq, 2.6e-6 / (1.6 * THERMAL_VOLTAGE));
        assert_eq!(d.ieq, 0.0);
    }

    #[test]
    fn test_linearization_is_tangent() {
        let mut d = diode();
        d.linearize(0.3);
        // The Norton equivalent reproduces the operating point
        assert_relative_eq!(d.geq * 0.3 + d.ieq, d.current_at(0.3), max_relative = 1e-12);

        let mut m = MnaMatrix::new(2, 0);
        d.stamp(&mut m);
        assert_relative_eq!(m.get(1, 1), d.geq);
        assert_relative_eq!(m.b[1], -d.ieq);
    }

    #[test]
    fn test_update_reads_solution() {
        let mut d = Diode::new([NodeId(2), NodeId(1)], DiodeParams::default());
        let mut m = MnaMatrix::new(3, 0);
        m.x[2] = 0.5;
        m.x[1] = 0.2;
        d.update(&m);
        assert_relative_eq!(d.voltage, 0.3);
    }
}

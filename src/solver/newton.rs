//! Newton-Raphson iteration for nonlinear components.

use crate::circuit::Circuit;
use crate::config::SimulatorConfig;

use super::assembly;
use super::mna::MnaMatrix;

/// Result of one sample's nonlinear solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewtonOutcome {
    /// Iterations executed (at most the configured cap)
    pub iterations: usize,
    /// Whether the update norm dropped below the tolerance
    pub converged: bool,
}

/// Newton-Raphson solver for nonlinear circuits.
#[derive(Debug, Clone)]
pub struct NewtonRaphson {
    /// Maximum iterations
    pub max_iterations: usize,
    /// Convergence tolerance on the norm of the solution update
    pub tolerance: f64,
    /// Previous solution for convergence check
    x_prev: Vec<f64>,
}

impl NewtonRaphson {
    /// Create a solver for a system of dimension `size`.
    pub fn new(size: usize, config: &SimulatorConfig) -> Self {
        Self {
            max_iterations: config.max_iterations,
            tolerance: config.tolerance,
            x_prev: vec![0.0; size],
        }
    }

    /// Iterate the nonlinear system towards a solution, starting from `matrix.x`.
    ///
    /// Each iteration re-linearizes every diode around the current solution,
    /// zeroes and restamps the system, refactors and solves.
    /// External sources and reactive companions must already be updated.
    /// Running out of iterations is not an error; the last iterate stays in
    /// `matrix.x`.
    pub fn solve(&mut self, circuit: &mut Circuit, matrix: &mut MnaMatrix) -> NewtonOutcome {
        for iter in 0..self.max_iterations {
            assembly::linearize_diodes(circuit, matrix);
            assembly::restamp(circuit, matrix);
            matrix.factor();

            self.x_prev.copy_from_slice(&matrix.x);
            matrix.solve();

            if matrix.tail_distance(&self.x_prev) < self.tolerance {
                return NewtonOutcome {
                    iterations: iter + 1,
                    converged: true,
                };
            }
        }

        NewtonOutcome {
            iterations: self.max_iterations,
            converged: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::parse;
    use crate::solver::MAX_ITERATIONS;
    use approx::assert_relative_eq;

    const CLIPPER: &str = "Vi 1 0 0\nR 1 2 1k\nD 2 0 0\nVo 2 0 0";

    fn setup(src: &str) -> (Circuit, MnaMatrix) {
        let circuit = Circuit::from_ast(&parse(src).unwrap()).unwrap();
        let matrix = MnaMatrix::new(circuit.num_nodes, circuit.num_aux);
        (circuit, matrix)
    }

    #[test]
    fn test_iterations_never_exceed_cap() {
        let (mut circuit, mut matrix) = setup(CLIPPER);
        let mut newton = NewtonRaphson::new(matrix.size, &SimulatorConfig::default());

        // Large steps from a cold start are the worst case for an undamped diode.
        for input in [5.0, -5.0, 3.0, 0.0, 10.0] {
            assembly::drive_sources(&mut circuit, input);
            let outcome = newton.solve(&mut circuit, &mut matrix);
            assert!(outcome.iterations >= 1);
            assert!(outcome.iterations <= MAX_ITERATIONS);
        }
    }

    #[test]
    fn test_steady_dc_terminates_early() {
        let (mut circuit, mut matrix) = setup(CLIPPER);
        let mut newton = NewtonRaphson::new(matrix.size, &SimulatorConfig::default());

        assembly::drive_sources(&mut circuit, 1.0);
        let mut outcome = newton.solve(&mut circuit, &mut matrix);
        for _ in 0..8 {
            outcome = newton.solve(&mut circuit, &mut matrix);
        }

        assert!(outcome.converged);
        assert!(outcome.iterations <= 2, "took {} iterations", outcome.iterations);

        // KCL at the diode node: resistor current equals diode current
        let v = matrix.x[2];
        assert!(v > 0.1 && v < 0.4, "diode voltage {}", v);
        let params = crate::components::DiodeParams::default();
        let i_diode = params.is * (v / params.n_vt()).exp_m1();
        assert_relative_eq!((1.0 - v) / 1000.0, i_diode, max_relative = 1e-4);
    }

    #[test]
    fn test_non_convergence_is_reported() {
        let (mut circuit, mut matrix) = setup(CLIPPER);
        let config = SimulatorConfig::default().with_max_iterations(2);
        let mut newton = NewtonRaphson::new(matrix.size, &config);

        assembly::drive_sources(&mut circuit, 5.0);
        let outcome = newton.solve(&mut circuit, &mut matrix);
        assert_eq!(
            outcome,
            NewtonOutcome {
                iterations: 2,
                converged: false
            }
        );
        assert!(matrix.x.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_each_iteration_starts_from_a_clean_system() {
        let (mut circuit, mut matrix) = setup(CLIPPER);
        let mut newton = NewtonRaphson::new(matrix.size, &SimulatorConfig::default());
        assembly::drive_sources(&mut circuit, 2.0);
        newton.solve(&mut circuit, &mut matrix);

        // Stamps from earlier iterations must not accumulate
        let mut fresh = MnaMatrix::new(circuit.num_nodes, circuit.num_aux);
        assembly::restamp(&circuit, &mut fresh);
        assert_eq!(matrix.a, fresh.a);
        assert_eq!(matrix.b, fresh.b);
    }
}

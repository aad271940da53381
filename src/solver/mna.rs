//! MNA matrix storage, stamping primitives and the dense LU solver.

use crate::circuit::{AuxIndex, NodeId};

/// MNA matrix system A x = b.
///
/// Row/column 0 belongs to the ground node. Stamps may write into it, but it
/// is left out of the factorization and `x[0]` stays at zero.
#[derive(Debug, Clone)]
pub struct MnaMatrix {
    /// System matrix A (row-major, `size × size`)
    pub a: Vec<f64>,
    /// Right-hand side vector b
    pub b: Vec<f64>,
    /// Solution vector x
    pub x: Vec<f64>,
    /// Matrix dimension (nodes + auxiliary unknowns)
    pub size: usize,
    /// Number of nodes including ground; first auxiliary row
    pub num_nodes: usize,
    /// LU decomposition of the ground-reduced block (row-major, `(size-1)²`)
    pub lu: Vec<f64>,
    /// Row permutation of the LU decomposition
    pub pivots: Vec<usize>,
    /// Scratch vector for the triangular solves
    work: Vec<f64>,
}

impl MnaMatrix {
    /// Create a zeroed system for `num_nodes` nodes and `num_aux` auxiliary unknowns.
    pub fn new(num_nodes: usize, num_aux: usize) -> Self {
        let size = num_nodes + num_aux;
        let reduced = size.saturating_sub(1);
        Self {
            a: vec![0.0; size * size],
            b: vec![0.0; size],
            x: vec![0.0; size],
            size,
            num_nodes,
            lu: vec![0.0; reduced * reduced],
            pivots: (0..reduced).collect(),
            work: vec![0.0; reduced],
        }
    }

    /// Dimension of the factorized block.
    pub fn reduced_size(&self) -> usize {
        self.size.saturating_sub(1)
    }

    /// Zero the matrix and RHS. The solution is kept as the next initial guess.
    pub fn clear(&mut self) {
        self.a.fill(0.0);
        self.b.fill(0.0);
    }

    /// Zero the matrix, RHS and solution.
    pub fn clear_all(&mut self) {
        self.clear();
        self.x.fill(0.0);
    }

    /// Get matrix element at (row, col).
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.a[row * self.size + col]
    }

    /// Set matrix element at (row, col).
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.a[row * self.size + col] = value;
    }

    /// Add to matrix element at (row, col).
    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        self.a[row * self.size + col] += value;
    }

    /// Set an RHS element.
    pub fn set_rhs(&mut self, row: usize, value: f64) {
        self.b[row] = value;
    }

    /// Add to an RHS element.
    pub fn add_rhs(&mut self, row: usize, value: f64) {
        self.b[row] += value;
    }

    /// Row/column of an auxiliary unknown.
    pub fn aux_row(&self, aux: AuxIndex) -> usize {
        self.num_nodes + aux.0
    }

    /// Stamp a conductance between two nodes.
    /// For a conductance G between nodes n1 and n2:
    ///   A[n1,n1] += G
    ///   A[n2,n2] += G
    ///   A[n1,n2] -= G
    ///   A[n2,n1] -= G
    pub fn stamp_conductance(&mut self, n1: NodeId, n2: NodeId, g: f64) {
        let (i, j) = (n1.index(), n2.index());
        self.add(i, i, g);
        self.add(j, j, g);
        self.add(i, j, -g);
        self.add(j, i, -g);
    }

    /// Couple a branch-current unknown at `row` to its two nodes.
    ///
    /// The KCL columns carry the branch current out of `n_pos` and into
    /// `n_neg`; the constraint row reads `V[n+] - V[n-]`. Entries are assigned.
    pub fn stamp_branch(&mut self, n_pos: NodeId, n_neg: NodeId, row: usize) {
        let (i, j) = (n_pos.index(), n_neg.index());
        self.set(row, i, 1.0);
        self.set(row, j, -1.0);
        self.set(i, row, 1.0);
        self.set(j, row, -1.0);
    }

    /// Stamp a current source between two nodes.
    /// Current flows from n+ to n- through the source.
    pub fn stamp_current_source(&mut self, n_pos: NodeId, n_neg: NodeId, current: f64) {
        self.add_rhs(n_pos.index(), -current);
        self.add_rhs(n_neg.index(), current);
    }

    /// Perform LU decomposition with partial pivoting on the ground-reduced block.
    ///
    /// Returns the smallest pivot magnitude. A zero pivot is not treated as an
    /// error: the solve then produces non-finite values.
    pub fn factor(&mut self) -> f64 {
        let n = self.reduced_size();
        let size = self.size;

        for i in 0..n {
            let src = (i + 1) * size + 1;
            self.lu[i * n..(i + 1) * n].copy_from_slice(&self.a[src..src + n]);
            self.pivots[i] = i;
        }

        let mut min_pivot = f64::INFINITY;

        for k in 0..n {
            // Find pivot
            let mut max_val = self.lu[k * n + k].abs();
            let mut max_row = k;

            for i in (k + 1)..n {
                let val = self.lu[i * n + k].abs();
                if val > max_val {
                    max_val = val;
                    max_row = i;
                }
            }

            min_pivot = min_pivot.min(max_val);

            // Swap rows if needed
            if max_row != k {
                self.pivots.swap(k, max_row);
                for j in 0..n {
                    self.lu.swap(k * n + j, max_row * n + j);
                }
            }

            // Eliminate
            let pivot = self.lu[k * n + k];
            for i in (k + 1)..n {
                let factor = self.lu[i * n + k] / pivot;
                self.lu[i * n + k] = factor;
                for j in (k + 1)..n {
                    self.lu[i * n + j] -= factor * self.lu[k * n + j];
                }
            }
        }

        min_pivot
    }

    /// Solve for `x[1..]` using the pre-computed LU decomposition and the current `b`.
    pub fn solve(&mut self) {
        let n = self.reduced_size();

        // Apply pivot permutation to b[1..]
        for i in 0..n {
            self.work[i] = self.b[self.pivots[i] + 1];
        }

        // Forward substitution (L * y = Pb)
        for i in 0..n {
            for j in 0..i {
                self.work[i] -= self.lu[i * n + j] * self.work[j];
            }
        }

        // Back substitution (U * x = y)
        for i in (0..n).rev() {
            for j in (i + 1)..n {
                self.work[i] -= self.lu[i * n + j] * self.work[j];
            }
            self.work[i] /= self.lu[i * n + i];
        }

        self.x[1..].copy_from_slice(&self.work);
    }

    /// Get the voltage at a node.
    pub fn voltage(&self, node: NodeId) -> f64 {
        self.x[node.index()]
    }

    /// Voltage difference `V[n1] - V[n2]`.
    pub fn voltage_across(&self, n1: NodeId, n2: NodeId) -> f64 {
        self.x[n1.index()] - self.x[n2.index()]
    }

    /// Value of an auxiliary unknown (a branch current).
    pub fn aux_value(&self, aux: AuxIndex) -> f64 {
        self.x[self.aux_row(aux)]
    }

    /// Euclidean norm of `x[1..] - other[1..]`.
    pub fn tail_distance(&self, other: &[f64]) -> f64 {
        self.x[1..]
            .iter()
            .zip(&other[1..])
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f64>()
            .sqrt()
    }
}

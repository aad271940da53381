//! Per-channel solver state.

use std::mem;

use super::mna::MnaMatrix;

/// The `(x, b)` pair of one audio channel.
///
/// Every channel runs its own instance of the circuit. Between blocks its
/// vectors live here; while the channel is processed they are exchanged
/// with the matrix's own vectors, so switching channels never allocates.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelState {
    x: Vec<f64>,
    b: Vec<f64>,
}

impl ChannelState {
    /// Copy the matrix's current solution and RHS.
    pub fn seeded(matrix: &MnaMatrix) -> Self {
        Self {
            x: matrix.x.clone(),
            b: matrix.b.clone(),
        }
    }

    /// Swap this state with the matrix's. Calling it twice restores both.
    #[inline]
    pub fn exchange(&mut self, matrix: &mut MnaMatrix) {
        mem::swap(&mut self.x, &mut matrix.x);
        mem::swap(&mut self.b, &mut matrix.b);
    }

    /// Saved solution vector.
    pub fn x(&self) -> &[f64] {
        &self.x
    }

    /// Saved right-hand side.
    pub fn b(&self) -> &[f64] {
        &self.b
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exchange_round_trip() {
        let mut m = MnaMatrix::new(2, 1);
        m.x.copy_from_slice(&[0.0, 1.0, 2.0]);
        m.b.copy_from_slice(&[0.0, 3.0, 4.0]);
        let mut state = ChannelState::seeded(&m);

        m.x.fill(9.0);
        state.exchange(&mut m);
        assert_eq!(m.x, vec![0.0, 1.0, 2.0]);
        assert_eq!(state.x(), &[9.0, 9.0, 9.0]);

        state.exchange(&mut m);
        assert_eq!(m.x, vec![9.0, 9.0, 9.0]);
        assert_eq!(state.b(), &[0.0, 3.0, 4.0]);
    }
}

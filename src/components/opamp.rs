//! Ideal operational amplifier.
//!
//! Infinite open-loop gain and zero input current. The auxiliary row forces
//! the two inputs to the same potential, and the auxiliary unknown is the
//! current the output drives into the output node.

use crate::circuit::{AuxIndex, NodeId};
use crate::solver::MnaMatrix;

/// An ideal op-amp.
#[derive(Debug, Clone)]
pub struct IdealOpAmp {
    pub nodes: [NodeId; 2], // [non-inverting (+), inverting (-)]
    pub output: NodeId,
    pub aux: AuxIndex,
}

impl IdealOpAmp {
    /// Create a new ideal op-amp.
    pub fn new(nodes: [NodeId; 2], output: NodeId, aux: AuxIndex) -> Self {
        Self { nodes, output, aux }
    }

    pub fn stamp(&self, matrix: &mut MnaMatrix) {
        let row = matrix.aux_row(self.aux);
        matrix.set(self.output.index(), row, 1.0);
        matrix.set(row, self.nodes[0].index(), 1.0);
        matrix.set(row, self.nodes[1].index(), -1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opamp_stamp() {
        let mut m = MnaMatrix::new(4, 1);
        let op = IdealOpAmp::new([NodeId(1), NodeId(2)], NodeId(3), AuxIndex(0));
        op.stamp(&mut m);

        assert_eq!(m.get(3, 4), 1.0);
        assert_eq!(m.get(4, 1), 1.0);
        assert_eq!(m.get(4, 2), -1.0);
        // Inputs draw no current
        assert_eq!(m.get(1, 4), 0.0);
        assert_eq!(m.get(2, 4), 0.0);
        assert_eq!(m.b[4], 0.0);
    }
}

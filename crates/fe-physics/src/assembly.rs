//! Global system assembly with Dirichlet elimination.
//!
//! Per-edge coefficients are computed in parallel; merging into the sparse
//! matrix is serial because `SparseMatrix` rows are not synchronized.

use crate::mesh::ElementEdge;
use fe_sparse::SparseMatrix;
use rayon::prelude::*;

/// Symmetric coupling `g` between two nodes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeTerm {
    pub from: usize,
    pub to: usize,
    pub conductance: f64,
}

/// Evaluate `conductance` for every edge on the rayon pool.
pub fn edge_terms<F>(edges: &[ElementEdge], conductance: F) -> Vec<EdgeTerm>
where
    F: Fn(&ElementEdge) -> f64 + Sync + Send,
{
    edges
        .par_iter()
        .map(|edge| EdgeTerm {
            from: edge.from,
            to: edge.to,
            conductance: conductance(edge),
        })
        .collect()
}

/// Builder for `A x = b` over `n` nodal unknowns.
///
/// Rows of fixed nodes become identity rows; couplings into fixed columns
/// move to the right-hand side, so a symmetric operator stays symmetric.
pub struct Assembler {
    fixed: Vec<Option<f64>>,
    matrix: SparseMatrix,
    rhs: Vec<f64>,
}

impl Assembler {
    pub fn new(n: usize) -> Self {
        Self {
            fixed: vec![None; n],
            matrix: SparseMatrix::with_rows(n),
            rhs: vec![0.0; n],
        }
    }

    /// Prescribe `value` at `node`. Must precede the additions it affects.
    pub fn fix(&mut self, node: usize, value: f64) {
        self.fixed[node] = Some(value);
    }

    pub fn is_fixed(&self, node: usize) -> bool {
        self.fixed[node].is_some()
    }

    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        if self.fixed[row].is_some() {
            return;
        }
        match self.fixed[col] {
            Some(fixed) => self.rhs[row] -= value * fixed,
            None => self.matrix.add_value(row, col, value),
        }
    }

    pub fn add_load(&mut self, row: usize, value: f64) {
        if self.fixed[row].is_none() {
            self.rhs[row] += value;
        }
    }

    pub fn add_conductances(&mut self, terms: &[EdgeTerm]) {
        for term in terms {
            let (i, j, g) = (term.from, term.to, term.conductance);
            self.add(i, i, g);
            self.add(i, j, -g);
            self.add(j, j, g);
            self.add(j, i, -g);
        }
    }

    /// Upwind transport with capacity rate `rate` from `upstream` into
    /// `downstream`.
    pub fn add_upwind(&mut self, upstream: usize, downstream: usize, rate: f64) {
        self.add(downstream, downstream, rate);
        self.add(downstream, upstream, -rate);
    }

    /// Finish the system. Free rows with nothing on the diagonal are
    /// decoupled and keep their `current` value.
    pub fn finish(mut self, current: &[f64]) -> (SparseMatrix, Vec<f64>) {
        for i in 0..self.fixed.len() {
            match self.fixed[i] {
                Some(value) => {
                    self.matrix.add_value(i, i, 1.0);
                    self.rhs[i] = value;
                }
                None if self.matrix.find_value(i, i) == 0.0 => {
                    self.matrix.add_value(i, i, 1.0);
                    self.rhs[i] = current[i];
                }
                None => {}
            }
        }
        (self.matrix, self.rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_columns_move_to_rhs() {
        let mut asm = Assembler::new(3);
        asm.fix(0, 10.0);
        asm.add_conductances(&[
            EdgeTerm {
                from: 0,
                to: 1,
                conductance: 2.0,
            },
            EdgeTerm {
                from: 1,
                to: 2,
                conductance: 1.0,
            },
        ]);
        asm.add_load(2, 0.5);
        asm.add_load(0, 99.0);
        let (a, b) = asm.finish(&[0.0; 3]);

        assert_eq!(a.find_value(0, 0), 1.0);
        assert_eq!(a.find_value(0, 1), 0.0);
        assert_eq!(a.find_value(1, 0), 0.0);
        assert_eq!(a.find_value(1, 1), 3.0);
        assert_eq!(a.find_value(1, 2), -1.0);
        assert_eq!(a.find_value(2, 1), -1.0);
        assert_eq!(b, vec![10.0, 20.0, 0.5]);
    }

    #[test]
    fn isolated_node_keeps_value() {
        let asm = Assembler::new(2);
        let (a, b) = asm.finish(&[4.0, 7.0]);
        assert_eq!(a.diagonal(), vec![1.0, 1.0]);
        assert_eq!(b, vec![4.0, 7.0]);
    }

    #[test]
    fn upwind_only_touches_downstream_row() {
        let mut asm = Assembler::new(2);
        asm.add_upwind(0, 1, 3.0);
        let (a, _) = asm.finish(&[0.0, 0.0]);
        assert_eq!(a.find_value(1, 1), 3.0);
        assert_eq!(a.find_value(1, 0), -3.0);
        // row 0 had nothing and became identity
        assert_eq!(a.find_value(0, 0), 1.0);
    }

    #[test]
    fn parallel_terms_follow_edge_order() {
        let edges: Vec<ElementEdge> = (0..100)
            .map(|i| ElementEdge {
                element: i,
                from: i,
                to: i + 1,
                length: 1.0 + i as f64,
            })
            .collect();
        let terms = edge_terms(&edges, |e| 1.0 / e.length);
        assert_eq!(terms.len(), 100);
        assert_eq!(terms[9].from, 9);
        assert_eq!(terms[9].conductance, 0.1);
    }

    proptest::proptest! {
        #[test]
        fn free_conductance_rows_sum_to_zero(
            conductances in proptest::collection::vec(1e-3f64..1e3, 1..20)
        ) {
            let n = conductances.len() + 1;
            let terms: Vec<EdgeTerm> = conductances
                .iter()
                .enumerate()
                .map(|(i, &g)| EdgeTerm { from: i, to: i + 1, conductance: g })
                .collect();
            let mut asm = Assembler::new(n);
            asm.add_conductances(&terms);
            let (a, _) = asm.finish(&vec![0.0; n]);

            for i in 0..n {
                let row_sum: f64 = (0..n).map(|j| a.find_value(i, j)).sum();
                proptest::prop_assert!(row_sum.abs() <= 1e-9 * a.find_value(i, i));
                for j in 0..n {
                    proptest::prop_assert_eq!(a.find_value(i, j), a.find_value(j, i));
                }
            }
        }
    }
}

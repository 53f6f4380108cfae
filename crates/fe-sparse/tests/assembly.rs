//! Integration tests for sparse assembly.

use fe_sparse::SparseMatrix;
use proptest::prelude::*;

fn assemble(entries: &[(usize, usize, i32)]) -> SparseMatrix {
    let mut a = SparseMatrix::new();
    for &(row, col, value) in entries {
        a.add_value(row, col, f64::from(value));
    }
    a
}

#[test]
fn two_by_two_trace_and_norm() {
    let a = assemble(&[(0, 0, 1), (0, 1, 2), (1, 0, 3), (1, 1, 4)]);

    assert_eq!(a.find_trace(), 5.0);
    assert_eq!(a.find_norm(), (3.0_f64 * 3.0 + 7.0 * 7.0).sqrt());
    assert_eq!(a.find_norm(), 58.0_f64.sqrt());
}

#[test]
fn element_scatter_order_does_not_change_values() {
    // Two 1D bar elements sharing node 1, scattered in both orders.
    let e1 = [(0, 0, 1), (0, 1, -1), (1, 0, -1), (1, 1, 1)];
    let e2 = [(1, 1, 1), (1, 2, -1), (2, 1, -1), (2, 2, 1)];

    let forward: Vec<_> = e1.iter().chain(e2.iter()).copied().collect();
    let backward: Vec<_> = e2.iter().rev().chain(e1.iter().rev()).copied().collect();

    let a = assemble(&forward);
    let b = assemble(&backward);

    for row in 0..3 {
        for col in 0..3 {
            assert_eq!(a.find_value(row, col), b.find_value(row, col));
        }
    }
    assert_eq!(a.find_value(1, 1), 2.0);
    assert_eq!(a, b);
}

#[test]
fn serde_round_trip_keeps_rows() {
    let a = assemble(&[(2, 1, 5), (0, 3, -1)]);
    let json = serde_json::to_string(&a).unwrap();
    let back: SparseMatrix = serde_json::from_str(&json).unwrap();
    assert_eq!(a, back);
    assert_eq!(back.n_rows(), 3);
}

fn entries() -> impl Strategy<Value = Vec<(usize, usize, i32)>> {
    prop::collection::vec((0usize..6, 0usize..6, -50i32..50), 0..30)
}

proptest! {
    #[test]
    fn add_matrix_is_cellwise_sum(a_entries in entries(), b_entries in entries()) {
        let a = assemble(&a_entries);
        let b = assemble(&b_entries);

        let mut ab = a.clone();
        ab.add_matrix(&b);
        let mut ba = b.clone();
        ba.add_matrix(&a);

        for row in 0..6 {
            for col in 0..6 {
                let expected = a.find_value(row, col) + b.find_value(row, col);
                prop_assert_eq!(ab.find_value(row, col), expected);
                prop_assert_eq!(ba.find_value(row, col), expected);
            }
        }
    }

    #[test]
    fn add_matrix_is_associative(
        a_entries in entries(),
        b_entries in entries(),
        c_entries in entries(),
    ) {
        let a = assemble(&a_entries);
        let b = assemble(&b_entries);
        let c = assemble(&c_entries);

        let mut left = a.clone();
        left.add_matrix(&b);
        left.add_matrix(&c);

        let mut bc = b.clone();
        bc.add_matrix(&c);
        let mut right = a.clone();
        right.add_matrix(&bc);

        for row in 0..6 {
            for col in 0..6 {
                prop_assert_eq!(left.find_value(row, col), right.find_value(row, col));
            }
        }
    }

    #[test]
    fn mlt_matches_dense_product(a_entries in entries(), x in prop::collection::vec(-5i32..5, 6)) {
        let a = assemble(&a_entries);
        let x: Vec<f64> = x.into_iter().map(f64::from).collect();

        let y = a.mlt(&x);
        prop_assert_eq!(y.len(), a.n_rows());
        for (row, yi) in y.iter().enumerate() {
            let expected: f64 = (0..6).map(|col| a.find_value(row, col) * x[col]).sum();
            prop_assert_eq!(*yi, expected);
        }
    }
}

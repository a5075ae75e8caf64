use nalgebra::{DMatrix, DVector, SymmetricEigen};

#[inline(always)]
/// Create a symmetric, square matrix. Function is only run for upper triangle of the matrix
pub(crate) fn symmetric_matrix(
    n: usize,
    mut func: impl FnMut(usize, usize) -> f64,
) -> DMatrix<f64> {
    let m = DMatrix::from_fn(n, n, |i, j| if i <= j { func(i, j) } else { 0.0 });
    DMatrix::from_fn(n, n, |i, j| if i <= j { m[(i, j)] } else { m[(j, i)] })
}

/// Eigenvectors (as columns) and eigenvalues of a symmetric matrix, sorted by
/// ascending eigenvalue.
pub(crate) fn sorted_eigs(matrix: DMatrix<f64>) -> (DMatrix<f64>, DVector<f64>) {
    let eigs = SymmetricEigen::new(matrix);

    let mut val_vec_pairs = eigs
        .eigenvalues
        .into_iter()
        .zip(eigs.eigenvectors.column_iter())
        .collect::<Vec<_>>();

    val_vec_pairs.sort_unstable_by(|(a, _), (b, _)| a.total_cmp(b));

    let (values, vectors): (Vec<_>, Vec<_>) = val_vec_pairs.into_iter().unzip();

    (
        DMatrix::from_columns(&vectors),
        DVector::from_column_slice(&values),
    )
}

/// Closed-shell density matrix D_pq = 2 sum_k C_pk C_qk over the `n_occupied`
/// lowest orbitals.
pub(crate) fn closed_shell_density(coefficients: &DMatrix<f64>, n_occupied: usize) -> DMatrix<f64> {
    symmetric_matrix(coefficients.nrows(), |i, j| {
        let mut sum = 0.0;
        for k in 0..n_occupied {
            sum += coefficients[(i, k)] * coefficients[(j, k)]
        }
        2.0 * sum
    })
}

use nalgebra::{DMatrix, DVector};
use std::collections::VecDeque;

struct Sample {
    fock: DMatrix<f64>,
    /// commutator FD - DF of this sample
    error: DMatrix<f64>,
}

/// Direct inversion in the iterative subspace: extrapolates the Fock matrix from
/// the history of previous Fock matrices and their commutator errors.
pub(crate) struct Diis {
    /// newest first
    history: VecDeque<Sample>,
}

impl Diis {
    const MAX_SAMPLES: usize = 8;
    const MIN_SAMPLES: usize = 3;

    pub fn new() -> Self {
        Self {
            history: VecDeque::with_capacity(Self::MAX_SAMPLES + 1),
        }
    }

    /// Records a new sample and returns the extrapolated Fock matrix. Until
    /// enough samples are collected the new Fock matrix is returned unchanged.
    /// Returns `None` only if the DIIS equations are singular.
    pub fn extrapolate(&mut self, fock: DMatrix<f64>, error: DMatrix<f64>) -> Option<DMatrix<f64>> {
        self.history.push_front(Sample { fock, error });
        self.history.truncate(Self::MAX_SAMPLES);

        let n = self.history.len();
        if n < Self::MIN_SAMPLES {
            return self.history.front().map(|sample| sample.fock.clone());
        }

        // [ B  -1 ] [ c ]   [  0 ]
        // [ -1  0 ] [ λ ] = [ -1 ]   with B_ij = <e_i, e_j>
        let mut equations = DMatrix::zeros(n + 1, n + 1);
        for i in 0..n {
            for j in 0..=i {
                let overlap = self.history[i].error.dot(&self.history[j].error);
                equations[(i, j)] = overlap;
                equations[(j, i)] = overlap;
            }
            equations[(i, n)] = -1.0;
            equations[(n, i)] = -1.0;
        }
        let mut rhs = DVector::zeros(n + 1);
        rhs[n] = -1.0;

        let coefficients = equations.lu().solve(&rhs)?;
        log::trace!("diis coefficients {:?}", &coefficients.as_slice()[..n]);

        Some(
            self.history
                .iter()
                .zip(coefficients.iter())
                .map(|(sample, &c)| c * &sample.fock)
                .sum(),
        )
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::DMatrix;

    use super::Diis;

    #[test]
    fn passes_through_until_history_is_filled() {
        let mut diis = Diis::new();
        let fock = DMatrix::from_diagonal_element(2, 2, 1.5);
        let error = DMatrix::from_element(2, 2, 0.1);

        assert_eq!(diis.extrapolate(fock.clone(), error), Some(fock));
    }

    #[test]
    fn extrapolation_is_an_affine_combination() {
        let mut diis = Diis::new();
        let mut result = None;
        for k in 1..=4 {
            let fock = DMatrix::from_diagonal_element(2, 2, k as f64);
            let mut error = DMatrix::zeros(2, 2);
            error[(0, 1)] = 1.0 / k as f64;
            error[(1, 0)] = -1.0 / (k * k) as f64;
            result = diis.extrapolate(fock, error);
        }

        // the coefficients sum to one, so a multiple of the identity stays
        // a diagonal matrix with equal entries
        let result = result.unwrap();
        assert_relative_eq!(result[(0, 1)], 0.0, epsilon = 1e-12);
        assert_relative_eq!(result[(0, 0)], result[(1, 1)], epsilon = 1e-12);
    }
}

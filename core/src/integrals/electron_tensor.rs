use std::ops::Index;

use nalgebra::DMatrix;

use super::{index::linear, IntegralStore};

/// A dense view of all two-electron integrals (pq|rs) of a store.
///
/// Every permutation is materialized, so lookups are a single array access. This
/// costs n^4 memory and is meant for the small systems the SCF refinement and
/// basis rotation work on.
pub struct ElectronTensor {
    data: Vec<f64>,
    /// side length
    size: usize,
}

impl ElectronTensor {
    /// Expands the canonical integrals of `store` into a dense tensor.
    pub fn from_store(store: &IntegralStore) -> Self {
        let size = store.n_orbitals();
        let mut data = vec![0.0; size.pow(4)];

        for (index, &value) in store.two_electron_entries() {
            for permutation in index.permutations() {
                data[linear(permutation, size)] = value;
            }
        }

        Self { data, size }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Rotates the tensor into a new orbital basis given by the columns of
    /// `coefficients`:
    ///   (pq|rs)' = sum_{μνλσ} C_μp C_νq C_λr C_σs (μν|λσ)
    ///
    /// Each quarter transformation contracts the first axis and moves it to the
    /// back, so after four passes the axes are back in their original order.
    pub fn transformed(&self, coefficients: &DMatrix<f64>) -> Self {
        let mut data = self.data.clone();
        for _ in 0..4 {
            data = quarter_transform(&data, self.size, coefficients);
        }

        Self {
            data,
            size: self.size,
        }
    }
}

fn quarter_transform(data: &[f64], n: usize, coefficients: &DMatrix<f64>) -> Vec<f64> {
    let mut output = vec![0.0; data.len()];

    for (s, r, q) in itertools::iproduct!(0..n, 0..n, 0..n) {
        let column = &data[linear((0, q, r, s), n)..linear((0, q, r, s), n) + n];
        for p in 0..n {
            let mut sum = 0.0;
            for (mu, &value) in column.iter().enumerate() {
                sum += coefficients[(mu, p)] * value;
            }
            output[linear((q, r, s, p), n)] = sum;
        }
    }

    output
}

impl Index<(usize, usize, usize, usize)> for ElectronTensor {
    type Output = f64;

    fn index(&self, index: (usize, usize, usize, usize)) -> &Self::Output {
        &self.data[linear(index, self.size)]
    }
}

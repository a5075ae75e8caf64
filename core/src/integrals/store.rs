use std::collections::HashMap;

use nalgebra::DMatrix;

use crate::error::{Error, Result};

use super::{ElectronTensor, IntegralIndex, PairIndex};

/// One- and two-electron integrals in the molecular orbital basis.
///
/// Only the canonical member of each symmetry class is stored. Integrals that
/// are not present are treated as zero, since producers commonly drop integrals
/// below some negligibility threshold.
#[derive(Debug, Clone)]
pub struct IntegralStore {
    n_orbitals: usize,
    one_electron: HashMap<PairIndex, f64>,
    two_electron: HashMap<IntegralIndex, f64>,
}

impl IntegralStore {
    /// Integrals with a magnitude below this are not kept after a basis rotation.
    const ZERO_CUTOFF: f64 = 1e-14;

    /// Creates an empty store for `n_orbitals` molecular orbitals.
    pub fn new(n_orbitals: usize) -> Self {
        Self {
            n_orbitals,
            one_electron: HashMap::new(),
            two_electron: HashMap::new(),
        }
    }

    pub fn n_orbitals(&self) -> usize {
        self.n_orbitals
    }

    /// Number of distinct two-electron integrals that are stored.
    pub fn n_two_electron(&self) -> usize {
        self.two_electron.len()
    }

    /// Sets h_pq (and therefore h_qp).
    pub fn set_one_electron(&mut self, p: usize, q: usize, value: f64) -> Result<()> {
        self.check_indices(&[p, q])?;
        check_finite(value, || format!("h({p} {q})"))?;

        self.one_electron.insert(PairIndex::new(p, q), value);
        Ok(())
    }

    /// Sets the chemist's-notation integral (pq|rs) and all of its symmetry
    /// partners. Returns the value that was stored before, if any.
    pub fn set_two_electron(
        &mut self,
        (p, q, r, s): (usize, usize, usize, usize),
        value: f64,
    ) -> Result<Option<f64>> {
        self.check_indices(&[p, q, r, s])?;
        let index = IntegralIndex::new((p, q, r, s));
        check_finite(value, || format!("eri {index}"))?;

        log::trace!("ERI {index} = {value:<1.8}");
        Ok(self.two_electron.insert(index, value))
    }

    /// Adds `value` to the chemist's-notation integral (pq|rs) and all of its
    /// symmetry partners. Adding to an existing entry accumulates.
    pub fn add_two_electron(
        &mut self,
        (p, q, r, s): (usize, usize, usize, usize),
        value: f64,
    ) -> Result<()> {
        self.check_indices(&[p, q, r, s])?;
        let index = IntegralIndex::new((p, q, r, s));
        check_finite(value, || format!("eri {index}"))?;

        log::trace!("ERI {index} += {value:<1.8}");
        *self.two_electron.entry(index).or_insert(0.0) += value;
        Ok(())
    }

    /// Returns h_pq. Absent integrals are zero.
    pub fn get_one_electron(&self, p: usize, q: usize) -> f64 {
        self.one_electron
            .get(&PairIndex::new(p, q))
            .copied()
            .unwrap_or(0.0)
    }

    /// Returns the chemist's-notation integral (pq|rs). Indices may be given in
    /// any of the eight equivalent orders. Absent integrals are zero.
    pub fn get_two_electron(&self, p: usize, q: usize, r: usize, s: usize) -> f64 {
        self.two_electron
            .get(&IntegralIndex::new((p, q, r, s)))
            .copied()
            .unwrap_or(0.0)
    }

    /// Returns the physicist's-notation integral <pq|rs> = (pr|qs).
    pub fn get_physicist(&self, p: usize, q: usize, r: usize, s: usize) -> f64 {
        self.get_two_electron(p, r, q, s)
    }

    /// Coulomb integral J_ij = (ii|jj).
    pub fn coulomb(&self, i: usize, j: usize) -> f64 {
        self.get_two_electron(i, i, j, j)
    }

    /// Exchange integral K_ij = (ij|ji).
    pub fn exchange(&self, i: usize, j: usize) -> f64 {
        self.get_two_electron(i, j, j, i)
    }

    /// The core hamiltonian as a dense symmetric matrix.
    pub fn core_hamiltonian(&self) -> DMatrix<f64> {
        let mut matrix = DMatrix::zeros(self.n_orbitals, self.n_orbitals);
        for (index, &value) in &self.one_electron {
            let (p, q) = index.indices();
            matrix[(p, q)] = value;
            matrix[(q, p)] = value;
        }
        matrix
    }

    pub(crate) fn two_electron_entries(&self) -> impl Iterator<Item = (&IntegralIndex, &f64)> {
        self.two_electron.iter()
    }

    /// Expresses all integrals in a rotated orbital basis.
    ///
    /// Column k of `coefficients` holds the expansion of new orbital k in the
    /// current orbitals. One-electron integrals transform as C^T h C, the
    /// two-electron tensor by four successive quarter transformations.
    pub fn transformed(&self, coefficients: &DMatrix<f64>) -> Result<Self> {
        let n = self.n_orbitals;
        if coefficients.nrows() != n || coefficients.ncols() != n {
            return Err(Error::DataFormat(format!(
                "coefficient matrix is {}x{}, expected {n}x{n}",
                coefficients.nrows(),
                coefficients.ncols()
            )));
        }

        let mut rotated = Self::new(n);

        let core = coefficients.transpose() * self.core_hamiltonian() * coefficients;
        for p in 0..n {
            for q in p..n {
                let value = core[(p, q)];
                if value.abs() > Self::ZERO_CUTOFF {
                    rotated.one_electron.insert(PairIndex::new(p, q), value);
                }
            }
        }

        let tensor = ElectronTensor::from_store(self).transformed(coefficients);
        for p in 0..n {
            for q in p..n {
                for r in p..n {
                    let s_start = if r == p { q } else { r };
                    for s in s_start..n {
                        let value = tensor[(p, q, r, s)];
                        if value.abs() > Self::ZERO_CUTOFF {
                            rotated
                                .two_electron
                                .insert(IntegralIndex::new((p, q, r, s)), value);
                        }
                    }
                }
            }
        }

        log::debug!(
            "rotated integrals: {} one-electron, {} two-electron",
            rotated.one_electron.len(),
            rotated.two_electron.len()
        );

        Ok(rotated)
    }

    fn check_indices(&self, indices: &[usize]) -> Result<()> {
        match indices.iter().find(|&&index| index >= self.n_orbitals) {
            Some(index) => Err(Error::DataFormat(format!(
                "orbital index {index} out of range for {} orbitals",
                self.n_orbitals
            ))),
            None => Ok(()),
        }
    }
}

fn check_finite(value: f64, name: impl FnOnce() -> String) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(Error::DataFormat(format!(
            "integral {} is not finite ({value})",
            name()
        )))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::DMatrix;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    use super::IntegralStore;
    use crate::error::Error;

    fn random_store(n: usize, seed: u64) -> IntegralStore {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut store = IntegralStore::new(n);
        for p in 0..n {
            for q in p..n {
                store.set_one_electron(p, q, rng.gen_range(-1.0..1.0)).unwrap();
            }
        }
        for p in 0..n {
            for q in p..n {
                for r in p..n {
                    for s in r..n {
                        if (r, s) >= (p, q) {
                            store
                                .add_two_electron((p, q, r, s), rng.gen_range(-0.5..0.5))
                                .unwrap();
                        }
                    }
                }
            }
        }
        store
    }

    #[test]
    fn two_electron_lookup_is_permutation_invariant() {
        let n = 4;
        let store = random_store(n, 7);

        for (p, q, r, s) in itertools::iproduct!(0..n, 0..n, 0..n, 0..n) {
            let value = store.get_two_electron(p, q, r, s);
            assert_eq!(value, store.get_two_electron(q, p, r, s));
            assert_eq!(value, store.get_two_electron(p, q, s, r));
            assert_eq!(value, store.get_two_electron(q, p, s, r));
            assert_eq!(value, store.get_two_electron(r, s, p, q));
            assert_eq!(value, store.get_two_electron(s, r, p, q));
            assert_eq!(value, store.get_two_electron(r, s, q, p));
            assert_eq!(value, store.get_two_electron(s, r, q, p));
        }
    }

    #[test]
    fn absent_integrals_are_zero() {
        let mut store = IntegralStore::new(3);
        store.add_two_electron((0, 1, 2, 2), 0.25).unwrap();

        assert_eq!(store.get_two_electron(2, 2, 1, 0), 0.25);
        assert_eq!(store.get_two_electron(0, 0, 0, 0), 0.0);
        assert_eq!(store.get_one_electron(1, 2), 0.0);
    }

    #[test]
    fn repeated_entries_accumulate() {
        let mut store = IntegralStore::new(2);
        store.add_two_electron((0, 1, 0, 1), 0.1).unwrap();
        store.add_two_electron((1, 0, 1, 0), 0.2).unwrap();

        assert_relative_eq!(store.get_two_electron(0, 1, 1, 0), 0.3, epsilon = 1e-15);
        assert_eq!(store.n_two_electron(), 1);
    }

    #[test]
    fn set_replaces_and_reports_previous_value() {
        let mut store = IntegralStore::new(3);
        assert_eq!(store.set_two_electron((2, 1, 0, 0), 0.5).unwrap(), None);
        assert_eq!(store.set_two_electron((0, 0, 1, 2), 0.7).unwrap(), Some(0.5));
        assert_eq!(store.get_two_electron(1, 2, 0, 0), 0.7);
    }

    #[test]
    fn out_of_range_index_is_a_format_error() {
        let mut store = IntegralStore::new(2);
        assert!(matches!(
            store.add_two_electron((0, 1, 2, 0), 1.0),
            Err(Error::DataFormat(_))
        ));
        assert!(matches!(
            store.set_one_electron(5, 0, 1.0),
            Err(Error::DataFormat(_))
        ));
        assert!(matches!(
            store.set_one_electron(0, 0, f64::NAN),
            Err(Error::DataFormat(_))
        ));
    }

    #[test]
    fn physicist_and_named_accessors() {
        let mut store = IntegralStore::new(2);
        store.add_two_electron((0, 0, 1, 1), 0.6).unwrap();
        store.add_two_electron((0, 1, 0, 1), 0.15).unwrap();

        assert_eq!(store.coulomb(0, 1), 0.6);
        assert_eq!(store.exchange(0, 1), 0.15);
        // <01|01> = (00|11)
        assert_eq!(store.get_physicist(0, 1, 0, 1), 0.6);
        // <01|10> = (01|10)
        assert_eq!(store.get_physicist(0, 1, 1, 0), 0.15);
    }

    #[test]
    fn identity_rotation_keeps_integrals() {
        let n = 3;
        let store = random_store(n, 11);
        let rotated = store.transformed(&DMatrix::identity(n, n)).unwrap();

        for (p, q, r, s) in itertools::iproduct!(0..n, 0..n, 0..n, 0..n) {
            assert_relative_eq!(
                rotated.get_two_electron(p, q, r, s),
                store.get_two_electron(p, q, r, s),
                epsilon = 1e-12
            );
        }
        for (p, q) in itertools::iproduct!(0..n, 0..n) {
            assert_relative_eq!(
                rotated.get_one_electron(p, q),
                store.get_one_electron(p, q),
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn orbital_swap_permutes_integrals() {
        let n = 3;
        let store = random_store(n, 3);
        // swap orbitals 0 and 2
        let mut swap = DMatrix::zeros(n, n);
        swap[(2, 0)] = 1.0;
        swap[(1, 1)] = 1.0;
        swap[(0, 2)] = 1.0;

        let rotated = store.transformed(&swap).unwrap();
        let map = |x: usize| [2, 1, 0][x];

        for (p, q, r, s) in itertools::iproduct!(0..n, 0..n, 0..n, 0..n) {
            assert_relative_eq!(
                rotated.get_two_electron(p, q, r, s),
                store.get_two_electron(map(p), map(q), map(r), map(s)),
                epsilon = 1e-12
            );
        }
        assert_relative_eq!(
            rotated.get_one_electron(0, 1),
            store.get_one_electron(2, 1),
            epsilon = 1e-12
        );
    }

    #[test]
    fn rotation_requires_square_coefficients() {
        let store = IntegralStore::new(3);
        assert!(matches!(
            store.transformed(&DMatrix::identity(2, 2)),
            Err(Error::DataFormat(_))
        ));
    }
}

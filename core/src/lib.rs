pub mod calculation;
pub mod config;
mod diis;
pub mod error;
pub mod hf;
pub mod integrals;
pub mod mp2;
pub mod orbitals;
pub mod report;

pub use calculation::{compute_energies, CalculationConfig, IntegralData};
pub use error::{Error, Result};

pub mod testing {
    use crate::{
        calculation::IntegralData,
        error::Result,
        integrals::IntegralStore,
        orbitals::OrbitalSpace,
    };

    /// A deterministic closed-shell model system with a clear gap between
    /// occupied and virtual orbitals. Used by the benchmarks and tests that need
    /// more than a hand-sized system.
    pub fn model_system(n_orbitals: usize, n_electrons: usize) -> Result<IntegralData> {
        let space = OrbitalSpace::new(n_orbitals as i64, n_electrons as i64)?;
        let mut store = IntegralStore::new(n_orbitals);

        for p in 0..n_orbitals {
            store.set_one_electron(p, p, -3.0 + 0.6 * p as f64)?;
            for q in p + 1..n_orbitals {
                store.set_one_electron(p, q, 0.02 / (q - p) as f64)?;
            }
        }

        for (p, q) in pairs(n_orbitals) {
            for (r, s) in pairs(n_orbitals).filter(|&pair| (p, q) <= pair) {
                let value = match (p == q, r == s) {
                    (true, true) => 0.6 - 0.03 * (p + r) as f64,
                    _ if (p, q) == (r, s) => 0.1 / (1 + q - p) as f64,
                    _ => 0.01 * ((p + 2 * q + 3 * r + 5 * s) % 7) as f64 / 7.0,
                };
                store.set_two_electron((p, q, r, s), value)?;
            }
        }

        Ok(IntegralData {
            nuclear_repulsion: 1.5,
            space,
            store,
            orbital_energies: None,
        })
    }

    fn pairs(n_orbitals: usize) -> impl Iterator<Item = (usize, usize)> {
        (0..n_orbitals).flat_map(move |p| (p..n_orbitals).map(move |q| (p, q)))
    }
}

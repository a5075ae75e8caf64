use std::ops::{Index, Range};

use serde::Serialize;

use crate::{
    error::{Error, Result},
    integrals::IntegralStore,
};

/// The partition of the molecular orbitals of a closed-shell system into
/// occupied and virtual orbitals.
///
/// Every occupied orbital holds two electrons. The lowest `n_frozen` occupied
/// orbitals can be frozen, which removes them from the correlation treatment
/// but not from the reference energy.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OrbitalSpace {
    n_orbitals: usize,
    n_occupied: usize,
    n_frozen: usize,
}

impl OrbitalSpace {
    /// Creates the orbital space of a closed-shell system with `n_orbitals`
    /// molecular orbitals and `n_electrons` electrons.
    pub fn new(n_orbitals: i64, n_electrons: i64) -> Result<Self> {
        if n_orbitals <= 0 {
            return Err(Error::Configuration(format!(
                "number of orbitals must be positive, got {n_orbitals}"
            )));
        }
        if n_electrons <= 0 {
            return Err(Error::Configuration(format!(
                "number of electrons must be positive, got {n_electrons}"
            )));
        }
        if n_electrons % 2 != 0 {
            return Err(Error::Configuration(format!(
                "a closed-shell system needs an even number of electrons, got {n_electrons}"
            )));
        }
        // n_electrons is even here, so halving it is exact and cannot overflow
        if n_electrons / 2 > n_orbitals {
            return Err(Error::Configuration(format!(
                "{n_electrons} electrons do not fit into {n_orbitals} doubly occupied orbitals"
            )));
        }
        let too_many = |count: i64| {
            Error::Configuration(format!("{count} orbitals cannot be addressed on this platform"))
        };

        let space = Self {
            n_orbitals: usize::try_from(n_orbitals).map_err(|_| too_many(n_orbitals))?,
            n_occupied: usize::try_from(n_electrons / 2).map_err(|_| too_many(n_electrons / 2))?,
            n_frozen: 0,
        };
        log::debug!(
            "orbital space: {} occupied, {} virtual",
            space.n_occupied(),
            space.n_virtual()
        );
        Ok(space)
    }

    /// Freezes the `n_frozen` lowest occupied orbitals.
    pub fn with_frozen_core(self, n_frozen: usize) -> Result<Self> {
        if n_frozen > self.n_occupied {
            return Err(Error::Configuration(format!(
                "cannot freeze {n_frozen} orbitals, only {} are occupied",
                self.n_occupied
            )));
        }
        Ok(Self { n_frozen, ..self })
    }

    pub fn n_orbitals(&self) -> usize {
        self.n_orbitals
    }

    pub fn n_electrons(&self) -> usize {
        2 * self.n_occupied
    }

    pub fn n_occupied(&self) -> usize {
        self.n_occupied
    }

    pub fn n_virtual(&self) -> usize {
        self.n_orbitals - self.n_occupied
    }

    pub fn n_frozen(&self) -> usize {
        self.n_frozen
    }

    /// Occupied orbitals, [0, n_occ).
    pub fn occupied(&self) -> Range<usize> {
        0..self.n_occupied
    }

    /// Occupied orbitals that take part in the correlation treatment, [n_frozen, n_occ).
    pub fn active_occupied(&self) -> Range<usize> {
        self.n_frozen..self.n_occupied
    }

    /// Virtual orbitals, [n_occ, n_total).
    pub fn virtual_orbitals(&self) -> Range<usize> {
        self.n_occupied..self.n_orbitals
    }
}

/// Orbital energies, one per molecular orbital, in the same order as the
/// integral indices.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OrbitalEnergies(Vec<f64>);

impl OrbitalEnergies {
    pub fn new(energies: Vec<f64>) -> Result<Self> {
        if let Some((index, energy)) = energies.iter().enumerate().find(|(_, e)| !e.is_finite()) {
            return Err(Error::DataFormat(format!(
                "orbital energy {index} is not finite ({energy})"
            )));
        }
        if energies.windows(2).any(|pair| pair[1] < pair[0]) {
            log::warn!("orbital energies are not in ascending order");
        }
        Ok(Self(energies))
    }

    /// Diagonal of the closed-shell Fock operator in the orbital basis:
    ///   ε_p = h_pp + sum_i [2 (pp|ii) - (pi|ip)]
    ///
    /// This equals the orbital energies whenever the supplied orbitals are
    /// canonical Hartree-Fock orbitals.
    pub fn from_fock_diagonal(store: &IntegralStore, space: &OrbitalSpace) -> Self {
        let energies = (0..space.n_orbitals())
            .map(|p| {
                let two_electron: f64 = space
                    .occupied()
                    .map(|i| 2.0 * store.get_two_electron(p, p, i, i) - store.exchange(p, i))
                    .sum();
                store.get_one_electron(p, p) + two_electron
            })
            .collect();
        Self(energies)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Largest absolute difference to another set of orbital energies.
    pub fn max_deviation(&self, other: &Self) -> f64 {
        self.0
            .iter()
            .zip(&other.0)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    }
}

impl Index<usize> for OrbitalEnergies {
    type Output = f64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

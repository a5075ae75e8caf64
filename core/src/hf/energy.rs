use serde::Serialize;

use crate::{integrals::IntegralStore, orbitals::OrbitalSpace};

/// The closed-shell Hartree-Fock energy, split into its contributions.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct HartreeFockEnergy {
    /// 2 sum_i h_ii
    pub one_electron: f64,
    /// sum_ij [2 (ii|jj) - (ij|ji)]
    pub two_electron: f64,
    /// The nuclear repulsion energy
    pub nuclear_repulsion: f64,
}

impl HartreeFockEnergy {
    pub fn electronic_energy(&self) -> f64 {
        self.one_electron + self.two_electron
    }

    pub fn total_energy(&self) -> f64 {
        self.electronic_energy() + self.nuclear_repulsion
    }
}

/// Evaluates the energy of the closed-shell determinant built from the occupied
/// orbitals of `space`.
///
/// The orbitals are taken as given; no self-consistency is attempted here.
pub fn hartree_fock_energy(
    store: &IntegralStore,
    space: &OrbitalSpace,
    nuclear_repulsion: f64,
) -> HartreeFockEnergy {
    let one_electron = space
        .occupied()
        .map(|i| 2.0 * store.get_one_electron(i, i))
        .sum();

    // the full double sum visits every i != j pair twice and the diagonal once
    let mut two_electron = 0.0;
    for (i, j) in itertools::iproduct!(space.occupied(), space.occupied()) {
        two_electron += 2.0 * store.coulomb(i, j) - store.exchange(i, j);
    }

    let energy = HartreeFockEnergy {
        one_electron,
        two_electron,
        nuclear_repulsion,
    };
    log::debug!(
        "hartree fock energy: one electron {one_electron:.10}, two electron {two_electron:.10}, nuclear {nuclear_repulsion:.10}"
    );
    energy
}

use nalgebra::DMatrix;
use serde::Serialize;

use crate::{
    diis::Diis,
    error::{Error, Result},
    integrals::{ElectronTensor, IntegralStore},
    orbitals::{OrbitalEnergies, OrbitalSpace},
};

use super::{utils, ScfConfig};

/// The result of a converged SCF refinement.
#[derive(Debug)]
#[non_exhaustive]
pub struct ScfOutput {
    /// Expansion of the refined orbitals (columns) in the input orbitals.
    pub coefficients: DMatrix<f64>,
    /// the orbital energies of the refined orbitals, sorted in ascending order
    pub orbital_energies: OrbitalEnergies,
    /// The electronic energy of the system
    pub electronic_energy: f64,
    /// The nuclear repulsion energy
    pub nuclear_repulsion: f64,
    /// After how many iterations did the system converge
    pub iterations: usize,
}

impl ScfOutput {
    pub fn total_energy(&self) -> f64 {
        self.electronic_energy + self.nuclear_repulsion
    }

    pub fn summary(&self) -> ScfSummary {
        ScfSummary {
            iterations: self.iterations,
            total_energy: self.total_energy(),
        }
    }
}

/// The part of an SCF run that ends up in a report.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct ScfSummary {
    pub iterations: usize,
    pub total_energy: f64,
}

/// Runs a restricted closed-shell SCF in the (orthonormal) basis of the orbitals
/// the integrals are expressed in, starting from those orbitals.
///
/// If the supplied orbitals are already converged, the Fock matrix is diagonal
/// from the start and the loop stops after the first iteration. Otherwise the
/// orbitals are mixed until the energy and the density stop changing.
pub fn restricted_hartree_fock(
    store: &IntegralStore,
    space: &OrbitalSpace,
    nuclear_repulsion: f64,
    config: &ScfConfig,
) -> Result<ScfOutput> {
    let n_orbitals = space.n_orbitals();
    let n_occupied = space.n_occupied();

    let core_hamiltonian = store.core_hamiltonian();
    let electron = ElectronTensor::from_store(store);

    // G_pq = sum_rs D_rs [(pq|rs) - 1/2 (pr|qs)], laid out so that the (r, s)
    // block of a fixed (p, q) is contiguous and matches the density's storage
    let mut electron_terms = vec![0.0; n_orbitals.pow(4)];
    for (q, p, s, r) in itertools::iproduct!(
        0..n_orbitals,
        0..n_orbitals,
        0..n_orbitals,
        0..n_orbitals
    ) {
        electron_terms[((q * n_orbitals + p) * n_orbitals + s) * n_orbitals + r] =
            electron[(p, q, r, s)] - 0.5 * electron[(p, r, q, s)];
    }

    let mut density =
        utils::closed_shell_density(&DMatrix::identity(n_orbitals, n_orbitals), n_occupied);
    let mut electronic_hamiltonian =
        compute_electronic_hamiltonian(&density, &electron_terms, n_orbitals);
    let mut electronic_energy =
        compute_electronic_energy(&density, &core_hamiltonian, &electronic_hamiltonian);
    log::info!("initial electronic energy {electronic_energy:1.10}");

    let mut diis = Diis::new();
    for iteration in 1..=config.max_iterations {
        let fock = &core_hamiltonian + &electronic_hamiltonian;
        let error = &fock * &density - &density * &fock;

        let extrapolated = diis.extrapolate(fock.clone(), error).unwrap_or_else(|| {
            log::warn!("DIIS failed in iteration {iteration}, using the plain fock matrix");
            fock
        });
        let (coefficients, _) = utils::sorted_eigs(extrapolated);

        let new_density = utils::closed_shell_density(&coefficients, n_occupied);
        let density_change = &new_density - &density;
        let density_rms = (density_change.map(|entry| entry.powi(2)).sum()
            / n_orbitals.pow(2) as f64)
            .sqrt();
        density = new_density;

        electronic_hamiltonian =
            compute_electronic_hamiltonian(&density, &electron_terms, n_orbitals);
        let new_energy =
            compute_electronic_energy(&density, &core_hamiltonian, &electronic_hamiltonian);
        let energy_change = new_energy - electronic_energy;
        electronic_energy = new_energy;

        log::info!(
            "iteration {iteration:<4} - electronic energy {electronic_energy:1.10}. energy change {energy_change:1.4e}. density rms {density_rms:1.4e}",
        );

        if energy_change.abs() < config.energy_tolerance && density_rms < config.density_tolerance
        {
            // canonical orbitals of the converged fock operator
            let fock = &core_hamiltonian + &electronic_hamiltonian;
            let (coefficients, orbital_energies) = utils::sorted_eigs(fock);

            return Ok(ScfOutput {
                coefficients,
                orbital_energies: OrbitalEnergies::new(orbital_energies.as_slice().to_vec())?,
                electronic_energy,
                nuclear_repulsion,
                iterations: iteration,
            });
        }
    }

    Err(Error::Convergence {
        iterations: config.max_iterations,
        last_energy: electronic_energy + nuclear_repulsion,
    })
}

fn compute_electronic_hamiltonian(
    density: &DMatrix<f64>,
    electron_terms: &[f64],
    n_orbitals: usize,
) -> DMatrix<f64> {
    let block = n_orbitals.pow(2);
    let density = density.as_slice();

    utils::symmetric_matrix(n_orbitals, |p, q| {
        let start = (q * n_orbitals + p) * block;
        electron_terms[start..start + block]
            .iter()
            .zip(density)
            .map(|(term, d)| term * d)
            .sum()
    })
}

/// E = 1/2 sum_pq D_pq (2 h_pq + G_pq)
fn compute_electronic_energy(
    density: &DMatrix<f64>,
    core_hamiltonian: &DMatrix<f64>,
    electronic_hamiltonian: &DMatrix<f64>,
) -> f64 {
    0.5 * density.dot(&(2.0 * core_hamiltonian + electronic_hamiltonian))
}

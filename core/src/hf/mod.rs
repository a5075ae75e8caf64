mod energy;
mod scf;
pub(crate) mod utils;

pub use energy::{hartree_fock_energy, HartreeFockEnergy};
pub use scf::{restricted_hartree_fock, ScfOutput, ScfSummary};

/// Controls the optional SCF refinement of the supplied orbitals.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ScfConfig {
    /// the maximum number of iterations to try
    pub max_iterations: usize,
    /// if the energy changes by less than this between two iterations (and the
    /// density is converged as well), the system is considered converged
    pub energy_tolerance: f64,
    /// the smallest density matrix rms change that isn't treated as zero
    pub density_tolerance: f64,
}

impl Default for ScfConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            energy_tolerance: 1e-10,
            density_tolerance: 1e-8,
        }
    }
}

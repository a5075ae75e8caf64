use std::{borrow::Cow, fs::File, io::BufReader, path::Path};

use crate::{
    config::ConfigIntegralFile,
    error::Result,
    hf::{hartree_fock_energy, restricted_hartree_fock, ScfConfig},
    integrals::IntegralStore,
    mp2::{mp2_energy, Mp2Config},
    orbitals::{OrbitalEnergies, OrbitalSpace},
    report::EnergyResult,
};

/// Everything read from an integral file. Read-only once loaded.
#[derive(Debug, Clone)]
pub struct IntegralData {
    pub nuclear_repulsion: f64,
    pub space: OrbitalSpace,
    pub store: IntegralStore,
    /// orbital energies, if the file provides them
    pub orbital_energies: Option<OrbitalEnergies>,
}

impl IntegralData {
    /// Reads a JSON integral file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file: ConfigIntegralFile = serde_json::from_reader(BufReader::new(File::open(path)?))?;
        file.try_into()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: ConfigIntegralFile = serde_json::from_str(json)?;
        file.try_into()
    }
}

/// The input to an energy calculation
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct CalculationConfig {
    /// refine the orbitals with an scf run before evaluating energies
    pub scf: Option<ScfConfig>,
    pub mp2: Mp2Config,
    /// how many of the lowest occupied orbitals are left out of mp2
    pub frozen_core: usize,
}

/// Evaluates the Hartree-Fock and MP2 energies of `data`.
pub fn compute_energies(data: &IntegralData, config: &CalculationConfig) -> Result<EnergyResult> {
    /// orbital energies further than this from the fock diagonal are reported
    const FOCK_DEVIATION_WARNING: f64 = 1e-6;

    config.mp2.validate()?;
    let space = data.space.with_frozen_core(config.frozen_core)?;

    let (store, energies, scf) = match config.scf {
        Some(ref scf_config) => {
            let output =
                restricted_hartree_fock(&data.store, &space, data.nuclear_repulsion, scf_config)?;
            log::info!(
                "scf converged after {} iterations, energy {:.10}",
                output.iterations,
                output.total_energy()
            );

            let rotated = data.store.transformed(&output.coefficients)?;
            let summary = output.summary();
            (Cow::Owned(rotated), output.orbital_energies, Some(summary))
        }
        None => {
            let fock_diagonal = OrbitalEnergies::from_fock_diagonal(&data.store, &space);
            let energies = match &data.orbital_energies {
                Some(supplied) => {
                    let deviation = supplied.max_deviation(&fock_diagonal);
                    log::debug!("largest deviation from the fock diagonal: {deviation:e}");
                    if deviation > FOCK_DEVIATION_WARNING {
                        log::warn!(
                            "orbital energies deviate from the fock diagonal by up to {deviation:e}, the orbitals may not be canonical hartree fock orbitals"
                        );
                    }
                    supplied.clone()
                }
                None => {
                    log::info!("no orbital energies supplied, using the fock diagonal");
                    fock_diagonal
                }
            };
            (Cow::Borrowed(&data.store), energies, None)
        }
    };

    let hartree_fock = hartree_fock_energy(store.as_ref(), &space, data.nuclear_repulsion);
    log::info!("hartree fock energy {:.10}", hartree_fock.total_energy());

    let mp2 = mp2_energy(store.as_ref(), &space, &energies, &config.mp2)?;

    Ok(EnergyResult {
        hartree_fock,
        mp2,
        scf,
    })
}

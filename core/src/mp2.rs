//! Closed-shell second order Møller-Plesset perturbation theory.
//!
//! With ⟨ij|ab⟩ = (ia|jb) and D = ε_i + ε_j - ε_a - ε_b the correlation energy is
//!
//!   E = sum_ijab ⟨ij|ab⟩ (2 ⟨ij|ab⟩ - ⟨ij|ba⟩) / D
//!
//! where i, j run over the active occupied and a, b over the virtual orbitals.
//! The sum is split into the opposite-spin part ⟨ij|ab⟩² / D and the same-spin
//! part ⟨ij|ab⟩ (⟨ij|ab⟩ - ⟨ij|ba⟩) / D.

use std::{iter::Sum, ops::Add};

use serde::Serialize;

use crate::{
    error::{Error, Result},
    integrals::IntegralStore,
    orbitals::{OrbitalEnergies, OrbitalSpace},
};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Mp2Config {
    /// denominators with a smaller magnitude than this are treated as zero
    pub degeneracy_threshold: f64,
}

impl Default for Mp2Config {
    fn default() -> Self {
        Self {
            degeneracy_threshold: 1e-10,
        }
    }
}

impl Mp2Config {
    /// Rejects thresholds that would let a zero denominator through.
    pub fn validate(&self) -> Result<()> {
        if self.degeneracy_threshold.is_finite() && self.degeneracy_threshold >= 0.0 {
            Ok(())
        } else {
            Err(Error::Configuration(format!(
                "degeneracy threshold must be finite and non-negative, got {}",
                self.degeneracy_threshold
            )))
        }
    }

    /// Whether `denominator` is too small to divide by. Exact zeros and NaN
    /// are always rejected, whatever the threshold.
    fn is_degenerate(&self, denominator: f64) -> bool {
        denominator == 0.0 || !(denominator.abs() >= self.degeneracy_threshold)
    }
}

/// The MP2 correlation energy, split by spin component.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize)]
pub struct Mp2Energy {
    pub opposite_spin: f64,
    pub same_spin: f64,
}

impl Mp2Energy {
    pub const ZERO: Self = Self {
        opposite_spin: 0.0,
        same_spin: 0.0,
    };

    const SCS_OPPOSITE_SPIN: f64 = 6.0 / 5.0;
    const SCS_SAME_SPIN: f64 = 1.0 / 3.0;

    /// The MP2 correlation energy.
    pub fn total(&self) -> f64 {
        self.opposite_spin + self.same_spin
    }

    /// Grimme's spin-component scaled MP2 correlation energy.
    pub fn spin_component_scaled(&self) -> f64 {
        Self::SCS_OPPOSITE_SPIN * self.opposite_spin + Self::SCS_SAME_SPIN * self.same_spin
    }
}

impl Add for Mp2Energy {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            opposite_spin: self.opposite_spin + rhs.opposite_spin,
            same_spin: self.same_spin + rhs.same_spin,
        }
    }
}

impl Sum for Mp2Energy {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

/// The (ia|jb) integrals with i, j active occupied and a, b virtual, gathered
/// from the store into a dense array once so the quadruple loop does not hash.
struct ExchangeBlock {
    data: Vec<f64>,
    n_occupied: usize,
    n_virtual: usize,
}

impl ExchangeBlock {
    fn gather(store: &IntegralStore, space: &OrbitalSpace) -> Self {
        let occupied = space.active_occupied();
        let virtuals = space.virtual_orbitals();
        let (n_occupied, n_virtual) = (occupied.len(), virtuals.len());

        let mut data = Vec::with_capacity(n_occupied.pow(2) * n_virtual.pow(2));
        for (i, a, j, b) in itertools::iproduct!(
            occupied.clone(),
            virtuals.clone(),
            occupied.clone(),
            virtuals.clone()
        ) {
            // <ij|ab> = (ia|jb)
            data.push(store.get_physicist(i, j, a, b));
        }

        Self {
            data,
            n_occupied,
            n_virtual,
        }
    }

    /// (ia|jb) for block-relative indices.
    #[inline(always)]
    fn get(&self, i: usize, a: usize, j: usize, b: usize) -> f64 {
        self.data[((i * self.n_virtual + a) * self.n_occupied + j) * self.n_virtual + b]
    }
}

/// Computes the closed-shell MP2 correlation energy of the orbitals in `space`.
///
/// Fails with [`Error::NumericDegeneracy`] as soon as a denominator is smaller
/// in magnitude than the configured threshold.
pub fn mp2_energy(
    store: &IntegralStore,
    space: &OrbitalSpace,
    energies: &OrbitalEnergies,
    config: &Mp2Config,
) -> Result<Mp2Energy> {
    config.validate()?;

    if energies.len() != space.n_orbitals() {
        return Err(Error::DataFormat(format!(
            "got {} orbital energies for {} orbitals",
            energies.len(),
            space.n_orbitals()
        )));
    }

    let n_active = space.active_occupied().len();
    let n_virtual = space.n_virtual();
    if n_active == 0 || n_virtual == 0 {
        log::info!("no active occupied or no virtual orbitals - mp2 correlation energy is zero");
        return Ok(Mp2Energy::ZERO);
    }

    log::debug!(
        "mp2 over {n_active} active occupied and {n_virtual} virtual orbitals ({} terms)",
        n_active.pow(2) * n_virtual.pow(2)
    );

    let block = ExchangeBlock::gather(store, space);
    let contribution = |i: usize| occupied_contribution(&block, space, energies, config, i);

    #[cfg(feature = "rayon")]
    let energy = {
        use rayon::iter::{IntoParallelIterator, ParallelIterator};

        (0..n_active)
            .into_par_iter()
            .map(contribution)
            .try_reduce(|| Mp2Energy::ZERO, |a, b| Ok(a + b))?
    };

    #[cfg(not(feature = "rayon"))]
    let energy = (0..n_active)
        .map(contribution)
        .sum::<Result<Mp2Energy>>()?;

    log::info!(
        "mp2 correlation energy {:.10} (opposite spin {:.10}, same spin {:.10})",
        energy.total(),
        energy.opposite_spin,
        energy.same_spin
    );

    Ok(energy)
}

/// All terms that share the first occupied index `i` (block-relative).
fn occupied_contribution(
    block: &ExchangeBlock,
    space: &OrbitalSpace,
    energies: &OrbitalEnergies,
    config: &Mp2Config,
    i: usize,
) -> Result<Mp2Energy> {
    let occupied_offset = space.n_frozen();
    let virtual_offset = space.n_occupied();

    let mut energy = Mp2Energy::ZERO;
    for (j, a, b) in itertools::iproduct!(
        0..block.n_occupied,
        0..block.n_virtual,
        0..block.n_virtual
    ) {
        let (gi, gj) = (i + occupied_offset, j + occupied_offset);
        let (ga, gb) = (a + virtual_offset, b + virtual_offset);

        let denominator = energies[gi] + energies[gj] - energies[ga] - energies[gb];
        if config.is_degenerate(denominator) {
            return Err(Error::NumericDegeneracy {
                i: gi,
                j: gj,
                a: ga,
                b: gb,
                denominator,
            });
        }

        let iajb = block.get(i, a, j, b);
        let ibja = block.get(i, b, j, a);

        energy.opposite_spin += iajb * iajb / denominator;
        energy.same_spin += iajb * (iajb - ibja) / denominator;
    }

    Ok(energy)
}

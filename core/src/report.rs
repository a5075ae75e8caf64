use serde::Serialize;
use serde_json::{json, Value};

use crate::{
    hf::{HartreeFockEnergy, ScfSummary},
    mp2::Mp2Energy,
};

/// The energies of a finished calculation. Created once and only reported.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct EnergyResult {
    pub hartree_fock: HartreeFockEnergy,
    pub mp2: Mp2Energy,
    /// present if the orbitals were refined before the energies were evaluated
    pub scf: Option<ScfSummary>,
}

impl EnergyResult {
    pub fn hartree_fock_energy(&self) -> f64 {
        self.hartree_fock.total_energy()
    }

    pub fn correlation_energy(&self) -> f64 {
        self.mp2.total()
    }

    /// E_HF + E_MP2
    pub fn total_energy(&self) -> f64 {
        self.hartree_fock_energy() + self.correlation_energy()
    }
}

/// Formats an energy in Hartree with `precision` digits after the decimal
/// point, so every reported energy carries the same absolute accuracy.
/// Non-finite values are spelled out as `NaN`, `Inf` and `-Inf`.
pub fn format_energy(value: f64, precision: usize) -> String {
    if value.is_nan() {
        "NaN".to_owned()
    } else if value.is_infinite() {
        let sign = if value < 0.0 { "-" } else { "" };
        format!("{sign}Inf")
    } else {
        format!("{value:.precision$}")
    }
}

/// Renders `result` as aligned `label = value` lines.
pub fn render_text(result: &EnergyResult, precision: usize) -> String {
    let mut lines = Vec::with_capacity(10);

    if let Some(scf) = result.scf {
        lines.push(format!("scf converged after {} iterations", scf.iterations));
    }

    let energies = [
        ("E_nn", result.hartree_fock.nuclear_repulsion),
        ("E_HF", result.hartree_fock_energy()),
        ("E_MP2 (opposite spin)", result.mp2.opposite_spin),
        ("E_MP2 (same spin)", result.mp2.same_spin),
        ("E_MP2", result.correlation_energy()),
        ("E_SCS-MP2", result.mp2.spin_component_scaled()),
        ("E_total (HF+MP2)", result.total_energy()),
    ];
    for (label, value) in energies {
        lines.push(format!("{label:<22} = {:>22}", format_energy(value, precision)));
    }

    lines.join("\n") + "\n"
}

/// Renders `result` as a JSON document. Values are rounded to `precision`
/// decimals; non-finite values become the strings used by [`format_energy`].
pub fn render_json(result: &EnergyResult, precision: usize) -> serde_json::Result<String> {
    let energy = |value: f64| -> Value {
        let formatted = format_energy(value, precision);
        match formatted.parse::<f64>() {
            Ok(rounded) if value.is_finite() => json!(rounded),
            _ => json!(formatted),
        }
    };

    let document = json!({
        "nuclear_repulsion": energy(result.hartree_fock.nuclear_repulsion),
        "hartree_fock": energy(result.hartree_fock_energy()),
        "mp2": {
            "opposite_spin": energy(result.mp2.opposite_spin),
            "same_spin": energy(result.mp2.same_spin),
            "correlation": energy(result.correlation_energy()),
            "spin_component_scaled": energy(result.mp2.spin_component_scaled()),
        },
        "total": energy(result.total_energy()),
        "scf": result.scf,
    });

    serde_json::to_string_pretty(&document)
}

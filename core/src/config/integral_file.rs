use serde::Deserialize;

use crate::{
    calculation::IntegralData,
    error::{Error, Result},
    integrals::{IntegralIndex, IntegralStore},
    orbitals::{OrbitalEnergies, OrbitalSpace},
};

/// An integral file. The groups follow the layout of TREXIO files, so a TREXIO
/// file dumped to JSON can be read directly.
#[derive(Deserialize)]
pub struct ConfigIntegralFile {
    nucleus: Option<ConfigNucleus>,
    electron: Option<ConfigElectron>,
    mo: Option<ConfigMolecularOrbitals>,
    mo_1e_int: Option<ConfigOneElectron>,
    mo_2e_int: Option<ConfigTwoElectron>,
}

#[derive(Deserialize)]
struct ConfigNucleus {
    repulsion: Option<f64>,
}

#[derive(Deserialize)]
struct ConfigElectron {
    num: Option<i64>,
    up_num: Option<i64>,
    dn_num: Option<i64>,
}

#[derive(Deserialize)]
struct ConfigMolecularOrbitals {
    num: Option<i64>,
    energy: Option<Vec<f64>>,
}

#[derive(Deserialize)]
struct ConfigOneElectron {
    core_hamiltonian: Option<Vec<Vec<f64>>>,
}

#[derive(Deserialize)]
struct ConfigTwoElectron {
    #[serde(default)]
    notation: Notation,
    #[serde(default)]
    eri: Vec<ConfigEri>,
}

/// Index convention of the stored two-electron integrals.
#[derive(Deserialize, Default, Copy, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum Notation {
    /// <pq|rs>, the TREXIO convention
    #[default]
    Physicist,
    /// (pq|rs)
    Chemist,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ConfigEri {
    Entry { index: [i64; 4], value: f64 },
    Tuple(i64, i64, i64, i64, f64),
}

impl ConfigEri {
    fn into_parts(self) -> ([i64; 4], f64) {
        match self {
            Self::Entry { index, value } => (index, value),
            Self::Tuple(p, q, r, s, value) => ([p, q, r, s], value),
        }
    }
}

impl TryFrom<ConfigIntegralFile> for IntegralData {
    type Error = Error;

    fn try_from(value: ConfigIntegralFile) -> Result<Self> {
        let nuclear_repulsion = value
            .nucleus
            .and_then(|nucleus| nucleus.repulsion)
            .ok_or_else(|| missing("nucleus.repulsion"))?;
        if !nuclear_repulsion.is_finite() {
            return Err(Error::DataFormat(format!(
                "nucleus.repulsion is not finite ({nuclear_repulsion})"
            )));
        }

        let n_electrons = electron_count(value.electron.ok_or_else(|| missing("electron"))?)?;

        let mo = value.mo.ok_or_else(|| missing("mo"))?;
        let n_orbitals = mo.num.ok_or_else(|| missing("mo.num"))?;
        if n_orbitals < 0 {
            return Err(Error::DataFormat(format!(
                "mo.num must not be negative, got {n_orbitals}"
            )));
        }

        let space = OrbitalSpace::new(n_orbitals, n_electrons)?;
        let n_orbitals = space.n_orbitals();

        let orbital_energies = match mo.energy {
            Some(energy) if energy.len() != n_orbitals => {
                return Err(Error::DataFormat(format!(
                    "mo.energy has {} entries for {n_orbitals} orbitals",
                    energy.len()
                )))
            }
            Some(energy) => Some(OrbitalEnergies::new(energy)?),
            None => None,
        };

        let mut store = IntegralStore::new(n_orbitals);

        let core_hamiltonian = value
            .mo_1e_int
            .and_then(|one_electron| one_electron.core_hamiltonian)
            .ok_or_else(|| missing("mo_1e_int.core_hamiltonian"))?;
        read_core_hamiltonian(&mut store, core_hamiltonian)?;

        let two_electron = value.mo_2e_int.ok_or_else(|| missing("mo_2e_int"))?;
        read_electron_repulsion(&mut store, two_electron)?;

        log::debug!(
            "read {n_orbitals} orbitals, {} electrons, {} unique two-electron integrals",
            space.n_electrons(),
            store.n_two_electron()
        );

        Ok(Self {
            nuclear_repulsion,
            space,
            store,
            orbital_energies,
        })
    }
}

fn missing(field: &str) -> Error {
    Error::DataFormat(format!("missing required field {field}"))
}

fn electron_count(electron: ConfigElectron) -> Result<i64> {
    let non_negative = |count: i64, field: &str| {
        if count < 0 {
            Err(Error::DataFormat(format!(
                "{field} must not be negative, got {count}"
            )))
        } else {
            Ok(count)
        }
    };

    // a missing spin count is taken to match the other one
    let spin = match (electron.up_num, electron.dn_num) {
        (None, None) => None,
        (up, down) => {
            let up = non_negative(up.or(down).unwrap_or_default(), "electron.up_num")?;
            let down = non_negative(down.unwrap_or(up), "electron.dn_num")?;
            Some((up, down))
        }
    };

    let count = match (electron.num, spin) {
        (Some(num), Some((up, down))) if up.checked_add(down) != Some(num) => {
            return Err(Error::DataFormat(format!(
                "electron.num is {num} but up_num and dn_num are {up} and {down}"
            )))
        }
        (Some(num), _) => non_negative(num, "electron count")?,
        (None, Some((up, down))) => up.checked_add(down).ok_or_else(|| {
            Error::DataFormat(format!("{up} + {down} electrons overflow the electron count"))
        })?,
        (None, None) => return Err(missing("electron.num")),
    };

    if let Some((up, down)) = spin {
        if up != down {
            return Err(Error::Configuration(format!(
                "{up} spin up and {down} spin down electrons do not form a closed shell"
            )));
        }
    }
    Ok(count)
}

fn read_core_hamiltonian(store: &mut IntegralStore, matrix: Vec<Vec<f64>>) -> Result<()> {
    const SYMMETRY_TOLERANCE: f64 = 1e-8;
    let n = store.n_orbitals();

    if matrix.len() != n || matrix.iter().any(|row| row.len() != n) {
        return Err(Error::DataFormat(format!(
            "mo_1e_int.core_hamiltonian must be a {n}x{n} matrix"
        )));
    }

    for p in 0..n {
        for q in p..n {
            if (matrix[p][q] - matrix[q][p]).abs() > SYMMETRY_TOLERANCE {
                log::warn!(
                    "core hamiltonian is not symmetric at ({p}, {q}): {} vs {}",
                    matrix[p][q],
                    matrix[q][p]
                );
            }
            if matrix[p][q] != 0.0 {
                store.set_one_electron(p, q, matrix[p][q])?;
            }
        }
    }

    Ok(())
}

fn read_electron_repulsion(store: &mut IntegralStore, two_electron: ConfigTwoElectron) -> Result<()> {
    const DUPLICATE_TOLERANCE: f64 = 1e-10;
    let n = store.n_orbitals();

    for entry in two_electron.eri {
        let (index, value) = entry.into_parts();

        let mut orbitals = [0usize; 4];
        for (orbital, &raw) in orbitals.iter_mut().zip(&index) {
            *orbital = usize::try_from(raw)
                .ok()
                .filter(|&orbital| orbital < n)
                .ok_or_else(|| {
                    Error::DataFormat(format!(
                        "two-electron index {index:?} out of range for {n} orbitals"
                    ))
                })?;
        }

        let [p, q, r, s] = orbitals;
        let canonical = match two_electron.notation {
            Notation::Physicist => IntegralIndex::from_physicist((p, q, r, s)),
            Notation::Chemist => IntegralIndex::new((p, q, r, s)),
        };

        // files may list several members of a symmetry class; they have to agree
        if let Some(previous) = store.set_two_electron(canonical.indices(), value)? {
            if (previous - value).abs() > DUPLICATE_TOLERANCE {
                return Err(Error::DataFormat(format!(
                    "conflicting values {previous} and {value} for two-electron integral {index:?}"
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::{calculation::IntegralData, error::Error};

    fn load(json: &str) -> Result<IntegralData, Error> {
        IntegralData::from_json_str(json)
    }

    const MINIMAL: &str = r#"{
        "nucleus": { "repulsion": 0.5 },
        "electron": { "num": 2 },
        "mo": { "num": 2, "energy": [-0.5, 0.5] },
        "mo_1e_int": { "core_hamiltonian": [[-1.0, 0.1], [0.1, -0.2]] },
        "mo_2e_int": {
            "eri": [
                { "index": [0, 0, 0, 0], "value": 0.6 },
                [0, 1, 0, 1, 0.55],
                [0, 0, 1, 1, 0.2]
            ]
        }
    }"#;

    #[test]
    fn reads_minimal_file() {
        let data = load(MINIMAL).unwrap();

        assert_eq!(data.nuclear_repulsion, 0.5);
        assert_eq!(data.space.n_occupied(), 1);
        assert_eq!(data.space.n_virtual(), 1);
        assert_eq!(data.store.get_one_electron(1, 0), 0.1);
        assert_eq!(data.orbital_energies.unwrap().as_slice(), &[-0.5, 0.5]);

        // physicist's notation: <01|01> = (00|11), <00|11> = (01|01)
        assert_eq!(data.store.coulomb(0, 1), 0.55);
        assert_eq!(data.store.exchange(0, 1), 0.2);
    }

    #[test]
    fn reads_chemist_notation_and_spin_counts() {
        let json = r#"{
            "nucleus": { "repulsion": 0.0 },
            "electron": { "up_num": 1, "dn_num": 1 },
            "mo": { "num": 2 },
            "mo_1e_int": { "core_hamiltonian": [[-1.0, 0.0], [0.0, -0.2]] },
            "mo_2e_int": { "notation": "chemist", "eri": [[0, 0, 1, 1, 0.55]] }
        }"#;
        let data = load(json).unwrap();

        assert_eq!(data.space.n_electrons(), 2);
        assert_eq!(data.store.coulomb(0, 1), 0.55);
        assert!(data.orbital_energies.is_none());
    }

    #[test]
    fn missing_fields_are_format_errors() {
        for field in ["\"nucleus\"", "\"mo\"", "\"mo_1e_int\"", "\"mo_2e_int\""] {
            let json = MINIMAL.replacen(field, "\"unused\"", 1);
            assert!(
                matches!(load(&json), Err(Error::DataFormat(_))),
                "removing {field} should fail"
            );
        }
        let json = MINIMAL.replace("\"electron\": { \"num\": 2 }", "\"electron\": {}");
        assert!(matches!(load(&json), Err(Error::DataFormat(_))));
    }

    #[test]
    fn negative_counts_are_format_errors() {
        let json = MINIMAL.replace("\"num\": 2 }", "\"num\": -2 }");
        assert!(matches!(load(&json), Err(Error::DataFormat(_))));

        let json = MINIMAL.replace("\"num\": 2, \"energy\"", "\"num\": -2, \"energy\"");
        assert!(matches!(load(&json), Err(Error::DataFormat(_))));
    }

    #[test]
    fn odd_and_open_shell_electron_counts_are_configuration_errors() {
        let json = MINIMAL.replace("\"num\": 2 }", "\"num\": 3 }");
        assert!(matches!(load(&json), Err(Error::Configuration(_))));

        let json = MINIMAL.replace("\"num\": 2 }", "\"up_num\": 2, \"dn_num\": 1 }");
        assert!(matches!(load(&json), Err(Error::Configuration(_))));
    }

    #[test]
    fn spin_counts_are_checked_against_the_total() {
        let json = MINIMAL.replace(
            "\"num\": 2 }",
            "\"num\": 2, \"up_num\": 1, \"dn_num\": 1 }",
        );
        assert_eq!(load(&json).unwrap().space.n_electrons(), 2);

        let json = MINIMAL.replace(
            "\"num\": 2 }",
            "\"num\": 2, \"up_num\": 2, \"dn_num\": 0 }",
        );
        assert!(matches!(load(&json), Err(Error::Configuration(_))));

        let json = MINIMAL.replace(
            "\"num\": 2 }",
            "\"num\": 4, \"up_num\": 1, \"dn_num\": 1 }",
        );
        assert!(matches!(load(&json), Err(Error::DataFormat(_))));

        let json = MINIMAL.replace("\"num\": 2 }", "\"dn_num\": 1 }");
        assert_eq!(load(&json).unwrap().space.n_electrons(), 2);

        let json = MINIMAL.replace("\"num\": 2 }", "\"up_num\": -1, \"dn_num\": -1 }");
        assert!(matches!(load(&json), Err(Error::DataFormat(_))));
    }

    #[test]
    fn huge_orbital_count_is_an_error() {
        let json = MINIMAL.replace(
            "\"num\": 2, \"energy\"",
            "\"num\": 4611686018427387904, \"energy\"",
        );
        assert!(matches!(load(&json), Err(Error::DataFormat(_))));
    }

    #[test]
    fn mismatched_dimensions_are_format_errors() {
        let json = MINIMAL.replace("[[-1.0, 0.1], [0.1, -0.2]]", "[[-1.0, 0.1]]");
        assert!(matches!(load(&json), Err(Error::DataFormat(_))));

        let json = MINIMAL.replace("[-0.5, 0.5]", "[-0.5, 0.5, 1.0]");
        assert!(matches!(load(&json), Err(Error::DataFormat(_))));
    }

    #[test]
    fn out_of_range_and_conflicting_integrals_are_format_errors() {
        let json = MINIMAL.replace("[0, 0, 1, 1, 0.2]", "[0, 0, 2, 1, 0.2]");
        assert!(matches!(load(&json), Err(Error::DataFormat(_))));

        let json = MINIMAL.replace("[0, 0, 1, 1, 0.2]", "[0, 0, -1, 1, 0.2]");
        assert!(matches!(load(&json), Err(Error::DataFormat(_))));

        // <10|10> is the same integral as <01|01>
        let json = MINIMAL.replace("[0, 0, 1, 1, 0.2]", "[1, 0, 1, 0, 0.3]");
        assert!(matches!(load(&json), Err(Error::DataFormat(_))));

        let json = MINIMAL.replace("[0, 0, 1, 1, 0.2]", "[1, 0, 1, 0, 0.55]");
        assert!(load(&json).is_ok());
    }

    #[test]
    fn malformed_json_is_a_format_error() {
        assert!(matches!(load("{ \"nucleus\": "), Err(Error::DataFormat(_))));
        assert!(matches!(
            load(&MINIMAL.replace("0.5 }", "\"half\" }")),
            Err(Error::DataFormat(_))
        ));
    }
}

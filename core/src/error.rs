use thiserror::Error;

/// Everything that can go wrong while loading integrals or evaluating energies.
///
/// All variants are fatal: a failed evaluation produces no energies.
#[derive(Error, Debug)]
pub enum Error {
    /// The integral file is malformed or lacks required fields.
    #[error("malformed integral data: {0}")]
    DataFormat(String),

    /// Orbital and electron counts do not describe a closed-shell system.
    #[error("invalid orbital configuration: {0}")]
    Configuration(String),

    /// The SCF refinement hit its iteration cap.
    #[error("scf did not converge after {iterations} iterations (last energy {last_energy:.10})")]
    Convergence { iterations: usize, last_energy: f64 },

    /// An MP2 denominator is too close to zero to divide by.
    #[error(
        "near-zero mp2 denominator {denominator:e} for orbitals (i={i}, j={j}, a={a}, b={b})"
    )]
    NumericDegeneracy {
        i: usize,
        j: usize,
        a: usize,
        b: usize,
        denominator: f64,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        match value.classify() {
            serde_json::error::Category::Io => Self::Io(value.into()),
            _ => Self::DataFormat(value.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

use mp2_core::{
    compute_energies,
    hf::ScfConfig,
    mp2::Mp2Config,
    report::{render_json, render_text},
    CalculationConfig, IntegralData,
};
use std::{fs, path::PathBuf, time::Instant};

use anyhow::Context;
use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// A JSON file with the molecular orbital integrals
    input: PathBuf,

    /// Refine the supplied orbitals with a closed-shell SCF before evaluating
    /// the energies
    #[arg(long)]
    scf: bool,
    /// The maximum number of iterations the SCF loop should attempt before the
    /// system is considered to not converge
    #[arg(long, default_value_t = 100)]
    max_iterations: usize,
    /// if the energy changes by less than this, the SCF may stop
    #[arg(long, default_value_t = 1e-10)]
    energy_tolerance: f64,
    /// if the rms of the density matrix change drops below this, the SCF may stop
    #[arg(long, default_value_t = 1e-8)]
    density_tolerance: f64,

    /// How many of the lowest occupied orbitals to leave out of MP2
    #[arg(long, default_value_t = 0)]
    frozen_core: usize,
    /// MP2 denominators smaller than this in magnitude are rejected
    #[arg(long, default_value_t = 1e-10)]
    degeneracy_threshold: f64,

    /// Number of digits after the decimal point in the reported energies
    #[arg(long, default_value_t = 10)]
    precision: usize,
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
    /// Write the report here instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

impl Args {
    fn calculation_config(&self) -> CalculationConfig {
        CalculationConfig {
            scf: self.scf.then_some(ScfConfig {
                max_iterations: self.max_iterations,
                energy_tolerance: self.energy_tolerance,
                density_tolerance: self.density_tolerance,
            }),
            mp2: Mp2Config {
                degeneracy_threshold: self.degeneracy_threshold,
            },
            frozen_core: self.frozen_core,
        }
    }
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let args: Args = Args::parse();

    let data = IntegralData::load(&args.input)
        .with_context(|| format!("failed to read integrals from {}", args.input.display()))?;
    log::debug!(
        "{} orbitals, {} electrons, {} two electron integrals",
        data.space.n_orbitals(),
        data.space.n_electrons(),
        data.store.n_two_electron()
    );

    let start = Instant::now();
    let result =
        compute_energies(&data, &args.calculation_config()).context("energy evaluation failed")?;
    log::info!("energies evaluated in {:0.2?}", start.elapsed());

    let report = match args.format {
        Format::Text => render_text(&result, args.precision),
        Format::Json => render_json(&result, args.precision)? + "\n",
    };

    match args.output {
        Some(path) => fs::write(&path, report)
            .with_context(|| format!("failed to write report to {}", path.display()))?,
        None => print!("{report}"),
    }

    Ok(())
}

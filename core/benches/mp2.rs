use mp2_core::{
    hf::{restricted_hartree_fock, ScfConfig},
    mp2::{mp2_energy, Mp2Config},
    orbitals::OrbitalEnergies,
    testing::model_system,
    IntegralData,
};
use std::error::Error;

use criterion::{criterion_group, criterion_main, Criterion};

fn bench_mp2(c: &mut Criterion, systems: &[(&str, &IntegralData)]) -> Result<(), Box<dyn Error>> {
    for (name, data) in systems {
        let energies = OrbitalEnergies::from_fock_diagonal(&data.store, &data.space);

        c.bench_function(&format!("MP2 {name}"), |b| {
            b.iter(|| mp2_energy(&data.store, &data.space, &energies, &Mp2Config::default()))
        });
    }

    Ok(())
}

fn bench_scf(c: &mut Criterion, systems: &[(&str, &IntegralData)]) -> Result<(), Box<dyn Error>> {
    for (name, data) in systems {
        c.bench_function(&format!("SCF {name}"), |b| {
            b.iter(|| {
                restricted_hartree_fock(
                    &data.store,
                    &data.space,
                    data.nuclear_repulsion,
                    &ScfConfig::default(),
                )
            })
        });
    }

    Ok(())
}

fn bench_energies(c: &mut Criterion) -> Result<(), Box<dyn Error>> {
    let small = model_system(8, 4)?;
    let medium = model_system(16, 8)?;
    let large = model_system(32, 12)?;

    bench_mp2(
        c,
        &[("8/4", &small), ("16/8", &medium), ("32/12", &large)],
    )?;
    bench_scf(c, &[("8/4", &small), ("16/8", &medium)])?;

    Ok(())
}

fn benches(c: &mut Criterion) {
    if let Err(error) = bench_energies(c) {
        panic!("benchmark setup failed: {error}");
    }
}

criterion_group!(mp2, benches);
criterion_main!(mp2);

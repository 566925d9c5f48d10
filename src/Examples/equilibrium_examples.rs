use crate::Thermodynamics::ChemEquilibrium::VcsProblem::{UnitsFormat, VcsProblem};
use crate::Thermodynamics::ChemEquilibrium::VcsSolver::VcsSolver;
use crate::Thermodynamics::Phases::IdealGasPhase::IdealGasPhase;
use crate::Thermodynamics::Phases::IdealSolutionPhase::IdealSolutionPhase;
use crate::Thermodynamics::Phases::IonsFromNeutral::{IonSolnType, IonsFromNeutralPhase};
use crate::Thermodynamics::Phases::PhaseCore::Species;
use crate::Thermodynamics::Phases::StoichSubstance::StoichSubstance;
use crate::Thermodynamics::Phases::phase_api::{PhaseModel, ThermoPhaseTrait};
use crate::Thermodynamics::SpeciesThermo::SpeciesThermo;
use crate::Thermodynamics::constants::ONE_ATM;
use log::error;
use prettytable::{Table, row};
use std::error::Error;

fn print_result(prob: &VcsProblem) {
    let mut table = Table::new();
    table.add_row(row!["species", "phase", "moles, kmol", "mole fraction", "mu"]);
    for k in 0..prob.nspecies {
        table.add_row(row![
            prob.sp_name[k],
            prob.phase_id[k],
            format!("{:.6e}", prob.w[k]),
            format!("{:.6e}", prob.mf[k]),
            format!("{:.4}", prob.gibbs_species[k])
        ]);
    }
    table.printstd();
    println!(
        "{} iterations, {} basis optimizations, chemical potentials {}",
        prob.iterations,
        prob.num_basis_optimizations,
        prob.units.label()
    );
}

fn hydrogen_dissociation() -> Result<(), Box<dyn Error>> {
    let species = vec![
        Species::new(
            "H2",
            &[("H", 2.0)],
            SpeciesThermo::ConstCp { t0: 298.15, h0: 0.0, s0: 1.3068e5, cp0: 2.88e4 },
        ),
        Species::new(
            "H",
            &[("H", 1.0)],
            SpeciesThermo::ConstCp { t0: 298.15, h0: 2.1800e8, s0: 1.1472e5, cp0: 2.079e4 },
        ),
    ];
    let mut gas: PhaseModel = IdealGasPhase::new("gas", species)?.into();
    for T in [2000.0, 3000.0, 4000.0] {
        gas.set_state_TP(T, ONE_ATM);
        let mut prob = VcsProblem::from_phases(vec![gas.clone()], &[1.0, 0.0])?;
        let mut solver = VcsSolver::new();
        solver.solve(&mut prob)?;
        println!("\nT = {} K: x_H = {:.4e}", T, prob.mf[1]);
        print_result(&prob);
    }
    Ok(())
}

/// graphite appears when the oxygen is not enough to burn all carbon to CO
fn carbon_with_limited_oxygen() -> Result<(), Box<dyn Error>> {
    let gas: PhaseModel = IdealGasPhase::new(
        "gas",
        vec![
            Species::new("CO", &[("C", 1.0), ("O", 1.0)], SpeciesThermo::constant_mu0(-3.0e8)),
            Species::new("CO2", &[("C", 1.0), ("O", 2.0)], SpeciesThermo::constant_mu0(-4.0e8)),
            Species::new("O2", &[("O", 2.0)], SpeciesThermo::constant_mu0(0.0)),
        ],
    )?
    .into();
    let graphite: PhaseModel = StoichSubstance::new(
        "graphite",
        Species::new("C(gr)", &[("C", 1.0)], SpeciesThermo::constant_mu0(0.0))
            .with_molar_volume(0.0053),
    )?
    .into();
    let mut prob = VcsProblem::from_phases(vec![gas, graphite], &[0.0, 0.0, 0.4, 1.0])?;
    prob.set_state_TP(1500.0, ONE_ATM)?;
    prob.units = UnitsFormat::KJMol;
    println!("{}", prob.prob_report()?);
    let mut solver = VcsSolver::new();
    solver.solve(&mut prob)?;
    print_result(&prob);
    let path = std::env::temp_dir().join("vcs_carbon_oxygen.csv");
    prob.report_csv(&path)?;
    println!("csv report written to {}", path.display());
    Ok(())
}

/// LiCl-KCl melt described through its ions
fn molten_salt() -> Result<(), Box<dyn Error>> {
    let neutral: PhaseModel = IdealSolutionPhase::new(
        "LiKCl_neutral",
        vec![
            Species::new("LiCl", &[("Li", 1.0), ("Cl", 1.0)], SpeciesThermo::constant_mu0(-3.8e8))
                .with_molar_volume(0.0203),
            Species::new("KCl", &[("K", 1.0), ("Cl", 1.0)], SpeciesThermo::constant_mu0(-4.1e8))
                .with_molar_volume(0.0375),
        ],
    )?
    .into();
    let ions = vec![
        Species::new("Li+", &[("Li", 1.0), ("E", -1.0)], SpeciesThermo::constant_mu0(0.0))
            .with_charge(1.0),
        Species::new("K+", &[("K", 1.0), ("E", -1.0)], SpeciesThermo::constant_mu0(0.0))
            .with_charge(1.0),
        Species::new("Cl-", &[("Cl", 1.0), ("E", 1.0)], SpeciesThermo::constant_mu0(0.0))
            .with_charge(-1.0),
    ];
    let mut melt = IonsFromNeutralPhase::new("LiKCl", ions, neutral, IonSolnType::SingleAnion)?;
    melt.set_neutral_mole_fractions(&[0.59, 0.41])?;
    let mut melt: PhaseModel = melt.into();
    melt.set_state_TP(773.15, ONE_ATM);
    let x = melt.mole_fractions().to_vec();
    let mu = melt.get_chem_potentials();
    let mut table = Table::new();
    table.add_row(row!["ion", "x", "mu, J/kmol"]);
    for k in 0..melt.n_species() {
        table.add_row(row![
            melt.species_name(k),
            format!("{:.4}", x[k]),
            format!("{:.6e}", mu[k])
        ]);
    }
    table.printstd();
    Ok(())
}

pub fn equilibrium_examples(task: usize) {
    let result = match task {
        0 => hydrogen_dissociation(),
        1 => carbon_with_limited_oxygen(),
        2 => molten_salt(),
        _ => {
            println!("no equilibrium example number {}", task);
            Ok(())
        }
    };
    if let Err(e) = result {
        error!("equilibrium example {} failed: {}", task, e);
    }
}

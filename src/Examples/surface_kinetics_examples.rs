use crate::Kinetics::ImplicitSurfChem::SteadyStateMode;
use crate::Kinetics::InterfaceKinetics::{InterfaceKinetics, InterfaceReaction};
use crate::Kinetics::RateCoeff::SurfaceArrhenius;
use crate::Thermodynamics::Phases::IdealGasPhase::IdealGasPhase;
use crate::Thermodynamics::Phases::IdealSolutionPhase::IdealSolutionPhase;
use crate::Thermodynamics::Phases::PhaseCore::Species;
use crate::Thermodynamics::Phases::StoichSubstance::StoichSubstance;
use crate::Thermodynamics::Phases::SurfPhase::SurfPhase;
use crate::Thermodynamics::Phases::phase_api::{PhaseModel, ThermoPhaseTrait};
use crate::Thermodynamics::SpeciesThermo::SpeciesThermo;
use crate::Thermodynamics::constants::{FARADAY, ONE_ATM};
use crate::Utils::load_from_file::load_task;
use log::{error, info};
use prettytable::{Table, row};
use std::error::Error;
use std::io::Write;

const SITE_DENSITY: f64 = 2.7063e-8;

fn co_adsorption_transient() -> Result<(), Box<dyn Error>> {
    let T = 500.0;
    let mut gas: PhaseModel = IdealGasPhase::new(
        "gas",
        vec![Species::new("CO", &[("C", 1.0), ("O", 1.0)], SpeciesThermo::constant_mu0(0.0))],
    )?
    .into();
    gas.set_state_TP(T, ONE_ATM);
    let mut surf: PhaseModel = SurfPhase::new(
        "Pt_surf",
        vec![
            Species::new("PT(S)", &[("Pt", 1.0)], SpeciesThermo::constant_mu0(0.0)),
            Species::new(
                "CO(S)",
                &[("Pt", 1.0), ("C", 1.0), ("O", 1.0)],
                SpeciesThermo::constant_mu0(-5.0e7),
            ),
        ],
        SITE_DENSITY,
    )?
    .into();
    surf.set_state_TP(T, ONE_ATM);
    surf.set_coverages(&[1.0, 0.0])?;

    let mut kin = InterfaceKinetics::interface();
    kin.add_phase(gas)?;
    kin.add_phase(surf)?;
    kin.init();
    kin.add_reaction(InterfaceReaction::new(
        "CO + PT(S) <=> CO(S)",
        vec![(0, 1.0), (1, 1.0)],
        vec![(2, 1.0)],
        SurfaceArrhenius::new(1.0e4, 0.0, 0.0),
    ))?;
    kin.finalize()?;

    let mut table = Table::new();
    table.add_row(row!["t, s", "theta PT(S)", "theta CO(S)", "wdot CO(S), kmol/m2/s"]);
    let mut t = 0.0;
    for t_end in [1.0e-6, 1.0e-5, 1.0e-4, 1.0e-3, 1.0e-2, 1.0e-1] {
        kin.advance_coverages(t_end - t)?;
        t = t_end;
        let theta = kin.thermo(1).coverages().ok_or("Pt_surf is not a surface phase")?;
        let wdot = kin.get_net_production_rates()?;
        table.add_row(row![
            format!("{:.1e}", t),
            format!("{:.6}", theta[0]),
            format!("{:.6}", theta[1]),
            format!("{:.4e}", wdot[2])
        ]);
    }
    table.printstd();
    if let Some(integrator) = kin.integrator() {
        println!(
            "{} steps, {} jacobian evaluations",
            integrator.n_steps, integrator.n_jacobians
        );
    }
    Ok(())
}

/// Langmuir-Hinshelwood CO oxidation on Pt driven to the pseudo steady state
fn co_oxidation_steady_state() -> Result<(), Box<dyn Error>> {
    let T = 600.0;
    let mut gas: PhaseModel = IdealGasPhase::new(
        "gas",
        vec![
            Species::new("CO", &[("C", 1.0), ("O", 1.0)], SpeciesThermo::constant_mu0(-1.5e8)),
            Species::new("O2", &[("O", 2.0)], SpeciesThermo::constant_mu0(-1.2e8)),
            Species::new("CO2", &[("C", 1.0), ("O", 2.0)], SpeciesThermo::constant_mu0(-5.2e8)),
        ],
    )?
    .into();
    gas.set_state_TP(T, ONE_ATM);
    gas.set_mole_fractions(&[0.02, 0.1, 0.88])?;
    let mut surf: PhaseModel = SurfPhase::new(
        "Pt_surf",
        vec![
            Species::new("PT(S)", &[("Pt", 1.0)], SpeciesThermo::constant_mu0(0.0)),
            Species::new(
                "CO(S)",
                &[("Pt", 1.0), ("C", 1.0), ("O", 1.0)],
                SpeciesThermo::constant_mu0(-2.0e8),
            ),
            Species::new("O(S)", &[("Pt", 1.0), ("O", 1.0)], SpeciesThermo::constant_mu0(-1.5e8)),
        ],
        SITE_DENSITY,
    )?
    .into();
    surf.set_state_TP(T, ONE_ATM);
    surf.set_coverages(&[0.5, 0.25, 0.25])?;

    let mut kin = InterfaceKinetics::interface();
    kin.add_phase(gas)?;
    kin.add_phase(surf)?;
    kin.init();
    // kinetics species: CO 0, O2 1, CO2 2, PT(S) 3, CO(S) 4, O(S) 5
    kin.add_reaction(InterfaceReaction::new(
        "CO + PT(S) <=> CO(S)",
        vec![(0, 1.0), (3, 1.0)],
        vec![(4, 1.0)],
        SurfaceArrhenius::new(1.0e5, 0.0, 0.0),
    ))?;
    kin.add_reaction(
        InterfaceReaction::new(
            "O2 + 2 PT(S) => 2 O(S)",
            vec![(1, 1.0), (3, 2.0)],
            vec![(5, 2.0)],
            SurfaceArrhenius::new(1.0e12, 0.0, 0.0),
        )
        .irreversible(),
    )?;
    kin.add_reaction(
        InterfaceReaction::new(
            "CO(S) + O(S) => CO2 + 2 PT(S)",
            vec![(4, 1.0), (5, 1.0)],
            vec![(2, 1.0), (3, 2.0)],
            SurfaceArrhenius::new(3.7e20, 0.0, 1.1e8),
        )
        .irreversible(),
    )?;
    kin.finalize()?;

    kin.solve_pseudo_steady_state(SteadyStateMode::TransientInitialization, -1.0)?;
    let theta = kin.thermo(1).coverages().ok_or("Pt_surf is not a surface phase")?;
    let wdot = kin.get_net_production_rates()?;
    let mut table = Table::new();
    table.add_row(row!["species", "coverage", "wdot, kmol/m2/s"]);
    for (j, name) in ["PT(S)", "CO(S)", "O(S)"].iter().enumerate() {
        table.add_row(row![
            name,
            format!("{:.6e}", theta[j]),
            format!("{:.3e}", wdot[3 + j])
        ]);
    }
    table.printstd();
    println!("CO2 production rate: {:.4e} kmol/m2/s", wdot[2]);
    println!("{}", kin.check_partial_equil()?);
    Ok(())
}

/// current-overpotential curve of H+ + E- + PT(S) <=> H(S) on a Pt electrode
fn hydrogen_electrode_sweep() -> Result<(), Box<dyn Error>> {
    let T = 298.15;
    let mut metal: PhaseModel = StoichSubstance::new(
        "metal",
        Species::new("E-", &[("E", 1.0)], SpeciesThermo::constant_mu0(0.0)).with_charge(-1.0),
    )?
    .into();
    let mut electrolyte: PhaseModel = IdealSolutionPhase::new(
        "electrolyte",
        vec![
            Species::new("H2O", &[("H", 2.0), ("O", 1.0)], SpeciesThermo::constant_mu0(0.0)),
            Species::new("H+", &[("H", 1.0), ("E", -1.0)], SpeciesThermo::constant_mu0(0.0))
                .with_charge(1.0),
        ],
    )?
    .into();
    electrolyte.set_mole_fractions(&[0.9, 0.1])?;
    let mut surf: PhaseModel = SurfPhase::new(
        "Pt_surf",
        vec![
            Species::new("PT(S)", &[("Pt", 1.0)], SpeciesThermo::constant_mu0(0.0)),
            Species::new("H(S)", &[("Pt", 1.0), ("H", 1.0)], SpeciesThermo::constant_mu0(-2.0e7)),
        ],
        SITE_DENSITY,
    )?
    .into();
    for p in [&mut metal, &mut electrolyte, &mut surf] {
        p.set_state_TP(T, ONE_ATM);
    }
    surf.set_coverages(&[0.5, 0.5])?;

    let mut kin = InterfaceKinetics::interface();
    kin.add_phase(metal)?;
    kin.add_phase(electrolyte)?;
    kin.add_phase(surf)?;
    kin.init();
    kin.add_reaction(
        InterfaceReaction::new(
            "H+ + E- + PT(S) <=> H(S)",
            vec![(2, 1.0), (0, 1.0), (3, 1.0)],
            vec![(4, 1.0)],
            SurfaceArrhenius::new(1.0e5, 0.0, 0.0),
        )
        .with_beta(0.5),
    )?;
    kin.finalize()?;

    let i0 = kin.get_exchange_current_densities()?;
    println!("exchange current density: {:.4e} A/m2", i0[0]);
    let mut table = Table::new();
    table.add_row(row!["phi metal, V", "net ROP, kmol/m2/s", "current, A/m2"]);
    for step in 0..=8 {
        let phi = -0.2 + 0.05 * step as f64;
        kin.set_electric_potential(0, phi)?;
        let rop = kin.get_net_rates_of_progress()?;
        // one electron leaves the metal per forward event
        let current = -FARADAY * rop[0];
        table.add_row(row![
            format!("{:.2}", phi),
            format!("{:.4e}", rop[0]),
            format!("{:.4e}", current)
        ]);
    }
    table.printstd();
    Ok(())
}

const TASK_FILE: &str = r#"CONDITIONS
{"T": 600.0, "P": 101325.0}
PHASES
[
  {"name": "gas", "model": "IdealGas",
   "species": [
     {"name": "CO", "composition": {"C": 1.0, "O": 1.0},
      "thermo": {"model": "ConstCp", "t0": 298.15, "h0": -1.1e8, "s0": 1.97e5, "cp0": 2.9e4}},
     {"name": "O2", "composition": {"O": 2.0},
      "thermo": {"model": "ConstCp", "t0": 298.15, "h0": 0.0, "s0": 2.05e5, "cp0": 2.9e4}}
   ],
   "composition": [0.5, 0.5]},
  {"name": "Pt_surf", "model": "Surface", "site_density": 2.7063e-8,
   "species": [
     {"name": "PT(S)", "composition": {"Pt": 1.0},
      "thermo": {"model": "ConstCp", "t0": 298.15, "h0": 0.0, "s0": 0.0, "cp0": 0.0}},
     {"name": "CO(S)", "composition": {"Pt": 1.0, "C": 1.0, "O": 1.0},
      "thermo": {"model": "ConstCp", "t0": 298.15, "h0": -2.0e8, "s0": 0.0, "cp0": 0.0}}
   ],
   "composition": [0.8, 0.2]}
]
KINETICS
{"kind": "Interface",
 "reactions": [
   {"equation": "CO + PT(S) <=> CO(S)", "reactants": {"CO": 1.0, "PT(S)": 1.0},
    "products": {"CO(S)": 1.0}, "A": 1.0e8,
    "coverage": [{"species": "CO(S)", "E": -1.5e7}]}
 ],
 "advance_time": 1.0e-3,
 "steady_state": "Newton"}
"#;

/// the same workflow as the command line: a task file is loaded and run
fn task_from_file() -> Result<(), Box<dyn Error>> {
    let path = std::env::temp_dir().join("surface_task_example.txt");
    {
        let mut file = std::fs::File::create(&path)?;
        file.write_all(TASK_FILE.as_bytes())?;
    }
    let file_name = path.to_string_lossy().to_string();
    let task = load_task(&file_name)?;
    let outcome = task.run()?;
    if let Some(mut kin) = outcome.kinetics {
        let theta = kin.thermo(1).coverages().ok_or("Pt_surf is not a surface phase")?;
        let rop = kin.get_net_rates_of_progress()?;
        info!("task '{}' finished", file_name);
        println!("coverages: {:?}", theta);
        println!("net rate of progress: {:.4e}", rop[0]);
    }
    Ok(())
}

pub fn surface_kinetics_examples(task: usize) {
    let result = match task {
        0 => co_adsorption_transient(),
        1 => co_oxidation_steady_state(),
        2 => hydrogen_electrode_sweep(),
        3 => task_from_file(),
        _ => {
            println!("no surface kinetics example number {}", task);
            Ok(())
        }
    };
    if let Err(e) = result {
        error!("surface kinetics example {} failed: {}", task, e);
    }
}

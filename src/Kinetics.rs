/// rate coefficients of surface reactions: modified Arrhenius with coverage dependent terms
pub mod RateCoeff;
/// reactant and product bookkeeping: concentration products, reaction deltas, production rates
pub mod StoichManager;
/// eng
/// Heterogeneous kinetics on a surface (interface kinetics) or on the line where three phases
/// meet (edge kinetics). The object owns the bulk phases and the surface phase, computes rates of
/// progress with mass action kinetics, equilibrium constants from the thermodynamics of the
/// phases, Butler-Volmer corrections of charge transfer reactions and gating of reactions by
/// the existence of phases.
/// # Examples
/// ```
/// use VCSKinetics::Kinetics::InterfaceKinetics::{InterfaceKinetics, InterfaceReaction};
/// use VCSKinetics::Kinetics::RateCoeff::SurfaceArrhenius;
/// use VCSKinetics::Thermodynamics::Phases::IdealGasPhase::IdealGasPhase;
/// use VCSKinetics::Thermodynamics::Phases::SurfPhase::SurfPhase;
/// use VCSKinetics::Thermodynamics::Phases::PhaseCore::Species;
/// use VCSKinetics::Thermodynamics::Phases::phase_api::ThermoPhaseTrait;
/// use VCSKinetics::Thermodynamics::SpeciesThermo::SpeciesThermo;
/// let gas = IdealGasPhase::new("gas", vec![
///     Species::new("CO", &[("C", 1.0), ("O", 1.0)], SpeciesThermo::constant_mu0(0.0)),
/// ]).unwrap();
/// let surf = SurfPhase::new("surf", vec![
///     Species::new("PT(S)", &[("Pt", 1.0)], SpeciesThermo::constant_mu0(0.0)),
///     Species::new("CO(S)", &[("Pt", 1.0), ("C", 1.0), ("O", 1.0)], SpeciesThermo::constant_mu0(-5.0e7)),
/// ], 2.7e-8).unwrap();
/// let mut kin = InterfaceKinetics::interface();
/// kin.add_phase(gas.into()).unwrap();
/// kin.add_phase(surf.into()).unwrap();
/// kin.init();
/// kin.thermo_mut(1).set_coverages(&[1.0, 0.0]).unwrap();
/// let rxn = InterfaceReaction::new("CO + PT(S) <=> CO(S)", vec![(0, 1.0), (1, 1.0)], vec![(2, 1.0)],
///     SurfaceArrhenius::new(1.0e3, 0.0, 0.0));
/// kin.add_reaction(rxn).unwrap();
/// kin.finalize().unwrap();
/// let wdot = kin.get_net_production_rates().unwrap();
/// assert!(wdot[2] > 0.0);
/// assert!((wdot[0] + wdot[2]).abs() < 1e-12 * wdot[2].abs());
/// ```
pub mod InterfaceKinetics;
/// implicit integration of the surface coverages and the pseudo steady state solver
pub mod ImplicitSurfChem;
mod InterfaceKinetics_tests;

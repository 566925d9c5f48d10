/// species data and state shared by all phase models
pub mod PhaseCore;
/// capability trait of a phase and the enum of phase models dispatched over it
/// # Examples
/// ```
/// use VCSKinetics::Thermodynamics::Phases::IdealGasPhase::IdealGasPhase;
/// use VCSKinetics::Thermodynamics::Phases::PhaseCore::Species;
/// use VCSKinetics::Thermodynamics::Phases::phase_api::{PhaseModel, ThermoPhaseTrait};
/// use VCSKinetics::Thermodynamics::SpeciesThermo::SpeciesThermo;
/// let species = vec![
///     Species::new("H2", &[("H", 2.0)], SpeciesThermo::constant_mu0(0.0)),
///     Species::new("H", &[("H", 1.0)], SpeciesThermo::constant_mu0(2.0e8)),
/// ];
/// let mut gas: PhaseModel = IdealGasPhase::new("gas", species).unwrap().into();
/// gas.set_state_TP(1000.0, 101325.0);
/// gas.set_mole_fractions(&[0.9, 0.1]).unwrap();
/// let mu = gas.get_chem_potentials();
/// assert!(mu[1] > mu[0]);
/// ```
pub mod phase_api;
pub mod IdealGasPhase;
pub mod IdealSolutionPhase;
/// molten salts and other ionic solutions derived from a neutral molecule phase
pub mod IonsFromNeutral;
pub mod StoichSubstance;
pub mod SurfPhase;
mod Phases_tests;

/// statement of a multiphase equilibrium problem: species, element constraints, phases, targets
pub mod VcsProblem;
/// equilibrium-side bookkeeping of a single phase
pub mod VolPhase;
/// per species record used by the solver
pub mod SpeciesProperties;
/// Gibbs energy minimisation under element balance
/// # Examples
/// ```
/// use VCSKinetics::Thermodynamics::ChemEquilibrium::VcsProblem::VcsProblem;
/// use VCSKinetics::Thermodynamics::ChemEquilibrium::VcsSolver::VcsSolver;
/// use VCSKinetics::Thermodynamics::Phases::IdealGasPhase::IdealGasPhase;
/// use VCSKinetics::Thermodynamics::Phases::PhaseCore::Species;
/// use VCSKinetics::Thermodynamics::SpeciesThermo::SpeciesThermo;
/// let species = vec![
///     Species::new("H2", &[("H", 2.0)], SpeciesThermo::constant_mu0(0.0)),
///     Species::new("H", &[("H", 1.0)], SpeciesThermo::constant_mu0(5.0e7)),
/// ];
/// let gas = IdealGasPhase::new("gas", species).unwrap();
/// let mut problem = VcsProblem::from_phases(vec![gas.into()], &[1.0, 0.0]).unwrap();
/// let mut solver = VcsSolver::new();
/// solver.solve(&mut problem).unwrap();
/// let h_atoms = 2.0 * problem.w[0] + problem.w[1];
/// assert!((h_atoms - 2.0).abs() < 1e-8);
/// ```
pub mod VcsSolver;
/// problem statement tables and the CSV equilibrium report
pub mod VcsReport;

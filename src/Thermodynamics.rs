/// physical constants and unit factors shared by thermodynamics and kinetics
pub mod constants;
/// element table with atomic weights, in the order an owner adds them
pub mod Elements;
/// reference state thermodynamics of single species (constant, NASA7, Shomate)
pub mod SpeciesThermo;
/// thermodynamic phase models: ideal gas, ideal solution, stoichiometric, surface, ionic
pub mod Phases;
/// multiphase chemical equilibrium: problem statement, solver, reports
pub mod ChemEquilibrium;

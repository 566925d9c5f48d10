/// multiphase equilibrium: gas dissociation, gas with a condensed phase, an ionic melt
pub mod equilibrium_examples;
/// interface kinetics: coverage transient, pseudo steady state, electrode sweep, task file
pub mod surface_kinetics_examples;

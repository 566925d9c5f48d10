//! The phase capability interface and the enum of phase models it is dispatched over.
//!
//! Every model owns a [`PhaseCore`] and implements the model specific parts: standard
//! chemical potentials, chemical potentials and standard concentrations. Everything else has a
//! default implementation built on those. All molar quantities are per kmol.
use crate::Thermodynamics::Phases::IdealGasPhase::IdealGasPhase;
use crate::Thermodynamics::Phases::IdealSolutionPhase::IdealSolutionPhase;
use crate::Thermodynamics::Phases::IonsFromNeutral::IonsFromNeutralPhase;
use crate::Thermodynamics::Phases::PhaseCore::{PhaseCore, PhaseError};
use crate::Thermodynamics::Phases::StoichSubstance::StoichSubstance;
use crate::Thermodynamics::Phases::SurfPhase::SurfPhase;
use crate::Thermodynamics::constants::{FARADAY, GAS_CONSTANT};
use enum_dispatch::enum_dispatch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseKind {
    Gas,
    Condensed,
    SingleSpecies,
    Surface,
}

/// concentration scale the activities refer to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityConvention {
    Molar,
    Molality,
}

#[enum_dispatch]
pub trait ThermoPhaseTrait {
    fn core(&self) -> &PhaseCore;
    fn core_mut(&mut self) -> &mut PhaseCore;
    fn phase_kind(&self) -> PhaseKind;
    /// short name of the equation of state, used in reports
    fn eos_name(&self) -> &'static str;
    /// standard state chemical potentials at the current T and P, J/kmol
    fn get_standard_chem_potentials(&self) -> Vec<f64>;
    /// chemical potentials at the current T, P and composition, J/kmol
    fn get_chem_potentials(&self) -> Vec<f64>;
    /// concentration that makes the activity concentration of species k equal to its activity, kmol/m^n
    fn standard_concentration(&self, k: usize) -> f64;

    fn name(&self) -> &str {
        &self.core().name
    }
    fn n_species(&self) -> usize {
        self.core().species.len()
    }
    fn species_name(&self, k: usize) -> &str {
        &self.core().species[k].name
    }
    fn species_index(&self, name: &str) -> Option<usize> {
        self.core().species.iter().position(|s| s.name == name)
    }
    fn n_elements(&self) -> usize {
        self.core().elements.n_elements()
    }
    fn element_names(&self) -> &[String] {
        self.core().elements.element_names()
    }
    /// atoms of element m in species k
    fn n_atoms(&self, k: usize, m: usize) -> f64 {
        self.core().formula_matrix[(m, k)]
    }
    fn charge(&self, k: usize) -> f64 {
        self.core().species[k].charge
    }
    fn molecular_weight(&self, k: usize) -> f64 {
        self.core().molecular_weights[k]
    }
    /// spatial dimension of the phase: 3 for bulk, 2 for surfaces, 1 for edges
    fn n_dim(&self) -> usize {
        3
    }
    fn activity_convention(&self) -> ActivityConvention {
        ActivityConvention::Molar
    }
    fn temperature(&self) -> f64 {
        self.core().T
    }
    fn pressure(&self) -> f64 {
        self.core().P
    }
    fn set_state_TP(&mut self, T: f64, P: f64) {
        let core = self.core_mut();
        core.T = T;
        core.P = P;
    }
    fn mole_fractions(&self) -> &[f64] {
        &self.core().x
    }
    fn set_mole_fractions(&mut self, x: &[f64]) -> Result<(), PhaseError> {
        self.core_mut().set_mole_fractions(x)
    }
    fn electric_potential(&self) -> f64 {
        self.core().phi
    }
    fn set_electric_potential(&mut self, phi: f64) {
        self.core_mut().phi = phi;
    }
    fn RT(&self) -> f64 {
        GAS_CONSTANT * self.core().T
    }
    /// Gibbs energies of the pure species at T and the reference pressure, J/kmol
    fn get_gibbs_ref(&self) -> Vec<f64> {
        let T = self.temperature();
        self.core()
            .species
            .iter()
            .map(|s| s.thermo.g_RT(T) * GAS_CONSTANT * T)
            .collect()
    }
    /// standard state h/RT at the current T and P
    fn get_enthalpy_RT(&self) -> Vec<f64> {
        let T = self.temperature();
        self.core().species.iter().map(|s| s.thermo.h_RT(T)).collect()
    }
    /// standard state s/R at the current T and P
    fn get_entropy_R(&self) -> Vec<f64> {
        let T = self.temperature();
        self.core().species.iter().map(|s| s.thermo.s_R(T)).collect()
    }
    fn get_standard_volumes(&self) -> Vec<f64> {
        self.core().species.iter().map(|s| s.molar_volume).collect()
    }
    fn get_activity_coefficients(&self) -> Vec<f64> {
        vec![1.0; self.n_species()]
    }
    fn get_ln_activity_coefficients(&self) -> Vec<f64> {
        self.get_activity_coefficients()
            .iter()
            .map(|g| g.ln())
            .collect()
    }
    fn get_activities(&self) -> Vec<f64> {
        let RT = self.RT();
        let mu0 = self.get_standard_chem_potentials();
        self.get_chem_potentials()
            .iter()
            .zip(&mu0)
            .map(|(mu, mu0)| ((mu - mu0) / RT).exp())
            .collect()
    }
    fn log_standard_conc(&self, k: usize) -> f64 {
        self.standard_concentration(k).ln()
    }
    /// activity times standard concentration; these are the concentrations used in mass action rate laws
    fn get_activity_concentrations(&self) -> Vec<f64> {
        self.get_activities()
            .iter()
            .enumerate()
            .map(|(k, a)| a * self.standard_concentration(k))
            .collect()
    }
    /// chemical potentials plus z F phi
    fn get_electrochem_potentials(&self) -> Vec<f64> {
        let phi = self.electric_potential();
        let mut mu = self.get_chem_potentials();
        for (k, m) in mu.iter_mut().enumerate() {
            *m += self.charge(k) * FARADAY * phi;
        }
        mu
    }
    fn get_partial_molar_enthalpies(&self) -> Vec<f64> {
        let RT = self.RT();
        self.get_enthalpy_RT().iter().map(|h| h * RT).collect()
    }
    fn get_partial_molar_entropies(&self) -> Vec<f64> {
        let x = self.mole_fractions();
        self.get_entropy_R()
            .iter()
            .zip(x)
            .map(|(s, x)| GAS_CONSTANT * (s - x.max(XX_SMALL).ln()))
            .collect()
    }
    fn get_partial_molar_volumes(&self) -> Vec<f64> {
        self.get_standard_volumes()
    }
}

/// floor applied to mole fractions in entropy expressions
pub const XX_SMALL: f64 = 1.0e-150;

#[enum_dispatch(ThermoPhaseTrait)]
#[derive(Debug, Clone)]
pub enum PhaseModel {
    IdealGas(IdealGasPhase),
    IdealSolution(IdealSolutionPhase),
    StoichSubstance(StoichSubstance),
    Surface(SurfPhase),
    IonsFromNeutral(IonsFromNeutralPhase),
}

impl PhaseModel {
    /// coverages for surface and edge phases, None for bulk phases
    pub fn coverages(&self) -> Option<Vec<f64>> {
        match self {
            PhaseModel::Surface(s) => Some(s.get_coverages()),
            _ => None,
        }
    }

    pub fn set_coverages(&mut self, theta: &[f64]) -> Result<(), PhaseError> {
        match self {
            PhaseModel::Surface(s) => s.set_coverages(theta),
            _ => Err(PhaseError::InvalidConfiguration(format!(
                "phase {} is not a surface phase",
                self.name()
            ))),
        }
    }

    pub fn set_coverages_no_norm(&mut self, theta: &[f64]) -> Result<(), PhaseError> {
        match self {
            PhaseModel::Surface(s) => s.set_coverages_no_norm(theta),
            _ => Err(PhaseError::InvalidConfiguration(format!(
                "phase {} is not a surface phase",
                self.name()
            ))),
        }
    }
    /// site density for surface phases, kmol/m2 (or kmol/m for edges)
    pub fn site_density(&self) -> Option<f64> {
        match self {
            PhaseModel::Surface(s) => Some(s.site_density),
            _ => None,
        }
    }
}

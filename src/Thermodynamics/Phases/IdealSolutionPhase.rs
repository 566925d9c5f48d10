use crate::Thermodynamics::Phases::PhaseCore::{PhaseCore, PhaseError, Species};
use crate::Thermodynamics::Phases::phase_api::{PhaseKind, ThermoPhaseTrait};
use crate::Thermodynamics::constants::{REF_PRESSURE, SMALL_NUMBER};

/// Ideal condensed solution. Species molar volumes are pressure independent,
/// mu_k = g_k(T) + V_k (P - P_ref) + RT ln(x_k) and the standard concentration is 1/V_k.
#[derive(Debug, Clone)]
pub struct IdealSolutionPhase {
    pub core: PhaseCore,
}

impl IdealSolutionPhase {
    pub fn new(name: &str, species: Vec<Species>) -> Result<Self, PhaseError> {
        if let Some(sp) = species.iter().find(|s| s.molar_volume < 0.0) {
            return Err(PhaseError::InvalidConfiguration(format!(
                "species {} has a negative molar volume",
                sp.name
            )));
        }
        Ok(IdealSolutionPhase {
            core: PhaseCore::new(name, species)?,
        })
    }

    fn pressure_correction(&self, k: usize) -> f64 {
        self.core.species[k].molar_volume * (self.core.P - REF_PRESSURE)
    }
}

impl ThermoPhaseTrait for IdealSolutionPhase {
    fn core(&self) -> &PhaseCore {
        &self.core
    }
    fn core_mut(&mut self) -> &mut PhaseCore {
        &mut self.core
    }
    fn phase_kind(&self) -> PhaseKind {
        PhaseKind::Condensed
    }
    fn eos_name(&self) -> &'static str {
        "Ideal Soln"
    }
    fn get_standard_chem_potentials(&self) -> Vec<f64> {
        self.get_gibbs_ref()
            .iter()
            .enumerate()
            .map(|(k, g)| g + self.pressure_correction(k))
            .collect()
    }
    fn get_chem_potentials(&self) -> Vec<f64> {
        let RT = self.RT();
        self.get_standard_chem_potentials()
            .iter()
            .zip(&self.core.x)
            .map(|(mu0, x)| mu0 + RT * x.max(SMALL_NUMBER).ln())
            .collect()
    }
    fn standard_concentration(&self, k: usize) -> f64 {
        let v = self.core.species[k].molar_volume;
        if v > 0.0 { 1.0 / v } else { 1.0 }
    }
    fn get_activities(&self) -> Vec<f64> {
        self.core.x.clone()
    }
    fn get_enthalpy_RT(&self) -> Vec<f64> {
        let T = self.core.T;
        let RT = self.RT();
        self.core
            .species
            .iter()
            .enumerate()
            .map(|(k, s)| s.thermo.h_RT(T) + self.pressure_correction(k) / RT)
            .collect()
    }
}

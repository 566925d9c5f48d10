use crate::Thermodynamics::Phases::PhaseCore::{PhaseCore, PhaseError, Species};
use crate::Thermodynamics::Phases::phase_api::{PhaseKind, ThermoPhaseTrait};
use crate::Thermodynamics::constants::{GAS_CONSTANT, REF_PRESSURE};

/// pure condensed substance, activity is always one
#[derive(Debug, Clone)]
pub struct StoichSubstance {
    pub core: PhaseCore,
}

impl StoichSubstance {
    pub fn new(name: &str, species: Species) -> Result<Self, PhaseError> {
        Ok(StoichSubstance {
            core: PhaseCore::new(name, vec![species])?,
        })
    }
}

impl ThermoPhaseTrait for StoichSubstance {
    fn core(&self) -> &PhaseCore {
        &self.core
    }
    fn core_mut(&mut self) -> &mut PhaseCore {
        &mut self.core
    }
    fn phase_kind(&self) -> PhaseKind {
        PhaseKind::SingleSpecies
    }
    fn eos_name(&self) -> &'static str {
        "Stoich Sub"
    }
    fn get_standard_chem_potentials(&self) -> Vec<f64> {
        let v = self.core.species[0].molar_volume;
        let g = self.get_gibbs_ref()[0];
        vec![g + v * (self.core.P - REF_PRESSURE)]
    }
    fn get_chem_potentials(&self) -> Vec<f64> {
        self.get_standard_chem_potentials()
    }
    fn standard_concentration(&self, _k: usize) -> f64 {
        1.0
    }
    fn get_activities(&self) -> Vec<f64> {
        vec![1.0]
    }
    fn set_mole_fractions(&mut self, x: &[f64]) -> Result<(), PhaseError> {
        self.core.check_len(x.len())?;
        self.core.x[0] = 1.0;
        Ok(())
    }
    fn get_enthalpy_RT(&self) -> Vec<f64> {
        let T = self.core.T;
        let v = self.core.species[0].molar_volume;
        vec![self.core.species[0].thermo.h_RT(T) + v * (self.core.P - REF_PRESSURE) / (GAS_CONSTANT * T)]
    }
    fn get_partial_molar_entropies(&self) -> Vec<f64> {
        vec![self.get_entropy_R()[0] * GAS_CONSTANT]
    }
}

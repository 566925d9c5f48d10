use crate::Thermodynamics::Phases::PhaseCore::{PhaseCore, PhaseError, Species};
use crate::Thermodynamics::Phases::phase_api::{PhaseKind, ThermoPhaseTrait, XX_SMALL};
use crate::Thermodynamics::constants::{GAS_CONSTANT, REF_PRESSURE, SMALL_NUMBER};

/// ideal gas mixture: mu_k = g_k(T) + RT ln(P/P_ref) + RT ln(x_k)
#[derive(Debug, Clone)]
pub struct IdealGasPhase {
    pub core: PhaseCore,
}

impl IdealGasPhase {
    pub fn new(name: &str, species: Vec<Species>) -> Result<Self, PhaseError> {
        Ok(IdealGasPhase {
            core: PhaseCore::new(name, species)?,
        })
    }
    /// total molar concentration P/RT, kmol/m3
    pub fn molar_density(&self) -> f64 {
        self.core.P / (GAS_CONSTANT * self.core.T)
    }
}

impl ThermoPhaseTrait for IdealGasPhase {
    fn core(&self) -> &PhaseCore {
        &self.core
    }
    fn core_mut(&mut self) -> &mut PhaseCore {
        &mut self.core
    }
    fn phase_kind(&self) -> PhaseKind {
        PhaseKind::Gas
    }
    fn eos_name(&self) -> &'static str {
        "Ideal Gas"
    }
    fn get_standard_chem_potentials(&self) -> Vec<f64> {
        let RT = self.RT();
        let lnp = (self.core.P / REF_PRESSURE).ln();
        self.get_gibbs_ref().iter().map(|g| g + RT * lnp).collect()
    }
    fn get_chem_potentials(&self) -> Vec<f64> {
        let RT = self.RT();
        self.get_standard_chem_potentials()
            .iter()
            .zip(&self.core.x)
            .map(|(mu0, x)| mu0 + RT * x.max(SMALL_NUMBER).ln())
            .collect()
    }
    fn standard_concentration(&self, _k: usize) -> f64 {
        self.molar_density()
    }
    fn get_activities(&self) -> Vec<f64> {
        self.core.x.clone()
    }
    fn get_entropy_R(&self) -> Vec<f64> {
        let T = self.core.T;
        let lnp = (self.core.P / REF_PRESSURE).ln();
        self.core.species.iter().map(|s| s.thermo.s_R(T) - lnp).collect()
    }
    fn get_partial_molar_entropies(&self) -> Vec<f64> {
        self.get_entropy_R()
            .iter()
            .zip(&self.core.x)
            .map(|(s, x)| GAS_CONSTANT * (s - x.max(XX_SMALL).ln()))
            .collect()
    }
    fn get_standard_volumes(&self) -> Vec<f64> {
        vec![1.0 / self.molar_density(); self.core.n_species()]
    }
}

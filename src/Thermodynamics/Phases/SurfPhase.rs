//! Surface (dimension 2) or edge (dimension 1) phase made of adsorption sites.
//!
//! The state variable is the vector of site coverages theta_k, the fraction of sites covered
//! by species k. A species can occupy more than one site (`size`). Concentrations are
//! c_k = theta_k * n0 / size_k where n0 is the site density.
use crate::Thermodynamics::Phases::PhaseCore::{PhaseCore, PhaseError, Species};
use crate::Thermodynamics::Phases::phase_api::{PhaseKind, ThermoPhaseTrait, XX_SMALL};
use crate::Thermodynamics::constants::{GAS_CONSTANT, SMALL_NUMBER};

#[derive(Debug, Clone)]
pub struct SurfPhase {
    pub core: PhaseCore,
    /// kmol of sites per m2 (per m for edges)
    pub site_density: f64,
    n_dim: usize,
}

impl SurfPhase {
    pub fn new(name: &str, species: Vec<Species>, site_density: f64) -> Result<Self, PhaseError> {
        Self::with_dim(name, species, site_density, 2)
    }
    /// one dimensional phase, the line where three phases meet
    pub fn edge(name: &str, species: Vec<Species>, site_density: f64) -> Result<Self, PhaseError> {
        Self::with_dim(name, species, site_density, 1)
    }

    pub fn with_dim(
        name: &str,
        species: Vec<Species>,
        site_density: f64,
        n_dim: usize,
    ) -> Result<Self, PhaseError> {
        if site_density <= 0.0 {
            return Err(PhaseError::InvalidConfiguration(format!(
                "site density of {} must be positive",
                name
            )));
        }
        if let Some(sp) = species.iter().find(|s| s.size <= 0.0) {
            return Err(PhaseError::InvalidConfiguration(format!(
                "species {} must occupy a positive number of sites",
                sp.name
            )));
        }
        Ok(SurfPhase {
            core: PhaseCore::new(name, species)?,
            site_density,
            n_dim,
        })
    }

    pub fn size(&self, k: usize) -> f64 {
        self.core.species[k].size
    }

    pub fn get_coverages(&self) -> Vec<f64> {
        let sum: f64 = (0..self.core.n_species())
            .map(|k| self.core.x[k] * self.size(k))
            .sum();
        (0..self.core.n_species())
            .map(|k| {
                if sum > 0.0 {
                    self.core.x[k] * self.size(k) / sum
                } else {
                    0.0
                }
            })
            .collect()
    }
    /// negative coverages are clipped, the rest normalised to one
    pub fn set_coverages(&mut self, theta: &[f64]) -> Result<(), PhaseError> {
        self.core.check_len(theta.len())?;
        let sum: f64 = theta.iter().map(|t| t.max(0.0)).sum();
        if sum <= 0.0 {
            return Err(PhaseError::ZeroComposition(self.core.name.clone()));
        }
        let theta: Vec<f64> = theta.iter().map(|t| t.max(0.0) / sum).collect();
        self.set_coverages_no_norm(&theta)
    }
    /// Sets coverages without clipping negative values, for the iterates of the integrators.
    /// The phase keeps mole fractions, so the coverages read back are scaled to sum to one.
    pub fn set_coverages_no_norm(&mut self, theta: &[f64]) -> Result<(), PhaseError> {
        self.core.check_len(theta.len())?;
        let x: Vec<f64> = theta
            .iter()
            .enumerate()
            .map(|(k, t)| t / self.size(k))
            .collect();
        let sum: f64 = x.iter().sum();
        if sum == 0.0 {
            return Err(PhaseError::ZeroComposition(self.core.name.clone()));
        }
        let x: Vec<f64> = x.iter().map(|v| v / sum).collect();
        self.core.set_mole_fractions_no_norm(&x)
    }
}

impl ThermoPhaseTrait for SurfPhase {
    fn core(&self) -> &PhaseCore {
        &self.core
    }
    fn core_mut(&mut self) -> &mut PhaseCore {
        &mut self.core
    }
    fn phase_kind(&self) -> PhaseKind {
        PhaseKind::Surface
    }
    fn eos_name(&self) -> &'static str {
        if self.n_dim == 1 { "Edge" } else { "Surface" }
    }
    fn n_dim(&self) -> usize {
        self.n_dim
    }
    fn get_standard_chem_potentials(&self) -> Vec<f64> {
        self.get_gibbs_ref()
    }
    fn get_chem_potentials(&self) -> Vec<f64> {
        let RT = self.RT();
        self.get_standard_chem_potentials()
            .iter()
            .zip(self.get_coverages())
            .map(|(mu0, th)| mu0 + RT * th.max(SMALL_NUMBER).ln())
            .collect()
    }
    fn standard_concentration(&self, k: usize) -> f64 {
        self.site_density / self.size(k)
    }
    fn get_activities(&self) -> Vec<f64> {
        self.get_coverages()
    }
    fn get_partial_molar_entropies(&self) -> Vec<f64> {
        self.get_entropy_R()
            .iter()
            .zip(self.get_coverages())
            .map(|(s, th)| GAS_CONSTANT * (s - th.max(XX_SMALL).ln()))
            .collect()
    }
    fn get_standard_volumes(&self) -> Vec<f64> {
        vec![0.0; self.core.n_species()]
    }
}

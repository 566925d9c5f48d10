//! Rate coefficients of surface reactions.
//!
//! k = A T^b exp(-E/RT) * prod_k 10^(a_k theta_k) theta_k^(m_k) exp(-e_k theta_k / RT)
//!
//! The coverage terms are refreshed with `update_C` before `update` is called for a new
//! temperature. Energies are in J/kmol.
use crate::Thermodynamics::constants::GAS_CONSTANT;
use serde::{Deserialize, Serialize};
use std::f64::consts::LN_10;

/// coverages below this value are floored before the logarithm of the m-term
const TINY_COVERAGE: f64 = 1.0e-20;

/// Dependence of a rate coefficient on the coverage of one surface species.
/// `species` is the index of the species inside the surface phase of the mechanism.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageDependency {
    pub species: usize,
    /// log10 factor: k is multiplied by 10^(a theta)
    #[serde(default)]
    pub a: f64,
    /// power of theta
    #[serde(default)]
    pub m: f64,
    /// coverage dependent activation energy, J/kmol
    #[serde(default)]
    pub E: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceArrhenius {
    pub A: f64,
    pub b: f64,
    /// activation energy, J/kmol
    pub E: f64,
    #[serde(default)]
    pub cov: Vec<CoverageDependency>,
    #[serde(skip)]
    acov: f64,
    #[serde(skip)]
    ecov: f64,
    #[serde(skip)]
    mcov: f64,
}

impl SurfaceArrhenius {
    pub fn new(A: f64, b: f64, E: f64) -> Self {
        Self {
            A,
            b,
            E,
            cov: Vec::new(),
            acov: 0.0,
            ecov: 0.0,
            mcov: 0.0,
        }
    }

    pub fn with_coverage(mut self, dep: CoverageDependency) -> Self {
        self.cov.push(dep);
        self
    }

    pub fn has_coverage_dependence(&self) -> bool {
        !self.cov.is_empty()
    }
    /// stores the coverage terms for the given surface coverages
    pub fn update_C(&mut self, theta: &[f64]) {
        self.acov = 0.0;
        self.ecov = 0.0;
        self.mcov = 0.0;
        for dep in &self.cov {
            let th = theta.get(dep.species).copied().unwrap_or(0.0);
            self.acov += dep.a * th * LN_10;
            self.ecov += dep.E * th;
            if dep.m != 0.0 {
                self.mcov += dep.m * th.max(TINY_COVERAGE).ln();
            }
        }
    }
    /// rate coefficient for ln T and 1/T
    pub fn update(&self, logT: f64, recipT: f64) -> f64 {
        let ln_k = self.acov + self.b * logT - (self.E + self.ecov) * recipT / GAS_CONSTANT
            + self.mcov;
        self.A * ln_k.exp()
    }

    pub fn K_const(&self, T: f64) -> f64 {
        self.update(T.ln(), 1.0 / T)
    }
}

/// Rate coefficient calculators installed per reaction.
#[derive(Debug, Clone, Default)]
pub struct RateCoeffManager {
    rates: Vec<(usize, SurfaceArrhenius)>,
}

impl RateCoeffManager {
    pub fn new() -> Self {
        Self::default()
    }
    /// registers the rate of reaction `rxn` and returns its location in the manager
    pub fn install(&mut self, rxn: usize, rate: SurfaceArrhenius) -> usize {
        self.rates.push((rxn, rate));
        self.rates.len() - 1
    }

    pub fn n_rates(&self) -> usize {
        self.rates.len()
    }

    pub fn update_C(&mut self, theta: &[f64]) {
        for (_, rate) in self.rates.iter_mut() {
            rate.update_C(theta);
        }
    }
    /// writes the rate coefficient of every installed reaction into `values[rxn]`
    pub fn update(&self, T: f64, logT: f64, values: &mut [f64]) {
        let recipT = 1.0 / T;
        for (rxn, rate) in &self.rates {
            if let Some(v) = values.get_mut(*rxn) {
                *v = rate.update(logT, recipT);
            }
        }
    }

    pub fn rate(&self, loc: usize) -> Option<&SurfaceArrhenius> {
        self.rates.get(loc).map(|(_, r)| r)
    }
}

//! Heterogeneous reaction mechanism on a surface (or edge) and the bulk phases around it.
//!
//! The object owns its phases. Species of all phases are packed into one kinetics species
//! vector in the order the phases were added. Rates are recomputed lazily in a fixed order:
//! electric potentials, temperature dependent rate constants (with exchange current density
//! and Butler-Volmer corrections, then the equilibrium constants), concentrations and finally
//! the rates of progress.
//!
//! Lifecycle: `add_phase` (any number) -> `init` -> `add_reaction` (any number) -> `finalize`.
//! Adding a reaction after `finalize` drops the coverage integrator and the mechanism has to
//! be finalized again.
use crate::Kinetics::ImplicitSurfChem::{ImplicitSurfChem, SteadyStateMode};
use crate::Kinetics::RateCoeff::{CoverageDependency, RateCoeffManager, SurfaceArrhenius};
use crate::Kinetics::StoichManager::StoichManager;
use crate::Thermodynamics::Phases::PhaseCore::PhaseError;
use crate::Thermodynamics::Phases::phase_api::{PhaseModel, ThermoPhaseTrait};
use crate::Thermodynamics::constants::{FARADAY, GAS_CONSTANT};
use log::{debug, error, info, warn};
use nalgebra::DMatrix;
use prettytable::{Table, row};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// exponents of the Butler-Volmer factor beyond this value are saturated
const BV_EXPONENT_LIMIT: f64 = 345.0;
/// ln of the largest factor, shifted so the saturated branch joins the exact one near the limit
const BV_SATURATION_OFFSET: f64 = 339.1565;

#[derive(Debug, Error)]
pub enum KineticsError {
    #[error("no {0} phase is present")]
    NoReactionPhase(&'static str),
    #[error("expected interface dimension = {expected}, but got dimension = {got}")]
    WrongDimension { expected: usize, got: usize },
    #[error("kinetics object is not initialized, call init() after adding the phases")]
    NotInitialized,
    #[error("phases cannot be added after init()")]
    AlreadyInitialized,
    #[error("kinetics object is not finalized")]
    NotFinalized,
    #[error("{what} index {index} out of range (n = {n})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        n: usize,
    },
    #[error("species not found: {0}")]
    SpeciesNotFound(String),
    #[error("invalid reaction {equation}: {reason}")]
    InvalidReaction { equation: String, reason: String },
    #[error(transparent)]
    Phase(#[from] PhaseError),
    #[error("linear solve failed: {0}")]
    Singular(String),
    #[error("{what} did not converge after {iterations} iterations (residual {residual:e})")]
    NotConverged {
        what: &'static str,
        iterations: usize,
        residual: f64,
    },
}

/// Interface kinetics react on a two dimensional surface, edge kinetics on the one dimensional
/// line where phases meet. Both share the same engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KineticsKind {
    Interface,
    Edge,
}

impl KineticsKind {
    pub fn reaction_phase_dim(&self) -> usize {
        match self {
            KineticsKind::Interface => 2,
            KineticsKind::Edge => 1,
        }
    }

    fn phase_word(&self) -> &'static str {
        match self {
            KineticsKind::Interface => "surface",
            KineticsKind::Edge => "edge",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RateCoeffType {
    #[default]
    Arrhenius,
    /// the pre-exponential is an exchange current density, A/m2
    ExchangeCurrentDensity,
}

/// One heterogeneous reaction. Species indices refer to the kinetics species vector.
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceReaction {
    pub equation: String,
    pub reactants: Vec<(usize, f64)>,
    pub products: Vec<(usize, f64)>,
    pub rate: SurfaceArrhenius,
    /// electrochemical transfer coefficient, 0 for reactions without charge transfer
    pub beta: f64,
    pub rate_coeff_type: RateCoeffType,
    pub reversible: bool,
}

impl InterfaceReaction {
    pub fn new(
        equation: &str,
        reactants: Vec<(usize, f64)>,
        products: Vec<(usize, f64)>,
        rate: SurfaceArrhenius,
    ) -> Self {
        Self {
            equation: equation.to_string(),
            reactants,
            products,
            rate,
            beta: 0.0,
            rate_coeff_type: RateCoeffType::Arrhenius,
            reversible: true,
        }
    }

    pub fn irreversible(mut self) -> Self {
        self.reversible = false;
        self
    }

    pub fn with_beta(mut self, beta: f64) -> Self {
        self.beta = beta;
        self
    }

    pub fn with_rate_coeff_type(mut self, t: RateCoeffType) -> Self {
        self.rate_coeff_type = t;
        self
    }

    pub fn with_coverage(mut self, dep: CoverageDependency) -> Self {
        self.rate = self.rate.with_coverage(dep);
        self
    }
}

/// cached per reaction values
#[derive(Debug, Clone, Default)]
struct InterfaceKineticsData {
    ROP_ok: bool,
    temp: f64,
    logtemp: f64,
    /// forward rate constants
    rfn: Vec<f64>,
    /// reciprocal equilibrium constants, zero for irreversible reactions
    rkcn: Vec<f64>,
    ropf: Vec<f64>,
    ropr: Vec<f64>,
    ropnet: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct InterfaceKinetics {
    pub kind: KineticsKind,
    phases: Vec<PhaseModel>,
    /// offset of the first species of each phase in the kinetics species vector
    start: Vec<usize>,
    kk: usize,
    equations: Vec<String>,
    rates: RateCoeffManager,
    stoich: StoichManager,
    revindex: Vec<usize>,
    irrev: Vec<usize>,
    E: Vec<f64>,
    perturb: Vec<f64>,
    /// transfer coefficients of the charge transfer reactions, parallel to `ctrxn`
    beta: Vec<f64>,
    ctrxn: Vec<usize>,
    ctrxn_ecdf: Vec<bool>,
    kdata: InterfaceKineticsData,
    conc: Vec<f64>,
    mu0: Vec<f64>,
    grt: Vec<f64>,
    pot: Vec<f64>,
    phi: Vec<f64>,
    rwork: Vec<f64>,
    standard_conc: Vec<f64>,
    deltaG0: Vec<f64>,
    prod_stan_conc_reac: Vec<f64>,
    /// phase index of the surface (edge) phase
    surf: Option<usize>,
    integrator: Option<ImplicitSurfChem>,
    initialized: bool,
    finalized: bool,
    redo_rates: bool,
    has_coverage_dependence: bool,
    has_electrochem_rxns: bool,
    has_exchange_current_density_formulation: bool,
    /// number of phases currently flagged as not existing; gating is active when nonzero
    phase_exists_check: usize,
    phase_exists: Vec<bool>,
    phase_is_stable: Vec<bool>,
    /// (reaction, phase): the phase supplies a reactant / receives a product
    rxn_phase_is_reactant: DMatrix<bool>,
    rxn_phase_is_product: DMatrix<bool>,
}

impl InterfaceKinetics {
    pub fn new(kind: KineticsKind) -> Self {
        Self {
            kind,
            phases: Vec::new(),
            start: Vec::new(),
            kk: 0,
            equations: Vec::new(),
            rates: RateCoeffManager::new(),
            stoich: StoichManager::new(),
            revindex: Vec::new(),
            irrev: Vec::new(),
            E: Vec::new(),
            perturb: Vec::new(),
            beta: Vec::new(),
            ctrxn: Vec::new(),
            ctrxn_ecdf: Vec::new(),
            kdata: InterfaceKineticsData::default(),
            conc: Vec::new(),
            mu0: Vec::new(),
            grt: Vec::new(),
            pot: Vec::new(),
            phi: Vec::new(),
            rwork: Vec::new(),
            standard_conc: Vec::new(),
            deltaG0: Vec::new(),
            prod_stan_conc_reac: Vec::new(),
            surf: None,
            integrator: None,
            initialized: false,
            finalized: false,
            redo_rates: false,
            has_coverage_dependence: false,
            has_electrochem_rxns: false,
            has_exchange_current_density_formulation: false,
            phase_exists_check: 0,
            phase_exists: Vec::new(),
            phase_is_stable: Vec::new(),
            rxn_phase_is_reactant: DMatrix::from_element(0, 0, false),
            rxn_phase_is_product: DMatrix::from_element(0, 0, false),
        }
    }

    pub fn interface() -> Self {
        Self::new(KineticsKind::Interface)
    }

    pub fn edge() -> Self {
        Self::new(KineticsKind::Edge)
    }

    ////////////////////////////////////////PHASES AND SPECIES//////////////////////////////////////////

    /// adds a participating phase and returns its index; must be called before `init`
    pub fn add_phase(&mut self, phase: PhaseModel) -> Result<usize, KineticsError> {
        if self.initialized {
            return Err(KineticsError::AlreadyInitialized);
        }
        let start = self.start.last().copied().unwrap_or(0)
            + self.phases.last().map(|p| p.n_species()).unwrap_or(0);
        self.start.push(start);
        self.phases.push(phase);
        self.phase_exists.push(true);
        self.phase_is_stable.push(true);
        Ok(self.phases.len() - 1)
    }
    /// sizes the species work arrays; called once all phases are added
    pub fn init(&mut self) {
        self.kk = self.phases.iter().map(|p| p.n_species()).sum();
        let np = self.phases.len();
        self.conc = vec![0.0; self.kk];
        self.mu0 = vec![0.0; self.kk];
        self.grt = vec![0.0; self.kk];
        self.pot = vec![0.0; self.kk];
        self.standard_conc = vec![0.0; self.kk];
        self.phi = vec![0.0; np];
        self.rxn_phase_is_reactant = DMatrix::from_element(0, np, false);
        self.rxn_phase_is_product = DMatrix::from_element(0, np, false);
        self.initialized = true;
        debug!("kinetics initialized with {} phases, {} species", np, self.kk);
    }

    pub fn n_phases(&self) -> usize {
        self.phases.len()
    }

    pub fn n_total_species(&self) -> usize {
        self.kk
    }

    pub fn n_reactions(&self) -> usize {
        self.equations.len()
    }

    pub fn thermo(&self, n: usize) -> &PhaseModel {
        &self.phases[n]
    }
    /// Mutable access to a phase. Marks the rate constants stale: the standard potentials and
    /// concentrations of every phase enter the equilibrium constants.
    pub fn thermo_mut(&mut self, n: usize) -> &mut PhaseModel {
        self.redo_rates = true;
        &mut self.phases[n]
    }

    pub fn phase_index(&self, name: &str) -> Option<usize> {
        self.phases.iter().position(|p| p.name() == name)
    }

    pub fn kinetics_species_index_in_phase(&self, k: usize, n: usize) -> usize {
        self.start[n] + k
    }
    /// index of a species in the kinetics species vector, searched over all phases
    pub fn kinetics_species_index(&self, name: &str) -> Option<usize> {
        self.phases
            .iter()
            .enumerate()
            .find_map(|(n, p)| p.species_index(name).map(|k| self.start[n] + k))
    }

    pub fn kinetics_species_name(&self, k: usize) -> Option<&str> {
        let n = self.species_phase_index(k)?;
        Some(self.phases[n].species_name(k - self.start[n]))
    }

    pub fn species_phase_index(&self, k: usize) -> Option<usize> {
        (0..self.phases.len())
            .rev()
            .find(|&n| k >= self.start[n] && k < self.start[n] + self.phases[n].n_species())
    }
    /// the phase with the lowest spatial dimension (the last one on ties)
    pub fn reaction_phase_index(&self) -> Option<usize> {
        let mut best: Option<(usize, usize)> = None;
        for (n, p) in self.phases.iter().enumerate() {
            match best {
                Some((_, dim)) if p.n_dim() > dim => {}
                _ => best = Some((n, p.n_dim())),
            }
        }
        best.map(|(n, _)| n)
    }

    pub fn surface_phase_index(&self) -> Option<usize> {
        self.surf
    }

    pub fn reaction_string(&self, i: usize) -> &str {
        &self.equations[i]
    }

    pub fn reactants(&self, i: usize) -> &[usize] {
        self.stoich.reactants(i)
    }

    pub fn products(&self, i: usize) -> &[usize] {
        self.stoich.products(i)
    }

    pub fn reactant_stoich_coeff(&self, k: usize, i: usize) -> f64 {
        self.stoich.reactant_stoich_coeff(k, i)
    }

    pub fn product_stoich_coeff(&self, k: usize, i: usize) -> f64 {
        self.stoich.product_stoich_coeff(k, i)
    }

    pub fn is_reversible(&self, i: usize) -> bool {
        self.stoich.reactions[i].reversible
    }

    pub fn ready(&self) -> bool {
        self.finalized
    }

    ////////////////////////////////////////REACTIONS//////////////////////////////////////////

    /// Installs a reaction. Must be called after `init`. Invalidates a previous `finalize`.
    pub fn add_reaction(&mut self, r: InterfaceReaction) -> Result<usize, KineticsError> {
        if !self.initialized {
            return Err(KineticsError::NotInitialized);
        }
        for &(k, nu) in r.reactants.iter().chain(r.products.iter()) {
            if k >= self.kk {
                return Err(KineticsError::IndexOutOfRange {
                    what: "kinetics species",
                    index: k,
                    n: self.kk,
                });
            }
            if !(nu > 0.0) {
                return Err(KineticsError::InvalidReaction {
                    equation: r.equation.clone(),
                    reason: format!("stoichiometric coefficient {} must be positive", nu),
                });
            }
            if nu.fract() != 0.0 {
                error!(
                    "reaction {}: non-integral stoichiometric coefficient {}",
                    r.equation, nu
                );
                return Err(KineticsError::InvalidReaction {
                    equation: r.equation.clone(),
                    reason: format!("stoichiometric coefficient {} is not an integer", nu),
                });
            }
        }
        if r.reactants.is_empty() {
            return Err(KineticsError::InvalidReaction {
                equation: r.equation.clone(),
                reason: "no reactants".to_string(),
            });
        }
        if self.integrator.take().is_some() {
            debug!("coverage integrator dropped, reaction set changed");
        }
        self.finalized = false;
        let i = self.n_reactions();
        self.add_elementary_reaction(i, &r);
        self.install_reagents(i, &r);
        self.perturb.push(1.0);
        self.equations.push(r.equation.clone());

        self.rxn_phase_is_reactant.resize_vertically_mut(i + 1, false);
        self.rxn_phase_is_product.resize_vertically_mut(i + 1, false);
        let reactant_phases: Vec<usize> = self
            .stoich
            .reactants(i)
            .iter()
            .filter_map(|&k| self.species_phase_index(k))
            .collect();
        let product_phases: Vec<usize> = self
            .stoich
            .products(i)
            .iter()
            .filter_map(|&k| self.species_phase_index(k))
            .collect();
        for p in reactant_phases {
            self.rxn_phase_is_reactant[(i, p)] = true;
        }
        for p in product_phases {
            self.rxn_phase_is_product[(i, p)] = true;
        }
        debug!("reaction {} added: {}", i, self.equations[i]);
        Ok(i)
    }

    fn add_elementary_reaction(&mut self, i: usize, r: &InterfaceReaction) {
        if r.rate.has_coverage_dependence() {
            self.has_coverage_dependence = true;
        }
        self.rates.install(i, r.rate.clone());
        self.E.push(r.rate.E);
        if r.beta > 0.0 {
            self.has_electrochem_rxns = true;
            self.beta.push(r.beta);
            self.ctrxn.push(i);
            let ecdf = r.rate_coeff_type == RateCoeffType::ExchangeCurrentDensity;
            if ecdf {
                self.has_exchange_current_density_formulation = true;
            }
            self.ctrxn_ecdf.push(ecdf);
        }
        self.kdata.rfn.push(r.rate.A);
    }

    fn install_reagents(&mut self, i: usize, r: &InterfaceReaction) {
        self.kdata.ropf.push(0.0);
        self.kdata.ropr.push(0.0);
        self.kdata.ropnet.push(0.0);
        self.kdata.rkcn.push(0.0);
        self.rwork.push(0.0);
        self.deltaG0.push(0.0);
        self.prod_stan_conc_reac.push(0.0);
        self.stoich
            .add(i, &r.reactants, &r.products, r.reversible);
        if r.reversible {
            self.revindex.push(i);
        } else {
            self.irrev.push(i);
        }
    }
    /// Checks that a surface (edge) phase of the right dimension is present, sizes the work
    /// arrays and creates the coverage integrator.
    pub fn finalize(&mut self) -> Result<(), KineticsError> {
        if !self.initialized {
            return Err(KineticsError::NotInitialized);
        }
        let ks = match self.reaction_phase_index() {
            Some(ks) => ks,
            None => {
                error!("finalize: no {} phase is present", self.kind.phase_word());
                return Err(KineticsError::NoReactionPhase(self.kind.phase_word()));
            }
        };
        let got = self.phases[ks].n_dim();
        let expected = self.kind.reaction_phase_dim();
        if got != expected || self.phases[ks].site_density().is_none() {
            error!(
                "finalize: expected interface dimension = {}, but got dimension = {}",
                expected, got
            );
            return Err(KineticsError::WrongDimension { expected, got });
        }
        self.surf = Some(ks);
        let nr = self.n_reactions();
        self.rwork.resize(nr, 0.0);
        self.deltaG0.resize(nr, 0.0);
        self.prod_stan_conc_reac.resize(nr, 0.0);
        self.standard_conc.resize(self.kk, 0.0);
        if self.phase_exists.len() != self.phases.len() {
            return Err(KineticsError::IndexOutOfRange {
                what: "phase existence table",
                index: self.phase_exists.len(),
                n: self.phases.len(),
            });
        }
        self.redo_rates = true;
        self.finalized = true;
        self.integrator = Some(ImplicitSurfChem::new(self)?);
        info!(
            "{:?} kinetics finalized: {} reactions, {} species, reaction phase {}",
            self.kind,
            nr,
            self.kk,
            self.phases[ks].name()
        );
        Ok(())
    }

    ////////////////////////////////////////RATE UPDATES//////////////////////////////////////////

    pub fn set_electric_potential(&mut self, n: usize, V: f64) -> Result<(), KineticsError> {
        self.check_phase(n)?;
        self.phases[n].set_electric_potential(V);
        self.redo_rates = true;
        Ok(())
    }

    fn check_phase(&self, n: usize) -> Result<(), KineticsError> {
        if n >= self.phases.len() {
            return Err(KineticsError::IndexOutOfRange {
                what: "phase",
                index: n,
                n: self.phases.len(),
            });
        }
        Ok(())
    }

    fn check_reaction(&self, i: usize) -> Result<(), KineticsError> {
        if i >= self.n_reactions() {
            return Err(KineticsError::IndexOutOfRange {
                what: "reaction",
                index: i,
                n: self.n_reactions(),
            });
        }
        Ok(())
    }

    fn rxn_phase(&self) -> Result<usize, KineticsError> {
        if !self.finalized {
            return Err(KineticsError::NotFinalized);
        }
        self.surf.ok_or(KineticsError::NotFinalized)
    }

    fn RT(&self) -> Result<f64, KineticsError> {
        let ks = self.rxn_phase()?;
        Ok(GAS_CONSTANT * self.phases[ks].temperature())
    }

    fn update_rates_phi(&mut self) {
        for n in 0..self.phases.len() {
            let phi = self.phases[n].electric_potential();
            if phi != self.phi[n] {
                self.phi[n] = phi;
                self.redo_rates = true;
            }
        }
    }

    fn update_rates_T(&mut self) -> Result<(), KineticsError> {
        self.update_rates_phi();
        let ks = self.rxn_phase()?;
        if self.has_coverage_dependence {
            let theta = self.phases[ks].coverages().unwrap_or_default();
            self.rates.update_C(&theta);
            self.redo_rates = true;
        }
        let T = self.phases[ks].temperature();
        if T != self.kdata.temp || self.redo_rates {
            self.kdata.logtemp = T.ln();
            let mut rfn = std::mem::take(&mut self.kdata.rfn);
            self.rates.update(T, self.kdata.logtemp, &mut rfn);
            let corrected = self.apply_rate_corrections(&mut rfn);
            self.kdata.rfn = rfn;
            corrected?;
            self.kdata.temp = T;
            self.update_kc()?;
            self.kdata.ROP_ok = false;
            self.redo_rates = false;
        }
        Ok(())
    }

    fn apply_rate_corrections(&mut self, rfn: &mut [f64]) -> Result<(), KineticsError> {
        if self.has_exchange_current_density_formulation {
            self.apply_exchange_current_density_formulation(rfn)?;
        }
        if self.has_electrochem_rxns {
            self.apply_butler_volmer_correction(rfn)?;
        }
        Ok(())
    }

    fn update_rates_C(&mut self) {
        for n in 0..self.phases.len() {
            let c = self.phases[n].get_activity_concentrations();
            let s = self.start[n];
            self.conc[s..s + c.len()].copy_from_slice(&c);
        }
        self.kdata.ROP_ok = false;
    }
    /// standard chemical potentials shifted to the concentration scale of the rate laws,
    /// plus the electrical energy of charged species
    fn fill_shifted_mu0(&mut self) -> f64 {
        let ks = self.surf.unwrap_or(0);
        let rt = GAS_CONSTANT * self.phases[ks].temperature();
        for n in 0..self.phases.len() {
            let mu0 = self.phases[n].get_standard_chem_potentials();
            let s = self.start[n];
            for (k, m) in mu0.iter().enumerate() {
                self.mu0[s + k] = m - rt * self.phases[n].log_standard_conc(k)
                    + FARADAY * self.phi[n] * self.phases[n].charge(k);
            }
        }
        rt
    }
    /// reciprocal equilibrium constants of the reversible reactions; zero for irreversible ones
    fn update_kc(&mut self) -> Result<(), KineticsError> {
        let nr = self.n_reactions();
        self.kdata.rkcn.iter_mut().for_each(|v| *v = 0.0);
        if !self.revindex.is_empty() {
            let rt = self.fill_shifted_mu0();
            let rrt = 1.0 / rt;
            self.stoich
                .get_rev_reaction_delta(&self.mu0, &mut self.kdata.rkcn);
            for &irxn in &self.revindex {
                if irxn >= nr {
                    error!("update_kc: illegal value irxn = {}", irxn);
                    return Err(KineticsError::IndexOutOfRange {
                        what: "reversible reaction",
                        index: irxn,
                        n: nr,
                    });
                }
                self.kdata.rkcn[irxn] = (self.kdata.rkcn[irxn] * rrt).exp();
            }
            for &irxn in &self.irrev {
                self.kdata.rkcn[irxn] = 0.0;
            }
        }
        Ok(())
    }

    fn get_exchange_current_quantities(&mut self) {
        for n in 0..self.phases.len() {
            let mu0 = self.phases[n].get_standard_chem_potentials();
            let s = self.start[n];
            self.mu0[s..s + mu0.len()].copy_from_slice(&mu0);
            for k in 0..mu0.len() {
                self.standard_conc[s + k] = self.phases[n].standard_concentration(k);
            }
        }
        self.stoich.get_reaction_delta(&self.mu0, &mut self.deltaG0);
        self.prod_stan_conc_reac.iter_mut().for_each(|v| *v = 1.0);
        self.stoich
            .multiply_reactants(&self.standard_conc, &mut self.prod_stan_conc_reac);
    }
    /// kf *= exp(-beta dG0/RT) / prod(C0 of reactants) / F for exchange current rate forms
    fn apply_exchange_current_density_formulation(
        &mut self,
        kfwd: &mut [f64],
    ) -> Result<(), KineticsError> {
        self.get_exchange_current_quantities();
        let rrt = 1.0 / self.RT()?;
        for (i, &irxn) in self.ctrxn.iter().enumerate() {
            if self.ctrxn_ecdf[i] {
                let tmp = (-self.beta[i] * self.deltaG0[irxn] * rrt).exp()
                    / self.prod_stan_conc_reac[irxn]
                    / FARADAY;
                kfwd[irxn] *= tmp;
            }
        }
        Ok(())
    }
    /// Scales the forward rate constants of charge transfer reactions by exp(-beta dPhi/RT),
    /// where dPhi is the change of electrical energy over the reaction. Exponents beyond the
    /// limit grow only logarithmically so the rates stay finite.
    fn apply_butler_volmer_correction(&mut self, kf: &mut [f64]) -> Result<(), KineticsError> {
        let rrt = 1.0 / self.RT()?;
        for n in 0..self.phases.len() {
            let s = self.start[n];
            for k in 0..self.phases[n].n_species() {
                self.pot[s + k] = FARADAY * self.phases[n].charge(k) * self.phi[n];
            }
        }
        self.stoich.get_reaction_delta(&self.pot, &mut self.rwork);
        for (i, &irxn) in self.ctrxn.iter().enumerate() {
            let eamod = self.beta[i] * self.rwork[irxn];
            if eamod != 0.0 {
                if eamod + self.E[irxn] < 0.0 {
                    debug!(
                        "activation energy of reaction {} lowered below zero by the potential difference",
                        self.equations[irxn]
                    );
                }
                kf[irxn] *= butler_volmer_factor(-eamod * rrt);
            }
        }
        Ok(())
    }

    fn update_rop(&mut self) -> Result<(), KineticsError> {
        self.update_rates_T()?;
        self.update_rates_C();
        if self.kdata.ROP_ok {
            return Ok(());
        }
        let nr = self.n_reactions();
        let kd = &mut self.kdata;
        for i in 0..nr {
            kd.ropf[i] = kd.rfn[i] * self.perturb[i];
            kd.ropr[i] = kd.ropf[i] * kd.rkcn[i];
        }
        self.stoich.multiply_reactants(&self.conc, &mut kd.ropf);
        self.stoich.multiply_rev_products(&self.conc, &mut kd.ropr);
        for j in 0..nr {
            kd.ropnet[j] = kd.ropf[j] - kd.ropr[j];
        }
        if self.phase_exists_check > 0 {
            self.gate_rates_by_phase_existence();
        }
        self.kdata.ROP_ok = true;
        Ok(())
    }
    /// Reactions may not consume a phase that does not exist, nor produce into a phase that is
    /// not stable.
    fn gate_rates_by_phase_existence(&mut self) {
        let np = self.phases.len();
        let kd = &mut self.kdata;
        for j in 0..self.equations.len() {
            if kd.ropr[j] > kd.ropf[j] && kd.ropr[j] > 0.0 {
                for p in 0..np {
                    if self.rxn_phase_is_product[(j, p)] && !self.phase_exists[p] {
                        kd.ropnet[j] = 0.0;
                        kd.ropr[j] = kd.ropf[j];
                        if kd.ropf[j] > 0.0 {
                            for rp in 0..np {
                                if self.rxn_phase_is_reactant[(j, rp)] && !self.phase_exists[rp] {
                                    kd.ropnet[j] = 0.0;
                                    kd.ropf[j] = 0.0;
                                    kd.ropr[j] = 0.0;
                                }
                            }
                        }
                    }
                    if self.rxn_phase_is_reactant[(j, p)] && !self.phase_is_stable[p] {
                        kd.ropnet[j] = 0.0;
                        kd.ropr[j] = kd.ropf[j];
                    }
                }
            } else if kd.ropf[j] > kd.ropr[j] && kd.ropf[j] > 0.0 {
                for p in 0..np {
                    if self.rxn_phase_is_reactant[(j, p)] && !self.phase_exists[p] {
                        kd.ropnet[j] = 0.0;
                        kd.ropf[j] = kd.ropr[j];
                        if kd.ropf[j] > 0.0 {
                            for rp in 0..np {
                                if self.rxn_phase_is_product[(j, rp)] && !self.phase_exists[rp] {
                                    kd.ropnet[j] = 0.0;
                                    kd.ropf[j] = 0.0;
                                    kd.ropr[j] = 0.0;
                                }
                            }
                        }
                    }
                    if self.rxn_phase_is_product[(j, p)] && !self.phase_is_stable[p] {
                        kd.ropnet[j] = 0.0;
                        kd.ropf[j] = kd.ropr[j];
                    }
                }
            }
        }
    }

    ////////////////////////////////////////RATE GETTERS//////////////////////////////////////////

    pub fn get_fwd_rates_of_progress(&mut self) -> Result<Vec<f64>, KineticsError> {
        self.update_rop()?;
        Ok(self.kdata.ropf.clone())
    }

    pub fn get_rev_rates_of_progress(&mut self) -> Result<Vec<f64>, KineticsError> {
        self.update_rop()?;
        Ok(self.kdata.ropr.clone())
    }

    pub fn get_net_rates_of_progress(&mut self) -> Result<Vec<f64>, KineticsError> {
        self.update_rop()?;
        Ok(self.kdata.ropnet.clone())
    }
    /// species creation rates, kmol/m^d/s with d the dimension of the reaction phase
    pub fn get_creation_rates(&mut self) -> Result<Vec<f64>, KineticsError> {
        self.update_rop()?;
        Ok(self
            .stoich
            .get_creation_rates(self.kk, &self.kdata.ropf, &self.kdata.ropr))
    }

    pub fn get_destruction_rates(&mut self) -> Result<Vec<f64>, KineticsError> {
        self.update_rop()?;
        Ok(self
            .stoich
            .get_destruction_rates(self.kk, &self.kdata.ropf, &self.kdata.ropr))
    }

    pub fn get_net_production_rates(&mut self) -> Result<Vec<f64>, KineticsError> {
        self.update_rop()?;
        Ok(self
            .stoich
            .get_net_production_rates(self.kk, &self.kdata.ropnet))
    }
    /// forward rate constants including the perturbation factors
    pub fn get_fwd_rate_constants(&mut self) -> Result<Vec<f64>, KineticsError> {
        self.update_rop()?;
        Ok(self
            .kdata
            .rfn
            .iter()
            .zip(&self.perturb)
            .map(|(k, f)| k * f)
            .collect())
    }
    /// With `do_irreversible` the reverse rate constants of irreversible reactions are
    /// computed from thermochemistry too; otherwise they are zero.
    pub fn get_rev_rate_constants(
        &mut self,
        do_irreversible: bool,
    ) -> Result<Vec<f64>, KineticsError> {
        let mut krev = self.get_fwd_rate_constants()?;
        if do_irreversible {
            let kc = self.get_equilibrium_constants()?;
            for (k, c) in krev.iter_mut().zip(&kc) {
                *k /= c;
            }
        } else {
            for (k, rkc) in krev.iter_mut().zip(&self.kdata.rkcn) {
                *k *= rkc;
            }
        }
        Ok(krev)
    }
    /// equilibrium constants of all reactions, reversible or not, in concentration units
    pub fn get_equilibrium_constants(&mut self) -> Result<Vec<f64>, KineticsError> {
        self.rxn_phase()?;
        self.update_rates_phi();
        let rt = self.fill_shifted_mu0();
        let mut kc = vec![0.0; self.n_reactions()];
        self.stoich.get_reaction_delta(&self.mu0, &mut kc);
        Ok(kc.iter().map(|d| (-d / rt).exp()).collect())
    }
    /// Exchange current densities of the charge transfer reactions: kf times (1/Kc)^beta.
    /// Reactions without charge transfer report their forward rate constant.
    pub fn get_exchange_current_densities(&mut self) -> Result<Vec<f64>, KineticsError> {
        self.update_rop()?;
        let mut i0 = self.kdata.rfn.clone();
        for (i, &irxn) in self.ctrxn.iter().enumerate() {
            i0[irxn] *= self.kdata.rkcn[irxn].powf(self.beta[i]);
        }
        Ok(i0)
    }

    pub fn get_activation_energies(&self) -> Vec<f64> {
        self.E.clone()
    }

    pub fn get_activity_concentrations(&mut self) -> Vec<f64> {
        self.update_rates_C();
        self.conc.clone()
    }

    ////////////////////////////////////////REACTION DELTAS//////////////////////////////////////////

    fn reaction_delta_of<F>(&mut self, per_phase: F) -> Vec<f64>
    where
        F: Fn(&PhaseModel) -> Vec<f64>,
    {
        for n in 0..self.phases.len() {
            let v = per_phase(&self.phases[n]);
            let s = self.start[n];
            self.grt[s..s + v.len()].copy_from_slice(&v);
        }
        let mut delta = vec![0.0; self.n_reactions()];
        self.stoich.get_reaction_delta(&self.grt, &mut delta);
        delta
    }
    /// reaction Gibbs energy change at the current composition, J/kmol
    pub fn get_delta_gibbs(&mut self) -> Vec<f64> {
        self.reaction_delta_of(|p| p.get_chem_potentials())
    }

    pub fn get_delta_electrochem_potentials(&mut self) -> Vec<f64> {
        self.reaction_delta_of(|p| p.get_electrochem_potentials())
    }

    pub fn get_delta_enthalpy(&mut self) -> Vec<f64> {
        self.reaction_delta_of(|p| p.get_partial_molar_enthalpies())
    }
    /// J/kmol/K
    pub fn get_delta_entropy(&mut self) -> Vec<f64> {
        self.reaction_delta_of(|p| p.get_partial_molar_entropies())
    }

    pub fn get_delta_ss_gibbs(&mut self) -> Vec<f64> {
        self.reaction_delta_of(|p| p.get_standard_chem_potentials())
    }

    pub fn get_delta_ss_enthalpy(&mut self) -> Vec<f64> {
        self.reaction_delta_of(|p| {
            let RT = p.RT();
            p.get_enthalpy_RT().iter().map(|h| h * RT).collect()
        })
    }

    pub fn get_delta_ss_entropy(&mut self) -> Vec<f64> {
        self.reaction_delta_of(|p| {
            p.get_entropy_R()
                .iter()
                .map(|s| s * GAS_CONSTANT)
                .collect()
        })
    }

    ////////////////////////////////////////PERTURBATION, EXISTENCE//////////////////////////////////////////

    pub fn multiplier(&self, i: usize) -> f64 {
        self.perturb[i]
    }
    /// perturbation factor of reaction i, multiplies its forward and reverse rate constants
    pub fn set_multiplier(&mut self, i: usize, f: f64) -> Result<(), KineticsError> {
        self.check_reaction(i)?;
        self.perturb[i] = f;
        self.kdata.ROP_ok = false;
        Ok(())
    }
    /// transfer coefficient of reaction irxn, 0 for reactions without charge transfer
    pub fn electrochem_beta(&self, irxn: usize) -> f64 {
        self.ctrxn
            .iter()
            .position(|&r| r == irxn)
            .map(|i| self.beta[i])
            .unwrap_or(0.0)
    }
    /// Marks a phase as existing or not. A phase that does not exist is also not stable.
    /// Rate gating is active while at least one phase is flagged as not existing.
    pub fn set_phase_existence(&mut self, iphase: usize, exists: bool) -> Result<(), KineticsError> {
        self.check_phase(iphase)?;
        if exists {
            if !self.phase_exists[iphase] {
                self.phase_exists_check = self.phase_exists_check.saturating_sub(1);
                self.phase_exists[iphase] = true;
            }
            self.phase_is_stable[iphase] = true;
        } else {
            if self.phase_exists[iphase] {
                self.phase_exists_check += 1;
                self.phase_exists[iphase] = false;
            }
            self.phase_is_stable[iphase] = false;
        }
        self.kdata.ROP_ok = false;
        Ok(())
    }

    pub fn phase_existence(&self, iphase: usize) -> Result<bool, KineticsError> {
        self.check_phase(iphase)?;
        Ok(self.phase_exists[iphase])
    }

    pub fn phase_stability(&self, iphase: usize) -> Result<bool, KineticsError> {
        self.check_phase(iphase)?;
        Ok(self.phase_is_stable[iphase])
    }

    pub fn set_phase_stability(&mut self, iphase: usize, is_stable: bool) -> Result<(), KineticsError> {
        self.check_phase(iphase)?;
        self.phase_is_stable[iphase] = is_stable;
        self.kdata.ROP_ok = false;
        Ok(())
    }

    pub fn phase_exists_check(&self) -> usize {
        self.phase_exists_check
    }

    ////////////////////////////////////////DIAGNOSTICS//////////////////////////////////////////

    /// Table of the reversible reactions with their reaction electrochemical potential
    /// change over RT and the rates of progress; the last column is net/(fwd + rev), which
    /// approaches zero for reactions in partial equilibrium. The table is logged and returned.
    pub fn check_partial_equil(&mut self) -> Result<String, KineticsError> {
        let mut out = String::new();
        if self.revindex.is_empty() {
            return Ok(out);
        }
        let rt = self.RT()?;
        let rmu = self.get_delta_electrochem_potentials();
        let frop = self.get_fwd_rates_of_progress()?;
        let rrop = self.get_rev_rates_of_progress()?;
        let netrop = self.get_net_rates_of_progress()?;
        out.push_str(&format!("T = {} {}\n", rt / GAS_CONSTANT, rt));
        let mut table = Table::new();
        table.add_row(row!["Reaction", "dmu/RT", "fwd ROP", "rev ROP", "net ROP", "net/(fwd+rev)"]);
        for &irxn in &self.revindex {
            let total = frop[irxn] + rrop[irxn];
            let ratio = if total != 0.0 { netrop[irxn] / total } else { 0.0 };
            table.add_row(row![
                self.equations[irxn],
                format!("{:.6e}", rmu[irxn] / rt),
                format!("{:12.6e}", frop[irxn]),
                format!("{:12.6e}", rrop[irxn]),
                format!("{:12.6e}", netrop[irxn]),
                format!("{:12.6e}", ratio)
            ]);
        }
        out.push_str(&table.to_string());
        info!("{}", out);
        Ok(out)
    }

    ////////////////////////////////////////COVERAGES//////////////////////////////////////////

    /// Integrates the surface coverages over `tstep` seconds with the bulk phases held fixed.
    pub fn advance_coverages(&mut self, tstep: f64) -> Result<(), KineticsError> {
        let mut integrator = self.integrator.take().ok_or(KineticsError::NotFinalized)?;
        let result = integrator.integrate(self, 0.0, tstep);
        self.integrator = Some(integrator);
        if let Err(e) = &result {
            warn!("advance_coverages failed: {}", e);
        }
        result
    }
    /// Drives the coverages to the state where the net production rates of all surface
    /// species vanish. `time_scale` is the length of the pseudo transient used by
    /// `SteadyStateMode::TransientInitialization`; non positive values select the default.
    pub fn solve_pseudo_steady_state(
        &mut self,
        mode: SteadyStateMode,
        time_scale: f64,
    ) -> Result<(), KineticsError> {
        let mut integrator = self.integrator.take().ok_or(KineticsError::NotFinalized)?;
        let result = integrator.solve_pseudo_steady_state(self, mode, time_scale);
        self.integrator = Some(integrator);
        result
    }

    pub fn integrator(&self) -> Option<&ImplicitSurfChem> {
        self.integrator.as_ref()
    }

    pub fn integrator_mut(&mut self) -> Option<&mut ImplicitSurfChem> {
        self.integrator.as_mut()
    }
}

/// exp(x) with the exponent saturated logarithmically beyond +-345
pub fn butler_volmer_factor(ecoeff: f64) -> f64 {
    let e = if ecoeff > BV_EXPONENT_LIMIT {
        BV_SATURATION_OFFSET + ecoeff.ln()
    } else if ecoeff < -BV_EXPONENT_LIMIT {
        -BV_SATURATION_OFFSET - (-ecoeff).ln()
    } else {
        ecoeff
    };
    e.exp()
}

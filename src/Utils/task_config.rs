//! Serde description of a calculation task and the builders that turn it into phase models,
//! an equilibrium problem and an interface kinetics object.
//!
//! Species are described with the same record the phases use ([`Species`]): name, element
//! composition, charge, standard state thermo fit, molar volume and site size. Reactions
//! refer to species by name; names are resolved against the species of all phases in the
//! order the phases are listed.
use crate::Kinetics::ImplicitSurfChem::SteadyStateMode;
use crate::Kinetics::InterfaceKinetics::{
    InterfaceKinetics, InterfaceReaction, KineticsError, KineticsKind, RateCoeffType,
};
use crate::Kinetics::RateCoeff::{CoverageDependency, SurfaceArrhenius};
use crate::Thermodynamics::ChemEquilibrium::VcsProblem::{UnitsFormat, VcsError, VcsProblem};
use crate::Thermodynamics::ChemEquilibrium::VcsSolver::VcsSolver;
use crate::Thermodynamics::Phases::IdealGasPhase::IdealGasPhase;
use crate::Thermodynamics::Phases::IdealSolutionPhase::IdealSolutionPhase;
use crate::Thermodynamics::Phases::IonsFromNeutral::{IonSolnType, IonsFromNeutralPhase};
use crate::Thermodynamics::Phases::PhaseCore::{PhaseError, Species};
use crate::Thermodynamics::Phases::StoichSubstance::StoichSubstance;
use crate::Thermodynamics::Phases::SurfPhase::SurfPhase;
use crate::Thermodynamics::Phases::phase_api::{PhaseModel, ThermoPhaseTrait};
use crate::Thermodynamics::constants::ONE_ATM;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read task file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("error parsing section {section} at line {line}, column {column}: {message}")]
    Parse {
        section: String,
        line: usize,
        column: usize,
        message: String,
    },
    #[error("section {0} not found in the task file")]
    MissingSection(String),
    #[error("species not found: {0}")]
    UnknownSpecies(String),
    #[error("invalid phase {phase}: {reason}")]
    InvalidPhase { phase: String, reason: String },
    #[error(transparent)]
    Phase(#[from] PhaseError),
    #[error(transparent)]
    Vcs(#[from] VcsError),
    #[error(transparent)]
    Kinetics(#[from] KineticsError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhaseModelKind {
    IdealGas,
    IdealSolution,
    StoichSubstance,
    Surface,
    Edge,
    IonsFromNeutral,
}

fn default_T() -> f64 {
    298.15
}

fn default_P() -> f64 {
    ONE_ATM
}

fn default_true() -> bool {
    true
}

/// temperature (K) and pressure (Pa) applied to every phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conditions {
    #[serde(default = "default_T")]
    pub T: f64,
    #[serde(default = "default_P")]
    pub P: f64,
}

impl Default for Conditions {
    fn default() -> Self {
        Conditions {
            T: default_T(),
            P: default_P(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseConfig {
    pub name: String,
    pub model: PhaseModelKind,
    pub species: Vec<Species>,
    /// kmol/m2 for surfaces, kmol/m for edges
    #[serde(default)]
    pub site_density: Option<f64>,
    /// mole fractions, or coverages for surface and edge phases
    #[serde(default)]
    pub composition: Option<Vec<f64>>,
    /// V
    #[serde(default)]
    pub electric_potential: f64,
    /// phase of neutral molecules an ionic phase is built from
    #[serde(default)]
    pub neutral: Option<Box<PhaseConfig>>,
    #[serde(default)]
    pub ion_solution: Option<IonSolnType>,
}

impl PhaseConfig {
    fn invalid(&self, reason: &str) -> ConfigError {
        ConfigError::InvalidPhase {
            phase: self.name.clone(),
            reason: reason.to_string(),
        }
    }

    pub fn build(&self, conditions: &Conditions) -> Result<PhaseModel, ConfigError> {
        let mut phase: PhaseModel = match self.model {
            PhaseModelKind::IdealGas => IdealGasPhase::new(&self.name, self.species.clone())?.into(),
            PhaseModelKind::IdealSolution => {
                IdealSolutionPhase::new(&self.name, self.species.clone())?.into()
            }
            PhaseModelKind::StoichSubstance => {
                if self.species.len() != 1 {
                    return Err(self.invalid("a stoichiometric substance has exactly one species"));
                }
                StoichSubstance::new(&self.name, self.species[0].clone())?.into()
            }
            PhaseModelKind::Surface | PhaseModelKind::Edge => {
                let n0 = self
                    .site_density
                    .ok_or_else(|| self.invalid("site_density is required"))?;
                if self.model == PhaseModelKind::Surface {
                    SurfPhase::new(&self.name, self.species.clone(), n0)?.into()
                } else {
                    SurfPhase::edge(&self.name, self.species.clone(), n0)?.into()
                }
            }
            PhaseModelKind::IonsFromNeutral => {
                let neutral = self
                    .neutral
                    .as_ref()
                    .ok_or_else(|| self.invalid("the neutral molecule phase is missing"))?
                    .build(conditions)?;
                let soln = self.ion_solution.unwrap_or(IonSolnType::SingleAnion);
                IonsFromNeutralPhase::new(&self.name, self.species.clone(), neutral, soln)?.into()
            }
        };
        phase.set_state_TP(conditions.T, conditions.P);
        phase.set_electric_potential(self.electric_potential);
        if let Some(x) = &self.composition {
            match self.model {
                PhaseModelKind::Surface | PhaseModelKind::Edge => phase.set_coverages(x)?,
                PhaseModelKind::IonsFromNeutral => {
                    warn!(
                        "composition of ionic phase {} is derived from its neutral phase, the given one is ignored",
                        self.name
                    );
                }
                _ => phase.set_mole_fractions(x)?,
            }
        }
        Ok(phase)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquilibriumConfig {
    /// species name -> initial kmol; species not listed start at zero
    pub initial_moles: BTreeMap<String, f64>,
    #[serde(default)]
    pub tolmaj: Option<f64>,
    #[serde(default)]
    pub tolmin: Option<f64>,
    #[serde(default)]
    pub max_iterations: Option<usize>,
    #[serde(default)]
    pub units: UnitsFormat,
    /// path of the csv report written after the solve
    #[serde(default)]
    pub csv_report: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageConfig {
    /// name of a species of the surface (edge) phase
    pub species: String,
    #[serde(default)]
    pub a: f64,
    #[serde(default)]
    pub m: f64,
    #[serde(default)]
    pub E: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionConfig {
    pub equation: String,
    /// species name -> stoichiometric coefficient
    pub reactants: BTreeMap<String, f64>,
    pub products: BTreeMap<String, f64>,
    pub A: f64,
    #[serde(default)]
    pub b: f64,
    /// J/kmol
    #[serde(default)]
    pub E: f64,
    #[serde(default)]
    pub coverage: Vec<CoverageConfig>,
    #[serde(default)]
    pub beta: f64,
    #[serde(default)]
    pub rate_coeff_type: RateCoeffType,
    #[serde(default = "default_true")]
    pub reversible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KineticsConfig {
    pub kind: KineticsKind,
    pub reactions: Vec<ReactionConfig>,
    /// integrate the coverages over this time (s) after the mechanism is built
    #[serde(default)]
    pub advance_time: Option<f64>,
    #[serde(default)]
    pub steady_state: Option<SteadyStateMode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TaskConfig {
    #[serde(default)]
    pub conditions: Conditions,
    pub phases: Vec<PhaseConfig>,
    #[serde(default)]
    pub equilibrium: Option<EquilibriumConfig>,
    #[serde(default)]
    pub kinetics: Option<KineticsConfig>,
}

impl TaskConfig {
    pub fn build_phases(&self) -> Result<Vec<PhaseModel>, ConfigError> {
        self.phases
            .iter()
            .map(|p| p.build(&self.conditions))
            .collect()
    }
    /// initial mole vector in the species order of the phases
    fn initial_moles(&self, phases: &[PhaseModel], cfg: &EquilibriumConfig) -> Result<Vec<f64>, ConfigError> {
        let names: Vec<&str> = phases
            .iter()
            .flat_map(|p| (0..p.n_species()).map(move |k| p.species_name(k)))
            .collect();
        for name in cfg.initial_moles.keys() {
            if !names.contains(&name.as_str()) {
                return Err(ConfigError::UnknownSpecies(name.clone()));
            }
        }
        Ok(names
            .iter()
            .map(|n| cfg.initial_moles.get(*n).copied().unwrap_or(0.0))
            .collect())
    }

    pub fn build_equilibrium_problem(&self) -> Result<VcsProblem, ConfigError> {
        let cfg = self
            .equilibrium
            .as_ref()
            .ok_or_else(|| ConfigError::MissingSection("EQUILIBRIUM".to_string()))?;
        let phases = self.build_phases()?;
        let moles = self.initial_moles(&phases, cfg)?;
        let mut prob = VcsProblem::from_phases(phases, &moles)?;
        prob.set_state_TP(self.conditions.T, self.conditions.P)?;
        if let Some(t) = cfg.tolmaj {
            prob.tolmaj = t;
        }
        if let Some(t) = cfg.tolmin {
            prob.tolmin = t;
        }
        prob.units = cfg.units;
        Ok(prob)
    }
    /// Builds, initialises and finalizes the kinetics object with all phases of the task.
    pub fn build_kinetics(&self) -> Result<InterfaceKinetics, ConfigError> {
        let cfg = self
            .kinetics
            .as_ref()
            .ok_or_else(|| ConfigError::MissingSection("KINETICS".to_string()))?;
        let mut kin = InterfaceKinetics::new(cfg.kind);
        for phase in self.build_phases()? {
            kin.add_phase(phase)?;
        }
        kin.init();
        let surf = kin.reaction_phase_index();
        for rc in &cfg.reactions {
            let lookup = |side: &BTreeMap<String, f64>| -> Result<Vec<(usize, f64)>, ConfigError> {
                side.iter()
                    .map(|(name, nu)| {
                        kin.kinetics_species_index(name)
                            .map(|k| (k, *nu))
                            .ok_or_else(|| ConfigError::UnknownSpecies(name.clone()))
                    })
                    .collect()
            };
            let reactants = lookup(&rc.reactants)?;
            let products = lookup(&rc.products)?;
            let mut rate = SurfaceArrhenius::new(rc.A, rc.b, rc.E);
            for cov in &rc.coverage {
                let species = surf
                    .and_then(|s| kin.thermo(s).species_index(&cov.species))
                    .ok_or_else(|| ConfigError::UnknownSpecies(cov.species.clone()))?;
                rate = rate.with_coverage(CoverageDependency {
                    species,
                    a: cov.a,
                    m: cov.m,
                    E: cov.E,
                });
            }
            let mut rxn = InterfaceReaction::new(&rc.equation, reactants, products, rate)
                .with_beta(rc.beta)
                .with_rate_coeff_type(rc.rate_coeff_type);
            if !rc.reversible {
                rxn = rxn.irreversible();
            }
            kin.add_reaction(rxn)?;
        }
        kin.finalize()?;
        info!(
            "kinetics built from task: {} phases, {} reactions",
            kin.n_phases(),
            kin.n_reactions()
        );
        Ok(kin)
    }
}

/// outcome of [`TaskConfig::run`]
#[derive(Debug, Default)]
pub struct TaskOutcome {
    pub equilibrium: Option<VcsProblem>,
    pub kinetics: Option<InterfaceKinetics>,
}

impl TaskConfig {
    /// Solves the equilibrium problem and builds and runs the kinetics, whichever are
    /// configured. The csv report is written when a path is given.
    pub fn run(&self) -> Result<TaskOutcome, ConfigError> {
        let mut outcome = TaskOutcome::default();
        if let Some(cfg) = &self.equilibrium {
            let mut prob = self.build_equilibrium_problem()?;
            prob.prob_report()?;
            let mut solver = VcsSolver::new();
            if let Some(n) = cfg.max_iterations {
                solver.max_iterations = n;
            }
            solver.solve(&mut prob)?;
            if let Some(path) = &cfg.csv_report {
                prob.report_csv(path)?;
                info!("equilibrium report written to {}", path);
            }
            outcome.equilibrium = Some(prob);
        }
        if let Some(cfg) = &self.kinetics {
            let mut kin = self.build_kinetics()?;
            if let Some(dt) = cfg.advance_time {
                kin.advance_coverages(dt)?;
            }
            if let Some(mode) = cfg.steady_state {
                kin.solve_pseudo_steady_state(mode, -1.0)?;
            }
            outcome.kinetics = Some(kin);
        }
        if outcome.equilibrium.is_none() && outcome.kinetics.is_none() {
            warn!("task has neither an equilibrium nor a kinetics section, nothing to do");
        }
        Ok(outcome)
    }
}

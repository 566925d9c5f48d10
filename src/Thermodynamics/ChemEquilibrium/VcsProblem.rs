//! Full statement of a multiphase equilibrium problem: species, element constraints,
//! phases, formula matrix, element abundance targets, initial mole numbers, units and
//! tolerances. The solver reads the problem and writes its results back into it.
use crate::Thermodynamics::ChemEquilibrium::VolPhase::{ElementType, VolPhase};
use crate::Thermodynamics::Phases::PhaseCore::PhaseError;
use crate::Thermodynamics::Phases::phase_api::{PhaseModel, ThermoPhaseTrait};
use crate::Thermodynamics::constants::{CAL_TO_J, GAS_CONSTANT};
use log::{info, warn};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VcsError {
    #[error("invalid problem dimensions: {0}")]
    InvalidDimensions(String),
    #[error("element must have a name")]
    EmptyElementName,
    #[error("cannot shrink {what} storage to {requested}, {live} are in use")]
    Shrink {
        what: &'static str,
        requested: usize,
        live: usize,
    },
    #[error("{what} index {index} out of range (size {n})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        n: usize,
    },
    #[error("phase {0} has no thermodynamic model attached")]
    PhaseNotInitialized(usize),
    #[error(transparent)]
    Phase(#[from] PhaseError),
    #[error("singular Newton matrix: {0}")]
    Singular(String),
    #[error("equilibrium not converged after {iterations} iterations (element residual {residual:e})")]
    NotConverged { iterations: usize, residual: f64 },
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Units of the chemical potentials stored in and reported by the problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum UnitsFormat {
    /// mu / RT
    #[default]
    Unitless,
    /// kcal/gmol
    KcalMol,
    /// kJ/gmol
    KJMol,
    /// mu / R
    Kelvin,
    /// J/kmol
    Mks,
}

impl UnitsFormat {
    /// converts a chemical potential in J/kmol to these units
    pub fn from_mks(&self, value: f64, T: f64) -> f64 {
        match self {
            UnitsFormat::Unitless => value / (GAS_CONSTANT * T),
            UnitsFormat::KcalMol => value / (CAL_TO_J * 1.0e6),
            UnitsFormat::KJMol => value * 1.0e-6,
            UnitsFormat::Kelvin => value / GAS_CONSTANT,
            UnitsFormat::Mks => value,
        }
    }

    pub fn to_mks(&self, value: f64, T: f64) -> f64 {
        match self {
            UnitsFormat::Unitless => value * GAS_CONSTANT * T,
            UnitsFormat::KcalMol => value * CAL_TO_J * 1.0e6,
            UnitsFormat::KJMol => value * 1.0e6,
            UnitsFormat::Kelvin => value * GAS_CONSTANT,
            UnitsFormat::Mks => value,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            UnitsFormat::Unitless => "(unitless)",
            UnitsFormat::KcalMol => "(kcal/gmol)",
            UnitsFormat::KJMol => "(kJ/gmol)",
            UnitsFormat::Kelvin => "(Kelvin)",
            UnitsFormat::Mks => "(J/kmol)",
        }
    }
}

/// what the unknown of a species stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SpeciesUnknownType {
    #[default]
    MolNum,
    /// the electric potential of the phase is itself solved for
    InterfacialVoltage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ProblemType {
    /// constant temperature and pressure
    #[default]
    TP,
}

#[derive(Debug, Clone)]
pub struct VcsProblem {
    pub prob_type: ProblemType,
    pub nspecies: usize,
    pub ne: usize,
    pub NPhase: usize,
    nspecies_alloc: usize,
    ne_alloc: usize,
    nphase_alloc: usize,
    pub T: f64,
    /// pressure, Pa
    pub PresPA: f64,
    /// total volume of all phases, m3
    pub Vol: f64,
    /// chemical potentials of the species in `units`
    pub gibbs_species: Vec<f64>,
    /// mole numbers, kmol
    pub w: Vec<f64>,
    /// mole fractions inside each phase
    pub mf: Vec<f64>,
    /// element abundance targets, kmol
    pub gai: Vec<f64>,
    /// ne_alloc x nspecies_alloc
    pub formula_matrix: DMatrix<f64>,
    pub species_unknown_type: Vec<SpeciesUnknownType>,
    /// partial molar volumes, m3/kmol
    pub vol_pm: Vec<f64>,
    /// owning phase of each species, -1 while unassigned
    pub phase_id: Vec<i64>,
    pub sp_name: Vec<String>,
    pub el_name: Vec<String>,
    pub el_type: Vec<ElementType>,
    pub el_active: Vec<bool>,
    pub wt_species: Vec<f64>,
    pub charge: Vec<f64>,
    pub units: UnitsFormat,
    /// -1: no initial estimate, >= 0: `w` holds an estimate
    pub iest: i32,
    pub tolmaj: f64,
    pub tolmin: f64,
    pub iterations: usize,
    pub num_basis_optimizations: usize,
    pub print_lvl: i32,
    pub vphase_list: Vec<VolPhase>,
}

impl VcsProblem {
    /// All counts must be positive and there can not be fewer species than phases.
    pub fn new(nsp: usize, nel: usize, nph: usize) -> Result<Self, VcsError> {
        if nsp == 0 {
            return Err(VcsError::InvalidDimensions(
                "number of species is zero".to_string(),
            ));
        }
        if nel == 0 {
            return Err(VcsError::InvalidDimensions(
                "number of elements is zero".to_string(),
            ));
        }
        if nph == 0 {
            return Err(VcsError::InvalidDimensions(
                "number of phases is zero".to_string(),
            ));
        }
        if nsp < nph {
            return Err(VcsError::InvalidDimensions(format!(
                "number of species ({}) is less than number of phases ({})",
                nsp, nph
            )));
        }
        Ok(VcsProblem {
            prob_type: ProblemType::TP,
            nspecies: nsp,
            ne: nel,
            NPhase: nph,
            nspecies_alloc: nsp,
            ne_alloc: nel,
            nphase_alloc: nph,
            T: 298.15,
            PresPA: 1.0,
            Vol: 0.0,
            gibbs_species: vec![0.0; nsp],
            w: vec![0.0; nsp],
            mf: vec![0.0; nsp],
            gai: vec![0.0; nel],
            formula_matrix: DMatrix::zeros(nel, nsp),
            species_unknown_type: vec![SpeciesUnknownType::MolNum; nsp],
            vol_pm: vec![0.0; nsp],
            phase_id: vec![-1; nsp],
            sp_name: vec![String::new(); nsp],
            el_name: vec![String::new(); nel],
            el_type: vec![ElementType::AbsPos; nel],
            el_active: vec![true; nel],
            wt_species: vec![0.0; nsp],
            charge: vec![0.0; nsp],
            units: UnitsFormat::Unitless,
            iest: -1,
            tolmaj: 1.0e-8,
            tolmin: 1.0e-6,
            iterations: 0,
            num_basis_optimizations: 0,
            print_lvl: 0,
            vphase_list: (0..nph).map(VolPhase::new).collect(),
        })
    }

    pub fn species_capacity(&self) -> usize {
        self.nspecies_alloc
    }

    pub fn element_capacity(&self) -> usize {
        self.ne_alloc
    }

    pub fn phase_capacity(&self) -> usize {
        self.nphase_alloc
    }

    /// Grows the species storage to `nsp` when it exceeds the capacity or `force` is set.
    /// The species count itself is unchanged.
    pub fn resize_species(&mut self, nsp: usize, force: bool) -> Result<(), VcsError> {
        if nsp < self.nspecies {
            return Err(VcsError::Shrink {
                what: "species",
                requested: nsp,
                live: self.nspecies,
            });
        }
        if force || nsp > self.nspecies_alloc {
            self.gibbs_species.resize(nsp, 0.0);
            self.w.resize(nsp, 0.0);
            self.mf.resize(nsp, 0.0);
            self.formula_matrix.resize_mut(self.ne_alloc, nsp, 0.0);
            self.species_unknown_type
                .resize(nsp, SpeciesUnknownType::MolNum);
            self.vol_pm.resize(nsp, 0.0);
            self.phase_id.resize(nsp, -1);
            self.sp_name.resize(nsp, String::new());
            self.wt_species.resize(nsp, 0.0);
            self.charge.resize(nsp, 0.0);
            self.nspecies_alloc = nsp;
        }
        Ok(())
    }

    pub fn resize_elements(&mut self, nel: usize, force: bool) -> Result<(), VcsError> {
        if nel < self.ne {
            return Err(VcsError::Shrink {
                what: "element",
                requested: nel,
                live: self.ne,
            });
        }
        if force || nel > self.ne_alloc {
            self.gai.resize(nel, 0.0);
            self.formula_matrix
                .resize_mut(nel, self.nspecies_alloc, 0.0);
            self.el_name.resize(nel, String::new());
            self.el_type.resize(nel, ElementType::AbsPos);
            self.el_active.resize(nel, true);
            self.ne_alloc = nel;
        }
        Ok(())
    }

    pub fn resize_phase(&mut self, nph: usize, force: bool) -> Result<(), VcsError> {
        if nph < self.NPhase {
            return Err(VcsError::Shrink {
                what: "phase",
                requested: nph,
                live: self.NPhase,
            });
        }
        if force || nph > self.nphase_alloc {
            let start = self.vphase_list.len();
            self.vphase_list.extend((start..nph).map(VolPhase::new));
            self.vphase_list.truncate(nph);
            self.nphase_alloc = nph;
        }
        Ok(())
    }

    /// Appends an element constraint with zero abundance and an empty formula row,
    /// returns its index.
    pub fn add_element(
        &mut self,
        name: &str,
        el_type: ElementType,
        active: bool,
    ) -> Result<usize, VcsError> {
        if name.is_empty() {
            return Err(VcsError::EmptyElementName);
        }
        let nel = self.ne + 1;
        self.resize_elements(nel, true)?;
        self.ne = nel;
        self.el_name[nel - 1] = name.to_string();
        self.el_type[nel - 1] = el_type;
        self.el_active[nel - 1] = active;
        Ok(nel - 1)
    }

    /// Maps every element constraint of the phase onto the global list, adding the ones
    /// not yet present. Names are compared case-sensitively.
    pub fn add_phase_elements(&mut self, vp: &mut VolPhase) -> Result<(), VcsError> {
        for e_vp in 0..vp.n_elem_constraints() {
            let found = self.el_name[..self.ne]
                .iter()
                .position(|en| en == vp.element_name(e_vp));
            let e = match found {
                Some(e) => e,
                None => {
                    let name = vp.element_name(e_vp).to_string();
                    self.add_element(&name, vp.element_type(e_vp), vp.element_active(e_vp))?
                }
            };
            vp.set_elem_global_index(e_vp, e)?;
        }
        Ok(())
    }

    /// Copies the formula column of local species `k` into global column `kT` and records
    /// `kT` on the phase.
    pub fn add_one_phase_species(
        &mut self,
        vp: &mut VolPhase,
        k: usize,
        kT: usize,
    ) -> Result<usize, VcsError> {
        if kT >= self.nspecies {
            return Err(VcsError::IndexOutOfRange {
                what: "species",
                index: kT,
                n: self.nspecies,
            });
        }
        if k >= vp.n_species {
            return Err(VcsError::IndexOutOfRange {
                what: "phase species",
                index: k,
                n: vp.n_species,
            });
        }
        for e_vp in 0..vp.n_elem_constraints() {
            let e = vp
                .elem_global_index(e_vp)
                .ok_or(VcsError::IndexOutOfRange {
                    what: "global element of phase element",
                    index: e_vp,
                    n: self.ne,
                })?;
            self.formula_matrix[(e, kT)] = vp.formula_matrix[(e_vp, k)];
        }
        vp.set_sp_global_index_vcs(k, kT)?;
        Ok(kT)
    }

    /// gai = formula_matrix * w
    pub fn set_gai(&mut self) {
        for e in 0..self.ne {
            self.gai[e] = (0..self.nspecies)
                .map(|k| self.formula_matrix[(e, k)] * self.w[k])
                .sum();
        }
    }

    /// Builds the problem from configured phases. `moles` are the initial mole numbers of
    /// all species, phase after phase; they become the estimate and define `gai`.
    /// Temperature and pressure are taken from the first phase.
    pub fn from_phases(phases: Vec<PhaseModel>, moles: &[f64]) -> Result<Self, VcsError> {
        let nsp: usize = phases.iter().map(|p| p.n_species()).sum();
        let nph = phases.len();
        if moles.len() != nsp {
            return Err(VcsError::Phase(PhaseError::LengthMismatch {
                expected: nsp,
                got: moles.len(),
            }));
        }
        let (T, P) = match phases.first() {
            Some(p) => (p.temperature(), p.pressure()),
            None => {
                return Err(VcsError::InvalidDimensions(
                    "number of phases is zero".to_string(),
                ));
            }
        };
        let mut prob = VcsProblem::new(nsp, 1, nph)?;
        prob.ne = 0;
        prob.T = T;
        prob.PresPA = P;
        let mut kT = 0;
        for (iph, phase) in phases.into_iter().enumerate() {
            let mut vp = VolPhase::from_phase(iph, phase);
            prob.add_phase_elements(&mut vp)?;
            let tp = vp.thermo()?.clone();
            let vol = tp.get_partial_molar_volumes();
            for k in 0..vp.n_species {
                prob.add_one_phase_species(&mut vp, k, kT)?;
                prob.sp_name[kT] = tp.species_name(k).to_string();
                prob.phase_id[kT] = iph as i64;
                prob.wt_species[kT] = tp.molecular_weight(k);
                prob.charge[kT] = tp.charge(k);
                prob.vol_pm[kT] = vol[k];
                kT += 1;
            }
            prob.vphase_list[iph] = vp;
        }
        prob.w.copy_from_slice(moles);
        prob.iest = 0;
        prob.set_gai();
        prob.update_phases_from_w()?;
        info!(
            "equilibrium problem: {} species, {} element constraints, {} phases",
            prob.nspecies, prob.ne, prob.NPhase
        );
        Ok(prob)
    }

    pub fn set_state_TP(&mut self, T: f64, P: f64) -> Result<(), VcsError> {
        self.T = T;
        self.PresPA = P;
        for vp in self.vphase_list.iter_mut().take(self.NPhase) {
            if vp.thermo.is_some() {
                vp.set_state_TP(T, P)?;
            }
        }
        Ok(())
    }

    pub fn species_index(&self, name: &str) -> Option<usize> {
        self.sp_name[..self.nspecies].iter().position(|n| n == name)
    }

    pub fn element_index(&self, name: &str) -> Option<usize> {
        self.el_name[..self.ne].iter().position(|n| n == name)
    }

    /// element abundances of the current mole numbers
    pub fn element_abundances(&self) -> Vec<f64> {
        (0..self.ne)
            .map(|e| {
                (0..self.nspecies)
                    .map(|k| self.formula_matrix[(e, k)] * self.w[k])
                    .sum()
            })
            .collect()
    }

    /// Pushes `w` into the phases (totals and compositions) and refreshes `mf`. Phases
    /// without moles keep the composition of their model.
    pub fn update_phases_from_w(&mut self) -> Result<(), VcsError> {
        let w = self.w.clone();
        for iph in 0..self.NPhase {
            let vp = &mut self.vphase_list[iph];
            if vp.thermo.is_none() {
                warn!("phase {} has no model, skipped", iph);
                continue;
            }
            vp.set_moles_from_vcs(&w)?;
            let x = vp.mole_fractions()?;
            for (k, xk) in x.iter().enumerate() {
                if let Some(kg) = vp.sp_global_index_vcs(k) {
                    self.mf[kg] = *xk;
                }
            }
        }
        Ok(())
    }

    /// total volume of all phases from partial molar volumes, m3
    pub fn total_volume(&self) -> Result<f64, VcsError> {
        let mut vol = 0.0;
        for vp in self.vphase_list.iter().take(self.NPhase) {
            let vpm = vp.partial_molar_volumes()?;
            let n_tot = vp.total_moles();
            for (k, v) in vpm.iter().enumerate() {
                if let Some(kg) = vp.sp_global_index_vcs(k) {
                    vol += v * self.mf[kg] * n_tot;
                }
            }
        }
        Ok(vol)
    }
}

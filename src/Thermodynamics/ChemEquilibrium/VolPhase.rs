//! Equilibrium-side view of one phase: element constraints in phase-local ordering, the
//! local -> global element and species maps, total and inert moles, and the thermodynamic
//! model used to evaluate the phase.
use crate::Thermodynamics::ChemEquilibrium::VcsProblem::{UnitsFormat, VcsError};
use crate::Thermodynamics::Phases::phase_api::{PhaseKind, PhaseModel, ThermoPhaseTrait};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

/// Kind of constraint an element row of the formula matrix stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementType {
    /// ordinary element, abundances are non-negative
    AbsPos,
    /// the electron "E", may be negative
    ElectronCharge,
    /// a phase is electrically neutral
    ChargeNeutrality,
    Other,
}

impl ElementType {
    /// integer code printed in the problem statement
    pub fn code(&self) -> i32 {
        match self {
            ElementType::AbsPos => 0,
            ElementType::ElectronCharge => 1,
            ElementType::ChargeNeutrality => 2,
            ElementType::Other => 6,
        }
    }
}

#[derive(Debug, Clone)]
pub struct VolPhase {
    pub VP_ID: usize,
    pub phase_name: String,
    pub single_species: bool,
    pub gas_phase: bool,
    /// equation of state tag of the phase model
    pub eqn_state: String,
    pub n_species: usize,
    pub el_names: Vec<String>,
    pub el_types: Vec<ElementType>,
    pub el_active: Vec<bool>,
    /// element constraints x species, phase-local ordering
    pub formula_matrix: DMatrix<f64>,
    /// local index of the charge neutrality row, if the phase has charged species
    pub charge_neutrality_element: Option<usize>,
    el_global_index: Vec<Option<usize>>,
    sp_global_index: Vec<Option<usize>>,
    total_moles: f64,
    total_moles_inert: f64,
    pub exists: bool,
    pub thermo: Option<PhaseModel>,
}

impl VolPhase {
    /// placeholder phase without species or model
    pub fn new(id: usize) -> Self {
        VolPhase {
            VP_ID: id,
            phase_name: String::new(),
            single_species: false,
            gas_phase: false,
            eqn_state: String::new(),
            n_species: 0,
            el_names: Vec::new(),
            el_types: Vec::new(),
            el_active: Vec::new(),
            formula_matrix: DMatrix::zeros(0, 0),
            charge_neutrality_element: None,
            el_global_index: Vec::new(),
            sp_global_index: Vec::new(),
            total_moles: 0.0,
            total_moles_inert: 0.0,
            exists: false,
            thermo: None,
        }
    }

    /// Copies the element constraints of a configured phase. The electron gets the
    /// `ElectronCharge` type; a phase with charged species receives an extra
    /// charge-neutrality row named `cn_<phase>` holding the species charges.
    pub fn from_phase(id: usize, phase: PhaseModel) -> Self {
        let n_species = phase.n_species();
        let mut el_names: Vec<String> = phase.element_names().to_vec();
        let mut el_types: Vec<ElementType> = el_names
            .iter()
            .map(|n| {
                if n == "E" {
                    ElementType::ElectronCharge
                } else {
                    ElementType::AbsPos
                }
            })
            .collect();
        let mut el_active = vec![true; el_names.len()];
        let charged = (0..n_species).any(|k| phase.charge(k) != 0.0);
        let n_rows = el_names.len() + usize::from(charged);
        let mut formula_matrix = DMatrix::zeros(n_rows, n_species);
        for m in 0..phase.n_elements() {
            for k in 0..n_species {
                formula_matrix[(m, k)] = phase.n_atoms(k, m);
            }
        }
        let mut charge_neutrality_element = None;
        if charged {
            let e = el_names.len();
            for k in 0..n_species {
                formula_matrix[(e, k)] = phase.charge(k);
            }
            el_names.push(format!("cn_{}", phase.name()));
            el_types.push(ElementType::ChargeNeutrality);
            el_active.push(true);
            charge_neutrality_element = Some(e);
        }
        let n_el = el_names.len();
        VolPhase {
            VP_ID: id,
            phase_name: phase.name().to_string(),
            single_species: n_species == 1,
            gas_phase: phase.phase_kind() == PhaseKind::Gas,
            eqn_state: phase.eos_name().to_string(),
            n_species,
            el_names,
            el_types,
            el_active,
            formula_matrix,
            charge_neutrality_element,
            el_global_index: vec![None; n_el],
            sp_global_index: vec![None; n_species],
            total_moles: 0.0,
            total_moles_inert: 0.0,
            exists: true,
            thermo: Some(phase),
        }
    }

    pub fn n_elem_constraints(&self) -> usize {
        self.el_names.len()
    }

    pub fn element_name(&self, e: usize) -> &str {
        &self.el_names[e]
    }

    pub fn element_type(&self, e: usize) -> ElementType {
        self.el_types[e]
    }

    pub fn element_active(&self, e: usize) -> bool {
        self.el_active[e]
    }

    pub fn set_elem_global_index(&mut self, e: usize, global: usize) -> Result<(), VcsError> {
        let n = self.el_global_index.len();
        let slot = self
            .el_global_index
            .get_mut(e)
            .ok_or(VcsError::IndexOutOfRange { what: "phase element", index: e, n })?;
        *slot = Some(global);
        Ok(())
    }

    pub fn elem_global_index(&self, e: usize) -> Option<usize> {
        self.el_global_index.get(e).copied().flatten()
    }

    pub fn set_sp_global_index_vcs(&mut self, k: usize, global: usize) -> Result<(), VcsError> {
        let n = self.sp_global_index.len();
        let slot = self
            .sp_global_index
            .get_mut(k)
            .ok_or(VcsError::IndexOutOfRange { what: "phase species", index: k, n })?;
        *slot = Some(global);
        Ok(())
    }

    pub fn sp_global_index_vcs(&self, k: usize) -> Option<usize> {
        self.sp_global_index.get(k).copied().flatten()
    }

    pub fn total_moles(&self) -> f64 {
        self.total_moles
    }

    pub fn total_moles_inert(&self) -> f64 {
        self.total_moles_inert
    }

    pub fn set_total_moles_inert(&mut self, moles: f64) {
        self.total_moles += moles - self.total_moles_inert;
        self.total_moles_inert = moles;
    }

    pub fn thermo(&self) -> Result<&PhaseModel, VcsError> {
        self.thermo
            .as_ref()
            .ok_or(VcsError::PhaseNotInitialized(self.VP_ID))
    }

    pub fn thermo_mut(&mut self) -> Result<&mut PhaseModel, VcsError> {
        let id = self.VP_ID;
        self.thermo.as_mut().ok_or(VcsError::PhaseNotInitialized(id))
    }

    pub fn set_state_TP(&mut self, T: f64, P: f64) -> Result<(), VcsError> {
        self.thermo_mut()?.set_state_TP(T, P);
        Ok(())
    }

    /// Gathers the phase mole numbers from the global vector, updates the totals and, when
    /// the phase holds any moles, the mole fractions of the phase model.
    pub fn set_moles_from_vcs(&mut self, w: &[f64]) -> Result<(), VcsError> {
        let mut n = Vec::with_capacity(self.n_species);
        for k in 0..self.n_species {
            let kg = self
                .sp_global_index_vcs(k)
                .ok_or(VcsError::IndexOutOfRange { what: "phase species", index: k, n: self.n_species })?;
            let nk = *w
                .get(kg)
                .ok_or(VcsError::IndexOutOfRange { what: "species", index: kg, n: w.len() })?;
            n.push(nk);
        }
        let sum: f64 = n.iter().sum();
        self.total_moles = sum + self.total_moles_inert;
        self.exists = self.total_moles > 0.0;
        if sum > 0.0 {
            self.thermo_mut()?.set_mole_fractions(&n)?;
        }
        Ok(())
    }

    pub fn mole_fractions(&self) -> Result<Vec<f64>, VcsError> {
        Ok(self.thermo()?.mole_fractions().to_vec())
    }

    /// reference state Gibbs energies (T, reference pressure) in the given units
    pub fn G0_calc(&self, units: UnitsFormat) -> Result<Vec<f64>, VcsError> {
        let tp = self.thermo()?;
        let T = tp.temperature();
        Ok(tp
            .get_gibbs_ref()
            .iter()
            .map(|g| units.from_mks(*g, T))
            .collect())
    }

    /// standard state chemical potentials at the current T and P in the given units
    pub fn GStar_calc(&self, units: UnitsFormat) -> Result<Vec<f64>, VcsError> {
        let tp = self.thermo()?;
        let T = tp.temperature();
        Ok(tp
            .get_standard_chem_potentials()
            .iter()
            .map(|g| units.from_mks(*g, T))
            .collect())
    }

    pub fn partial_molar_volumes(&self) -> Result<Vec<f64>, VcsError> {
        Ok(self.thermo()?.get_partial_molar_volumes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Thermodynamics::Phases::IdealGasPhase::IdealGasPhase;
    use crate::Thermodynamics::Phases::IdealSolutionPhase::IdealSolutionPhase;
    use crate::Thermodynamics::Phases::PhaseCore::Species;
    use crate::Thermodynamics::SpeciesThermo::SpeciesThermo;
    use approx::assert_relative_eq;

    #[test]
    fn test_gas_phase_constraints() {
        let sp = vec![
            Species::new("O2", &[("O", 2.0)], SpeciesThermo::constant_mu0(0.0)),
            Species::new("O", &[("O", 1.0)], SpeciesThermo::constant_mu0(1.0e8)),
        ];
        let gas: PhaseModel = IdealGasPhase::new("air", sp).unwrap().into();
        let vp = VolPhase::from_phase(3, gas);
        assert_eq!(vp.VP_ID, 3);
        assert!(vp.gas_phase);
        assert!(!vp.single_species);
        assert_eq!(vp.n_elem_constraints(), 1);
        assert_eq!(vp.charge_neutrality_element, None);
        assert_eq!(vp.element_type(0), ElementType::AbsPos);
        assert_relative_eq!(vp.formula_matrix[(0, 0)], 2.0);
        assert_eq!(vp.elem_global_index(0), None);
    }

    #[test]
    fn test_charged_phase_gets_neutrality_row() {
        let sp = vec![
            Species::new("Na+", &[("Na", 1.0), ("E", -1.0)], SpeciesThermo::constant_mu0(0.0))
                .with_charge(1.0)
                .with_molar_volume(0.02),
            Species::new("Cl-", &[("Cl", 1.0), ("E", 1.0)], SpeciesThermo::constant_mu0(0.0))
                .with_charge(-1.0)
                .with_molar_volume(0.02),
        ];
        let melt: PhaseModel = IdealSolutionPhase::new("melt", sp).unwrap().into();
        let vp = VolPhase::from_phase(0, melt);
        let cn = vp.charge_neutrality_element.unwrap();
        assert_eq!(vp.element_name(cn), "cn_melt");
        assert_eq!(vp.element_type(cn), ElementType::ChargeNeutrality);
        assert_relative_eq!(vp.formula_matrix[(cn, 1)], -1.0);
        let e = vp.el_names.iter().position(|n| n == "E").unwrap();
        assert_eq!(vp.element_type(e), ElementType::ElectronCharge);
        assert_eq!(ElementType::ChargeNeutrality.code(), 2);
    }

    #[test]
    fn test_moles_from_global_vector() {
        let sp = vec![
            Species::new("N2", &[("N", 2.0)], SpeciesThermo::constant_mu0(0.0)),
            Species::new("Ar", &[("Ar", 1.0)], SpeciesThermo::constant_mu0(0.0)),
        ];
        let gas: PhaseModel = IdealGasPhase::new("gas", sp).unwrap().into();
        let mut vp = VolPhase::from_phase(0, gas);
        vp.set_sp_global_index_vcs(0, 2).unwrap();
        vp.set_sp_global_index_vcs(1, 0).unwrap();
        assert!(vp.set_sp_global_index_vcs(2, 1).is_err());
        vp.set_moles_from_vcs(&[1.0, 5.0, 3.0]).unwrap();
        assert_relative_eq!(vp.total_moles(), 4.0);
        let x = vp.mole_fractions().unwrap();
        assert_relative_eq!(x[0], 0.75);
        vp.set_total_moles_inert(1.0);
        assert_relative_eq!(vp.total_moles(), 5.0);
        assert!(VolPhase::new(1).thermo().is_err());
    }
}

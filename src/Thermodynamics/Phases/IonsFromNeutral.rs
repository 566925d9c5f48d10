//! Ionic solution whose thermodynamics is inherited from a phase of neutral molecules
//! (e.g. a molten salt KCl described through K+ and Cl-).
//!
//! Every neutral molecule dissociates into ions according to a formula matrix
//! `fm[(k, j)]` (ions k per neutral molecule j) that is generated from the element compositions.
//! Species with zero charge are passed through unchanged. Only solutions with a single anion
//! (and any number of cations and passthrough species) are supported.
use crate::Thermodynamics::Phases::PhaseCore::{PhaseCore, PhaseError, Species};
use crate::Thermodynamics::Phases::phase_api::{PhaseKind, PhaseModel, ThermoPhaseTrait, XX_SMALL};
use crate::Thermodynamics::constants::{GAS_CONSTANT, SMALL_NUMBER};
use log::info;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IonSolnType {
    /// all species are neutral and map one to one onto the neutral phase
    PassThrough,
    SingleAnion,
    SingleCation,
    MultiCationAnion,
}

#[derive(Debug, Clone)]
pub struct IonsFromNeutralPhase {
    pub core: PhaseCore,
    pub neutral: Box<PhaseModel>,
    pub ion_soln_type: IonSolnType,
    /// ions per neutral molecule, n_ions x n_neutral
    pub fm: DMatrix<f64>,
    /// neutral molecule an ion (or passthrough species) is drawn from
    pub neutral_for_ion: Vec<Option<usize>>,
    pub cation_list: Vec<usize>,
    pub anion_list: Vec<usize>,
    pub passthrough_list: Vec<usize>,
    /// index of the anion for the single-anion case
    pub special_species: Option<usize>,
}

/// Largest multiple of the ion element vector that fits into the remaining neutral element
/// vector. Electrons are ignored and zero is returned when an element of the ion is exhausted
/// or when the ion shares no element with the neutral phase.
fn factor_overlap(el_names_n: &[String], el_n: &[f64], el_names_i: &[String], el_i: &[f64]) -> f64 {
    let mut f_max = 1.0e100;
    for (mi, name_i) in el_names_i.iter().enumerate() {
        if name_i == "E" || el_i[mi] <= 1.0e-13 {
            continue;
        }
        for (mn, name_n) in el_names_n.iter().enumerate() {
            if name_i == name_n {
                if el_n[mn] <= 1.0e-13 {
                    return 0.0;
                }
                f_max = f64::min(f_max, el_n[mn] / el_i[mi]);
            }
        }
    }
    if f_max >= 1.0e100 { 0.0 } else { f_max }
}

impl IonsFromNeutralPhase {
    pub fn new(
        name: &str,
        species: Vec<Species>,
        neutral: PhaseModel,
        ion_soln_type: IonSolnType,
    ) -> Result<Self, PhaseError> {
        match ion_soln_type {
            IonSolnType::SingleCation | IonSolnType::MultiCationAnion => {
                return Err(PhaseError::Unsupported(format!(
                    "ion solution type {:?} is not implemented",
                    ion_soln_type
                )));
            }
            _ => {}
        }
        let core = PhaseCore::new(name, species)?;
        let kk = core.n_species();
        let cation_list: Vec<usize> = (0..kk).filter(|&k| core.species[k].charge > 0.0).collect();
        let anion_list: Vec<usize> = (0..kk).filter(|&k| core.species[k].charge < 0.0).collect();
        let passthrough_list: Vec<usize> =
            (0..kk).filter(|&k| core.species[k].charge == 0.0).collect();
        let special_species = match ion_soln_type {
            IonSolnType::SingleAnion => {
                if anion_list.len() != 1 {
                    return Err(PhaseError::InvalidConfiguration(format!(
                        "single anion solution {} has {} anions",
                        name,
                        anion_list.len()
                    )));
                }
                Some(anion_list[0])
            }
            _ => {
                if !cation_list.is_empty() || !anion_list.is_empty() {
                    return Err(PhaseError::InvalidConfiguration(format!(
                        "passthrough solution {} contains charged species",
                        name
                    )));
                }
                None
            }
        };
        let mut phase = IonsFromNeutralPhase {
            core,
            fm: DMatrix::zeros(kk, neutral.n_species()),
            neutral: Box::new(neutral),
            ion_soln_type,
            neutral_for_ion: vec![None; kk],
            cation_list,
            anion_list,
            passthrough_list,
            special_species,
        };
        phase.build_formula_matrix()?;
        let xn = phase.neutral.mole_fractions().to_vec();
        phase.set_neutral_mole_fractions(&xn)?;
        info!(
            "ions-from-neutral phase {} built on {}: {} cations, {} anions, {} passthrough species",
            phase.core.name,
            phase.neutral.name(),
            phase.cation_list.len(),
            phase.anion_list.len(),
            phase.passthrough_list.len()
        );
        Ok(phase)
    }

    fn build_formula_matrix(&mut self) -> Result<(), PhaseError> {
        let names_n: Vec<String> = self.neutral.element_names().to_vec();
        let names_i: Vec<String> = self.core.elements.element_names().to_vec();
        let kk = self.core.n_species();
        let ion_vector = |k: usize| -> Vec<f64> {
            (0..names_i.len())
                .map(|m| self.core.formula_matrix[(m, k)])
                .collect()
        };
        let ion_vectors: Vec<Vec<f64>> = (0..kk).map(ion_vector).collect();
        let mut neutral_for_ion: Vec<Option<usize>> = vec![None; kk];
        for j in 0..self.neutral.n_species() {
            let mut el_n: Vec<f64> = (0..names_n.len()).map(|m| self.neutral.n_atoms(j, m)).collect();
            let subtract = |el_n: &mut Vec<f64>, el_i: &[f64], fac: f64| {
                for (mn, name_n) in names_n.iter().enumerate() {
                    for (mi, name_i) in names_i.iter().enumerate() {
                        if name_n == name_i {
                            el_n[mn] -= fac * el_i[mi];
                        }
                    }
                }
            };
            // the anion is taken out first so the cations see what is left
            if let Some(ks) = self.special_species {
                let fac = factor_overlap(&names_n, &el_n, &names_i, &ion_vectors[ks]);
                if fac > 0.0 {
                    subtract(&mut el_n, &ion_vectors[ks], fac);
                }
                self.fm[(ks, j)] += fac;
            }
            for k in 0..kk {
                let fac = factor_overlap(&names_n, &el_n, &names_i, &ion_vectors[k]);
                if fac > 0.0 {
                    subtract(&mut el_n, &ion_vectors[k], fac);
                    if neutral_for_ion[k].is_some() {
                        return Err(PhaseError::InvalidConfiguration(format!(
                            "simple formula matrix generation failed, species {} is shared between two neutral molecules",
                            self.core.species[k].name
                        )));
                    }
                    neutral_for_ion[k] = Some(j);
                }
                self.fm[(k, j)] += fac;
            }
            if el_n.iter().any(|v| v.abs() > 1.0e-13) {
                return Err(PhaseError::InvalidConfiguration(format!(
                    "simple formula matrix generation failed for neutral molecule {}",
                    self.neutral.species_name(j)
                )));
            }
        }
        for &k in self.cation_list.iter().chain(&self.passthrough_list) {
            if neutral_for_ion[k].is_none() {
                return Err(PhaseError::InvalidConfiguration(format!(
                    "species {} is not produced by any neutral molecule",
                    self.core.species[k].name
                )));
            }
        }
        self.neutral_for_ion = neutral_for_ion;
        Ok(())
    }

    fn neutral_index(&self, k: usize) -> usize {
        // every cation and passthrough species has a source molecule after construction
        self.neutral_for_ion[k].unwrap_or(0)
    }
    /// neutral molecule mole fractions implied by the ion mole fractions;
    /// any charge imbalance ends up in the anion and is ignored
    pub fn calc_neutral_mole_fractions(&self) -> Vec<f64> {
        let nn = self.neutral.n_species();
        let x = &self.core.x;
        let mut xn = vec![0.0; nn];
        match self.ion_soln_type {
            IonSolnType::PassThrough => {
                for &k in &self.passthrough_list {
                    let j = self.neutral_index(k);
                    xn[j] += x[k] / self.fm[(k, j)];
                }
            }
            _ => {
                for &k in self.cation_list.iter().chain(&self.passthrough_list) {
                    if let Some(j) = self.neutral_for_ion[k] {
                        xn[j] += x[k] / self.fm[(k, j)];
                    }
                }
            }
        }
        let sum: f64 = xn.iter().sum();
        if sum > 0.0 {
            for v in xn.iter_mut() {
                *v /= sum;
            }
        }
        xn
    }
    /// ion mole fractions from the neutral molecule mole fractions of the underlying phase
    pub fn calc_ion_mole_fractions(&self) -> Vec<f64> {
        let xn = self.neutral.mole_fractions();
        let mut mf = vec![0.0; self.core.n_species()];
        for (j, xj) in xn.iter().enumerate() {
            for (k, m) in mf.iter_mut().enumerate() {
                *m += self.fm[(k, j)] * xj;
            }
        }
        let sum: f64 = mf.iter().sum();
        if sum > 0.0 {
            for m in mf.iter_mut() {
                *m /= sum;
            }
        }
        mf
    }
    /// sets the neutral composition and derives the ion mole fractions from it
    pub fn set_neutral_mole_fractions(&mut self, xn: &[f64]) -> Result<(), PhaseError> {
        self.neutral.set_mole_fractions(xn)?;
        let mf = self.calc_ion_mole_fractions();
        self.core.set_mole_fractions(&mf)
    }
    /// maps a neutral molecule property onto the ions: cations take the property of their
    /// molecule divided by the dissociation coefficient, the anion gets `anion_value`
    fn map_from_neutral(&self, neutral: &[f64], scale_cations: bool, anion_value: f64) -> Vec<f64> {
        let mut out = vec![0.0; self.core.n_species()];
        for &k in &self.cation_list {
            let j = self.neutral_index(k);
            out[k] = if scale_cations { neutral[j] / self.fm[(k, j)] } else { neutral[j] };
        }
        for &k in &self.anion_list {
            out[k] = anion_value;
        }
        for &k in &self.passthrough_list {
            out[k] = neutral[self.neutral_index(k)];
        }
        out
    }
    /// 2 RT ln 2 added to cations so that mu(cation) + mu(anion) equals mu(neutral) for a 1:1 salt
    fn cation_shift(&self) -> f64 {
        2.0 * self.RT() * 2.0_f64.ln()
    }
}

impl ThermoPhaseTrait for IonsFromNeutralPhase {
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
        "IonsFromNeutral"
    }
    fn set_state_TP(&mut self, T: f64, P: f64) {
        self.neutral.set_state_TP(T, P);
        self.core.T = T;
        self.core.P = P;
    }
    fn set_mole_fractions(&mut self, x: &[f64]) -> Result<(), PhaseError> {
        self.core.set_mole_fractions(x)?;
        let xn = self.calc_neutral_mole_fractions();
        if xn.iter().sum::<f64>() > 0.0 {
            self.neutral.set_mole_fractions(&xn)?;
        }
        Ok(())
    }
    fn get_standard_chem_potentials(&self) -> Vec<f64> {
        let mu_n = self.neutral.get_standard_chem_potentials();
        let mut mu0 = self.map_from_neutral(&mu_n, false, 0.0);
        let shift = self.cation_shift();
        for &k in &self.cation_list {
            mu0[k] += shift;
        }
        mu0
    }
    fn get_gibbs_ref(&self) -> Vec<f64> {
        let g_n = self.neutral.get_gibbs_ref();
        let mut g = self.map_from_neutral(&g_n, false, 0.0);
        let shift = self.cation_shift();
        for &k in &self.cation_list {
            g[k] += shift;
        }
        g
    }
    fn get_chem_potentials(&self) -> Vec<f64> {
        if self.ion_soln_type == IonSolnType::PassThrough {
            return self.neutral.get_chem_potentials();
        }
        let RT = self.RT();
        let mu_n = self.neutral.get_standard_chem_potentials();
        let ln_gamma_n = self.neutral.get_ln_activity_coefficients();
        let x = &self.core.x;
        let shift = self.cation_shift();
        let mut mu = vec![0.0; self.core.n_species()];
        for &k in &self.cation_list {
            let j = self.neutral_index(k);
            mu[k] = mu_n[j] + shift + RT * (ln_gamma_n[j] + x[k].max(SMALL_NUMBER).ln());
        }
        for &k in &self.anion_list {
            mu[k] = RT * x[k].max(SMALL_NUMBER).ln();
        }
        for &k in &self.passthrough_list {
            let j = self.neutral_index(k);
            mu[k] = mu_n[j] + RT * (ln_gamma_n[j] + x[k].max(SMALL_NUMBER).ln());
        }
        mu
    }
    fn standard_concentration(&self, _k: usize) -> f64 {
        1.0
    }
    fn get_ln_activity_coefficients(&self) -> Vec<f64> {
        let ln_gamma_n = self.neutral.get_ln_activity_coefficients();
        if self.ion_soln_type == IonSolnType::PassThrough {
            return ln_gamma_n;
        }
        self.map_from_neutral(&ln_gamma_n, true, 0.0)
    }
    fn get_activity_coefficients(&self) -> Vec<f64> {
        self.get_ln_activity_coefficients()
            .iter()
            .map(|l| l.exp())
            .collect()
    }
    fn get_enthalpy_RT(&self) -> Vec<f64> {
        let h_n = self.neutral.get_enthalpy_RT();
        self.map_from_neutral(&h_n, false, 0.0)
    }
    fn get_entropy_R(&self) -> Vec<f64> {
        let s_n = self.neutral.get_entropy_R();
        let mut s = self.map_from_neutral(&s_n, false, 0.0);
        for &k in &self.cation_list {
            s[k] -= 2.0 * 2.0_f64.ln();
        }
        s
    }
    fn get_partial_molar_entropies(&self) -> Vec<f64> {
        let ln_gamma = self.get_ln_activity_coefficients();
        self.get_entropy_R()
            .iter()
            .enumerate()
            .map(|(k, s)| GAS_CONSTANT * (s - ln_gamma[k] - self.core.x[k].max(XX_SMALL).ln()))
            .collect()
    }
    fn get_partial_molar_volumes(&self) -> Vec<f64> {
        let v_n = self.neutral.get_partial_molar_volumes();
        if self.ion_soln_type == IonSolnType::PassThrough {
            return v_n;
        }
        self.map_from_neutral(&v_n, true, 0.0)
    }
    fn get_standard_volumes(&self) -> Vec<f64> {
        self.get_partial_molar_volumes()
    }
}

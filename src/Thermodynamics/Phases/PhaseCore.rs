//! State and species data shared by every phase model: element registry, species list,
//! formula matrix, temperature, pressure, composition and electric potential.
use crate::Thermodynamics::Elements::{ENTROPY298_UNKNOWN, Elements, ElementsError, WEIGHT_LOOKUP};
use crate::Thermodynamics::SpeciesThermo::SpeciesThermo;
use crate::Thermodynamics::constants::ONE_ATM;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// atomic weight of the electron pseudo-element "E", kg/kmol
pub const ELECTRON_WEIGHT: f64 = 5.48579909e-4;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PhaseError {
    #[error(transparent)]
    Elements(#[from] ElementsError),
    #[error("species {species} refers to element {element} which is not defined in phase {phase}")]
    UnknownElement {
        phase: String,
        species: String,
        element: String,
    },
    #[error("species not found: {0}")]
    SpeciesNotFound(String),
    #[error("expected a vector of length {expected}, got {got}")]
    LengthMismatch { expected: usize, got: usize },
    #[error("composition of phase {0} sums to zero")]
    ZeroComposition(String),
    #[error("invalid phase configuration: {0}")]
    InvalidConfiguration(String),
    #[error("unsupported configuration: {0}")]
    Unsupported(String),
}

fn default_size() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Species {
    pub name: String,
    /// element name -> number of atoms
    pub composition: BTreeMap<String, f64>,
    #[serde(default)]
    pub charge: f64,
    pub thermo: SpeciesThermo,
    /// molar volume of the pure species, m3/kmol (condensed phases)
    #[serde(default)]
    pub molar_volume: f64,
    /// number of surface sites occupied by one molecule (surface phases)
    #[serde(default = "default_size")]
    pub size: f64,
}

impl Species {
    pub fn new(name: &str, composition: &[(&str, f64)], thermo: SpeciesThermo) -> Self {
        Species {
            name: name.to_string(),
            composition: composition
                .iter()
                .map(|(el, n)| (el.to_string(), *n))
                .collect(),
            charge: 0.0,
            thermo,
            molar_volume: 0.0,
            size: 1.0,
        }
    }

    pub fn with_charge(mut self, charge: f64) -> Self {
        self.charge = charge;
        self
    }

    pub fn with_molar_volume(mut self, molar_volume: f64) -> Self {
        self.molar_volume = molar_volume;
        self
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }
}

#[derive(Debug, Clone)]
pub struct PhaseCore {
    pub name: String,
    pub elements: Elements,
    pub species: Vec<Species>,
    /// n_elements x n_species, atoms of element m in species k
    pub formula_matrix: DMatrix<f64>,
    pub molecular_weights: Vec<f64>,
    pub T: f64,
    pub P: f64,
    pub x: Vec<f64>,
    pub phi: f64,
}

impl PhaseCore {
    /// Builds the element registry from the species compositions (weights looked up in the
    /// periodic table, "E" is the electron) and freezes it.
    pub fn new(name: &str, species: Vec<Species>) -> Result<Self, PhaseError> {
        let mut elements = Elements::new();
        for sp in &species {
            for el in sp.composition.keys() {
                if el == "E" {
                    elements.add_unique_element(el, ELECTRON_WEIGHT, 0, ENTROPY298_UNKNOWN)?;
                } else {
                    elements.add_unique_element(el, WEIGHT_LOOKUP, 0, ENTROPY298_UNKNOWN)?;
                }
            }
        }
        Self::with_elements(name, elements, species)
    }
    /// Uses an explicitly built element registry. All elements referenced by the species must be present.
    pub fn with_elements(
        name: &str,
        mut elements: Elements,
        species: Vec<Species>,
    ) -> Result<Self, PhaseError> {
        if species.is_empty() {
            return Err(PhaseError::InvalidConfiguration(format!(
                "phase {} has no species",
                name
            )));
        }
        elements.freeze_elements();
        let n_el = elements.n_elements();
        let n_sp = species.len();
        let mut formula_matrix = DMatrix::zeros(n_el, n_sp);
        let mut molecular_weights = vec![0.0; n_sp];
        for (k, sp) in species.iter().enumerate() {
            for (el, n) in &sp.composition {
                let m = elements
                    .element_index(el)
                    .ok_or_else(|| PhaseError::UnknownElement {
                        phase: name.to_string(),
                        species: sp.name.clone(),
                        element: el.clone(),
                    })?;
                formula_matrix[(m, k)] = *n;
                molecular_weights[k] += n * elements.atomic_weight(m)?;
            }
        }
        let mut x = vec![0.0; n_sp];
        x[0] = 1.0;
        Ok(PhaseCore {
            name: name.to_string(),
            elements,
            species,
            formula_matrix,
            molecular_weights,
            T: 298.15,
            P: ONE_ATM,
            x,
            phi: 0.0,
        })
    }

    pub fn n_species(&self) -> usize {
        self.species.len()
    }

    pub fn check_len(&self, len: usize) -> Result<(), PhaseError> {
        if len != self.species.len() {
            return Err(PhaseError::LengthMismatch {
                expected: self.species.len(),
                got: len,
            });
        }
        Ok(())
    }
    /// negative entries are clipped to zero, the rest normalised to sum to one
    pub fn set_mole_fractions(&mut self, x: &[f64]) -> Result<(), PhaseError> {
        self.check_len(x.len())?;
        let sum: f64 = x.iter().map(|v| v.max(0.0)).sum();
        if sum <= 0.0 {
            return Err(PhaseError::ZeroComposition(self.name.clone()));
        }
        for (xi, v) in self.x.iter_mut().zip(x) {
            *xi = v.max(0.0) / sum;
        }
        Ok(())
    }

    pub fn set_mole_fractions_no_norm(&mut self, x: &[f64]) -> Result<(), PhaseError> {
        self.check_len(x.len())?;
        self.x.copy_from_slice(x);
        Ok(())
    }

    pub fn mean_molecular_weight(&self) -> f64 {
        self.x
            .iter()
            .zip(&self.molecular_weights)
            .map(|(x, w)| x * w)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn water_phase() -> PhaseCore {
        let sp = vec![
            Species::new("H2O", &[("H", 2.0), ("O", 1.0)], SpeciesThermo::constant_mu0(0.0)),
            Species::new("H2", &[("H", 2.0)], SpeciesThermo::constant_mu0(0.0)),
            Species::new("OH-", &[("H", 1.0), ("O", 1.0), ("E", 1.0)], SpeciesThermo::constant_mu0(0.0))
                .with_charge(-1.0),
        ];
        PhaseCore::new("liquid", sp).unwrap()
    }

    #[test]
    fn test_formula_matrix_and_weights() {
        let core = water_phase();
        assert!(core.elements.ready());
        assert_eq!(core.elements.n_elements(), 3);
        let iH = core.elements.element_index("H").unwrap();
        let iO = core.elements.element_index("O").unwrap();
        let iE = core.elements.element_index("E").unwrap();
        assert_relative_eq!(core.formula_matrix[(iH, 0)], 2.0);
        assert_relative_eq!(core.formula_matrix[(iO, 1)], 0.0);
        assert_relative_eq!(core.formula_matrix[(iE, 2)], 1.0);
        assert_relative_eq!(core.molecular_weights[0], 2.0 * 1.00794 + 15.9994, epsilon = 1e-12);
        assert_relative_eq!(
            core.molecular_weights[2],
            1.00794 + 15.9994 + ELECTRON_WEIGHT,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_mole_fractions_are_normalised() {
        let mut core = water_phase();
        assert_eq!(core.x, vec![1.0, 0.0, 0.0]);
        core.set_mole_fractions(&[2.0, 1.0, -1.0]).unwrap();
        assert_relative_eq!(core.x[0], 2.0 / 3.0);
        assert_relative_eq!(core.x[2], 0.0);
        assert!(core.set_mole_fractions(&[0.0, 0.0, 0.0]).is_err());
        assert_eq!(
            core.set_mole_fractions(&[1.0]),
            Err(PhaseError::LengthMismatch { expected: 3, got: 1 })
        );
    }

    #[test]
    fn test_unknown_element_is_rejected() {
        let mut el = Elements::new();
        el.add_element("H", WEIGHT_LOOKUP).unwrap();
        let sp = vec![Species::new("OH", &[("O", 1.0), ("H", 1.0)], SpeciesThermo::constant_mu0(0.0))];
        let res = PhaseCore::with_elements("gas", el, sp);
        assert!(matches!(res, Err(PhaseError::UnknownElement { .. })));
    }
}

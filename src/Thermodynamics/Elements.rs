//! Registry of chemical elements used by a phase: names, atomic weights, atomic numbers and
//! entropies at 298 K. Elements can only be added until the registry is frozen; after that
//! species referring to the elements may be defined.
use log::warn;
use thiserror::Error;

/// passing this value as a weight means "look the weight up in the periodic table"
pub const WEIGHT_LOOKUP: f64 = -12345.0;
/// marks an entropy at 298 K that was never supplied
pub const ENTROPY298_UNKNOWN: f64 = -123456789.0;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ElementsError {
    #[error("element not found: {0}")]
    ElementNotFound(String),
    #[error("elements cannot be added after species ({0})")]
    ElementsFrozen(String),
    #[error("Duplicate Elements ({0}) have different weights")]
    DuplicateElement(String),
    #[error("element index {index} is out of range, number of elements = {n}")]
    IndexOutOfRange { index: usize, n: usize },
    #[error("entropy at 298 K is unknown for element {0}")]
    Entropy298Unknown(String),
    #[error("element must have a name")]
    EmptyName,
}

pub struct AtomicWeight {
    pub symbol: &'static str,
    pub weight: f64,
}
/// atomic weights, kg/kmol
pub const ATOMIC_WEIGHTS: &[AtomicWeight] = &[
    AtomicWeight { symbol: "H", weight: 1.00794 },
    AtomicWeight { symbol: "D", weight: 2.0 },
    AtomicWeight { symbol: "Tr", weight: 3.0 },
    AtomicWeight { symbol: "He", weight: 4.002602 },
    AtomicWeight { symbol: "Li", weight: 6.941 },
    AtomicWeight { symbol: "Be", weight: 9.012182 },
    AtomicWeight { symbol: "B", weight: 10.811 },
    AtomicWeight { symbol: "C", weight: 12.011 },
    AtomicWeight { symbol: "N", weight: 14.00674 },
    AtomicWeight { symbol: "O", weight: 15.9994 },
    AtomicWeight { symbol: "F", weight: 18.9984032 },
    AtomicWeight { symbol: "Ne", weight: 20.1797 },
    AtomicWeight { symbol: "Na", weight: 22.98977 },
    AtomicWeight { symbol: "Mg", weight: 24.3050 },
    AtomicWeight { symbol: "Al", weight: 26.98154 },
    AtomicWeight { symbol: "Si", weight: 28.0855 },
    AtomicWeight { symbol: "P", weight: 30.97376 },
    AtomicWeight { symbol: "S", weight: 32.066 },
    AtomicWeight { symbol: "Cl", weight: 35.4527 },
    AtomicWeight { symbol: "Ar", weight: 39.948 },
    AtomicWeight { symbol: "K", weight: 39.0983 },
    AtomicWeight { symbol: "Ca", weight: 40.078 },
    AtomicWeight { symbol: "Sc", weight: 44.95591 },
    AtomicWeight { symbol: "Ti", weight: 47.88 },
    AtomicWeight { symbol: "V", weight: 50.9415 },
    AtomicWeight { symbol: "Cr", weight: 51.9961 },
    AtomicWeight { symbol: "Mn", weight: 54.9381 },
    AtomicWeight { symbol: "Fe", weight: 55.847 },
    AtomicWeight { symbol: "Co", weight: 58.9332 },
    AtomicWeight { symbol: "Ni", weight: 58.69 },
    AtomicWeight { symbol: "Cu", weight: 63.546 },
    AtomicWeight { symbol: "Zn", weight: 65.39 },
    AtomicWeight { symbol: "Ga", weight: 69.723 },
    AtomicWeight { symbol: "Ge", weight: 72.61 },
    AtomicWeight { symbol: "As", weight: 74.92159 },
    AtomicWeight { symbol: "Se", weight: 78.96 },
    AtomicWeight { symbol: "Br", weight: 79.904 },
    AtomicWeight { symbol: "Kr", weight: 83.80 },
    AtomicWeight { symbol: "Rb", weight: 85.4678 },
    AtomicWeight { symbol: "Sr", weight: 87.62 },
    AtomicWeight { symbol: "Y", weight: 88.90585 },
    AtomicWeight { symbol: "Zr", weight: 91.224 },
    AtomicWeight { symbol: "Nb", weight: 92.90638 },
    AtomicWeight { symbol: "Mo", weight: 95.94 },
    AtomicWeight { symbol: "Tc", weight: 97.9072 },
    AtomicWeight { symbol: "Ru", weight: 101.07 },
    AtomicWeight { symbol: "Rh", weight: 102.9055 },
    AtomicWeight { symbol: "Pd", weight: 106.42 },
    AtomicWeight { symbol: "Ag", weight: 107.8682 },
    AtomicWeight { symbol: "Cd", weight: 112.411 },
    AtomicWeight { symbol: "In", weight: 114.82 },
    AtomicWeight { symbol: "Sn", weight: 118.710 },
    AtomicWeight { symbol: "Sb", weight: 121.75 },
    AtomicWeight { symbol: "Te", weight: 127.6 },
    AtomicWeight { symbol: "I", weight: 126.90447 },
    AtomicWeight { symbol: "Xe", weight: 131.29 },
    AtomicWeight { symbol: "Cs", weight: 132.90543 },
    AtomicWeight { symbol: "Ba", weight: 137.327 },
    AtomicWeight { symbol: "La", weight: 138.9055 },
    AtomicWeight { symbol: "Ce", weight: 140.115 },
    AtomicWeight { symbol: "Pr", weight: 140.90765 },
    AtomicWeight { symbol: "Nd", weight: 144.24 },
    AtomicWeight { symbol: "Pm", weight: 144.9127 },
    AtomicWeight { symbol: "Sm", weight: 150.36 },
    AtomicWeight { symbol: "Eu", weight: 151.965 },
    AtomicWeight { symbol: "Gd", weight: 157.25 },
    AtomicWeight { symbol: "Tb", weight: 158.92534 },
    AtomicWeight { symbol: "Dy", weight: 162.50 },
    AtomicWeight { symbol: "Ho", weight: 164.93032 },
    AtomicWeight { symbol: "Er", weight: 167.26 },
    AtomicWeight { symbol: "Tm", weight: 168.93421 },
    AtomicWeight { symbol: "Yb", weight: 173.04 },
    AtomicWeight { symbol: "Lu", weight: 174.967 },
    AtomicWeight { symbol: "Hf", weight: 178.49 },
    AtomicWeight { symbol: "Ta", weight: 180.9479 },
    AtomicWeight { symbol: "W", weight: 183.85 },
    AtomicWeight { symbol: "Re", weight: 186.207 },
    AtomicWeight { symbol: "Os", weight: 190.2 },
    AtomicWeight { symbol: "Ir", weight: 192.22 },
    AtomicWeight { symbol: "Pt", weight: 195.08 },
    AtomicWeight { symbol: "Au", weight: 196.96654 },
    AtomicWeight { symbol: "Hg", weight: 200.59 },
    AtomicWeight { symbol: "Tl", weight: 204.3833 },
    AtomicWeight { symbol: "Pb", weight: 207.2 },
    AtomicWeight { symbol: "Bi", weight: 208.98037 },
    AtomicWeight { symbol: "Po", weight: 208.9824 },
    AtomicWeight { symbol: "At", weight: 209.9871 },
    AtomicWeight { symbol: "Rn", weight: 222.0176 },
    AtomicWeight { symbol: "Fr", weight: 223.0197 },
    AtomicWeight { symbol: "Ra", weight: 226.0254 },
    AtomicWeight { symbol: "Ac", weight: 227.0279 },
    AtomicWeight { symbol: "Th", weight: 232.0381 },
    AtomicWeight { symbol: "Pa", weight: 231.03588 },
    AtomicWeight { symbol: "U", weight: 238.0508 },
    AtomicWeight { symbol: "Np", weight: 237.0482 },
    AtomicWeight { symbol: "Pu", weight: 244.0482 },
];

/// Looks up the atomic weight of an element. Only the first three characters of the
/// symbol are significant and the comparison is case sensitive.
pub fn lookup_atomic_weight(symbol: &str) -> Result<f64, ElementsError> {
    let s3: String = symbol.chars().take(3).collect();
    ATOMIC_WEIGHTS
        .iter()
        .find(|aw| aw.symbol == s3)
        .map(|aw| aw.weight)
        .ok_or_else(|| ElementsError::ElementNotFound(symbol.to_string()))
}

#[derive(Debug, Clone, Default)]
pub struct Elements {
    names: Vec<String>,
    atomic_weights: Vec<f64>,
    atomic_numbers: Vec<i32>,
    entropy298: Vec<f64>,
    frozen: bool,
}

impl Elements {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn n_elements(&self) -> usize {
        self.names.len()
    }
    /// Appends an element. A weight equal to [`WEIGHT_LOOKUP`] is replaced by the tabulated value.
    pub fn add_element(&mut self, symbol: &str, weight: f64) -> Result<usize, ElementsError> {
        self.add_element_full(symbol, weight, 0, ENTROPY298_UNKNOWN)
    }

    pub fn add_element_full(
        &mut self,
        symbol: &str,
        weight: f64,
        atomic_number: i32,
        entropy298: f64,
    ) -> Result<usize, ElementsError> {
        if self.frozen {
            return Err(ElementsError::ElementsFrozen(symbol.to_string()));
        }
        if symbol.is_empty() {
            return Err(ElementsError::EmptyName);
        }
        let weight = if weight == WEIGHT_LOOKUP {
            lookup_atomic_weight(symbol)?
        } else {
            weight
        };
        self.push(symbol, weight, atomic_number, entropy298);
        Ok(self.names.len() - 1)
    }

    /// Adds an element unless an element of the same name exists already. An existing
    /// element must carry exactly the same weight. The duplicate check does not consult the
    /// freeze flag, only a genuinely new element is rejected once the registry is frozen.
    pub fn add_unique_element(
        &mut self,
        symbol: &str,
        weight: f64,
        atomic_number: i32,
        entropy298: f64,
    ) -> Result<usize, ElementsError> {
        if symbol.is_empty() {
            return Err(ElementsError::EmptyName);
        }
        let weight = if weight == WEIGHT_LOOKUP {
            lookup_atomic_weight(symbol)?
        } else {
            weight
        };
        match self.names.iter().position(|n| n == symbol) {
            Some(i) => {
                // bitwise comparison on purpose: same source, same number
                if self.atomic_weights[i].to_bits() != weight.to_bits() {
                    return Err(ElementsError::DuplicateElement(symbol.to_string()));
                }
                Ok(i)
            }
            None => {
                if self.frozen {
                    return Err(ElementsError::ElementsFrozen(symbol.to_string()));
                }
                self.push(symbol, weight, atomic_number, entropy298);
                Ok(self.names.len() - 1)
            }
        }
    }

    fn push(&mut self, symbol: &str, weight: f64, atomic_number: i32, entropy298: f64) {
        self.names.push(symbol.to_string());
        self.atomic_weights.push(weight);
        self.atomic_numbers.push(atomic_number);
        self.entropy298.push(entropy298);
    }

    pub fn freeze_elements(&mut self) {
        self.frozen = true;
    }
    /// true when no more elements may be added and species may be defined
    pub fn ready(&self) -> bool {
        self.frozen
    }
    /// removes every element and unfreezes the registry
    pub fn clear(&mut self) {
        if self.frozen {
            warn!("clearing a frozen element registry");
        }
        self.names.clear();
        self.atomic_weights.clear();
        self.atomic_numbers.clear();
        self.entropy298.clear();
        self.frozen = false;
    }

    pub fn element_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    fn check_index(&self, m: usize) -> Result<(), ElementsError> {
        if m >= self.names.len() {
            return Err(ElementsError::IndexOutOfRange {
                index: m,
                n: self.names.len(),
            });
        }
        Ok(())
    }

    pub fn element_name(&self, m: usize) -> Result<&str, ElementsError> {
        self.check_index(m)?;
        Ok(&self.names[m])
    }

    pub fn element_names(&self) -> &[String] {
        &self.names
    }

    pub fn atomic_weight(&self, m: usize) -> Result<f64, ElementsError> {
        self.check_index(m)?;
        Ok(self.atomic_weights[m])
    }

    pub fn atomic_weights(&self) -> &[f64] {
        &self.atomic_weights
    }

    pub fn atomic_number(&self, m: usize) -> Result<i32, ElementsError> {
        self.check_index(m)?;
        Ok(self.atomic_numbers[m])
    }

    pub fn entropy_element298(&self, m: usize) -> Result<f64, ElementsError> {
        self.check_index(m)?;
        if self.entropy298[m] == ENTROPY298_UNKNOWN {
            return Err(ElementsError::Entropy298Unknown(self.names[m].clone()));
        }
        Ok(self.entropy298[m])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_lookup_uses_first_three_chars() {
        assert_relative_eq!(lookup_atomic_weight("Fe").unwrap(), 55.847);
        assert_relative_eq!(lookup_atomic_weight("H").unwrap(), 1.00794);
        assert_relative_eq!(lookup_atomic_weight("Tr").unwrap(), 3.0);
        // case sensitive
        assert_eq!(
            lookup_atomic_weight("fe"),
            Err(ElementsError::ElementNotFound("fe".to_string()))
        );
        assert!(lookup_atomic_weight("Xx").is_err());
    }

    #[test]
    fn test_add_element_with_lookup() {
        let mut el = Elements::new();
        let i = el.add_element("O", WEIGHT_LOOKUP).unwrap();
        assert_eq!(i, 0);
        assert_relative_eq!(el.atomic_weight(0).unwrap(), 15.9994);
        el.add_element("E", 5.4858e-4).unwrap();
        assert_eq!(el.n_elements(), 2);
        assert_eq!(el.element_index("E"), Some(1));
        assert_eq!(el.element_index("N"), None);
        assert!(el.add_element("Qq", WEIGHT_LOOKUP).is_err());
        assert_eq!(el.add_element("", 1.0), Err(ElementsError::EmptyName));
    }

    #[test]
    fn test_frozen_registry_rejects_new_elements() {
        let mut el = Elements::new();
        el.add_element("C", WEIGHT_LOOKUP).unwrap();
        assert!(!el.ready());
        el.freeze_elements();
        assert!(el.ready());
        assert!(matches!(
            el.add_element("H", WEIGHT_LOOKUP),
            Err(ElementsError::ElementsFrozen(_))
        ));
        assert!(matches!(
            el.add_unique_element("H", WEIGHT_LOOKUP, 1, ENTROPY298_UNKNOWN),
            Err(ElementsError::ElementsFrozen(_))
        ));
        el.clear();
        assert!(!el.ready());
        assert_eq!(el.n_elements(), 0);
    }

    #[test]
    fn test_unique_element_is_idempotent() {
        let mut el = Elements::new();
        el.add_unique_element("N", WEIGHT_LOOKUP, 7, ENTROPY298_UNKNOWN)
            .unwrap();
        let i = el
            .add_unique_element("N", 14.00674, 7, ENTROPY298_UNKNOWN)
            .unwrap();
        assert_eq!(i, 0);
        assert_eq!(el.n_elements(), 1);
        let res = el.add_unique_element("N", 14.0, 7, ENTROPY298_UNKNOWN);
        assert_eq!(res, Err(ElementsError::DuplicateElement("N".to_string())));
        assert_eq!(el.n_elements(), 1);
    }

    #[test]
    fn test_unique_element_duplicate_path_ignores_freeze() {
        let mut el = Elements::new();
        el.add_unique_element("Pt", WEIGHT_LOOKUP, 78, ENTROPY298_UNKNOWN)
            .unwrap();
        el.freeze_elements();
        // existing symbol with equal weight passes even though the registry is frozen
        assert_eq!(
            el.add_unique_element("Pt", 195.08, 78, ENTROPY298_UNKNOWN),
            Ok(0)
        );
        // a mismatching weight is still a duplicate definition
        assert!(matches!(
            el.add_unique_element("Pt", 195.0, 78, ENTROPY298_UNKNOWN),
            Err(ElementsError::DuplicateElement(_))
        ));
    }

    #[test]
    fn test_entropy298_and_ranges() {
        let mut el = Elements::new();
        el.add_element_full("H", WEIGHT_LOOKUP, 1, 65340.0).unwrap();
        el.add_element("O", WEIGHT_LOOKUP).unwrap();
        assert_relative_eq!(el.entropy_element298(0).unwrap(), 65340.0);
        assert_eq!(
            el.entropy_element298(1),
            Err(ElementsError::Entropy298Unknown("O".to_string()))
        );
        assert_eq!(el.atomic_number(0).unwrap(), 1);
        assert_eq!(el.element_name(1).unwrap(), "O");
        assert_eq!(
            el.element_name(5),
            Err(ElementsError::IndexOutOfRange { index: 5, n: 2 })
        );
    }
}

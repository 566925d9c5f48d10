//! Per-species record of an equilibrium problem.
use crate::Thermodynamics::ChemEquilibrium::VcsProblem::SpeciesUnknownType;

#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesProperties {
    /// global phase index
    pub index_phase: usize,
    /// index of the species inside its phase
    pub index_species_phase: usize,
    pub num_elements: usize,
    pub sp_name: String,
    /// molecular weight, kg/kmol
    pub wt_species: f64,
    /// element composition of the species in global element ordering
    pub formula_matrix_col: Vec<f64>,
    pub charge: f64,
    pub surface_species: bool,
    /// partial molar volume, m3/kmol
    pub vol_pm: f64,
    /// typical mole fraction of the species in its phase, seeds zero mole numbers and
    /// scales numerical derivatives
    pub reference_mole_fraction: f64,
    pub species_unknown_type: SpeciesUnknownType,
}

impl SpeciesProperties {
    pub fn new(index_phase: usize, index_species_phase: usize) -> Self {
        SpeciesProperties {
            index_phase,
            index_species_phase,
            num_elements: 0,
            sp_name: String::new(),
            wt_species: 0.0,
            formula_matrix_col: Vec::new(),
            charge: 0.0,
            surface_species: false,
            vol_pm: 0.0,
            reference_mole_fraction: 1.0e-6,
            species_unknown_type: SpeciesUnknownType::MolNum,
        }
    }
}

//! Physical constants in kmol based SI units (J, kmol, K, Pa, C).

/// universal gas constant, J/(kmol K)
pub const GAS_CONSTANT: f64 = 8314.47215;
/// Faraday constant, C/kmol
pub const FARADAY: f64 = 9.6485339e7;
/// one standard atmosphere, Pa
pub const ONE_ATM: f64 = 101325.0;
/// reference pressure of the standard states, Pa
pub const REF_PRESSURE: f64 = ONE_ATM;
/// floor used before taking logarithms of mole fractions
pub const SMALL_NUMBER: f64 = 1.0e-300;
/// J per cal
pub const CAL_TO_J: f64 = 4.184;

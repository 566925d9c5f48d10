//! Standard-state thermodynamics of a single species at the reference pressure.
//! Values are returned either dimensionless (cp/R, h/RT, s/R) or in J/kmol based units.
use crate::Thermodynamics::constants::GAS_CONSTANT;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model")]
pub enum SpeciesThermo {
    /// constant heat capacity around a reference temperature
    /// h0 in J/kmol, s0 and cp0 in J/(kmol K)
    ConstCp { t0: f64, h0: f64, s0: f64, cp0: f64 },
    /// 7-coefficient NASA polynomials, `low` is used below `t_mid`
    NASA7 {
        t_mid: f64,
        low: [f64; 7],
        high: [f64; 7],
    },
    /// NIST Shomate fit [A, B, C, D, E, F, G] with t = T/1000:
    /// cp = A + B t + C t^2 + D t^3 + E/t^2 in J/(mol K), h in kJ/mol including the F term
    Shomate { coeffs: [f64; 7] },
}

impl SpeciesThermo {
    /// species with a temperature independent standard Gibbs energy mu0 (J/kmol) at 298.15 K
    pub fn constant_mu0(mu0: f64) -> Self {
        SpeciesThermo::ConstCp {
            t0: 298.15,
            h0: mu0,
            s0: 0.0,
            cp0: 0.0,
        }
    }

    fn nasa_coeffs(&self, T: f64) -> Option<&[f64; 7]> {
        match self {
            SpeciesThermo::NASA7 { t_mid, low, high } => {
                if T < *t_mid {
                    Some(low)
                } else {
                    Some(high)
                }
            }
            _ => None,
        }
    }

    pub fn cp_R(&self, T: f64) -> f64 {
        match self {
            SpeciesThermo::ConstCp { cp0, .. } => cp0 / GAS_CONSTANT,
            SpeciesThermo::Shomate { coeffs: c } => {
                let t = T / 1000.0;
                1.0e3 * (c[0] + c[1] * t + c[2] * t.powi(2) + c[3] * t.powi(3) + c[4] / t.powi(2))
                    / GAS_CONSTANT
            }
            SpeciesThermo::NASA7 { .. } => {
                let a = self.nasa_coeffs(T).unwrap_or(&[0.0; 7]);
                a[0] + a[1] * T + a[2] * T.powi(2) + a[3] * T.powi(3) + a[4] * T.powi(4)
            }
        }
    }

    pub fn h_RT(&self, T: f64) -> f64 {
        match self {
            SpeciesThermo::ConstCp { t0, h0, cp0, .. } => (h0 + cp0 * (T - t0)) / (GAS_CONSTANT * T),
            SpeciesThermo::Shomate { coeffs: c } => {
                let t = T / 1000.0;
                let h = c[0] * t + c[1] * t.powi(2) / 2.0 + c[2] * t.powi(3) / 3.0
                    + c[3] * t.powi(4) / 4.0
                    - c[4] / t
                    + c[5];
                // kJ/mol -> J/kmol
                1.0e6 * h / (GAS_CONSTANT * T)
            }
            SpeciesThermo::NASA7 { .. } => {
                let a = self.nasa_coeffs(T).unwrap_or(&[0.0; 7]);
                a[0] + a[1] * T / 2.0
                    + a[2] * T.powi(2) / 3.0
                    + a[3] * T.powi(3) / 4.0
                    + a[4] * T.powi(4) / 5.0
                    + a[5] / T
            }
        }
    }

    pub fn s_R(&self, T: f64) -> f64 {
        match self {
            SpeciesThermo::ConstCp { t0, s0, cp0, .. } => (s0 + cp0 * (T / t0).ln()) / GAS_CONSTANT,
            SpeciesThermo::Shomate { coeffs: c } => {
                let t = T / 1000.0;
                1.0e3
                    * (c[0] * t.ln() + c[1] * t + c[2] * t.powi(2) / 2.0 + c[3] * t.powi(3) / 3.0
                        - c[4] / (2.0 * t.powi(2))
                        + c[6])
                    / GAS_CONSTANT
            }
            SpeciesThermo::NASA7 { .. } => {
                let a = self.nasa_coeffs(T).unwrap_or(&[0.0; 7]);
                a[0] * T.ln()
                    + a[1] * T
                    + a[2] * T.powi(2) / 2.0
                    + a[3] * T.powi(3) / 3.0
                    + a[4] * T.powi(4) / 4.0
                    + a[6]
            }
        }
    }
    /// g/RT = h/RT - s/R
    pub fn g_RT(&self, T: f64) -> f64 {
        self.h_RT(T) - self.s_R(T)
    }
    /// (cp, h, s) in J/(kmol K), J/kmol, J/(kmol K)
    pub fn cp_h_s(&self, T: f64) -> (f64, f64, f64) {
        (
            self.cp_R(T) * GAS_CONSTANT,
            self.h_RT(T) * GAS_CONSTANT * T,
            self.s_R(T) * GAS_CONSTANT,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_const_cp() {
        let th = SpeciesThermo::ConstCp {
            t0: 298.15,
            h0: -1.0e8,
            s0: 2.0e5,
            cp0: 3.0e4,
        };
        let (cp, h, s) = th.cp_h_s(298.15);
        assert_relative_eq!(cp, 3.0e4, epsilon = 1e-9);
        assert_relative_eq!(h, -1.0e8, epsilon = 1e-6);
        assert_relative_eq!(s, 2.0e5, epsilon = 1e-9);
        let (_, h, s) = th.cp_h_s(500.0);
        assert_relative_eq!(h, -1.0e8 + 3.0e4 * (500.0 - 298.15), epsilon = 1e-6);
        assert_relative_eq!(s, 2.0e5 + 3.0e4 * (500.0_f64 / 298.15).ln(), epsilon = 1e-9);
    }

    #[test]
    fn test_nasa7_switches_at_t_mid() {
        // N2 from GRI-Mech 3.0
        let th = SpeciesThermo::NASA7 {
            t_mid: 1000.0,
            low: [
                3.298677, 1.4082404e-3, -3.963222e-6, 5.641515e-9, -2.444854e-12, -1020.8999,
                3.950372,
            ],
            high: [
                2.92664, 1.4879768e-3, -5.68476e-7, 1.0097038e-10, -6.753351e-15, -922.7977,
                5.980528,
            ],
        };
        // cp of N2 at 300 K is about 29.1 J/(mol K)
        assert_relative_eq!(th.cp_R(300.0) * 8.31446, 29.1, epsilon = 0.1);
        // the two fits agree at the midpoint
        let a = th.cp_R(999.999999);
        let b = th.cp_R(1000.0);
        assert_relative_eq!(a, b, epsilon = 1e-3);
        assert_relative_eq!(th.g_RT(300.0), th.h_RT(300.0) - th.s_R(300.0));
    }

    #[test]
    fn test_shomate_water_vapour() {
        // H2O(g), NIST webbook, 500-1700 K
        let th = SpeciesThermo::Shomate {
            coeffs: [30.092, 6.832514, 6.793435, -2.53448, 0.082139, -250.881, 223.3967],
        };
        let (cp, h, s) = th.cp_h_s(500.0);
        // NIST tables: cp 35.22 J/(mol K), H - H298 6.92 kJ/mol, S 206.5 J/(mol K)
        assert_relative_eq!(cp, 35.22e3, max_relative = 2e-3);
        assert_relative_eq!(h, (-241.826 + 6.92) * 1.0e6, max_relative = 1e-3);
        assert_relative_eq!(s, 206.5e3, max_relative = 2e-3);
        let json = serde_json::to_string(&th).unwrap();
        assert!(json.contains("\"model\":\"Shomate\""));
    }

    #[test]
    fn test_constant_mu0() {
        let th = SpeciesThermo::constant_mu0(-5.0e6);
        assert_relative_eq!(th.g_RT(298.15) * GAS_CONSTANT * 298.15, -5.0e6, epsilon = 1e-6);
        assert_relative_eq!(th.g_RT(600.0) * GAS_CONSTANT * 600.0, -5.0e6, epsilon = 1e-6);
    }
}

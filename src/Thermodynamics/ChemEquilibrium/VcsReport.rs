use super::VcsProblem::{ProblemType, SpeciesUnknownType, VcsError, VcsProblem};
use crate::Thermodynamics::Phases::phase_api::ThermoPhaseTrait;
use crate::Thermodynamics::constants::ONE_ATM;
use log::info;
use prettytable::{Table, row};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// printf style "%.{prec}e": mantissa, sign and at least two exponent digits
pub fn c_exp(v: f64, prec: usize) -> String {
    if !v.is_finite() {
        return format!("{}", v);
    }
    let s = format!("{:.*e}", prec, v);
    match s.split_once('e') {
        Some((mantissa, exp)) => {
            let exp: i32 = exp.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exp.abs())
        }
        None => s,
    }
}

fn strip_zeros(s: &str) -> String {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s.to_string()
    }
}

/// printf style "%.{prec}g"
pub fn c_general(v: f64, prec: usize) -> String {
    if v == 0.0 {
        return "0".to_string();
    }
    if !v.is_finite() {
        return format!("{}", v);
    }
    let prec = prec.max(1);
    let sci = c_exp(v, prec - 1);
    let exp: i32 = sci
        .rsplit_once('e')
        .and_then(|(_, e)| e.parse().ok())
        .unwrap_or(0);
    if exp < -4 || exp >= prec as i32 {
        match sci.split_once('e') {
            Some((mantissa, e)) => format!("{}e{}", strip_zeros(mantissa), e),
            None => sci,
        }
    } else {
        let decimals = (prec as i32 - 1 - exp).max(0) as usize;
        strip_zeros(&format!("{:.*}", decimals, v))
    }
}

fn e11(v: f64) -> String {
    format!("{:>11}", c_exp(v, 3))
}

fn banner(title: &str, left: usize) -> String {
    let right = 80usize.saturating_sub(left + title.len());
    format!(
        "{}\n{}{}{}\n{}\n",
        "=".repeat(80),
        "=".repeat(left),
        title,
        "=".repeat(right),
        "=".repeat(80)
    )
}

impl VcsProblem {
    /// Renders the problem statement: conditions, species, phases, element abundance
    /// targets and the standard chemical potentials in the problem units. The text is
    /// logged and returned; the problem itself is left untouched.
    pub fn prob_report(&self) -> Result<String, VcsError> {
        let mut out = String::new();
        out.push('\n');
        out.push_str(&banner(" VCS_PROB: PROBLEM STATEMENT ", 20));
        out.push('\n');
        match self.prob_type {
            ProblemType::TP => {
                out.push_str("\tSolve a constant T, P problem:\n");
                out.push_str(&format!("\t\tT    = {} K\n", c_general(self.T, 6)));
                out.push_str(&format!(
                    "\t\tPres = {} atm\n",
                    c_general(self.PresPA / ONE_ATM, 6)
                ));
            }
        }
        out.push_str("\n             Phase IDs of species\n");
        let mut species_table = Table::new();
        species_table.add_row(row![
            "species",
            "phaseID",
            "phaseName",
            "Initial_Estimated_Moles",
            "Species_Type"
        ]);
        for k in 0..self.nspecies {
            let phase_name = usize::try_from(self.phase_id[k])
                .ok()
                .and_then(|p| self.vphase_list.get(p))
                .map(|vp| vp.phase_name.clone())
                .unwrap_or_default();
            let estimate = if self.iest >= 0 {
                c_general(self.w[k], 5)
            } else {
                "N/A".to_string()
            };
            let sp_type = match self.species_unknown_type[k] {
                SpeciesUnknownType::MolNum => "Mol_Num",
                SpeciesUnknownType::InterfacialVoltage => "Voltage",
            };
            species_table.add_row(row![
                self.sp_name[k],
                self.phase_id[k],
                phase_name,
                estimate,
                sp_type
            ]);
        }
        out.push_str(&species_table.to_string());

        out.push_str(&format!("\n{}\n", "-".repeat(80)));
        out.push_str("             Information about phases\n");
        let mut phase_table = Table::new();
        phase_table.add_row(row![
            "PhaseName",
            "PhaseNum",
            "SingSpec",
            "GasPhase",
            "EqnState",
            "NumSpec",
            "TMolesInert",
            "TKmoles"
        ]);
        for vp in self.vphase_list.iter().take(self.NPhase) {
            let total = if self.iest >= 0 {
                c_exp(vp.total_moles(), 6)
            } else {
                "N/A".to_string()
            };
            phase_table.add_row(row![
                vp.phase_name,
                vp.VP_ID,
                u8::from(vp.single_species),
                u8::from(vp.gas_phase),
                vp.eqn_state,
                vp.n_species,
                c_exp(vp.total_moles_inert(), 6),
                total
            ]);
        }
        out.push_str(&phase_table.to_string());

        out.push_str("\nElemental Abundances:\n");
        let mut element_table = Table::new();
        element_table.add_row(row!["Element", "Target_kmol", "ElemType", "ElActive"]);
        for e in 0..self.ne {
            element_table.add_row(row![
                self.el_name[e],
                format!("{:.12E}", self.gai[e]),
                self.el_type[e].code(),
                u8::from(self.el_active[e])
            ]);
        }
        out.push_str(&element_table.to_string());

        out.push_str(&format!("\nChemical Potentials:  {}\n", self.units.label()));
        let mut mu_table = Table::new();
        mu_table.add_row(row!["Species", "(phase)", "SS0ChemPot", "StarChemPot"]);
        for vp in self.vphase_list.iter().take(self.NPhase) {
            if vp.thermo.is_none() {
                continue;
            }
            let mut vp = vp.clone();
            vp.set_state_TP(self.T, self.PresPA)?;
            let g0 = vp.G0_calc(self.units)?;
            let gstar = vp.GStar_calc(self.units)?;
            for k in 0..vp.n_species {
                let name = vp
                    .sp_global_index_vcs(k)
                    .map(|kg| self.sp_name[kg].clone())
                    .unwrap_or_else(|| vp.thermo().map(|t| t.species_name(k).to_string()).unwrap_or_default());
                let phase = if k == 0 { vp.phase_name.clone() } else { String::new() };
                mu_table.add_row(row![name, phase, c_general(g0[k], 6), c_general(gstar[k], 6)]);
            }
        }
        out.push_str(&mu_table.to_string());
        out.push('\n');
        out.push_str(&banner(" VCS_PROB: END OF PROBLEM STATEMENT ", 20));
        info!("{}", out);
        Ok(out)
    }

    /// Writes the comma separated equilibrium report. Each phase gets its own header
    /// block followed by one row per species; chemical potentials are given in 1e6 J/kmol.
    pub fn report_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), VcsError> {
        let file = File::create(path.as_ref())?;
        let mut fp = BufWriter::new(file);
        let vol = self.total_volume()?;

        writeln!(
            fp,
            "--------------------- VCS_MULTIPHASE_EQUIL FINAL REPORT -----------------------------"
        )?;
        writeln!(fp, "Temperature  = {:>11} kelvin", c_general(self.T, 5))?;
        writeln!(fp, "Pressure     = {:>11} Pascal", c_general(self.PresPA, 5))?;
        writeln!(fp, "Total Volume = {:>11} m**3", c_general(vol, 5))?;
        writeln!(fp, "Number Basis optimizations = {}", self.num_basis_optimizations)?;
        writeln!(fp, "Number VCS iterations = {}", self.iterations)?;

        for vp in self.vphase_list.iter().take(self.NPhase) {
            let tp = vp.thermo()?;
            let t_moles = vp.total_moles();
            let activity = tp.get_activities();
            let ac = tp.get_activity_coefficients();
            let mu0 = tp.get_standard_chem_potentials();
            let mu = tp.get_chem_potentials();
            let vol_pm = tp.get_partial_molar_volumes();
            let mut mf = Vec::with_capacity(vp.n_species);
            for k in 0..vp.n_species {
                let kg = vp.sp_global_index_vcs(k).ok_or(VcsError::IndexOutOfRange {
                    what: "phase species",
                    index: k,
                    n: vp.n_species,
                })?;
                mf.push(self.mf[kg]);
            }
            let phase_volume: f64 =
                vol_pm.iter().zip(&mf).map(|(v, x)| v * x).sum::<f64>() * t_moles;

            writeln!(
                fp,
                "        Name,       Phase,  PhaseMoles,  Mole_Fract,  Molalities,   ActCoeff,    Activity, ChemPot_SS0,     ChemPot,   mole_num,       PMVol, Phase_Volume"
            )?;
            writeln!(
                fp,
                "            ,            ,      (kmol),            ,            ,           ,            ,    (J/kmol),    (J/kmol),     (kmol), (m**3/kmol),       (m**3)"
            )?;
            for k in 0..vp.n_species {
                writeln!(
                    fp,
                    "{:>12}, {:>11}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}",
                    tp.species_name(k),
                    vp.phase_name,
                    e11(t_moles),
                    e11(mf[k]),
                    e11(0.0),
                    e11(ac[k]),
                    e11(activity[k]),
                    e11(mu0[k] * 1.0e-6),
                    e11(mu[k] * 1.0e-6),
                    e11(mf[k] * t_moles),
                    e11(vol_pm[k]),
                    e11(phase_volume)
                )?;
            }
        }
        fp.flush()?;
        info!("equilibrium report written to {}", path.as_ref().display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_c_style_exponent() {
        assert_eq!(c_exp(1.0, 3), "1.000e+00");
        assert_eq!(c_exp(-0.00123456, 3), "-1.235e-03");
        assert_eq!(c_exp(6.02e23, 2), "6.02e+23");
        assert_eq!(e11(0.0), "  0.000e+00");
    }

    #[test]
    fn test_c_style_general() {
        assert_eq!(c_general(298.15, 5), "298.15");
        assert_eq!(c_general(123456.0, 5), "1.2346e+05");
        assert_eq!(c_general(1.0e-6, 5), "1e-06");
        assert_eq!(c_general(0.5, 6), "0.5");
        assert_eq!(c_general(0.0, 5), "0");
    }
}

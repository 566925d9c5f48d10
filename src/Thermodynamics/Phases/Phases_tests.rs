#[cfg(test)]
mod tests {
    use crate::Thermodynamics::Phases::IdealGasPhase::IdealGasPhase;
    use crate::Thermodynamics::Phases::IdealSolutionPhase::IdealSolutionPhase;
    use crate::Thermodynamics::Phases::IonsFromNeutral::{IonSolnType, IonsFromNeutralPhase};
    use crate::Thermodynamics::Phases::PhaseCore::{PhaseError, Species};
    use crate::Thermodynamics::Phases::StoichSubstance::StoichSubstance;
    use crate::Thermodynamics::Phases::phase_api::{PhaseKind, PhaseModel, ThermoPhaseTrait};
    use crate::Thermodynamics::SpeciesThermo::SpeciesThermo;
    use crate::Thermodynamics::constants::{FARADAY, GAS_CONSTANT, ONE_ATM};
    use approx::assert_relative_eq;

    fn gas() -> PhaseModel {
        let sp = vec![
            Species::new("CO", &[("C", 1.0), ("O", 1.0)], SpeciesThermo::constant_mu0(-1.37e8)),
            Species::new("CO2", &[("C", 1.0), ("O", 2.0)], SpeciesThermo::constant_mu0(-3.94e8)),
            Species::new("O2", &[("O", 2.0)], SpeciesThermo::constant_mu0(0.0)),
        ];
        IdealGasPhase::new("gas", sp).unwrap().into()
    }

    fn molten_salt() -> IonsFromNeutralPhase {
        let neutral_sp = vec![
            Species::new("LiCl", &[("Li", 1.0), ("Cl", 1.0)], SpeciesThermo::constant_mu0(-3.8e8))
                .with_molar_volume(0.0203),
            Species::new("KCl", &[("K", 1.0), ("Cl", 1.0)], SpeciesThermo::constant_mu0(-4.1e8))
                .with_molar_volume(0.0375),
        ];
        let neutral: PhaseModel = IdealSolutionPhase::new("LiKCl_neutral", neutral_sp)
            .unwrap()
            .into();
        let ions = vec![
            Species::new("Li+", &[("Li", 1.0), ("E", -1.0)], SpeciesThermo::constant_mu0(0.0))
                .with_charge(1.0),
            Species::new("K+", &[("K", 1.0), ("E", -1.0)], SpeciesThermo::constant_mu0(0.0))
                .with_charge(1.0),
            Species::new("Cl-", &[("Cl", 1.0), ("E", 1.0)], SpeciesThermo::constant_mu0(0.0))
                .with_charge(-1.0),
        ];
        IonsFromNeutralPhase::new("LiKCl", ions, neutral, IonSolnType::SingleAnion).unwrap()
    }

    #[test]
    fn test_ideal_gas_properties() {
        let mut g = gas();
        g.set_state_TP(1000.0, 2.0 * ONE_ATM);
        g.set_mole_fractions(&[0.25, 0.5, 0.25]).unwrap();
        assert_eq!(g.phase_kind(), PhaseKind::Gas);
        let RT = GAS_CONSTANT * 1000.0;
        let mu = g.get_chem_potentials();
        assert_relative_eq!(mu[1], -3.94e8 + RT * 2.0_f64.ln() + RT * 0.5_f64.ln(), epsilon = 1e-3);
        let c = g.get_activity_concentrations();
        assert_relative_eq!(c[0], 0.25 * 2.0 * ONE_ATM / RT, epsilon = 1e-12);
        assert_relative_eq!(g.log_standard_conc(0), (2.0 * ONE_ATM / RT).ln(), epsilon = 1e-12);
        let a = g.get_activities();
        assert_relative_eq!(a[2], 0.25, epsilon = 1e-12);
        let v = g.get_partial_molar_volumes();
        assert_relative_eq!(v[0], RT / (2.0 * ONE_ATM), epsilon = 1e-9);
    }

    #[test]
    fn test_electrochemical_potential_shift() {
        let ions = vec![
            Species::new("Na+", &[("Na", 1.0), ("E", -1.0)], SpeciesThermo::constant_mu0(0.0))
                .with_charge(1.0)
                .with_molar_volume(0.01),
            Species::new("H2O", &[("H", 2.0), ("O", 1.0)], SpeciesThermo::constant_mu0(0.0))
                .with_molar_volume(0.018),
        ];
        let mut liq: PhaseModel = IdealSolutionPhase::new("liq", ions).unwrap().into();
        liq.set_mole_fractions(&[0.1, 0.9]).unwrap();
        liq.set_electric_potential(0.5);
        let mu = liq.get_chem_potentials();
        let emu = liq.get_electrochem_potentials();
        assert_relative_eq!(emu[0] - mu[0], FARADAY * 0.5, epsilon = 1e-6);
        assert_relative_eq!(emu[1], mu[1]);
        let c = liq.get_activity_concentrations();
        assert_relative_eq!(c[1], 0.9 / 0.018, epsilon = 1e-9);
    }

    #[test]
    fn test_stoich_substance_has_unit_activity() {
        let sp = Species::new("C(gr)", &[("C", 1.0)], SpeciesThermo::constant_mu0(0.0))
            .with_molar_volume(0.0053);
        let mut s: PhaseModel = StoichSubstance::new("graphite", sp).unwrap().into();
        s.set_state_TP(500.0, ONE_ATM);
        s.set_mole_fractions(&[0.3]).unwrap();
        assert_eq!(s.mole_fractions(), &[1.0]);
        assert_eq!(s.get_activities(), vec![1.0]);
        assert_relative_eq!(s.get_chem_potentials()[0], s.get_standard_chem_potentials()[0]);
        assert_eq!(s.phase_kind(), PhaseKind::SingleSpecies);
    }

    #[test]
    fn test_ions_formula_matrix() {
        let salt = molten_salt();
        // Li+ and Cl- from LiCl, K+ and Cl- from KCl
        assert_relative_eq!(salt.fm[(0, 0)], 1.0);
        assert_relative_eq!(salt.fm[(2, 0)], 1.0);
        assert_relative_eq!(salt.fm[(1, 1)], 1.0);
        assert_relative_eq!(salt.fm[(2, 1)], 1.0);
        assert_relative_eq!(salt.fm[(1, 0)], 0.0);
        assert_eq!(salt.neutral_for_ion, vec![Some(0), Some(1), None]);
        assert_eq!(salt.cation_list, vec![0, 1]);
        assert_eq!(salt.anion_list, vec![2]);
        assert_eq!(salt.special_species, Some(2));
    }

    #[test]
    fn test_ions_mole_fraction_conversions() {
        let mut salt = molten_salt();
        salt.set_neutral_mole_fractions(&[0.6, 0.4]).unwrap();
        let x = salt.mole_fractions().to_vec();
        assert_relative_eq!(x[0], 0.3, epsilon = 1e-14);
        assert_relative_eq!(x[1], 0.2, epsilon = 1e-14);
        assert_relative_eq!(x[2], 0.5, epsilon = 1e-14);
        salt.set_mole_fractions(&[0.1, 0.4, 0.5]).unwrap();
        let xn = salt.neutral.mole_fractions().to_vec();
        assert_relative_eq!(xn[0], 0.2, epsilon = 1e-14);
        assert_relative_eq!(xn[1], 0.8, epsilon = 1e-14);
    }

    #[test]
    fn test_ion_chem_potentials_sum_to_neutral() {
        let mut salt = molten_salt();
        salt.set_state_TP(700.0, ONE_ATM);
        salt.set_neutral_mole_fractions(&[0.6, 0.4]).unwrap();
        let mu = salt.get_chem_potentials();
        let mu_n = salt.neutral.get_chem_potentials();
        assert_relative_eq!(mu[0] + mu[2], mu_n[0], epsilon = 1e-4);
        assert_relative_eq!(mu[1] + mu[2], mu_n[1], epsilon = 1e-4);
        let ac = salt.get_activity_coefficients();
        assert_eq!(ac, vec![1.0, 1.0, 1.0]);
        let v = salt.get_partial_molar_volumes();
        assert_relative_eq!(v[0], 0.0203);
        assert_relative_eq!(v[2], 0.0);
        let s = salt.get_partial_molar_entropies();
        assert!(s.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_unsupported_ion_solution_types() {
        let neutral: PhaseModel = IdealSolutionPhase::new(
            "n",
            vec![Species::new("NaCl", &[("Na", 1.0), ("Cl", 1.0)], SpeciesThermo::constant_mu0(0.0))],
        )
        .unwrap()
        .into();
        let ions = vec![
            Species::new("Na+", &[("Na", 1.0), ("E", -1.0)], SpeciesThermo::constant_mu0(0.0))
                .with_charge(1.0),
            Species::new("Cl-", &[("Cl", 1.0), ("E", 1.0)], SpeciesThermo::constant_mu0(0.0))
                .with_charge(-1.0),
        ];
        let res = IonsFromNeutralPhase::new("s", ions.clone(), neutral.clone(), IonSolnType::SingleCation);
        assert!(matches!(res, Err(PhaseError::Unsupported(_))));
        let res = IonsFromNeutralPhase::new("s", ions.clone(), neutral.clone(), IonSolnType::MultiCationAnion);
        assert!(matches!(res, Err(PhaseError::Unsupported(_))));
        let res = IonsFromNeutralPhase::new("s", ions, neutral, IonSolnType::SingleAnion);
        assert!(res.is_ok());
    }
}

#[cfg(test)]
mod tests {
    use crate::Kinetics::ImplicitSurfChem::SteadyStateMode;
    use crate::Kinetics::InterfaceKinetics::{
        InterfaceKinetics, InterfaceReaction, KineticsError, RateCoeffType, butler_volmer_factor,
    };
    use crate::Kinetics::RateCoeff::{CoverageDependency, SurfaceArrhenius};
    use crate::Thermodynamics::Phases::IdealGasPhase::IdealGasPhase;
    use crate::Thermodynamics::Phases::IdealSolutionPhase::IdealSolutionPhase;
    use crate::Thermodynamics::Phases::PhaseCore::Species;
    use crate::Thermodynamics::Phases::StoichSubstance::StoichSubstance;
    use crate::Thermodynamics::Phases::SurfPhase::SurfPhase;
    use crate::Thermodynamics::Phases::phase_api::{PhaseModel, ThermoPhaseTrait};
    use crate::Thermodynamics::SpeciesThermo::SpeciesThermo;
    use crate::Thermodynamics::constants::{FARADAY, GAS_CONSTANT, ONE_ATM};
    use approx::assert_relative_eq;

    const SITE_DENSITY: f64 = 2.7063e-8;
    const K_ADS: f64 = 100.0;
    const K_DES: f64 = 1.0;

    fn co_gas(T: f64) -> PhaseModel {
        let mut gas: PhaseModel = IdealGasPhase::new(
            "gas",
            vec![Species::new(
                "CO",
                &[("C", 1.0), ("O", 1.0)],
                SpeciesThermo::constant_mu0(0.0),
            )],
        )
        .unwrap()
        .into();
        gas.set_state_TP(T, ONE_ATM);
        gas
    }

    fn pt_surface(T: f64, mu0_co_s: f64) -> PhaseModel {
        let mut surf: PhaseModel = SurfPhase::new(
            "Pt_surf",
            vec![
                Species::new("PT(S)", &[("Pt", 1.0)], SpeciesThermo::constant_mu0(0.0)),
                Species::new(
                    "CO(S)",
                    &[("Pt", 1.0), ("C", 1.0), ("O", 1.0)],
                    SpeciesThermo::constant_mu0(mu0_co_s),
                ),
            ],
            SITE_DENSITY,
        )
        .unwrap()
        .into();
        surf.set_state_TP(T, ONE_ATM);
        surf
    }

    /// CO + PT(S) => CO(S), CO(S) => CO + PT(S), both irreversible
    fn adsorption_desorption(T: f64) -> InterfaceKinetics {
        let mut kin = InterfaceKinetics::interface();
        kin.add_phase(co_gas(T)).unwrap();
        kin.add_phase(pt_surface(T, -5.0e7)).unwrap();
        kin.init();
        kin.add_reaction(
            InterfaceReaction::new(
                "CO + PT(S) => CO(S)",
                vec![(0, 1.0), (1, 1.0)],
                vec![(2, 1.0)],
                SurfaceArrhenius::new(K_ADS, 0.0, 0.0),
            )
            .irreversible(),
        )
        .unwrap();
        kin.add_reaction(
            InterfaceReaction::new(
                "CO(S) => CO + PT(S)",
                vec![(2, 1.0)],
                vec![(0, 1.0), (1, 1.0)],
                SurfaceArrhenius::new(K_DES, 0.0, 0.0),
            )
            .irreversible(),
        )
        .unwrap();
        kin.thermo_mut(1).set_coverages(&[1.0, 0.0]).unwrap();
        kin.finalize().unwrap();
        kin
    }

    fn analytic_coverage(T: f64, t: f64) -> (f64, f64) {
        let c_co = ONE_ATM / (GAS_CONSTANT * T);
        let r = K_ADS * c_co / K_DES;
        let theta_ss = r / (1.0 + r);
        let lambda = K_ADS * c_co + K_DES;
        (theta_ss * (1.0 - (-lambda * t).exp()), theta_ss)
    }

    /// CO + PT(S) <=> CO(S)
    fn reversible_adsorption(T: f64, mu0_co_s: f64) -> InterfaceKinetics {
        let mut kin = InterfaceKinetics::interface();
        kin.add_phase(co_gas(T)).unwrap();
        kin.add_phase(pt_surface(T, mu0_co_s)).unwrap();
        kin.init();
        kin.add_reaction(InterfaceReaction::new(
            "CO + PT(S) <=> CO(S)",
            vec![(0, 1.0), (1, 1.0)],
            vec![(2, 1.0)],
            SurfaceArrhenius::new(1.0e4, 0.0, 0.0),
        ))
        .unwrap();
        kin.finalize().unwrap();
        kin
    }

    /// metal (electrons), electrolyte (H+, H2O) and a Pt surface with H+ + E- + PT(S) <=> H(S)
    fn hydrogen_electrode(T: f64, rate_coeff_type: RateCoeffType) -> InterfaceKinetics {
        let mut metal: PhaseModel = StoichSubstance::new(
            "metal",
            Species::new("E-", &[("E", 1.0)], SpeciesThermo::constant_mu0(0.0)).with_charge(-1.0),
        )
        .unwrap()
        .into();
        let mut electrolyte: PhaseModel = IdealSolutionPhase::new(
            "electrolyte",
            vec![
                Species::new("H2O", &[("H", 2.0), ("O", 1.0)], SpeciesThermo::constant_mu0(0.0)),
                Species::new("H+", &[("H", 1.0), ("E", -1.0)], SpeciesThermo::constant_mu0(0.0))
                    .with_charge(1.0),
            ],
        )
        .unwrap()
        .into();
        electrolyte.set_mole_fractions(&[0.9, 0.1]).unwrap();
        let mut surf: PhaseModel = SurfPhase::new(
            "Pt_surf",
            vec![
                Species::new("PT(S)", &[("Pt", 1.0)], SpeciesThermo::constant_mu0(0.0)),
                Species::new("H(S)", &[("Pt", 1.0), ("H", 1.0)], SpeciesThermo::constant_mu0(-2.0e7)),
            ],
            SITE_DENSITY,
        )
        .unwrap()
        .into();
        for p in [&mut metal, &mut electrolyte, &mut surf] {
            p.set_state_TP(T, ONE_ATM);
        }
        surf.set_coverages(&[0.5, 0.5]).unwrap();
        let mut kin = InterfaceKinetics::interface();
        kin.add_phase(metal).unwrap();
        kin.add_phase(electrolyte).unwrap();
        kin.add_phase(surf).unwrap();
        kin.init();
        // kinetics species: E- 0, H2O 1, H+ 2, PT(S) 3, H(S) 4
        kin.add_reaction(
            InterfaceReaction::new(
                "H+ + E- + PT(S) <=> H(S)",
                vec![(2, 1.0), (0, 1.0), (3, 1.0)],
                vec![(4, 1.0)],
                SurfaceArrhenius::new(1.0e5, 0.0, 0.0),
            )
            .with_beta(0.5)
            .with_rate_coeff_type(rate_coeff_type),
        )
        .unwrap();
        kin.finalize().unwrap();
        kin
    }

    #[test]
    fn test_species_bookkeeping() {
        let kin = adsorption_desorption(500.0);
        assert_eq!(kin.n_phases(), 2);
        assert_eq!(kin.n_total_species(), 3);
        assert_eq!(kin.n_reactions(), 2);
        assert_eq!(kin.kinetics_species_index("CO(S)"), Some(2));
        assert_eq!(kin.kinetics_species_index("CO2"), None);
        assert_eq!(kin.kinetics_species_name(1), Some("PT(S)"));
        assert_eq!(kin.species_phase_index(0), Some(0));
        assert_eq!(kin.species_phase_index(2), Some(1));
        assert_eq!(kin.species_phase_index(3), None);
        assert_eq!(kin.phase_index("Pt_surf"), Some(1));
        assert_eq!(kin.reaction_phase_index(), Some(1));
        assert_eq!(kin.surface_phase_index(), Some(1));
        assert_eq!(kin.kinetics_species_index_in_phase(1, 1), 2);
        assert_eq!(kin.reaction_string(1), "CO(S) => CO + PT(S)");
        assert_eq!(kin.reactants(0), &[0, 1]);
        assert_relative_eq!(kin.product_stoich_coeff(1, 1), 1.0);
        assert!(!kin.is_reversible(0));
        assert!(kin.ready());
        assert!(kin.integrator().is_some());
    }

    #[test]
    fn test_rates_of_progress_mass_action() {
        let T = 500.0;
        let mut kin = adsorption_desorption(T);
        kin.thermo_mut(1).set_coverages(&[0.6, 0.4]).unwrap();
        let c_co = ONE_ATM / (GAS_CONSTANT * T);
        let ropf = kin.get_fwd_rates_of_progress().unwrap();
        assert_relative_eq!(ropf[0], K_ADS * c_co * 0.6 * SITE_DENSITY, max_relative = 1e-12);
        assert_relative_eq!(ropf[1], K_DES * 0.4 * SITE_DENSITY, max_relative = 1e-12);
        let ropr = kin.get_rev_rates_of_progress().unwrap();
        assert!(ropr.iter().all(|&r| r == 0.0));
        let wdot = kin.get_net_production_rates().unwrap();
        let cdot = kin.get_creation_rates().unwrap();
        let ddot = kin.get_destruction_rates().unwrap();
        for k in 0..3 {
            assert_relative_eq!(cdot[k] - ddot[k], wdot[k], epsilon = 1e-20);
        }
        // sites are conserved
        assert_relative_eq!(wdot[1] + wdot[2], 0.0, epsilon = 1e-22);
        assert_relative_eq!(wdot[2], ropf[0] - ropf[1], max_relative = 1e-12);
    }

    #[test]
    fn test_irreversible_reactions_have_no_reverse_rate() {
        let mut kin = adsorption_desorption(500.0);
        let krev = kin.get_rev_rate_constants(false).unwrap();
        assert!(krev.iter().all(|&k| k == 0.0));
        // with thermochemistry the reverse constants are finite and positive
        let krev_thermo = kin.get_rev_rate_constants(true).unwrap();
        assert!(krev_thermo.iter().all(|&k| k.is_finite() && k > 0.0));
        let kf = kin.get_fwd_rate_constants().unwrap();
        let kc = kin.get_equilibrium_constants().unwrap();
        assert_relative_eq!(krev_thermo[0], kf[0] / kc[0], max_relative = 1e-12);
    }

    #[test]
    fn test_reverse_rate_from_equilibrium_constant() {
        let T = 500.0;
        let mu0 = -1.0e7;
        let mut kin = reversible_adsorption(T, mu0);
        let RT = GAS_CONSTANT * T;
        let c_co = ONE_ATM / RT;
        let kc = kin.get_equilibrium_constants().unwrap();
        assert_relative_eq!(kc[0], (-mu0 / RT).exp() / c_co, max_relative = 1e-10);
        let kf = kin.get_fwd_rate_constants().unwrap();
        let kr = kin.get_rev_rate_constants(false).unwrap();
        assert_relative_eq!(kr[0], kf[0] / kc[0], max_relative = 1e-10);

        // at theta_CO / theta_v = Kc c_CO the net rate vanishes
        let ratio = kc[0] * c_co;
        kin.thermo_mut(1)
            .set_coverages(&[1.0 / (1.0 + ratio), ratio / (1.0 + ratio)])
            .unwrap();
        let ropf = kin.get_fwd_rates_of_progress().unwrap();
        let net = kin.get_net_rates_of_progress().unwrap();
        assert!(net[0].abs() < 1e-10 * ropf[0]);
        let table = kin.check_partial_equil().unwrap();
        assert!(table.contains("CO + PT(S) <=> CO(S)"));

        let dg0 = kin.get_delta_ss_gibbs();
        assert_relative_eq!(dg0[0], mu0, max_relative = 1e-12);
        // reaction Gibbs energy is zero at equilibrium
        let dg = kin.get_delta_gibbs();
        assert!(dg[0].abs() < 1e-6 * RT);
        let dh = kin.get_delta_ss_enthalpy();
        assert_relative_eq!(dh[0], mu0, max_relative = 1e-12);
        let ds = kin.get_delta_ss_entropy();
        assert_relative_eq!(ds[0], 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_multiplier_scales_rates() {
        let mut kin = reversible_adsorption(500.0, -1.0e7);
        kin.thermo_mut(1).set_coverages(&[0.5, 0.5]).unwrap();
        let ropf = kin.get_fwd_rates_of_progress().unwrap();
        let ropr = kin.get_rev_rates_of_progress().unwrap();
        kin.set_multiplier(0, 2.0).unwrap();
        assert_relative_eq!(kin.multiplier(0), 2.0);
        let ropf2 = kin.get_fwd_rates_of_progress().unwrap();
        let ropr2 = kin.get_rev_rates_of_progress().unwrap();
        assert_relative_eq!(ropf2[0], 2.0 * ropf[0], max_relative = 1e-12);
        assert_relative_eq!(ropr2[0], 2.0 * ropr[0], max_relative = 1e-12);
        assert!(kin.set_multiplier(3, 1.0).is_err());
    }

    #[test]
    fn test_coverage_dependent_rate_constant() {
        let T = 500.0;
        let mut kin = InterfaceKinetics::interface();
        kin.add_phase(co_gas(T)).unwrap();
        kin.add_phase(pt_surface(T, -5.0e7)).unwrap();
        kin.init();
        kin.add_reaction(
            InterfaceReaction::new(
                "CO(S) => CO + PT(S)",
                vec![(2, 1.0)],
                vec![(0, 1.0), (1, 1.0)],
                SurfaceArrhenius::new(10.0, 0.0, 0.0),
            )
            .irreversible()
            .with_coverage(CoverageDependency {
                species: 1,
                a: 1.0,
                m: 0.0,
                E: 0.0,
            }),
        )
        .unwrap();
        kin.finalize().unwrap();
        kin.thermo_mut(1).set_coverages(&[0.5, 0.5]).unwrap();
        let kf = kin.get_fwd_rate_constants().unwrap();
        assert_relative_eq!(kf[0], 10.0 * 10f64.powf(0.5), max_relative = 1e-12);
        kin.thermo_mut(1).set_coverages(&[0.9, 0.1]).unwrap();
        let kf = kin.get_fwd_rate_constants().unwrap();
        assert_relative_eq!(kf[0], 10.0 * 10f64.powf(0.1), max_relative = 1e-12);
    }

    #[test]
    fn test_advance_coverages_matches_analytic_solution() {
        let T = 500.0;
        let mut kin = adsorption_desorption(T);
        kin.advance_coverages(0.5).unwrap();
        let theta = kin.thermo(1).coverages().unwrap();
        let (expected, _) = analytic_coverage(T, 0.5);
        assert_relative_eq!(theta[1], expected, max_relative = 2e-3);
        assert_relative_eq!(theta[0] + theta[1], 1.0, epsilon = 1e-12);
        let stats = kin.integrator().unwrap();
        assert!(stats.n_steps > 0);

        // long times reach the steady state
        kin.advance_coverages(20.0).unwrap();
        let theta = kin.thermo(1).coverages().unwrap();
        let (_, theta_ss) = analytic_coverage(T, 0.0);
        assert_relative_eq!(theta[1], theta_ss, max_relative = 1e-6);
    }

    #[test]
    fn test_pseudo_steady_state() {
        let T = 500.0;
        let (_, theta_ss) = analytic_coverage(T, 0.0);

        let mut kin = adsorption_desorption(T);
        kin.solve_pseudo_steady_state(SteadyStateMode::Newton, 0.0)
            .unwrap();
        let theta = kin.thermo(1).coverages().unwrap();
        assert_relative_eq!(theta[1], theta_ss, epsilon = 1e-8);
        let wdot = kin.get_net_production_rates().unwrap();
        assert!(wdot[2].abs() < 1e-6 * K_DES * SITE_DENSITY);

        let mut kin = adsorption_desorption(T);
        kin.solve_pseudo_steady_state(SteadyStateMode::TransientInitialization, -1.0)
            .unwrap();
        let theta = kin.thermo(1).coverages().unwrap();
        assert_relative_eq!(theta[1], theta_ss, epsilon = 1e-8);
    }

    #[test]
    fn test_butler_volmer_factor_saturates() {
        assert_relative_eq!(butler_volmer_factor(2.0), 2f64.exp(), max_relative = 1e-15);
        // the two branches meet at the limit
        let below = butler_volmer_factor(345.0);
        let above = butler_volmer_factor(345.0 + 1e-9);
        assert_relative_eq!(above, below, max_relative = 1e-3);
        assert!(butler_volmer_factor(1.0e4).is_finite());
        assert!(butler_volmer_factor(-1.0e4) > 0.0);
    }

    #[test]
    fn test_butler_volmer_correction() {
        let T = 300.0;
        let mut kin = hydrogen_electrode(T, RateCoeffType::Arrhenius);
        assert_relative_eq!(kin.electrochem_beta(0), 0.5);
        let kf0 = kin.get_fwd_rate_constants().unwrap()[0];
        assert_relative_eq!(kf0, 1.0e5, max_relative = 1e-12);

        // cathodic overpotential on the metal speeds up the reduction
        kin.set_electric_potential(0, -0.1).unwrap();
        let kf = kin.get_fwd_rate_constants().unwrap()[0];
        let f_rt = FARADAY / (GAS_CONSTANT * T);
        assert_relative_eq!(kf / kf0, (0.5 * f_rt * 0.1).exp(), max_relative = 1e-10);

        let mut previous = kf;
        for phi in [-17.8, -100.0, -200.0] {
            kin.set_electric_potential(0, phi).unwrap();
            let kf = kin.get_fwd_rate_constants().unwrap()[0];
            assert!(kf.is_finite());
            assert!(kf > previous);
            previous = kf;
        }
        kin.set_electric_potential(0, 100.0).unwrap();
        let kf = kin.get_fwd_rate_constants().unwrap()[0];
        assert!(kf > 0.0);
        assert!(kf < kf0);
        let ropf = kin.get_fwd_rates_of_progress().unwrap();
        assert!(ropf[0].is_finite());
    }

    #[test]
    fn test_exchange_current_density_formulation() {
        let T = 300.0;
        let mut kin = hydrogen_electrode(T, RateCoeffType::ExchangeCurrentDensity);
        let kf = kin.get_fwd_rate_constants().unwrap()[0];
        let RT = GAS_CONSTANT * T;
        // dG0 = -2e7, standard concentrations: H+ 1, E- 1, PT(S) n0
        let expected = 1.0e5 * (0.5 * 2.0e7 / RT).exp() / SITE_DENSITY / FARADAY;
        assert_relative_eq!(kf, expected, max_relative = 1e-10);
        let i0 = kin.get_exchange_current_densities().unwrap();
        let kc = kin.get_equilibrium_constants().unwrap();
        assert_relative_eq!(i0[0], kf * (1.0 / kc[0]).powf(0.5), max_relative = 1e-10);
    }

    fn carbon_deposition() -> InterfaceKinetics {
        let T = 800.0;
        let mut graphite: PhaseModel = StoichSubstance::new(
            "graphite",
            Species::new("C(gr)", &[("C", 1.0)], SpeciesThermo::constant_mu0(0.0)),
        )
        .unwrap()
        .into();
        graphite.set_state_TP(T, ONE_ATM);
        let mut surf: PhaseModel = SurfPhase::new(
            "Pt_surf",
            vec![
                Species::new("PT(S)", &[("Pt", 1.0)], SpeciesThermo::constant_mu0(0.0)),
                Species::new("C(S)", &[("Pt", 1.0), ("C", 1.0)], SpeciesThermo::constant_mu0(0.0)),
                Species::new(
                    "CO(S)",
                    &[("Pt", 1.0), ("C", 1.0), ("O", 1.0)],
                    SpeciesThermo::constant_mu0(0.0),
                ),
            ],
            SITE_DENSITY,
        )
        .unwrap()
        .into();
        surf.set_state_TP(T, ONE_ATM);
        surf.set_coverages(&[0.5, 0.3, 0.2]).unwrap();
        let mut kin = InterfaceKinetics::interface();
        kin.add_phase(co_gas(T)).unwrap();
        kin.add_phase(graphite).unwrap();
        kin.add_phase(surf).unwrap();
        kin.init();
        // CO 0, C(gr) 1, PT(S) 2, C(S) 3, CO(S) 4
        kin.add_reaction(
            InterfaceReaction::new(
                "C(S) => C(gr) + PT(S)",
                vec![(3, 1.0)],
                vec![(1, 1.0), (2, 1.0)],
                SurfaceArrhenius::new(10.0, 0.0, 0.0),
            )
            .irreversible(),
        )
        .unwrap();
        kin.add_reaction(
            InterfaceReaction::new(
                "CO + PT(S) => CO(S)",
                vec![(0, 1.0), (2, 1.0)],
                vec![(4, 1.0)],
                SurfaceArrhenius::new(K_ADS, 0.0, 0.0),
            )
            .irreversible(),
        )
        .unwrap();
        kin.finalize().unwrap();
        kin
    }

    #[test]
    fn test_phase_existence_gates_rates() {
        let mut kin = carbon_deposition();
        let net = kin.get_net_rates_of_progress().unwrap();
        assert!(net[0] > 0.0);
        assert!(net[1] > 0.0);
        assert_eq!(kin.phase_exists_check(), 0);

        // graphite may not receive products while it does not exist
        kin.set_phase_existence(1, false).unwrap();
        assert_eq!(kin.phase_exists_check(), 1);
        assert!(!kin.phase_existence(1).unwrap());
        assert!(!kin.phase_stability(1).unwrap());
        let gated = kin.get_net_rates_of_progress().unwrap();
        assert_eq!(gated[0], 0.0);
        assert_relative_eq!(gated[1], net[1], max_relative = 1e-14);
        // species only the gated reaction touches are frozen, the shared site follows CO
        let wdot = kin.get_net_production_rates().unwrap();
        assert_eq!(wdot[1], 0.0);
        assert_eq!(wdot[3], 0.0);
        assert_relative_eq!(wdot[2], -gated[1], max_relative = 1e-14);
        assert_relative_eq!(wdot[4], gated[1], max_relative = 1e-14);

        // flagging twice does not count twice
        kin.set_phase_existence(1, false).unwrap();
        assert_eq!(kin.phase_exists_check(), 1);
        kin.set_phase_existence(1, true).unwrap();
        assert_eq!(kin.phase_exists_check(), 0);
        kin.set_phase_existence(1, true).unwrap();
        assert_eq!(kin.phase_exists_check(), 0);
        let restored = kin.get_net_rates_of_progress().unwrap();
        assert_relative_eq!(restored[0], net[0], max_relative = 1e-14);

        // a missing gas phase cannot supply CO
        kin.set_phase_existence(0, false).unwrap();
        let gated = kin.get_net_rates_of_progress().unwrap();
        assert_eq!(gated[1], 0.0);
        assert!(gated[0] > 0.0);
        assert!(kin.set_phase_existence(7, false).is_err());
    }

    /// C(S) <=> C(gr) + PT(S) over a graphite phase with a large molar volume
    fn graphite_exchange(P: f64) -> InterfaceKinetics {
        let T = 800.0;
        let mut graphite: PhaseModel = StoichSubstance::new(
            "graphite",
            Species::new("C(gr)", &[("C", 1.0)], SpeciesThermo::constant_mu0(0.0))
                .with_molar_volume(5.3),
        )
        .unwrap()
        .into();
        graphite.set_state_TP(T, P);
        let mut surf: PhaseModel = SurfPhase::new(
            "Pt_surf",
            vec![
                Species::new("PT(S)", &[("Pt", 1.0)], SpeciesThermo::constant_mu0(0.0)),
                Species::new("C(S)", &[("Pt", 1.0), ("C", 1.0)], SpeciesThermo::constant_mu0(0.0)),
            ],
            SITE_DENSITY,
        )
        .unwrap()
        .into();
        surf.set_state_TP(T, ONE_ATM);
        surf.set_coverages(&[0.5, 0.5]).unwrap();
        let mut kin = InterfaceKinetics::interface();
        kin.add_phase(graphite).unwrap();
        kin.add_phase(surf).unwrap();
        kin.init();
        // C(gr) 0, PT(S) 1, C(S) 2
        kin.add_reaction(InterfaceReaction::new(
            "C(S) <=> C(gr) + PT(S)",
            vec![(2, 1.0)],
            vec![(0, 1.0), (1, 1.0)],
            SurfaceArrhenius::new(10.0, 0.0, 0.0),
        ))
        .unwrap();
        kin.finalize().unwrap();
        kin
    }

    #[test]
    fn test_bulk_pressure_change_reaches_reverse_rates() {
        let mut kin = graphite_exchange(ONE_ATM);
        let ropr_1atm = kin.get_rev_rates_of_progress().unwrap()[0];
        let P = 100.0 * ONE_ATM;
        // the reaction phase temperature stays the same, only the bulk phase changes
        kin.thermo_mut(0).set_state_TP(800.0, P);
        let ropr = kin.get_rev_rates_of_progress().unwrap()[0];
        let mut fresh = graphite_exchange(P);
        let ropr_fresh = fresh.get_rev_rates_of_progress().unwrap()[0];
        assert_relative_eq!(ropr, ropr_fresh, max_relative = 1e-12);
        let expected_ratio = (5.3 * (P - ONE_ATM) / (GAS_CONSTANT * 800.0)).exp();
        assert_relative_eq!(ropr / ropr_1atm, expected_ratio, max_relative = 1e-8);
        let kc = kin.get_equilibrium_constants().unwrap();
        let kc_fresh = fresh.get_equilibrium_constants().unwrap();
        assert_relative_eq!(kc[0], kc_fresh[0], max_relative = 1e-12);
    }

    #[test]
    fn test_non_integral_coefficients_are_rejected() {
        let mut kin = InterfaceKinetics::interface();
        kin.add_phase(co_gas(500.0)).unwrap();
        kin.add_phase(pt_surface(500.0, 0.0)).unwrap();
        kin.init();
        let half_reactant = InterfaceReaction::new(
            "1.5 CO + PT(S) => CO(S)",
            vec![(0, 1.5), (1, 1.0)],
            vec![(2, 1.0)],
            SurfaceArrhenius::new(1.0, 0.0, 0.0),
        );
        match kin.add_reaction(half_reactant) {
            Err(KineticsError::InvalidReaction { equation, reason }) => {
                assert_eq!(equation, "1.5 CO + PT(S) => CO(S)");
                assert!(reason.contains("1.5"));
            }
            other => panic!("unexpected result {:?}", other),
        }
        let half_product = InterfaceReaction::new(
            "CO(S) => 0.5 CO + PT(S)",
            vec![(2, 1.0)],
            vec![(0, 0.5), (1, 1.0)],
            SurfaceArrhenius::new(1.0, 0.0, 0.0),
        );
        assert!(matches!(
            kin.add_reaction(half_product),
            Err(KineticsError::InvalidReaction { .. })
        ));
        assert_eq!(kin.n_reactions(), 0);
        let doubled = InterfaceReaction::new(
            "2 CO + 2 PT(S) => 2 CO(S)",
            vec![(0, 2.0), (1, 2.0)],
            vec![(2, 2.0)],
            SurfaceArrhenius::new(1.0, 0.0, 0.0),
        );
        assert_eq!(kin.add_reaction(doubled).unwrap(), 0);
        assert_eq!(kin.reactants(0), &[0, 0, 1, 1]);
    }

    #[test]
    fn test_failed_integration_restores_coverages() {
        let mut kin = adsorption_desorption(500.0);
        let start = kin.thermo(1).coverages().unwrap();
        assert_eq!(start, vec![1.0, 0.0]);
        kin.integrator_mut().unwrap().max_steps = 3;
        assert!(matches!(
            kin.advance_coverages(10.0),
            Err(KineticsError::NotConverged { .. })
        ));
        assert_eq!(kin.thermo(1).coverages().unwrap(), start);
        // the integrator is kept and works again with its budget restored
        kin.integrator_mut().unwrap().max_steps = 1_000_000;
        kin.advance_coverages(0.5).unwrap();
        assert!(kin.thermo(1).coverages().unwrap()[1] > 0.0);
    }

    #[test]
    fn test_finalize_requires_reaction_phase_of_right_dimension() {
        let mut gas_only = InterfaceKinetics::interface();
        gas_only.add_phase(co_gas(300.0)).unwrap();
        gas_only.init();
        match gas_only.finalize() {
            Err(KineticsError::WrongDimension { expected, got }) => {
                assert_eq!(expected, 2);
                assert_eq!(got, 3);
            }
            other => panic!("unexpected result {:?}", other),
        }

        let mut edge = InterfaceKinetics::edge();
        edge.add_phase(co_gas(300.0)).unwrap();
        edge.add_phase(pt_surface(300.0, 0.0)).unwrap();
        edge.init();
        match edge.finalize() {
            Err(KineticsError::WrongDimension { expected, got }) => {
                assert_eq!(expected, 1);
                assert_eq!(got, 2);
            }
            other => panic!("unexpected result {:?}", other),
        }

        let mut empty = InterfaceKinetics::interface();
        empty.init();
        assert!(matches!(
            empty.finalize(),
            Err(KineticsError::NoReactionPhase("surface"))
        ));
        let mut empty_edge = InterfaceKinetics::edge();
        empty_edge.init();
        let err = empty_edge.finalize().unwrap_err();
        assert_eq!(err.to_string(), "no edge phase is present");
    }

    #[test]
    fn test_lifecycle_errors() {
        let mut kin = InterfaceKinetics::interface();
        kin.add_phase(co_gas(500.0)).unwrap();
        kin.add_phase(pt_surface(500.0, 0.0)).unwrap();
        let rxn = InterfaceReaction::new(
            "CO + PT(S) => CO(S)",
            vec![(0, 1.0), (1, 1.0)],
            vec![(2, 1.0)],
            SurfaceArrhenius::new(1.0, 0.0, 0.0),
        );
        assert!(matches!(
            kin.add_reaction(rxn.clone()),
            Err(KineticsError::NotInitialized)
        ));
        kin.init();
        assert!(matches!(
            kin.add_phase(co_gas(500.0)),
            Err(KineticsError::AlreadyInitialized)
        ));
        let bad_index = InterfaceReaction::new(
            "X => CO(S)",
            vec![(9, 1.0)],
            vec![(2, 1.0)],
            SurfaceArrhenius::new(1.0, 0.0, 0.0),
        );
        assert!(kin.add_reaction(bad_index).is_err());
        let bad_coeff = InterfaceReaction::new(
            "CO => CO(S)",
            vec![(0, -1.0)],
            vec![(2, 1.0)],
            SurfaceArrhenius::new(1.0, 0.0, 0.0),
        );
        assert!(matches!(
            kin.add_reaction(bad_coeff),
            Err(KineticsError::InvalidReaction { .. })
        ));
        kin.add_reaction(rxn.clone()).unwrap();
        assert!(matches!(
            kin.get_net_production_rates(),
            Err(KineticsError::NotFinalized)
        ));
        kin.finalize().unwrap();
        assert!(kin.ready());
        assert!(kin.get_net_production_rates().is_ok());

        // a new reaction invalidates the finalized state
        kin.add_reaction(rxn).unwrap();
        assert!(!kin.ready());
        assert!(kin.integrator().is_none());
        assert!(matches!(
            kin.advance_coverages(1.0),
            Err(KineticsError::NotFinalized)
        ));
        kin.finalize().unwrap();
        assert_eq!(kin.n_reactions(), 2);
        assert!(kin.advance_coverages(1.0e-3).is_ok());
    }
}

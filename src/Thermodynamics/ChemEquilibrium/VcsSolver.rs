//! Gibbs energy minimisation at constant T and P under element balance constraints.
//!
//! The unknowns of each Newton step are the dimensionless element potentials lambda_e
//! (one per element of an independent basis), the relative change u_p of the total moles of
//! every multispecies phase and the mole change of every single species phase. Species of a
//! multispecies phase follow from them:
//!
//!   dln(n_k) = sum_e a_ek lambda_e - mu_k/RT + u_p
//!
//! Element rows:  sum_f lambda_f sum_k a_ek a_fk n_k + sum_p u_p b_ep + sum_s a_es dn_s
//!                   = b_e - b_e(n) + sum_k a_ek n_k mu_k/RT
//! Phase rows:    sum_f lambda_f b_fp = sum_{k in p} n_k mu_k/RT
//! Single rows:   sum_f a_fs lambda_f = mu_s/RT
use super::SpeciesProperties::SpeciesProperties;
use super::VcsProblem::{VcsError, VcsProblem};
use super::VolPhase::ElementType;
use crate::Thermodynamics::Phases::phase_api::{PhaseKind, ThermoPhaseTrait};
use crate::Thermodynamics::constants::GAS_CONSTANT;
use log::{debug, info, warn};
use nalgebra::{DMatrix, DVector};

/// mole numbers are never driven below this, kmol
const MIN_MOLES: f64 = 1.0e-300;

pub struct VcsSolver {
    pub max_iterations: usize,
    /// relative residual below which an element row is dependent on the rows already chosen
    pub rank_tol: f64,
    /// moles given to a reappearing single species phase, relative to the total element abundance
    pub appearance_fraction: f64,
    /// largest change of ln(n_k) allowed in one step for the major species
    pub max_log_step: f64,
    pub species_properties: Vec<SpeciesProperties>,
    /// dimensionless element potentials of the last step, zero for elements outside the basis
    pub element_potentials: Vec<f64>,
    /// rows of the element basis used in the last step
    pub element_basis: Vec<usize>,
}

impl Default for VcsSolver {
    fn default() -> Self {
        Self::new()
    }
}

struct StepSystem {
    basis: Vec<usize>,
    multi_phases: Vec<usize>,
    singles: Vec<usize>,
}

impl VcsSolver {
    pub fn new() -> Self {
        VcsSolver {
            max_iterations: 500,
            rank_tol: 1.0e-10,
            appearance_fraction: 1.0e-4,
            max_log_step: 2.0,
            species_properties: Vec::new(),
            element_potentials: Vec::new(),
            element_basis: Vec::new(),
        }
    }

    /// per species records: owning phase, formula column in global element ordering, ...
    pub fn build_species_properties(
        prob: &VcsProblem,
    ) -> Result<Vec<SpeciesProperties>, VcsError> {
        let mut props: Vec<Option<SpeciesProperties>> = vec![None; prob.nspecies];
        for (iph, vp) in prob.vphase_list.iter().take(prob.NPhase).enumerate() {
            let tp = vp.thermo()?;
            let surface = tp.phase_kind() == PhaseKind::Surface;
            for k in 0..vp.n_species {
                let kg = vp.sp_global_index_vcs(k).ok_or(VcsError::IndexOutOfRange {
                    what: "phase species",
                    index: k,
                    n: vp.n_species,
                })?;
                if kg >= prob.nspecies {
                    return Err(VcsError::IndexOutOfRange {
                        what: "species",
                        index: kg,
                        n: prob.nspecies,
                    });
                }
                let mut sp = SpeciesProperties::new(iph, k);
                sp.num_elements = prob.ne;
                sp.sp_name = prob.sp_name[kg].clone();
                sp.wt_species = prob.wt_species[kg];
                sp.formula_matrix_col = (0..prob.ne)
                    .map(|e| prob.formula_matrix[(e, kg)])
                    .collect();
                sp.charge = prob.charge[kg];
                sp.surface_species = surface;
                sp.vol_pm = prob.vol_pm[kg];
                sp.species_unknown_type = prob.species_unknown_type[kg];
                props[kg] = Some(sp);
            }
        }
        props
            .into_iter()
            .enumerate()
            .map(|(k, p)| {
                p.ok_or(VcsError::IndexOutOfRange {
                    what: "species without phase",
                    index: k,
                    n: prob.nspecies,
                })
            })
            .collect()
    }

    /// Picks a maximal set of linearly independent element rows over the given species
    /// columns by Gram-Schmidt orthogonalisation.
    pub fn select_element_basis(
        &self,
        props: &[SpeciesProperties],
        rows: &[usize],
        cols: &[usize],
    ) -> Vec<usize> {
        let mut q: Vec<DVector<f64>> = Vec::new();
        let mut basis = Vec::new();
        for &e in rows {
            let mut v = DVector::from_iterator(
                cols.len(),
                cols.iter().map(|&k| props[k].formula_matrix_col[e]),
            );
            let norm0 = v.norm();
            if norm0 == 0.0 {
                continue;
            }
            for qi in &q {
                let proj = qi.dot(&v);
                v -= qi * proj;
            }
            let norm = v.norm();
            if norm > self.rank_tol * norm0 {
                q.push(v / norm);
                basis.push(e);
            }
        }
        basis
    }

    /// mu/RT (electrochemical) of every species at the mole numbers `n`
    fn reduced_potentials(
        prob: &mut VcsProblem,
        n: &[f64],
    ) -> Result<Vec<f64>, VcsError> {
        let RT = GAS_CONSTANT * prob.T;
        let mut g = vec![0.0; prob.nspecies];
        for vp in prob.vphase_list.iter_mut().take(prob.NPhase) {
            let idx: Vec<usize> = (0..vp.n_species)
                .filter_map(|k| vp.sp_global_index_vcs(k))
                .collect();
            let local: Vec<f64> = idx.iter().map(|&kg| n[kg]).collect();
            let single = vp.single_species;
            let tp = vp.thermo_mut()?;
            if !single && local.iter().sum::<f64>() > 0.0 {
                tp.set_mole_fractions(&local)?;
            }
            let mu = tp.get_electrochem_potentials();
            for (k, kg) in idx.iter().enumerate() {
                g[*kg] = mu[k] / RT;
            }
        }
        Ok(g)
    }

    /// Runs the minimisation and stores mole numbers, mole fractions, phase totals,
    /// chemical potentials (in the problem units) and counters in `prob`.
    pub fn solve(&mut self, prob: &mut VcsProblem) -> Result<(), VcsError> {
        let (T, P) = (prob.T, prob.PresPA);
        prob.set_state_TP(T, P)?;
        let nsp = prob.nspecies;
        let props = Self::build_species_properties(prob)?;
        let n_phase = prob.NPhase;
        let phase_species: Vec<Vec<usize>> = prob
            .vphase_list
            .iter()
            .take(n_phase)
            .map(|vp| {
                (0..vp.n_species)
                    .filter_map(|k| vp.sp_global_index_vcs(k))
                    .collect()
            })
            .collect();
        let single_phase: Vec<bool> = prob
            .vphase_list
            .iter()
            .take(n_phase)
            .map(|vp| vp.single_species)
            .collect();
        let active_rows: Vec<usize> = (0..prob.ne).filter(|&e| prob.el_active[e]).collect();
        let scale = active_rows
            .iter()
            .filter(|&&e| prob.el_type[e] == ElementType::AbsPos)
            .map(|&e| prob.gai[e].abs())
            .sum::<f64>()
            .max(1.0e-20);

        // species built from an element that is absent can not form
        let mut allowed = vec![true; nsp];
        for &e in &active_rows {
            if prob.el_type[e] == ElementType::AbsPos && prob.gai[e] <= 1.0e-14 * scale {
                for k in 0..nsp {
                    if props[k].formula_matrix_col[e] > 0.0 {
                        allowed[k] = false;
                    }
                }
            }
        }
        for k in 0..nsp {
            if !allowed[k] {
                debug!("species {} is zeroed, one of its elements has no abundance", props[k].sp_name);
            }
        }

        let mut n: Vec<f64> = prob.w[..nsp].to_vec();
        for k in 0..nsp {
            if !allowed[k] || n[k] < 0.0 {
                n[k] = 0.0;
            }
        }
        let have_estimate = prob.iest >= 0 && n.iter().any(|&v| v > 0.0);
        let mut present = vec![false; n_phase];
        for p in 0..n_phase {
            let members: Vec<usize> = phase_species[p].iter().copied().filter(|&k| allowed[k]).collect();
            if members.is_empty() {
                continue;
            }
            if single_phase[p] {
                present[p] = have_estimate && n[members[0]] > 0.0;
                continue;
            }
            let total: f64 = members.iter().map(|&k| n[k]).sum();
            let base = if have_estimate && total > 0.0 {
                total
            } else {
                scale / n_phase as f64
            };
            for &k in &members {
                if !have_estimate || total <= 0.0 {
                    n[k] = base / members.len() as f64;
                } else if n[k] <= 0.0 {
                    n[k] = props[k].reference_mole_fraction * base;
                }
            }
            present[p] = true;
        }

        // an element carried only by absent phases brings the first of them in
        for &e in &active_rows {
            if prob.el_type[e] != ElementType::AbsPos || prob.gai[e] <= 0.0 {
                continue;
            }
            let covered = (0..nsp).any(|k| {
                allowed[k] && present[props[k].index_phase] && props[k].formula_matrix_col[e] != 0.0
            });
            if covered {
                continue;
            }
            let carrier = (0..n_phase).find(|&p| {
                !present[p]
                    && phase_species[p]
                        .iter()
                        .any(|&k| allowed[k] && props[k].formula_matrix_col[e] > 0.0)
            });
            if let Some(p) = carrier {
                let members: Vec<usize> = phase_species[p].iter().copied().filter(|&k| allowed[k]).collect();
                for &k in &members {
                    n[k] = self.appearance_fraction * scale / members.len() as f64;
                }
                present[p] = true;
                prob.num_basis_optimizations += 1;
            }
        }

        let mut iter = 0;
        let mut residual;
        loop {
            if iter >= self.max_iterations {
                residual = element_residual(prob, &props, &n, &active_rows);
                warn!("equilibrium not converged, element residual {:e}", residual);
                prob.iterations = iter;
                return Err(VcsError::NotConverged {
                    iterations: iter,
                    residual,
                });
            }
            iter += 1;
            let g = Self::reduced_potentials(prob, &n)?;

            let cols: Vec<usize> = (0..nsp)
                .filter(|&k| allowed[k] && present[props[k].index_phase])
                .collect();
            let basis = self.select_element_basis(&props, &active_rows, &cols);
            if !self.element_basis.is_empty() && basis != self.element_basis {
                prob.num_basis_optimizations += 1;
                debug!("element basis changed to {:?}", basis);
            }
            let system = StepSystem {
                multi_phases: (0..n_phase).filter(|&p| present[p] && !single_phase[p]).collect(),
                singles: (0..n_phase)
                    .filter(|&p| present[p] && single_phase[p])
                    .map(|p| phase_species[p][0])
                    .collect(),
                basis,
            };
            let mut multi_species: Vec<(usize, usize)> = Vec::new();
            for (jp, &p) in system.multi_phases.iter().enumerate() {
                for &k in &phase_species[p] {
                    if allowed[k] {
                        multi_species.push((k, jp));
                    }
                }
            }

            let a = |e: usize, k: usize| props[k].formula_matrix_col[e];
            let nb = system.basis.len();
            let nmp = system.multi_phases.len();
            let m = nb + nmp + system.singles.len();
            let mut A = DMatrix::<f64>::zeros(m, m);
            let mut r = DVector::<f64>::zeros(m);
            for (i, &e) in system.basis.iter().enumerate() {
                let b_cur: f64 = (0..nsp).map(|k| a(e, k) * n[k]).sum();
                let mut rhs = prob.gai[e] - b_cur;
                for &(k, jp) in &multi_species {
                    let aek_n = a(e, k) * n[k];
                    if aek_n == 0.0 {
                        continue;
                    }
                    for (j, &f) in system.basis.iter().enumerate() {
                        A[(i, j)] += aek_n * a(f, k);
                    }
                    A[(i, nb + jp)] += aek_n;
                    rhs += aek_n * g[k];
                }
                for (js, &s) in system.singles.iter().enumerate() {
                    A[(i, nb + nmp + js)] = a(e, s);
                }
                r[i] = rhs;
            }
            for &(k, jp) in &multi_species {
                for (j, &f) in system.basis.iter().enumerate() {
                    A[(nb + jp, j)] += a(f, k) * n[k];
                }
                r[nb + jp] += n[k] * g[k];
            }
            for (js, &s) in system.singles.iter().enumerate() {
                for (j, &f) in system.basis.iter().enumerate() {
                    A[(nb + nmp + js, j)] = a(f, s);
                }
                r[nb + nmp + js] = g[s];
            }
            let x = A
                .lu()
                .solve(&r)
                .filter(|x| x.iter().all(|v| v.is_finite()))
                .ok_or_else(|| {
                    VcsError::Singular(format!(
                        "iteration {}, {} element rows, {} phases",
                        iter,
                        nb,
                        nmp + system.singles.len()
                    ))
                })?;

            let lambda_dot = |k: usize| -> f64 {
                system
                    .basis
                    .iter()
                    .enumerate()
                    .map(|(j, &f)| a(f, k) * x[j])
                    .sum()
            };
            let mut d = vec![0.0; nsp];
            let mut stationarity: f64 = 0.0;
            for &(k, jp) in &multi_species {
                let u = x[nb + jp];
                d[k] = lambda_dot(k) - g[k] + u;
                stationarity = stationarity.max(u.abs());
                let phase_total: f64 = phase_species[props[k].index_phase].iter().map(|&j| n[j]).sum();
                if n[k] > 1.0e-12 * phase_total {
                    stationarity = stationarity.max(d[k].abs());
                }
            }
            let dn_single: Vec<f64> = (0..system.singles.len()).map(|js| x[nb + nmp + js]).collect();
            let single_change = dn_single.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
            residual = element_residual(prob, &props, &n, &active_rows);
            let gai_max = active_rows
                .iter()
                .map(|&e| prob.gai[e].abs())
                .fold(1.0_f64, f64::max);
            debug!(
                "iteration {}: element residual {:e}, stationarity {:e}",
                iter, residual, stationarity
            );

            let mut element_potentials = vec![0.0; prob.ne];
            for (j, &e) in system.basis.iter().enumerate() {
                element_potentials[e] = x[j];
            }
            self.element_potentials = element_potentials;
            self.element_basis = system.basis.clone();

            if residual <= prob.tolmaj * gai_max
                && stationarity <= 0.1 * prob.tolmin
                && single_change <= prob.tolmaj * gai_max
            {
                // an absent single species phase appears when its potential is below the
                // one the element potentials assign to it
                let mut appeared = false;
                for p in 0..n_phase {
                    if present[p] || !single_phase[p] {
                        continue;
                    }
                    let s = phase_species[p][0];
                    if !allowed[s] {
                        continue;
                    }
                    let driving = g[s] - lambda_dot(s);
                    if driving < -prob.tolmin {
                        info!(
                            "phase {} appears (driving force {:e})",
                            prob.vphase_list[p].phase_name, driving
                        );
                        present[p] = true;
                        n[s] = self.appearance_fraction * scale;
                        prob.num_basis_optimizations += 1;
                        appeared = true;
                    }
                }
                if !appeared {
                    break;
                }
                continue;
            }

            let mut omega: f64 = 1.0;
            for &(k, jp) in &multi_species {
                let phase_total: f64 = phase_species[system.multi_phases[jp]].iter().map(|&j| n[j]).sum();
                if n[k] > 1.0e-8 * phase_total && d[k].abs() * omega > self.max_log_step {
                    omega = self.max_log_step / d[k].abs();
                }
            }
            for &(k, _) in &multi_species {
                let step = (omega * d[k]).clamp(-5.0 * self.max_log_step, 5.0 * self.max_log_step);
                n[k] = (n[k] * step.exp()).max(MIN_MOLES);
            }
            for (js, &s) in system.singles.iter().enumerate() {
                let new = n[s] + omega * dn_single[js];
                if new <= 0.0 {
                    let p = props[s].index_phase;
                    info!("phase {} disappears", prob.vphase_list[p].phase_name);
                    n[s] = 0.0;
                    present[p] = false;
                    prob.num_basis_optimizations += 1;
                } else {
                    n[s] = new;
                }
            }
            for &p in &system.multi_phases {
                let total: f64 = phase_species[p].iter().map(|&k| n[k]).sum();
                if total < 1.0e-20 * scale {
                    info!("phase {} disappears", prob.vphase_list[p].phase_name);
                    for &k in &phase_species[p] {
                        n[k] = 0.0;
                    }
                    present[p] = false;
                    prob.num_basis_optimizations += 1;
                }
            }
        }

        prob.iterations = iter;
        for k in 0..nsp {
            if !allowed[k] {
                n[k] = 0.0;
            }
        }
        prob.w[..nsp].copy_from_slice(&n);
        prob.update_phases_from_w()?;
        for vp in prob.vphase_list.iter().take(n_phase) {
            let mu = vp.thermo()?.get_electrochem_potentials();
            for (k, muk) in mu.iter().enumerate() {
                if let Some(kg) = vp.sp_global_index_vcs(k) {
                    prob.gibbs_species[kg] = prob.units.from_mks(*muk, T);
                }
            }
        }
        prob.Vol = prob.total_volume()?;
        self.species_properties = props;
        info!(
            "equilibrium converged in {} iterations, element residual {:e}",
            iter, residual
        );
        Ok(())
    }
}

fn element_residual(
    prob: &VcsProblem,
    props: &[SpeciesProperties],
    n: &[f64],
    rows: &[usize],
) -> f64 {
    rows.iter()
        .map(|&e| {
            let b: f64 = n
                .iter()
                .enumerate()
                .map(|(k, nk)| props[k].formula_matrix_col[e] * nk)
                .sum();
            (prob.gai[e] - b).abs()
        })
        .fold(0.0, f64::max)
}

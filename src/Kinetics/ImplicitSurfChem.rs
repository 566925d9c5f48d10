//! Integrator of the surface coverages of an interface (edge) mechanism.
//!
//! The coverages evolve as d(theta_k)/dt = wdot_k * size_k / n0, where wdot_k is the net
//! production rate of surface species k, size_k the number of sites it occupies and n0 the
//! site density. Bulk phases are held fixed.
//!
//! Time integration is backward Euler with Newton iterations on a finite difference Jacobian
//! and a step size controlled by the local error estimate h/2 |f(t+h) - f(t)|. The pseudo
//! steady state is found by a damped Newton iteration in which the equation of the species
//! with the largest coverage is replaced by the site balance sum(theta) = 1.
use crate::Kinetics::InterfaceKinetics::{InterfaceKinetics, KineticsError};
use crate::Thermodynamics::Phases::phase_api::{PhaseModel, ThermoPhaseTrait};
use log::{debug, info, warn};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

const FD_RELATIVE: f64 = 1.0e-7;
const FD_ABSOLUTE: f64 = 1.0e-10;
const MIN_STEP: f64 = 1.0e-20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SteadyStateMode {
    /// damped Newton iteration from the current coverages
    #[default]
    Newton,
    /// integrate over a pseudo transient first, then Newton
    TransientInitialization,
}

#[derive(Debug, Clone)]
pub struct ImplicitSurfChem {
    /// phase index of the surface phase in the kinetics object
    surf: usize,
    /// kinetics index of the first surface species
    offset: usize,
    nsp: usize,
    sizes: Vec<f64>,
    site_density: f64,
    pub rtol: f64,
    pub atol: f64,
    pub max_steps: usize,
    pub max_newton_iterations: usize,
    pub max_steady_state_iterations: usize,
    pub initial_step: f64,
    /// 0: quiet, 1: summary of each call, 2: every step
    pub print_lvl: usize,
    /// statistics of the last call
    pub n_steps: usize,
    pub n_jacobians: usize,
}

impl ImplicitSurfChem {
    pub fn new(kin: &InterfaceKinetics) -> Result<Self, KineticsError> {
        let surf = kin.surface_phase_index().ok_or(KineticsError::NotFinalized)?;
        let phase = kin.thermo(surf);
        let (sizes, site_density) = match phase {
            PhaseModel::Surface(s) => (
                (0..s.core.n_species()).map(|k| s.size(k)).collect::<Vec<f64>>(),
                s.site_density,
            ),
            _ => {
                return Err(KineticsError::WrongDimension {
                    expected: kin.kind.reaction_phase_dim(),
                    got: phase.n_dim(),
                });
            }
        };
        Ok(Self {
            surf,
            offset: kin.kinetics_species_index_in_phase(0, surf),
            nsp: sizes.len(),
            sizes,
            site_density,
            rtol: 1.0e-7,
            atol: 1.0e-12,
            max_steps: 1_000_000,
            max_newton_iterations: 10,
            max_steady_state_iterations: 200,
            initial_step: 1.0e-8,
            print_lvl: 0,
            n_steps: 0,
            n_jacobians: 0,
        })
    }

    pub fn n_surface_species(&self) -> usize {
        self.nsp
    }

    pub fn coverages(&self, kin: &InterfaceKinetics) -> Vec<f64> {
        kin.thermo(self.surf).coverages().unwrap_or_default()
    }
    /// d(theta)/dt at the given (possibly unnormalised) coverages
    fn rhs(&self, kin: &mut InterfaceKinetics, theta: &[f64]) -> Result<Vec<f64>, KineticsError> {
        kin.thermo_mut(self.surf).set_coverages_no_norm(theta)?;
        let wdot = kin.get_net_production_rates()?;
        Ok((0..self.nsp)
            .map(|k| wdot[self.offset + k] * self.sizes[k] / self.site_density)
            .collect())
    }

    fn rhs_jacobian(
        &mut self,
        kin: &mut InterfaceKinetics,
        theta: &[f64],
        f0: &[f64],
    ) -> Result<DMatrix<f64>, KineticsError> {
        self.n_jacobians += 1;
        let n = self.nsp;
        let mut jac = DMatrix::zeros(n, n);
        let mut th = theta.to_vec();
        for j in 0..n {
            let delta = FD_RELATIVE * theta[j].abs() + FD_ABSOLUTE;
            th[j] = theta[j] + delta;
            let f = self.rhs(kin, &th)?;
            for i in 0..n {
                jac[(i, j)] = (f[i] - f0[i]) / delta;
            }
            th[j] = theta[j];
        }
        Ok(jac)
    }

    fn error_weight(&self, theta: f64) -> f64 {
        self.rtol * theta.abs() + self.atol
    }
    /// Solves theta - theta0 - h f(theta) = 0; returns theta and f(theta).
    fn backward_euler_step(
        &mut self,
        kin: &mut InterfaceKinetics,
        theta0: &[f64],
        h: f64,
    ) -> Result<(Vec<f64>, Vec<f64>), KineticsError> {
        let n = self.nsp;
        let mut theta = theta0.to_vec();
        for iter in 0..self.max_newton_iterations {
            let f = self.rhs(kin, &theta)?;
            let jf = self.rhs_jacobian(kin, &theta, &f)?;
            let resid = DVector::from_iterator(
                n,
                (0..n).map(|k| -(theta[k] - theta0[k] - h * f[k])),
            );
            let jac = DMatrix::<f64>::identity(n, n) - jf * h;
            let delta = jac
                .lu()
                .solve(&resid)
                .ok_or_else(|| KineticsError::Singular("backward Euler Jacobian".to_string()))?;
            let mut converged = true;
            for k in 0..n {
                theta[k] += delta[k];
                if delta[k].abs() > 0.1 * self.error_weight(theta[k]) {
                    converged = false;
                }
            }
            if theta.iter().any(|t| !t.is_finite()) {
                return Err(KineticsError::Singular("non finite coverages".to_string()));
            }
            if converged {
                if self.print_lvl > 1 {
                    debug!("backward Euler h = {:e} converged in {} Newton iterations", h, iter + 1);
                }
                let f = self.rhs(kin, &theta)?;
                return Ok((theta, f));
            }
        }
        let f = self.rhs(kin, &theta)?;
        let residual = (0..n)
            .map(|k| (theta[k] - theta0[k] - h * f[k]).abs())
            .fold(0.0, f64::max);
        Err(KineticsError::NotConverged {
            what: "backward Euler Newton iteration",
            iterations: self.max_newton_iterations,
            residual,
        })
    }
    /// Integrates from t0 to t1 and stores the normalised coverages in the surface phase.
    /// On failure the surface phase gets its starting coverages back.
    pub fn integrate(
        &mut self,
        kin: &mut InterfaceKinetics,
        t0: f64,
        t1: f64,
    ) -> Result<(), KineticsError> {
        self.n_steps = 0;
        self.n_jacobians = 0;
        let mut theta = self.coverages(kin);
        if t1 <= t0 {
            return Ok(());
        }
        let theta_start = theta.clone();
        let mut t = t0;
        let mut h = self.initial_step.min(t1 - t0);
        let mut f_old = self.rhs(kin, &theta)?;
        while t < t1 {
            if self.n_steps >= self.max_steps {
                warn!("coverage integration stopped at t = {:e} of {:e}", t, t1);
                kin.thermo_mut(self.surf).set_coverages(&theta_start)?;
                return Err(KineticsError::NotConverged {
                    what: "coverage integration",
                    iterations: self.n_steps,
                    residual: t1 - t,
                });
            }
            self.n_steps += 1;
            h = h.min(t1 - t);
            match self.backward_euler_step(kin, &theta, h) {
                Ok((theta_new, f_new)) => {
                    let err = (0..self.nsp)
                        .map(|k| 0.5 * h * (f_new[k] - f_old[k]).abs() / self.error_weight(theta_new[k]))
                        .fold(0.0, f64::max);
                    if err <= 1.0 || h <= MIN_STEP {
                        t += h;
                        theta = theta_new.iter().map(|v| v.max(0.0)).collect();
                        f_old = f_new;
                        let factor = if err > 0.0 { 0.9 / err.sqrt() } else { 2.0 };
                        h *= factor.clamp(0.5, 2.0);
                    } else {
                        h *= (0.9 / err.sqrt()).clamp(0.1, 0.9);
                    }
                }
                Err(e) => {
                    h *= 0.25;
                    if h < MIN_STEP {
                        warn!("coverage integration step underflow at t = {:e}", t);
                        kin.thermo_mut(self.surf).set_coverages(&theta_start)?;
                        return Err(e);
                    }
                }
            }
        }
        kin.thermo_mut(self.surf).set_coverages(&theta)?;
        if self.print_lvl > 0 {
            info!(
                "coverages advanced to t = {:e} in {} steps ({} Jacobians)",
                t1, self.n_steps, self.n_jacobians
            );
        }
        Ok(())
    }
    /// time scale of the pseudo transient: inverse of the fastest coverage rate
    fn default_time_scale(&self, kin: &mut InterfaceKinetics, theta: &[f64]) -> Result<f64, KineticsError> {
        let f = self.rhs(kin, theta)?;
        let fmax = f.iter().fold(0.0, |m: f64, v| m.max(v.abs()));
        Ok(if fmax > 0.0 {
            (1.0 / fmax).clamp(1.0e-10, 1.0)
        } else {
            1.0e-3
        })
    }
    /// residual of the steady state: rates, with the site balance in row `kmax`
    fn steady_state_residual(
        &self,
        kin: &mut InterfaceKinetics,
        theta: &[f64],
        kmax: usize,
    ) -> Result<(Vec<f64>, Vec<f64>), KineticsError> {
        let f = self.rhs(kin, theta)?;
        let mut g = f.clone();
        g[kmax] = theta.iter().sum::<f64>() - 1.0;
        Ok((g, f))
    }

    pub fn solve_pseudo_steady_state(
        &mut self,
        kin: &mut InterfaceKinetics,
        mode: SteadyStateMode,
        time_scale: f64,
    ) -> Result<(), KineticsError> {
        if mode == SteadyStateMode::TransientInitialization {
            let theta = self.coverages(kin);
            let ts = if time_scale > 0.0 {
                time_scale
            } else {
                self.default_time_scale(kin, &theta)?
            };
            debug!("pseudo transient over {:e} s before the steady state solve", ts);
            self.integrate(kin, 0.0, ts)?;
        }
        self.n_jacobians = 0;
        let n = self.nsp;
        let mut theta = self.coverages(kin);
        let mut residual = f64::INFINITY;
        for iter in 0..self.max_steady_state_iterations {
            let kmax = (0..n)
                .max_by(|&a, &b| theta[a].total_cmp(&theta[b]))
                .unwrap_or(0);
            let (g, f) = self.steady_state_residual(kin, &theta, kmax)?;
            let gnorm = g.iter().fold(0.0, |m: f64, v| m.max(v.abs()));
            residual = gnorm;
            let mut jac = self.rhs_jacobian(kin, &theta, &f)?;
            for j in 0..n {
                jac[(kmax, j)] = 1.0;
            }
            let rhs = DVector::from_iterator(n, g.iter().map(|v| -v));
            let delta = jac
                .lu()
                .solve(&rhs)
                .ok_or_else(|| KineticsError::Singular("steady state Jacobian".to_string()))?;
            // damped step, coverages stay non negative
            let mut lambda = 1.0;
            let mut trial: Vec<f64>;
            loop {
                trial = (0..n).map(|k| (theta[k] + lambda * delta[k]).max(0.0)).collect();
                let (g_trial, _) = self.steady_state_residual(kin, &trial, kmax)?;
                let norm_trial = g_trial.iter().fold(0.0, |m: f64, v| m.max(v.abs()));
                if norm_trial <= gnorm || lambda < 1.0 / 64.0 {
                    break;
                }
                lambda *= 0.5;
            }
            let converged = (0..n).all(|k| (trial[k] - theta[k]).abs() <= self.error_weight(trial[k]));
            theta = trial;
            if converged {
                kin.thermo_mut(self.surf).set_coverages(&theta)?;
                if self.print_lvl > 0 {
                    info!(
                        "pseudo steady state found in {} iterations, residual {:e}",
                        iter + 1,
                        gnorm
                    );
                }
                return Ok(());
            }
        }
        kin.thermo_mut(self.surf).set_coverages(&theta)?;
        warn!("pseudo steady state not converged, residual {:e}", residual);
        Err(KineticsError::NotConverged {
            what: "pseudo steady state",
            iterations: self.max_steady_state_iterations,
            residual,
        })
    }
}

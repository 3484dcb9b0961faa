use serde::{Deserialize, Serialize};

use crate::math::grid::horizon_points;
use crate::math::ode::{Method, OdeSolver};

// Layout of the state vector: S | I | R | V
pub const S: usize = 0;
pub const I: usize = 1;
pub const R: usize = 2;
pub const V: usize = 3;
pub const N_COMPARTMENTS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SirvParams {
    pub beta: f64, // transmission rate
    pub nu: f64,   // recovery rate (per day)
}

impl SirvParams {
    pub fn check(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.beta.is_finite() && self.beta >= 0.0, "beta must be finite and >= 0 (beta={})", self.beta);
        anyhow::ensure!(self.nu.is_finite() && self.nu >= 0.0, "nu must be finite and >= 0 (nu={})", self.nu);
        Ok(())
    }
}

/// SIRV right-hand side. Writes `du/dt` for state `u` at time `t` into `du`.
///
/// Every flow term moves mass between compartments, so the four derivatives sum to zero.
pub fn sirv_rhs<P>(u: &[f64], t: f64, params: &SirvParams, p: &P, du: &mut [f64])
where
    P: Fn(f64) -> f64 + ?Sized,
{
    let (s, i) = (u[S], u[I]);
    let pt = p(t);
    let beta = params.beta;
    let nu = params.nu;
    du[S] = -beta * s * i - pt * s;
    du[I] = beta * s * i - nu * i;
    du[R] = nu * i;
    du[V] = pt * s;
}

/// Time-dependent vaccination rate p(t).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VaccinationRate {
    /// No vaccination; the model reduces to plain SIR.
    Zero,
    /// `rate` for `t > onset`, zero before and at `onset`.
    Step { rate: f64, onset: f64 },
}

impl VaccinationRate {
    /// Step whose post-onset rate is `log10(p_value)`.
    ///
    /// The logarithm is used as the rate as-is; `p_value < 1` yields a negative rate,
    /// which moves mass back into S.
    pub fn log_step(p_value: f64, onset: f64) -> Self {
        VaccinationRate::Step { rate: p_value.log10(), onset }
    }

    /// Rate applied once vaccination is on, regardless of when it starts.
    pub fn post_onset_rate(&self) -> f64 {
        match *self {
            VaccinationRate::Zero => 0.0,
            VaccinationRate::Step { rate, .. } => rate,
        }
    }

    pub fn at(&self, t: f64) -> f64 {
        match *self {
            VaccinationRate::Zero => 0.0,
            VaccinationRate::Step { rate, onset } => {
                if t > onset { rate } else { 0.0 }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SirvState {
    pub s: f64,
    pub i: f64,
    pub r: f64,
    pub v: f64,
}

impl SirvState {
    /// Initial condition with no recovered and no vaccinated individuals.
    pub fn seeded(s0: f64, i0: f64) -> Self {
        Self { s: s0, i: i0, r: 0.0, v: 0.0 }
    }

    pub fn to_array(&self) -> [f64; N_COMPARTMENTS] {
        [self.s, self.i, self.r, self.v]
    }

    pub fn total(&self) -> f64 {
        self.s + self.i + self.r + self.v
    }
}

/// One integrated run: compartments over the sampled time points.
#[derive(Debug, Clone)]
pub struct Trajectory {
    pub t: Vec<f64>,
    pub s: Vec<f64>,
    pub i: Vec<f64>,
    pub r: Vec<f64>,
    pub v: Vec<f64>,
}

impl Trajectory {
    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    pub fn state_at(&self, k: usize) -> SirvState {
        SirvState { s: self.s[k], i: self.i[k], r: self.r[k], v: self.v[k] }
    }

    pub fn final_state(&self) -> Option<SirvState> {
        if self.is_empty() { None } else { Some(self.state_at(self.len() - 1)) }
    }

    /// `(time, count)` at the largest infected count; the earliest one on ties.
    pub fn peak_infected(&self) -> Option<(f64, f64)> {
        self.t
            .iter()
            .zip(self.i.iter())
            .fold(None, |best: Option<(f64, f64)>, (&t, &i)| match best {
                Some((_, bi)) if bi >= i => best,
                _ => Some((t, i)),
            })
    }

    /// Compartments in plotting order: S, I, R, V.
    pub fn series(&self) -> [&[f64]; N_COMPARTMENTS] {
        [&self.s, &self.i, &self.r, &self.v]
    }
}

pub struct SirvModel<P> {
    pub params: SirvParams,
    pub p: P,
}

impl<P> SirvModel<P>
where
    P: Fn(f64) -> f64,
{
    pub fn new(params: SirvParams, p: P) -> anyhow::Result<Self> {
        params.check()?;
        Ok(Self { params, p })
    }

    pub fn deriv(&self, t: f64, y: &[f64], dy: &mut [f64]) {
        sirv_rhs(y, t, &self.params, &self.p, dy);
    }

    /// Integrate from `t = 0` to `t_end` on the fixed grid of step `dt`.
    pub fn simulate(&self, u0: SirvState, t_end: f64, dt: f64, method: Method) -> anyhow::Result<Trajectory> {
        let time_points = horizon_points(t_end, dt)?;
        let mut solver = OdeSolver::new(method, N_COMPARTMENTS, |tt: f64, y: &[f64], dy: &mut [f64]| {
            self.deriv(tt, y, dy)
        });
        solver.set_initial_condition(&u0.to_array());
        let sol = solver.solve(&time_points)?;

        log::debug!(
            "integrated {} steps with {:?} (beta={}, nu={}, t_end={}, dt={})",
            sol.t.len() - 1,
            method,
            self.params.beta,
            self.params.nu,
            t_end,
            dt
        );

        Ok(Trajectory {
            s: sol.component(S),
            i: sol.component(I),
            r: sol.component(R),
            v: sol.component(V),
            t: sol.t,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: SirvParams = SirvParams { beta: 0.0005, nu: 0.1 };

    fn baseline(p: VaccinationRate, params: SirvParams) -> Trajectory {
        let model = SirvModel::new(params, move |t| p.at(t)).unwrap();
        model.simulate(SirvState::seeded(1500.0, 1.0), 60.0, 0.5, Method::Euler).unwrap()
    }

    #[test]
    fn rhs_is_deterministic() {
        let p = VaccinationRate::Step { rate: 0.2, onset: 8.0 };
        let u = [1200.0, 40.0, 100.0, 7.0];
        let mut a = [0.0; 4];
        let mut b = [0.0; 4];
        for t in [0.0, 8.0, 8.5, 30.0] {
            sirv_rhs(&u, t, &BASE, &|t| p.at(t), &mut a);
            sirv_rhs(&u, t, &BASE, &|t| p.at(t), &mut b);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn rhs_matches_hand_computed_values() {
        let params = SirvParams { beta: 0.5, nu: 0.125 };
        let u = [8.0, 2.0, 0.0, 0.0];
        let mut du = [0.0; 4];
        sirv_rhs(&u, 9.0, &params, &|_| 0.25, &mut du);
        assert_eq!(du, [-10.0, 7.75, 0.25, 2.0]);
    }

    #[test]
    fn derivatives_conserve_total_population() {
        let rates = [0.0, 0.3, -0.1, 2.0];
        let states = [
            [1500.0, 1.0, 0.0, 0.0],
            [10.0, 900.0, 500.0, 90.0],
            [0.5, 0.01, 1400.0, 100.0],
        ];
        let mut du = [0.0; 4];
        for rate in rates {
            for u in &states {
                for params in [BASE, SirvParams { beta: 0.02, nu: 0.7 }] {
                    sirv_rhs(u, 12.0, &params, &|_| rate, &mut du);
                    let sum: f64 = du.iter().sum();
                    let scale = du.iter().map(|d| d.abs()).fold(1.0, f64::max);
                    assert!(sum.abs() <= 1e-12 * scale, "sum={} du={:?}", sum, du);
                }
            }
        }
    }

    #[test]
    fn no_vaccination_keeps_v_at_zero() {
        let traj = baseline(VaccinationRate::Zero, BASE);
        assert!(traj.v.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn zero_beta_has_no_new_infections() {
        let params = SirvParams { beta: 0.0, nu: 0.1 };

        let traj = baseline(VaccinationRate::Zero, params);
        assert!(traj.i.windows(2).all(|w| w[1] <= w[0]));
        assert!(traj.s.iter().all(|&s| s == 1500.0));

        let vacc = baseline(VaccinationRate::Step { rate: 0.05, onset: 8.0 }, params);
        assert!(vacc.i.windows(2).all(|w| w[1] <= w[0]));
        for k in 1..vacc.len() {
            let lost = vacc.s[k - 1] - vacc.s[k];
            let gained = vacc.v[k] - vacc.v[k - 1];
            assert!((lost - gained).abs() < 1e-9);
        }
    }

    #[test]
    fn epidemic_rises_then_falls() {
        let traj = baseline(VaccinationRate::Zero, BASE);
        assert_eq!(traj.len(), 121);

        let (t_peak, i_peak) = traj.peak_infected().unwrap();
        assert!(t_peak > 0.0 && t_peak < 60.0);
        assert!(i_peak > 500.0);

        let end = traj.final_state().unwrap();
        assert!(end.i < 0.02 * i_peak);
        assert!(end.r > 1400.0);
        assert_eq!(end.v, 0.0);
        assert!((end.total() - 1501.0).abs() < 1e-6);
    }

    #[test]
    fn vaccination_onset_bends_susceptible_curve() {
        let base = baseline(VaccinationRate::Zero, BASE);
        let vacc = baseline(VaccinationRate::Step { rate: 0.1, onset: 8.0 }, BASE);

        // t = 0 .. 8.5 only sees p(t) for t <= 8
        for k in 0..=17 {
            assert_eq!(base.s[k], vacc.s[k]);
        }
        assert!(vacc.s[18] < base.s[18]);
        assert!(vacc.s[18] - vacc.s[17] < base.s[18] - base.s[17]);
        assert!(vacc.v[18] > 0.0);
    }

    #[test]
    fn log_step_follows_log10() {
        let p = VaccinationRate::log_step(100.0, 8.0);
        assert_eq!(p.at(8.0), 0.0);
        assert_eq!(p.at(8.5), 2.0);
        assert!(VaccinationRate::log_step(0.5, 8.0).at(60.0) < 0.0);

        // Onset past the horizon: never applied, still negative once on
        let late = VaccinationRate::log_step(0.5, 100.0);
        assert_eq!(late.at(60.0), 0.0);
        assert!(late.post_onset_rate() < 0.0);
        assert_eq!(VaccinationRate::Zero.post_onset_rate(), 0.0);
    }

    #[test]
    fn invalid_params_are_rejected() {
        assert!(SirvModel::new(SirvParams { beta: -1.0, nu: 0.1 }, |_| 0.0).is_err());
        assert!(SirvModel::new(SirvParams { beta: 0.1, nu: f64::NAN }, |_| 0.0).is_err());
    }
}

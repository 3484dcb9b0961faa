use serde::{Deserialize, Serialize};

/// Fixed-step explicit methods available to [`OdeSolver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    /// Forward Euler, first order.
    #[default]
    Euler,
    /// Classic fourth-order Runge-Kutta.
    Rk4,
}

/// States sampled at the requested time points. `u[k]` is the state at `t[k]`.
#[derive(Debug, Clone)]
pub struct Solution {
    pub u: Vec<Vec<f64>>,
    pub t: Vec<f64>,
}

impl Solution {
    /// Column `idx` of the state matrix, i.e. one component over time.
    pub fn component(&self, idx: usize) -> Vec<f64> {
        self.u.iter().map(|row| row[idx]).collect()
    }
}

/// Generic fixed-step ODE solver for `du/dt = f(t, u)` on a state of `dim` components.
///
/// The right-hand side writes the derivative into its third argument. Extra model
/// arguments are captured by the closure. Stage buffers are owned by the solver and
/// reused across steps.
pub struct OdeSolver<F> {
    method: Method,
    dim: usize,
    f: F,
    u0: Option<Vec<f64>>,
    // Derivative evaluations of the current step; Euler only uses the first.
    stages: [Vec<f64>; 4],
    trial: Vec<f64>,
}

// Classic RK4 tableau: stage offsets (fraction of dt) and output weights.
const RK4_NODES: [f64; 4] = [0.0, 0.5, 0.5, 1.0];
const RK4_WEIGHTS: [f64; 4] = [1.0 / 6.0, 2.0 / 6.0, 2.0 / 6.0, 1.0 / 6.0];

impl<F> OdeSolver<F>
where
    F: FnMut(f64, &[f64], &mut [f64]),
{
    pub fn new(method: Method, dim: usize, f: F) -> Self {
        Self {
            method,
            dim,
            f,
            u0: None,
            stages: std::array::from_fn(|_| vec![0.0; dim]),
            trial: vec![0.0; dim],
        }
    }

    pub fn set_initial_condition(&mut self, u0: &[f64]) {
        self.u0 = Some(u0.to_vec());
    }

    /// Advance from `time_points[0]` through every later point, one step per interval.
    pub fn solve(&mut self, time_points: &[f64]) -> anyhow::Result<Solution> {
        let mut y = match &self.u0 {
            Some(u0) => u0.clone(),
            None => anyhow::bail!("initial condition not set"),
        };
        anyhow::ensure!(self.dim > 0, "state dimension must be > 0");
        anyhow::ensure!(
            y.len() == self.dim,
            "initial condition has {} components, expected {}",
            y.len(),
            self.dim
        );
        anyhow::ensure!(time_points.len() >= 2, "need at least two time points, got {}", time_points.len());
        anyhow::ensure!(
            time_points.windows(2).all(|w| w[1] > w[0]),
            "time points must be strictly increasing"
        );

        let mut u = Vec::with_capacity(time_points.len());
        u.push(y.clone());
        for w in time_points.windows(2) {
            let (t, dt) = (w[0], w[1] - w[0]);
            match self.method {
                Method::Euler => self.euler_step(&mut y, t, dt),
                Method::Rk4 => self.rk4_step(&mut y, t, dt),
            }
            u.push(y.clone());
        }

        Ok(Solution { u, t: time_points.to_vec() })
    }

    /// `y += dt * f(t, y)`, derivative taken at the start of the step.
    fn euler_step(&mut self, y: &mut [f64], t: f64, dt: f64) {
        let k = &mut self.stages[0];
        (self.f)(t, y, k);
        for (yi, ki) in y.iter_mut().zip(k.iter()) {
            *yi += dt * ki;
        }
    }

    fn rk4_step(&mut self, y: &mut [f64], t: f64, dt: f64) {
        let Self { f, stages, trial, .. } = self;
        for s in 0..4 {
            if s == 0 {
                trial.copy_from_slice(y);
            } else {
                let prev = &stages[s - 1];
                for ((p, yi), ki) in trial.iter_mut().zip(y.iter()).zip(prev.iter()) {
                    *p = yi + RK4_NODES[s] * dt * ki;
                }
            }
            f(t + RK4_NODES[s] * dt, trial, &mut stages[s]);
        }
        for (i, yi) in y.iter_mut().enumerate() {
            let incr: f64 = stages.iter().zip(RK4_WEIGHTS).map(|(k, w)| w * k[i]).sum();
            *yi += dt * incr;
        }
    }
}

/// `n` evenly spaced points from `start` to `end`, both included.
/// The last point is exactly `end`.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / ((n - 1) as f64);
            let mut out: Vec<f64> = (0..n).map(|k| start + (k as f64) * step).collect();
            out[n - 1] = end;
            out
        }
    }
}

/// `n` points spaced evenly on a log scale: 10^x for x in `linspace(start_exp, end_exp, n)`.
pub fn logspace(start_exp: f64, end_exp: f64, n: usize) -> Vec<f64> {
    linspace(start_exp, end_exp, n)
        .into_iter()
        .map(|x| 10f64.powf(x))
        .collect()
}

/// Time points `0, dt, 2dt, ..., t_end` with `int(t_end/dt)` steps.
pub fn horizon_points(t_end: f64, dt: f64) -> anyhow::Result<Vec<f64>> {
    anyhow::ensure!(dt > 0.0 && dt.is_finite(), "dt must be positive and finite (dt={})", dt);
    anyhow::ensure!(t_end > 0.0 && t_end.is_finite(), "t_end must be positive and finite (t_end={})", t_end);
    let steps = (t_end / dt) as usize;
    anyhow::ensure!(steps >= 1, "horizon shorter than one step (t_end={}, dt={})", t_end, dt);
    Ok(linspace(0.0, t_end, steps + 1))
}
